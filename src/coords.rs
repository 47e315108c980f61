//! 坐标转换工具
//! 支持 BD09 (百度)、GCJ02 (高德) 与 WGS84 互转

use std::f64::consts::PI;

use crate::config::{SolverConfig, CHINA_BOUNDS};
use crate::types::{Coordinate, Datum};

/// 长半轴 (米)
const A: f64 = 6378245.0;
/// 偏心率平方
const EE: f64 = 0.006_693_421_622_965_943_23;

const BD_LON_SHIFT: f64 = 0.0065;
const BD_LAT_SHIFT: f64 = 0.006;

/// 是否在国内范围之外
pub fn out_of_china(lon: f64, lat: f64) -> bool {
    !CHINA_BOUNDS.contains(lon, lat)
}

fn transform_lat(x: f64, y: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * x + 3.0 * y + 0.2 * y * y + 0.1 * x * y + 0.2 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (y * PI).sin() + 40.0 * (y / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (y / 12.0 * PI).sin() + 320.0 * (y * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn transform_lon(x: f64, y: f64) -> f64 {
    let mut ret = 300.0 + x + 2.0 * y + 0.1 * x * x + 0.1 * x * y + 0.1 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (x * PI).sin() + 40.0 * (x / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (x / 12.0 * PI).sin() + 300.0 * (x / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

/// WGS84 -> GCJ02 的偏移量 (dlon, dlat)，按所在纬度的曲率半径换算成度
fn gcj02_delta(lon: f64, lat: f64) -> (f64, f64) {
    let dlat = transform_lat(lon - 105.0, lat - 35.0);
    let dlon = transform_lon(lon - 105.0, lat - 35.0);
    let radlat = lat / 180.0 * PI;
    let magic = radlat.sin();
    let magic = 1.0 - EE * magic * magic;
    let sqrtmagic = magic.sqrt();
    let dlat = (dlat * 180.0) / ((A * (1.0 - EE)) / (magic * sqrtmagic) * PI);
    let dlon = (dlon * 180.0) / (A / sqrtmagic * radlat.cos() * PI);
    (dlon, dlat)
}

/// BD09 坐标转 GCJ02，无范围限制
pub fn bd09_to_gcj02(bd: Coordinate) -> Coordinate {
    let x = bd.longitude - BD_LON_SHIFT;
    let y = bd.latitude - BD_LAT_SHIFT;
    let z = (x * x + y * y).sqrt() - 0.00002 * (y * PI).sin();
    let theta = y.atan2(x) - 0.000003 * (x * PI).cos();
    Coordinate::new(z * theta.cos(), z * theta.sin())
}

/// GCJ02 坐标转 BD09
pub fn gcj02_to_bd09(gcj: Coordinate) -> Coordinate {
    let x = gcj.longitude;
    let y = gcj.latitude;
    let z = (x * x + y * y).sqrt() + 0.00002 * (y * PI).sin();
    let theta = y.atan2(x) + 0.000003 * (x * PI).cos();
    Coordinate::new(z * theta.cos() + BD_LON_SHIFT, z * theta.sin() + BD_LAT_SHIFT)
}

/// WGS84 坐标转 GCJ02
pub fn wgs84_to_gcj02(wgs: Coordinate) -> Coordinate {
    if out_of_china(wgs.longitude, wgs.latitude) {
        return wgs;
    }
    let (dlon, dlat) = gcj02_delta(wgs.longitude, wgs.latitude);
    Coordinate::new(wgs.longitude + dlon, wgs.latitude + dlat)
}

/// 二分求解结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    pub coordinate: Coordinate,
    /// 正向变换的调用次数
    pub iterations: u32,
    pub converged: bool,
}

/// GCJ02 坐标转 WGS84（二分逼近）
///
/// 没有解析逆变换，在目标点周围的矩形内二分，直到正向变换结果与目标的
/// 差值在两个轴上都小于 `tolerance`。经纬度两个轴各自独立收缩，前提是
/// 正向变换在不动点附近对每个轴单调递增，这一点对该经验公式实际成立，
/// 但并未证明。
///
/// 达到 `max_iterations` 仍未收敛时返回最后一次的中点。
pub fn solve_gcj02_to_wgs84(gcj: Coordinate, cfg: &SolverConfig) -> Solution {
    if out_of_china(gcj.longitude, gcj.latitude) {
        return Solution {
            coordinate: gcj,
            iterations: 0,
            converged: true,
        };
    }

    let (lon, lat) = (gcj.longitude, gcj.latitude);
    let (mut min_lat, mut max_lat) = (lat - cfg.half_span, lat + cfg.half_span);
    let (mut min_lon, mut max_lon) = (lon - cfg.half_span, lon + cfg.half_span);
    let mut mid = gcj;

    for i in 0..cfg.max_iterations {
        mid = Coordinate::new((min_lon + max_lon) / 2.0, (min_lat + max_lat) / 2.0);
        let tmp = wgs84_to_gcj02(mid);
        let dlon = tmp.longitude - lon;
        let dlat = tmp.latitude - lat;

        if dlat.abs() < cfg.tolerance && dlon.abs() < cfg.tolerance {
            return Solution {
                coordinate: mid,
                iterations: i + 1,
                converged: true,
            };
        }

        if dlat > 0.0 {
            max_lat = mid.latitude;
        } else {
            min_lat = mid.latitude;
        }
        if dlon > 0.0 {
            max_lon = mid.longitude;
        } else {
            min_lon = mid.longitude;
        }
    }

    log::trace!(
        "gcj02_to_wgs84 未收敛: {} -> {} ({} 次)",
        gcj,
        mid,
        cfg.max_iterations
    );
    Solution {
        coordinate: mid,
        iterations: cfg.max_iterations,
        converged: false,
    }
}

/// GCJ02 坐标转 WGS84，精度约 1e-7 度
pub fn gcj02_to_wgs84(gcj: Coordinate) -> Coordinate {
    solve_gcj02_to_wgs84(gcj, &SolverConfig::default()).coordinate
}

/// GCJ02 坐标转 WGS84 的一步近似，误差在 1e-5 度量级
pub fn gcj02_to_wgs84_approx(gcj: Coordinate) -> Coordinate {
    if out_of_china(gcj.longitude, gcj.latitude) {
        return gcj;
    }
    let (dlon, dlat) = gcj02_delta(gcj.longitude, gcj.latitude);
    Coordinate::new(gcj.longitude - dlon, gcj.latitude - dlat)
}

/// BD09 坐标转 WGS84
pub fn bd09_to_wgs84(bd: Coordinate) -> Coordinate {
    gcj02_to_wgs84(bd09_to_gcj02(bd))
}

/// WGS84 坐标转 BD09
pub fn wgs84_to_bd09(wgs: Coordinate) -> Coordinate {
    gcj02_to_bd09(wgs84_to_gcj02(wgs))
}

/// 任意两个坐标系之间转换，BD09 总是经过 GCJ02
pub fn convert(coord: Coordinate, from: Datum, to: Datum) -> Coordinate {
    match (from, to) {
        (Datum::Bd09, Datum::Gcj02) => bd09_to_gcj02(coord),
        (Datum::Bd09, Datum::Wgs84) => bd09_to_wgs84(coord),
        (Datum::Gcj02, Datum::Bd09) => gcj02_to_bd09(coord),
        (Datum::Gcj02, Datum::Wgs84) => gcj02_to_wgs84(coord),
        (Datum::Wgs84, Datum::Gcj02) => wgs84_to_gcj02(coord),
        (Datum::Wgs84, Datum::Bd09) => wgs84_to_bd09(coord),
        (Datum::Bd09, Datum::Bd09) | (Datum::Gcj02, Datum::Gcj02) | (Datum::Wgs84, Datum::Wgs84) => {
            coord
        }
    }
}
