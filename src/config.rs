//! 转换参数
//!
//! 全部为编译期常量，嵌入方可通过 serde 放进自己的配置文件

use serde::{Deserialize, Serialize};

use crate::types::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// 闭区间判断，边界上的点算在范围内；只排除明确越界的点，NaN 不算越界
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        !(lon < self.min_lon || lon > self.max_lon || lat < self.min_lat || lat > self.max_lat)
    }
}

/// 国内范围（粗略矩形），范围外不做 GCJ02 偏移
pub const CHINA_BOUNDS: Bounds = Bounds {
    min_lon: 72.004,
    max_lon: 137.8347,
    min_lat: 0.8293,
    max_lat: 55.8271,
};

pub const MAX_ITERATIONS: u32 = 30;
/// 约 0.011m
pub const TOLERANCE: f64 = 1e-7;
/// 大于 GCJ02 最大偏移量
pub const SEARCH_HALF_SPAN: f64 = 0.5;

/// GCJ02 -> WGS84 二分求解参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub max_iterations: u32,
    pub tolerance: f64,
    pub half_span: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            tolerance: TOLERANCE,
            half_span: SEARCH_HALF_SPAN,
        }
    }
}

/// 输出前的人工校准偏移，来源不明，保持原值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub lon_offset: f64,
    pub lat_offset: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            lon_offset: 0.0001,
            lat_offset: -0.0003,
        }
    }
}

impl Calibration {
    pub fn apply(&self, coord: Coordinate) -> Coordinate {
        coord.offset(self.lon_offset, self.lat_offset)
    }
}
