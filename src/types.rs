use serde::{Deserialize, Serialize};
use std::fmt;

/// 经纬度坐标（单位：度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// 按坐标轴分别偏移
    pub fn offset(self, d_lng: f64, d_lat: f64) -> Self {
        Self::new(self.longitude + d_lng, self.latitude + d_lat)
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((longitude, latitude): (f64, f64)) -> Self {
        Self::new(longitude, latitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.longitude, self.latitude)
    }
}

/// 坐标系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Datum {
    /// 百度
    Bd09,
    /// 国测局（高德、腾讯）
    Gcj02,
    Wgs84,
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Datum::Bd09 => "BD-09",
            Datum::Gcj02 => "GCJ-02",
            Datum::Wgs84 => "WGS-84",
        };
        f.write_str(name)
    }
}
