pub mod config;
pub mod coords;
pub mod driver;
pub mod error;
pub mod types;

use std::io::{self, BufWriter};
use std::process::ExitCode;

use config::Calibration;

pub use coords::{bd09_to_gcj02, bd09_to_wgs84, convert, gcj02_to_wgs84, wgs84_to_gcj02};
pub use error::{ConvertError, Result};
pub use types::{Coordinate, Datum};

/// 从标准输入读取 BD09 坐标，转换后写到标准输出
pub fn run() -> ExitCode {
    env_logger::init();

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());

    match driver::convert_stream(stdin, stdout, &Calibration::default()) {
        Ok(count) => {
            log::info!("converted {} records", count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
