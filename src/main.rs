use std::process::ExitCode;

fn main() -> ExitCode {
    bd09_to_wgs84_lib::run()
}
