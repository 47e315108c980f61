//! 标准输入输出驱动
//!
//! 输入格式为 `经度<分隔符>纬度`，记录之间可以有任意空白；
//! 输出 `经度<分隔符> 纬度`，保留 8 位小数。

use std::io::{self, BufRead, ErrorKind, Write};

use crate::config::Calibration;
use crate::coords::bd09_to_wgs84;
use crate::error::Result;
use crate::types::Coordinate;

/// 一条输入记录
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub coordinate: Coordinate,
    pub delimiter: char,
}

/// 按 `>>` 的习惯逐个读取 数字、分隔符、数字
pub struct RecordReader<R> {
    inner: R,
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn peek(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn bump(&mut self) {
        self.inner.consume(1);
    }

    fn skip_whitespace(&mut self) -> io::Result<()> {
        while let Some(b) = self.peek()? {
            if !is_space(b) {
                break;
            }
            self.bump();
        }
        Ok(())
    }

    fn take_digits(&mut self, buf: &mut String) -> io::Result<usize> {
        let mut n = 0;
        while let Some(b) = self.peek()? {
            if !b.is_ascii_digit() {
                break;
            }
            buf.push(b as char);
            self.bump();
            n += 1;
        }
        Ok(n)
    }

    fn take_sign(&mut self, buf: &mut String) -> io::Result<()> {
        if let Some(b @ (b'+' | b'-')) = self.peek()? {
            buf.push(b as char);
            self.bump();
        }
        Ok(())
    }

    /// `[+-]digits[.digits][e[+-]digits]`，不合法时返回 None
    fn read_number(&mut self) -> io::Result<Option<f64>> {
        self.skip_whitespace()?;
        let mut buf = String::new();
        self.take_sign(&mut buf)?;

        let mut digits = self.take_digits(&mut buf)?;
        if self.peek()? == Some(b'.') {
            buf.push('.');
            self.bump();
            digits += self.take_digits(&mut buf)?;
        }
        if digits == 0 {
            return Ok(None);
        }

        if let Some(b @ (b'e' | b'E')) = self.peek()? {
            buf.push(b as char);
            self.bump();
            self.take_sign(&mut buf)?;
            if self.take_digits(&mut buf)? == 0 {
                return Ok(None);
            }
        }

        // 溢出按读取失败处理，下溢得到 0
        Ok(buf.parse::<f64>().ok().filter(|v| v.is_finite()))
    }

    /// 读取一个非空白字节作为分隔符，非 ASCII 字节视为格式错误
    fn read_delimiter(&mut self) -> io::Result<Option<char>> {
        self.skip_whitespace()?;
        match self.peek()? {
            Some(b) if b.is_ascii() => {
                self.bump();
                Ok(Some(b as char))
            }
            _ => Ok(None),
        }
    }

    /// 读取下一条记录；输入结束或格式错误时返回 None
    pub fn next_record(&mut self) -> io::Result<Option<Record>> {
        let Some(lng) = self.read_number()? else {
            return Ok(None);
        };
        let Some(delimiter) = self.read_delimiter()? else {
            return Ok(None);
        };
        let Some(lat) = self.read_number()? else {
            return Ok(None);
        };
        Ok(Some(Record {
            coordinate: Coordinate::new(lng, lat),
            delimiter,
        }))
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// 单条记录：BD09 -> WGS84，再加校准偏移
pub fn convert_record(record: &Record, calibration: &Calibration) -> Coordinate {
    calibration.apply(bd09_to_wgs84(record.coordinate))
}

pub fn format_record(coord: Coordinate, delimiter: char) -> String {
    format!("{:.8}{} {:.8}", coord.longitude, delimiter, coord.latitude)
}

/// 逐条转换直到输入结束或遇到无法解析的内容，返回转换的条数
pub fn convert_stream<R: BufRead, W: Write>(
    input: R,
    mut output: W,
    calibration: &Calibration,
) -> Result<usize> {
    let mut count = 0;
    for record in RecordReader::new(input) {
        let record = record?;
        let wgs = convert_record(&record, calibration);
        log::debug!("{} -> {}", record.coordinate, wgs);
        writeln!(output, "{}", format_record(wgs, record.delimiter))?;
        count += 1;
    }
    output.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(input: &str) -> (usize, String) {
        let mut out = Vec::new();
        let n = convert_stream(Cursor::new(input), &mut out, &Calibration::default()).unwrap();
        (n, String::from_utf8(out).unwrap())
    }

    fn records(input: &str) -> Vec<Record> {
        RecordReader::new(Cursor::new(input))
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_beijing_golden() {
        let (n, out) = run("116.404,39.915\n");
        assert_eq!(n, 1);
        assert_eq!(out, "116.39140214, 39.90719013\n");
    }

    #[test]
    fn test_delimiter_echoed() {
        let (_, out) = run("121.47370,31.23085");
        assert_eq!(out, "121.46274592, 31.22650605\n");

        let (_, out) = run("121.47370;31.23085");
        assert_eq!(out, "121.46274592; 31.22650605\n");
    }

    #[test]
    fn test_multiple_records() {
        let (n, out) = run("116.404,39.915 121.47370,31.23085\n\n  114.36,30.54\n");
        assert_eq!(n, 3);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "116.39140214, 39.90719013",
                "121.46274592, 31.22650605",
                "114.34811484, 30.53589342",
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(run(""), (0, String::new()));
        assert_eq!(run("  \n\t"), (0, String::new()));
    }

    #[test]
    fn test_stops_on_malformed_input() {
        assert_eq!(run("abc,39.915\n"), (0, String::new()));
        // 已输出的记录保留，格式错误之后的内容不再处理
        let (n, out) = run("116.404,39.915\nfoo\n121.47370,31.23085\n");
        assert_eq!(n, 1);
        assert_eq!(out, "116.39140214, 39.90719013\n");
        // 不完整的记录被丢弃
        assert_eq!(run("116.404,").0, 0);
        assert_eq!(run("116.404").0, 0);
    }

    #[test]
    fn test_number_grammar() {
        let r = records("-1.5e1,+.25 3.,2E-1");
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].coordinate, Coordinate::new(-15.0, 0.25));
        assert_eq!(r[1].coordinate, Coordinate::new(3.0, 0.2));

        assert!(records(".,1").is_empty());
        assert!(records("1e,2").is_empty());
    }

    #[test]
    fn test_whitespace_around_delimiter() {
        let r = records("116.404 , 39.915");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].delimiter, ',');
        assert_eq!(r[0].coordinate, Coordinate::new(116.404, 39.915));
    }

    #[test]
    fn test_non_ascii_delimiter_stops() {
        assert_eq!(run("116.404，39.915"), (0, String::new()));
        let (n, out) = run("116.404,39.915\n121.47370，31.23085\n114.36,30.54\n");
        assert_eq!(n, 1);
        assert_eq!(out, "116.39140214, 39.90719013\n");
    }

    #[test]
    fn test_overflow_stops() {
        assert_eq!(run("1e400,39\n121.47370,31.23085\n"), (0, String::new()));
        assert_eq!(run("116.404,1e400 121,31"), (0, String::new()));
        assert_eq!(run("-1e400,39").0, 0);
    }

    #[test]
    fn test_underflow_reads_zero() {
        let r = records("1e-400,39");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].coordinate, Coordinate::new(0.0, 39.0));
    }

    #[test]
    fn test_calibration_after_pipeline() {
        let record = Record {
            coordinate: Coordinate::new(116.404, 39.915),
            delimiter: ',',
        };
        let raw = convert_record(
            &record,
            &Calibration {
                lon_offset: 0.0,
                lat_offset: 0.0,
            },
        );
        let calibrated = convert_record(&record, &Calibration::default());
        assert_eq!(calibrated, raw.offset(0.0001, -0.0003));
    }

    #[test]
    fn test_outside_china_only_bd_shift() {
        let (_, out) = run("10,60");
        assert_eq!(out, "9.99378001, 59.99367040\n");
    }
}
