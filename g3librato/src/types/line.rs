/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::num::NonZeroU64;
use std::str::FromStr;

use thiserror::Error;

const FIELD_DELIMITER: u8 = b'|';

#[derive(Debug, Error, PartialEq)]
pub enum LineParseError {
    #[error("invalid utf-8 line")]
    NotUtf8,
    #[error("expect 3 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid value field: {0}")]
    InvalidValue(String),
    #[error("invalid timestamp field: {0}")]
    InvalidTimestamp(String),
    #[error("unknown metric type in key {0}")]
    UnknownType(String),
}

/// One `key|value|timestamp` record emitted by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine<'a> {
    pub key: &'a str,
    pub value: f64,
    pub timestamp: i64,
}

pub struct LineParser<'a> {
    buf: &'a [u8],
    offset: usize,
    floor_time_secs: Option<NonZeroU64>,
}

impl<'a> LineParser<'a> {
    pub fn new(buf: &'a [u8], floor_time_secs: Option<NonZeroU64>) -> Self {
        LineParser {
            buf,
            offset: 0,
            floor_time_secs,
        }
    }

    fn next_line(&mut self) -> Option<&'a [u8]> {
        if self.offset >= self.buf.len() {
            return None;
        }

        let left = &self.buf[self.offset..];
        match memchr::memchr(b'\n', left) {
            Some(p) => {
                self.offset += p + 1;
                Some(&left[..p])
            }
            None => {
                self.offset = self.buf.len();
                Some(left)
            }
        }
    }

    fn parse_line(&self, line: &'a [u8]) -> Result<MetricLine<'a>, LineParseError> {
        let count = memchr::memchr_iter(FIELD_DELIMITER, line).count();
        if count != 2 {
            return Err(LineParseError::FieldCount(count + 1));
        }

        let line = std::str::from_utf8(line).map_err(|_| LineParseError::NotUtf8)?;
        let mut fields = line.splitn(3, FIELD_DELIMITER as char);
        let (Some(key), Some(value), Some(timestamp)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(LineParseError::FieldCount(count + 1));
        };

        let value = f64::from_str(value.trim())
            .map_err(|_| LineParseError::InvalidValue(value.to_string()))?;
        let timestamp = parse_timestamp(timestamp.trim())
            .ok_or_else(|| LineParseError::InvalidTimestamp(timestamp.to_string()))?;

        Ok(MetricLine {
            key,
            value,
            timestamp: self.floor_time(timestamp),
        })
    }

    fn floor_time(&self, timestamp: i64) -> i64 {
        match self.floor_time_secs {
            Some(interval) => {
                let interval = i64::try_from(interval.get()).unwrap_or(i64::MAX);
                timestamp - timestamp.rem_euclid(interval)
            }
            None => timestamp,
        }
    }
}

/// Whole seconds only, fractional parts are truncated toward zero.
fn parse_timestamp(s: &str) -> Option<i64> {
    if let Ok(i) = i64::from_str(s) {
        return Some(i);
    }
    let f = f64::from_str(s).ok()?;
    if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

impl<'a> Iterator for LineParser<'a> {
    type Item = Result<MetricLine<'a>, LineParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut line = self.next_line()?;
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            if line.is_empty() {
                continue;
            }
            return Some(self.parse_line(line));
        }
    }
}
