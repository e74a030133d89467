/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

/// Statistic suffixes the aggregator appends to multipart metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatSuffix {
    Sum,
    SumSquares,
    Count,
    Stdev,
    Lower,
    Upper,
    Mean,
}

impl StatSuffix {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "sum" => Some(StatSuffix::Sum),
            "sum_sq" => Some(StatSuffix::SumSquares),
            "count" => Some(StatSuffix::Count),
            "stdev" => Some(StatSuffix::Stdev),
            "lower" => Some(StatSuffix::Lower),
            "upper" => Some(StatSuffix::Upper),
            "mean" => Some(StatSuffix::Mean),
            _ => None,
        }
    }

    pub fn tagged_field(&self) -> Option<Field> {
        match self {
            StatSuffix::Sum => Some(Field::Sum),
            StatSuffix::Count => Some(Field::Count),
            StatSuffix::Lower => Some(Field::Min),
            StatSuffix::Upper => Some(Field::Max),
            StatSuffix::Stdev => Some(Field::StddevM2),
            StatSuffix::SumSquares | StatSuffix::Mean => None,
        }
    }

    pub fn legacy_field(&self) -> Option<Field> {
        match self {
            StatSuffix::Sum => Some(Field::Sum),
            StatSuffix::Count => Some(Field::Count),
            StatSuffix::Lower => Some(Field::Min),
            StatSuffix::Upper => Some(Field::Max),
            StatSuffix::SumSquares => Some(Field::SumSquares),
            StatSuffix::Stdev | StatSuffix::Mean => None,
        }
    }
}

/// Value fields understood by the remote API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Value,
    Sum,
    Count,
    Min,
    Max,
    StddevM2,
    SumSquares,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Value,
        Field::Sum,
        Field::Count,
        Field::Min,
        Field::Max,
        Field::StddevM2,
        Field::SumSquares,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Value => "value",
            Field::Sum => "sum",
            Field::Count => "count",
            Field::Min => "min",
            Field::Max => "max",
            Field::StddevM2 => "stddev_m2",
            Field::SumSquares => "sum_squares",
        }
    }
}

/// Split `base.suffix` for the known statistic suffixes.
///
/// Names without a known suffix, including percentiles and `median`, are
/// returned whole.
pub fn split_multipart(name: &str) -> (&str, Option<StatSuffix>) {
    if let Some((base, suffix)) = name.rsplit_once('.')
        && !base.is_empty()
        && let Some(stat) = StatSuffix::parse(suffix)
    {
        return (base, Some(stat));
    }
    (name, None)
}
