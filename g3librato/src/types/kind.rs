/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    KeyValue,
    Counter,
    Gauge,
    Set,
    Timer,
}

impl MetricKind {
    /// Split the aggregator type prefix off a metric key.
    pub fn split_key(key: &str) -> Option<(MetricKind, &str)> {
        let (prefix, name) = key.split_once('.')?;
        if name.is_empty() {
            return None;
        }
        let kind = match prefix {
            "kv" => MetricKind::KeyValue,
            "counts" => MetricKind::Counter,
            "gauges" => MetricKind::Gauge,
            "sets" => MetricKind::Set,
            "timers" => MetricKind::Timer,
            _ => return None,
        };
        Some((kind, name))
    }

    pub fn is_multipart(&self, extended_counters: bool) -> bool {
        match self {
            MetricKind::Timer => true,
            MetricKind::Counter => extended_counters,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split() {
        assert_eq!(
            MetricKind::split_key("timers.query.sum"),
            Some((MetricKind::Timer, "query.sum"))
        );
        assert_eq!(
            MetricKind::split_key("kv.a#b=c"),
            Some((MetricKind::KeyValue, "a#b=c"))
        );
        assert_eq!(MetricKind::split_key("histograms.x"), None);
        assert_eq!(MetricKind::split_key("counts."), None);
        assert_eq!(MetricKind::split_key("counts"), None);
    }

    #[test]
    fn multipart() {
        assert!(MetricKind::Timer.is_multipart(false));
        assert!(!MetricKind::Counter.is_multipart(false));
        assert!(MetricKind::Counter.is_multipart(true));
        assert!(!MetricKind::Gauge.is_multipart(true));
    }
}
