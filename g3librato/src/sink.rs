/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::num::NonZeroU64;

use slog::{Logger, slog_debug, slog_info};

use crate::config::LibratoSinkConfig;
use crate::export::{BatchSubmitter, FlushStats, HttpSender, PayloadSender};
use crate::source::SourceResolver;
use crate::store::{DataPoint, MeasurementStore};
use crate::types::{
    LineParseError, LineParser, MetricKind, MetricLine, parse_tags, sanitize, split_multipart,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub accepted: usize,
    pub malformed: usize,
    pub ignored: usize,
}

/// One build-then-flush cycle over a single input chunk.
pub struct LibratoSink<S = HttpSender> {
    logger: Logger,
    floor_time_secs: Option<NonZeroU64>,
    prefix: Option<String>,
    extended_counters: bool,
    resolver: SourceResolver,
    store: MeasurementStore,
    submitter: BatchSubmitter<S>,
}

impl LibratoSink<HttpSender> {
    pub fn new(config: &LibratoSinkConfig, logger: Logger) -> anyhow::Result<Self> {
        let sender = HttpSender::new(config)?;
        Ok(LibratoSink::with_sender(config, logger, sender))
    }
}

impl<S> LibratoSink<S>
where
    S: PayloadSender,
{
    pub fn with_sender(config: &LibratoSinkConfig, logger: Logger, sender: S) -> Self {
        let store = MeasurementStore::new(
            logger.new(slog::o!("component" => "store")),
            config.write_to_legacy,
        );
        let submitter = BatchSubmitter::new(
            logger.new(slog::o!("component" => "submit")),
            sender,
            config.max_metrics_payload,
            config.global_tags.clone(),
        );
        LibratoSink {
            logger,
            floor_time_secs: config.floor_time_secs,
            prefix: config.prefix.clone(),
            extended_counters: config.extended_counters,
            resolver: SourceResolver::from_config(config),
            store,
            submitter,
        }
    }

    pub fn store(&self) -> &MeasurementStore {
        &self.store
    }

    /// Parse every line of `chunk` into the store.
    pub fn build(&mut self, chunk: &[u8]) -> BuildStats {
        let mut stats = BuildStats::default();
        for r in LineParser::new(chunk, self.floor_time_secs) {
            match r.and_then(|line| self.add_line(&line)) {
                Ok(true) => stats.accepted += 1,
                Ok(false) => stats.ignored += 1,
                Err(e) => {
                    slog_debug!(self.logger, "dropped malformed line: {}", e);
                    stats.malformed += 1;
                }
            }
        }
        stats
    }

    /// Merge one parsed line, returning false if its statistic has no
    /// remote field.
    pub fn add_line(&mut self, line: &MetricLine<'_>) -> Result<bool, LineParseError> {
        let Some((kind, name)) = MetricKind::split_key(line.key) else {
            return Err(LineParseError::UnknownType(line.key.to_string()));
        };
        let multipart = kind.is_multipart(self.extended_counters);

        // the source regex sees the name before tags are split off
        let (name, source) = self.resolver.resolve(name);

        let parsed = parse_tags(&name, multipart);
        if parsed.dropped_tags > 0 {
            slog_debug!(self.logger, "dropped {} malformed tag(s)", parsed.dropped_tags;
                "key" => line.key,
            );
        }

        let (base, stat) = if multipart {
            split_multipart(&parsed.name)
        } else {
            (parsed.name.as_str(), None)
        };
        let name = match &self.prefix {
            Some(prefix) => sanitize(&format!("{prefix}.{base}")),
            None => sanitize(base),
        };

        Ok(self.store.add(DataPoint {
            name,
            source: source.map(|s| sanitize(&s)),
            tags: parsed.tags,
            time: line.timestamp,
            stat,
            value: line.value,
        }))
    }

    /// Submit everything built so far. The sink is consumed, a new chunk
    /// needs a new sink.
    pub async fn flush(self) -> FlushStats {
        let measurement_count = self.store.measurement_count();
        let gauge_count = self.store.gauge_count();
        let (measurements, gauges) = self.store.into_parts();
        let stats = self.submitter.submit(measurements, gauges).await;
        slog_info!(self.logger, "flush finished";
            "measurements" => measurement_count,
            "gauges" => gauge_count,
            "sent_batches" => stats.sent_batches,
            "failed_batches" => stats.failed_batches,
        );
        stats
    }
}
