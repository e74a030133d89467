/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::num::NonZeroUsize;

use slog::{Logger, slog_debug, slog_error, slog_warn};

use crate::store::{LegacyGauge, Measurement};
use crate::types::TagSet;

mod format;

mod sender;
pub use sender::{HttpSender, PayloadSender, SubmitError};

/// The two payload shapes of the remote API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiShape {
    /// `{"measurements": [...], "tags": {...}}`
    Tagged,
    /// `{"gauges": [...]}`
    Legacy,
}

impl ApiShape {
    pub fn api_path(&self) -> &'static str {
        match self {
            ApiShape::Tagged => "/v1/measurements",
            ApiShape::Legacy => "/v1/metrics",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ApiShape::Tagged => "tagged",
            ApiShape::Legacy => "legacy",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub sent_batches: usize,
    pub failed_batches: usize,
}

/// Splits the drained store into batches and posts each one on its own.
///
/// A failed batch is logged and abandoned, it is never retried and never
/// stops the batches after it.
pub(crate) struct BatchSubmitter<S> {
    logger: Logger,
    sender: S,
    max_batch_size: NonZeroUsize,
    global_tags: TagSet,
}

impl<S> BatchSubmitter<S>
where
    S: PayloadSender,
{
    pub(crate) fn new(
        logger: Logger,
        sender: S,
        max_batch_size: NonZeroUsize,
        global_tags: TagSet,
    ) -> Self {
        BatchSubmitter {
            logger,
            sender,
            max_batch_size,
            global_tags,
        }
    }

    pub(crate) async fn submit(
        &self,
        measurements: Vec<Measurement>,
        gauges: Vec<LegacyGauge>,
    ) -> FlushStats {
        let mut stats = FlushStats::default();
        if measurements.is_empty() {
            return stats;
        }

        for batch in measurements.chunks(self.max_batch_size.get()) {
            let body = format::tagged_body(batch, &self.global_tags);
            self.send_batch(ApiShape::Tagged, batch.len(), body, &mut stats)
                .await;
        }

        for batch in gauges.chunks(self.max_batch_size.get()) {
            let body = format::legacy_body(batch);
            self.send_batch(ApiShape::Legacy, batch.len(), body, &mut stats)
                .await;
        }

        stats
    }

    async fn send_batch(
        &self,
        shape: ApiShape,
        count: usize,
        body: Vec<u8>,
        stats: &mut FlushStats,
    ) {
        match self.sender.post(shape, body).await {
            Ok(_) => {
                slog_debug!(self.logger, "batch sent";
                    "api" => shape.as_str(),
                    "count" => count,
                );
                stats.sent_batches += 1;
            }
            Err(SubmitError::Rejected(errors)) => {
                // the rest of the batch has been accepted
                slog_error!(self.logger, "part of the batch rejected: {}", errors;
                    "api" => shape.as_str(),
                    "count" => count,
                );
                stats.sent_batches += 1;
            }
            Err(e) => {
                slog_warn!(self.logger, "failed to send metrics to Librato: {}", e;
                    "api" => shape.as_str(),
                    "count" => count,
                );
                stats.failed_batches += 1;
            }
        }
    }
}
