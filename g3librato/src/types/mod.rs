/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod field;
pub use field::{Field, StatSuffix, split_multipart};

mod kind;
pub use kind::MetricKind;

mod line;
pub use line::{LineParseError, LineParser, MetricLine};

mod tag;
pub use tag::{ParsedKey, TagSet, parse_tags};

/// Replace every char outside `[-A-Za-z0-9.:_]` with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
