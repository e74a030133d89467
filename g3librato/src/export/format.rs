/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde_json::{Map, Value};

use crate::store::{LegacyGauge, Measurement};
use crate::types::TagSet;

pub(super) fn tagged_body(measurements: &[Measurement], global_tags: &TagSet) -> Vec<u8> {
    let mut map = Map::with_capacity(2);
    let values = measurements.iter().map(|m| m.to_json()).collect();
    map.insert("measurements".to_string(), Value::Array(values));
    map.insert("tags".to_string(), global_tags.to_json());
    Value::Object(map).to_string().into_bytes()
}

pub(super) fn legacy_body(gauges: &[LegacyGauge]) -> Vec<u8> {
    let mut map = Map::with_capacity(1);
    let values = gauges.iter().map(|g| g.to_json()).collect();
    map.insert("gauges".to_string(), Value::Array(values));
    Value::Object(map).to_string().into_bytes()
}
