/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use indexmap::IndexMap;
use slog::{Logger, slog_debug, slog_warn};

use crate::types::{Field, StatSuffix, TagSet};

mod measurement;
pub use measurement::{FieldValues, LegacyGauge, Measurement};

const LEGACY_MAX_NAME_LEN: usize = 255;
const SOURCE_TAG_NAME: &str = "source";

/// Grouping key of both indexes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub name: String,
    pub source: Option<String>,
}

impl SeriesKey {
    pub fn new(name: &str, source: Option<&str>) -> Self {
        SeriesKey {
            name: name.to_string(),
            source: source.map(|s| s.to_string()),
        }
    }
}

/// A fully resolved input line, ready to be merged.
#[derive(Clone, Debug)]
pub struct DataPoint {
    pub name: String,
    pub source: Option<String>,
    pub tags: TagSet,
    pub time: i64,
    pub stat: Option<StatSuffix>,
    pub value: f64,
}

/// Accumulates the data points of one input chunk.
///
/// `measurements` holds one entry per distinct tag set under each
/// (name, source) key, and summary lines for the same tag set are merged
/// into the existing entry. `gauges` is only filled in legacy mode and keeps
/// a single tagless entry per key.
pub struct MeasurementStore {
    logger: Logger,
    write_to_legacy: bool,
    measurements: IndexMap<SeriesKey, Vec<Measurement>>,
    gauges: IndexMap<SeriesKey, LegacyGauge>,
}

impl MeasurementStore {
    pub fn new(logger: Logger, write_to_legacy: bool) -> Self {
        MeasurementStore {
            logger,
            write_to_legacy,
            measurements: IndexMap::new(),
            gauges: IndexMap::new(),
        }
    }

    /// Merge one data point, returning false if neither shape has a field
    /// for it.
    pub fn add(&mut self, point: DataPoint) -> bool {
        let key = SeriesKey {
            name: point.name,
            source: point.source,
        };

        let tagged_field = match point.stat {
            Some(stat) => stat.tagged_field(),
            None => Some(Field::Value),
        };
        let legacy_field = match point.stat {
            Some(stat) if self.write_to_legacy => stat.legacy_field(),
            Some(_) => None,
            None if self.write_to_legacy => Some(Field::Value),
            None => None,
        };
        if tagged_field.is_none() && legacy_field.is_none() {
            slog_debug!(self.logger, "no remote field for this stat";
                "name" => &key.name,
                "stat" => ?point.stat,
            );
            return false;
        }

        if let Some(field) = tagged_field {
            let mut tags = point.tags;
            if let Some(source) = &key.source
                && !tags.contains_key(SOURCE_TAG_NAME)
            {
                tags.insert(SOURCE_TAG_NAME.to_string(), source.clone());
            }
            self.merge_measurement(&key, tags, point.time, field, point.value);
        }
        if let Some(field) = legacy_field {
            self.merge_gauge(key, point.time, field, point.value);
        }
        true
    }

    fn merge_measurement(
        &mut self,
        key: &SeriesKey,
        tags: TagSet,
        time: i64,
        field: Field,
        value: f64,
    ) {
        if let Some(list) = self.measurements.get_mut(key) {
            if let Some(m) = list.iter_mut().find(|m| m.tags == tags) {
                m.fields.set(field, value);
            } else {
                list.push(Measurement {
                    name: key.name.clone(),
                    tags,
                    time,
                    fields: FieldValues::with(field, value),
                });
            }
        } else {
            let m = Measurement {
                name: key.name.clone(),
                tags,
                time,
                fields: FieldValues::with(field, value),
            };
            self.measurements.insert(key.clone(), vec![m]);
        }
    }

    fn merge_gauge(&mut self, key: SeriesKey, time: i64, field: Field, value: f64) {
        let logger = &self.logger;
        let gauge = self.gauges.entry(key).or_insert_with_key(|key| {
            let name = truncate(&key.name, LEGACY_MAX_NAME_LEN);
            if name.len() < key.name.len() {
                slog_warn!(logger, "truncating metric to {} characters to avoid failing entire payload", LEGACY_MAX_NAME_LEN;
                    "name" => name,
                );
            }
            let source = key.source.as_deref().map(|s| {
                let source = truncate(s, LEGACY_MAX_NAME_LEN);
                if source.len() < s.len() {
                    slog_warn!(logger, "truncating source to {} characters to avoid failing entire payload", LEGACY_MAX_NAME_LEN;
                        "source" => source,
                    );
                }
                source.to_string()
            });
            LegacyGauge {
                name: name.to_string(),
                source,
                measure_time: time,
                fields: FieldValues::default(),
            }
        });
        gauge.fields.set(field, value);
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn measurement_count(&self) -> usize {
        self.measurements.values().map(|v| v.len()).sum()
    }

    pub fn gauge_count(&self) -> usize {
        self.gauges.len()
    }

    pub fn measurements(&self, key: &SeriesKey) -> Option<&[Measurement]> {
        self.measurements.get(key).map(|v| v.as_slice())
    }

    pub fn gauge(&self, key: &SeriesKey) -> Option<&LegacyGauge> {
        self.gauges.get(key)
    }

    /// Flatten both indexes in arrival order.
    pub fn into_parts(self) -> (Vec<Measurement>, Vec<LegacyGauge>) {
        let measurements = self.measurements.into_values().flatten().collect();
        let gauges = self.gauges.into_values().collect();
        (measurements, gauges)
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((p, _)) => &s[..p],
        None => s,
    }
}
