/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde_json::{Map, Number, Value};

use crate::types::{Field, TagSet};

/// The value fields set so far on one data point. Unset fields are omitted
/// from the JSON output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldValues {
    values: [Option<f64>; Field::ALL.len()],
}

impl FieldValues {
    pub fn with(field: Field, value: f64) -> Self {
        let mut values = FieldValues::default();
        values.set(field, value);
        values
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.values[field as usize]
    }

    pub fn set(&mut self, field: Field, value: f64) {
        self.values[field as usize] = Some(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, f64)> + '_ {
        Field::ALL
            .iter()
            .filter_map(|f| self.get(*f).map(|v| (*f, v)))
    }

    fn write_json(&self, map: &mut Map<String, Value>) {
        for (field, v) in self.iter() {
            // NaN and infinity have no JSON representation
            if let Some(n) = Number::from_f64(v) {
                map.insert(field.as_str().to_string(), Value::Number(n));
            }
        }
    }
}

/// One merged data point in the tagged payload shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub name: String,
    pub tags: TagSet,
    pub time: i64,
    pub fields: FieldValues,
}

impl Measurement {
    pub fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(4 + self.fields.values.len());
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("tags".to_string(), self.tags.to_json());
        map.insert("time".to_string(), Value::Number(Number::from(self.time)));
        self.fields.write_json(&mut map);
        Value::Object(map)
    }
}

/// One data point in the flat legacy payload shape.
#[derive(Clone, Debug, PartialEq)]
pub struct LegacyGauge {
    pub name: String,
    pub source: Option<String>,
    pub measure_time: i64,
    pub fields: FieldValues,
}

impl LegacyGauge {
    pub fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(3 + self.fields.values.len());
        map.insert("name".to_string(), Value::String(self.name.clone()));
        let source = match &self.source {
            Some(s) => Value::String(s.clone()),
            None => Value::Null,
        };
        map.insert("source".to_string(), source);
        map.insert(
            "measure_time".to_string(),
            Value::Number(Number::from(self.measure_time)),
        );
        self.fields.write_json(&mut map);
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn measurement_json() {
        let mut fields = FieldValues::with(Field::Sum, 100.0);
        fields.set(Field::Count, 1.0);
        let m = Measurement {
            name: "foo".to_string(),
            tags: [("env", "prod")].into_iter().collect(),
            time: 1401577507,
            fields,
        };
        assert_eq!(
            m.to_json(),
            json!({
                "name": "foo",
                "tags": {"env": "prod"},
                "time": 1401577507,
                "sum": 100.0,
                "count": 1.0,
            })
        );
    }

    #[test]
    fn gauge_json() {
        let g = LegacyGauge {
            name: "foo".to_string(),
            source: None,
            measure_time: 10,
            fields: FieldValues::with(Field::Value, 2.5),
        };
        assert_eq!(
            g.to_json(),
            json!({"name": "foo", "source": null, "measure_time": 10, "value": 2.5})
        );
    }

    #[test]
    fn non_finite_omitted() {
        let mut fields = FieldValues::with(Field::Value, f64::NAN);
        fields.set(Field::Max, 3.0);
        let g = LegacyGauge {
            name: "foo".to_string(),
            source: Some("web1".to_string()),
            measure_time: 10,
            fields,
        };
        assert_eq!(
            g.to_json(),
            json!({"name": "foo", "source": "web1", "measure_time": 10, "max": 3.0})
        );
    }
}
