/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::num::{NonZeroU64, NonZeroUsize};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use humanize_rs::ParseError;
use regex::Regex;
use yaml_rust::{Yaml, yaml};

use crate::types::TagSet;

pub(crate) fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

pub(crate) fn foreach_kv<F>(table: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in table.iter() {
        if let Yaml::String(key) = k {
            f(key, v).context(format!("failed to parse value of key {key}"))?;
        } else {
            return Err(anyhow!("key in hash should be string"));
        }
    }
    Ok(())
}

pub(crate) fn as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) => Ok(s.to_string()),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(s) => Ok(s.to_string()),
        _ => Err(anyhow!(
            "yaml value type for string should be 'string' / 'integer' / 'real'"
        )),
    }
}

/// A string value, with `~` and empty strings meaning unset.
pub(crate) fn as_optional_string(v: &Yaml) -> anyhow::Result<Option<String>> {
    match v {
        Yaml::Null => Ok(None),
        _ => {
            let s = as_string(v)?;
            if s.is_empty() { Ok(None) } else { Ok(Some(s)) }
        }
    }
}

pub(crate) fn as_bool(v: &Yaml) -> anyhow::Result<bool> {
    match v {
        Yaml::String(s) => match s.to_lowercase().as_str() {
            "on" | "true" | "yes" | "1" => Ok(true),
            "off" | "false" | "no" | "0" => Ok(false),
            _ => Err(anyhow!("invalid yaml string value for 'bool': {s}")),
        },
        Yaml::Boolean(value) => Ok(*value),
        Yaml::Integer(i) => Ok(*i != 0),
        _ => Err(anyhow!(
            "yaml value type for 'bool' should be 'boolean' / 'string' / 'integer'"
        )),
    }
}

pub(crate) fn as_nonzero_u64(v: &Yaml) -> anyhow::Result<NonZeroU64> {
    match v {
        Yaml::String(s) => Ok(NonZeroU64::from_str(s)?),
        Yaml::Integer(i) => {
            let u = u64::try_from(*i)?;
            Ok(NonZeroU64::try_from(u)?)
        }
        _ => Err(anyhow!(
            "yaml value type for 'nonzero u64' should be 'string' or 'integer'"
        )),
    }
}

pub(crate) fn as_nonzero_usize(v: &Yaml) -> anyhow::Result<NonZeroUsize> {
    match v {
        Yaml::String(s) => Ok(NonZeroUsize::from_str(s)?),
        Yaml::Integer(i) => {
            let u = usize::try_from(*i)?;
            Ok(NonZeroUsize::try_from(u)?)
        }
        _ => Err(anyhow!(
            "yaml value type for 'nonzero usize' should be 'string' or 'integer'"
        )),
    }
}

pub(crate) fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(value) => match humanize_rs::duration::parse(value) {
            Ok(v) => Ok(v),
            Err(ParseError::MissingUnit) => {
                if let Ok(u) = u64::from_str(value) {
                    Ok(Duration::from_secs(u))
                } else if let Ok(f) = f64::from_str(value) {
                    Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
                } else {
                    Err(anyhow!("invalid duration string"))
                }
            }
            Err(e) => Err(anyhow!("invalid humanize duration string: {e}")),
        },
        Yaml::Integer(value) => {
            if let Ok(u) = u64::try_from(*value) {
                Ok(Duration::from_secs(u))
            } else {
                Err(anyhow!("unsupported duration value"))
            }
        }
        Yaml::Real(s) => {
            let f = f64::from_str(s).map_err(|e| anyhow!("invalid f64 value: {e}"))?;
            Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
        }
        _ => Err(anyhow!(
            "yaml value type for humanize duration should be 'string' or 'integer' or 'real'"
        )),
    }
}

/// Accepts both `regex` and `/regex/`.
pub(crate) fn as_regex(v: &Yaml) -> anyhow::Result<Regex> {
    let s = as_string(v)?;
    let s = if s.len() > 2 && s.starts_with('/') && s.ends_with('/') {
        &s[1..s.len() - 1]
    } else {
        s.as_str()
    };
    Regex::new(s).map_err(|e| anyhow!("invalid regex value: {e}"))
}

pub(crate) fn as_tag_set(v: &Yaml) -> anyhow::Result<TagSet> {
    if let Yaml::Hash(map) = v {
        let mut tags = TagSet::default();
        foreach_kv(map, |k, v| {
            let value = as_string(v).context("invalid tag yaml value")?;
            if tags.insert(k.to_string(), value).is_some() {
                Err(anyhow!("found duplicate value for tag name {k}"))
            } else {
                Ok(())
            }
        })?;
        Ok(tags)
    } else {
        Err(anyhow!("the yaml value type for 'tags' should be 'map'"))
    }
}
