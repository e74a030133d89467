/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

const TAG_BLOCK_DELIMITER: char = '#';
const TAG_MULTI_DELIMITER: char = ',';
const TAG_VALUE_DELIMITER: char = '=';

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TagSet {
    inner: BTreeMap<String, String>,
}

impl TagSet {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(|v| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn insert(&mut self, key: String, value: String) -> Option<String> {
        self.inner.insert(key, value)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(self.inner.len());
        for (name, value) in &self.inner {
            map.insert(name.to_string(), Value::String(value.to_string()));
        }
        Value::Object(map)
    }

    /// Insert a single `key=value` token, returning false if the token is malformed.
    fn insert_token(&mut self, token: &str) -> bool {
        match token.split_once(TAG_VALUE_DELIMITER) {
            Some((k, v)) if !k.is_empty() => {
                self.inner.insert(k.to_string(), v.to_string());
                true
            }
            _ => false,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for TagSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        TagSet {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.inner.iter();
        let Some((name, value)) = iter.next() else {
            return Ok(());
        };
        write!(f, "{name}={value}")?;
        for (name, value) in iter {
            write!(f, ",{name}={value}")?;
        }
        Ok(())
    }
}

/// Result of splitting a `name#k=v,k=v` metric key.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedKey {
    pub name: String,
    pub tags: TagSet,
    /// Number of tag tokens dropped because they had no `=`.
    pub dropped_tags: usize,
}

/// Split a metric key into its bare name and tag set.
///
/// In `multipart` mode the statistic suffix the aggregator appended to the
/// whole key ends up inside the value of the last tag (`name#a=b.p90`). The
/// last dot-separated segment of that token is moved back onto the name, and
/// whatever precedes it is parsed as the tag again, so dotted tag values
/// survive as long as the suffix is the final segment.
pub fn parse_tags(key: &str, multipart: bool) -> ParsedKey {
    let Some((name, raw_tags)) = key.split_once(TAG_BLOCK_DELIMITER) else {
        return ParsedKey {
            name: key.to_string(),
            tags: TagSet::default(),
            dropped_tags: 0,
        };
    };

    let mut name = name.to_string();
    let mut tokens: Vec<&str> = raw_tags.split(TAG_MULTI_DELIMITER).collect();
    let mut tail = None;

    if multipart && let Some(last) = tokens.pop() {
        match last.rsplit_once('.') {
            Some((tag, suffix)) => {
                name.push('.');
                name.push_str(suffix);
                tail = Some(tag);
            }
            None => {
                name.push('.');
                name.push_str(last);
            }
        }
    }

    let mut tags = TagSet::default();
    let mut dropped_tags = 0;
    for token in tokens.into_iter().chain(tail) {
        if token.is_empty() {
            continue;
        }
        if !tags.insert_token(token) {
            dropped_tags += 1;
        }
    }

    ParsedKey {
        name,
        tags,
        dropped_tags,
    }
}
