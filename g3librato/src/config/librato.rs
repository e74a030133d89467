/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

use anyhow::{Context, anyhow};
use regex::Regex;
use yaml_rust::{Yaml, yaml};

use super::yaml as y;
use crate::types::TagSet;

const DEFAULT_API: &str = "https://metrics-api.librato.com";
const GLOBAL_HOST_TAG_NAME: &str = "host";

#[derive(Clone, Debug)]
pub struct LibratoSinkConfig {
    pub(crate) email: String,
    pub(crate) token: String,
    pub(crate) api: String,
    pub(crate) source: Option<String>,
    pub(crate) source_regex: Option<Regex>,
    pub(crate) source_prefix: Option<String>,
    pub(crate) host: Option<String>,
    pub(crate) floor_time_secs: Option<NonZeroU64>,
    pub(crate) prefix: Option<String>,
    pub(crate) extended_counters: bool,
    pub(crate) write_to_legacy: bool,
    pub(crate) global_tags: TagSet,
    pub(crate) flush_timeout: Duration,
    pub(crate) max_metrics_payload: NonZeroUsize,
}

impl Default for LibratoSinkConfig {
    fn default() -> Self {
        LibratoSinkConfig {
            email: String::new(),
            token: String::new(),
            api: DEFAULT_API.to_string(),
            source: None,
            source_regex: None,
            source_prefix: None,
            host: None,
            floor_time_secs: None,
            prefix: None,
            extended_counters: false,
            write_to_legacy: false,
            global_tags: TagSet::default(),
            flush_timeout: Duration::from_secs(5),
            max_metrics_payload: NonZeroUsize::new(500).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl LibratoSinkConfig {
    pub fn parse(map: &yaml::Hash) -> anyhow::Result<Self> {
        let mut config = LibratoSinkConfig::default();

        y::foreach_kv(map, |k, v| config.set(k, v))?;

        config.check()?;
        Ok(config)
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match y::normalize_key(k).as_str() {
            "email" => {
                self.email = y::as_string(v)?;
                Ok(())
            }
            "token" => {
                self.token = y::as_string(v)?;
                Ok(())
            }
            "api" => {
                self.api = y::as_string(v)?;
                Ok(())
            }
            "source" => {
                self.source = y::as_optional_string(v)?;
                Ok(())
            }
            "source_regex" => {
                let regex = y::as_regex(v).context(format!("invalid regex value for key {k}"))?;
                if regex.captures_len() < 2 {
                    return Err(anyhow!("no capture group found in source regex"));
                }
                self.source_regex = Some(regex);
                Ok(())
            }
            "source_prefix" => {
                self.source_prefix = y::as_optional_string(v)?;
                Ok(())
            }
            "host" => {
                self.host = y::as_optional_string(v)?;
                Ok(())
            }
            "floor_time_secs" => {
                let secs = y::as_nonzero_u64(v)
                    .context(format!("invalid nonzero u64 value for key {k}"))?;
                self.floor_time_secs = Some(secs);
                Ok(())
            }
            "prefix" => {
                self.prefix = y::as_optional_string(v)?;
                Ok(())
            }
            "extended_counters" => {
                self.extended_counters = y::as_bool(v)?;
                Ok(())
            }
            "write_to_legacy" => {
                self.write_to_legacy = y::as_bool(v)?;
                Ok(())
            }
            "tags" | "global_tags" => {
                self.global_tags =
                    y::as_tag_set(v).context(format!("invalid tags value for key {k}"))?;
                Ok(())
            }
            "flush_timeout" => {
                self.flush_timeout = y::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "max_metrics_payload" => {
                self.max_metrics_payload = y::as_nonzero_usize(v)
                    .context(format!("invalid nonzero usize value for key {k}"))?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    fn check(&mut self) -> anyhow::Result<()> {
        if self.email.is_empty() {
            return Err(anyhow!("email must be set"));
        }
        if self.token.is_empty() {
            return Err(anyhow!("token must be set"));
        }
        if self.api.is_empty() {
            return Err(anyhow!("api must not be empty"));
        }
        while self.api.ends_with('/') {
            self.api.pop();
        }

        let host = match self.host.take() {
            Some(host) => host,
            None => hostname::get()
                .context("failed to get local hostname")?
                .to_string_lossy()
                .into_owned(),
        };
        self.global_tags
            .insert(GLOBAL_HOST_TAG_NAME.to_string(), host.clone());
        self.host = Some(host);
        Ok(())
    }

    pub fn write_to_legacy(&self) -> bool {
        self.write_to_legacy
    }

    pub fn global_tags(&self) -> &TagSet {
        &self.global_tags
    }
}
