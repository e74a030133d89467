/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::Path;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader};

mod librato;
pub use librato::LibratoSinkConfig;

mod yaml;

const CONFIG_KEY_SECTION: &str = "librato";

pub fn load(path: &Path) -> anyhow::Result<LibratoSinkConfig> {
    let content = std::fs::read_to_string(path)
        .context(format!("failed to read config file {}", path.display()))?;
    load_str(&content).context(format!("failed to load config file {}", path.display()))
}

pub fn load_str(content: &str) -> anyhow::Result<LibratoSinkConfig> {
    let docs = YamlLoader::load_from_str(content).context("invalid yaml content")?;

    let mut config = None;
    for doc in docs {
        let Yaml::Hash(map) = doc else {
            return Err(anyhow!("yaml doc root should be hash"));
        };
        yaml::foreach_kv(&map, |k, v| match yaml::normalize_key(k).as_str() {
            CONFIG_KEY_SECTION => {
                let Yaml::Hash(map) = v else {
                    return Err(anyhow!("section {k} should be a map"));
                };
                if config.is_some() {
                    return Err(anyhow!("duplicate section {k}"));
                }
                let c = LibratoSinkConfig::parse(map)
                    .context(format!("failed to load section {k}"))?;
                config = Some(c);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k} in main conf")),
        })?;
    }

    config.ok_or_else(|| anyhow!("can not locate config section '{CONFIG_KEY_SECTION}'"))
}
