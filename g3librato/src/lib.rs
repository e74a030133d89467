/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub mod config;
pub mod export;
pub mod log;
pub mod opts;
pub mod sink;
pub mod source;
pub mod store;
pub mod types;

mod build;

pub use sink::{BuildStats, LibratoSink};
