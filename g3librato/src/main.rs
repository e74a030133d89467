/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Read};

use anyhow::Context;
use slog::{Logger, slog_debug, slog_error, slog_info};

use g3librato::LibratoSink;
use g3librato::opts::ProcArgs;

fn main() -> anyhow::Result<()> {
    let Some(proc_args) =
        g3librato::opts::parse_clap().context("failed to parse command line options")?
    else {
        return Ok(());
    };

    let logger = g3librato::log::setup(proc_args.verbose_level);

    let config = match g3librato::config::load(&proc_args.config_file) {
        Ok(config) => config,
        Err(e) => {
            slog_error!(logger, "failed to load config: {e:?}";
                "file" => %proc_args.config_file.display(),
            );
            return Err(e);
        }
    };
    slog_debug!(logger, "loaded config from {}", proc_args.config_file.display());

    if proc_args.test_config {
        slog_info!(logger, "the format of the config file is ok");
        return Ok(());
    }

    let ret = run(&proc_args, &config, &logger);
    if let Err(e) = &ret {
        slog_error!(logger, "{e:?}");
    }
    ret
}

fn read_input(args: &ProcArgs) -> anyhow::Result<Vec<u8>> {
    match &args.input {
        Some(path) => std::fs::read(path).context(format!("failed to read input file {}", path.display())),
        None => {
            let mut buf = Vec::with_capacity(64 * 1024);
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn run(
    args: &ProcArgs,
    config: &g3librato::config::LibratoSinkConfig,
    logger: &Logger,
) -> anyhow::Result<()> {
    let chunk = read_input(args)?;

    let mut sink = LibratoSink::new(config, logger.new(slog::o!("component" => "sink")))
        .context("failed to create librato sink")?;
    let stats = sink.build(&chunk);
    slog_debug!(logger, "input chunk parsed";
        "accepted" => stats.accepted,
        "malformed" => stats.malformed,
        "ignored" => stats.ignored,
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    rt.block_on(sink.flush());
    Ok(())
}
