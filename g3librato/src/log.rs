/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::{self, Arguments};
use std::io::{self, IsTerminal, Write};

use anstyle::{AnsiColor, Color, Style};
use chrono::Local;
use slog::{Drain, Key, Level, LevelFilter, Logger, OwnedKVList, Record, Serializer, KV};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Build the process root logger, writing to stderr.
pub fn setup(verbose_level: u8) -> Logger {
    let level = match verbose_level {
        0 => Level::Warning,
        1 => Level::Info,
        2 => Level::Debug,
        _ => Level::Trace,
    };
    let drain = StderrDrain::new(io::stderr().is_terminal());
    let drain = LevelFilter::new(drain, level).ignore_res();
    Logger::root(drain, slog::o!())
}

struct LogValue {
    level: Level,
    message: String,
    kv_pairs: Vec<(String, String)>,
}

impl LogValue {
    fn collect(record: &Record, logger_values: &OwnedKVList) -> slog::Result<Self> {
        let mut kv_pairs = Vec::new();
        let mut serializer = KvCollector(&mut kv_pairs);
        logger_values.serialize(record, &mut serializer)?;
        record.kv().serialize(record, &mut serializer)?;
        Ok(LogValue {
            level: record.level(),
            message: record.msg().to_string(),
            kv_pairs,
        })
    }

    fn message_str(&self) -> &str {
        if self.message.is_empty() {
            "()"
        } else {
            &self.message
        }
    }

    fn write_plain<W: Write>(&self, io: &mut W) -> io::Result<()> {
        write!(io, "{}", Local::now().format(TIME_FORMAT))?;
        write!(io, " {}", self.level.as_short_str())?;
        for (k, v) in &self.kv_pairs {
            write!(io, " {k}: {v},")?;
        }
        writeln!(io, " {}", self.message_str())
    }

    fn write_console<W: Write>(&self, io: &mut W) -> io::Result<()> {
        const COLOR_MAGENTA: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta)));
        const COLOR_RED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
        const COLOR_YELLOW: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
        const COLOR_GREEN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
        const COLOR_CYAN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
        const COLOR_BLUE: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue)));
        const STYLE_BOLD: Style = Style::new().bold();

        let level_color = match self.level {
            Level::Critical => COLOR_MAGENTA,
            Level::Error => COLOR_RED,
            Level::Warning => COLOR_YELLOW,
            Level::Info => COLOR_GREEN,
            Level::Debug => COLOR_CYAN,
            Level::Trace => COLOR_BLUE,
        };
        let bold_s = STYLE_BOLD.render();
        let bold_e = STYLE_BOLD.render_reset();

        write!(io, "{}", Local::now().format(TIME_FORMAT))?;
        write!(
            io,
            " {}{}{}",
            level_color.render(),
            self.level.as_short_str(),
            level_color.render_reset(),
        )?;
        for (k, v) in &self.kv_pairs {
            write!(io, " {bold_s}{k}{bold_e}={v},")?;
        }
        writeln!(io, " {bold_s}{}{bold_e}", self.message_str())
    }
}

/// Synchronous drain, each record is written with a single `write_all`.
struct StderrDrain {
    console: bool,
}

impl StderrDrain {
    fn new(console: bool) -> Self {
        StderrDrain { console }
    }
}

impl Drain for StderrDrain {
    type Ok = ();
    type Err = io::Error;

    fn log(&self, record: &Record, logger_values: &OwnedKVList) -> io::Result<()> {
        let v = LogValue::collect(record, logger_values).map_err(io::Error::other)?;

        let mut buf: Vec<u8> = Vec::with_capacity(256);
        if self.console {
            v.write_console(&mut buf)?;
        } else {
            v.write_plain(&mut buf)?;
        }

        let mut stderr = io::stderr().lock();
        stderr.write_all(&buf)?;
        stderr.flush()
    }
}

struct KvCollector<'a>(&'a mut Vec<(String, String)>);

impl Serializer for KvCollector<'_> {
    fn emit_arguments(&mut self, key: Key, val: &Arguments) -> slog::Result {
        self.0.push((key.to_string(), fmt::format(*val)));
        Ok(())
    }
}
