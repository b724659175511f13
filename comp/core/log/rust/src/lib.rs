// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! `log` backend writing agent-style lines:
//!
//! ```text
//! 2026-01-02 03:04:05 UTC | OPENSTACK-EXPORTER | INFO | (src/exporter.rs:42 in openstack_exporter::exporter) | message
//! ```

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Clone)]
pub struct Config {
    /// Upper-cased into the second column of every line.
    pub component: String,
    pub level: LevelFilter,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            component: "openstack-exporter".to_string(),
            level: LevelFilter::Info,
            file: None,
        }
    }
}

pub struct Logger {
    component: String,
    level: LevelFilter,
    out: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
    pub fn new(config: Config) -> io::Result<Self> {
        let out: Box<dyn Write + Send> = match &config.file {
            Some(path) => Box::new(OpenOptions::new().create(true).append(true).open(path)?),
            None => Box::new(io::stderr()),
        };
        Ok(Self {
            component: config.component.to_uppercase(),
            level: config.level,
            out: Mutex::new(out),
        })
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    fn format(&self, record: &Record) -> String {
        let now = OffsetDateTime::now_utc();
        let timestamp = now
            .format(TIMESTAMP_FORMAT)
            .unwrap_or_else(|_| now.unix_timestamp().to_string());
        format!(
            "{timestamp} UTC | {} | {} | ({}:{} in {}) | {}",
            self.component,
            record.level(),
            record.file().unwrap_or("<unknown>"),
            record.line().unwrap_or(0),
            record.module_path().unwrap_or("<unknown>"),
            record.args()
        )
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format(record);
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        // Nowhere left to report a failed log write.
        let _ = writeln!(out, "{line}");
    }

    fn flush(&self) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let _ = out.flush();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("could not open log output: {0}")]
    Io(#[from] io::Error),
    #[error("could not install logger: {0}")]
    SetLogger(#[from] SetLoggerError),
}

/// Install the logger as the global `log` backend. Can only succeed once per process.
pub fn init(config: Config) -> Result<(), InitError> {
    let logger = Logger::new(config)?;
    let level = logger.level();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}

/// Parse an agent log level. Accepts the `log` crate names plus `warning` and `critical`.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Some(LevelFilter::Warn),
        "critical" => Some(LevelFilter::Error),
        other => other.parse().ok(),
    }
}
