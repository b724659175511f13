// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Correctness
#![deny(clippy::indexing_slicing)]
#![deny(clippy::string_slice)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::undocumented_unsafe_blocks)]
// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

pub mod address_space;
pub mod catalog;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod errors;
pub mod exporter;
pub mod expose;
pub mod metric;
pub mod server;
pub mod services;
pub mod topology;

#[cfg(test)]
pub(crate) mod test_utils;

pub use errors::{Error, Result};
pub use exporter::{Exporter, ExporterConfig, ServiceExporter, gather};
pub use metric::{Sample, Sink};
pub use services::Service;
