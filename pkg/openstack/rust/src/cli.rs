// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug, Clone)]
#[command(name = "openstack-exporter")]
#[command(about = "Export OpenStack resource metrics in the Prometheus text format")]
#[command(version)]
pub struct Args {
    /// Exporter configuration file
    #[arg(short, long, env = "OPENSTACK_EXPORTER_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Address to serve metrics on, overrides `listen_address`
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Run a single scrape, print it to stdout and exit
    #[arg(long)]
    pub once: bool,

    /// Log level, overrides `log_level`
    #[arg(long)]
    pub log_level: Option<String>,
}
