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

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{error, info};
use tokio::net::TcpListener;

use openstack_exporter::cli::Args;
use openstack_exporter::cloud::{
    ClientOptions, CloudApi, EndpointSelector, OpenStackClient, find_clouds_file, load_cloud,
};
use openstack_exporter::config::{Config, load_config};
use openstack_exporter::exporter::{Exporter, ExporterConfig, ServiceExporter, gather, uuid_generator};
use openstack_exporter::{expose, server};

const IDENTITY_SERVICE_TYPE: &str = "identity";

fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level_name = args.log_level.as_deref().unwrap_or(&config.log_level);
    let level = exporter_log::parse_level(level_name)
        .ok_or_else(|| anyhow!("invalid log level '{level_name}'"))?;
    exporter_log::init(exporter_log::Config {
        level,
        file: config.log_file.clone(),
        ..exporter_log::Config::default()
    })
    .context("Failed to initialize logging")?;
    info!("Log level set to: {level}");
    Ok(())
}

fn build_exporters(config: &Config, api: &Arc<dyn CloudApi>, identity: EndpointSelector) -> Result<Vec<Arc<dyn Exporter>>> {
    let exporter_config = ExporterConfig {
        prefix: config.prefix.clone(),
        disabled_metrics: config.disabled_metrics.clone(),
        collect_time: config.collect_time,
        disable_slow_metrics: config.disable_slow_metrics,
        disable_deprecated_metrics: config.disable_deprecated_metrics,
        const_labels: config.const_labels.clone(),
        id_generator: uuid_generator(),
        identity_endpoint: Some(identity),
    };

    let mut exporters: Vec<Arc<dyn Exporter>> = Vec::new();
    for service in config.services()? {
        info!("Enabled exporter for service: {service}");
        let exporter = ServiceExporter::new(service, exporter_config.clone(), Arc::clone(api));
        exporters.push(Arc::new(exporter));
    }
    Ok(exporters)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args.config)?;
    init_logging(&args, &config)?;

    let clouds_file = find_clouds_file(config.clouds_file.as_deref())?;
    info!("Using cloud '{}' from {}", config.cloud, clouds_file.display());
    let cloud = load_cloud(&clouds_file, &config.cloud)?;

    // The blocking client owns its own runtime, so it is built and dropped
    // outside of the server's.
    let client = OpenStackClient::new(
        &cloud,
        ClientOptions {
            interface: config.endpoint_type,
            timeout: config.timeout(),
            compute_api_version: config.compute_api_version.clone(),
        },
    )
    .context("Failed to create OpenStack client")?;
    let api: Arc<dyn CloudApi> = Arc::new(client);

    let identity = EndpointSelector::new(
        IDENTITY_SERVICE_TYPE,
        cloud.interface.unwrap_or(config.endpoint_type),
        cloud.region_name.clone(),
    );
    let exporters = build_exporters(&config, &api, identity)?;

    if args.once {
        let text = expose::encode(&gather(&exporters));
        std::io::stdout()
            .write_all(text.as_bytes())
            .context("Failed to write metrics")?;
        return Ok(());
    }

    let listen = args.listen.unwrap_or(config.listen_address);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;

    let result = runtime.block_on(async {
        let listener = TcpListener::bind(&listen)
            .await
            .with_context(|| format!("Failed to listen on {listen}"))?;
        let shutdown = server::shutdown_signal()?;
        info!("Serving metrics on http://{listen}/metrics");
        server::serve(listener, Arc::from(exporters), shutdown).await
    });
    drop(runtime);
    drop(api);

    if let Err(e) = &result {
        error!("Exporter stopped: {e:#}");
    }
    result
}
