// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::catalog::MetricSpec;
use crate::errors::{Error, Result};
use crate::exporter::ScrapeContext;
use crate::metric::Sink;

const TENANT_LABELS: &[&str] = &["tenant", "tenant_id"];

pub const METRICS: &[MetricSpec] = &[
    MetricSpec::new("limits_vcpus_max")
        .labels(TENANT_LABELS)
        .collect(list_compute_limits)
        .slow(),
    MetricSpec::new("limits_vcpus_used").labels(TENANT_LABELS).slow(),
    MetricSpec::new("limits_memory_max").labels(TENANT_LABELS).slow(),
    MetricSpec::new("limits_memory_used").labels(TENANT_LABELS).slow(),
    MetricSpec::new("limits_instances_used").labels(TENANT_LABELS).slow(),
    MetricSpec::new("limits_instances_max").labels(TENANT_LABELS).slow(),
];

/// Absolute compute limits of every project known to the identity service.
/// A failure on any project fails the whole pass.
fn list_compute_limits(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let identity = ctx
        .config()
        .identity_endpoint
        .as_ref()
        .ok_or(Error::NoIdentityEndpoint)?;

    for project in ctx.api().projects(identity)? {
        let limits = ctx.api().compute_limits(&project.id)?;
        let labels = [project.name.as_str(), &project.id];

        let gauges = [
            ("limits_vcpus_max", limits.max_total_cores),
            ("limits_vcpus_used", limits.total_cores_used),
            ("limits_memory_max", limits.max_total_ram_size),
            ("limits_memory_used", limits.total_ram_used),
            ("limits_instances_used", limits.total_instances_used),
            ("limits_instances_max", limits.max_total_instances),
        ];
        for (name, value) in gauges {
            ctx.gauge(sink, name, value as f64, &labels)?;
        }
    }
    Ok(())
}
