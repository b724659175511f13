// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::catalog::MetricSpec;
use crate::errors::Result;
use crate::exporter::ScrapeContext;
use crate::metric::Sink;
use crate::services::count;
use crate::topology::HostTopology;

const MEGABYTE: f64 = (1u64 << 20) as f64;
const GIGABYTE: f64 = (1u64 << 30) as f64;

const HYPERVISOR_LABELS: &[&str] = &["hostname", "availability_zone", "aggregates"];

pub const METRICS: &[MetricSpec] = &[
    MetricSpec::new("flavors").collect(list_flavors),
    MetricSpec::new("availability_zones").collect(list_availability_zones),
    MetricSpec::new("security_groups").collect(list_security_groups),
    MetricSpec::new("agent_state")
        .labels(&["id", "hostname", "service", "adminState", "zone", "disabledReason"])
        .collect(list_agent_states),
    MetricSpec::new("running_vms")
        .labels(HYPERVISOR_LABELS)
        .collect(list_hypervisors),
    MetricSpec::new("current_workload").labels(HYPERVISOR_LABELS),
    MetricSpec::new("vcpus_available").labels(HYPERVISOR_LABELS),
    MetricSpec::new("vcpus_used").labels(HYPERVISOR_LABELS),
    MetricSpec::new("memory_available_bytes").labels(HYPERVISOR_LABELS),
    MetricSpec::new("memory_used_bytes").labels(HYPERVISOR_LABELS),
    MetricSpec::new("local_storage_available_bytes").labels(HYPERVISOR_LABELS),
    MetricSpec::new("local_storage_used_bytes").labels(HYPERVISOR_LABELS),
    MetricSpec::new("free_disk_bytes").labels(HYPERVISOR_LABELS),
    MetricSpec::new("server_local_gb")
        .labels(&["name", "id", "tenant_id"])
        .collect(list_usage)
        .slow(),
];

fn list_flavors(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let flavors = ctx.api().flavors()?;
    ctx.gauge(sink, "flavors", count(flavors.len()), &[])
}

fn list_availability_zones(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let zones = ctx.api().availability_zones()?;
    ctx.gauge(sink, "availability_zones", count(zones.len()), &[])
}

fn list_security_groups(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let groups = ctx.api().compute_security_groups()?;
    ctx.gauge(sink, "security_groups", count(groups.len()), &[])
}

fn list_agent_states(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    for service in ctx.api().compute_services()? {
        let state = if service.state == "up" { 1.0 } else { 0.0 };
        ctx.counter(
            sink,
            "agent_state",
            state,
            &[
                &service.id,
                &service.host,
                &service.binary,
                &service.status,
                &service.zone,
                &service.disabled_reason,
            ],
        )?;
    }
    Ok(())
}

/// Capacity gauges of every hypervisor, placed by the aggregates of its
/// compute host.
fn list_hypervisors(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let hypervisors = ctx.api().hypervisors()?;
    let topology = HostTopology::from_aggregates(&ctx.api().aggregates()?);

    for hypervisor in &hypervisors {
        let host = hypervisor.service.host.as_str();
        let aggregates = topology.aggregates_label(host);
        let labels = [
            hypervisor.hypervisor_hostname.as_str(),
            topology.zone(host),
            &aggregates,
        ];

        let gauges = [
            ("running_vms", hypervisor.running_vms as f64),
            ("current_workload", hypervisor.current_workload as f64),
            ("vcpus_available", hypervisor.vcpus as f64),
            ("vcpus_used", hypervisor.vcpus_used as f64),
            ("memory_available_bytes", hypervisor.memory_mb as f64 * MEGABYTE),
            ("memory_used_bytes", hypervisor.memory_mb_used as f64 * MEGABYTE),
            ("local_storage_available_bytes", hypervisor.local_gb as f64 * GIGABYTE),
            ("local_storage_used_bytes", hypervisor.local_gb_used as f64 * GIGABYTE),
            ("free_disk_bytes", hypervisor.free_disk_gb as f64 * GIGABYTE),
        ];
        for (name, value) in gauges {
            ctx.gauge(sink, name, value, &labels)?;
        }
    }
    Ok(())
}

fn list_usage(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    for tenant in ctx.api().tenant_usage()? {
        for server in &tenant.server_usages {
            ctx.gauge(
                sink,
                "server_local_gb",
                server.local_gb,
                &[&server.name, &server.instance_id, &tenant.tenant_id],
            )?;
        }
    }
    Ok(())
}
