// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::catalog::MetricSpec;
use crate::errors::Result;
use crate::exporter::ScrapeContext;
use crate::metric::Sink;
use crate::services::count;

/// Known server states. A state's position is the value of `server_status`.
pub const SERVER_STATUS: [&str; 21] = [
    "ACTIVE",
    "BUILD",
    "BUILD(spawning)",
    "DELETED",
    "ERROR",
    "HARD_REBOOT",
    "PASSWORD",
    "REBOOT",
    "REBUILD",
    "RESCUE",
    "RESIZE",
    "SHUTOFF",
    "SUSPENDED",
    "UNKNOWN",
    "VERIFY_RESIZE",
    "MIGRATING",
    "PAUSED",
    "REVERT_RESIZE",
    "SHELVED",
    "SHELVED_OFFLOADED",
    "SOFT_DELETED",
];

pub const METRICS: &[MetricSpec] = &[
    MetricSpec::new("total_vms").collect(list_all_servers),
    MetricSpec::new("server_status").labels(&[
        "id",
        "status",
        "name",
        "tenant_id",
        "user_id",
        "address_ipv4",
        "address_ipv6",
        "host_id",
        "hypervisor_hostname",
        "uuid",
        "availability_zone",
        "flavor_id",
    ]),
];

/// Index of `status` in [`SERVER_STATUS`], -1 when unknown.
pub fn server_status_index(status: &str) -> f64 {
    SERVER_STATUS
        .iter()
        .position(|known| *known == status)
        .map_or(-1.0, |idx| idx as f64)
}

fn list_all_servers(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let servers = ctx.api().servers()?;
    ctx.gauge(sink, "total_vms", count(servers.len()), &[])?;

    for server in &servers {
        let flavor_id = server.flavor_id();
        ctx.gauge(
            sink,
            "server_status",
            server_status_index(&server.status),
            &[
                &server.id,
                &server.status,
                &server.name,
                &server.tenant_id,
                &server.user_id,
                &server.access_ipv4,
                &server.access_ipv6,
                &server.host_id,
                &server.hypervisor_hostname,
                &server.id,
                &server.availability_zone,
                &flavor_id,
            ],
        )?;
    }
    Ok(())
}
