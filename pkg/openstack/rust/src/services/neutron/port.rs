// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::catalog::MetricSpec;
use crate::errors::Result;
use crate::exporter::ScrapeContext;
use crate::metric::Sink;
use crate::services::count;

const LOADBALANCER_OWNER: &str = "neutron:LOADBALANCERV2";

pub const METRICS: &[MetricSpec] = &[
    MetricSpec::new("port")
        .labels(&[
            "uuid",
            "network_id",
            "mac_address",
            "device_owner",
            "status",
            "binding_vif_type",
            "admin_state_up",
        ])
        .collect(list_ports),
    MetricSpec::new("ports"),
    MetricSpec::new("ports_no_ips"),
    MetricSpec::new("ports_lb_not_active"),
];

fn list_ports(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let ports = ctx.api().ports()?;

    let mut no_ips = 0usize;
    let mut lb_not_active = 0usize;
    for port in &ports {
        let active = port.status == "ACTIVE";
        if active && port.fixed_ips.is_empty() {
            no_ips += 1;
        }
        if port.device_owner == LOADBALANCER_OWNER && !active {
            lb_not_active += 1;
        }

        let admin_state_up = port.admin_state_up.to_string();
        ctx.gauge(
            sink,
            "port",
            1.0,
            &[
                &port.id,
                &port.network_id,
                &port.mac_address,
                &port.device_owner,
                &port.status,
                &port.vif_type,
                &admin_state_up,
            ],
        )?;
    }

    ctx.gauge(sink, "ports", count(ports.len()), &[])?;
    ctx.gauge(sink, "ports_lb_not_active", count(lb_not_active), &[])?;
    ctx.gauge(sink, "ports_no_ips", count(no_ips), &[])
}
