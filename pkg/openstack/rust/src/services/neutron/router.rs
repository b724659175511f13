// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::catalog::MetricSpec;
use crate::errors::Result;
use crate::exporter::ScrapeContext;
use crate::metric::Sink;
use crate::services::count;

pub const METRICS: &[MetricSpec] = &[
    MetricSpec::new("router").labels(&[
        "id",
        "name",
        "project_id",
        "admin_state_up",
        "status",
        "external_network_id",
    ]),
    MetricSpec::new("routers").collect(list_routers),
    MetricSpec::new("routers_not_active"),
    MetricSpec::new("l3_agent_of_router").labels(&[
        "router_id",
        "l3_agent_id",
        "ha_state",
        "agent_alive",
        "agent_admin_up",
        "agent_host",
    ]),
];

/// Routers with their hosting L3 agents. One agent listing per router.
fn list_routers(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let routers = ctx.api().routers()?;

    let mut not_active = 0usize;
    for router in &routers {
        if router.status != "ACTIVE" {
            not_active += 1;
        }

        for agent in ctx.api().router_l3_agents(&router.id)? {
            let alive = agent.alive.to_string();
            let admin_up = agent.admin_state_up.to_string();
            ctx.gauge(
                sink,
                "l3_agent_of_router",
                if agent.alive { 1.0 } else { 0.0 },
                &[&router.id, &agent.id, &agent.ha_state, &alive, &admin_up, &agent.host],
            )?;
        }

        let admin_state_up = router.admin_state_up.to_string();
        ctx.gauge(
            sink,
            "router",
            1.0,
            &[
                &router.id,
                &router.name,
                &router.project_id,
                &admin_state_up,
                &router.status,
                &router.external_gateway_info.network_id,
            ],
        )?;
    }

    ctx.gauge(sink, "routers", count(routers.len()), &[])?;
    ctx.gauge(sink, "routers_not_active", count(not_active), &[])
}
