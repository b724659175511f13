// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::HashMap;

use crate::address_space::{AddressPool, Prefix, parse_prefix};
use crate::catalog::MetricSpec;
use crate::errors::{Error, Result};
use crate::exporter::ScrapeContext;
use crate::metric::Sink;
use crate::services::count;

const ACTIVE: &str = "ACTIVE";

const IP_AVAILABILITY_LABELS: &[&str] = &[
    "network_id",
    "network_name",
    "ip_version",
    "cidr",
    "subnet_name",
    "project_id",
];

const SUBNET_POOL_LABELS: &[&str] = &[
    "ip_version",
    "prefix",
    "prefix_length",
    "project_id",
    "subnet_pool_id",
    "subnet_pool_name",
];

pub const METRICS: &[MetricSpec] = &[
    MetricSpec::new("floating_ips").collect(list_floating_ips),
    MetricSpec::new("floating_ips_associated_not_active"),
    MetricSpec::new("floating_ip").labels(&[
        "id",
        "floating_network_id",
        "router_id",
        "status",
        "project_id",
        "floating_ip_address",
    ]),
    MetricSpec::new("networks").collect(list_networks),
    MetricSpec::new("subnets").collect(list_subnets),
    MetricSpec::new("agent_state")
        .labels(&["id", "hostname", "service", "adminState", "availability_zone"])
        .collect(list_agent_states),
    MetricSpec::new("network_ip_availabilities_total")
        .labels(IP_AVAILABILITY_LABELS)
        .collect(list_network_ip_availabilities),
    MetricSpec::new("network_ip_availabilities_used").labels(IP_AVAILABILITY_LABELS),
    MetricSpec::new("subnets_total")
        .labels(SUBNET_POOL_LABELS)
        .collect(list_subnets_per_pool),
    MetricSpec::new("subnets_used").labels(SUBNET_POOL_LABELS),
    MetricSpec::new("subnets_free").labels(SUBNET_POOL_LABELS),
];

/// Floating IPs, plus the ones bound to a fixed IP but not ACTIVE.
fn list_floating_ips(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let floating_ips = ctx.api().floating_ips()?;

    let mut not_active = 0usize;
    for fip in &floating_ips {
        ctx.gauge(
            sink,
            "floating_ip",
            1.0,
            &[
                &fip.id,
                &fip.floating_network_id,
                &fip.router_id,
                &fip.status,
                &fip.project_id,
                &fip.floating_ip_address,
            ],
        )?;
        if !fip.fixed_ip_address.is_empty() && fip.status != ACTIVE {
            not_active += 1;
        }
    }

    ctx.gauge(sink, "floating_ips", count(floating_ips.len()), &[])?;
    ctx.gauge(sink, "floating_ips_associated_not_active", count(not_active), &[])
}

fn list_networks(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let networks = ctx.api().networks()?;
    ctx.gauge(sink, "networks", count(networks.len()), &[])
}

fn list_subnets(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let subnets = ctx.api().subnets()?;
    ctx.gauge(sink, "subnets", count(subnets.len()), &[])
}

fn list_agent_states(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    for agent in ctx.api().network_agents()? {
        let state = if agent.alive { 1.0 } else { 0.0 };
        let admin_state = if agent.admin_state_up { "up" } else { "down" };
        let id = if agent.id.is_empty() {
            ctx.generate_id()?
        } else {
            agent.id
        };
        ctx.counter(
            sink,
            "agent_state",
            state,
            &[&id, &agent.host, &agent.binary, admin_state, &agent.availability_zone],
        )?;
    }
    Ok(())
}

fn parse_ip_count(field: &'static str, value: &str) -> Result<f64> {
    value.trim().parse().map_err(|_| Error::MalformedNumber {
        field,
        value: value.to_string(),
    })
}

/// Total and used addresses of every subnet, per network.
fn list_network_ip_availabilities(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    for network in ctx.api().network_ip_availabilities()? {
        let project_id = if network.project_id.is_empty() {
            &network.tenant_id
        } else {
            &network.project_id
        };

        for subnet in &network.subnet_ip_availability {
            let ip_version = subnet.ip_version.to_string();
            let labels = [
                network.network_id.as_str(),
                &network.network_name,
                &ip_version,
                &subnet.cidr,
                &subnet.subnet_name,
                project_id,
            ];
            let total = parse_ip_count("total_ips", &subnet.total_ips)?;
            ctx.gauge(sink, "network_ip_availabilities_total", total, &labels)?;
            let used = parse_ip_count("used_ips", &subnet.used_ips)?;
            ctx.gauge(sink, "network_ip_availabilities_used", used, &labels)?;
        }
    }
    Ok(())
}

/// Total, used and free subnets per pool prefix and allowed prefix length.
fn list_subnets_per_pool(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let subnets = ctx.api().subnets()?;
    let pools = ctx.api().subnet_pools()?;

    let mut allocations: HashMap<&str, Vec<Prefix>> = HashMap::new();
    for subnet in &subnets {
        if subnet.subnetpool_id.is_empty() {
            continue;
        }
        allocations
            .entry(subnet.subnetpool_id.as_str())
            .or_default()
            .push(parse_prefix(&subnet.cidr)?);
    }

    for pool in &pools {
        let address_pool = AddressPool {
            prefixes: pool
                .prefixes
                .iter()
                .map(|prefix| parse_prefix(prefix))
                .collect::<Result<_>>()?,
            min_prefix_length: pool.min_prefix_length,
            max_prefix_length: pool.max_prefix_length,
            allocations: allocations.get(pool.id.as_str()).cloned().unwrap_or_default(),
        };

        let ip_version = pool.ip_version.to_string();
        for usage in address_pool.usage() {
            let prefix = usage.prefix.to_string();
            let prefix_length = usage.prefix_length.to_string();
            let labels = [
                ip_version.as_str(),
                &prefix,
                &prefix_length,
                &pool.project_id,
                &pool.id,
                &pool.name,
            ];
            ctx.gauge(sink, "subnets_total", usage.total, &labels)?;
            ctx.gauge(sink, "subnets_used", usage.used, &labels)?;
            ctx.gauge(sink, "subnets_free", usage.free, &labels)?;
        }
    }
    Ok(())
}
