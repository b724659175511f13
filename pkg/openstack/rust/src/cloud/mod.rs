// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::{Error, Result};

pub mod client;
pub mod clouds;
pub mod types;

pub use client::{ClientOptions, OpenStackClient};
pub use clouds::{CloudConfig, find_clouds_file, load_cloud};
pub use types::*;

/// Read access to the OpenStack resources the collectors need. Every call
/// lists the complete collection, following pagination.
pub trait CloudApi: Send + Sync {
    // network
    fn floating_ips(&self) -> Result<Vec<FloatingIp>>;
    fn networks(&self) -> Result<Vec<Network>>;
    fn subnets(&self) -> Result<Vec<Subnet>>;
    fn subnet_pools(&self) -> Result<Vec<SubnetPool>>;
    fn network_agents(&self) -> Result<Vec<NetworkAgent>>;
    fn network_ip_availabilities(&self) -> Result<Vec<NetworkIpAvailability>>;
    fn ports(&self) -> Result<Vec<Port>>;
    fn routers(&self) -> Result<Vec<Router>>;
    fn router_l3_agents(&self, router_id: &str) -> Result<Vec<L3Agent>>;
    fn security_groups(&self) -> Result<Vec<SecurityGroup>>;

    // compute
    fn flavors(&self) -> Result<Vec<Flavor>>;
    fn availability_zones(&self) -> Result<Vec<AvailabilityZone>>;
    fn compute_security_groups(&self) -> Result<Vec<SecurityGroup>>;
    fn compute_services(&self) -> Result<Vec<ComputeService>>;
    fn hypervisors(&self) -> Result<Vec<Hypervisor>>;
    fn aggregates(&self) -> Result<Vec<Aggregate>>;
    /// Detailed usage of every tenant.
    fn tenant_usage(&self) -> Result<Vec<TenantUsage>>;
    /// Servers of every tenant.
    fn servers(&self) -> Result<Vec<Server>>;
    fn compute_limits(&self, project_id: &str) -> Result<AbsoluteLimits>;

    // identity
    fn projects(&self, identity: &EndpointSelector) -> Result<Vec<Project>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Interface {
    #[default]
    Public,
    Internal,
    Admin,
}

impl Interface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interface::Public => "public",
            Interface::Internal => "internal",
            Interface::Admin => "admin",
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interface {
    type Err = Error;

    /// Accepts the keystone v2 spellings (`publicURL`) as well.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.strip_suffix("url").unwrap_or(&lower) {
            "public" => Ok(Interface::Public),
            "internal" => Ok(Interface::Internal),
            "admin" => Ok(Interface::Admin),
            _ => Err(Error::Config(format!("unknown endpoint interface '{s}'"))),
        }
    }
}

impl TryFrom<String> for Interface {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Which catalog endpoint to talk to for a service type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSelector {
    pub service_type: String,
    pub interface: Interface,
    pub region: Option<String>,
}

impl EndpointSelector {
    pub fn new(service_type: &str, interface: Interface, region: Option<String>) -> Self {
        Self {
            service_type: service_type.to_string(),
            interface,
            region,
        }
    }
}
