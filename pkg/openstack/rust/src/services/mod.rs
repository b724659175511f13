// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;
use std::str::FromStr;

use crate::catalog::MetricSpec;
use crate::errors::Error;

pub mod neutron;
pub mod nova;

/// Record count as a sample value.
pub(crate) fn count(len: usize) -> f64 {
    len as f64
}

/// Configurable exporter services. Several may share one exporter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Network,
    NetworkBase,
    NetworkPort,
    NetworkRouter,
    NetworkSg,
    Compute,
    ComputeBase,
    ComputeLimit,
    ComputeTotalVms,
}

impl Service {
    pub const ALL: [Service; 9] = [
        Service::Network,
        Service::NetworkBase,
        Service::NetworkPort,
        Service::NetworkRouter,
        Service::NetworkSg,
        Service::Compute,
        Service::ComputeBase,
        Service::ComputeLimit,
        Service::ComputeTotalVms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Network => "network",
            Service::NetworkBase => "network-base",
            Service::NetworkPort => "network-port",
            Service::NetworkRouter => "network-router",
            Service::NetworkSg => "network-sg",
            Service::Compute => "compute",
            Service::ComputeBase => "compute-base",
            Service::ComputeLimit => "compute-limit",
            Service::ComputeTotalVms => "compute-total-vms",
        }
    }

    /// Short name used in metric names and disabled-metric identifiers.
    pub fn exporter_name(&self) -> &'static str {
        match self {
            Service::Network
            | Service::NetworkBase
            | Service::NetworkPort
            | Service::NetworkRouter
            | Service::NetworkSg => neutron::EXPORTER,
            Service::Compute | Service::ComputeBase | Service::ComputeLimit | Service::ComputeTotalVms => {
                nova::EXPORTER
            }
        }
    }

    pub fn metrics(&self) -> Vec<MetricSpec> {
        match self {
            Service::Network => [
                neutron::base::METRICS,
                neutron::port::METRICS,
                neutron::router::METRICS,
                neutron::security_group::METRICS,
            ]
            .concat(),
            Service::NetworkBase => neutron::base::METRICS.to_vec(),
            Service::NetworkPort => neutron::port::METRICS.to_vec(),
            Service::NetworkRouter => neutron::router::METRICS.to_vec(),
            Service::NetworkSg => neutron::security_group::METRICS.to_vec(),
            Service::Compute => [
                nova::base::METRICS,
                nova::limit::METRICS,
                nova::total_vms::METRICS,
            ]
            .concat(),
            Service::ComputeBase => nova::base::METRICS.to_vec(),
            Service::ComputeLimit => nova::limit::METRICS.to_vec(),
            Service::ComputeTotalVms => nova::total_vms::METRICS.to_vec(),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Service::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| Error::UnknownService(s.to_string()))
    }
}
