// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! In-memory `CloudApi` and helpers shared by unit tests.
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(clippy::indexing_slicing)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::catalog::MetricSpec;
use crate::cloud::*;
use crate::errors::{Error, Result};
use crate::exporter::{ExporterConfig, IdGenerator, ServiceExporter};
use crate::metric::{Buffer, Sample};

pub(crate) fn injected_failure(operation: &str) -> Error {
    Error::Api {
        method: "GET",
        url: format!("fake://{operation}"),
        status: 500,
        body: "injected failure".to_string(),
    }
}

/// Generator handing out `ids` in order, then failing.
pub(crate) fn fixed_ids(ids: &[&str]) -> IdGenerator {
    let queue: Mutex<VecDeque<String>> = Mutex::new(ids.iter().map(|id| id.to_string()).collect());
    Arc::new(move || {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::IdGeneration("no more ids".to_string()))
    })
}

#[derive(Default)]
pub(crate) struct FakeCloud {
    pub floating_ips: Vec<FloatingIp>,
    pub networks: Vec<Network>,
    pub subnets: Vec<Subnet>,
    pub subnet_pools: Vec<SubnetPool>,
    pub network_agents: Vec<NetworkAgent>,
    pub network_ip_availabilities: Vec<NetworkIpAvailability>,
    pub ports: Vec<Port>,
    pub routers: Vec<Router>,
    pub l3_agents: HashMap<String, Vec<L3Agent>>,
    pub security_groups: Vec<SecurityGroup>,
    pub flavors: Vec<Flavor>,
    pub availability_zones: Vec<AvailabilityZone>,
    pub compute_security_groups: Vec<SecurityGroup>,
    pub compute_services: Vec<ComputeService>,
    pub hypervisors: Vec<Hypervisor>,
    pub aggregates: Vec<Aggregate>,
    pub tenant_usage: Vec<TenantUsage>,
    pub servers: Vec<Server>,
    pub projects: Vec<Project>,
    pub limits: HashMap<String, AbsoluteLimits>,
    pub(crate) failing: HashSet<&'static str>,
    pub(crate) identity_requests: Mutex<Vec<EndpointSelector>>,
}

impl FakeCloud {
    /// Make `operation` (the `CloudApi` method name) fail.
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    pub fn identity_requests(&self) -> Vec<EndpointSelector> {
        self.identity_requests.lock().unwrap().clone()
    }

    fn answer<T: Clone>(&self, operation: &'static str, records: &[T]) -> Result<Vec<T>> {
        if self.failing.contains(operation) {
            return Err(injected_failure(operation));
        }
        Ok(records.to_vec())
    }
}

impl CloudApi for FakeCloud {
    fn floating_ips(&self) -> Result<Vec<FloatingIp>> {
        self.answer("floating_ips", &self.floating_ips)
    }

    fn networks(&self) -> Result<Vec<Network>> {
        self.answer("networks", &self.networks)
    }

    fn subnets(&self) -> Result<Vec<Subnet>> {
        self.answer("subnets", &self.subnets)
    }

    fn subnet_pools(&self) -> Result<Vec<SubnetPool>> {
        self.answer("subnet_pools", &self.subnet_pools)
    }

    fn network_agents(&self) -> Result<Vec<NetworkAgent>> {
        self.answer("network_agents", &self.network_agents)
    }

    fn network_ip_availabilities(&self) -> Result<Vec<NetworkIpAvailability>> {
        self.answer("network_ip_availabilities", &self.network_ip_availabilities)
    }

    fn ports(&self) -> Result<Vec<Port>> {
        self.answer("ports", &self.ports)
    }

    fn routers(&self) -> Result<Vec<Router>> {
        self.answer("routers", &self.routers)
    }

    fn router_l3_agents(&self, router_id: &str) -> Result<Vec<L3Agent>> {
        let agents = self.l3_agents.get(router_id).cloned().unwrap_or_default();
        self.answer("router_l3_agents", &agents)
    }

    fn security_groups(&self) -> Result<Vec<SecurityGroup>> {
        self.answer("security_groups", &self.security_groups)
    }

    fn flavors(&self) -> Result<Vec<Flavor>> {
        self.answer("flavors", &self.flavors)
    }

    fn availability_zones(&self) -> Result<Vec<AvailabilityZone>> {
        self.answer("availability_zones", &self.availability_zones)
    }

    fn compute_security_groups(&self) -> Result<Vec<SecurityGroup>> {
        self.answer("compute_security_groups", &self.compute_security_groups)
    }

    fn compute_services(&self) -> Result<Vec<ComputeService>> {
        self.answer("compute_services", &self.compute_services)
    }

    fn hypervisors(&self) -> Result<Vec<Hypervisor>> {
        self.answer("hypervisors", &self.hypervisors)
    }

    fn aggregates(&self) -> Result<Vec<Aggregate>> {
        self.answer("aggregates", &self.aggregates)
    }

    fn tenant_usage(&self) -> Result<Vec<TenantUsage>> {
        self.answer("tenant_usage", &self.tenant_usage)
    }

    fn servers(&self) -> Result<Vec<Server>> {
        self.answer("servers", &self.servers)
    }

    fn compute_limits(&self, project_id: &str) -> Result<AbsoluteLimits> {
        if self.failing.contains("compute_limits") {
            return Err(injected_failure("compute_limits"));
        }
        Ok(self.limits.get(project_id).cloned().unwrap_or_default())
    }

    fn projects(&self, identity: &EndpointSelector) -> Result<Vec<Project>> {
        self.identity_requests.lock().unwrap().push(identity.clone());
        self.answer("projects", &self.projects)
    }
}

/// Run one collection of `metrics` under exporter name `exporter`.
pub(crate) fn collect_with(
    exporter: &str,
    metrics: &[MetricSpec],
    config: ExporterConfig,
    cloud: FakeCloud,
) -> Vec<Sample> {
    use crate::exporter::Exporter;

    let exporter = ServiceExporter::with_metrics(exporter, metrics, config, Arc::new(cloud));
    let buffer = Buffer::new();
    exporter.collect(&buffer);
    buffer.into_samples()
}

/// Samples of one fully-qualified metric name.
pub(crate) fn samples_named<'a>(samples: &'a [Sample], fq_name: &str) -> Vec<&'a Sample> {
    samples.iter().filter(|s| s.desc().fq_name() == fq_name).collect()
}

/// Value of the `up` sample, which must be the last one.
pub(crate) fn up_value(samples: &[Sample]) -> f64 {
    let last = samples.last().unwrap();
    assert!(last.desc().fq_name().ends_with("_up"), "last sample is {}", last.desc().fq_name());
    last.value()
}
