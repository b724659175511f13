// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Records returned by the OpenStack APIs, reduced to the fields the
//! collectors read. Nullable strings decode to empty strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifiers that are integers on older microversions and strings on newer ones.
fn int_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Counters that may exceed `u64` (IPv6 subnets) and come as numbers or strings.
fn number_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    int_or_string(deserializer)
}

fn prefix_length<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid prefix length {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid prefix length '{s}'"))),
        other => Err(serde::de::Error::custom(format!("invalid prefix length {other}"))),
    }
}

// Network

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FloatingIp {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub floating_network_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub router_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub floating_ip_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fixed_ip_address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Network {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subnet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cidr: String,
    #[serde(default)]
    pub ip_version: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnetpool_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubnetPool {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prefixes: Vec<String>,
    #[serde(rename = "min_prefixlen", deserialize_with = "prefix_length")]
    pub min_prefix_length: u32,
    #[serde(rename = "max_prefixlen", deserialize_with = "prefix_length")]
    pub max_prefix_length: u32,
    #[serde(default)]
    pub ip_version: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkAgent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub host: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub binary: String,
    #[serde(default)]
    pub alive: bool,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub availability_zone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkIpAvailability {
    #[serde(default, deserialize_with = "null_as_default")]
    pub network_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub network_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tenant_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnet_ip_availability: Vec<SubnetIpAvailability>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubnetIpAvailability {
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnet_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnet_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cidr: String,
    #[serde(default)]
    pub ip_version: u8,
    #[serde(default, deserialize_with = "number_as_string")]
    pub total_ips: String,
    #[serde(default, deserialize_with = "number_as_string")]
    pub used_ips: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixedIp {
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnet_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Port {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub network_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mac_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub device_owner: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fixed_ips: Vec<FixedIp>,
    #[serde(rename = "binding:vif_type", default, deserialize_with = "null_as_default")]
    pub vif_type: String,
    #[serde(default)]
    pub admin_state_up: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub network_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Router {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: String,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub external_gateway_info: GatewayInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct L3Agent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub host: String,
    #[serde(default)]
    pub alive: bool,
    #[serde(default)]
    pub admin_state_up: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ha_state: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityGroup {
    #[serde(default, deserialize_with = "int_or_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

// Compute

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Flavor {
    #[serde(default, deserialize_with = "int_or_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityZone {
    #[serde(rename = "zoneName", default, deserialize_with = "null_as_default")]
    pub zone_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComputeService {
    #[serde(default, deserialize_with = "int_or_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub binary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub host: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub zone: String,
    /// `enabled` or `disabled`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// `up` or `down`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled_reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HypervisorService {
    #[serde(default, deserialize_with = "null_as_default")]
    pub host: String,
}

/// Resource counters are gone from microversion 2.88 on and read as zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hypervisor {
    #[serde(default, deserialize_with = "int_or_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hypervisor_hostname: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service: HypervisorService,
    #[serde(default, deserialize_with = "null_as_default")]
    pub running_vms: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_workload: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vcpus: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vcpus_used: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub memory_mb: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub memory_mb_used: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub local_gb: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub local_gb_used: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub free_disk_gb: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Aggregate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub availability_zone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hosts: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerUsage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instance_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub local_gb: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantUsage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tenant_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub server_usages: Vec<ServerUsage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Server {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tenant_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(rename = "accessIPv4", default, deserialize_with = "null_as_default")]
    pub access_ipv4: String,
    #[serde(rename = "accessIPv6", default, deserialize_with = "null_as_default")]
    pub access_ipv6: String,
    #[serde(rename = "hostId", default, deserialize_with = "null_as_default")]
    pub host_id: String,
    #[serde(
        rename = "OS-EXT-SRV-ATTR:hypervisor_hostname",
        default,
        deserialize_with = "null_as_default"
    )]
    pub hypervisor_hostname: String,
    #[serde(rename = "OS-EXT-AZ:availability_zone", default, deserialize_with = "null_as_default")]
    pub availability_zone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flavor: BTreeMap<String, Value>,
}

impl Server {
    /// The flavor id, or an empty string on microversions that embed the
    /// flavor description instead.
    pub fn flavor_id(&self) -> String {
        match self.flavor.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

// Identity

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Project {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Absolute compute limits of one project. Unlimited is reported as -1.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsoluteLimits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_total_cores: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_cores_used: i64,
    #[serde(rename = "maxTotalRAMSize", default, deserialize_with = "null_as_default")]
    pub max_total_ram_size: i64,
    #[serde(rename = "totalRAMUsed", default, deserialize_with = "null_as_default")]
    pub total_ram_used: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_instances_used: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_total_instances: i64,
}
