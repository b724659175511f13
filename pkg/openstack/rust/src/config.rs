// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::cloud::Interface;
use crate::services::Service;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/openstack-exporter/config.yaml";

fn default_prefix() -> String {
    "openstack".to_string()
}

fn default_services() -> Vec<String> {
    vec![Service::Network.to_string(), Service::Compute.to_string()]
}

fn default_listen_address() -> String {
    "0.0.0.0:9180".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Entry of `clouds.yaml` to authenticate with.
    pub cloud: String,
    pub clouds_file: Option<PathBuf>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub endpoint_type: Interface,
    #[serde(default = "default_services")]
    pub services: Vec<String>,
    #[serde(default)]
    pub disabled_metrics: Vec<String>,
    #[serde(default)]
    pub disable_slow_metrics: bool,
    #[serde(default)]
    pub disable_deprecated_metrics: bool,
    #[serde(default)]
    pub collect_time: bool,
    #[serde(default)]
    pub const_labels: BTreeMap<String, String>,
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    /// HTTP client timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    pub compute_api_version: Option<String>,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Configured services, in configuration order.
    pub fn services(&self) -> Result<Vec<Service>> {
        let mut services: Vec<Service> = Vec::with_capacity(self.services.len());
        for name in &self.services {
            let service: Service = name.parse()?;
            // services sharing an exporter name would publish the same families twice
            if let Some(other) = services
                .iter()
                .find(|s| s.exporter_name() == service.exporter_name())
            {
                bail!(
                    "services {other} and {service} both publish {} metrics, enable only one of them",
                    service.exporter_name()
                );
            }
            services.push(service);
        }
        Ok(services)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: Config =
        serde_yaml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;

    if config.cloud.trim().is_empty() {
        bail!("{}: cloud must not be empty", path.display());
    }
    if config.timeout == 0 {
        bail!("{}: timeout must be at least one second", path.display());
    }
    config
        .services()
        .with_context(|| format!("validating services in {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[allow(clippy::expect_used)]
#[allow(clippy::panic)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;

    fn write(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_parse_minimal_config() {
        let (_dir, path) = write("cloud: mycloud\n");
        let config = load_config(&path).unwrap();

        assert_eq!(config.cloud, "mycloud");
        assert!(config.clouds_file.is_none());
        assert_eq!(config.prefix, "openstack");
        assert_eq!(config.endpoint_type, Interface::Public);
        assert_eq!(config.services().unwrap(), vec![Service::Network, Service::Compute]);
        assert!(config.disabled_metrics.is_empty());
        assert!(!config.disable_slow_metrics);
        assert!(!config.collect_time);
        assert_eq!(config.listen_address, "0.0.0.0:9180");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.compute_api_version.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
cloud: mycloud
clouds_file: /etc/openstack/clouds.yaml
prefix: os
endpoint_type: internalURL
services: [network-port, compute-total-vms]
disabled_metrics: [neutron-ports]
disable_slow_metrics: true
disable_deprecated_metrics: true
collect_time: true
const_labels:
  region: RegionOne
listen_address: "127.0.0.1:9999"
log_level: debug
log_file: /var/log/openstack-exporter.log
timeout: 5
compute_api_version: "2.87"
"#;
        let (_dir, path) = write(yaml);
        let config = load_config(&path).unwrap();

        assert_eq!(config.clouds_file, Some(PathBuf::from("/etc/openstack/clouds.yaml")));
        assert_eq!(config.prefix, "os");
        assert_eq!(config.endpoint_type, Interface::Internal);
        assert_eq!(
            config.services().unwrap(),
            vec![Service::NetworkPort, Service::ComputeTotalVms]
        );
        assert_eq!(config.disabled_metrics, vec!["neutron-ports"]);
        assert!(config.disable_slow_metrics);
        assert!(config.disable_deprecated_metrics);
        assert!(config.collect_time);
        assert_eq!(config.const_labels.get("region").map(String::as_str), Some("RegionOne"));
        assert_eq!(config.listen_address, "127.0.0.1:9999");
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/openstack-exporter.log")));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.compute_api_version.as_deref(), Some("2.87"));
    }

    #[test]
    fn test_unknown_service() {
        let (_dir, path) = write("cloud: mycloud\nservices: [network, volume]\n");
        let err = load_config(&path).unwrap_err();
        assert!(
            format!("{err:#}").contains("couldn't find a handler for volume exporter"),
            "{err:#}"
        );
    }

    #[test]
    fn test_services_sharing_an_exporter() {
        let (_dir, path) = write("cloud: mycloud\nservices: [network-base, network-port]\n");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("both publish neutron metrics"), "{err:#}");
    }

    #[test]
    fn test_rejects_bad_values() {
        let (_dir, path) = write("cloud: ''\n");
        assert!(load_config(&path).is_err());

        let (_dir, path) = write("cloud: mycloud\ntimeout: 0\n");
        assert!(load_config(&path).is_err());

        let (_dir, path) = write("cloud: mycloud\nendpoint_type: sideways\n");
        assert!(load_config(&path).is_err());

        let (_dir, path) = write("cloud: mycloud\nlisten: oops\n");
        assert!(load_config(&path).is_err());

        let (_dir, path) = write("prefix: openstack\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("reading"), "{err:#}");
    }
}
