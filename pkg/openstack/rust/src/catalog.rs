// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::{info, warn};

use crate::errors::Result;
use crate::exporter::ScrapeContext;
use crate::metric::{Descriptor, Labels, Sink, fq_name};

/// Health of the exporter, emitted once per scrape after every other metric.
pub const UP: &str = "up";
/// Per-metric collection duration, shared by every exporter.
pub const COLLECT_SECONDS: &str = "openstack_metric_collect_seconds";

const COLLECT_SECONDS_HELP: &str = "Time needed to collect metric from OpenStack API";
const COLLECT_SECONDS_LABEL: &str = "openstack_metric";
const SERVICE_LABEL: &str = "openstack_service";

/// Collection function of a metric. It may emit samples for sibling metrics
/// of the same catalog as well as its own.
pub type CollectFn = fn(&ScrapeContext<'_>, &dyn Sink) -> Result<()>;

/// Static definition of a metric, before configuration filtering.
#[derive(Clone, Copy)]
pub struct MetricSpec {
    pub name: &'static str,
    pub labels: &'static [&'static str],
    pub collect: Option<CollectFn>,
    /// Needs extra, expensive sub-queries (per-tenant usage, limits).
    pub slow: bool,
    pub deprecated_since: &'static str,
}

impl MetricSpec {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            labels: &[],
            collect: None,
            slow: false,
            deprecated_since: "",
        }
    }

    pub const fn labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    pub const fn collect(mut self, collect: CollectFn) -> Self {
        self.collect = Some(collect);
        self
    }

    pub const fn slow(mut self) -> Self {
        self.slow = true;
        self
    }

    pub const fn deprecated(mut self, since: &'static str) -> Self {
        self.deprecated_since = since;
        self
    }
}

impl fmt::Debug for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricSpec")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .field("collect", &self.collect.is_some())
            .field("slow", &self.slow)
            .field("deprecated_since", &self.deprecated_since)
            .finish()
    }
}

pub struct CatalogEntry {
    desc: Arc<Descriptor>,
    collect: Option<CollectFn>,
}

impl CatalogEntry {
    pub fn desc(&self) -> &Arc<Descriptor> {
        &self.desc
    }

    pub fn collect(&self) -> Option<CollectFn> {
        self.collect
    }
}

/// Metrics of one exporter, keyed by short metric name.
pub struct Catalog {
    exporter: String,
    full_name: String,
    disabled: HashSet<String>,
    const_labels: Labels,
    entries: BTreeMap<String, CatalogEntry>,
    suppressed: HashSet<String>,
}

impl Catalog {
    /// `exporter` is the short service name (`neutron`) used in disabled-metric
    /// identifiers; descriptors are named `<prefix>_<exporter>_<metric>`.
    pub fn new(exporter: &str, prefix: &str, disabled_metrics: &[String], const_labels: Labels) -> Self {
        Self {
            exporter: exporter.to_string(),
            full_name: fq_name(prefix, "", exporter),
            disabled: disabled_metrics.iter().cloned().collect(),
            const_labels,
            entries: BTreeMap::new(),
            suppressed: HashSet::new(),
        }
    }

    pub fn exporter(&self) -> &str {
        &self.exporter
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// True when `<exporter>-<name>` is listed in the disabled metrics.
    pub fn metric_is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(&format!("{}-{}", self.exporter, name))
    }

    /// Add a metric. Disabled metrics are skipped and registering an existing
    /// name does nothing; the first registration wins.
    pub fn register(
        &mut self,
        name: &str,
        collect: Option<CollectFn>,
        labels: &[&str],
        deprecated_since: &str,
        const_labels: Option<Labels>,
    ) {
        if self.metric_is_disabled(name) {
            warn!(
                "metric: {name} has been disabled on {} exporter, not collecting metrics",
                self.exporter
            );
            self.suppressed.insert(name.to_string());
            return;
        }

        if !deprecated_since.is_empty() {
            warn!(
                "metric: {name} has been deprecated on {} exporter in version {deprecated_since} and it will be removed in next release",
                self.exporter
            );
        }

        if self.entries.is_empty() {
            self.register_implicit();
        }

        if self.entries.contains_key(name) {
            return;
        }

        let mut merged = self.const_labels.clone();
        merged.extend(const_labels.unwrap_or_default());

        info!("Adding metric: {name} to exporter: {}", self.exporter);
        let desc = Descriptor::new(&fq_name(&self.full_name, "", name), name, labels, merged);
        self.entries.insert(
            name.to_string(),
            CatalogEntry {
                desc: Arc::new(desc),
                collect,
            },
        );
    }

    fn register_implicit(&mut self) {
        let up = Descriptor::new(
            &fq_name(&self.full_name, "", UP),
            UP,
            &[],
            self.const_labels.clone(),
        );
        self.entries.insert(
            UP.to_string(),
            CatalogEntry {
                desc: Arc::new(up),
                collect: None,
            },
        );

        let mut labels = self.const_labels.clone();
        labels.insert(SERVICE_LABEL.to_string(), self.full_name.clone());
        let collect_seconds =
            Descriptor::new(COLLECT_SECONDS, COLLECT_SECONDS_HELP, &[COLLECT_SECONDS_LABEL], labels);
        self.entries.insert(
            COLLECT_SECONDS.to_string(),
            CatalogEntry {
                desc: Arc::new(collect_seconds),
                collect: None,
            },
        );
    }

    /// Record a metric filtered out before registration (slow or deprecated).
    pub fn suppress(&mut self, name: &str) {
        self.suppressed.insert(name.to_string());
    }

    /// True for metrics left out by configuration. Samples for them are dropped.
    pub fn is_suppressed(&self, name: &str) -> bool {
        self.suppressed.contains(name) && !self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&Arc<Descriptor>> {
        self.entries.get(name).map(CatalogEntry::desc)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[allow(clippy::expect_used)]
#[allow(clippy::panic)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::errors::Error;

    fn noop(_: &ScrapeContext<'_>, _: &dyn Sink) -> Result<()> {
        Ok(())
    }

    fn failing(_: &ScrapeContext<'_>, _: &dyn Sink) -> Result<()> {
        Err(Error::NoIdentityEndpoint)
    }

    fn catalog(disabled: &[&str]) -> Catalog {
        let disabled: Vec<String> = disabled.iter().map(|d| d.to_string()).collect();
        Catalog::new("neutron", "openstack", &disabled, Labels::new())
    }

    #[test]
    fn test_register_creates_implicit_metrics() {
        let mut c = catalog(&[]);
        assert!(c.is_empty());

        c.register("networks", Some(noop), &[], "", None);
        assert_eq!(c.len(), 3);

        let up = c.descriptor(UP).unwrap();
        assert_eq!(up.fq_name(), "openstack_neutron_up");
        assert!(up.label_names().is_empty());
        assert!(c.get(UP).unwrap().collect().is_none());

        let seconds = c.descriptor(COLLECT_SECONDS).unwrap();
        assert_eq!(seconds.fq_name(), "openstack_metric_collect_seconds");
        assert_eq!(seconds.label_names(), ["openstack_metric"]);
        assert_eq!(
            seconds.const_labels().get("openstack_service").map(String::as_str),
            Some("openstack_neutron")
        );

        let networks = c.descriptor("networks").unwrap();
        assert_eq!(networks.fq_name(), "openstack_neutron_networks");
        assert_eq!(networks.help(), "networks");
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut c = catalog(&[]);
        c.register("port", Some(noop), &["uuid"], "", None);
        c.register("port", Some(failing), &["uuid", "status", "mac"], "", None);

        assert_eq!(c.len(), 3);
        assert_eq!(c.descriptor("port").unwrap().label_names(), ["uuid"]);
        let collect = c.get("port").unwrap().collect().unwrap();
        assert_eq!(collect as usize, noop as CollectFn as usize);
    }

    #[test]
    fn test_disabled_metric_is_not_registered() {
        let mut c = catalog(&["neutron-floating_ips", "nova-networks"]);
        assert!(c.metric_is_disabled("floating_ips"));
        assert!(!c.metric_is_disabled("networks"));

        c.register("floating_ips", Some(noop), &[], "", None);
        assert!(c.get("floating_ips").is_none());
        assert!(c.is_suppressed("floating_ips"));
        // the implicit metrics only appear on the first successful registration
        assert!(c.is_empty());

        c.register("networks", Some(noop), &[], "", None);
        assert!(c.get("networks").is_some());
        assert!(!c.is_suppressed("networks"));
    }

    #[test]
    fn test_deprecated_metric_is_still_registered() {
        let mut c = catalog(&[]);
        c.register("ports", None, &[], "1.4", None);
        assert!(c.get("ports").is_some());
    }

    #[test]
    fn test_const_labels_are_merged() {
        let mut exporter_labels = Labels::new();
        exporter_labels.insert("region".to_string(), "RegionOne".to_string());
        exporter_labels.insert("cloud".to_string(), "prod".to_string());
        let mut c = Catalog::new("nova", "openstack", &[], exporter_labels);

        let mut metric_labels = Labels::new();
        metric_labels.insert("cloud".to_string(), "staging".to_string());
        c.register("flavors", Some(noop), &[], "", Some(metric_labels));

        let flavors = c.descriptor("flavors").unwrap();
        assert_eq!(flavors.const_labels().get("region").unwrap(), "RegionOne");
        assert_eq!(flavors.const_labels().get("cloud").unwrap(), "staging");

        let up = c.descriptor(UP).unwrap();
        assert_eq!(up.const_labels().get("region").unwrap(), "RegionOne");
        assert_eq!(up.fq_name(), "openstack_nova_up");
    }

    #[test]
    fn test_custom_prefix() {
        let mut c = Catalog::new("neutron", "cloud", &[], Labels::new());
        c.register("routers", Some(noop), &[], "", None);
        assert_eq!(c.full_name(), "cloud_neutron");
        assert_eq!(c.descriptor("routers").unwrap().fq_name(), "cloud_neutron_routers");
    }

    #[test]
    fn test_metric_spec_builder() {
        const SPEC: MetricSpec = MetricSpec::new("server_local_gb")
            .labels(&["name", "id", "tenant_id"])
            .collect(noop)
            .slow()
            .deprecated("1.7");
        assert_eq!(SPEC.labels.len(), 3);
        assert!(SPEC.collect.is_some());
        assert!(SPEC.slow);
        assert_eq!(SPEC.deprecated_since, "1.7");
        assert!(!MetricSpec::new("x").slow);
    }
}
