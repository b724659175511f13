// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info};

use crate::catalog::{COLLECT_SECONDS, Catalog, CollectFn, MetricSpec, UP};
use crate::cloud::{CloudApi, EndpointSelector};
use crate::errors::{Error, Result};
use crate::metric::{Descriptor, Labels, MetricKind, Sample, Sink};
use crate::services::Service;

/// Source of identifiers for records the API returns without one.
pub type IdGenerator = Arc<dyn Fn() -> Result<String> + Send + Sync>;

pub fn uuid_generator() -> IdGenerator {
    Arc::new(|| Ok(uuid::Uuid::new_v4().to_string()))
}

/// Construction-time settings shared by every exporter.
#[derive(Clone)]
pub struct ExporterConfig {
    pub prefix: String,
    /// Entries of the form `<exporter>-<metric>`, e.g. `neutron-floating_ips`.
    pub disabled_metrics: Vec<String>,
    pub collect_time: bool,
    pub disable_slow_metrics: bool,
    pub disable_deprecated_metrics: bool,
    pub const_labels: Labels,
    pub id_generator: IdGenerator,
    /// Where compute limits find the project list. Without it the limits
    /// metrics fail with [`Error::NoIdentityEndpoint`].
    pub identity_endpoint: Option<EndpointSelector>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            prefix: "openstack".to_string(),
            disabled_metrics: Vec::new(),
            collect_time: false,
            disable_slow_metrics: false,
            disable_deprecated_metrics: false,
            const_labels: Labels::new(),
            id_generator: uuid_generator(),
            identity_endpoint: None,
        }
    }
}

impl fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("prefix", &self.prefix)
            .field("disabled_metrics", &self.disabled_metrics)
            .field("collect_time", &self.collect_time)
            .field("disable_slow_metrics", &self.disable_slow_metrics)
            .field("disable_deprecated_metrics", &self.disable_deprecated_metrics)
            .field("const_labels", &self.const_labels)
            .field("identity_endpoint", &self.identity_endpoint)
            .finish_non_exhaustive()
    }
}

/// Everything a collect function may touch during one pass.
pub struct ScrapeContext<'a> {
    api: &'a dyn CloudApi,
    catalog: &'a Catalog,
    config: &'a ExporterConfig,
}

impl<'a> ScrapeContext<'a> {
    pub fn new(api: &'a dyn CloudApi, catalog: &'a Catalog, config: &'a ExporterConfig) -> Self {
        Self { api, catalog, config }
    }

    pub fn api(&self) -> &dyn CloudApi {
        self.api
    }

    pub fn config(&self) -> &ExporterConfig {
        self.config
    }

    pub fn generate_id(&self) -> Result<String> {
        (self.config.id_generator)()
    }

    /// Build a sample for the catalog metric `name` and hand it to the sink.
    ///
    /// Metrics left out by configuration are skipped without error, so a
    /// collect function may feed derived metrics that were disabled on their own.
    pub fn emit(
        &self,
        sink: &dyn Sink,
        name: &str,
        kind: MetricKind,
        value: f64,
        label_values: &[&str],
    ) -> Result<()> {
        let Some(desc) = self.catalog.descriptor(name) else {
            if self.catalog.is_suppressed(name) {
                return Ok(());
            }
            return Err(Error::UnknownMetric {
                exporter: self.catalog.exporter().to_string(),
                name: name.to_string(),
            });
        };
        sink.submit(Sample::new(Arc::clone(desc), kind, value, label_values)?);
        Ok(())
    }

    pub fn gauge(&self, sink: &dyn Sink, name: &str, value: f64, label_values: &[&str]) -> Result<()> {
        self.emit(sink, name, MetricKind::Gauge, value, label_values)
    }

    pub fn counter(&self, sink: &dyn Sink, name: &str, value: f64, label_values: &[&str]) -> Result<()> {
        self.emit(sink, name, MetricKind::Counter, value, label_values)
    }
}

/// A source of metrics for one OpenStack service.
pub trait Exporter: Send + Sync {
    /// `<prefix>_<service>`, e.g. `openstack_neutron`.
    fn name(&self) -> &str;
    fn describe(&self) -> Vec<Arc<Descriptor>>;
    /// Run one full collection pass. Failures are logged and folded into the
    /// `up` sample, which is always the last one submitted.
    fn collect(&self, sink: &dyn Sink);
    fn metric_is_disabled(&self, name: &str) -> bool;
}

pub struct ServiceExporter {
    config: ExporterConfig,
    api: Arc<dyn CloudApi>,
    catalog: Catalog,
}

impl ServiceExporter {
    pub fn new(service: Service, config: ExporterConfig, api: Arc<dyn CloudApi>) -> Self {
        Self::with_metrics(service.exporter_name(), &service.metrics(), config, api)
    }

    /// Build the exporter for a configured service name such as `network-port`.
    pub fn from_service_name(name: &str, config: ExporterConfig, api: Arc<dyn CloudApi>) -> Result<Self> {
        let service: Service = name.parse()?;
        Ok(Self::new(service, config, api))
    }

    /// Build an exporter named `exporter` from an explicit metric list. Slow and
    /// deprecated metrics are dropped here when the configuration asks for it.
    pub fn with_metrics(
        exporter: &str,
        metrics: &[MetricSpec],
        config: ExporterConfig,
        api: Arc<dyn CloudApi>,
    ) -> Self {
        let mut catalog = Catalog::new(
            exporter,
            &config.prefix,
            &config.disabled_metrics,
            config.const_labels.clone(),
        );

        for metric in metrics {
            if config.disable_deprecated_metrics && !metric.deprecated_since.is_empty() {
                debug!("skipping deprecated metric {} on {exporter} exporter", metric.name);
                catalog.suppress(metric.name);
                continue;
            }
            if config.disable_slow_metrics && metric.slow {
                debug!("skipping slow metric {} on {exporter} exporter", metric.name);
                catalog.suppress(metric.name);
                continue;
            }
            catalog.register(metric.name, metric.collect, metric.labels, metric.deprecated_since, None);
        }

        Self { config, api, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn run_collection(&self, name: &str, collect: CollectFn, sink: &dyn Sink) -> Result<()> {
        info!(
            "Collecting metrics for exporter: {}, metric: {name}",
            self.catalog.full_name()
        );
        let ctx = ScrapeContext::new(self.api.as_ref(), &self.catalog, &self.config);
        let start = Instant::now();
        collect(&ctx, sink)?;
        info!(
            "Collected metrics for exporter: {}, metric: {name}",
            self.catalog.full_name()
        );

        if self.config.collect_time {
            ctx.gauge(sink, COLLECT_SECONDS, start.elapsed().as_secs_f64(), &[name])?;
        }
        Ok(())
    }
}

impl Exporter for ServiceExporter {
    fn name(&self) -> &str {
        self.catalog.full_name()
    }

    fn describe(&self) -> Vec<Arc<Descriptor>> {
        self.catalog
            .entries()
            .map(|(_, entry)| Arc::clone(entry.desc()))
            .collect()
    }

    fn collect(&self, sink: &dyn Sink) {
        let Some(up) = self.catalog.descriptor(UP) else {
            debug!("no metrics registered on exporter {}", self.catalog.full_name());
            return;
        };

        let mut metrics_count = 0usize;
        let mut metrics_down = 0usize;
        for (name, entry) in self.catalog.entries() {
            let Some(collect) = entry.collect() else {
                debug!("No function handler set for metric: {name}");
                continue;
            };
            metrics_count += 1;

            if let Err(e) = self.run_collection(name, collect, sink) {
                error!(
                    "Failed to collect metric for exporter: {}, metric: {name}, error: {e}",
                    self.catalog.exporter()
                );
                metrics_down += 1;
            }
        }

        // Down only when every collectible metric failed.
        let value = if metrics_down >= metrics_count { 0.0 } else { 1.0 };
        match Sample::new(Arc::clone(up), MetricKind::Gauge, value, &[]) {
            Ok(sample) => sink.submit(sample),
            Err(e) => error!("could not build up metric for {}: {e}", self.catalog.full_name()),
        }
    }

    fn metric_is_disabled(&self, name: &str) -> bool {
        self.catalog.metric_is_disabled(name)
    }
}

/// Collect every exporter in turn into one sample list.
pub fn gather(exporters: &[Arc<dyn Exporter>]) -> Vec<Sample> {
    let buffer = crate::metric::Buffer::new();
    for exporter in exporters {
        exporter.collect(&buffer);
    }
    buffer.into_samples()
}
