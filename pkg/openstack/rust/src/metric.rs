// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::errors::{Error, Result};

/// Constant label set, kept sorted by name.
pub type Labels = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Gauge => write!(f, "gauge"),
            MetricKind::Counter => write!(f, "counter"),
        }
    }
}

/// Registered identity and shape of a metric, independent of any value.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    fq_name: String,
    help: String,
    label_names: Vec<String>,
    const_labels: Labels,
}

impl Descriptor {
    pub fn new(fq_name: &str, help: &str, label_names: &[&str], const_labels: Labels) -> Self {
        Self {
            fq_name: fq_name.to_string(),
            help: help.to_string(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
            const_labels,
        }
    }

    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    pub fn const_labels(&self) -> &Labels {
        &self.const_labels
    }
}

/// `<namespace>_<subsystem>_<name>`, skipping empty parts.
pub fn fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// One value of a registered metric.
///
/// The only constructor checks the label values against the descriptor, so a
/// `Sample` always carries exactly as many values as its descriptor has labels.
#[derive(Debug, Clone)]
pub struct Sample {
    desc: Arc<Descriptor>,
    kind: MetricKind,
    value: f64,
    label_values: Vec<String>,
}

impl Sample {
    pub fn new(desc: Arc<Descriptor>, kind: MetricKind, value: f64, label_values: &[&str]) -> Result<Self> {
        if label_values.len() != desc.label_names.len() {
            return Err(Error::LabelArity {
                name: desc.fq_name.clone(),
                expected: desc.label_names.len(),
                got: label_values.len(),
            });
        }
        Ok(Self {
            desc,
            kind,
            value,
            label_values: label_values.iter().map(|v| v.to_string()).collect(),
        })
    }

    pub fn desc(&self) -> &Descriptor {
        &self.desc
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Value of the named variable or constant label.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .label_names
            .iter()
            .position(|l| l == name)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
            .or_else(|| self.desc.const_labels.get(name).map(String::as_str))
    }
}

/// Receiver of collected samples. Submission cannot fail: every error is dealt
/// with before a sample is built.
pub trait Sink {
    fn submit(&self, sample: Sample);
}

/// Sink keeping every sample in memory, in submission order.
#[derive(Debug, Default)]
pub struct Buffer {
    samples: Mutex<Vec<Sample>>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.samples.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for Buffer {
    fn submit(&self, sample: Sample) {
        self.samples
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sample);
    }
}
