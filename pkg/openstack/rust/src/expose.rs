// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Prometheus text exposition (format 0.0.4).

use std::collections::HashMap;
use std::fmt::Write;

use crate::metric::{MetricKind, Sample};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

struct Family<'a> {
    name: &'a str,
    help: &'a str,
    kind: MetricKind,
    samples: Vec<&'a Sample>,
}

/// Render `samples` grouped by metric name, families in order of first appearance.
pub fn encode(samples: &[Sample]) -> String {
    let mut families: Vec<Family<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for sample in samples {
        let name = sample.desc().fq_name();
        let slot = *index.entry(name).or_insert_with(|| {
            families.push(Family {
                name,
                help: sample.desc().help(),
                kind: sample.kind(),
                samples: Vec::new(),
            });
            families.len() - 1
        });
        if let Some(family) = families.get_mut(slot) {
            family.samples.push(sample);
        }
    }

    let mut out = String::new();
    for family in &families {
        let _ = writeln!(out, "# HELP {} {}", family.name, escape_help(family.help));
        let _ = writeln!(out, "# TYPE {} {}", family.name, family.kind);
        for sample in &family.samples {
            write_sample(&mut out, family.name, sample);
        }
    }
    out
}

fn write_sample(out: &mut String, name: &str, sample: &Sample) {
    let desc = sample.desc();
    let mut labels: Vec<(&str, &str)> = desc
        .label_names()
        .iter()
        .map(String::as_str)
        .zip(sample.label_values().iter().map(String::as_str))
        .chain(desc.const_labels().iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .collect();
    labels.sort_by(|a, b| a.0.cmp(b.0));

    out.push_str(name);
    if !labels.is_empty() {
        out.push('{');
        for (i, (label, value)) in labels.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{label}=\"{}\"", escape_label_value(value));
        }
        out.push('}');
    }
    let _ = writeln!(out, " {}", format_value(sample.value()));
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else {
        value.to_string()
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', r"\\").replace('\n', r"\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace('"', "\\\"")
        .replace('\n', r"\n")
}
