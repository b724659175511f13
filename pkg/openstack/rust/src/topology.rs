// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::HashMap;

use crate::cloud::Aggregate;

const ZONE_METADATA_KEY: &str = "availability_zone";

/// Placement of compute hosts, rebuilt from the aggregate list on every scrape.
#[derive(Debug, Default)]
pub struct HostTopology {
    zones: HashMap<String, String>,
    aggregates: HashMap<String, Vec<String>>,
}

/// True for aggregates that exist only to set the zone of their hosts.
pub fn is_zone_marker(aggregate: &Aggregate) -> bool {
    aggregate.metadata.len() == 1 && aggregate.metadata.contains_key(ZONE_METADATA_KEY)
}

impl HostTopology {
    pub fn from_aggregates(aggregates: &[Aggregate]) -> Self {
        let mut topology = Self::default();
        for aggregate in aggregates {
            let zone_marker = is_zone_marker(aggregate);
            for host in &aggregate.hosts {
                // last aggregate naming a zone wins
                if !aggregate.availability_zone.is_empty() {
                    topology
                        .zones
                        .insert(host.clone(), aggregate.availability_zone.clone());
                }
                if !zone_marker {
                    topology
                        .aggregates
                        .entry(host.clone())
                        .or_default()
                        .push(aggregate.name.clone());
                }
            }
        }
        for names in topology.aggregates.values_mut() {
            names.sort();
        }
        topology
    }

    /// Zone of `host`, empty when no aggregate places it.
    pub fn zone(&self, host: &str) -> &str {
        self.zones.get(host).map(String::as_str).unwrap_or_default()
    }

    /// Sorted, comma-joined names of the non-marker aggregates holding `host`.
    pub fn aggregates_label(&self, host: &str) -> String {
        self.aggregates
            .get(host)
            .map(|names| names.join(","))
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[allow(clippy::expect_used)]
#[allow(clippy::panic)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    fn aggregate(name: &str, zone: &str, hosts: &[&str], metadata: &[(&str, &str)]) -> Aggregate {
        Aggregate {
            name: name.to_string(),
            availability_zone: zone.to_string(),
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_zone_marker_is_excluded_from_label() {
        let aggregates = [
            aggregate("az1-marker", "az1", &["h1"], &[("availability_zone", "az1")]),
            aggregate("gpu", "", &["h1"], &[("gpu", "true")]),
            aggregate("ssd", "", &["h1"], &[]),
        ];
        let topology = HostTopology::from_aggregates(&aggregates);
        assert_eq!(topology.zone("h1"), "az1");
        assert_eq!(topology.aggregates_label("h1"), "gpu,ssd");
    }

    #[test]
    fn test_aggregate_with_zone_and_more_metadata_is_listed() {
        let aggregates = [
            aggregate("zone-and-flag", "az2", &["h2"], &[("availability_zone", "az2"), ("pinned", "true")]),
            aggregate("alpha", "", &["h2"], &[]),
        ];
        let topology = HostTopology::from_aggregates(&aggregates);
        assert_eq!(topology.zone("h2"), "az2");
        assert_eq!(topology.aggregates_label("h2"), "alpha,zone-and-flag");
    }

    #[test]
    fn test_last_zone_wins() {
        let aggregates = [
            aggregate("a", "az1", &["h1", "h2"], &[("availability_zone", "az1")]),
            aggregate("b", "az2", &["h1"], &[("availability_zone", "az2")]),
            aggregate("c", "", &["h1"], &[]),
        ];
        let topology = HostTopology::from_aggregates(&aggregates);
        assert_eq!(topology.zone("h1"), "az2");
        assert_eq!(topology.zone("h2"), "az1");
        assert_eq!(topology.aggregates_label("h2"), "");
    }

    #[test]
    fn test_unknown_host() {
        let topology = HostTopology::from_aggregates(&[]);
        assert_eq!(topology.zone("missing"), "");
        assert_eq!(topology.aggregates_label("missing"), "");
    }

    #[test]
    fn test_marker_from_api_payload() {
        let marker: Aggregate = serde_json::from_value(json!({
            "name": "az-only",
            "availability_zone": "az1",
            "hosts": ["h1"],
            "metadata": {"availability_zone": "az1"}
        }))
        .unwrap();
        assert!(is_zone_marker(&marker));

        let empty: Aggregate = serde_json::from_value(json!({
            "name": "bare",
            "availability_zone": null,
            "hosts": null,
            "metadata": {}
        }))
        .unwrap();
        assert!(!is_zone_marker(&empty));
        assert!(empty.hosts.is_empty());
    }
}
