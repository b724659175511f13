// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned {status}: {body}")]
    Api {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("no {interface} endpoint for service type '{service_type}'{region}")]
    EndpointNotFound {
        service_type: String,
        interface: String,
        region: String,
    },
    #[error("malformed prefix '{value}': {reason}")]
    MalformedPrefix { value: String, reason: String },
    #[error("malformed number in {field}: '{value}'")]
    MalformedNumber { field: &'static str, value: String },
    #[error("metric '{name}' is not registered on exporter {exporter}")]
    UnknownMetric { exporter: String, name: String },
    #[error("metric '{name}' expects {expected} label values, got {got}")]
    LabelArity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("couldn't find a handler for {0} exporter")]
    UnknownService(String),
    #[error("no endpoint options available to create an identity client")]
    NoIdentityEndpoint,
    #[error("could not generate an identifier: {0}")]
    IdGeneration(String),
    #[error("invalid cloud configuration: {0}")]
    Config(String),
}
