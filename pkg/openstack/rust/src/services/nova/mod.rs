// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Compute service (nova) collectors.

pub mod base;
pub mod limit;
pub mod total_vms;

pub const EXPORTER: &str = "nova";
