// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Network service (neutron) collectors.

pub mod base;
pub mod port;
pub mod router;
pub mod security_group;

pub const EXPORTER: &str = "neutron";
