// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::catalog::MetricSpec;
use crate::errors::Result;
use crate::exporter::ScrapeContext;
use crate::metric::Sink;
use crate::services::count;

pub const METRICS: &[MetricSpec] = &[MetricSpec::new("security_groups").collect(list_security_groups)];

fn list_security_groups(ctx: &ScrapeContext<'_>, sink: &dyn Sink) -> Result<()> {
    let groups = ctx.api().security_groups()?;
    ctx.gauge(sink, "security_groups", count(groups.len()), &[])
}
