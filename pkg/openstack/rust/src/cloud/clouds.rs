// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use serde::Deserialize;

use super::Interface;

const CLIENT_CONFIG_ENV: &str = "OS_CLIENT_CONFIG_FILE";
const SYSTEM_CLOUDS_FILE: &str = "/etc/openstack/clouds.yaml";

fn default_true() -> bool {
    true
}

/// Credentials of one cloud entry. Either a user/password pair or an
/// application credential.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    pub auth_url: String,
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub password: Option<String>,
    pub project_name: Option<String>,
    pub project_id: Option<String>,
    pub user_domain_name: Option<String>,
    pub user_domain_id: Option<String>,
    pub project_domain_name: Option<String>,
    pub project_domain_id: Option<String>,
    pub domain_name: Option<String>,
    pub domain_id: Option<String>,
    pub application_credential_id: Option<String>,
    pub application_credential_name: Option<String>,
    pub application_credential_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudConfig {
    pub auth: AuthConfig,
    pub auth_type: Option<String>,
    pub region_name: Option<String>,
    pub interface: Option<Interface>,
    #[serde(default = "default_true")]
    pub verify: bool,
    pub cacert: Option<PathBuf>,
}

impl CloudConfig {
    pub fn uses_application_credential(&self) -> bool {
        self.auth_type.as_deref() == Some("v3applicationcredential")
            || self.auth.application_credential_secret.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct CloudsFile {
    #[serde(default)]
    clouds: HashMap<String, CloudConfig>,
}

/// Where a `clouds.yaml` is looked for, in order.
pub fn clouds_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(path) = std::env::var(CLIENT_CONFIG_ENV) {
        candidates.push(PathBuf::from(path));
    }
    candidates.push(PathBuf::from("clouds.yaml"));
    if let Ok(home) = std::env::var("HOME") {
        candidates.push(Path::new(&home).join(".config/openstack/clouds.yaml"));
    }
    candidates.push(PathBuf::from(SYSTEM_CLOUDS_FILE));
    candidates
}

/// The explicit file when given, otherwise the first existing candidate.
pub fn find_clouds_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let candidates = clouds_file_candidates();
    candidates
        .iter()
        .find(|path| {
            let exists = path.is_file();
            if !exists {
                debug!("no clouds file at {}", path.display());
            }
            exists
        })
        .cloned()
        .ok_or_else(|| {
            anyhow!(
                "no clouds.yaml found, looked in: {}",
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
}

/// Read the entry `name` of a `clouds.yaml` file.
pub fn load_cloud(path: &Path, name: &str) -> Result<CloudConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut file: CloudsFile =
        serde_yaml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
    let cloud = file
        .clouds
        .remove(name)
        .ok_or_else(|| anyhow!("cloud '{name}' not found in {}", path.display()))?;

    if cloud.auth.auth_url.trim().is_empty() {
        bail!("cloud '{name}' has no auth_url");
    }
    if !cloud.uses_application_credential() && cloud.auth.password.is_none() {
        bail!("cloud '{name}' has neither a password nor an application credential");
    }
    Ok(cloud)
}
