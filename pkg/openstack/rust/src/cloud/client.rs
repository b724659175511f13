// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Blocking OpenStack client: Keystone v3 authentication, catalog endpoint
//! selection and paginated listing.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::clouds::{AuthConfig, CloudConfig};
use super::types::*;
use super::{CloudApi, EndpointSelector, Interface};
use crate::errors::{Error, Result};

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const NOVA_VERSION_HEADER: &str = "X-OpenStack-Nova-API-Version";
const API_VERSION_HEADER: &str = "OpenStack-API-Version";
/// Last compute microversion serving the network proxy APIs.
const MAX_PROXY_MICROVERSION: (u32, u32) = (2, 35);
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Used when the cloud entry does not name an interface.
    pub interface: Interface,
    pub timeout: Duration,
    /// Fixed compute microversion. Discovered from the compute endpoint when unset.
    pub compute_api_version: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            interface: Interface::Public,
            timeout: Duration::from_secs(30),
            compute_api_version: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogEndpoint {
    interface: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    region_id: Option<String>,
    url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogService {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    catalog: Vec<CatalogService>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug)]
struct Session {
    token: String,
    catalog: Vec<CatalogService>,
}

impl Session {
    fn endpoint(&self, selector: &EndpointSelector) -> Result<String> {
        self.catalog
            .iter()
            .filter(|service| service.service_type == selector.service_type)
            .flat_map(|service| service.endpoints.iter())
            .find(|endpoint| {
                endpoint.interface == selector.interface.as_str()
                    && selector.region.as_ref().is_none_or(|region| {
                        endpoint.region_id.as_ref() == Some(region) || endpoint.region.as_ref() == Some(region)
                    })
            })
            .map(|endpoint| endpoint.url.trim_end_matches('/').to_string())
            .ok_or_else(|| Error::EndpointNotFound {
                service_type: selector.service_type.clone(),
                interface: selector.interface.to_string(),
                region: selector
                    .region
                    .as_ref()
                    .map(|r| format!(" in region '{r}'"))
                    .unwrap_or_default(),
            })
    }
}

pub struct OpenStackClient {
    http: Client,
    token_url: String,
    auth_request: Value,
    interface: Interface,
    region: Option<String>,
    session: Mutex<Option<Arc<Session>>>,
    compute_microversion: OnceLock<Option<String>>,
}

impl OpenStackClient {
    pub fn new(cloud: &CloudConfig, options: ClientOptions) -> Result<Self> {
        let token_url = format!("{}/auth/tokens", identity_v3_url(&cloud.auth.auth_url));

        let mut builder = Client::builder().timeout(options.timeout);
        if !cloud.verify {
            info!("SSL verification disabled on transport");
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(path) = &cloud.cacert {
            let pem = std::fs::read(path)
                .map_err(|e| Error::Config(format!("reading CA bundle {}: {e}", path.display())))?;
            let certificate = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| Error::Config(format!("parsing CA bundle {}: {e}", path.display())))?;
            builder = builder.add_root_certificate(certificate);
        }
        let http = builder.build().map_err(|source| Error::Transport {
            url: token_url.clone(),
            source,
        })?;

        let compute_microversion = OnceLock::new();
        if let Some(version) = options.compute_api_version {
            let _ = compute_microversion.set(Some(version));
        }

        Ok(Self {
            http,
            auth_request: auth_request(cloud)?,
            token_url,
            interface: cloud.interface.unwrap_or(options.interface),
            region: cloud.region_name.clone(),
            session: Mutex::new(None),
            compute_microversion,
        })
    }

    fn authenticate(&self) -> Result<Session> {
        debug!("requesting token from {}", self.token_url);
        let response = self
            .http
            .post(&self.token_url)
            .json(&self.auth_request)
            .send()
            .map_err(|source| Error::Transport {
                url: self.token_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response);
            return Err(Error::Auth(format!("{} returned {status}: {body}", self.token_url)));
        }

        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| Error::Auth(format!("no {SUBJECT_TOKEN_HEADER} header in response")))?;

        let body = response.text().map_err(|source| Error::Transport {
            url: self.token_url.clone(),
            source,
        })?;
        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| Error::Decode {
            url: self.token_url.clone(),
            reason: e.to_string(),
        })?;

        info!("authenticated against {}", self.token_url);
        Ok(Session {
            token,
            catalog: parsed.token.catalog,
        })
    }

    fn session(&self) -> Result<Arc<Session>> {
        let mut guard = self.session.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(session) = guard.as_ref() {
            return Ok(Arc::clone(session));
        }
        let session = Arc::new(self.authenticate()?);
        *guard = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Drop the cached token unless another caller already replaced it.
    fn invalidate(&self, rejected: &Session) {
        let mut guard = self.session.lock().unwrap_or_else(|e| e.into_inner());
        if guard.as_ref().is_some_and(|s| s.token == rejected.token) {
            *guard = None;
        }
    }

    pub fn endpoint(&self, selector: &EndpointSelector) -> Result<String> {
        self.session()?.endpoint(selector)
    }

    fn service_url(&self, service_type: &str) -> Result<String> {
        self.endpoint(&EndpointSelector::new(service_type, self.interface, self.region.clone()))
    }

    fn network_url(&self, path: &str) -> Result<String> {
        let base = self.service_url("network")?;
        if base.ends_with("/v2.0") {
            Ok(format!("{base}{path}"))
        } else {
            Ok(format!("{base}/v2.0{path}"))
        }
    }

    fn compute_url(&self, path: &str) -> Result<String> {
        Ok(format!("{}{path}", self.service_url("compute")?))
    }

    fn microversion(&self) -> Option<String> {
        self.compute_microversion
            .get_or_init(|| {
                if let Ok(version) = std::env::var("OS_COMPUTE_API_VERSION") {
                    return Some(version);
                }
                match self.discover_microversion() {
                    Ok(version) => {
                        info!("using compute microversion {version}");
                        Some(version)
                    }
                    Err(e) => {
                        warn!("could not discover compute microversion: {e}");
                        None
                    }
                }
            })
            .clone()
    }

    fn discover_microversion(&self) -> Result<String> {
        let url = self.service_url("compute")?;
        let body = self.get_json(&url, None)?;
        body.pointer("/version/version")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::Decode {
                url,
                reason: "no version in response".to_string(),
            })
    }

    fn send(&self, url: &str, microversion: Option<&str>) -> Result<Response> {
        let mut retried = false;
        loop {
            let session = self.session()?;
            let request = with_microversion(
                self.http.get(url).header(AUTH_TOKEN_HEADER, &session.token),
                microversion,
            );
            let response = request.send().map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;

            if response.status() == StatusCode::UNAUTHORIZED && !retried {
                debug!("token rejected by {url}, authenticating again");
                self.invalidate(&session);
                retried = true;
                continue;
            }
            return Ok(response);
        }
    }

    fn get_json(&self, url: &str, microversion: Option<&str>) -> Result<Value> {
        let response = self.send(url, microversion)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                method: "GET",
                url: url.to_string(),
                status: status.as_u16(),
                body: error_body(response),
            });
        }
        let body = response.text().map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|e| Error::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetch every page of the collection `key` starting at `url`.
    fn list<T: DeserializeOwned>(&self, url: String, key: &str, microversion: Option<&str>) -> Result<Vec<T>> {
        let mut records = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                warn!("pagination of {key} came back to {url}, stopping");
                break;
            }
            let mut body = self.get_json(&url, microversion)?;
            let page = body.get_mut(key).map(Value::take).ok_or_else(|| Error::Decode {
                url: url.clone(),
                reason: format!("missing '{key}' in response"),
            })?;
            let page: Vec<T> = serde_json::from_value(page).map_err(|e| Error::Decode {
                url: url.clone(),
                reason: e.to_string(),
            })?;
            debug!("{} {key} from {url}", page.len());
            records.extend(page);

            next = next_link(&body, key);
        }
        Ok(records)
    }

    fn list_network<T: DeserializeOwned>(&self, path: &str, key: &str) -> Result<Vec<T>> {
        self.list(self.network_url(path)?, key, None)
    }

    fn list_compute<T: DeserializeOwned>(&self, path: &str, key: &str) -> Result<Vec<T>> {
        let version = self.microversion();
        self.list(self.compute_url(path)?, key, version.as_deref())
    }
}

impl CloudApi for OpenStackClient {
    fn floating_ips(&self) -> Result<Vec<FloatingIp>> {
        self.list_network("/floatingips", "floatingips")
    }

    fn networks(&self) -> Result<Vec<Network>> {
        self.list_network("/networks", "networks")
    }

    fn subnets(&self) -> Result<Vec<Subnet>> {
        self.list_network("/subnets", "subnets")
    }

    fn subnet_pools(&self) -> Result<Vec<SubnetPool>> {
        self.list_network("/subnetpools", "subnetpools")
    }

    fn network_agents(&self) -> Result<Vec<NetworkAgent>> {
        self.list_network("/agents", "agents")
    }

    fn network_ip_availabilities(&self) -> Result<Vec<NetworkIpAvailability>> {
        self.list_network("/network-ip-availabilities", "network_ip_availabilities")
    }

    fn ports(&self) -> Result<Vec<Port>> {
        self.list_network("/ports", "ports")
    }

    fn routers(&self) -> Result<Vec<Router>> {
        self.list_network("/routers", "routers")
    }

    fn router_l3_agents(&self, router_id: &str) -> Result<Vec<L3Agent>> {
        self.list_network(&format!("/routers/{router_id}/l3-agents"), "agents")
    }

    fn security_groups(&self) -> Result<Vec<SecurityGroup>> {
        self.list_network("/security-groups", "security_groups")
    }

    fn flavors(&self) -> Result<Vec<Flavor>> {
        self.list_compute("/flavors/detail", "flavors")
    }

    fn availability_zones(&self) -> Result<Vec<AvailabilityZone>> {
        self.list_compute("/os-availability-zone", "availabilityZoneInfo")
    }

    fn compute_security_groups(&self) -> Result<Vec<SecurityGroup>> {
        let version = self.microversion().map(|v| cap_microversion(&v, MAX_PROXY_MICROVERSION));
        self.list(
            self.compute_url("/os-security-groups")?,
            "security_groups",
            version.as_deref(),
        )
    }

    fn compute_services(&self) -> Result<Vec<ComputeService>> {
        self.list_compute("/os-services", "services")
    }

    fn hypervisors(&self) -> Result<Vec<Hypervisor>> {
        self.list_compute("/os-hypervisors/detail", "hypervisors")
    }

    fn aggregates(&self) -> Result<Vec<Aggregate>> {
        self.list_compute("/os-aggregates", "aggregates")
    }

    fn tenant_usage(&self) -> Result<Vec<TenantUsage>> {
        self.list_compute("/os-simple-tenant-usage?detailed=1", "tenant_usages")
    }

    fn servers(&self) -> Result<Vec<Server>> {
        self.list_compute("/servers/detail?all_tenants=true", "servers")
    }

    fn compute_limits(&self, project_id: &str) -> Result<AbsoluteLimits> {
        let url = self.compute_url(&format!("/limits?tenant_id={project_id}"))?;
        let version = self.microversion();
        let mut body = self.get_json(&url, version.as_deref())?;
        let absolute = body
            .pointer_mut("/limits/absolute")
            .map(Value::take)
            .ok_or_else(|| Error::Decode {
                url: url.clone(),
                reason: "missing 'limits.absolute' in response".to_string(),
            })?;
        serde_json::from_value(absolute).map_err(|e| Error::Decode {
            url,
            reason: e.to_string(),
        })
    }

    fn projects(&self, identity: &EndpointSelector) -> Result<Vec<Project>> {
        let base = identity_v3_url(&self.endpoint(identity)?);
        self.list(format!("{base}/projects"), "projects", None)
    }
}

/// Keystone base URL ending in `/v3`.
fn identity_v3_url(url: &str) -> String {
    let url = url.trim_end_matches('/');
    if url.ends_with("/v3") {
        url.to_string()
    } else {
        format!("{url}/v3")
    }
}

fn with_microversion(request: RequestBuilder, microversion: Option<&str>) -> RequestBuilder {
    match microversion {
        Some(version) => request
            .header(NOVA_VERSION_HEADER, version)
            .header(API_VERSION_HEADER, format!("compute {version}")),
        None => request,
    }
}

fn error_body(response: Response) -> String {
    let body = response.text().unwrap_or_default();
    body.chars().take(MAX_ERROR_BODY).collect()
}

/// `<key>_links` with `rel=next` (nova, neutron) or `links.next` (keystone).
fn next_link(body: &Value, key: &str) -> Option<String> {
    if let Some(links) = body.get(format!("{key}_links").as_str()).and_then(Value::as_array) {
        return links
            .iter()
            .find(|link| link.get("rel").and_then(Value::as_str) == Some("next"))
            .and_then(|link| link.get("href"))
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    body.pointer("/links/next")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn parse_microversion(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.trim().split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

fn cap_microversion(version: &str, max: (u32, u32)) -> String {
    match parse_microversion(version) {
        Some(parsed) if parsed > max => format!("{}.{}", max.0, max.1),
        _ => version.to_string(),
    }
}

fn domain(id: &Option<String>, name: &Option<String>) -> Option<Value> {
    match (id, name) {
        (Some(id), _) => Some(json!({ "id": id })),
        (None, Some(name)) => Some(json!({ "name": name })),
        (None, None) => None,
    }
}

fn user(auth: &AuthConfig) -> Result<Value> {
    if let Some(id) = &auth.user_id {
        return Ok(json!({ "id": id }));
    }
    let name = auth
        .username
        .as_ref()
        .ok_or_else(|| Error::Config("auth needs a username or user_id".to_string()))?;
    let domain = domain(&auth.user_domain_id, &auth.user_domain_name)
        .or_else(|| domain(&auth.domain_id, &auth.domain_name))
        .unwrap_or_else(|| json!({ "id": "default" }));
    Ok(json!({ "name": name, "domain": domain }))
}

fn scope(auth: &AuthConfig) -> Option<Value> {
    if let Some(id) = &auth.project_id {
        return Some(json!({ "project": { "id": id } }));
    }
    if let Some(name) = &auth.project_name {
        let domain = domain(&auth.project_domain_id, &auth.project_domain_name)
            .or_else(|| domain(&auth.domain_id, &auth.domain_name))
            .unwrap_or_else(|| json!({ "id": "default" }));
        return Some(json!({ "project": { "name": name, "domain": domain } }));
    }
    domain(&auth.domain_id, &auth.domain_name).map(|domain| json!({ "domain": domain }))
}

fn auth_request(cloud: &CloudConfig) -> Result<Value> {
    let auth = &cloud.auth;

    if cloud.uses_application_credential() {
        let secret = auth
            .application_credential_secret
            .as_ref()
            .ok_or_else(|| Error::Config("application credential without a secret".to_string()))?;
        let mut credential = match (&auth.application_credential_id, &auth.application_credential_name) {
            (Some(id), _) => json!({ "id": id }),
            (None, Some(name)) => json!({ "name": name, "user": user(auth)? }),
            (None, None) => {
                return Err(Error::Config(
                    "application credential needs an id or a name".to_string(),
                ));
            }
        };
        credential["secret"] = json!(secret);
        return Ok(json!({
            "auth": {
                "identity": {
                    "methods": ["application_credential"],
                    "application_credential": credential,
                }
            }
        }));
    }

    let password = auth
        .password
        .as_ref()
        .ok_or_else(|| Error::Config("password authentication without a password".to_string()))?;
    let mut user = user(auth)?;
    user["password"] = json!(password);

    let mut request = json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": { "user": user },
            }
        }
    });
    if let Some(scope) = scope(auth) {
        request["auth"]["scope"] = scope;
    }
    Ok(request)
}
