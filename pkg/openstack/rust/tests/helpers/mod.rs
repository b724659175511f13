// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const REGION: &str = "RegionOne";
pub const COMPUTE_VERSION: &str = "2.87";

/// One request seen by the fake cloud.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query string.
    pub target: String,
    pub headers: HashMap<String, String>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

#[derive(Default)]
struct State {
    base_url: Mutex<String>,
    routes: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    tokens_issued: AtomicUsize,
    reject_first_token: AtomicBool,
}

impl State {
    fn catalog(&self) -> Value {
        let base = self.base_url.lock().unwrap().clone();
        let endpoints = |url: String| {
            json!(["public", "internal", "admin"]
                .iter()
                .map(|interface| json!({
                    "interface": interface,
                    "region": REGION,
                    "region_id": REGION,
                    "url": url,
                }))
                .collect::<Vec<_>>())
        };
        json!({
            "token": {
                "catalog": [
                    {"type": "identity", "endpoints": endpoints(format!("{base}/identity"))},
                    {"type": "network", "endpoints": endpoints(format!("{base}/network"))},
                    {"type": "compute", "endpoints": endpoints(format!("{base}/compute/v2.1"))},
                ]
            }
        })
    }
}

fn json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert("content-type", "application/json".parse().unwrap());
    response
}

async fn handle(req: Request<Incoming>, state: Arc<State>) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    let headers = req
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect::<HashMap<_, _>>();
    let token = headers.get("x-auth-token").cloned();
    let _ = req.into_body().collect().await;

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        target: target.clone(),
        headers,
    });

    if method == Method::POST && target == "/identity/v3/auth/tokens" {
        let n = state.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
        let mut response = json_response(StatusCode::CREATED, &state.catalog());
        response
            .headers_mut()
            .insert("x-subject-token", format!("token-{n}").parse().unwrap());
        return Ok(response);
    }

    match token.as_deref() {
        None => return Ok(json_response(StatusCode::UNAUTHORIZED, &json!({"error": "no token"}))),
        Some("token-1") if state.reject_first_token.load(Ordering::SeqCst) => {
            return Ok(json_response(StatusCode::UNAUTHORIZED, &json!({"error": "expired"})));
        }
        Some(_) => {}
    }

    let body = state.routes.lock().unwrap().get(&target).cloned();
    Ok(match body {
        Some(body) => json_response(StatusCode::OK, &body),
        None => json_response(StatusCode::NOT_FOUND, &json!({"itemNotFound": target})),
    })
}

/// Minimal Keystone, Neutron and Nova serving canned JSON on localhost.
pub struct FakeOpenStack {
    addr: SocketAddr,
    state: Arc<State>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl FakeOpenStack {
    pub fn start() -> Self {
        let state = Arc::new(State::default());
        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server_state = Arc::clone(&state);
        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build fake cloud runtime");
            runtime.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0").await.expect("failed to bind");
                addr_tx.send(listener.local_addr().unwrap()).unwrap();
                tokio::pin!(shutdown_rx);
                loop {
                    tokio::select! {
                        accepted = listener.accept() => {
                            let Ok((stream, _)) = accepted else { continue };
                            let state = Arc::clone(&server_state);
                            tokio::spawn(async move {
                                let service = service_fn(move |req| handle(req, Arc::clone(&state)));
                                let _ = http1::Builder::new()
                                    .serve_connection(TokioIo::new(stream), service)
                                    .await;
                            });
                        }
                        _ = &mut shutdown_rx => break,
                    }
                }
            });
        });

        let addr = addr_rx.recv().expect("fake cloud did not start");
        *state.base_url.lock().unwrap() = format!("http://{addr}");
        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer GET `target` (path and query) with `body`.
    pub fn route(&self, target: &str, body: Value) {
        self.state.routes.lock().unwrap().insert(target.to_string(), body);
    }

    /// Reject the first issued token as if it had expired.
    pub fn reject_first_token(&self) {
        self.state.reject_first_token.store(true, Ordering::SeqCst);
    }

    pub fn tokens_issued(&self) -> usize {
        self.state.tokens_issued.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests whose target starts with `prefix`.
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.target.starts_with(prefix))
            .collect()
    }

    /// Write a `clouds.yaml` with a `fake` entry pointing at this server.
    pub fn write_clouds_yaml(&self, dir: &Path) -> PathBuf {
        let path = dir.join("clouds.yaml");
        let contents = format!(
            "clouds:
  fake:
    auth:
      auth_url: {}/identity
      username: admin
      password: secret
      project_name: admin
      user_domain_name: Default
      project_domain_name: Default
    region_name: {REGION}
    interface: public
",
            self.url()
        );
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Canned answers for every listing the exporters make.
    pub fn route_everything(&self) {
        self.route("/compute/v2.1", json!({"version": {"version": COMPUTE_VERSION}}));

        self.route(
            "/network/v2.0/networks",
            json!({
                "networks": [{"id": "n1", "name": "public"}, {"id": "n2", "name": "private"}],
                "networks_links": [{"rel": "next", "href": format!("{}/network/v2.0/networks?marker=n2", self.url())}]
            }),
        );
        self.route(
            "/network/v2.0/networks?marker=n2",
            json!({"networks": [{"id": "n3", "name": "shared"}], "networks_links": []}),
        );
        self.route("/network/v2.0/subnets", json!({"subnets": [
            {"id": "s1", "cidr": "10.0.0.0/26", "ip_version": 4, "subnetpool_id": "pool-1"}
        ]}));
        self.route("/network/v2.0/subnetpools", json!({"subnetpools": [
            {"id": "pool-1", "name": "shared-v4", "prefixes": ["10.0.0.0/24"],
             "min_prefixlen": "26", "max_prefixlen": "26", "ip_version": 4, "project_id": "admin"}
        ]}));
        self.route("/network/v2.0/floatingips", json!({"floatingips": [
            {"id": "f1", "floating_network_id": "n1", "router_id": null, "status": "DOWN",
             "project_id": "p1", "floating_ip_address": "172.24.4.10", "fixed_ip_address": "10.0.0.5"}
        ]}));
        self.route("/network/v2.0/agents", json!({"agents": [
            {"id": "a1", "host": "net-1", "binary": "neutron-l3-agent", "alive": true,
             "admin_state_up": true, "availability_zone": "nova"}
        ]}));
        self.route("/network/v2.0/network-ip-availabilities", json!({"network_ip_availabilities": []}));
        self.route("/network/v2.0/ports", json!({"ports": [
            {"id": "port-1", "network_id": "n1", "mac_address": "fa:16:3e:00:00:01",
             "device_owner": "compute:nova", "status": "ACTIVE", "fixed_ips": [],
             "binding:vif_type": "ovs", "admin_state_up": true}
        ]}));
        self.route("/network/v2.0/routers", json!({"routers": []}));
        self.route("/network/v2.0/security-groups", json!({"security_groups": [{"id": "sg1", "name": "default"}]}));

        self.route("/compute/v2.1/flavors/detail", json!({"flavors": [{"id": "1", "name": "m1.tiny"}]}));
        self.route("/compute/v2.1/os-availability-zone", json!({"availabilityZoneInfo": [{"zoneName": "nova"}]}));
        self.route("/compute/v2.1/os-security-groups", json!({"security_groups": []}));
        self.route("/compute/v2.1/os-services", json!({"services": [
            {"id": 1, "binary": "nova-compute", "host": "cmp-1", "zone": "nova",
             "status": "enabled", "state": "up", "disabled_reason": null}
        ]}));
        self.route("/compute/v2.1/os-hypervisors/detail", json!({"hypervisors": [
            {"id": 1, "hypervisor_hostname": "cmp-1.example.org", "service": {"host": "cmp-1"},
             "running_vms": 2, "current_workload": 0, "vcpus": 16, "vcpus_used": 4,
             "memory_mb": 1024, "memory_mb_used": 512, "local_gb": 10, "local_gb_used": 1, "free_disk_gb": 9}
        ]}));
        self.route("/compute/v2.1/os-aggregates", json!({"aggregates": [
            {"name": "az1", "availability_zone": "az1", "hosts": ["cmp-1"], "metadata": {"availability_zone": "az1"}}
        ]}));
        self.route("/compute/v2.1/os-simple-tenant-usage?detailed=1", json!({"tenant_usages": []}));
        self.route("/compute/v2.1/servers/detail?all_tenants=true", json!({"servers": [
            {"id": "vm-1", "name": "web", "status": "SHUTOFF", "tenant_id": "p1", "user_id": "u1",
             "flavor": {"id": "1"}}
        ]}));

        self.route("/identity/v3/projects", json!({"projects": [{"id": "p1", "name": "demo"}], "links": {"next": null}}));
        self.route("/compute/v2.1/limits?tenant_id=p1", json!({"limits": {"absolute": {
            "maxTotalCores": 20, "totalCoresUsed": 4, "maxTotalRAMSize": 51200,
            "totalRAMUsed": 2048, "totalInstancesUsed": 1, "maxTotalInstances": 10
        }}}));
    }
}

impl Drop for FakeOpenStack {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Write the exporter configuration for the `fake` cloud.
pub fn write_config(dir: &Path, clouds_file: &Path, extra: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    let contents = format!(
        "cloud: fake\nclouds_file: {}\ntimeout: 5\n{extra}",
        clouds_file.display()
    );
    std::fs::write(&path, contents).unwrap();
    path
}
