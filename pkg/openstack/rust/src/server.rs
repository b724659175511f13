// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::{debug, error, info};
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};

use crate::expose;
use crate::exporter::{Exporter, gather};

static NOTFOUND: &[u8] = b"Not found";
static LANDING: &[u8] = b"OpenStack exporter\n\nMetrics are served at /metrics\n";

type Exporters = Arc<[Arc<dyn Exporter>]>;
type BoxedResponse = Response<BoxBody<Bytes, std::io::Error>>;

fn full(body: impl Into<Bytes>) -> BoxBody<Bytes, std::io::Error> {
    Full::new(body.into()).map_err(|e| match e {}).boxed()
}

async fn handle_metrics(exporters: Exporters) -> Result<BoxedResponse> {
    // collection blocks on the cloud APIs
    let body = tokio::task::spawn_blocking(move || expose::encode(&gather(&exporters)))
        .await
        .context("scrape task failed")?;

    Response::builder()
        .header(CONTENT_TYPE, expose::CONTENT_TYPE)
        .body(full(body))
        .map_err(|e| anyhow!("Failed to build metrics response: {}", e))
}

fn landing() -> Result<BoxedResponse> {
    Response::builder()
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(full(LANDING))
        .map_err(|e| anyhow!("Failed to build landing response: {}", e))
}

fn not_found() -> Result<BoxedResponse> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(full(NOTFOUND))
        .map_err(|e| anyhow!("Failed to build not found response: {}", e))
}

async fn handle_request(req: Request<hyper::body::Incoming>, exporters: Exporters) -> Result<BoxedResponse> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            debug!("Handling /metrics request");
            handle_metrics(exporters).await
        }
        (&Method::GET, "/") => landing(),
        _ => {
            info!(
                "{} Request to unknown endpoint: {}",
                req.method(),
                req.uri().path()
            );
            not_found()
        }
    }
}

fn internal_error() -> BoxedResponse {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(full(&b"Internal Server Error"[..]))
        .unwrap_or_else(|_| Response::new(full(&b"Error"[..])))
}

/// Serve scrapes on `listener` until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, exporters: Exporters, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                let (stream, peer) = accept_result.context("accepting connection")?;
                debug!("connection from {peer}");
                let io = TokioIo::new(stream);
                let exporters = Arc::clone(&exporters);

                tokio::task::spawn(async move {
                    let service = service_fn(move |req| {
                        let exporters = Arc::clone(&exporters);
                        async move {
                            Ok::<_, anyhow::Error>(handle_request(req, exporters).await.unwrap_or_else(|e| {
                                error!("Request handling failed: {e:#}");
                                internal_error()
                            }))
                        }
                    });
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection: {err}");
                    }
                });
            }
            _ = &mut shutdown => {
                return Ok(());
            }
        }
    }
}

/// Install SIGTERM and SIGINT handlers. The returned future resolves on the
/// first of them. Must be called from within the runtime.
pub fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down"),
        }
    })
}
