// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Recording HTTP forward proxy.
//!
//! Every request is forwarded upstream, the upstream response is returned to
//! the client and the completed transaction is recorded as an [`Entry`].

use crate::capture::{CaptureWriter, Recorder};
use crate::config::Config;
use crate::entry::Entry;

use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderMap, HeaderValue};
use hyper::{service::service_fn, Method, Request, Response, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoConnBuilder;
use std::collections::HashSet;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type ProxyBody = BoxBody<Bytes, Infallible>;

type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<ProxyBody>, Infallible>> + Send>>;

// RFC 7230 Section 6.1: Hop-by-hop headers must not be forwarded by proxies.
static HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

struct Shared {
    client: LegacyClient<HttpConnector, Full<Bytes>>,
    recorder: Recorder,
    captures: Option<CaptureWriter>,
    cfg: Arc<Config>,
}

pub async fn run_proxy(
    listen: SocketAddr,
    recorder: Recorder,
    captures: Option<CaptureWriter>,
    cfg: Arc<Config>,
) -> anyhow::Result<()> {
    run_proxy_with_limit(listen, recorder, captures, cfg, None).await
}

/// Testable variant of `run_proxy` that accepts an optional `accept_limit`.
/// When `accept_limit` is `Some(n)`, the accept loop returns after accepting
/// the Nth connection. Connection handlers are spawned and may still be
/// running when this function returns.
pub async fn run_proxy_with_limit(
    listen: SocketAddr,
    recorder: Recorder,
    captures: Option<CaptureWriter>,
    cfg: Arc<Config>,
    accept_limit: Option<usize>,
) -> anyhow::Result<()> {
    let shared = Arc::new(Shared {
        client: LegacyClient::builder(TokioExecutor::new()).build_http(),
        recorder,
        captures,
        cfg,
    });

    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(%listen, "listening");

    let server_builder = AutoConnBuilder::new(TokioExecutor::new());

    let mut remaining = accept_limit;
    loop {
        if let Some(0) = remaining {
            break;
        }

        let (stream, remote_addr) = listener.accept().await?;

        if let Some(ref mut n) = remaining {
            *n -= 1;
        }

        let shared = shared.clone();
        let builder = server_builder.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let shared = shared.clone();
                let fut: ServiceFuture = Box::pin(handle_request(req, shared));
                fut
            });

            if let Err(e) = builder.serve_connection(TokioIo::new(stream), service).await {
                error!(%remote_addr, %e, "connection error");
            }
        });
    }

    Ok(())
}

async fn handle_request<B>(
    req: Request<B>,
    shared: Arc<Shared>,
) -> Result<Response<ProxyBody>, Infallible>
where
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if req.method() == Method::CONNECT {
        return Ok(text_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "CONNECT not supported",
        ));
    }

    let upstream_uri = absolute_uri(&req);
    let method = req.method().clone();
    let recorded_uri = req.uri().clone();
    let req_headers = without_hop_by_hop(req.headers());

    let mut builder = Request::builder()
        .method(method.clone())
        .uri(upstream_uri.clone());
    for (name, value) in req_headers.iter() {
        if !shared
            .cfg
            .general
            .suppress_headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name.as_str()))
        {
            builder = builder.header(name, value);
        }
    }

    let req_body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let boxed: Box<dyn std::error::Error + Send + Sync> = e.into();
            error!(error = %boxed, "failed to collect request body");
            return Ok(text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "request body collect error",
            ));
        }
    };

    let upstream_req = match builder.body(Full::new(req_body.clone())) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "failed to build upstream request");
            return Ok(text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("request build error: {}", e),
            ));
        }
    };

    let resp = match shared.client.request(upstream_req).await {
        Ok(r) => r,
        Err(e) => {
            warn!(uri = %upstream_uri, error = %e, "upstream request failed");
            return Ok(text_response(
                StatusCode::BAD_GATEWAY,
                format!("upstream error: {}", e),
            ));
        }
    };

    let status = resp.status();
    let resp_headers = without_hop_by_hop(resp.headers());
    let resp_body = match resp.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(uri = %upstream_uri, error = %e, "failed to collect upstream body");
            return Ok(text_response(
                StatusCode::BAD_GATEWAY,
                format!("upstream body collect error: {}", e),
            ));
        }
    };

    // The request target already carries the authority.
    let mut recorded_headers = req_headers;
    recorded_headers.remove(hyper::header::HOST);
    let entry = Entry::new(method.as_str(), recorded_uri, status.as_u16())
        .with_request_headers(recorded_headers)
        .with_request_body(req_body)
        .with_response_headers(resp_headers.clone())
        .with_response_body(resp_body.clone());
    record(&shared, entry).await;

    let mut resp_builder = Response::builder().status(status);
    for (name, value) in resp_headers.iter() {
        resp_builder = resp_builder.header(name, value);
    }
    Ok(resp_builder
        .body(Full::new(resp_body.clone()).boxed())
        .unwrap_or_else(|_| Response::new(Full::new(resp_body).boxed())))
}

async fn record(shared: &Shared, entry: Entry) {
    let captured = shared.captures.as_ref().map(|_| entry.clone());
    if !shared.recorder.record(entry) {
        return;
    }
    debug!(recorded = shared.recorder.len(), "recorded entry");
    if let (Some(captures), Some(entry)) = (&shared.captures, captured) {
        if let Err(e) = captures.write_entry(&entry).await {
            warn!(path = %captures.path().display(), error = %e, "failed to append capture");
        }
    }
}

// Origin-form requests are resolved against their Host header.
fn absolute_uri<B>(req: &Request<B>) -> Uri {
    if req.uri().scheme().is_some() {
        return req.uri().clone();
    }
    let host = req
        .headers()
        .get(hyper::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("http://{}{}", host, path)
        .parse::<Uri>()
        .unwrap_or_else(|_| Uri::from_static("http://localhost/"))
}

fn text_response(status: StatusCode, msg: impl Into<Bytes>) -> Response<ProxyBody> {
    let msg: Bytes = msg.into();
    let mut resp = Response::new(Full::new(msg).boxed());
    *resp.status_mut() = status;
    resp
}

// Parse a Connection header value into a lowercased set of tokens
fn parse_connection_tokens(val: Option<&HeaderValue>) -> HashSet<String> {
    let mut set = HashSet::new();
    if let Some(conn_str) = val.and_then(|v| v.to_str().ok()) {
        for token in conn_str.split(',') {
            let trimmed = token.trim().to_ascii_lowercase();
            if !trimmed.is_empty() {
                set.insert(trimmed);
            }
        }
    }
    set
}

fn is_hop_by_hop_header(name: &str, connection_hop_headers: &HashSet<String>) -> bool {
    connection_hop_headers.contains(name) || HOP_BY_HOP_HEADERS.contains(&name)
}

fn without_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let connection_hop_headers = parse_connection_tokens(headers.get(hyper::header::CONNECTION));
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if !is_hop_by_hop_header(name.as_str(), &connection_hop_headers) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}
