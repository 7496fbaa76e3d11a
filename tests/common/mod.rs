// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use hyper::header::{HeaderName, HeaderValue};
use hyper::HeaderMap;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;

use doc_http::output::{write_all, Output};
use doc_http::{aggregate, AggregateOptions, Entry};

pub const HELLO_BODY: &str = r#"{"hello":"world"}"#;

pub fn headers(pairs: &[(&str, &str)]) -> anyhow::Result<HeaderMap> {
    let mut hm = HeaderMap::new();
    for (k, v) in pairs {
        hm.append(k.parse::<HeaderName>()?, v.parse::<HeaderValue>()?);
    }
    Ok(hm)
}

/// One `GET /hello` sample answered with the JSON greeting.
pub fn hello(uri: &str, extra_headers: &[(&str, &str)]) -> anyhow::Result<Entry> {
    let mut request = vec![("accept-encoding", "gzip"), ("user-agent", "UA")];
    request.extend_from_slice(extra_headers);
    Ok(Entry::new("GET", uri.parse()?, 200)
        .with_request_headers(headers(&request)?)
        .with_response_headers(headers(&[("content-type", "application/json")])?)
        .with_response_body(HELLO_BODY))
}

/// Four samples of one endpoint: a bare request, two with differing
/// `possible` values and one with `random` plus an extra header.
pub fn hello_samples() -> anyhow::Result<Vec<Entry>> {
    Ok(vec![
        hello("/hello", &[])?,
        hello("/hello?possible=1", &[])?,
        hello("/hello?possible=2", &[])?,
        hello("/hello?random=2", &[("header", "Value")])?,
    ])
}

/// Aggregate `entries` and run them through `outputs`.
pub fn render(entries: &[Entry], outputs: &[Output]) -> anyhow::Result<()> {
    let docs = aggregate(entries, &AggregateOptions::default());
    write_all(outputs, &docs)?;
    Ok(())
}

/// Wait until something accepts connections on `addr`.
pub async fn wait_for_listener(addr: SocketAddr) -> anyhow::Result<()> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if Instant::now() > deadline {
            return Err(anyhow::anyhow!("timeout waiting for proxy to start"));
        }
        if let Ok(mut s) = tokio::net::TcpStream::connect(addr).await {
            let _ = s.shutdown().await;
            return Ok(());
        }
        sleep(Duration::from_millis(50)).await;
    }
}

/// Pick a free port by binding then dropping.
pub fn free_addr() -> anyhow::Result<SocketAddr> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?)
}
