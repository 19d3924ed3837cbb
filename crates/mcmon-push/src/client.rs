//! Plain http1 POST over a fresh TCP connection.

use std::time::Duration;

use http::Uri;
use http::uri::Authority;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use mcmon_collect::MetricPoint;

/// POST the point list as a JSON array to `url`, bounded by `timeout`.
///
/// Never fails the caller: bad URLs, connect errors, rejected requests,
/// and timeouts are all logged with the payload size and swallowed.
pub async fn push(url: &str, points: &[MetricPoint], timeout: Duration) {
    let body = match serde_json::to_string(points) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, points = points.len(), "payload serialization failed");
            return;
        }
    };
    let size = body.len();

    let uri: Uri = match url.parse() {
        Ok(uri) => uri,
        Err(e) => {
            warn!(error = %e, %url, bytes = size, "invalid push URL");
            return;
        }
    };
    let Some(authority) = uri.authority().cloned() else {
        warn!(%url, bytes = size, "push URL missing host");
        return;
    };
    let addr = format!("{}:{}", authority.host(), authority.port_u16().unwrap_or(80));

    if tokio::time::timeout(timeout, send(uri, &authority, &addr, body, size))
        .await
        .is_err()
    {
        warn!(%addr, bytes = size, "push timed out");
    }
}

async fn send(uri: Uri, authority: &Authority, addr: &str, body: String, size: usize) {
    let stream = match TcpStream::connect(addr).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, %addr, bytes = size, "push connect failed");
            return;
        }
    };

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, %addr, bytes = size, "push handshake failed");
            return;
        }
    };

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = match http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("host", authority.as_str())
        .header("content-type", "application/json")
        .header("user-agent", "mcmon/0.1")
        .body(http_body_util::Full::new(bytes::Bytes::from(body)))
    {
        Ok(req) => req,
        Err(e) => {
            warn!(error = %e, bytes = size, "push request build failed");
            return;
        }
    };

    match sender.send_request(req).await {
        Ok(resp) if resp.status().is_success() => {
            debug!(status = %resp.status(), bytes = size, "metric points pushed");
        }
        Ok(resp) => {
            warn!(status = %resp.status(), bytes = size, "push rejected by sink");
        }
        Err(e) => {
            warn!(error = %e, bytes = size, "push request failed");
        }
    }
}
