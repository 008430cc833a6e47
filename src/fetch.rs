use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use http_body_util::{BodyExt, Empty};
use hyper::{header, Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;

use crate::config::Config;
use crate::types::{SourceEndpoint, SourceResult, TreeNode};

/// Why a single source produced no results.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("cannot connect to {}: {source}", .path.display())]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("http error: {0}")]
    Http(#[from] hyper::Error),
    #[error("invalid request: {0}")]
    Request(String),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Query every configured source concurrently. Always yields one record per
/// endpoint, in configuration order; a failing source becomes an advisory row
/// and never affects the others.
pub async fn search_sources(query: &str, config: &Config) -> Vec<SourceResult> {
    join_all(
        config
            .endpoints
            .iter()
            .map(|endpoint| source_results(endpoint, query, config)),
    )
    .await
}

async fn source_results(endpoint: &SourceEndpoint, query: &str, config: &Config) -> SourceResult {
    match fetch_source(endpoint, query, config).await {
        Ok(nodes) => {
            tracing::debug!("{} matches from vault {}", nodes.len(), endpoint.name);
            SourceResult::found(&endpoint.name, nodes)
        }
        Err(e) => {
            tracing::warn!("Error getting results for vault {}: {e}", endpoint.name);
            SourceResult::failed(&endpoint.name, advisory(endpoint))
        }
    }
}

/// Message shown in place of a source's results when it cannot be queried.
pub fn advisory(endpoint: &SourceEndpoint) -> String {
    format!(
        "Tree Search >= 0.10 required on vault {} ({}) - open this vault in Obsidian to install and start it",
        endpoint.name,
        endpoint.socket.display()
    )
}

/// Fetch one source's matches, bounded by the configured timeout.
pub async fn fetch_source(
    endpoint: &SourceEndpoint,
    query: &str,
    config: &Config,
) -> Result<Vec<TreeNode>, FetchError> {
    tokio::time::timeout(config.timeout, request_nodes(&endpoint.socket, query, config.limit))
        .await
        .map_err(|_| FetchError::Timeout(config.timeout))?
}

async fn request_nodes(socket: &Path, query: &str, limit: usize) -> Result<Vec<TreeNode>, FetchError> {
    let stream = UnixStream::connect(socket)
        .await
        .map_err(|source| FetchError::Connect {
            path: socket.to_path_buf(),
            source,
        })?;

    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("Vault connection closed with error: {e}");
        }
    });

    let request = Request::builder()
        .method(Method::GET)
        .uri(query_path(query, limit))
        .header(header::HOST, "localhost")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Empty::<Bytes>::new())
        .map_err(|e| FetchError::Request(e.to_string()))?;

    let response = sender.send_request(request).await?;
    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    let body = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&body)?)
}

/// Request path understood by the vault plugin's search socket.
pub fn query_path(query: &str, limit: usize) -> String {
    format!(
        "/?query={}&limit={limit}&capability=flat",
        urlencoding::encode(query)
    )
}
