use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::SourceEndpoint;

/// Per-source request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Maximum matches requested from each source.
pub const RESULT_LIMIT: usize = 100;

/// Quiet period after the last keystroke before a query fires.
pub const DEBOUNCE: Duration = Duration::from_millis(100);

/// Socket naming convention used by the vault plugin: `/tmp/raycast-<vault>.sock`.
const SOCKET_DIR: &str = "/tmp";
const SOCKET_PREFIX: &str = "/tmp/raycast-";
const SOCKET_SUFFIX: &str = ".sock";

/// Environment variable holding the comma-separated socket list.
pub const SOCKETS_ENV: &str = "TREE_SEARCH_SOCKETS";

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoints: Vec<SourceEndpoint>,
    pub timeout: Duration,
    pub limit: usize,
    pub quiet: Duration,
}

impl Config {
    pub fn new(endpoints: Vec<SourceEndpoint>) -> Self {
        Self {
            endpoints,
            timeout: DEFAULT_TIMEOUT,
            limit: RESULT_LIMIT,
            quiet: DEBOUNCE,
        }
    }

    /// Build from an explicit socket list, falling back to the sockets found in
    /// `/tmp` when none is configured.
    pub fn from_sockets(sockets: Option<&str>) -> Self {
        let endpoints = match sockets {
            Some(raw) if !raw.trim().is_empty() => parse_endpoints(raw),
            _ => detect_socket_paths(Path::new(SOCKET_DIR))
                .iter()
                .filter_map(|p| p.to_str())
                .map(endpoint)
                .collect(),
        };
        Self::new(endpoints)
    }
}

/// Split a comma-separated socket list. Blank entries are skipped.
pub fn parse_endpoints(raw: &str) -> Vec<SourceEndpoint> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(endpoint)
        .collect()
}

fn endpoint(socket: &str) -> SourceEndpoint {
    SourceEndpoint {
        socket: PathBuf::from(socket),
        name: source_name(socket),
    }
}

/// Vault name from a socket path: `/tmp/raycast-Obsidian Vault.sock` -> `Obsidian Vault`.
pub fn source_name(socket: &str) -> String {
    let name = socket.strip_prefix(SOCKET_PREFIX).unwrap_or(socket);
    name.strip_suffix(SOCKET_SUFFIX).unwrap_or(name).to_string()
}

/// Find plugin sockets in `dir`, sorted by path. Returns an empty list if the
/// directory cannot be read.
pub fn detect_socket_paths(dir: &Path) -> Vec<PathBuf> {
    let prefix = Path::new(SOCKET_PREFIX)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("raycast-");

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot scan {} for vault sockets: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix) && n.ends_with(SOCKET_SUFFIX))
        })
        .collect();
    paths.sort();
    paths
}
