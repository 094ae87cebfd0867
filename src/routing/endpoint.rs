//! Endpoint allow-list and route decisions.
//!
//! # Responsibilities
//! - Split the raw inbound path on `/`, then percent-decode each segment
//! - Map the first segment (case-insensitive) onto a known endpoint
//! - Reject everything else before any upstream call is made
//!
//! # Design Decisions
//! - The allow-list is a closed enum, not a set of strings
//! - Dot segments are rejected so a route can never climb out of `api/`
//! - An encoded slash stays inside its segment
//! - Segments that do not decode to UTF-8 never match an endpoint

use percent_encoding::percent_decode_str;

/// Endpoints the upstream exposes through this gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// No segments: the upstream health check at its root.
    Root,
    CreateQr,
    Status,
    Cancel,
    /// QR image files, `qr/<file>.png`.
    Qr,
}

impl Endpoint {
    /// Look up an endpoint by its first path segment (case-insensitive).
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment.to_lowercase().as_str() {
            "createqr" => Some(Self::CreateQr),
            "status" => Some(Self::Status),
            "cancel" => Some(Self::Cancel),
            "qr" => Some(Self::Qr),
            _ => None,
        }
    }

    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::CreateQr => "createqr",
            Self::Status => "status",
            Self::Cancel => "cancel",
            Self::Qr => "qr",
        }
    }
}

/// An accepted request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub endpoint: Endpoint,
    /// Segments below the mount point, decoded, case preserved.
    pub segments: Vec<String>,
}

impl Route {
    /// Decide the route for a raw request path, relative to `mount_path`.
    ///
    /// Returns `None` when the path is outside the mount point, names an
    /// unknown endpoint, contains `.`/`..` segments or is not valid UTF-8
    /// once decoded.
    pub fn resolve(mount_path: &str, path: &str) -> Option<Self> {
        let mount = split_segments(mount_path);
        let mut segments = decode_segments(path)?;

        if segments.len() < mount.len() || segments[..mount.len()] != mount[..] {
            return None;
        }
        segments.drain(..mount.len());

        if segments.iter().any(|s| s == "." || s == "..") {
            return None;
        }

        let endpoint = match segments.first() {
            None => Endpoint::Root,
            Some(first) => Endpoint::from_segment(first)?,
        };

        Some(Self { endpoint, segments })
    }

    /// True for requests that fetch a file below `qr/`.
    pub fn is_qr_file(&self) -> bool {
        self.endpoint == Endpoint::Qr && self.segments.len() > 1
    }
}

/// Split a path into its non-empty segments.
pub fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a raw path into its non-empty segments and decode each one.
fn decode_segments(path: &str) -> Option<Vec<String>> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8().ok().map(|d| d.into_owned()))
        .collect()
}
