use std::io;

use thiserror::Error;

use super::request::AssetRequest;

/// Failure categories a backend load can end in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetErrorKind {
    ResourceNotFound,
    DecodeFailure,
    TransportFailure,
}

impl std::fmt::Display for AssetErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AssetErrorKind::ResourceNotFound => "resource not found",
            AssetErrorKind::DecodeFailure => "decode failure",
            AssetErrorKind::TransportFailure => "transport failure",
        })
    }
}

/// What a backend reports when a single load fails
///
/// The loader attaches the originating request to turn this into an [`AssetError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {reason}")]
pub struct LoadFailure {
    pub kind: AssetErrorKind,
    pub reason: String,
}

impl LoadFailure {
    pub fn new(kind: AssetErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::new(AssetErrorKind::ResourceNotFound, reason)
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        Self::new(AssetErrorKind::DecodeFailure, reason)
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::new(AssetErrorKind::TransportFailure, reason)
    }
}

impl From<io::Error> for LoadFailure {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                Self::decode(err.to_string())
            }
            _ => Self::transport(err.to_string()),
        }
    }
}

/// A failed request, as seen by whoever submitted the batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load {request}: {kind}: {reason}")]
pub struct AssetError {
    pub request: AssetRequest,
    pub kind: AssetErrorKind,
    pub reason: String,
}

impl AssetError {
    pub fn new(request: AssetRequest, failure: LoadFailure) -> Self {
        Self {
            request,
            kind: failure.kind,
            reason: failure.reason,
        }
    }
}
