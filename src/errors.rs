//! Error chains, types and traits.

use reqwest::StatusCode;
use std::time::Duration;

/// Maximum number of response body bytes kept for diagnostics.
const BODY_EXCERPT_LEN: usize = 512;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid image reference {input:?}: {reason}")]
    InvalidReference { input: String, reason: String },
    #[error("request to {url} still failing after retrying for {elapsed:?}")]
    RetriesExhausted {
        url: String,
        elapsed: Duration,
        #[source]
        last: Box<Error>,
    },
    #[error("malformed www-authenticate challenge: {0:?}")]
    MalformedChallenge(String),
    #[error("token request to {realm} failed: {reason}")]
    TokenRequestFailed { realm: String, reason: String },
    #[error("registry rejected credentials (status {status}): {body}")]
    Unauthorized { status: StatusCode, body: String },
    #[error("registry denied access (status {status}): {body}")]
    Forbidden { status: StatusCode, body: String },
    #[error("platform (os: {os}, arch: {arch}) not found in the manifest list")]
    PlatformNotFound { os: String, arch: String },
    #[error("number of layers ({layers}) doesn't match the number of history entries ({history})")]
    LayerCountMismatch { layers: usize, history: usize },
    #[error("registry responded with unsupported content-type {content_type:?} (status {status}): {body}")]
    UnsupportedManifestType {
        content_type: String,
        status: StatusCode,
        body: String,
    },
    #[error("unexpected registry response (status {status}): {body}")]
    Unknown { status: StatusCode, body: String },
    #[error("content digest mismatch: expected {expected}, got {got}")]
    DigestMismatch { expected: String, got: String },
    #[error("auth info missing for {0}")]
    AuthInfoMissing(String),
    #[error("credential provider {provider} failed: {reason}")]
    Credentials { provider: String, reason: String },
    #[error("base64 decode error")]
    Base64Decode(#[from] base64::DecodeError),
    #[error("header parse error")]
    HeaderParse(#[from] reqwest::header::ToStrError),
    #[error("json error")]
    Json(#[from] serde_json::Error),
    #[error("http transport error")]
    Reqwest(#[from] reqwest::Error),
    #[error("URI parse error")]
    Uri(#[from] url::ParseError),
    #[error("input/output error")]
    Io(#[from] std::io::Error),
    #[error("UTF-8 parse error")]
    Utf8Parse(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], suitable for mapping onto exit codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ErrorKind {
    InvalidReference,
    RetriesExhausted,
    MalformedChallenge,
    TokenRequestFailed,
    Unauthorized,
    Forbidden,
    PlatformNotFound,
    LayerCountMismatch,
    UnsupportedManifestType,
    Unknown,
}

impl Error {
    /// Collapse this error onto its [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidReference { .. } => ErrorKind::InvalidReference,
            Error::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            Error::MalformedChallenge(_) => ErrorKind::MalformedChallenge,
            Error::TokenRequestFailed { .. } => ErrorKind::TokenRequestFailed,
            Error::Unauthorized { .. } => ErrorKind::Unauthorized,
            Error::Forbidden { .. } => ErrorKind::Forbidden,
            Error::PlatformNotFound { .. } => ErrorKind::PlatformNotFound,
            Error::LayerCountMismatch { .. } => ErrorKind::LayerCountMismatch,
            Error::UnsupportedManifestType { .. } => ErrorKind::UnsupportedManifestType,
            _ => ErrorKind::Unknown,
        }
    }

    /// Build the error matching a non-successful registry response.
    pub(crate) fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let body = excerpt(body);
        match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized { status, body },
            StatusCode::FORBIDDEN => Error::Forbidden { status, body },
            _ => Error::Unknown { status, body },
        }
    }
}

/// Lossy, bounded rendering of a response body.
pub(crate) fn excerpt(body: &[u8]) -> String {
    let end = body.len().min(BODY_EXCERPT_LEN);
    let mut s = String::from_utf8_lossy(&body[..end]).trim().to_string();
    if body.len() > BODY_EXCERPT_LEN {
        s.push_str("...");
    }
    s
}
