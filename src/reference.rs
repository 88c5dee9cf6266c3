//! Parser for `docker://` URLs.
//!
//! This module provides support for parsing image references.
//!
//! ## Example
//!
//! ```rust
//! # fn main() {
//! # fn run() -> dkscan::errors::Result<()> {
//! #
//! use std::str::FromStr;
//! use dkscan::reference::Reference;
//!
//! // Parse an image reference
//! let dkref = Reference::from_str("docker://busybox")?;
//! assert_eq!(dkref.registry(), "registry-1.docker.io");
//! assert_eq!(dkref.repository(), "library/busybox");
//! assert_eq!(dkref.version(), "latest");
//! #
//! # Ok(())
//! # };
//! # run().unwrap();
//! # }
//! ```
//!
//! When a reference carries both a tag and a digest, the digest wins and the
//! tag is dropped.

// The `docker://` schema is not officially documented, but has a reference implementation:
// https://github.com/docker/distribution/blob/v2.6.1/reference/reference.go

use crate::errors::Error;
use regex::Regex;
use std::sync::OnceLock;
use std::{fmt, str};

/// Domain assumed when a reference doesn't name one.
pub static DEFAULT_DOMAIN: &str = "docker.io";
/// Host actually serving the Docker Hub registry API.
pub static DOCKER_HUB: &str = "registry-1.docker.io";

static MAX_NAME_LEN: usize = 255;

/// Image version, either a tag or a digest.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Version {
    Tag(String),
    Digest(String, String),
}

impl str::FromStr for Version {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = match s.chars().next() {
            Some(':') => {
                let tag = s.trim_start_matches(':');
                if !tag_regex().is_match(tag) {
                    return Err(invalid(s, "wrong tag format"));
                }
                Version::Tag(tag.to_string())
            }
            Some('@') => {
                let digest = s.trim_start_matches('@');
                if !digest_regex().is_match(digest) {
                    return Err(invalid(s, "wrong digest format"));
                }
                let (algo, hash) = match digest.split_once(':') {
                    Some(r) => r,
                    None => return Err(invalid(s, "wrong digest format")),
                };
                Version::Digest(algo.to_string(), hash.to_string())
            }
            Some(_) => return Err(invalid(s, "unknown prefix")),
            None => return Err(invalid(s, "too short")),
        };
        Ok(v)
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::Tag("latest".to_string())
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let v = match self {
            Version::Tag(s) => ":".to_string() + s,
            Version::Digest(t, d) => "@".to_string() + t + ":" + d,
        };
        write!(f, "{}", v)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let v = match self {
            Version::Tag(s) => s.to_string(),
            Version::Digest(t, d) => t.to_string() + ":" + d,
        };
        write!(f, "{}", v)
    }
}

/// A registry image reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reference {
    raw_input: String,
    registry: String,
    repository: String,
    version: Version,
}

impl Reference {
    pub fn registry(&self) -> String {
        self.registry.clone()
    }

    pub fn repository(&self) -> String {
        self.repository.clone()
    }

    /// Tag or digest, in the form used on the wire (`latest`, `sha256:...`).
    pub fn version(&self) -> String {
        self.version.to_string()
    }

    pub fn version_ref(&self) -> &Version {
        &self.version
    }

    /// Whether the registry is Docker Hub.
    pub fn is_docker_hub(&self) -> bool {
        self.registry == DOCKER_HUB
    }

    /// Fully-qualified name, using `docker.io` as the Docker Hub domain.
    pub fn name(&self) -> String {
        let domain = if self.is_docker_hub() {
            DEFAULT_DOMAIN
        } else {
            self.registry.as_str()
        };
        format!("{}/{}", domain, self.repository)
    }

    pub fn to_raw_string(&self) -> String {
        self.raw_input.clone()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}/{}{:?}", self.registry, self.repository, self.version)
    }
}

impl str::FromStr for Reference {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_url(s)
    }
}

fn parse_url(input: &str) -> Result<Reference, Error> {
    let mut rest = input.trim();
    if let Some(r) = rest.strip_prefix("docker://") {
        rest = r;
    };

    // A digest is authoritative: a tag found alongside it is discarded.
    let (rest, digest) = match rest.split_once('@') {
        Some((name, d)) => (name, Some(("@".to_string() + d).parse::<Version>()?)),
        None => (rest, None),
    };
    let last_component = rest.rfind('/').map(|i| i + 1).unwrap_or(0);
    let (name, tag) = match rest[last_component..].rfind(':') {
        Some(i) => {
            let (n, t) = rest.split_at(last_component + i);
            (n, Some(t.parse::<Version>()?))
        }
        None => (rest, None),
    };
    let version = match (digest, tag) {
        (Some(d), Some(t)) => {
            trace!("Dropping tag {:?} in favor of digest {:?}", t, d);
            d
        }
        (Some(d), None) => d,
        (None, Some(t)) => t,
        (None, None) => Version::default(),
    };

    if name.is_empty() {
        return Err(invalid(input, "name too short"));
    }
    let (domain, path) = split_domain(name);
    if !domain_regex().is_match(domain) {
        return Err(invalid(input, "invalid registry domain"));
    }
    let registry = canonical_registry(domain);
    let repository = if registry == DOCKER_HUB && !path.contains('/') {
        "library/".to_string() + path
    } else {
        path.to_string()
    };
    if !path_regex().is_match(&repository) {
        return Err(invalid(input, "invalid repository path"));
    }
    if domain.len() + 1 + repository.len() > MAX_NAME_LEN {
        return Err(invalid(input, "name too long"));
    }

    Ok(Reference {
        raw_input: input.to_string(),
        registry,
        repository,
        version,
    })
}

/// Split an explicit registry domain off a name.
///
/// The first component is a domain when it contains a `.` or a `:`,
/// or is exactly `localhost`.
fn split_domain(name: &str) -> (&str, &str) {
    match name.split_once('/') {
        Some((first, path))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (first, path)
        }
        _ => (DEFAULT_DOMAIN, name),
    }
}

fn canonical_registry(domain: &str) -> String {
    match domain {
        "docker.io" | "index.docker.io" => DOCKER_HUB.to_string(),
        other => other.to_string(),
    }
}

fn invalid(input: &str, reason: &str) -> Error {
    Error::InvalidReference {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

fn domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*(?::[0-9]+)?$",
        )
        .expect("static regex")
    })
}

fn path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*(?:/[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*)*$")
            .expect("static regex")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w][\w.-]{0,127}$").expect("static regex"))
}

fn digest_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9a-fA-F]{32,}$")
            .expect("static regex")
    })
}
