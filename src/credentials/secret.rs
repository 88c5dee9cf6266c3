use super::{CredentialProvider, Credentials};
use crate::errors::{Error, Result};
use crate::reference::Reference;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::{env, fmt};

/// Environment variable holding a docker config JSON pull secret.
pub static IMAGE_PULL_SECRET_ENV: &str = "K8S_IMAGE_PULL_SECRET";

/// Credentials from a Kubernetes image pull secret (a docker config JSON
/// document), typically injected through [`IMAGE_PULL_SECRET_ENV`].
///
/// Entries are matched the way the kubelet keyring does: the registry host
/// must match and the entry path, if any, must prefix the repository path.
/// The most specific entry wins.
#[derive(Clone, Default)]
pub struct ImagePullSecret {
    body: Option<String>,
}

impl ImagePullSecret {
    pub fn new(body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            body: Some(body).filter(|b| !b.trim().is_empty()),
        }
    }

    /// Capture the secret from the environment, if set.
    pub fn from_env() -> Self {
        match env::var(IMAGE_PULL_SECRET_ENV) {
            Ok(body) => Self::new(body),
            Err(_) => Self::default(),
        }
    }

    fn lookup(&self, reference: &Reference) -> Result<Credentials> {
        let body = self.body.as_deref().unwrap_or_default();
        let auths = match serde_json::from_str::<SecretDocument>(body)? {
            SecretDocument::ConfigJson { auths } => auths,
            SecretDocument::Legacy(auths) => auths,
        };

        let target_host = normalize_host(&reference.registry());
        let repository = reference.repository();

        let mut keys: Vec<&String> = auths.keys().collect();
        keys.sort();
        let mut best: Option<(usize, &AuthEntry)> = None;
        for key in keys {
            let (host, path) = split_key(key);
            if !host_matches(&host, &target_host) || !path_matches(path, &repository) {
                continue;
            }
            trace!("Pull secret entry {:?} matches {}", key, reference.name());
            if best.map(|(len, _)| path.len() > len).unwrap_or(true) {
                best = Some((path.len(), &auths[key]));
            }
        }

        match best {
            Some((_, entry)) => entry.credentials(),
            None => Err(Error::Credentials {
                provider: self.name().to_string(),
                reason: format!("no pull secret entry for {}", reference.name()),
            }),
        }
    }
}

impl fmt::Debug for ImagePullSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePullSecret")
            .field("present", &self.body.is_some())
            .finish()
    }
}

impl CredentialProvider for ImagePullSecret {
    fn name(&self) -> &str {
        "ImagePullSecret"
    }

    fn supports(&self, _reference: &Reference) -> bool {
        self.body.is_some()
    }

    fn fetch<'a>(&'a self, reference: &'a Reference) -> BoxFuture<'a, Result<Credentials>> {
        Box::pin(async move { self.lookup(reference) })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SecretDocument {
    /// `kubernetes.io/dockerconfigjson`
    ConfigJson { auths: HashMap<String, AuthEntry> },
    /// `kubernetes.io/dockercfg`
    Legacy(HashMap<String, AuthEntry>),
}

#[derive(Debug, Default, Deserialize)]
struct AuthEntry {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    auth: String,
}

impl AuthEntry {
    fn credentials(&self) -> Result<Credentials> {
        if !self.username.is_empty() || !self.password.is_empty() {
            return Ok(Credentials::new(&self.username, &self.password));
        }
        let decoded = String::from_utf8(base64::decode(self.auth.trim())?)?;
        match decoded.split_once(':') {
            Some((user, pass)) => Ok(Credentials::new(user, pass)),
            None => Err(Error::Credentials {
                provider: "ImagePullSecret".to_string(),
                reason: "malformed auth entry".to_string(),
            }),
        }
    }
}

/// Split a keyring key such as `https://host:5000/ns/repo/` into a
/// normalized host and a path.
fn split_key(key: &str) -> (String, &str) {
    let k = key
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    let (host, path) = k.split_once('/').unwrap_or((k, ""));
    // Legacy Docker Hub keys carry the API version (`https://index.docker.io/v1/`).
    let path = match path {
        "v1" | "v2" => "",
        p => p,
    };
    (normalize_host(host), path)
}

fn normalize_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    match host.as_str() {
        "docker.io" | "index.docker.io" | "registry-1.docker.io" => "docker.io".to_string(),
        _ => host,
    }
}

/// Compare hosts label by label; a `*` label in the pattern matches any label.
fn host_matches(pattern: &str, host: &str) -> bool {
    let (pattern, pattern_port) = pattern.split_once(':').unwrap_or((pattern, ""));
    let (host, host_port) = host.split_once(':').unwrap_or((host, ""));
    if pattern_port != host_port {
        return false;
    }
    let pattern_labels: Vec<&str> = pattern.split('.').collect();
    let host_labels: Vec<&str> = host.split('.').collect();
    pattern_labels.len() == host_labels.len()
        && pattern_labels
            .iter()
            .zip(host_labels.iter())
            .all(|(p, h)| *p == "*" || p == h)
}

fn path_matches(prefix: &str, repository: &str) -> bool {
    prefix.is_empty()
        || repository == prefix
        || (repository.starts_with(prefix) && repository[prefix.len()..].starts_with('/'))
}
