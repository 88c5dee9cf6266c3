//! Registry credentials discovery.
//!
//! Credentials are looked up through an ordered [`CredentialChain`] of
//! providers. The first provider which supports the image reference and
//! manages to fetch credentials wins. Failing providers are skipped, and
//! when none succeeds the image is pulled anonymously.

use crate::errors::Result;
use crate::reference::Reference;
use futures::future::BoxFuture;
use std::fmt;

mod docker_config;
pub use self::docker_config::DockerConfig;

mod helper;
pub use self::helper::{Ecr, Gcr};

mod secret;
pub use self::secret::{ImagePullSecret, IMAGE_PULL_SECRET_ENV};

/// Username and password for a registry.
///
/// Empty credentials mean anonymous access.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A source of registry credentials.
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// Human readable provider name, for logging.
    fn name(&self) -> &str;

    /// Whether this provider applies to `reference`. Must not have side effects.
    fn supports(&self, reference: &Reference) -> bool;

    /// Fetch the credentials for `reference`.
    fn fetch<'a>(&'a self, reference: &'a Reference) -> BoxFuture<'a, Result<Credentials>>;
}

/// Ordered list of credential providers, highest priority first.
#[derive(Debug, Default)]
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl CredentialChain {
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// The default chain: image pull secret, GCR, ECR, then the local docker config.
    ///
    /// The image pull secret must stay first: it is an explicit override.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Box::new(ImagePullSecret::from_env()),
            Box::new(Gcr::default()),
            Box::new(Ecr::default()),
            Box::new(DockerConfig::from_env()),
        ])
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve credentials for `reference`. Never fails: without any
    /// matching provider, empty (anonymous) credentials are returned.
    pub async fn resolve(&self, reference: &Reference) -> Credentials {
        for provider in &self.providers {
            if !provider.supports(reference) {
                trace!("Provider {} doesn't support {}", provider.name(), reference);
                continue;
            }

            match provider.fetch(reference).await {
                Ok(creds) => {
                    debug!(
                        "Credentials found for {} by provider {}",
                        reference.name(),
                        provider.name()
                    );
                    return creds;
                }
                Err(e) => {
                    debug!(
                        "Provider {} failed to get credentials for {}: {}",
                        provider.name(),
                        reference.name(),
                        e
                    );
                }
            }
        }

        debug!("Credentials not found for {}", reference.name());
        Credentials::default()
    }
}
