//! Image resolution entry point.
//!
//! A `Resolver` turns raw image references into [`Image`]s: it parses the
//! reference, finds credentials for its registry and drives a fresh
//! [`v2::Client`](crate::v2::Client) through the manifest resolution.
//! Independent resolutions share no state, so they can run concurrently.

use crate::credentials::{CredentialChain, Credentials};
use crate::errors::Result;
use crate::image::Image;
use crate::reference::Reference;
use crate::transport::RetryPolicy;
use crate::v2::{manifest::TargetPlatform, Client};
use std::time::Duration;

/// Options shared by all resolutions of a `Resolver`.
#[derive(Clone, Debug, Default)]
pub struct ResolveOptions {
    /// Accept invalid TLS certificates.
    pub insecure_tls: bool,
    /// Talk plain HTTP to the registry.
    pub insecure_registry: bool,
    /// Per-request timeout. Defaults to 60 seconds.
    pub timeout: Option<Duration>,
    pub retry_policy: RetryPolicy,
    /// Static credentials, used instead of the provider chain when both
    /// are non-empty.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Pre-encoded basic token.
    pub token: Option<String>,
    pub platform: TargetPlatform,
    pub user_agent: Option<String>,
}

/// Resolves image references into layer lists.
#[derive(Debug)]
pub struct Resolver {
    options: ResolveOptions,
    chain: CredentialChain,
}

impl Resolver {
    /// Build a resolver consulting the default credential providers.
    pub fn new(options: ResolveOptions) -> Self {
        Self::with_chain(options, CredentialChain::with_defaults())
    }

    pub fn with_chain(options: ResolveOptions, chain: CredentialChain) -> Self {
        Self { options, chain }
    }

    /// Credentials to present to the registry of `reference`.
    pub async fn credentials(&self, reference: &Reference) -> Credentials {
        match (&self.options.username, &self.options.password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => {
                debug!("Using static credentials for {}", reference.registry());
                Credentials::new(u.as_str(), p.as_str())
            }
            _ => {
                trace!(
                    "Looking up credentials for {} with providers {:?}",
                    reference.registry(),
                    self.chain.names()
                );
                self.chain.resolve(reference).await
            }
        }
    }

    /// A registry client dedicated to `reference`.
    pub async fn client(&self, reference: &Reference) -> Result<Client> {
        let creds = self.credentials(reference).await;

        let mut config = Client::configure()
            .registry(&reference.registry())
            .insecure_registry(self.options.insecure_registry)
            .insecure_tls(self.options.insecure_tls)
            .retry_policy(self.options.retry_policy)
            .token(self.options.token.clone());
        if let Some(timeout) = self.options.timeout {
            config = config.timeout(timeout);
        }
        if let Some(ua) = &self.options.user_agent {
            config = config.user_agent(Some(ua.clone()));
        }
        if !creds.is_empty() {
            config = config
                .username(Some(creds.username))
                .password(Some(creds.password));
        }
        config.build()
    }

    /// Resolve `image` into its layers, base layer first.
    pub async fn resolve(&self, image: &str) -> Result<Image> {
        let reference: Reference = image.parse()?;
        let mut client = self.client(&reference).await?;
        client
            .resolve_image(&reference, &self.options.platform)
            .await
    }

    /// Like [`resolve`](Self::resolve), also pairing every layer with the
    /// command which produced it.
    pub async fn resolve_with_commands(&self, image: &str) -> Result<Image> {
        let reference: Reference = image.parse()?;
        let mut client = self.client(&reference).await?;
        let mut resolved = client
            .resolve_image(&reference, &self.options.platform)
            .await?;
        if !resolved.has_commands() {
            resolved.commands = client.fetch_layer_commands(&resolved).await?;
        }
        Ok(resolved)
    }
}
