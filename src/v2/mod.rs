//! Client library for Docker Registry API v2.
//!
//! This module provides a `Client` which can be used to resolve image
//! manifests and configuration blobs from a remote Docker Registry.
//! Authentication is handled lazily: requests are first sent with the
//! configured credentials (if any), and a `401 Unauthorized` bearer
//! challenge triggers a single token handshake per client.
//!
//! ## Example
//!
//! ```rust,no_run
//! # async fn run() -> dkscan::errors::Result<()> {
//! use dkscan::reference::Reference;
//! use dkscan::v2::{manifest::TargetPlatform, Client};
//!
//! let reference: Reference = "quay.io/coreos/etcd:latest".parse()?;
//! let mut client = Client::configure()
//!     .registry(&reference.registry())
//!     .build()?;
//! let image = client
//!     .resolve_image(&reference, &TargetPlatform::default())
//!     .await?;
//! println!("{} layers", image.layers.len());
//! # Ok(())
//! # }
//! ```

use crate::credentials::Credentials;
use crate::errors::Result;
use crate::transport::RetryingTransport;
use reqwest::{header, Method, StatusCode, Url};
use std::fmt;

mod config;
pub use self::config::Config;

mod auth;
pub use self::auth::{AuthChallenge, BearerToken};

pub mod manifest;

mod blobs;

mod image_config;
pub use self::image_config::{History, ImageConfig};

/// A Client to make outgoing API requests to a registry.
///
/// A client is meant to serve a single image resolution: it caches the
/// bearer token obtained for that image.
#[derive(Clone, Debug)]
pub struct Client {
    base_url: String,
    credentials: Option<Credentials>,
    user_agent: Option<String>,
    auth: Option<Auth>,
    hclient: reqwest::Client,
    transport: RetryingTransport,
}

/// Authorization attached to registry requests.
#[derive(Clone)]
enum Auth {
    Basic(Credentials),
    /// Pre-encoded basic token.
    Token(String),
    Bearer(BearerToken),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self {
            Auth::Basic(_) | Auth::Token(_) => "Basic",
            Auth::Bearer(_) => "Bearer",
        };
        f.debug_tuple("Auth").field(&scheme).finish()
    }
}

impl Auth {
    fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Auth::Basic(c) => builder.basic_auth(&c.username, Some(&c.password)),
            Auth::Token(t) => builder.header(header::AUTHORIZATION, format!("Basic {}", t)),
            Auth::Bearer(b) => builder.header(header::AUTHORIZATION, b.header_value()),
        }
    }
}

impl Client {
    pub fn configure() -> Config {
        Config::default()
    }

    /// Whether a bearer token has been obtained by this client.
    pub fn is_bearer_authenticated(&self) -> bool {
        matches!(self.auth, Some(Auth::Bearer(_)))
    }

    fn build_reqwest(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let mut builder = self.hclient.request(method, url);

        if let Some(auth) = &self.auth {
            builder = auth.apply(builder);
        };

        if let Some(ua) = &self.user_agent {
            builder = builder.header(header::USER_AGENT, ua.as_str());
        };

        builder
    }

    /// Send the request built by `make`, running the bearer-token handshake
    /// when the registry answers with a `401` challenge.
    ///
    /// The handshake happens at most once per client: when the request sent
    /// with a bearer token is rejected again, that response is returned as is.
    async fn send_authorized<F>(&mut self, make: F) -> Result<reqwest::Response>
    where
        F: Fn(&Client) -> Result<reqwest::Request>,
    {
        let res = self.transport.send(make(self)?).await?;
        if res.status() != StatusCode::UNAUTHORIZED || self.is_bearer_authenticated() {
            return Ok(res);
        }

        let challenge = match res.headers().get(header::WWW_AUTHENTICATE) {
            Some(v) => v.to_str()?.to_string(),
            None => String::new(),
        };
        trace!("GET {} requires authentication: {:?}", res.url(), challenge);
        self.authenticate(&challenge).await?;

        self.transport.send(make(self)?).await
    }
}
