use crate::credentials::Credentials;
use crate::errors::Result;
use crate::transport::{RetryPolicy, RetryingTransport, Transport};
use crate::v2::{Auth, Client};
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for a single request attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for a `Client`.
#[derive(Debug)]
pub struct Config {
    index: String,
    insecure_registry: bool,
    insecure_tls: bool,
    user_agent: Option<String>,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    timeout: Duration,
    retry_policy: RetryPolicy,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for Config {
    /// Initialize `Config` with default values.
    fn default() -> Self {
        Self {
            index: crate::reference::DOCKER_HUB.into(),
            insecure_registry: false,
            insecure_tls: false,
            user_agent: Some(crate::USER_AGENT.to_owned()),
            username: None,
            password: None,
            token: None,
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
            transport: None,
        }
    }
}

impl Config {
    /// Set registry service to use (vhost or IP).
    pub fn registry(mut self, reg: &str) -> Self {
        self.index = reg.to_owned();
        self
    }

    /// Whether to use an insecure HTTP connection to the registry.
    pub fn insecure_registry(mut self, insecure: bool) -> Self {
        self.insecure_registry = insecure;
        self
    }

    /// Whether to accept invalid TLS certificates from the registry.
    pub fn insecure_tls(mut self, insecure: bool) -> Self {
        self.insecure_tls = insecure;
        self
    }

    /// Set the user-agent to be used for registry authentication.
    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Set the username to be used for registry authentication.
    pub fn username(mut self, user: Option<String>) -> Self {
        self.username = user;
        self
    }

    /// Set the password to be used for registry authentication.
    pub fn password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Set a pre-encoded basic token, sent as `Authorization: Basic <token>`.
    ///
    /// It takes precedence over username and password.
    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Set the timeout of a single request attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry schedule for transport failures.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Send requests through a custom transport instead of the HTTP client.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Return a `Client` to interact with a v2 registry.
    pub fn build(self) -> Result<Client> {
        let base = match self.insecure_registry {
            false => "https://".to_string() + &self.index,
            true => "http://".to_string() + &self.index,
        };
        trace!(
            "Built client for {:?}: endpoint {:?} - user {:?}",
            self.index,
            base,
            self.username
        );

        let hclient = reqwest::Client::builder()
            .danger_accept_invalid_certs(self.insecure_tls)
            .timeout(self.timeout)
            .build()?;
        let inner = match self.transport {
            Some(t) => t,
            None => Arc::new(hclient.clone()),
        };

        let credentials = match (self.username, self.password) {
            (None, None) => None,
            (u, p) => Some(Credentials::new(
                u.unwrap_or_default(),
                p.unwrap_or_default(),
            )),
        };
        let auth = match (self.token, &credentials) {
            (Some(t), _) if !t.is_empty() => Some(Auth::Token(t)),
            (_, Some(c)) if !c.username.is_empty() => Some(Auth::Basic(c.clone())),
            _ => None,
        };

        Ok(Client {
            base_url: base,
            credentials,
            user_agent: self.user_agent,
            auth,
            hclient,
            transport: RetryingTransport::new(inner, self.retry_policy),
        })
    }
}
