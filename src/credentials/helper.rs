//! Cloud registry credentials, obtained through docker credential helpers.
//!
//! A helper is an executable named `docker-credential-<name>`. It is invoked
//! with the `get` verb, reads the registry server on stdin and prints
//! `{"Username": "...", "Secret": "..."}` on stdout.

use super::{CredentialProvider, Credentials};
use crate::errors::{Error, Result};
use crate::reference::Reference;
use futures::future::BoxFuture;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct HelperResponse {
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Secret")]
    secret: String,
}

async fn run_helper(helper: &str, server: &str) -> Result<Credentials> {
    let program = format!("docker-credential-{}", helper);
    trace!("Running {} for {}", program, server);
    let mut child = Command::new(&program)
        .arg("get")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(server.as_bytes()).await?;
    }

    let out = child.wait_with_output().await?;
    if !out.status.success() {
        return Err(Error::Credentials {
            provider: program,
            reason: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }

    let resp: HelperResponse = serde_json::from_slice(&out.stdout)?;
    Ok(Credentials::new(resp.username, resp.secret))
}

/// Google Container Registry, through `docker-credential-gcr`.
#[derive(Clone, Debug)]
pub struct Gcr {
    helper: String,
}

impl Gcr {
    pub const DOMAIN_SUFFIX: &'static str = "gcr.io";

    /// Use a different credential helper (`docker-credential-<helper>`).
    pub fn with_helper(helper: impl Into<String>) -> Self {
        Self {
            helper: helper.into(),
        }
    }
}

impl Default for Gcr {
    fn default() -> Self {
        Self::with_helper("gcr")
    }
}

impl CredentialProvider for Gcr {
    fn name(&self) -> &str {
        "gcr"
    }

    fn supports(&self, reference: &Reference) -> bool {
        reference.registry().ends_with(Self::DOMAIN_SUFFIX)
    }

    fn fetch<'a>(&'a self, reference: &'a Reference) -> BoxFuture<'a, Result<Credentials>> {
        Box::pin(async move { run_helper(&self.helper, &reference.registry()).await })
    }
}

/// AWS Elastic Container Registry, through `docker-credential-ecr-login`.
#[derive(Clone, Debug)]
pub struct Ecr {
    helper: String,
}

impl Ecr {
    pub const DOMAIN_SUFFIX: &'static str = "amazonaws.com";

    /// Use a different credential helper (`docker-credential-<helper>`).
    pub fn with_helper(helper: impl Into<String>) -> Self {
        Self {
            helper: helper.into(),
        }
    }
}

impl Default for Ecr {
    fn default() -> Self {
        Self::with_helper("ecr-login")
    }
}

impl CredentialProvider for Ecr {
    fn name(&self) -> &str {
        "ecr"
    }

    fn supports(&self, reference: &Reference) -> bool {
        reference.registry().ends_with(Self::DOMAIN_SUFFIX)
    }

    fn fetch<'a>(&'a self, reference: &'a Reference) -> BoxFuture<'a, Result<Credentials>> {
        Box::pin(async move { run_helper(&self.helper, &reference.registry()).await })
    }
}
