use super::{CredentialProvider, Credentials};
use crate::errors::{Error, Result};
use crate::reference::Reference;
use docker_credential::DockerCredential;
use futures::future::BoxFuture;
use std::env;
use std::path::PathBuf;

/// Credentials stored by the docker client in `config.json`.
///
/// Both inline `auths` entries and `credsStore`/`credHelpers` delegations
/// are honored.
#[derive(Clone, Debug, Default)]
pub struct DockerConfig {
    path: Option<PathBuf>,
}

impl DockerConfig {
    /// Locate `config.json` under `$DOCKER_CONFIG`, or `~/.docker` otherwise.
    pub fn from_env() -> Self {
        let dir = env::var_os("DOCKER_CONFIG")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".docker")));
        Self {
            path: dir.map(|d| d.join("config.json")),
        }
    }
}

/// Key under which the docker client stores credentials for `registry`.
fn server_key(registry: &str) -> &str {
    match registry {
        // docker.io has some special casing in config.json
        "docker.io" | "index.docker.io" | "registry-1.docker.io" => "https://index.docker.io/v1/",
        other => other,
    }
}

impl CredentialProvider for DockerConfig {
    fn name(&self) -> &str {
        "docker-config"
    }

    fn supports(&self, _reference: &Reference) -> bool {
        self.path.as_ref().map(|p| p.is_file()).unwrap_or(false)
    }

    fn fetch<'a>(&'a self, reference: &'a Reference) -> BoxFuture<'a, Result<Credentials>> {
        Box::pin(async move {
            let server = server_key(&reference.registry()).to_string();
            trace!("Looking up docker config credentials for {}", server);
            let lookup = server.clone();
            let found = tokio::task::spawn_blocking(move || {
                docker_credential::get_credential(&lookup)
            })
            .await
            .map_err(|e| Error::Credentials {
                provider: self.name().to_string(),
                reason: e.to_string(),
            })?;

            match found {
                Ok(DockerCredential::UsernamePassword(username, password)) => {
                    Ok(Credentials::new(username, password))
                }
                Ok(DockerCredential::IdentityToken(_)) => Err(Error::Credentials {
                    provider: self.name().to_string(),
                    reason: format!("identity token for {} is not supported", server),
                }),
                Err(docker_credential::CredentialRetrievalError::NoCredentialConfigured) => {
                    Err(Error::AuthInfoMissing(server))
                }
                Err(e) => Err(Error::Credentials {
                    provider: self.name().to_string(),
                    reason: e.to_string(),
                }),
            }
        })
    }
}
