//! Layer commands out of the image configuration blob.
//!
//! Schema 2 and OCI manifests carry no build history: it lives in the
//! configuration object referenced by the manifest, where entries with
//! `empty_layer` set describe instructions which produced no filesystem
//! layer (e.g. `ENV` or `CMD`).

use crate::errors::{Error, Result};
use crate::image::{strip_docker_meta, trim_digest, FsLayer, FsLayerCommand, Image};
use crate::v2::Client;

/// Image configuration object, restricted to its build history.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub history: Vec<History>,
}

/// A build history entry.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct History {
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub empty_layer: bool,
}

impl ImageConfig {
    /// Pair each layer with the command which produced it.
    ///
    /// History entries without a filesystem layer are skipped; the
    /// remaining ones must match `layers` one to one, oldest first.
    pub fn layer_commands(&self, layers: &[FsLayer]) -> Result<Vec<FsLayerCommand>> {
        let history: Vec<&History> = self.history.iter().filter(|h| !h.empty_layer).collect();
        if history.len() != layers.len() {
            return Err(Error::LayerCountMismatch {
                layers: layers.len(),
                history: history.len(),
            });
        }

        Ok(layers
            .iter()
            .zip(history)
            .map(|(layer, h)| FsLayerCommand {
                command: strip_docker_meta(&h.created_by),
                layer: trim_digest(&layer.blob_sum).to_string(),
            })
            .collect())
    }
}

impl Client {
    /// Fetch the configuration blob of `image` and list its layer commands.
    ///
    /// Commands already present on `image` (schema 1) are returned as is.
    pub async fn fetch_layer_commands(&mut self, image: &Image) -> Result<Vec<FsLayerCommand>> {
        if image.has_commands() {
            return Ok(image.commands.clone());
        }
        let digest = match &image.digest {
            Some(d) => d,
            None => {
                debug!("No configuration object for {}", image.repository);
                return Ok(Vec::new());
            }
        };

        let blob = self.get_blob(&image.repository, digest).await?;
        let config: ImageConfig = serde_json::from_slice(&blob)?;
        trace!(
            "Configuration {} has {} history entries",
            digest,
            config.history.len()
        );
        config.layer_commands(&image.layers)
    }
}
