use crate::errors::{Error, Result};
use crate::image::{strip_docker_meta, trim_digest, FsLayer, FsLayerCommand};

/// Manifest version 2 schema 1, signed or unsigned.
///
/// Specification is at https://docs.docker.com/registry/spec/manifest-v2-1/.
/// Layers and history entries are listed top layer first.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ManifestSchema1Signed {
    #[serde(rename = "schemaVersion")]
    schema_version: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(rename = "fsLayers")]
    fs_layers: Vec<S1Layer>,
    #[serde(default)]
    history: Vec<V1Compat>,
    #[serde(default)]
    signatures: Vec<Signature>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Signature {
    header: serde_json::Value,
    signature: String,
    protected: String,
}

/// Compatibility entry for version 1 manifest interoperability.
#[derive(Debug, Deserialize, Serialize)]
struct V1Compat {
    #[serde(rename = "v1Compatibility")]
    v1_compat: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct S1Layer {
    #[serde(rename = "blobSum")]
    blob_sum: String,
}

/// The part of a `v1Compatibility` document we care about.
#[derive(Debug, Default, Deserialize)]
struct V1Compatibility {
    #[serde(default)]
    container_config: ContainerConfig,
}

#[derive(Debug, Default, Deserialize)]
struct ContainerConfig {
    #[serde(rename = "Cmd", default)]
    cmd: Option<Vec<String>>,
}

impl V1Compat {
    /// Command which created the layer, as a single line.
    fn command(&self) -> Result<String> {
        let compat: V1Compatibility = serde_json::from_str(&self.v1_compat)?;
        Ok(compat.container_config.cmd.unwrap_or_default().join(" "))
    }
}

impl ManifestSchema1Signed {
    pub fn schema_version(&self) -> u16 {
        self.schema_version
    }

    /// List digests of all layers referenced by this manifest.
    ///
    /// The returned layers list is ordered starting with the base image first.
    pub fn get_layers(&self) -> Vec<String> {
        self.fs_layers
            .iter()
            .rev()
            .map(|l| l.blob_sum.clone())
            .collect()
    }

    /// Layers and the commands that produced them, base layer first.
    ///
    /// Each `fsLayers` entry must have a matching `history` entry.
    pub fn layers_with_commands(&self) -> Result<(Vec<FsLayer>, Vec<FsLayerCommand>)> {
        if self.fs_layers.len() != self.history.len() {
            return Err(Error::LayerCountMismatch {
                layers: self.fs_layers.len(),
                history: self.history.len(),
            });
        }

        let mut layers = Vec::with_capacity(self.fs_layers.len());
        let mut commands = Vec::with_capacity(self.history.len());
        for (layer, compat) in self.fs_layers.iter().zip(self.history.iter()).rev() {
            let command = strip_docker_meta(&compat.command()?);
            commands.push(FsLayerCommand {
                command,
                layer: trim_digest(&layer.blob_sum).to_string(),
            });
            layers.push(FsLayer {
                blob_sum: layer.blob_sum.clone(),
            });
        }
        Ok((layers, commands))
    }
}
