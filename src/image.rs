//! Normalized image description handed to scan backends.

/// A filesystem layer, addressed by its content digest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FsLayer {
    #[serde(rename = "blobSum")]
    pub blob_sum: String,
}

/// The command which produced a layer, paired with the layer hex digest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FsLayerCommand {
    pub command: String,
    pub layer: String,
}

/// A resolved image.
///
/// Layers are ordered base layer first, regardless of the manifest schema
/// they were read from. When `commands` is populated, `commands[i]`
/// describes `layers[i]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Image {
    pub registry: String,
    pub repository: String,
    /// Tag or digest the manifest was fetched with.
    pub reference: String,
    /// Config digest (schema 2/OCI only).
    pub digest: Option<String>,
    /// `Docker-Content-Digest` of the manifest, when the registry sent one.
    pub manifest_digest: Option<String>,
    pub schema_version: u16,
    pub layers: Vec<FsLayer>,
    pub commands: Vec<FsLayerCommand>,
}

impl Image {
    /// Identity of the layer at `index` for the scan backend:
    /// hex image digest followed by hex layer digest.
    ///
    /// Returns `None` when `index` is out of bounds.
    pub fn layer_name(&self, index: usize) -> Option<String> {
        let layer = self.layers.get(index)?;
        let image_hex = self.digest.as_deref().map(trim_digest).unwrap_or_default();
        Some(format!("{}{}", image_hex, trim_digest(&layer.blob_sum)))
    }

    /// Index of the layer a scan backend analyzes: the base layer for
    /// schema 1, the top layer otherwise.
    pub fn analyzed_layer_index(&self) -> usize {
        if self.schema_version == 1 {
            0
        } else {
            self.layers.len().saturating_sub(1)
        }
    }

    /// Name of the analyzed layer, or an empty string for a layer-less image.
    pub fn analyzed_layer_name(&self) -> String {
        self.layer_name(self.analyzed_layer_index())
            .unwrap_or_default()
    }

    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }
}

/// Strip the algorithm prefix (e.g. `sha256:`) off a digest.
pub fn trim_digest(digest: &str) -> &str {
    match digest.split_once(':') {
        Some((_, hex)) => hex,
        None => digest,
    }
}

const SHELL_NOP_PREFIX: &str = "/bin/sh -c #(nop)";
const SHELL_PREFIX: &str = "/bin/sh -c";

/// Strip Dockerfile generation noise from a layer command,
/// e.g. `/bin/sh -c #(nop) CMD [/bin/bash]` becomes `CMD [/bin/bash]`.
///
/// Applying it to its own output is a no-op.
pub fn strip_docker_meta(command: &str) -> String {
    let mut current = command.trim();
    loop {
        let next = current
            .strip_prefix(SHELL_NOP_PREFIX)
            .or_else(|| current.strip_prefix(SHELL_PREFIX))
            .map(str::trim);
        match next {
            Some(n) => current = n,
            None => return current.to_string(),
        }
    }
}
