use super::TargetPlatform;
use crate::errors::{Error, Result};

/// Manifest version 2 schema 2, or OCI image manifest.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ManifestSchema2 {
    #[serde(rename = "schemaVersion")]
    schema_version: u16,
    #[serde(rename = "mediaType", default)]
    media_type: String,
    config: Config,
    layers: Vec<S2Layer>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(rename = "mediaType", default)]
    media_type: String,
    #[serde(default)]
    size: u64,
    digest: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct S2Layer {
    #[serde(rename = "mediaType", default)]
    media_type: String,
    #[serde(default)]
    size: u64,
    digest: String,
    urls: Option<Vec<String>>,
}

/// Manifest List, or OCI image index.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ManifestList {
    #[serde(rename = "schemaVersion")]
    schema_version: u16,
    #[serde(rename = "mediaType", default)]
    media_type: String,
    pub manifests: Vec<ManifestObj>,
}

/// Manifest object.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ManifestObj {
    #[serde(rename = "mediaType", default)]
    media_type: String,
    #[serde(default)]
    size: u64,
    pub digest: String,
    #[serde(default)]
    pub platform: Platform,
}

/// Platform-related manifest entries.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Platform {
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub os: String,
    #[serde(rename = "os.version")]
    pub os_version: Option<String>,
    #[serde(rename = "os.features")]
    pub os_features: Option<Vec<String>>,
    pub variant: Option<String>,
    pub features: Option<Vec<String>>,
}

impl ManifestSchema2 {
    pub fn schema_version(&self) -> u16 {
        self.schema_version
    }

    /// List digests of all layer referenced by this manifest.
    ///
    /// The returned layers list is ordered starting with the base image first.
    pub fn get_layers(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.digest.clone()).collect()
    }

    /// Get digest of the configuration object referenced by this manifest.
    pub fn config(&self) -> String {
        self.config.digest.clone()
    }
}

impl Platform {
    /// Whether this entry runs on `target`.
    ///
    /// The variant is compared only when the target names one.
    pub fn matches(&self, target: &TargetPlatform) -> bool {
        if self.os != target.os || self.architecture != target.architecture {
            return false;
        }
        match &target.variant {
            Some(v) => self.variant.as_deref() == Some(v.as_str()),
            None => true,
        }
    }
}

impl ManifestList {
    /// First manifest of the list built for `target`.
    pub fn select(&self, target: &TargetPlatform) -> Result<&ManifestObj> {
        self.manifests
            .iter()
            .find(|m| m.platform.matches(target))
            .ok_or_else(|| Error::PlatformNotFound {
                os: target.os.clone(),
                arch: target.architecture.clone(),
            })
    }

    /// All platforms announced by the list, as `os/arch[/variant]`.
    pub fn architectures(&self) -> Vec<String> {
        self.manifests
            .iter()
            .map(|m| {
                let p = &m.platform;
                match &p.variant {
                    Some(v) => format!("{}/{}/{}", p.os, p.architecture, v),
                    None => format!("{}/{}", p.os, p.architecture),
                }
            })
            .collect()
    }
}
