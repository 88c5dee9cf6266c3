//! Media-types for API objects.

use std::str::FromStr;

// For schema1 types, see https://docs.docker.com/registry/spec/manifest-v2-1/
// For schema2 types, see https://docs.docker.com/registry/spec/manifest-v2-2/
// For OCI types, see https://github.com/opencontainers/image-spec/blob/main/media-types.md

#[derive(Clone, Copy, EnumString, Display, Debug, Hash, PartialEq, Eq)]
pub enum MediaTypes {
    /// Manifest, version 2 schema 1.
    #[strum(serialize = "application/vnd.docker.distribution.manifest.v1+json")]
    ManifestV2S1,
    /// Signed manifest, version 2 schema 1.
    #[strum(serialize = "application/vnd.docker.distribution.manifest.v1+prettyjws")]
    ManifestV2S1Signed,
    /// Manifest, version 2 schema 2.
    #[strum(serialize = "application/vnd.docker.distribution.manifest.v2+json")]
    ManifestV2S2,
    /// Manifest List (aka "fat manifest").
    #[strum(serialize = "application/vnd.docker.distribution.manifest.list.v2+json")]
    ManifestList,
    /// OCI image manifest.
    #[strum(serialize = "application/vnd.oci.image.manifest.v1+json")]
    OciImageManifest,
    /// OCI image index, the OCI counterpart of a manifest list.
    #[strum(serialize = "application/vnd.oci.image.index.v1+json")]
    OciImageIndex,
    /// OCI image configuration.
    #[strum(serialize = "application/vnd.oci.image.config.v1+json")]
    OciImageConfig,
    /// Configuration object for a container.
    #[strum(serialize = "application/vnd.docker.container.image.v1+json")]
    ContainerConfigV1,
    /// Generic JSON
    #[strum(serialize = "application/json")]
    ApplicationJson,
}

/// Manifest media types sent as `Accept`, in preference order.
pub const MANIFEST_ACCEPT: &[MediaTypes] = &[
    MediaTypes::ManifestV2S2,
    MediaTypes::OciImageManifest,
    MediaTypes::ManifestV2S1Signed,
    MediaTypes::ManifestList,
    MediaTypes::OciImageIndex,
];

impl MediaTypes {
    /// Map a `Content-Type` header value onto a known media type.
    ///
    /// Parameters (e.g. `charset`) are ignored.
    pub fn from_content_type(value: &str) -> Option<Self> {
        let essence = match value.parse::<mime::Mime>() {
            Ok(m) => m.essence_str().to_ascii_lowercase(),
            Err(_) => value.trim().to_ascii_lowercase(),
        };
        let mtype = MediaTypes::from_str(&essence).ok();
        if mtype.is_none() {
            trace!("Unknown media type {:?}", value);
        }
        mtype
    }
}

/// Image configuration media types sent as `Accept`, in preference order.
pub const CONFIG_ACCEPT: &[MediaTypes] = &[
    MediaTypes::ContainerConfigV1,
    MediaTypes::OciImageConfig,
    MediaTypes::ApplicationJson,
];

/// Render the `Accept` header value for manifest requests.
pub fn manifest_accept_header() -> String {
    accept_header(MANIFEST_ACCEPT)
}

/// Render an `Accept` header value listing `types`.
pub fn accept_header(types: &[MediaTypes]) -> String {
    types
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
