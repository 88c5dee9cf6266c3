use crate::errors::{excerpt, Error, Result};
use crate::image::{FsLayer, Image};
use crate::mediatypes::{self, MediaTypes};
use crate::reference::Reference;
use crate::v2::Client;
use reqwest::{header, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;

mod manifest_schema1;
pub use self::manifest_schema1::*;

mod manifest_schema2;
pub use self::manifest_schema2::*;

/// Manifest, in one of the supported schemas.
#[derive(Debug)]
pub enum Manifest {
    S1Signed(manifest_schema1::ManifestSchema1Signed),
    S2(manifest_schema2::ManifestSchema2),
    ML(manifest_schema2::ManifestList),
}

/// A decoded manifest, with the response metadata it came with.
#[derive(Debug)]
pub struct ManifestResponse {
    pub manifest: Manifest,
    pub media_type: MediaTypes,
    /// Value of the `Docker-Content-Digest` header, if any.
    pub digest: Option<String>,
}

/// Platform to pick out of a manifest list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetPlatform {
    pub os: String,
    pub architecture: String,
    /// Only compared when set.
    pub variant: Option<String>,
}

impl TargetPlatform {
    pub fn new(os: impl Into<String>, architecture: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            architecture: architecture.into(),
            variant: None,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }
}

impl Default for TargetPlatform {
    fn default() -> Self {
        Self::new("linux", "amd64")
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if let Some(v) = &self.variant {
            write!(f, "/{}", v)?;
        }
        Ok(())
    }
}

impl Client {
    /// Fetch an image manifest.
    ///
    /// The name and reference parameters identify the image.
    /// The reference may be either a tag or digest.
    pub async fn get_manifest(&mut self, name: &str, reference: &str) -> Result<ManifestResponse> {
        let url = Url::parse(&format!(
            "{}/v2/{}/manifests/{}",
            self.base_url, name, reference
        ))?;
        let accept = mediatypes::manifest_accept_header();

        let res = self
            .send_authorized(|c| {
                Ok(c.build_reqwest(Method::GET, url.clone())
                    .header(header::ACCEPT, accept.as_str())
                    .build()?)
            })
            .await?;

        let status = res.status();
        trace!("GET {} status: {}", res.url(), status);

        let content_type = header_string(res.headers(), header::CONTENT_TYPE.as_str());
        let digest = header_string(res.headers(), "docker-content-digest");
        let body = res.bytes().await?;

        let (manifest, media_type) = decode_manifest(status, content_type.as_deref(), &body)?;
        trace!("Decoded manifest of type {}", media_type);
        Ok(ManifestResponse {
            manifest,
            media_type,
            digest,
        })
    }

    /// Resolve `reference` into an `Image` with its layers listed base first.
    ///
    /// A manifest list is resolved through the first entry matching
    /// `platform`, which is fetched by digest. Schema 1 manifests also
    /// yield the commands of each layer.
    pub async fn resolve_image(
        &mut self,
        reference: &Reference,
        platform: &TargetPlatform,
    ) -> Result<Image> {
        let name = reference.repository();
        let mut version = reference.version();

        let mut resp = self.get_manifest(&name, &version).await?;
        if let Manifest::ML(list) = &resp.manifest {
            let entry = list.select(platform)?;
            debug!(
                "Selected {} for platform {} out of {:?}",
                entry.digest,
                platform,
                list.architectures()
            );
            version = entry.digest.clone();
            resp = self.get_manifest(&name, &version).await?;
        }

        let mut image = Image {
            registry: reference.registry(),
            repository: name,
            reference: version,
            manifest_digest: resp.digest,
            ..Default::default()
        };
        match resp.manifest {
            Manifest::S2(m) => {
                image.schema_version = m.schema_version();
                image.digest = Some(m.config());
                image.layers = m
                    .get_layers()
                    .into_iter()
                    .map(|blob_sum| FsLayer { blob_sum })
                    .collect();
            }
            Manifest::S1Signed(m) => {
                let (layers, commands) = m.layers_with_commands()?;
                image.schema_version = m.schema_version();
                image.layers = layers;
                image.commands = commands;
            }
            Manifest::ML(_) => {
                return Err(Error::UnsupportedManifestType {
                    content_type: resp.media_type.to_string(),
                    status: StatusCode::OK,
                    body: "manifest list entry resolves to another manifest list".into(),
                })
            }
        }

        debug!(
            "Resolved {}/{}@{}: schema {}, {} layers",
            image.registry,
            image.repository,
            image.reference,
            image.schema_version,
            image.layers.len()
        );
        Ok(image)
    }
}

fn header_string(headers: &header::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Pick the manifest decoder from the response status and content type.
fn decode_manifest(
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<(Manifest, MediaTypes)> {
    if !status.is_success() {
        return Err(Error::from_status(status, body));
    }

    let ct = content_type.unwrap_or_default();
    let unsupported = || Error::UnsupportedManifestType {
        content_type: ct.to_string(),
        status,
        body: excerpt(body),
    };

    let media_type = MediaTypes::from_content_type(ct).ok_or_else(unsupported)?;
    let manifest = match media_type {
        MediaTypes::ManifestV2S2 | MediaTypes::OciImageManifest => Manifest::S2(deserialize(body)?),
        MediaTypes::ManifestV2S1 | MediaTypes::ManifestV2S1Signed => {
            Manifest::S1Signed(deserialize(body)?)
        }
        MediaTypes::ManifestList | MediaTypes::OciImageIndex => Manifest::ML(deserialize(body)?),
        _ => return Err(unsupported()),
    };
    Ok((manifest, media_type))
}

fn deserialize<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let mut de = serde_json::Deserializer::from_slice(body);
    let value = serde_ignored::deserialize(&mut de, |path| {
        trace!("Ignoring unknown manifest field {}", path)
    })?;
    de.end()?;
    Ok(value)
}
