use crate::errors::{Error, Result};
use crate::mediatypes;
use crate::v2::*;
use sha2::{Digest, Sha256};

impl Client {
    async fn get_blob_response(&mut self, name: &str, digest: &str) -> Result<reqwest::Response> {
        let ep = format!("{}/v2/{}/blobs/{}", self.base_url, name, digest);
        let url = Url::parse(&ep)?;
        let accept = mediatypes::accept_header(mediatypes::CONFIG_ACCEPT);

        let res = self
            .send_authorized(|c| {
                Ok(c.build_reqwest(Method::GET, url.clone())
                    .header(header::ACCEPT, accept.as_str())
                    .build()?)
            })
            .await?;

        let status = res.status();
        trace!("GET {} status: {}", res.url(), status);

        if !status.is_success() {
            let body = res.bytes().await?;
            return Err(Error::from_status(status, &body));
        }
        if let Some(len) = res.content_length() {
            trace!("Receiving a blob with {} bytes", len);
        } else {
            trace!("Receiving a blob");
        }
        Ok(res)
    }

    /// Retrieve blob, checking its content against `digest`.
    pub async fn get_blob(&mut self, name: &str, digest: &str) -> Result<Vec<u8>> {
        let blob = self
            .get_blob_response(name, digest)
            .await?
            .bytes()
            .await?
            .to_vec();

        verify_digest(digest, &blob)?;
        Ok(blob)
    }
}

/// Check `blob` against a `sha256:<hex>` digest.
///
/// Digests using other algorithms are accepted unchecked.
fn verify_digest(digest: &str, blob: &[u8]) -> Result<()> {
    match digest.split_once(':') {
        Some(("sha256", expected)) => {
            let got = format!("{:x}", Sha256::digest(blob));
            if got.eq_ignore_ascii_case(expected) {
                Ok(())
            } else {
                Err(Error::DigestMismatch {
                    expected: digest.to_string(),
                    got: format!("sha256:{}", got),
                })
            }
        }
        _ => {
            warn!("Not verifying blob with unsupported digest {:?}", digest);
            Ok(())
        }
    }
}
