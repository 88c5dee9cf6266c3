extern crate dkscan;
extern crate env_logger;
extern crate mockito;
extern crate serde_json;
extern crate sha2;
extern crate tokio;

mod auth_flow;
mod commands;
mod resolve;

use dkscan::credentials::CredentialChain;
use dkscan::mediatypes::MediaTypes;
use dkscan::resolver::{ResolveOptions, Resolver};
use dkscan::transport::RetryPolicy;
use sha2::{Digest, Sha256};
use std::time::Duration;

pub static MANIFEST_V2S2: &str = include_str!("../fixtures/manifest_v2_s2.json");
pub static MANIFEST_V2S1: &str = include_str!("../fixtures/manifest_v2_s1.json");
pub static MANIFEST_LIST: &str = include_str!("../fixtures/manifest_list_v2.json");
pub static CONFIG_V1: &str = include_str!("../fixtures/config_v1.json");

/// Options for a plain-HTTP registry served by mockito, with a short retry budget.
pub fn options() -> ResolveOptions {
    let _ = env_logger::builder().is_test(true).try_init();
    ResolveOptions {
        insecure_registry: true,
        timeout: Some(Duration::from_secs(5)),
        retry_policy: RetryPolicy {
            interval: Duration::from_millis(20),
            max_elapsed: Duration::from_millis(100),
        },
        ..Default::default()
    }
}

/// A resolver without any credential provider.
pub fn resolver(options: ResolveOptions) -> Resolver {
    Resolver::with_chain(options, CredentialChain::new(vec![]))
}

/// Image reference pointing at the mock registry.
pub fn image(repository: &str, tag: &str) -> String {
    format!("{}/{}:{}", mockito::server_address(), repository, tag)
}

pub fn manifest_path(repository: &str, reference: &str) -> String {
    format!("/v2/{}/manifests/{}", repository, reference)
}

pub fn content_type(m: MediaTypes) -> String {
    m.to_string()
}

pub fn sha256(body: &[u8]) -> String {
    format!("sha256:{:x}", Sha256::digest(body))
}
