//! A pure-Rust asynchronous library resolving container image references
//! into the layer lists consumed by vulnerability scanners.
//!
//! The resolution path covers reference normalization, credential discovery
//! through an ordered chain of providers, the Docker Registry v2 bearer-token
//! handshake and manifest normalization (schema 1, schema 2/OCI and manifest
//! lists with platform selection).
//!
//! ## Example
//!
//! ```rust,no_run
//! # use dkscan::resolver::{ResolveOptions, Resolver};
//! # async fn run() -> dkscan::errors::Result<()> {
//! let resolver = Resolver::new(ResolveOptions::default());
//! let image = resolver.resolve_with_commands("docker.io/library/busybox:latest").await?;
//!
//! println!("{} layers, analyzed as {}", image.layers.len(), image.analyzed_layer_name());
//! # Ok(())
//! # }
//! ```

#![deny(missing_debug_implementations)]

#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;
#[macro_use]
extern crate strum_macros;

pub mod credentials;
pub mod errors;
pub mod image;
pub mod mediatypes;
pub mod reference;
pub mod resolver;
pub mod transport;
pub mod v2;

/// Default User-Agent client identity.
pub static USER_AGENT: &str = "camallo-dkscan/0.1";
