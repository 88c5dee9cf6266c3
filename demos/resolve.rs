extern crate dkscan;
extern crate env_logger;
extern crate serde_json;
extern crate tokio;

use dkscan::resolver::{ResolveOptions, Resolver};
use dkscan::v2::manifest::TargetPlatform;
use std::result::Result;
use std::{boxed, env, error};

#[tokio::main]
async fn main() {
    let image = match env::args().nth(1) {
        Some(x) => x,
        None => "quay.io/coreos/etcd:latest".into(),
    };

    let platform = match env::args().nth(2) {
        Some(x) => parse_platform(&x),
        None => TargetPlatform::default(),
    };

    let options = ResolveOptions {
        username: env::var("DKSCAN_USER").ok(),
        password: env::var("DKSCAN_PASSWD").ok(),
        platform,
        ..Default::default()
    };

    if let Err(e) = run(&image, options).await {
        println!("[{}] {}", image, e);
        std::process::exit(1);
    };
}

fn parse_platform(s: &str) -> TargetPlatform {
    let mut parts = s.splitn(3, '/');
    let os = parts.next().unwrap_or("linux");
    let arch = parts.next().unwrap_or("amd64");
    let platform = TargetPlatform::new(os, arch);
    match parts.next() {
        Some(variant) => platform.with_variant(variant),
        None => platform,
    }
}

async fn run(image: &str, options: ResolveOptions) -> Result<(), boxed::Box<dyn error::Error>> {
    env_logger::Builder::new()
        .filter(Some("dkscan"), log::LevelFilter::Trace)
        .try_init()?;

    println!("[{}] resolving for {}", image, options.platform);
    let resolved = Resolver::new(options).resolve_with_commands(image).await?;

    println!("{}", serde_json::to_string_pretty(&resolved)?);
    println!(
        "[{}] {} layers, analyzed layer {}",
        image,
        resolved.layers.len(),
        resolved.analyzed_layer_name()
    );
    Ok(())
}
