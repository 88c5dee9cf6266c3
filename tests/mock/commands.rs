use crate::*;
use dkscan::errors::Error;
use mockito::{mock, Matcher};

/// A schema 2 manifest whose config blob is `config`.
fn manifest_for(config: &str, layers: &[&str]) -> String {
    let layers: Vec<serde_json::Value> = layers
        .iter()
        .map(|d| {
            serde_json::json!({
                "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                "size": 1024,
                "digest": d,
            })
        })
        .collect();
    serde_json::json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "size": config.len(),
            "digest": sha256(config.as_bytes()),
        },
        "layers": layers,
    })
    .to_string()
}

#[tokio::test]
async fn test_resolve_with_commands_schema2() {
    let repo = "mock/commands";
    let config_digest = sha256(CONFIG_V1.as_bytes());
    let _manifest = mock("GET", manifest_path(repo, "1.15").as_str())
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestV2S2))
        .with_body(manifest_for(
            CONFIG_V1,
            &["sha256:aaaa", "sha256:bbbb", "sha256:cccc"],
        ))
        .create();
    let blob = mock("GET", format!("/v2/{}/blobs/{}", repo, config_digest).as_str())
        .match_header(
            "accept",
            Matcher::Regex(r"container\.image\.v1\+json".to_string()),
        )
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ContainerConfigV1))
        .with_body(CONFIG_V1)
        .expect(1)
        .create();

    let image = resolver(options())
        .resolve_with_commands(&image(repo, "1.15"))
        .await
        .unwrap();
    blob.assert();

    let commands: Vec<(&str, &str)> = image
        .commands
        .iter()
        .map(|c| (c.layer.as_str(), c.command.as_str()))
        .collect();
    assert_eq!(
        commands,
        vec![
            (
                "aaaa",
                "ADD file:4fc310c0cb879c876c5c0f571af665a0d24d36cb9263e0f53b0cda2f7e4b1844 in /"
            ),
            ("bbbb", "apt-get update && apt-get install -y nginx"),
            ("cccc", "ln -sf /dev/stdout /var/log/nginx/access.log"),
        ]
    );
}

#[tokio::test]
async fn test_resolve_with_commands_schema1_skips_blob() {
    let repo = "mock/commands-s1";
    let _manifest = mock("GET", manifest_path(repo, "3.4").as_str())
        .with_status(200)
        .with_header(
            "Content-Type",
            &content_type(MediaTypes::ManifestV2S1Signed),
        )
        .with_body(MANIFEST_V2S1)
        .create();
    let blobs = mock("GET", Matcher::Regex(format!("^/v2/{}/blobs/", repo)))
        .expect(0)
        .create();

    let image = resolver(options())
        .resolve_with_commands(&image(repo, "3.4"))
        .await
        .unwrap();
    blobs.assert();
    assert_eq!(image.commands.len(), 2);
}

#[tokio::test]
async fn test_config_digest_mismatch() {
    let repo = "mock/commands-tampered";
    let config_digest = sha256(CONFIG_V1.as_bytes());
    let _manifest = mock("GET", manifest_path(repo, "latest").as_str())
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestV2S2))
        .with_body(manifest_for(CONFIG_V1, &["sha256:aaaa"]))
        .create();
    let _blob = mock("GET", format!("/v2/{}/blobs/{}", repo, config_digest).as_str())
        .with_status(200)
        .with_body("{\"history\":[]}")
        .create();

    let err = resolver(options())
        .resolve_with_commands(&image(repo, "latest"))
        .await
        .unwrap_err();
    match err {
        Error::DigestMismatch { expected, .. } => assert_eq!(expected, config_digest),
        e => panic!("unexpected error {:?}", e),
    }
}

#[tokio::test]
async fn test_config_history_mismatch() {
    let repo = "mock/commands-short";
    let _manifest = mock("GET", manifest_path(repo, "latest").as_str())
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestV2S2))
        .with_body(manifest_for(CONFIG_V1, &["sha256:aaaa"]))
        .create();
    let _blob = mock(
        "GET",
        format!("/v2/{}/blobs/{}", repo, sha256(CONFIG_V1.as_bytes())).as_str(),
    )
    .with_status(200)
    .with_body(CONFIG_V1)
    .create();

    let err = resolver(options())
        .resolve_with_commands(&image(repo, "latest"))
        .await
        .unwrap_err();
    match err {
        Error::LayerCountMismatch { layers, history } => {
            assert_eq!(layers, 1);
            assert_eq!(history, 3);
        }
        e => panic!("unexpected error {:?}", e),
    }
}
