use crate::*;
use dkscan::errors::{Error, ErrorKind};
use dkscan::v2::manifest::TargetPlatform;
use mockito::{mock, Matcher};

#[tokio::test]
async fn test_resolve_schema2() {
    let repo = "mock/schema2";
    let m = mock("GET", manifest_path(repo, "1.0").as_str())
        .match_header("accept", Matcher::Regex(r"manifest\.v2\+json".to_string()))
        .match_header("user-agent", dkscan::USER_AGENT)
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestV2S2))
        .with_header("Docker-Content-Digest", "sha256:feedbeef")
        .with_body(MANIFEST_V2S2)
        .create();

    let image = resolver(options()).resolve(&image(repo, "1.0")).await.unwrap();
    m.assert();

    assert_eq!(image.registry, mockito::server_address().to_string());
    assert_eq!(image.repository, repo);
    assert_eq!(image.reference, "1.0");
    assert_eq!(image.schema_version, 2);
    assert_eq!(
        image.digest.as_deref(),
        Some("sha256:b5b2b2c507a0944348e0303114d8d93aaaa081732b86451d9bce1f432a537bc7")
    );
    assert_eq!(image.manifest_digest.as_deref(), Some("sha256:feedbeef"));
    assert_eq!(image.layers.len(), 3);
    assert_eq!(
        image.layers[0].blob_sum,
        "sha256:e692418e4cbaf90ca69d05a66403747baa33ee08806650b51fab815ad7fc331f"
    );
    assert!(!image.has_commands());
    assert_eq!(image.analyzed_layer_index(), 2);
    assert_eq!(
        image.analyzed_layer_name(),
        "b5b2b2c507a0944348e0303114d8d93aaaa081732b86451d9bce1f432a537bc7\
         ec4b8955958665577945c89419d1af06b5f7636b4ac3da7f12184802ad867736"
    );
}

#[tokio::test]
async fn test_resolve_schema1() {
    let repo = "mock/schema1";
    let _m = mock("GET", manifest_path(repo, "3.4").as_str())
        .with_status(200)
        .with_header(
            "Content-Type",
            &content_type(MediaTypes::ManifestV2S1Signed),
        )
        .with_body(MANIFEST_V2S1)
        .create();

    let image = resolver(options()).resolve(&image(repo, "3.4")).await.unwrap();

    assert_eq!(image.schema_version, 1);
    assert_eq!(image.digest, None);
    assert_eq!(image.layers.len(), 2);
    assert_eq!(image.commands.len(), 2);
    assert_eq!(
        image.layers[0].blob_sum,
        "sha256:e110a4a1794126ef308a49f2d65785af2f25538f06700721aad8283b81fdfa58"
    );
    assert_eq!(image.commands[1].command, "CMD [\"/bin/sh\"]");
    assert_eq!(image.analyzed_layer_index(), 0);
    assert_eq!(
        image.analyzed_layer_name(),
        "e110a4a1794126ef308a49f2d65785af2f25538f06700721aad8283b81fdfa58"
    );
}

#[tokio::test]
async fn test_resolve_manifest_list() {
    let repo = "mock/list";
    let amd64 = "sha256:5b0bcabd1ed22e9fb1310cf6c2dec7cdef19f0ad69efa1f392e94a4333501270";
    let list = mock("GET", manifest_path(repo, "latest").as_str())
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestList))
        .with_body(MANIFEST_LIST)
        .create();
    let entry = mock("GET", manifest_path(repo, amd64).as_str())
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestV2S2))
        .with_body(MANIFEST_V2S2)
        .create();

    let image = resolver(options())
        .resolve(&image(repo, "latest"))
        .await
        .unwrap();
    list.assert();
    entry.assert();

    assert_eq!(image.reference, amd64);
    assert_eq!(image.layers.len(), 3);
}

#[tokio::test]
async fn test_resolve_platform_not_found() {
    let repo = "mock/list-s390x";
    let _m = mock("GET", manifest_path(repo, "latest").as_str())
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestList))
        .with_body(MANIFEST_LIST)
        .create();

    let mut opts = options();
    opts.platform = TargetPlatform::new("linux", "s390x");
    let err = resolver(opts)
        .resolve(&image(repo, "latest"))
        .await
        .unwrap_err();

    match err {
        Error::PlatformNotFound { os, arch } => {
            assert_eq!(os, "linux");
            assert_eq!(arch, "s390x");
        }
        e => panic!("unexpected error {:?}", e),
    }
}

#[tokio::test]
async fn test_resolve_nested_list() {
    let repo = "mock/nested";
    let amd64 = "sha256:5b0bcabd1ed22e9fb1310cf6c2dec7cdef19f0ad69efa1f392e94a4333501270";
    let _list = mock("GET", manifest_path(repo, "latest").as_str())
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestList))
        .with_body(MANIFEST_LIST)
        .create();
    let _entry = mock("GET", manifest_path(repo, amd64).as_str())
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestList))
        .with_body(MANIFEST_LIST)
        .create();

    let err = resolver(options())
        .resolve(&image(repo, "latest"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedManifestType);
}

#[tokio::test]
async fn test_resolve_unsupported_content_type() {
    let repo = "mock/html";
    let _m = mock("GET", manifest_path(repo, "latest").as_str())
        .with_status(200)
        .with_header("Content-Type", "text/html")
        .with_body("<html>maintenance</html>")
        .create();

    let err = resolver(options())
        .resolve(&image(repo, "latest"))
        .await
        .unwrap_err();
    match err {
        Error::UnsupportedManifestType {
            content_type,
            status,
            body,
        } => {
            assert_eq!(content_type, "text/html");
            assert_eq!(status.as_u16(), 200);
            assert!(body.contains("maintenance"));
        }
        e => panic!("unexpected error {:?}", e),
    }
}

#[tokio::test]
async fn test_resolve_error_statuses() {
    let cases = [
        ("mock/forbidden", 403, ErrorKind::Forbidden),
        ("mock/missing", 404, ErrorKind::Unknown),
        ("mock/broken", 500, ErrorKind::Unknown),
    ];
    for (repo, status, kind) in cases.iter() {
        let _m = mock("GET", manifest_path(repo, "latest").as_str())
            .with_status(*status)
            .with_body("{\"errors\":[]}")
            .create();

        let err = resolver(options())
            .resolve(&image(repo, "latest"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), *kind, "status {}", status);
    }
}

#[tokio::test]
async fn test_resolve_unreachable_registry() {
    // Nothing listens on the discard port.
    let err = resolver(options())
        .resolve("127.0.0.1:9/mock/unreachable:latest")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RetriesExhausted);
}
