use crate::*;
use dkscan::errors::ErrorKind;
use mockito::{mock, Matcher};

fn challenge(repository: &str) -> String {
    format!(
        r#"Bearer realm="{}/token",service="mock.registry",scope="repository:{}:pull""#,
        mockito::server_url(),
        repository
    )
}

fn token_query(repository: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("service".into(), "mock.registry".into()),
        Matcher::UrlEncoded("scope".into(), format!("repository:{}:pull", repository)),
    ])
}

#[tokio::test]
async fn test_bearer_handshake_anonymous() {
    let repo = "mock/auth-anon";
    let unauthorized = mock("GET", manifest_path(repo, "latest").as_str())
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("Www-Authenticate", &challenge(repo))
        .expect(1)
        .create();
    let token = mock("GET", "/token")
        .match_query(token_query(repo))
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"token":"anon-token","expires_in":300}"#)
        .expect(1)
        .create();
    let authorized = mock("GET", manifest_path(repo, "latest").as_str())
        .match_header("authorization", "Bearer anon-token")
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestV2S2))
        .with_body(MANIFEST_V2S2)
        .expect(1)
        .create();

    let image = resolver(options())
        .resolve(&image(repo, "latest"))
        .await
        .unwrap();

    unauthorized.assert();
    token.assert();
    authorized.assert();
    assert_eq!(image.layers.len(), 3);
}

#[tokio::test]
async fn test_bearer_handshake_with_credentials() {
    let repo = "mock/auth-user";
    // base64("user:pass")
    let basic = "Basic dXNlcjpwYXNz";
    let unauthorized = mock("GET", manifest_path(repo, "latest").as_str())
        .match_header("authorization", basic)
        .with_status(401)
        .with_header("Www-Authenticate", &challenge(repo))
        .create();
    let token = mock("GET", "/token")
        .match_query(Matcher::AllOf(vec![
            token_query(repo),
            Matcher::UrlEncoded("account".into(), "user".into()),
        ]))
        .match_header("authorization", basic)
        .with_status(200)
        .with_body(r#"{"access_token":"user-token"}"#)
        .expect(1)
        .create();
    let authorized = mock("GET", manifest_path(repo, "latest").as_str())
        .match_header("authorization", "Bearer user-token")
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestV2S2))
        .with_body(MANIFEST_V2S2)
        .create();

    let mut opts = options();
    opts.username = Some("user".into());
    opts.password = Some("pass".into());
    resolver(opts)
        .resolve(&image(repo, "latest"))
        .await
        .unwrap();

    unauthorized.assert();
    token.assert();
    authorized.assert();
}

#[tokio::test]
async fn test_second_unauthorized_is_terminal() {
    let repo = "mock/auth-denied";
    let _unauthorized = mock("GET", manifest_path(repo, "latest").as_str())
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("Www-Authenticate", &challenge(repo))
        .create();
    let token = mock("GET", "/token")
        .match_query(token_query(repo))
        .with_status(200)
        .with_body(r#"{"token":"useless"}"#)
        .expect(1)
        .create();
    let rejected = mock("GET", manifest_path(repo, "latest").as_str())
        .match_header("authorization", "Bearer useless")
        .with_status(401)
        .with_header("Www-Authenticate", &challenge(repo))
        .with_body("denied")
        .expect(1)
        .create();

    let err = resolver(options())
        .resolve(&image(repo, "latest"))
        .await
        .unwrap_err();

    token.assert();
    rejected.assert();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_malformed_challenge() {
    let repo = "mock/auth-malformed";
    let _m = mock("GET", manifest_path(repo, "latest").as_str())
        .with_status(401)
        .with_header("Www-Authenticate", r#"Basic realm="registry""#)
        .create();

    let err = resolver(options())
        .resolve(&image(repo, "latest"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedChallenge);
}

#[tokio::test]
async fn test_missing_challenge() {
    let repo = "mock/auth-nochallenge";
    let _m = mock("GET", manifest_path(repo, "latest").as_str())
        .with_status(401)
        .create();

    let err = resolver(options())
        .resolve(&image(repo, "latest"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedChallenge);
}

#[tokio::test]
async fn test_token_request_failed() {
    let repo = "mock/auth-tokenfail";
    let _m = mock("GET", manifest_path(repo, "latest").as_str())
        .with_status(401)
        .with_header("Www-Authenticate", &challenge(repo))
        .create();
    let _token = mock("GET", "/token")
        .match_query(token_query(repo))
        .with_status(500)
        .with_body("boom")
        .create();

    let err = resolver(options())
        .resolve(&image(repo, "latest"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TokenRequestFailed);
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn test_static_token_sent_as_basic() {
    let repo = "mock/auth-static";
    let m = mock("GET", manifest_path(repo, "latest").as_str())
        .match_header("authorization", "Basic c3RhdGljOnRva2Vu")
        .with_status(200)
        .with_header("Content-Type", &content_type(MediaTypes::ManifestV2S2))
        .with_body(MANIFEST_V2S2)
        .create();

    let mut opts = options();
    opts.token = Some("c3RhdGljOnRva2Vu".into());
    resolver(opts)
        .resolve(&image(repo, "latest"))
        .await
        .unwrap();
    m.assert();
}
