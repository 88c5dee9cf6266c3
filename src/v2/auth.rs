use crate::errors::{excerpt, Error, Result};
use crate::v2::*;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A `WWW-Authenticate: Bearer realm="...",service="...",scope="..."` challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthChallenge {
    pub realm: String,
    pub service: String,
    pub scope: String,
}

impl AuthChallenge {
    /// Parse a challenge header. Parameters may come in any order.
    pub fn parse(header: &str) -> Result<Self> {
        let malformed = || Error::MalformedChallenge(header.to_string());

        let (scheme, params) = header.trim().split_once(' ').ok_or_else(malformed)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(malformed());
        }

        let (mut realm, mut service, mut scope) = (None, None, None);
        for cap in param_regex().captures_iter(params) {
            let value = cap["value"].to_string();
            match cap["key"].to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                other => trace!("Ignoring challenge parameter {:?}", other),
            }
        }

        match (realm, service, scope) {
            (Some(realm), Some(service), Some(scope)) if !realm.is_empty() => Ok(Self {
                realm,
                service,
                scope,
            }),
            _ => Err(malformed()),
        }
    }
}

fn param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?P<key>[A-Za-z]+)="(?P<value>[^"]*)""#).expect("static regex"))
}

/// A registry bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header: `Bearer <token>`.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&"<redacted>").finish()
    }
}

/// Token endpoint response.
#[derive(Default, Deserialize)]
struct TokenAuth {
    #[serde(default)]
    token: String,
    #[serde(default)]
    access_token: String,
}

impl TokenAuth {
    fn into_token(self) -> Option<BearerToken> {
        let t = if self.token.is_empty() {
            self.access_token
        } else {
            self.token
        };
        Some(t).filter(|t| !t.is_empty()).map(BearerToken)
    }
}

impl Client {
    /// Run the bearer-token handshake described by `challenge` (the
    /// `WWW-Authenticate` header value of a `401` response).
    ///
    /// On success, the token is used for all further requests of this client.
    pub async fn authenticate(&mut self, challenge: &str) -> Result<BearerToken> {
        let chal = AuthChallenge::parse(challenge)?;
        let failed = |reason: String| Error::TokenRequestFailed {
            realm: chal.realm.clone(),
            reason,
        };

        let user = self.credentials.as_ref().filter(|c| !c.username.is_empty());
        let mut url = Url::parse(&chal.realm).map_err(|e| failed(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("service", &chal.service);
            query.append_pair("scope", &chal.scope);
            if let Some(c) = user {
                query.append_pair("account", &c.username);
            }
        }
        trace!("Token endpoint: {}", url);

        let mut builder = self.hclient.get(url);
        if let Some(c) = user {
            builder = builder.basic_auth(&c.username, Some(&c.password));
        }
        if let Some(ua) = &self.user_agent {
            builder = builder.header(header::USER_AGENT, ua.as_str());
        }

        let res = self.transport.send(builder.build()?).await?;
        let status = res.status();
        trace!("Got status {}", status);
        let body = res.bytes().await?;
        if status != StatusCode::OK {
            return Err(failed(format!("status {}: {}", status, excerpt(&body))));
        }

        let token = serde_json::from_slice::<TokenAuth>(&body)
            .map_err(|e| failed(format!("undecodable token response: {}", e)))?
            .into_token()
            .ok_or_else(|| failed("empty token".to_string()))?;
        trace!("Got token");

        self.auth = Some(Auth::Bearer(token.clone()));
        Ok(token)
    }
}
