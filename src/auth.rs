//! Client-credentials authentication against the platform's OAuth token endpoint.
//!
//! A [`Credentials`] value is exchanged once for a bearer [`Token`]. The token is then carried
//! by the [`state::Authenticated`] client for its whole lifetime; there is no expiry tracking
//! and no refresh.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method};
/// Secret string types that redact values in debug output for security.
pub use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Result, ToQueryParams as _};

const GRANT_TYPE: &str = "client_credentials";

/// Bearer token returned by the token endpoint.
pub type Token = SecretString;

/// Set of credentials used to obtain a [`Token`].
///
/// `authorization` is the pre-encoded value the platform hands out alongside the client id and
/// secret (usually `Basic <base64>`); it is sent verbatim in the `Authorization` header of the
/// token request.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub(crate) client_id: String,
    pub(crate) client_secret: SecretString,
    pub(crate) authorization: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new<S: Into<String>>(
        client_id: S,
        client_secret: String,
        authorization: String,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret),
            authorization: SecretString::from(authorization),
        }
    }

    /// Returns the client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the client secret.
    #[must_use]
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    /// Returns the value sent in the token request's `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> &SecretString {
        &self.authorization
    }
}

/// Body of a successful token response.
#[non_exhaustive]
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Token,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime of the token in seconds, as reported by the server. Informational only.
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub jti: Option<String>,
}

/// Each client can exist in one state at a time, i.e. [`state::Unauthenticated`] or
/// [`state::Authenticated`].
pub mod state {
    use super::Token;

    /// The initial state of the client. No sales endpoint can be called from here.
    #[non_exhaustive]
    #[derive(Clone, Debug)]
    pub struct Unauthenticated;

    /// The elevated state of the client, holding the bearer token obtained with
    /// [`crate::sales::Client::authenticate`].
    #[non_exhaustive]
    #[derive(Clone, Debug)]
    pub struct Authenticated {
        pub(crate) token: Token,
    }

    /// The client state can only be [`Unauthenticated`] or [`Authenticated`].
    pub trait State: sealed::Sealed {}

    impl State for Unauthenticated {}
    impl sealed::Sealed for Unauthenticated {}

    impl State for Authenticated {}
    impl sealed::Sealed for Authenticated {}

    mod sealed {
        pub trait Sealed {}
    }
}

#[derive(Serialize)]
struct TokenQuery<'creds> {
    grant_type: &'static str,
    client_id: &'creds str,
    client_secret: &'creds str,
}

/// Exchanges `credentials` for a bearer token.
///
/// A non-success status is reported as [`crate::error::Kind::Authentication`], with the status
/// code and the response body available through the error's source.
pub(crate) async fn request_token(
    client: &ReqwestClient,
    auth_host: &Url,
    credentials: &Credentials,
) -> Result<TokenResponse> {
    let query = TokenQuery {
        grant_type: GRANT_TYPE,
        client_id: &credentials.client_id,
        client_secret: credentials.client_secret.expose_secret(),
    }
    .query_params(None);

    let request = client
        .request(
            Method::POST,
            format!("{auth_host}security/oauth/token{query}"),
        )
        .build()?;

    let mut headers = HeaderMap::new();
    let mut authorization = HeaderValue::from_str(credentials.authorization.expose_secret())?;
    authorization.set_sensitive(true);
    headers.insert(AUTHORIZATION, authorization);

    let (response, _): (TokenResponse, _) = crate::request(client, request, Some(headers))
        .await
        .map_err(crate::error::Error::into_authentication)?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        client_id = %credentials.client_id,
        expires_in = ?response.expires_in,
        "obtained access token"
    );

    Ok(response)
}

/// Builds the `Authorization: Bearer <token>` header used on every sales call.
pub(crate) fn bearer_headers(token: &Token) -> Result<HeaderMap> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}
