// Aldes cloud HTTP client
//
// Wraps `reqwest::Client` with base-URL handling, bearer authorization,
// and the single re-authenticate-and-retry step on HTTP 401. Endpoint
// methods live in `products.rs` and `auth.rs` as inherent methods.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{Credential, CredentialStore, preview};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Production host of the AldesConnect API.
pub const DEFAULT_BASE_URL: &str = "https://aldesiotsuite-aldeswebapi.azurewebsites.net";

/// Async client for the AldesConnect cloud API.
///
/// Owns the account credentials and the [`CredentialStore`]. Every
/// authenticated request goes through [`send_authorized`](Self::send_authorized),
/// which logs in lazily and re-authenticates exactly once on a 401.
pub struct AldesClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    credentials: CredentialStore,
}

impl AldesClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API host root, normally [`DEFAULT_BASE_URL`].
    pub fn new(
        base_url: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, username, password)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: String,
        password: SecretString,
    ) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(Self {
            http,
            base_url,
            username,
            password,
            credentials: CredentialStore::new(),
        })
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &SecretString {
        &self.password
    }

    /// The credential store shared by every request of this client.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append path segments to the base URL. Segments are percent-encoded;
    /// a trailing `""` produces a trailing slash.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // ── Authorized dispatch ──────────────────────────────────────────

    /// Send a request with the bearer credential attached.
    ///
    /// `build` is invoked once per attempt so the same request can be
    /// replayed. On a 401 the client re-authenticates exactly once and
    /// resends; a second 401 becomes [`Error::Unauthorized`]. Any other
    /// status is returned to the caller untouched.
    pub(crate) async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response, Error>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let credential = self.valid_credential().await?;
        let resp = self.dispatch(&build, &credential).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        warn!("token rejected (HTTP 401), re-authenticating");
        let credential = self.authenticate().await?;
        let resp = self.dispatch(&build, &credential).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        Ok(resp)
    }

    async fn dispatch<F>(&self, build: &F, credential: &Credential) -> Result<reqwest::Response, Error>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut auth = HeaderValue::from_str(&credential.authorization()).map_err(|e| {
            Error::Authentication {
                status: None,
                message: format!("token is not a valid header value: {e}"),
            }
        })?;
        auth.set_sensitive(true);

        Ok(build(&self.http).header(AUTHORIZATION, auth).send().await?)
    }

    // ── Response handling ────────────────────────────────────────────

    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::api_error(status, resp).await);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    /// Check the status of a write response. The body, if any, is only logged.
    pub(crate) async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::api_error(status, resp).await);
        }

        let body = resp.text().await.unwrap_or_default();
        debug!(%status, body = preview(&body), "write acknowledged");
        Ok(())
    }

    async fn api_error(status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        Error::Api {
            status: status.as_u16(),
            message: if raw.is_empty() {
                status.to_string()
            } else {
                preview(&raw).to_owned()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> AldesClient {
        AldesClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            "user".into(),
            SecretString::from("pw".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_joins_segments() {
        let c = client("https://example.test");
        assert_eq!(
            c.endpoint(&["oauth2", "token", ""]).as_str(),
            "https://example.test/oauth2/token/"
        );
        assert_eq!(
            c.endpoint(&["aldesoc", "v5", "users", "me", "products"]).as_str(),
            "https://example.test/aldesoc/v5/users/me/products"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let c = client("https://proxy.test/aldes/");
        assert_eq!(
            c.endpoint(&["aldesoc", "v5"]).as_str(),
            "https://proxy.test/aldes/aldesoc/v5"
        );
    }

    #[test]
    fn endpoint_encodes_modem_segment() {
        let c = client("https://example.test");
        assert_eq!(
            c.endpoint(&["products", "AB/CD", "commands"]).as_str(),
            "https://example.test/products/AB%2FCD/commands"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        let result = AldesClient::with_client(
            reqwest::Client::new(),
            Url::parse("mailto:someone@example.test").unwrap(),
            "user".into(),
            SecretString::from("pw".to_string()),
        );
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
