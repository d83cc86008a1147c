// Credential store and password-grant token exchange.
//
// The bearer credential is replaced wholesale on every login; there is
// no refresh-token flow. Readers always observe a complete credential.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::client::AldesClient;
use crate::error::Error;
use crate::models::TokenResponse;

/// Seconds before the advertised expiry at which a token is treated as stale.
const EXPIRY_SKEW_SECS: i64 = 30;

/// A bearer credential issued by `POST /oauth2/token/`.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token_type: String,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub scope: Option<String>,
    /// Lifetime in seconds as advertised by the token endpoint.
    pub expires_in: Option<u64>,
    pub issued_at: DateTime<Utc>,
}

impl Credential {
    fn from_response(token: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        Self {
            token_type: token.token_type,
            access_token: SecretString::from(token.access_token),
            refresh_token: token.refresh_token.map(SecretString::from),
            scope: token.scope,
            expires_in: token.expires_in,
            issued_at,
        }
    }

    /// Value for the `Authorization` header: `<token_type> <access_token>`.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token.expose_secret())
    }

    /// Absolute expiry instant. `None` when the endpoint gave no lifetime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.expires_in?).ok()?;
        self.issued_at.checked_add_signed(TimeDelta::try_seconds(secs)?)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at()
            .is_some_and(|at| (at - now).num_seconds() <= EXPIRY_SKEW_SECS)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Holder for the current bearer credential.
///
/// Lock-free: concurrent poll cycles and commands read and replace the
/// credential through an atomic pointer swap.
pub struct CredentialStore {
    current: ArcSwapOption<Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
        }
    }

    /// The credential in effect right now, if any login has succeeded.
    pub fn current(&self) -> Option<Arc<Credential>> {
        self.current.load_full()
    }

    /// Replace the stored credential and return the shared handle.
    pub fn replace(&self, credential: Credential) -> Arc<Credential> {
        let credential = Arc::new(credential);
        self.current.store(Some(Arc::clone(&credential)));
        credential
    }

    pub fn clear(&self) {
        self.current.store(None);
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.load().is_some()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AldesClient {
    /// Exchange the configured username/password for a bearer token.
    ///
    /// `POST /oauth2/token/` with a form-encoded password grant. On
    /// success the new credential replaces the stored one; on any
    /// non-success status an [`Error::Authentication`] carrying the
    /// status is returned and the stored credential is left untouched.
    pub async fn authenticate(&self) -> Result<Arc<Credential>, Error> {
        let url = self.endpoint(&["oauth2", "token", ""]);
        debug!("requesting token at {url}");

        let form = [
            ("grant_type", "password"),
            ("username", self.username()),
            ("password", self.password().expose_secret()),
        ];

        let resp = self
            .http()
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Authentication {
                status: None,
                message: format!("token endpoint unreachable: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                status: Some(status.as_u16()),
                message: format!("login failed (HTTP {status}): {}", preview(&body)),
            });
        }

        let body = resp.text().await?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("invalid token response: {e}"),
                body: String::new(),
            })?;

        let credential = self
            .credentials()
            .replace(Credential::from_response(token, Utc::now()));
        info!(
            token_type = %credential.token_type,
            expires_at = ?credential.expires_at(),
            "authenticated with Aldes cloud"
        );
        Ok(credential)
    }

    /// The stored credential, logging in first when there is none or it
    /// has expired.
    pub(crate) async fn valid_credential(&self) -> Result<Arc<Credential>, Error> {
        match self.credentials().current() {
            Some(credential) if !credential.is_expired() => Ok(credential),
            Some(_) => {
                debug!("stored token expired, logging in again");
                self.authenticate().await
            }
            None => self.authenticate().await,
        }
    }
}

/// First 200 bytes of a response body, for error messages.
pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(expires_in: Option<u64>, issued_at: DateTime<Utc>) -> Credential {
        Credential {
            token_type: "Bearer".into(),
            access_token: SecretString::from("tok".to_string()),
            refresh_token: None,
            scope: Some("offline_access".into()),
            expires_in,
            issued_at,
        }
    }

    #[test]
    fn authorization_header_uses_token_type() {
        let c = credential(None, Utc::now());
        assert_eq!(c.authorization(), "Bearer tok");
    }

    #[test]
    fn expiry_accounts_for_skew() {
        let issued = Utc::now();
        let c = credential(Some(3600), issued);
        assert!(!c.is_expired_at(issued));
        assert!(c.is_expired_at(issued + TimeDelta::seconds(3590)));
        assert!(c.is_expired_at(issued + TimeDelta::seconds(7200)));
    }

    #[test]
    fn no_lifetime_never_expires() {
        let c = credential(None, Utc::now() - TimeDelta::days(365));
        assert!(!c.is_expired());
    }

    #[test]
    fn store_replaces_wholesale() {
        let store = CredentialStore::new();
        assert!(store.current().is_none());

        store.replace(credential(Some(60), Utc::now()));
        let mut next = credential(Some(120), Utc::now());
        next.access_token = SecretString::from("second".to_string());
        store.replace(next);

        let current = store.current().expect("credential stored");
        assert_eq!(current.access_token.expose_secret(), "second");
        assert_eq!(current.expires_in, Some(120));

        store.clear();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        assert!(preview(&body).len() <= 200);
    }
}
