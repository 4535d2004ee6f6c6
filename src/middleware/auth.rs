use base64::Engine;
use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use serde_json::Value;
use tracing::debug;

use super::Preprocessor;
use crate::error::ServiceError;
use crate::flags::{NOT_SECURED, NO_AUTHENTICATION};
use crate::server::Request;

/// Attachment holding the authenticated user name.
pub const USERNAME_ATTACHMENT: &str = "basic.auth.username";
/// Attachment holding the supplied password.
pub const PASSWORD_ATTACHMENT: &str = "basic.auth.password";

/// HTTP Basic authentication.
///
/// Decodes `Authorization: Basic <base64(user:password)>` and stores both
/// parts as request attachments. Verifying the credentials is left to the
/// application. Routes flagged `no.authentication` or `not.secured` are
/// skipped.
#[derive(Debug, Clone)]
pub struct BasicAuthPreprocessor {
    realm: String,
}

impl BasicAuthPreprocessor {
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
        }
    }

    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    fn challenge(&self) -> ServiceError {
        ServiceError::unauthorized("Authentication required")
            .with_header(WWW_AUTHENTICATE.as_str(), format!("Basic realm=\"{}\"", self.realm))
    }

    fn credentials(header: &str) -> Option<(String, String)> {
        let (scheme, encoded) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, password) = decoded.split_once(':')?;
        Some((user.to_string(), password.to_string()))
    }
}

impl Preprocessor for BasicAuthPreprocessor {
    fn process(&self, request: &mut Request) -> anyhow::Result<()> {
        if request.is_flagged(NO_AUTHENTICATION) || request.is_flagged(NOT_SECURED) {
            return Ok(());
        }
        let Some((user, password)) = request
            .header(AUTHORIZATION.as_str())
            .and_then(Self::credentials)
        else {
            debug!(
                correlation_id = %request.correlation_id(),
                realm = %self.realm,
                "Missing or malformed Basic credentials"
            );
            return Err(self.challenge().into());
        };
        request.put_attachment(USERNAME_ATTACHMENT, Value::String(user));
        request.put_attachment(PASSWORD_ATTACHMENT, Value::String(password));
        Ok(())
    }
}
