use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

pub const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";
const DEFAULT_REGION_VAR: &str = "AWS_DEFAULT_REGION";

/// Long-lived credentials from the ambient environment, used only to assume the role.
#[derive(Clone)]
pub struct BaseCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
}

impl fmt::Debug for BaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

impl BaseCredentials {
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_owned(),
            secret_access_key: SecretString::from(secret_access_key.to_owned()),
        }
    }

    /// Read both variables through `lookup`; `None` unless both are set and non-blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let access_key_id = non_blank(ACCESS_KEY_ID_VAR)?;
        let secret_access_key = non_blank(SECRET_ACCESS_KEY_VAR)?;
        Some(Self {
            access_key_id,
            secret_access_key: SecretString::from(secret_access_key),
        })
    }

    pub(crate) fn env(&self) -> Vec<(String, String)> {
        vec![
            (ACCESS_KEY_ID_VAR.to_owned(), self.access_key_id.clone()),
            (
                SECRET_ACCESS_KEY_VAR.to_owned(),
                self.secret_access_key.expose_secret().to_owned(),
            ),
        ]
    }
}

/// Temporary credentials of the assumed role, valid for one pipeline run.
///
/// Passed by reference into every provider call after the exchange; never
/// written to disk.
#[derive(Clone)]
pub struct CredentialContext {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: SecretString,
    pub region: String,
}

impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("region", &self.region)
            .finish()
    }
}

impl CredentialContext {
    /// Environment for a child `aws` process acting as the assumed role.
    pub fn env(&self) -> Vec<(String, String)> {
        vec![
            (ACCESS_KEY_ID_VAR.to_owned(), self.access_key_id.clone()),
            (
                SECRET_ACCESS_KEY_VAR.to_owned(),
                self.secret_access_key.expose_secret().to_owned(),
            ),
            (
                SESSION_TOKEN_VAR.to_owned(),
                self.session_token.expose_secret().to_owned(),
            ),
            (DEFAULT_REGION_VAR.to_owned(), self.region.clone()),
        ]
    }
}

/// `aws sts assume-role` output.
#[derive(Deserialize)]
pub(crate) struct AssumeRoleOutput {
    #[serde(rename = "Credentials")]
    pub credentials: AssumedCredentials,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AssumedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl AssumedCredentials {
    pub(crate) fn into_context(self, region: &str) -> CredentialContext {
        CredentialContext {
            access_key_id: self.access_key_id,
            secret_access_key: SecretString::from(self.secret_access_key),
            session_token: SecretString::from(self.session_token),
            region: region.to_owned(),
        }
    }
}
