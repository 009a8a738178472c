//! Credentials read from the process environment

use async_trait::async_trait;

use super::{CredentialStore, StorageError};
use crate::provider::{ProviderCredential, DEFAULT_PROVIDER};

pub const LOGIN_VAR: &str = "DATAFORSEO_LOGIN";
pub const PASSWORD_VAR: &str = "DATAFORSEO_PASSWORD";
pub const API_KEY_VAR: &str = "DATAFORSEO_API_KEY";
pub const BASE_URL_VAR: &str = "DATAFORSEO_BASE_URL";

/// Credential store backed by `DATAFORSEO_*` variables
///
/// Login and password take precedence; a lone API key is used as both halves.
/// Variables are read on every lookup.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    default_base_url: String,
}

impl EnvCredentialStore {
    pub fn new(default_base_url: impl Into<String>) -> Self {
        Self {
            default_base_url: default_base_url.into(),
        }
    }

    fn lookup(&self) -> Option<ProviderCredential> {
        let base_url = non_empty_var(BASE_URL_VAR).unwrap_or_else(|| self.default_base_url.clone());

        match (non_empty_var(LOGIN_VAR), non_empty_var(PASSWORD_VAR)) {
            (Some(login), Some(password)) => Some(ProviderCredential::new(base_url, login, password)),
            _ => non_empty_var(API_KEY_VAR).map(|key| ProviderCredential::from_api_key(base_url, key)),
        }
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn get_active_credential(
        &self,
        provider: &str,
    ) -> Result<Option<ProviderCredential>, StorageError> {
        if !provider.eq_ignore_ascii_case(DEFAULT_PROVIDER) {
            tracing::debug!(provider, "Environment only carries DataForSEO credentials");
            return Ok(None);
        }
        Ok(self.lookup())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
