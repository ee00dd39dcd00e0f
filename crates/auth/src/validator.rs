//! Credential validators
//!
//! A bearer credential may be a session access token or an API key. Each
//! kind has one validator behind the shared `CredentialValidator` trait, and
//! the orchestrator tries them in a fixed order - no string-prefix sniffing
//! at call sites.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::apikey::{self, ApiKey};
use crate::claims::TokenKind;
use crate::error::{AuthError, Result};
use crate::identity::AuthIdentity;
use crate::last_used::LastUsedHandle;
use crate::store::CredentialStore;
use crate::token::TokenCodec;
use crate::user::User;

/// Validates one kind of bearer credential
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Authenticate a raw bearer credential
    async fn authenticate(&self, credential: &str) -> Result<AuthIdentity>;

    /// Validator name for logging
    fn name(&self) -> &'static str;
}

/// Validates signed session access tokens
///
/// Pure validation - no store access, no mutation.
pub struct AccessTokenValidator {
    codec: Arc<TokenCodec>,
}

impl AccessTokenValidator {
    /// Create a validator over a token codec
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }
}

#[async_trait]
impl CredentialValidator for AccessTokenValidator {
    async fn authenticate(&self, credential: &str) -> Result<AuthIdentity> {
        let claims = self.codec.validate(credential, TokenKind::Access)?;
        AuthIdentity::from_claims(&claims)
    }

    fn name(&self) -> &'static str {
        "access_token"
    }
}

/// Validates opaque API key secrets
///
/// Hashes the presented secret, looks the digest up in the credential store,
/// and enforces revocation and expiry. Unknown, revoked, and expired keys
/// all fail with the same error so callers cannot probe which condition
/// triggered. Successful validation queues a non-blocking last-used update.
pub struct ApiKeyValidator {
    store: Arc<dyn CredentialStore>,
    last_used: LastUsedHandle,
}

impl ApiKeyValidator {
    /// Create a validator over a credential store
    pub fn new(store: Arc<dyn CredentialStore>, last_used: LastUsedHandle) -> Self {
        Self { store, last_used }
    }

    /// Validate a presented secret and return the key with its owner
    pub async fn validate_secret(&self, secret: &str) -> Result<(ApiKey, User)> {
        let digest = apikey::hash_secret(secret);

        let key = self
            .store
            .get_api_key_by_hash(&digest)
            .await?
            .ok_or(AuthError::InvalidApiKey)?;

        if !key.is_usable() {
            return Err(AuthError::InvalidApiKey);
        }

        // Advisory bookkeeping off the hot path; errors are discarded.
        self.last_used.touch(key.id);

        let user = self
            .store
            .get_user_by_id(key.user_id)
            .await?
            .ok_or_else(|| AuthError::not_found("user", key.user_id.to_string()))?;

        Ok((key, user))
    }
}

#[async_trait]
impl CredentialValidator for ApiKeyValidator {
    async fn authenticate(&self, credential: &str) -> Result<AuthIdentity> {
        let (key, user) = self.validate_secret(credential).await?;
        Ok(AuthIdentity::from_api_key(&key, &user))
    }

    fn name(&self) -> &'static str {
        "api_key"
    }
}

/// Try each validator in order and return the first success
///
/// An `Internal` error aborts the chain immediately - an infrastructure
/// outage must not read as "invalid credentials". Only genuine rejections
/// fall through; exhausting the chain yields `InvalidAuth`.
pub async fn authenticate_any(
    validators: &[Arc<dyn CredentialValidator>],
    credential: &str,
) -> Result<AuthIdentity> {
    for validator in validators {
        match validator.authenticate(credential).await {
            Ok(identity) => {
                debug!(validator = validator.name(), user_id = %identity.user_id, "credential authenticated");
                return Ok(identity);
            }
            Err(e) if e.is_internal() => return Err(e),
            Err(e) => {
                debug!(validator = validator.name(), error = %e, "credential rejected");
            }
        }
    }
    Err(AuthError::InvalidAuth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apikey::NewApiKey;
    use crate::identity::AuthMethod;
    use crate::last_used;
    use crate::test_utils::MemoryCredentialStore;
    use crate::tier::KeyEnvironment;
    use chrono::Utc;

    const TEST_SECRET: &[u8] = b"test-secret-key-32-bytes-long!!!";

    struct Fixture {
        store: Arc<MemoryCredentialStore>,
        codec: Arc<TokenCodec>,
        validators: Vec<Arc<dyn CredentialValidator>>,
        user: User,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryCredentialStore::new());
        let user = User::new("v@example.com", "hash", "V");
        store.create_user(&user).await.unwrap();

        let codec = Arc::new(TokenCodec::new(TEST_SECRET));
        let (handle, _task) = last_used::spawn(store.clone() as Arc<dyn CredentialStore>);

        let validators: Vec<Arc<dyn CredentialValidator>> = vec![
            Arc::new(AccessTokenValidator::new(codec.clone())),
            Arc::new(ApiKeyValidator::new(
                store.clone() as Arc<dyn CredentialStore>,
                handle,
            )),
        ];

        Fixture {
            store,
            codec,
            validators,
            user,
        }
    }

    #[tokio::test]
    async fn test_access_token_path() {
        let fx = fixture().await;
        let pair = fx
            .codec
            .issue_pair(&fx.user, &["analyze:read"])
            .unwrap();

        let identity = authenticate_any(&fx.validators, &pair.access_token)
            .await
            .unwrap();
        assert_eq!(identity.method, AuthMethod::AccessToken);
        assert_eq!(identity.user_id, fx.user.id);
    }

    #[tokio::test]
    async fn test_api_key_fallback_path() {
        let fx = fixture().await;
        let (secret, key) = ApiKey::create(
            &fx.user,
            "fv",
            NewApiKey::new("k", KeyEnvironment::Live, vec!["results:read".to_string()]),
        );
        fx.store.create_api_key(&key).await.unwrap();

        let identity = authenticate_any(&fx.validators, &secret).await.unwrap();
        assert_eq!(identity.method, AuthMethod::ApiKey);
        assert_eq!(identity.scopes, vec!["results:read"]);
    }

    #[tokio::test]
    async fn test_both_paths_fail() {
        let fx = fixture().await;
        let result = authenticate_any(&fx.validators, "fv_live_sk_nonsense").await;
        assert!(matches!(result, Err(AuthError::InvalidAuth)));
    }

    #[tokio::test]
    async fn test_revoked_key_collapses_to_invalid() {
        let fx = fixture().await;
        let (secret, mut key) = ApiKey::create(
            &fx.user,
            "fv",
            NewApiKey::new("k", KeyEnvironment::Live, vec![]),
        );
        key.revoked_at = Some(Utc::now());
        fx.store.create_api_key(&key).await.unwrap();

        // The digest matches a stored row, yet validation must fail exactly
        // like an unknown key does.
        let (handle, _task) = last_used::spawn(fx.store.clone() as Arc<dyn CredentialStore>);
        let validator =
            ApiKeyValidator::new(fx.store.clone() as Arc<dyn CredentialStore>, handle);
        let result = validator.validate_secret(&secret).await;
        assert!(matches!(result, Err(AuthError::InvalidApiKey)));
    }

    #[tokio::test]
    async fn test_expired_key_collapses_to_invalid() {
        let fx = fixture().await;
        let mut params = NewApiKey::new("k", KeyEnvironment::Test, vec![]);
        params.expires_at = Some(Utc::now() - chrono::Duration::minutes(5));
        let (secret, key) = ApiKey::create(&fx.user, "fv", params);
        fx.store.create_api_key(&key).await.unwrap();

        let result = authenticate_any(&fx.validators, &secret).await;
        assert!(matches!(result, Err(AuthError::InvalidAuth)));
    }
}
