//! Auth orchestrator
//!
//! Composes the password hasher, token codec, revocation registry, API key
//! validation, and credential store into the register/login/refresh/logout
//! and API-key lifecycle operations. This is the only component with
//! business-rule authority; store sentinels are mapped to the public error
//! taxonomy here and raw infrastructure errors never reach the caller as
//! anything but `Internal`.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::apikey::{ApiKey, NewApiKey};
use crate::claims::{AUDIENCE, Claims, ISSUER, TokenKind};
use crate::error::{AuthError, Result};
use crate::identity::AuthIdentity;
use crate::last_used::{self, LastUsedHandle};
use crate::password::{HashingParams, hash_password_with, verify_password};
use crate::revocation::RevocationRegistry;
use crate::store::CredentialStore;
use crate::token::{DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL, TokenCodec, TokenPair};
use crate::user::{User, normalize_email};
use crate::validator::{
    AccessTokenValidator, ApiKeyValidator, CredentialValidator, authenticate_any,
};

/// Minimum accepted password length at registration
const MIN_PASSWORD_LEN: usize = 8;

/// Configuration for the auth service
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// Token signing secret (must be at least 32 bytes)
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime
    pub access_token_ttl: StdDuration,
    /// Refresh token lifetime
    pub refresh_token_ttl: StdDuration,
    /// Issuer claim on minted tokens
    pub issuer: String,
    /// Audience claim on minted access tokens
    pub audience: String,
    /// Prefix for generated API key secrets
    pub api_key_prefix: String,
    /// Password hashing work factor
    pub hashing: HashingParams,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: vec![],
            access_token_ttl: DEFAULT_ACCESS_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TTL,
            issuer: ISSUER.to_string(),
            audience: AUDIENCE.to_string(),
            api_key_prefix: "fv".to_string(),
            hashing: HashingParams::default(),
        }
    }
}

impl AuthServiceConfig {
    /// Create a config with the given signing secret
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: secret.into(),
            ..Default::default()
        }
    }

    /// Set the access token lifetime
    pub fn with_access_ttl(mut self, ttl: StdDuration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Set the refresh token lifetime
    pub fn with_refresh_ttl(mut self, ttl: StdDuration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    /// Set the API key prefix
    pub fn with_api_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_key_prefix = prefix.into();
        self
    }

    /// Set the password hashing work factor
    pub fn with_hashing(mut self, hashing: HashingParams) -> Self {
        self.hashing = hashing;
        self
    }
}

/// Auth orchestrator
///
/// One instance per process; safe for concurrent use. The signing secret and
/// policy tables are read-only after construction.
///
/// # Example
///
/// ```ignore
/// let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::connect(&db_url).await?);
/// let registry = Arc::new(RedisRevocationRegistry::connect(&redis_url).await?);
/// let auth = AuthService::new(store, registry, AuthServiceConfig::new(secret));
///
/// let user = auth.register("user@example.com", "hunter2hunter2", "User").await?;
/// let (_, tokens) = auth.login("user@example.com", "hunter2hunter2").await?;
/// let identity = auth.validate_bearer(&tokens.access_token).await?;
/// ```
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    registry: Arc<dyn RevocationRegistry>,
    codec: Arc<TokenCodec>,
    api_keys: Arc<ApiKeyValidator>,
    validators: Vec<Arc<dyn CredentialValidator>>,
    last_used: LastUsedHandle,
    last_used_task: Mutex<Option<JoinHandle<()>>>,
    config: AuthServiceConfig,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.config.issuer)
            .field("api_key_prefix", &self.config.api_key_prefix)
            .finish()
    }
}

impl AuthService {
    /// Create a new auth service
    ///
    /// Spawns the background last-used updater; call [`AuthService::shutdown`]
    /// to drain it on process exit.
    ///
    /// # Panics
    ///
    /// Panics if the signing secret is less than 32 bytes.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        registry: Arc<dyn RevocationRegistry>,
        config: AuthServiceConfig,
    ) -> Self {
        let codec = Arc::new(
            TokenCodec::new(&config.jwt_secret)
                .with_access_ttl(config.access_token_ttl)
                .with_refresh_ttl(config.refresh_token_ttl)
                .with_issuer(config.issuer.clone())
                .with_audience(config.audience.clone()),
        );

        let (last_used, last_used_task) = last_used::spawn(Arc::clone(&store));
        let api_keys = Arc::new(ApiKeyValidator::new(
            Arc::clone(&store),
            last_used.clone(),
        ));

        // Fixed dispatch order: session tokens first, API keys second.
        let validators: Vec<Arc<dyn CredentialValidator>> = vec![
            Arc::new(AccessTokenValidator::new(Arc::clone(&codec))),
            Arc::clone(&api_keys) as Arc<dyn CredentialValidator>,
        ];

        Self {
            store,
            registry,
            codec,
            api_keys,
            validators,
            last_used,
            last_used_task: Mutex::new(Some(last_used_task)),
            config,
        }
    }

    /// Register a new user account
    ///
    /// Normalizes the email, hashes the password, and creates the account
    /// with registration defaults (owner role, free tier). Fails with
    /// `Conflict` when the email is already registered.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User> {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::validation("email", "must be a valid email address"));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::validation(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::validation("name", "must not be empty"));
        }

        let password_hash = hash_password_with(&self.config.hashing, password)?;
        let user = User::new(email, password_hash, name);

        self.store.create_user(&user).await?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Authenticate a user by email and password and mint a token pair
    ///
    /// Fails with `InvalidCredentials` uniformly whether the email is
    /// unknown or the password is wrong. Updates the last-login timestamp
    /// best-effort.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair)> {
        let email = normalize_email(email);

        let user = self
            .store
            .get_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            warn!(email = %email, "failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        // Advisory; a failed timestamp write must not fail the login.
        if let Err(e) = self.store.update_last_login(user.id).await {
            warn!(user_id = %user.id, error = %e, "last-login update failed");
        }

        let pair = self.mint_pair(&user)?;

        info!(user_id = %user.id, "user logged in");
        Ok((user, pair))
    }

    /// Exchange a refresh token for a fresh token pair
    ///
    /// Refresh tokens are single-use: the presented token is blacklisted for
    /// its remaining lifetime before the new pair is minted, so presenting
    /// it again fails with `InvalidToken`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.codec.validate(refresh_token, TokenKind::Refresh)?;

        if self.registry.is_blacklisted(refresh_token).await? {
            return Err(AuthError::InvalidToken);
        }

        let user_id = claims.subject_id()?;
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::not_found("user", user_id.to_string()))?;

        self.registry
            .blacklist(refresh_token, claims.remaining_lifetime())
            .await?;

        self.mint_pair(&user)
    }

    /// Invalidate a refresh token
    ///
    /// Unconditionally blacklists the token, even one that was never valid;
    /// idempotent and best-effort - never fails the caller.
    pub async fn logout(&self, refresh_token: &str) {
        let ttl = self
            .codec
            .validate(refresh_token, TokenKind::Refresh)
            .map(|claims| claims.remaining_lifetime())
            .unwrap_or_else(|_| self.codec.refresh_ttl());

        if let Err(e) = self.registry.blacklist(refresh_token, ttl).await {
            warn!(error = %e, "logout blacklist failed");
        }
    }

    /// Validate an access token and return its claims
    ///
    /// Pure validation; no store access, no mutation.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.codec.validate(token, TokenKind::Access)
    }

    /// Authenticate a bearer credential of either kind
    ///
    /// Tries access-token validation first, then API-key validation; fails
    /// with `InvalidAuth` only when both reject.
    pub async fn validate_bearer(&self, credential: &str) -> Result<AuthIdentity> {
        authenticate_any(&self.validators, credential).await
    }

    /// Create an API key for a user
    ///
    /// Returns the record and the full secret. The secret is shown exactly
    /// once - only its digest is stored, so it cannot be recovered later.
    pub async fn create_api_key(
        &self,
        user_id: Uuid,
        params: NewApiKey,
    ) -> Result<(ApiKey, String)> {
        if params.name.trim().is_empty() {
            return Err(AuthError::validation("name", "must not be empty"));
        }

        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::not_found("user", user_id.to_string()))?;

        let (secret, key) = ApiKey::create(&user, &self.config.api_key_prefix, params);
        self.store.create_api_key(&key).await?;

        info!(
            user_id = %user.id,
            key_id = %key.id,
            key_prefix = %key.key_prefix,
            "api key created"
        );
        Ok((key, secret))
    }

    /// Validate an API key secret and return the key with its owner
    ///
    /// Unknown, revoked, and expired keys all fail with `InvalidApiKey`.
    /// Success queues a non-blocking last-used update.
    pub async fn validate_api_key(&self, secret: &str) -> Result<(ApiKey, User)> {
        self.api_keys.validate_secret(secret).await
    }

    /// Revoke an API key
    ///
    /// Only the owning user may revoke; revoking someone else's key fails
    /// with `Unauthorized`, a nonexistent or already-revoked key with
    /// `NotFound`.
    pub async fn revoke_api_key(&self, user_id: Uuid, key_id: Uuid) -> Result<()> {
        let key = self
            .store
            .get_api_key_by_id(key_id)
            .await?
            .ok_or_else(|| AuthError::not_found("api key", key_id.to_string()))?;

        if key.user_id != user_id {
            return Err(AuthError::Unauthorized);
        }

        if !self.store.revoke_api_key(key_id).await? {
            return Err(AuthError::not_found("api key", key_id.to_string()));
        }

        info!(user_id = %user_id, key_id = %key_id, "api key revoked");
        Ok(())
    }

    /// List a user's API keys, newest first
    pub async fn list_api_keys(&self, user_id: Uuid) -> Result<Vec<ApiKey>> {
        Ok(self.store.list_api_keys_by_user(user_id).await?)
    }

    /// Look up a user by ID
    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.store.get_user_by_id(id).await?)
    }

    /// Handle for enqueueing last-used updates
    pub fn last_used_handle(&self) -> LastUsedHandle {
        self.last_used.clone()
    }

    /// Shut down the background last-used updater, draining queued updates
    pub async fn shutdown(&self) {
        self.last_used.shutdown();
        if let Some(task) = self.last_used_task.lock().await.take() {
            let _ = task.await;
        }
    }

    fn mint_pair(&self, user: &User) -> Result<TokenPair> {
        let scopes = user.tier.default_scopes();
        self.codec.issue_pair(user, &scopes)
    }
}
