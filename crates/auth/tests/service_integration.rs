//! End-to-end tests for the auth service
//!
//! Exercises the full credential lifecycle over the in-memory store and
//! revocation registry: registration, login, token rotation, logout, and the
//! API key lifecycle.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;

use fv_auth::test_utils::{
    MemoryCredentialStore, MemoryRevocationRegistry, UnreachableRevocationRegistry,
    issue_token_with_expiry,
};
use fv_auth::{
    AuthError, AuthMethod, AuthService, AuthServiceConfig, CredentialStore, KeyEnvironment,
    NewApiKey, Tier, TokenKind, User, generate_secret,
};
use fv_auth::password::{HashingParams, hash_password_with};

const TEST_SECRET: &[u8] = b"integration-secret-32-bytes-min!";

fn fast_hashing() -> HashingParams {
    HashingParams {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    }
}

fn service_with_store() -> (AuthService, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::new());
    let registry = Arc::new(MemoryRevocationRegistry::new());
    let config = AuthServiceConfig::new(TEST_SECRET).with_hashing(fast_hashing());
    let service = AuthService::new(store.clone(), registry, config);
    (service, store)
}

fn service() -> AuthService {
    service_with_store().0
}

#[tokio::test]
async fn login_roundtrip_returns_registered_subject() {
    let service = service();
    let user = service
        .register("round@example.com", "password-123", "Round Trip")
        .await
        .unwrap();

    let (logged_in, pair) = service
        .login("round@example.com", "password-123")
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);

    let claims = service.validate_access_token(&pair.access_token).unwrap();
    assert_eq!(claims.subject, user.id.to_string());
    assert_eq!(claims.tier, "free");
    assert_eq!(
        claims.scopes(),
        vec!["analyze:read", "analyze:write", "results:read"]
    );

    let wrong = service.login("round@example.com", "password-124").await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn expired_access_token_fails_as_expired() {
    let service = service();
    let user = service
        .register("exp@example.com", "password-123", "Exp")
        .await
        .unwrap();

    // Expired beyond the validation leeway; the signature is genuine.
    let expired =
        issue_token_with_expiry(TEST_SECRET, &user, TokenKind::Access, Duration::hours(-1));
    let result = service.validate_access_token(&expired);
    assert!(matches!(result, Err(AuthError::TokenExpired)));
}

#[tokio::test]
async fn refresh_token_is_single_use() {
    let service = service();
    service
        .register("rotate@example.com", "password-123", "Rotate")
        .await
        .unwrap();
    let (_, pair) = service
        .login("rotate@example.com", "password-123")
        .await
        .unwrap();

    // Claim timestamps have second resolution; let the clock tick so the
    // rotated token cannot be byte-identical to the presented one.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    // First exchange succeeds and yields a distinct pair.
    let next = service.refresh(&pair.refresh_token).await.unwrap();
    assert_ne!(next.refresh_token, pair.refresh_token);
    assert_ne!(next.access_token, pair.access_token);

    // The presented token was blacklisted during the exchange. Rotation is
    // not transactional across store and registry: a crash after validation
    // but before blacklisting would leave a narrow reuse window. That
    // boundary is accepted; what is guaranteed is that a completed exchange
    // makes the old token unusable.
    let again = service.refresh(&pair.refresh_token).await;
    assert!(matches!(again, Err(AuthError::InvalidToken)));

    // The new token still works.
    service.refresh(&next.refresh_token).await.unwrap();
}

#[tokio::test]
async fn refresh_rejects_access_tokens_and_garbage() {
    let service = service();
    service
        .register("kinds@example.com", "password-123", "Kinds")
        .await
        .unwrap();
    let (_, pair) = service
        .login("kinds@example.com", "password-123")
        .await
        .unwrap();

    let result = service.refresh(&pair.access_token).await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));

    let result = service.refresh("three.segment.garbage").await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn refresh_propagates_registry_outage() {
    // Registry lookups fail hard rather than reading as "not blacklisted".
    let store = Arc::new(MemoryCredentialStore::new());
    let registry = Arc::new(UnreachableRevocationRegistry);
    let config = AuthServiceConfig::new(TEST_SECRET).with_hashing(fast_hashing());
    let service = AuthService::new(store, registry, config);

    service
        .register("outage@example.com", "password-123", "Outage")
        .await
        .unwrap();
    let (_, pair) = service
        .login("outage@example.com", "password-123")
        .await
        .unwrap();

    let result = service.refresh(&pair.refresh_token).await;
    assert!(matches!(result, Err(AuthError::Internal(_))));
}

#[tokio::test]
async fn logout_blocks_future_refresh() {
    let service = service();
    service
        .register("bye@example.com", "password-123", "Bye")
        .await
        .unwrap();
    let (_, pair) = service.login("bye@example.com", "password-123").await.unwrap();

    service.logout(&pair.refresh_token).await;

    let result = service.refresh(&pair.refresh_token).await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn logout_never_fails_even_for_invalid_tokens() {
    let service = service();

    // Garbage, empty, and never-issued tokens: logout stays silent.
    service.logout("complete-garbage").await;
    service.logout("").await;

    let user = User::new("ghost@example.com", "hash", "Ghost");
    let never_issued =
        issue_token_with_expiry(b"some-other-secret-32-bytes-long!", &user, TokenKind::Refresh, Duration::days(1));
    service.logout(&never_issued).await;

    // A blacklisted-but-invalid token still refuses refresh.
    let result = service.refresh(&never_issued).await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn logout_survives_registry_outage() {
    let store = Arc::new(MemoryCredentialStore::new());
    let registry = Arc::new(UnreachableRevocationRegistry);
    let config = AuthServiceConfig::new(TEST_SECRET).with_hashing(fast_hashing());
    let service = AuthService::new(store, registry, config);

    service
        .register("quiet@example.com", "password-123", "Quiet")
        .await
        .unwrap();
    let (_, pair) = service
        .login("quiet@example.com", "password-123")
        .await
        .unwrap();

    // Best-effort: the registry being down must not surface to the caller.
    service.logout(&pair.refresh_token).await;
}

#[test]
fn generated_secrets_do_not_collide() {
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let secret = generate_secret("fv", KeyEnvironment::Live);
        assert!(seen.insert(secret), "duplicate API key secret generated");
    }

    let mut hashes = HashSet::new();
    for secret in &seen {
        assert!(hashes.insert(fv_auth::hash_secret(secret)));
    }
}

#[tokio::test]
async fn api_key_lifecycle() {
    let (service, store) = service_with_store();
    let user = service
        .register("machine@example.com", "password-123", "Machine")
        .await
        .unwrap();

    let (key, secret) = service
        .create_api_key(
            user.id,
            NewApiKey::new(
                "ci pipeline",
                KeyEnvironment::Live,
                vec!["analyze:read".to_string(), "results:read".to_string()],
            ),
        )
        .await
        .unwrap();

    assert!(secret.starts_with("fv_live_sk_"));
    assert!(key.key_prefix.ends_with("..."));
    assert_eq!(key.rate_limit, 20); // free tier owner

    // Validation returns the key and its owner.
    let (validated, owner) = service.validate_api_key(&secret).await.unwrap();
    assert_eq!(validated.id, key.id);
    assert_eq!(owner.id, user.id);

    // The last-used update is queued; drain it and observe the timestamp.
    service.shutdown().await;
    let stored = store.get_api_key_by_id(key.id).await.unwrap().unwrap();
    assert!(stored.last_used_at.is_some());

    // Listing shows the key without the digest.
    let keys = service.list_api_keys(user.id).await.unwrap();
    assert_eq!(keys.len(), 1);

    // Revocation kills the key even though the stored digest still matches.
    let service2 = {
        let registry = Arc::new(MemoryRevocationRegistry::new());
        let config = AuthServiceConfig::new(TEST_SECRET).with_hashing(fast_hashing());
        AuthService::new(store.clone(), registry, config)
    };
    service2.revoke_api_key(user.id, key.id).await.unwrap();
    let result = service2.validate_api_key(&secret).await;
    assert!(matches!(result, Err(AuthError::InvalidApiKey)));
}

#[tokio::test]
async fn foreign_key_cannot_be_revoked() {
    let service = service();
    let alice = service
        .register("alice-keys@example.com", "password-123", "Alice")
        .await
        .unwrap();
    let mallory = service
        .register("mallory@example.com", "password-123", "Mallory")
        .await
        .unwrap();

    let (key, secret) = service
        .create_api_key(alice.id, NewApiKey::new("hers", KeyEnvironment::Live, vec![]))
        .await
        .unwrap();

    let result = service.revoke_api_key(mallory.id, key.id).await;
    assert!(matches!(result, Err(AuthError::Unauthorized)));

    // The key is untouched.
    service.validate_api_key(&secret).await.unwrap();
}

#[tokio::test]
async fn bearer_dispatch_covers_both_kinds() {
    let service = service();
    let user = service
        .register("both@example.com", "password-123", "Both")
        .await
        .unwrap();
    let (_, pair) = service
        .login("both@example.com", "password-123")
        .await
        .unwrap();
    let (_, secret) = service
        .create_api_key(
            user.id,
            NewApiKey::new("m2m", KeyEnvironment::Test, vec!["usage:read".to_string()]),
        )
        .await
        .unwrap();

    let via_token = service.validate_bearer(&pair.access_token).await.unwrap();
    assert_eq!(via_token.method, AuthMethod::AccessToken);
    assert_eq!(via_token.user_id, user.id);

    let via_key = service.validate_bearer(&secret).await.unwrap();
    assert_eq!(via_key.method, AuthMethod::ApiKey);
    assert_eq!(via_key.scopes, vec!["usage:read"]);

    let neither = service.validate_bearer("neither-kind-of-credential").await;
    assert!(matches!(neither, Err(AuthError::InvalidAuth)));

    // A refresh token is not a bearer credential.
    let refresh = service.validate_bearer(&pair.refresh_token).await;
    assert!(matches!(refresh, Err(AuthError::InvalidAuth)));
}

#[tokio::test]
async fn email_matching_is_case_insensitive_and_trimmed() {
    let service = service();
    let user = service
        .register("Alice@Example.com", "password-123", "Alice")
        .await
        .unwrap();
    assert_eq!(user.email, "alice@example.com");

    let (logged_in, _) = service
        .login("alice@example.com", "password-123")
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);

    let (trimmed, _) = service
        .login("  ALICE@example.COM  ", "password-123")
        .await
        .unwrap();
    assert_eq!(trimmed.id, user.id);

    // The same address differing only in case conflicts.
    let result = service
        .register("ALICE@EXAMPLE.COM", "password-123", "Impostor")
        .await;
    assert!(matches!(result, Err(AuthError::Conflict { .. })));
}

#[tokio::test]
async fn professional_tier_claims_match_policy() {
    let (service, store) = service_with_store();

    assert_eq!(Tier::Professional.rate_limit(), 300);
    assert_eq!(
        Tier::Professional.default_scopes(),
        vec![
            "analyze:read",
            "analyze:write",
            "results:read",
            "usage:read",
            "results:export",
            "webhooks:manage",
        ]
    );

    // An account on the professional tier mints matching claims.
    let hash = hash_password_with(&fast_hashing(), "password-123").unwrap();
    let mut user = User::new("pro@example.com", hash, "Pro");
    user.tier = Tier::Professional;
    store.create_user(&user).await.unwrap();

    let (_, pair) = service.login("pro@example.com", "password-123").await.unwrap();
    let claims = service.validate_access_token(&pair.access_token).unwrap();
    assert_eq!(claims.tier, "professional");
    assert_eq!(claims.scopes(), Tier::Professional.default_scopes());

    // Keys created for a professional owner carry the professional limit.
    let (key, _) = service
        .create_api_key(
            user.id,
            NewApiKey::new("pro key", KeyEnvironment::Live, vec![]),
        )
        .await
        .unwrap();
    assert_eq!(key.rate_limit, 300);
}

#[tokio::test]
async fn shutdown_drains_pending_last_used_updates() {
    let (service, store) = service_with_store();
    let user = service
        .register("drain@example.com", "password-123", "Drain")
        .await
        .unwrap();
    let (key, secret) = service
        .create_api_key(user.id, NewApiKey::new("k", KeyEnvironment::Test, vec![]))
        .await
        .unwrap();

    for _ in 0..5 {
        service.validate_api_key(&secret).await.unwrap();
    }

    service.shutdown().await;

    let stored = store.get_api_key_by_id(key.id).await.unwrap().unwrap();
    assert!(stored.last_used_at.is_some());
}
