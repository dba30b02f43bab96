//! Per-request session verification.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::token::TokenCodec;
use crate::models::Role;
use crate::store::UserStore;

/// Ephemeral identity derived from a bearer token. Built fresh on every
/// request and never persisted.
#[derive(Debug, Clone)]
pub struct Session {
    pub subject_id: i32,
    pub role: Role,
    pub raw_token: String,
}

/// Turns a raw bearer token into a [`Session`], or nothing.
///
/// The subject's role and active flag are re-read from the live user row on
/// every call, never trusted from the token payload, so a role change or
/// deactivation takes effect on the very next request.
pub struct SessionVerifier {
    codec: Arc<TokenCodec>,
    store: Arc<dyn UserStore>,
}

impl SessionVerifier {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn UserStore>) -> Self {
        Self { codec, store }
    }

    /// Every rejection path returns `None` uniformly; callers cannot tell
    /// expired from tampered from deactivated at this layer.
    pub async fn verify(&self, raw_token: &str) -> Option<Session> {
        if raw_token.is_empty() {
            return None;
        }

        let payload = self.codec.decode(raw_token)?;

        if payload.exp <= Utc::now().timestamp() {
            return None;
        }

        let user = self.store.find_by_id(payload.subject_id).await.ok()??;

        if !user.is_active {
            return None;
        }

        Some(Session {
            subject_id: user.id,
            role: user.role,
            raw_token: raw_token.to_string(),
        })
    }

    /// Convenience composition: verify, then compare the live role.
    pub async fn require_role(&self, raw_token: &str, required: Role) -> bool {
        match self.verify(raw_token).await {
            Some(session) => session.role == required,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::passwords::PasswordService;
    use crate::store::{InMemoryUserStore, NewUser};
    use chrono::Duration;

    const TEST_SECRET: &str = "verifier-test-secret";

    async fn seed(store: &InMemoryUserStore, email: &str, role: Role, active: bool) -> i32 {
        let user = store
            .create(NewUser {
                email: email.to_string(),
                password_hash: PasswordService::new().hash("secret1"),
                full_name: "Test Person".to_string(),
                role,
            })
            .await
            .expect("seed user");
        if !active {
            store
                .update(
                    user.id,
                    crate::store::UserPatch {
                        is_active: Some(false),
                        ..Default::default()
                    },
                )
                .await
                .expect("deactivate");
        }
        user.id
    }

    fn verifier(store: Arc<InMemoryUserStore>) -> (SessionVerifier, Arc<TokenCodec>) {
        let codec = Arc::new(TokenCodec::new(TEST_SECRET));
        (SessionVerifier::new(codec.clone(), store), codec)
    }

    #[tokio::test]
    async fn valid_token_yields_session_with_live_role() {
        let store = Arc::new(InMemoryUserStore::new());
        let id = seed(&store, "doc@example.com", Role::Doctor, true).await;
        let (verifier, codec) = verifier(store);

        // Advisory role claim deliberately lies; the live row wins.
        let token = codec
            .issue(id, Role::Admin, "doc@example.com", Duration::hours(1))
            .expect("issue");

        let session = verifier.verify(&token.token).await.expect("session");
        assert_eq!(session.subject_id, id);
        assert_eq!(session.role, Role::Doctor);
        assert_eq!(session.raw_token, token.token);
    }

    #[tokio::test]
    async fn empty_and_garbage_tokens_are_rejected() {
        let store = Arc::new(InMemoryUserStore::new());
        seed(&store, "doc@example.com", Role::Doctor, true).await;
        let (verifier, _) = verifier(store);

        assert!(verifier.verify("").await.is_none());
        assert!(verifier.verify("garbage").await.is_none());
        assert!(verifier.verify("a.b.c").await.is_none());
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected_despite_valid_structure() {
        let store = Arc::new(InMemoryUserStore::new());
        let id = seed(&store, "doc@example.com", Role::Doctor, true).await;
        let (verifier, codec) = verifier(store);

        let token = codec
            .issue(id, Role::Doctor, "doc@example.com", Duration::seconds(-1))
            .expect("issue");

        assert!(codec.decode(&token.token).is_some());
        assert!(verifier.verify(&token.token).await.is_none());
    }

    #[tokio::test]
    async fn unknown_subject_is_rejected() {
        let store = Arc::new(InMemoryUserStore::new());
        let (verifier, codec) = verifier(store);

        let token = codec
            .issue(999, Role::Doctor, "ghost@example.com", Duration::hours(1))
            .expect("issue");

        assert!(verifier.verify(&token.token).await.is_none());
    }

    #[tokio::test]
    async fn deactivated_subject_is_rejected_on_next_request() {
        let store = Arc::new(InMemoryUserStore::new());
        let id = seed(&store, "doc@example.com", Role::Doctor, true).await;
        let (verifier, codec) = verifier(store.clone());

        let token = codec
            .issue(id, Role::Doctor, "doc@example.com", Duration::hours(1))
            .expect("issue");
        assert!(verifier.verify(&token.token).await.is_some());

        store
            .update(
                id,
                crate::store::UserPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .expect("deactivate");

        // Same unexpired token, next request: rejected.
        assert!(verifier.verify(&token.token).await.is_none());
    }

    #[tokio::test]
    async fn require_role_compares_the_live_role() {
        let store = Arc::new(InMemoryUserStore::new());
        let id = seed(&store, "doc@example.com", Role::Doctor, true).await;
        let (verifier, codec) = verifier(store);

        let token = codec
            .issue(id, Role::Doctor, "doc@example.com", Duration::hours(1))
            .expect("issue");

        assert!(verifier.require_role(&token.token, Role::Doctor).await);
        assert!(!verifier.require_role(&token.token, Role::Admin).await);
        assert!(!verifier.require_role("garbage", Role::Doctor).await);
    }
}
