//! Authentication module: configuration, credential handling, token minting,
//! session verification, Rocket request guards, and HTTP route handlers.

use std::sync::Arc;

use chrono::Duration;

use crate::store::UserStore;

pub mod config;
pub mod error;
pub mod guards;
pub mod passwords;
pub mod responses;
pub mod routes;
pub mod service;
pub mod session;
pub mod token;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use guards::{AuthUser, RequireAdmin, RequireDoctor, RequireReceptionist};
pub use passwords::PasswordService;
pub use service::CredentialService;
pub use session::{Session, SessionVerifier};
pub use token::TokenCodec;

pub struct AuthState {
    pub config: AuthConfig,
    pub passwords: Arc<PasswordService>,
    pub codec: Arc<TokenCodec>,
    pub store: Arc<dyn UserStore>,
    pub verifier: SessionVerifier,
    pub credentials: CredentialService,
}

impl AuthState {
    pub fn new(config: AuthConfig, store: Arc<dyn UserStore>) -> Self {
        let passwords = Arc::new(PasswordService::new());
        let codec = Arc::new(TokenCodec::new(&config.jwt_secret));
        let verifier = SessionVerifier::new(codec.clone(), store.clone());
        let credentials = CredentialService::new(
            store.clone(),
            passwords.clone(),
            codec.clone(),
            Duration::seconds(config.token_ttl_secs),
        );

        Self {
            config,
            passwords,
            codec,
            store,
            verifier,
            credentials,
        }
    }
}
