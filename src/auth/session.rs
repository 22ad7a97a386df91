//! Session state and route guard

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::{Error, Result};

use super::{display_name, IdentityProvider, LoginOutcome, OAuthProvider, Route, User};

/// What the shell should do for a requested route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Identity service still initialising; show a spinner
    Wait,
    Redirect(String),
    Render(Route),
}

/// Signed-in session over an identity provider
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    config: AuthConfig,
    user: RwLock<Option<User>>,
}

impl AuthSession {
    pub fn new(provider: Arc<dyn IdentityProvider>, config: AuthConfig) -> Self {
        Self {
            provider,
            config,
            user: RwLock::new(None),
        }
    }

    /// Pick up a session the provider already holds (e.g. a stored token)
    pub async fn restore(&self) -> Option<User> {
        let user = self.provider.current_user().await;
        *self.user.write().await = user.clone();
        user
    }

    pub async fn user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    /// Signed-in user, or `NotAuthenticated`
    pub async fn require_user(&self) -> Result<User> {
        self.user().await.ok_or(Error::NotAuthenticated)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    pub async fn display_name(&self) -> String {
        display_name(self.user.read().await.as_ref())
    }

    /// Run the OAuth flow with `method`, creating an embedded wallet when
    /// the configured policy asks for one
    pub async fn login(&self, method: OAuthProvider) -> Result<LoginOutcome> {
        if !self.config.login_methods.contains(&method) {
            return Err(Error::LoginMethodNotAllowed(method.to_string()));
        }

        let mut outcome = self.provider.initiate_oauth(method).await.map_err(|e| match e {
            Error::Auth(_) => e,
            other => Error::Auth(other.to_string()),
        })?;

        if self.config.embedded_wallets.should_create(&outcome.user) {
            info!("Creating embedded wallet for {}", outcome.user.id);
            outcome.user = self.provider.create_embedded_wallet(&outcome.user).await?;
        }

        info!(
            "Logged in {} via {} (new user: {})",
            outcome.user.display_name(),
            method,
            outcome.is_new_user
        );
        *self.user.write().await = Some(outcome.user.clone());
        Ok(outcome)
    }

    pub async fn logout(&self) -> Result<()> {
        let result = self.provider.logout().await;
        if let Err(e) = &result {
            warn!("Identity provider logout failed: {}", e);
        }
        // Local session is dropped regardless
        *self.user.write().await = None;
        info!("Logged out");
        result
    }

    /// Decide whether `route` renders, waits or redirects
    pub async fn guard(&self, route: Route) -> Navigation {
        if !self.provider.is_ready().await {
            return Navigation::Wait;
        }

        let authenticated = self.is_authenticated().await;
        match route {
            Route::Login if authenticated => Navigation::Redirect(Route::Home.path().to_string()),
            r if r.requires_auth() && !authenticated => {
                Navigation::Redirect(self.config.login_route.clone())
            }
            r => Navigation::Render(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::EmbeddedWalletPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct MockIdentity {
        ready: AtomicBool,
        user: User,
        wallets_created: AtomicUsize,
        signed_in: AtomicBool,
    }

    impl MockIdentity {
        fn new(wallet: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                ready: AtomicBool::new(true),
                user: User {
                    id: "user-1".to_string(),
                    email: Some("kim@blip.app".to_string()),
                    wallet_address: wallet.map(str::to_string),
                    embedded_wallet: false,
                },
                wallets_created: AtomicUsize::new(0),
                signed_in: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentity {
        async fn is_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        async fn initiate_oauth(&self, _provider: OAuthProvider) -> Result<LoginOutcome> {
            self.signed_in.store(true, Ordering::SeqCst);
            Ok(LoginOutcome {
                user: self.user.clone(),
                is_new_user: true,
            })
        }

        async fn current_user(&self) -> Option<User> {
            self.signed_in
                .load(Ordering::SeqCst)
                .then(|| self.user.clone())
        }

        async fn create_embedded_wallet(&self, user: &User) -> Result<User> {
            self.wallets_created.fetch_add(1, Ordering::SeqCst);
            Ok(User {
                wallet_address: Some("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM".to_string()),
                embedded_wallet: true,
                ..user.clone()
            })
        }

        async fn logout(&self) -> Result<()> {
            self.signed_in.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_login_creates_embedded_wallet() {
        let identity = MockIdentity::new(None);
        let session = AuthSession::new(identity.clone(), AuthConfig::default());

        let outcome = session.login(OAuthProvider::Google).await.unwrap();
        assert!(outcome.is_new_user);
        assert!(outcome.user.embedded_wallet);
        assert_eq!(identity.wallets_created.load(Ordering::SeqCst), 1);
        assert_eq!(session.display_name().await, "kim@blip.app");
    }

    #[tokio::test]
    async fn test_existing_wallet_kept() {
        let identity = MockIdentity::new(Some("0xabc"));
        let session = AuthSession::new(identity.clone(), AuthConfig::default());

        let outcome = session.login(OAuthProvider::Google).await.unwrap();
        assert_eq!(outcome.user.wallet_address.as_deref(), Some("0xabc"));
        assert_eq!(identity.wallets_created.load(Ordering::SeqCst), 0);

        let config = AuthConfig {
            embedded_wallets: EmbeddedWalletPolicy::AllUsers,
            ..AuthConfig::default()
        };
        let session = AuthSession::new(identity.clone(), config);
        session.login(OAuthProvider::Google).await.unwrap();
        assert_eq!(identity.wallets_created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_only_configured_method() {
        let session = AuthSession::new(MockIdentity::new(None), AuthConfig::default());
        assert!(matches!(
            session.login(OAuthProvider::Apple).await,
            Err(Error::LoginMethodNotAllowed(_))
        ));
        assert!(!session.is_authenticated().await);
        assert!(matches!(session.require_user().await, Err(Error::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_guard() {
        let identity = MockIdentity::new(None);
        let session = AuthSession::new(identity.clone(), AuthConfig::default());

        identity.ready.store(false, Ordering::SeqCst);
        assert_eq!(session.guard(Route::Home).await, Navigation::Wait);

        identity.ready.store(true, Ordering::SeqCst);
        assert_eq!(
            session.guard(Route::Swap).await,
            Navigation::Redirect("/login".to_string())
        );
        assert_eq!(session.guard(Route::Login).await, Navigation::Render(Route::Login));

        session.login(OAuthProvider::Google).await.unwrap();
        assert_eq!(session.guard(Route::Settings).await, Navigation::Render(Route::Settings));
        assert_eq!(
            session.guard(Route::Login).await,
            Navigation::Redirect("/".to_string())
        );

        session.logout().await.unwrap();
        assert_eq!(session.display_name().await, "Anonymous User");
        assert!(session.restore().await.is_none());
    }
}
