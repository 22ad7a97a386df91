//! Identity and session gating
//!
//! Login is delegated to an external OAuth/embedded-wallet service behind
//! `IdentityProvider`. `AuthSession` enforces the configured login method,
//! the embedded-wallet policy and the route guard.

pub mod routes;
pub mod session;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::wallet::shorten_address;

pub use routes::Route;
pub use session::{AuthSession, Navigation};

/// Shown in place of a name when nobody is signed in
pub const ANONYMOUS_NAME: &str = "Anonymous User";

/// OAuth providers the identity service supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Apple,
    Discord,
    Twitter,
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Apple => "apple",
            OAuthProvider::Discord => "discord",
            OAuthProvider::Twitter => "twitter",
        };
        write!(f, "{}", name)
    }
}

/// When to create an embedded wallet at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddedWalletPolicy {
    #[default]
    #[serde(alias = "users-without-wallets")]
    UsersWithoutWallets,
    #[serde(alias = "all-users")]
    AllUsers,
    Off,
}

impl EmbeddedWalletPolicy {
    pub fn should_create(&self, user: &User) -> bool {
        match self {
            EmbeddedWalletPolicy::UsersWithoutWallets => user.wallet_address.is_none(),
            EmbeddedWalletPolicy::AllUsers => !user.embedded_wallet,
            EmbeddedWalletPolicy::Off => false,
        }
    }
}

/// Signed-in account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// The wallet was created by the identity service
    #[serde(default)]
    pub embedded_wallet: bool,
}

impl User {
    /// Email, else shortened wallet address, else "User"
    pub fn display_name(&self) -> String {
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            return email.to_string();
        }
        if let Some(address) = self.wallet_address.as_deref().filter(|a| !a.is_empty()) {
            return shorten_address(address, 6, 4);
        }
        "User".to_string()
    }

    /// Avatar letter
    pub fn initial(&self) -> char {
        self.email
            .as_deref()
            .or(self.wallet_address.as_deref())
            .and_then(|s| s.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }

    pub fn wallet_status(&self) -> &'static str {
        if self.wallet_address.is_some() {
            "Wallet connected"
        } else {
            "No wallet connected"
        }
    }
}

/// Display name for an optional user
pub fn display_name(user: Option<&User>) -> String {
    user.map(User::display_name)
        .unwrap_or_else(|| ANONYMOUS_NAME.to_string())
}

/// Result of a completed OAuth flow
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub user: User,
    pub is_new_user: bool,
}

/// External identity service (OAuth + embedded wallets)
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether the service has finished initialising
    async fn is_ready(&self) -> bool;

    async fn initiate_oauth(&self, provider: OAuthProvider) -> Result<LoginOutcome>;

    async fn current_user(&self) -> Option<User>;

    /// Create an embedded wallet for the user, returning the updated user
    async fn create_embedded_wallet(&self, user: &User) -> Result<User>;

    async fn logout(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: Option<&str>, wallet: Option<&str>) -> User {
        User {
            id: "did:privy:1".to_string(),
            email: email.map(str::to_string),
            wallet_address: wallet.map(str::to_string),
            embedded_wallet: false,
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        let wallet = "0x1234567890abcdef1234567890abcdef12345678";
        assert_eq!(user(Some("kim@blip.app"), Some(wallet)).display_name(), "kim@blip.app");
        assert_eq!(user(None, Some(wallet)).display_name(), "0x1234...5678");
        assert_eq!(user(None, None).display_name(), "User");
        assert_eq!(display_name(None), "Anonymous User");
    }

    #[test]
    fn test_initial() {
        assert_eq!(user(Some("kim@blip.app"), None).initial(), 'K');
        assert_eq!(user(None, Some("abc")).initial(), 'A');
        assert_eq!(user(None, None).initial(), 'U');
    }

    #[test]
    fn test_embedded_wallet_policy() {
        let bare = user(Some("a@b.c"), None);
        let external = user(Some("a@b.c"), Some("0xabc"));

        assert!(EmbeddedWalletPolicy::UsersWithoutWallets.should_create(&bare));
        assert!(!EmbeddedWalletPolicy::UsersWithoutWallets.should_create(&external));
        assert!(EmbeddedWalletPolicy::AllUsers.should_create(&external));
        assert!(!EmbeddedWalletPolicy::Off.should_create(&bare));
    }

    #[test]
    fn test_policy_parsing() {
        let policy: EmbeddedWalletPolicy = serde_json::from_str("\"users-without-wallets\"").unwrap();
        assert_eq!(policy, EmbeddedWalletPolicy::UsersWithoutWallets);
        let policy: EmbeddedWalletPolicy = serde_json::from_str("\"all_users\"").unwrap();
        assert_eq!(policy, EmbeddedWalletPolicy::AllUsers);
    }
}
