//! Account credentials and the container key derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::query::Query;

/// Credentials of one authorized account.
///
/// `user_id` is the stable identity used to key subscriptions. Token
/// material is wiped from memory when the value is dropped.
///
/// Absent fields deserialize as empty, so a partial record loads and
/// then fails [`Account::is_valid`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Account {
    /// Display name of the account.
    #[zeroize(skip)]
    #[serde(default)]
    pub name: String,
    /// Numeric user id, as a string.
    #[zeroize(skip)]
    #[serde(default)]
    pub user_id: String,
    /// Screen name (without `@`).
    #[zeroize(skip)]
    #[serde(default)]
    pub screen_name: String,
    /// OAuth access token.
    #[serde(default)]
    pub token: String,
    /// OAuth access token secret.
    #[serde(default)]
    pub token_secret: String,
}

impl Account {
    /// Create an account from its five fields.
    pub fn new(
        name: impl Into<String>,
        user_id: impl Into<String>,
        screen_name: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            user_id: user_id.into(),
            screen_name: screen_name.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }

    /// An account is usable only when every field is set.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
            && !self.user_id.is_empty()
            && !self.screen_name.is_empty()
            && !self.token.is_empty()
            && !self.token_secret.is_empty()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("user_id", &self.user_id)
            .field("screen_name", &self.screen_name)
            .field("token", &"[REDACTED]")
            .field("token_secret", &"[REDACTED]")
            .finish()
    }
}

/// Key of every subscription map: account identity plus structural query.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerKey {
    /// `Account::user_id` of the subscribing account.
    pub user_id: String,
    /// The query being subscribed to.
    pub query: Query,
}

impl ContainerKey {
    /// Build the key for `account` and `query`.
    pub fn new(account: &Account, query: &Query) -> Self {
        Self {
            user_id: account.user_id.clone(),
            query: query.clone(),
        }
    }
}
