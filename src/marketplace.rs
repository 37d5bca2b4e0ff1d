//! Marketplace directory
//!
//! Answers the authorization questions the license path asks: who owns a
//! token, who holds an active subscription, and who is an operator. Backed by
//! the marketplace's own records; the pipeline only consumes the answers.

use crate::error::MedialockResult;
use std::collections::HashSet;
use std::sync::Mutex;

pub trait MarketplaceDirectory: Send + Sync {
    /// Whether `wallet` currently owns `token_id`.
    fn is_owner(&self, token_id: &str, wallet: &str) -> MedialockResult<bool>;

    /// Whether `wallet` holds an active subscription to `token_id`.
    fn is_active_subscriber(&self, token_id: &str, wallet: &str) -> MedialockResult<bool>;

    /// Whether `wallet` is a marketplace operator.
    fn is_admin(&self, wallet: &str) -> MedialockResult<bool>;
}

/// Directory backed by in-memory sets, for tests and development
#[derive(Default)]
pub struct StaticDirectory {
    owners: Mutex<HashSet<(String, String)>>,
    subscribers: Mutex<HashSet<(String, String)>>,
    admins: Mutex<HashSet<String>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_owner(&self, token_id: &str, wallet: &str) {
        if let Ok(mut owners) = self.owners.lock() {
            owners.insert((token_id.to_string(), wallet.to_string()));
        }
    }

    pub fn add_subscriber(&self, token_id: &str, wallet: &str) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.insert((token_id.to_string(), wallet.to_string()));
        }
    }

    pub fn add_admin(&self, wallet: &str) {
        if let Ok(mut admins) = self.admins.lock() {
            admins.insert(wallet.to_string());
        }
    }
}

impl MarketplaceDirectory for StaticDirectory {
    fn is_owner(&self, token_id: &str, wallet: &str) -> MedialockResult<bool> {
        let owners = self.owners.lock()?;
        Ok(owners.contains(&(token_id.to_string(), wallet.to_string())))
    }

    fn is_active_subscriber(&self, token_id: &str, wallet: &str) -> MedialockResult<bool> {
        let subscribers = self.subscribers.lock()?;
        Ok(subscribers.contains(&(token_id.to_string(), wallet.to_string())))
    }

    fn is_admin(&self, wallet: &str) -> MedialockResult<bool> {
        let admins = self.admins.lock()?;
        Ok(admins.contains(wallet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_directory_answers() {
        let directory = StaticDirectory::new();
        directory.set_owner("7", "0xaaa");
        directory.add_subscriber("7", "0xbbb");
        directory.add_admin("0xccc");

        assert!(directory.is_owner("7", "0xaaa").unwrap());
        assert!(!directory.is_owner("7", "0xbbb").unwrap());
        assert!(directory.is_active_subscriber("7", "0xbbb").unwrap());
        assert!(directory.is_admin("0xccc").unwrap());
        assert!(!directory.is_admin("0xaaa").unwrap());
    }
}
