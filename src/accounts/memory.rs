use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::AccountStore;
use crate::error::GatewayError;
use crate::models::user::UserAccount;

/// Keeps accounts in a process-local map. Useful for tests and local
/// development without a MongoDB instance; the map mutex stands in for the
/// store's unique-index guarantee.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<String, UserAccount>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, account: &UserAccount) -> Result<(), GatewayError> {
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&account.email) {
            return Err(GatewayError::UserExists);
        }
        accounts.insert(account.email.clone(), account.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, GatewayError> {
        Ok(self.accounts.lock().await.get(email).cloned())
    }
}
