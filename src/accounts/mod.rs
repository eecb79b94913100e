mod memory;
mod mongo;

pub use memory::MemoryAccountStore;
pub use mongo::MongoAccountStore;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::cli::Args;
use crate::error::GatewayError;
use crate::models::user::UserAccount;

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Inserts a new account. Fails with `UserExists` when the email is
    /// already registered; uniqueness is enforced by the backing store, not
    /// re-checked here.
    async fn insert(&self, account: &UserAccount) -> Result<(), GatewayError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, GatewayError>;
}

pub async fn create_account_store(args: &Args) -> Result<Arc<dyn AccountStore>, GatewayError> {
    match args.account_store.to_lowercase().as_str() {
        "mongo" => {
            info!(
                "User accounts will be stored in MongoDB database '{}'",
                args.mongo_database
            );
            let store = MongoAccountStore::connect(&args.mongo_uri, &args.mongo_database).await?;
            Ok(Arc::new(store))
        }
        "memory" => {
            info!("User accounts will be stored in memory");
            Ok(Arc::new(MemoryAccountStore::new()))
        }
        other => Err(GatewayError::Store(format!(
            "unsupported account store type: {}",
            other
        ))),
    }
}
