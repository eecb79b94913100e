use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::info;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};

use super::AccountStore;
use crate::error::GatewayError;
use crate::models::user::UserAccount;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Stored document shape. Timestamps are stored as epoch milliseconds.
#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    id: String,
    email: String,
    password_hash: String,
    created_at: i64,
}

impl From<&UserAccount> for UserDocument {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            password_hash: account.password_hash.clone(),
            created_at: account.created_at.timestamp_millis(),
        }
    }
}

impl UserDocument {
    fn into_account(self) -> UserAccount {
        UserAccount {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            created_at: Utc
                .timestamp_millis_opt(self.created_at)
                .single()
                .unwrap_or_else(Utc::now),
        }
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}

pub struct MongoAccountStore {
    users: Collection<UserDocument>,
}

impl MongoAccountStore {
    /// Connects and ensures the unique email index the registration path
    /// relies on.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, GatewayError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| GatewayError::Store(format!("mongodb connect: {}", e)))?;
        let users = client.database(database).collection::<UserDocument>("users");

        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users
            .create_index(index)
            .await
            .map_err(|e| GatewayError::Store(format!("mongodb index: {}", e)))?;

        info!("MongoDB connected, unique email index ensured");
        Ok(Self { users })
    }
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn insert(&self, account: &UserAccount) -> Result<(), GatewayError> {
        let document = UserDocument::from(account);
        match self.users.insert_one(&document).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(GatewayError::UserExists),
            Err(e) => Err(GatewayError::Store(format!("mongodb insert: {}", e))),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, GatewayError> {
        let document = self
            .users
            .find_one(doc! { "email": email })
            .await
            .map_err(|e| GatewayError::Store(format!("mongodb find: {}", e)))?;
        Ok(document.map(UserDocument::into_account))
    }
}
