pub mod api;

use std::error::Error;
use std::sync::Arc;

use crate::accounts::AccountStore;
use crate::agent::TutorAgent;
use crate::auth::TokenSigner;

pub struct Server {
    addr: String,
    state: api::AppState,
}

impl Server {
    pub fn new(
        addr: String,
        agent: Arc<TutorAgent>,
        accounts: Arc<dyn AccountStore>,
        tokens: TokenSigner,
    ) -> Self {
        Self {
            addr,
            state: api::AppState {
                agent,
                accounts,
                tokens,
            },
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(&self.addr, self.state.clone()).await
    }
}
