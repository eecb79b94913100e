pub mod accounts;
pub mod agent;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod server;
pub mod speech;

use agent::TutorAgent;
use auth::TokenSigner;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Gemini Model: {}", args.gemini_model);
    info!("Gemini Base URL: {}", args.gemini_base_url);
    info!("Speech Base URL: {}", args.speech_base_url);
    info!("Account Store Type: {}", args.account_store);
    info!("Max Reply Tokens: {}", args.max_reply_tokens);
    info!("-------------------------");

    let agent = Arc::new(TutorAgent::from_args(&args));
    let accounts = accounts::create_account_store(&args).await?;
    let tokens = TokenSigner::new(args.jwt_secret.clone());

    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, accounts, tokens);
    server.run().await?;

    Ok(())
}
