use std::env;
use std::sync::Arc;

use anyhow::Result;
use log::info;
use rusqlite::Connection;
use teloxide::prelude::*;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use koyeb_bot::bot::{self, BotDeps};
use koyeb_bot::db;
use koyeb_bot::koyeb::{KoyebClient, DEFAULT_BASE_URL};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (also captures `log` records from db.rs)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Koyeb Telegram Bot");

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Get bot token from environment
    let bot_token = env::var("TELEGRAM_BOT_TOKEN").expect("TELEGRAM_BOT_TOKEN must be set");

    // Koyeb API base URL is overridable for staging setups
    let api_url = env::var("KOYEB_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    info!("Using Koyeb API at: {}", api_url);

    // Credential persistence is optional; without DATABASE_URL the bot
    // runs purely in memory and users log in again after a restart.
    let credentials = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            info!("Initializing database at: {}", database_url);
            let conn = Connection::open(&database_url)?;
            db::init_database_schema(&conn)?;
            Some(Arc::new(Mutex::new(conn)))
        }
        Err(_) => {
            info!("DATABASE_URL not set, running without credential persistence");
            None
        }
    };

    let platform = Arc::new(KoyebClient::new(api_url));
    let deps = BotDeps::new(platform, credentials);

    // Initialize the bot
    let bot = Bot::new(bot_token);

    info!("Bot initialized, starting dispatcher");

    // Set up the dispatcher with shared state
    let handler = dptree::entry().branch(Update::filter_message().endpoint({
        let deps = deps.clone();
        move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move { bot::message_handler(bot, msg, deps).await }
        }
    }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
