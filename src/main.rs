mod app;
mod bot;
mod config;
mod content;
mod error;
mod matching;
mod quiz;
mod reflection;
mod tutor;

use std::sync::Arc;

use dotenv::dotenv;
use teloxide::prelude::*;

use bot::{HandlerResult, Sessions};
use config::Config;

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting Bouwsteen bot...");

    if let Err(err) = run().await {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> HandlerResult {
    let config = Config::from_env()?;

    let content = Arc::new(config.load_content()?);
    log::info!(
        "Content loaded: {} questions, {} organizers",
        content.questions.len(),
        content.organizers.len()
    );

    let tutor = Arc::new(config.tutor_gateway()?);
    log::info!("AI tutor uses {}", tutor.backend_name());

    let bot = Bot::new(&config.bot_token);
    let sessions = Sessions::new();

    Dispatcher::builder(
        bot,
        Update::filter_message().endpoint(bot::handle_message),
    )
    .dependencies(dptree::deps![sessions, content, tutor])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}
