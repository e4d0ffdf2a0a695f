//! Register the bot's webhook URL with Telegram.

use std::env;

use clap::{ArgAction, Parser};
use telegram_client::{BotConfig, SetWebhookParams, TelegramClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "set-webhook")]
#[command(about = "Point Telegram at the bot's public webhook URL")]
struct Args {
    /// Bot token. Falls back to TELEGRAM_BOT_TOKEN env.
    #[arg(long)]
    token: Option<String>,

    /// Public https webhook URL, e.g. https://bot.example.com/telegram/webhook.
    /// Falls back to TELEGRAM_WEBHOOK_URL env.
    #[arg(long)]
    url: Option<String>,

    /// Secret Telegram sends with every update. Falls back to TELEGRAM_WEBHOOK_SECRET env.
    #[arg(long)]
    secret: Option<String>,

    /// Drop updates queued while no webhook was set
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    drop_pending: bool,

    /// Bot API base URL. Falls back to TELEGRAM_API_URL env.
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let token = non_blank(args.token.or_else(|| env::var("TELEGRAM_BOT_TOKEN").ok()))
        .ok_or("Missing --token or TELEGRAM_BOT_TOKEN")?;
    let url = non_blank(args.url.or_else(|| env::var("TELEGRAM_WEBHOOK_URL").ok()))
        .ok_or("Missing --url or TELEGRAM_WEBHOOK_URL")?;
    if !url.starts_with("https://") {
        return Err(format!("Webhook URL must be https://: {:?}", url).into());
    }
    let secret = non_blank(args.secret.or_else(|| env::var("TELEGRAM_WEBHOOK_SECRET").ok()));

    let mut config = BotConfig::new(token);
    if let Some(api_url) = non_blank(args.api_url.or_else(|| env::var("TELEGRAM_API_URL").ok())) {
        config = config.with_api_url(api_url);
    }
    let client = TelegramClient::new(config)?;

    let mut params = SetWebhookParams::new(url.as_str()).drop_pending(args.drop_pending);
    if let Some(secret) = secret {
        params = params.with_secret(secret);
    }

    client.set_webhook(&params).await?;
    info!(url = %url, drop_pending = args.drop_pending, "Webhook registered");
    println!("ok");

    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
