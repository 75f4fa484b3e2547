mod betting;
mod config;
mod dispatch;
mod event;
mod gateway;
mod media;
mod reply;
mod router;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::event::{EventKind, EventSource, InboundEvent};
use crate::gateway::{ConsoleGateway, MessagingGateway};
use crate::media::FsMediaStore;
use crate::reply::ReplyPayload;
use crate::router::Router;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,betbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; missing file means stock defaults
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = if config_path.exists() {
        info!("Loading configuration from: {}", config_path.display());
        Config::load(&config_path)?
    } else {
        info!(
            "No config file at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };

    info!("Configuration loaded");
    info!("  Bet table entries: {}", config.betting.entries.len());
    info!("  Round: {}", config.game.round);
    info!("  Download dir: {}", config.media.download_dir.display());

    let gateway: Arc<dyn MessagingGateway> = Arc::new(ConsoleGateway::new());
    let media = Arc::new(FsMediaStore::new(&config.media));
    let router = Router::new(gateway.clone(), media, &config);

    gateway
        .broadcast(ReplyPayload::text("莊家小幫手已上線"))
        .await?;

    // Console loop: each line is handled as one inbound text event
    info!("betbot console is ready, type a message (Ctrl-D to quit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let event = InboundEvent {
            reply_token: "console".to_string(),
            source: EventSource {
                user_id: Some("console-user".to_string()),
                sender_id: Some("console-user".to_string()),
            },
            kind: EventKind::Text {
                text: text.to_string(),
            },
        };
        if let Err(e) = router.handle(event).await {
            error!("Failed to handle event: {:#}", e);
        }
    }

    Ok(())
}
