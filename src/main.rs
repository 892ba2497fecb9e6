//! # FaqClaw — FAQ chatbot
//!
//! Usage:
//!   faqclaw chat                            # Interactive terminal session
//!   faqclaw telegram                        # Run the Telegram bot
//!   faqclaw export --password <p> [--out F] # Admin-gated db.json export
//!   faqclaw import db.json                  # Merge a db.json into the store
//!   faqclaw init                            # Write ~/.faqclaw/config.toml

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use faqclaw_agent::{ConversationEngine, Reply, lookup};
use faqclaw_channels::{CliChannel, TelegramChannel};
use faqclaw_core::FaqClawConfig;
use faqclaw_core::traits::Channel;
use faqclaw_core::types::OutgoingMessage;
use faqclaw_knowledge::{KnowledgeBase, KnowledgeStore};
use futures::StreamExt;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "faqclaw", version, about = "🤖 FaqClaw — FAQ chatbot that learns")]
struct Cli {
    /// Config file (default ~/.faqclaw/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat in the terminal
    Chat,
    /// Run the Telegram bot
    Telegram,
    /// Export the knowledge base (admin password required)
    Export {
        #[arg(long)]
        password: String,
        /// Output file, stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Merge a db.json file into the knowledge base
    Import { file: PathBuf },
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<FaqClawConfig> {
    let config = match path {
        Some(path) => {
            let mut config = FaqClawConfig::load_from(path)?;
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
        None => FaqClawConfig::load()?,
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "faqclaw=debug,faqclaw_agent=debug,faqclaw_knowledge=debug,faqclaw_channels=debug"
    } else {
        "faqclaw=info,faqclaw_agent=info,faqclaw_knowledge=info,faqclaw_channels=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    if let Commands::Init { force } = &cli.command {
        let path = cli.config.clone().unwrap_or_else(FaqClawConfig::default_path);
        if path.exists() && !force {
            println!("⚠️  Config already exists: {} (use --force to overwrite)", path.display());
            return Ok(());
        }
        FaqClawConfig::default().save_to(&path)?;
        println!("✅ Config written to {}", path.display());
        return Ok(());
    }

    let config = load_config(cli.config.as_ref())?;
    let store = KnowledgeStore::from_config(&config.knowledge)?;

    match cli.command {
        Commands::Chat => {
            let engine = build_engine(store, &config)?;
            serve(CliChannel::new(), engine).await
        }
        Commands::Telegram => {
            let telegram = config.channel.telegram.clone().unwrap_or_default();
            if telegram.bot_token.trim().is_empty() {
                bail!("Telegram bot token missing: set channel.telegram.bot_token or TELEGRAM_BOT_TOKEN");
            }
            let engine = build_engine(store, &config)?;
            serve(TelegramChannel::new(telegram), engine).await
        }
        Commands::Export { password, out } => export(&store, &config, &password, out),
        Commands::Import { file } => import(store, &file),
        Commands::Init { .. } => Ok(()),
    }
}

fn build_engine(store: KnowledgeStore, config: &FaqClawConfig) -> Result<ConversationEngine> {
    let lookup = lookup::from_config(&config.lookup)?;
    Ok(ConversationEngine::new(store.into_shared(), config, lookup))
}

/// Dispatcher loop: one message at a time, replies in order.
/// A persistence failure stops the loop with an error.
async fn serve<C: Channel>(mut channel: C, mut engine: ConversationEngine) -> Result<()> {
    channel.connect().await?;
    tracing::info!("🚀 FaqClaw listening on {}", channel.name());

    let mut incoming = channel.listen().await?;
    while let Some(msg) = incoming.next().await {
        let session = msg.session_id();
        channel.send_typing(&msg.thread_id).await.ok();

        let replies = match engine.handle(&session, &msg.content).await {
            Ok(replies) => replies,
            Err(e) if e.is_fatal() => {
                tracing::error!("❌ Stopping: {e}");
                channel.disconnect().await.ok();
                return Err(e.into());
            }
            Err(e) => {
                tracing::error!("❌ [{session}] {e}");
                continue;
            }
        };

        for reply in replies {
            let outgoing = match reply {
                Reply::Text(text) => OutgoingMessage::text(&msg.thread_id, text),
                Reply::Document {
                    caption,
                    attachment,
                } => OutgoingMessage::document(&msg.thread_id, caption, attachment),
            };
            if let Err(e) = channel.send(outgoing).await {
                tracing::warn!("⚠️ Failed to send reply on {}: {e}", channel.name());
            }
        }
    }

    channel.disconnect().await?;
    tracing::info!("👋 {} channel closed", channel.name());
    Ok(())
}

fn export(
    store: &KnowledgeStore,
    config: &FaqClawConfig,
    password: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    if !config.admin.is_enabled() {
        bail!("export disabled: admin.password is not configured");
    }
    if !config.admin.check(password) {
        tracing::warn!("🔒 Rejected export password");
        bail!("wrong admin password");
    }

    let payload = store.export_json()?;
    let fingerprint = KnowledgeStore::fingerprint(&payload);
    match out {
        Some(path) => {
            std::fs::write(&path, &payload)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "💾 {} questions exported to {} (sha256 {fingerprint})",
                store.len(),
                path.display()
            );
        }
        None => {
            println!("{}", String::from_utf8_lossy(&payload));
            eprintln!("💾 {} questions (sha256 {fingerprint})", store.len());
        }
    }
    Ok(())
}

fn import(mut store: KnowledgeStore, file: &PathBuf) -> Result<()> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let incoming: KnowledgeBase =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", file.display()))?;
    let (records, answers) = store.merge_base(incoming)?;
    println!(
        "📥 Imported {records} new questions and {answers} answers ({} total)",
        store.len()
    );
    Ok(())
}
