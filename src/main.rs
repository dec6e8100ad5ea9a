use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use triage_assist::history::{ChatHistory, Conversation, InMemoryMessageStore, MessageStore, NewMessage};
use triage_assist::reply::{HttpReplyClient, KeywordReplyClient, ReplyClient};
use triage_assist::voice::{
    TurnPhase, UnsupportedCapture, UnsupportedPlayback, VoiceEvent, VoiceNotice, VoiceTurnController,
};
use triage_assist::{create_router, AppState, Config};

#[derive(Parser)]
#[command(name = "triage-assist", version, about = "Symptom triage chat service")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/triage-assist")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve,

    /// Chat in the terminal (text-only turns)
    Chat {
        /// Owner of the conversation
        #[arg(short, long, default_value = "local-user")]
        user: String,

        /// Continue an existing conversation key instead of starting a new one
        #[arg(short, long)]
        session: Option<String>,

        /// Answer with built-in triage rules instead of the reply endpoint
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Triage Assist v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Chat {
            user,
            session,
            offline,
        } => chat(cfg, user, session, offline).await,
    }
}

fn reply_client(cfg: &Config, offline: bool) -> Result<Arc<dyn ReplyClient>> {
    if offline {
        return Ok(Arc::new(KeywordReplyClient::new()));
    }
    let client = HttpReplyClient::new(cfg.reply.url.clone(), cfg.reply_timeout())
        .context("Failed to create reply client")?;
    Ok(Arc::new(client))
}

async fn serve(cfg: Config) -> Result<()> {
    let state = AppState::new(
        Arc::new(InMemoryMessageStore::new()),
        reply_client(&cfg, false)?,
        cfg.session_gap(),
    );

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .await
        .context("HTTP server failed")
}

async fn chat(cfg: Config, user: String, session: Option<String>, offline: bool) -> Result<()> {
    let store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
    let conversation = match session {
        Some(key) => Conversation::resume(Arc::clone(&store), &user, &key).await,
        None => Conversation::start(Arc::clone(&store), &user),
    };
    let session_key = conversation.session_key().to_string();
    info!(
        "Chatting in {} ({} earlier messages)",
        session_key,
        conversation.messages().len()
    );

    let (controller, mut notices) = VoiceTurnController::new(
        cfg.voice_turn(),
        Box::new(UnsupportedCapture),
        Box::new(UnsupportedPlayback),
        reply_client(&cfg, offline)?,
    );
    let inbox = controller.handle();
    let controller_task = tokio::spawn(controller.run());

    println!("Hi, please describe your symptoms or say hello to start.");
    println!("(/history lists conversations, /quit exits)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/history" => {
                print_history(&store, &user, &cfg).await?;
                continue;
            }
            _ => {}
        }

        inbox
            .send(VoiceEvent::SubmitText(line.to_string()))
            .context("Voice controller stopped")?;

        // One turn: wait until the controller is idle again
        while let Some(notice) = notices.recv().await {
            match notice {
                VoiceNotice::Submitted(query) => {
                    store
                        .insert(NewMessage::user(&user, query).in_session(&session_key))
                        .await?;
                }
                VoiceNotice::Reply(text) => {
                    println!("Bot: {}", text);
                    store
                        .insert(NewMessage::bot(&user, text).in_session(&session_key))
                        .await?;
                }
                VoiceNotice::Error(e) => warn!("{}", e),
                VoiceNotice::PhaseChanged(TurnPhase::Idle) => break,
                _ => {}
            }
        }
    }

    let _ = inbox.send(VoiceEvent::Shutdown);
    controller_task.await.context("Voice controller panicked")?;

    Ok(())
}

async fn print_history(store: &Arc<dyn MessageStore>, user: &str, cfg: &Config) -> Result<()> {
    let history = ChatHistory::open(Arc::clone(store), user, cfg.session_gap()).await?;
    let stats = history.stats();

    println!(
        "{} conversations, {} messages",
        stats.conversations, stats.total_messages
    );
    for session in history.sessions() {
        println!(
            "  [{}] {} - {} ({} messages)",
            session.last_message.format("%Y-%m-%d %H:%M"),
            session.title(),
            session.preview(),
            session.message_count
        );
    }

    Ok(())
}
