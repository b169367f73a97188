use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tandem_client::{
    EngineConfig, NegotiationState, SessionCommand, SessionEvent, SessionManager,
    SyntheticMediaSource, TricklePolicy, WebRtcFactory, WsRelayClient,
};
use tandem_core::MediaConstraints;
use tandem_server::RelayConfig;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "Two-party audio/video sessions through a signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Relay(RelayArgs),
    /// Join a relay as a participant sending synthetic media.
    Agent(AgentArgs),
}

#[derive(clap::Args)]
struct RelayArgs {
    /// Overrides TANDEM_BIND.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Overrides TANDEM_STUN_URLS.
    #[arg(long = "stun", value_delimiter = ',')]
    stun_urls: Vec<String>,

    /// Overrides TANDEM_TURN_UPSTREAM_URL.
    #[arg(long)]
    turn_upstream_url: Option<String>,

    /// Overrides TANDEM_TURN_TIMEOUT_MS.
    #[arg(long)]
    turn_timeout_ms: Option<u64>,
}

#[derive(clap::Args)]
struct AgentArgs {
    #[arg(long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// What to offer to participants that join after us.
    #[arg(long, value_enum, default_value_t = MediaArg::Video)]
    initial: MediaArg,

    /// Answer offers with video only. Answers always carry video.
    #[arg(long)]
    answer_video_only: bool,

    /// Stop trickling local candidates once ICE is connected.
    #[arg(long)]
    suppress_trickle: bool,

    /// Seconds before an unconnected session is dropped, 0 disables.
    #[arg(long, default_value_t = 30)]
    negotiation_timeout: u64,

    #[arg(long, default_value_t = 5000)]
    credential_timeout_ms: u64,

    /// Prompt for media toggles.
    #[arg(short, long)]
    interactive: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum MediaArg {
    None,
    Video,
    AudioVideo,
}

impl From<MediaArg> for MediaConstraints {
    fn from(arg: MediaArg) -> Self {
        match arg {
            MediaArg::None => MediaConstraints::NONE,
            MediaArg::Video => MediaConstraints::VIDEO_ONLY,
            MediaArg::AudioVideo => MediaConstraints::AUDIO_VIDEO,
        }
    }
}

impl AgentArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            trickle_policy: if self.suppress_trickle {
                TricklePolicy::SuppressWhenConnected
            } else {
                TricklePolicy::Always
            },
            initial_media: self.initial.into(),
            answer_audio: !self.answer_video_only,
            negotiation_timeout: (self.negotiation_timeout > 0)
                .then(|| Duration::from_secs(self.negotiation_timeout)),
            credential_timeout: Duration::from_millis(self.credential_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Cli::parse().command {
        Commands::Relay(args) => run_relay(args).await,
        Commands::Agent(args) => run_agent(args).await,
    }
}

async fn run_relay(args: RelayArgs) -> Result<()> {
    let mut config = RelayConfig::from_env();
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if !args.stun_urls.is_empty() {
        config.stun_urls = args.stun_urls;
    }
    if let Some(url) = args.turn_upstream_url {
        config.turn_upstream_url = Some(url);
    }
    if let Some(ms) = args.turn_timeout_ms {
        config.turn_timeout = Duration::from_millis(ms);
    }

    println!("{} {}", "Starting tandem relay on".green().bold(), config.bind);
    tandem_server::serve(config).await
}

async fn run_agent(args: AgentArgs) -> Result<()> {
    let config = args.engine_config();

    println!("{} {}", "Connecting to".cyan(), args.url);
    let (client, relay_rx) = WsRelayClient::connect(&args.url, config.credential_timeout)
        .await
        .with_context(|| format!("Failed to connect to relay at {}", args.url))?;
    let client = Arc::new(client);
    println!("{} {}", "Joined as".green().bold(), client.local_id());

    let (manager, mut events) = SessionManager::new(
        client.local_id(),
        config,
        client.clone(),
        client.clone(),
        Arc::new(WebRtcFactory),
        Arc::new(SyntheticMediaSource::new()),
    );

    let (command_tx, command_rx) = mpsc::channel(16);
    let session = tokio::spawn(manager.run(relay_rx, command_rx));

    // The prompt blocks on the terminal, so it gets its own thread
    let (quit_tx, mut quit_rx) = oneshot::channel::<()>();
    if args.interactive {
        std::thread::spawn(move || {
            if let Err(e) = prompt_loop(command_tx) {
                warn!("Prompt failed: {}", e);
            }
            let _ = quit_tx.send(());
        });
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(e) => print_event(&e),
                    None => break,
                }
            }

            _ = &mut quit_rx, if args.interactive => break,

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!("{}", "Leaving...".yellow());
    client.close();
    let _ = session.await;
    Ok(())
}

fn prompt_loop(commands: mpsc::Sender<SessionCommand>) -> Result<()> {
    let items = [
        "Toggle video only / audio+video",
        "Toggle audio",
        "Toggle video",
        "Share audio+video",
        "Quit",
    ];

    loop {
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Media")
            .items(&items)
            .default(0)
            .interact()?;

        let cmd = match choice {
            0 => SessionCommand::ToggleMedia,
            1 => SessionCommand::ToggleAudio,
            2 => SessionCommand::ToggleVideo,
            3 => SessionCommand::Share(MediaConstraints::AUDIO_VIDEO),
            _ => return Ok(()),
        };
        if commands.blocking_send(cmd).is_err() {
            return Ok(());
        }
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::StateChanged { remote, state } => {
            let state = match state {
                NegotiationState::Idle => state.to_string().dimmed(),
                NegotiationState::Negotiating => state.to_string().cyan(),
                NegotiationState::Converging => state.to_string().blue(),
                NegotiationState::Connected => state.to_string().green().bold(),
            };
            println!("{} {}", remote, state);
        }
        SessionEvent::RemoteTrack { remote, kind, .. } => {
            println!("{} {} from {}", "Receiving".green(), kind, remote);
        }
        SessionEvent::MediaChanged {
            remote,
            audio,
            video,
        } => {
            println!(
                "{} audio={} video={} to {}",
                "Sending".cyan(),
                audio,
                video,
                remote
            );
        }
        SessionEvent::Closed { remote } => {
            println!("{} {}", remote, "left".yellow());
        }
        SessionEvent::Expired { remote } => {
            println!("{} {}", remote, "never connected, dropped".red());
        }
    }
}
