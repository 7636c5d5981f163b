//! EquityRun CLI - Run and watch equity simulations from the terminal.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use equityrun_client::{ClientConfig, StreamItem, TaskClient};
use equityrun_core::{apply, apply_status, build, AggregatedState, HandFields, TaskHandle};

mod render;

use render::{render_pot_odds, render_service_config, Renderer};

/// EquityRun CLI - Poker equity simulation client
#[derive(Parser)]
#[command(name = "equityrun")]
#[command(about = "Run poker equity simulations against an EquityRun service", long_about = None)]
struct Cli {
    /// Simulation service base URL
    #[arg(long, env = "EQUITYRUN_API_BASE", default_value = "http://127.0.0.1:5000")]
    base_url: String,

    /// Job submission timeout in seconds
    #[arg(long, env = "EQUITYRUN_SUBMIT_TIMEOUT_SECS", default_value_t = 20)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a hand and follow the simulation
    Run(HandArgs),

    /// Follow an already running task
    Watch {
        /// Task ID
        task_id: String,
    },

    /// Cancel a task
    Cancel {
        /// Task ID to cancel
        task_id: String,
    },

    /// Check service health
    Health,

    /// Show the service's advice-engine settings
    Config,
}

#[derive(Args)]
struct HandArgs {
    /// Hole cards, e.g. "As Kd"
    #[arg(long)]
    hero: String,

    /// Three flop cards, e.g. "Qh Jd Th"
    #[arg(long)]
    flop: Option<String>,

    #[arg(long)]
    turn: Option<String>,

    #[arg(long)]
    river: Option<String>,

    /// Number of opponents [default: 2]
    #[arg(long)]
    villains: Option<u32>,

    /// Pot size in big blinds
    #[arg(long)]
    pot: Option<String>,

    /// Amount to call in big blinds
    #[arg(long)]
    call: Option<String>,

    /// Effective stack in big blinds
    #[arg(long)]
    stack: Option<String>,

    /// Table position, e.g. BTN
    #[arg(long)]
    position: Option<String>,
}

impl HandArgs {
    fn into_fields(self) -> HandFields {
        HandFields {
            villains: self.villains,
            pot: self.pot.unwrap_or_default(),
            call: self.call.unwrap_or_default(),
            stack: self.stack.unwrap_or_default(),
            position: self.position.unwrap_or_default(),
            ..Default::default()
        }
        .with_hero(&self.hero)
        .with_flop(self.flop.as_deref().unwrap_or_default())
        .with_turn(self.turn.unwrap_or_default())
        .with_river(self.river.unwrap_or_default())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the rendered progress.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("equityrun=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::new(cli.base_url)
        .with_submit_timeout(Duration::from_secs(cli.timeout_secs));
    let mut client = TaskClient::new(config)?;

    match cli.command {
        Commands::Run(hand) => {
            run(&mut client, hand).await?;
        }
        Commands::Watch { task_id } => {
            follow(&mut client, TaskHandle::new(task_id), AggregatedState::default()).await?;
        }
        Commands::Cancel { task_id } => {
            client.cancel(&TaskHandle::new(task_id)).await?;
            println!("Task cancelled");
        }
        Commands::Health => {
            if client.health().await? {
                println!("Service is healthy");
            } else {
                return Err("service reported unhealthy".into());
            }
        }
        Commands::Config => {
            let config = client.service_config().await?;
            for line in render_service_config(&config) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

async fn run(client: &mut TaskClient, hand: HandArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request = build(&hand.into_fields())?;
    let state = AggregatedState::for_request(&request);

    let handle = client.start(&request).await?;
    println!("Task started: {}", handle);
    if let Some(banner) = render_pot_odds(&state) {
        println!("{}", banner);
    }

    follow(client, handle, state).await
}

/// Render progress for `handle` until the task finishes or Ctrl-C.
async fn follow(
    client: &mut TaskClient,
    handle: TaskHandle,
    mut state: AggregatedState,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut subscription = client.subscribe(&handle);
    let mut renderer = Renderer::new();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        for line in renderer.update(&state) {
            println!("{}", line);
        }

        tokio::select! {
            item = subscription.next() => match item {
                Some(StreamItem::Event(event)) => state = apply(state, &event),
                Some(StreamItem::Status(status)) => state = apply_status(state, status),
                Some(StreamItem::Failed(message)) => {
                    return Err(format!("progress channel failed: {}", message).into());
                }
                None => break,
            },
            _ = &mut ctrl_c => {
                info!(task_id = %handle, "Interrupted, cancelling task");
                client.close();
                if let Err(e) = client.cancel(&handle).await {
                    warn!(task_id = %handle, error = %e, "Best-effort cancel failed");
                }
                return Ok(());
            }
        }
    }

    if !state.terminal {
        warn!(task_id = %handle, "Progress channel closed before the task finished");
    }

    Ok(())
}
