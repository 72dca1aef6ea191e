//! Mines Fair command line
//!
//! Independent verification of mine-field rounds, plus a local
//! commit/reveal demo through the reveal service.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mines_fair::{
    notify::{run_dispatcher, ChannelSink, LogDeliverer},
    proof::{derive_round_seed, derive_tile_outcome_in, verify_and_reveal_in},
    protocol::{CommitRequest, RevealRequest},
    service::spawn_expiry_task,
    compute_commitment_hash, BetStore, FairnessConfig, InMemoryBetStore, RevealService,
    RoundCommitment, VERSION,
};

#[derive(Parser, Debug)]
#[command(name = "mines-fair", version)]
#[command(about = "Provably fair verification for 5x5 mine-field rounds")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the commitment hash of a server seed
    Hash {
        /// Server seed
        server_seed: String,
    },

    /// Derive the board for a round
    Derive {
        #[arg(long)]
        server_seed: String,
        #[arg(long)]
        client_seed: String,
        #[arg(long)]
        nonce: u64,
        #[arg(long)]
        mines: u8,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a revealed seed against a published hash and print the board
    Verify {
        #[arg(long)]
        server_seed: String,
        /// Published SHA-256 of the server seed
        #[arg(long)]
        hash: String,
        #[arg(long)]
        client_seed: String,
        #[arg(long)]
        nonce: u64,
        #[arg(long)]
        mines: u8,
    },

    /// Run a commit and reveal through the service
    Demo,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("mines-fair failed: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    init_logging()?;
    let config = FairnessConfig::from_env().context("loading configuration")?;
    let args = Args::parse();

    match args.command {
        Command::Hash { server_seed } => {
            println!("{}", compute_commitment_hash(&server_seed));
        }
        Command::Derive {
            server_seed,
            client_seed,
            nonce,
            mines,
            json,
        } => {
            let outcome =
                derive_tile_outcome_in(config.mine_range, &server_seed, &client_seed, nonce, mines)?;
            if json {
                let value = serde_json::json!({
                    "serverSeedHash": compute_commitment_hash(&server_seed),
                    "roundSeed": derive_round_seed(&server_seed, &client_seed, nonce),
                    "mineTiles": outcome.mine_tiles(),
                    "safeTiles": outcome.safe_tiles(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", outcome);
                println!("mines: {:?}", outcome.mine_tiles());
            }
        }
        Command::Verify {
            server_seed,
            hash,
            client_seed,
            nonce,
            mines,
        } => {
            let commitment = RoundCommitment::new(client_seed, nonce, mines, &hash)?;
            let reveal = verify_and_reveal_in(config.mine_range, &server_seed, &commitment)
                .context("not verified")?;
            println!("VERIFIED");
            println!("{}", reveal.outcome);
            println!("mines: {:?}", reveal.outcome.mine_tiles());
        }
        Command::Demo => demo(config)?,
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Commit and reveal one round end to end.
fn demo(config: FairnessConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
    runtime.block_on(async move {
        info!("Mines Fair v{}", VERSION);

        let store: Arc<dyn BetStore> = Arc::new(InMemoryBetStore::with_ttl(config.pending_ttl));
        let (sink, rx) = ChannelSink::channel(config.event_channel_capacity);
        let dispatcher = tokio::spawn(run_dispatcher(rx, LogDeliverer, config.retry));
        if let Some(ttl) = config.pending_ttl {
            let _expiry = spawn_expiry_task(store.clone(), ttl);
        }

        let service = RevealService::new(store, Arc::new(sink), &config);

        let server_seed = "demo-server-seed";
        let commit = CommitRequest {
            username: "alice".to_string(),
            nonce: 1,
            client_seed: "lucky-client".to_string(),
            server_seed_hash: compute_commitment_hash(server_seed),
            mines: 3,
            bet_amount: "0.001".to_string(),
            currency: "btc".to_string(),
        };
        info!("Commit: {}", serde_json::to_string(&service.handle_commit(&commit))?);

        let wrong = RevealRequest {
            username: "alice".to_string(),
            nonce: 1,
            server_seed: "not-the-seed".to_string(),
        };
        info!("Wrong seed: {}", serde_json::to_string(&service.handle_reveal(&wrong))?);

        let reveal = RevealRequest {
            server_seed: server_seed.to_string(),
            ..wrong
        };
        let verified = service.reveal(&reveal)?;
        info!("Verified board:\n{}", verified.outcome);

        // Dropping the service closes the event channel
        drop(service);
        let stats = dispatcher.await.context("dispatcher task")?;
        info!(delivered = stats.delivered, failed = stats.failed, "Demo finished");
        Ok::<(), anyhow::Error>(())
    })
}
