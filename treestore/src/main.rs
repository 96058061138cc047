//! Demo host for the treestore state container.
//!
//! Builds the counter store (`{age}` with `add` and a delayed `asyncAdd`),
//! applies the requested commits and dispatches, and prints the final state.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use treestore::io::config::load_config;
use treestore::{Module, StrictMode, Store, StoreOptions, logging};

#[derive(Parser)]
#[command(
    name = "treestore",
    version,
    about = "Hierarchical reactive state container demo"
)]
struct Cli {
    /// Path to a `treestore.toml` configuration file.
    #[arg(long, default_value = "treestore.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the counter store: commit `add`, then dispatch the delayed `asyncAdd`.
    Counter {
        /// Payload for a synchronous `add` commit.
        #[arg(long, default_value_t = 0)]
        add: i64,
        /// Payload for the delayed `asyncAdd` action (skipped when 0).
        #[arg(long, default_value_t = 0)]
        async_add: i64,
        /// Delay before `asyncAdd` commits, in milliseconds.
        #[arg(long, default_value_t = 2000)]
        delay_ms: u64,
        /// Force strict mode regardless of the config file.
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    logging::init(&config.log_filter);
    match cli.command {
        Command::Counter {
            add,
            async_add,
            delay_ms,
            strict,
        } => {
            if strict {
                config.strict = StrictMode::Panic;
            }
            let store = Store::new(StoreOptions::from_config(
                counter(Duration::from_millis(delay_ms)),
                &config,
            ))?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("build tokio runtime")?;
            let local = tokio::task::LocalSet::new();
            local.block_on(&runtime, run_counter(&store, add, async_add))?;
            // Let the delayed action finish before reporting.
            runtime.block_on(local);
            println!("{}", serde_json::to_string_pretty(&store.state().snapshot())?);
            Ok(())
        }
    }
}

async fn run_counter(store: &Store, add: i64, async_add: i64) -> Result<()> {
    if add != 0 {
        store.commit("add", json!(add))?;
        let age = store.state().get(&["age"]).unwrap_or_default();
        info!(%age, "committed add");
    }
    if async_add != 0 {
        store.dispatch("asyncAdd", json!(async_add))?;
        info!("dispatched asyncAdd");
    }
    Ok(())
}

fn counter(delay: Duration) -> Module {
    Module::new()
        .state(json!({"age": 10}))
        .mutation("add", |state, payload| {
            let (Some(age), Some(delta)) = (state["age"].as_i64(), payload.as_i64()) else {
                bail!("add expects an integer payload and an integer age");
            };
            state["age"] = json!(age + delta);
            Ok(())
        })
        .async_action("asyncAdd", move |store, payload| async move {
            tokio::time::sleep(delay).await;
            store.commit("add", payload)?;
            Ok::<(), anyhow::Error>(())
        })
}
