#![recursion_limit = "256"]
#![expect(
    clippy::multiple_crate_versions,
    reason = "transitive dependency duplication"
)]

use clap::{Parser, Subcommand};
use eyre::Context as _;
use std::io::IsTerminal as _;
use tracing_subscriber::prelude::*;

mod amount;
mod chains;
mod cli_output;
mod config;
mod doctor;
mod errors;
mod fees;
mod paths;
mod pools;
mod price;
mod price_math;
mod quote;
mod retry;
mod route;
mod rpc;
mod store;
mod swap;
mod tokens;

use crate::{
    chains::kaia::KaiaChain,
    config::DragonrouteConfig,
    fees::FeeTier,
    quote::QuoteEngine,
    tokens::TokenRegistry,
};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "dragonroute", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server over stdio.
    Mcp,

    /// Quote a swap across every DragonSwap fee tier and print JSON.
    Quote {
        token_in: String,
        token_out: String,
        amount: String,

        /// Quote only this fee tier (100, 500, 1000, 3000, 10000).
        #[arg(long)]
        fee_tier: Option<u32>,

        /// Slippage tolerance for `min_amount_out`, in basis points.
        #[arg(long)]
        slippage_bps: Option<u32>,
    },

    /// Compare the direct pool with two-hop routes and print JSON.
    Route {
        token_in: String,
        token_out: String,
        amount: String,
    },

    /// Print resolved paths (useful for debugging).
    Paths,

    /// Print a quick self-diagnostic report.
    Doctor {
        /// Emit JSON to stdout (machine-readable).
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also ask the configured KAIA RPC for the latest block.
        #[arg(long, default_value_t = false)]
        check_rpc: bool,
    },
}

fn mcp_banner_enabled() -> bool {
    match std::env::var("DRAGONROUTE_BANNER") {
        Ok(v) => {
            let v = v.trim().to_ascii_lowercase();
            !(v.is_empty() || v == "0" || v == "false" || v == "no" || v == "off")
        }
        Err(_) => std::io::stderr().is_terminal(),
    }
}

fn init_logging(paths: &paths::DragonroutePaths) -> tracing_appender::non_blocking::WorkerGuard {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let file_name = paths
        .log_file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("dragonroute.log.jsonl");
    let file_appender = tracing_appender::rolling::never(&paths.data_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(env_filter.clone());
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

async fn run_quote(
    cfg: &DragonrouteConfig,
    token_in: &str,
    token_out: &str,
    amount: &str,
    fee_tier: Option<u32>,
    slippage_bps: Option<u32>,
) -> eyre::Result<serde_json::Value> {
    let fee = fee_tier.map(FeeTier::parse).transpose()?;
    let bps = swap::capped_slippage_bps(
        slippage_bps.unwrap_or(cfg.trade.default_slippage_bps),
        cfg.trade.max_slippage_bps,
    )?;

    let chain = KaiaChain::from_config(cfg);
    let tokens = TokenRegistry::new(&cfg.tokens, chain.clone());
    let sizer = price::trade_sizer(cfg).await;
    let engine = QuoteEngine::new(
        &chain,
        &tokens,
        &cfg.dragonswap.fee_tiers,
        cfg.dragonswap.wrapped_native,
        sizer.as_ref(),
    );

    let quotes = match fee {
        Some(fee) => vec![engine.quote_tier(token_in, token_out, amount, fee).await?],
        None => engine.get_quotes_for_all_tiers(token_in, token_out, amount).await?,
    };
    let best = route::select_best(&quotes).ok_or_else(|| eyre::eyre!("no quotes returned"))?;
    let min_out = swap::min_amount_out(alloy::primitives::U256::from(best.amount_out), bps)?;
    Ok(json!({
      "best": best.to_json(),
      "trade_size": engine.trade_size(&best.token_in, best.amount_in).as_str(),
      "slippage_bps": bps,
      "min_amount_out_base_units": min_out.to_string(),
      "quotes": quotes.iter().map(quote::Quote::to_json).collect::<Vec<_>>(),
    }))
}

async fn run_route(
    cfg: &DragonrouteConfig,
    token_in: &str,
    token_out: &str,
    amount: &str,
) -> eyre::Result<serde_json::Value> {
    let chain = KaiaChain::from_config(cfg);
    let tokens = TokenRegistry::new(&cfg.tokens, chain.clone());
    let sizer = price::trade_sizer(cfg).await;
    let engine = QuoteEngine::new(
        &chain,
        &tokens,
        &cfg.dragonswap.fee_tiers,
        cfg.dragonswap.wrapped_native,
        sizer.as_ref(),
    );
    let report = route::find_best_route(
        &engine,
        token_in,
        token_out,
        amount,
        &cfg.dragonswap.intermediates,
    )
    .await?;
    Ok(report.to_json())
}

fn load_config(paths: &paths::DragonroutePaths) -> eyre::Result<DragonrouteConfig> {
    store::ConfigStore::new(paths)
        .load_or_init_default()
        .context("load config")
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let paths = paths::DragonroutePaths::discover()?;
    paths.ensure_dirs()?;
    let _log_guard = init_logging(&paths);

    match cli.cmd {
        Command::Mcp => {
            let cfg = load_config(&paths)?;
            if mcp_banner_enabled() {
                cli_output::print_mcp_banner(
                    env!("CARGO_PKG_VERSION"),
                    cfg.network.chain_id,
                    &cfg.network.rpc_url,
                );
            }
            rpc::mcp_server::run(cfg).await.context("mcp server failed")
        }
        Command::Quote {
            token_in,
            token_out,
            amount,
            fee_tier,
            slippage_bps,
        } => {
            let cfg = load_config(&paths)?;
            let v = run_quote(&cfg, &token_in, &token_out, &amount, fee_tier, slippage_bps)
                .await
                .context("quote failed")?;
            cli_output::print_json(&v)
        }
        Command::Route {
            token_in,
            token_out,
            amount,
        } => {
            let cfg = load_config(&paths)?;
            let v = run_route(&cfg, &token_in, &token_out, &amount)
                .await
                .context("route failed")?;
            cli_output::print_json(&v)
        }
        Command::Paths => cli_output::print_json(&json!({
          "config_dir": paths.config_dir,
          "data_dir": paths.data_dir,
          "log_file": paths.log_file,
          "config_file": paths.config_file(),
        })),
        Command::Doctor { json, check_rpc } => doctor::run(json, check_rpc)
            .await
            .context("doctor failed"),
    }
}
