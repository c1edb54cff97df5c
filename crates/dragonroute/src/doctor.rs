use crate::{chains::kaia::KaiaChain, config::DragonrouteConfig, paths::DragonroutePaths};
use eyre::Context as _;
use serde_json::json;
use std::{fs, path::Path, path::PathBuf, time::Duration};

const RPC_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn try_parse_config(path: &Path) -> eyre::Result<DragonrouteConfig> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DragonrouteConfig = toml::from_str(&s).context("parse config.toml")?;
    cfg.validate()?;
    Ok(cfg)
}

struct ConfigReport {
    path: PathBuf,
    exists: bool,
    parse_ok: bool,
    error: Option<String>,
    rpc_url: String,
    fallback_rpc_count: usize,
    fee_tiers: Vec<u32>,
    token_count: usize,
    sizing: String,
}

struct RpcReport {
    reachable: bool,
    block_number: Option<u64>,
    error: Option<String>,
}

struct DoctorReport {
    version: &'static str,
    paths: DragonroutePaths,
    config: ConfigReport,
    rpc: Option<RpcReport>,
    env: serde_json::Value,
}

async fn probe_rpc(cfg: &DragonrouteConfig) -> RpcReport {
    let chain = KaiaChain::from_config(cfg);
    match tokio::time::timeout(RPC_PROBE_TIMEOUT, chain.block_number()).await {
        Ok(Ok(n)) => RpcReport {
            reachable: true,
            block_number: Some(n),
            error: None,
        },
        Ok(Err(e)) => RpcReport {
            reachable: false,
            block_number: None,
            error: Some(format!("{e:#}")),
        },
        Err(_elapsed) => RpcReport {
            reachable: false,
            block_number: None,
            error: Some("rpc probe timed out".to_owned()),
        },
    }
}

async fn collect(paths: &DragonroutePaths, check_rpc: bool) -> DoctorReport {
    let config_path = paths.config_file();
    let config_exists = config_path.exists();
    let (parse_ok, error, cfg) = if config_exists {
        match try_parse_config(&config_path) {
            Ok(cfg) => (true, None, cfg),
            Err(e) => (false, Some(format!("{e:#}")), DragonrouteConfig::default()),
        }
    } else {
        (false, None, DragonrouteConfig::default())
    };

    let rpc = if check_rpc {
        Some(probe_rpc(&cfg).await)
    } else {
        None
    };

    let env = json!({
      "DRAGONROUTE_CONFIG_DIR": env_opt("DRAGONROUTE_CONFIG_DIR"),
      "DRAGONROUTE_DATA_DIR": env_opt("DRAGONROUTE_DATA_DIR"),
      "DRAGONROUTE_RPC_URL": env_opt("DRAGONROUTE_RPC_URL"),
      "KAIA_RPC_URL": env_opt("KAIA_RPC_URL"),
      "DRAGONROUTE_PRICE_API_URL": env_opt("DRAGONROUTE_PRICE_API_URL"),
      "DRAGONROUTE_DEFAULT_SLIPPAGE_BPS": env_opt("DRAGONROUTE_DEFAULT_SLIPPAGE_BPS"),
      "RUST_LOG": env_opt("RUST_LOG"),
    });

    DoctorReport {
        version: env!("CARGO_PKG_VERSION"),
        paths: paths.clone(),
        config: ConfigReport {
            path: config_path,
            exists: config_exists,
            parse_ok,
            error,
            rpc_url: cfg.network.rpc_url.clone(),
            fallback_rpc_count: cfg.network.fallback_rpc_urls.len(),
            fee_tiers: cfg.dragonswap.fee_tiers.iter().map(|t| t.pips()).collect(),
            token_count: cfg.tokens.len(),
            sizing: format!("{:?}", cfg.trade.sizing).to_lowercase(),
        },
        rpc,
        env,
    }
}

fn print_json(out: &mut impl std::io::Write, r: &DoctorReport) -> eyre::Result<()> {
    let s = serde_json::to_string_pretty(&json!({
      "ok": true,
      "version": r.version,
      "paths": {
        "config_dir": r.paths.config_dir,
        "data_dir": r.paths.data_dir,
        "log_file": r.paths.log_file,
      },
      "config": {
        "path": r.config.path,
        "exists": r.config.exists,
        "parse_ok": r.config.parse_ok,
        "error": r.config.error,
        "rpc_url": r.config.rpc_url,
        "fallback_rpc_count": r.config.fallback_rpc_count,
        "fee_tiers": r.config.fee_tiers,
        "token_count": r.config.token_count,
        "sizing": r.config.sizing,
      },
      "rpc": r.rpc.as_ref().map(|p| json!({
        "reachable": p.reachable,
        "block_number": p.block_number,
        "error": p.error,
      })),
      "env": r.env,
      "hints": [
        "Point your MCP client at: dragonroute mcp",
        "Run with --check-rpc to confirm the KAIA endpoint answers.",
      ]
    }))
    .context("serialize doctor json")?;
    writeln!(out, "{s}").context("write doctor json")?;
    Ok(())
}

fn print_human(out: &mut impl std::io::Write, r: &DoctorReport) -> eyre::Result<()> {
    writeln!(out, "dragonroute doctor (v{})", r.version).context("write header")?;
    writeln!(out).context("write newline")?;

    writeln!(out, "Paths:").context("write paths header")?;
    writeln!(out, "  config_dir: {}", r.paths.config_dir.display()).context("write paths")?;
    writeln!(out, "  data_dir:   {}", r.paths.data_dir.display()).context("write paths")?;
    writeln!(out, "  log_file:   {}", r.paths.log_file.display()).context("write paths")?;
    writeln!(out).context("write newline")?;

    writeln!(out, "Config:").context("write config header")?;
    writeln!(out, "  config.toml: {}", r.config.path.display()).context("write config")?;
    if !r.config.exists {
        writeln!(out, "  status: missing (defaults are written on first run)")
            .context("write config")?;
    } else if r.config.parse_ok {
        writeln!(out, "  status: ok").context("write config")?;
    } else {
        writeln!(out, "  status: invalid").context("write config")?;
        if let Some(e) = &r.config.error {
            let first = e.lines().next().unwrap_or("parse error");
            writeln!(out, "  error: {first}").context("write config")?;
        }
    }
    writeln!(out, "  rpc_url: {}", r.config.rpc_url).context("write config")?;
    writeln!(out, "  fee_tiers: {:?}", r.config.fee_tiers).context("write config")?;
    writeln!(out, "  tokens: {}", r.config.token_count).context("write config")?;
    writeln!(out, "  sizing: {}", r.config.sizing).context("write config")?;
    writeln!(out).context("write newline")?;

    if let Some(p) = &r.rpc {
        writeln!(out, "RPC:").context("write rpc header")?;
        writeln!(out, "  reachable: {}", p.reachable).context("write rpc")?;
        if let Some(n) = p.block_number {
            writeln!(out, "  block_number: {n}").context("write rpc")?;
        }
        if let Some(e) = &p.error {
            writeln!(out, "  error: {e}").context("write rpc")?;
        }
        writeln!(out).context("write newline")?;
    }

    writeln!(out, "Env:").context("write env header")?;
    if let Some(env) = r.env.as_object() {
        for (k, v) in env {
            writeln!(out, "  {k}: {:?}", v.as_str()).context("write env")?;
        }
    }
    Ok(())
}

pub async fn run(as_json: bool, check_rpc: bool) -> eyre::Result<()> {
    let paths = DragonroutePaths::discover()?;
    let report = collect(&paths, check_rpc).await;
    let mut out = std::io::stdout().lock();
    if as_json {
        print_json(&mut out, &report)?;
    } else {
        print_human(&mut out, &report)?;
    }
    Ok(())
}
