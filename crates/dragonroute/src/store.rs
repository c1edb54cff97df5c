use crate::{config::DragonrouteConfig, paths::DragonroutePaths};
use eyre::Context as _;
use std::{fs, path::PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

/// Apply environment variable overrides to the config (endpoints, trade defaults).
fn apply_env_overrides(cfg: &mut DragonrouteConfig) {
    /// Helper: if an env var is set and non-empty, apply `setter` with the trimmed value.
    fn apply_env(var: &str, setter: impl FnOnce(&str)) {
        if let Ok(u) = std::env::var(var) {
            let t = u.trim();
            if !t.is_empty() {
                setter(t);
            }
        }
    }

    apply_env("KAIA_RPC_URL", |v| {
        v.clone_into(&mut cfg.network.rpc_url);
    });
    // The crate-specific name wins over the generic one.
    apply_env("DRAGONROUTE_RPC_URL", |v| {
        v.clone_into(&mut cfg.network.rpc_url);
    });
    apply_env("DRAGONROUTE_PRICE_API_URL", |v| {
        v.clone_into(&mut cfg.http.price_api_url);
    });
    apply_env("DRAGONROUTE_DEFAULT_SLIPPAGE_BPS", |v| match v.parse::<u32>() {
        Ok(n) => cfg.trade.default_slippage_bps = n,
        Err(e) => warn!(error = %e, value = v, "ignoring DRAGONROUTE_DEFAULT_SLIPPAGE_BPS"),
    });
}

impl ConfigStore {
    pub fn new(paths: &DragonroutePaths) -> Self {
        Self {
            path: paths.config_file(),
        }
    }

    pub fn load_or_init_default(&self) -> eyre::Result<DragonrouteConfig> {
        if !self.path.exists() {
            let cfg = DragonrouteConfig::default();
            self.save(&cfg)?;
            let mut effective = cfg;
            apply_env_overrides(&mut effective);
            effective.validate()?;
            return Ok(effective);
        }

        let s = fs::read_to_string(&self.path).context("read config.toml")?;
        let mut cfg: DragonrouteConfig = toml::from_str(&s).context("parse config.toml")?;
        apply_env_overrides(&mut cfg);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save(&self, cfg: &DragonrouteConfig) -> eyre::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(cfg).context("serialize config.toml")?;
        // Write-then-rename so a crash never leaves a truncated config behind.
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, s).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).context("write config.toml")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths_in(dir: &std::path::Path) -> DragonroutePaths {
        DragonroutePaths {
            config_dir: dir.join("config"),
            data_dir: dir.join("data"),
            log_file: dir.join("data").join("dragonroute.log.jsonl"),
        }
    }

    #[test]
    fn first_load_writes_defaults() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = paths_in(dir.path());
        let store = ConfigStore::new(&paths);
        let cfg = store.load_or_init_default()?;
        assert!(paths.config_file().exists(), "config.toml should be created");
        assert_eq!(cfg.dragonswap.fee_tiers.len(), 5, "default tiers");

        let again = store.load_or_init_default()?;
        assert_eq!(again.tokens, cfg.tokens, "reload matches");
        Ok(())
    }

    #[test]
    fn invalid_file_is_rejected() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = paths_in(dir.path());
        fs::create_dir_all(&paths.config_dir)?;
        fs::write(
            paths.config_file(),
            "[trade]\ndefault_slippage_bps = 9000\nmax_slippage_bps = 100\n",
        )?;
        let r = ConfigStore::new(&paths).load_or_init_default();
        assert!(r.is_err(), "default above max must fail validation");
        Ok(())
    }
}
