use directories::ProjectDirs;
use eyre::{Context as _, ContextCompat as _};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DragonroutePaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
}

impl DragonroutePaths {
    pub fn discover() -> eyre::Result<Self> {
        // Test/CI override knobs.
        if let (Ok(data_dir), Ok(config_dir)) = (
            std::env::var("DRAGONROUTE_DATA_DIR"),
            std::env::var("DRAGONROUTE_CONFIG_DIR"),
        ) {
            let data_dir = PathBuf::from(data_dir);
            let config_dir = PathBuf::from(config_dir);
            let log_file = data_dir.join("dragonroute.log.jsonl");
            return Ok(Self {
                config_dir,
                data_dir,
                log_file,
            });
        }

        // macOS: ~/Library/Application Support/dragonroute
        // Linux: ~/.config/dragonroute
        // Windows: %APPDATA%\\dragonroute
        let proj =
            ProjectDirs::from("", "", "dragonroute").context("failed to resolve project dirs")?;
        let config_dir = proj.config_dir().to_path_buf();
        let data_dir = proj.data_dir().to_path_buf();
        let log_file = data_dir.join("dragonroute.log.jsonl");

        Ok(Self {
            config_dir,
            data_dir,
            log_file,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn ensure_dirs(&self) -> eyre::Result<()> {
        std::fs::create_dir_all(&self.config_dir)
            .with_context(|| format!("create dir {}", self.config_dir.display()))?;
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("create dir {}", self.data_dir.display()))?;
        Ok(())
    }
}
