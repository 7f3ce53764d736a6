//! CLI configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level vocatest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocatestConfig {
    /// Owner id used when none is given on the command line.
    #[serde(default = "default_owner")]
    pub default_owner: i64,
    /// Run quizzes with per-question deadlines by default.
    #[serde(default)]
    pub timed: bool,
    /// How many high-priority words to list in the post-quiz review table.
    #[serde(default = "default_review_list_size")]
    pub review_list_size: usize,
}

fn default_owner() -> i64 {
    1
}
fn default_review_list_size() -> usize {
    10
}

impl Default for VocatestConfig {
    fn default() -> Self {
        Self {
            default_owner: default_owner(),
            timed: false,
            review_list_size: default_review_list_size(),
        }
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `vocatest.toml` in the current directory
/// 2. `~/.config/vocatest/config.toml`
///
/// Environment variable override: `VOCATEST_OWNER`.
pub fn load_config_from(path: Option<&Path>) -> Result<VocatestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("vocatest.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<VocatestConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => VocatestConfig::default(),
    };

    if let Ok(owner) = std::env::var("VOCATEST_OWNER") {
        config.default_owner = owner
            .parse()
            .with_context(|| format!("invalid VOCATEST_OWNER: {owner:?}"))?;
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("vocatest"))
}
