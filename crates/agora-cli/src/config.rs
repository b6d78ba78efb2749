//! Market Configuration
//!
//! Layered configuration for the `agora` binary. Sources, lowest priority
//! first: built-in defaults, then either the `--config` file or
//! `config/default` + `config/local`, then `AGORA__*` environment variables.
//! Command-line flags are applied on top by `main`.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use agora_agents::{BuyerConfig, DEFAULT_MAX_DISCOUNT};
use serde::{Deserialize, Serialize};

/// Phase timeout applied when no source sets one; an explicit `0` disables it
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(10);

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgoraConfig {
    /// Sellers and their starting catalogues
    #[serde(default)]
    pub market: MarketConfig,

    /// Settings shared by every buyer; each buyer gets its own target
    #[serde(default)]
    pub buyer: BuyerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default)]
    pub sellers: Vec<SellerConfig>,

    /// Base seed for discount draws; seller `i` uses `seed + i`
    #[serde(default)]
    pub seed: Option<u64>,

    /// Exclusive upper bound of a random discount, in percent
    #[serde(default = "default_max_discount")]
    pub max_discount: u32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            sellers: Vec::new(),
            seed: None,
            max_discount: default_max_discount(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerConfig {
    pub name: String,

    /// Title -> price
    #[serde(default)]
    pub books: BTreeMap<String, u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// =============================================================================
// Default Functions
// =============================================================================

fn default_max_discount() -> u32 {
    DEFAULT_MAX_DISCOUNT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl AgoraConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::load_from(Path::new("."), config_path)
    }

    /// Load with `config/default` and `config/local` looked up under `base`.
    ///
    /// An explicit `config_path` replaces those two files rather than sitting
    /// underneath them.
    pub fn load_from(base: &Path, config_path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder().set_default(
            "buyer.negotiation.phase_timeout",
            DEFAULT_PHASE_TIMEOUT.as_secs_f64(),
        )?;

        builder = match config_path {
            Some(path) => builder.add_source(config::File::with_name(path)),
            None => {
                let default = base.join("config").join("default");
                let local = base.join("config").join("local");
                builder
                    .add_source(
                        config::File::with_name(&default.to_string_lossy()).required(false),
                    )
                    .add_source(config::File::with_name(&local.to_string_lossy()).required(false))
            }
        };

        builder = builder.add_source(
            config::Environment::with_prefix("AGORA")
                .separator("__")
                .try_parsing(true),
        );

        let config: AgoraConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Reject settings the agents cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        self.buyer.tick_interval()?;

        let mut names = std::collections::HashSet::new();
        for seller in &self.market.sellers {
            if seller.name.trim().is_empty() {
                anyhow::bail!("seller name must not be empty");
            }
            if !names.insert(seller.name.as_str()) {
                anyhow::bail!("seller '{}' is configured twice", seller.name);
            }
            if let Some((title, _)) = seller.books.iter().find(|(_, price)| **price == 0) {
                anyhow::bail!("seller '{}' lists '{}' with a zero price", seller.name, title);
            }
        }
        Ok(())
    }
}
