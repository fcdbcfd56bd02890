//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the instruction
//! lifecycle. Configuration includes the chain RPC endpoint, governance
//! program identifiers, and timing settings for debouncing and slot polling.

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use std::str::FromStr;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all lifecycle settings.
///
/// This structure holds configuration for:
/// - Chain connection details (RPC endpoint, governance program, realm)
/// - Builder timing settings (debounce window, validation timeout)
/// - Execution controller timing settings (slot poll interval)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chain configuration (where proposals live and instructions execute)
    pub chain: ChainConfig,
    /// Instruction builder configuration (timing settings)
    pub builder: BuilderConfig,
    /// Execution controller configuration (timing settings)
    pub executor: ExecutorConfig,
}

/// Configuration for the chain connection.
///
/// Contains everything needed to talk to the chain and address the
/// governance program that owns the proposals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Human-readable name for the chain
    pub name: String,
    /// RPC endpoint URL for chain communication
    pub rpc_url: String,
    /// Governance program ID (base58)
    pub program_id: String,
    /// Realm account the proposals belong to (base58)
    pub realm_id: String,
}

/// Instruction builder timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Debounce window for derivation/validation after field edits, in
    /// milliseconds. Sub-second so typing feedback stays responsive.
    pub debounce_ms: u64,
    /// Timeout for validation and metadata lookups in milliseconds
    pub validation_timeout_ms: u64,
}

/// Execution controller timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Interval between chain slot polls while the execution window is open,
    /// in milliseconds
    pub slot_poll_interval_ms: u64,
}

// ============================================================================
// CONFIGURATION LOADING AND MANAGEMENT
// ============================================================================

impl Config {
    /// Validates the configuration.
    ///
    /// This function ensures that:
    /// - The RPC URL is non-empty
    /// - Program and realm IDs are valid base58 public keys
    /// - Timing intervals are non-zero
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Configuration is valid
    /// - `Err(anyhow::Error)` - A field is missing or malformed
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chain.rpc_url.is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration error: chain.rpc_url must not be empty"
            ));
        }

        Pubkey::from_str(&self.chain.program_id).map_err(|_| {
            anyhow::anyhow!(
                "Configuration error: chain.program_id '{}' is not a valid base58 public key",
                self.chain.program_id
            )
        })?;

        Pubkey::from_str(&self.chain.realm_id).map_err(|_| {
            anyhow::anyhow!(
                "Configuration error: chain.realm_id '{}' is not a valid base58 public key",
                self.chain.realm_id
            )
        })?;

        if self.builder.debounce_ms == 0 {
            return Err(anyhow::anyhow!(
                "Configuration error: builder.debounce_ms must be non-zero"
            ));
        }

        if self.executor.slot_poll_interval_ms == 0 {
            return Err(anyhow::anyhow!(
                "Configuration error: executor.slot_poll_interval_ms must be non-zero"
            ));
        }

        Ok(())
    }

    /// Loads configuration from the TOML file.
    ///
    /// This function:
    /// 1. Checks if config/instructions.toml exists (path overridable via
    ///    the PROPOSAL_INSTRUCTIONS_CONFIG_PATH environment variable)
    /// 2. If it exists, loads and parses the configuration
    /// 3. Validates the configuration
    /// 4. If it doesn't exist, returns an error asking user to copy template
    ///
    /// # Returns
    ///
    /// - `Ok(Config)` - Successfully loaded and validated configuration
    /// - `Err(anyhow::Error)` - Failed to load configuration, file doesn't exist, or validation failed
    pub fn load() -> anyhow::Result<Self> {
        // Check for custom config path via environment variable (for tests)
        let config_path = std::env::var("PROPOSAL_INSTRUCTIONS_CONFIG_PATH")
            .unwrap_or_else(|_| "config/instructions.toml".to_string());

        if std::path::Path::new(&config_path).exists() {
            // Load existing configuration
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            // Validate configuration
            config.validate()?;
            Ok(config)
        } else {
            // Configuration file doesn't exist - user needs to copy template
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/instructions.template.toml config/instructions.toml\n\
                Then edit config/instructions.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Creates a default configuration with placeholder values.
    ///
    /// This configuration is suitable for local development and testing.
    /// For production use, the RPC URL, program ID and realm ID must be
    /// replaced with actual values.
    pub fn default() -> Self {
        Self {
            chain: ChainConfig {
                name: "Localnet".to_string(),
                rpc_url: "http://127.0.0.1:8899".to_string(),
                program_id: "GovER5Lthms3bLBqWub97yVrMmEogzX7xNjdXpPPCVZw".to_string(),
                realm_id: "11111111111111111111111111111111".to_string(),
            },
            builder: BuilderConfig {
                debounce_ms: 500,
                validation_timeout_ms: 30000,
            },
            executor: ExecutorConfig {
                slot_poll_interval_ms: 5000,
            },
        }
    }
}
