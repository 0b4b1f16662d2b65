//! Relayer configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use sigrelay_governance::{
    Contracts, EligibilityParams, Governor, TokenContract, DEFAULT_SAFETY_MARGIN_BLOCKS,
};
use sigrelay_store::DEFAULT_DELEGATION_WINDOW_SECS;
use sigrelay_types::{parse_u256, Address, GovernorKind, U256};
use sigrelay_utils::LogFormat;

use crate::NodeError;

/// Configuration for a relayer process.
///
/// Can be loaded from a TOML file via [`RelayerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so
/// an empty file describes a mainnet COMP / Governor Alpha relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayerConfig {
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Webhook prefix; the notification text is appended and fetched with GET.
    #[serde(default)]
    pub notification_hook: Option<String>,

    #[serde(default = "default_map_size")]
    pub lmdb_map_size: usize,

    #[serde(default)]
    pub chain: ChainSection,

    #[serde(default)]
    pub token: TokenSection,

    #[serde(default)]
    pub governor: GovernorSection,

    #[serde(default)]
    pub eligibility: EligibilitySection,

    #[serde(default)]
    pub relay: RelaySection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainSection {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Bound on every chain and ledger read, in seconds.
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenSection {
    #[serde(default = "default_token_address")]
    pub address: Address,

    /// EIP-712 domain name.
    #[serde(default = "default_token_name")]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GovernorSection {
    #[serde(default = "default_governor_address")]
    pub address: Address,

    #[serde(default = "default_governor_kind")]
    pub kind: GovernorKind,

    /// EIP-712 domain name.
    #[serde(default = "default_governor_name")]
    pub name: String,

    /// EIP-712 domain version; only read for versioned governors.
    #[serde(default)]
    pub version: Option<String>,
}

/// Thresholds are decimal or `0x` strings of base units, since TOML
/// integers stop at 2^63.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EligibilitySection {
    #[serde(default = "default_one_token")]
    pub min_delegation_balance: String,

    #[serde(default = "default_one_token")]
    pub min_vote_weight: String,

    #[serde(default = "default_safety_margin")]
    pub safety_margin_blocks: u64,

    #[serde(default = "default_delegation_window")]
    pub delegation_window_secs: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayModeSetting {
    #[default]
    Deferred,
    Synchronous,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelaySection {
    #[serde(default)]
    pub mode: RelayModeSetting,

    /// Relay service URL; required in synchronous mode.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_relay_timeout")]
    pub timeout_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./sigrelay_data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_map_size() -> usize {
    1 << 30
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_chain_id() -> u64 {
    1
}

fn default_upstream_timeout() -> u64 {
    10
}

fn default_token_address() -> Address {
    Address::new([
        0xc0, 0x0e, 0x94, 0xcb, 0x66, 0x2c, 0x35, 0x20, 0x28, 0x2e, 0x6f, 0x57, 0x17, 0x21, 0x40,
        0x04, 0xa7, 0xf2, 0x68, 0x88,
    ])
}

fn default_token_name() -> String {
    "Compound".to_string()
}

fn default_governor_address() -> Address {
    Address::new([
        0xc0, 0xda, 0x01, 0xa0, 0x4c, 0x3f, 0x3e, 0x0b, 0xe4, 0x33, 0x60, 0x60, 0x45, 0xbb, 0x70,
        0x17, 0xa7, 0x32, 0x3e, 0x38,
    ])
}

fn default_governor_kind() -> GovernorKind {
    GovernorKind::Alpha
}

fn default_governor_name() -> String {
    "Compound Governor Alpha".to_string()
}

fn default_one_token() -> String {
    "1000000000000000000".to_string()
}

fn default_safety_margin() -> u64 {
    DEFAULT_SAFETY_MARGIN_BLOCKS
}

fn default_delegation_window() -> u64 {
    DEFAULT_DELEGATION_WINDOW_SECS
}

fn default_relay_timeout() -> u64 {
    30
}

impl Default for ChainSection {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            chain_id: default_chain_id(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl Default for TokenSection {
    fn default() -> Self {
        Self {
            address: default_token_address(),
            name: default_token_name(),
        }
    }
}

impl Default for GovernorSection {
    fn default() -> Self {
        Self {
            address: default_governor_address(),
            kind: default_governor_kind(),
            name: default_governor_name(),
            version: None,
        }
    }
}

impl Default for EligibilitySection {
    fn default() -> Self {
        Self {
            min_delegation_balance: default_one_token(),
            min_vote_weight: default_one_token(),
            safety_margin_blocks: default_safety_margin(),
            delegation_window_secs: default_delegation_window(),
        }
    }
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            mode: RelayModeSetting::Deferred,
            endpoint: None,
            timeout_secs: default_relay_timeout(),
        }
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl RelayerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.eligibility_params()?;
        if self.relay.mode == RelayModeSetting::Synchronous
            && self.relay.endpoint.as_deref().map_or(true, str::is_empty)
        {
            return Err(NodeError::Config(
                "relay.mode = \"synchronous\" requires relay.endpoint".into(),
            ));
        }
        if self.chain.timeout_secs == 0 {
            return Err(NodeError::Config("chain.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.timeout_secs)
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_secs(self.relay.timeout_secs)
    }

    pub fn eligibility_params(&self) -> Result<EligibilityParams, NodeError> {
        Ok(EligibilityParams {
            min_delegation_balance: threshold(
                "eligibility.min_delegation_balance",
                &self.eligibility.min_delegation_balance,
            )?,
            min_vote_weight: threshold(
                "eligibility.min_vote_weight",
                &self.eligibility.min_vote_weight,
            )?,
            safety_margin_blocks: self.eligibility.safety_margin_blocks,
            upstream_timeout: self.upstream_timeout(),
        })
    }

    pub fn contracts(&self) -> Contracts {
        Contracts::new(
            TokenContract::new(self.token.name.clone(), self.chain.chain_id, self.token.address),
            Governor::new(
                self.governor.kind,
                self.governor.name.clone(),
                self.governor.version.clone(),
                self.chain.chain_id,
                self.governor.address,
            ),
        )
    }
}

fn threshold(field: &'static str, raw: &str) -> Result<U256, NodeError> {
    parse_u256(field, Some(raw)).map_err(|e| NodeError::Config(e.to_string()))
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            notification_hook: None,
            lmdb_map_size: default_map_size(),
            chain: ChainSection::default(),
            token: TokenSection::default(),
            governor: GovernorSection::default(),
            eligibility: EligibilitySection::default(),
            relay: RelaySection::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigrelay_governance::ONE_TOKEN;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = RelayerConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = RelayerConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = RelayerConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.port, 8080);
        assert_eq!(config.governor.kind, GovernorKind::Alpha);
        assert_eq!(config.relay.mode, RelayModeSetting::Deferred);
        let params = config.eligibility_params().unwrap();
        assert_eq!(params.min_delegation_balance, ONE_TOKEN);
        assert_eq!(params.safety_margin_blocks, 5);
        assert_eq!(config.eligibility.delegation_window_secs, 604_800);
    }

    #[test]
    fn default_contracts_are_mainnet_compound() {
        let contracts = RelayerConfig::default().contracts();
        assert_eq!(
            contracts.token.address.to_string().to_lowercase(),
            "0xc00e94cb662c3520282e6f5717214004a7f26888"
        );
        assert_eq!(
            contracts.governor.address.to_string().to_lowercase(),
            "0xc0da01a04c3f3e0be433606045bb7017a7323e38"
        );
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            port = 9999
            log_format = "json"

            [governor]
            kind = "charlie"
            name = "Example Governor"
            version = "2"
            address = "0x00000000000000000000000000000000000000cc"

            [eligibility]
            min_vote_weight = "0x10"

            [relay]
            mode = "synchronous"
            endpoint = "http://relay.local/submit"
        "#;
        let config = RelayerConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.port, 9999);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.governor.kind, GovernorKind::Charlie);
        assert_eq!(config.eligibility_params().unwrap().min_vote_weight, U256::from(16u64));
        assert!(config.validate().is_ok());
        assert_eq!(
            config.contracts().governor.domain.version.as_deref(),
            Some("2")
        );
    }

    #[test]
    fn synchronous_mode_requires_an_endpoint() {
        let mut config = RelayerConfig::default();
        config.relay.mode = RelayModeSetting::Synchronous;
        assert!(matches!(config.validate(), Err(NodeError::Config(_))));
    }

    #[test]
    fn bad_threshold_is_a_config_error() {
        let mut config = RelayerConfig::default();
        config.eligibility.min_vote_weight = "lots".into();
        assert!(matches!(config.eligibility_params(), Err(NodeError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = RelayerConfig::from_toml_file("/nonexistent/sigrelay.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sigrelay.toml");
        std::fs::write(&path, "port = 7000\n").unwrap();
        assert_eq!(RelayerConfig::from_toml_file(&path).unwrap().port, 7000);
    }
}
