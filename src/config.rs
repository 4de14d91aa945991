//! Layered configuration for launchpad.
//!
//! Settings come from `.launchpad/launchpad.toml`, then `LAUNCHPAD_*`
//! environment variables (a project `.env` is loaded first), then CLI flags.
//!
//! ```toml
//! [project]
//! name = "hackathon-portal"
//!
//! [network]
//! name = "sepolia"
//! chain_id = 11155111
//! rpc_url = "http://127.0.0.1:8545"
//!
//! [storage]
//! upload_url = "http://localhost:3000/api/nft/upload"
//! timeout_secs = 60
//!
//! [commitment]
//! mode = "local"        # or "remote" with `url`
//!
//! [deployment]
//! confirmations = 5
//! poll_interval_ms = 2000
//! receipt_timeout_secs = 600
//! bytecode_path = "contracts/CampaignNFT.bin"
//!
//! [verification]
//! enabled = true
//! url = "http://localhost:3000/api/nft/verify"
//!
//! [store]
//! backend = "file"      # or "http" with `url`
//! dir = ".launchpad/campaigns"
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::steps::{DeploymentPolicy, NetworkTarget};

pub const CONFIG_DIR: &str = ".launchpad";
pub const CONFIG_FILE: &str = "launchpad.toml";

pub const ENV_RPC_URL: &str = "LAUNCHPAD_RPC_URL";
pub const ENV_STORE_URL: &str = "LAUNCHPAD_STORE_URL";
pub const ENV_UPLOAD_URL: &str = "LAUNCHPAD_UPLOAD_URL";
pub const ENV_VERIFY_URL: &str = "LAUNCHPAD_VERIFY_URL";

/// Chain ids of the networks the CLI knows by name.
pub fn known_chain_id(network: &str) -> Option<u64> {
    match network {
        "mainnet" | "ethereum" => Some(1),
        "sepolia" => Some(11_155_111),
        "holesky" => Some(17_000),
        "polygon" => Some(137),
        "amoy" => Some(80_002),
        "base" => Some(8_453),
        "base-sepolia" => Some(84_532),
        "localhost" | "anvil" | "hardhat" => Some(31_337),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSection {
    #[serde(default = "default_network_name")]
    pub name: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
}

fn default_network_name() -> String {
    "sepolia".to_string()
}

fn default_chain_id() -> u64 {
    11_155_111
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            name: default_network_name(),
            chain_id: default_chain_id(),
            rpc_url: default_rpc_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    /// Timeout for every HTTP collaborator call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_upload_url() -> String {
    "http://localhost:3000/api/nft/upload".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            upload_url: default_upload_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentMode {
    /// Merkle root computed in-process from the campaign allowlist.
    #[default]
    Local,
    /// Delegated to the portal's commitment endpoint.
    Remote,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitmentSection {
    #[serde(default)]
    pub mode: CommitmentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSection {
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    /// Hex creation bytecode of the collection contract, relative to the
    /// project directory.
    #[serde(default = "default_bytecode_path")]
    pub bytecode_path: PathBuf,
}

fn default_confirmations() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_receipt_timeout_secs() -> u64 {
    600
}

fn default_bytecode_path() -> PathBuf {
    PathBuf::from("contracts/CampaignNFT.bin")
}

impl Default for DeploymentSection {
    fn default() -> Self {
        Self {
            confirmations: default_confirmations(),
            poll_interval_ms: default_poll_interval_ms(),
            receipt_timeout_secs: default_receipt_timeout_secs(),
            bytecode_path: default_bytecode_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_verify_url")]
    pub url: String,
}

fn default_true() -> bool {
    true
}

fn default_verify_url() -> String {
    "http://localhost:3000/api/nft/verify".to_string()
}

impl Default for VerificationSection {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_verify_url(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON documents on local disk.
    #[default]
    File,
    /// The portal's campaign document endpoints.
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".launchpad/campaigns")
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            dir: default_store_dir(),
            url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// The complete launchpad.toml structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchToml {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub commitment: CommitmentSection,
    #[serde(default)]
    pub deployment: DeploymentSection,
    #[serde(default)]
    pub verification: VerificationSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl LaunchToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse launchpad.toml")
    }

    /// Load `.launchpad/launchpad.toml`, or defaults if it does not exist.
    pub fn load_or_default(launch_dir: &Path) -> Result<Self> {
        let config_path = launch_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize launchpad.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply `LAUNCHPAD_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = value(ENV_RPC_URL) {
            self.network.rpc_url = url;
        }
        if let Some(url) = value(ENV_STORE_URL) {
            self.store.url = Some(url);
        }
        if let Some(url) = value(ENV_UPLOAD_URL) {
            self.storage.upload_url = url;
        }
        if let Some(url) = value(ENV_VERIFY_URL) {
            self.verification.url = url;
        }
    }

    /// Human-readable problems with the configuration. Empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(expected) = known_chain_id(&self.network.name)
            && expected != self.network.chain_id
        {
            warnings.push(format!(
                "network '{}' has chain id {} but chain_id is set to {}",
                self.network.name, expected, self.network.chain_id
            ));
        }

        check_url(&mut warnings, "network.rpc_url", &self.network.rpc_url);
        check_url(&mut warnings, "storage.upload_url", &self.storage.upload_url);
        if self.verification.enabled {
            check_url(&mut warnings, "verification.url", &self.verification.url);
        }

        match (self.commitment.mode, &self.commitment.url) {
            (CommitmentMode::Remote, None) => {
                warnings.push("commitment.mode is 'remote' but commitment.url is not set".to_string())
            }
            (CommitmentMode::Remote, Some(url)) => check_url(&mut warnings, "commitment.url", url),
            (CommitmentMode::Local, _) => {}
        }

        match (self.store.backend, &self.store.url) {
            (StoreBackend::Http, None) => warnings.push(format!(
                "store.backend is 'http' but store.url is not set (or {ENV_STORE_URL})"
            )),
            (StoreBackend::Http, Some(url)) => check_url(&mut warnings, "store.url", url),
            (StoreBackend::File, _) => {}
        }

        if self.deployment.confirmations == 0 {
            warnings.push(
                "deployment.confirmations is 0; explorer verification may miss fresh contracts"
                    .to_string(),
            );
        }
        if self.deployment.poll_interval_ms == 0 {
            warnings.push("deployment.poll_interval_ms must be greater than 0".to_string());
        }
        if self.storage.timeout_secs == 0 {
            warnings.push("storage.timeout_secs must be greater than 0".to_string());
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            warnings.push(format!("Invalid logging.level '{}'", self.logging.level));
        }

        warnings
    }
}

fn check_url(warnings: &mut Vec<String>, field: &str, url: &str) {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        warnings.push(format!("{field} '{url}' is not an http(s) URL"));
    }
}

/// Resolved configuration: launchpad.toml + environment + CLI flags.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub project_dir: PathBuf,
    pub launch_dir: PathBuf,
    pub toml: LaunchToml,
    pub verbose: bool,
}

impl LaunchConfig {
    /// Load from `project_dir`, reading overrides from the process
    /// environment.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        Self::with_env(project_dir, |key| std::env::var(key).ok())
    }

    pub fn with_env<F>(project_dir: PathBuf, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let launch_dir = project_dir.join(CONFIG_DIR);
        let mut toml = LaunchToml::load_or_default(&launch_dir)?;
        toml.apply_env_overrides(lookup);

        Ok(Self {
            project_dir,
            launch_dir,
            toml,
            verbose: false,
        })
    }

    /// Apply CLI overrides.
    pub fn with_cli_args(mut self, verbose: bool, network: Option<&str>) -> Self {
        self.verbose = verbose;
        if let Some(name) = network {
            self.toml.network.name = name.to_string();
            if let Some(chain_id) = known_chain_id(name) {
                self.toml.network.chain_id = chain_id;
            }
        }
        self
    }

    pub fn config_file(&self) -> PathBuf {
        self.launch_dir.join(CONFIG_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.launch_dir.join("logs")
    }

    pub fn store_dir(&self) -> PathBuf {
        self.resolve(&self.toml.store.dir)
    }

    pub fn bytecode_path(&self) -> PathBuf {
        self.resolve(&self.toml.deployment.bytecode_path)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.toml.storage.timeout_secs.max(1))
    }

    pub fn network_target(&self) -> NetworkTarget {
        NetworkTarget {
            name: self.toml.network.name.clone(),
            chain_id: self.toml.network.chain_id,
        }
    }

    pub fn deployment_policy(&self) -> DeploymentPolicy {
        DeploymentPolicy {
            confirmations: self.toml.deployment.confirmations,
            poll_interval: Duration::from_millis(self.toml.deployment.poll_interval_ms.max(1)),
            receipt_timeout: Duration::from_secs(self.toml.deployment.receipt_timeout_secs),
        }
    }

    /// Log level after `--verbose`.
    pub fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.toml.logging.level
        }
    }

    /// File-level warnings plus checks that need the project directory.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        let bytecode = self.bytecode_path();
        if !bytecode.exists() {
            warnings.push(format!(
                "deployment.bytecode_path {} does not exist",
                bytecode.display()
            ));
        }
        warnings
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}
