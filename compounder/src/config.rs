use std::{fmt, path::Path, str::FromStr, time::Duration};

use grape::{Address, PrivateKeySigner};
use thiserror::Error;
use url::Url;

pub const PRIVATE_KEY: &str = "PRIVATE_KEY";
pub const COMPOUND_AT_NODES: &str = "COMPOUND_AT_NODES";
pub const COMPOUND_BUFFER_GRAPES: &str = "COMPOUND_BUFFER_GRAPES";
pub const CONTRACT_ADDRESS: &str = "CONTRACT_ADDRESS";
pub const RPC_URL: &str = "RPC_URL";
pub const GRAPE_NODE_COST: &str = "GRAPE_NODE_COST";
pub const COMPOUND_INTERVAL: &str = "COMPOUND_INTERVAL";

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0xd77b0756be406a6a78d47285edd59234d781d568";
pub const DEFAULT_RPC_URL: &str = "https://api.avax.network/ext/bc/C/rpc";
pub const DEFAULT_COMPOUND_AT_NODES: u32 = 1;
pub const DEFAULT_BUFFER_GRAPES: f64 = 0.0;
pub const DEFAULT_NODE_COST: f64 = 50.0;
pub const DEFAULT_COMPOUND_INTERVAL: f64 = 10.0;

const MAX_BUFFER_GRAPES: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Value for '{0}' not supplied.")]
    Missing(&'static str),
    #[error("{name} is not set to a valid integer: '{value}'")]
    InvalidInteger { name: &'static str, value: String },
    #[error("{name} is not set to a valid number: '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} is not set to a valid address: '{value}'")]
    InvalidAddress { name: &'static str, value: String },
    #[error("{name} is not set to a valid url: '{value}'")]
    InvalidUrl { name: &'static str, value: String },
    #[error("Incorrect configuration value set for '{0}'")]
    Incorrect(&'static str),
    #[error("Could not derive a wallet address from '{name}': {reason}")]
    Derivation { name: &'static str, reason: String },
}

impl ConfigError {
    #[cfg(test)]
    fn setting(&self) -> &'static str {
        match self {
            ConfigError::Missing(name) | ConfigError::Incorrect(name) => name,
            ConfigError::InvalidInteger { name, .. }
            | ConfigError::InvalidNumber { name, .. }
            | ConfigError::InvalidAddress { name, .. }
            | ConfigError::InvalidUrl { name, .. }
            | ConfigError::Derivation { name, .. } => name,
        }
    }
}

/// Everything the compounder needs, read once at startup.
#[derive(Clone)]
pub struct Settings {
    pub signer: PrivateKeySigner,
    pub wallet: Address,
    pub compound_at_nodes: u32,
    pub buffer_grapes: f64,
    pub contract: Address,
    pub rpc_url: Url,
    pub node_cost: f64,
    pub compound_interval: f64,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("wallet", &self.wallet)
            .field("compound_at_nodes", &self.compound_at_nodes)
            .field("buffer_grapes", &self.buffer_grapes)
            .field("contract", &self.contract)
            .field("rpc_url", &self.rpc_url)
            .field("node_cost", &self.node_cost)
            .field("compound_interval", &self.compound_interval)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, Vec<ConfigError>> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads every setting through `lookup`. All problems are collected, so a
    /// failed load reports each bad setting, in declaration order.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Vec<ConfigError>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = EnvReader::new(lookup);

        let signer = env.private_key();

        let compound_at_nodes = env.integer(COMPOUND_AT_NODES, DEFAULT_COMPOUND_AT_NODES);
        let compound_at_nodes = env.check(COMPOUND_AT_NODES, compound_at_nodes, |n| *n >= 1);

        let buffer_grapes = env.number(COMPOUND_BUFFER_GRAPES, DEFAULT_BUFFER_GRAPES);
        let buffer_grapes = env.check(COMPOUND_BUFFER_GRAPES, buffer_grapes, |v| {
            *v >= 0.0 && *v < MAX_BUFFER_GRAPES
        });

        let contract = env.string(CONTRACT_ADDRESS, Some(DEFAULT_CONTRACT_ADDRESS));
        let contract = contract.and_then(|raw| env.address(CONTRACT_ADDRESS, &raw));

        let rpc_url = env.string(RPC_URL, Some(DEFAULT_RPC_URL));
        let rpc_url = rpc_url.and_then(|raw| env.url(RPC_URL, &raw));

        let node_cost = env.number(GRAPE_NODE_COST, DEFAULT_NODE_COST);
        let node_cost = env.check(GRAPE_NODE_COST, node_cost, |v| *v > 0.0);

        let compound_interval = env.number(COMPOUND_INTERVAL, DEFAULT_COMPOUND_INTERVAL);
        let compound_interval = env.check(COMPOUND_INTERVAL, compound_interval, |v| {
            Duration::try_from_secs_f64(*v).is_ok()
        });

        match (signer, compound_at_nodes, buffer_grapes, contract, rpc_url, node_cost, compound_interval) {
            (
                Some(signer),
                Some(compound_at_nodes),
                Some(buffer_grapes),
                Some(contract),
                Some(rpc_url),
                Some(node_cost),
                Some(compound_interval),
            ) if env.errors.is_empty() => Ok(Settings {
                wallet: signer.address(),
                signer,
                compound_at_nodes,
                buffer_grapes,
                contract,
                rpc_url,
                node_cost,
                compound_interval,
            }),
            _ => Err(env.errors),
        }
    }

    /// Minimum reward balance, in grapes, before a compound is attempted.
    pub fn threshold(&self) -> f64 {
        self.node_cost * f64::from(self.compound_at_nodes) + self.buffer_grapes
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.compound_interval)
    }
}

/// Reads only `PRIVATE_KEY`, ignoring every other setting.
pub fn signer_from_env() -> Result<PrivateKeySigner, Vec<ConfigError>> {
    signer_from_lookup(|name| std::env::var(name).ok())
}

pub fn signer_from_lookup<F>(lookup: F) -> Result<PrivateKeySigner, Vec<ConfigError>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = EnvReader::new(lookup);
    env.private_key().ok_or(env.errors)
}

/// Loads `path` (or `.env` in the working directory) into the process
/// environment. Variables that are already set are left alone.
pub fn load_env_file(path: Option<&Path>) -> Result<(), dotenv::Error> {
    match path {
        Some(path) => dotenv::from_path(path),
        None => match dotenv::dotenv() {
            Ok(_) => Ok(()),
            Err(e) if e.not_found() => Ok(()),
            Err(e) => Err(e),
        },
    }
}

fn is_private_key(key: &str) -> bool {
    key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit())
}

struct EnvReader<F> {
    lookup: F,
    errors: Vec<ConfigError>,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn new(lookup: F) -> Self {
        Self { lookup, errors: Vec::new() }
    }

    // Blank values count as unset, so `KEY=` in a .env file means "use the default".
    fn read(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    fn private_key(&mut self) -> Option<PrivateKeySigner> {
        let key = self.string(PRIVATE_KEY, None);
        let key = self.check(PRIVATE_KEY, key, |key| is_private_key(key))?;
        self.signer(PRIVATE_KEY, &key)
    }

    fn string(&mut self, name: &'static str, default: Option<&str>) -> Option<String> {
        match (self.read(name), default) {
            (Some(value), _) => Some(value),
            (None, Some(default)) => Some(default.to_string()),
            (None, None) => {
                self.errors.push(ConfigError::Missing(name));
                None
            }
        }
    }

    fn integer<T: FromStr>(&mut self, name: &'static str, default: T) -> Option<T> {
        let Some(value) = self.read(name) else {
            return Some(default);
        };
        match value.trim().parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.errors.push(ConfigError::InvalidInteger { name, value });
                None
            }
        }
    }

    fn number(&mut self, name: &'static str, default: f64) -> Option<f64> {
        let Some(value) = self.read(name) else {
            return Some(default);
        };
        match value.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Some(parsed),
            _ => {
                self.errors.push(ConfigError::InvalidNumber { name, value });
                None
            }
        }
    }

    fn address(&mut self, name: &'static str, value: &str) -> Option<Address> {
        match Address::from_str(value.trim()) {
            Ok(address) => Some(address),
            Err(_) => {
                self.errors.push(ConfigError::InvalidAddress { name, value: value.to_string() });
                None
            }
        }
    }

    fn url(&mut self, name: &'static str, value: &str) -> Option<Url> {
        match Url::parse(value.trim()) {
            Ok(url) => Some(url),
            Err(_) => {
                self.errors.push(ConfigError::InvalidUrl { name, value: value.to_string() });
                None
            }
        }
    }

    fn signer(&mut self, name: &'static str, key: &str) -> Option<PrivateKeySigner> {
        match PrivateKeySigner::from_str(key) {
            Ok(signer) => Some(signer),
            Err(e) => {
                self.errors.push(ConfigError::Derivation { name, reason: e.to_string() });
                None
            }
        }
    }

    fn check<T>(&mut self, name: &'static str, value: Option<T>, valid: impl Fn(&T) -> bool) -> Option<T> {
        let value = value?;
        if valid(&value) {
            Some(value)
        } else {
            self.errors.push(ConfigError::Incorrect(name));
            None
        }
    }
}
