use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use thiserror::Error;
use tickwire_common::{
    api::decode_base64_field,
    config::{DEFAULT_COOLDOWN_SECONDS, DEFAULT_TICK_OFFSET, VERSION},
    network::Network,
};

use crate::{
    logger::{default_logs_datetime_format, LogLevel, ModuleConfig},
    node_api::{parse_base_url, NodeApiConfig},
};

// node address by default when no specified
pub const DEFAULT_NODE_ADDRESS: &str = "http://127.0.0.1:8000";
pub const DEFAULT_FAUCET_BIND_ADDRESS: &str = "127.0.0.1:8090";
pub const DEFAULT_FAUCET_LEDGER_PATH: &str = "faucet-ledger/";
pub const DEFAULT_FAUCET_AMOUNT: i64 = 1_000;
pub const DEFAULT_FAUCET_THREADS: usize = 2;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Tick offset must be at least 1")]
    InvalidTickOffset,

    #[error("Invalid URL for '{field}': {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("'{field}' must be greater than zero")]
    ZeroValue { field: &'static str },
}

// Functions Helpers
fn default_node_address() -> String {
    DEFAULT_NODE_ADDRESS.to_owned()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_connection_timeout_secs() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

fn default_tick_offset() -> u32 {
    DEFAULT_TICK_OFFSET
}

fn default_faucet_bind_address() -> String {
    DEFAULT_FAUCET_BIND_ADDRESS.to_owned()
}

fn default_faucet_ledger_path() -> String {
    DEFAULT_FAUCET_LEDGER_PATH.to_owned()
}

fn default_faucet_amount() -> i64 {
    DEFAULT_FAUCET_AMOUNT
}

fn default_cooldown_seconds() -> u64 {
    DEFAULT_COOLDOWN_SECONDS
}

fn default_faucet_threads() -> usize {
    DEFAULT_FAUCET_THREADS
}

fn default_log_filename() -> String {
    String::from("tickwire-wallet.log")
}

fn default_logs_path() -> String {
    String::from("logs/")
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct LogConfig {
    /// Set log level
    #[clap(long, value_enum, default_value_t)]
    #[serde(default)]
    pub log_level: LogLevel,
    /// Set file log level
    /// By default, it will be the same as log level
    #[clap(long, value_enum)]
    pub file_log_level: Option<LogLevel>,
    /// Disable the log file
    #[clap(long)]
    #[serde(default)]
    pub disable_file_logging: bool,
    /// Disable the log filename date based
    /// If disabled, the log file will be named tickwire-wallet.log instead of YYYY-MM-DD.tickwire-wallet.log
    #[clap(long)]
    #[serde(default)]
    pub disable_file_log_date_based: bool,
    /// Disable the usage of colors in log
    #[clap(long)]
    #[serde(default)]
    pub disable_log_color: bool,
    /// Log filename
    ///
    /// File will be stored in logs directory, this is only the filename, not the full path.
    #[clap(long, default_value_t = default_log_filename())]
    #[serde(default = "default_log_filename")]
    pub filename_log: String,
    /// Logs directory
    ///
    /// By default it will be logs/ of the current directory.
    #[clap(long, default_value_t = default_logs_path())]
    #[serde(default = "default_logs_path")]
    pub logs_path: String,
    /// Module configuration for logs, as module=level
    #[clap(long)]
    #[serde(default)]
    pub logs_modules: Vec<ModuleConfig>,
    /// Change the datetime format used by the logger
    #[clap(long, default_value_t = default_logs_datetime_format())]
    #[serde(default = "default_logs_datetime_format")]
    pub datetime_format: String,
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Node address to use
    #[clap(long, default_value_t = default_node_address())]
    #[serde(default = "default_node_address")]
    pub node_address: String,
    /// Network selected
    #[clap(long, default_value_t = Network::Testnet)]
    #[serde(default)]
    pub network: Network,
    /// Request timeout in seconds
    #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds
    #[clap(long, default_value_t = DEFAULT_CONNECTION_TIMEOUT_SECS)]
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
}

impl NetworkConfig {
    pub fn node_api_config(&self) -> NodeApiConfig {
        NodeApiConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connection_timeout: Duration::from_secs(self.connection_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct TickConfig {
    /// Ticks added to the current tick to get the target tick of a transaction
    #[clap(long, default_value_t = DEFAULT_TICK_OFFSET)]
    #[serde(default = "default_tick_offset")]
    pub tick_offset: u32,
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Signing service address
    /// Required by every command that sends a transaction
    #[clap(long)]
    pub signer_url: Option<String>,
    /// Identity whose key the signing service signs with
    #[clap(long)]
    pub source_identity: Option<String>,
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct FaucetConfig {
    /// Faucet server bind address
    #[clap(long, default_value_t = default_faucet_bind_address())]
    #[serde(default = "default_faucet_bind_address")]
    pub faucet_bind_address: String,
    /// Directory of the durable claim ledger
    #[clap(long, default_value_t = default_faucet_ledger_path())]
    #[serde(default = "default_faucet_ledger_path")]
    pub faucet_ledger_path: String,
    /// Amount sent by each claim
    #[clap(long, default_value_t = DEFAULT_FAUCET_AMOUNT)]
    #[serde(default = "default_faucet_amount")]
    pub faucet_amount: i64,
    /// Minimum seconds between two claims of the same address
    #[clap(long, default_value_t = DEFAULT_COOLDOWN_SECONDS)]
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
    /// Number of threads to use for the faucet server
    #[clap(long, default_value_t = DEFAULT_FAUCET_THREADS)]
    #[serde(default = "default_faucet_threads")]
    pub faucet_threads: usize,
}

// Text encoding of a binary command line argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DataEncoding {
    #[default]
    Hex,
    Base64,
}

impl DataEncoding {
    pub fn decode(&self, data: &str) -> anyhow::Result<Vec<u8>> {
        let data = data.trim();
        match self {
            Self::Hex => hex::decode(data).context("Invalid hex data"),
            Self::Base64 => Ok(decode_base64_field("data", data)?),
        }
    }
}

impl fmt::Display for DataEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex => f.write_str("hex"),
            Self::Base64 => f.write_str("base64"),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the current network tick and the target tick a transaction would use
    Tick,
    /// Send an amount to an identity
    Transfer {
        /// Destination identity
        destination: String,
        /// Amount, as an integer
        amount: String,
    },
    /// Call a contract procedure described by a schema file
    Invoke {
        /// Contract schema file (JSON)
        schema: String,
        /// Procedure name or index
        procedure: String,
        /// Parameters as a JSON object
        #[clap(long, default_value = "{}")]
        params: String,
        /// Amount to attach, defaults to the procedure fee
        #[clap(long)]
        amount: Option<String>,
    },
    /// Query a contract function described by a schema file
    Query {
        /// Contract schema file (JSON)
        schema: String,
        /// Function name or index
        function: String,
        /// Parameters as a JSON object
        #[clap(long, default_value = "{}")]
        params: String,
    },
    /// Query a contract function with raw input bytes
    QueryRaw {
        contract_index: u32,
        input_type: u16,
        /// Input bytes as hex
        #[clap(long, default_value = "")]
        data: String,
    },
    /// Decode response bytes offline
    Decode {
        /// Response bytes as hex
        data: String,
        /// Contract schema file, decodes by heuristic when absent
        #[clap(long, requires = "function")]
        schema: Option<String>,
        /// Function whose outputs describe the bytes
        #[clap(long, requires = "schema")]
        function: Option<String>,
    },
    /// Read the header of a transaction buffer
    Inspect {
        data: String,
        /// Encoding of the buffer
        #[clap(long, value_enum, default_value_t = DataEncoding::Hex)]
        encoding: DataEncoding,
    },
    /// Serve faucet claims over HTTP
    FaucetServer,
}

#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[clap(
    version = VERSION,
    about = "Tickwire wallet - build, confirm and broadcast tick-bound transactions"
)]
pub struct Config {
    /// Log configuration
    #[clap(flatten)]
    pub log: LogConfig,
    /// Network Configuration
    #[clap(flatten)]
    pub network: NetworkConfig,
    /// Tick configuration
    #[clap(flatten)]
    pub tick: TickConfig,
    /// Signer configuration
    #[clap(flatten)]
    pub signer: SignerConfig,
    /// Faucet configuration
    #[clap(flatten)]
    pub faucet: FaucetConfig,
    /// Approve transactions without asking
    #[clap(long, short)]
    #[serde(skip)]
    #[serde(default)]
    pub yes: bool,
    /// JSON File to load the configuration from
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub config_file: Option<String>,
    /// Generate the template at the `config_file` path
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub generate_config_template: bool,
    #[clap(subcommand)]
    #[serde(skip)]
    #[serde(default)]
    pub command: Option<Command>,
}

fn check_url(field: &'static str, address: &str) -> Result<(), ConfigError> {
    parse_base_url(address)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUrl {
            field,
            reason: e.to_string(),
        })
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick.tick_offset == 0 {
            return Err(ConfigError::InvalidTickOffset);
        }

        check_url("node_address", &self.network.node_address)?;
        if let Some(url) = &self.signer.signer_url {
            check_url("signer_url", url)?;
        }

        if self.network.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroValue {
                field: "request_timeout_secs",
            });
        }
        if self.network.connection_timeout_secs == 0 {
            return Err(ConfigError::ZeroValue {
                field: "connection_timeout_secs",
            });
        }
        if self.faucet.cooldown_seconds == 0 {
            return Err(ConfigError::ZeroValue {
                field: "cooldown_seconds",
            });
        }
        if self.faucet.faucet_amount <= 0 {
            return Err(ConfigError::ZeroValue {
                field: "faucet_amount",
            });
        }
        if self.faucet.faucet_threads == 0 {
            return Err(ConfigError::ZeroValue {
                field: "faucet_threads",
            });
        }
        Ok(())
    }
}
