pub mod confirmation;
pub mod cooldown;
pub mod error;
pub mod faucet;
pub mod node_api;
pub mod session;
pub mod signer;
pub mod storage;
pub mod tick_clock;

#[cfg(feature = "cli")]
pub mod config;

#[cfg(feature = "cli")]
pub mod logger;

#[cfg(feature = "api_server")]
pub mod api;
