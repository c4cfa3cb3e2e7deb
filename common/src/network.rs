use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Devnet => "devnet",
        }
    }

    // Parse a network name coming from an external request
    pub fn parse_field(field: &str, value: &str) -> Result<Self, ValidationError> {
        value
            .parse()
            .map_err(|_| ValidationError::UnknownNetwork {
                field: field.to_owned(),
                value: value.to_owned(),
            })
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::Mainnet
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "devnet" | "dev" => Ok(Self::Devnet),
            _ => Err("Invalid network"),
        }
    }
}
