//! Network and fee configuration
//!
//! Everything that differs between networks lives here and is passed in
//! explicitly: the bech32 hrp and chain alias used for address strings, the
//! chain and fee asset ids, and the fee schedule.

use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{
        constants::LATEST_CODEC,
        types::{AssetId, ChainId},
    },
    encoding::Serialization,
    errors::{WalletError, WalletResult},
};

/// Per-byte, per-signature and fixed components of the fee formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Cost of each serialized transaction byte
    pub tx_bytes_gas: u64,
    pub cost_per_signature: u64,
    pub fixed_fee: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            tx_bytes_gas: 1,
            cost_per_signature: 1000,
            fixed_fee: 10000,
        }
    }
}

impl FeeConfig {
    pub fn with_tx_bytes_gas(mut self, tx_bytes_gas: u64) -> Self {
        self.tx_bytes_gas = tx_bytes_gas;
        self
    }

    pub fn with_cost_per_signature(mut self, cost_per_signature: u64) -> Self {
        self.cost_per_signature = cost_per_signature;
        self
    }

    pub fn with_fixed_fee(mut self, fixed_fee: u64) -> Self {
        self.fixed_fee = fixed_fee;
        self
    }
}

/// Identity and fee settings of the network transactions are built for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_id: u32,
    /// Human readable part of bech32 addresses
    pub hrp: String,
    /// Chain prefix of address strings, e.g. `X` or `P`
    pub chain_alias: String,
    pub blockchain_id: ChainId,
    pub fee_asset_id: AssetId,
    /// Flat fee burned by a base transaction
    pub tx_fee: u64,
    pub codec_version: u16,
    #[serde(default)]
    pub fees: FeeConfig,
}

impl Default for NetworkConfig {
    /// Local test network
    fn default() -> Self {
        Self {
            network_id: 12345,
            hrp: "local".to_string(),
            chain_alias: "X".to_string(),
            blockchain_id: ChainId::zero(),
            fee_asset_id: AssetId::zero(),
            tx_fee: 1_000_000,
            codec_version: LATEST_CODEC,
            fees: FeeConfig::default(),
        }
    }
}

impl NetworkConfig {
    pub fn new(network_id: u32, hrp: impl Into<String>, chain_alias: impl Into<String>) -> Self {
        Self {
            network_id,
            hrp: hrp.into(),
            chain_alias: chain_alias.into(),
            ..Default::default()
        }
    }

    pub fn with_blockchain_id(mut self, blockchain_id: ChainId) -> Self {
        self.blockchain_id = blockchain_id;
        self
    }

    pub fn with_fee_asset_id(mut self, fee_asset_id: AssetId) -> Self {
        self.fee_asset_id = fee_asset_id;
        self
    }

    pub fn with_tx_fee(mut self, tx_fee: u64) -> Self {
        self.tx_fee = tx_fee;
        self
    }

    pub fn with_fees(mut self, fees: FeeConfig) -> Self {
        self.fees = fees;
        self
    }

    /// Codec context for this network's address strings
    pub fn serialization(&self) -> Serialization {
        Serialization::new(self.hrp.clone(), self.chain_alias.clone())
    }

    pub fn validate(&self) -> WalletResult<()> {
        if self.hrp.is_empty() {
            return Err(WalletError::ConfigurationError("hrp must not be empty".into()));
        }
        if self.chain_alias.is_empty() {
            return Err(WalletError::ConfigurationError(
                "chain alias must not be empty".into(),
            ));
        }
        if self.codec_version != LATEST_CODEC {
            return Err(WalletError::ConfigurationError(format!(
                "unsupported codec version {}",
                self.codec_version
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> WalletResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> WalletResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
