use crate::fees::{FeeTier, DRAGONSWAP_FEE_TIERS};
use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const KAIA_MAINNET_CHAIN_ID: u64 = 8217;
pub const KAIA_MAINNET_RPC_URL: &str = "https://public-en.node.kaia.io";
pub const KAIA_EXPLORER_URL: &str = "https://www.kaiascan.io";
pub const KILOLEND_PRICE_API_URL: &str =
    "https://kvxdikvk5b.execute-api.ap-southeast-1.amazonaws.com/prod/prices";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub chain_id: u64,
    /// Primary KAIA JSON-RPC endpoint.
    pub rpc_url: String,
    /// Tried in order after `rpc_url` fails.
    pub fallback_rpc_urls: Vec<String>,
    pub explorer_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: KAIA_MAINNET_CHAIN_ID,
            rpc_url: KAIA_MAINNET_RPC_URL.into(),
            fallback_rpc_urls: vec![],
            explorer_url: KAIA_EXPLORER_URL.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DexConfig {
    pub router: Address,
    pub factory: Address,
    /// Listed for clients; quotes are computed from pool state, not the quoter.
    pub quoter_v2: Address,
    /// Wrapped KAIA. Native KAIA legs are routed through this token's pools.
    pub wrapped_native: Address,
    /// Fee tiers to search, in hundredths of a basis point.
    pub fee_tiers: Vec<FeeTier>,
    /// Symbols tried as the middle token of two-hop routes.
    pub intermediates: Vec<String>,
}

impl Default for DexConfig {
    fn default() -> Self {
        Self {
            router: address!("0xA324880f884036E3d21a09B90269E1aC57c7EC8a"),
            factory: address!("0x7431A23897ecA6913D5c81666345D39F27d946A4"),
            quoter_v2: address!("0x673d88960D320909af24db6eE7665aF223fec060"),
            wrapped_native: address!("0x19aac5f612f524b754ca7e7c41cbfa2e981a4432"),
            fee_tiers: DRAGONSWAP_FEE_TIERS.to_vec(),
            intermediates: vec!["USDT".into(), "KAIA".into(), "WKAIA".into()],
        }
    }
}

/// How trade size is judged when ordering the fee-tier search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TradeSizing {
    /// Treat one token unit as one USD.
    #[default]
    Units,
    /// Value the input with the price API; unpriced tokens fall back to units.
    Usd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    pub default_slippage_bps: u32,
    /// Upper bound accepted from tool callers.
    pub max_slippage_bps: u32,
    pub default_deadline_minutes: u64,
    pub max_deadline_minutes: u64,
    pub sizing: TradeSizing,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            default_slippage_bps: 50,
            max_slippage_bps: 5_000,
            default_deadline_minutes: 20,
            max_deadline_minutes: 60,
            sizing: TradeSizing::Units,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Token price endpoint (`{success, data: [{symbol, price}]}`). Only used for USD sizing.
    pub price_api_url: String,
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            price_api_url: KILOLEND_PRICE_API_URL.into(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub address: Address,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// The chain's gas token. Its address is the zero sentinel.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub native: bool,
}

impl TokenEntry {
    fn erc20(address: Address, decimals: u8, aliases: &[&str]) -> Self {
        Self {
            address,
            decimals,
            aliases: aliases.iter().map(|a| (*a).to_owned()).collect(),
            native: false,
        }
    }
}

pub fn default_tokens() -> BTreeMap<String, TokenEntry> {
    let mut m = BTreeMap::new();
    m.insert(
        "KAIA".to_owned(),
        TokenEntry {
            address: Address::ZERO,
            decimals: 18,
            aliases: vec![],
            native: true,
        },
    );
    m.insert(
        "WKAIA".to_owned(),
        TokenEntry::erc20(
            address!("0x19aac5f612f524b754ca7e7c41cbfa2e981a4432"),
            18,
            &["WKAI"],
        ),
    );
    m.insert(
        "USDT".to_owned(),
        TokenEntry::erc20(
            address!("0xd077a400968890eacc75cdc901f0356c943e4fdb"),
            6,
            &["USDT_OFFICIAL"],
        ),
    );
    m.insert(
        "USDT_WORMHOLE".to_owned(),
        TokenEntry::erc20(address!("0x5c13e303a62fc5dedf5b52d66873f2e59fedadc2"), 6, &[]),
    );
    m.insert(
        "BORA".to_owned(),
        TokenEntry::erc20(address!("0x02cbE46fB8A1F579254a9B485788f2D86Cad51aa"), 18, &[]),
    );
    m.insert(
        "SIX".to_owned(),
        TokenEntry::erc20(address!("0xEf82b1C6A550e730D8283E1eDD4977cd01FAF435"), 18, &[]),
    );
    m.insert(
        "MBX".to_owned(),
        TokenEntry::erc20(
            address!("0xD068c52d81f4409B9502dA926aCE3301cc41f623"),
            18,
            &["MARBLEX"],
        ),
    );
    m.insert(
        "STKAIA".to_owned(),
        TokenEntry::erc20(
            address!("0x42952B873ed6f7f0A7E4992E2a9818E3A9001995"),
            18,
            &["STAKED_KAIA"],
        ),
    );
    m.insert(
        "RKLAY".to_owned(),
        TokenEntry::erc20(address!("0xf898c138f9c8825cef83ca75535ed77100497296"), 18, &[]),
    );
    m.insert(
        "WETH".to_owned(),
        TokenEntry::erc20(
            address!("0x98A8345bB9D3DDa9D808Ca1c9142a28F6b0430E1"),
            18,
            &["ETH"],
        ),
    );
    m.insert(
        "BTCB".to_owned(),
        TokenEntry::erc20(address!("0x15D9f3AB1982B0e5a415451259994Ff40369f584"), 18, &[]),
    );
    m
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DragonrouteConfig {
    pub network: NetworkConfig,
    pub dragonswap: DexConfig,
    pub trade: TradeConfig,
    pub http: HttpConfig,
    pub tokens: BTreeMap<String, TokenEntry>,
}

impl Default for DragonrouteConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            dragonswap: DexConfig::default(),
            trade: TradeConfig::default(),
            http: HttpConfig::default(),
            tokens: default_tokens(),
        }
    }
}

impl DragonrouteConfig {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.network.rpc_url.trim().is_empty() {
            eyre::bail!("config invalid: network.rpc_url is empty");
        }
        if self.dragonswap.fee_tiers.is_empty() {
            eyre::bail!("config invalid: dragonswap.fee_tiers is empty");
        }
        for tier in &self.dragonswap.fee_tiers {
            FeeTier::parse(tier.pips())
                .map_err(|e| eyre::eyre!("config invalid: dragonswap.fee_tiers: {e}"))?;
        }
        if self.trade.max_slippage_bps > 10_000 {
            eyre::bail!(
                "config invalid: trade.max_slippage_bps ({}) must be <= 10000",
                self.trade.max_slippage_bps
            );
        }
        if self.trade.default_slippage_bps > self.trade.max_slippage_bps {
            eyre::bail!(
                "config invalid: trade.default_slippage_bps ({}) must be <= max_slippage_bps ({})",
                self.trade.default_slippage_bps,
                self.trade.max_slippage_bps
            );
        }
        if self.trade.default_deadline_minutes == 0
            || self.trade.default_deadline_minutes > self.trade.max_deadline_minutes
        {
            eyre::bail!(
                "config invalid: trade.default_deadline_minutes must be in 1..={}",
                self.trade.max_deadline_minutes
            );
        }
        for (symbol, entry) in &self.tokens {
            if entry.native != entry.address.is_zero() {
                eyre::bail!(
                    "config invalid: token {symbol}: only the native token may use the zero address"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_round_trip_through_toml() -> eyre::Result<()> {
        let cfg = DragonrouteConfig::default();
        cfg.validate()?;
        let s = toml::to_string_pretty(&cfg)?;
        let back: DragonrouteConfig = toml::from_str(&s)?;
        assert_eq!(back.tokens, cfg.tokens, "token table survives toml");
        assert_eq!(
            back.dragonswap.fee_tiers, cfg.dragonswap.fee_tiers,
            "fee tiers survive toml"
        );
        assert_eq!(back.dragonswap.router, cfg.dragonswap.router, "router");
        Ok(())
    }

    #[test]
    fn partial_config_fills_defaults() -> eyre::Result<()> {
        let cfg: DragonrouteConfig = toml::from_str(
            r#"
[network]
rpc_url = "http://127.0.0.1:8551"

[trade]
default_slippage_bps = 100
"#,
        )?;
        assert_eq!(cfg.network.rpc_url, "http://127.0.0.1:8551", "override kept");
        assert_eq!(cfg.network.chain_id, KAIA_MAINNET_CHAIN_ID, "chain id default");
        assert_eq!(cfg.trade.default_slippage_bps, 100, "slippage override");
        assert_eq!(cfg.trade.max_deadline_minutes, 60, "deadline default");
        assert!(cfg.tokens.contains_key("USDT"), "token table default");
        Ok(())
    }

    #[test]
    fn validate_rejects_unknown_fee_tier() -> eyre::Result<()> {
        let mut cfg = DragonrouteConfig::default();
        cfg.dragonswap.fee_tiers = vec![crate::fees::LOW];
        assert!(cfg.validate().is_ok(), "single known tier is fine");

        let mut bad: DragonrouteConfig = toml::from_str("[dragonswap]\nfee_tiers = [2500]\n")?;
        assert!(bad.validate().is_err(), "2500 is not deployed");
        bad.dragonswap.fee_tiers.clear();
        assert!(bad.validate().is_err(), "empty tier list");
        Ok(())
    }

    #[test]
    fn validate_rejects_default_slippage_over_max() {
        let mut cfg = DragonrouteConfig::default();
        cfg.trade.default_slippage_bps = 6_000;
        assert!(cfg.validate().is_err(), "default above max");
    }
}
