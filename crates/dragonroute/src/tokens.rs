use crate::{config::TokenEntry, errors::DragonrouteError};
use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::{
    collections::{BTreeMap, HashMap},
    str::FromStr as _,
    sync::Mutex,
};
use tracing::{debug, warn};

/// A fungible asset on KAIA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub symbol: String,
    /// Zero for native KAIA.
    pub address: Address,
    pub decimals: u8,
    pub native: bool,
}

impl Token {
    /// Address used for pool lookups: native KAIA trades through wrapped KAIA pools.
    pub const fn pool_address(&self, wrapped_native: Address) -> Address {
        if self.native {
            wrapped_native
        } else {
            self.address
        }
    }

    pub fn same_pool_token(&self, other: &Self, wrapped_native: Address) -> bool {
        self.pool_address(wrapped_native) == other.pool_address(wrapped_native)
    }

    pub fn to_json(&self) -> Value {
        json!({
          "symbol": self.symbol,
          "address": format!("{:#x}", self.address),
          "decimals": self.decimals,
          "native": self.native,
        })
    }
}

#[async_trait]
pub trait TokenDirectory: Send + Sync {
    /// Resolve a symbol or `0x` address. Unknown input fails with `UnknownToken`.
    async fn resolve(&self, symbol_or_address: &str) -> eyre::Result<Token>;
}

/// On-chain ERC-20 metadata reads for tokens outside the configured table.
#[async_trait]
pub trait DecimalsReader: Send + Sync {
    async fn erc20_decimals(&self, token: Address) -> eyre::Result<u8>;
}

pub fn is_address_like(s: &str) -> bool {
    s.len() == 42
        && (s.starts_with("0x") || s.starts_with("0X"))
        && s.bytes().skip(2).all(|b| b.is_ascii_hexdigit())
}

/// Configured token table plus a decimals cache for arbitrary ERC-20 addresses.
#[derive(Debug)]
pub struct TokenRegistry<R> {
    by_symbol: BTreeMap<String, Token>,
    aliases: HashMap<String, String>,
    by_address: HashMap<Address, String>,
    reader: R,
    decimals_cache: Mutex<HashMap<Address, u8>>,
}

impl<R: DecimalsReader> TokenRegistry<R> {
    pub fn new(table: &BTreeMap<String, TokenEntry>, reader: R) -> Self {
        let mut by_symbol = BTreeMap::new();
        let mut aliases = HashMap::new();
        let mut by_address = HashMap::new();
        for (symbol, entry) in table {
            let key = symbol.to_ascii_uppercase();
            for alias in &entry.aliases {
                aliases.insert(alias.to_ascii_uppercase(), key.clone());
            }
            if !entry.native {
                by_address.insert(entry.address, key.clone());
            }
            by_symbol.insert(
                key.clone(),
                Token {
                    symbol: key,
                    address: entry.address,
                    decimals: entry.decimals,
                    native: entry.native,
                },
            );
        }
        Self {
            by_symbol,
            aliases,
            by_address,
            reader,
            decimals_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn symbols(&self) -> Vec<String> {
        self.by_symbol.keys().cloned().collect()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.by_symbol.values()
    }

    pub fn aliases_of(&self, symbol: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == symbol)
            .map(|(alias, _)| alias.clone())
            .collect();
        out.sort();
        out
    }

    fn lookup_symbol(&self, s: &str) -> Option<&Token> {
        let key = s.trim().to_ascii_uppercase();
        self.by_symbol.get(&key).or_else(|| {
            self.aliases
                .get(&key)
                .and_then(|target| self.by_symbol.get(target))
        })
    }

    fn cached_decimals(&self, token: Address) -> Option<u8> {
        self.decimals_cache
            .lock()
            .ok()
            .and_then(|m| m.get(&token).copied())
    }

    fn remember_decimals(&self, token: Address, decimals: u8) {
        match self.decimals_cache.lock() {
            Ok(mut m) => {
                m.insert(token, decimals);
            }
            Err(e) => warn!(error = %e, "decimals cache poisoned"),
        }
    }

    fn unknown(&self, input: &str) -> eyre::Report {
        DragonrouteError::UnknownToken(format!(
            "{input} (supported: {})",
            self.symbols().join(", ")
        ))
        .into()
    }
}

#[async_trait]
impl<R: DecimalsReader> TokenDirectory for TokenRegistry<R> {
    async fn resolve(&self, symbol_or_address: &str) -> eyre::Result<Token> {
        let input = symbol_or_address.trim();
        if let Some(t) = self.lookup_symbol(input) {
            return Ok(t.clone());
        }
        if !is_address_like(input) {
            return Err(self.unknown(input));
        }

        let address = Address::from_str(input)
            .map_err(|_e| DragonrouteError::InvalidAddress(input.to_owned()))?;
        if let Some(sym) = self.by_address.get(&address) {
            if let Some(t) = self.by_symbol.get(sym) {
                return Ok(t.clone());
            }
        }
        if address.is_zero() {
            return Err(self.unknown(input));
        }

        let decimals = if let Some(d) = self.cached_decimals(address) {
            d
        } else {
            match self.reader.erc20_decimals(address).await {
                Ok(d) => {
                    debug!(token = %address, decimals = d, "resolved erc20 decimals");
                    self.remember_decimals(address, d);
                    d
                }
                Err(e) => {
                    warn!(token = %address, error = %e, "erc20 decimals lookup failed");
                    return Err(DragonrouteError::UnknownToken(format!(
                        "{input} (not an ERC-20 on this network)"
                    ))
                    .into());
                }
            }
        };

        Ok(Token {
            symbol: format!("{address:#x}"),
            address,
            decimals,
            native: false,
        })
    }
}

#[cfg(test)]
pub mod testing {
    //! Token directory backed by the default table with no chain access.

    use super::*;

    #[derive(Debug, Default)]
    pub struct OfflineReader;

    #[async_trait]
    impl DecimalsReader for OfflineReader {
        async fn erc20_decimals(&self, token: Address) -> eyre::Result<u8> {
            eyre::bail!("offline: cannot read decimals of {token:#x}")
        }
    }

    pub fn offline_registry() -> TokenRegistry<OfflineReader> {
        TokenRegistry::new(&crate::config::default_tokens(), OfflineReader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_tokens;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingReader {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DecimalsReader for CountingReader {
        async fn erc20_decimals(&self, _token: Address) -> eyre::Result<u8> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                eyre::bail!("execution reverted");
            }
            Ok(8)
        }
    }

    fn registry(fail: bool) -> TokenRegistry<CountingReader> {
        TokenRegistry::new(
            &default_tokens(),
            CountingReader {
                calls: AtomicUsize::new(0),
                fail,
            },
        )
    }

    fn is_unknown(r: &eyre::Result<Token>) -> bool {
        r.as_ref()
            .err()
            .and_then(|e| e.downcast_ref::<DragonrouteError>())
            .is_some_and(|e| matches!(e, DragonrouteError::UnknownToken(_)))
    }

    #[tokio::test]
    async fn symbols_and_aliases_resolve_case_insensitively() -> eyre::Result<()> {
        let reg = registry(false);
        let usdt = reg.resolve("usdt").await?;
        assert_eq!(usdt.decimals, 6, "usdt decimals");
        let official = reg.resolve("USDT_OFFICIAL").await?;
        assert_eq!(official, usdt, "alias maps to the same token");
        let st = reg.resolve("staked_kaia").await?;
        assert_eq!(st.symbol, "STKAIA", "canonical symbol");
        let kaia = reg.resolve("KAIA").await?;
        assert!(kaia.native, "KAIA is native");
        assert_eq!(reg.reader.calls.load(Ordering::SeqCst), 0, "no chain reads");
        Ok(())
    }

    #[tokio::test]
    async fn known_address_maps_back_to_symbol() -> eyre::Result<()> {
        let reg = registry(false);
        let t = reg
            .resolve("0x19AAC5F612F524B754CA7E7C41CBFA2E981A4432")
            .await?;
        assert_eq!(t.symbol, "WKAIA", "address lookup");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_address_reads_decimals_once() -> eyre::Result<()> {
        let reg = registry(false);
        let addr = "0x1111111111111111111111111111111111111111";
        let a = reg.resolve(addr).await?;
        let b = reg.resolve(addr).await?;
        assert_eq!(a.decimals, 8, "decimals from chain");
        assert_eq!(a, b, "cached result is identical");
        assert_eq!(reg.reader.calls.load(Ordering::SeqCst), 1, "cached after first read");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_inputs_fail_with_unknown_token() {
        let reg = registry(true);
        assert!(is_unknown(&reg.resolve("DOGE").await), "unknown symbol");
        assert!(
            is_unknown(&reg.resolve("0x2222222222222222222222222222222222222222").await),
            "address whose decimals cannot be read"
        );
        assert!(is_unknown(&reg.resolve("0x12").await), "short hex is not an address");
    }

    #[test]
    fn native_kaia_pools_through_wkaia() {
        let wkaia = Address::repeat_byte(0x19);
        let kaia = Token {
            symbol: "KAIA".into(),
            address: Address::ZERO,
            decimals: 18,
            native: true,
        };
        let wrapped = Token {
            symbol: "WKAIA".into(),
            address: wkaia,
            decimals: 18,
            native: false,
        };
        assert_eq!(kaia.pool_address(wkaia), wkaia, "native maps to wrapped");
        assert!(kaia.same_pool_token(&wrapped, wkaia), "same pool token");
    }
}
