use crate::{fees::FeeTier, price_math};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Snapshot of one DragonSwap V3 pool. Read-only; never mutated after the fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub address: Address,
    /// Canonical order: `token0 < token1`.
    pub token0: Address,
    pub token1: Address,
    pub fee: FeeTier,
    pub liquidity: u128,
    pub sqrt_price_x96: U256,
    pub tick: i32,
}

impl PoolState {
    /// A pool with no liquidity or no initialized price cannot be quoted against.
    pub fn is_quotable(&self) -> bool {
        self.liquidity > 0 && !self.sqrt_price_x96.is_zero()
    }

    pub fn is_token0(&self, token: Address) -> bool {
        self.token0 == token
    }

    pub fn to_json(&self, decimals0: u8, decimals1: u8) -> Value {
        let price0 = price_math::sqrt_price_x96_to_price(self.sqrt_price_x96, decimals0, decimals1);
        json!({
          "address": format!("{:#x}", self.address),
          "token0": format!("{:#x}", self.token0),
          "token1": format!("{:#x}", self.token1),
          "fee_tier": self.fee.pips(),
          "fee_percent": self.fee.percent(),
          "fee_name": self.fee.name(),
          "tick_spacing": self.fee.tick_spacing(),
          "liquidity": self.liquidity.to_string(),
          "liquidity_level": LiquidityLevel::of(self.liquidity).as_str(),
          "sqrt_price_x96": self.sqrt_price_x96.to_string(),
          "tick": self.tick,
          "token0_price_in_token1": price0,
          "token1_price_in_token0": price_math::ratio(1.0_f64, price0),
        })
    }
}

/// Coarse bucket of raw pool liquidity for human display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidityLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl LiquidityLevel {
    pub const fn of(liquidity: u128) -> Self {
        match liquidity {
            0..1_000_000 => Self::VeryLow,
            1_000_000..10_000_000 => Self::Low,
            10_000_000..100_000_000 => Self::Moderate,
            100_000_000..1_000_000_000 => Self::High,
            _ => Self::VeryHigh,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very low",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::VeryHigh => "very high",
        }
    }
}

/// Source of pool snapshots, keyed by (tokenA, tokenB, fee) in either token order.
#[async_trait]
pub trait PoolDirectory: Send + Sync {
    /// `Ok(None)` when no pool is deployed for the triple.
    async fn get_pool(
        &self,
        token_a: Address,
        token_b: Address,
        fee: FeeTier,
    ) -> eyre::Result<Option<PoolState>>;
}

#[cfg(test)]
pub mod testing {
    //! In-memory pool directory for unit tests.

    use super::*;
    use std::collections::HashMap;

    /// Sort two addresses the way the factory does.
    pub fn sort_tokens(a: Address, b: Address) -> (Address, Address) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    #[derive(Debug, Default)]
    pub struct StaticPools {
        pools: HashMap<(Address, Address, u32), PoolState>,
        failing: Vec<u32>,
    }

    impl StaticPools {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a pool priced at `price` (token0 in token1, human units).
        pub fn with_pool(
            mut self,
            a: Address,
            b: Address,
            fee: FeeTier,
            liquidity: u128,
            price: f64,
            decimals: (u8, u8),
        ) -> Self {
            let (token0, token1) = sort_tokens(a, b);
            let (decimals0, decimals1) = if a == token0 {
                decimals
            } else {
                (decimals.1, decimals.0)
            };
            let pool = PoolState {
                address: Address::with_last_byte(u8::try_from(self.pools.len() + 1).unwrap_or(0xff)),
                token0,
                token1,
                fee,
                liquidity,
                sqrt_price_x96: crate::price_math::sqrt_price_x96_for(price, decimals0, decimals1),
                tick: 0,
            };
            self.pools.insert((token0, token1, fee.pips()), pool);
            self
        }

        /// Make lookups for this fee tier fail like a flaky RPC.
        pub fn failing_tier(mut self, fee: FeeTier) -> Self {
            self.failing.push(fee.pips());
            self
        }
    }

    #[async_trait]
    impl PoolDirectory for StaticPools {
        async fn get_pool(
            &self,
            token_a: Address,
            token_b: Address,
            fee: FeeTier,
        ) -> eyre::Result<Option<PoolState>> {
            if self.failing.contains(&fee.pips()) {
                eyre::bail!("rpc timeout");
            }
            let (t0, t1) = sort_tokens(token_a, token_b);
            Ok(self.pools.get(&(t0, t1, fee.pips())).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liquidity_level_buckets() {
        assert_eq!(LiquidityLevel::of(0), LiquidityLevel::VeryLow, "0");
        assert_eq!(LiquidityLevel::of(999_999), LiquidityLevel::VeryLow, "below 1e6");
        assert_eq!(LiquidityLevel::of(1_000_000), LiquidityLevel::Low, "1e6");
        assert_eq!(LiquidityLevel::of(50_000_000), LiquidityLevel::Moderate, "5e7");
        assert_eq!(LiquidityLevel::of(100_000_000), LiquidityLevel::High, "1e8");
        assert_eq!(LiquidityLevel::of(u128::MAX), LiquidityLevel::VeryHigh, "max");
    }

    #[test]
    fn zero_liquidity_or_price_is_not_quotable() {
        let mut p = PoolState {
            address: Address::ZERO,
            token0: Address::repeat_byte(1),
            token1: Address::repeat_byte(2),
            fee: crate::fees::HIGH,
            liquidity: 0,
            sqrt_price_x96: U256::from(1_u8) << 96,
            tick: 0,
        };
        assert!(!p.is_quotable(), "zero liquidity");
        p.liquidity = 10;
        assert!(p.is_quotable(), "liquid and priced");
        p.sqrt_price_x96 = U256::ZERO;
        assert!(!p.is_quotable(), "uninitialized price");
    }

    #[tokio::test]
    async fn lookups_ignore_argument_order() -> eyre::Result<()> {
        use testing::{sort_tokens, StaticPools};

        let (a, b) = (Address::repeat_byte(9), Address::repeat_byte(3));
        assert_eq!(sort_tokens(a, b), (b, a), "lower address is token0");
        let pools = StaticPools::new().with_pool(a, b, crate::fees::MEDIUM, 1_000, 1.0, (18, 18));
        let forward = pools.get_pool(a, b, crate::fees::MEDIUM).await?;
        let reverse = pools.get_pool(b, a, crate::fees::MEDIUM).await?;
        assert!(forward.is_some(), "pool found");
        assert_eq!(forward, reverse, "same pool either way");
        assert_eq!(forward.map(|p| p.token0), Some(b), "canonical order");
        Ok(())
    }
}
