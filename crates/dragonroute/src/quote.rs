use crate::{
    amount::{format_amount_base_to_ui, parse_amount_ui_to_base},
    errors::DragonrouteError,
    fees::FeeTier,
    pools::{PoolDirectory, PoolState},
    price_math,
    route::{optimal_fee_tiers, TradeSizeCategory, TradeSizer},
    tokens::{Token, TokenDirectory},
};
use alloy::primitives::Address;
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::debug;

/// Estimated result of swapping through one pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: u128,
    pub amount_out: u128,
    pub fee_tier: FeeTier,
    pub pool: Address,
    pub pool_liquidity: u128,
    pub liquidity_score: f64,
    pub price_impact_percent: f64,
}

impl Quote {
    fn from_pool(
        token_in: &Token,
        token_out: &Token,
        amount_in: u128,
        pool: &PoolState,
        wrapped_native: Address,
    ) -> Option<Self> {
        let is_token0_input = pool.is_token0(token_in.pool_address(wrapped_native));
        let amount_out = price_math::amount_out(
            pool.sqrt_price_x96,
            amount_in,
            token_in.decimals,
            token_out.decimals,
            is_token0_input,
        )?;
        Some(Self {
            token_in: token_in.clone(),
            token_out: token_out.clone(),
            amount_in,
            amount_out,
            fee_tier: pool.fee,
            pool: pool.address,
            pool_liquidity: pool.liquidity,
            liquidity_score: price_math::liquidity_score(amount_in, pool.liquidity),
            price_impact_percent: price_math::price_impact_percent(amount_in, pool.liquidity),
        })
    }

    pub fn amount_in_ui(&self) -> f64 {
        price_math::base_to_ui(self.amount_in, self.token_in.decimals)
    }

    pub fn amount_out_ui(&self) -> f64 {
        price_math::base_to_ui(self.amount_out, self.token_out.decimals)
    }

    /// Output tokens received per input token.
    pub fn execution_price(&self) -> Option<f64> {
        price_math::ratio(self.amount_out_ui(), self.amount_in_ui())
    }

    pub fn to_json(&self) -> Value {
        json!({
          "token_in": self.token_in.symbol,
          "token_out": self.token_out.symbol,
          "amount_in": format_amount_base_to_ui(self.amount_in, self.token_in.decimals),
          "amount_in_base_units": self.amount_in.to_string(),
          "amount_out": format_amount_base_to_ui(self.amount_out, self.token_out.decimals),
          "amount_out_base_units": self.amount_out.to_string(),
          "fee_tier": self.fee_tier.pips(),
          "fee_percent": self.fee_tier.percent(),
          "pool": format!("{:#x}", self.pool),
          "pool_liquidity": self.pool_liquidity.to_string(),
          "liquidity_score": self.liquidity_score,
          "price_impact_percent": self.price_impact_percent,
          "execution_price": self.execution_price(),
        })
    }
}

/// Token pair and raw amount after resolution and parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: u128,
}

impl QuoteRequest {
    pub fn pair(&self) -> String {
        pair_label(&self.token_in, &self.token_out)
    }
}

fn pair_label(token_in: &Token, token_out: &Token) -> String {
    format!("{}/{}", token_in.symbol, token_out.symbol)
}

/// Fans a quote out over every configured DragonSwap fee tier.
pub struct QuoteEngine<'a, P, T> {
    pools: &'a P,
    tokens: &'a T,
    fee_tiers: &'a [FeeTier],
    wrapped_native: Address,
    sizer: &'a dyn TradeSizer,
}

impl<'a, P: PoolDirectory, T: TokenDirectory> QuoteEngine<'a, P, T> {
    pub fn new(
        pools: &'a P,
        tokens: &'a T,
        fee_tiers: &'a [FeeTier],
        wrapped_native: Address,
        sizer: &'a dyn TradeSizer,
    ) -> Self {
        Self {
            pools,
            tokens,
            fee_tiers,
            wrapped_native,
            sizer,
        }
    }

    pub const fn tokens(&self) -> &'a T {
        self.tokens
    }

    pub const fn wrapped_native(&self) -> Address {
        self.wrapped_native
    }

    /// Resolve both tokens and parse the input amount, in that order.
    pub async fn resolve_request(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in_ui: &str,
    ) -> eyre::Result<QuoteRequest> {
        let token_in = self.tokens.resolve(token_in).await?;
        let token_out = self.tokens.resolve(token_out).await?;
        if token_in.same_pool_token(&token_out, self.wrapped_native) {
            return Err(DragonrouteError::IdenticalTokens(token_in.symbol).into());
        }
        let amount_in = parse_amount_ui_to_base(amount_in_ui, token_in.decimals)?;
        Ok(QuoteRequest {
            token_in,
            token_out,
            amount_in,
        })
    }

    pub fn trade_size(&self, token_in: &Token, amount_in: u128) -> TradeSizeCategory {
        self.sizer
            .categorize(token_in, price_math::base_to_ui(amount_in, token_in.decimals))
    }

    /// Fee tiers in the order they are searched for this trade.
    pub fn search_order(&self, token_in: &Token, amount_in: u128) -> Vec<FeeTier> {
        optimal_fee_tiers(self.trade_size(token_in, amount_in), self.fee_tiers)
    }

    pub async fn get_quotes_for_all_tiers(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in_ui: &str,
    ) -> eyre::Result<Vec<Quote>> {
        let req = self.resolve_request(token_in, token_out, amount_in_ui).await?;
        self.quote_resolved(&req.token_in, &req.token_out, req.amount_in)
            .await
    }

    /// Quote a single, caller-chosen fee tier.
    pub async fn quote_tier(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in_ui: &str,
        fee: FeeTier,
    ) -> eyre::Result<Quote> {
        let req = self.resolve_request(token_in, token_out, amount_in_ui).await?;
        let mut quotes = self
            .quote_tiers(&req.token_in, &req.token_out, req.amount_in, &[fee])
            .await?;
        quotes.pop().ok_or_else(|| {
            DragonrouteError::NoLiquidity {
                pair: req.pair(),
            }
            .into()
        })
    }

    /// Quote already-resolved tokens with a raw input amount. Used for each hop of a route.
    pub async fn quote_resolved(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: u128,
    ) -> eyre::Result<Vec<Quote>> {
        let tiers = self.search_order(token_in, amount_in);
        self.quote_tiers(token_in, token_out, amount_in, &tiers).await
    }

    async fn quote_tiers(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: u128,
        tiers: &[FeeTier],
    ) -> eyre::Result<Vec<Quote>> {
        let a = token_in.pool_address(self.wrapped_native);
        let b = token_out.pool_address(self.wrapped_native);
        if a == b {
            return Err(DragonrouteError::IdenticalTokens(token_in.symbol.clone()).into());
        }

        let lookups = tiers.iter().map(|fee| self.pools.get_pool(a, b, *fee));
        let results = join_all(lookups).await;

        let mut quotes = Vec::with_capacity(results.len());
        for (fee, res) in tiers.iter().zip(results) {
            let pool = match res {
                Ok(Some(pool)) => pool,
                Ok(None) => continue,
                Err(e) => {
                    debug!(fee = fee.pips(), error = %e, "pool lookup failed; skipping tier");
                    continue;
                }
            };
            if !pool.is_quotable() {
                debug!(fee = fee.pips(), pool = %pool.address, "pool has no liquidity; skipping tier");
                continue;
            }
            if let Some(q) =
                Quote::from_pool(token_in, token_out, amount_in, &pool, self.wrapped_native)
            {
                quotes.push(q);
            }
        }

        if quotes.is_empty() {
            return Err(DragonrouteError::NoLiquidity {
                pair: pair_label(token_in, token_out),
            }
            .into());
        }
        Ok(quotes)
    }
}
