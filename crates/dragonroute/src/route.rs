use crate::{
    amount::format_amount_base_to_ui,
    errors::DragonrouteError,
    fees::{FeeTier, HIGH, HIGHEST, LOW, LOWEST, MEDIUM},
    pools::PoolDirectory,
    price::PriceTable,
    price_math,
    quote::{Quote, QuoteEngine},
    tokens::{Token, TokenDirectory},
};
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::debug;

/// Trade size bucket used to order the fee-tier search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSizeCategory {
    Micro,
    Small,
    Medium,
    Large,
    Whale,
}

impl TradeSizeCategory {
    /// Bucket a USD-equivalent amount: <10, <100, <1000, <10000, then whale.
    pub fn from_amount(usd: f64) -> Self {
        if usd < 10.0_f64 {
            Self::Micro
        } else if usd < 100.0_f64 {
            Self::Small
        } else if usd < 1_000.0_f64 {
            Self::Medium
        } else if usd < 10_000.0_f64 {
            Self::Large
        } else {
            Self::Whale
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Whale => "whale",
        }
    }

    const fn preference(self) -> [FeeTier; 5] {
        match self {
            Self::Micro => [LOWEST, LOW, MEDIUM, HIGH, HIGHEST],
            Self::Small => [LOW, MEDIUM, LOWEST, HIGH, HIGHEST],
            Self::Medium => [MEDIUM, HIGH, LOW, LOWEST, HIGHEST],
            Self::Large => [HIGH, MEDIUM, HIGHEST, LOW, LOWEST],
            Self::Whale => [HIGHEST, HIGH, MEDIUM, LOW, LOWEST],
        }
    }
}

/// Decides how large a trade is. Plugged into the quote engine.
pub trait TradeSizer: Send + Sync {
    fn categorize(&self, token: &Token, amount_ui: f64) -> TradeSizeCategory;
}

/// Treats one token unit as one USD. Only accurate for stablecoins.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitsAsUsd;

impl TradeSizer for UnitsAsUsd {
    fn categorize(&self, _token: &Token, amount_ui: f64) -> TradeSizeCategory {
        TradeSizeCategory::from_amount(amount_ui)
    }
}

/// Values the input with a fetched price table; unpriced tokens fall back to units.
#[derive(Debug, Clone, Default)]
pub struct UsdValued {
    prices: PriceTable,
}

impl UsdValued {
    pub const fn new(prices: PriceTable) -> Self {
        Self { prices }
    }
}

impl TradeSizer for UsdValued {
    fn categorize(&self, token: &Token, amount_ui: f64) -> TradeSizeCategory {
        self.prices.usd_value(&token.symbol, amount_ui).map_or_else(
            || UnitsAsUsd.categorize(token, amount_ui),
            TradeSizeCategory::from_amount,
        )
    }
}

/// Fee tiers in search order for `category`, restricted to `configured`.
///
/// Configured tiers outside the preference table are appended in ascending order.
pub fn optimal_fee_tiers(category: TradeSizeCategory, configured: &[FeeTier]) -> Vec<FeeTier> {
    let preference = category.preference();
    let mut out: Vec<FeeTier> = preference
        .iter()
        .filter(|t| configured.contains(t))
        .copied()
        .collect();
    let mut rest: Vec<FeeTier> = configured
        .iter()
        .filter(|t| !preference.contains(t))
        .copied()
        .collect();
    rest.sort();
    rest.dedup();
    out.extend(rest);
    out
}

pub fn combined_score(quote: &Quote, max_amount_out_ui: f64) -> f64 {
    price_math::combined_score(
        quote.amount_out_ui(),
        max_amount_out_ui,
        quote.liquidity_score,
        quote.price_impact_percent,
        quote.fee_tier.pips(),
    )
}

/// Combined score of every quote, in input order.
pub fn score_quotes(quotes: &[Quote]) -> Vec<f64> {
    let max_out = quotes
        .iter()
        .map(Quote::amount_out_ui)
        .fold(0.0_f64, f64::max);
    quotes.iter().map(|q| combined_score(q, max_out)).collect()
}

/// Highest combined score wins; the first quote wins a tie.
pub fn select_best(quotes: &[Quote]) -> Option<&Quote> {
    if let [only] = quotes {
        return Some(only);
    }
    let scores = score_quotes(quotes);
    let mut best: Option<(&Quote, f64)> = None;
    for (q, score) in quotes.iter().zip(scores) {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((q, score)),
        }
    }
    best.map(|(q, _)| q)
}

/// A direct swap or a swap through one intermediate token.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutePath {
    Direct(Quote),
    TwoHop { first: Quote, second: Quote },
}

impl RoutePath {
    pub const fn first(&self) -> &Quote {
        match self {
            Self::Direct(q) | Self::TwoHop { first: q, .. } => q,
        }
    }

    pub const fn last(&self) -> &Quote {
        match self {
            Self::Direct(q) | Self::TwoHop { second: q, .. } => q,
        }
    }

    pub fn hops(&self) -> Vec<&Quote> {
        match self {
            Self::Direct(q) => vec![q],
            Self::TwoHop { first, second } => vec![first, second],
        }
    }

    pub const fn token_in(&self) -> &Token {
        &self.first().token_in
    }

    pub const fn token_out(&self) -> &Token {
        &self.last().token_out
    }

    pub const fn amount_in(&self) -> u128 {
        self.first().amount_in
    }

    pub const fn amount_out(&self) -> u128 {
        self.last().amount_out
    }

    pub fn amount_out_ui(&self) -> f64 {
        self.last().amount_out_ui()
    }

    pub const fn is_direct(&self) -> bool {
        matches!(self, Self::Direct(_))
    }

    /// `USDT -> WKAIA -> BORA`
    pub fn label(&self) -> String {
        let mut parts = vec![self.token_in().symbol.clone()];
        parts.extend(self.hops().iter().map(|q| q.token_out.symbol.clone()));
        parts.join(" -> ")
    }

    pub fn to_json(&self) -> Value {
        json!({
          "route": self.label(),
          "kind": if self.is_direct() { "direct" } else { "multi_hop" },
          "amount_in": format_amount_base_to_ui(self.amount_in(), self.token_in().decimals),
          "amount_out": format_amount_base_to_ui(self.amount_out(), self.token_out().decimals),
          "amount_out_base_units": self.amount_out().to_string(),
          "hops": self.hops().iter().map(|q| q.to_json()).collect::<Vec<_>>(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteReport {
    pub best: RoutePath,
    pub direct: Option<RoutePath>,
    /// Every route that produced a quote, direct first.
    pub candidates: Vec<RoutePath>,
}

impl RouteReport {
    /// How much more the best route returns than the direct one, in percent.
    pub fn savings_percent(&self) -> Option<f64> {
        let direct = self.direct.as_ref()?;
        price_math::percent_gain(self.best.amount_out_ui(), direct.amount_out_ui())
    }

    pub fn to_json(&self) -> Value {
        json!({
          "best": self.best.to_json(),
          "direct": self.direct.as_ref().map(RoutePath::to_json),
          "savings_percent": self.savings_percent(),
          "routes_considered": self.candidates.len(),
          "alternatives": self.candidates.iter().map(RoutePath::to_json).collect::<Vec<_>>(),
        })
    }
}

async fn best_hop<P: PoolDirectory, T: TokenDirectory>(
    engine: &QuoteEngine<'_, P, T>,
    token_in: &Token,
    token_out: &Token,
    amount_in: u128,
) -> Option<Quote> {
    match engine.quote_resolved(token_in, token_out, amount_in).await {
        Ok(quotes) => select_best(&quotes).cloned(),
        Err(e) => {
            debug!(from = %token_in.symbol, to = %token_out.symbol, error = %e, "no hop quote");
            None
        }
    }
}

async fn two_hop<P: PoolDirectory, T: TokenDirectory>(
    engine: &QuoteEngine<'_, P, T>,
    token_in: &Token,
    mid: &Token,
    token_out: &Token,
    amount_in: u128,
) -> Option<RoutePath> {
    let first = best_hop(engine, token_in, mid, amount_in).await?;
    if first.amount_out == 0 {
        return None;
    }
    let second = best_hop(engine, mid, token_out, first.amount_out).await?;
    if second.amount_out == 0 {
        return None;
    }
    Some(RoutePath::TwoHop { first, second })
}

/// Best of the direct route and every depth-1 route through `intermediates`.
pub async fn find_best_route<P: PoolDirectory, T: TokenDirectory>(
    engine: &QuoteEngine<'_, P, T>,
    token_in: &str,
    token_out: &str,
    amount_in_ui: &str,
    intermediates: &[String],
) -> eyre::Result<RouteReport> {
    let req = engine
        .resolve_request(token_in, token_out, amount_in_ui)
        .await?;
    let wrapped = engine.wrapped_native();

    let mut mids: Vec<Token> = Vec::with_capacity(intermediates.len());
    for sym in intermediates {
        let mid = match engine.tokens().resolve(sym).await {
            Ok(t) => t,
            Err(e) => {
                debug!(intermediate = %sym, error = %e, "skipping unresolvable intermediate");
                continue;
            }
        };
        if mid.same_pool_token(&req.token_in, wrapped)
            || mid.same_pool_token(&req.token_out, wrapped)
            || mids.iter().any(|m| m.same_pool_token(&mid, wrapped))
        {
            continue;
        }
        mids.push(mid);
    }

    let direct = best_hop(engine, &req.token_in, &req.token_out, req.amount_in)
        .await
        .map(RoutePath::Direct);
    let hops = join_all(
        mids.iter()
            .map(|mid| two_hop(engine, &req.token_in, mid, &req.token_out, req.amount_in)),
    )
    .await;

    let candidates: Vec<RoutePath> = direct
        .iter()
        .cloned()
        .chain(hops.into_iter().flatten())
        .collect();
    let mut best: Option<&RoutePath> = None;
    for r in &candidates {
        match best {
            Some(b) if r.amount_out() <= b.amount_out() => {}
            _ => best = Some(r),
        }
    }
    let best = best.cloned().ok_or_else(|| DragonrouteError::NoLiquidity {
        pair: req.pair(),
    })?;
    debug!(route = %best.label(), candidates = candidates.len(), "route selected");

    Ok(RouteReport {
        best,
        direct,
        candidates,
    })
}
