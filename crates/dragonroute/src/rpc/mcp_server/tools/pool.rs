use crate::{
    errors::DragonrouteError,
    fees::{FeeTier, MEDIUM},
    pools::{LiquidityLevel, PoolDirectory as _},
    tokens::TokenDirectory as _,
};
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::debug;

use super::super::jsonrpc::{ok, tool_ok, JsonRpcResponse};
use super::super::SharedState;
use super::helpers::{fee_tier_arg, req_str};

pub async fn handle(req_id: Value, args: &Value, shared: &SharedState) -> eyre::Result<JsonRpcResponse> {
    let sym_a = req_str(args, "token0")?;
    let sym_b = req_str(args, "token1")?;
    let fee = fee_tier_arg(args)?.unwrap_or(MEDIUM);

    let wrapped = shared.cfg.dragonswap.wrapped_native;
    let token_a = shared.tokens.resolve(sym_a).await?;
    let token_b = shared.tokens.resolve(sym_b).await?;
    if token_a.same_pool_token(&token_b, wrapped) {
        return Err(DragonrouteError::IdenticalTokens(token_a.symbol).into());
    }
    let addr_a = token_a.pool_address(wrapped);
    let addr_b = token_b.pool_address(wrapped);

    let Some(pool) = shared.chain.get_pool(addr_a, addr_b, fee).await? else {
        return Ok(ok(
            req_id,
            tool_ok(&json!({
              "exists": false,
              "token0": token_a.symbol,
              "token1": token_b.symbol,
              "fee_tier": fee.pips(),
              "fee_percent": fee.percent(),
            })),
        ));
    };

    let (t0, t1) = if pool.is_token0(addr_a) {
        (&token_a, &token_b)
    } else {
        (&token_b, &token_a)
    };

    let others: Vec<FeeTier> = shared
        .cfg
        .dragonswap
        .fee_tiers
        .iter()
        .copied()
        .filter(|t| *t != fee)
        .collect();
    let lookups = join_all(others.iter().map(|t| shared.chain.get_pool(addr_a, addr_b, *t))).await;
    let mut comparison = Vec::with_capacity(others.len());
    for (tier, res) in others.iter().zip(lookups) {
        match res {
            Ok(Some(p)) => comparison.push(json!({
              "fee_tier": tier.pips(),
              "fee_percent": tier.percent(),
              "pool": format!("{:#x}", p.address),
              "liquidity": p.liquidity.to_string(),
              "liquidity_level": LiquidityLevel::of(p.liquidity).as_str(),
              "more_liquid": p.liquidity > pool.liquidity,
            })),
            Ok(None) => {}
            Err(e) => debug!(fee = tier.pips(), error = %e, "comparison lookup failed"),
        }
    }

    Ok(ok(
        req_id,
        tool_ok(&json!({
          "exists": true,
          "token0": t0.to_json(),
          "token1": t1.to_json(),
          "quotable": pool.is_quotable(),
          "pool": pool.to_json(t0.decimals, t1.decimals),
          "other_tiers": comparison,
        })),
    ))
}
