use crate::{
    amount::format_amount_base_to_ui,
    route::{score_quotes, select_best},
    swap::min_amount_out,
    tokens::Token,
};
use alloy::primitives::{Address, U256};
use serde_json::{json, Value};
use tracing::warn;

use super::super::jsonrpc::{ok, tool_ok, JsonRpcResponse};
use super::super::SharedState;
use super::helpers::{amount_arg, fee_tier_arg, opt_address, req_str, slippage_arg};

fn format_u256(v: U256, decimals: u8) -> String {
    u128::try_from(v).map_or_else(|_e| v.to_string(), |b| format_amount_base_to_ui(b, decimals))
}

/// Input-token balance of `owner`, and whether it covers `amount_in`. Best-effort.
async fn wallet_check(shared: &SharedState, owner: Address, token: &Token, amount_in: u128) -> Value {
    let res = if token.native {
        shared.chain.native_balance(owner).await
    } else {
        shared.chain.erc20_balance(token.address, owner).await
    };
    match res {
        Ok(balance) => json!({
          "address": format!("{owner:#x}"),
          "token": token.symbol,
          "balance": format_u256(balance, token.decimals),
          "balance_base_units": balance.to_string(),
          "can_swap": balance >= U256::from(amount_in),
        }),
        Err(e) => {
            warn!(owner = %owner, token = %token.symbol, error = %e, "wallet balance read failed");
            json!({
              "address": format!("{owner:#x}"),
              "token": token.symbol,
              "error": format!("{e:#}"),
            })
        }
    }
}

pub async fn handle(req_id: Value, args: &Value, shared: &SharedState) -> eyre::Result<JsonRpcResponse> {
    let token_in = req_str(args, "token_in")?;
    let token_out = req_str(args, "token_out")?;
    let amount_in = amount_arg(args, "amount_in")?;
    let slippage_bps = slippage_arg(args, &shared.cfg)?;
    let fee_tier = fee_tier_arg(args)?;
    let wallet = opt_address(args, "wallet")?;

    let engine = shared.engine();
    let quotes = match fee_tier {
        Some(fee) => vec![engine.quote_tier(token_in, token_out, &amount_in, fee).await?],
        None => {
            engine
                .get_quotes_for_all_tiers(token_in, token_out, &amount_in)
                .await?
        }
    };
    let Some(best) = select_best(&quotes) else {
        eyre::bail!("quote engine returned no quotes");
    };
    let min_out = min_amount_out(U256::from(best.amount_out), slippage_bps)?;
    let scores = score_quotes(&quotes);
    let trade_size = engine.trade_size(&best.token_in, best.amount_in);

    let all: Vec<Value> = quotes
        .iter()
        .zip(&scores)
        .map(|(q, score)| {
            let mut v = q.to_json();
            if let Some(o) = v.as_object_mut() {
                o.insert("score".into(), json!(score));
                o.insert("best".into(), json!(q.fee_tier == best.fee_tier));
            }
            v
        })
        .collect();

    let wallet_v = match wallet {
        Some(owner) => Some(wallet_check(shared, owner, &best.token_in, best.amount_in).await),
        None => None,
    };

    Ok(ok(
        req_id,
        tool_ok(&json!({
          "token_in": best.token_in.to_json(),
          "token_out": best.token_out.to_json(),
          "trade_size": trade_size.as_str(),
          "best": best.to_json(),
          "slippage_bps": slippage_bps,
          "min_amount_out": format_u256(min_out, best.token_out.decimals),
          "min_amount_out_base_units": min_out.to_string(),
          "quotes": all,
          "wallet": wallet_v,
        })),
    ))
}
