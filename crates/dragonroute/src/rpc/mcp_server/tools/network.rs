use crate::fees::FeeTier;
use serde_json::{json, Value};

use super::super::jsonrpc::{ok, tool_ok, JsonRpcResponse};
use super::super::SharedState;

fn fee_tier_json(t: FeeTier) -> Value {
    json!({
      "fee_tier": t.pips(),
      "name": t.name(),
      "percent": t.percent(),
      "description": t.description(),
      "tick_spacing": t.tick_spacing(),
    })
}

fn list_swap_tokens(shared: &SharedState) -> Value {
    let tokens: Vec<Value> = shared
        .tokens
        .tokens()
        .map(|t| {
            let mut v = t.to_json();
            if let Some(o) = v.as_object_mut() {
                o.insert("aliases".into(), json!(shared.tokens.aliases_of(&t.symbol)));
            }
            v
        })
        .collect();
    json!({ "count": tokens.len(), "tokens": tokens })
}

fn get_network_info(shared: &SharedState) -> Value {
    let cfg = &shared.cfg;
    json!({
      "network": "KAIA",
      "chain_id": cfg.network.chain_id,
      "rpc_url": cfg.network.rpc_url,
      "fallback_rpc_urls": cfg.network.fallback_rpc_urls,
      "explorer_url": cfg.network.explorer_url,
      "dex": "DragonSwap V3",
      "contracts": {
        "router": format!("{:#x}", cfg.dragonswap.router),
        "factory": format!("{:#x}", cfg.dragonswap.factory),
        "quoter_v2": format!("{:#x}", cfg.dragonswap.quoter_v2),
        "wrapped_native": format!("{:#x}", cfg.dragonswap.wrapped_native),
      },
      "fee_tiers": cfg.dragonswap.fee_tiers.iter().copied().map(fee_tier_json).collect::<Vec<_>>(),
      "intermediates": cfg.dragonswap.intermediates,
      "trade": {
        "default_slippage_bps": cfg.trade.default_slippage_bps,
        "max_slippage_bps": cfg.trade.max_slippage_bps,
        "default_deadline_minutes": cfg.trade.default_deadline_minutes,
        "max_deadline_minutes": cfg.trade.max_deadline_minutes,
        "sizing": cfg.trade.sizing,
      },
    })
}

pub fn handle(req_id: Value, tool_name: &str, shared: &SharedState) -> JsonRpcResponse {
    let v = match tool_name {
        "list_swap_tokens" => list_swap_tokens(shared),
        _ => get_network_info(shared),
    };
    ok(req_id, tool_ok(&v))
}
