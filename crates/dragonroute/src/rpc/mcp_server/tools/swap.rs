use crate::{
    errors::DragonrouteError,
    route::{find_best_route, RoutePath},
    swap::{build_approve_tx, build_swap_tx, needs_approval, prepare_swap, SwapPayload},
};
use alloy::network::TransactionBuilder as _;
use eyre::Context as _;
use serde_json::{json, Value};

use super::super::jsonrpc::{ok, tool_ok, JsonRpcResponse};
use super::super::SharedState;
use super::helpers::{
    amount_arg, deadline_arg, fee_tier_arg, now_unix, opt_address, req_str, slippage_arg,
};

pub async fn handle(req_id: Value, args: &Value, shared: &SharedState) -> eyre::Result<JsonRpcResponse> {
    let token_in = req_str(args, "token_in")?;
    let token_out = req_str(args, "token_out")?;
    let amount_in = amount_arg(args, "amount_in")?;
    let slippage_bps = slippage_arg(args, &shared.cfg)?;
    let deadline = deadline_arg(args, &shared.cfg, now_unix())?;
    let fee_tier = fee_tier_arg(args)?;
    let recipient = opt_address(args, "recipient")?
        .ok_or_else(|| DragonrouteError::InvalidRequest("missing recipient".into()))?;
    let from = opt_address(args, "from")?;

    let dex = &shared.cfg.dragonswap;
    let engine = shared.engine();
    let route = match fee_tier {
        Some(fee) => RoutePath::Direct(engine.quote_tier(token_in, token_out, &amount_in, fee).await?),
        None => {
            find_best_route(&engine, token_in, token_out, &amount_in, &dex.intermediates)
                .await?
                .best
        }
    };

    let plan = prepare_swap(&route, slippage_bps)?;
    let payload = SwapPayload {
        plan,
        recipient,
        deadline,
    };
    let sender = from.unwrap_or(recipient);
    let tx = build_swap_tx(dex.router, dex.wrapped_native, sender, &payload)?
        .with_chain_id(shared.cfg.network.chain_id);

    let approval = match from {
        Some(owner) if !payload.plan.token_in().native => {
            let token = payload.plan.token_in().address;
            let allowance = shared
                .chain
                .erc20_allowance(token, owner, dex.router)
                .await
                .context("read router allowance")?;
            if needs_approval(payload.plan.token_in(), allowance, payload.plan.amount_in) {
                let approve = build_approve_tx(owner, token, dex.router, payload.plan.amount_in)
                    .with_chain_id(shared.cfg.network.chain_id);
                Some(json!({
                  "required": true,
                  "current_allowance": allowance.to_string(),
                  "tx": serde_json::to_value(&approve).context("serialize approve tx")?,
                }))
            } else {
                Some(json!({ "required": false, "current_allowance": allowance.to_string() }))
            }
        }
        _ => None,
    };

    Ok(ok(
        req_id,
        tool_ok(&json!({
          "route": route.to_json(),
          "plan": payload.plan.to_json(),
          "payload": payload.to_json(),
          "router": format!("{:#x}", dex.router),
          "tx": serde_json::to_value(&tx).context("serialize swap tx")?,
          "approval": approval,
          "note": "unsigned; sign and broadcast with an external wallet",
        })),
    ))
}
