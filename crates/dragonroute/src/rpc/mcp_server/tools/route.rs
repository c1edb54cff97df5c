use crate::{route::find_best_route, swap::prepare_swap};
use serde_json::{json, Value};

use super::super::jsonrpc::{ok, tool_ok, JsonRpcResponse};
use super::super::SharedState;
use super::helpers::{amount_arg, req_str, slippage_arg};

pub async fn handle(req_id: Value, args: &Value, shared: &SharedState) -> eyre::Result<JsonRpcResponse> {
    let token_in = req_str(args, "token_in")?;
    let token_out = req_str(args, "token_out")?;
    let amount_in = amount_arg(args, "amount_in")?;
    let slippage_bps = slippage_arg(args, &shared.cfg)?;

    let engine = shared.engine();
    let report = find_best_route(
        &engine,
        token_in,
        token_out,
        &amount_in,
        &shared.cfg.dragonswap.intermediates,
    )
    .await?;
    let plan = prepare_swap(&report.best, slippage_bps)?;

    let mut out = report.to_json();
    if let Some(o) = out.as_object_mut() {
        o.insert("swap".into(), plan.to_json());
        o.insert(
            "recommendation".into(),
            json!(if report.best.is_direct() {
                "direct swap is best".to_owned()
            } else {
                format!("route through {}", report.best.label())
            }),
        );
    }
    Ok(ok(req_id, tool_ok(&out)))
}
