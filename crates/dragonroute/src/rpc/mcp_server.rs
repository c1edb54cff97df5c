use crate::{config::DragonrouteConfig, errors::tool_error_from_report, price};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing::{info, warn};

mod jsonrpc;
mod state;
mod tools;
mod transport;

use jsonrpc::{
    err, ok, tool_err, JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST, METHOD_NOT_FOUND,
};
use state::SharedState;
use tools::{handle_tools_call, list_tools_result};

fn handle_initialize(req_id: Value) -> JsonRpcResponse {
    ok(
        req_id,
        json!({
          "protocolVersion": "2025-06-18",
          "serverInfo": { "name": "dragonroute", "version": env!("CARGO_PKG_VERSION") },
          "capabilities": { "tools": {} }
        }),
    )
}

async fn handle_request(req: JsonRpcRequest, shared: &SharedState) -> JsonRpcResponse {
    if req.jsonrpc != "2.0" {
        return err(req.id, INVALID_REQUEST, "invalid jsonrpc version");
    }
    match req.method.as_str() {
        "initialize" => handle_initialize(req.id),
        "ping" => ok(req.id, json!({})),
        "tools/list" => ok(req.id, list_tools_result()),
        "tools/call" => {
            let name = req
                .params
                .get("name")
                .and_then(|name_v| name_v.as_str())
                .unwrap_or("");
            let args = req.params.get("arguments").cloned().unwrap_or(Value::Null);
            let id = req.id.clone();
            match handle_tools_call(id.clone(), name, &args, shared).await {
                Ok(tool_resp) => tool_resp,
                Err(e) => {
                    warn!(tool = name, error = %e, "tool call failed");
                    ok(id, tool_err(&tool_error_from_report(&e)))
                }
            }
        }
        _ => err(req.id, METHOD_NOT_FOUND, "method not found"),
    }
}

/// Serve line-delimited JSON-RPC until `input` closes or sends an oversized frame.
pub async fn serve<R, W>(input: R, out: &mut W, shared: &SharedState) -> eyre::Result<()>
where
    R: tokio::io::AsyncRead + Unpin + Send,
    W: tokio::io::AsyncWrite + Unpin + Send,
{
    let mut lines = BufReader::new(input).lines();

    while let Some(line) = lines.next_line().await? {
        if line.len() > super::MAX_JSONRPC_LINE_BYTES {
            warn!(bytes = line.len(), "jsonrpc frame too large; closing session");
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let v: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "invalid json on stdin");
                continue;
            }
        };

        // Notifications carry no id and get no response.
        if v.get("id").is_none() {
            continue;
        }

        let req: JsonRpcRequest = match serde_json::from_value(v) {
            Ok(parsed_req) => parsed_req,
            Err(e) => {
                warn!(error = %e, "failed to parse jsonrpc request");
                continue;
            }
        };

        let resp = handle_request(req, shared).await;
        transport::write_frame(out, &resp).await?;
    }

    Ok(())
}

pub async fn run(cfg: DragonrouteConfig) -> eyre::Result<()> {
    let sizer = price::trade_sizer(&cfg).await;
    let shared = SharedState::new(cfg, sizer);
    info!(
        chain_id = shared.cfg.network.chain_id,
        rpc_url = %shared.cfg.network.rpc_url,
        tokens = shared.tokens.symbols().len(),
        "mcp server ready"
    );

    let mut stdout = tokio::io::stdout();
    serve(tokio::io::stdin(), &mut stdout, &shared).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::UnitsAsUsd;

    fn shared() -> SharedState {
        let mut cfg = DragonrouteConfig::default();
        // Unroutable endpoint: any accidental network call fails fast.
        cfg.network.rpc_url = "http://127.0.0.1:9".into();
        SharedState::new(cfg, Box::new(UnitsAsUsd))
    }

    async fn exchange(input: &str) -> eyre::Result<Vec<Value>> {
        let mut out: Vec<u8> = Vec::new();
        serve(input.as_bytes(), &mut out, &shared()).await?;
        let s = String::from_utf8(out)?;
        s.lines()
            .map(|l| serde_json::from_str(l).map_err(Into::into))
            .collect()
    }

    fn tool_text(resp: &Value) -> eyre::Result<Value> {
        let text = resp
            .pointer("/result/content/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| eyre::eyre!("missing tool text in {resp}"))?;
        Ok(serde_json::from_str(text)?)
    }

    #[tokio::test]
    async fn initialize_ping_and_unknown_method() -> eyre::Result<()> {
        let frames = exchange(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"1.0","id":3,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#,
            "\n",
        ))
        .await?;
        assert_eq!(frames.len(), 4, "notification gets no reply: {frames:?}");
        let name = frames
            .first()
            .and_then(|f| f.pointer("/result/serverInfo/name"))
            .and_then(Value::as_str);
        assert_eq!(name, Some("dragonroute"), "server name");
        let codes: Vec<Option<i64>> = frames
            .iter()
            .map(|f| f.pointer("/error/code").and_then(Value::as_i64))
            .collect();
        assert_eq!(codes, vec![None, None, Some(-32600), Some(-32601)], "error codes");
        Ok(())
    }

    #[tokio::test]
    async fn bad_slippage_fails_offline_with_a_domain_code() -> eyre::Result<()> {
        let frames = exchange(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_swap_quote","arguments":{"token_in":"USDT","token_out":"WKAIA","amount_in":"100","slippage_bps":20000}}}"#,
            "\n",
        ))
        .await?;
        let resp = frames.first().ok_or_else(|| eyre::eyre!("no response"))?;
        assert_eq!(resp.pointer("/result/isError"), Some(&json!(true)), "tool error");
        let body = tool_text(resp)?;
        assert_eq!(body.get("code"), Some(&json!("invalid_slippage")), "code: {body}");
        Ok(())
    }

    #[tokio::test]
    async fn oversized_frame_ends_the_session() -> eyre::Result<()> {
        let big = format!(
            "{{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\",\"pad\":\"{}\"}}\n{}\n",
            "x".repeat(crate::rpc::MAX_JSONRPC_LINE_BYTES),
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#
        );
        let frames = exchange(&big).await?;
        assert!(frames.is_empty(), "nothing after an oversized frame");
        Ok(())
    }
}
