use assert_cmd::Command;
use eyre::Context as _;
use serde_json::{json, Value};

fn call(id: u64, name: &str, arguments: &Value) -> String {
    json!({
      "jsonrpc": "2.0",
      "id": id,
      "method": "tools/call",
      "params": { "name": name, "arguments": arguments }
    })
    .to_string()
}

/// Feed `frames` to `dragonroute mcp` and collect its replies.
fn run_session(frames: &[String]) -> eyre::Result<Vec<Value>> {
    let cfg_dir = tempfile::tempdir()?;
    let data_dir = tempfile::tempdir()?;
    let mut input = frames.join("\n");
    input.push('\n');

    let out = Command::new(assert_cmd::cargo::cargo_bin!("dragonroute"))
        .env("DRAGONROUTE_CONFIG_DIR", cfg_dir.path())
        .env("DRAGONROUTE_DATA_DIR", data_dir.path())
        // Unroutable endpoint: validation failures must not need the network.
        .env("DRAGONROUTE_RPC_URL", "http://127.0.0.1:9")
        .env("DRAGONROUTE_BANNER", "0")
        .arg("mcp")
        .write_stdin(input)
        .output()
        .context("run dragonroute mcp")?;
    assert!(
        out.status.success(),
        "mcp exited non-zero: stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = String::from_utf8(out.stdout)?;
    stdout
        .lines()
        .map(|l| serde_json::from_str(l).context("parse frame"))
        .collect()
}

fn frame_by_id(frames: &[Value], id: u64) -> eyre::Result<&Value> {
    frames
        .iter()
        .find(|f| f.get("id") == Some(&json!(id)))
        .ok_or_else(|| eyre::eyre!("no frame with id {id}"))
}

fn tool_error_code(frame: &Value) -> Option<String> {
    let text = frame.pointer("/result/content/0/text")?.as_str()?;
    let body: Value = serde_json::from_str(text).ok()?;
    body.get("code")?.as_str().map(str::to_owned)
}

#[test]
fn initialize_and_list_tools() -> eyre::Result<()> {
    let frames = run_session(&[
        json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}).to_string(),
        json!({"jsonrpc":"2.0","method":"notifications/initialized"}).to_string(),
        json!({"jsonrpc":"2.0","id":2,"method":"tools/list"}).to_string(),
    ])?;
    assert_eq!(frames.len(), 2, "one reply per request");

    let init = frame_by_id(&frames, 1)?;
    assert_eq!(
        init.pointer("/result/protocolVersion"),
        Some(&json!("2025-06-18")),
        "protocol version"
    );

    let list = frame_by_id(&frames, 2)?;
    let names: Vec<&str> = list
        .pointer("/result/tools")
        .and_then(Value::as_array)
        .map(|tools| {
            tools
                .iter()
                .filter_map(|t| t.get("name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    for expected in [
        "get_swap_quote",
        "get_swap_route",
        "get_pool_info",
        "prepare_swap",
        "list_swap_tokens",
        "get_network_info",
    ] {
        assert!(names.contains(&expected), "missing tool {expected}: {names:?}");
    }
    Ok(())
}

#[test]
fn invalid_input_fails_offline_with_stable_codes() -> eyre::Result<()> {
    let frames = run_session(&[
        call(
            1,
            "get_swap_quote",
            &json!({ "token_in": "USDT", "token_out": "WKAIA", "amount_in": "100", "slippage_bps": 20000 }),
        ),
        call(
            2,
            "get_swap_quote",
            &json!({ "token_in": "FOO", "token_out": "WKAIA", "amount_in": "100" }),
        ),
        call(
            3,
            "get_swap_quote",
            &json!({ "token_in": "USDT", "token_out": "WKAIA", "amount_in": "-1" }),
        ),
        call(
            4,
            "get_swap_route",
            &json!({ "token_in": "KAIA", "token_out": "WKAIA", "amount_in": "1" }),
        ),
        call(
            5,
            "prepare_swap",
            &json!({ "token_in": "USDT", "token_out": "BORA", "amount_in": "1", "recipient": "0x1234" }),
        ),
        call(
            6,
            "prepare_swap",
            &json!({
              "token_in": "USDT",
              "token_out": "BORA",
              "amount_in": "1",
              "recipient": "0x000000000000000000000000000000000000dEaD",
              "deadline_minutes": 0
            }),
        ),
        call(
            7,
            "get_pool_info",
            &json!({ "token0": "USDT", "token1": "BORA", "fee_tier": 2500 }),
        ),
    ])?;

    let expected = [
        (1, "invalid_slippage"),
        (2, "unknown_token"),
        (3, "invalid_amount"),
        (4, "identical_tokens"),
        (5, "invalid_address"),
        (6, "invalid_deadline"),
        (7, "invalid_fee_tier"),
    ];
    for (id, code) in expected {
        let frame = frame_by_id(&frames, id)?;
        assert_eq!(
            frame.pointer("/result/isError"),
            Some(&json!(true)),
            "frame {id} is a tool error"
        );
        assert_eq!(tool_error_code(frame).as_deref(), Some(code), "frame {id}");
    }
    Ok(())
}

#[test]
fn static_tools_answer_without_rpc() -> eyre::Result<()> {
    let frames = run_session(&[
        call(1, "list_swap_tokens", &json!({})),
        call(2, "get_network_info", &json!({})),
        call(3, "no_such_tool", &json!({})),
    ])?;

    let text = frame_by_id(&frames, 1)?
        .pointer("/result/content/0/text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let tokens: Value = serde_json::from_str(text)?;
    assert!(
        tokens.get("count").and_then(Value::as_u64).unwrap_or_default() >= 10,
        "default token table: {tokens}"
    );

    let text = frame_by_id(&frames, 2)?
        .pointer("/result/content/0/text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let info: Value = serde_json::from_str(text)?;
    assert_eq!(info.get("rpc_url"), Some(&json!("http://127.0.0.1:9")), "env override applied");

    assert_eq!(
        frame_by_id(&frames, 3)?.pointer("/error/code"),
        Some(&json!(-32601)),
        "unknown tool"
    );
    Ok(())
}
