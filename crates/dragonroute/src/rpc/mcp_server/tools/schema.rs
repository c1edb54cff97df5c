use serde_json::{json, Value};

fn quote_tool_schemas() -> Vec<Value> {
    vec![
        json!({ "name": "get_swap_quote", "description": "Quote a DragonSwap V3 swap on KAIA across every fee tier and pick the best pool by output and liquidity. Read-only.", "inputSchema": {
          "type": "object",
          "properties": {
            "token_in": { "type": "string", "description": "Symbol (KAIA, USDT, BORA, ...) or 0x token address." },
            "token_out": { "type": "string", "description": "Symbol or 0x token address." },
            "amount_in": { "type": ["string", "number"], "description": "Human-readable input amount, e.g. \"100\" or \"0.5\"." },
            "fee_tier": { "type": "integer", "enum": [100, 500, 1000, 3000, 10000], "description": "Quote only this fee tier (hundredths of a basis point)." },
            "slippage_bps": { "type": "integer", "minimum": 0, "maximum": 5000, "default": 50 },
            "slippage_percent": { "type": "number", "minimum": 0, "maximum": 50, "description": "Alternative to slippage_bps (0.5 = 50 bps)." },
            "wallet": { "type": "string", "description": "Optional 0x address; when set, its input-token balance is checked." }
          },
          "required": ["token_in", "token_out", "amount_in"],
          "additionalProperties": false
        }}),
        json!({ "name": "get_swap_route", "description": "Compare the direct pool against two-hop routes through USDT or KAIA and return the route with the highest output.", "inputSchema": {
          "type": "object",
          "properties": {
            "token_in": { "type": "string" },
            "token_out": { "type": "string" },
            "amount_in": { "type": ["string", "number"] },
            "slippage_bps": { "type": "integer", "minimum": 0, "maximum": 5000, "default": 50 },
            "slippage_percent": { "type": "number", "minimum": 0, "maximum": 50 }
          },
          "required": ["token_in", "token_out", "amount_in"],
          "additionalProperties": false
        }}),
        json!({ "name": "get_pool_info", "description": "Read a DragonSwap V3 pool's price, tick and liquidity, and compare it with the other fee tiers of the same pair.", "inputSchema": {
          "type": "object",
          "properties": {
            "token0": { "type": "string", "description": "Symbol or 0x address; order does not matter." },
            "token1": { "type": "string" },
            "fee_tier": { "type": "integer", "enum": [100, 500, 1000, 3000, 10000], "default": 1000 }
          },
          "required": ["token0", "token1"],
          "additionalProperties": false
        }}),
    ]
}

fn swap_tool_schemas() -> Vec<Value> {
    vec![json!({ "name": "prepare_swap", "description": "Build the unsigned DragonSwap router transaction (and an ERC-20 approval when needed) for an external signer. Nothing is signed or broadcast.", "inputSchema": {
      "type": "object",
      "properties": {
        "token_in": { "type": "string" },
        "token_out": { "type": "string" },
        "amount_in": { "type": ["string", "number"] },
        "recipient": { "type": "string", "description": "0x address that receives the output tokens." },
        "from": { "type": "string", "description": "Sender address. Defaults to recipient; used for the allowance check." },
        "fee_tier": { "type": "integer", "enum": [100, 500, 1000, 3000, 10000], "description": "Force a direct swap through this fee tier. Omit to use the best route." },
        "slippage_bps": { "type": "integer", "minimum": 0, "maximum": 5000, "default": 50 },
        "slippage_percent": { "type": "number", "minimum": 0, "maximum": 50, "description": "Alternative to slippage_bps (0.5 = 50 bps)." },
        "deadline_minutes": { "type": "integer", "minimum": 1, "maximum": 60, "default": 20 }
      },
      "required": ["token_in", "token_out", "amount_in", "recipient"],
      "additionalProperties": false
    }})]
}

fn network_tool_schemas() -> Vec<Value> {
    vec![
        json!({ "name": "list_swap_tokens", "description": "List the KAIA tokens known by symbol, with addresses, decimals and aliases.", "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false } }),
        json!({ "name": "get_network_info", "description": "Describe the KAIA network, DragonSwap contracts, fee tiers and trade defaults in use.", "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false } }),
    ]
}

pub fn list_tools_result() -> Value {
    let mut tools = quote_tool_schemas();
    tools.extend(swap_tool_schemas());
    tools.extend(network_tool_schemas());
    json!({ "tools": tools })
}
