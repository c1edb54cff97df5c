mod helpers;
mod network;
mod pool;
mod quote;
mod route;
mod schema;
mod swap;

pub use schema::list_tools_result;

use serde_json::Value;

use super::jsonrpc::{err, JsonRpcResponse, METHOD_NOT_FOUND};
use super::SharedState;

pub async fn handle_tools_call(
    req_id: Value,
    tool_name: &str,
    args: &Value,
    shared: &SharedState,
) -> eyre::Result<JsonRpcResponse> {
    match tool_name {
        // Quoting and routing
        "get_swap_quote" => quote::handle(req_id, args, shared).await,
        "get_swap_route" => route::handle(req_id, args, shared).await,
        "get_pool_info" => pool::handle(req_id, args, shared).await,

        // Transaction building
        "prepare_swap" => swap::handle(req_id, args, shared).await,

        // Static network/config tools
        "list_swap_tokens" | "get_network_info" => Ok(network::handle(req_id, tool_name, shared)),

        _ => Ok(err(req_id, METHOD_NOT_FOUND, "unknown tool")),
    }
}
