pub mod mcp_server;

/// Frames larger than this end the session.
pub const MAX_JSONRPC_LINE_BYTES: usize = 1024 * 1024;
