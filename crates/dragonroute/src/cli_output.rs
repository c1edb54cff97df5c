//! Centralised helpers for user-facing CLI output.

use eyre::Context as _;
use std::io::Write as _;

fn stderr_writeln(s: &str) {
    let mut stderr = std::io::stderr().lock();
    if stderr.write_all(s.as_bytes()).is_err() {
        return;
    }
    if stderr.write_all(b"\n").is_err() {
        return;
    }
    let _flush = stderr.flush();
}

/// Print the MCP startup banner to stderr (human-operator info only).
pub fn print_mcp_banner(version: &str, chain_id: u64, rpc_url: &str) {
    stderr_writeln(&format!(
        "dragonroute MCP\n===============\nVersion : v{version}\nChain   : KAIA ({chain_id})\nRPC     : {rpc_url}\nMode    : stdio\n\nTip: if your agent can't connect, run `dragonroute doctor`."
    ));
}

/// Pretty JSON on stdout; used by the one-shot subcommands.
pub fn print_json(v: &serde_json::Value) -> eyre::Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize output")?;
    writeln!(std::io::stdout().lock(), "{s}").context("write output")?;
    Ok(())
}
