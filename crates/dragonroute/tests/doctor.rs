use std::process::Command;

use eyre::Context as _;

#[test]
fn doctor_json_runs_and_returns_valid_json() -> eyre::Result<()> {
    let exe = assert_cmd::cargo::cargo_bin!("dragonroute");

    let cfg_dir = tempfile::tempdir()?;
    let data_dir = tempfile::tempdir()?;

    let out = Command::new(exe)
        .env("DRAGONROUTE_CONFIG_DIR", cfg_dir.path())
        .env("DRAGONROUTE_DATA_DIR", data_dir.path())
        .args(["doctor", "--json"])
        .output()
        .context("run dragonroute doctor --json")?;

    assert!(
        out.status.success(),
        "doctor exited non-zero: status={:?}, stderr={}",
        out.status.code(),
        String::from_utf8_lossy(&out.stderr)
    );

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).context("parse doctor json")?;
    assert_eq!(v.get("ok").and_then(serde_json::Value::as_bool), Some(true), "ok flag");
    assert!(v.get("version").and_then(|x| x.as_str()).is_some(), "version");
    assert!(v.get("paths").and_then(|x| x.as_object()).is_some(), "paths");
    assert_eq!(
        v.pointer("/config/exists").and_then(serde_json::Value::as_bool),
        Some(false),
        "doctor does not create config"
    );
    Ok(())
}

#[test]
fn paths_reports_override_dirs() -> eyre::Result<()> {
    let cfg_dir = tempfile::tempdir()?;
    let data_dir = tempfile::tempdir()?;

    let assert = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("dragonroute"))
        .env("DRAGONROUTE_CONFIG_DIR", cfg_dir.path())
        .env("DRAGONROUTE_DATA_DIR", data_dir.path())
        .arg("paths")
        .assert()
        .success()
        .stdout(predicates::str::contains("dragonroute.log.jsonl"));
    let v: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(
        v.get("config_dir").and_then(serde_json::Value::as_str),
        cfg_dir.path().to_str(),
        "config dir override"
    );
    Ok(())
}

#[test]
fn cli_quote_rejects_slippage_above_the_configured_ceiling() -> eyre::Result<()> {
    let cfg_dir = tempfile::tempdir()?;
    let data_dir = tempfile::tempdir()?;

    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("dragonroute"))
        .env("DRAGONROUTE_CONFIG_DIR", cfg_dir.path())
        .env("DRAGONROUTE_DATA_DIR", data_dir.path())
        .env("DRAGONROUTE_RPC_URL", "http://127.0.0.1:9")
        .args(["quote", "USDT", "KAIA", "1", "--slippage-bps", "6000"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("6000"));
    Ok(())
}
