use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use tempfile::TempDir;

use sharepool::testkit::config::store_toml;

/// A throwaway pool directory with a config pointing into it.
pub struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    pub fn new(store_type: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let state = match store_type {
            "sqlite" => dir.path().join("pool.db"),
            _ => dir.path().join("pool.json"),
        };
        let config = dir.path().join("config.toml");
        fs::write(&config, store_toml(store_type, &state)).expect("write config");
        Self { dir, config }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> &Path {
        &self.config
    }

    /// `sharepool --config <workspace config> --color never`.
    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("sharepool");
        cmd.arg("--config")
            .arg(&self.config)
            .args(["--color", "never"])
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn run_ok(&self, args: &[&str]) {
        self.cmd().args(args).assert().success();
    }

    /// Run with `--json` and return the first payload of type `kind`.
    pub fn json_payload(&self, args: &[&str], kind: &str) -> serde_json::Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run sharepool");
        assert!(
            output.status.success(),
            "command {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .find(|value| value["type"] == kind)
            .map(|value| value["payload"].clone())
            .unwrap_or_else(|| panic!("no {kind} payload in output of {args:?}"))
    }
}

/// Read a decimal serialized as a JSON string.
pub fn decimal(value: &serde_json::Value) -> rust_decimal::Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
        .parse()
        .unwrap_or_else(|e| panic!("invalid decimal {value}: {e}"))
}
