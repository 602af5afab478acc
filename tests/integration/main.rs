//! Integration tests for spoolkeeper

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn spoolkeeper() -> Command {
        let mut cmd = cargo_bin_cmd!("spoolkeeper");
        cmd.env_remove("SPOOLKEEPER_API_KEY")
            .env_remove("SPOOLKEEPER_CONFIG");
        cmd
    }

    /// Write a config that keeps all state inside `dir`
    fn isolated_config(dir: &Path) -> PathBuf {
        let path = dir.join("config.toml");
        let content = format!(
            "[inventory]\nstate_dir = \"{}\"\nsession_dir = \"{}\"\n\n[images]\ncache_dir = \"{}\"\n",
            dir.join("state").display(),
            dir.join("session").display(),
            dir.join("images").display(),
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Command bound to an isolated config
    fn isolated(temp: &TempDir) -> Command {
        let config = isolated_config(temp.path());
        let mut cmd = spoolkeeper();
        cmd.arg("--plain").arg("--config").arg(config);
        cmd
    }

    #[test]
    fn help_displays() {
        spoolkeeper()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("filament inventory"));
    }

    #[test]
    fn version_displays() {
        spoolkeeper()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("spoolkeeper"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[catalog]"))
            .stdout(predicate::str::contains("locale = \"US\""));
    }

    #[test]
    fn config_set_persists_and_masks_key() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["config", "set", "catalog.api_key", "sk-live-123"])
            .assert()
            .success();

        isolated(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("********"))
            .stdout(predicate::str::contains("sk-live-123").not());
    }

    #[test]
    fn config_set_unknown_key() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn stock_lists_both_series() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .arg("stock")
            .assert()
            .success()
            .stdout(predicate::str::contains("PLA Matte"))
            .stdout(predicate::str::contains("PLA Basic"))
            .stdout(predicate::str::contains("pla-basic-black"));
    }

    #[test]
    fn stock_set_flags_low_stock() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["stock", "set", "pla-basic-black", "30"])
            .assert()
            .success()
            .stdout(predicate::str::contains("30.0g"));

        isolated(&temp)
            .args(["stock", "--series", "basic"])
            .assert()
            .success()
            .stdout(predicate::str::contains("30.0g low"))
            .stdout(predicate::str::contains("PLA Matte").not());
    }

    #[test]
    fn stock_set_negative_clamps() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["stock", "set", "pla-basic-black", "-20"])
            .assert()
            .success()
            .stdout(predicate::str::contains("0.0g"));
    }

    #[test]
    fn stock_set_unknown_filament() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["stock", "set", "petg-mystery", "100"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Filament not found"));
    }

    #[test]
    fn stock_reset_restores_defaults() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["stock", "set", "pla-basic-black", "10"])
            .assert()
            .success();

        isolated(&temp)
            .args(["stock", "reset", "--yes"])
            .assert()
            .success();

        isolated(&temp)
            .args(["stock", "--series", "basic"])
            .assert()
            .success()
            .stdout(predicate::str::contains("10.0g").not());
    }

    #[test]
    fn queue_empty() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .arg("queue")
            .assert()
            .success()
            .stdout(predicate::str::contains("Print queue is empty"));
    }

    #[test]
    fn queue_json_empty() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["queue", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn queue_remove_out_of_range_is_noop() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["queue", "remove", "3"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing queued at position 3"));
    }

    #[test]
    fn designs_requires_api_key() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .arg("designs")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No API key"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn image_failure_falls_back_to_url() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .args(["image", "http://127.0.0.1:9/eevee.png", "--label", "Eevee"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Could not load image"))
            .stdout(predicate::str::contains("http://127.0.0.1:9/eevee.png"));
    }
}
