//! CLI integration tests for launchpad.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn launchpad() -> Command {
    let mut cmd = cargo_bin_cmd!("launchpad");
    for key in [
        "LAUNCHPAD_RPC_URL",
        "LAUNCHPAD_STORE_URL",
        "LAUNCHPAD_UPLOAD_URL",
        "LAUNCHPAD_VERIFY_URL",
        "LAUNCHPAD_NETWORK",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

fn write_config(dir: &Path, content: &str) {
    let launch_dir = dir.join(".launchpad");
    fs::create_dir_all(&launch_dir).unwrap();
    fs::write(launch_dir.join("launchpad.toml"), content).unwrap();
}

fn write_campaign(dir: &Path, document: serde_json::Value) {
    let campaigns = dir.join(".launchpad/campaigns");
    fs::create_dir_all(&campaigns).unwrap();
    let id = document["id"].as_str().unwrap().to_string();
    fs::write(
        campaigns.join(format!("{id}.json")),
        serde_json::to_string_pretty(&document).unwrap(),
    )
    .unwrap();
}

mod cli_basics {
    use super::*;

    #[test]
    fn test_launchpad_help() {
        launchpad()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("status"));
    }

    #[test]
    fn test_launchpad_version() {
        launchpad()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("launchpad"));
    }

    #[test]
    fn test_run_requires_campaign() {
        launchpad().arg("run").assert().failure();
    }
}

mod config_commands {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let dir = create_temp_project();
        launchpad()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created"));

        let path = dir.path().join(".launchpad/launchpad.toml");
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("[deployment]"));
        assert!(content.contains("confirmations = 5"));

        launchpad()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_show_reflects_network_flag() {
        let dir = create_temp_project();
        launchpad()
            .current_dir(dir.path())
            .args(["--network", "base", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("name = \"base\""))
            .stdout(predicate::str::contains("chain_id = 8453"));
    }

    #[test]
    fn test_config_show_applies_env_override() {
        let dir = create_temp_project();
        launchpad()
            .current_dir(dir.path())
            .env("LAUNCHPAD_RPC_URL", "https://rpc.from-env")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://rpc.from-env"));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = create_temp_project();
        write_config(
            dir.path(),
            "[commitment]\nmode = \"remote\"\n\n[deployment]\nconfirmations = 0\n",
        );
        launchpad()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("commitment.url"))
            .stdout(predicate::str::contains("confirmations is 0"))
            .stdout(predicate::str::contains("bytecode_path"));
    }

    #[test]
    fn test_invalid_config_fails() {
        let dir = create_temp_project();
        write_config(dir.path(), "[store]\nbackend = \"carrier-pigeon\"\n");
        launchpad()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("launchpad.toml"));
    }
}

mod status_command {
    use super::*;

    #[test]
    fn test_status_unknown_campaign_fails() {
        let dir = create_temp_project();
        launchpad()
            .current_dir(dir.path())
            .args(["status", "ghost"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("ghost"));
    }

    #[test]
    fn test_status_shows_percentage() {
        let dir = create_temp_project();
        write_campaign(
            dir.path(),
            json!({
                "id": "camp-1",
                "name": "Camp One",
                "maxSupply": 100,
                "allowlist": ["0xa1", "0xb2", "0xc3"],
                "deploymentProgress": {
                    "currentStep": "commitmentGenerated",
                    "assets": {
                        "imageRef": "ipfs://IMG",
                        "metadataRef": "ipfs://X/0",
                        "baseURI": "ipfs://X/",
                        "completedAt": "2026-01-01T00:00:00Z"
                    },
                    "commitment": {
                        "root": "0xabc",
                        "memberCount": 3,
                        "completedAt": "2026-01-01T00:00:01Z"
                    },
                    "revision": 2
                }
            }),
        );

        launchpad()
            .current_dir(dir.path())
            .args(["status", "camp-1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("commitmentGenerated"))
            .stdout(predicate::str::contains("66% complete"))
            .stdout(predicate::str::contains("ipfs://X/"))
            .stdout(predicate::str::contains("3 members"));
    }

    #[test]
    fn test_status_json_normalizes_step() {
        let dir = create_temp_project();
        write_campaign(
            dir.path(),
            json!({
                "id": "camp-2",
                "name": "Camp Two",
                "maxSupply": 10,
                "deploymentProgress": {
                    "currentStep": "complete",
                    "assets": {
                        "imageRef": "ipfs://IMG",
                        "metadataRef": "ipfs://X/0",
                        "baseURI": "ipfs://X/",
                        "completedAt": "2026-01-01T00:00:00Z"
                    }
                }
            }),
        );

        let output = launchpad()
            .current_dir(dir.path())
            .args(["status", "camp-2", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let progress: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(progress["currentStep"], "assetsPublished");
    }
}

mod run_command {
    use super::*;

    #[test]
    fn test_run_without_bytecode_fails() {
        let dir = create_temp_project();
        launchpad()
            .current_dir(dir.path())
            .args(["run", "camp-1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("bytecode"));
    }

    #[test]
    fn test_run_reports_failing_step_and_keeps_progress() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join("contracts")).unwrap();
        fs::write(dir.path().join("contracts/CampaignNFT.bin"), "0x6080").unwrap();
        fs::write(dir.path().join("badge.png"), b"png").unwrap();
        write_config(
            dir.path(),
            "[storage]\nupload_url = \"http://127.0.0.1:9/upload\"\ntimeout_secs = 2\n",
        );
        write_campaign(
            dir.path(),
            json!({
                "id": "camp-1",
                "name": "Camp One",
                "maxSupply": 100,
                "imagePath": dir.path().join("badge.png"),
                "allowlist": ["0xa1"]
            }),
        );

        launchpad()
            .current_dir(dir.path())
            .args(["run", "camp-1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("assets failed"))
            .stderr(predicate::str::contains("ExternalServiceError"));

        launchpad()
            .current_dir(dir.path())
            .args(["status", "camp-1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("notStarted"))
            .stdout(predicate::str::contains("0% complete"));
    }

    #[test]
    fn test_verify_requires_deployment() {
        let dir = create_temp_project();
        write_campaign(
            dir.path(),
            json!({ "id": "camp-1", "name": "Camp One", "maxSupply": 1 }),
        );
        launchpad()
            .current_dir(dir.path())
            .args(["verify", "camp-1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no deployed contract"));
    }
}
