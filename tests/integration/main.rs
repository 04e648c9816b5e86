//! Integration tests for setup-workspace

mod cli_tests {
    use assert_cmd::{Command, cargo::cargo_bin_cmd};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// The binary with a throwaway HOME and none of our variables inherited.
    fn setup_workspace(home: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("setup-workspace");
        cmd.env("HOME", home)
            .env("NO_COLOR", "1")
            .env_remove("SETUP_WORKSPACE_CONFIG")
            .env_remove("SETUP_WORKSPACE_STATE")
            .env_remove("SETUP_WORKSPACE_DEBUG")
            .env_remove("HF_HOME");
        cmd
    }

    /// A config that needs neither root nor network: no packages, and the installer
    /// is skipped because `sh` is on PATH and the env file already exists.
    fn offline_config(home: &TempDir, env_file_body: Option<&str>) -> PathBuf {
        let env_file = home.path().join("uv-env");
        if let Some(body) = env_file_body {
            fs::write(&env_file, body).unwrap();
        }
        let config = home.path().join("config.yaml");
        fs::write(
            &config,
            format!(
                "packages: []\ninstaller:\n  url: https://127.0.0.1:9/install.sh\n  timeout_secs: 2\n  skip_if_present: sh\n  env_file: {}\n",
                env_file.display()
            ),
        )
        .unwrap();
        config
    }

    #[test]
    fn help_displays() {
        let home = TempDir::new().unwrap();
        setup_workspace(home.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Bootstrap a workspace"));
    }

    #[test]
    fn version_displays() {
        let home = TempDir::new().unwrap();
        setup_workspace(home.path())
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn env_prints_default_cache_export() {
        let home = TempDir::new().unwrap();
        setup_workspace(home.path())
            .arg("env")
            .assert()
            .success()
            .stdout("export HF_HOME='/workspace/cache/'\n");
    }

    #[test]
    fn generate_refuses_to_overwrite_without_force() {
        let home = TempDir::new().unwrap();
        let config = home.path().join(".setup-workspace/config.yaml");

        setup_workspace(home.path()).arg("generate").assert().success();
        assert!(fs::read_to_string(&config).unwrap().contains("HF_HOME"));

        setup_workspace(home.path())
            .arg("generate")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("--force"));

        setup_workspace(home.path())
            .args(["generate", "--force"])
            .assert()
            .success();
    }

    #[test]
    fn dry_run_plans_every_step_and_prints_nothing() {
        let home = TempDir::new().unwrap();
        setup_workspace(home.path())
            .args(["now", "--dry-run"])
            .assert()
            .success()
            .stdout("")
            .stderr(
                predicate::str::contains("system-packages")
                    .and(predicate::str::contains("tool-installer"))
                    .and(predicate::str::contains("source-env"))
                    .and(predicate::str::contains("export HF_HOME='/workspace/cache/'")),
            );
        assert!(!home.path().join(".setup-workspace/state.json").exists());
    }

    #[test]
    fn successful_run_emits_sourced_and_cache_exports() {
        let home = TempDir::new().unwrap();
        let config = offline_config(&home, Some("export SETUP_WORKSPACE_MARKER=sourced\n"));

        setup_workspace(home.path())
            .args(["now", "--emit-env", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(
                predicate::str::contains("export SETUP_WORKSPACE_MARKER='sourced'\n")
                    .and(predicate::str::ends_with("export HF_HOME='/workspace/cache/'\n")),
            );

        let state = fs::read_to_string(home.path().join(".setup-workspace/state.json")).unwrap();
        assert!(state.contains("\"status\": \"complete\""));
        assert!(state.contains("\"cache_path\": \"/workspace/cache/\""));
    }

    #[test]
    fn trailing_command_sees_final_environment() {
        let home = TempDir::new().unwrap();
        let config = offline_config(&home, Some("export SETUP_WORKSPACE_MARKER=sourced\n"));

        setup_workspace(home.path())
            .args(["now", "--config"])
            .arg(&config)
            .args(["--", "sh", "-c", "printf '%s %s' \"$HF_HOME\" \"$SETUP_WORKSPACE_MARKER\""])
            .assert()
            .success()
            .stdout("/workspace/cache/ sourced");
    }

    #[test]
    fn trailing_command_exit_code_is_passed_through() {
        let home = TempDir::new().unwrap();
        let config = offline_config(&home, Some(""));

        setup_workspace(home.path())
            .args(["now", "--config"])
            .arg(&config)
            .args(["--", "sh", "-c", "exit 7"])
            .assert()
            .code(7);
    }

    #[test]
    fn second_run_yields_same_value() {
        let home = TempDir::new().unwrap();
        let config = offline_config(&home, Some(""));

        for _ in 0..2 {
            setup_workspace(home.path())
                .args(["now", "--emit-env", "--config"])
                .arg(&config)
                .assert()
                .success()
                .stdout("export HF_HOME='/workspace/cache/'\n");
        }
    }

    #[test]
    fn unreachable_installer_aborts_before_sourcing() {
        let home = TempDir::new().unwrap();
        // No env file, so the installer is not skipped and the fetch is attempted.
        let config = offline_config(&home, None);
        let state_path = home.path().join("state.json");

        setup_workspace(home.path())
            .args(["now", "--emit-env", "--config"])
            .arg(&config)
            .arg("--state")
            .arg(&state_path)
            .assert()
            .code(1)
            .stdout("")
            .stderr(predicate::str::contains("NetworkError"));

        let state: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&state_path).unwrap()).unwrap();
        assert_eq!(state["status"], "aborted");
        assert_eq!(state["aborted_at"]["number"], 2);
        assert_eq!(state["steps"][2]["name"], "source-env");
        assert_eq!(state["steps"][2]["outcome"], "not-run");
        assert_eq!(state["steps"][3]["outcome"], "not-run");
        assert!(state["cache_path"].is_null());
    }

    #[test]
    fn state_path_from_environment() {
        let home = TempDir::new().unwrap();
        let config = offline_config(&home, Some(""));
        let state_path = home.path().join("from-env.json");

        setup_workspace(home.path())
            .env("SETUP_WORKSPACE_CONFIG", &config)
            .env("SETUP_WORKSPACE_STATE", &state_path)
            .assert()
            .success();
        assert!(state_path.exists());
    }

    #[test]
    fn invalid_config_exits_with_two() {
        let home = TempDir::new().unwrap();
        let config = home.path().join("config.yaml");
        fs::write(&config, "cache:\n  variable: 1BAD\n").unwrap();

        setup_workspace(home.path())
            .args(["now", "--config"])
            .arg(&config)
            .assert()
            .code(2)
            .stdout("")
            .stderr(predicate::str::contains("ConfigError"));
    }

    #[test]
    fn missing_explicit_config_exits_with_two() {
        let home = TempDir::new().unwrap();
        setup_workspace(home.path())
            .args(["env", "--config"])
            .arg(home.path().join("nope.yaml"))
            .assert()
            .code(2);
    }
}
