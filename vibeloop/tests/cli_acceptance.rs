use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const BIN: &str = "vibeloop";

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn data_dir(&self) -> PathBuf {
        self.xdg_data.join("vibeloop")
    }

    fn write_config(&self, content: &str) {
        let dir = self.xdg_config.join("vibeloop");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), content).expect("failed to write config");
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("vibeloop"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute {BIN}: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "{BIN} {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

/// Run and require success, returning stdout.
fn run_ok(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run_bin(env, args);
    assert_success(args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn pet_status_hatches_a_pet_and_feeding_respects_cooldown() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["--user", "tester", "pet", "status"]);
    assert!(
        stdout.contains("Vibe the Spark"),
        "expected freshly hatched pet, got:\n{stdout}"
    );
    assert!(stdout.contains("Cooldowns:"));
    assert!(env.data_dir().join("data.db").exists());

    let stdout = run_ok(&env, &["--user", "tester", "pet", "feed"]);
    assert!(stdout.contains("You chose feed"), "got:\n{stdout}");

    let output = run_bin(&env, &["--user", "tester", "pet", "feed"]);
    assert!(!output.status.success(), "second feed should be refused");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("cooling down"),
        "expected cooldown error, got:\n{stderr}"
    );
}

#[test]
fn pet_rename_and_items() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["pet", "rename", "Nova"]);
    assert!(stdout.contains("Nova"));

    let stdout = run_ok(&env, &["pet", "items"]);
    assert!(stdout.contains("halo"));
    assert!(stdout.contains("holders only"));

    let output = run_bin(&env, &["pet", "equip", "halo"]);
    assert!(!output.status.success(), "unowned item cannot be equipped");
}

#[test]
fn card_pull_is_once_per_day() {
    let env = CliTestEnv::new();

    let first = run_ok(&env, &["card", "pull"]);
    assert!(!first.contains("already pulled"));

    let second = run_ok(&env, &["card", "pull"]);
    assert!(
        second.contains("You already pulled today's card."),
        "got:\n{second}"
    );

    // Same card both times
    let title = first.lines().next().expect("missing card title");
    assert!(second.contains(title), "expected {title:?} in:\n{second}");
}

#[test]
fn card_reflect_completes_the_day() {
    let env = CliTestEnv::new();

    // Reflecting before pulling is an error
    let early = run_bin(
        &env,
        &["card", "reflect", "--text", "I noticed the light this morning."],
    );
    assert!(!early.status.success());

    run_ok(&env, &["card", "pull"]);
    let args = [
        "card",
        "reflect",
        "--text",
        "I noticed the light this morning.",
        "--rating",
        "5",
        "--before",
        "tired",
        "--after",
        "calm",
    ];
    let stdout = run_ok(&env, &args);
    assert!(stdout.contains("Practice complete"), "got:\n{stdout}");
    assert!(stdout.contains("Mood shift: +2"));

    let history = run_ok(&env, &["card", "history"]);
    assert!(history.contains("[✓]"), "got:\n{history}");

    let json = run_ok(&env, &["dashboard", "--json"]);
    let dash: serde_json::Value = serde_json::from_str(&json).expect("dashboard is not JSON");
    assert_eq!(dash["user_id"], "local");
    assert_eq!(dash["streak"]["current"], 1);
    assert_eq!(dash["streak"]["total_practices"], 1);
    assert_eq!(dash["today"]["completed"], true);
    assert!(dash["pet"].is_null());
}

#[test]
fn short_reflection_is_rejected() {
    let env = CliTestEnv::new();
    run_ok(&env, &["card", "pull"]);

    let output = run_bin(&env, &["card", "reflect", "--text", "ok"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reflection incomplete"), "got:\n{stderr}");
}

#[test]
fn favorites_round_trip() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["card", "favorite", "breath-1"]);
    assert!(stdout.contains("Saved breath-1"));
    let stdout = run_ok(&env, &["card", "favorite", "breath-1"]);
    assert!(stdout.contains("already a favorite"));

    let stdout = run_ok(&env, &["card", "favorites"]);
    assert!(stdout.contains("breath-1"));

    let stdout = run_ok(&env, &["card", "unfavorite", "breath-1"]);
    assert!(stdout.contains("Removed breath-1"));
    let stdout = run_ok(&env, &["card", "favorites"]);
    assert!(stdout.contains("No favorites yet."));
}

#[test]
fn play_submits_to_leaderboard() {
    let env = CliTestEnv::new();

    let args = ["--user", "ace", "play", "blaster", "--seed", "7", "--seconds", "10"];
    let stdout = run_ok(&env, &args);
    assert!(stdout.contains("Chakra Blaster (seed 7)"), "got:\n{stdout}");

    let args = ["--user", "bee", "play", "bubbles", "--seed", "7", "--seconds", "10"];
    run_ok(&env, &args);

    let board = run_ok(&env, &["scores", "--game", "blaster"]);
    assert!(board.contains("ace"), "got:\n{board}");
    assert!(!board.contains("bee"));

    let all = run_ok(&env, &["scores"]);
    assert!(all.contains("Chakra Blaster"));
    assert!(all.contains("Challenge Bubbles"));
    assert!(all.contains("bee"));

    let output = run_bin(&env, &["play", "tetris"]);
    assert!(!output.status.success());
}

#[test]
fn demo_backend_from_config() {
    let env = CliTestEnv::new();
    env.write_config("[storage]\nbackend = \"demo\"\n");

    let stdout = run_ok(&env, &["mood", "log", "calm", "--energy", "3", "--note", "  walk  "]);
    assert!(stdout.contains("energy 3/5"), "got:\n{stdout}");

    assert!(env.data_dir().join("demo.json").exists());
    assert!(!env.data_dir().join("data.db").exists());

    let summary = run_ok(&env, &["mood", "summary"]);
    assert!(summary.contains("1 check-ins"), "got:\n{summary}");
    assert!(summary.contains("Mostly"));
    assert!(summary.contains("walk"), "trimmed note should be listed:\n{summary}");

    let output = run_bin(&env, &["mood", "log", "calm", "--energy", "9"]);
    assert!(!output.status.success(), "energy above 5 must be rejected");
}

#[test]
fn wallet_connect_without_functions_host() {
    let env = CliTestEnv::new();
    let address = "0x52908400098527886E0F7030069857D2E4169EE7";

    let stdout = run_ok(&env, &["wallet", "connect", "--chain", "evm", address]);
    assert!(stdout.contains("Connected WalletConnect (Base) wallet 0x5290…9EE7"));
    assert!(stdout.contains("Holder check skipped"));

    let dash = run_ok(&env, &["dashboard"]);
    assert!(dash.contains("Wallet: 0x5290…9EE7"), "got:\n{dash}");

    let bad = run_bin(&env, &["wallet", "connect", "--chain", "algorand", address]);
    assert!(!bad.status.success());

    let stdout = run_ok(&env, &["wallet", "disconnect"]);
    assert!(stdout.contains("Wallet disconnected."));
}
