//! Tests for the leaf command line

#![allow(clippy::expect_used)]

mod common;

use assert_cmd::Command;
use leaf_loader::transform::class::{Access, ClassImage};
use predicates::prelude::*;
use serde_json::{Value, json};

use common::{TestGame, manifest, player_class};

#[allow(deprecated)]
fn leaf_cmd(game: &TestGame) -> Command {
    let mut cmd = Command::cargo_bin("leaf").expect("leaf binary");
    cmd.arg("-g").arg(&game.path).env_remove("LEAF_LOG");
    cmd
}

// ============================================================================
// Help and version
// ============================================================================

#[test]
fn test_help_lists_commands() {
    leaf_cmd(&TestGame::new())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("verify-libraries"))
        .stdout(predicate::str::contains("transform"));
}

#[test]
fn test_version_command() {
    leaf_cmd(&TestGame::new())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("leaf {}", env!("CARGO_PKG_VERSION"))));
}

// ============================================================================
// Completions command
// ============================================================================

#[test]
fn test_completions_bash() {
    leaf_cmd(&TestGame::new())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_leaf"));
}

#[test]
fn test_completions_unknown_shell() {
    leaf_cmd(&TestGame::new())
        .args(["completions", "tcsh"])
        .assert()
        .failure();
}

// ============================================================================
// Logging
// ============================================================================

#[test]
fn test_log_level_from_config_file() {
    let game = TestGame::new();
    game.add_mod("core", &manifest("core", "1.0.0", json!({})));

    leaf_cmd(&game)
        .arg("scan")
        .assert()
        .success()
        .stderr(predicate::str::contains("Found mod").not());

    game.write_file("leaf.yaml", "log_level: debug\n");
    leaf_cmd(&game)
        .arg("scan")
        .assert()
        .success()
        .stderr(predicate::str::contains("Found mod"));
}

// ============================================================================
// Scan and resolve
// ============================================================================

#[test]
fn test_scan_json() {
    let game = TestGame::new();
    game.add_mod("core", &manifest("core", "1.0.0", json!({})));
    game.write_file("mods/plain.jar", "not an archive");

    let output = leaf_cmd(&game)
        .args(["scan", "--json"])
        .output()
        .expect("run leaf");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("json output");
    let ids: Vec<&str> = report["candidates"]
        .as_array()
        .expect("candidates")
        .iter()
        .filter_map(|c| c["id"].as_str())
        .collect();
    assert!(ids.contains(&"core"));
    assert_eq!(report["skipped"].as_array().expect("skipped").len(), 1);
}

#[test]
fn test_resolve_prints_load_order() {
    let game = TestGame::new();
    game.add_mod("core", &manifest("core", "1.0.0", json!({})));
    game.add_mod("addon", &manifest("addon", "1.0.0", json!({"depends": {"core": "*"}})));

    leaf_cmd(&game)
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loading 4 mods:"))
        .stdout(predicate::str::contains("addon 1.0.0"));
}

#[test]
fn test_resolve_conflict_fails() {
    let game = TestGame::new();
    game.add_mod("core", &manifest("core", "1.0.0", json!({})));
    game.add_mod("addon", &manifest("addon", "1.0.0", json!({"depends": {"core": ">=2"}})));

    leaf_cmd(&game)
        .arg("resolve")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Incompatible mod set"));
}

#[test]
fn test_disable_flag_removes_conflict() {
    let game = TestGame::new();
    game.add_mod("left", &manifest("left", "1.0.0", json!({"conflicts": {"right": "*"}})));
    game.add_mod("right", &manifest("right", "1.0.0", json!({})));

    leaf_cmd(&game)
        .args(["resolve", "--disable", "right"])
        .assert()
        .success()
        .stdout(predicate::str::contains("left 1.0.0"))
        .stdout(predicate::str::contains("right").not());
}

// ============================================================================
// Libraries
// ============================================================================

#[test]
fn test_verify_libraries_without_manifest() {
    leaf_cmd(&TestGame::new())
        .arg("verify-libraries")
        .assert()
        .failure()
        .stderr(predicate::str::contains("library manifest"));
}

#[test]
fn test_verify_libraries_reports_missing_artifact() {
    let game = TestGame::new();
    game.write_file(
        "libraries.json",
        r#"{"version": 2, "libraries": {"common": [
            {"name": "org.ow2.asm:asm:9.7",
             "md5": "900150983cd24fb0d6963f7d28e17f72",
             "sha1": "a9993e364706816aba3e25717850c26c9cd0d89d"}]}}"#,
    );

    leaf_cmd(&game)
        .args(["verify-libraries", "--library-manifest", "libraries.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("org.ow2.asm:asm:9.7"));

    game.write_file("libraries/org/ow2/asm/asm/9.7/asm-9.7.jar", "abc");
    leaf_cmd(&game)
        .args(["verify-libraries", "--library-manifest", "libraries.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 library verified"));
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn test_transform_writes_widened_class() {
    let game = TestGame::new();
    game.add_mod(
        "widener",
        &manifest(
            "widener",
            "1.0.0",
            json!({"accessWidening": ["accessible field net/game/Player health I"]}),
        ),
    );
    game.add_class(&player_class());
    let output = game.path.join("Player.class");

    leaf_cmd(&game)
        .args(["--class-path", "classes", "transform", "net/game/Player", "--replay", "-o"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("replay produced identical bytes"));

    let bytes = std::fs::read(&output).expect("transformed class written");
    let image = ClassImage::decode("net/game/Player", &bytes).expect("decode");
    assert_eq!(image.field("health", "I").expect("field").access, Access::PUBLIC);
}

#[test]
fn test_transform_unknown_class_fails() {
    let game = TestGame::new();
    game.add_class(&player_class());

    leaf_cmd(&game)
        .args(["--class-path", "classes", "transform", "net/game/Zombie"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("net/game/Zombie"));
}

// ============================================================================
// Boot
// ============================================================================

#[test]
fn test_skipped_package_is_reported_once() {
    let game = TestGame::new();
    game.write_file("mods/plain.jar", "not an archive");

    let output = leaf_cmd(&game)
        .args(["boot", "--dry-run"])
        .output()
        .expect("run leaf");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.lines().filter(|l| l.contains("plain.jar")).count(), 1);
}

#[test]
fn test_boot_dry_run() {
    let game = TestGame::new();
    game.add_mod("core", &manifest("core", "1.0.0", json!({})));

    leaf_cmd(&game)
        .args(["boot", "--dry-run"])
        .assert()
        .success();
}
