use std::path::Path;

use predicates::prelude::*;

fn lectio(data_dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("lectio");
    cmd.current_dir(data_dir)
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(data_dir.join("data"));
    cmd
}

/// 从输出中取出新文本的标识
fn saved_id(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .find_map(|line| line.strip_prefix("🆔 "))
        .map(str::to_string)
        .expect("id line in output")
}

#[test]
fn list_on_empty_library() {
    let dir = tempfile::tempdir().unwrap();
    lectio(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("书库为空"));
}

#[test]
fn add_list_delete_round() {
    let dir = tempfile::tempdir().unwrap();

    let output = lectio(dir.path())
        .arg("add")
        .write_stdin("Speed reading one word at a time.")
        .output()
        .unwrap();
    assert!(output.status.success());
    let id = saved_id(&output.stdout);

    lectio(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()).and(predicate::str::contains("0%")));

    lectio(dir.path())
        .args(["delete", id.as_str()])
        .assert()
        .success();

    lectio(dir.path())
        .args(["delete", id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("找不到文本"));
}

#[test]
fn add_rejects_blank_input() {
    let dir = tempfile::tempdir().unwrap();
    lectio(dir.path())
        .arg("add")
        .write_stdin("   \n  ")
        .assert()
        .failure()
        .stderr(predicate::str::contains("没有可读取的文本内容"));
}

#[test]
fn read_unknown_id_fails() {
    let dir = tempfile::tempdir().unwrap();
    lectio(dir.path())
        .args(["read", "missing"])
        .write_stdin("q\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("找不到文本"));
}

#[test]
fn read_requires_a_terminal_and_keeps_position() {
    let dir = tempfile::tempdir().unwrap();
    let output = lectio(dir.path())
        .arg("add")
        .write_stdin("alpha beta gamma delta")
        .output()
        .unwrap();
    let id = saved_id(&output.stdout);

    // 管道输入不是终端
    lectio(dir.path())
        .args(["read", id.as_str(), "--wpm", "100"])
        .write_stdin(" \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("交互式终端"));

    lectio(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("0%"));
}

#[test]
fn init_config_writes_file_once() {
    let dir = tempfile::tempdir().unwrap();
    lectio(dir.path())
        .arg("init-config")
        .assert()
        .success();
    assert!(dir.path().join("lectio.yaml").exists());

    lectio(dir.path())
        .arg("init-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("配置文件已存在"));
}

#[test]
fn rust_log_debug_emits_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    lectio(dir.path())
        .env("RUST_LOG", "debug")
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("config file not found"));
}
