//! End-to-end coverage of the `memory-cli` binary against a local redb
//! backend: seed a store directly through `memory-storage-redb`, then
//! drive `retrieve`, `statistics`, `backup`/`restore`/`validate`, and
//! `delete-workspace` through the compiled binary (§6).
//!
//! `solve` is intentionally not exercised here: it requires a live LLM
//! endpoint, which this suite has no business calling.

use assert_cmd::Command;
use memory_core::store::MemoryStore;
use memory_core::types::{Difficulty, Memory, Outcome};
use predicates::str::contains;

fn seed_memory(workspace_id: &str, title: &str) -> Memory {
    Memory::new(
        workspace_id.to_string(),
        title.to_string(),
        format!("description of {title}"),
        format!("content of {title}"),
        vec![0.1, 0.2, 0.3],
        Difficulty::Simple,
        "e2e-domain".to_string(),
        Outcome::Success,
    )
}

async fn seeded_db_path(dir: &std::path::Path, workspace_id: &str, titles: &[&str]) -> std::path::PathBuf {
    let db_path = dir.join("store.redb");
    let store = memory_storage_redb::RedbStore::open(&db_path).await.expect("open redb store");
    let memories: Vec<Memory> = titles.iter().map(|t| seed_memory(workspace_id, t)).collect();
    store.upsert(memories).await.expect("seed upsert");
    db_path
}

fn write_config(dir: &std::path::Path, db_path: &std::path::Path) -> std::path::PathBuf {
    let config_path = dir.join("config.toml");
    let contents = format!(
        "[backend]\nkind = \"redb\"\npath = \"{}\"\n",
        db_path.display().to_string().replace('\\', "\\\\")
    );
    std::fs::write(&config_path, contents).expect("write config");
    config_path
}

fn cli(config_path: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("memory-cli").expect("locate memory-cli binary");
    cmd.arg("--config").arg(config_path);
    // The gateway fails fast on an empty API key at construction time
    // (§7), even for commands that never call it.
    cmd.env("MEMORY_LLM_API_KEY", "test-key-unused");
    cmd
}

#[tokio::test]
async fn retrieve_sees_seeded_memories_scoped_to_workspace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = seeded_db_path(dir.path(), "ws1", &["alpha pattern"]).await;
    let config_path = write_config(dir.path(), &db_path);

    cli(&config_path)
        .args(["retrieve", "alpha pattern", "--workspace", "ws1"])
        .assert()
        .success()
        .stdout(contains("alpha pattern"));

    cli(&config_path)
        .args(["retrieve", "alpha pattern", "--workspace", "ws2"])
        .assert()
        .success()
        .stdout(contains("no matching memories"));
}

#[tokio::test]
async fn statistics_reports_seeded_memory_count() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = seeded_db_path(dir.path(), "ws1", &["one", "two"]).await;
    let config_path = write_config(dir.path(), &db_path);

    cli(&config_path)
        .args(["statistics", "--workspace", "ws1"])
        .assert()
        .success()
        .stdout(contains("memories=2"));
}

#[tokio::test]
async fn backup_then_restore_round_trips_into_a_fresh_workspace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = seeded_db_path(dir.path(), "ws1", &["backed up pattern"]).await;
    let config_path = write_config(dir.path(), &db_path);
    let archive_path = dir.path().join("ws1.tar.gz");

    cli(&config_path)
        .args(["backup", "ws1", "--path"])
        .arg(&archive_path)
        .assert()
        .success();
    assert!(archive_path.exists());

    cli(&config_path)
        .args(["validate", "--path"])
        .arg(&archive_path)
        .assert()
        .success()
        .stdout(contains("1 memories"));

    cli(&config_path)
        .args(["restore", "--path"])
        .arg(&archive_path)
        .args(["--target-workspace", "ws2"])
        .assert()
        .success()
        .stdout(contains("restored 1 memories into workspace ws2"));

    cli(&config_path)
        .args(["retrieve", "backed up pattern", "--workspace", "ws2"])
        .assert()
        .success()
        .stdout(contains("backed up pattern"));
}

#[tokio::test]
async fn delete_workspace_refuses_without_confirm() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = seeded_db_path(dir.path(), "ws1", &["doomed pattern"]).await;
    let config_path = write_config(dir.path(), &db_path);

    cli(&config_path).args(["delete-workspace", "ws1"]).assert().failure();

    cli(&config_path)
        .args(["delete-workspace", "ws1", "--confirm"])
        .assert()
        .success()
        .stdout(contains("deleted workspace ws1"));

    cli(&config_path)
        .args(["retrieve", "doomed pattern", "--workspace", "ws1"])
        .assert()
        .success()
        .stdout(contains("no matching memories"));
}
