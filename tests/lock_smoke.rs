// Multi-process lock smoke test for write serialization.
use std::process::{Command, Stdio};

use tablekv::api::Database;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_tablekv");
    Command::new(exe)
}

#[test]
fn concurrent_updates_are_serialized() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path();

    for args in [
        vec!["create-database", "lockdb"],
        vec!["create-table", "lockdb", "first"],
        vec!["create-table", "lockdb", "second"],
    ] {
        let status = cmd()
            .arg("--dir")
            .arg(dir)
            .args(&args)
            .stdout(Stdio::null())
            .status()
            .expect("setup");
        assert!(status.success());
    }

    let workers = 8;
    let mut children = Vec::new();
    for i in 0..workers {
        let table = if i % 2 == 0 { "first" } else { "second" };
        let child = cmd()
            .arg("--dir")
            .arg(dir)
            .args(["update", "lockdb", table, &format!("k{i}"), &format!("v{i}")])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn");
        children.push(child);
    }

    for mut child in children {
        let status = child.wait().expect("wait");
        assert!(status.success());
    }

    let mut db = Database::open(dir.join("lockdb")).expect("open");
    for i in 0..workers {
        let table = if i % 2 == 0 { "first" } else { "second" };
        let other = if i % 2 == 0 { "second" } else { "first" };
        let key = format!("k{i}");
        assert_eq!(
            db.read(table, &key).expect("read"),
            Some(format!("v{i}")),
            "{key} in {table}"
        );
        assert_eq!(db.read(other, &key).expect("read"), None);
    }
    assert_eq!(db.table_bounds("first").expect("first").len(), workers / 2);
    assert_eq!(db.table_bounds("second").expect("second").len(), workers / 2);
}
