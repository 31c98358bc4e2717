//! Persistence through each store backend.

use std::fs;

use rust_decimal_macros::dec;
use tempfile::tempdir;

use sharepool::adapter::{open_store, FileStore, MemoryStore, SqliteStore};
use sharepool::config::StoreConfig;
use sharepool::domain::PoolState;
use sharepool::error::Error;
use sharepool::ledger::Ledger;
use sharepool::port::LedgerStore;
use sharepool::testkit::ledger::closed_at_gain;

fn play_scenario<S: LedgerStore>(ledger: &Ledger<S>) {
    ledger.deposit("alice", dec!(100)).unwrap();
    ledger.deposit("bob", dec!(200)).unwrap();
    let open = ledger.open_position(dec!(300), dec!(120)).unwrap();
    ledger.close_position_checked(open.seq(), dec!(324)).unwrap();
    ledger.withdraw("alice", dec!(50)).unwrap();
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pool.json");

    let original = {
        let ledger = Ledger::open(FileStore::new(&path)).unwrap();
        play_scenario(&ledger);
        ledger.snapshot()
    };

    let reopened = Ledger::open(FileStore::new(&path)).unwrap();
    assert!(!reopened.is_halted());
    assert_eq!(*reopened.snapshot(), *original);
    assert_eq!(reopened.account_stats("alice").unwrap().current_value, dec!(54));
    reopened.audit().unwrap();
}

#[test]
fn file_store_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::open(FileStore::new(dir.path().join("pool.json"))).unwrap();
    play_scenario(&ledger);

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["pool.json".to_string()]);
}

#[test]
fn sqlite_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pool.db");

    let original = {
        let ledger = Ledger::open(SqliteStore::open(&path).unwrap()).unwrap();
        play_scenario(&ledger);
        ledger.snapshot()
    };

    let reopened = Ledger::open(SqliteStore::open(&path).unwrap()).unwrap();
    assert_eq!(*reopened.snapshot(), *original);
    assert_eq!(reopened.pool_summary().unwrap().cash, dec!(270));
}

#[test]
fn failed_save_keeps_committed_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pool.json");
    let ledger = Ledger::open(FileStore::new(&path)).unwrap();
    ledger.deposit("alice", dec!(10)).unwrap();

    // A non-empty directory in place of the state file makes the rename fail.
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();
    fs::write(path.join("blocker"), "x").unwrap();

    assert!(ledger.deposit("alice", dec!(5)).is_err());
    assert_eq!(ledger.snapshot().cash, dec!(10));
    assert!(!ledger.is_halted());
}

#[test]
fn tampered_file_opens_halted_and_can_be_reconciled() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pool.json");
    {
        let ledger = Ledger::open(FileStore::new(&path)).unwrap();
        play_scenario(&ledger);
    }

    let mut doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    doc["state"]["total_shares"] = serde_json::Value::String("999".into());
    fs::write(&path, doc.to_string()).unwrap();

    let ledger = Ledger::open(FileStore::new(&path)).unwrap();
    assert!(ledger.is_halted());
    assert!(ledger.deposit("carol", dec!(1)).is_err());

    let mut repaired = (*ledger.snapshot()).clone();
    repaired.total_shares = dec!(250);
    ledger.reconcile(repaired).unwrap();
    ledger.deposit("carol", dec!(1.08)).unwrap();
    assert_eq!(ledger.account_stats("carol").unwrap().shares, dec!(1));
}

#[test]
fn memory_store_shares_state_between_ledgers() {
    let store = std::sync::Arc::new(MemoryStore::new());
    {
        let ledger = Ledger::open(std::sync::Arc::clone(&store)).unwrap();
        ledger.deposit("alice", dec!(5)).unwrap();
    }
    let ledger = Ledger::open(store).unwrap();
    assert_eq!(ledger.snapshot().cash, dec!(5));
}

#[test]
fn open_store_follows_config() {
    let dir = tempdir().unwrap();

    let memory = open_store(&StoreConfig::Memory).unwrap();
    assert_eq!(memory.describe(), "memory");

    let file = open_store(&StoreConfig::File {
        path: dir.path().join("a.json"),
    })
    .unwrap();
    assert!(file.describe().starts_with("file:"));
    assert_eq!(file.load().unwrap(), PoolState::default());

    let sqlite = open_store(&StoreConfig::Sqlite {
        path: dir.path().join("nested").join("a.db"),
    })
    .unwrap();
    assert!(sqlite.describe().starts_with("sqlite:"));
    assert!(dir.path().join("nested").join("a.db").exists());
}

#[test]
fn stores_agree_on_the_same_state() {
    let dir = tempdir().unwrap();
    let state = (*closed_at_gain().snapshot()).clone();

    let file = FileStore::new(dir.path().join("s.json"));
    let sqlite = SqliteStore::open(&dir.path().join("s.db")).unwrap();
    file.save(&state, 0).unwrap();
    sqlite.save(&state, 0).unwrap();

    assert_eq!(file.load().unwrap(), sqlite.load().unwrap());
}

#[test]
fn two_sqlite_writers_never_lose_a_commit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pool.db");
    let first = Ledger::open(SqliteStore::open(&path).unwrap()).unwrap();
    let second = Ledger::open(SqliteStore::open(&path).unwrap()).unwrap();

    first.deposit("alice", dec!(100)).unwrap();
    let err = second.deposit("bob", dec!(200)).unwrap_err();
    assert!(matches!(err, Error::StoreConflict { expected: 0, found: 1 }));
    second.deposit("bob", dec!(200)).unwrap();

    let reopened = Ledger::open(SqliteStore::open(&path).unwrap()).unwrap();
    let state = reopened.snapshot();
    assert_eq!(state.cash, dec!(300));
    assert_eq!(state.accounts.len(), 2);
    reopened.audit().unwrap();
}

#[test]
fn two_file_writers_never_lose_a_commit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pool.json");
    let first = Ledger::open(FileStore::new(&path)).unwrap();
    let second = Ledger::open(FileStore::new(&path)).unwrap();

    first.deposit("alice", dec!(100)).unwrap();
    let err = second.deposit("bob", dec!(200)).unwrap_err();
    assert!(matches!(err, Error::StoreConflict { expected: 0, found: 1 }));
    second.deposit("bob", dec!(200)).unwrap();

    let reopened = Ledger::open(FileStore::new(&path)).unwrap();
    let state = reopened.snapshot();
    assert_eq!(state.cash, dec!(300));
    assert_eq!(state.accounts.len(), 2);
    reopened.audit().unwrap();
}
