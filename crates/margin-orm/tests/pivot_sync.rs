mod common;

use common::{add_post, add_user, create_test_db, PostUser};
use margin_orm::{PivotTable, SqlValue};

#[test]
fn sync_deletes_stale_and_inserts_missing() {
    let conn = create_test_db();
    let a = add_user(&conn, "a");
    let b = add_user(&conn, "b");
    let c = add_user(&conn, "c");
    let post = add_post(&conn, 0, a, "p");
    let table = PivotTable::<PostUser>::new(&conn, post, "mention");
    table.sync([a, b]).expect("initial sync");

    conn.reset();
    let added = table.sync([b, c]).expect("sync");
    assert_eq!(added.into_vec(), vec![c]);

    let statements = conn.statements();
    assert_eq!(statements.len(), 3);
    assert!(statements[0].sql.starts_with("SELECT"));
    assert!(statements[1].sql.starts_with("DELETE"));
    assert_eq!(statements[1].params.last(), Some(&SqlValue::Int(a)));
    assert!(statements[2].sql.starts_with("INSERT"));
    assert!(statements[2].params.contains(&SqlValue::Int(c)));

    let mut keys = table.keys().expect("keys").into_vec();
    keys.sort_unstable();
    assert_eq!(keys, vec![b, c]);
}

#[test]
fn sync_with_no_change_only_reads() {
    let conn = create_test_db();
    let a = add_user(&conn, "a");
    let post = add_post(&conn, 0, a, "p");
    let table = PivotTable::<PostUser>::new(&conn, post, "mention");
    table.sync([a]).expect("sync");

    conn.reset();
    assert!(table.sync([a, a]).expect("sync").is_empty());
    assert_eq!(conn.count(), 1);
}

#[test]
fn kinds_do_not_interfere() {
    let conn = create_test_db();
    let a = add_user(&conn, "a");
    let post = add_post(&conn, 0, a, "p");
    let reads = PivotTable::<PostUser>::new(&conn, post, "read");
    let mentions = PivotTable::<PostUser>::new(&conn, post, "mention");

    reads.attach([a]).expect("attach");
    mentions.sync([a]).expect("sync");
    assert_eq!(mentions.detach([a]).expect("detach"), 1);
    assert_eq!(reads.keys().expect("keys").into_vec(), vec![a]);
    assert!(reads.attach([a]).expect("attach").is_empty());
    assert_eq!(mentions.detach(Vec::new()).expect("detach"), 0);
}
