use radix_router::{Handler, Router, RouterError, RouterOptions};

#[test]
fn router_when_txn_snapshots_then_later_writes_are_invisible_to_the_snapshot() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/x", Handler::new("x"))
        .expect("insert /x should succeed");

    let snapshot = txn.snapshot();

    txn.insert("GET", "/y", Handler::new("y"))
        .expect("insert /y should succeed");
    txn.abort();

    assert!(snapshot.has("GET", "/x"));
    assert!(!snapshot.has("GET", "/y"));

    // aborting never published anything
    assert!(router.lookup("GET", "", "/x").is_none());
    assert!(router.lookup("GET", "", "/y").is_none());
}

#[test]
fn router_when_txn_aborted_then_no_generation_is_published() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/temp", Handler::new("temp"))
        .expect("insert should succeed");
    txn.abort();

    assert!(router.lookup("GET", "", "/temp").is_none());
    assert_eq!(router.stats().size, 0);
}

#[test]
fn router_when_mutation_attempted_on_reader_then_returns_read_only_error() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/foo", Handler::new("foo"))
        .expect("insert should succeed");
    txn.commit().expect("commit should succeed");

    let mut reader = router.reader();
    let err = reader
        .insert("GET", "/bar", Handler::new("bar"))
        .expect_err("mutation on a reader transaction should fail");
    assert!(matches!(err, RouterError::ReadOnlyTxn));

    let err = reader
        .delete("GET", "/foo")
        .expect_err("delete on a reader transaction should fail");
    assert!(matches!(err, RouterError::ReadOnlyTxn));
}

#[test]
fn router_when_truncate_called_with_no_methods_then_entire_tree_is_cleared() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/foo", Handler::new("foo"))
        .expect("insert should succeed");
    txn.insert("POST", "/foo", Handler::new("foo_post"))
        .expect("insert should succeed");
    txn.truncate(&[]).expect("truncate should succeed");
    txn.commit().expect("commit should succeed");

    assert_eq!(router.stats().size, 0);
    assert!(router.lookup("GET", "", "/foo").is_none());
    assert!(router.lookup("POST", "", "/foo").is_none());
}

#[test]
fn router_when_truncate_called_with_specific_methods_then_only_those_are_cleared() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/foo", Handler::new("foo"))
        .expect("insert should succeed");
    txn.insert("POST", "/foo", Handler::new("foo_post"))
        .expect("insert should succeed");
    txn.truncate(&["GET"]).expect("truncate should succeed");
    txn.commit().expect("commit should succeed");

    assert!(router.lookup("GET", "", "/foo").is_none());
    assert!(router.lookup("POST", "", "/foo").is_some());
}

#[test]
fn router_when_static_host_label_and_dynamic_sibling_then_static_wins_case_insensitively() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "{a}.b.com/foo", Handler::new("static_label"))
        .expect("insert should succeed");
    txn.insert("GET", "{a}.{c}.com/foo", Handler::new("dynamic_label"))
        .expect("insert should succeed");
    txn.commit().expect("commit should succeed");

    let found = router
        .lookup("GET", "X.b.COM", "/foo")
        .expect("mixed-case host should still match via case folding");
    assert_eq!(found.route.pattern.as_ref(), "{a}.b.com/foo");
    assert_eq!(found.params[0].0.as_ref(), "a");
    assert_eq!(found.params[0].1.as_ref(), "x");

    let found = router
        .lookup("GET", "X.d.COM", "/foo")
        .expect("non-matching static label should fall back to the dynamic sibling");
    assert_eq!(found.route.pattern.as_ref(), "{a}.{c}.com/foo");
    assert_eq!(found.params[1].0.as_ref(), "c");
    assert_eq!(found.params[1].1.as_ref(), "d");
}
