use radix_router::{Handler, Router, RouterError, RouterOptions};

#[test]
fn router_when_static_route_registered_then_lookup_finds_it() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/foo/bar", Handler::new("foo_bar"))
        .expect("insert should succeed");
    txn.commit().expect("commit should succeed");

    let found = router
        .lookup("GET", "", "/foo/bar")
        .expect("route should be found");
    assert!(found.params.is_empty());
    assert!(!found.tsr);
    assert_eq!(found.route.pattern.as_ref(), "/foo/bar");
}

#[test]
fn router_when_pattern_inserted_twice_then_returns_route_exist() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/foo/bar", Handler::new("first"))
        .expect("first insert should succeed");

    let err = txn
        .insert("GET", "/foo/bar", Handler::new("second"))
        .expect_err("duplicate insert should fail");
    match err {
        RouterError::RouteExist { method, pattern } => {
            assert_eq!(method, "GET");
            assert_eq!(pattern, "/foo/bar");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn router_when_updating_missing_route_then_returns_route_not_found() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();

    let err = txn
        .update("GET", "/nope", Handler::new("nope"))
        .expect_err("update of nonexistent route should fail");
    match err {
        RouterError::RouteNotFound { method, pattern } => {
            assert_eq!(method, "GET");
            assert_eq!(pattern, "/nope");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn router_when_deleting_missing_route_then_returns_route_not_found() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/foo", Handler::new("foo"))
        .expect("insert should succeed");

    let err = txn
        .delete("GET", "/bar")
        .expect_err("delete of nonexistent route should fail");
    match err {
        RouterError::RouteNotFound { method, pattern } => {
            assert_eq!(method, "GET");
            assert_eq!(pattern, "/bar");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn router_when_routes_share_common_prefix_then_edge_splits_and_both_match() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/foo/bar", Handler::new("bar"))
        .expect("insert /foo/bar should succeed");
    txn.insert("GET", "/foo/baz", Handler::new("baz"))
        .expect("insert /foo/baz should succeed");
    txn.commit().expect("commit should succeed");

    let bar = router
        .lookup("GET", "", "/foo/bar")
        .expect("/foo/bar should match");
    assert_eq!(bar.route.pattern.as_ref(), "/foo/bar");

    let baz = router
        .lookup("GET", "", "/foo/baz")
        .expect("/foo/baz should match");
    assert_eq!(baz.route.pattern.as_ref(), "/foo/baz");
}

#[test]
fn router_when_request_has_extra_trailing_slash_mid_edge_then_recommends_without_it() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/foo/bar", Handler::new("bar"))
        .expect("insert should succeed");
    txn.commit().expect("commit should succeed");

    let exact = router
        .lookup("GET", "", "/foo/bar")
        .expect("exact match should be found");
    assert!(!exact.tsr);

    let tsr = router
        .lookup("GET", "", "/foo/bar/")
        .expect("trailing-slash variant should recommend a match");
    assert!(tsr.tsr);
    assert_eq!(tsr.route.pattern.as_ref(), "/foo/bar");
}

#[test]
fn router_when_request_missing_trailing_slash_then_recommends_symmetric_match() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/foo/bar/", Handler::new("bar_slash"))
        .expect("insert should succeed");
    txn.commit().expect("commit should succeed");

    let exact = router
        .lookup("GET", "", "/foo/bar/")
        .expect("exact match should be found");
    assert!(!exact.tsr);

    let tsr = router
        .lookup("GET", "", "/foo/bar")
        .expect("request without trailing slash should recommend a match");
    assert!(tsr.tsr);
    assert_eq!(tsr.route.pattern.as_ref(), "/foo/bar/");
}

#[test]
fn router_when_route_deleted_then_lookup_no_longer_finds_it() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/foo/bar", Handler::new("bar"))
        .expect("insert should succeed");
    txn.insert("GET", "/foo/baz", Handler::new("baz"))
        .expect("insert should succeed");
    txn.commit().expect("commit should succeed");

    let mut txn = router.txn();
    txn.delete("GET", "/foo/bar").expect("delete should succeed");
    txn.commit().expect("commit should succeed");

    assert!(router.lookup("GET", "", "/foo/bar").is_none());
    assert!(router.lookup("GET", "", "/foo/baz").is_some());
}
