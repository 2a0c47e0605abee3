use radix_router::{Handler, Router, RouterOptions};

#[test]
fn router_when_wildcard_and_param_host_siblings_then_longest_wildcard_capture_wins() {
    // Registers `*{any}.com/bar` and `{ps}.b.com/bar`, then looks up
    // host=foo.b.b.com path=/bar. Tracing the greedy-longest-then-backtrack
    // algorithm against the dot positions in "foo.b.b.com" gives a longest
    // working wildcard capture of "foo.b.b".
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "*{any}.com/bar", Handler::new("any_host"))
        .expect("insert wildcard host route should succeed");
    txn.insert("GET", "{ps}.b.com/bar", Handler::new("ps_host"))
        .expect("insert param host route should succeed");
    txn.commit().expect("commit should succeed");

    let found = router
        .lookup("GET", "foo.b.b.com", "/bar")
        .expect("composed host+path should match the wildcard route");
    assert_eq!(found.route.pattern.as_ref(), "*{any}.com/bar");
    assert_eq!(found.params.len(), 1);
    assert_eq!(found.params[0].0.as_ref(), "any");
    assert_eq!(found.params[0].1.as_ref(), "foo.b.b");
}

#[test]
fn router_when_param_and_wildcard_both_satisfy_host_then_param_is_tried_first() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "{ps}.b.com/x", Handler::new("ps_host"))
        .expect("insert param host route should succeed");
    txn.insert("GET", "*{any}.com/x", Handler::new("any_host"))
        .expect("insert wildcard host route should succeed");
    txn.commit().expect("commit should succeed");

    let found = router
        .lookup("GET", "a.b.com", "/x")
        .expect("composed host+path should match");
    assert_eq!(found.route.pattern.as_ref(), "{ps}.b.com/x");
    assert_eq!(found.params[0].0.as_ref(), "ps");
    assert_eq!(found.params[0].1.as_ref(), "a");
}

#[test]
fn router_when_host_has_no_matching_label_pattern_then_wildcard_host_still_matches() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "*{any}.com/x", Handler::new("any_host"))
        .expect("insert should succeed");
    txn.commit().expect("commit should succeed");

    let found = router
        .lookup("GET", "deeply.nested.example.com", "/x")
        .expect("wildcard host should absorb every label up to the literal '.com' suffix");
    assert_eq!(found.params[0].1.as_ref(), "deeply.nested.example");
}

#[test]
fn router_when_deep_param_follows_several_static_segments_then_it_captures_correctly() {
    // `$` is only a valid continuation byte in a parameter name, never a
    // valid first byte, so `{p1}` is used here rather than `{$1}`.
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert(
        "GET",
        "exemple.com/foo/bar/baz/{p1}/jo",
        Handler::new("deep_param"),
    )
    .expect("insert should succeed");
    txn.commit().expect("commit should succeed");

    let found = router
        .lookup("GET", "exemple.com", "/foo/bar/baz/42/jo")
        .expect("route should match");
    assert_eq!(found.params.len(), 1);
    assert_eq!(found.params[0].0.as_ref(), "p1");
    assert_eq!(found.params[0].1.as_ref(), "42");
}

#[test]
fn router_when_parameter_name_starts_with_dollar_sign_then_parse_fails() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    let err = txn
        .insert(
            "GET",
            "exemple.com/foo/bar/baz/{$1}/jo",
            Handler::new("deep_param"),
        )
        .expect_err("a name starting with '$' should be rejected");
    match err {
        radix_router::RouterError::InvalidRoute(radix_router::PatternError::InvalidName {
            ref name,
            ..
        }) => {
            assert_eq!(name.as_str(), "$1");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn router_when_wildcard_has_no_continuation_then_it_absorbs_remaining_path() {
    let router = Router::new(RouterOptions::default());
    let mut txn = router.txn();
    txn.insert("GET", "/files/*{rest}", Handler::new("files"))
        .expect("insert should succeed");
    txn.commit().expect("commit should succeed");

    let found = router
        .lookup("GET", "", "/files/a/b/c.txt")
        .expect("wildcard should absorb the remaining path segments");
    assert_eq!(found.params[0].0.as_ref(), "rest");
    assert_eq!(found.params[0].1.as_ref(), "a/b/c.txt");
}
