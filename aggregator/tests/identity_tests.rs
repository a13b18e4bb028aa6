use memtrend::identity::{IdentityResolver, SeriesKey};

#[test]
fn test_first_sighting_uses_bare_pid() {
    let mut resolver = IdentityResolver::new();
    let key = resolver.resolve(42, "nginx");
    assert_eq!(key.to_string(), "42");
    assert_eq!(resolver.command_for(42), Some("nginx"));
}

#[test]
fn test_same_command_keeps_identity() {
    let mut resolver = IdentityResolver::new();
    let keys: Vec<_> = (0..5).map(|_| resolver.resolve(7, "postgres")).collect();
    assert!(keys.iter().all(|k| *k == SeriesKey::new(7)));
}

#[test]
fn test_pid_reuse_gets_fresh_suffix_each_time() {
    let mut resolver = IdentityResolver::new();
    assert_eq!(resolver.resolve(100, "A").to_string(), "100");
    assert_eq!(resolver.resolve(100, "B").to_string(), "100(2)");
    assert_eq!(resolver.resolve(100, "C").to_string(), "100(3)");
    assert_eq!(resolver.command_for(100), Some("C"));
}

#[test]
fn test_suffixed_lineage_stays_stable() {
    let mut resolver = IdentityResolver::new();
    resolver.resolve(100, "A");
    let first = resolver.resolve(100, "B");
    let again = resolver.resolve(100, "B");
    assert_eq!(first, again);
    assert_eq!(again.to_string(), "100(2)");
}

#[test]
fn test_returning_command_is_a_new_lineage() {
    let mut resolver = IdentityResolver::new();
    resolver.resolve(5, "A");
    resolver.resolve(5, "B");
    assert_eq!(resolver.resolve(5, "A").to_string(), "5(3)");
}

#[test]
fn test_counters_are_per_pid() {
    let mut resolver = IdentityResolver::new();
    resolver.resolve(1, "a");
    resolver.resolve(1, "b");
    resolver.resolve(2, "x");
    assert_eq!(resolver.resolve(2, "y").to_string(), "2(2)");
    assert_eq!(resolver.len(), 2);
}

#[test]
fn test_series_key_orders_by_pid_then_generation() {
    let mut keys = vec![
        SeriesKey::with_generation(42, 2),
        SeriesKey::new(7),
        SeriesKey::new(42),
        SeriesKey::new(100),
    ];
    keys.sort();
    let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    assert_eq!(rendered, vec!["7", "42", "42(2)", "100"]);
}

#[test]
fn test_series_key_pid_strips_suffix() {
    let key = SeriesKey::with_generation(42, 3);
    assert_eq!(key.pid(), 42);
    assert_eq!(key.generation(), 3);
}
