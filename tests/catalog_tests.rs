//! Tests for Catalog
//!
//! These tests verify:
//! - persist / retrieve round trips
//! - Sequence ordering, counting and closed-range pagination
//! - Field index search and fallback to the full sequence
//! - Index maintenance when indexed values change or records are deleted
//! - Configuration merging

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use catalogdb::catalog::{derive_id, IndexTarget};
use catalogdb::config::{CatalogConfig, CatalogOptions};
use catalogdb::{Catalog, CatalogError, Engine, KvStore, Record, Result, StoreOp};
use catalogdb::store::Fields;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_catalog() -> Catalog<Arc<Engine>> {
    let options = CatalogOptions::new()
        .key_storage("repositories")
        .fields(["name", "author"]);
    Catalog::new(Arc::new(Engine::in_memory()), options).unwrap()
}

fn named(name: &str, rank: i64) -> Record {
    Record::new().with("name", name).with("rank", rank)
}

fn names(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get("name").unwrap().to_string())
        .collect()
}

fn seed(catalog: &Catalog<Arc<Engine>>, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| catalog.persist(&named(&format!("pkg-{}", i), i as i64)).unwrap())
        .collect()
}

// =============================================================================
// Persist / Retrieve Tests
// =============================================================================

#[test]
fn test_persist_then_retrieve_round_trips() {
    let catalog = setup_catalog();

    let record = Record::new()
        .with("id", "abc123")
        .with("name", "foo")
        .with("downloads", 42i64)
        .with("templated", true);
    let id = catalog.persist(&record).unwrap();

    assert_eq!(id, "abc123");
    assert_eq!(catalog.retrieve(&id).unwrap(), record);
}

#[test]
fn test_persist_derives_id_from_name() {
    let catalog = setup_catalog();

    let id = catalog.persist(&Record::new().with("name", "foo")).unwrap();

    assert_eq!(id, derive_id("foo"));
    assert_eq!(catalog.retrieve(&id).unwrap().get("id"), Some(id.as_str()));
}

#[test]
fn test_persist_without_id_or_name_fails() {
    let catalog = setup_catalog();

    let result = catalog.persist(&Record::new().with("description", "anonymous"));

    assert!(matches!(result, Err(CatalogError::InvalidArgument(_))));
    assert_eq!(catalog.count().unwrap(), 0);
}

#[test]
fn test_persist_rejects_non_numeric_rank() {
    let catalog = setup_catalog();

    let result = catalog.persist(&Record::new().with("name", "foo").with("rank", "first"));

    assert!(matches!(result, Err(CatalogError::InvalidRank(_))));
    assert!(catalog.retrieve(&derive_id("foo")).unwrap().is_empty());
}

#[test]
fn test_persist_rejects_id_with_separator() {
    let catalog = setup_catalog();

    let result = catalog.persist(&Record::new().with("id", "index:name:foo").with("name", "x"));

    assert!(matches!(result, Err(CatalogError::InvalidArgument(_))));
    assert_eq!(catalog.count().unwrap(), 0);

    // The field index that id would have overwritten stays usable
    catalog.persist(&named("foo", 0)).unwrap();
    let found = catalog.search(Some("name"), Some("foo")).all().unwrap();
    assert_eq!(names(&found), vec!["foo"]);
}

#[test]
fn test_persist_rejects_sequence_segment_as_id() {
    let catalog = setup_catalog();

    let result = catalog.persist(&Record::new().with("id", "sequence").with("name", "x"));

    assert!(matches!(result, Err(CatalogError::InvalidArgument(_))));
    assert_eq!(catalog.count().unwrap(), 0);
    assert_eq!(catalog.store().key_count(), 0);

    catalog.persist(&named("foo", 0)).unwrap();
    assert_eq!(catalog.count().unwrap(), 1);
}

#[test]
fn test_retrieve_never_reads_other_structures() {
    let catalog = setup_catalog();
    catalog.persist(&named("foo", 0)).unwrap();

    assert!(catalog.retrieve("sequence").unwrap().is_empty());
    assert!(catalog.retrieve("index:name:foo").unwrap().is_empty());
}

#[test]
fn test_retrieve_unknown_id_is_empty() {
    let catalog = setup_catalog();

    let record = catalog.retrieve("missing").unwrap();

    assert!(record.is_empty());
}

#[test]
fn test_persist_overwrite_replaces_fields() {
    let catalog = setup_catalog();

    let id = catalog
        .persist(&named("foo", 0).with("description", "old"))
        .unwrap();
    catalog.persist(&named("foo", 0).with("license", "MIT")).unwrap();

    let record = catalog.retrieve(&id).unwrap();
    assert_eq!(record.get("license"), Some("MIT"));
    assert_eq!(record.get("description"), None);
}

// =============================================================================
// Count / Sequence Tests
// =============================================================================

#[test]
fn test_count_matches_distinct_persists() {
    let catalog = setup_catalog();

    seed(&catalog, 7);

    assert_eq!(catalog.count().unwrap(), 7);
}

#[test]
fn test_repersist_does_not_grow_count() {
    let catalog = setup_catalog();

    catalog.persist(&named("foo", 0)).unwrap();
    catalog.persist(&named("foo", 0)).unwrap();
    catalog.persist(&Record::new().with("name", "foo")).unwrap();

    assert_eq!(catalog.count().unwrap(), 1);
}

#[test]
fn test_default_rank_is_current_count() {
    let catalog = setup_catalog();

    for name in ["a", "b", "c"] {
        catalog.persist(&Record::new().with("name", name)).unwrap();
    }

    let engine = catalog.store();
    let sequence = &catalog.config().key_sequence;
    assert_eq!(engine.zscore(sequence, &derive_id("a")).unwrap(), Some(0.0));
    assert_eq!(engine.zscore(sequence, &derive_id("b")).unwrap(), Some(1.0));
    assert_eq!(engine.zscore(sequence, &derive_id("c")).unwrap(), Some(2.0));
}

#[test]
fn test_repersist_without_rank_moves_to_end() {
    let catalog = setup_catalog();

    for name in ["a", "b", "c"] {
        catalog.persist(&Record::new().with("name", name)).unwrap();
    }
    catalog.persist(&Record::new().with("name", "a")).unwrap();

    assert_eq!(names(&catalog.all().unwrap()), vec!["b", "c", "a"]);
}

#[test]
fn test_explicit_rank_reorders() {
    let catalog = setup_catalog();

    catalog.persist(&named("first", 10)).unwrap();
    catalog.persist(&named("second", 5)).unwrap();
    catalog.persist(&named("third", 7)).unwrap();

    assert_eq!(
        names(&catalog.all().unwrap()),
        vec!["second", "third", "first"]
    );
}

#[test]
fn test_all_returns_every_record_once_in_rank_order() {
    let catalog = setup_catalog();

    catalog.persist(&named("c", 2)).unwrap();
    catalog.persist(&named("a", 0)).unwrap();
    catalog.persist(&named("b", 1)).unwrap();

    let all = catalog.search(None, None).all().unwrap();

    assert_eq!(names(&all), vec!["a", "b", "c"]);
    let unique: HashSet<_> = all.iter().map(|r| r.id().unwrap().to_string()).collect();
    assert_eq!(unique.len(), 3);
}

// =============================================================================
// Pagination Tests
// =============================================================================

#[test]
fn test_take_is_closed_range() {
    let catalog = setup_catalog();
    seed(&catalog, 5);

    let page = catalog.take(2, 0).unwrap();

    assert_eq!(names(&page), vec!["pkg-0", "pkg-1", "pkg-2"]);
}

#[test]
fn test_take_scenario_foo_bar_baz() {
    let catalog = setup_catalog();

    catalog.persist(&named("foo", 0)).unwrap();
    catalog.persist(&named("bar", 1)).unwrap();
    catalog.persist(&named("baz", 2)).unwrap();

    assert_eq!(catalog.count().unwrap(), 3);
    assert_eq!(names(&catalog.take(1, 1).unwrap()), vec!["bar", "baz"]);
}

#[test]
fn test_take_at_tail_returns_fewer() {
    let catalog = setup_catalog();
    seed(&catalog, 5);

    assert_eq!(names(&catalog.take(10, 3).unwrap()), vec!["pkg-3", "pkg-4"]);
    assert!(catalog.take(1, 5).unwrap().is_empty());
}

#[test]
fn test_take_skips_entries_without_record() {
    let catalog = setup_catalog();
    let ids = seed(&catalog, 4);
    catalog.store().del(&format!("repositories:{}", ids[1])).unwrap();

    let page = catalog.take(2, 0).unwrap();

    assert_eq!(names(&page), vec!["pkg-0", "pkg-2"]);
    assert_eq!(catalog.count().unwrap(), 4);
}

#[test]
fn test_take_zero_limit_returns_one() {
    let catalog = setup_catalog();
    seed(&catalog, 3);

    assert_eq!(names(&catalog.take(0, 1).unwrap()), vec!["pkg-1"]);
}

#[test]
fn test_take_huge_bounds_do_not_overflow() {
    let catalog = setup_catalog();
    seed(&catalog, 3);

    assert_eq!(catalog.take(u64::MAX, 0).unwrap().len(), 3);
    assert!(catalog.take(u64::MAX, u64::MAX).unwrap().is_empty());
}

// =============================================================================
// Search Tests
// =============================================================================

#[test]
fn test_search_by_indexed_field() {
    let catalog = setup_catalog();

    catalog.persist(&named("a", 0).with("author", "alice")).unwrap();
    catalog.persist(&named("b", 1).with("author", "bob")).unwrap();
    catalog.persist(&named("c", 2).with("author", "alice")).unwrap();

    let selection = catalog.search(Some("author"), Some("alice"));
    assert_eq!(
        selection.target(),
        &IndexTarget::Field {
            field: "author".to_string(),
            value: "alice".to_string()
        }
    );

    let mut found = names(&selection.all().unwrap());
    found.sort();
    assert_eq!(found, vec!["a", "c"]);
}

#[test]
fn test_search_unknown_value_is_empty() {
    let catalog = setup_catalog();
    seed(&catalog, 3);

    assert!(catalog
        .search(Some("name"), Some("nope"))
        .all()
        .unwrap()
        .is_empty());
}

#[test]
fn test_search_non_indexed_field_falls_back_to_sequence() {
    let catalog = setup_catalog();

    catalog.persist(&named("a", 0).with("license", "MIT")).unwrap();
    catalog.persist(&named("b", 1).with("license", "GPL")).unwrap();

    let selection = catalog.search(Some("license"), Some("MIT"));

    assert_eq!(selection.target(), &IndexTarget::Sequence);
    assert_eq!(names(&selection.all().unwrap()), vec!["a", "b"]);
}

#[test]
fn test_search_without_arguments_selects_sequence() {
    let catalog = setup_catalog();

    let selection = catalog.search(None, None);

    assert_eq!(selection.target(), &IndexTarget::Sequence);
    assert_eq!(selection.key(), "repositories:sequence");
}

#[test]
fn test_search_take_on_field_index() {
    let catalog = setup_catalog();
    for i in 0..5 {
        catalog
            .persist(&named(&format!("p{}", i), i).with("author", "alice"))
            .unwrap();
    }

    let page = catalog.search(Some("author"), Some("alice")).take(1, 0).unwrap();

    assert_eq!(page.len(), 2);
}

#[test]
fn test_selections_are_independent() {
    let catalog = setup_catalog();
    catalog.persist(&named("a", 0).with("author", "alice")).unwrap();
    catalog.persist(&named("b", 1).with("author", "bob")).unwrap();

    let by_alice = catalog.search(Some("author"), Some("alice"));
    let everything = catalog.search(None, None);
    let by_bob = catalog.search(Some("author"), Some("bob"));

    assert_eq!(names(&by_alice.all().unwrap()), vec!["a"]);
    assert_eq!(names(&everything.all().unwrap()), vec!["a", "b"]);
    assert_eq!(names(&by_bob.all().unwrap()), vec!["b"]);
}

// =============================================================================
// Index Maintenance Tests
// =============================================================================

#[test]
fn test_changing_indexed_value_moves_index_entry() {
    let catalog = setup_catalog();

    let id = catalog.persist(&named("a", 0).with("author", "alice")).unwrap();
    catalog.persist(&named("a", 0).with("author", "bob")).unwrap();

    assert!(catalog
        .search(Some("author"), Some("alice"))
        .all()
        .unwrap()
        .is_empty());
    let by_bob = catalog.search(Some("author"), Some("bob")).all().unwrap();
    assert_eq!(by_bob.len(), 1);
    assert_eq!(by_bob[0].id(), Some(id.as_str()));
}

#[test]
fn test_dropping_indexed_field_removes_index_entry() {
    let catalog = setup_catalog();

    catalog.persist(&named("a", 0).with("author", "alice")).unwrap();
    catalog.persist(&named("a", 0)).unwrap();

    assert!(catalog
        .search(Some("author"), Some("alice"))
        .all()
        .unwrap()
        .is_empty());
}

#[test]
fn test_only_configured_fields_are_indexed() {
    let catalog = setup_catalog();

    catalog.persist(&named("a", 0).with("license", "MIT")).unwrap();

    let engine = catalog.store();
    assert!(engine.zrange("repositories:index:name:a", 0, -1).unwrap().len() == 1);
    assert_eq!(engine.zcard("repositories:index:license:MIT").unwrap(), 0);
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_removes_record() {
    let catalog = setup_catalog();
    let ids = seed(&catalog, 3);

    assert!(catalog.delete(&ids[1]).unwrap());

    assert!(catalog.retrieve(&ids[1]).unwrap().is_empty());
    assert_eq!(catalog.count().unwrap(), 2);
    assert_eq!(names(&catalog.all().unwrap()), vec!["pkg-0", "pkg-2"]);
}

#[test]
fn test_delete_leaves_no_trace() {
    let catalog = setup_catalog();
    let id = catalog.persist(&named("a", 0).with("author", "alice")).unwrap();

    catalog.delete(&id).unwrap();

    assert_eq!(catalog.store().key_count(), 0);
    assert!(catalog
        .search(Some("author"), Some("alice"))
        .all()
        .unwrap()
        .is_empty());
}

#[test]
fn test_delete_unknown_id_returns_false() {
    let catalog = setup_catalog();
    seed(&catalog, 2);
    let keys_before = catalog.store().key_count();

    assert!(!catalog.delete("missing").unwrap());

    assert_eq!(catalog.count().unwrap(), 2);
    assert_eq!(catalog.store().key_count(), keys_before);
}

#[test]
fn test_delete_cannot_reach_other_structures() {
    let catalog = setup_catalog();
    catalog.persist(&named("foo", 0)).unwrap();
    let keys_before = catalog.store().key_count();

    assert!(!catalog.delete("index:name:foo").unwrap());
    assert!(!catalog.delete("sequence").unwrap());

    assert_eq!(catalog.store().key_count(), keys_before);
    assert_eq!(catalog.count().unwrap(), 1);
    assert_eq!(catalog.search(Some("name"), Some("foo")).all().unwrap().len(), 1);
}

#[test]
fn test_delete_orphaned_hash_reports_false() {
    let catalog = setup_catalog();
    catalog
        .store()
        .hset("repositories:orphan", &[("name".to_string(), "x".to_string())])
        .unwrap();

    assert!(!catalog.delete("orphan").unwrap());

    // The hash-map removal that did succeed is not undone
    assert!(catalog.retrieve("orphan").unwrap().is_empty());
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_catalog_requires_key_storage() {
    let result = Catalog::new(Arc::new(Engine::in_memory()), CatalogOptions::new());

    assert!(matches!(result, Err(CatalogError::Config(_))));
}

#[test]
fn test_sequence_key_defaults_from_storage() {
    let config =
        CatalogConfig::from_options(CatalogOptions::new().key_storage("packages")).unwrap();

    assert_eq!(config.key_sequence, "packages:sequence");
}

#[test]
fn test_explicit_sequence_key_wins() {
    let config = CatalogConfig::from_options(
        CatalogOptions::new()
            .key_storage("packages")
            .key_sequence("packages:order"),
    )
    .unwrap();

    assert_eq!(config.key_sequence, "packages:order");
}

#[test]
fn test_configure_merges_and_keeps_data() {
    let mut catalog = setup_catalog();
    catalog.persist(&named("a", 0).with("license", "MIT")).unwrap();

    catalog
        .configure(CatalogOptions::new().fields(["license"]))
        .unwrap();

    assert_eq!(catalog.config().key_storage, "repositories");
    assert!(catalog.config().is_indexed("license"));
    assert!(!catalog.config().is_indexed("name"));
    assert_eq!(catalog.count().unwrap(), 1);
}

#[test]
fn test_configure_rejects_empty_storage() {
    let mut catalog = setup_catalog();

    let result = catalog.configure(CatalogOptions::new().key_storage(""));

    assert!(matches!(result, Err(CatalogError::Config(_))));
    assert_eq!(catalog.config().key_storage, "repositories");
}

#[test]
fn test_namespaces_are_isolated() {
    let engine = Arc::new(Engine::in_memory());
    let repositories = Catalog::new(
        Arc::clone(&engine),
        CatalogOptions::new().key_storage("repositories").fields(["name"]),
    )
    .unwrap();
    let packages = Catalog::new(
        Arc::clone(&engine),
        CatalogOptions::new().key_storage("packages").fields(["name"]),
    )
    .unwrap();

    repositories.persist(&named("shared", 0)).unwrap();
    packages.persist(&named("shared", 0)).unwrap();
    packages.persist(&named("other", 1)).unwrap();

    assert_eq!(repositories.count().unwrap(), 1);
    assert_eq!(packages.count().unwrap(), 2);
    assert_eq!(
        repositories.search(Some("name"), Some("other")).all().unwrap().len(),
        0
    );
}

// =============================================================================
// Store Behaviour Tests
// =============================================================================

/// Store without atomic batches: runs the default sequential `batch`
struct SequentialStore(Engine);

impl KvStore for SequentialStore {
    fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<u64> {
        self.0.hset(key, fields)
    }
    fn hgetall(&self, key: &str) -> Result<Fields> {
        self.0.hgetall(key)
    }
    fn del(&self, key: &str) -> Result<bool> {
        self.0.del(key)
    }
    fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool> {
        self.0.zadd(key, score, member)
    }
    fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        self.0.zrem(key, member)
    }
    fn zcard(&self, key: &str) -> Result<u64> {
        self.0.zcard(key)
    }
    fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        self.0.zrange(key, start, stop)
    }
}

#[test]
fn test_catalog_over_sequential_store() {
    let options = CatalogOptions::new().key_storage("repositories").fields(["name"]);
    let catalog = Catalog::new(SequentialStore(Engine::in_memory()), options).unwrap();

    let id = catalog.persist(&named("foo", 0)).unwrap();
    catalog.persist(&named("bar", 1)).unwrap();

    assert_eq!(names(&catalog.all().unwrap()), vec!["foo", "bar"]);
    assert!(catalog.delete(&id).unwrap());
    assert_eq!(catalog.count().unwrap(), 1);
}

#[test]
fn test_sequential_batch_stops_at_first_failure() {
    let store = SequentialStore(Engine::in_memory());
    store.hset("h", &[("f".to_string(), "v".to_string())]).unwrap();

    let ops = vec![
        StoreOp::ZAdd {
            key: "z".to_string(),
            score: 1.0,
            member: "m".to_string(),
        },
        StoreOp::ZAdd {
            key: "h".to_string(),
            score: 1.0,
            member: "m".to_string(),
        },
        StoreOp::Del {
            key: "z".to_string(),
        },
    ];

    assert!(store.batch(&ops).is_err());
    // The first write went through and was not rolled back
    assert_eq!(store.zcard("z").unwrap(), 1);
}

#[test]
fn test_concurrent_persists() {
    let catalog = Arc::new(setup_catalog());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                for i in 0..25 {
                    catalog
                        .persist(&named(&format!("t{}-{}", t, i), (t * 100 + i) as i64))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(catalog.count().unwrap(), 100);
    assert_eq!(catalog.all().unwrap().len(), 100);
}
