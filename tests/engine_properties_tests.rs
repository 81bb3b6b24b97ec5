//! Engine integration tests: registration, custody, tier resolution and the
//! documented error ordering of every mutating operation.

use tierguard::{
    ActorId, Category, Checksum, Clock, Engine, EngineError, Handle, ManualClock, MemoryStore, RecordContent, Summary, Tier,
    Title,
};

type TestEngine = Engine<MemoryStore, ManualClock>;

fn h(s: &str) -> Handle { Handle::new(s).unwrap() }
fn a(s: &str) -> ActorId { ActorId::from(s) }

fn content(title: &str, fill: u8) -> RecordContent {
    RecordContent {
        title: Title::new(title).unwrap(),
        summary: Summary::new(format!("summary of {title}")).unwrap(),
        checksum: Checksum([fill; 32]),
        category: Category::new("contract").unwrap(),
    }
}

/// Entity `acme` controlled by `ceo` with one deposited record `plan`.
fn engine_with_record() -> TestEngine {
    let engine = Engine::new(MemoryStore::new(), ManualClock::new(100));
    engine.register_entity(&h("acme"), Title::new("Acme").unwrap(), &a("ceo")).unwrap();
    engine.deposit_record(&h("acme"), &h("plan"), content("plan", 1), &a("ceo")).unwrap();
    engine
}

#[test]
fn second_registration_of_a_handle_is_rejected() {
    let engine = Engine::new(MemoryStore::new(), ManualClock::new(1));
    engine.register_entity(&h("acme"), Title::new("Acme").unwrap(), &a("ceo")).unwrap();
    let err = engine.register_entity(&h("acme"), Title::new("Other").unwrap(), &a("mallory")).unwrap_err();
    assert_eq!(err, EngineError::EntityExists);
    let entity = engine.get_entity(&h("acme")).unwrap();
    assert_eq!(entity.controller, a("ceo"));
    assert_eq!(entity.title.as_str(), "Acme");
    assert!(entity.active);
    assert_eq!(entity.registered_at.0, 1);
}

#[test]
fn unknown_entity_lookup_is_none() {
    let engine = engine_with_record();
    assert!(engine.get_entity(&h("nobody")).is_none());
    assert!(engine.get_record(&h("acme"), &h("nothing")).is_none());
    assert!(engine.get_event(&h("acme"), &h("plan"), 99).is_none());
}

#[test]
fn deposit_sets_initial_record_state() {
    let engine = engine_with_record();
    let rec = engine.get_record(&h("acme"), &h("plan")).unwrap();
    assert_eq!(rec.iteration, 1);
    assert!(rec.active);
    assert_eq!(rec.created_at, rec.updated_at);
    assert_eq!(rec.created_at.0, 100);
    assert_eq!(rec.checksum, Checksum([1; 32]));
    assert_eq!(rec.summary.as_str(), "summary of plan");
}

#[test]
fn deposit_error_order() {
    let engine = engine_with_record();
    // EntityMissing wins even for a stranger
    assert_eq!(
        engine.deposit_record(&h("ghost"), &h("plan"), content("x", 0), &a("stranger")),
        Err(EngineError::EntityMissing)
    );
    // Unauthorized before RecordExists
    assert_eq!(
        engine.deposit_record(&h("acme"), &h("plan"), content("x", 0), &a("stranger")),
        Err(EngineError::Unauthorized)
    );
    assert_eq!(
        engine.deposit_record(&h("acme"), &h("plan"), content("x", 0), &a("ceo")),
        Err(EngineError::RecordExists)
    );
}

#[test]
fn deposit_by_non_controller_fails_regardless_of_tier_elsewhere() {
    let engine = engine_with_record();
    engine.allocate_access(&h("acme"), &h("plan"), &a("bob"), 3, &a("ceo")).unwrap();
    assert_eq!(engine.get_tier(&h("acme"), &h("plan"), &a("bob")), Tier::Custodian);
    assert_eq!(
        engine.deposit_record(&h("acme"), &h("other"), content("other", 2), &a("bob")),
        Err(EngineError::Unauthorized)
    );
    assert!(engine.get_record(&h("acme"), &h("other")).is_none());
}

#[test]
fn revisions_count_iterations_and_keep_created_at() {
    let engine = engine_with_record();
    let clock = engine.clock();
    for (i, expected) in [2u64, 3, 4].into_iter().enumerate() {
        clock.advance(10);
        let iteration = engine.revise_record(&h("acme"), &h("plan"), content(&format!("v{i}"), i as u8), &a("ceo")).unwrap();
        assert_eq!(iteration, expected);
        let rec = engine.get_record(&h("acme"), &h("plan")).unwrap();
        assert_eq!(rec.iteration, expected);
        assert_eq!(rec.created_at.0, 100);
        assert_eq!(rec.updated_at, clock.now());
        assert_eq!(rec.title.as_str(), format!("v{i}"));
    }
}

#[test]
fn revise_requires_modifier_and_checks_existence_first() {
    let engine = engine_with_record();
    assert_eq!(
        engine.revise_record(&h("acme"), &h("missing"), content("x", 0), &a("stranger")),
        Err(EngineError::RecordMissing)
    );
    engine.allocate_access(&h("acme"), &h("plan"), &a("reader"), 1, &a("ceo")).unwrap();
    assert_eq!(
        engine.revise_record(&h("acme"), &h("plan"), content("x", 0), &a("reader")),
        Err(EngineError::Unauthorized)
    );
    engine.allocate_access(&h("acme"), &h("plan"), &a("editor"), 2, &a("ceo")).unwrap();
    engine.revise_record(&h("acme"), &h("plan"), content("edited", 9), &a("editor")).unwrap();
    assert_eq!(engine.get_record(&h("acme"), &h("plan")).unwrap().iteration, 2);
}

#[test]
fn grant_levels_outside_reader_to_custodian_are_invalid() {
    let engine = engine_with_record();
    for level in [0u8, 4, 5, 99, 255] {
        assert_eq!(
            engine.allocate_access(&h("acme"), &h("plan"), &a("bob"), level, &a("ceo")),
            Err(EngineError::AccessLevelInvalid),
            "level {level}"
        );
    }
    engine.allocate_access(&h("acme"), &h("plan"), &a("bob"), 1, &a("ceo")).unwrap();
    assert_eq!(engine.get_tier(&h("acme"), &h("plan"), &a("bob")), Tier::Reader);
    engine.allocate_access(&h("acme"), &h("plan"), &a("bob"), 3, &a("ceo")).unwrap();
    assert_eq!(engine.get_tier(&h("acme"), &h("plan"), &a("bob")), Tier::Custodian);
}

#[test]
fn allocate_error_order() {
    let engine = engine_with_record();
    // Unauthorized before RecordMissing and AccessLevelInvalid
    assert_eq!(
        engine.allocate_access(&h("acme"), &h("missing"), &a("bob"), 99, &a("stranger")),
        Err(EngineError::Unauthorized)
    );
    // controller of an existing entity passes the tier check on any record handle
    assert_eq!(
        engine.allocate_access(&h("acme"), &h("missing"), &a("bob"), 99, &a("ceo")),
        Err(EngineError::RecordMissing)
    );
    assert_eq!(
        engine.allocate_access(&h("ghost"), &h("plan"), &a("bob"), 1, &a("ceo")),
        Err(EngineError::Unauthorized)
    );
}

#[test]
fn grants_are_upserted_and_carry_grantor() {
    let engine = engine_with_record();
    engine.allocate_access(&h("acme"), &h("plan"), &a("cust"), 3, &a("ceo")).unwrap();
    engine.clock().advance(5);
    engine.allocate_access(&h("acme"), &h("plan"), &a("bob"), 1, &a("cust")).unwrap();
    engine.allocate_access(&h("acme"), &h("plan"), &a("bob"), 2, &a("cust")).unwrap();
    let grants = engine.grants(&h("acme"), &h("plan"));
    assert_eq!(grants.len(), 2);
    let bob = grants.iter().find(|g| g.actor == a("bob")).unwrap();
    assert_eq!(bob.tier, Tier::Modifier);
    assert_eq!(bob.grantor, a("cust"));
    assert_eq!(bob.granted_at.0, 105);
    // controller holds PRINCIPAL implicitly, never as a row
    assert!(grants.iter().all(|g| g.actor != a("ceo")));
    assert_eq!(engine.get_tier(&h("acme"), &h("plan"), &a("ceo")), Tier::Principal);
}

#[test]
fn revoke_blocks_reads_and_is_idempotent() {
    let engine = engine_with_record();
    engine.allocate_access(&h("acme"), &h("plan"), &a("bob"), 1, &a("ceo")).unwrap();
    engine.retrieve_record(&h("acme"), &h("plan"), &a("bob")).unwrap();

    engine.revoke_access(&h("acme"), &h("plan"), &a("bob"), &a("ceo")).unwrap();
    assert_eq!(engine.get_tier(&h("acme"), &h("plan"), &a("bob")), Tier::Blocked);
    assert_eq!(engine.get_tier(&h("acme"), &h("plan"), &a("bob")).level(), 0);
    assert_eq!(engine.retrieve_record(&h("acme"), &h("plan"), &a("bob")), Err(EngineError::AccessDenied));

    // second revoke of a grant that no longer exists still succeeds
    engine.revoke_access(&h("acme"), &h("plan"), &a("bob"), &a("ceo")).unwrap();
    assert!(engine.grants(&h("acme"), &h("plan")).is_empty());
}

#[test]
fn revoke_error_order() {
    let engine = engine_with_record();
    engine.allocate_access(&h("acme"), &h("plan"), &a("editor"), 2, &a("ceo")).unwrap();
    assert_eq!(
        engine.revoke_access(&h("acme"), &h("plan"), &a("bob"), &a("editor")),
        Err(EngineError::Unauthorized)
    );
    assert_eq!(
        engine.revoke_access(&h("acme"), &h("missing"), &a("bob"), &a("ceo")),
        Err(EngineError::RecordMissing)
    );
}

#[test]
fn retrieve_uses_read_path_errors() {
    let engine = engine_with_record();
    assert_eq!(engine.retrieve_record(&h("acme"), &h("plan"), &a("stranger")), Err(EngineError::AccessDenied));
    assert_eq!(engine.retrieve_record(&h("ghost"), &h("plan"), &a("ceo")), Err(EngineError::AccessDenied));
    assert_eq!(engine.retrieve_record(&h("acme"), &h("missing"), &a("ceo")), Err(EngineError::RecordMissing));
    engine.retrieve_record(&h("acme"), &h("plan"), &a("ceo")).unwrap();
}

#[test]
fn purge_is_terminal_but_record_stays_readable() {
    let engine = engine_with_record();
    engine.allocate_access(&h("acme"), &h("plan"), &a("editor"), 2, &a("ceo")).unwrap();
    assert_eq!(engine.purge_record(&h("acme"), &h("plan"), &a("editor")), Err(EngineError::Unauthorized));
    assert_eq!(engine.purge_record(&h("acme"), &h("missing"), &a("ceo")), Err(EngineError::RecordMissing));

    let before = engine.get_record(&h("acme"), &h("plan")).unwrap();
    engine.purge_record(&h("acme"), &h("plan"), &a("ceo")).unwrap();
    let after = engine.get_record(&h("acme"), &h("plan")).unwrap();
    assert!(!after.active);
    assert_eq!(after.iteration, before.iteration);
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(after.checksum, before.checksum);
}

#[test]
fn revising_a_purged_record_keeps_it_inactive() {
    let engine = engine_with_record();
    engine.purge_record(&h("acme"), &h("plan"), &a("ceo")).unwrap();
    engine.revise_record(&h("acme"), &h("plan"), content("after purge", 7), &a("ceo")).unwrap();
    let rec = engine.get_record(&h("acme"), &h("plan")).unwrap();
    assert!(!rec.active);
    assert_eq!(rec.iteration, 2);
    assert_eq!(rec.title.as_str(), "after purge");
}

#[test]
fn same_record_handle_under_two_entities_is_isolated() {
    let engine = Engine::new(MemoryStore::new(), ManualClock::new(1));
    engine.register_entity(&h("A"), Title::new("A").unwrap(), &a("alice")).unwrap();
    engine.register_entity(&h("B"), Title::new("B").unwrap(), &a("bruno")).unwrap();
    engine.deposit_record(&h("A"), &h("SHARED"), content("a", 1), &a("alice")).unwrap();
    engine.deposit_record(&h("B"), &h("SHARED"), content("b", 2), &a("bruno")).unwrap();

    engine.revise_record(&h("A"), &h("SHARED"), content("a2", 3), &a("alice")).unwrap();
    engine.revise_record(&h("A"), &h("SHARED"), content("a3", 4), &a("alice")).unwrap();
    engine.purge_record(&h("A"), &h("SHARED"), &a("alice")).unwrap();

    let b = engine.get_record(&h("B"), &h("SHARED")).unwrap();
    assert_eq!(b.iteration, 1);
    assert!(b.active);
    assert_eq!(b.title.as_str(), "b");
    assert_eq!(b.checksum, Checksum([2; 32]));
    assert_eq!(engine.history(&h("B"), &h("SHARED")).len(), 1);
    assert_eq!(engine.history(&h("A"), &h("SHARED")).len(), 4);

    // controller of A has no say over B's record
    assert_eq!(engine.get_tier(&h("B"), &h("SHARED"), &a("alice")), Tier::Blocked);
    assert_eq!(engine.purge_record(&h("B"), &h("SHARED"), &a("alice")), Err(EngineError::Unauthorized));
}

#[test]
fn tier_queries_never_fail() {
    let engine = engine_with_record();
    assert_eq!(engine.get_tier(&h("ghost"), &h("x"), &a("ceo")), Tier::Blocked);
    assert_eq!(engine.get_tier(&h("acme"), &h("x"), &a("stranger")), Tier::Blocked);
    // controller resolution does not look at the record at all
    assert_eq!(engine.get_tier(&h("acme"), &h("x"), &a("ceo")), Tier::Principal);
    assert!(engine.has_tier(&h("acme"), &h("plan"), &a("ceo"), Tier::Principal));
    assert!(!engine.has_tier(&h("acme"), &h("plan"), &a("stranger"), Tier::Blocked));
}

#[test]
fn records_lists_one_entity_namespace() {
    let engine = engine_with_record();
    engine.deposit_record(&h("acme"), &h("budget"), content("budget", 3), &a("ceo")).unwrap();
    let handles: Vec<String> = engine.records(&h("acme")).into_iter().map(|r| r.handle.to_string()).collect();
    assert_eq!(handles, vec!["budget", "plan"]);
    assert!(engine.records(&h("ghost")).is_empty());
}
