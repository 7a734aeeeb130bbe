#![forbid(unsafe_code)]

use sb_core::calendar::{DayBucket, TimeSlot, slot_from_clock};
use sb_core::ids::{ItemId, OrganizationId, UserId};
use sb_core::model::{Assignee, DemoKind, EventType, LeadSource, PipelineStage};
use sb_core::reorder::{Move, NoopReason};
use sb_storage::{
    DemoSchedule, EventCreateRequest, EventPatch, EventRange, ProspectCreateRequest, ProspectMove,
    PublicDemoRequest, Scope, SqliteStore, StoreError,
};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = base.join(format!("sb_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn scope() -> Scope {
    Scope::new(
        OrganizationId::try_new("funect").expect("org id"),
        UserId::try_new("veeti").expect("user id"),
    )
}

fn monday_slot(start: &str, end: &str) -> TimeSlot {
    let day = DayBucket::parse("2024-06-10").expect("day");
    slot_from_clock(day, start, end).expect("slot")
}

fn whole_june() -> EventRange {
    EventRange {
        start_ms: DayBucket::parse("2024-06-01").expect("day").start_ms(),
        end_ms: DayBucket::parse("2024-06-30").expect("day").end_ms(),
    }
}

/// Acme waits in "cold called", Initech already sits in "first demo".
fn board(store: &mut SqliteStore, scope: &Scope) -> (ItemId, ItemId) {
    let mut acme = ProspectCreateRequest::new("Acme Padel", PipelineStage::ColdCalled);
    acme.assigned_to = Some("Alppa".to_string());
    let acme = store.create_prospect(scope, acme).expect("create acme");
    let initech = store
        .create_prospect(
            scope,
            ProspectCreateRequest::new("Initech Golf", PipelineStage::FirstDemo),
        )
        .expect("create initech");
    (acme.id, initech.id)
}

fn into_first_demo(id: &ItemId) -> Move<PipelineStage> {
    Move {
        item_id: id.clone(),
        source_bucket: PipelineStage::ColdCalled,
        source_index: 0,
        dest_bucket: Some(PipelineStage::FirstDemo),
        dest_index: 0,
    }
}

#[test]
fn demo_stage_waits_for_confirmation_and_cancel_writes_nothing() {
    let storage_dir = temp_dir("demo_stage_waits_for_confirmation_and_cancel_writes_nothing");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let scope = scope();
    let (acme, _) = board(&mut store, &scope);
    let before = store.list_prospects(&scope).expect("list");

    let moved = store
        .move_prospect(&scope, &into_first_demo(&acme))
        .expect("move");
    let ProspectMove::Pending(pending) = moved else {
        panic!("expected pending demo");
    };
    assert_eq!(pending.demo, DemoKind::First);
    let optimistic = pending
        .optimistic_items()
        .iter()
        .find(|row| row.id == acme)
        .expect("acme in optimistic board");
    assert_eq!(optimistic.stage, PipelineStage::FirstDemo);

    assert_eq!(store.list_prospects(&scope).expect("list"), before);
    assert_eq!(pending.cancel(), before);
    assert!(store.list_events(&scope, whole_june()).expect("events").is_empty());
}

#[test]
fn confirming_demo_books_event_and_persists_stage() {
    let storage_dir = temp_dir("confirming_demo_books_event_and_persists_stage");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let scope = scope();
    let (acme, initech) = board(&mut store, &scope);

    let ProspectMove::Pending(pending) = store
        .move_prospect(&scope, &into_first_demo(&acme))
        .expect("move")
    else {
        panic!("expected pending demo");
    };

    let slot = monday_slot("10:00", "11:00");
    let confirmed = store
        .confirm_demo(
            &scope,
            pending,
            DemoSchedule {
                slot,
                responsible: None,
            },
        )
        .expect("confirm");

    let event = &confirmed.event;
    assert_eq!(event.title, "First Demo - Acme Padel");
    assert_eq!(event.description.as_deref(), Some("Demo scheduled for Acme Padel"));
    assert_eq!(event.event_type, EventType::Demo);
    assert_eq!(event.assigned_to, Assignee::Alppa);
    assert_eq!(event.color, "#F97316");
    assert_eq!(event.prospect_id.as_ref(), Some(&acme));
    assert_eq!(event.slot, slot);
    assert!(confirmed.result.report.failed.is_empty());

    let acme_row = store.get_prospect(&scope, &acme).expect("acme");
    assert_eq!(acme_row.stage, PipelineStage::FirstDemo);
    assert_eq!(acme_row.sort_index, 0);
    assert_eq!(acme_row.first_demo_at_ms, Some(slot.start_ms()));
    assert_eq!(acme_row.second_demo_at_ms, None);

    let initech_row = store.get_prospect(&scope, &initech).expect("initech");
    assert_eq!(initech_row.sort_index, 1);

    let shown = confirmed
        .result
        .current_items()
        .iter()
        .find(|row| row.id == acme)
        .expect("acme shown");
    assert_eq!(shown.first_demo_at_ms, Some(slot.start_ms()));

    let demos = store.prospect_demos(&scope, &acme).expect("demos");
    assert_eq!(demos.len(), 1);
    assert_eq!(demos[0].id, event.id);
}

#[test]
fn confirming_after_prospect_vanished_writes_nothing() {
    let storage_dir = temp_dir("confirming_after_prospect_vanished_writes_nothing");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let scope = scope();
    let (acme, initech) = board(&mut store, &scope);

    let ProspectMove::Pending(pending) = store
        .move_prospect(&scope, &into_first_demo(&acme))
        .expect("move")
    else {
        panic!("expected pending demo");
    };
    store.delete_prospect(&scope, &acme).expect("delete");

    let err = store
        .confirm_demo(
            &scope,
            pending,
            DemoSchedule {
                slot: monday_slot("09:00", "09:30"),
                responsible: Some(Assignee::Veeti),
            },
        )
        .expect_err("prospect is gone");
    assert!(matches!(err, StoreError::UnknownId));
    assert!(store.list_events(&scope, whole_june()).expect("events").is_empty());
    assert_eq!(
        store.get_prospect(&scope, &initech).expect("initech").sort_index,
        0
    );
}

#[test]
fn confirming_over_a_reordered_column_is_rejected_as_stale() {
    let storage_dir = temp_dir("confirming_over_a_reordered_column_is_rejected_as_stale");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let scope = scope();
    let (acme, _) = board(&mut store, &scope);
    let court = store
        .create_prospect(
            &scope,
            ProspectCreateRequest::new("Court Club", PipelineStage::ColdCalled),
        )
        .expect("create court")
        .id;

    let ProspectMove::Pending(pending) = store
        .move_prospect(&scope, &into_first_demo(&acme))
        .expect("move")
    else {
        panic!("expected pending demo");
    };

    // While the dialog is open, Court Club is pulled to the top of "cold called".
    let reorder = Move {
        item_id: court.clone(),
        source_bucket: PipelineStage::ColdCalled,
        source_index: 1,
        dest_bucket: Some(PipelineStage::ColdCalled),
        dest_index: 0,
    };
    assert!(matches!(
        store.move_prospect(&scope, &reorder).expect("reorder"),
        ProspectMove::Applied(_)
    ));
    let before = store.list_prospects(&scope).expect("list");

    let err = store
        .confirm_demo(
            &scope,
            pending,
            DemoSchedule {
                slot: monday_slot("10:00", "11:00"),
                responsible: None,
            },
        )
        .expect_err("stale confirmation");
    assert!(matches!(
        err,
        StoreError::StaleView(NoopReason::SourceMismatch)
    ));
    assert_eq!(store.list_prospects(&scope).expect("list"), before);
    assert_eq!(store.get_prospect(&scope, &court).expect("court").sort_index, 0);
    let acme_row = store.get_prospect(&scope, &acme).expect("acme");
    assert_eq!(acme_row.stage, PipelineStage::ColdCalled);
    assert_eq!(acme_row.first_demo_at_ms, None);
    assert!(store.list_events(&scope, whole_june()).expect("events").is_empty());

    // A fresh drag from the current position goes through.
    let fresh = Move {
        source_index: 1,
        ..into_first_demo(&acme)
    };
    let ProspectMove::Pending(pending) = store.move_prospect(&scope, &fresh).expect("move")
    else {
        panic!("expected pending demo");
    };
    store
        .confirm_demo(
            &scope,
            pending,
            DemoSchedule {
                slot: monday_slot("10:00", "11:00"),
                responsible: None,
            },
        )
        .expect("confirm");
    assert_eq!(store.get_prospect(&scope, &court).expect("court").sort_index, 0);
    assert_eq!(
        store.get_prospect(&scope, &acme).expect("acme").stage,
        PipelineStage::FirstDemo
    );
}

#[test]
fn events_follow_assignee_color_and_survive_prospect_delete() {
    let storage_dir = temp_dir("events_follow_assignee_color_and_survive_prospect_delete");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let scope = scope();
    let (acme, _) = board(&mut store, &scope);

    let call = store
        .create_event(
            &scope,
            EventCreateRequest {
                title: "Intro call".to_string(),
                description: None,
                event_type: EventType::Call,
                slot: monday_slot("13:00", "13:30"),
                all_day: false,
                prospect_id: Some(acme.clone()),
                location: Some("Zoom".to_string()),
                assigned_to: Some(Assignee::Veeti),
            },
        )
        .expect("create event");
    assert_eq!(call.color, "#3B82F6");
    assert_eq!(call.id.as_str(), "EVT-00000001");

    let updated = store
        .update_event(
            &scope,
            &call.id,
            EventPatch {
                assigned_to: Some(Assignee::Ilari),
                slot: Some(monday_slot("14:00", "15:00")),
                ..EventPatch::default()
            },
        )
        .expect("update event");
    assert_eq!(updated.color, "#10B981");
    assert_eq!(updated.slot.position().top_minutes, 14 * 60);

    let team = store
        .create_event(
            &scope,
            EventCreateRequest {
                title: "Planning".to_string(),
                description: None,
                event_type: EventType::Meeting,
                slot: monday_slot("08:00", "09:00"),
                all_day: false,
                prospect_id: None,
                location: None,
                assigned_to: None,
            },
        )
        .expect("team event");
    assert_eq!(team.assigned_to, Assignee::Team);
    assert_eq!(team.color, "#A855F7");

    let listed = store.list_events(&scope, whole_june()).expect("list");
    let ids = listed.iter().map(|e| e.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids, vec![team.id.clone(), call.id.clone()]);

    let missing = ItemId::try_new("PRO-000000FF").expect("id");
    let err = store
        .create_event(
            &scope,
            EventCreateRequest {
                title: "Ghost".to_string(),
                description: None,
                event_type: EventType::Other,
                slot: monday_slot("16:00", "17:00"),
                all_day: false,
                prospect_id: Some(missing),
                location: None,
                assigned_to: None,
            },
        )
        .expect_err("unknown prospect");
    assert!(matches!(err, StoreError::UnknownId));

    store.delete_prospect(&scope, &acme).expect("delete prospect");
    let orphan = store.get_event(&scope, &call.id).expect("event kept");
    assert_eq!(orphan.prospect_id, None);

    store.delete_event(&scope, &team.id).expect("delete event");
    assert!(matches!(
        store.get_event(&scope, &team.id),
        Err(StoreError::UnknownId)
    ));
}

fn website_booking(email: &str, slot: TimeSlot) -> PublicDemoRequest {
    PublicDemoRequest {
        contact_name: "Maija Virtanen".to_string(),
        email: email.to_string(),
        company: "Lakeside Golf".to_string(),
        phone: None,
        slot,
        location: None,
        responsible: Assignee::Veeti,
    }
}

#[test]
fn public_booking_creates_prospect_then_reuses_it_by_email() {
    let storage_dir = temp_dir("public_booking_creates_prospect_then_reuses_it_by_email");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let scope = scope();
    let (_, initech) = board(&mut store, &scope);

    let first_slot = monday_slot("10:00", "11:00");
    let first = store
        .book_public_demo(&scope, website_booking("Maija@Lakeside.Example", first_slot))
        .expect("first booking");
    assert!(first.created);
    assert_eq!(first.demo, DemoKind::First);
    let prospect = &first.prospect;
    assert_eq!(prospect.name, "Lakeside Golf");
    assert_eq!(prospect.email.as_deref(), Some("maija@lakeside.example"));
    assert_eq!(prospect.lead_source, LeadSource::Website);
    assert_eq!(prospect.assigned_to.as_deref(), Some("veeti"));
    assert_eq!(prospect.stage, PipelineStage::FirstDemo);
    assert_eq!(prospect.sort_index, 1);
    assert_eq!(prospect.first_demo_at_ms, Some(first_slot.start_ms()));
    assert_eq!(
        prospect.notes.as_deref(),
        Some("Contact: Maija Virtanen\nBooked demo via website.")
    );
    assert_eq!(first.event.title, "Demo - Lakeside Golf");
    assert_eq!(first.event.event_type, EventType::Demo);
    assert_eq!(first.event.location.as_deref(), Some("Google Meet / Teams"));
    assert_eq!(first.event.color, "#3B82F6");
    assert_eq!(first.event.prospect_id.as_ref(), Some(&prospect.id));
    assert_eq!(
        store.get_prospect(&scope, &initech).expect("initech").sort_index,
        0
    );

    let mut again = website_booking("maija@lakeside.example", monday_slot("14:00", "15:00"));
    again.phone = Some("040 123 4567".to_string());
    let second = store.book_public_demo(&scope, again).expect("second booking");
    assert!(!second.created);
    assert_eq!(second.demo, DemoKind::Second);
    assert_eq!(second.prospect.id, prospect.id);
    assert_eq!(second.prospect.stage, PipelineStage::SecondDemo);
    assert_eq!(second.prospect.phone.as_deref(), Some("040 123 4567"));
    assert_eq!(second.prospect.first_demo_at_ms, Some(first_slot.start_ms()));
    assert!(second.prospect.second_demo_at_ms.is_some());
    assert!(
        second
            .prospect
            .notes
            .as_deref()
            .is_some_and(|notes| notes.ends_with("Updated via website demo booking."))
    );
    assert_eq!(store.prospect_demos(&scope, &prospect.id).expect("demos").len(), 2);
}

#[test]
fn public_booking_leaves_later_stages_in_place() {
    let storage_dir = temp_dir("public_booking_leaves_later_stages_in_place");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let scope = scope();
    let mut request = ProspectCreateRequest::new("Lakeside Golf", PipelineStage::OfferSent);
    request.email = Some("maija@lakeside.example".to_string());
    let existing = store.create_prospect(&scope, request).expect("create");

    let booked = store
        .book_public_demo(
            &scope,
            website_booking("maija@lakeside.example", monday_slot("09:00", "10:00")),
        )
        .expect("booking");
    assert_eq!(booked.prospect.id, existing.id);
    assert_eq!(booked.prospect.stage, PipelineStage::OfferSent);
    assert_eq!(booked.prospect.sort_index, existing.sort_index);

    let err = store
        .book_public_demo(&scope, website_booking("nobody", monday_slot("09:00", "10:00")))
        .expect_err("bad email");
    assert!(matches!(err, StoreError::InvalidInput(_)));
    assert_eq!(store.list_events(&scope, whole_june()).expect("events").len(), 1);
}
