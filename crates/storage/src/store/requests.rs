#![forbid(unsafe_code)]

use sb_core::calendar::{DayBucket, TimeSlot};
use sb_core::ids::ItemId;
use sb_core::model::{Assignee, EventType, LeadSource, PipelineStage, Priority};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProspectCreateRequest {
    pub name: String,
    pub kind: String,
    pub country: String,
    pub city: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub stage: PipelineStage,
    pub priority: Priority,
    pub lead_source: LeadSource,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub next_action: Option<String>,
    pub next_action_date: Option<String>,
}

impl ProspectCreateRequest {
    pub fn new(name: impl Into<String>, stage: PipelineStage) -> Self {
        Self {
            name: name.into(),
            kind: String::new(),
            country: String::new(),
            city: String::new(),
            website: None,
            phone: None,
            email: None,
            stage,
            priority: Priority::Medium,
            lead_source: LeadSource::ColdOutreach,
            assigned_to: None,
            notes: None,
            next_action: None,
            next_action_date: None,
        }
    }
}

/// Payload-only edit. Stage and board position change only through reorder writes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProspectPatch {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub website: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub lead_source: Option<LeadSource>,
    pub assigned_to: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub next_action: Option<Option<String>>,
    pub next_action_date: Option<Option<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoCreateRequest {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Assignee,
    pub due: DayBucket,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub assigned_to: Option<Assignee>,
    /// Opaque URL handed back by the blob store.
    pub screenshot_url: Option<Option<String>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TodoRange {
    pub from: Option<DayBucket>,
    pub until: Option<DayBucket>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventCreateRequest {
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub slot: TimeSlot,
    pub all_day: bool,
    pub prospect_id: Option<ItemId>,
    pub location: Option<String>,
    pub assigned_to: Option<Assignee>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub event_type: Option<EventType>,
    pub slot: Option<TimeSlot>,
    pub all_day: Option<bool>,
    pub location: Option<Option<String>>,
    pub assigned_to: Option<Assignee>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemoSchedule {
    pub slot: TimeSlot,
    pub responsible: Option<Assignee>,
}

/// A demo booked by a visitor of the public booking page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicDemoRequest {
    pub contact_name: String,
    pub email: String,
    pub company: String,
    pub phone: Option<String>,
    pub slot: TimeSlot,
    /// Meeting link or place; a generic video-call note when absent.
    pub location: Option<String>,
    pub responsible: Assignee,
}
