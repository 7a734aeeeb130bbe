#![forbid(unsafe_code)]

use rusqlite::Row;
use rusqlite::types::Type;
use sb_core::calendar::{DayBucket, TimeSlot};
use sb_core::ids::ItemId;
use sb_core::model::{Assignee, EventType, LeadSource, PipelineStage, Priority};
use sb_core::reorder::Ordered;

#[derive(Clone, Debug, PartialEq)]
pub struct ProspectRow {
    pub id: ItemId,
    pub name: String,
    /// Company type, e.g. "Padel club".
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
    pub sort_index: i64,
    pub first_demo_at_ms: Option<i64>,
    pub second_demo_at_ms: Option<i64>,
    pub created_by: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Ordered for ProspectRow {
    type Bucket = PipelineStage;

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn bucket(&self) -> &PipelineStage {
        &self.stage
    }

    fn sort_index(&self) -> i64 {
        self.sort_index
    }

    fn place(&mut self, bucket: PipelineStage, sort_index: i64) {
        self.stage = bucket;
        self.sort_index = sort_index;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TodoRow {
    pub id: ItemId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub assigned_to: Assignee,
    pub due: DayBucket,
    pub sort_index: i64,
    pub screenshot_url: Option<String>,
    pub created_by: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Ordered for TodoRow {
    type Bucket = DayBucket;

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn bucket(&self) -> &DayBucket {
        &self.due
    }

    fn sort_index(&self) -> i64 {
        self.sort_index
    }

    fn place(&mut self, bucket: DayBucket, sort_index: i64) {
        self.due = bucket;
        self.sort_index = sort_index;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalendarEventRow {
    pub id: ItemId,
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub slot: TimeSlot,
    pub all_day: bool,
    pub prospect_id: Option<ItemId>,
    pub location: Option<String>,
    pub assigned_to: Assignee,
    pub color: String,
    pub created_by: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

pub(super) const PROSPECT_COLUMNS: &str = "id, name, kind, country, city, website, phone, \
     pipeline_stage, priority, lead_source, assigned_to, notes, next_action, next_action_date, \
     sort_index, first_demo_scheduled_at_ms, second_demo_scheduled_at_ms, created_by, \
     created_at_ms, updated_at_ms, email";

pub(super) const TODO_COLUMNS: &str = "id, title, description, completed, assigned_to, due_date, \
     display_order, screenshot_url, created_by, created_at_ms, updated_at_ms";

pub(super) const EVENT_COLUMNS: &str = "id, title, description, event_type, start_ms, end_ms, \
     all_day, prospect_id, location, assigned_to, color, created_by, created_at_ms, updated_at_ms";

#[derive(Debug)]
struct BadColumn(&'static str);

impl std::fmt::Display for BadColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} column", self.0)
    }
}

impl std::error::Error for BadColumn {}

fn bad(idx: usize, what: &'static str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(BadColumn(what)))
}

pub(super) fn parsed<T>(
    row: &Row<'_>,
    idx: usize,
    what: &'static str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw = row.get::<_, String>(idx)?;
    parse(&raw).ok_or_else(|| bad(idx, what))
}

fn item_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<ItemId> {
    parsed(row, idx, "id", |v| ItemId::try_new(v).ok())
}

pub(super) fn read_prospect(row: &Row<'_>) -> rusqlite::Result<ProspectRow> {
    Ok(ProspectRow {
        id: item_id(row, 0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        country: row.get(3)?,
        city: row.get(4)?,
        website: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(20)?,
        stage: parsed(row, 7, "pipeline_stage", PipelineStage::parse)?,
        priority: parsed(row, 8, "priority", Priority::parse)?,
        lead_source: parsed(row, 9, "lead_source", LeadSource::parse)?,
        assigned_to: row.get(10)?,
        notes: row.get(11)?,
        next_action: row.get(12)?,
        next_action_date: row.get(13)?,
        sort_index: row.get(14)?,
        first_demo_at_ms: row.get(15)?,
        second_demo_at_ms: row.get(16)?,
        created_by: row.get(17)?,
        created_at_ms: row.get(18)?,
        updated_at_ms: row.get(19)?,
    })
}

pub(super) fn read_todo(row: &Row<'_>) -> rusqlite::Result<TodoRow> {
    Ok(TodoRow {
        id: item_id(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        completed: row.get::<_, i64>(3)? != 0,
        assigned_to: parsed(row, 4, "assigned_to", Assignee::parse)?,
        due: parsed(row, 5, "due_date", |v| DayBucket::parse(v).ok())?,
        sort_index: row.get(6)?,
        screenshot_url: row.get(7)?,
        created_by: row.get(8)?,
        created_at_ms: row.get(9)?,
        updated_at_ms: row.get(10)?,
    })
}

pub(super) fn read_event(row: &Row<'_>) -> rusqlite::Result<CalendarEventRow> {
    let start_ms: i64 = row.get(4)?;
    let end_ms: i64 = row.get(5)?;
    let prospect_id = match row.get::<_, Option<String>>(7)? {
        Some(raw) => Some(ItemId::try_new(raw).map_err(|_| bad(7, "prospect_id"))?),
        None => None,
    };
    Ok(CalendarEventRow {
        id: item_id(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        event_type: parsed(row, 3, "event_type", EventType::parse)?,
        slot: TimeSlot::try_new(start_ms, end_ms).map_err(|_| bad(5, "end_ms"))?,
        all_day: row.get::<_, i64>(6)? != 0,
        prospect_id,
        location: row.get(8)?,
        assigned_to: parsed(row, 9, "assigned_to", Assignee::parse)?,
        color: row.get(10)?,
        created_by: row.get(11)?,
        created_at_ms: row.get(12)?,
        updated_at_ms: row.get(13)?,
    })
}
