#![forbid(unsafe_code)]

use super::time::ts_ms_to_rfc3339;
use sb_core::calendar::{Placement, WindowDay};
use sb_core::model::{Assignee, PipelineStage};
use sb_core::persist::PersistReport;
use sb_core::reorder::{Outcome, WriteRecord, display_order};
use sb_core::stats::PipelineStats;
use sb_storage::{CalendarEventRow, ProspectRow, TodoRow};
use serde::Serialize;
use serde_json::Value;

pub(crate) fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[derive(Serialize)]
pub(crate) struct ProspectView<'a> {
    id: &'a str,
    name: &'a str,
    kind: &'a str,
    country: &'a str,
    city: &'a str,
    website: Option<&'a str>,
    phone: Option<&'a str>,
    email: Option<&'a str>,
    stage: &'static str,
    priority: &'static str,
    lead_source: &'static str,
    assigned_to: Option<&'a str>,
    notes: Option<&'a str>,
    next_action: Option<&'a str>,
    next_action_date: Option<&'a str>,
    sort_index: i64,
    first_demo_scheduled_at: Option<String>,
    second_demo_scheduled_at: Option<String>,
    created_by: &'a str,
    created_at: String,
    updated_at: String,
}

impl<'a> From<&'a ProspectRow> for ProspectView<'a> {
    fn from(row: &'a ProspectRow) -> Self {
        Self {
            id: row.id.as_str(),
            name: &row.name,
            kind: &row.kind,
            country: &row.country,
            city: &row.city,
            website: row.website.as_deref(),
            phone: row.phone.as_deref(),
            email: row.email.as_deref(),
            stage: row.stage.as_str(),
            priority: row.priority.as_str(),
            lead_source: row.lead_source.as_str(),
            assigned_to: row.assigned_to.as_deref(),
            notes: row.notes.as_deref(),
            next_action: row.next_action.as_deref(),
            next_action_date: row.next_action_date.as_deref(),
            sort_index: row.sort_index,
            first_demo_scheduled_at: row.first_demo_at_ms.map(ts_ms_to_rfc3339),
            second_demo_scheduled_at: row.second_demo_at_ms.map(ts_ms_to_rfc3339),
            created_by: &row.created_by,
            created_at: ts_ms_to_rfc3339(row.created_at_ms),
            updated_at: ts_ms_to_rfc3339(row.updated_at_ms),
        }
    }
}

#[derive(Serialize)]
struct StageCountView {
    stage: &'static str,
    title: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct PriorityCountView {
    priority: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct StatsView {
    total: usize,
    won: usize,
    lost: usize,
    closed: usize,
    /// Percent of closed deals that were won.
    win_rate: f64,
    stages: Vec<StageCountView>,
    priorities: Vec<PriorityCountView>,
}

pub(crate) fn stats_json(stats: &PipelineStats) -> Value {
    to_json(&StatsView {
        total: stats.total,
        won: stats.won(),
        lost: stats.lost(),
        closed: stats.closed(),
        win_rate: stats.win_rate_percent(),
        stages: stats
            .stages()
            .map(|(stage, count)| StageCountView {
                stage: stage.as_str(),
                title: stage.title(),
                count,
            })
            .collect(),
        priorities: stats
            .priorities()
            .map(|(priority, count)| PriorityCountView {
                priority: priority.as_str(),
                count,
            })
            .collect(),
    })
}

#[derive(Serialize)]
struct ColumnView<'a> {
    stage: &'static str,
    title: &'static str,
    prospects: Vec<ProspectView<'a>>,
}

pub(crate) fn prospect_json(row: &ProspectRow) -> Value {
    to_json(&ProspectView::from(row))
}

/// The board as columns in stage order, each column in display order.
pub(crate) fn board_json(rows: &[ProspectRow]) -> Value {
    let columns = PipelineStage::ALL
        .iter()
        .map(|stage| ColumnView {
            stage: stage.as_str(),
            title: stage.title(),
            prospects: display_order(rows, stage)
                .into_iter()
                .map(ProspectView::from)
                .collect(),
        })
        .collect::<Vec<_>>();
    to_json(&columns)
}

#[derive(Serialize)]
pub(crate) struct TodoView<'a> {
    id: &'a str,
    title: &'a str,
    description: Option<&'a str>,
    completed: bool,
    assigned_to: &'static str,
    due_date: String,
    display_order: i64,
    screenshot_url: Option<&'a str>,
    created_by: &'a str,
    created_at: String,
    updated_at: String,
}

impl<'a> From<&'a TodoRow> for TodoView<'a> {
    fn from(row: &'a TodoRow) -> Self {
        Self {
            id: row.id.as_str(),
            title: &row.title,
            description: row.description.as_deref(),
            completed: row.completed,
            assigned_to: row.assigned_to.as_str(),
            due_date: row.due.to_string(),
            display_order: row.sort_index,
            screenshot_url: row.screenshot_url.as_deref(),
            created_by: &row.created_by,
            created_at: ts_ms_to_rfc3339(row.created_at_ms),
            updated_at: ts_ms_to_rfc3339(row.updated_at_ms),
        }
    }
}

pub(crate) fn todo_json(row: &TodoRow) -> Value {
    to_json(&TodoView::from(row))
}

pub(crate) fn todos_json<'a>(rows: impl IntoIterator<Item = &'a TodoRow>) -> Value {
    to_json(&rows.into_iter().map(TodoView::from).collect::<Vec<_>>())
}

#[derive(Serialize)]
struct WindowDayView<'a> {
    date: String,
    label: &'a str,
    is_today: bool,
    todos: Vec<TodoView<'a>>,
}

pub(crate) fn window_json(days: &[WindowDay], rows: &[TodoRow]) -> Value {
    let view = days
        .iter()
        .map(|day| WindowDayView {
            date: day.bucket.to_string(),
            label: &day.label,
            is_today: day.is_today,
            todos: display_order(rows, &day.bucket)
                .into_iter()
                .map(TodoView::from)
                .collect(),
        })
        .collect::<Vec<_>>();
    to_json(&view)
}

#[derive(Serialize)]
pub(crate) struct EventView<'a> {
    id: &'a str,
    title: &'a str,
    description: Option<&'a str>,
    event_type: &'static str,
    start: String,
    end: String,
    all_day: bool,
    prospect_id: Option<&'a str>,
    location: Option<&'a str>,
    assigned_to: &'static str,
    color: &'a str,
    created_by: &'a str,
}

impl<'a> From<&'a CalendarEventRow> for EventView<'a> {
    fn from(row: &'a CalendarEventRow) -> Self {
        Self {
            id: row.id.as_str(),
            title: &row.title,
            description: row.description.as_deref(),
            event_type: row.event_type.as_str(),
            start: ts_ms_to_rfc3339(row.slot.start_ms()),
            end: ts_ms_to_rfc3339(row.slot.end_ms()),
            all_day: row.all_day,
            prospect_id: row.prospect_id.as_ref().map(|id| id.as_str()),
            location: row.location.as_deref(),
            assigned_to: row.assigned_to.as_str(),
            color: &row.color,
            created_by: &row.created_by,
        }
    }
}

pub(crate) fn event_json(row: &CalendarEventRow) -> Value {
    to_json(&EventView::from(row))
}

pub(crate) fn events_json(rows: &[CalendarEventRow]) -> Value {
    to_json(&rows.iter().map(EventView::from).collect::<Vec<_>>())
}

#[derive(Serialize)]
struct PlacementView<'a> {
    id: &'a str,
    top_minutes: i64,
    height_minutes: i64,
    lane: usize,
    lanes: usize,
}

pub(crate) fn layout_json(placements: &[Placement]) -> Value {
    let view = placements
        .iter()
        .map(|placement| {
            let position = placement.slot.position();
            PlacementView {
                id: placement.id.as_str(),
                top_minutes: position.top_minutes,
                height_minutes: position.height_minutes,
                lane: placement.lane,
                lanes: placement.lanes,
            }
        })
        .collect::<Vec<_>>();
    to_json(&view)
}

#[derive(Serialize)]
struct WriteView<'a> {
    id: &'a str,
    bucket: String,
    sort_index: i64,
}

pub(crate) fn writes_json<B>(writes: &[WriteRecord<B>], bucket: impl Fn(&B) -> String) -> Value {
    let view = writes
        .iter()
        .map(|record| WriteView {
            id: record.id.as_str(),
            bucket: bucket(&record.bucket),
            sort_index: record.sort_index,
        })
        .collect::<Vec<_>>();
    to_json(&view)
}

#[derive(Serialize)]
struct FailureView<'a> {
    id: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct ReportView<'a> {
    applied: Vec<&'a str>,
    failed: Vec<FailureView<'a>>,
    needs_reload: bool,
}

pub(crate) fn report_json(report: &PersistReport) -> Value {
    to_json(&ReportView {
        applied: report.applied.iter().map(|id| id.as_str()).collect(),
        failed: report
            .failed
            .iter()
            .map(|failure| FailureView {
                id: failure.id.as_str(),
                message: &failure.message,
            })
            .collect(),
        needs_reload: report.needs_reload(),
    })
}

pub(crate) fn outcome_str(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Applied => "applied",
        Outcome::Unchanged(reason) => reason.as_str(),
    }
}

#[derive(Serialize)]
struct AssigneeView {
    id: &'static str,
    label: &'static str,
    color: &'static str,
}

pub(crate) fn team_json(team: &[Assignee]) -> Value {
    to_json(
        &team
            .iter()
            .map(|person| AssigneeView {
                id: person.as_str(),
                label: person.label(),
                color: person.color(),
            })
            .collect::<Vec<_>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_core::ids::ItemId;

    #[test]
    fn write_records_render_bucket_keys() {
        let writes = vec![WriteRecord {
            id: ItemId::try_new("PRO-00000002").expect("id"),
            bucket: PipelineStage::OfferSent,
            sort_index: 0,
        }];
        let json = writes_json(&writes, |stage| stage.as_str().to_string());
        assert_eq!(json[0]["id"], "PRO-00000002");
        assert_eq!(json[0]["bucket"], "offer_sent");
        assert_eq!(json[0]["sort_index"], 0);
    }

    #[test]
    fn team_lists_colors() {
        let json = team_json(&[Assignee::Team, Assignee::Veeti]);
        assert_eq!(json[0]["color"], "#A855F7");
        assert_eq!(json[1]["label"], "Veeti");
    }
}
