#![forbid(unsafe_code)]

use super::events::create_event_tx;
use super::prospects::{get_prospect_conn, set_demo_scheduled_conn};
use super::*;
use rusqlite::params;
use sb_core::calendar::DayBucket;
use sb_core::ids::ItemId;
use sb_core::model::{Assignee, DemoKind, EventType, PipelineStage};
use sb_core::persist::{PersistReport, WriteSink, persist_reassignment};
use sb_core::pipeline::{PendingStageChange, StageMove, plan_stage_move};
use sb_core::reorder::{
    Move, NoopReason, Ordered, Reassignment, WriteRecord, append_all, reassign,
};

/// Applies prospect reorder writes one row at a time, outside any transaction.
pub struct ProspectWrites<'a> {
    conn: &'a Connection,
    organization: &'a str,
}

impl WriteSink<PipelineStage> for ProspectWrites<'_> {
    type Error = StoreError;

    fn apply(&mut self, record: &WriteRecord<PipelineStage>) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE prospects SET pipeline_stage = ?3, sort_index = ?4, updated_at_ms = ?5 \
             WHERE organization_id = ?1 AND id = ?2",
            params![
                self.organization,
                record.id.as_str(),
                record.bucket.as_str(),
                record.sort_index,
                now_ms(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownId);
        }
        Ok(())
    }
}

pub struct TodoWrites<'a> {
    conn: &'a Connection,
    organization: &'a str,
}

impl WriteSink<DayBucket> for TodoWrites<'_> {
    type Error = StoreError;

    fn apply(&mut self, record: &WriteRecord<DayBucket>) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE todos SET due_date = ?3, display_order = ?4, updated_at_ms = ?5 \
             WHERE organization_id = ?1 AND id = ?2",
            params![
                self.organization,
                record.id.as_str(),
                record.bucket.to_string(),
                record.sort_index,
                now_ms(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownId);
        }
        Ok(())
    }
}

/// A reassignment after its writes were issued.
#[derive(Clone, Debug)]
pub struct MoveResult<T: Ordered> {
    pub reassignment: Reassignment<T>,
    pub report: PersistReport,
    /// Fresh rows for the touched buckets, read back when a write failed.
    pub reloaded: Option<Vec<T>>,
}

impl<T: Ordered> MoveResult<T> {
    /// What the board should show now.
    pub fn current_items(&self) -> &[T] {
        self.reloaded
            .as_deref()
            .unwrap_or(&self.reassignment.items)
    }
}

#[derive(Clone, Debug)]
pub enum ProspectMove {
    Applied(MoveResult<ProspectRow>),
    /// Nothing was written; the change waits for [`SqliteStore::confirm_demo`].
    Pending(PendingStageChange<ProspectRow>),
    Unchanged {
        items: Vec<ProspectRow>,
        reason: NoopReason,
    },
}

#[derive(Clone, Debug)]
pub struct DemoConfirmation {
    pub event: CalendarEventRow,
    pub result: MoveResult<ProspectRow>,
}

impl SqliteStore {
    pub fn prospect_writes<'a>(&'a self, scope: &'a Scope) -> ProspectWrites<'a> {
        ProspectWrites {
            conn: &self.conn,
            organization: scope.org(),
        }
    }

    pub fn todo_writes<'a>(&'a self, scope: &'a Scope) -> TodoWrites<'a> {
        TodoWrites {
            conn: &self.conn,
            organization: scope.org(),
        }
    }

    /// Drag of one todo between (or within) day columns. Only the source and destination days
    /// are loaded and renumbered.
    pub fn move_todo(
        &mut self,
        scope: &Scope,
        mv: &Move<DayBucket>,
    ) -> Result<MoveResult<TodoRow>, StoreError> {
        let mut days = vec![mv.source_bucket];
        days.extend(mv.dest_bucket);
        let items = self.list_todos_on(scope, &days)?;

        let reassignment = reassign(items, mv);
        if !reassignment.is_applied() {
            tracing::debug!(
                id = mv.item_id.as_str(),
                outcome = ?reassignment.outcome,
                "todo move skipped"
            );
        }
        let report = persist_reassignment(&mut self.todo_writes(scope), &reassignment.writes);
        self.settle(reassignment, report, |store| store.list_todos_on(scope, &days))
    }

    /// Carries every open todo of `from` to the end of `to`, keeping their order.
    pub fn roll_over_todos(
        &mut self,
        scope: &Scope,
        from: DayBucket,
        to: DayBucket,
    ) -> Result<MoveResult<TodoRow>, StoreError> {
        let days = [from, to];
        let items = self.list_todos_on(scope, &days)?;

        let reassignment = append_all(items, &from, &to, |todo| !todo.completed);
        let report = persist_reassignment(&mut self.todo_writes(scope), &reassignment.writes);
        if reassignment.is_applied() {
            tracing::info!(
                from = %from,
                to = %to,
                moved = reassignment.writes.iter().filter(|w| w.bucket == to).count(),
                "todos rolled over"
            );
        }
        self.settle(reassignment, report, |store| store.list_todos_on(scope, &days))
    }

    /// Drag of one prospect across the board. Moves into a demo column come back
    /// [`ProspectMove::Pending`] without touching the store.
    pub fn move_prospect(
        &mut self,
        scope: &Scope,
        mv: &Move<PipelineStage>,
    ) -> Result<ProspectMove, StoreError> {
        let items = self.list_prospects(scope)?;
        match plan_stage_move(items, mv) {
            StageMove::Ready(reassignment) => {
                let report =
                    persist_reassignment(&mut self.prospect_writes(scope), &reassignment.writes);
                let result =
                    self.settle(reassignment, report, |store| store.list_prospects(scope))?;
                Ok(ProspectMove::Applied(result))
            }
            StageMove::Gated(pending) => {
                tracing::debug!(
                    id = pending.item_id.as_str(),
                    demo = pending.demo.label(),
                    "stage change awaiting demo confirmation"
                );
                Ok(ProspectMove::Pending(pending))
            }
            StageMove::Unchanged { items, reason } => Ok(ProspectMove::Unchanged { items, reason }),
        }
    }

    /// Books the demo for a gated stage change, then persists the change itself.
    ///
    /// The drag is planned again over the current board first; if the board moved on
    /// ([`StoreError::StaleView`]) or the prospect vanished, nothing is written. The event and
    /// the scheduled-at stamp commit together; the reorder writes follow row by row.
    pub fn confirm_demo(
        &mut self,
        scope: &Scope,
        pending: PendingStageChange<ProspectRow>,
        schedule: DemoSchedule,
    ) -> Result<DemoConfirmation, StoreError> {
        let pending = pending
            .replan(self.list_prospects(scope)?)
            .map_err(|reason| match reason {
                NoopReason::UnknownItem => StoreError::UnknownId,
                reason => StoreError::StaleView(reason),
            })?;
        let demo = pending.demo;
        let id = pending.item_id.clone();

        let tx = self.conn.transaction()?;
        let prospect = get_prospect_conn(&tx, scope.org(), &id)?;
        let responsible = schedule
            .responsible
            .unwrap_or_else(|| Assignee::resolve(prospect.assigned_to.as_deref()));
        let event = create_event_tx(
            &tx,
            scope,
            EventCreateRequest {
                title: format!("{} - {}", demo.label(), prospect.name),
                description: Some(format!("Demo scheduled for {}", prospect.name)),
                event_type: EventType::Demo,
                slot: schedule.slot,
                all_day: false,
                prospect_id: Some(id.clone()),
                location: None,
                assigned_to: Some(responsible),
            },
        )?;
        let at_ms = schedule.slot.start_ms();
        set_demo_scheduled_conn(&tx, scope.org(), &id, demo, at_ms)?;
        tx.commit()?;

        let mut reassignment = pending.into_reassignment();
        stamp_demo(&mut reassignment.items, &id, demo, at_ms);
        let report = persist_reassignment(&mut self.prospect_writes(scope), &reassignment.writes);
        let result = self.settle(reassignment, report, |store| store.list_prospects(scope))?;

        tracing::info!(
            id = id.as_str(),
            event = event.id.as_str(),
            demo = demo.label(),
            "demo confirmed"
        );
        Ok(DemoConfirmation { event, result })
    }

    fn settle<T: Ordered>(
        &self,
        reassignment: Reassignment<T>,
        report: PersistReport,
        reload: impl FnOnce(&Self) -> Result<Vec<T>, StoreError>,
    ) -> Result<MoveResult<T>, StoreError> {
        let reloaded = if report.needs_reload() {
            Some(reload(self)?)
        } else {
            None
        };
        Ok(MoveResult {
            reassignment,
            report,
            reloaded,
        })
    }
}

fn stamp_demo(items: &mut [ProspectRow], id: &ItemId, demo: DemoKind, at_ms: i64) {
    if let Some(row) = items.iter_mut().find(|row| &row.id == id) {
        match demo {
            DemoKind::First => row.first_demo_at_ms = Some(at_ms),
            DemoKind::Second => row.second_demo_at_ms = Some(at_ms),
        }
    }
}
