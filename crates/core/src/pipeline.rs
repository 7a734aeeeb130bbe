#![forbid(unsafe_code)]

use crate::ids::ItemId;
use crate::model::{DemoKind, PipelineStage};
use crate::reorder::{Move, NoopReason, Ordered, Outcome, Reassignment, WriteRecord, reassign};

/// A stage change into a demo column, held back until a demo time is confirmed.
#[derive(Clone, Debug)]
pub struct PendingStageChange<T: Ordered<Bucket = PipelineStage>> {
    pub item_id: ItemId,
    pub demo: DemoKind,
    pub from: PipelineStage,
    gesture: Move<PipelineStage>,
    optimistic: Reassignment<T>,
    snapshot: Vec<T>,
}

impl<T: Ordered<Bucket = PipelineStage>> PendingStageChange<T> {
    /// Board state to show while the confirmation is open.
    pub fn optimistic_items(&self) -> &[T] {
        &self.optimistic.items
    }

    pub fn writes(&self) -> &[WriteRecord<PipelineStage>] {
        &self.optimistic.writes
    }

    /// Board state from before the drag.
    pub fn cancel(self) -> Vec<T> {
        self.snapshot
    }

    /// The optimistic result, to be persisted once the demo is booked.
    pub fn into_reassignment(self) -> Reassignment<T> {
        self.optimistic
    }

    /// Plans the same drag again over the current board.
    ///
    /// Fails with the no-op reason when the board moved on since the drag, so a late
    /// confirmation never writes positions computed from a stale view.
    pub fn replan(&self, items: Vec<T>) -> Result<PendingStageChange<T>, NoopReason>
    where
        T: Clone,
    {
        match plan_stage_move(items, &self.gesture) {
            StageMove::Gated(fresh) => Ok(fresh),
            StageMove::Unchanged { reason, .. } => Err(reason),
            StageMove::Ready(_) => Err(NoopReason::SourceMismatch),
        }
    }
}

#[derive(Clone, Debug)]
pub enum StageMove<T: Ordered<Bucket = PipelineStage>> {
    Ready(Reassignment<T>),
    Gated(PendingStageChange<T>),
    Unchanged { items: Vec<T>, reason: NoopReason },
}

pub fn plan_stage_move<T>(items: Vec<T>, mv: &Move<PipelineStage>) -> StageMove<T>
where
    T: Ordered<Bucket = PipelineStage> + Clone,
{
    let demo = mv
        .dest_bucket
        .filter(|dest| *dest != mv.source_bucket)
        .and_then(PipelineStage::demo_kind);
    let snapshot = demo.map(|_| items.clone());

    let out = reassign(items, mv);
    if let Outcome::Unchanged(reason) = out.outcome {
        return StageMove::Unchanged {
            items: out.items,
            reason,
        };
    }

    match (demo, snapshot) {
        (Some(demo), Some(snapshot)) => StageMove::Gated(PendingStageChange {
            item_id: mv.item_id.clone(),
            demo,
            from: mv.source_bucket,
            gesture: mv.clone(),
            optimistic: out,
            snapshot,
        }),
        _ => StageMove::Ready(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::display_order;

    #[derive(Clone, Debug, PartialEq)]
    struct Lead {
        id: ItemId,
        stage: PipelineStage,
        sort_index: i64,
    }

    impl Ordered for Lead {
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

    fn lead(id: &str, stage: PipelineStage, sort_index: i64) -> Lead {
        Lead {
            id: ItemId::try_new(id).expect("item id"),
            stage,
            sort_index,
        }
    }

    fn board() -> Vec<Lead> {
        vec![
            lead("acme", PipelineStage::ColdCalled, 0),
            lead("globex", PipelineStage::ColdCalled, 1),
            lead("initech", PipelineStage::FirstDemo, 0),
        ]
    }

    fn to(
        id: &str,
        from: PipelineStage,
        from_index: usize,
        dest: PipelineStage,
        dest_index: usize,
    ) -> Move<PipelineStage> {
        Move {
            item_id: ItemId::try_new(id).expect("item id"),
            source_bucket: from,
            source_index: from_index,
            dest_bucket: Some(dest),
            dest_index,
        }
    }

    #[test]
    fn entering_demo_stage_is_gated_and_cancel_restores_board() {
        let before = board();
        let planned = plan_stage_move(
            before.clone(),
            &to("globex", PipelineStage::ColdCalled, 1, PipelineStage::FirstDemo, 0),
        );
        let StageMove::Gated(pending) = planned else {
            panic!("expected gated move");
        };
        assert_eq!(pending.demo, DemoKind::First);
        assert_eq!(pending.from, PipelineStage::ColdCalled);

        let optimistic = display_order(pending.optimistic_items(), &PipelineStage::FirstDemo)
            .into_iter()
            .map(|l| l.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(optimistic, vec!["globex", "initech"]);
        assert!(!pending.writes().is_empty());

        assert_eq!(pending.cancel(), before);
    }

    #[test]
    fn other_stage_changes_are_ready() {
        let planned = plan_stage_move(
            board(),
            &to("initech", PipelineStage::FirstDemo, 0, PipelineStage::OfferSent, 0),
        );
        let StageMove::Ready(out) = planned else {
            panic!("expected ready move");
        };
        assert_eq!(out.writes.len(), 1);
        assert_eq!(out.writes[0].bucket, PipelineStage::OfferSent);
    }

    #[test]
    fn reordering_inside_demo_column_is_not_gated() {
        let mut items = board();
        items.push(lead("hooli", PipelineStage::FirstDemo, 1));
        let planned = plan_stage_move(
            items,
            &to("hooli", PipelineStage::FirstDemo, 1, PipelineStage::FirstDemo, 0),
        );
        assert!(matches!(planned, StageMove::Ready(_)));
    }

    #[test]
    fn replan_follows_the_current_board() {
        let gesture = to("acme", PipelineStage::ColdCalled, 0, PipelineStage::FirstDemo, 0);
        let StageMove::Gated(pending) = plan_stage_move(board(), &gesture) else {
            panic!("expected gated move");
        };

        let fresh = pending.replan(board()).expect("board did not change");
        assert_eq!(fresh.writes(), pending.writes());

        // Someone pulled globex above acme while the dialog was open.
        let mut reordered = board();
        reordered[0].sort_index = 1;
        reordered[1].sort_index = 0;
        assert_eq!(
            pending.replan(reordered).map(|p| p.item_id),
            Err(NoopReason::SourceMismatch)
        );

        let without_acme = board().into_iter().skip(1).collect::<Vec<_>>();
        assert_eq!(
            pending.replan(without_acme).map(|p| p.item_id),
            Err(NoopReason::UnknownItem)
        );
    }

    #[test]
    fn invalid_gated_move_is_unchanged() {
        let planned = plan_stage_move(
            board(),
            &to("missing", PipelineStage::ColdCalled, 0, PipelineStage::SecondDemo, 0),
        );
        match planned {
            StageMove::Unchanged { items, reason } => {
                assert_eq!(reason, NoopReason::UnknownItem);
                assert_eq!(items, board());
            }
            _ => panic!("expected unchanged"),
        }
    }
}
