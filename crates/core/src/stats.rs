#![forbid(unsafe_code)]

use crate::model::{PipelineStage, Priority};

/// Headline numbers of one organization's pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub total: usize,
    by_stage: [usize; PipelineStage::ALL.len()],
    by_priority: [usize; Priority::ALL.len()],
}

impl PipelineStats {
    /// Folds `(stage, priority, count)` groups, as returned by a `GROUP BY` query.
    pub fn tally(groups: impl IntoIterator<Item = (PipelineStage, Priority, usize)>) -> Self {
        let mut stats = Self::default();
        for (stage, priority, count) in groups {
            stats.total += count;
            stats.by_stage[stage_slot(stage)] += count;
            stats.by_priority[priority_slot(priority)] += count;
        }
        stats
    }

    pub fn count(&self, stage: PipelineStage) -> usize {
        self.by_stage[stage_slot(stage)]
    }

    pub fn priority_count(&self, priority: Priority) -> usize {
        self.by_priority[priority_slot(priority)]
    }

    pub fn won(&self) -> usize {
        self.count(PipelineStage::OfferAccepted)
    }

    pub fn lost(&self) -> usize {
        self.count(PipelineStage::OfferRejected)
    }

    pub fn closed(&self) -> usize {
        self.won() + self.lost()
    }

    /// Share of closed deals that were won, in percent with one decimal. Zero until a deal
    /// closes.
    pub fn win_rate_percent(&self) -> f64 {
        let closed = self.closed();
        if closed == 0 {
            return 0.0;
        }
        let per_mille = (self.won() * 1000 + closed / 2) / closed;
        per_mille as f64 / 10.0
    }

    /// Stages in board order with their counts.
    pub fn stages(&self) -> impl Iterator<Item = (PipelineStage, usize)> + '_ {
        PipelineStage::ALL
            .into_iter()
            .map(|stage| (stage, self.count(stage)))
    }

    pub fn priorities(&self) -> impl Iterator<Item = (Priority, usize)> + '_ {
        Priority::ALL
            .into_iter()
            .map(|priority| (priority, self.priority_count(priority)))
    }
}

fn stage_slot(stage: PipelineStage) -> usize {
    PipelineStage::ALL
        .iter()
        .position(|s| *s == stage)
        .unwrap_or_default()
}

fn priority_slot(priority: Priority) -> usize {
    Priority::ALL
        .iter()
        .position(|p| *p == priority)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_stages_and_priorities() {
        let stats = PipelineStats::tally([
            (PipelineStage::ColdCalled, Priority::High, 3),
            (PipelineStage::ColdCalled, Priority::Low, 1),
            (PipelineStage::OfferAccepted, Priority::Medium, 2),
            (PipelineStage::OfferRejected, Priority::Medium, 1),
        ]);
        assert_eq!(stats.total, 7);
        assert_eq!(stats.count(PipelineStage::ColdCalled), 4);
        assert_eq!(stats.count(PipelineStage::FirstDemo), 0);
        assert_eq!((stats.won(), stats.lost(), stats.closed()), (2, 1, 3));
        assert_eq!(stats.priority_count(Priority::Medium), 3);
        assert_eq!(stats.win_rate_percent(), 66.7);

        let stages = stats.stages().map(|(stage, _)| stage).collect::<Vec<_>>();
        assert_eq!(stages, PipelineStage::ALL);
        let priorities = stats.priorities().collect::<Vec<_>>();
        assert_eq!(
            priorities,
            [(Priority::High, 3), (Priority::Medium, 3), (Priority::Low, 1)]
        );
    }

    #[test]
    fn win_rate_is_zero_until_a_deal_closes() {
        let open = PipelineStats::tally([(PipelineStage::OfferSent, Priority::High, 5)]);
        assert_eq!(open.win_rate_percent(), 0.0);
        assert_eq!(PipelineStats::default().win_rate_percent(), 0.0);

        let all_won = PipelineStats::tally([(PipelineStage::OfferAccepted, Priority::Low, 4)]);
        assert_eq!(all_won.win_rate_percent(), 100.0);
    }
}
