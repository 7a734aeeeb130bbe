#![forbid(unsafe_code)]

//! Bucketed manual ordering.
//!
//! Every participating row lives in exactly one bucket (a pipeline stage, a due date) and carries
//! a sort index that is only meaningful relative to its siblings. Sorting a bucket by sort index
//! (ties broken by collection order) yields the display order. The functions here are pure: they
//! rewrite the in-memory collection and describe the rows that changed, and leave persistence to
//! [`crate::persist`].

use crate::ids::ItemId;

pub trait Ordered {
    type Bucket: Clone + PartialEq + std::fmt::Debug;

    fn id(&self) -> &ItemId;
    fn bucket(&self) -> &Self::Bucket;
    fn sort_index(&self) -> i64;
    fn place(&mut self, bucket: Self::Bucket, sort_index: i64);
}

/// One drag gesture. Indices are positions in the display order of their bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Move<B> {
    pub item_id: ItemId,
    pub source_bucket: B,
    pub source_index: usize,
    /// `None` when the item was dropped outside every bucket.
    pub dest_bucket: Option<B>,
    pub dest_index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteRecord<B> {
    pub id: ItemId,
    pub bucket: B,
    pub sort_index: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoopReason {
    NoDestination,
    SamePosition,
    UnknownItem,
    SourceMismatch,
    EmptySelection,
}

impl NoopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoDestination => "no_destination",
            Self::SamePosition => "same_position",
            Self::UnknownItem => "unknown_item",
            Self::SourceMismatch => "source_mismatch",
            Self::EmptySelection => "empty_selection",
        }
    }

    /// True for the reasons that mean the caller's view is stale rather than the gesture empty.
    pub fn is_invalid_move(self) -> bool {
        matches!(self, Self::UnknownItem | Self::SourceMismatch)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Unchanged(NoopReason),
}

#[derive(Clone, Debug)]
pub struct Reassignment<T: Ordered> {
    pub items: Vec<T>,
    pub writes: Vec<WriteRecord<T::Bucket>>,
    pub outcome: Outcome,
}

impl<T: Ordered> Reassignment<T> {
    fn unchanged(items: Vec<T>, reason: NoopReason) -> Self {
        Self {
            items,
            writes: Vec::new(),
            outcome: Outcome::Unchanged(reason),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }
}

/// Positions (into `items`) of the members of `bucket`, in display order.
fn display_positions<T: Ordered>(items: &[T], bucket: &T::Bucket) -> Vec<usize> {
    let mut positions = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.bucket() == bucket)
        .map(|(pos, _)| pos)
        .collect::<Vec<_>>();
    // `sort_by_key` is stable, so equal sort indices keep collection order.
    positions.sort_by_key(|&pos| items[pos].sort_index());
    positions
}

pub fn display_order<'a, T: Ordered>(items: &'a [T], bucket: &T::Bucket) -> Vec<&'a T> {
    display_positions(items, bucket)
        .into_iter()
        .map(|pos| &items[pos])
        .collect()
}

/// Sort index for a row appended to the end of `bucket`.
pub fn next_sort_index<T: Ordered>(items: &[T], bucket: &T::Bucket) -> i64 {
    items
        .iter()
        .filter(|item| item.bucket() == bucket)
        .map(Ordered::sort_index)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

fn stale_reason<T: Ordered>(items: &[T], item_id: &ItemId) -> NoopReason {
    if items.iter().any(|item| item.id() == item_id) {
        NoopReason::SourceMismatch
    } else {
        NoopReason::UnknownItem
    }
}

/// Assigns `sort_index = rank` along `positions`, recording every row whose placement changed.
/// `always` is recorded even when its placement happens to be unchanged.
fn renumber<T: Ordered>(
    items: &mut [T],
    positions: &[usize],
    bucket: &T::Bucket,
    always: Option<usize>,
    writes: &mut Vec<WriteRecord<T::Bucket>>,
) {
    for (rank, &pos) in positions.iter().enumerate() {
        let rank = rank as i64;
        let item = &mut items[pos];
        let changed = item.bucket() != bucket || item.sort_index() != rank;
        if changed {
            item.place(bucket.clone(), rank);
        }
        if changed || always == Some(pos) {
            writes.push(WriteRecord {
                id: item.id().clone(),
                bucket: bucket.clone(),
                sort_index: rank,
            });
        }
    }
}

pub fn reassign<T: Ordered>(mut items: Vec<T>, mv: &Move<T::Bucket>) -> Reassignment<T> {
    let Some(dest_bucket) = mv.dest_bucket.as_ref() else {
        return Reassignment::unchanged(items, NoopReason::NoDestination);
    };
    let same_bucket = *dest_bucket == mv.source_bucket;
    if same_bucket && mv.source_index == mv.dest_index {
        return Reassignment::unchanged(items, NoopReason::SamePosition);
    }

    let mut source = display_positions(&items, &mv.source_bucket);
    let moved = match source.get(mv.source_index) {
        Some(&pos) if items[pos].id() == &mv.item_id => pos,
        _ => {
            let reason = stale_reason(&items, &mv.item_id);
            return Reassignment::unchanged(items, reason);
        }
    };

    let mut writes = Vec::new();
    if same_bucket {
        let dest_index = mv.dest_index.min(source.len() - 1);
        if dest_index == mv.source_index {
            return Reassignment::unchanged(items, NoopReason::SamePosition);
        }
        source.remove(mv.source_index);
        source.insert(dest_index, moved);
        renumber(&mut items, &source, dest_bucket, Some(moved), &mut writes);
    } else {
        source.remove(mv.source_index);
        let mut dest = display_positions(&items, dest_bucket);
        let dest_index = mv.dest_index.min(dest.len());
        dest.insert(dest_index, moved);
        renumber(&mut items, &source, &mv.source_bucket, None, &mut writes);
        renumber(&mut items, &dest, dest_bucket, Some(moved), &mut writes);
    }

    Reassignment {
        items,
        writes,
        outcome: Outcome::Applied,
    }
}

/// Moves every row of `from` accepted by `select` to the end of `to`, keeping their relative
/// order. Both buckets come out re-indexed from zero.
pub fn append_all<T, F>(
    mut items: Vec<T>,
    from: &T::Bucket,
    to: &T::Bucket,
    mut select: F,
) -> Reassignment<T>
where
    T: Ordered,
    F: FnMut(&T) -> bool,
{
    if from == to {
        return Reassignment::unchanged(items, NoopReason::SamePosition);
    }

    let (moving, staying): (Vec<usize>, Vec<usize>) = display_positions(&items, from)
        .into_iter()
        .partition(|&pos| select(&items[pos]));
    if moving.is_empty() {
        return Reassignment::unchanged(items, NoopReason::EmptySelection);
    }

    let mut dest = display_positions(&items, to);
    dest.extend(moving.iter().copied());

    let mut writes = Vec::new();
    renumber(&mut items, &staying, from, None, &mut writes);
    renumber(&mut items, &dest, to, None, &mut writes);

    Reassignment {
        items,
        writes,
        outcome: Outcome::Applied,
    }
}
