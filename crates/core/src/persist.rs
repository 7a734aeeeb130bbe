#![forbid(unsafe_code)]

use crate::ids::ItemId;
use crate::reorder::WriteRecord;

/// Destination for the rows produced by [`crate::reorder::reassign`].
pub trait WriteSink<B> {
    type Error: std::fmt::Display;

    fn apply(&mut self, record: &WriteRecord<B>) -> Result<(), Self::Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteFailure {
    pub id: ItemId,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub applied: Vec<ItemId>,
    pub failed: Vec<WriteFailure>,
}

impl PersistReport {
    /// When set, the caller's optimistic state can no longer be trusted and must be replaced by a
    /// fresh read of the store.
    pub fn needs_reload(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Issues every write in order. A failed write is recorded and the rest are still attempted;
/// nothing already applied is rolled back.
pub fn persist_reassignment<B, S>(sink: &mut S, writes: &[WriteRecord<B>]) -> PersistReport
where
    B: std::fmt::Debug,
    S: WriteSink<B>,
{
    let mut report = PersistReport::default();
    for record in writes {
        match sink.apply(record) {
            Ok(()) => report.applied.push(record.id.clone()),
            Err(err) => {
                tracing::warn!(
                    id = record.id.as_str(),
                    bucket = ?record.bucket,
                    sort_index = record.sort_index,
                    error = %err,
                    "reorder write failed"
                );
                report.failed.push(WriteFailure {
                    id: record.id.clone(),
                    message: err.to_string(),
                });
            }
        }
    }
    if report.needs_reload() {
        tracing::info!(
            applied = report.applied.len(),
            failed = report.failed.len(),
            "reorder persisted partially; reload required"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakySink {
        reject: &'static str,
        seen: Vec<(String, i64)>,
    }

    impl WriteSink<&'static str> for FlakySink {
        type Error = String;

        fn apply(&mut self, record: &WriteRecord<&'static str>) -> Result<(), String> {
            if record.id.as_str() == self.reject {
                return Err(format!("row {} is gone", record.id));
            }
            self.seen
                .push((record.id.as_str().to_string(), record.sort_index));
            Ok(())
        }
    }

    fn write(id: &str, sort_index: i64) -> WriteRecord<&'static str> {
        WriteRecord {
            id: ItemId::try_new(id).expect("item id"),
            bucket: "col",
            sort_index,
        }
    }

    #[test]
    fn failure_does_not_stop_remaining_writes() {
        let mut sink = FlakySink {
            reject: "B",
            seen: Vec::new(),
        };
        let report = persist_reassignment(&mut sink, &[write("A", 0), write("B", 1), write("C", 2)]);

        assert_eq!(
            sink.seen,
            vec![("A".to_string(), 0), ("C".to_string(), 2)]
        );
        assert_eq!(report.applied.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id.as_str(), "B");
        assert!(report.failed[0].message.contains("gone"));
        assert!(report.needs_reload());
    }

    #[test]
    fn empty_write_set_is_clean() {
        let mut sink = FlakySink {
            reject: "",
            seen: Vec::new(),
        };
        let report = persist_reassignment::<&'static str, _>(&mut sink, &[]);
        assert!(!report.needs_reload());
        assert!(report.applied.is_empty());
    }
}
