// ============================================================
// Layer 6 — Record Store
// ============================================================
// Student rows keyed by student ID.
//
// Upsert semantics:
//   - a row with a new ID is inserted
//   - a row with a known ID replaces the stored row wholesale
//   - within one batch the last row for an ID wins
//
// JsonRecordStore keeps the whole table in records.json as a
// JSON array ordered by student ID, rewritten atomically on each
// upsert. Raw cells are stored as they were uploaded, so a
// non-numeric cell survives ingestion and is only dropped when a
// training dataset is built.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    fs,
    io,
    path::{Path, PathBuf},
};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::student::StudentRecord;
use crate::domain::traits::RecordStore;
use crate::infra::write_atomic;

pub const RECORDS_FILE: &str = "records.json";

type Table = BTreeMap<String, StudentRecord>;

fn merge(table: &mut Table, records: Vec<StudentRecord>) -> usize {
    let n = records.len();
    for record in records {
        table.insert(record.student_id.clone(), record);
    }
    n
}

// ─── In-memory store ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryRecordStore {
    rows: RefCell<Table>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn upsert_many(&self, records: Vec<StudentRecord>) -> PipelineResult<usize> {
        Ok(merge(&mut self.rows.borrow_mut(), records))
    }

    fn read_all(&self) -> PipelineResult<Vec<StudentRecord>> {
        Ok(self.rows.borrow().values().cloned().collect())
    }

    fn get(&self, student_id: &str) -> PipelineResult<Option<StudentRecord>> {
        Ok(self.rows.borrow().get(student_id).cloned())
    }
}

// ─── File-backed store ────────────────────────────────────────────────────────

/// Record store persisted as `records.json` in the data directory.
pub struct JsonRecordStore {
    path: PathBuf,
}

impl JsonRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> PipelineResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| storage_error(&dir, e))?;
        Ok(Self { path: dir.join(RECORDS_FILE) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> PipelineResult<Table> {
        let json = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Table::new()),
            Err(e) => return Err(storage_error(&self.path, e)),
        };
        let rows: Vec<StudentRecord> =
            serde_json::from_str(&json).map_err(|e| storage_error(&self.path, e))?;
        Ok(rows.into_iter().map(|r| (r.student_id.clone(), r)).collect())
    }

    fn write_table(&self, table: &Table) -> PipelineResult<()> {
        let rows: Vec<&StudentRecord> = table.values().collect();
        let json = serde_json::to_string_pretty(&rows).map_err(|e| storage_error(&self.path, e))?;
        write_atomic(&self.path, json.as_bytes()).map_err(|e| storage_error(&self.path, e))
    }
}

impl RecordStore for JsonRecordStore {
    fn upsert_many(&self, records: Vec<StudentRecord>) -> PipelineResult<usize> {
        let mut table = self.read_table()?;
        let written = merge(&mut table, records);
        self.write_table(&table)?;
        tracing::debug!(
            "Upserted {} rows into '{}' ({} total)",
            written,
            self.path.display(),
            table.len()
        );
        Ok(written)
    }

    fn read_all(&self) -> PipelineResult<Vec<StudentRecord>> {
        Ok(self.read_table()?.into_values().collect())
    }

    fn get(&self, student_id: &str) -> PipelineResult<Option<StudentRecord>> {
        Ok(self.read_table()?.remove(student_id))
    }
}

fn storage_error(path: &Path, reason: impl ToString) -> PipelineError {
    PipelineError::Storage {
        path:   path.display().to_string(),
        reason: reason.to_string(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::student::{FieldValue, Outcome};

    fn row(id: &str, final_marks: f64) -> StudentRecord {
        StudentRecord::new(id, "Student", 80.0, 70.0, final_marks, 3.0)
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let store = InMemoryRecordStore::new();
        store.upsert_many(vec![row("S2", 70.0), row("S1", 40.0)]).unwrap();
        store.upsert_many(vec![row("S1", 85.0)]).unwrap();

        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].student_id, "S1");
        assert_eq!(all[0].outcome, Some(Outcome::Pass));
    }

    #[test]
    fn test_last_row_in_batch_wins() {
        let store = InMemoryRecordStore::new();
        let n = store.upsert_many(vec![row("S1", 90.0), row("S1", 10.0)]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(store.get("S1").unwrap().unwrap().outcome, Some(Outcome::Fail));
    }

    #[test]
    fn test_json_store_persists_raw_cells() {
        let dir   = tempfile::tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path()).unwrap();
        assert!(store.read_all().unwrap().is_empty());

        let odd = StudentRecord::new("S9", "Odd", "absent", 50.0, "n/a", FieldValue::Missing);
        store.upsert_many(vec![row("S1", 65.0), odd.clone()]).unwrap();

        // Reopen to read from disk
        let store = JsonRecordStore::new(dir.path()).unwrap();
        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(store.get("S9").unwrap(), Some(odd));
        assert!(store.get("S404").unwrap().is_none());
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let dir   = tempfile::tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path()).unwrap();
        fs::write(store.path(), "[{").unwrap();
        assert!(matches!(store.read_all(), Err(PipelineError::Storage { .. })));
    }
}
