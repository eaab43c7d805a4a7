// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the disk:
//
//   model_store.rs  — The single live model artifact.
//                     FileModelStore writes model.json through a
//                     temporary file and an atomic rename, keeps
//                     the previous artifact in model.prev.json for
//                     rollback, and stamps version + timestamp.
//                     Also persists the TrainConfig of the run.
//
//   record_store.rs — Student rows keyed by ID. JsonRecordStore
//                     keeps them in records.json; an in-memory
//                     twin backs the tests.
//
//   metrics.rs      — Training run log. Appends one CSV row per
//                     successful training run.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
};

/// Model artifact persistence
pub mod model_store;

/// Student record persistence
pub mod record_store;

/// Training run CSV log
pub mod metrics;

/// Write `bytes` to `path` so that readers see either the old file or
/// the complete new one: write a sibling temp file, sync it, rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    {
        let mut f = File::create(tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}
