//! External-collaborator interfaces.
//!
//! spec.md §1 scopes xlsx rendering and cloud object storage out as
//! "external collaborators, specified only via their interfaces" — the
//! roster itself never needs to know whether a workbook lands in S3 or on
//! local disk. These traits are that seam; the local-filesystem
//! implementations below exist so the API is runnable standalone, the way
//! the teacher's own crates favor a working default over an unimplemented
//! stub.

use anyhow::Result;
use nobet_core::models::{CapacityReport, Schedule};
use std::path::{Path, PathBuf};

/// Renders a solved schedule into a presentable workbook. Grounded on
/// `examples/original_source/functions/excel_export.py`'s two-sheet
/// layout (assignment grid + per-person summary), named here only by
/// shape — the actual cell layout is the renderer's business.
pub trait WorkbookRenderer: Send + Sync {
    fn render(&self, schedule: &Schedule, capacity: &CapacityReport) -> Result<Vec<u8>>;
}

/// Persists a rendered workbook (or any other byte blob) somewhere a
/// caller can retrieve it from later.
pub trait ObjectStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String>;
}

/// A `WorkbookRenderer` that emits a minimal two-sheet CSV-in-a-zip-free
/// placeholder: real xlsx writing belongs to whatever renderer a deployment
/// wires in, but a byte-for-byte runnable default keeps `nobet-api`
/// usable without one.
pub struct CsvWorkbookRenderer;

impl WorkbookRenderer for CsvWorkbookRenderer {
    fn render(&self, schedule: &Schedule, capacity: &CapacityReport) -> Result<Vec<u8>> {
        let mut out = String::from("gun,slot,personel_id\n");
        for a in schedule.assignments() {
            out.push_str(&format!("{},{},{}\n", a.day, a.slot_index, a.person_id));
        }
        out.push_str("\npersonel_id,excused_count,available_days\n");
        for p in &capacity.per_person {
            out.push_str(&format!(
                "{},{},{}\n",
                p.person_id, p.excused_count, p.available_days
            ));
        }
        Ok(out.into_bytes())
    }
}

/// An `ObjectStore` that writes to a local directory, standing in for a
/// cloud bucket in development.
pub struct LocalObjectStore {
    base_dir: PathBuf,
}

impl LocalObjectStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        LocalObjectStore {
            base_dir: base_dir.into(),
        }
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String> {
        std::fs::create_dir_all(&self.base_dir)?;
        let path: &Path = self.base_dir.as_path();
        let full = path.join(key);
        std::fs::write(&full, bytes)?;
        Ok(full.to_string_lossy().into_owned())
    }
}
