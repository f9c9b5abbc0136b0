use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::{CotResult, IoError},
    market::ReportKind,
};

/// Where the fetch collaborator is expected to have cached `report` under
/// `cache_dir`. Downloading (from [`ReportKind::url`]) is that collaborator's
/// job; the analyzer only ever reads the local file.
pub fn cache_path(cache_dir: impl AsRef<Path>, report: ReportKind) -> PathBuf {
    cache_dir.as_ref().join(report.cache_file_name())
}

/// Reads a cached report file into memory. The file is shared across all
/// markets of a run, so it is read once by the orchestrator.
pub fn load_report_text(path: impl AsRef<Path>) -> CotResult<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| {
        IoError::FileSystem(format!("Failed to read report file {}: {}", path.display(), e)).into()
    })
}
