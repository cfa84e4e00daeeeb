//! Mesh writers.
//!
//! Every writer renders into memory first and only then touches the file
//! system, so a failed export surfaces as [`ModelError::ExportFailed`] and
//! never as a silently truncated file.

pub mod obj;

#[cfg(feature = "stl-io")]
pub mod stl;

use crate::errors::{ModelError, ModelResult};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `contents` to `path` through a buffered writer, flushing before return.
/// Missing parent directories are created.
pub(crate) fn write_file(path: &Path, contents: &[u8]) -> ModelResult<()> {
    let failed = |source: std::io::Error| ModelError::ExportFailed {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(failed)?;
    }
    let file = File::create(path).map_err(failed)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(contents).map_err(failed)?;
    writer.flush().map_err(failed)
}
