//! Output layer for the Port entity exporter
//!
//! Serializes an [`ExportSet`] as JSON, YAML or flattened CSV and writes it
//! to disk.

pub mod error;
pub mod format;
pub mod table;

pub use error::{Result, WriterError};
pub use format::OutputFormat;

use port_export_core::ExportSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Serialize `set` in the given format
pub fn render<W: Write>(set: &ExportSet, format: OutputFormat, mut writer: W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, set)?;
            writeln!(writer).map_err(serde_json::Error::io)?;
        }
        OutputFormat::Yaml => serde_yml::to_writer(&mut writer, set)?,
        OutputFormat::Csv => table::write_csv(set, &mut writer)?,
    }
    Ok(())
}

/// Append `.<ext>` to `base` unless it already ends with it
pub fn output_path(base: impl AsRef<Path>, format: OutputFormat) -> PathBuf {
    let base = base.as_ref();
    let ext = format.extension();
    if base.extension().and_then(|e| e.to_str()) == Some(ext) {
        return base.to_path_buf();
    }
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Write `set` to `base` (extension added as needed), creating parent
/// directories. Returns the path actually written.
#[instrument(skip(set))]
pub fn write_export(set: &ExportSet, base: &Path, format: OutputFormat) -> Result<PathBuf> {
    let path = output_path(base, format);
    let io_err = |source| WriterError::Io {
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        debug!("Creating output directory {}", parent.display());
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let file = File::create(&path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    render(set, format, &mut writer)?;
    writer.flush().map_err(io_err)?;

    info!("Entities saved to {} in {} format", path.display(), format);
    Ok(path)
}
