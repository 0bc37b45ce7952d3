// src/storage/io.rs
// Whole-file JSON reads and writes for the file backend

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::config::{DatabaseConfig, WriteMode};
use crate::error::{JsonBaseError, Result};

/// Sibling scratch file used by atomic saves (`users.json` -> `users.json.tmp`)
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Read and parse a JSON artifact
///
/// Both a missing file and malformed content surface as `Storage`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| {
        JsonBaseError::Storage(format!("cannot read {}: {}", path.display(), e))
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        JsonBaseError::Storage(format!("{} is malformed: {}", path.display(), e))
    })
}

/// Serialize `value` over the file at `path`
///
/// Atomic mode writes `<path>.tmp`, syncs it and renames it over the target.
/// In-place mode truncates and rewrites the target.
pub fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    config: &DatabaseConfig,
) -> Result<()> {
    match config.write_mode {
        WriteMode::Atomic => {
            let temp = temp_path(path);
            let written = write_file(&temp, value, config.pretty);
            if let Err(e) = written {
                // Leave no scratch file behind on failure
                let _ = fs::remove_file(&temp);
                return Err(e);
            }
            fs::rename(&temp, path)?;
            trace!(path = %path.display(), "atomic save");
        }
        WriteMode::InPlace => {
            write_file(path, value, config.pretty)?;
            trace!(path = %path.display(), "in-place save");
        }
    }
    Ok(())
}

fn write_file<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.write_all(b"\n")?;

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}
