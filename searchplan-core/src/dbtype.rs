//! Database type classification from the on-disk `.dbtype` descriptor.
//!
//! The descriptor is a 4-byte little-endian integer stored next to the
//! database as `<db>.dbtype`. The low 16 bits hold the type code; the high
//! bits hold storage flags (such as compression) that do not affect the kind.

use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::types::SequenceKind;

const DBTYPE_EXTENSION: &str = "dbtype";
const TYPE_CODE_MASK: i32 = 0xFFFF;

/// Trait for resolving a database to its sequence kind
pub trait DatabaseClassifier {
    /// Returns `None` when the type cannot be determined.
    fn classify(&self, database: &Path) -> Option<SequenceKind>;
}

/// Reads `<db>.dbtype` from the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DbTypeFileClassifier;

impl DatabaseClassifier for DbTypeFileClassifier {
    fn classify(&self, database: &Path) -> Option<SequenceKind> {
        classify_database(database)
    }
}

/// Path of the type descriptor belonging to `database`.
pub fn dbtype_path(database: &Path) -> PathBuf {
    let mut name = database.as_os_str().to_os_string();
    name.push(".");
    name.push(DBTYPE_EXTENSION);
    PathBuf::from(name)
}

/// Raw descriptor value, or `None` if it is missing or truncated.
pub fn read_raw_dbtype(database: &Path) -> Option<i32> {
    let path = dbtype_path(database);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(err) => {
            log::debug!("Cannot open {}: {}", path.display(), err);
            return None;
        }
    };
    let mut reader = BufReader::new(file);
    match reader.read_i32::<LittleEndian>() {
        Ok(raw) => Some(raw),
        Err(err) => {
            log::debug!("Cannot read type descriptor {}: {}", path.display(), err);
            None
        }
    }
}

/// Classify a database by its descriptor.
pub fn classify_database(database: &Path) -> Option<SequenceKind> {
    let raw = read_raw_dbtype(database)?;
    if raw < 0 {
        return None;
    }
    let kind = SequenceKind::from_type_code((raw & TYPE_CODE_MASK) as u16);
    if kind.is_none() {
        log::debug!(
            "Type code {} of {} is not a searchable sequence kind",
            raw & TYPE_CODE_MASK,
            database.display()
        );
    }
    kind
}

/// Write a descriptor for `database`; used to prepare fixtures and by tooling
/// that creates databases.
pub fn write_dbtype(database: &Path, kind: SequenceKind, flags: u16) -> std::io::Result<()> {
    use byteorder::WriteBytesExt;
    let mut file = File::create(dbtype_path(database))?;
    let raw = (i32::from(flags) << 16) | i32::from(kind.type_code());
    file.write_i32::<LittleEndian>(raw)
}
