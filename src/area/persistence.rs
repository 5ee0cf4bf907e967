//! Area persistence module
//!
//! Handles the flat, line-oriented area list. Each committed region is one
//! comma-separated line:
//!
//! ```text
//! name,isGroupLocked,groupId,x1,x2,y1,y2,z1,z2
//! ```
//!
//! The codec (`parse_line` / `serialize`) is independent of where lines live;
//! `AreaStore` backends only move whole snapshots of lines. Stored lines are
//! raw bytes so one damaged line cannot make the rest unreadable.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use super::geometry::Volume;
use super::region::{AccessMode, Region};
use crate::error::{PersistenceError, RecordError};

/// Number of comma-separated fields in a region line
pub const FIELD_COUNT: usize = 9;

/// One parsed region line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaRecord {
    pub name: String,
    pub group_locked: bool,
    pub group_id: i32,
    pub volume: Volume,
}

impl AreaRecord {
    pub fn into_region(self) -> Region {
        Region::new(
            self.name,
            self.volume,
            AccessMode::from_flag(self.group_locked),
            self.group_id,
        )
    }
}

impl From<&Region> for AreaRecord {
    fn from(region: &Region) -> Self {
        Self {
            name: region.name().to_string(),
            group_locked: region.access().is_group_locked(),
            group_id: region.group_id(),
            volume: *region.volume(),
        }
    }
}

fn parse_int(field: &'static str, value: &str) -> Result<i32, RecordError> {
    value.trim().parse().map_err(|_| RecordError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, RecordError> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(RecordError::InvalidFlag {
            field,
            value: value.to_string(),
        })
    }
}

/// Parse one line of the area list.
///
/// Trailing fields past the ninth are ignored. Bounds may appear in any
/// order per axis and are normalized.
pub fn parse_line(line: &str) -> Result<AreaRecord, RecordError> {
    let tokens: Vec<&str> = line.trim().split(',').collect();
    if tokens.len() < FIELD_COUNT {
        return Err(RecordError::TooFewFields {
            expected: FIELD_COUNT,
            actual: tokens.len(),
        });
    }

    let name = tokens[0].trim();
    if name.is_empty() {
        return Err(RecordError::EmptyName);
    }

    let group_locked = parse_flag("isGroupLocked", tokens[1])?;
    let group_id = parse_int("groupId", tokens[2])?;
    let x1 = parse_int("x1", tokens[3])?;
    let x2 = parse_int("x2", tokens[4])?;
    let y1 = parse_int("y1", tokens[5])?;
    let y2 = parse_int("y2", tokens[6])?;
    let z1 = parse_int("z1", tokens[7])?;
    let z2 = parse_int("z2", tokens[8])?;

    Ok(AreaRecord {
        name: name.to_string(),
        group_locked,
        group_id,
        volume: Volume::new(x1, x2, y1, y2, z1, z2),
    })
}

/// Check whether a region name can be written as a single line field.
///
/// Names must be non-empty after trimming and contain no field separator
/// or control characters.
pub fn is_storable_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.chars().any(|c| c == ',' || c.is_control())
}

/// Format one region as a line (without the trailing newline)
pub fn format_line(record: &AreaRecord) -> String {
    let v = &record.volume;
    format!(
        "{},{},{},{},{},{},{},{},{}",
        record.name,
        record.group_locked,
        record.group_id,
        v.x.low(),
        v.x.high(),
        v.y.low(),
        v.y.high(),
        v.z.low(),
        v.z.high()
    )
}

/// Serialize a set of regions, one line each, in the given order
pub fn serialize<'a, I>(regions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Region>,
{
    regions
        .into_iter()
        .map(|region| format_line(&AreaRecord::from(region)))
        .collect()
}

/// A line that failed to parse, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number
    pub line_number: usize,
    pub line: String,
    pub error: RecordError,
}

/// Parse a whole snapshot, separating good records from malformed lines.
/// Blank lines are ignored; lines that are not UTF-8 are malformed.
pub fn parse_lines<I, S>(lines: I) -> (Vec<AreaRecord>, Vec<MalformedLine>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut records = Vec::new();
    let mut malformed = Vec::new();

    for (index, raw) in lines.into_iter().enumerate() {
        let raw = raw.as_ref();
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(_) => {
                malformed.push(MalformedLine {
                    line_number: index + 1,
                    line: String::from_utf8_lossy(raw).into_owned(),
                    error: RecordError::InvalidEncoding,
                });
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(record) => records.push(record),
            Err(error) => malformed.push(MalformedLine {
                line_number: index + 1,
                line: line.to_string(),
                error,
            }),
        }
    }

    (records, malformed)
}

/// Backend that holds the serialized area list
pub trait AreaStore: Send + Sync {
    /// Read every stored line as raw bytes, without line terminators.
    /// An empty store yields no lines.
    fn load(&self) -> Result<Vec<Vec<u8>>, PersistenceError>;

    /// Replace the stored lines with a new snapshot
    fn save(&self, lines: &[String]) -> Result<(), PersistenceError>;
}

/// Area list kept in a text file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_snapshot(&self, lines: &[String]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path)?;
            for line in lines {
                file.write_all(line.as_bytes())?;
                file.write_all(b"\n")?;
            }
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;

        // fsync the directory so the rename itself is durable
        if let Some(parent) = self.path.parent() {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            if let Ok(dir) = fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }
}

/// Split file contents into lines, dropping `\n` / `\r\n` terminators
fn split_lines(content: &[u8]) -> Vec<Vec<u8>> {
    let mut lines: Vec<Vec<u8>> = content
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect();
    // A trailing terminator leaves one empty segment behind
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

impl AreaStore for FileStore {
    fn load(&self) -> Result<Vec<Vec<u8>>, PersistenceError> {
        match fs::read(&self.path) {
            Ok(content) => Ok(split_lines(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Area list not found, starting empty");
                Ok(Vec::new())
            }
            Err(source) => Err(PersistenceError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&self, lines: &[String]) -> Result<(), PersistenceError> {
        self.write_snapshot(lines)
            .map_err(|source| PersistenceError::Write {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), regions = lines.len(), "Saved area list");
        Ok(())
    }
}

/// In-memory store, useful for tests and ephemeral worlds
#[derive(Debug, Default)]
pub struct MemoryStore {
    lines: Mutex<Vec<String>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Mutex::new(lines.into_iter().map(Into::into).collect()),
            saves: Mutex::new(0),
        }
    }

    /// Current stored snapshot
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Number of snapshots written so far
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl AreaStore for MemoryStore {
    fn load(&self) -> Result<Vec<Vec<u8>>, PersistenceError> {
        Ok(self.lines().into_iter().map(String::into_bytes).collect())
    }

    fn save(&self, lines: &[String]) -> Result<(), PersistenceError> {
        *self.lines.lock() = lines.to_vec();
        *self.saves.lock() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_line() {
        let record = parse_line("Base,true,4,10,0,5,0,10,0").unwrap();
        assert_eq!(
            record,
            AreaRecord {
                name: "Base".to_string(),
                group_locked: true,
                group_id: 4,
                volume: Volume::new(0, 10, 0, 5, 0, 10),
            }
        );
    }

    #[test]
    fn test_parse_line_too_few_fields() {
        assert_eq!(
            parse_line("foo,bar"),
            Err(RecordError::TooFewFields {
                expected: FIELD_COUNT,
                actual: 2
            })
        );
        assert!(matches!(
            parse_line("foo,true,1,0,2"),
            Err(RecordError::TooFewFields { actual: 5, .. })
        ));
    }

    #[test]
    fn test_parse_line_bad_bound() {
        assert_eq!(
            parse_line("foo,true,1,a,2,3,4,5,6"),
            Err(RecordError::InvalidNumber {
                field: "x1",
                value: "a".to_string()
            })
        );
    }

    #[test]
    fn test_parse_line_bad_group_and_flag() {
        assert!(matches!(
            parse_line("foo,true,x,1,2,3,4,5,6"),
            Err(RecordError::InvalidNumber { field: "groupId", .. })
        ));
        assert!(matches!(
            parse_line("foo,yes,1,1,2,3,4,5,6"),
            Err(RecordError::InvalidFlag { .. })
        ));
        assert_eq!(parse_line(",true,1,1,2,3,4,5,6"), Err(RecordError::EmptyName));
    }

    #[test]
    fn test_parse_line_accepts_padding_and_extra_fields() {
        let record = parse_line("  base, FALSE ,1,0,1,0,1,0,1,extra ").unwrap();
        assert_eq!(record.name, "base");
        assert!(!record.group_locked);
    }

    #[test]
    fn test_format_line_normalized() {
        let region = Region::new("Base", Volume::new(10, 0, 5, 0, 10, 0), AccessMode::OwnerOnly, 1);
        assert_eq!(serialize([&region]), vec!["Base,false,1,0,10,0,5,0,10"]);
    }

    #[test]
    fn test_serialize_then_parse_preserves_regions() {
        let regions = vec![
            Region::new("Base", Volume::new(0, 10, 0, 5, 0, 10), AccessMode::OwnerOnly, 1),
            Region::new("Tower", Volume::new(-20, -15, 0, 255, 3, 8), AccessMode::GroupLocked, 7),
        ];
        let (records, malformed) = parse_lines(serialize(&regions));
        assert!(malformed.is_empty());
        let parsed: Vec<Region> = records.into_iter().map(AreaRecord::into_region).collect();
        assert_eq!(parsed, regions);
    }

    #[test]
    fn test_parse_lines_skips_malformed() {
        let lines = [
            "foo,bar",
            "",
            "foo,true,1,a,2,3,4,5,6",
            "good,false,2,0,1,0,1,0,1",
        ];
        let (records, malformed) = parse_lines(lines);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "good");
        assert_eq!(malformed.len(), 2);
        assert_eq!(malformed[0].line_number, 1);
        assert_eq!(malformed[1].line, "foo,true,1,a,2,3,4,5,6");
    }

    #[test]
    fn test_parse_lines_invalid_utf8_is_malformed() {
        let lines: [&[u8]; 2] = [b"bad\xff,false,1,0,1,0,1,0,1", b"good,false,2,5,6,0,1,5,6"];
        let (records, malformed) = parse_lines(lines);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "good");
        assert_eq!(malformed.len(), 1);
        assert_eq!(malformed[0].line_number, 1);
        assert_eq!(malformed[0].error, RecordError::InvalidEncoding);
        assert!(malformed[0].line.starts_with("bad"));
    }

    #[test]
    fn test_split_lines_handles_crlf_and_trailing_newline() {
        assert_eq!(
            split_lines(b"a\r\nb\n\nc\n"),
            vec![b"a".to_vec(), b"b".to_vec(), Vec::new(), b"c".to_vec()]
        );
        assert_eq!(split_lines(b"a"), vec![b"a".to_vec()]);
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn test_is_storable_name() {
        assert!(is_storable_name("Base"));
        assert!(is_storable_name("  My Base  "));
        assert!(!is_storable_name(""));
        assert!(!is_storable_name("   "));
        assert!(!is_storable_name("a,b"));
        assert!(!is_storable_name("a\nb"));
        assert!(!is_storable_name("a\tb"));
    }

    #[test]
    fn test_file_store_save_replaces_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("area-list.txt"));

        store.save(&["first,false,1,0,1,0,1,0,1".to_string()]).unwrap();
        store
            .save(&[
                "a,false,1,0,1,0,1,0,1".to_string(),
                "b,true,2,5,6,0,1,5,6".to_string(),
            ])
            .unwrap();

        assert_eq!(
            store.load().unwrap(),
            vec![
                b"a,false,1,0,1,0,1,0,1".to_vec(),
                b"b,true,2,5,6,0,1,5,6".to_vec()
            ]
        );
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemoryStore::with_lines(["a,false,0,0,0,0,0,0,0"]);
        assert_eq!(store.load().unwrap().len(), 1);
        store.save(&[]).unwrap();
        assert!(store.lines().is_empty());
        assert_eq!(store.save_count(), 1);
    }
}
