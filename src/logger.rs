//! CSV logging and replay
//!
//! [`CsvLogger`] is a two-state machine (inactive/active). While active it
//! appends one snapshot row of the selected signals per external tick — the
//! crate deliberately ships no timer of its own; cadence belongs to the
//! driving context. Every row is flushed immediately: at the low rates of
//! this link, durability beats throughput.
//!
//! File format:
//!
//! ```csv
//! t,TEMP,SETP
//! 0.500000,25.31,
//! 1.000000,25.40,1.50
//! ```
//!
//! The `t` column is seconds since the *logging session* started — a
//! separate anchor from store-elapsed time, so a replayed file is
//! self-contained. A signal with no recorded value yet writes an empty
//! field, never zero.
//!
//! [`load_from_file`] is the independent replay path: it parses a previously
//! written file and replaces the store's contents with it.

use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Local};

use crate::error::{Result, ScopeError};
use crate::store::TelemetryStore;
use crate::types::DataPoint;

/// One active logging session
struct LogSession {
    writer: BufWriter<File>,
    /// Column order, fixed at session start
    keys: Vec<String>,
    /// Anchor for the `t` column
    started: Instant,
    /// Wall-clock start, for shells to display
    started_at: DateTime<Local>,
    path: PathBuf,
    rows_written: u64,
}

/// CSV logging state machine
///
/// All methods take `&self`; the session lives behind an interior mutex so
/// the control context can drive it while the store is concurrently fed by
/// the reader thread. Exactly one session may be active at a time.
#[derive(Default)]
pub struct CsvLogger {
    session: Mutex<Option<LogSession>>,
}

impl CsvLogger {
    /// Create an inactive logger
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<LogSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a session logging `keys` to `path`
    ///
    /// Writes the header row immediately. Fails without side effects when a
    /// session is already active or the sink cannot be opened.
    pub fn start(&self, path: impl AsRef<Path>, keys: &[String]) -> Result<()> {
        let path = path.as_ref();
        let mut guard = self.lock();

        if guard.is_some() {
            return Err(ScopeError::Logging(
                "a logging session is already active".to_string(),
            ));
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut header = String::from("t");
        for key in keys {
            header.push(',');
            header.push_str(key);
        }
        writeln!(writer, "{header}")?;
        writer.flush()?;

        tracing::info!("CSV logging started to {:?} ({} signals)", path, keys.len());
        *guard = Some(LogSession {
            writer,
            keys: keys.to_vec(),
            started: Instant::now(),
            started_at: Local::now(),
            path: path.to_path_buf(),
            rows_written: 0,
        });
        Ok(())
    }

    /// Stop the active session, flushing the sink
    ///
    /// Stopping while inactive is a no-op success.
    pub fn stop(&self) -> Result<()> {
        if let Some(mut session) = self.lock().take() {
            session.writer.flush()?;
            tracing::info!(
                "CSV logging stopped after {} rows ({:?})",
                session.rows_written,
                session.path
            );
        }
        Ok(())
    }

    /// Write one snapshot row of the session's signals
    ///
    /// Reads each value via [`TelemetryStore::latest`]; signals with no data
    /// yet produce an empty field. A tick while inactive is a no-op. A write
    /// or flush failure ends the session and surfaces the error — the store
    /// itself is untouched.
    pub fn tick(&self, store: &TelemetryStore) -> Result<()> {
        let mut guard = self.lock();
        let Some(session) = guard.as_mut() else {
            return Ok(());
        };

        let t = session.started.elapsed().as_secs_f64();
        let mut row = format!("{t:.6}");
        for key in &session.keys {
            row.push(',');
            if let Some(value) = store.latest(key) {
                let _ = write!(row, "{value}");
            }
        }

        let written = writeln!(session.writer, "{row}").and_then(|()| session.writer.flush());
        if let Err(err) = written {
            let path = session.path.clone();
            *guard = None;
            tracing::error!("CSV write failed, stopping session ({:?}): {err}", path);
            return Err(ScopeError::Logging(format!(
                "log write failed for {:?}: {err}",
                path
            )));
        }

        session.rows_written += 1;
        Ok(())
    }

    /// Whether a session is active
    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Rows written by the active session, 0 while inactive
    pub fn rows_written(&self) -> u64 {
        self.lock().as_ref().map_or(0, |s| s.rows_written)
    }

    /// Wall-clock start of the active session
    pub fn session_started_at(&self) -> Option<DateTime<Local>> {
        self.lock().as_ref().map(|s| s.started_at)
    }

    /// Signal keys of the active session, in column order
    pub fn session_keys(&self) -> Vec<String> {
        self.lock().as_ref().map_or_else(Vec::new, |s| s.keys.clone())
    }
}

/// Replay a previously written log file into the store
///
/// The first row must be a header; its first column name is ignored and the
/// remaining columns become signal keys. Each data row associates every
/// non-empty, numeric field with its column's key at the row's time value —
/// non-numeric or empty fields are skipped per-field without aborting the
/// row. A row whose time cell does not parse is skipped whole. The parsed
/// contents **replace** the store's current contents.
///
/// Returns the number of points loaded.
pub fn load_from_file(path: impl AsRef<Path>, store: &TelemetryStore) -> Result<usize> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines();

    let header = lines
        .next()
        .ok_or_else(|| ScopeError::Logging(format!("log file {:?} has no header row", path)))?;
    let keys: Vec<&str> = header.split(',').skip(1).collect();

    let mut contents: HashMap<String, VecDeque<DataPoint>> = HashMap::new();
    for key in &keys {
        contents.entry((*key).to_string()).or_default();
    }

    let mut loaded = 0usize;
    for line in lines {
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split(',');
        let t_field = fields.next().unwrap_or("");
        let t: f64 = if t_field.is_empty() {
            0.0
        } else {
            match t_field.parse() {
                Ok(t) => t,
                Err(_) => continue,
            }
        };

        for (key, field) in keys.iter().zip(fields) {
            if field.is_empty() {
                continue;
            }
            if let Ok(value) = field.parse::<f64>() {
                contents
                    .entry((*key).to_string())
                    .or_default()
                    .push_back(DataPoint::new(value, t));
                loaded += 1;
            }
        }
    }

    store.replace_all(contents);
    tracing::info!("Loaded {} points from {:?}", loaded, path);
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_start_writes_header_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let logger = CsvLogger::new();

        logger.start(&path, &keys(&["a", "b"])).unwrap();
        logger.stop().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "t,a,b\n");
    }

    #[test]
    fn test_double_start_fails_without_side_effects() {
        let dir = tempdir().unwrap();
        let logger = CsvLogger::new();

        logger.start(dir.path().join("one.csv"), &keys(&["a"])).unwrap();
        let second = logger.start(dir.path().join("two.csv"), &keys(&["b"]));
        assert!(matches!(second, Err(ScopeError::Logging(_))));

        // The original session is still the active one
        assert_eq!(logger.session_keys(), keys(&["a"]));
        logger.stop().unwrap();
    }

    #[test]
    fn test_stop_while_inactive_is_noop() {
        let logger = CsvLogger::new();
        assert!(logger.stop().is_ok());
        assert!(!logger.is_active());
    }

    #[test]
    fn test_tick_snapshots_latest_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let store = TelemetryStore::new(100);
        store.append("a", 1.0);
        store.append("b", 2.0);

        let logger = CsvLogger::new();
        logger.start(&path, &keys(&["a", "b"])).unwrap();
        logger.tick(&store).unwrap();
        logger.stop().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("t,a,b"));

        let row = lines.next().unwrap();
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1], "1");
        assert_eq!(fields[2], "2");
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_missing_value_writes_empty_field_not_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let store = TelemetryStore::new(100);
        store.append("a", 1.25);
        // "b" never arrives

        let logger = CsvLogger::new();
        logger.start(&path, &keys(&["a", "b"])).unwrap();
        logger.tick(&store).unwrap();
        logger.stop().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert!(row.ends_with(",1.25,"));
    }

    #[test]
    fn test_tick_while_inactive_is_noop() {
        let store = TelemetryStore::new(100);
        let logger = CsvLogger::new();
        assert!(logger.tick(&store).is_ok());
    }

    #[test]
    fn test_rows_written_counts() {
        let dir = tempdir().unwrap();
        let store = TelemetryStore::new(100);
        store.append("a", 1.0);

        let logger = CsvLogger::new();
        logger.start(dir.path().join("log.csv"), &keys(&["a"])).unwrap();
        assert_eq!(logger.rows_written(), 0);

        logger.tick(&store).unwrap();
        logger.tick(&store).unwrap();
        assert_eq!(logger.rows_written(), 2);
        assert!(logger.session_started_at().is_some());

        logger.stop().unwrap();
        assert_eq!(logger.rows_written(), 0);
    }

    #[test]
    fn test_load_requires_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        let store = TelemetryStore::new(100);
        assert!(matches!(
            load_from_file(&path, &store),
            Err(ScopeError::Logging(_))
        ));
    }

    #[test]
    fn test_load_replaces_store_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "t,a,b\n0.5,1.25,\n1.0,2.50,7.75\n").unwrap();

        let store = TelemetryStore::new(100);
        store.append("stale", 9.0);

        let loaded = load_from_file(&path, &store).unwrap();
        assert_eq!(loaded, 3);
        assert_eq!(store.latest("stale"), None);

        let a = store.series("a");
        assert_eq!(a.len(), 2);
        assert_eq!(a[0], DataPoint::new(1.25, 0.5));
        assert_eq!(a[1], DataPoint::new(2.5, 1.0));

        let b = store.series("b");
        assert_eq!(b, vec![DataPoint::new(7.75, 1.0)]);
    }

    #[test]
    fn test_load_skips_bad_fields_per_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "t,a,b\n0.5,garbage,1.00\nnot-a-time,2.00,3.00\n,4.00,\n").unwrap();

        let store = TelemetryStore::new(100);
        let loaded = load_from_file(&path, &store).unwrap();

        // Row 1: "garbage" skipped, b kept. Row 2: bad time, whole row
        // skipped. Row 3: empty time replays at 0.0.
        assert_eq!(loaded, 2);
        assert_eq!(store.series("b"), vec![DataPoint::new(1.0, 0.5)]);
        assert_eq!(store.series("a"), vec![DataPoint::new(4.0, 0.0)]);
    }

    #[test]
    fn test_load_registers_all_header_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "t,a,b\n").unwrap();

        let store = TelemetryStore::new(100);
        load_from_file(&path, &store).unwrap();
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);
    }
}
