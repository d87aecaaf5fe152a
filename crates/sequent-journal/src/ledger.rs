//! Append-only ledger with optimistic concurrency
//!
//! Storage is a single JSON Lines file inside the ledger directory, one
//! event per line, plus a lock file. Every append holds an exclusive
//! `fs2` lock on the lock file, re-reads the tail to learn the current
//! latest sequence, writes its line, and fsyncs before returning.
//!
//! A torn trailing line (crash mid-write) is discarded on read and
//! truncated away before the next append; the preceding record is the
//! current latest.

use crate::event::{Event, EventKind};
use fs2::FileExt;
use sequent_core::{ProofError, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const EVENTS_FILE: &str = "events.jsonl";
const LOCK_FILE: &str = "ledger.lock";
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Handle to a proof's ledger directory.
#[derive(Debug, Clone)]
pub struct Ledger {
    dir: PathBuf,
    lock_timeout: Duration,
}

/// Exclusive hold on the ledger directory for the duration of one append
/// (or one best-effort batch). Released on drop.
struct LedgerLock {
    file: File,
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if let Err(err) = fs2::FileExt::unlock(&self.file) {
            warn!(error = %err.kind(), "failed to release ledger lock");
        }
    }
}

/// Outcome of a best-effort batch append.
///
/// The first event commits under CAS; later events commit under the same
/// held lock with plain appends. If a later append fails the ledger is
/// left in a partial but consistent state: `committed` lists the sequence
/// numbers that made it, `failure` carries the error that stopped the
/// batch.
#[derive(Debug)]
pub struct BatchAppend {
    /// Sequence numbers of the events that committed, in order.
    pub committed: Vec<u64>,
    /// The error that interrupted the batch, if any.
    pub failure: Option<ProofError>,
}

impl Ledger {
    /// Open (creating if needed) the ledger directory.
    pub fn open(dir: impl Into<PathBuf>, lock_timeout: Duration) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| ProofError::storage(format!("failed to create ledger dir: {}", e.kind())))?;
        Ok(Self { dir, lock_timeout })
    }

    fn events_path(&self) -> PathBuf {
        self.dir.join(EVENTS_FILE)
    }

    /// Read the full event log in sequence order.
    ///
    /// A malformed trailing record is discarded; malformed interior
    /// records and sequence gaps are fatal.
    pub fn read_all(&self) -> Result<Vec<Event>> {
        let path = self.events_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut content = String::new();
        File::open(&path)
            .and_then(|mut f| f.read_to_string(&mut content))
            .map_err(|e| ProofError::storage(format!("failed to read ledger: {}", e.kind())))?;
        parse_events(&content)
    }

    /// Number of committed events.
    pub fn count(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }

    /// Sequence number of the latest committed event (0 when empty).
    pub fn latest_sequence(&self) -> Result<u64> {
        Ok(self.read_all()?.last().map(|e| e.sequence).unwrap_or(0))
    }

    /// Append one event, returning its sequence number.
    pub fn append(&self, kind: EventKind) -> Result<u64> {
        let _lock = self.acquire_lock()?;
        self.append_locked(kind)
    }

    /// Append one event iff the current latest sequence equals
    /// `expected_seq`. This is the optimistic-concurrency primitive: on
    /// mismatch the caller must reload and retry.
    pub fn append_if_sequence(&self, kind: EventKind, expected_seq: u64) -> Result<u64> {
        let _lock = self.acquire_lock()?;
        let latest = self.repair_and_latest()?;
        if latest != expected_seq {
            return Err(ProofError::ConcurrentModification {
                expected: expected_seq,
                actual: latest,
            });
        }
        self.write_event(Event::new(latest + 1, kind))
    }

    /// Best-effort batch: the first event commits under CAS at
    /// `expected_seq`, the rest under the same held lock.
    pub fn append_batch_if_sequence(
        &self,
        kinds: Vec<EventKind>,
        expected_seq: u64,
    ) -> Result<BatchAppend> {
        let _lock = self.acquire_lock()?;
        let latest = self.repair_and_latest()?;
        if latest != expected_seq {
            return Err(ProofError::ConcurrentModification {
                expected: expected_seq,
                actual: latest,
            });
        }
        let mut committed = Vec::with_capacity(kinds.len());
        let mut next = latest + 1;
        for kind in kinds {
            match self.write_event(Event::new(next, kind)) {
                Ok(seq) => {
                    committed.push(seq);
                    next = seq + 1;
                }
                Err(err) => {
                    warn!(committed = committed.len(), error = %err, "batch append interrupted");
                    return Ok(BatchAppend {
                        committed,
                        failure: Some(err),
                    });
                }
            }
        }
        Ok(BatchAppend {
            committed,
            failure: None,
        })
    }

    /// Append assuming the caller already checked its preconditions and
    /// holds no expectations about the sequence (used for derived events
    /// such as taint recomputation).
    fn append_locked(&self, kind: EventKind) -> Result<u64> {
        let latest = self.repair_and_latest()?;
        self.write_event(Event::new(latest + 1, kind))
    }

    fn write_event(&self, event: Event) -> Result<u64> {
        let line = serde_json::to_string(&event)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.events_path())
            .map_err(|e| ProofError::storage(format!("failed to open ledger: {}", e.kind())))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.sync_all())
            .map_err(|e| ProofError::storage(format!("failed to write event: {}", e.kind())))?;
        debug!(sequence = event.sequence, kind = event.kind.tag(), "event committed");
        Ok(event.sequence)
    }

    /// Truncate any torn trailing record, then return the latest sequence.
    ///
    /// Must be called with the lock held.
    fn repair_and_latest(&self) -> Result<u64> {
        let path = self.events_path();
        if !path.exists() {
            return Ok(0);
        }
        let mut content = String::new();
        File::open(&path)
            .and_then(|mut f| f.read_to_string(&mut content))
            .map_err(|e| ProofError::storage(format!("failed to read ledger: {}", e.kind())))?;

        if let Some(keep) = torn_tail_offset(&content) {
            warn!(keep, "truncating torn trailing record");
            let file = OpenOptions::new()
                .write(true)
                .open(&path)
                .map_err(|e| ProofError::storage(format!("failed to open ledger: {}", e.kind())))?;
            file.set_len(keep as u64)
                .map_err(|e| ProofError::storage(format!("failed to truncate ledger: {}", e.kind())))?;
            file.sync_all()
                .map_err(|e| ProofError::storage(format!("failed to sync ledger: {}", e.kind())))?;
            content.truncate(keep);
        }

        let events = parse_events(&content)?;
        Ok(events.last().map(|e| e.sequence).unwrap_or(0))
    }

    fn acquire_lock(&self) -> Result<LedgerLock> {
        let path = self.dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| ProofError::storage(format!("failed to open lock file: {}", e.kind())))?;
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(LedgerLock { file }),
                Err(_) if Instant::now() < deadline => {
                    std::thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(_) => return Err(ProofError::LockTimeout),
            }
        }
    }
}

/// Byte offset to keep if the content ends in a torn record, or `None`
/// if the tail is intact.
///
/// A record is torn when the file does not end with a newline, or when
/// the final newline-terminated line does not parse (a crash can land
/// either way depending on how much of the buffered write hit disk).
fn torn_tail_offset(content: &str) -> Option<usize> {
    if content.is_empty() {
        return None;
    }
    if !content.ends_with('\n') {
        return Some(content.rfind('\n').map(|i| i + 1).unwrap_or(0));
    }
    let trimmed = &content[..content.len() - 1];
    let last_start = trimmed.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let last_line = &trimmed[last_start..];
    if serde_json::from_str::<Event>(last_line).is_err() {
        return Some(last_start);
    }
    None
}

fn parse_events(content: &str) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    let lines: Vec<&str> = content
        .split('\n')
        .filter(|line| !line.is_empty())
        .collect();
    for (index, line) in lines.iter().enumerate() {
        match serde_json::from_str::<Event>(line) {
            Ok(event) => {
                let expected = events.last().map(|e: &Event| e.sequence + 1).unwrap_or(1);
                if event.sequence != expected {
                    return Err(ProofError::storage(format!(
                        "ledger sequence gap: expected {expected}, found {}",
                        event.sequence
                    )));
                }
                events.push(event);
            }
            Err(err) if index + 1 == lines.len() => {
                // Torn tail: the write did not complete. The preceding
                // record is the current latest.
                debug!(error = %err, "discarding malformed trailing record");
                break;
            }
            Err(err) => {
                return Err(ProofError::serialization(format!(
                    "malformed ledger record at line {}: {err}",
                    index + 1
                )));
            }
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequent_core::AgentId;

    fn init_kind() -> EventKind {
        EventKind::ProofInitialized {
            conjecture: "P".to_string(),
            author: AgentId::from("alice"),
        }
    }

    fn temp_ledger() -> (tempfile::TempDir, Ledger) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::open(dir.path().join("ledger"), Duration::from_secs(5)).unwrap();
        (dir, ledger)
    }

    #[test]
    fn sequences_start_at_one_and_increase() {
        let (_dir, ledger) = temp_ledger();
        assert_eq!(ledger.append(init_kind()).unwrap(), 1);
        assert_eq!(
            ledger
                .append(EventKind::NodesReleased { ids: vec![] })
                .unwrap(),
            2
        );
        assert_eq!(ledger.count().unwrap(), 2);
        assert_eq!(ledger.latest_sequence().unwrap(), 2);
    }

    #[test]
    fn cas_mismatch_is_concurrent_modification() {
        let (_dir, ledger) = temp_ledger();
        ledger.append(init_kind()).unwrap();
        let err = ledger
            .append_if_sequence(EventKind::NodesReleased { ids: vec![] }, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            ProofError::ConcurrentModification {
                expected: 0,
                actual: 1
            }
        ));
        // The matching expectation succeeds.
        assert_eq!(
            ledger
                .append_if_sequence(EventKind::NodesReleased { ids: vec![] }, 1)
                .unwrap(),
            2
        );
    }

    #[test]
    fn torn_tail_is_discarded_and_truncated() {
        let (_dir, ledger) = temp_ledger();
        ledger.append(init_kind()).unwrap();
        ledger.append(EventKind::NodesReleased { ids: vec![] }).unwrap();

        // Simulate a crash mid-write.
        let path = ledger.events_path();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"sequence\":3,\"timest").unwrap();
        file.sync_all().unwrap();

        let events = ledger.read_all().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(ledger.latest_sequence().unwrap(), 2);

        // The next append lands at sequence 3 on a clean line.
        assert_eq!(ledger.append(init_kind()).unwrap(), 3);
        assert_eq!(ledger.read_all().unwrap().len(), 3);
    }

    #[test]
    fn malformed_interior_record_is_fatal() {
        let (_dir, ledger) = temp_ledger();
        ledger.append(init_kind()).unwrap();
        let path = ledger.events_path();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"not json\n").unwrap();
        file.write_all(
            serde_json::to_string(&Event::new(2, init_kind()))
                .unwrap()
                .as_bytes(),
        )
        .unwrap();
        file.write_all(b"\n").unwrap();
        assert!(ledger.read_all().is_err());
    }

    #[test]
    fn batch_commits_contiguously_under_one_lock() {
        let (_dir, ledger) = temp_ledger();
        ledger.append(init_kind()).unwrap();
        let outcome = ledger
            .append_batch_if_sequence(
                vec![
                    EventKind::NodesReleased { ids: vec![] },
                    EventKind::NodesReleased { ids: vec![] },
                    EventKind::NodesReleased { ids: vec![] },
                ],
                1,
            )
            .unwrap();
        assert_eq!(outcome.committed, vec![2, 3, 4]);
        assert!(outcome.failure.is_none());

        let stale = ledger.append_batch_if_sequence(vec![init_kind()], 1);
        assert!(matches!(
            stale,
            Err(ProofError::ConcurrentModification { .. })
        ));
    }

    #[test]
    fn reopen_sees_persisted_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger");
        {
            let ledger = Ledger::open(&path, Duration::from_secs(5)).unwrap();
            ledger.append(init_kind()).unwrap();
        }
        let reopened = Ledger::open(&path, Duration::from_secs(5)).unwrap();
        assert_eq!(reopened.latest_sequence().unwrap(), 1);
    }
}
