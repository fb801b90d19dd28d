//! Journal persistence with corruption recovery.
//!
//! The whole journal is stored as one pretty-printed JSON array under
//! [`JOURNAL_KEY`] and rewritten on every append. Undecodable data never
//! fails a load: the raw bytes are copied aside under [`CORRUPT_KEY`] and
//! the journal starts over empty.

use crate::{ByteStore, Reading, Result};

/// Key the journal is persisted under
pub const JOURNAL_KEY: &str = "vitals";

/// Key an undecodable journal is copied to before it is replaced
pub const CORRUPT_KEY: &str = "vitals.corrupt";

/// Ordered, append-only history of readings
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Journal {
    readings: Vec<Reading>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_readings(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    /// All readings in insertion order
    pub fn all(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Most recently appended reading
    pub fn last(&self) -> Option<&Reading> {
        self.readings.last()
    }

    /// A new journal equal to this one with `reading` at the end
    pub fn appended(&self, reading: Reading) -> Journal {
        let mut readings = Vec::with_capacity(self.readings.len() + 1);
        readings.extend_from_slice(&self.readings);
        readings.push(reading);
        Journal { readings }
    }
}

/// Serialize the journal into its persisted form
pub fn encode_journal(journal: &Journal) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(journal.all())?)
}

/// Parse a persisted journal
pub fn decode_journal(bytes: &[u8]) -> Result<Journal> {
    let readings: Vec<Reading> = serde_json::from_slice(bytes)?;

    if readings
        .windows(2)
        .any(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        tracing::warn!("Stored journal has out-of-order timestamps; keeping stored order");
    }

    Ok(Journal::from_readings(readings))
}

/// Outcome of hydrating a journal from a byte store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing stored yet (first run)
    Missing,
    /// Stored journal decoded cleanly
    Loaded { entries: usize },
    /// Stored data could not be decoded; the journal starts empty.
    /// `preserved` tells whether the raw bytes were copied to [`CORRUPT_KEY`].
    Recovered { reason: String, preserved: bool },
}

impl LoadStatus {
    /// True when stored data had to be discarded
    pub fn is_data_loss(&self) -> bool {
        matches!(self, LoadStatus::Recovered { .. })
    }
}

/// A hydrated journal together with how it was obtained
#[derive(Clone, Debug)]
pub struct Loaded {
    pub journal: Journal,
    pub status: LoadStatus,
}

/// Read the journal out of `store`
///
/// Returns an empty journal if nothing is stored.
/// If the stored bytes are corrupted, logs a warning, copies them under
/// [`CORRUPT_KEY`] and returns an empty journal.
/// Only a failing store read is an error.
pub fn read_journal<S: ByteStore>(store: &mut S) -> Result<Loaded> {
    let bytes = match store.get(JOURNAL_KEY)? {
        // Whitespace-only counts as nothing stored, not as corruption
        Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => bytes,
        _ => {
            tracing::info!("No stored journal found, starting empty");
            return Ok(Loaded {
                journal: Journal::new(),
                status: LoadStatus::Missing,
            });
        }
    };

    match decode_journal(&bytes) {
        Ok(journal) => {
            tracing::info!("Loaded journal with {} readings", journal.len());
            Ok(Loaded {
                status: LoadStatus::Loaded {
                    entries: journal.len(),
                },
                journal,
            })
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse stored journal: {}. Starting with an empty journal.",
                e
            );

            let preserved = match store.set(CORRUPT_KEY, &bytes) {
                Ok(()) => {
                    tracing::info!("Preserved unreadable journal under {:?}", CORRUPT_KEY);
                    true
                }
                Err(backup_err) => {
                    tracing::warn!(
                        "Unable to preserve unreadable journal under {:?}: {}",
                        CORRUPT_KEY,
                        backup_err
                    );
                    false
                }
            };

            Ok(Loaded {
                journal: Journal::new(),
                status: LoadStatus::Recovered {
                    reason: e.to_string(),
                    preserved,
                },
            })
        }
    }
}

/// Custody of the journal: the in-memory copy plus the store backing it
///
/// The in-memory journal never runs ahead of the store: an append only
/// takes effect once the store has accepted the rewritten journal.
#[derive(Debug)]
pub struct JournalStore<S: ByteStore> {
    store: S,
    journal: Journal,
}

impl<S: ByteStore> JournalStore<S> {
    /// Hydrate from `store`
    pub fn open(mut store: S) -> Result<(Self, LoadStatus)> {
        let Loaded { journal, status } = read_journal(&mut store)?;
        Ok((Self { store, journal }, status))
    }

    /// Append one reading and persist the full journal
    pub fn append(&mut self, reading: Reading) -> Result<&Journal> {
        let next = self.journal.appended(reading);
        let bytes = encode_journal(&next)?;

        self.store.set(JOURNAL_KEY, &bytes)?;
        self.journal = next;

        tracing::debug!("Appended reading; journal now has {} entries", self.journal.len());
        Ok(&self.journal)
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Readings in insertion order
    pub fn all(&self) -> &[Reading] {
        self.journal.all()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the underlying store
    pub fn into_store(self) -> S {
        self.store
    }
}
