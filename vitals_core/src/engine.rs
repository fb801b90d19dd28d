//! The journal engine: records readings and re-derives metrics.
//!
//! `Engine::record_entry` is the only mutating operation. It:
//! - Stamps the submitted fields with the caller's clock
//! - Appends through the journal store (which persists before committing)
//! - Advances the health score and rebuilds the snapshot
//!
//! Everything else is a query over the journal.

use crate::metrics;
use crate::{
    ByteStore, Journal, JournalStore, LoadStatus, MetricsSnapshot, ReadingFields, Result,
};
use chrono::{DateTime, TimeZone, Utc};

/// Snapshot for a freshly loaded journal, with the score at its baseline
pub fn initial_snapshot<Tz: TimeZone>(journal: &Journal, now: &DateTime<Tz>) -> MetricsSnapshot {
    snapshot_with_score(journal, now, metrics::baseline_score())
}

fn snapshot_with_score<Tz: TimeZone>(
    journal: &Journal,
    now: &DateTime<Tz>,
    health_score: u8,
) -> MetricsSnapshot {
    MetricsSnapshot {
        today_count: metrics::today_count(journal, now),
        streak: metrics::streak(journal, now),
        health_score,
        last_entry_time: metrics::last_entry_time(journal),
    }
}

/// One journal session: the journal store plus the score accumulated since load
#[derive(Debug)]
pub struct Engine<S: ByteStore> {
    journal: JournalStore<S>,
    health_score: u8,
    load_status: LoadStatus,
}

impl<S: ByteStore> Engine<S> {
    /// Hydrate the journal from `store` and start a session
    ///
    /// A corrupted journal does not fail the load; check
    /// [`Engine::load_status`] to warn the user about lost data.
    pub fn load(store: S) -> Result<Self> {
        let (journal, load_status) = JournalStore::open(store)?;

        match &load_status {
            LoadStatus::Recovered { reason, .. } => {
                tracing::warn!("Journal recovered as empty after read failure: {}", reason)
            }
            status => tracing::debug!("Journal load status: {:?}", status),
        }

        Ok(Self {
            journal,
            health_score: metrics::baseline_score(),
            load_status,
        })
    }

    /// How the journal was obtained at load time
    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    pub fn journal(&self) -> &Journal {
        self.journal.journal()
    }

    pub fn store(&self) -> &S {
        self.journal.store()
    }

    /// Health score accumulated this session
    pub fn health_score(&self) -> u8 {
        self.health_score
    }

    /// Current metrics as of `now`
    pub fn snapshot<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> MetricsSnapshot {
        snapshot_with_score(self.journal(), now, self.health_score)
    }

    /// Record one reading taken at `now` and return the updated metrics
    ///
    /// If the store rejects the write, the error is returned and neither the
    /// journal nor the health score changes.
    pub fn record_entry<Tz: TimeZone>(
        &mut self,
        fields: ReadingFields,
        now: &DateTime<Tz>,
    ) -> Result<MetricsSnapshot> {
        let mut stamped_at = now.with_timezone(&Utc);

        // Keep timestamps non-decreasing if the clock stepped backwards
        if let Some(last) = self.journal().last() {
            if stamped_at < last.timestamp {
                tracing::warn!(
                    "Clock is behind the last entry ({} < {}), using the last entry time",
                    stamped_at,
                    last.timestamp
                );
                stamped_at = last.timestamp;
            }
        }

        self.journal.append(fields.stamp(stamped_at))?;
        self.health_score = metrics::health_score(self.health_score);

        // Metrics as of the stamped time so the new reading is always counted
        let effective_now = stamped_at.with_timezone(&now.timezone());
        let snapshot = self.snapshot(&effective_now);
        tracing::info!(
            "Recorded reading at {} (today: {}, streak: {}, score: {})",
            stamped_at,
            snapshot.today_count,
            snapshot.streak,
            snapshot.health_score
        );
        Ok(snapshot)
    }
}

/// Hydrate an engine from `store` and compute its initial snapshot
pub fn load_journal<S: ByteStore, Tz: TimeZone>(
    store: S,
    now: &DateTime<Tz>,
) -> Result<(Engine<S>, MetricsSnapshot)> {
    let engine = Engine::load(store)?;
    let snapshot = initial_snapshot(engine.journal(), now);
    Ok((engine, snapshot))
}
