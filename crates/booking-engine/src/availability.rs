//! Availability storage and the batch edit conflict check.
//!
//! The store owns every published slot and enforces the non-overlap invariant:
//! for one specialist and date, no two slots may overlap. `upsert_batch` is the
//! core algorithm of the engine — a two-level check (edits vs. stored rows,
//! then edits vs. each other) run and committed inside a single critical
//! section, so no other writer can slip a conflicting slot in between
//! validation and commit.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{BookingError, Result};
use crate::interval::TimeInterval;
use crate::model::{Availability, AvailabilityId, ServiceId, SpecialistId};

/// One item of an edit batch: a new slot (`id: None`) or a replacement of an
/// existing slot (`id: Some`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotEdit {
    pub id: Option<AvailabilityId>,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub service: Option<ServiceId>,
}

/// A batch of slot edits and deletions, applied atomically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditBatch {
    pub edits: Vec<SlotEdit>,
    pub deletions: Vec<AvailabilityId>,
}

/// Why one item of a batch was rejected. `item` indexes into the submitted
/// `edits` vector so the caller can attach the error to the right field.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditError {
    #[error("item {item}: start {start} must be before end {end}")]
    InvalidInterval {
        item: usize,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("item {item}: overlaps existing slot {existing} on {date}")]
    OverlapsExisting {
        item: usize,
        date: NaiveDate,
        existing_id: AvailabilityId,
        existing: TimeInterval,
    },

    #[error("item {item}: overlaps item {other_item} on {date}")]
    OverlapsInBatch {
        item: usize,
        other_item: usize,
        date: NaiveDate,
    },

    #[error("slot {id} does not exist for this specialist")]
    UnknownSlot {
        /// Index of the offending edit; `None` when the id came from the
        /// deletion list.
        item: Option<usize>,
        id: AvailabilityId,
    },

    #[error("slot {id} has an active appointment and cannot be deleted")]
    SlotOccupied { id: AvailabilityId },
}

#[derive(Debug, Default)]
struct Inner {
    rows: BTreeMap<AvailabilityId, Availability>,
    next_id: u64,
}

/// In-memory availability table. One mutex guards the whole table, which makes
/// every operation — in particular the validate-then-commit of
/// [`upsert_batch`](AvailabilityStore::upsert_batch) — a single transaction.
#[derive(Debug, Default)]
pub struct AvailabilityStore {
    inner: Mutex<Inner>,
}

impl AvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing rows (snapshot restore), re-checking the
    /// non-overlap invariant and id uniqueness.
    pub fn from_rows(rows: Vec<Availability>) -> Result<Self> {
        let mut by_day: BTreeMap<(SpecialistId, NaiveDate), Vec<TimeInterval>> = BTreeMap::new();
        let mut table: BTreeMap<AvailabilityId, Availability> = BTreeMap::new();
        let mut next_id = 1;

        for row in rows {
            let slots = by_day.entry((row.specialist, row.date)).or_default();
            if let Some(other) = slots.iter().find(|s| s.overlaps(&row.slot)) {
                return Err(BookingError::Validation(format!(
                    "slot {} ({}) overlaps {} on {}",
                    row.id, row.slot, other, row.date
                )));
            }
            slots.push(row.slot);
            next_id = next_id.max(row.id.0 + 1);
            if table.insert(row.id, row.clone()).is_some() {
                return Err(BookingError::Validation(format!(
                    "duplicate availability id {}",
                    row.id
                )));
            }
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                rows: table,
                next_id,
            }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| BookingError::Storage("availability store lock poisoned".into()))
    }

    /// All slots for a specialist within `[from, to]`, ordered by (date, start).
    pub fn list(
        &self,
        specialist: SpecialistId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Availability>> {
        let inner = self.lock()?;
        let mut out: Vec<Availability> = inner
            .rows
            .values()
            .filter(|a| a.specialist == specialist && a.date >= from && a.date <= to)
            .cloned()
            .collect();
        out.sort_by_key(|a| (a.date, a.slot.start()));
        Ok(out)
    }

    pub fn get(&self, id: AvailabilityId) -> Result<Option<Availability>> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    /// Every stored row, ordered by id. Used for snapshot export.
    pub fn snapshot(&self) -> Result<Vec<Availability>> {
        Ok(self.lock()?.rows.values().cloned().collect())
    }

    /// Validate and apply an edit batch atomically.
    ///
    /// The conflict check runs in two levels: each edit against the surviving
    /// stored slots on its date (excluding deleted rows and the row an edit
    /// replaces), then each edit against earlier edits in the same batch.
    /// Every error found is collected — the caller gets the complete list, not
    /// the first hit — and one error rejects the whole batch: nothing is
    /// persisted. On success all upserts and deletions commit together and the
    /// ids of the applied edits are returned in submission order.
    ///
    /// `is_occupied` reports whether a slot currently has an active
    /// appointment; deleting an occupied slot is a caller error (cancel
    /// first). It is evaluated here, at commit time, inside the critical
    /// section.
    pub fn upsert_batch(
        &self,
        specialist: SpecialistId,
        batch: &EditBatch,
        is_occupied: impl Fn(AvailabilityId) -> Result<bool>,
    ) -> Result<Vec<AvailabilityId>> {
        let mut inner = self.lock()?;
        let mut errors: Vec<EditError> = Vec::new();

        let deletions: BTreeSet<AvailabilityId> = batch.deletions.iter().copied().collect();
        for id in &deletions {
            match inner.rows.get(id) {
                Some(row) if row.specialist == specialist => {
                    if is_occupied(*id)? {
                        errors.push(EditError::SlotOccupied { id: *id });
                    }
                }
                _ => errors.push(EditError::UnknownSlot {
                    item: None,
                    id: *id,
                }),
            }
        }

        // Field-level validation first; items that fail here are excluded from
        // the overlap checks.
        struct ValidEdit {
            item: usize,
            id: Option<AvailabilityId>,
            date: NaiveDate,
            slot: TimeInterval,
            service: Option<ServiceId>,
        }
        let mut valid: Vec<ValidEdit> = Vec::new();
        for (item, edit) in batch.edits.iter().enumerate() {
            // An edit whose id is also in the deletion set: the deletion wins.
            if edit.id.is_some_and(|id| deletions.contains(&id)) {
                continue;
            }
            let slot = match TimeInterval::new(edit.start, edit.end) {
                Ok(slot) => slot,
                Err(_) => {
                    errors.push(EditError::InvalidInterval {
                        item,
                        start: edit.start,
                        end: edit.end,
                    });
                    continue;
                }
            };
            if let Some(id) = edit.id {
                match inner.rows.get(&id) {
                    Some(row) if row.specialist == specialist => {}
                    _ => {
                        errors.push(EditError::UnknownSlot {
                            item: Some(item),
                            id,
                        });
                        continue;
                    }
                }
            }
            valid.push(ValidEdit {
                item,
                id: edit.id,
                date: edit.date,
                slot,
                service: edit.service,
            });
        }

        // Rows replaced by an edit are excluded from the "existing" set — an
        // edited slot must not conflict with its own stored version.
        let edited_ids: BTreeSet<AvailabilityId> = valid.iter().filter_map(|e| e.id).collect();

        // Level one: edits vs. surviving stored slots. Level two: edits vs.
        // earlier accepted edits in the same batch (a batch may add several
        // slots on one day; the stored set alone would miss those collisions).
        let mut accepted: Vec<(usize, NaiveDate, TimeInterval)> = Vec::new();
        for edit in &valid {
            let existing_hit = inner.rows.values().find(|row| {
                row.specialist == specialist
                    && row.date == edit.date
                    && !deletions.contains(&row.id)
                    && !edited_ids.contains(&row.id)
                    && row.slot.overlaps(&edit.slot)
            });
            if let Some(row) = existing_hit {
                errors.push(EditError::OverlapsExisting {
                    item: edit.item,
                    date: edit.date,
                    existing_id: row.id,
                    existing: row.slot,
                });
                continue;
            }

            if let Some((other_item, _, _)) = accepted
                .iter()
                .find(|(_, date, slot)| *date == edit.date && slot.overlaps(&edit.slot))
            {
                errors.push(EditError::OverlapsInBatch {
                    item: edit.item,
                    other_item: *other_item,
                    date: edit.date,
                });
                continue;
            }
            accepted.push((edit.item, edit.date, edit.slot));
        }

        if !errors.is_empty() {
            return Err(BookingError::Conflict(errors));
        }

        // Commit: all upserts and deletions as one unit.
        let now = Utc::now();
        let mut applied = Vec::with_capacity(valid.len());
        for edit in valid {
            let id = match edit.id {
                Some(id) => {
                    // Replacement keeps the original creation stamp.
                    if let Some(row) = inner.rows.get_mut(&id) {
                        row.date = edit.date;
                        row.slot = edit.slot;
                        row.service = edit.service;
                    }
                    id
                }
                None => {
                    let id = AvailabilityId(inner.next_id);
                    inner.next_id += 1;
                    inner.rows.insert(
                        id,
                        Availability {
                            id,
                            specialist,
                            date: edit.date,
                            slot: edit.slot,
                            service: edit.service,
                            created_at: now,
                        },
                    );
                    id
                }
            };
            applied.push(id);
        }
        for id in &deletions {
            inner.rows.remove(id);
        }

        Ok(applied)
    }
}
