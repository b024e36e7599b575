//! Appointment storage and the slot-occupancy guarantee.
//!
//! At most one appointment per availability slot may be active (`pending` or
//! `confirmed`) at any time. [`AppointmentStore::reserve`] enforces this with
//! an atomic check-and-insert: occupancy test and insert happen under the same
//! lock acquisition, so two racing reservations against one slot yield exactly
//! one success and one `SlotTaken`. Cancelled rows are retained as history.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::error::{BookingError, Result};
use crate::model::{
    Appointment, AppointmentId, AppointmentStatus, Availability, AvailabilityId, ClientId,
    ServiceSnapshot, SpecialistId,
};

#[derive(Debug, Default)]
struct Inner {
    rows: BTreeMap<AppointmentId, Appointment>,
    next_id: u64,
}

/// In-memory appointment table behind a single mutex — the storage-level
/// primitive that makes reservation race-free.
#[derive(Debug, Default)]
pub struct AppointmentStore {
    inner: Mutex<Inner>,
}

impl AppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing rows (snapshot restore), re-checking the
    /// at-most-one-active invariant and id uniqueness.
    pub fn from_rows(rows: Vec<Appointment>) -> Result<Self> {
        let mut table: BTreeMap<AppointmentId, Appointment> = BTreeMap::new();
        let mut active: BTreeMap<AvailabilityId, AppointmentId> = BTreeMap::new();
        let mut next_id = 1;

        for row in rows {
            if row.status.is_active() {
                if let Some(first) = active.insert(row.availability, row.id) {
                    return Err(BookingError::Validation(format!(
                        "appointments {} and {} are both active on slot {}",
                        first, row.id, row.availability
                    )));
                }
            }
            next_id = next_id.max(row.id.0 + 1);
            if table.insert(row.id, row.clone()).is_some() {
                return Err(BookingError::Validation(format!(
                    "duplicate appointment id {}",
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
            .map_err(|_| BookingError::Storage("appointment store lock poisoned".into()))
    }

    /// True iff no appointment referencing the slot is active.
    pub fn is_slot_free(&self, availability: AvailabilityId) -> Result<bool> {
        let inner = self.lock()?;
        Ok(!inner
            .rows
            .values()
            .any(|a| a.availability == availability && a.status.is_active()))
    }

    /// Atomically check the slot is free and insert a new appointment with the
    /// given initial status. The loser of a race gets `SlotTaken`.
    pub fn reserve(
        &self,
        availability: &Availability,
        client: ClientId,
        service: Option<ServiceSnapshot>,
        notes: String,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        let mut inner = self.lock()?;
        let taken = inner
            .rows
            .values()
            .any(|a| a.availability == availability.id && a.status.is_active());
        if taken {
            return Err(BookingError::SlotTaken);
        }

        let id = AppointmentId(inner.next_id);
        inner.next_id += 1;
        let appointment = Appointment {
            id,
            client,
            specialist: availability.specialist,
            availability: availability.id,
            service,
            notes,
            status,
            created_at: Utc::now(),
        };
        inner.rows.insert(id, appointment.clone());
        Ok(appointment)
    }

    pub fn get(&self, id: AppointmentId) -> Result<Option<Appointment>> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    /// Apply a status transition, re-validating the state machine against the
    /// current row under the lock. A second `cancel` therefore reports
    /// `InvalidTransition` instead of double-transitioning.
    pub fn set_status(&self, id: AppointmentId, to: AppointmentStatus) -> Result<Appointment> {
        let mut inner = self.lock()?;
        let row = inner
            .rows
            .get_mut(&id)
            .ok_or_else(|| BookingError::NotFound(format!("appointment {id}")))?;
        if !row.status.can_transition_to(to) {
            return Err(BookingError::InvalidTransition(format!(
                "cannot move appointment {id} from {} to {to}",
                row.status
            )));
        }
        row.status = to;
        Ok(row.clone())
    }

    /// Hard-remove a row from history. Only permitted on non-active
    /// (cancelled) appointments; active ones must be cancelled first.
    pub fn delete(&self, id: AppointmentId) -> Result<()> {
        let mut inner = self.lock()?;
        let row = inner
            .rows
            .get(&id)
            .ok_or_else(|| BookingError::NotFound(format!("appointment {id}")))?;
        if row.status.is_active() {
            return Err(BookingError::InvalidTransition(format!(
                "appointment {id} is {}; cancel it before deleting",
                row.status
            )));
        }
        inner.rows.remove(&id);
        Ok(())
    }

    /// All appointments for one specialist, ordered by id.
    pub fn list_for_specialist(&self, specialist: SpecialistId) -> Result<Vec<Appointment>> {
        let inner = self.lock()?;
        Ok(inner
            .rows
            .values()
            .filter(|a| a.specialist == specialist)
            .cloned()
            .collect())
    }

    /// All appointments booked by one client, ordered by id.
    pub fn list_for_client(&self, client: ClientId) -> Result<Vec<Appointment>> {
        let inner = self.lock()?;
        Ok(inner
            .rows
            .values()
            .filter(|a| a.client == client)
            .cloned()
            .collect())
    }

    /// Every stored row, ordered by id. Used for snapshot export.
    pub fn snapshot(&self) -> Result<Vec<Appointment>> {
        Ok(self.lock()?.rows.values().cloned().collect())
    }
}
