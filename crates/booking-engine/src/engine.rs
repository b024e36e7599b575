//! The booking engine: orchestration, authorization, and the reservation path.
//!
//! `BookingEngine` coordinates the availability and appointment stores but
//! owns neither; it holds no state of its own across calls. Every mutating
//! operation takes an explicit [`Actor`] and returns a typed result — failures
//! never cross the boundary as panics.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::appointment::AppointmentStore;
use crate::availability::{AvailabilityStore, EditBatch};
use crate::catalog::{Catalog, ClientDirectory};
use crate::error::{BookingError, Result};
use crate::model::{
    Actor, Appointment, AppointmentId, AppointmentStatus, Availability, AvailabilityId,
    ServiceSnapshot, Specialist, SpecialistId,
};

/// Walk-in client details captured by the owner at the desk.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkIn {
    pub name: String,
    pub phone: String,
    pub city: String,
}

/// Orchestrates schedule edits, reservations, and appointment transitions
/// against the two stores, resolving collaborators through the catalog and
/// client-directory seams.
pub struct BookingEngine<C, D> {
    availability: Arc<AvailabilityStore>,
    appointments: Arc<AppointmentStore>,
    catalog: C,
    clients: D,
}

impl<C: Catalog, D: ClientDirectory> BookingEngine<C, D> {
    pub fn new(
        availability: Arc<AvailabilityStore>,
        appointments: Arc<AppointmentStore>,
        catalog: C,
        clients: D,
    ) -> Self {
        Self {
            availability,
            appointments,
            catalog,
            clients,
        }
    }

    /// Resolve a specialist and require that `actor` is its owning workshop.
    fn owned_specialist(&self, actor: Actor, id: SpecialistId) -> Result<Specialist> {
        let specialist = self
            .catalog
            .specialist(id)?
            .ok_or_else(|| BookingError::NotFound(format!("specialist {id}")))?;
        match actor {
            Actor::WorkshopOwner(w) if w == specialist.workshop => Ok(specialist),
            _ => Err(BookingError::Unauthorized),
        }
    }

    /// Load an availability and check it belongs to the expected specialist.
    fn slot_of(&self, specialist: SpecialistId, id: AvailabilityId) -> Result<Availability> {
        match self.availability.get(id)? {
            Some(a) if a.specialist == specialist => Ok(a),
            _ => Err(BookingError::NotFound(format!("availability {id}"))),
        }
    }

    /// Copy the slot's service out of the catalog at booking time, so later
    /// catalog edits never rewrite this appointment.
    fn snapshot_service(&self, availability: &Availability) -> Result<Option<ServiceSnapshot>> {
        match availability.service {
            Some(id) => Ok(self.catalog.service(id)?.as_ref().map(ServiceSnapshot::from)),
            None => Ok(None),
        }
    }

    /// Apply an owner's batch of slot edits and deletions atomically.
    ///
    /// The actor must own the specialist's workshop, and any service assigned
    /// to a slot must belong to that same workshop. Overlap validation and the
    /// all-or-nothing commit are delegated to
    /// [`AvailabilityStore::upsert_batch`]; occupied slots cannot be deleted.
    pub fn edit_schedule(
        &self,
        actor: Actor,
        specialist: SpecialistId,
        batch: &EditBatch,
    ) -> Result<Vec<AvailabilityId>> {
        let specialist = self.owned_specialist(actor, specialist)?;

        // A slot may only carry a service from the specialist's own workshop.
        let owned_services = self.catalog.services_for_workshop(specialist.workshop)?;
        for edit in &batch.edits {
            if let Some(service_id) = edit.service {
                if !owned_services.iter().any(|s| s.id == service_id) {
                    return Err(BookingError::Validation(format!(
                        "service {service_id} does not belong to this workshop"
                    )));
                }
            }
        }

        self.availability
            .upsert_batch(specialist.id, batch, |id| {
                self.appointments.is_slot_free(id).map(|free| !free)
            })
    }

    /// Client self-booking: reserve a free slot as `pending`.
    ///
    /// Rejects slots in the past (`today` is the caller's current date). The
    /// occupancy check and insert are atomic in the appointment store, so of
    /// two concurrent callers exactly one succeeds and the other gets
    /// [`BookingError::SlotTaken`].
    pub fn reserve_slot(
        &self,
        actor: Actor,
        specialist: SpecialistId,
        availability: AvailabilityId,
        notes: String,
        today: NaiveDate,
    ) -> Result<Appointment> {
        let Actor::Client(client) = actor else {
            return Err(BookingError::Unauthorized);
        };
        self.clients
            .client(client)?
            .ok_or_else(|| BookingError::NotFound(format!("client profile {client}")))?;
        let slot = self.slot_of(specialist, availability)?;
        if slot.date < today {
            return Err(BookingError::Validation(format!(
                "slot on {} is in the past",
                slot.date
            )));
        }
        let service = self.snapshot_service(&slot)?;
        self.appointments
            .reserve(&slot, client, service, notes, AppointmentStatus::Pending)
    }

    /// Owner-assisted walk-in booking: resolve or create the client by phone,
    /// then reserve the slot directly as `confirmed`.
    pub fn owner_assign_slot(
        &self,
        actor: Actor,
        specialist: SpecialistId,
        availability: AvailabilityId,
        walk_in: &WalkIn,
        notes: String,
    ) -> Result<Appointment> {
        let specialist = self.owned_specialist(actor, specialist)?;
        if walk_in.name.trim().is_empty() || walk_in.phone.trim().is_empty() {
            return Err(BookingError::Validation(
                "walk-in booking requires a client name and phone".into(),
            ));
        }
        let slot = self.slot_of(specialist.id, availability)?;
        let client =
            self.clients
                .find_or_create_by_phone(&walk_in.phone, &walk_in.name, &walk_in.city)?;
        let service = self.snapshot_service(&slot)?;
        self.appointments.reserve(
            &slot,
            client.id,
            service,
            notes,
            AppointmentStatus::Confirmed,
        )
    }

    /// Owner confirmation of a pending appointment.
    pub fn confirm(&self, actor: Actor, appointment: AppointmentId) -> Result<Appointment> {
        let row = self.load_appointment(appointment)?;
        self.owned_specialist(actor, row.specialist)?;
        self.appointments
            .set_status(appointment, AppointmentStatus::Confirmed)
    }

    /// Cancel an appointment.
    ///
    /// The owning workshop may cancel at any time. The booking client may
    /// cancel their own appointment (pending or confirmed) only while the slot
    /// date is today or later; cancelling a past appointment is rejected.
    pub fn cancel(
        &self,
        actor: Actor,
        appointment: AppointmentId,
        today: NaiveDate,
    ) -> Result<Appointment> {
        let row = self.load_appointment(appointment)?;
        match actor {
            Actor::WorkshopOwner(_) => {
                self.owned_specialist(actor, row.specialist)?;
            }
            Actor::Client(client) => {
                if client != row.client {
                    return Err(BookingError::Unauthorized);
                }
                let slot = self.slot_of(row.specialist, row.availability)?;
                if slot.date < today {
                    return Err(BookingError::InvalidTransition(format!(
                        "appointment {appointment} on {} is in the past",
                        slot.date
                    )));
                }
            }
        }
        self.appointments
            .set_status(appointment, AppointmentStatus::Cancelled)
    }

    /// Owner-only hard removal of a cancelled appointment from history.
    pub fn delete_appointment(&self, actor: Actor, appointment: AppointmentId) -> Result<()> {
        let row = self.load_appointment(appointment)?;
        self.owned_specialist(actor, row.specialist)?;
        self.appointments.delete(appointment)
    }

    fn load_appointment(&self, id: AppointmentId) -> Result<Appointment> {
        self.appointments
            .get(id)?
            .ok_or_else(|| BookingError::NotFound(format!("appointment {id}")))
    }

    /// Published slots for a specialist in `[from, to]`, ordered by
    /// (date, start).
    pub fn list_slots(
        &self,
        specialist: SpecialistId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Availability>> {
        self.availability.list(specialist, from, to)
    }

    pub fn is_slot_free(&self, availability: AvailabilityId) -> Result<bool> {
        self.appointments.is_slot_free(availability)
    }

    /// A client's own appointments, ordered by slot (date, start).
    pub fn my_appointments(&self, actor: Actor) -> Result<Vec<Appointment>> {
        let Actor::Client(client) = actor else {
            return Err(BookingError::Unauthorized);
        };
        let mut rows = self.appointments.list_for_client(client)?;
        self.sort_by_slot(&mut rows)?;
        Ok(rows)
    }

    /// All appointments for a specialist, owner-only, ordered by slot
    /// (date, start).
    pub fn appointments_for_specialist(
        &self,
        actor: Actor,
        specialist: SpecialistId,
    ) -> Result<Vec<Appointment>> {
        let specialist = self.owned_specialist(actor, specialist)?;
        let mut rows = self.appointments.list_for_specialist(specialist.id)?;
        self.sort_by_slot(&mut rows)?;
        Ok(rows)
    }

    fn sort_by_slot(&self, rows: &mut [Appointment]) -> Result<()> {
        let mut keys = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            let slot = self.availability.get(row.availability)?;
            keys.push((
                row.id,
                slot.map(|s| (s.date, s.slot.start())),
            ));
        }
        rows.sort_by_key(|row| {
            keys.iter()
                .find(|(id, _)| *id == row.id)
                .and_then(|(_, key)| *key)
        });
        Ok(())
    }
}
