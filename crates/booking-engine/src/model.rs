//! Domain model: identifiers, entities, and the appointment state machine.
//!
//! Callers resolve their role once at the boundary into an [`Actor`] and pass
//! it to every mutating operation; the engine never re-derives "is this user a
//! client or an owner" from entity lookups.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::TimeInterval;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// A bookable staff member belonging to a workshop.
    SpecialistId
);
id_type!(
    /// The provider organization owning specialists and services.
    WorkshopId
);
id_type!(
    /// A bookable offering (name, price, duration hint).
    ServiceId
);
id_type!(
    /// A client profile.
    ClientId
);
id_type!(
    /// A published availability slot.
    AvailabilityId
);
id_type!(
    /// A reservation against one availability slot.
    AppointmentId
);

/// A bookable staff member. Owned by a workshop; lifecycle managed outside
/// the engine (catalog collaborator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialist {
    pub id: SpecialistId,
    pub workshop: WorkshopId,
    pub name: String,
    pub active: bool,
    pub display_order: u32,
}

/// A bookable offering. Referenced by availability slots; copied onto
/// appointments at booking time (see [`ServiceSnapshot`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub workshop: WorkshopId,
    pub name: String,
    /// Price in minor currency units.
    pub price_minor: u64,
    pub duration_minutes: u32,
}

/// Denormalized copy of a [`Service`] taken when an appointment is created,
/// so later catalog edits do not rewrite booking history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub service: ServiceId,
    pub name: String,
    pub price_minor: u64,
    pub duration_minutes: u32,
}

impl From<&Service> for ServiceSnapshot {
    fn from(s: &Service) -> Self {
        ServiceSnapshot {
            service: s.id,
            name: s.name.clone(),
            price_minor: s.price_minor,
            duration_minutes: s.duration_minutes,
        }
    }
}

/// A client identity, provisioned by the client-directory collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub id: ClientId,
    pub name: String,
    pub phone: String,
    pub city: String,
}

/// A published open slot: one specialist, one date, one `[start, end)` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub id: AvailabilityId,
    pub specialist: SpecialistId,
    pub date: NaiveDate,
    pub slot: TimeInterval,
    pub service: Option<ServiceId>,
    pub created_at: DateTime<Utc>,
}

/// Appointment lifecycle status.
///
/// `Pending` and `Confirmed` are "active": they occupy the slot. `Cancelled`
/// is terminal; cancelled rows are retained as history until the owner purges
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    /// Active statuses occupy their availability slot.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    /// Whether the state machine permits moving from `self` to `to`.
    ///
    /// `pending → confirmed`, and `pending`/`confirmed` → `cancelled`. Nothing
    /// leaves `cancelled`, and no transition is a self-loop.
    pub fn can_transition_to(&self, to: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A reservation against exactly one availability slot.
///
/// `specialist` duplicates the availability's owner for query convenience;
/// `service` is the snapshot taken at booking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub client: ClientId,
    pub specialist: SpecialistId,
    pub availability: AvailabilityId,
    pub service: Option<ServiceSnapshot>,
    pub notes: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

/// The caller's resolved identity, established once at the authorization
/// boundary by the identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Client(ClientId),
    WorkshopOwner(WorkshopId),
}
