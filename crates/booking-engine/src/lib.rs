//! # booking-engine
//!
//! Scheduling and booking core for workshop appointment systems: publication
//! of availability windows, overlap detection on schedule edits, atomic slot
//! reservation under concurrency, and the appointment lifecycle state machine.
//!
//! The engine is a library: it knows nothing about HTTP, sessions, or
//! rendering. Callers resolve identity into an [`Actor`], invoke operations,
//! and get typed results back.
//!
//! ## Modules
//!
//! - [`interval`] — half-open `[start, end)` time ranges and the overlap rule
//! - [`model`] — identifiers, entities, appointment status machine
//! - [`availability`] — slot storage and the batch edit conflict check
//! - [`appointment`] — reservation storage with the atomic occupancy guarantee
//! - [`engine`] — orchestration, authorization, reserve/confirm/cancel paths
//! - [`calendar`] — per-day free/active counts for calendar views
//! - [`month`] — pure month-boundary and day-grid math
//! - [`catalog`] — collaborator seams (workshop catalog, client directory)
//! - [`error`] — error types

pub mod appointment;
pub mod availability;
pub mod calendar;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod interval;
pub mod model;
pub mod month;

pub use appointment::AppointmentStore;
pub use availability::{AvailabilityStore, EditBatch, EditError, SlotEdit};
pub use calendar::{CalendarProjector, DayCounts, Viewpoint};
pub use catalog::{Catalog, ClientDirectory, MemoryCatalog, MemoryClientDirectory};
pub use engine::{BookingEngine, WalkIn};
pub use error::{BookingError, Result};
pub use interval::TimeInterval;
pub use model::{
    Actor, Appointment, AppointmentId, AppointmentStatus, Availability, AvailabilityId, ClientId,
    ClientProfile, Service, ServiceId, ServiceSnapshot, Specialist, SpecialistId, WorkshopId,
};
pub use month::{days_in_month, month_bounds, month_grid};
