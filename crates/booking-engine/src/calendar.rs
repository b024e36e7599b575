//! Per-day aggregate counts for calendar views.
//!
//! Read-only projection over the two stores: for each day of a month, how many
//! slots are free and how many carry an active appointment. Owners see the
//! full picture; clients only see what they can book.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::appointment::AppointmentStore;
use crate::availability::AvailabilityStore;
use crate::error::Result;
use crate::model::{Availability, SpecialistId};
use crate::month;

/// Whose calendar is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewpoint {
    /// The workshop owner: every day present, free and occupied counts.
    Owner,
    /// A booking client: only bookable (free, not past) slots are visible.
    Client,
}

/// Free/occupied slot counts for one day of the month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCounts {
    pub free: u32,
    pub active: u32,
}

/// Read-only projector deriving calendar aggregates from the stores.
pub struct CalendarProjector {
    availability: Arc<AvailabilityStore>,
    appointments: Arc<AppointmentStore>,
}

impl CalendarProjector {
    pub fn new(availability: Arc<AvailabilityStore>, appointments: Arc<AppointmentStore>) -> Self {
        Self {
            availability,
            appointments,
        }
    }

    /// Per-day counts for one specialist and month.
    ///
    /// Owner viewpoint: every day of the month is present, days without slots
    /// with zero counts. Client viewpoint: only days with at least one
    /// bookable slot appear — occupied slots and days before `today` are
    /// invisible, and `active` is always zero.
    pub fn month_counts(
        &self,
        specialist: SpecialistId,
        year: i32,
        month: u32,
        viewpoint: Viewpoint,
        today: NaiveDate,
    ) -> Result<BTreeMap<u32, DayCounts>> {
        let (first, last) = month::month_bounds(year, month)?;
        let slots = self.availability.list(specialist, first, last)?;

        let mut counts: BTreeMap<u32, DayCounts> = BTreeMap::new();
        if viewpoint == Viewpoint::Owner {
            for day in 1..=month::days_in_month(year, month)? {
                counts.insert(day, DayCounts::default());
            }
        }

        for slot in &slots {
            let day = slot.date.day();
            let free = self.appointments.is_slot_free(slot.id)?;
            match viewpoint {
                Viewpoint::Owner => {
                    let entry = counts.entry(day).or_default();
                    if free {
                        entry.free += 1;
                    } else {
                        entry.active += 1;
                    }
                }
                Viewpoint::Client => {
                    if free && slot.date >= today {
                        counts.entry(day).or_default().free += 1;
                    }
                }
            }
        }

        Ok(counts)
    }

    /// Bookable slots on one date, ordered by start time: free of active
    /// appointments and (for clients) not in the past. This is the day-detail
    /// listing behind a calendar cell.
    pub fn free_slots_on(
        &self,
        specialist: SpecialistId,
        date: NaiveDate,
        viewpoint: Viewpoint,
        today: NaiveDate,
    ) -> Result<Vec<Availability>> {
        if viewpoint == Viewpoint::Client && date < today {
            return Ok(Vec::new());
        }
        let slots = self.availability.list(specialist, date, date)?;
        let mut free = Vec::new();
        for slot in slots {
            if self.appointments.is_slot_free(slot.id)? {
                free.push(slot);
            }
        }
        Ok(free)
    }

    /// Days of the month that have at least one slot (free or occupied),
    /// owner-side convenience for highlighting calendar cells.
    pub fn published_days(
        &self,
        specialist: SpecialistId,
        year: i32,
        month: u32,
    ) -> Result<BTreeSet<u32>> {
        let (first, last) = month::month_bounds(year, month)?;
        Ok(self
            .availability
            .list(specialist, first, last)?
            .iter()
            .map(|a| a.date.day())
            .collect())
    }
}
