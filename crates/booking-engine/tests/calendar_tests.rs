//! Tests for the calendar projection and month grid math.

use std::sync::Arc;

use booking_engine::{
    AppointmentStatus, AppointmentStore, AvailabilityStore, CalendarProjector, DayCounts,
    EditBatch, SlotEdit, SpecialistId, Viewpoint,
};
use chrono::{NaiveDate, NaiveTime, Weekday};

const MIRA: SpecialistId = SpecialistId(1);

fn t(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

struct Fixture {
    availability: Arc<AvailabilityStore>,
    appointments: Arc<AppointmentStore>,
    projector: CalendarProjector,
}

fn fixture() -> Fixture {
    let availability = Arc::new(AvailabilityStore::new());
    let appointments = Arc::new(AppointmentStore::new());
    let projector = CalendarProjector::new(Arc::clone(&availability), Arc::clone(&appointments));
    Fixture {
        availability,
        appointments,
        projector,
    }
}

impl Fixture {
    fn publish(&self, day: u32, start_hour: u32) -> booking_engine::Availability {
        let batch = EditBatch {
            edits: vec![SlotEdit {
                id: None,
                date: d(day),
                start: t(start_hour),
                end: t(start_hour + 1),
                service: None,
            }],
            deletions: vec![],
        };
        let id = self
            .availability
            .upsert_batch(MIRA, &batch, |_| Ok(false))
            .unwrap()[0];
        self.availability.get(id).unwrap().unwrap()
    }

    fn book(&self, slot: &booking_engine::Availability) {
        self.appointments
            .reserve(
                slot,
                booking_engine::ClientId(1),
                None,
                String::new(),
                AppointmentStatus::Pending,
            )
            .unwrap();
    }
}

// ── month_counts ────────────────────────────────────────────────────────────

#[test]
fn owner_counts_split_free_and_active_and_cover_every_day() {
    // Day 5: three slots, one of them booked.
    let fx = fixture();
    fx.publish(5, 9);
    fx.publish(5, 11);
    let booked = fx.publish(5, 14);
    fx.book(&booked);

    let counts = fx
        .projector
        .month_counts(MIRA, 2025, 6, Viewpoint::Owner, d(1))
        .unwrap();

    assert_eq!(counts.len(), 30, "owner view lists every day of June");
    assert_eq!(counts[&5], DayCounts { free: 2, active: 1 });
    assert_eq!(counts[&6], DayCounts { free: 0, active: 0 });
}

#[test]
fn client_counts_hide_occupied_and_empty_days() {
    let fx = fixture();
    fx.publish(5, 9);
    fx.publish(5, 11);
    let booked = fx.publish(5, 14);
    fx.book(&booked);
    let fully_booked = fx.publish(7, 9);
    fx.book(&fully_booked);

    let counts = fx
        .projector
        .month_counts(MIRA, 2025, 6, Viewpoint::Client, d(1))
        .unwrap();

    // Only day 5 appears: day 7's single slot is occupied, all other days are empty.
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[&5], DayCounts { free: 2, active: 0 });
}

#[test]
fn client_counts_hide_days_before_today() {
    let fx = fixture();
    fx.publish(5, 9);
    fx.publish(20, 9);

    let counts = fx
        .projector
        .month_counts(MIRA, 2025, 6, Viewpoint::Client, d(10))
        .unwrap();
    assert_eq!(counts.keys().copied().collect::<Vec<_>>(), vec![20]);

    // The owner still sees the past day.
    let owner = fx
        .projector
        .month_counts(MIRA, 2025, 6, Viewpoint::Owner, d(10))
        .unwrap();
    assert_eq!(owner[&5].free, 1);
}

#[test]
fn today_itself_is_still_bookable_for_clients() {
    let fx = fixture();
    fx.publish(10, 9);
    let counts = fx
        .projector
        .month_counts(MIRA, 2025, 6, Viewpoint::Client, d(10))
        .unwrap();
    assert_eq!(counts[&10].free, 1);
}

// ── free_slots_on ───────────────────────────────────────────────────────────

#[test]
fn day_listing_returns_only_free_slots_in_start_order() {
    let fx = fixture();
    let late = fx.publish(5, 15);
    let early = fx.publish(5, 9);
    let booked = fx.publish(5, 11);
    fx.book(&booked);

    let slots = fx
        .projector
        .free_slots_on(MIRA, d(5), Viewpoint::Owner, d(1))
        .unwrap();
    let ids: Vec<_> = slots.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![early.id, late.id]);
}

#[test]
fn day_listing_is_empty_for_clients_on_past_dates() {
    let fx = fixture();
    fx.publish(5, 9);
    assert!(fx
        .projector
        .free_slots_on(MIRA, d(5), Viewpoint::Client, d(10))
        .unwrap()
        .is_empty());
    assert_eq!(
        fx.projector
            .free_slots_on(MIRA, d(5), Viewpoint::Owner, d(10))
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn published_days_marks_occupied_days_too() {
    let fx = fixture();
    fx.publish(5, 9);
    let booked = fx.publish(7, 9);
    fx.book(&booked);

    let days = fx.projector.published_days(MIRA, 2025, 6).unwrap();
    assert_eq!(days.into_iter().collect::<Vec<_>>(), vec![5, 7]);
}

// ── Month grid ──────────────────────────────────────────────────────────────

#[test]
fn june_2025_grid_starting_monday() {
    // June 2025 begins on a Sunday.
    let grid = booking_engine::month_grid(2025, 6, Weekday::Mon).unwrap();
    assert_eq!(grid.len(), 6);
    assert_eq!(grid[0], [0, 0, 0, 0, 0, 0, 1]);
    assert_eq!(grid[1], [2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(grid[5], [30, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn february_leap_year_grid() {
    // February 2016: 29 days, starting on a Monday.
    let grid = booking_engine::month_grid(2016, 2, Weekday::Mon).unwrap();
    assert_eq!(grid.len(), 5);
    assert_eq!(grid[0], [1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(grid[4], [29, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn four_row_february() {
    // February 2021 starts on a Monday and has 28 days: exactly 4 full rows.
    let grid = booking_engine::month_grid(2021, 2, Weekday::Mon).unwrap();
    assert_eq!(grid.len(), 4);
    assert_eq!(grid[3], [22, 23, 24, 25, 26, 27, 28]);
}

#[test]
fn first_weekday_shifts_the_columns() {
    // June 2025 starting Sunday: day 1 lands in column 0.
    let grid = booking_engine::month_grid(2025, 6, Weekday::Sun).unwrap();
    assert_eq!(grid[0], [1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn invalid_month_is_a_validation_error() {
    assert!(booking_engine::month_grid(2025, 13, Weekday::Mon).is_err());
    assert!(booking_engine::month_bounds(2025, 0).is_err());
}

#[test]
fn month_bounds_and_day_counts() {
    let (first, last) = booking_engine::month_bounds(2025, 6).unwrap();
    assert_eq!(first, d(1));
    assert_eq!(last, d(30));
    assert_eq!(booking_engine::days_in_month(2024, 2).unwrap(), 29);
    assert_eq!(booking_engine::days_in_month(2025, 2).unwrap(), 28);
    assert_eq!(booking_engine::days_in_month(2025, 12).unwrap(), 31);
}
