//! `bookctl` — inspect and exercise a booking-engine schedule from the
//! command line.
//!
//! The schedule lives in a JSON snapshot file (specialists, services, clients,
//! availability, appointments). Mutating commands rewrite the file; read-only
//! commands print to stdout.
//!
//! ## Usage
//!
//! ```sh
//! # Print the weekday-aligned day grid for a month
//! bookctl grid --year 2025 --month 6
//!
//! # Free/active counts per day, as the owner or a client sees them
//! bookctl counts -i schedule.json --specialist 1 --year 2025 --month 6 --view owner
//!
//! # Validate a batch of slot edits against the stored schedule
//! bookctl check -i schedule.json --specialist 1 --batch edits.json
//!
//! # Apply a batch (rewrites the snapshot on success)
//! bookctl apply -i schedule.json --specialist 1 --batch edits.json
//!
//! # Reserve a slot for a client
//! bookctl reserve -i schedule.json --specialist 1 --slot 2 --client 1 --today 2025-06-01
//! ```

use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, Weekday};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use booking_engine::{
    Actor, Appointment, AppointmentStore, Availability, AvailabilityId, AvailabilityStore,
    BookingEngine, BookingError, CalendarProjector, ClientId, ClientProfile, EditBatch,
    MemoryCatalog, MemoryClientDirectory, Service, SpecialistId, Viewpoint,
};

#[derive(Parser)]
#[command(name = "bookctl", version, about = "Booking schedule inspector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Owner,
    Client,
}

impl From<ViewArg> for Viewpoint {
    fn from(v: ViewArg) -> Self {
        match v {
            ViewArg::Owner => Viewpoint::Owner,
            ViewArg::Client => Viewpoint::Client,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum WeekdayArg {
    Mon,
    Sun,
}

impl From<WeekdayArg> for Weekday {
    fn from(w: WeekdayArg) -> Self {
        match w {
            WeekdayArg::Mon => Weekday::Mon,
            WeekdayArg::Sun => Weekday::Sun,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the weekday-aligned day grid for a month
    Grid {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        /// First column of the grid
        #[arg(long, value_enum, default_value = "mon")]
        first_weekday: WeekdayArg,
    },
    /// Per-day free/active slot counts for a specialist's month
    Counts {
        /// Schedule snapshot file
        #[arg(short, long)]
        input: String,
        #[arg(long)]
        specialist: u64,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long, value_enum, default_value = "owner")]
        view: ViewArg,
        /// Reference date for the client view (defaults to the local date)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Validate a batch of slot edits without applying it
    Check {
        #[arg(short, long)]
        input: String,
        #[arg(long)]
        specialist: u64,
        /// JSON file holding an edit batch ({"edits": [...], "deletions": [...]})
        #[arg(long)]
        batch: String,
    },
    /// Apply a batch of slot edits and rewrite the snapshot
    Apply {
        #[arg(short, long)]
        input: String,
        #[arg(long)]
        specialist: u64,
        #[arg(long)]
        batch: String,
    },
    /// Reserve a free slot for a client and rewrite the snapshot
    Reserve {
        #[arg(short, long)]
        input: String,
        #[arg(long)]
        specialist: u64,
        /// Availability id to reserve
        #[arg(long)]
        slot: u64,
        /// Booking client id (must exist in the snapshot)
        #[arg(long)]
        client: u64,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

/// The on-disk schedule snapshot.
#[derive(Serialize, Deserialize)]
struct ScheduleFile {
    specialists: Vec<booking_engine::Specialist>,
    services: Vec<Service>,
    clients: Vec<ClientProfile>,
    availability: Vec<Availability>,
    appointments: Vec<Appointment>,
}

struct LoadedSchedule {
    availability: Arc<AvailabilityStore>,
    appointments: Arc<AppointmentStore>,
    clients: Arc<MemoryClientDirectory>,
    engine: BookingEngine<MemoryCatalog, Arc<MemoryClientDirectory>>,
    /// Workshop owning each specialist, for resolving the owner actor.
    specialists: Vec<booking_engine::Specialist>,
    services: Vec<Service>,
}

fn load_schedule(path: &str) -> Result<LoadedSchedule> {
    let raw = fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
    let file: ScheduleFile =
        serde_json::from_str(&raw).with_context(|| format!("{path} is not a valid snapshot"))?;

    let availability = Arc::new(
        AvailabilityStore::from_rows(file.availability)
            .context("snapshot violates the availability invariant")?,
    );
    let appointments = Arc::new(
        AppointmentStore::from_rows(file.appointments)
            .context("snapshot violates the appointment invariant")?,
    );
    let catalog = MemoryCatalog::new(file.specialists.clone(), file.services.clone());
    let clients = Arc::new(MemoryClientDirectory::new(file.clients));

    let engine = BookingEngine::new(
        Arc::clone(&availability),
        Arc::clone(&appointments),
        catalog,
        Arc::clone(&clients),
    );
    Ok(LoadedSchedule {
        availability,
        appointments,
        clients,
        engine,
        specialists: file.specialists,
        services: file.services,
    })
}

impl LoadedSchedule {
    /// The owner actor for a specialist, resolved from the snapshot.
    fn owner_of(&self, specialist: SpecialistId) -> Result<Actor> {
        let s = self
            .specialists
            .iter()
            .find(|s| s.id == specialist)
            .with_context(|| format!("specialist {specialist} is not in the snapshot"))?;
        Ok(Actor::WorkshopOwner(s.workshop))
    }

    fn save(&self, path: &str) -> Result<()> {
        let file = ScheduleFile {
            specialists: self.specialists.clone(),
            services: self.services.clone(),
            clients: self.clients.snapshot()?,
            availability: self.availability.snapshot()?,
            appointments: self.appointments.snapshot()?,
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(path, json).with_context(|| format!("cannot write {path}"))?;
        Ok(())
    }
}

fn read_batch(path: &str) -> Result<EditBatch> {
    let raw = fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("{path} is not a valid edit batch"))
}

fn local_today(arg: Option<NaiveDate>) -> NaiveDate {
    arg.unwrap_or_else(|| Local::now().date_naive())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Grid {
            year,
            month,
            first_weekday,
        } => {
            let grid = booking_engine::month_grid(year, month, first_weekday.into())?;
            for row in grid {
                let line: Vec<String> = row
                    .iter()
                    .map(|&d| {
                        if d == 0 {
                            "  .".to_string()
                        } else {
                            format!("{d:3}")
                        }
                    })
                    .collect();
                println!("{}", line.join(" "));
            }
        }

        Commands::Counts {
            input,
            specialist,
            year,
            month,
            view,
            today,
        } => {
            let schedule = load_schedule(&input)?;
            let projector = CalendarProjector::new(
                Arc::clone(&schedule.availability),
                Arc::clone(&schedule.appointments),
            );
            let counts = projector.month_counts(
                SpecialistId(specialist),
                year,
                month,
                view.into(),
                local_today(today),
            )?;
            for (day, c) in counts {
                println!("day {day:2}: free={} active={}", c.free, c.active);
            }
        }

        Commands::Check {
            input,
            specialist,
            batch,
        } => {
            let schedule = load_schedule(&input)?;
            let specialist = SpecialistId(specialist);
            let owner = schedule.owner_of(specialist)?;
            let batch = read_batch(&batch)?;
            match schedule.engine.edit_schedule(owner, specialist, &batch) {
                Ok(applied) => {
                    // Validation only: the snapshot is not written back.
                    println!("batch ok: {} slot(s) would be applied", applied.len());
                }
                Err(BookingError::Conflict(errors)) => {
                    for e in &errors {
                        eprintln!("conflict: {e}");
                    }
                    bail!("batch rejected with {} error(s)", errors.len());
                }
                Err(other) => return Err(other.into()),
            }
        }

        Commands::Apply {
            input,
            specialist,
            batch,
        } => {
            let schedule = load_schedule(&input)?;
            let specialist = SpecialistId(specialist);
            let owner = schedule.owner_of(specialist)?;
            let batch = read_batch(&batch)?;
            match schedule.engine.edit_schedule(owner, specialist, &batch) {
                Ok(applied) => {
                    schedule.save(&input)?;
                    println!("applied {} slot(s)", applied.len());
                }
                Err(BookingError::Conflict(errors)) => {
                    for e in &errors {
                        eprintln!("conflict: {e}");
                    }
                    bail!("batch rejected with {} error(s)", errors.len());
                }
                Err(other) => return Err(other.into()),
            }
        }

        Commands::Reserve {
            input,
            specialist,
            slot,
            client,
            notes,
            today,
        } => {
            let schedule = load_schedule(&input)?;
            let appt = schedule.engine.reserve_slot(
                Actor::Client(ClientId(client)),
                SpecialistId(specialist),
                AvailabilityId(slot),
                notes,
                local_today(today),
            )?;
            schedule.save(&input)?;
            println!(
                "reserved slot {} for client {}: appointment {} ({})",
                appt.availability, appt.client, appt.id, appt.status
            );
        }
    }

    Ok(())
}
