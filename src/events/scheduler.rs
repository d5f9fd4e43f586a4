//! Event scheduling
//!
//! Picks the events of a run and places them on the stream timeline:
//!
//! ```text
//! CandidatesLoaded → Selected → Delayed → Manifested
//! ```
//!
//! In automatic mode `amount` events are drawn at random and spread over the
//! stream. Each is separated from its predecessor by the minimum distance
//! plus a random share of the slack (`limit - (duration + amount * distance)`
//! minutes); every share is taken out of the slack, so the last event still
//! ends inside the stream. Manual mode applies a fixed delay to a hand-picked
//! set.

use crate::events::curve::Event;
use crate::events::error::{EventError, EventResult};
use crate::util::{format_record_date, random_between, sample_indices};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Placement settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleOptions {
    pub automatic: bool,
    pub amount: usize,
    pub min_distance_minutes: u32,
    pub duration_minutes: u32,
    /// Length of the generated stream
    pub limit_minutes: u32,
    /// Ids placed in manual mode, empty for every candidate
    pub manual: Vec<String>,
    pub manual_delay_minutes: u32,
}

/// Progress of a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePhase {
    CandidatesLoaded,
    Selected,
    Delayed,
    Manifested,
}

/// One scheduled event as recorded in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "@id")]
    pub id: String,
    /// Minutes between the previous event start (or stream start) and this one
    pub delay_to_pre_event: i64,
    /// Epoch second of the event start
    pub start_epoch: i64,
    /// Selected terms joined by `", "`
    pub terms: String,
    /// Human-readable start
    pub start_string: String,
}

impl ManifestEntry {
    pub fn for_event(event: &Event, delay_minutes: i64) -> Self {
        Self {
            id: event.id().to_string(),
            delay_to_pre_event: delay_minutes,
            start_epoch: event.event_start(),
            terms: event.terms().join(", "),
            start_string: format_record_date(event.event_start() * 1000),
        }
    }

    /// Terms as a list
    pub fn term_list(&self) -> Vec<&str> {
        self.terms
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Placed events with their manifest entries, in stream order
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub events: Vec<Event>,
    pub entries: Vec<ManifestEntry>,
}

/// Places candidate events on the timeline
#[derive(Debug)]
pub struct EventScheduler {
    options: ScheduleOptions,
    phase: SchedulePhase,
}

impl EventScheduler {
    pub fn new(options: ScheduleOptions) -> Self {
        Self {
            options,
            phase: SchedulePhase::CandidatesLoaded,
        }
    }

    pub fn phase(&self) -> SchedulePhase {
        self.phase
    }

    /// Minutes left after the minimum layout
    pub fn tolerance_minutes(&self) -> i64 {
        i64::from(self.options.limit_minutes) - self.required_minutes()
    }

    fn required_minutes(&self) -> i64 {
        i64::from(self.options.duration_minutes)
            + self.options.amount as i64 * i64::from(self.options.min_distance_minutes)
    }

    /// Select and delay events
    ///
    /// Fails before touching any candidate if the layout cannot fit.
    pub fn schedule<R: Rng + ?Sized>(&mut self, candidates: Vec<Event>, rng: &mut R) -> EventResult<Schedule> {
        let selected = if self.options.automatic {
            self.select_random(candidates, rng)?
        } else {
            self.select_manual(candidates)?
        };
        self.phase = SchedulePhase::Selected;

        let schedule = if self.options.automatic {
            self.delay_random(selected, rng)
        } else {
            self.delay_fixed(selected)
        };
        self.phase = SchedulePhase::Delayed;

        for entry in &schedule.entries {
            tracing::info!(
                event = %entry.id,
                delay_minutes = entry.delay_to_pre_event,
                start = %entry.start_string,
                "Scheduled event"
            );
        }
        self.phase = SchedulePhase::Manifested;

        Ok(schedule)
    }

    fn select_random<R: Rng + ?Sized>(&self, candidates: Vec<Event>, rng: &mut R) -> EventResult<Vec<Event>> {
        let amount = self.options.amount;
        if amount > candidates.len() {
            return Err(EventError::NotEnoughCandidates {
                requested: amount,
                available: candidates.len(),
            });
        }

        if self.tolerance_minutes() < 0 {
            return Err(EventError::InfeasibleSchedule {
                amount,
                min_distance: self.options.min_distance_minutes,
                duration: self.options.duration_minutes,
                required: self.required_minutes(),
                limit: self.options.limit_minutes,
            });
        }

        let mut slots: Vec<Option<Event>> = candidates.into_iter().map(Some).collect();
        Ok(sample_indices(rng, slots.len(), amount)
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect())
    }

    fn select_manual(&self, candidates: Vec<Event>) -> EventResult<Vec<Event>> {
        if self.options.manual.is_empty() {
            return Ok(candidates);
        }

        let mut slots: Vec<Option<Event>> = candidates.into_iter().map(Some).collect();
        self.options
            .manual
            .iter()
            .map(|id| {
                slots
                    .iter_mut()
                    .find(|slot| slot.as_ref().is_some_and(|event| event.id() == id))
                    .and_then(Option::take)
                    .ok_or_else(|| EventError::UnknownEvent(id.clone()))
            })
            .collect()
    }

    fn delay_random<R: Rng + ?Sized>(&self, events: Vec<Event>, rng: &mut R) -> Schedule {
        let min_distance = i64::from(self.options.min_distance_minutes);
        let mut remaining = self.tolerance_minutes();
        let mut schedule = Schedule::default();

        for mut event in events {
            let random = random_between(rng, 0, remaining);
            let gap = min_distance + random;

            let delay = match schedule.events.last() {
                None => gap * 60,
                Some(previous) => previous.event_start() - event.event_start() + gap * 60,
            };
            event.set_start_delay(delay);

            schedule.entries.push(ManifestEntry::for_event(&event, gap));
            schedule.events.push(event);
            remaining -= random;
        }

        schedule
    }

    fn delay_fixed(&self, events: Vec<Event>) -> Schedule {
        let default_delay = i64::from(self.options.manual_delay_minutes) * 60;
        let mut schedule = Schedule::default();

        for mut event in events {
            let delay = event.fixed_delay().unwrap_or(default_delay);
            event.set_start_delay(delay);

            schedule.entries.push(ManifestEntry::for_event(&event, delay / 60));
            schedule.events.push(event);
        }

        schedule
    }
}
