//! Declarative countdown schedules
//!
//! A schedule maps tick offsets within a phase to announcements and ends with
//! a single entry at the phase duration that names the next phase. The lobby
//! countdown and the walls countdown are the same shape and differ only in the
//! opening line, the final line and the target phase.

use crate::game::provider::MatchConfiguration;
use crate::types::Phase;
use crate::utils::seconds_to_ticks;
use std::collections::BTreeMap;

/// Seconds-before-the-end marks announced as bare numbers
const FINAL_SECONDS: [u64; 8] = [30, 15, 10, 5, 4, 3, 2, 1];

/// What the schedule says about one tick offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStep<'a> {
    /// Nothing scheduled at this offset
    Idle,
    /// Broadcast this message
    Announce(&'a str),
    /// Broadcast the final message and move to `target`
    Complete { message: &'a str, target: Phase },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownSchedule {
    announcements: BTreeMap<u64, String>,
    duration: u64,
    final_message: String,
    target: Phase,
}

impl CountdownSchedule {
    /// Empty schedule completing after `duration` ticks
    pub fn new(duration: u64, final_message: impl Into<String>, target: Phase) -> Self {
        Self {
            announcements: BTreeMap::new(),
            duration,
            final_message: final_message.into(),
            target,
        }
    }

    /// Add an announcement. Offsets at or past the duration are ignored since
    /// the final entry owns that tick.
    pub fn with_announcement(mut self, offset: u64, message: impl Into<String>) -> Self {
        if offset < self.duration {
            self.announcements.insert(offset, message.into());
        }
        self
    }

    /// The standard countdown: `opening` at offset 0, then every remaining
    /// whole minute, then 30, 15, 10 and 5 to 1 seconds before the end.
    pub fn standard(
        seconds: u64,
        ticks_per_second: u64,
        opening: impl Into<String>,
        final_message: impl Into<String>,
        target: Phase,
    ) -> Self {
        let at = |second: u64| seconds_to_ticks(second, ticks_per_second);
        let mut schedule = Self::new(at(seconds), final_message, target)
            .with_announcement(0, opening);

        for minutes_left in (1..=seconds / 60).rev() {
            let left = minutes_left * 60;
            if left < seconds {
                schedule = schedule.with_announcement(at(seconds - left), describe(left));
            }
        }
        for left in FINAL_SECONDS {
            if left < seconds {
                schedule = schedule.with_announcement(at(seconds - left), left.to_string());
            }
        }
        schedule
    }

    /// Pre-match countdown ending with "Start!"
    pub fn lobby(config: &MatchConfiguration) -> Self {
        let seconds = config.lobby_countdown_seconds;
        Self::standard(
            seconds,
            config.ticks_per_second,
            describe(seconds),
            "Start!",
            Phase::TeamAssign,
        )
    }

    /// In-match countdown ending with "Walls go down!"
    pub fn walls(config: &MatchConfiguration) -> Self {
        let seconds = config.walls_countdown_seconds;
        Self::standard(
            seconds,
            config.ticks_per_second,
            format!("Walls will go down in {}!", describe(seconds)),
            "Walls go down!",
            Phase::WallsDown,
        )
    }

    /// Look up the tick at `offset` within the phase
    pub fn step(&self, offset: u64) -> ScheduleStep<'_> {
        if offset == self.duration {
            return ScheduleStep::Complete {
                message: &self.final_message,
                target: self.target,
            };
        }
        match self.announcements.get(&offset) {
            Some(message) => ScheduleStep::Announce(message),
            None => ScheduleStep::Idle,
        }
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn target(&self) -> Phase {
        self.target
    }

    pub fn final_message(&self) -> &str {
        &self.final_message
    }

    /// Scheduled announcements in offset order, excluding the final entry
    pub fn announcements(&self) -> impl Iterator<Item = (u64, &str)> {
        self.announcements
            .iter()
            .map(|(offset, message)| (*offset, message.as_str()))
    }
}

/// "5 minutes", "1 minute", "30 seconds"
fn describe(seconds: u64) -> String {
    if seconds % 60 == 0 {
        match seconds / 60 {
            1 => "1 minute".to_string(),
            minutes => format!("{} minutes", minutes),
        }
    } else if seconds == 1 {
        "1 second".to_string()
    } else {
        format!("{} seconds", seconds)
    }
}
