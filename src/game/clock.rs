//! Phase clock: current phase plus an elapsed-tick counter

use crate::game::provider::MatchConfiguration;
use crate::game::schedule::{CountdownSchedule, ScheduleStep};
use crate::types::Phase;

/// Result of advancing the clock by one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockStep {
    /// Lobby with nobody in it; elapsed is pinned at 0
    Held,
    /// Terminal phase, nothing changed
    Inert,
    /// Elapsed advanced within the phase
    Advanced { announcement: Option<String> },
    /// Phase changed and elapsed was reset
    Transitioned {
        from: Phase,
        to: Phase,
        announcement: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct PhaseClock {
    phase: Phase,
    elapsed_ticks: u64,
    lobby: CountdownSchedule,
    walls: CountdownSchedule,
}

impl PhaseClock {
    pub fn new(lobby: CountdownSchedule, walls: CountdownSchedule) -> Self {
        Self {
            phase: Phase::Lobby,
            elapsed_ticks: 0,
            lobby,
            walls,
        }
    }

    /// Clock using the standard lobby and walls countdowns for `config`
    pub fn for_config(config: &MatchConfiguration) -> Self {
        Self::new(
            CountdownSchedule::lobby(config),
            CountdownSchedule::walls(config),
        )
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    /// Schedule driving the current phase, if it is a countdown phase
    pub fn schedule(&self) -> Option<&CountdownSchedule> {
        match self.phase {
            Phase::Lobby => Some(&self.lobby),
            Phase::Active => Some(&self.walls),
            _ => None,
        }
    }

    /// Advance one tick. The schedule is consulted at the current elapsed
    /// value before it is incremented, so the first tick of a countdown sees
    /// offset 0.
    pub fn tick(&mut self, roster_empty: bool) -> ClockStep {
        match self.phase {
            Phase::WallsDown => ClockStep::Inert,
            Phase::Lobby if roster_empty => {
                self.elapsed_ticks = 0;
                ClockStep::Held
            }
            Phase::TeamAssign => self.transition(Phase::Staging, None),
            Phase::Staging => self.transition(Phase::Active, None),
            Phase::Lobby | Phase::Active => {
                let schedule = if self.phase == Phase::Lobby {
                    &self.lobby
                } else {
                    &self.walls
                };
                match schedule.step(self.elapsed_ticks) {
                    ScheduleStep::Complete { message, target } => {
                        let message = message.to_string();
                        self.transition(target, Some(message))
                    }
                    ScheduleStep::Announce(message) => {
                        let announcement = Some(message.to_string());
                        self.elapsed_ticks += 1;
                        ClockStep::Advanced { announcement }
                    }
                    ScheduleStep::Idle => {
                        self.elapsed_ticks += 1;
                        ClockStep::Advanced { announcement: None }
                    }
                }
            }
        }
    }

    fn transition(&mut self, to: Phase, announcement: Option<String>) -> ClockStep {
        let from = self.phase;
        self.phase = to;
        self.elapsed_ticks = 0;
        ClockStep::Transitioned {
            from,
            to,
            announcement,
        }
    }
}
