use crate::clock::SharedClock;
use crate::session::{MetricsSnapshot, Session};
use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RaceError {
    #[error("scheduled start {scheduled_ms}ms is not after now ({now_ms}ms)")]
    InvalidSchedule { scheduled_ms: u64, now_ms: u64 },
    #[error("unknown participant `{0}`")]
    UnknownParticipant(String),
}

/// Relative outcome of one participant, `Pending` until resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum RaceResult {
    Pending,
    Win,
    Loss,
    Draw,
    Abandoned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaceState {
    Countdown,
    InProgress,
    Resolved,
}

#[derive(Debug)]
pub struct Participant {
    id: String,
    session: Session,
    result: RaceResult,
    abandoned: bool,
}

impl Participant {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn result(&self) -> RaceResult {
        self.result
    }
}

/// Final per-participant line of a resolved (or in-flight) race.
#[derive(Clone, Debug, PartialEq)]
pub struct Standing {
    pub id: String,
    pub result: RaceResult,
    pub snapshot: MetricsSnapshot,
}

/// A group of sessions sharing one synchronized start instant.
///
/// All participant sessions use the scheduled start as their timing base,
/// so elapsed values are comparable regardless of when the countdown
/// signal actually arrives at each input stream. The race stays queryable
/// after resolution; the caller drops it to tear it down.
pub struct Race {
    clock: SharedClock,
    scheduled_start_ms: u64,
    participants: Vec<Participant>,
    begun: bool,
}

impl std::fmt::Debug for Race {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Race")
            .field("scheduled_start_ms", &self.scheduled_start_ms)
            .field("participants", &self.participants)
            .field("begun", &self.begun)
            .finish()
    }
}

impl Race {
    /// Create a race with one fresh session per participant, all loaded
    /// with `text`. The start must be strictly in the future.
    pub fn schedule<I, S>(
        ids: I,
        text: &str,
        scheduled_start_ms: u64,
        clock: SharedClock,
    ) -> Result<Self, RaceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now_ms = clock.now_ms();
        if scheduled_start_ms <= now_ms {
            return Err(RaceError::InvalidSchedule {
                scheduled_ms: scheduled_start_ms,
                now_ms,
            });
        }

        // Join order is preserved; duplicate ids collapse to the first
        let participants = ids
            .into_iter()
            .map(Into::into)
            .unique()
            .map(|id| {
                let mut session = Session::new(clock.clone());
                session.load_text(text);
                Participant {
                    id,
                    session,
                    result: RaceResult::Pending,
                    abandoned: false,
                }
            })
            .collect();

        Ok(Self {
            clock,
            scheduled_start_ms,
            participants,
            begun: false,
        })
    }

    pub fn scheduled_start_ms(&self) -> u64 {
        self.scheduled_start_ms
    }

    /// Milliseconds until the shared start, zero once due.
    pub fn countdown_remaining_ms(&self) -> u64 {
        self.scheduled_start_ms.saturating_sub(self.clock.now_ms())
    }

    pub fn state(&self) -> RaceState {
        if self.clock.now_ms() < self.scheduled_start_ms {
            return RaceState::Countdown;
        }
        let all_done = self
            .participants
            .iter()
            .filter(|p| !p.abandoned)
            .all(|p| p.session.has_finished());
        if all_done {
            RaceState::Resolved
        } else {
            RaceState::InProgress
        }
    }

    /// Countdown-elapsed signal. Starts every session at the shared
    /// scheduled instant rather than the signal's arrival time.
    /// Idempotent.
    pub fn begin(&mut self) {
        if self.begun {
            return;
        }
        self.begun = true;
        let start = self.scheduled_start_ms;
        for p in &mut self.participants {
            p.session.start_at(start);
        }
    }

    /// True once `begin` should be (or has been) delivered.
    pub fn countdown_elapsed(&self) -> bool {
        self.clock.now_ms() >= self.scheduled_start_ms
    }

    /// Forward a participant's typed-so-far value to its session.
    /// Input from an abandoned participant is dropped.
    pub fn report_typed(&mut self, participant_id: &str, new_typed: &str) -> Result<(), RaceError> {
        let p = self.participant_mut(participant_id)?;
        if !p.abandoned {
            p.session.update_typed(new_typed);
        }
        Ok(())
    }

    /// Refresh elapsed for every active session. Driven by the scheduler.
    pub fn tick(&mut self) {
        for p in &mut self.participants {
            if !p.abandoned {
                p.session.tick();
            }
        }
    }

    /// Mark a participant as having left mid-race. They are treated as
    /// never-finished and excluded from ranking.
    pub fn abandon(&mut self, participant_id: &str) -> Result<(), RaceError> {
        let p = self.participant_mut(participant_id)?;
        p.abandoned = true;
        p.result = RaceResult::Abandoned;
        Ok(())
    }

    /// Rank participants and assign results once every active session has
    /// finished. Recomputes from live session state on each call, so it is
    /// idempotent and reflects the latest finish order.
    ///
    /// Ranking: elapsed ascending, ties broken by accuracy descending,
    /// then join order. The unique best gets `Win`; everyone tied with the
    /// best on both keys shares `Draw`; the rest get `Loss`.
    pub fn resolve(&mut self) -> Vec<Standing> {
        let active_done = self
            .participants
            .iter()
            .filter(|p| !p.abandoned)
            .all(|p| p.session.has_finished());

        if active_done {
            let ranked: Vec<(usize, u64, f64)> = self
                .participants
                .iter()
                .enumerate()
                .filter(|(_, p)| !p.abandoned)
                .map(|(join_idx, p)| {
                    let snap = p.session.snapshot();
                    (join_idx, snap.elapsed_millis, snap.accuracy)
                })
                .sorted_by(|a, b| {
                    a.1.cmp(&b.1)
                        .then_with(|| b.2.total_cmp(&a.2))
                        .then_with(|| a.0.cmp(&b.0))
                })
                .collect();

            if let Some(&(_, best_elapsed, best_accuracy)) = ranked.first() {
                let tied_with_best = ranked
                    .iter()
                    .filter(|&&(_, e, a)| e == best_elapsed && a == best_accuracy)
                    .count();

                for &(join_idx, elapsed, accuracy) in &ranked {
                    let tied = elapsed == best_elapsed && accuracy == best_accuracy;
                    self.participants[join_idx].result = if tied && tied_with_best == 1 {
                        RaceResult::Win
                    } else if tied {
                        RaceResult::Draw
                    } else {
                        RaceResult::Loss
                    };
                }
            }
        }

        self.standings()
    }

    /// Current per-participant results and metrics, in join order.
    pub fn standings(&self) -> Vec<Standing> {
        self.participants
            .iter()
            .map(|p| Standing {
                id: p.id.clone(),
                result: p.result,
                snapshot: p.session.snapshot(),
            })
            .collect()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    fn participant_mut(&mut self, participant_id: &str) -> Result<&mut Participant, RaceError> {
        self.participants
            .iter_mut()
            .find(|p| p.id == participant_id)
            .ok_or_else(|| RaceError::UnknownParticipant(participant_id.to_string()))
    }
}
