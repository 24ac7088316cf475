// Race flows driven end to end on a manual clock, covering the
// countdown gate, shared start instant, ranking and tie-break rules.

use assert_matches::assert_matches;
use keyrace::clock::ManualClock;
use keyrace::race::{Race, RaceError, RaceResult, RaceState};

const TEXT: &str = "the quick brown fox";

#[test]
fn race_scheduled_in_past_is_rejected() {
    let clock = ManualClock::new(60_000);
    let err = Race::schedule(["a", "b"], TEXT, 1_000, clock).unwrap_err();
    assert_matches!(err, RaceError::InvalidSchedule { .. });
}

#[test]
fn full_race_with_distinct_finishes() {
    let clock = ManualClock::new(0);
    let mut race = Race::schedule(["alice", "bob"], TEXT, 2_000, clock.clone()).unwrap();

    assert_eq!(race.state(), RaceState::Countdown);

    clock.set(2_000);
    race.begin();
    assert_eq!(race.state(), RaceState::InProgress);

    // alice types in two chunks, bob in one slower chunk
    clock.set(4_000);
    race.report_typed("alice", "the quick ").unwrap();
    clock.set(6_000);
    race.report_typed("alice", TEXT).unwrap();
    clock.set(9_000);
    race.report_typed("bob", TEXT).unwrap();

    assert_eq!(race.state(), RaceState::Resolved);
    let standings = race.resolve();

    let alice = standings.iter().find(|s| s.id == "alice").unwrap();
    let bob = standings.iter().find(|s| s.id == "bob").unwrap();
    assert_eq!(alice.result, RaceResult::Win);
    assert_eq!(bob.result, RaceResult::Loss);
    assert_eq!(alice.snapshot.elapsed_millis, 4_000);
    assert_eq!(bob.snapshot.elapsed_millis, 7_000);
}

#[test]
fn identical_elapsed_and_accuracy_is_a_full_draw() {
    let clock = ManualClock::new(0);
    let mut race = Race::schedule(["a", "b"], TEXT, 1_000, clock.clone()).unwrap();

    clock.set(1_000);
    race.begin();
    clock.set(6_000);
    race.report_typed("a", TEXT).unwrap();
    race.report_typed("b", TEXT).unwrap();

    for standing in race.resolve() {
        assert_eq!(standing.result, RaceResult::Draw);
        assert_eq!(standing.snapshot.elapsed_millis, 5_000);
    }
}

#[test]
fn equal_elapsed_resolves_on_accuracy() {
    let clock = ManualClock::new(0);
    let mut race = Race::schedule(["a", "b"], TEXT, 1_000, clock.clone()).unwrap();

    clock.set(1_000);
    race.begin();

    // b fumbles the first character before correcting it
    race.report_typed("b", "x").unwrap();
    race.report_typed("b", "").unwrap();

    clock.set(5_000);
    race.report_typed("a", TEXT).unwrap();
    race.report_typed("b", TEXT).unwrap();

    race.resolve();
    assert_eq!(race.participant("a").unwrap().result(), RaceResult::Win);
    assert_eq!(race.participant("b").unwrap().result(), RaceResult::Loss);
}

#[test]
fn late_begin_signal_still_uses_scheduled_start() {
    let clock = ManualClock::new(0);
    let mut race = Race::schedule(["a", "b"], TEXT, 1_000, clock.clone()).unwrap();

    // The countdown-elapsed signal is delivered half a second late
    clock.set(1_500);
    race.begin();
    clock.set(4_000);
    race.report_typed("a", TEXT).unwrap();

    // Elapsed counts from the scheduled instant, not signal delivery
    assert_eq!(
        race.participant("a").unwrap().session().elapsed_ms(),
        3_000
    );
}

#[test]
fn disconnecting_participant_is_excluded_but_listed() {
    let clock = ManualClock::new(0);
    let mut race = Race::schedule(["a", "b", "c"], TEXT, 1_000, clock.clone()).unwrap();

    clock.set(1_000);
    race.begin();
    clock.set(2_000);
    race.report_typed("c", "the qu").unwrap();
    race.abandon("c").unwrap();

    clock.set(5_000);
    race.report_typed("a", TEXT).unwrap();
    race.report_typed("b", TEXT).unwrap();

    let standings = race.resolve();
    assert_eq!(standings.len(), 3);
    let c = standings.iter().find(|s| s.id == "c").unwrap();
    assert_eq!(c.result, RaceResult::Abandoned);

    // Both finishers tie, so the abandoned entry never promotes one to Win
    let a = standings.iter().find(|s| s.id == "a").unwrap();
    let b = standings.iter().find(|s| s.id == "b").unwrap();
    assert_eq!(a.result, RaceResult::Draw);
    assert_eq!(b.result, RaceResult::Draw);
}

#[test]
fn resolve_reflects_latest_state_until_torn_down() {
    let clock = ManualClock::new(0);
    let mut race = Race::schedule(["a", "b"], TEXT, 1_000, clock.clone()).unwrap();

    clock.set(1_000);
    race.begin();
    clock.set(3_000);
    race.report_typed("a", TEXT).unwrap();

    // Not resolvable yet
    let pending = race.resolve();
    assert!(pending.iter().all(|s| s.result == RaceResult::Pending));

    clock.set(4_000);
    race.report_typed("b", TEXT).unwrap();
    let resolved = race.resolve();
    assert_eq!(
        resolved.iter().find(|s| s.id == "a").unwrap().result,
        RaceResult::Win
    );

    // Re-calling keeps returning the same verdict
    assert_eq!(race.resolve(), resolved);
}

#[test]
fn unknown_participant_reported_loudly() {
    let clock = ManualClock::new(0);
    let mut race = Race::schedule(["a"], TEXT, 1_000, clock.clone()).unwrap();

    assert_matches!(
        race.report_typed("ghost", "x"),
        Err(RaceError::UnknownParticipant(id)) if id == "ghost"
    );
    assert_matches!(
        race.abandon("ghost"),
        Err(RaceError::UnknownParticipant(_))
    );
}
