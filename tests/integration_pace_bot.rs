// A whole race against the pace bot, the way the binary drives it:
// the bot's typed-so-far prefix is replayed into the race on each tick.

use keyrace::bot::PaceBot;
use keyrace::clock::ManualClock;
use keyrace::race::{Race, RaceResult, RaceState};

const TEXT: &str = "hello world again";

#[test]
fn player_beats_a_slow_bot() {
    let clock = ManualClock::new(0);
    let mut race = Race::schedule(["you", "bot"], TEXT, 1_000, clock.clone()).unwrap();
    let bot = PaceBot::new(TEXT, 30.0);

    clock.set(1_000);
    race.begin();

    // Replay bot progress on a 250ms cadence while the player finishes
    // after four seconds
    let mut now = 1_000;
    while race.state() == RaceState::InProgress {
        now += 250;
        clock.set(now);
        race.tick();
        let elapsed = now - race.scheduled_start_ms();
        let bot_typed = bot.typed_at(elapsed).to_string();
        race.report_typed("bot", &bot_typed).unwrap();

        if now == 5_000 {
            race.report_typed("you", TEXT).unwrap();
        }
        assert!(now < 60_000, "race should resolve well before a minute");
    }

    race.resolve();
    assert_eq!(race.participant("you").unwrap().result(), RaceResult::Win);
    assert_eq!(race.participant("bot").unwrap().result(), RaceResult::Loss);
}

#[test]
fn fast_bot_wins_when_player_stalls() {
    let clock = ManualClock::new(0);
    let mut race = Race::schedule(["you", "bot"], TEXT, 1_000, clock.clone()).unwrap();
    let bot = PaceBot::new(TEXT, 120.0);
    let eta = bot.eta_ms().unwrap();

    clock.set(1_000);
    race.begin();

    let mut now = 1_000;
    loop {
        now += 250;
        clock.set(now);
        race.tick();
        let elapsed = now - race.scheduled_start_ms();
        race.report_typed("bot", bot.typed_at(elapsed).to_string().as_str())
            .unwrap();
        if race.participant("bot").unwrap().session().has_finished() {
            break;
        }
    }

    // Bot finished on schedule; the player limps in later
    assert!(now - 1_000 <= eta + 250);
    clock.set(now + 10_000);
    race.report_typed("you", TEXT).unwrap();

    race.resolve();
    assert_eq!(race.participant("bot").unwrap().result(), RaceResult::Win);
    assert_eq!(race.participant("you").unwrap().result(), RaceResult::Loss);
}
