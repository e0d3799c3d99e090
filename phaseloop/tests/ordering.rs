use phaseloop::{Phase, PhaseScheduler, Source};
use std::time::Duration;

#[test]
fn shorter_delay_fires_first() {
    let scheduler = PhaseScheduler::new();

    for (name, delay) in [
        ("late", 30),
        ("early", 10),
        ("zero", 0),
        ("middle", 20),
        ("one", 1),
    ] {
        scheduler
            .schedule_timer(move |s| s.log(name), Duration::from_millis(delay))
            .unwrap();
    }

    let summary = scheduler.run().unwrap();

    assert_eq!(
        summary.messages(),
        ["zero", "one", "early", "middle", "late"],
        "Timers should fire in deadline order"
    );
}

#[test]
fn equal_deadlines_fire_in_registration_order() {
    let scheduler = PhaseScheduler::new();

    for name in ["a", "b", "c", "d"] {
        scheduler
            .schedule_timer(move |s| s.log(name), Duration::from_millis(5))
            .unwrap();
    }

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["a", "b", "c", "d"]);
    assert!(
        summary.log.iter().all(|entry| entry.tick == summary.log[0].tick),
        "Timers with the same deadline should fire in the same timers phase"
    );
}

#[test]
fn immediates_run_before_delayed_timers() {
    let scheduler = PhaseScheduler::new();

    scheduler
        .schedule_timer(|s| s.log("timer"), Duration::from_millis(1))
        .unwrap();

    for name in ["first", "second", "third"] {
        scheduler.schedule_immediate(move |s| s.log(name));
    }

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["first", "second", "third", "timer"]);
}

#[test]
fn entries_record_phase_source_and_time() {
    let scheduler = PhaseScheduler::new();

    scheduler
        .schedule_timer(|s| s.log("timer"), Duration::from_millis(5))
        .unwrap();
    scheduler
        .schedule_io(|s| s.log("io"), Duration::from_millis(2))
        .unwrap();
    scheduler.schedule_immediate(|s| s.log("immediate"));
    scheduler.schedule_close(|s| s.log("close"));

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["immediate", "close", "io", "timer"]);

    let timer = summary.find("timer").unwrap();
    assert_eq!(timer.phase, Phase::Timers);
    assert_eq!(timer.source, Source::Timer);
    assert_eq!(timer.at, Duration::from_millis(5));

    let io = summary.find("io").unwrap();
    assert_eq!(io.phase, Phase::Poll);
    assert_eq!(io.source, Source::Io);
    assert_eq!(io.at, Duration::from_millis(2));

    let immediate = summary.find("immediate").unwrap();
    assert_eq!(immediate.phase, Phase::Check);
    assert_eq!(immediate.tick, 1);

    let close = summary.find("close").unwrap();
    assert_eq!(close.phase, Phase::Close);
    assert_eq!(close.source, Source::Close);

    assert_eq!(summary.clock, Duration::from_millis(5));
    assert_eq!(scheduler.phase(), Phase::Idle);
}

#[test]
fn zero_delay_timer_from_timer_waits_for_next_pass() {
    let scheduler = PhaseScheduler::new();

    scheduler
        .schedule_timer(
            |s| {
                s.log("outer");
                s.schedule_timer(|s| s.log("inner"), Duration::ZERO).unwrap();
                s.schedule_immediate(|s| s.log("immediate"));
            },
            Duration::ZERO,
        )
        .unwrap();

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["outer", "immediate", "inner"]);
    assert!(summary.find("inner").unwrap().tick > summary.find("outer").unwrap().tick);
}

#[test]
fn immediate_from_check_phase_waits_for_next_tick() {
    let scheduler = PhaseScheduler::new();

    scheduler.schedule_immediate(|s| {
        s.log("first");
        s.schedule_immediate(|s| s.log("second"));
    });
    scheduler.schedule_close(|s| s.log("close"));

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["first", "close", "second"]);
    assert_eq!(summary.find("first").unwrap().tick, 1);
    assert_eq!(summary.find("second").unwrap().tick, 2);
}

#[test]
fn empty_scheduler_is_idle_immediately() {
    let scheduler = PhaseScheduler::new();

    assert!(scheduler.is_idle());

    let summary = scheduler.run().unwrap();

    assert!(summary.log.is_empty());
    assert_eq!(summary.ticks, 0);
    assert_eq!(summary.clock, Duration::ZERO);
}
