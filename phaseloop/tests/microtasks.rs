use phaseloop::{Error, PhaseScheduler, SchedulerBuilder, Source};
use std::time::Duration;

fn chain(s: &PhaseScheduler, n: usize, total: usize) {
    s.log(format!("micro {n}"));

    if n < total {
        s.schedule_microtask(move |s| chain(s, n + 1, total));
    }
}

#[test]
fn microtasks_run_between_callbacks_of_one_phase() {
    let scheduler = PhaseScheduler::new();

    scheduler
        .schedule_timer(
            |s| {
                s.log("first timer");
                s.schedule_microtask(|s| s.log("microtask"));
            },
            Duration::from_millis(5),
        )
        .unwrap();
    scheduler
        .schedule_timer(|s| s.log("second timer"), Duration::from_millis(5))
        .unwrap();

    let summary = scheduler.run().unwrap();

    assert_eq!(
        summary.messages(),
        ["first timer", "microtask", "second timer"]
    );

    let microtask = summary.find("microtask").unwrap();
    assert_eq!(microtask.source, Source::Microtask);
    assert_eq!(microtask.tick, summary.find("first timer").unwrap().tick);
}

#[test]
fn microtasks_drain_after_every_kind_of_callback() {
    let scheduler = PhaseScheduler::new();

    scheduler
        .schedule_io(
            |s| {
                s.log("io");
                s.schedule_microtask(|s| s.log("after io"));
            },
            Duration::ZERO,
        )
        .unwrap();
    scheduler.schedule_immediate(|s| {
        s.log("immediate");
        s.schedule_microtask(|s| s.log("after immediate"));
    });
    scheduler.schedule_immediate(|s| s.log("second immediate"));
    scheduler.schedule_close(|s| {
        s.log("close");
        s.schedule_microtask(|s| s.log("after close"));
    });

    let summary = scheduler.run().unwrap();

    assert_eq!(
        summary.messages(),
        [
            "io",
            "after io",
            "immediate",
            "after immediate",
            "second immediate",
            "close",
            "after close",
        ]
    );
}

#[test]
fn chained_microtasks_all_run_before_next_callback() {
    let scheduler = PhaseScheduler::new();

    scheduler.schedule_immediate(|s| {
        s.log("a");
        s.schedule_microtask(|s| chain(s, 1, 100));
    });
    scheduler.schedule_immediate(|s| s.log("b"));

    let summary = scheduler.run().unwrap();
    let messages = summary.messages();

    assert_eq!(messages.len(), 102);
    assert_eq!(messages[0], "a");
    assert_eq!(messages[1], "micro 1");
    assert_eq!(messages[100], "micro 100");
    assert_eq!(messages[101], "b");
}

#[test]
fn drain_of_exactly_the_limit_succeeds() {
    let scheduler = SchedulerBuilder::new().microtask_limit(100).build();

    scheduler.schedule_immediate(|s| s.schedule_microtask(|s| chain(s, 1, 100)));
    scheduler.schedule_immediate(|s| s.log("after"));

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.log.len(), 101);
    assert_eq!(summary.messages().last(), Some(&"after"));
}

#[test]
fn drain_beyond_the_limit_starves() {
    let scheduler = SchedulerBuilder::new().microtask_limit(100).build();

    scheduler.schedule_immediate(|s| {
        s.log("a");
        s.schedule_microtask(|s| chain(s, 1, 101));
    });
    scheduler.schedule_immediate(|s| s.log("b"));

    let err = scheduler.run().unwrap_err();

    assert_eq!(err.error, Error::Starvation { limit: 100 });
    assert_eq!(err.summary.log.len(), 101, "The log up to the halt is kept");
    assert_eq!(err.summary.messages()[0], "a");
    assert!(err.summary.find("micro 101").is_none());
    assert!(err.summary.find("b").is_none());
}

#[test]
fn recursive_next_tick_in_script_starves_before_first_tick() {
    fn spin(s: &PhaseScheduler) {
        s.next_tick(spin);
    }

    let scheduler = SchedulerBuilder::new().microtask_limit(1_000).build();

    let err = scheduler
        .block_on(|s| {
            s.schedule_immediate(|s| s.log("never"));
            s.next_tick(spin);
        })
        .unwrap_err();

    assert_eq!(err.error, Error::Starvation { limit: 1_000 });
    assert_eq!(err.summary.ticks, 0);
    assert!(err.summary.log.is_empty());
    assert!(err.to_string().contains("did not drain within 1000 callbacks"));
}

#[test]
fn next_tick_lane_runs_before_microtask_lane() {
    let scheduler = PhaseScheduler::new();

    scheduler.schedule_microtask(|s| s.log("promise"));
    scheduler.next_tick(|s| s.log("tick"));

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["tick", "promise"]);
    assert_eq!(summary.find("tick").unwrap().source, Source::NextTick);
    assert_eq!(summary.find("promise").unwrap().source, Source::Microtask);
}

#[test]
fn next_tick_from_next_tick_keeps_priority() {
    let scheduler = PhaseScheduler::new();

    scheduler.next_tick(|s| {
        s.log("t1");
        s.schedule_microtask(|s| s.log("m1"));
        s.next_tick(|s| s.log("t2"));
    });

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["t1", "t2", "m1"]);
}

#[test]
fn next_tick_from_microtask_waits_for_microtask_lane() {
    let scheduler = PhaseScheduler::new();

    scheduler.schedule_microtask(|s| {
        s.log("m1");
        s.next_tick(|s| s.log("t1"));
        s.schedule_microtask(|s| s.log("m2"));
    });

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["m1", "m2", "t1"]);
}
