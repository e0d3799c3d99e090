use phaseloop::time::{Clock, MAX_DELAY, VirtualClock};
use phaseloop::{Error, PhaseScheduler, SchedulerBuilder, Source};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

struct RecordingClock {
    now: Duration,
    jumps: Rc<RefCell<Vec<Duration>>>,
}

impl Clock for RecordingClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn advance_to(&mut self, instant: Duration) {
        self.jumps.borrow_mut().push(instant);
        self.now = self.now.max(instant);
    }
}

#[test]
fn clock_can_start_late() {
    let scheduler = SchedulerBuilder::new()
        .clock(VirtualClock::starting_at(Duration::from_millis(100)))
        .build();

    assert_eq!(scheduler.now(), Duration::from_millis(100));

    scheduler
        .schedule_timer(|s| s.log("timer"), Duration::from_millis(5))
        .unwrap();

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.find("timer").unwrap().at, Duration::from_millis(105));
}

#[test]
fn custom_clock_only_jumps_to_known_events() {
    let jumps = Rc::new(RefCell::new(Vec::new()));

    let scheduler = SchedulerBuilder::new()
        .clock(RecordingClock {
            now: Duration::ZERO,
            jumps: jumps.clone(),
        })
        .build();

    scheduler
        .schedule_timer(|s| s.log("first"), Duration::from_millis(10))
        .unwrap();
    scheduler
        .schedule_timer(|s| s.log("second"), Duration::from_millis(30))
        .unwrap();

    scheduler.run().unwrap();

    assert_eq!(
        *jumps.borrow(),
        [Duration::from_millis(10), Duration::from_millis(30)]
    );
}

#[test]
fn coarse_timer_resolution_delays_zero_timers() {
    let scheduler = SchedulerBuilder::new()
        .timer_resolution(Duration::from_millis(5))
        .build();

    scheduler
        .schedule_timer(|s| s.log("zero"), Duration::ZERO)
        .unwrap();
    scheduler
        .schedule_timer(|s| s.log("three"), Duration::from_millis(3))
        .unwrap();

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["zero", "three"]);
    assert!(summary.log.iter().all(|e| e.at == Duration::from_millis(5)));
}

#[test]
fn max_delay_is_accepted_and_beyond_is_rejected() {
    let scheduler = PhaseScheduler::new();

    let handle = scheduler.schedule_timer(|_| {}, MAX_DELAY).unwrap();
    handle.cancel().unwrap();

    let err = scheduler
        .schedule_timer(|_| {}, MAX_DELAY + Duration::from_millis(1))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let err = scheduler
        .schedule_interval(|_| {}, Duration::MAX)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn run_from_a_callback_is_reentrant() {
    let scheduler = PhaseScheduler::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    scheduler.schedule_immediate({
        let seen = seen.clone();
        move |s| {
            seen.borrow_mut().push(s.run().unwrap_err().error);
            seen.borrow_mut().push(s.block_on(|_| {}).unwrap_err().error);
            s.log("still running");
        }
    });

    let summary = scheduler.run().unwrap();

    assert_eq!(*seen.borrow(), [Error::Reentrant, Error::Reentrant]);
    assert_eq!(summary.messages(), ["still running"]);
}

#[test]
fn scheduler_can_run_again_after_finishing() {
    let scheduler = PhaseScheduler::new();

    scheduler
        .schedule_timer(|s| s.log("first run"), Duration::from_millis(10))
        .unwrap();
    let first = scheduler.run().unwrap();

    scheduler
        .schedule_timer(|s| s.log("second run"), Duration::from_millis(10))
        .unwrap();
    let second = scheduler.run().unwrap();

    assert_eq!(first.messages(), ["first run"]);
    assert_eq!(second.messages(), ["second run"]);
    assert_eq!(second.find("second run").unwrap().at, Duration::from_millis(20));
    assert_eq!(second.clock, Duration::from_millis(20));
}

#[test]
fn summary_display_lists_entries_and_totals() {
    let scheduler = PhaseScheduler::new();

    scheduler.schedule_immediate(|s| s.log("hello"));

    let summary = scheduler.run().unwrap();
    let rendered = summary.to_string();

    assert!(rendered.contains("hello"));
    assert!(rendered.contains("check"));
    assert!(rendered.ends_with("-- idle after 1 tick(s) at 0ns\n"));

    let entry = summary.find("hello").unwrap();
    assert_eq!(entry.phase.name(), "check");
    assert_eq!(entry.source.name(), "immediate");
    assert_eq!(Source::NextTick.to_string(), "next-tick");
}

#[test]
#[should_panic(expected = "microtask_limit must be > 0")]
fn zero_microtask_limit_panics() {
    SchedulerBuilder::new().microtask_limit(0);
}

#[test]
#[should_panic(expected = "timer_resolution must be > 0")]
fn zero_timer_resolution_panics() {
    SchedulerBuilder::new().timer_resolution(Duration::ZERO);
}

#[phaseloop::test(microtask_limit = 3)]
fn attribute_options_reach_the_builder(scheduler: PhaseScheduler) {
    scheduler.schedule_immediate(|s| {
        for n in 0..4 {
            s.schedule_microtask(move |s| s.log(format!("micro {n}")));
        }
    });

    let err = scheduler.run().unwrap_err();

    assert_eq!(err.error, Error::Starvation { limit: 3 });
    assert_eq!(err.summary.log.len(), 3);
}

#[phaseloop::test(max_ticks = 1_000, poll_budget_ms = 250, timer_resolution_ms = 2)]
fn attribute_accepts_several_options(scheduler: PhaseScheduler) {
    scheduler
        .schedule_timer(|s| s.log("timer"), Duration::ZERO)
        .unwrap();

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.find("timer").unwrap().at, Duration::from_millis(2));
}

#[test]
fn unbounded_poll_budget_blocks_straight_to_the_next_timer() {
    let scheduler = SchedulerBuilder::new().poll_budget(Duration::MAX).build();

    scheduler
        .schedule_timer(|s| s.log("first"), Duration::from_millis(5))
        .unwrap();
    scheduler
        .schedule_timer(|s| s.log("second"), Duration::from_millis(10))
        .unwrap();

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["first", "second"]);
    assert_eq!(summary.find("second").unwrap().at, Duration::from_millis(10));
}

#[test]
fn huge_startup_cost_saturates_the_clock() {
    let scheduler = SchedulerBuilder::new().startup_cost(Duration::MAX).build();

    scheduler
        .schedule_timer(
            |s| {
                s.log("timer");
                s.schedule_timer(|s| s.log("follow-up"), Duration::from_millis(10))
                    .unwrap();
            },
            Duration::from_millis(5),
        )
        .unwrap();

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["timer", "follow-up"]);
    assert_eq!(summary.clock, Duration::MAX);
}

#[test]
fn deadlines_saturate_at_the_end_of_time() {
    let scheduler = SchedulerBuilder::new()
        .clock(VirtualClock::starting_at(Duration::MAX))
        .build();

    scheduler
        .schedule_timer(|s| s.log("timer"), Duration::from_millis(5))
        .unwrap();
    scheduler
        .schedule_io(|s| s.log("io"), Duration::from_millis(5))
        .unwrap();

    let summary = scheduler.run().unwrap();

    assert_eq!(summary.messages(), ["timer", "io"]);
    assert!(summary.log.iter().all(|e| e.at == Duration::MAX));
}

#[test]
#[should_panic(expected = "timer_resolution must not exceed MAX_DELAY")]
fn timer_resolution_beyond_max_delay_panics() {
    SchedulerBuilder::new().timer_resolution(Duration::MAX);
}
