//! A next-tick callback that keeps re-queueing itself never lets the loop
//! reach its phases. The run stops at the configured bound instead of
//! hanging.

use phaseloop::{Error, PhaseScheduler, SchedulerBuilder};
use std::time::Duration;

fn spin(scheduler: &PhaseScheduler) {
    scheduler.next_tick(spin);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let scheduler = SchedulerBuilder::new().microtask_limit(10_000).build();

    scheduler
        .schedule_io(|s| s.log("read finished"), Duration::from_millis(1))
        .expect("latency is in range");
    scheduler.schedule_immediate(|s| {
        s.log("immediate");
        s.next_tick(spin);
    });

    match scheduler.run() {
        Ok(summary) => print!("{summary}"),
        Err(err) => {
            print!("{}", err.summary);

            if let Error::Starvation { limit } = err.error {
                println!("-- starved: {limit} next-tick callbacks and the read never ran");
            }
        }
    }
}
