//! Microtasks queued by an immediate run to exhaustion, chained ones
//! included, before the loop reaches the timer.

use phaseloop::task;
use std::time::Duration;

#[phaseloop::main]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    task::set_timeout(|| task::log("timeout"), Duration::ZERO).expect("delay is in range");

    task::set_immediate(|| {
        task::log("immediate");

        task::next_tick(|| {
            task::log("tick 1");
            task::next_tick(|| {
                task::log("tick 2");
                task::next_tick(|| task::log("tick 3"));
            });
        });
    });

    task::next_tick(|| task::log("next tick"));
}
