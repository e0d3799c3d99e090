//! A read whose completion is reported from outside the loop. Inside the
//! completion callback, the immediate always beats the zero-delay timer.

use phaseloop::{CompletionSink, PhaseScheduler};
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let scheduler = PhaseScheduler::new();

    let read = scheduler.schedule_io_pending(|s| {
        s.log("read finished");

        s.schedule_timer(|s| s.log("timeout"), Duration::ZERO)
            .expect("delay is in range");
        s.schedule_immediate(|s| s.log("immediate"));
    });

    // Simulated disk: the data shows up after 25 ms.
    scheduler
        .schedule_timer(
            move |s| {
                s.log("disk interrupt");
                if let Err(err) = s.mark_ready(&read) {
                    s.log(format!("late completion: {err}"));
                }
            },
            Duration::from_millis(25),
        )
        .expect("delay is in range");

    match scheduler.run() {
        Ok(summary) => print!("{summary}"),
        Err(err) => {
            print!("{}", err.summary);
            eprintln!("{err}");
        }
    }
}
