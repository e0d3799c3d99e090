//! A next-tick callback observes state assigned after it was registered,
//! and runs before both the immediate and the zero-delay timer.
//!
//! Run with `RUST_LOG=phaseloop=trace` to watch the phases go by.

use phaseloop::task;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[phaseloop::main]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let greeting = Rc::new(RefCell::new(String::from("unset")));

    task::set_timeout(|| task::log("timeout"), Duration::ZERO).expect("delay is in range");
    task::set_immediate(|| task::log("immediate"));

    let observed = greeting.clone();
    task::next_tick(move || task::log(format!("next tick sees {}", observed.borrow())));

    *greeting.borrow_mut() = String::from("bar");
}
