pub use barrier::{Barrier, Gate, Phase};
pub use cancel::Cancel;
pub use config::Config;
pub use report::{Column, Round};
pub use sched::Scheduler;
pub use target::{Sample, Target, MAX_PAYLOAD};
pub use worker::Worker;

mod barrier;
mod cancel;
mod config;
mod report;
mod sched;
mod target;
mod worker;
