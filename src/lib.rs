#![allow(clippy::module_inception, clippy::redundant_field_names)]

pub use ping::Executor;
pub use ping::Options;
pub use ping::Pinger;
pub use ping::Reply;
pub use ping::Status;

pub use round::Cancel;
pub use round::Config;
pub use round::Round;
pub use round::Scheduler;

pub mod icmp;
pub mod ping;
pub mod round;
