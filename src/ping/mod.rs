pub use exec::Executor;
pub use exec::Options;
pub use exec::Reply;
pub use exec::Status;
pub use ping::Pinger;

mod exec;
mod io;
mod ping;
mod probe;
mod sock4;
mod sock6;
mod state;
