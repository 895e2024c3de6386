pub mod commands;
pub mod form;
pub mod runner;
pub mod session;

pub use runner::{run_interactive, run_quote};
pub use session::Session;
