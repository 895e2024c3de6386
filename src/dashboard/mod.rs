pub mod format;
pub mod render;
pub mod state;

pub use state::Dashboard;
