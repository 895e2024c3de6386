pub mod machine;
pub mod manager;
pub mod state;
pub mod transport;

pub use machine::{Event, Phase};
pub use manager::{ConnectionManager, Frontend};
pub use state::StatusUpdate;
pub use transport::{Transport, WsTransport};
