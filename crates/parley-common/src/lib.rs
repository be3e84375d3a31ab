pub mod errors;
pub mod events;
pub mod id;

pub use errors::{ConfigError, ParleyError, StorageError};
pub use events::{Event, EventBus};
pub use id::{new_turn_id, new_id, SessionId};
