pub mod errors;
pub mod id;

pub use errors::{ConfigError, WebTtyError};
pub use id::{new_id, ConnectionId};
