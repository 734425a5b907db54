pub mod config;
pub mod error;
pub mod message;
pub mod paths;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use message::{DispatchReply, DispatchRequest, StageEvent, TransportMessage};
pub use paths::Paths;
