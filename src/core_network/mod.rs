pub mod control;
pub mod error;
pub mod network;
pub mod pasv;
pub mod port;
pub mod registry;
pub mod transfer;

pub use control::ControlChannel;
pub use error::TransferError;
pub use registry::{Departure, ServerStats, SessionEntry, SessionRegistry};
pub use transfer::{DataStream, TransferHandler};
