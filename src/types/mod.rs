//! Core value types shared by the scanner and its collaborators.

mod port;
mod protocol;

pub use port::PortSet;
pub use protocol::Protocol;
