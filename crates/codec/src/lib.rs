//! ## TWAMP / TWAMP-Light wire framing
//!
//! Bit-exact encode/decode for the UDP test packets (Sender->Reflector,
//! Reflector->Sender) and the TCP control-channel frames exchanged during
//! session setup. No socket or scheduling logic lives here — this crate only
//! turns bytes into fields and back.

pub mod control;
pub mod error;
pub mod packet;
pub mod timestamp;

pub use error::{Error, Result};
