//! Core traits for wifiwatch
//!
//! This module defines the interfaces of the two external collaborators.
//!
//! - [`NetworkScanner`]: List the wireless networks currently visible
//! - [`MessageTransport`]: Send texts to recipients and fetch inbound messages

pub mod scanner;
pub mod transport;

pub use scanner::NetworkScanner;
pub use transport::{MessageTransport, InboundUpdate, InboundMessage, ReplyKeyboard, RecipientId};
