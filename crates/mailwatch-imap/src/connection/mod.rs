//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, connect timeout)
//! - Implicit-TLS transport
//! - Cancel-safe framed I/O for the IMAP protocol
//! - Type-state connection wrapper
//! - IDLE support for real-time notifications

mod client;
mod config;
mod framed;
mod idle;
mod stream;

pub use client::{Authenticated, Client, NotAuthenticated, Selected};
pub use config::{Config, IMAPS_PORT};
pub use framed::{FramedStream, ResponseAccumulator};
pub use idle::{IdleEvent, IdleHandle};
pub use stream::{ImapStream, connect, connect_tls, create_tls_connector};
