//! Core roaming logic.
//!
//! This module contains the scanner, the connection state machine, the
//! roaming loop that drives them, profile loading, and shutdown handling.

pub mod controller;
pub mod profiles;
pub mod roaming;
pub mod scan;
pub mod shutdown;
