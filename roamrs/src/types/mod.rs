//! Type definitions and constants.
//!
//! This module contains the program names, file naming, and timing
//! constants used by the agent.

pub(crate) mod constants;
