//! Public API module.
//!
//! This module contains the data model, errors, and configuration for the
//! `roamrs` crate.

pub mod config;
pub mod models;
