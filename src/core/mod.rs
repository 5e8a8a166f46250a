//! Core request-shaping modules
//!
//! This module contains configuration, constants, logging, model
//! classification, parameter formatting, and message normalization.

pub mod classifier;
pub mod config;
pub mod constants;
pub mod formatter;
pub mod logging;
pub mod normalizer;
