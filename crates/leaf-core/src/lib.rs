//! Core types and utilities for the leaf disease training pipeline.
//!
//! This crate provides the foundational types shared by the dataset, model
//! and training crates: the error type, the pipeline configuration, logging
//! setup and backend selection.

pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use backend::*;
pub use config::*;
pub use error::{Error, Result};
pub use types::*;
