//! tenk-core - Core types and traits for 10-K filing chunking
//!
//! This crate provides the document and chunk records, configuration,
//! error handling and the collaborator traits shared by the chunking
//! engine and the batch coordinator.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{Result, TenkError};
pub use traits::*;
pub use types::*;
