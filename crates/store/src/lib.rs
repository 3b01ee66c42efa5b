//! Store - Durable key/value storage and settings
//!
//! This crate provides the text key/value storage that offline state is
//! mirrored into, in-memory and file-backed, plus the application settings
//! file.

mod error;
mod kv;
mod settings;

pub use error::*;
pub use kv::*;
pub use settings::*;
