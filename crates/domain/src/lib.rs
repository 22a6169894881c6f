//! phrasecast domain crate
//!
//! Core logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `naming`: Artifact file naming and ordering rules
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Generation, selection, publication and scheduling

pub mod model;
pub mod naming;
pub mod ports;
pub mod usecases;

pub use model::*;
pub use ports::*;
