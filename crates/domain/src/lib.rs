//! image-relay domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `extract`: Image-URL classification over upstream submission shapes
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Application use cases / business logic

pub mod extract;
pub mod model;
pub mod ports;
pub mod usecases;

pub use extract::*;
pub use model::*;
pub use ports::*;
