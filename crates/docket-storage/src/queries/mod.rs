//! Free-function CRUD per table. `engine.rs` wires these into the
//! `MetaStore` trait.

pub mod bounding_boxes;
pub mod chunks;
pub mod citations;
pub mod documents;
pub mod entities;
pub mod findings;
pub mod jobs;
pub mod matters;
pub mod timeline;
pub mod vector_search;
