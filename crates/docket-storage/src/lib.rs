//! # docket-storage
//!
//! Reference implementations of the `docket-core` external-interface
//! traits: a `rusqlite` `MetaStore` (single write connection, WAL mode,
//! FTS5-indexed chunk content), a filesystem `ObjectStore`, an in-memory
//! `KV`, and an in-memory `Broker`.

pub mod broker;
mod err;
pub mod engine;
pub mod kv;
pub mod migrations;
pub mod object_store;
pub mod pool;
pub mod queries;
mod ser;

pub use broker::InMemoryBroker;
pub use engine::StorageEngine;
pub use kv::InMemoryKv;
pub use object_store::FilesystemObjectStore;
