//! External-interface traits. `docket-core` defines the contract; concrete
//! adapters live in their own crates (`docket-storage` for `ObjectStore`/
//! `MetaStore`/`KV`/`Broker`, provider crates for `Llm`/`Embedder`/
//! `Reranker`) so domain logic never depends on a specific backend.

pub mod broker;
pub mod embedder;
pub mod kv;
pub mod llm;
pub mod meta_store;
pub mod object_store;
pub mod ocr_provider;
pub mod pdf_pages;
pub mod vector_index;

pub use broker::{Broker, BrokerMessage};
pub use embedder::{Embedder, Reranker};
pub use kv::KV;
pub use llm::{Llm, LlmRequest, LlmResponse};
pub use meta_store::MetaStore;
pub use object_store::ObjectStore;
pub use ocr_provider::{OcrChunkOutput, OcrProvider, RelativeBoundingBox};
pub use pdf_pages::PdfPageSource;
pub use vector_index::VectorIndex;
