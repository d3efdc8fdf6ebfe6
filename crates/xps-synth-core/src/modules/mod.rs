pub mod dataset;
pub mod export;
pub mod reference;
pub mod sampler;
pub mod serialization;
pub mod storage;
pub mod synthesis;

mod traits;

pub use traits::{DatasetExporter, DocumentStore, ReferenceSource};
