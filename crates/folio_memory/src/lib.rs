//! Per-project semantic vector memory.
//!
//! [`VectorIndex`] is the plain data structure: records in insertion order,
//! cosine ranking, and source-level replacement. [`VectorMemory`] wraps an
//! index in a read-write lock together with the embedding capability so
//! queries can run concurrently while a replacement is applied as one step.
//!
//! # Examples
//!
//! ```
//! use folio_core::RecordSource;
//! use folio_memory::VectorIndex;
//!
//! let mut index = VectorIndex::default();
//! index.insert(RecordSource::Architecture, 0, "The sea", vec![1.0, 0.0]).unwrap();
//! index.insert(RecordSource::Chapter(1), 0, "The lamp", vec![0.0, 1.0]).unwrap();
//!
//! let hits = index.rank(&[0.9, 0.1], 5, |_| true).unwrap();
//! assert_eq!(hits[0].record.text, "The sea");
//! assert_eq!(hits.len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod index;
mod memory;

pub use chunk::chunk_text;
pub use index::{VectorIndex, cosine_similarity};
pub use memory::VectorMemory;
