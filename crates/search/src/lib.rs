//! Secondary indexes for latticekv: the inverted word index and the
//! embedding table. Both are pure forward derivations
//! of the primary map — neither is ever persisted, both are rebuilt by
//! iterating the primary map during recovery.

pub mod embedding;
pub mod index;
pub mod tokenizer;

pub use embedding::EmbeddingTable;
pub use index::InvertedIndex;
