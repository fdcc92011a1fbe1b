//! Report module - presenting and exporting evaluation results

pub mod export;
pub mod summary;

pub use export::*;
pub use summary::*;
