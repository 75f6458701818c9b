//! Multi-exchange book merge and best-venue selection

pub mod aggregated;

pub use aggregated::{AggregatedOrderBook, Book, BookLevel};
