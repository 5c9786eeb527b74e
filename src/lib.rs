//! Folio: Ordinal-Ordered Document Tree Engine
//!
//! A hierarchical document store in which every sibling carries an explicit
//! ordinal. Listings sort by ordinal with a case-insensitive name
//! tie-break; mutations keep ordinals unique per directory, gaps allowed.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod ops;
pub mod ordinal;
pub mod path;
pub mod storage;
pub mod tooling;
pub mod tree;
pub mod types;
