//! Access layer for row-oriented values.
//!
//! This module provides the data shapes that flow through the query layer:
//!
//! - **KvPair**: A row drawn from the key-value store
//! - **Column**: One byte-serialized output value of a projected tuple
//! - **Value**: Dynamically tagged scalar produced by expression evaluation
//! - **DataType**: Declared return type of an expression node
//!
//! Values carry their tag at runtime so comparators and JSON navigation can
//! dispatch on it with exhaustive matches.

pub mod tuple;
pub mod value;

pub use tuple::{Column, KvPair};
pub use value::{DataType, Value};
