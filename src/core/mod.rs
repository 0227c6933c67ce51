// Core modules: data model, value decoding, rendering, query building, errors.
pub mod error;
pub mod query;
pub mod render;
pub mod row;
pub mod value;
