//! Declaration readers used by the model builder.
//!
//! - `literal`: object-literal call arguments (no evaluation).
//! - `source`: comment masking, literal and class extraction.
//! - `schema`: model files into schema entities.
//! - `migration`: migration files into migration records.

pub mod literal;
pub mod migration;
pub mod schema;
pub mod source;
