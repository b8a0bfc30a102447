pub mod carry;
pub mod codec;
pub mod dictionary;
pub mod envelope;
pub mod error;
pub mod schema;
pub mod table;
pub mod tables;
pub mod value;

pub use crate::envelope::Envelope;
pub use crate::error::{Error, Result};
pub use crate::table::{Record, Table};
pub use crate::value::Value;

#[cfg(test)]
mod tests;
