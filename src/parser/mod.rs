// Parsers for textual cell values

pub mod date;
pub mod lexer;

// Public API re-exports
pub use date::{looks_like_date, parse_date_shape, DateShape};
