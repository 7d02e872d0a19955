//! `depscope-edn`: Extensible Data Notation reader, printer and JSON projection.
//!
//! - `reader`: text → [`Value`] (one form or a stream of forms)
//! - `value`: the structural model and its canonical EDN printer
//! - `json`: projection of a [`Value`] onto `serde_json::Value` for logging
//!   and for handing data to JSON-speaking code

pub mod error;
pub mod json;
pub mod reader;
pub mod value;

pub use error::{ParseError, ParseErrorKind, Position};
pub use json::to_json;
pub use reader::{parse, parse_all, parse_with, ParseOptions, Reader};
pub use value::{Keyword, Symbol, Value};
