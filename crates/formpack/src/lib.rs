//! Multi-format serialization engine.
//!
//! One pair of capability traits ([`Serializer`]/[`Deserializer`] with a
//! [`Visitor`] on the read side) is shared by every format backend, so a
//! value travels between formats without format-specific glue:
//!
//! - [`json`] — strict RFC 8259 text, compact or pretty
//! - [`json5`] — JSON5 input dialect (comments, trailing commas, unquoted
//!   keys, single quotes, hex integers); output is always strict JSON
//! - [`msgpack`] — MessagePack binary, shortest-form encoding
//!
//! ```
//! use formpack::json;
//!
//! let value = json::from_str(r#"{"name":"box","open":false}"#)?;
//! assert_eq!(json::to_string(&value)?, r#"{"name":"box","open":false}"#);
//! let packed = formpack::msgpack::to_vec(&value)?;
//! # let _ = packed;
//! # Ok::<(), formpack::Error>(())
//! ```
//!
//! Every backend instance serves one logical operation; the first error is
//! recorded and every later call returns it unchanged. Nesting depth is
//! bounded on both read and write ([`DEFAULT_MAX_DEPTH`]).

mod depth;
mod error;

pub mod de;
pub mod json;
pub mod json5;
pub mod msgpack;
pub mod ser;

pub use de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
pub use depth::DEFAULT_MAX_DEPTH;
pub use error::{Error, ErrorKind, Position, Result};
pub use ser::{Serialize, Serializer};
