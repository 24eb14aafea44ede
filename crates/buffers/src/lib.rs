//! Binary buffer utilities shared by the formpack format backends.

mod writer;

pub use writer::Writer;
