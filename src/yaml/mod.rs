//! YAML documents - the on-disk format of boards, lists and cards

pub mod diagnostics;
pub mod document;

pub use diagnostics::CodecError;
pub use document::{decode, encode, Record, BODY_KEY};
