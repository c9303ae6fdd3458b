//! Loading of g1 programs from their serialized forms.
//!
//! Two formats exist: a human-authored [JSON form](json) and the compact [g1b binary
//! form](binary). Both produce a [`Program`] along with the [`Memory`] a fresh run starts with.

use std::path::Path;

use crate::error::LoadError;
use crate::memory::Memory;
use crate::program::Program;

pub mod binary;
pub mod json;
mod reader;

pub use self::binary::{encode_binary, load_binary, SIGNATURE};
pub use self::json::{load_json, load_json_value};
pub use self::reader::ByteReader;

/// The serialized form of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// The g1b binary format.
    Binary,
    /// The JSON format.
    Json,
}

impl Format {
    /// The file extension of g1b programs.
    pub const BINARY_EXTENSION: &'static str = "g1b";

    /// Guesses the format of a program file from its extension.
    ///
    /// Files ending in `.g1b` are binary, anything else is assumed to be JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext == Self::BINARY_EXTENSION => Format::Binary,
            _ => Format::Json,
        }
    }
}

/// Loads a program from `bytes` in the given `format`.
pub fn load(bytes: &[u8], format: Format) -> Result<(Program, Memory), LoadError> {
    match format {
        Format::Binary => load_binary(bytes),
        Format::Json => load_document_bytes(bytes),
    }
}

fn load_document_bytes(bytes: &[u8]) -> Result<(Program, Memory), LoadError> {
    load_json_value(serde_json::from_slice(bytes)?)
}
