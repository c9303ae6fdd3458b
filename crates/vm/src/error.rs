//! Defines the error types of the crate.
//!
//! Failures are split by the phase in which they occur:
//!
//! - [`LoadError`] is returned while building a [`Program`](crate::program::Program) from one of
//!   its serialized forms. No part of a program that failed to load is ever executed.
//!
//! - [`Error`] is returned by the execution engine and terminates the current run.

use thiserror::Error;

/// The input of a [`ByteReader`](crate::loader::ByteReader) ended before the requested number
/// of bytes could be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("truncated input: wanted {wanted} bytes at offset {offset}, {remaining} remaining")]
pub struct TruncatedInput {
    /// The offset of the read that failed.
    pub offset: usize,
    /// The number of bytes that were requested.
    pub wanted: usize,
    /// The number of bytes that were left in the input.
    pub remaining: usize,
}

/// An error that might occur when loading a g1 program.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The first two bytes of a binary program were not the ASCII bytes `g1`.
    #[error("invalid signature {0:#06x}, expected 0x6731 (\"g1\")")]
    InvalidSignature(u16),
    /// A binary program ended before all of its sections could be read.
    #[error("invalid binary: {0}")]
    InvalidBinary(#[from] TruncatedInput),
    /// An instruction used an opcode that has no implementation.
    ///
    /// This includes the reserved `setch` opcode.
    #[error("instruction {index}: unsupported opcode {opcode}")]
    UnsupportedOpcode {
        /// The index of the offending instruction.
        index: usize,
        /// The raw opcode.
        opcode: u8,
    },
    /// An argument of a binary instruction was neither a literal nor an address.
    #[error("instruction {index}: unknown argument kind {kind}")]
    UnknownArgumentKind {
        /// The index of the offending instruction.
        index: usize,
        /// The raw argument kind.
        kind: u8,
    },
    /// An instruction of a JSON program was malformed.
    #[error("instruction {index}: {reason}")]
    InvalidProgram {
        /// The index of the offending instruction.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
    /// A required field of a JSON program was absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    /// A program field held a value outside of its allowed range.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// The name of the field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },
    /// A data entry would write outside of the declared memory.
    #[error("data entry at address {address} with {length} values does not fit in {memory_size} cells")]
    DataOutOfBounds {
        /// The first address of the entry.
        address: i64,
        /// The number of values in the entry.
        length: usize,
        /// The declared memory size of the program.
        memory_size: usize,
    },
    /// The input was not a valid JSON document of the expected shape.
    #[error("malformed JSON program: {0}")]
    Json(#[from] serde_json::Error),
}

/// An error that might occur when executing a g1 program.
///
/// Any of these terminates the current run. The memory and surface keep whatever the
/// instructions executed before the failure wrote to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// An instruction read or wrote a memory cell outside of `[0, memory_size)`.
    #[error("tried to access out of bounds memory at address {address}")]
    OutOfBounds {
        /// The offending address.
        address: i32,
    },
    /// A `div` or `mod` instruction had a zero divisor.
    #[error("division by zero at instruction {pc}")]
    DivisionByZero {
        /// The index of the offending instruction.
        pc: usize,
    },
}
