//! Defines the [`Program`] type, the static part of a loaded g1 program.
//!
//! Both loaders parse their input into a [`RawProgram`] and converge on
//! [`RawProgram::assemble`], which performs every validation that does not depend on the
//! serialized form.

use num_traits::ToPrimitive;

use crate::error::LoadError;
use crate::instr::Instruction;
use crate::loader;
use crate::memory::Memory;

/// The raw encoding of a missing entry point.
pub const NO_ENTRY_POINT: i32 = -1;

/// Metadata declared by a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Meta {
    /// The number of memory cells of the program.
    pub memory_size: usize,
    /// The width of the surface, in pixels.
    pub width: u16,
    /// The height of the surface, in pixels.
    pub height: u16,
    /// The number of ticks per second.
    pub tickrate: u16,
}

impl Meta {
    /// Returns the target duration of a tick in milliseconds, or `None` if the tick rate is zero.
    pub fn frame_interval_ms(&self) -> Option<u32> {
        match self.tickrate {
            0 => None,
            rate => Some(1000 / u32::from(rate)),
        }
    }
}

/// A block of values copied to memory before the program starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataEntry {
    /// The address of the first value.
    pub address: usize,
    /// The values to write at consecutive addresses.
    pub values: Vec<i32>,
}

/// A loaded g1 program.
///
/// A [`Program`] never changes once loaded and may be shared by any number of runs; the mutable
/// state lives in [`Memory`] and in the [`Cpu`](crate::cpu::Cpu).
///
/// # Invariants
///
/// Every value of the program fits in its binary encoding: the memory size and the entry points
/// fit in an `i32`, the instruction count and data entries fit in a `u32`, and every data entry
/// lies within the declared memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    start: Option<usize>,
    tick: Option<usize>,
    meta: Meta,
    data: Vec<DataEntry>,
}

impl Program {
    /// Returns the instructions of the program.
    #[inline(always)]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the index of the instruction run once before the first tick, if any.
    #[inline(always)]
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    /// Returns the index of the instruction run on every tick, if any.
    #[inline(always)]
    pub fn tick(&self) -> Option<usize> {
        self.tick
    }

    /// Returns the metadata declared by the program.
    #[inline(always)]
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Returns the data entries of the program.
    #[inline(always)]
    pub fn data(&self) -> &[DataEntry] {
        &self.data
    }

    /// Creates the memory of a fresh run: zeroed cells with the data entries copied in.
    pub fn initial_memory(&self) -> Memory {
        let mut memory = Memory::new(self.meta.memory_size);
        let cells = memory.as_mut_slice();
        for entry in &self.data {
            // Bounds were validated when the program was assembled.
            cells[entry.address..entry.address + entry.values.len()].copy_from_slice(&entry.values);
        }
        memory
    }

    /// Serializes the program to the g1b binary format.
    pub fn to_g1b(&self) -> Vec<u8> {
        loader::encode_binary(self)
    }
}

/// The unvalidated parts of a program, as found in one of its serialized forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProgram {
    /// The instructions of the program.
    pub instructions: Vec<Instruction>,
    /// The start entry point, or [`NO_ENTRY_POINT`].
    pub start: i32,
    /// The tick entry point, or [`NO_ENTRY_POINT`].
    pub tick: i32,
    /// The declared number of memory cells.
    pub memory_size: i32,
    /// The width of the surface.
    pub width: u16,
    /// The height of the surface.
    pub height: u16,
    /// The number of ticks per second.
    pub tickrate: u16,
    /// Data entries as `(address, values)` pairs.
    pub data: Vec<(i64, Vec<i32>)>,
}

impl RawProgram {
    /// Creates a [`RawProgram`] with no entry points and no data.
    pub fn new(instructions: Vec<Instruction>, memory_size: i32) -> Self {
        Self {
            instructions,
            start: NO_ENTRY_POINT,
            tick: NO_ENTRY_POINT,
            memory_size,
            width: 0,
            height: 0,
            tickrate: 0,
            data: Vec::new(),
        }
    }

    /// Validates the program and builds it along with its initial memory.
    pub fn assemble(self) -> Result<(Program, Memory), LoadError> {
        let memory_size = self
            .memory_size
            .to_usize()
            .ok_or_else(|| LoadError::InvalidField {
                field: "memory",
                reason: format!("memory size must not be negative, got {}", self.memory_size),
            })?;

        if self.instructions.len().to_u32().is_none() {
            return Err(LoadError::InvalidField {
                field: "instructions",
                reason: format!("{} instructions do not fit in a g1b file", self.instructions.len()),
            });
        }

        let start = entry_point(self.start, "start")?;
        let tick = entry_point(self.tick, "tick")?;

        let mut data = Vec::with_capacity(self.data.len());
        for (address, values) in self.data {
            let fits = address
                .to_usize()
                .and_then(|start| start.checked_add(values.len()))
                .is_some_and(|end| end <= memory_size);
            if !fits {
                return Err(LoadError::DataOutOfBounds {
                    address,
                    length: values.len(),
                    memory_size,
                });
            }

            data.push(DataEntry {
                address: address as usize,
                values,
            });
        }

        let program = Program {
            instructions: self.instructions,
            start,
            tick,
            meta: Meta {
                memory_size,
                width: self.width,
                height: self.height,
                tickrate: self.tickrate,
            },
            data,
        };

        tracing::debug!(
            instructions = program.instructions.len(),
            memory = memory_size,
            width = program.meta.width,
            height = program.meta.height,
            tickrate = program.meta.tickrate,
            start = ?program.start,
            tick = ?program.tick,
            "program assembled"
        );

        let memory = program.initial_memory();
        Ok((program, memory))
    }
}

/// Decodes a raw entry point.
fn entry_point(raw: i32, field: &'static str) -> Result<Option<usize>, LoadError> {
    match raw {
        NO_ENTRY_POINT => Ok(None),
        index => index
            .to_usize()
            .map(Some)
            .ok_or_else(|| LoadError::InvalidField {
                field,
                reason: format!("expected an instruction index or -1, got {index}"),
            }),
    }
}

/// Returns the raw encoding of an entry point.
pub(crate) fn raw_entry_point(entry: Option<usize>) -> i32 {
    // Entry points come from an `i32` in the first place.
    entry.map_or(NO_ENTRY_POINT, |index| index as i32)
}
