//! Defines the [`Cpu`] type, responsible for describing the state of the CPU.
//!
//! More information in the documentation for [`Cpu`].

use crate::raster::Color;

/// The dynamic state of a running g1 program, apart from its memory.
///
/// By itself, a [`Cpu`] is not enough to execute a program. In order to do anything useful, it
/// has to be paired with a [`Program`](crate::program::Program), a [`Memory`](crate::memory::Memory)
/// and a [`Surface`](crate::raster::Surface).
#[derive(Debug, Default, Clone)]
pub struct Cpu {
    /// The Program Counter of the CPU, the index of the next instruction to execute.
    ///
    /// A run ends when it reaches or passes the number of instructions of the program.
    pub pc: usize,
    /// The color used by the drawing instructions.
    ///
    /// It is set by the `color` instruction and persists across runs. Until then, it is
    /// transparent black.
    pub color: Color,
}
