//! Defines the [`Memory`] type, responsible for representing the memory of a g1 virtual machine.
//!
//! # Layout
//!
//! The memory of a g1 program is a single flat array of signed 32-bit cells, zero-initialized
//! and sized once when the program is loaded. Programs address it directly with cell indices.
//!
//! The lowest cells are reserved: before every tick, the driver overwrites them with the state
//! of the input devices and some frame metadata. See the [`reserved`] module for the layout.
//! Nothing prevents a program from writing to those cells; the next injection simply replaces
//! whatever it wrote.

use num_traits::ToPrimitive;

use crate::error::Error;

pub mod reserved;

pub use self::reserved::{InputSnapshot, Keys};

/// Represents the memory of a g1 virtual machine.
///
/// More information on memory can be found in [module-level documentation](self).
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Memory {
    /// The cells of the memory.
    cells: Box<[i32]>,
}

impl Memory {
    /// Creates a new zeroed [`Memory`] of `size` cells.
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![0; size].into_boxed_slice(),
        }
    }

    /// Returns the number of cells in the memory.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns whether the memory has no cells at all.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the cells of the memory.
    #[inline(always)]
    pub fn as_slice(&self) -> &[i32] {
        &self.cells
    }

    /// Returns the cells of the memory.
    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.cells
    }

    /// Returns the value of the cell at `address`, if it exists.
    #[inline]
    pub fn get(&self, address: i32) -> Option<i32> {
        self.cells.get(address.to_usize()?).copied()
    }

    /// Returns a mutable reference to the cell at `address`, if it exists.
    #[inline]
    pub fn get_mut(&mut self, address: i32) -> Option<&mut i32> {
        self.cells.get_mut(address.to_usize()?)
    }

    /// Reads the cell at `address`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::OutOfBounds`] if `address` is not within `[0, len)`.
    #[inline]
    pub fn read(&self, address: i32) -> Result<i32, Error> {
        self.get(address).ok_or(Error::OutOfBounds { address })
    }

    /// Writes `value` to the cell at `address`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::OutOfBounds`] if `address` is not within `[0, len)`.
    #[inline]
    pub fn write(&mut self, address: i32, value: i32) -> Result<(), Error> {
        let cell = self.get_mut(address).ok_or(Error::OutOfBounds { address })?;
        *cell = value;
        Ok(())
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("len", &self.cells.len())
            .finish_non_exhaustive()
    }
}
