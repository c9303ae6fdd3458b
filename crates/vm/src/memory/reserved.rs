//! The reserved low memory through which a program observes its input devices and timing.
//!
//! | address | content |
//! |---|---|
//! | 0 | return key held |
//! | 1 | shift key held |
//! | 2 | `Z` key held |
//! | 3 | `X` key held |
//! | 4 | up arrow held |
//! | 5 | down arrow held |
//! | 6 | left arrow held |
//! | 7 | right arrow held |
//! | 8 | declared memory size |
//! | 9 | surface width |
//! | 10 | surface height |
//! | 11 | tick rate |
//! | 12 | milliseconds elapsed since the previous tick |
//!
//! Key cells hold `1` when the key is held and `0` otherwise.

use bitflags::bitflags;
use num_traits::ToPrimitive;

use crate::program::Meta;

use super::Memory;

/// The number of reserved cells at the start of memory.
pub const RESERVED_CELLS: usize = 13;

/// The address of the declared memory size.
pub const MEMORY_SIZE: usize = 8;
/// The address of the surface width.
pub const WIDTH: usize = 9;
/// The address of the surface height.
pub const HEIGHT: usize = 10;
/// The address of the tick rate.
pub const TICKRATE: usize = 11;
/// The address of the elapsed milliseconds.
pub const DELTA_MS: usize = 12;

bitflags! {
    /// The set of keys a program can observe.
    ///
    /// The bit index of each key is also its address in reserved memory.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Keys: u8 {
        /// The return key.
        const RETURN = 1 << 0;
        /// The shift key.
        const SHIFT = 1 << 1;
        /// The `Z` key.
        const Z = 1 << 2;
        /// The `X` key.
        const X = 1 << 3;
        /// The up arrow.
        const UP = 1 << 4;
        /// The down arrow.
        const DOWN = 1 << 5;
        /// The left arrow.
        const LEFT = 1 << 6;
        /// The right arrow.
        const RIGHT = 1 << 7;
    }
}

impl Keys {
    /// Looks up a single key by its case-insensitive name, such as `"up"` or `"Return"`.
    pub fn from_key_name(name: &str) -> Option<Self> {
        Self::from_name(&name.to_ascii_uppercase())
    }
}

/// The state of the outside world at the start of a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputSnapshot {
    /// The keys currently held.
    pub keys: Keys,
    /// The number of milliseconds elapsed since the previous tick.
    pub elapsed_ms: i32,
}

impl InputSnapshot {
    /// Creates a new [`InputSnapshot`].
    pub const fn new(keys: Keys, elapsed_ms: i32) -> Self {
        Self { keys, elapsed_ms }
    }
}

/// Overwrites the reserved cells of `memory` with `input` and the metadata of the program.
///
/// Programs declaring fewer than [`RESERVED_CELLS`] cells only receive the prefix that fits.
pub fn inject(memory: &mut Memory, meta: &Meta, input: &InputSnapshot) {
    let mut values = [0i32; RESERVED_CELLS];

    for (i, cell) in values.iter_mut().take(u8::BITS as usize).enumerate() {
        *cell = i32::from((input.keys.bits() >> i) & 1);
    }

    values[MEMORY_SIZE] = meta.memory_size.to_i32().unwrap_or(i32::MAX);
    values[WIDTH] = i32::from(meta.width);
    values[HEIGHT] = i32::from(meta.height);
    values[TICKRATE] = i32::from(meta.tickrate);
    values[DELTA_MS] = input.elapsed_ms;

    let cells = memory.as_mut_slice();
    let len = cells.len().min(RESERVED_CELLS);
    cells[..len].copy_from_slice(&values[..len]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> Meta {
        Meta {
            memory_size: 32,
            width: 100,
            height: 80,
            tickrate: 60,
        }
    }

    #[test]
    fn layout() {
        let mut memory = Memory::new(32);
        memory.as_mut_slice()[RESERVED_CELLS] = 42;

        let input = InputSnapshot::new(Keys::RETURN | Keys::X | Keys::RIGHT, 16);
        inject(&mut memory, &meta(), &input);

        assert_eq!(
            &memory.as_slice()[..=RESERVED_CELLS],
            &[1, 0, 0, 1, 0, 0, 0, 1, 32, 100, 80, 60, 16, 42],
        );
    }

    #[test]
    fn overrides_program_writes() {
        let mut memory = Memory::new(32);
        memory.write(0, 99).unwrap();
        inject(&mut memory, &meta(), &InputSnapshot::default());
        assert_eq!(memory.read(0), Ok(0));
    }

    #[test]
    fn small_memory() {
        let mut memory = Memory::new(3);
        inject(&mut memory, &meta(), &InputSnapshot::new(Keys::all(), 0));
        assert_eq!(memory.as_slice(), &[1, 1, 1]);
    }

    #[test]
    fn key_names() {
        assert_eq!(Keys::from_key_name("up"), Some(Keys::UP));
        assert_eq!(Keys::from_key_name("Return"), Some(Keys::RETURN));
        assert_eq!(Keys::from_key_name("space"), None);
    }
}
