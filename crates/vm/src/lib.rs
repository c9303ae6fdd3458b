//! # g1
//!
//! A small bytecode virtual machine for "fantasy console" programs.
//!
//! A g1 program is a flat list of integer instructions operating on a single array of memory
//! cells and drawing to a pixel surface. A driver runs its *start* routine once, then its *tick*
//! routine at a fixed rate, refreshing the [reserved memory](memory::reserved) with the state of
//! the input devices before each tick.
//!
//! # Example
//!
//! ```
//! use g1_vm::loader::load_json;
//! use g1_vm::raster::Framebuffer;
//! use g1_vm::trace::NoopTrace;
//! use g1_vm::{Config, G1VM};
//!
//! let (program, mut memory) = load_json(r#"{
//!     "instructions": [["mov", [13, 5]], ["add", [14, "$13", 10]]],
//!     "start": 0,
//!     "meta": {"memory": 16, "width": 8, "height": 8, "tickrate": 60}
//! }"#).unwrap();
//!
//! let mut surface = Framebuffer::new(8, 8);
//! let mut vm = G1VM::new(Config::default());
//! vm.run(&program, &mut memory, &mut surface, &mut NoopTrace, 0).unwrap();
//!
//! assert_eq!(memory.read(14), Ok(15));
//! ```

#![warn(missing_docs, missing_debug_implementations)]

use num_traits::ToPrimitive;

use cpu::Cpu;
use error::Error;
use instr::{Argument, Instruction, Opcode, MAX_ARGUMENTS};
use memory::Memory;
use program::Program;
use raster::{Color, Surface};
use trace::Trace;

pub mod cpu;
pub mod error;
pub mod instr;
pub mod loader;
pub mod memory;
pub mod program;
pub mod raster;
pub mod session;
pub mod trace;

pub use session::Session;

/// The configuration of a [`G1VM`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Whether memory accesses are bounds-checked.
    ///
    /// When enabled, accessing a cell outside of memory fails with [`Error::OutOfBounds`].
    ///
    /// When disabled, reading a cell outside of memory yields `0` and writing to one does
    /// nothing. Programs must not rely on either behavior. Division by zero is reported in both
    /// modes.
    pub strict: bool,
    /// Whether `log` instructions are executed.
    ///
    /// Disabled `log` instructions are skipped without resolving their argument.
    pub log_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: true,
            log_enabled: true,
        }
    }
}

/// The execution engine of g1 programs.
///
/// A [`G1VM`] only holds the [`Cpu`] and its configuration. The [`Program`] it executes and the
/// [`Memory`] and [`Surface`] it mutates are borrowed for the duration of each call, so the same
/// program may be shared by several engines.
#[derive(Debug, Default, Clone)]
pub struct G1VM {
    /// The central processing unit of the virtual machine.
    cpu: Cpu,
    /// How the virtual machine behaves on edge cases.
    config: Config,
}

impl G1VM {
    /// Creates a new [`G1VM`].
    pub fn new(config: Config) -> Self {
        Self {
            cpu: Cpu::default(),
            config,
        }
    }

    /// Returns the current state of the [`Cpu`].
    #[inline(always)]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Returns the configuration of the virtual machine.
    #[inline(always)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Moves the program counter to `entry` without executing anything.
    #[inline(always)]
    pub fn enter(&mut self, entry: usize) {
        self.cpu.pc = entry;
    }

    /// Runs `program` from the instruction at index `entry` until the program counter falls off
    /// the end of the program.
    ///
    /// # Termination
    ///
    /// There is no instruction budget: a routine that loops forever never returns. Callers that
    /// need one can drive the virtual machine with [`G1VM::enter`] and [`G1VM::step`] instead.
    pub fn run<S, T>(
        &mut self,
        program: &Program,
        memory: &mut Memory,
        surface: &mut S,
        trace: &mut T,
        entry: usize,
    ) -> Result<(), Error>
    where
        S: ?Sized + Surface,
        T: ?Sized + Trace,
    {
        tracing::debug!(entry, "run started");

        self.enter(entry);
        let mut executed = 0u64;
        while self.step(program, memory, surface, trace)? {
            executed += 1;
        }

        tracing::debug!(executed, "run finished");
        Ok(())
    }

    /// Executes the instruction referenced by the program counter.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if an instruction was executed.
    ///
    /// - `Ok(false)` if the program counter is past the last instruction, in which case nothing
    ///   happens.
    ///
    /// - `Err(_)` if the instruction failed. The program counter is left on it.
    pub fn step<S, T>(
        &mut self,
        program: &Program,
        memory: &mut Memory,
        surface: &mut S,
        trace: &mut T,
    ) -> Result<bool, Error>
    where
        S: ?Sized + Surface,
        T: ?Sized + Trace,
    {
        let pc = self.cpu.pc;
        let Some(instruction) = program.instructions().get(pc) else {
            return Ok(false);
        };

        if instruction.opcode() == Opcode::Log && !self.config.log_enabled {
            self.cpu.pc = pc + 1;
            return Ok(true);
        }

        trace.step(pc, instruction);
        tracing::trace!(pc, %instruction, "step");

        let args = self.resolve_arguments(instruction, memory)?;
        let jump = self.execute(instruction.opcode(), &args, pc, memory, surface, trace)?;
        self.cpu.pc = jump.unwrap_or(pc + 1);

        Ok(true)
    }

    /// Replaces address arguments with the value of the memory cell they reference.
    fn resolve_arguments(
        &self,
        instruction: &Instruction,
        memory: &Memory,
    ) -> Result<[i32; MAX_ARGUMENTS], Error> {
        let mut args = [0; MAX_ARGUMENTS];
        for (slot, arg) in args.iter_mut().zip(instruction.arguments()) {
            *slot = match *arg {
                Argument::Literal(value) => value,
                Argument::Address(address) => self.load(memory, address)?,
            };
        }
        Ok(args)
    }

    /// Reads a memory cell according to the bounds-checking mode.
    #[inline]
    fn load(&self, memory: &Memory, address: i32) -> Result<i32, Error> {
        if self.config.strict {
            memory.read(address)
        } else {
            Ok(memory.get(address).unwrap_or(0))
        }
    }

    /// Writes a memory cell according to the bounds-checking mode.
    #[inline]
    fn store(&self, memory: &mut Memory, address: i32, value: i32) -> Result<(), Error> {
        if self.config.strict {
            memory.write(address, value)
        } else {
            if let Some(cell) = memory.get_mut(address) {
                *cell = value;
            }
            Ok(())
        }
    }

    /// Executes an instruction whose arguments have been resolved.
    ///
    /// Returns the index of the next instruction if the instruction jumped.
    fn execute<S, T>(
        &mut self,
        opcode: Opcode,
        a: &[i32; MAX_ARGUMENTS],
        pc: usize,
        memory: &mut Memory,
        surface: &mut S,
        trace: &mut T,
    ) -> Result<Option<usize>, Error>
    where
        S: ?Sized + Surface,
        T: ?Sized + Trace,
    {
        match opcode {
            Opcode::Mov => self.store(memory, a[0], a[1])?,
            Opcode::Movp => {
                let value = self.load(memory, a[1])?;
                self.store(memory, a[0], value)?;
            }
            Opcode::Add => self.store(memory, a[0], a[1].wrapping_add(a[2]))?,
            Opcode::Sub => self.store(memory, a[0], a[1].wrapping_sub(a[2]))?,
            Opcode::Mul => self.store(memory, a[0], a[1].wrapping_mul(a[2]))?,
            Opcode::Div => {
                if a[2] == 0 {
                    return Err(Error::DivisionByZero { pc });
                }
                self.store(memory, a[0], a[1].wrapping_div(a[2]))?;
            }
            Opcode::Mod => {
                let value = floored_mod(a[1], a[2]).ok_or(Error::DivisionByZero { pc })?;
                self.store(memory, a[0], value)?;
            }
            Opcode::Less => self.store(memory, a[0], i32::from(a[1] < a[2]))?,
            Opcode::Equal => self.store(memory, a[0], i32::from(a[1] == a[2]))?,
            Opcode::Not => self.store(memory, a[0], i32::from(a[1] == 0))?,
            Opcode::Jmp => {
                if a[1] != 0 {
                    // A negative target can never be reached and ends the run.
                    return Ok(Some(a[0].to_usize().unwrap_or(usize::MAX)));
                }
            }
            // Channels keep their low byte, like an 8-bit color conversion would.
            Opcode::Color => self.cpu.color = Color::rgb(a[0] as u8, a[1] as u8, a[2] as u8),
            Opcode::Point => surface.draw_point(a[0], a[1], self.cpu.color),
            Opcode::Line => surface.draw_line(a[0], a[1], a[2], a[3], self.cpu.color),
            Opcode::Rect => surface.draw_rect(a[0], a[1], a[2], a[3], self.cpu.color),
            Opcode::Log => trace.log(a[0]),
            Opcode::Getp => {
                let value = surface.read_pixel(a[1], a[2]).map_or(0, Color::to_g1);
                self.store(memory, a[0], value)?;
            }
        }

        Ok(None)
    }
}

/// Computes the floored modulo of `a` by `b`.
///
/// Unlike `%`, the result always has the sign of `b` (or is zero). Returns `None` if `b` is
/// zero.
pub fn floored_mod(a: i32, b: i32) -> Option<i32> {
    if b == 0 {
        return None;
    }

    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        Some(r + b)
    } else {
        Some(r)
    }
}
