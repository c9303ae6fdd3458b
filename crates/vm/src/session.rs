//! Defines the [`Session`] type, which owns everything one run of a program needs.

use crate::error::Error;
use crate::memory::reserved::{self, InputSnapshot, Keys};
use crate::memory::Memory;
use crate::program::Program;
use crate::raster::{Framebuffer, Surface};
use crate::trace::Trace;
use crate::{Config, G1VM};

/// A program being run, along with its memory and the surface it draws to.
///
/// A driver calls [`Session::start`] once, then [`Session::tick`] at the rate given by the
/// [`Meta`](crate::program::Meta) of the program. Before either routine runs, the reserved
/// memory cells are overwritten with the current input.
#[derive(Debug)]
pub struct Session<S = Framebuffer> {
    vm: G1VM,
    program: Program,
    memory: Memory,
    surface: S,
}

impl Session<Framebuffer> {
    /// Creates a new [`Session`] drawing to a [`Framebuffer`] of the size declared by `program`.
    pub fn new(program: Program, memory: Memory, config: Config) -> Self {
        let meta = program.meta();
        let surface = Framebuffer::new(usize::from(meta.width), usize::from(meta.height));
        Self::with_surface(program, memory, surface, config)
    }
}

impl<S: Surface> Session<S> {
    /// Creates a new [`Session`] drawing to `surface`.
    pub fn with_surface(program: Program, memory: Memory, surface: S, config: Config) -> Self {
        Self {
            vm: G1VM::new(config),
            program,
            memory,
            surface,
        }
    }

    /// Returns the virtual machine running the program.
    #[inline(always)]
    pub fn vm(&self) -> &G1VM {
        &self.vm
    }

    /// Returns the program being run.
    #[inline(always)]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Returns the memory of the program.
    #[inline(always)]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Returns the memory of the program.
    #[inline(always)]
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Returns the surface the program draws to.
    #[inline(always)]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Returns the surface the program draws to.
    #[inline(always)]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Whether the program has a tick routine.
    #[inline]
    pub fn has_tick(&self) -> bool {
        self.program.tick().is_some()
    }

    /// Runs the start routine of the program, if it has one.
    ///
    /// The elapsed time reported to the routine is zero.
    pub fn start<T>(&mut self, keys: Keys, trace: &mut T) -> Result<(), Error>
    where
        T: ?Sized + Trace,
    {
        let entry = self.program.start();
        self.run_routine(entry, &InputSnapshot::new(keys, 0), trace)
    }

    /// Runs the tick routine of the program, if it has one.
    pub fn tick<T>(&mut self, input: &InputSnapshot, trace: &mut T) -> Result<(), Error>
    where
        T: ?Sized + Trace,
    {
        let entry = self.program.tick();
        self.run_routine(entry, input, trace)
    }

    fn run_routine<T>(
        &mut self,
        entry: Option<usize>,
        input: &InputSnapshot,
        trace: &mut T,
    ) -> Result<(), Error>
    where
        T: ?Sized + Trace,
    {
        let Some(entry) = entry else {
            return Ok(());
        };

        reserved::inject(&mut self.memory, self.program.meta(), input);
        self.vm.run(
            &self.program,
            &mut self.memory,
            &mut self.surface,
            trace,
            entry,
        )
    }
}
