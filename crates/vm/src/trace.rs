//! Defines the [`Trace`] trait, used to gather information about the execution of a g1 program
//! within the virtual machine.

use crate::instr::Instruction;

/// A collection of callbacks to be called during the execution of a g1 program.
#[allow(unused_variables)]
pub trait Trace {
    /// Called with the value of every executed `log` instruction.
    fn log(&mut self, value: i32) {}

    /// Called before an instruction is executed.
    fn step(&mut self, pc: usize, instruction: &Instruction) {}
}

/// An implementation of [`Trace`] that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrace;
impl Trace for NoopTrace {}

/// An implementation of [`Trace`] that prints logged values to the standard output, one per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutTrace;
impl Trace for StdoutTrace {
    fn log(&mut self, value: i32) {
        println!("{value}");
    }
}
