//! Defines the [`Instruction`] type, responsible for representing a single g1 instruction along
//! with its arguments.

use std::fmt;

/// The maximum number of arguments an instruction can take.
pub const MAX_ARGUMENTS: usize = 4;

/// The raw value of the `setch` opcode.
///
/// It is part of the documented instruction set but has no defined semantics, so programs using
/// it are rejected at load time.
pub const RESERVED_SETCH: u8 = 17;

/// The character that prefixes address arguments in the textual form of a program.
pub const ADDRESS_MARKER: char = '$';

/// The OP code of an instruction.
///
/// The discriminant of each variant is its value in the binary format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// `mov dst, value` writes `value` to `dst`.
    Mov = 0,
    /// `movp dst, src` copies the memory cell at address `src` to `dst`.
    Movp = 1,
    /// `add dst, a, b` writes `a + b` to `dst`.
    Add = 2,
    /// `sub dst, a, b` writes `a - b` to `dst`.
    Sub = 3,
    /// `mul dst, a, b` writes `a * b` to `dst`.
    Mul = 4,
    /// `div dst, a, b` writes `a / b` (truncated) to `dst`.
    Div = 5,
    /// `mod dst, a, b` writes the floored modulo of `a` by `b` to `dst`.
    Mod = 6,
    /// `less dst, a, b` writes `1` to `dst` if `a < b`, `0` otherwise.
    Less = 7,
    /// `equal dst, a, b` writes `1` to `dst` if `a == b`, `0` otherwise.
    Equal = 8,
    /// `not dst, a` writes `1` to `dst` if `a == 0`, `0` otherwise.
    Not = 9,
    /// `jmp target, cond` continues execution at `target` if `cond` is non-zero.
    Jmp = 10,
    /// `color r, g, b` sets the current draw color.
    Color = 11,
    /// `point x, y` draws a single pixel.
    Point = 12,
    /// `line x1, y1, x2, y2` draws a line between two points.
    Line = 13,
    /// `rect x, y, w, h` draws a filled rectangle.
    Rect = 14,
    /// `log value` emits `value` to the diagnostic output.
    Log = 15,
    /// `getp dst, x, y` writes the color of a pixel of the surface to `dst`.
    Getp = 16,
}

impl Opcode {
    /// Every opcode, in binary order.
    pub const ALL: [Opcode; 17] = [
        Opcode::Mov,
        Opcode::Movp,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::Less,
        Opcode::Equal,
        Opcode::Not,
        Opcode::Jmp,
        Opcode::Color,
        Opcode::Point,
        Opcode::Line,
        Opcode::Rect,
        Opcode::Log,
        Opcode::Getp,
    ];

    /// Returns the name of the instruction, as written in JSON programs.
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Mov => "mov",
            Opcode::Movp => "movp",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mod => "mod",
            Opcode::Less => "less",
            Opcode::Equal => "equal",
            Opcode::Not => "not",
            Opcode::Jmp => "jmp",
            Opcode::Color => "color",
            Opcode::Point => "point",
            Opcode::Line => "line",
            Opcode::Rect => "rect",
            Opcode::Log => "log",
            Opcode::Getp => "getp",
        }
    }

    /// Returns the number of arguments the instruction takes.
    ///
    /// Both loaders and the execution engine rely on this single table.
    pub const fn arity(self) -> usize {
        match self {
            Opcode::Log => 1,
            Opcode::Mov | Opcode::Movp | Opcode::Not | Opcode::Jmp | Opcode::Point => 2,
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::Less
            | Opcode::Equal
            | Opcode::Color
            | Opcode::Getp => 3,
            Opcode::Line | Opcode::Rect => 4,
        }
    }

    /// Looks up an opcode by its case-sensitive name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    /// Decodes a binary opcode, returning the raw byte if it has no implementation.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(value as usize).copied().ok_or(value)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An operand of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Argument {
    /// The argument is used as-is.
    Literal(i32),
    /// The argument is the address of a memory cell, whose value is used when the instruction
    /// executes.
    Address(i32),
}

impl Argument {
    /// The binary kind of [`Argument::Literal`].
    pub const LITERAL_KIND: u8 = 0;
    /// The binary kind of [`Argument::Address`].
    pub const ADDRESS_KIND: u8 = 1;

    /// Creates an argument from its binary kind and value.
    ///
    /// Returns `None` if `kind` is unknown.
    pub const fn from_raw(kind: u8, value: i32) -> Option<Self> {
        match kind {
            Self::LITERAL_KIND => Some(Argument::Literal(value)),
            Self::ADDRESS_KIND => Some(Argument::Address(value)),
            _ => None,
        }
    }

    /// Returns the binary kind of the argument.
    #[inline(always)]
    pub const fn kind(self) -> u8 {
        match self {
            Argument::Literal(_) => Self::LITERAL_KIND,
            Argument::Address(_) => Self::ADDRESS_KIND,
        }
    }

    /// Returns the stored value of the argument, without resolving addresses.
    #[inline(always)]
    pub const fn raw_value(self) -> i32 {
        match self {
            Argument::Literal(v) | Argument::Address(v) => v,
        }
    }
}

impl Default for Argument {
    fn default() -> Self {
        Argument::Literal(0)
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Literal(v) => write!(f, "{v}"),
            Argument::Address(a) => write!(f, "{ADDRESS_MARKER}{a}"),
        }
    }
}

/// A single g1 instruction.
///
/// The number of meaningful arguments is determined by [`Opcode::arity`]. Unused argument slots
/// are always zero literals, so two instructions compare equal exactly when they would execute
/// the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    opcode: Opcode,
    args: [Argument; MAX_ARGUMENTS],
}

impl Instruction {
    /// Creates a new [`Instruction`].
    ///
    /// Returns `None` if the number of arguments does not match the arity of `opcode`.
    pub fn new(opcode: Opcode, arguments: &[Argument]) -> Option<Self> {
        if arguments.len() != opcode.arity() {
            return None;
        }

        let mut args = [Argument::default(); MAX_ARGUMENTS];
        args[..arguments.len()].copy_from_slice(arguments);
        Some(Self { opcode, args })
    }

    /// Creates a new [`Instruction`] from a full argument buffer.
    ///
    /// Slots past the arity of `opcode` are ignored.
    pub fn from_buffer(opcode: Opcode, mut args: [Argument; MAX_ARGUMENTS]) -> Self {
        for arg in &mut args[opcode.arity()..] {
            *arg = Argument::default();
        }
        Self { opcode, args }
    }

    /// Returns the OP code of the instruction.
    #[inline(always)]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Returns the arguments of the instruction.
    #[inline(always)]
    pub fn arguments(&self) -> &[Argument] {
        &self.args[..self.opcode.arity()]
    }

    /// Appends the binary encoding of the instruction to `out`.
    ///
    /// The layout is one opcode byte followed, for each argument, by one kind byte and a
    /// big-endian `i32`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode as u8);
        for arg in self.arguments() {
            out.push(arg.kind());
            out.extend_from_slice(&arg.raw_value().to_be_bytes());
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.name())?;
        for (i, arg) in self.arguments().iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{arg}")?;
        }
        Ok(())
    }
}
