//! The g1b binary program format.
//!
//! All integers are big-endian.
//!
//! | size | content |
//! |---|---|
//! | 2 | signature, the ASCII bytes `g1` |
//! | 4 | memory size (`i32`) |
//! | 2 | width (`u16`) |
//! | 2 | height (`u16`) |
//! | 2 | tick rate (`u16`) |
//! | 4 | tick entry point (`i32`, `-1` if absent) |
//! | 4 | start entry point (`i32`, `-1` if absent) |
//! | 4 | instruction count (`u32`) |
//! | ... | instructions: an opcode byte, then a kind byte and an `i32` per argument |
//! | 4 | data entry count (`u32`) |
//! | ... | data entries: an address (`u32`), a length (`u32`), then `length` `i32` values |

use crate::error::LoadError;
use crate::instr::{Argument, Instruction, Opcode, MAX_ARGUMENTS};
use crate::memory::Memory;
use crate::program::{raw_entry_point, Program, RawProgram};

use super::ByteReader;

/// The signature of g1b files, the ASCII bytes `g1`.
pub const SIGNATURE: u16 = u16::from_be_bytes(*b"g1");

/// Loads a program from its g1b binary form.
pub fn load_binary(bytes: &[u8]) -> Result<(Program, Memory), LoadError> {
    let mut reader = ByteReader::new(bytes);

    let signature = reader.read_u16()?;
    if signature != SIGNATURE {
        return Err(LoadError::InvalidSignature(signature));
    }

    let memory_size = reader.read_i32()?;
    let width = reader.read_u16()?;
    let height = reader.read_u16()?;
    let tickrate = reader.read_u16()?;
    let tick = reader.read_i32()?;
    let start = reader.read_i32()?;

    let instruction_count = reader.read_u32()? as usize;
    // Every instruction takes at least one byte; avoid trusting the count for the allocation.
    let mut instructions = Vec::with_capacity(instruction_count.min(reader.remaining()));
    for index in 0..instruction_count {
        instructions.push(read_instruction(&mut reader, index)?);
    }

    let entry_count = reader.read_u32()? as usize;
    let mut data = Vec::with_capacity(entry_count.min(reader.remaining() / 8));
    for _ in 0..entry_count {
        let address = reader.read_u32()?;
        let length = reader.read_u32()? as usize;
        let mut values = Vec::with_capacity(length.min(reader.remaining() / 4));
        for _ in 0..length {
            values.push(reader.read_i32()?);
        }
        data.push((i64::from(address), values));
    }

    if !reader.finished() {
        tracing::debug!(trailing = reader.remaining(), "ignoring trailing bytes after g1b data");
    }

    RawProgram {
        instructions,
        start,
        tick,
        memory_size,
        width,
        height,
        tickrate,
        data,
    }
    .assemble()
}

/// Reads a single encoded instruction.
fn read_instruction(reader: &mut ByteReader, index: usize) -> Result<Instruction, LoadError> {
    let raw = reader.read_u8()?;
    let opcode =
        Opcode::try_from(raw).map_err(|opcode| LoadError::UnsupportedOpcode { index, opcode })?;

    let mut args = [Argument::default(); MAX_ARGUMENTS];
    for arg in &mut args[..opcode.arity()] {
        let kind = reader.read_u8()?;
        let value = reader.read_i32()?;
        *arg = Argument::from_raw(kind, value)
            .ok_or(LoadError::UnknownArgumentKind { index, kind })?;
    }

    Ok(Instruction::from_buffer(opcode, args))
}

/// Serializes a program to the g1b binary format.
pub fn encode_binary(program: &Program) -> Vec<u8> {
    let meta = program.meta();
    let mut out = Vec::new();

    // The invariants of `Program` guarantee that every narrowing below is lossless.
    out.extend_from_slice(&SIGNATURE.to_be_bytes());
    out.extend_from_slice(&(meta.memory_size as i32).to_be_bytes());
    out.extend_from_slice(&meta.width.to_be_bytes());
    out.extend_from_slice(&meta.height.to_be_bytes());
    out.extend_from_slice(&meta.tickrate.to_be_bytes());
    out.extend_from_slice(&raw_entry_point(program.tick()).to_be_bytes());
    out.extend_from_slice(&raw_entry_point(program.start()).to_be_bytes());

    out.extend_from_slice(&(program.instructions().len() as u32).to_be_bytes());
    for instruction in program.instructions() {
        instruction.encode(&mut out);
    }

    out.extend_from_slice(&(program.data().len() as u32).to_be_bytes());
    for entry in program.data() {
        out.extend_from_slice(&(entry.address as u32).to_be_bytes());
        out.extend_from_slice(&(entry.values.len() as u32).to_be_bytes());
        for value in &entry.values {
            out.extend_from_slice(&value.to_be_bytes());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::error::TruncatedInput;
    use crate::instr::RESERVED_SETCH;

    /// Builds a g1b header.
    fn header(memory_size: i32, tick: i32, start: i32) -> Vec<u8> {
        let mut out = b"g1".to_vec();
        out.extend_from_slice(&memory_size.to_be_bytes());
        out.extend_from_slice(&160u16.to_be_bytes());
        out.extend_from_slice(&120u16.to_be_bytes());
        out.extend_from_slice(&30u16.to_be_bytes());
        out.extend_from_slice(&tick.to_be_bytes());
        out.extend_from_slice(&start.to_be_bytes());
        out
    }

    #[test]
    fn signature_value() {
        assert_eq!(SIGNATURE, 0x6731);
    }

    #[test]
    fn wrong_signature() {
        let err = load_binary(&[0x67, 0x30]).unwrap_err();
        assert!(matches!(err, LoadError::InvalidSignature(0x6730)));
    }

    #[test]
    fn empty_input() {
        assert!(matches!(
            load_binary(&[]),
            Err(LoadError::InvalidBinary(TruncatedInput { offset: 0, .. }))
        ));
    }

    #[test]
    fn loads_program() {
        let mut bytes = header(16, -1, 0);
        bytes.extend_from_slice(&2u32.to_be_bytes());
        // mov 13, 5
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 13, 0, 0, 0, 0, 5]);
        // add 14, $13, 10
        bytes.extend_from_slice(&[2, 0, 0, 0, 0, 14, 1, 0, 0, 0, 13, 0, 0, 0, 0, 10]);
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&15u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&(-7i32).to_be_bytes());

        let (program, memory) = load_binary(&bytes).unwrap();
        assert_eq!(program.start(), Some(0));
        assert_eq!(program.tick(), None);
        assert_eq!(program.meta().width, 160);
        assert_eq!(program.meta().height, 120);
        assert_eq!(program.meta().tickrate, 30);
        assert_eq!(program.instructions().len(), 2);
        assert_eq!(program.instructions()[1].to_string(), "add 14, $13, 10");
        assert_eq!(memory.read(15), Ok(-7));

        assert_eq!(program.to_g1b(), bytes);
    }

    #[test]
    fn truncated_instruction() {
        let mut bytes = header(16, -1, -1);
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            load_binary(&bytes),
            Err(LoadError::InvalidBinary(_))
        ));
    }

    #[test]
    fn missing_data_section() {
        let mut bytes = header(16, -1, -1);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        assert!(matches!(
            load_binary(&bytes),
            Err(LoadError::InvalidBinary(_))
        ));
    }

    #[test]
    fn reserved_opcode() {
        let mut bytes = header(16, -1, -1);
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.push(RESERVED_SETCH);
        assert!(matches!(
            load_binary(&bytes),
            Err(LoadError::UnsupportedOpcode {
                index: 0,
                opcode: RESERVED_SETCH,
            })
        ));
    }

    #[test]
    fn unknown_argument_kind() {
        let mut bytes = header(16, -1, -1);
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&[15, 2, 0, 0, 0, 0]);
        assert!(matches!(
            load_binary(&bytes),
            Err(LoadError::UnknownArgumentKind { index: 0, kind: 2 })
        ));
    }

    #[test]
    fn huge_counts_do_not_allocate() {
        let mut bytes = header(16, -1, -1);
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            load_binary(&bytes),
            Err(LoadError::InvalidBinary(_))
        ));
    }

    fn argument() -> impl Strategy<Value = Argument> {
        prop_oneof![
            any::<i32>().prop_map(Argument::Literal),
            any::<i32>().prop_map(Argument::Address),
        ]
    }

    fn instruction() -> impl Strategy<Value = Instruction> {
        (0..Opcode::ALL.len(), prop::collection::vec(argument(), MAX_ARGUMENTS)).prop_map(
            |(op, args)| {
                let opcode = Opcode::ALL[op];
                Instruction::new(opcode, &args[..opcode.arity()]).unwrap()
            },
        )
    }

    proptest! {
        #[test]
        fn encode_decode_encode(instructions in prop::collection::vec(instruction(), 0..32)) {
            let mut raw = RawProgram::new(instructions.clone(), 64);
            raw.data = vec![(20, vec![1, -2, 3])];
            let (program, _) = raw.assemble().unwrap();

            let bytes = program.to_g1b();
            let (decoded, _) = load_binary(&bytes).unwrap();
            prop_assert_eq!(decoded.instructions(), &instructions[..]);
            prop_assert_eq!(decoded.to_g1b(), bytes);
        }
    }
}
