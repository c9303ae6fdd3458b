//! The JSON program format.
//!
//! ```json
//! {
//!     "instructions": [["mov", ["$13", 5]], ["add", ["$14", "$13", 10]]],
//!     "start": 0,
//!     "tick": -1,
//!     "meta": {"memory": 32, "width": 100, "height": 100, "tickrate": 60},
//!     "data": [[20, [1, 2, 3]]]
//! }
//! ```
//!
//! Numbers are literal arguments. Strings are address arguments: a single non-digit marker
//! character followed by the decimal address. `start`, `tick` and `data` are optional.
//!
//! Fractional numbers, in instructions and data alike, are truncated toward zero.

use num_traits::ToPrimitive;
use serde::Deserialize;
use serde_json::{Number, Value};

use crate::error::LoadError;
use crate::instr::{Argument, Instruction, Opcode, MAX_ARGUMENTS, RESERVED_SETCH};
use crate::memory::Memory;
use crate::program::{Program, RawProgram, NO_ENTRY_POINT};

/// The top-level object of a JSON program.
#[derive(Debug, Deserialize)]
struct Document {
    instructions: Option<Vec<Value>>,
    start: Option<i32>,
    tick: Option<i32>,
    meta: Option<MetaDocument>,
    #[serde(default)]
    data: Vec<(Number, Vec<Number>)>,
}

/// The `meta` object of a JSON program.
#[derive(Debug, Deserialize)]
struct MetaDocument {
    memory: Option<i64>,
    width: Option<i64>,
    height: Option<i64>,
    tickrate: Option<i64>,
}

/// Loads a program from the text of a JSON document.
pub fn load_json(text: &str) -> Result<(Program, Memory), LoadError> {
    load_document(serde_json::from_str(text)?)
}

/// Loads a program from an already parsed JSON document.
pub fn load_json_value(value: Value) -> Result<(Program, Memory), LoadError> {
    load_document(serde_json::from_value(value)?)
}

fn load_document(document: Document) -> Result<(Program, Memory), LoadError> {
    let instructions = document
        .instructions
        .ok_or(LoadError::MissingField("instructions"))?
        .iter()
        .enumerate()
        .map(|(index, value)| parse_instruction(index, value))
        .collect::<Result<Vec<_>, _>>()?;

    let meta = document.meta.ok_or(LoadError::MissingField("meta"))?;

    let data = document
        .data
        .iter()
        .map(|(address, values)| parse_data_entry(address, values))
        .collect::<Result<Vec<_>, _>>()?;

    RawProgram {
        instructions,
        start: document.start.unwrap_or(NO_ENTRY_POINT),
        tick: document.tick.unwrap_or(NO_ENTRY_POINT),
        memory_size: meta_field(meta.memory, "memory")?,
        width: meta_field(meta.width, "width")?,
        height: meta_field(meta.height, "height")?,
        tickrate: meta_field(meta.tickrate, "tickrate")?,
        data,
    }
    .assemble()
}

/// Converts a required integer field of `meta` to its target type.
fn meta_field<T>(value: Option<i64>, field: &'static str) -> Result<T, LoadError>
where
    T: TryFrom<i64>,
{
    let value = value.ok_or(LoadError::MissingField(field))?;
    T::try_from(value).map_err(|_| LoadError::InvalidField {
        field,
        reason: format!("{value} is out of range"),
    })
}

/// Parses a single `[name, [args...]]` pair.
fn parse_instruction(index: usize, value: &Value) -> Result<Instruction, LoadError> {
    let invalid = |reason: String| LoadError::InvalidProgram { index, reason };

    let (name, args) = match value.as_array().map(Vec::as_slice) {
        Some([name, args]) => (name, args),
        _ => return Err(invalid(format!("expected a [name, arguments] pair, got {value}"))),
    };

    let name = name
        .as_str()
        .ok_or_else(|| invalid(format!("expected an instruction name, got {name}")))?;
    let opcode = match Opcode::from_name(name) {
        Some(opcode) => opcode,
        None if name == "setch" => {
            return Err(LoadError::UnsupportedOpcode {
                index,
                opcode: RESERVED_SETCH,
            })
        }
        None => return Err(invalid(format!("unrecognized instruction \"{name}\""))),
    };

    let args = args
        .as_array()
        .ok_or_else(|| invalid(format!("expected an argument array, got {args}")))?;
    if args.len() != opcode.arity() {
        return Err(invalid(format!(
            "`{opcode}` takes {} arguments, got {}",
            opcode.arity(),
            args.len()
        )));
    }

    let mut buffer = [Argument::default(); MAX_ARGUMENTS];
    for (slot, arg) in buffer.iter_mut().zip(args) {
        *slot = parse_argument(arg).ok_or_else(|| invalid(format!("invalid argument {arg}")))?;
    }

    Ok(Instruction::from_buffer(opcode, buffer))
}

/// Parses an `[address, [values...]]` data entry.
fn parse_data_entry(address: &Number, values: &[Number]) -> Result<(i64, Vec<i32>), LoadError> {
    let invalid = |number: &Number| LoadError::InvalidField {
        field: "data",
        reason: format!("{number} is out of range"),
    };

    let address = truncate(address).ok_or_else(|| invalid(address))?;
    let values = values
        .iter()
        .map(|value| truncate(value).and_then(|v| v.to_i32()).ok_or_else(|| invalid(value)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((address, values))
}

/// Converts a JSON number to an integer. Fractional numbers are truncated toward zero.
fn truncate(number: &Number) -> Option<i64> {
    match number.as_i64() {
        Some(i) => Some(i),
        None => number.as_f64().and_then(|f| f.to_i64()),
    }
}

/// Parses a literal (number) or address (marked string) argument.
fn parse_argument(value: &Value) -> Option<Argument> {
    match value {
        Value::Number(n) => truncate(n)?.to_i32().map(Argument::Literal),
        Value::String(s) => {
            let mut chars = s.chars();
            let marker = chars.next()?;
            let digits = chars.as_str();
            if marker.is_ascii_digit()
                || digits.is_empty()
                || !digits.bytes().all(|b| b.is_ascii_digit())
            {
                return None;
            }
            digits.parse().ok().map(Argument::Address)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(instructions: Value) -> Value {
        json!({
            "instructions": instructions,
            "start": 0,
            "meta": {"memory": 32, "width": 64, "height": 48, "tickrate": 60},
        })
    }

    #[test]
    fn loads_program() {
        let (program, memory) = load_json(
            r#"{
                "instructions": [["mov", ["$13", 5]], ["add", ["$14", "$13", 10]]],
                "start": 0,
                "tick": 1,
                "meta": {"memory": 32, "width": 100, "height": 80, "tickrate": 30},
                "data": [[20, [1, 2, 3]]]
            }"#,
        )
        .unwrap();

        assert_eq!(program.start(), Some(0));
        assert_eq!(program.tick(), Some(1));
        assert_eq!(program.meta().memory_size, 32);
        assert_eq!(program.meta().width, 100);
        assert_eq!(program.instructions()[0].to_string(), "mov $13, 5");
        assert_eq!(program.instructions()[1].to_string(), "add $14, $13, 10");
        assert_eq!(&memory.as_slice()[20..23], &[1, 2, 3]);
    }

    #[test]
    fn optional_fields() {
        let (program, _) = load_json_value(json!({
            "instructions": [],
            "meta": {"memory": 16, "width": 1, "height": 1, "tickrate": 1},
        }))
        .unwrap();
        assert_eq!(program.start(), None);
        assert_eq!(program.tick(), None);
        assert!(program.data().is_empty());
    }

    #[test]
    fn any_marker() {
        let (program, _) = load_json_value(document(json!([["log", ["@7"]]]))).unwrap();
        assert_eq!(
            program.instructions()[0].arguments(),
            &[Argument::Address(7)]
        );
    }

    #[test]
    fn unknown_instruction() {
        let err = load_json_value(document(json!([["log", [1]], ["jump", [0, 1]]]))).unwrap_err();
        assert!(matches!(err, LoadError::InvalidProgram { index: 1, .. }));
    }

    #[test]
    fn names_are_case_sensitive() {
        let err = load_json_value(document(json!([["MOV", ["$13", 1]]]))).unwrap_err();
        assert!(matches!(err, LoadError::InvalidProgram { index: 0, .. }));
    }

    #[test]
    fn wrong_arity() {
        let err = load_json_value(document(json!([["add", ["$13", 1]]]))).unwrap_err();
        assert!(matches!(err, LoadError::InvalidProgram { index: 0, .. }));
    }

    #[test]
    fn invalid_argument_type() {
        for arg in [json!(null), json!(true), json!([1]), json!("$"), json!("12"), json!("$1x")] {
            let err = load_json_value(document(json!([["log", [arg]]]))).unwrap_err();
            assert!(matches!(err, LoadError::InvalidProgram { index: 0, .. }));
        }
    }

    #[test]
    fn reserved_opcode() {
        let err = load_json_value(document(json!([["setch", [0, 0, 0]]]))).unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnsupportedOpcode {
                index: 0,
                opcode: RESERVED_SETCH,
            }
        ));
    }

    #[test]
    fn missing_fields() {
        let err = load_json_value(json!({"instructions": []})).unwrap_err();
        assert!(matches!(err, LoadError::MissingField("meta")));

        let err = load_json_value(json!({
            "instructions": [],
            "meta": {"memory": 16, "width": 1, "height": 1},
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::MissingField("tickrate")));

        let err = load_json_value(json!({"meta": {}})).unwrap_err();
        assert!(matches!(err, LoadError::MissingField("instructions")));
    }

    #[test]
    fn out_of_range_meta() {
        let err = load_json_value(json!({
            "instructions": [],
            "meta": {"memory": 16, "width": 70000, "height": 1, "tickrate": 1},
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidField { field: "width", .. }));
    }

    #[test]
    fn fractional_numbers_are_truncated() {
        let (program, memory) = load_json_value(json!({
            "instructions": [["mov", [13.9, -2.7]]],
            "meta": {"memory": 17, "width": 1, "height": 1, "tickrate": 1},
            "data": [[14.5, [1.5, -1.5, 3]]],
        }))
        .unwrap();

        assert_eq!(
            program.instructions()[0].arguments(),
            &[Argument::Literal(13), Argument::Literal(-2)]
        );
        assert_eq!(&memory.as_slice()[14..], &[1, -1, 3]);
    }

    #[test]
    fn out_of_range_data() {
        let err = load_json_value(json!({
            "instructions": [],
            "meta": {"memory": 16, "width": 1, "height": 1, "tickrate": 1},
            "data": [[13, [1e12]]],
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidField { field: "data", .. }));
    }

    #[test]
    fn malformed_text() {
        assert!(matches!(load_json("{"), Err(LoadError::Json(_))));
    }
}
