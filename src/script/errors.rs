use crate::script::variable::VariableType;
use thiserror::Error;

/// Errors that can occur while loading or executing a compiled script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Signature or header of an NCS image is malformed.
    #[error("decoding error: {reason}")]
    DecodeError { reason: String },
    /// Unknown opcode/qualifier pair encountered while decoding bytecode.
    #[error("invalid instruction {bytecode:02x}.{qualifier:02x} at offset {offset:04x}")]
    InvalidInstruction {
        bytecode: u8,
        qualifier: u8,
        offset: u32,
    },
    /// Bytecode ended mid-instruction.
    #[error("unexpected end of program: offset {offset}, requested {requested} bytes")]
    UnexpectedEndOfProgram { offset: usize, requested: usize },
    /// No instruction was decoded at the requested offset.
    #[error("no instruction at offset {offset:04x}")]
    InvalidOffset { offset: u32 },
    /// Decoded instruction has no handler; the run halts cleanly.
    #[error("instruction not implemented: {mnemonic}")]
    UnhandledInstruction { mnemonic: &'static str },
    /// Operand on the stack does not match the type the opcode requires.
    #[error("invalid variable type: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: VariableType,
        actual: VariableType,
    },
    /// Pop from an empty operand stack.
    #[error("operand stack underflow")]
    StackUnderflow,
    /// SP/BP-relative address points outside the live stack.
    #[error("stack index {index} out of bounds (size {size})")]
    StackIndexOutOfBounds { index: i64, size: usize },
    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Operator applied to a type pair it is not defined for.
    #[error("unsupported variable types for {operation}: {left}, {right}")]
    UnsupportedTypes {
        operation: &'static str,
        left: VariableType,
        right: VariableType,
    },
    /// Routine index outside the registered table (corrupt bytecode or
    /// version mismatch).
    #[error("routine index {index} out of range ({count} registered)")]
    InvalidRoutineIndex { index: u16, count: usize },
    /// Call site supplies more arguments than the routine declares.
    #[error("too many arguments for routine {routine}: {arg_count} > {declared}")]
    TooManyArguments {
        routine: String,
        arg_count: u8,
        declared: usize,
    },
    /// Native routine has no implementation.
    #[error("routine not implemented: {name}")]
    RoutineNotImplemented { name: String },
    /// Native routine rejected one of its arguments.
    #[error("invalid argument for routine {name}: {reason}")]
    InvalidRoutineArgument { name: String, reason: String },
    /// Native routine returned a value that does not match its declared
    /// return type.
    #[error("routine {name} returned {actual}, declared {declared}")]
    RoutineReturnMismatch {
        name: String,
        declared: VariableType,
        actual: VariableType,
    },
}
