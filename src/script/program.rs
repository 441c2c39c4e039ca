//! Decoded instruction table for one compiled script.
//!
//! A [`ScriptProgram`] is immutable once loaded and shared read-only across
//! any number of concurrent executions. Instructions are addressed by their
//! byte offset in the source image; offsets are assigned on insertion from
//! the running byte length, so programs built in memory lay out exactly like
//! programs decoded from an NCS image.

use crate::script::errors::ScriptError;
use crate::script::isa::{InstructionType, PayloadKind};
use std::collections::BTreeMap;

/// Offset of the first instruction in a compiled script: the 8-byte
/// signature, the program-type byte, and the u32 total length.
pub const START_OFFSET: u32 = 13;

/// One decoded unit of bytecode.
///
/// Payload fields are mutually exclusive by instruction type; the `new_*`
/// constructors set the fields the type uses and zero the rest. `offset` and
/// `next_offset` are assigned by [`ScriptProgram::add`].
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub offset: u32,
    pub next_offset: u32,
    pub ins_type: InstructionType,
    pub stack_offset: i32,
    pub size: u32,
    pub size_no_destroy: u16,
    pub size_locals: u32,
    /// Absolute jump target, resolved from the encoded relative displacement
    /// at decode time.
    pub jump_target: u32,
    pub int_value: i32,
    pub float_value: f32,
    pub str_value: String,
    pub object_id: u32,
    pub routine: u16,
    pub arg_count: u8,
}

impl Instruction {
    fn with_type(ins_type: InstructionType) -> Self {
        Self {
            offset: 0,
            next_offset: 0,
            ins_type,
            stack_offset: 0,
            size: 0,
            size_no_destroy: 0,
            size_locals: 0,
            jump_target: 0,
            int_value: 0,
            float_value: 0.0,
            str_value: String::new(),
            object_id: 0,
            routine: 0,
            arg_count: 0,
        }
    }

    /// Creates a payload-less instruction.
    pub fn simple(ins_type: InstructionType) -> Self {
        Self::with_type(ins_type)
    }

    pub fn new_cpdownsp(stack_offset: i32, size: u16) -> Self {
        let mut ins = Self::with_type(InstructionType::CpDownSp);
        ins.stack_offset = stack_offset;
        ins.size = size as u32;
        ins
    }

    pub fn new_cptopsp(stack_offset: i32, size: u16) -> Self {
        let mut ins = Self::with_type(InstructionType::CpTopSp);
        ins.stack_offset = stack_offset;
        ins.size = size as u32;
        ins
    }

    pub fn new_cpdownbp(stack_offset: i32, size: u16) -> Self {
        let mut ins = Self::with_type(InstructionType::CpDownBp);
        ins.stack_offset = stack_offset;
        ins.size = size as u32;
        ins
    }

    pub fn new_cptopbp(stack_offset: i32, size: u16) -> Self {
        let mut ins = Self::with_type(InstructionType::CpTopBp);
        ins.stack_offset = stack_offset;
        ins.size = size as u32;
        ins
    }

    pub fn new_consti(value: i32) -> Self {
        let mut ins = Self::with_type(InstructionType::ConstI);
        ins.int_value = value;
        ins
    }

    pub fn new_constf(value: f32) -> Self {
        let mut ins = Self::with_type(InstructionType::ConstF);
        ins.float_value = value;
        ins
    }

    pub fn new_consts(value: impl Into<String>) -> Self {
        let mut ins = Self::with_type(InstructionType::ConstS);
        ins.str_value = value.into();
        ins
    }

    pub fn new_consto(object_id: u32) -> Self {
        let mut ins = Self::with_type(InstructionType::ConstO);
        ins.object_id = object_id;
        ins
    }

    pub fn new_action(routine: u16, arg_count: u8) -> Self {
        let mut ins = Self::with_type(InstructionType::Action);
        ins.routine = routine;
        ins.arg_count = arg_count;
        ins
    }

    pub fn new_movsp(stack_offset: i32) -> Self {
        let mut ins = Self::with_type(InstructionType::MovSp);
        ins.stack_offset = stack_offset;
        ins
    }

    pub fn new_jmp(target: u32) -> Self {
        let mut ins = Self::with_type(InstructionType::Jmp);
        ins.jump_target = target;
        ins
    }

    pub fn new_jsr(target: u32) -> Self {
        let mut ins = Self::with_type(InstructionType::Jsr);
        ins.jump_target = target;
        ins
    }

    pub fn new_jz(target: u32) -> Self {
        let mut ins = Self::with_type(InstructionType::Jz);
        ins.jump_target = target;
        ins
    }

    pub fn new_jnz(target: u32) -> Self {
        let mut ins = Self::with_type(InstructionType::Jnz);
        ins.jump_target = target;
        ins
    }

    pub fn new_destruct(size: u16, stack_offset: i16, size_no_destroy: u16) -> Self {
        let mut ins = Self::with_type(InstructionType::Destruct);
        ins.size = size as u32;
        ins.stack_offset = stack_offset as i32;
        ins.size_no_destroy = size_no_destroy;
        ins
    }

    pub fn new_decisp(stack_offset: i32) -> Self {
        let mut ins = Self::with_type(InstructionType::DecISp);
        ins.stack_offset = stack_offset;
        ins
    }

    pub fn new_incisp(stack_offset: i32) -> Self {
        let mut ins = Self::with_type(InstructionType::IncISp);
        ins.stack_offset = stack_offset;
        ins
    }

    pub fn new_decibp(stack_offset: i32) -> Self {
        let mut ins = Self::with_type(InstructionType::DecIBp);
        ins.stack_offset = stack_offset;
        ins
    }

    pub fn new_incibp(stack_offset: i32) -> Self {
        let mut ins = Self::with_type(InstructionType::IncIBp);
        ins.stack_offset = stack_offset;
        ins
    }

    pub fn new_store_state(size: u32, size_locals: u32) -> Self {
        let mut ins = Self::with_type(InstructionType::StoreState);
        ins.size = size;
        ins.size_locals = size_locals;
        ins
    }

    pub fn new_equaltt(size: u16) -> Self {
        let mut ins = Self::with_type(InstructionType::EqualTT);
        ins.size = size as u32;
        ins
    }

    pub fn new_nequaltt(size: u16) -> Self {
        let mut ins = Self::with_type(InstructionType::NequalTT);
        ins.size = size as u32;
        ins
    }

    /// Returns the encoded byte size of this instruction, header included.
    pub fn encoded_len(&self) -> u32 {
        let kind = self.ins_type.payload_kind();
        let base = 2 + kind.encoded_size();
        match kind {
            PayloadKind::StrLit => base + self.str_value.len() as u32,
            _ => base,
        }
    }
}

/// Immutable, offset-addressable instruction table for one compiled script.
#[derive(Debug)]
pub struct ScriptProgram {
    name: String,
    instructions: BTreeMap<u32, Instruction>,
    length: u32,
}

impl ScriptProgram {
    /// Creates an empty program named after its source resource.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: BTreeMap::new(),
            length: START_OFFSET,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total program length in bytes, header included.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Appends an instruction, assigning its offset from the running length.
    pub fn add(&mut self, mut ins: Instruction) {
        ins.offset = self.length;
        ins.next_offset = ins.offset + ins.encoded_len();
        self.length = ins.next_offset;
        self.instructions.insert(ins.offset, ins);
    }

    /// Returns the instruction decoded at exactly the given offset.
    ///
    /// A miss means a corrupt jump target (decoders never produce targets
    /// that land mid-instruction) and faults the run.
    pub fn instruction_at(&self, offset: u32) -> Result<&Instruction, ScriptError> {
        self.instructions
            .get(&offset)
            .ok_or(ScriptError::InvalidOffset { offset })
    }

    /// Iterates instructions in program order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_start_after_header() {
        let mut program = ScriptProgram::new("test");
        program.add(Instruction::new_consti(1));
        let ins = program.instruction_at(START_OFFSET).unwrap();
        assert_eq!(ins.offset, 13);
        assert_eq!(ins.next_offset, 19);
        assert_eq!(program.length(), 19);
    }

    #[test]
    fn offsets_advance_by_encoded_len() {
        let mut program = ScriptProgram::new("test");
        program.add(Instruction::simple(InstructionType::SaveBp)); // 2 bytes
        program.add(Instruction::new_cptopsp(-4, 4)); // 8 bytes
        program.add(Instruction::new_consts("ab")); // 4 + 2 bytes
        program.add(Instruction::simple(InstructionType::Retn));

        let offsets: Vec<u32> = program.instructions().map(|i| i.offset).collect();
        assert_eq!(offsets, vec![13, 15, 23, 29]);
        assert_eq!(program.length(), 31);
    }

    #[test]
    fn instruction_at_miss_is_an_error() {
        let mut program = ScriptProgram::new("test");
        program.add(Instruction::new_consti(1));
        assert!(matches!(
            program.instruction_at(14),
            Err(ScriptError::InvalidOffset { offset: 14 })
        ));
    }

    #[test]
    fn store_state_width_covers_both_sizes() {
        // 2-byte header + two u32 payload fields
        assert_eq!(Instruction::new_store_state(8, 4).encoded_len(), 10);
        assert_eq!(Instruction::new_action(7, 2).encoded_len(), 5);
        assert_eq!(Instruction::new_destruct(16, 4, 4).encoded_len(), 8);
    }
}
