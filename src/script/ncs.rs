//! NCS binary container reader and writer.
//!
//! The container is big-endian: an 8-byte signature, a program-type byte,
//! the u32 total length, then one instruction after another (opcode byte,
//! qualifier byte, opcode-specific payload) until the cursor reaches the
//! declared length. Relative jump displacements are resolved to absolute
//! targets while decoding.

use crate::script::errors::ScriptError;
use crate::script::isa::{InstructionType, PayloadKind};
use crate::script::program::{Instruction, ScriptProgram};
use bytes::Bytes;

/// Signature identifying a compiled script image.
const SIGNATURE: &[u8; 8] = b"NCS V1.0";

/// Program-type byte following the signature.
const PROGRAM_TYPE: u8 = 0x42;

/// Cursor-based decoder for one NCS image.
pub struct NcsReader {
    data: Bytes,
    pos: usize,
}

impl NcsReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Decodes the whole image into a [`ScriptProgram`].
    ///
    /// Unknown opcode/qualifier pairs and truncated payloads abort the load;
    /// a partially decoded program is never returned.
    pub fn load(mut self, name: impl Into<String>) -> Result<ScriptProgram, ScriptError> {
        let signature = self.read_exact(SIGNATURE.len())?;
        if signature != SIGNATURE.as_slice() {
            return Err(ScriptError::DecodeError {
                reason: "bad signature".to_string(),
            });
        }
        if self.read_u8()? != PROGRAM_TYPE {
            return Err(ScriptError::DecodeError {
                reason: "bad program type".to_string(),
            });
        }
        let length = self.read_u32()?;
        if length as usize > self.data.len() {
            return Err(ScriptError::DecodeError {
                reason: "declared length exceeds image".to_string(),
            });
        }

        let mut program = ScriptProgram::new(name);
        while program.length() < length {
            let ins = self.read_instruction(program.length())?;
            program.add(ins);
        }
        Ok(program)
    }

    fn read_instruction(&mut self, offset: u32) -> Result<Instruction, ScriptError> {
        let bytecode = self.read_u8()?;
        let qualifier = self.read_u8()?;
        let ins_type = InstructionType::decode(bytecode, qualifier, offset)?;

        let mut ins = Instruction::simple(ins_type);
        match ins_type.payload_kind() {
            PayloadKind::None => {}
            PayloadKind::CopySize => {
                ins.stack_offset = self.read_i32()?;
                ins.size = self.read_u16()? as u32;
            }
            PayloadKind::Adjust => {
                ins.stack_offset = self.read_i32()?;
            }
            PayloadKind::Jump => {
                let displacement = self.read_i32()?;
                ins.jump_target = (offset as i64 + displacement as i64) as u32;
            }
            PayloadKind::IntLit => {
                ins.int_value = self.read_i32()?;
            }
            PayloadKind::FloatLit => {
                ins.float_value = self.read_f32()?;
            }
            PayloadKind::StrLit => {
                let len = self.read_u16()? as usize;
                let bytes = self.read_exact(len)?;
                ins.str_value =
                    String::from_utf8(bytes.to_vec()).map_err(|_| ScriptError::DecodeError {
                        reason: format!("invalid utf8 in string constant at {:04x}", offset),
                    })?;
            }
            PayloadKind::ObjLit => {
                ins.object_id = self.read_i32()? as u32;
            }
            PayloadKind::Call => {
                ins.routine = self.read_u16()?;
                ins.arg_count = self.read_u8()?;
            }
            PayloadKind::Destruct => {
                ins.size = self.read_u16()? as u32;
                ins.stack_offset = self.read_i16()? as i32;
                ins.size_no_destroy = self.read_u16()?;
            }
            PayloadKind::StoreState => {
                ins.size = self.read_u32()?;
                ins.size_locals = self.read_u32()?;
            }
            PayloadKind::StructSize => {
                ins.size = self.read_u16()? as u32;
            }
        }
        Ok(ins)
    }

    /// Reads exactly `count` bytes, advancing the cursor.
    fn read_exact(&mut self, count: usize) -> Result<&[u8], ScriptError> {
        let start = self.pos;
        let end = start
            .checked_add(count)
            .ok_or(ScriptError::UnexpectedEndOfProgram {
                offset: start,
                requested: count,
            })?;
        let slice = self
            .data
            .get(start..end)
            .ok_or(ScriptError::UnexpectedEndOfProgram {
                offset: start,
                requested: count,
            })?;
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, ScriptError> {
        Ok(self.read_exact(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, ScriptError> {
        let bytes = self.read_exact(2)?;
        Ok(u16::from_be_bytes(bytes.try_into().expect("read_exact")))
    }

    fn read_i16(&mut self) -> Result<i16, ScriptError> {
        let bytes = self.read_exact(2)?;
        Ok(i16::from_be_bytes(bytes.try_into().expect("read_exact")))
    }

    fn read_u32(&mut self) -> Result<u32, ScriptError> {
        let bytes = self.read_exact(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().expect("read_exact")))
    }

    fn read_i32(&mut self) -> Result<i32, ScriptError> {
        let bytes = self.read_exact(4)?;
        Ok(i32::from_be_bytes(bytes.try_into().expect("read_exact")))
    }

    fn read_f32(&mut self) -> Result<f32, ScriptError> {
        let bytes = self.read_exact(4)?;
        Ok(f32::from_be_bytes(bytes.try_into().expect("read_exact")))
    }
}

/// Encodes a program back into its portable binary form.
///
/// Jump targets are re-encoded as relative displacements; the output decodes
/// to an identical program.
pub fn write(program: &ScriptProgram) -> Vec<u8> {
    let mut out = Vec::with_capacity(program.length() as usize);
    out.extend_from_slice(SIGNATURE);
    out.push(PROGRAM_TYPE);
    out.extend_from_slice(&program.length().to_be_bytes());

    for ins in program.instructions() {
        out.push(ins.ins_type.bytecode());
        out.push(ins.ins_type.qualifier());
        match ins.ins_type.payload_kind() {
            PayloadKind::None => {}
            PayloadKind::CopySize => {
                out.extend_from_slice(&ins.stack_offset.to_be_bytes());
                out.extend_from_slice(&(ins.size as u16).to_be_bytes());
            }
            PayloadKind::Adjust => {
                out.extend_from_slice(&ins.stack_offset.to_be_bytes());
            }
            PayloadKind::Jump => {
                let displacement = ins.jump_target as i64 - ins.offset as i64;
                out.extend_from_slice(&(displacement as i32).to_be_bytes());
            }
            PayloadKind::IntLit => {
                out.extend_from_slice(&ins.int_value.to_be_bytes());
            }
            PayloadKind::FloatLit => {
                out.extend_from_slice(&ins.float_value.to_be_bytes());
            }
            PayloadKind::StrLit => {
                out.extend_from_slice(&(ins.str_value.len() as u16).to_be_bytes());
                out.extend_from_slice(ins.str_value.as_bytes());
            }
            PayloadKind::ObjLit => {
                out.extend_from_slice(&(ins.object_id as i32).to_be_bytes());
            }
            PayloadKind::Call => {
                out.extend_from_slice(&ins.routine.to_be_bytes());
                out.push(ins.arg_count);
            }
            PayloadKind::Destruct => {
                out.extend_from_slice(&(ins.size as u16).to_be_bytes());
                out.extend_from_slice(&(ins.stack_offset as i16).to_be_bytes());
                out.extend_from_slice(&ins.size_no_destroy.to_be_bytes());
            }
            PayloadKind::StoreState => {
                out.extend_from_slice(&ins.size.to_be_bytes());
                out.extend_from_slice(&ins.size_locals.to_be_bytes());
            }
            PayloadKind::StructSize => {
                out.extend_from_slice(&(ins.size as u16).to_be_bytes());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::program::START_OFFSET;

    fn representative_program() -> ScriptProgram {
        let mut program = ScriptProgram::new("roundtrip");
        program.add(Instruction::new_consti(42));
        program.add(Instruction::new_constf(1.5));
        program.add(Instruction::new_consts("hello"));
        program.add(Instruction::new_consto(0));
        program.add(Instruction::new_cptopsp(-8, 8));
        program.add(Instruction::new_jz(62));
        program.add(Instruction::new_action(7, 2));
        program.add(Instruction::new_destruct(16, 4, 4));
        program.add(Instruction::new_store_state(8, 4));
        program.add(Instruction::simple(InstructionType::Retn));
        program
    }

    #[test]
    fn write_read_round_trip() {
        let program = representative_program();
        let image = write(&program);
        assert_eq!(image.len(), program.length() as usize);

        let decoded = NcsReader::new(image).load("roundtrip").unwrap();
        assert_eq!(decoded.length(), program.length());
        let original: Vec<_> = program.instructions().collect();
        let restored: Vec<_> = decoded.instructions().collect();
        assert_eq!(original, restored);
    }

    #[test]
    fn jump_displacements_resolve_to_absolute_targets() {
        let mut program = ScriptProgram::new("jumps");
        program.add(Instruction::new_jmp(19)); // forward to next instruction
        program.add(Instruction::new_jsr(13)); // backward to the first
        let image = write(&program);

        let decoded = NcsReader::new(image).load("jumps").unwrap();
        assert_eq!(decoded.instruction_at(13).unwrap().jump_target, 19);
        assert_eq!(decoded.instruction_at(19).unwrap().jump_target, 13);
    }

    #[test]
    fn load_bad_signature() {
        let mut image = write(&representative_program());
        image[0] = b'X';
        let err = NcsReader::new(image).load("bad").unwrap_err();
        assert!(matches!(err, ScriptError::DecodeError { ref reason } if reason == "bad signature"));
    }

    #[test]
    fn load_bad_program_type() {
        let mut image = write(&representative_program());
        image[8] = 0x00;
        let err = NcsReader::new(image).load("bad").unwrap_err();
        assert!(
            matches!(err, ScriptError::DecodeError { ref reason } if reason == "bad program type")
        );
    }

    #[test]
    fn load_declared_length_beyond_image() {
        let mut program = ScriptProgram::new("short");
        program.add(Instruction::new_consti(1));
        let mut image = write(&program);
        image.truncate(image.len() - 2);
        let err = NcsReader::new(image).load("short").unwrap_err();
        assert!(matches!(
            err,
            ScriptError::DecodeError { ref reason } if reason == "declared length exceeds image"
        ));
    }

    #[test]
    fn load_unknown_opcode_is_fatal() {
        let mut image = Vec::new();
        image.extend_from_slice(SIGNATURE);
        image.push(PROGRAM_TYPE);
        image.extend_from_slice(&(START_OFFSET + 2).to_be_bytes());
        image.push(0x1c); // unassigned opcode
        image.push(0x00);
        let err = NcsReader::new(image).load("unknown").unwrap_err();
        assert!(matches!(
            err,
            ScriptError::InvalidInstruction {
                bytecode: 0x1c,
                qualifier: 0x00,
                offset: 13,
            }
        ));
    }

    #[test]
    fn load_truncated_payload() {
        let mut image = Vec::new();
        image.extend_from_slice(SIGNATURE);
        image.push(PROGRAM_TYPE);
        image.extend_from_slice(&(START_OFFSET + 6).to_be_bytes());
        image.push(0x04); // CONSTI with only two payload bytes
        image.push(0x03);
        image.extend_from_slice(&[0x00, 0x2a]);
        let err = NcsReader::new(image).load("truncated").unwrap_err();
        assert!(matches!(err, ScriptError::UnexpectedEndOfProgram { .. }));
    }

    #[test]
    fn load_invalid_string_constant() {
        let mut program = ScriptProgram::new("utf8");
        program.add(Instruction::new_consts("ab"));
        let mut image = write(&program);
        let len = image.len();
        image[len - 2] = 0xff;
        image[len - 1] = 0xfe;
        let err = NcsReader::new(image).load("utf8").unwrap_err();
        assert!(matches!(err, ScriptError::DecodeError { .. }));
    }
}
