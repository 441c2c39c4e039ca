//! Human-readable instruction rendering for tooling and execution tracing.

use crate::script::isa::PayloadKind;
use crate::script::program::Instruction;
use crate::script::routine::Routines;

/// Renders one instruction as mnemonic plus operands.
///
/// When a routine table is given, call sites show the routine name;
/// otherwise the raw index is printed.
pub fn describe_instruction(ins: &Instruction, routines: Option<&Routines>) -> String {
    let mnemonic = ins.ins_type.mnemonic();
    match ins.ins_type.payload_kind() {
        PayloadKind::None => mnemonic.to_string(),
        PayloadKind::CopySize => format!("{} {}, {}", mnemonic, ins.stack_offset, ins.size),
        PayloadKind::Adjust => format!("{} {}", mnemonic, ins.stack_offset),
        PayloadKind::Jump => format!("{} {:04x}", mnemonic, ins.jump_target),
        PayloadKind::IntLit => format!("{} {}", mnemonic, ins.int_value),
        PayloadKind::FloatLit => format!("{} {}", mnemonic, ins.float_value),
        PayloadKind::StrLit => format!("{} \"{}\"", mnemonic, ins.str_value),
        PayloadKind::ObjLit => format!("{} {}", mnemonic, ins.object_id),
        PayloadKind::Call => {
            let name = routines
                .and_then(|table| table.get(ins.routine).ok())
                .map(|routine| routine.name().to_string())
                .unwrap_or_else(|| format!("#{}", ins.routine));
            format!("{} {}, {}", mnemonic, name, ins.arg_count)
        }
        PayloadKind::Destruct => format!(
            "{} {}, {}, {}",
            mnemonic, ins.size, ins.stack_offset, ins.size_no_destroy
        ),
        PayloadKind::StoreState => format!("{} {}, {}", mnemonic, ins.size, ins.size_locals),
        PayloadKind::StructSize => format!("{} {}", mnemonic, ins.size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::isa::InstructionType;
    use crate::script::variable::{Variable, VariableType};

    #[test]
    fn renders_payload_less_instructions() {
        let ins = Instruction::simple(InstructionType::SaveBp);
        assert_eq!(describe_instruction(&ins, None), "SAVEBP");
    }

    #[test]
    fn renders_operands() {
        assert_eq!(
            describe_instruction(&Instruction::new_cptopsp(-4, 8), None),
            "CPTOPSP -4, 8"
        );
        assert_eq!(
            describe_instruction(&Instruction::new_consts("hello"), None),
            "CONSTS \"hello\""
        );
        assert_eq!(
            describe_instruction(&Instruction::new_store_state(8, 4), None),
            "STORE_STATE 8, 4"
        );
    }

    #[test]
    fn renders_routine_names_when_table_given() {
        let mut routines = Routines::new();
        routines.register(
            "GetEnteringObject",
            VariableType::Object,
            vec![],
            Box::new(|_, _| Ok(Variable::Object(2))),
        );

        let ins = Instruction::new_action(0, 0);
        assert_eq!(
            describe_instruction(&ins, Some(&routines)),
            "ACTION GetEnteringObject, 0"
        );
        assert_eq!(describe_instruction(&ins, None), "ACTION #0, 0");
    }
}
