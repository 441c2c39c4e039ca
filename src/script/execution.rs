//! Core execution engine.
//!
//! One [`ScriptExecution`] owns one run of one program: the operand stack,
//! the return-address stack, the global-count marker, and the in-progress
//! saved state. Programs and routine tables are shared read-only; everything
//! else is confined to the run.

use crate::script::context::{ExecutionContext, ExecutionState};
use crate::script::errors::ScriptError;
use crate::script::instrutil::describe_instruction;
use crate::script::isa::InstructionType;
use crate::script::program::{Instruction, ScriptProgram, START_OFFSET};
use crate::script::variable::{Variable, VariableType, Vector, OBJECT_SELF};
use crate::utils::log::{self, Level};
use crate::{debug, error, info};
use std::sync::Arc;

/// Result reported when a run halts without an integer on top of the stack.
pub const NO_RESULT: i32 = -1;

/// Tolerance for float equality comparisons.
const FLOAT_TOLERANCE: f32 = 1e-5;

/// Offset skipped past a `STORE_STATE` when resuming: the instruction itself
/// plus the guard jump compilers emit right after it.
const STORE_STATE_RESUME_SKIP: u32 = 0x10;

/// One run of a compiled script, from entry or a resumed offset to
/// completion or the first unrecoverable fault.
pub struct ScriptExecution {
    program: Arc<ScriptProgram>,
    context: ExecutionContext,
    stack: Vec<Variable>,
    return_offsets: Vec<u32>,
    next_instruction: u32,
    global_count: usize,
    saved_state: Option<ExecutionState>,
}

impl ScriptExecution {
    pub fn new(program: Arc<ScriptProgram>, context: ExecutionContext) -> Self {
        Self {
            program,
            context,
            stack: Vec::new(),
            return_offsets: Vec::new(),
            next_instruction: 0,
            global_count: 0,
            saved_state: None,
        }
    }

    /// Executes the program until it ends, returns past the outermost
    /// subroutine, or faults.
    ///
    /// Starts at the fixed code entry offset unless the context carries a
    /// saved state, in which case the stack is rebuilt from the captured
    /// globals and locals and execution resumes at the recorded offset.
    /// Returns the top-of-stack integer at halt, [`NO_RESULT`] otherwise.
    pub fn run(&mut self) -> i32 {
        let mut ins_off = START_OFFSET;

        if let Some(state) = &self.context.saved_state {
            self.stack.extend(state.globals.iter().cloned());
            self.global_count = self.stack.len();
            self.stack.extend(state.locals.iter().cloned());
            ins_off = state.ins_offset;
        }

        debug!(
            "Run '{}': offset={:04x}, caller={}, triggerer={}",
            self.program.name(),
            ins_off,
            self.context.caller_id,
            self.context.triggerer_id
        );

        while ins_off < self.program.length() {
            let ins = match self.program.instruction_at(ins_off) {
                Ok(ins) => ins.clone(),
                Err(err) => {
                    error!("Halt '{}': {}", self.program.name(), err);
                    return NO_RESULT;
                }
            };
            self.next_instruction = ins.next_offset;

            if log::enabled(Level::Debug) {
                debug!(
                    "Instruction: {}",
                    describe_instruction(&ins, Some(self.context.routines.as_ref()))
                );
            }
            if let Err(err) = self.execute(&ins) {
                match err {
                    ScriptError::UnhandledInstruction { mnemonic } => {
                        info!("Instruction not implemented: {}", mnemonic);
                    }
                    err => {
                        error!("Halt '{}': {}", self.program.name(), err);
                    }
                }
                return NO_RESULT;
            }

            ins_off = self.next_instruction;
        }

        if let Some(Variable::Int(value)) = self.stack.last() {
            return *value;
        }
        NO_RESULT
    }

    fn execute(&mut self, ins: &Instruction) -> Result<(), ScriptError> {
        match ins.ins_type {
            InstructionType::Nop | InstructionType::Nop2 => Ok(()),
            InstructionType::CpDownSp => self.op_copy_down(self.stack.len(), ins),
            InstructionType::CpDownBp => self.op_copy_down(self.global_count, ins),
            InstructionType::CpTopSp => self.op_copy_top(self.stack.len(), ins),
            InstructionType::CpTopBp => self.op_copy_top(self.global_count, ins),
            InstructionType::RsAddI => self.op_reserve(VariableType::Int),
            InstructionType::RsAddF => self.op_reserve(VariableType::Float),
            InstructionType::RsAddS => self.op_reserve(VariableType::String),
            InstructionType::RsAddO => self.op_reserve(VariableType::Object),
            InstructionType::RsAddEff => self.op_reserve(VariableType::Effect),
            InstructionType::RsAddEvt => self.op_reserve(VariableType::Event),
            InstructionType::RsAddLoc => self.op_reserve(VariableType::Location),
            InstructionType::RsAddTal => self.op_reserve(VariableType::Talent),
            InstructionType::ConstI => {
                self.stack.push(Variable::Int(ins.int_value));
                Ok(())
            }
            InstructionType::ConstF => {
                self.stack.push(Variable::Float(ins.float_value));
                Ok(())
            }
            InstructionType::ConstS => {
                self.stack.push(Variable::String(ins.str_value.clone()));
                Ok(())
            }
            InstructionType::ConstO => self.op_const_object(ins),
            InstructionType::Action => self.op_call_routine(ins),
            InstructionType::LogAndII => {
                self.op_binary_int(|left, right| (left != 0 && right != 0) as i32)
            }
            InstructionType::LogOrII => {
                self.op_binary_int(|left, right| (left != 0 || right != 0) as i32)
            }
            InstructionType::IncOrII => self.op_binary_int(|left, right| left | right),
            InstructionType::ExcOrII => self.op_binary_int(|left, right| left ^ right),
            InstructionType::BoolAndII => self.op_binary_int(|left, right| left & right),
            InstructionType::EqualII => self.op_binary_int(|left, right| (left == right) as i32),
            InstructionType::NequalII => self.op_binary_int(|left, right| (left != right) as i32),
            InstructionType::GeqII => self.op_binary_int(|left, right| (left >= right) as i32),
            InstructionType::GtII => self.op_binary_int(|left, right| (left > right) as i32),
            InstructionType::LtII => self.op_binary_int(|left, right| (left < right) as i32),
            InstructionType::LeqII => self.op_binary_int(|left, right| (left <= right) as i32),
            InstructionType::EqualFF => self.op_binary_float_pred(|left, right| {
                (left - right).abs() < FLOAT_TOLERANCE
            }),
            InstructionType::NequalFF => self.op_binary_float_pred(|left, right| left != right),
            InstructionType::GeqFF => self.op_binary_float_pred(|left, right| left >= right),
            InstructionType::GtFF => self.op_binary_float_pred(|left, right| left > right),
            InstructionType::LtFF => self.op_binary_float_pred(|left, right| left < right),
            InstructionType::LeqFF => self.op_binary_float_pred(|left, right| left <= right),
            InstructionType::EqualSS => self.op_equal_typed(VariableType::String, false),
            InstructionType::NequalSS => self.op_equal_typed(VariableType::String, true),
            InstructionType::EqualOO => self.op_equal_typed(VariableType::Object, false),
            InstructionType::NequalOO => self.op_equal_typed(VariableType::Object, true),
            InstructionType::EqualEffEff => self.op_equal_typed(VariableType::Effect, false),
            InstructionType::NequalEffEff => self.op_equal_typed(VariableType::Effect, true),
            InstructionType::EqualEvtEvt => self.op_equal_typed(VariableType::Event, false),
            InstructionType::NequalEvtEvt => self.op_equal_typed(VariableType::Event, true),
            InstructionType::EqualLocLoc => self.op_equal_typed(VariableType::Location, false),
            InstructionType::NequalLocLoc => self.op_equal_typed(VariableType::Location, true),
            InstructionType::EqualTalTal => self.op_equal_typed(VariableType::Talent, false),
            InstructionType::NequalTalTal => self.op_equal_typed(VariableType::Talent, true),
            InstructionType::EqualTT => self.op_equal_struct(ins, false),
            InstructionType::NequalTT => self.op_equal_struct(ins, true),
            InstructionType::ShLeftII => {
                self.op_binary_int(|left, right| left.wrapping_shl(right as u32))
            }
            InstructionType::ShRightII => self.op_binary_int(|left, right| {
                // Shifting negatives rounds toward zero, not toward -inf.
                if left < 0 {
                    -(left.wrapping_neg().wrapping_shr(right as u32))
                } else {
                    left.wrapping_shr(right as u32)
                }
            }),
            InstructionType::UShRightII => {
                // Signed shift: compiled scripts depend on the engine's
                // known behavior here.
                self.op_binary_int(|left, right| left.wrapping_shr(right as u32))
            }
            InstructionType::AddII => self.op_arith(VariableType::Int, VariableType::Int, Variable::add),
            InstructionType::AddIF => self.op_arith(VariableType::Int, VariableType::Float, Variable::add),
            InstructionType::AddFI => self.op_arith(VariableType::Float, VariableType::Int, Variable::add),
            InstructionType::AddFF => {
                self.op_arith(VariableType::Float, VariableType::Float, Variable::add)
            }
            InstructionType::AddSS => {
                self.op_arith(VariableType::String, VariableType::String, Variable::add)
            }
            InstructionType::AddVV => self.op_arith_vv(Variable::add),
            InstructionType::SubII => self.op_arith(VariableType::Int, VariableType::Int, Variable::sub),
            InstructionType::SubIF => self.op_arith(VariableType::Int, VariableType::Float, Variable::sub),
            InstructionType::SubFI => self.op_arith(VariableType::Float, VariableType::Int, Variable::sub),
            InstructionType::SubFF => {
                self.op_arith(VariableType::Float, VariableType::Float, Variable::sub)
            }
            InstructionType::SubVV => self.op_arith_vv(Variable::sub),
            InstructionType::MulII => self.op_arith(VariableType::Int, VariableType::Int, Variable::mul),
            InstructionType::MulIF => self.op_arith(VariableType::Int, VariableType::Float, Variable::mul),
            InstructionType::MulFI => self.op_arith(VariableType::Float, VariableType::Int, Variable::mul),
            InstructionType::MulFF => {
                self.op_arith(VariableType::Float, VariableType::Float, Variable::mul)
            }
            InstructionType::MulVF => self.op_arith_vf(Variable::mul),
            InstructionType::MulFV => self.op_arith_fv(Variable::mul),
            InstructionType::DivII => self.op_arith(VariableType::Int, VariableType::Int, Variable::div),
            InstructionType::DivIF => self.op_arith(VariableType::Int, VariableType::Float, Variable::div),
            InstructionType::DivFI => self.op_arith(VariableType::Float, VariableType::Int, Variable::div),
            InstructionType::DivFF => {
                self.op_arith(VariableType::Float, VariableType::Float, Variable::div)
            }
            InstructionType::DivVF => self.op_arith_vf(Variable::div),
            InstructionType::DivFV => self.op_arith_fv(Variable::div),
            InstructionType::ModII => self.op_binary_int_checked(|left, right| {
                if right == 0 {
                    Err(ScriptError::DivisionByZero)
                } else {
                    Ok(left.wrapping_rem(right))
                }
            }),
            InstructionType::NegI => self.op_negate(VariableType::Int),
            InstructionType::NegF => self.op_negate(VariableType::Float),
            InstructionType::CompI => Err(ScriptError::UnhandledInstruction {
                mnemonic: ins.ins_type.mnemonic(),
            }),
            InstructionType::MovSp => self.op_move_sp(ins),
            InstructionType::Jmp => {
                self.next_instruction = ins.jump_target;
                Ok(())
            }
            InstructionType::Jsr => {
                self.return_offsets.push(ins.next_offset);
                self.next_instruction = ins.jump_target;
                Ok(())
            }
            InstructionType::Jz => {
                if self.pop_int()? == 0 {
                    self.next_instruction = ins.jump_target;
                }
                Ok(())
            }
            InstructionType::Jnz => {
                if self.pop_int()? != 0 {
                    self.next_instruction = ins.jump_target;
                }
                Ok(())
            }
            InstructionType::Retn => {
                self.next_instruction = match self.return_offsets.pop() {
                    Some(offset) => offset,
                    None => self.program.length(),
                };
                Ok(())
            }
            InstructionType::Destruct => self.op_destruct(ins),
            InstructionType::NotI => {
                let value = self.pop_int()?;
                self.stack.push(Variable::Int((value == 0) as i32));
                Ok(())
            }
            InstructionType::DecISp => self.op_increment(self.stack.len(), ins.stack_offset, -1),
            InstructionType::IncISp => self.op_increment(self.stack.len(), ins.stack_offset, 1),
            InstructionType::DecIBp => self.op_increment(self.global_count, ins.stack_offset, -1),
            InstructionType::IncIBp => self.op_increment(self.global_count, ins.stack_offset, 1),
            InstructionType::SaveBp => {
                self.global_count = self.stack.len();
                self.stack.push(Variable::Int(self.global_count as i32));
                Ok(())
            }
            InstructionType::RestoreBp => {
                let value = self.pop_int()?;
                if value < 0 || value as usize > self.stack.len() {
                    return Err(ScriptError::StackIndexOutOfBounds {
                        index: value as i64,
                        size: self.stack.len(),
                    });
                }
                self.global_count = value as usize;
                Ok(())
            }
            InstructionType::StoreState => self.op_store_state(ins),
        }
    }

    // ==================== Handlers ====================

    fn op_copy_down(&mut self, base: usize, ins: &Instruction) -> Result<(), ScriptError> {
        let count = (ins.size / 4) as usize;
        let len = self.stack.len();
        if count > len {
            return Err(ScriptError::StackUnderflow);
        }
        let src = len - count;
        let dst = self.cell_index(base, ins.stack_offset)?;
        if dst + count > len {
            return Err(ScriptError::StackIndexOutOfBounds {
                index: (dst + count) as i64,
                size: len,
            });
        }
        for i in 0..count {
            self.stack[dst + i] = self.stack[src + i].clone();
        }
        Ok(())
    }

    fn op_copy_top(&mut self, base: usize, ins: &Instruction) -> Result<(), ScriptError> {
        let count = (ins.size / 4) as usize;
        let src = self.cell_index(base, ins.stack_offset)?;
        if src + count > self.stack.len() {
            return Err(ScriptError::StackIndexOutOfBounds {
                index: (src + count) as i64,
                size: self.stack.len(),
            });
        }
        for i in 0..count {
            let var = self.stack[src + i].clone();
            self.stack.push(var);
        }
        Ok(())
    }

    fn op_reserve(&mut self, var_type: VariableType) -> Result<(), ScriptError> {
        self.stack.push(Variable::default_for(var_type));
        Ok(())
    }

    fn op_const_object(&mut self, ins: &Instruction) -> Result<(), ScriptError> {
        let object_id = if ins.object_id == OBJECT_SELF {
            self.context.caller_id
        } else {
            ins.object_id
        };
        self.stack.push(Variable::Object(object_id));
        Ok(())
    }

    fn op_call_routine(&mut self, ins: &Instruction) -> Result<(), ScriptError> {
        let routines = Arc::clone(&self.context.routines);
        let routine = routines.get(ins.routine)?;
        if ins.arg_count as usize > routine.argument_count() {
            return Err(ScriptError::TooManyArguments {
                routine: routine.name().to_string(),
                arg_count: ins.arg_count,
                declared: routine.argument_count(),
            });
        }

        let mut args = Vec::with_capacity(ins.arg_count as usize);
        for i in 0..ins.arg_count as usize {
            match routine.argument_type(i) {
                Some(VariableType::Vector) => {
                    args.push(Variable::Vector(self.pop_vector()?));
                }
                Some(VariableType::Action) => {
                    let mut ctx = self.context.clone();
                    ctx.saved_state = self.saved_state.clone();
                    args.push(Variable::Action(Arc::new(ctx)));
                }
                Some(expected) => {
                    let var = self.pop()?;
                    if var.var_type() != expected {
                        return Err(ScriptError::TypeMismatch {
                            expected,
                            actual: var.var_type(),
                        });
                    }
                    args.push(var);
                }
                None => {
                    return Err(ScriptError::TooManyArguments {
                        routine: routine.name().to_string(),
                        arg_count: ins.arg_count,
                        declared: routine.argument_count(),
                    })
                }
            }
        }

        let ret = routine.invoke(&args, &self.context)?;
        if log::enabled(Level::Debug) {
            let arg_strings: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
            debug!(
                "Action: {:04x} {}({}) -> {}",
                ins.offset,
                routine.name(),
                arg_strings.join(", "),
                ret
            );
        }
        match ret {
            Variable::Void => {}
            Variable::Vector(value) => {
                self.stack.push(Variable::Float(value.z));
                self.stack.push(Variable::Float(value.y));
                self.stack.push(Variable::Float(value.x));
            }
            value => self.stack.push(value),
        }
        Ok(())
    }

    fn op_binary_int(&mut self, f: impl Fn(i32, i32) -> i32) -> Result<(), ScriptError> {
        self.op_binary_int_checked(|left, right| Ok(f(left, right)))
    }

    fn op_binary_int_checked(
        &mut self,
        f: impl Fn(i32, i32) -> Result<i32, ScriptError>,
    ) -> Result<(), ScriptError> {
        let right = self.pop_int()?;
        let left = self.pop_int()?;
        self.stack.push(Variable::Int(f(left, right)?));
        Ok(())
    }

    fn op_binary_float_pred(&mut self, f: impl Fn(f32, f32) -> bool) -> Result<(), ScriptError> {
        let right = self.pop_float()?;
        let left = self.pop_float()?;
        self.stack.push(Variable::Int(f(left, right) as i32));
        Ok(())
    }

    fn op_equal_typed(
        &mut self,
        expected: VariableType,
        negate: bool,
    ) -> Result<(), ScriptError> {
        let right = self.pop_expect(expected)?;
        let left = self.pop_expect(expected)?;
        let equal = left == right;
        self.stack.push(Variable::Int((equal != negate) as i32));
        Ok(())
    }

    fn op_equal_struct(&mut self, ins: &Instruction, negate: bool) -> Result<(), ScriptError> {
        let count = (ins.size / 4) as usize;
        let mut first = Vec::with_capacity(count);
        for _ in 0..count {
            first.push(self.pop()?);
        }
        let mut second = Vec::with_capacity(count);
        for _ in 0..count {
            second.push(self.pop()?);
        }
        let equal = first == second;
        self.stack.push(Variable::Int((equal != negate) as i32));
        Ok(())
    }

    fn op_arith(
        &mut self,
        left_type: VariableType,
        right_type: VariableType,
        op: fn(&Variable, &Variable) -> Result<Variable, ScriptError>,
    ) -> Result<(), ScriptError> {
        let right = self.pop_expect(right_type)?;
        let left = self.pop_expect(left_type)?;
        let result = op(&left, &right)?;
        self.stack.push(result);
        Ok(())
    }

    fn op_arith_vv(
        &mut self,
        op: fn(&Variable, &Variable) -> Result<Variable, ScriptError>,
    ) -> Result<(), ScriptError> {
        let right = Variable::Vector(self.pop_vector()?);
        let left = Variable::Vector(self.pop_vector()?);
        self.push_vector_result(op(&left, &right)?)
    }

    fn op_arith_vf(
        &mut self,
        op: fn(&Variable, &Variable) -> Result<Variable, ScriptError>,
    ) -> Result<(), ScriptError> {
        let right = self.pop_expect(VariableType::Float)?;
        let left = Variable::Vector(self.pop_vector()?);
        self.push_vector_result(op(&left, &right)?)
    }

    fn op_arith_fv(
        &mut self,
        op: fn(&Variable, &Variable) -> Result<Variable, ScriptError>,
    ) -> Result<(), ScriptError> {
        let right = Variable::Vector(self.pop_vector()?);
        let left = self.pop_expect(VariableType::Float)?;
        self.push_vector_result(op(&left, &right)?)
    }

    fn push_vector_result(&mut self, result: Variable) -> Result<(), ScriptError> {
        match result {
            Variable::Vector(value) => {
                self.stack.push(Variable::Float(value.x));
                self.stack.push(Variable::Float(value.y));
                self.stack.push(Variable::Float(value.z));
                Ok(())
            }
            other => Err(ScriptError::TypeMismatch {
                expected: VariableType::Vector,
                actual: other.var_type(),
            }),
        }
    }

    fn op_negate(&mut self, expected: VariableType) -> Result<(), ScriptError> {
        let top = self.stack.last_mut().ok_or(ScriptError::StackUnderflow)?;
        match (expected, top) {
            (VariableType::Int, Variable::Int(value)) => {
                *value = value.wrapping_neg();
                Ok(())
            }
            (VariableType::Float, Variable::Float(value)) => {
                *value = -*value;
                Ok(())
            }
            (expected, top) => Err(ScriptError::TypeMismatch {
                expected,
                actual: top.var_type(),
            }),
        }
    }

    fn op_move_sp(&mut self, ins: &Instruction) -> Result<(), ScriptError> {
        let count = (-ins.stack_offset / 4).max(0) as usize;
        for _ in 0..count {
            self.pop()?;
        }
        Ok(())
    }

    fn op_destruct(&mut self, ins: &Instruction) -> Result<(), ScriptError> {
        let count = (ins.size / 4) as usize;
        let keep = (ins.size_no_destroy / 4) as usize;
        let len = self.stack.len();
        if count > len {
            return Err(ScriptError::StackUnderflow);
        }
        let start = len - count;
        let keep_start = start as i64 + (ins.stack_offset / 4) as i64;
        if keep_start < 0 || keep_start as usize + keep > len {
            return Err(ScriptError::StackIndexOutOfBounds {
                index: keep_start,
                size: len,
            });
        }
        let keep_start = keep_start as usize;
        for i in 0..keep {
            self.stack[start + i] = self.stack[keep_start + i].clone();
        }
        self.stack.truncate(start + keep);
        Ok(())
    }

    fn op_increment(
        &mut self,
        base: usize,
        stack_offset: i32,
        delta: i32,
    ) -> Result<(), ScriptError> {
        let index = self.cell_index(base, stack_offset)?;
        match &mut self.stack[index] {
            Variable::Int(value) => {
                *value = value.wrapping_add(delta);
                Ok(())
            }
            other => Err(ScriptError::TypeMismatch {
                expected: VariableType::Int,
                actual: other.var_type(),
            }),
        }
    }

    fn op_store_state(&mut self, ins: &Instruction) -> Result<(), ScriptError> {
        let count = (ins.size / 4) as usize;
        if self.global_count > self.stack.len() || count > self.global_count {
            return Err(ScriptError::StackIndexOutOfBounds {
                index: self.global_count as i64 - count as i64,
                size: self.stack.len(),
            });
        }
        let globals = self.stack[self.global_count - count..self.global_count].to_vec();

        let locals_count = (ins.size_locals / 4) as usize;
        if locals_count > self.stack.len() {
            return Err(ScriptError::StackUnderflow);
        }
        let locals = self.stack[self.stack.len() - locals_count..].to_vec();

        self.saved_state = Some(ExecutionState {
            program: Arc::clone(&self.program),
            ins_offset: ins.offset + STORE_STATE_RESUME_SKIP,
            globals,
            locals,
        });
        Ok(())
    }

    // ==================== Stack access ====================

    fn pop(&mut self) -> Result<Variable, ScriptError> {
        self.stack.pop().ok_or(ScriptError::StackUnderflow)
    }

    fn pop_expect(&mut self, expected: VariableType) -> Result<Variable, ScriptError> {
        let var = self.pop()?;
        if var.var_type() != expected {
            return Err(ScriptError::TypeMismatch {
                expected,
                actual: var.var_type(),
            });
        }
        Ok(var)
    }

    fn pop_int(&mut self) -> Result<i32, ScriptError> {
        match self.pop()? {
            Variable::Int(value) => Ok(value),
            other => Err(ScriptError::TypeMismatch {
                expected: VariableType::Int,
                actual: other.var_type(),
            }),
        }
    }

    fn pop_float(&mut self) -> Result<f32, ScriptError> {
        match self.pop()? {
            Variable::Float(value) => Ok(value),
            other => Err(ScriptError::TypeMismatch {
                expected: VariableType::Float,
                actual: other.var_type(),
            }),
        }
    }

    /// Pops three float cells, reading z from the top.
    fn pop_vector(&mut self) -> Result<Vector, ScriptError> {
        let z = self.pop_float()?;
        let y = self.pop_float()?;
        let x = self.pop_float()?;
        Ok(Vector::new(x, y, z))
    }

    fn cell_index(&self, base: usize, stack_offset: i32) -> Result<usize, ScriptError> {
        let index = base as i64 + (stack_offset / 4) as i64;
        if index < 0 || index >= self.stack.len() as i64 {
            return Err(ScriptError::StackIndexOutOfBounds {
                index,
                size: self.stack.len(),
            });
        }
        Ok(index as usize)
    }

    // ==================== Introspection ====================

    /// Pushes a value onto the operand stack before the run starts, used by
    /// hosts to seed parameters.
    pub fn stack_push(&mut self, var: Variable) {
        self.stack.push(var);
    }

    pub fn stack_size(&self) -> usize {
        self.stack.len()
    }

    pub fn stack_variable(&self, index: usize) -> Option<&Variable> {
        self.stack.get(index)
    }

    /// State captured by the last `STORE_STATE`, if any.
    pub fn saved_state(&self) -> Option<&ExecutionState> {
        self.saved_state.as_ref()
    }
}
