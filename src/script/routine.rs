//! Native routine signatures and the registration table.
//!
//! Routines are the narrow seam between scripts and the host engine: each
//! declares a name, a return type, and an ordered argument-type list, and is
//! invoked with a marshaled argument vector plus the read-only execution
//! context. The table is append-only and index-stable; compiled scripts
//! reference routines by registration index.

use crate::script::context::ExecutionContext;
use crate::script::errors::ScriptError;
use crate::script::variable::{Variable, VariableType};
use crate::warn;

/// Host-implemented function body of a routine.
pub type RoutineFn =
    Box<dyn Fn(&[Variable], &ExecutionContext) -> Result<Variable, ScriptError> + Send + Sync>;

/// One native routine: declared signature plus implementation.
pub struct Routine {
    name: String,
    return_type: VariableType,
    argument_types: Vec<VariableType>,
    func: RoutineFn,
}

impl Routine {
    pub fn new(
        name: impl Into<String>,
        return_type: VariableType,
        argument_types: Vec<VariableType>,
        func: RoutineFn,
    ) -> Self {
        Self {
            name: name.into(),
            return_type,
            argument_types,
            func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> VariableType {
        self.return_type
    }

    pub fn argument_count(&self) -> usize {
        self.argument_types.len()
    }

    pub fn argument_type(&self, index: usize) -> Option<VariableType> {
        self.argument_types.get(index).copied()
    }

    /// Invokes the routine and validates its result against the declared
    /// return type.
    ///
    /// Routine-level faults (`RoutineNotImplemented`, `InvalidRoutineArgument`)
    /// are absorbed here for return types the script can keep running
    /// without: the routine logs a warning and yields the type's default
    /// value. Int, float, and action results have no such placeholder, so
    /// the fault escalates and aborts the run.
    pub fn invoke(
        &self,
        args: &[Variable],
        ctx: &ExecutionContext,
    ) -> Result<Variable, ScriptError> {
        match (self.func)(args, ctx) {
            Ok(value) => {
                let actual = value.var_type();
                if actual != self.return_type {
                    return Err(ScriptError::RoutineReturnMismatch {
                        name: self.name.clone(),
                        declared: self.return_type,
                        actual,
                    });
                }
                Ok(value)
            }
            Err(
                err @ (ScriptError::RoutineNotImplemented { .. }
                | ScriptError::InvalidRoutineArgument { .. }),
            ) => match self.return_type {
                VariableType::Int | VariableType::Float | VariableType::Action => Err(err),
                substitutable => {
                    warn!("{}, substituting {} default", err, substitutable);
                    Ok(Variable::default_for(substitutable))
                }
            },
            Err(err) => Err(err),
        }
    }
}

/// Append-only, index-stable table of native routines.
#[derive(Default)]
pub struct Routines {
    routines: Vec<Routine>,
}

impl Routines {
    pub fn new() -> Self {
        Self {
            routines: Vec::new(),
        }
    }

    /// Registers a routine and returns its index (= registration order).
    pub fn register(
        &mut self,
        name: impl Into<String>,
        return_type: VariableType,
        argument_types: Vec<VariableType>,
        func: RoutineFn,
    ) -> u16 {
        self.routines
            .push(Routine::new(name, return_type, argument_types, func));
        (self.routines.len() - 1) as u16
    }

    /// Looks a routine up by index. Out-of-range indices mean corrupt
    /// bytecode or a routine-table version mismatch.
    pub fn get(&self, index: u16) -> Result<&Routine, ScriptError> {
        self.routines
            .get(index as usize)
            .ok_or(ScriptError::InvalidRoutineIndex {
                index,
                count: self.routines.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::script::variable::OBJECT_INVALID;
    use std::sync::Arc;

    pub fn empty_context() -> ExecutionContext {
        ExecutionContext::new(Arc::new(Routines::new()))
    }

    fn not_implemented(name: &'static str) -> RoutineFn {
        Box::new(move |_, _| {
            Err(ScriptError::RoutineNotImplemented {
                name: name.to_string(),
            })
        })
    }

    #[test]
    fn register_is_index_stable() {
        let mut routines = Routines::new();
        let first = routines.register(
            "GetModule",
            VariableType::Object,
            vec![],
            Box::new(|_, _| Ok(Variable::Object(2))),
        );
        let second = routines.register(
            "Random",
            VariableType::Int,
            vec![VariableType::Int],
            Box::new(|_, _| Ok(Variable::Int(4))),
        );
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(routines.get(0).unwrap().name(), "GetModule");
        assert_eq!(routines.get(1).unwrap().name(), "Random");
        assert_eq!(routines.get(1).unwrap().argument_type(0), Some(VariableType::Int));
        assert_eq!(routines.get(1).unwrap().argument_type(1), None);
    }

    #[test]
    fn get_out_of_range() {
        let routines = Routines::new();
        assert!(matches!(
            routines.get(7),
            Err(ScriptError::InvalidRoutineIndex { index: 7, count: 0 })
        ));
    }

    #[test]
    fn invoke_checks_return_type() {
        let routine = Routine::new(
            "GetHitDice",
            VariableType::Int,
            vec![],
            Box::new(|_, _| Ok(Variable::Float(3.0))),
        );
        let err = routine.invoke(&[], &empty_context()).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::RoutineReturnMismatch {
                declared: VariableType::Int,
                actual: VariableType::Float,
                ..
            }
        ));
    }

    #[test]
    fn fault_substitutes_default_for_engine_types() {
        let routine = Routine::new(
            "EffectVisualEffect",
            VariableType::Effect,
            vec![VariableType::Int],
            not_implemented("EffectVisualEffect"),
        );
        let value = routine
            .invoke(&[Variable::Int(1)], &empty_context())
            .unwrap();
        assert_eq!(value, Variable::Effect(None));
    }

    #[test]
    fn fault_substitutes_defaults_for_value_types() {
        let routine = Routine::new(
            "GetName",
            VariableType::String,
            vec![VariableType::Object],
            not_implemented("GetName"),
        );
        let value = routine
            .invoke(&[Variable::Object(OBJECT_INVALID)], &empty_context())
            .unwrap();
        assert_eq!(value, Variable::String(String::new()));

        let routine = Routine::new(
            "GetFirstPC",
            VariableType::Object,
            vec![],
            not_implemented("GetFirstPC"),
        );
        let value = routine.invoke(&[], &empty_context()).unwrap();
        assert_eq!(value, Variable::Object(OBJECT_INVALID));
    }

    #[test]
    fn fault_escalates_for_numeric_returns() {
        let routine = Routine::new(
            "GetTimeHour",
            VariableType::Int,
            vec![],
            not_implemented("GetTimeHour"),
        );
        let err = routine.invoke(&[], &empty_context()).unwrap_err();
        assert!(matches!(err, ScriptError::RoutineNotImplemented { .. }));
    }

    #[test]
    fn bad_argument_fault_also_substitutes() {
        let routine = Routine::new(
            "GetPosition",
            VariableType::Vector,
            vec![VariableType::Object],
            Box::new(|_, _| {
                Err(ScriptError::InvalidRoutineArgument {
                    name: "GetPosition".to_string(),
                    reason: "expected a placed object".to_string(),
                })
            }),
        );
        let value = routine
            .invoke(&[Variable::Object(OBJECT_INVALID)], &empty_context())
            .unwrap();
        assert_eq!(value.var_type(), VariableType::Vector);
    }

    #[test]
    fn non_routine_errors_pass_through() {
        let routine = Routine::new(
            "ExecuteScript",
            VariableType::Void,
            vec![VariableType::String],
            Box::new(|_, _| Err(ScriptError::StackUnderflow)),
        );
        let err = routine.invoke(&[], &empty_context()).unwrap_err();
        assert!(matches!(err, ScriptError::StackUnderflow));
    }
}
