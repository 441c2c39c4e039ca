//! Per-run execution context and resumable saved state.

use crate::script::program::ScriptProgram;
use crate::script::routine::Routines;
use crate::script::variable::{Variable, OBJECT_INVALID};
use std::fmt;
use std::sync::Arc;

/// Snapshot of a suspended script: the captured globals/locals partition,
/// the program it belongs to, and the offset execution resumes at.
///
/// Created by `STORE_STATE`; consumed by starting a new run whose context
/// carries the snapshot. Owned by whatever deferred-action object holds the
/// "do this later" command.
#[derive(Clone, Debug)]
pub struct ExecutionState {
    pub program: Arc<ScriptProgram>,
    pub ins_offset: u32,
    pub globals: Vec<Variable>,
    pub locals: Vec<Variable>,
}

/// Identity and collaborators for one run of the VM.
///
/// Lives for a single run to completion or suspension; a clone of it travels
/// inside action-typed arguments so deferred work keeps the caller identity
/// and routine table of the run that scheduled it.
#[derive(Clone)]
pub struct ExecutionContext {
    /// Id of the object that owns this run.
    pub caller_id: u32,
    /// Id of the object that triggered the owning event, when there is one.
    pub triggerer_id: u32,
    /// Native routine table, shared read-only.
    pub routines: Arc<Routines>,
    /// State to resume from instead of starting at the program entry.
    pub saved_state: Option<ExecutionState>,
}

impl ExecutionContext {
    /// Creates a context with no caller or triggerer identity.
    pub fn new(routines: Arc<Routines>) -> Self {
        Self {
            caller_id: OBJECT_INVALID,
            triggerer_id: OBJECT_INVALID,
            routines,
            saved_state: None,
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("caller_id", &self.caller_id)
            .field("triggerer_id", &self.triggerer_id)
            .field("saved_state", &self.saved_state.is_some())
            .finish()
    }
}
