// src/cli/actions/probe.rs

use crate::cli::actions::{Action, ActionError};
use crate::cli::context::Context;

/// A scratch action whose logic changes as features are tried out. In debug
/// mode it also dumps the symbol table the driver assembled.
#[derive(Default)]
pub struct ProbeAction;

impl ProbeAction {
    pub fn new() -> Self {
        Self
    }
}

impl Action for ProbeAction {
    fn execute(&mut self, ctx: &mut Context) -> Result<(), ActionError> {
        ctx.output_line("Testing...");
        if ctx.is_debug() {
            let dump = ctx.symbols.dump();
            ctx.output(&dump);
        }
        Ok(())
    }

    fn help(&self) -> String {
        "Only used during testing of various actions.".to_string()
    }
}
