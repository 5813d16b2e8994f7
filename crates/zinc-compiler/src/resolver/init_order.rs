//! Initialization order of globals.
//!
//! Global initializers run in source order, before `main`. A function called
//! from an initializer may touch a global whose slot has not been written
//! yet, so every top-level function is summarized by the latest global it
//! can reach, directly or through other top-level functions it names.

use rustc_hash::{FxHashMap, FxHashSet};
use zinc_core::CompilerError;
use zinc_parser::ast::{Ident, Program};

use super::captures::{expression_free_variables, free_variables};

/// For each top-level function, the index of the latest global it reaches.
#[derive(Debug, Default)]
pub(super) struct GlobalReach<'ast> {
    latest: FxHashMap<&'ast str, usize>,
}

impl<'ast> GlobalReach<'ast> {
    pub(super) fn new(program: &Program<'ast>) -> Self {
        let globals: FxHashMap<&str, usize> = program
            .variables
            .iter()
            .enumerate()
            .map(|(index, decl)| (decl.name.name, index))
            .collect();
        let uses: FxHashMap<&str, Vec<Ident<'ast>>> = program
            .functions
            .iter()
            .map(|function| (function.name.name, free_variables(function)))
            .collect();

        let mut latest = FxHashMap::default();
        for function in program.functions {
            let mut visited = FxHashSet::default();
            let mut pending = vec![function.name.name];
            let mut reached = None;
            while let Some(name) = pending.pop() {
                if !visited.insert(name) {
                    continue;
                }
                for used in uses.get(name).into_iter().flatten() {
                    if let Some(&index) = globals.get(used.name) {
                        reached = reached.max(Some(index));
                    } else if uses.contains_key(used.name) {
                        pending.push(used.name);
                    }
                }
            }
            if let Some(index) = reached {
                latest.insert(function.name.name, index);
            }
        }
        Self { latest }
    }

    /// Reject the initializer of global `index` if it names a function that
    /// reaches that global or a later one.
    pub(super) fn check(&self, program: &Program<'ast>, index: usize) -> Result<(), CompilerError> {
        let Some(initializer) = program.variables[index].initializer else {
            return Ok(());
        };
        for used in expression_free_variables(initializer) {
            let Some(&reached) = self.latest.get(used.name) else {
                continue;
            };
            if reached >= index {
                let global = &program.variables[reached];
                return Err(CompilerError::two_range(
                    global.span,
                    used.span,
                    "Global declared here.",
                    "Function used here during initialization.",
                    format!(
                        "Function '{}' may use global '{}' before it is initialized.",
                        used.name, global.name.name
                    ),
                ));
            }
        }
        Ok(())
    }
}
