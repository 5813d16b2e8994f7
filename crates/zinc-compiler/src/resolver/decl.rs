//! Structs, functions and variable declarations.

use std::rc::Rc;

use zinc_core::CompilerError;
use zinc_parser::ast::{FunctionDecl, Program, StructDecl, VarDecl};

use super::captures::free_variables;
use super::{Resolver, Result};
use crate::bytecode::OpCode;
use crate::return_checker::ReturnChecker;
use crate::scope::{DeclFlags, DeclId, TypeClash};
use crate::types::{Field, FunctionType, StructType, Type};

/// A function whose signature has been registered.
#[derive(Debug, Clone)]
pub(super) struct Signature {
    pub ty: Rc<FunctionType>,
    /// Constant-pool index of the prototype
    pub proto: u16,
}

/// A value copied from the enclosing function into a closure.
#[derive(Debug, Clone)]
pub(super) struct Capture {
    pub name: String,
    pub ty: Type,
    /// The captured binding in the enclosing function
    pub source: DeclId,
}

impl Resolver {
    // ==========================================================================
    // Structs
    // ==========================================================================

    /// Register every struct name so fields and signatures can refer to any of them.
    pub(super) fn declare_structs(
        &mut self,
        structs: &[StructDecl<'_>],
    ) -> Vec<Option<Rc<StructType>>> {
        structs
            .iter()
            .map(|decl| match self.declare_struct(decl) {
                Ok(struct_type) => Some(struct_type),
                Err(error) => {
                    self.errors.push(error);
                    None
                }
            })
            .collect()
    }

    fn declare_struct(&mut self, decl: &StructDecl<'_>) -> Result<Rc<StructType>> {
        let name = decl.name.name;
        let struct_type = Rc::new(StructType::new(name, decl.span));
        match self.scopes.declare_struct(struct_type.clone()) {
            Ok(()) => Ok(struct_type),
            Err(TypeClash::Struct(existing)) => Err(CompilerError::two_range(
                existing.span,
                decl.span,
                format!("Type '{}' first declared here.", existing.name),
                format!("'{name}' declared here again."),
                format!("Type '{name}' declared with same name as other type in the same scope."),
            )),
            Err(TypeClash::Builtin) => Err(CompilerError::one_range(
                decl.span,
                format!("Type '{name}' declared with same name as other type in the same scope."),
            )),
        }
    }

    pub(super) fn resolve_struct_fields(
        &mut self,
        structs: &[StructDecl<'_>],
        types: &[Option<Rc<StructType>>],
    ) {
        for (decl, struct_type) in structs.iter().zip(types) {
            if let Some(struct_type) = struct_type {
                let result = self.struct_fields(decl, struct_type);
                self.collect(result);
            }
        }
    }

    fn struct_fields(&self, decl: &StructDecl<'_>, struct_type: &StructType) -> Result<()> {
        if decl.fields.len() > usize::from(u8::MAX) {
            return Err(CompilerError::one_range(
                decl.span,
                format!("Struct '{}' cannot have more than 255 fields.", decl.name.name),
            ));
        }

        let mut fields: Vec<Field> = Vec::with_capacity(decl.fields.len());
        for field in decl.fields {
            let name = field.name.name;
            if let Some(first) = fields.iter().find(|f| f.name == name) {
                return Err(CompilerError::two_range(
                    first.span,
                    field.span,
                    format!("Field '{name}' first declared here."),
                    format!("'{name}' declared here again."),
                    format!(
                        "Field '{name}' declared more than once in struct '{}'.",
                        decl.name.name
                    ),
                ));
            }
            fields.push(Field {
                name: name.to_string(),
                ty: self.resolve_type(&field.ty)?,
                span: field.span,
            });
        }

        struct_type.set_fields(fields);
        Ok(())
    }

    /// A struct declared inside a function body: name and fields at once.
    pub(super) fn local_struct(&mut self, decl: &StructDecl<'_>) -> Result<()> {
        let struct_type = self.declare_struct(decl)?;
        self.struct_fields(decl, &struct_type)
    }

    // ==========================================================================
    // Function signatures
    // ==========================================================================

    /// Register every top-level function and emit its `CREATE_FUNCTION`.
    pub(super) fn declare_functions(
        &mut self,
        functions: &[FunctionDecl<'_>],
    ) -> Vec<Option<Signature>> {
        functions
            .iter()
            .map(|function| match self.declare_function(function) {
                Ok(signature) => Some(signature),
                Err(error) => {
                    self.errors.push(error);
                    None
                }
            })
            .collect()
    }

    fn declare_function(&mut self, function: &FunctionDecl<'_>) -> Result<Signature> {
        let ty = self.function_type(function)?;
        let decl = self
            .scopes
            .declare(
                function.name.name,
                Type::Function(ty.clone()),
                DeclFlags::FUNCTION,
                function.span,
                Some(function.span),
            )
            .map_err(|existing| self.duplicate(existing, function.name.name, function.span))?;
        self.slot(decl)?;

        self.emitter.set_span(function.span);
        let proto = self
            .emitter
            .add_function(function.params.len() as u8, 0)
            .map_err(|e| self.limit(e))?;
        self.emitter.emit_create_function(proto);
        Ok(Signature { ty, proto })
    }

    /// Resolve parameter and return types in the current scope.
    fn function_type(&self, function: &FunctionDecl<'_>) -> Result<Rc<FunctionType>> {
        if function.params.len() > usize::from(u8::MAX) {
            return Err(CompilerError::one_range(
                function.span,
                format!(
                    "Function '{}' cannot have more than 255 parameters.",
                    function.name.name
                ),
            ));
        }

        let params = function
            .params
            .iter()
            .map(|param| self.resolve_type(&param.ty))
            .collect::<Result<Vec<_>>>()?;
        let ret = match &function.return_type {
            Some(name) => self.resolve_type(name)?,
            None => Type::Unit,
        };
        Ok(Rc::new(FunctionType { params, ret }))
    }

    // ==========================================================================
    // Variables
    // ==========================================================================

    pub(super) fn global_variable(&mut self, decl: &VarDecl<'_>) -> Result<()> {
        if decl.initializer.is_none() {
            return Err(CompilerError::one_range(
                decl.span,
                "Global variables must have an initializer.",
            ));
        }
        self.variable(decl)
    }

    /// Resolve a `var`/`val` declaration, leaving its value in the new slot.
    pub(super) fn variable(&mut self, decl: &VarDecl<'_>) -> Result<()> {
        let name = decl.name.name;
        let declared = match &decl.ty {
            Some(ty) => Some(self.resolve_type(ty)?),
            None => None,
        };
        let initialized = match decl.initializer {
            Some(init) => Some((self.expression(init)?, init.span())),
            None => None,
        };

        let init = initialized.as_ref().map(|&(_, span)| span);
        let ty = match (declared, initialized) {
            (_, Some((Type::Nothing, _))) => {
                return Err(CompilerError::one_range(
                    decl.span,
                    format!("Variable '{name}' cannot be initialized with a value of type 'nothing'."),
                ));
            }
            (Some(declared), Some((actual, _))) if declared != actual => {
                return Err(CompilerError::one_range(
                    decl.span,
                    format!(
                        "Declared type of '{declared}' does not match initializer type of '{actual}'."
                    ),
                ));
            }
            (Some(ty), _) | (None, Some((ty, _))) => ty,
            (None, None) => {
                return Err(CompilerError::one_range(
                    decl.span,
                    format!("Variable '{name}' must have either a type or an initializer."),
                ));
            }
        };

        if init.is_none() {
            // Reserve the slot until the first assignment
            self.emitter.set_span(decl.span);
            self.emitter.emit_none();
        }

        let flags = if decl.mutable {
            DeclFlags::MUTABLE
        } else {
            DeclFlags::empty()
        };
        let id = self
            .scopes
            .declare(name, ty, flags, decl.span, init)
            .map_err(|existing| self.duplicate(existing, name, decl.span))?;
        self.slot(id)?;
        Ok(())
    }

    // ==========================================================================
    // Entry point and bodies
    // ==========================================================================

    /// Emit the call to `main` that ends the prologue.
    pub(super) fn entry_point(&mut self, program: &Program<'_>) -> Result<()> {
        let main = self
            .scopes
            .local("main")
            .filter(|&id| self.scopes.decl(id).is_function())
            .ok_or_else(|| {
                CompilerError::one_range(program.eof, "Could not find main function.")
            })?;

        let decl = self.scopes.decl(main);
        let takes_params = decl
            .ty
            .as_function()
            .is_some_and(|function| !function.params.is_empty());
        if takes_params {
            return Err(CompilerError::one_range(
                decl.span,
                "Function 'main' cannot take parameters.",
            ));
        }

        self.emitter.set_span(decl.span);
        self.emit_load(main)?;
        self.emitter.emit_call(0);
        self.emitter.emit(OpCode::End);
        Ok(())
    }

    /// Compile a function body at the current offset and point its prototype there.
    ///
    /// Errors are collected rather than returned; one bad statement does not
    /// stop the rest of the body from being checked.
    pub(super) fn function_body(
        &mut self,
        function: &FunctionDecl<'_>,
        signature: Signature,
        captures: &[Capture],
    ) {
        let start = self.emitter.current_offset();
        if let Err(error) = self.emitter.patch_function(signature.proto, start) {
            let error = self.limit(error);
            self.errors.push(error);
            return;
        }

        let name = match self.function_path.last() {
            Some(outer) => format!("{outer}.{}", function.name.name),
            None => function.name.name.to_string(),
        };
        self.function_path.push(name);
        self.scopes.push_function(signature.ty.ret.clone());

        let result = self.declare_parameters(function, &signature.ty, captures);
        match result {
            Ok(()) => self.function_statements(function, &signature.ty),
            Err(error) => self.errors.push(error),
        }

        self.scopes.pop();
        if let Some(name) = self.function_path.pop() {
            self.emitter.add_symbol(name, start);
        }
    }

    fn declare_parameters(
        &mut self,
        function: &FunctionDecl<'_>,
        ty: &FunctionType,
        captures: &[Capture],
    ) -> Result<()> {
        for (param, param_ty) in function.params.iter().zip(&ty.params) {
            let name = param.name.name;
            self.scopes
                .declare(
                    name,
                    param_ty.clone(),
                    DeclFlags::PARAMETER,
                    param.span,
                    Some(param.span),
                )
                .map_err(|_| {
                    let first = function
                        .params
                        .iter()
                        .find(|p| p.name.name == name)
                        .map_or(param.span, |p| p.span);
                    CompilerError::two_range(
                        first,
                        param.span,
                        format!("Function parameter '{name}' first declared here."),
                        format!("'{name}' declared here again in the same function."),
                        format!("Function parameter '{name}' declared twice in the function parameters."),
                    )
                })?;
        }

        for capture in captures {
            let source = self.scopes.decl(capture.source);
            let (span, init) = (source.span, source.init);
            let id = self
                .scopes
                .declare(&capture.name, capture.ty.clone(), DeclFlags::CAPTURED, span, init)
                .map_err(|existing| self.duplicate(existing, &capture.name, span))?;
            self.slot(id)?;
        }
        Ok(())
    }

    fn function_statements(&mut self, function: &FunctionDecl<'_>, ty: &FunctionType) {
        self.statements(function.body);

        if ty.ret == Type::Unit {
            self.emitter.set_span(function.body_span);
            self.emitter.emit_return();
        } else if !ReturnChecker::new().all_paths_return(function.body) {
            self.errors.push(CompilerError::one_range(
                function.span,
                format!(
                    "Function '{}' does not return a value of type '{}' on all paths.",
                    function.name.name, ty.ret
                ),
            ));
        }
    }

    // ==========================================================================
    // Nested functions
    // ==========================================================================

    /// A `func` inside a body: a closure over the enclosing locals it uses.
    ///
    /// ```text
    /// JMP over
    /// <body>
    /// over: GET_STACK capture...
    /// CREATE_FUNCTION proto
    /// ```
    pub(super) fn nested_function(&mut self, function: &FunctionDecl<'_>) -> Result<()> {
        let name = function.name.name;
        let ty = self.function_type(function)?;

        // Declared before the body so a self-reference reads as uninitialized
        let decl = self
            .scopes
            .declare(
                name,
                Type::Function(ty.clone()),
                DeclFlags::FUNCTION,
                function.span,
                None,
            )
            .map_err(|existing| self.duplicate(existing, name, function.span))?;
        self.slot(decl)?;

        let captures = self.captures(function)?;
        if function.params.len() + captures.len() > usize::from(u8::MAX) {
            return Err(CompilerError::one_range(
                function.span,
                format!("Function '{name}' captures too many variables."),
            ));
        }

        self.emitter.set_span(function.span);
        let proto = self
            .emitter
            .add_function(function.params.len() as u8, captures.len() as u8)
            .map_err(|e| self.limit(e))?;
        let over = self.emitter.emit_jump(OpCode::Jmp);

        let conditional_depth = std::mem::take(&mut self.conditional_depth);
        self.function_body(function, Signature { ty, proto }, &captures);
        self.conditional_depth = conditional_depth;

        self.emitter.set_span(function.span);
        self.emitter.patch_jump(over).map_err(|e| self.limit(e))?;
        for capture in &captures {
            self.emit_load(capture.source)?;
        }
        self.emitter.emit_create_function(proto);
        self.scopes.mark_initialized(decl, function.span);
        Ok(())
    }

    /// Enclosing locals a nested function reads or writes.
    fn captures(&self, function: &FunctionDecl<'_>) -> Result<Vec<Capture>> {
        let mut captures = Vec::new();
        for name in free_variables(function) {
            // Unknown names are reported when the body is resolved
            let Some(id) = self.scopes.lookup(name.name) else {
                continue;
            };
            if self.scopes.is_global_decl(id) {
                continue;
            }
            let decl = self.scopes.decl(id);
            if !decl.is_initialized() {
                return Err(self.uninitialized(id, name.span));
            }
            captures.push(Capture {
                name: name.name.to_string(),
                ty: decl.ty.clone(),
                source: id,
            });
        }
        Ok(captures)
    }
}
