//! Expression type checking and lowering.
//!
//! Every expression leaves exactly one value on the stack. A call to a unit
//! function is followed by `NONE` to keep that true; `return` leaves nothing
//! and has type `nothing` since control never continues past it.

use zinc_core::{CompilerError, Span};
use zinc_parser::ast::{
    BinaryExpr, BinaryOp, CallExpr, Expr, FieldInit, GetFieldExpr, Ident, InitStructExpr, Literal,
    LiteralExpr, LogicalExpr, LogicalOp, ReturnExpr, SetFieldExpr, SetVariableExpr, UnaryExpr,
    UnaryOp,
};

use super::{Resolver, Result};
use crate::bytecode::OpCode;
use crate::types::{Type, TypeList};

impl Resolver {
    /// Type check `expr` and emit the code that computes it.
    pub(super) fn expression(&mut self, expr: &Expr<'_>) -> Result<Type> {
        match expr {
            Expr::Literal(literal) => self.literal(literal),
            Expr::Unit(span) => {
                self.emitter.set_span(*span);
                self.emitter.emit_none();
                Ok(Type::Unit)
            }
            Expr::Grouping(group) => self.expression(group.expr),
            Expr::Unary(unary) => self.unary(unary),
            Expr::Binary(binary) => self.binary(binary),
            Expr::Logical(logical) => self.logical(logical),
            Expr::GetVariable(name) => self.get_variable(name),
            Expr::SetVariable(set) => self.set_variable(set),
            Expr::GetField(get) => self.get_field(get),
            Expr::SetField(set) => self.set_field(set),
            Expr::Call(call) => self.call(call),
            Expr::InitStruct(init) => self.init_struct(init),
            Expr::Return(ret) => self.return_expr(ret),
        }
    }

    fn literal(&mut self, literal: &LiteralExpr<'_>) -> Result<Type> {
        self.emitter.set_span(literal.span);
        let result = match literal.value {
            Literal::Number(value) => self.emitter.emit_number(value).map(|()| Type::Number),
            Literal::Char(value) => self.emitter.emit_char(value).map(|()| Type::Char),
            Literal::Str(value) => self.emitter.emit_string(value).map(|()| Type::Str),
            Literal::Bool(value) => {
                self.emitter.emit_bool(value);
                Ok(Type::Bool)
            }
        };
        result.map_err(|e| self.limit(e))
    }

    // ==========================================================================
    // Operators
    // ==========================================================================

    fn unary(&mut self, unary: &UnaryExpr<'_>) -> Result<Type> {
        let ty = self.expression(unary.operand)?;
        let (op, result) = match (unary.op, &ty) {
            (UnaryOp::Not, Type::Bool) => (OpCode::Not, Type::Bool),
            (UnaryOp::Neg, Type::Number) => (OpCode::Neg, Type::Number),
            _ => {
                return Err(CompilerError::one_range(
                    unary.operand.span(),
                    format!("Cannot perform unary '{}' on '{ty}'.", unary.op),
                ));
            }
        };
        self.emitter.set_span(unary.op_span);
        self.emitter.emit(op);
        Ok(result)
    }

    fn binary(&mut self, binary: &BinaryExpr<'_>) -> Result<Type> {
        let left = self.expression(binary.left)?;
        let right = self.expression(binary.right)?;

        let result = if binary.op.is_arithmetic() {
            (left == Type::Number && right == Type::Number).then_some(Type::Number)
        } else if binary.op.is_equality() {
            (left == right && left.supports_equality()).then_some(Type::Bool)
        } else {
            (left == Type::Number && right == Type::Number).then_some(Type::Bool)
        };
        let Some(result) = result else {
            return Err(CompilerError::one_range(
                binary.span,
                format!(
                    "Cannot perform binary '{}' on '{left}' and '{right}'.",
                    binary.op
                ),
            ));
        };

        self.emitter.set_span(binary.op_span);
        self.emitter.emit(binary_opcode(binary.op));
        Ok(result)
    }

    /// Short-circuit `&&` and `||`.
    ///
    /// ```text
    /// left                left
    /// JIF skip            JIT skip
    /// right               right
    /// JMP end             JMP end
    /// skip: FALSE         skip: TRUE
    /// end:                end:
    /// ```
    fn logical(&mut self, logical: &LogicalExpr<'_>) -> Result<Type> {
        let left = self.expression(logical.left)?;

        self.emitter.set_span(logical.op_span);
        let skip = self.emitter.emit_jump(match logical.op {
            LogicalOp::And => OpCode::Jif,
            LogicalOp::Or => OpCode::Jit,
        });

        self.conditional_depth += 1;
        let right = self.expression(logical.right);
        self.conditional_depth -= 1;
        let right = right?;

        if left != Type::Bool || right != Type::Bool {
            return Err(CompilerError::one_range(
                logical.span,
                format!(
                    "Cannot perform logical '{}' on '{left}' and '{right}'.",
                    logical.op
                ),
            ));
        }

        self.emitter.set_span(logical.span);
        let end = self.emitter.emit_jump(OpCode::Jmp);
        self.emitter.patch_jump(skip).map_err(|e| self.limit(e))?;
        self.emitter.emit_bool(logical.op == LogicalOp::Or);
        self.emitter.patch_jump(end).map_err(|e| self.limit(e))?;
        Ok(Type::Bool)
    }

    // ==========================================================================
    // Variables
    // ==========================================================================

    fn get_variable(&mut self, name: &Ident<'_>) -> Result<Type> {
        let id = self.find_variable(name)?;
        if !self.scopes.decl(id).is_initialized() {
            return Err(self.uninitialized(id, name.span));
        }

        self.emitter.set_span(name.span);
        self.emit_load(id)?;
        Ok(self.scopes.decl(id).ty.clone())
    }

    fn set_variable(&mut self, set: &SetVariableExpr<'_>) -> Result<Type> {
        let value = self.expression(set.value)?;
        let id = self.find_variable(&set.name)?;
        let decl = self.scopes.decl(id);
        let name = &decl.name;

        if decl.is_captured() {
            return Err(CompilerError::one_range(
                set.span,
                format!("Cannot assign to captured variable '{name}'."),
            ));
        }
        if decl.ty != value {
            return Err(CompilerError::two_range(
                decl.span,
                set.span,
                format!("Declared with type '{}'.", decl.ty),
                format!("Set with type '{value}'."),
                format!(
                    "Value being set to '{name}' has type '{value}', while '{name}' is type '{}'.",
                    decl.ty
                ),
            ));
        }
        if let Some(first) = decl.init.filter(|_| !decl.is_mutable()) {
            return Err(CompilerError::two_range(
                first,
                set.span,
                "Variable first initialized here.",
                "Variable reassigned here.",
                format!("Immutable variable '{name}' reassigned after initialization."),
            ));
        }
        if self.conditional_depth > 0 && !decl.is_mutable() {
            return Err(CompilerError::one_range(
                set.span,
                format!("Immutable variable '{name}' cannot be assigned conditionally."),
            ));
        }

        self.emitter.set_span(set.span);
        self.emit_store(id)?;
        if self.conditional_depth == 0 {
            self.scopes.mark_initialized(id, set.span);
        }
        Ok(value)
    }

    // ==========================================================================
    // Structs
    // ==========================================================================

    fn get_field(&mut self, get: &GetFieldExpr<'_>) -> Result<Type> {
        let object = self.expression(get.object)?;
        let (index, ty, _) = self.field(&object, get.object, &get.field)?;

        self.emitter.set_span(get.field.span);
        self.emitter.emit_get_field(index);
        Ok(ty)
    }

    fn set_field(&mut self, set: &SetFieldExpr<'_>) -> Result<Type> {
        let object = self.expression(set.object)?;
        let value = self.expression(set.value)?;
        let (index, ty, field_span) = self.field(&object, set.object, &set.field)?;

        if ty != value {
            return Err(field_mismatch(
                &object,
                set.field.name,
                &ty,
                &value,
                field_span,
                set.field.span.merge(set.value.span()),
            ));
        }

        self.emitter.set_span(set.span);
        self.emitter.emit_set_field(index);
        Ok(value)
    }

    /// Find a field's index, type and declaration span on a struct-typed value.
    fn field(
        &self,
        object: &Type,
        object_expr: &Expr<'_>,
        field: &Ident<'_>,
    ) -> Result<(u8, Type, Span)> {
        let Some(struct_type) = object.as_struct() else {
            return Err(CompilerError::one_range(
                object_expr.span(),
                format!("Cannot get field using '.' on type '{object}'."),
            ));
        };
        let (index, found) = struct_type.field(field.name).ok_or_else(|| {
            CompilerError::token(
                field.span,
                field.name,
                format!(
                    "Field '{}' does not exist in struct '{object}'.",
                    field.name
                ),
            )
        })?;
        // Struct declarations are limited to 255 fields
        let index = u8::try_from(index).map_err(|_| {
            CompilerError::one_range(field.span, "Too many fields in struct.")
        })?;
        Ok((index, found.ty.clone(), found.span))
    }

    /// `Name { field: value, ... }`
    ///
    /// Every declared field must be given exactly once. Values are
    /// evaluated in declared field order, which is the order `ALLOC` expects.
    fn init_struct(&mut self, init: &InitStructExpr<'_>) -> Result<Type> {
        let struct_type = self.scopes.lookup_struct(init.name.name).ok_or_else(|| {
            CompilerError::token(
                init.name.span,
                init.name.name,
                format!(
                    "Struct or variant '{}' does not exist in the current scope.",
                    init.name.name
                ),
            )
        })?;
        let ty = Type::Struct(struct_type.clone());
        let fields = struct_type.fields();

        let mut supplied: Vec<Option<&FieldInit<'_>>> = vec![None; fields.len()];
        for field_init in init.fields {
            let name = field_init.name.name;
            let Some((index, _)) = struct_type.field(name) else {
                return Err(CompilerError::token(
                    field_init.name.span,
                    name,
                    format!("Struct '{ty}' does not have field '{name}'."),
                ));
            };
            if supplied[index].replace(field_init).is_some() {
                return Err(CompilerError::one_range(
                    field_init.name.span,
                    format!("Field '{name}' is initialized more than once."),
                ));
            }
        }

        let missing: Vec<String> = fields
            .iter()
            .zip(&supplied)
            .filter(|(_, init)| init.is_none())
            .map(|(field, _)| format!("'{}'", field.name))
            .collect();
        if !missing.is_empty() {
            return Err(CompilerError::one_range(
                init.span,
                format!(
                    "Struct initialization for '{ty}' is missing fields {}.",
                    missing.join(", ")
                ),
            ));
        }

        for (field, field_init) in fields.iter().zip(supplied.into_iter().flatten()) {
            let value = self.expression(field_init.value)?;
            if value != field.ty {
                return Err(field_mismatch(
                    &ty,
                    &field.name,
                    &field.ty,
                    &value,
                    field.span,
                    field_init.name.span.merge(field_init.value.span()),
                ));
            }
        }

        let count = u8::try_from(fields.len()).map_err(|_| {
            CompilerError::one_range(init.span, "Too many fields in struct.")
        })?;
        self.emitter.set_span(init.span);
        self.emitter.emit_alloc(count);
        Ok(ty)
    }

    // ==========================================================================
    // Calls and returns
    // ==========================================================================

    fn call(&mut self, call: &CallExpr<'_>) -> Result<Type> {
        let callee = self.expression(call.callee)?;
        let Some(function) = callee.as_function().cloned() else {
            return Err(CompilerError::one_range(
                call.callee.span(),
                format!("Can only call callable types, instead got '{callee}'."),
            ));
        };

        let count = u8::try_from(call.args.len()).map_err(|_| {
            CompilerError::one_range(call.span, "Cannot have more than 255 arguments.")
        })?;
        let args = call
            .args
            .iter()
            .map(|arg| self.expression(arg))
            .collect::<Result<Vec<_>>>()?;
        if args != function.params {
            return Err(CompilerError::one_range(
                call.callee.span(),
                format!(
                    "Function expected argument types '{}', but got '{}'.",
                    TypeList(&function.params),
                    TypeList(&args)
                ),
            ));
        }

        self.emitter.set_span(call.span);
        self.emitter.emit_call(count);
        if function.ret == Type::Unit {
            self.emitter.emit_none();
        }
        Ok(function.ret.clone())
    }

    fn return_expr(&mut self, ret: &ReturnExpr<'_>) -> Result<Type> {
        // The parser rejects this first; trees built by hand can still get here
        let Some(expected) = self.scopes.return_type().cloned() else {
            return Err(CompilerError::one_range(
                ret.span,
                "Cannot return from top-level code.",
            ));
        };
        let actual = match ret.value {
            Some(value) => self.expression(value)?,
            None => Type::Unit,
        };
        if actual != expected {
            return Err(CompilerError::one_range(
                ret.span,
                format!(
                    "Return type '{actual}' does not match function return type of '{expected}'."
                ),
            ));
        }

        self.emitter.set_span(ret.keyword);
        match (expected, ret.value) {
            (Type::Unit, Some(_)) => {
                self.emitter.emit_pop();
                self.emitter.emit_return();
            }
            (Type::Unit, None) => self.emitter.emit_return(),
            _ => self.emitter.emit_return_value(),
        }
        Ok(Type::Nothing)
    }
}

fn binary_opcode(op: BinaryOp) -> OpCode {
    match op {
        BinaryOp::Add => OpCode::Add,
        BinaryOp::Sub => OpCode::Sub,
        BinaryOp::Mul => OpCode::Mul,
        BinaryOp::Div => OpCode::Div,
        BinaryOp::Mod => OpCode::Mod,
        BinaryOp::Pow => OpCode::Pow,
        BinaryOp::Equal => OpCode::Equal,
        BinaryOp::NotEqual => OpCode::NotEqual,
        BinaryOp::Less => OpCode::Less,
        BinaryOp::LessEqual => OpCode::LessEqual,
        BinaryOp::Greater => OpCode::Greater,
        BinaryOp::GreaterEqual => OpCode::GreaterEqual,
    }
}

fn field_mismatch(
    owner: &Type,
    field: &str,
    declared: &Type,
    actual: &Type,
    declared_span: Span,
    set_span: Span,
) -> CompilerError {
    CompilerError::two_range(
        declared_span,
        set_span,
        format!("Declared with type '{declared}'."),
        format!("Set with type '{actual}'."),
        format!(
            "Value being set to '{owner}::{field}' has type '{actual}', while '{owner}::{field}' is type '{declared}'."
        ),
    )
}
