//! Lexical scopes and the declarations they hold.
//!
//! Scopes live in one arena and point at their parent by [`ScopeId`], so a
//! lookup is a walk up the parent chain. Declarations live in a second
//! arena addressed by [`DeclId`], which lets the resolver update
//! initialization state while scopes hold only handles.
//!
//! Stack slots:
//! - a function scope starts a fresh frame at base 0
//! - a block scope continues its parent's frame at
//!   `parent.base + parent.local_count`
//! - every declaration takes `base + local_count` at declaration time
//!
//! Variable lookup stops at a function boundary except for globals. A
//! nested function reaches enclosing locals only through its captures,
//! which are declared in its own scope.

use std::rc::Rc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use zinc_core::Span;

use crate::types::{self, StructType, Type};

// ============================================================================
// Handles
// ============================================================================

/// Index of a scope in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The top-level scope.
    pub const GLOBAL: ScopeId = ScopeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a declaration in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(u32);

impl DeclId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// Declarations
// ============================================================================

bitflags! {
    /// Properties of a declared binding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeclFlags: u8 {
        /// Declared with `var`
        const MUTABLE = 1 << 0;
        /// A `func` declaration
        const FUNCTION = 1 << 1;
        /// A function parameter
        const PARAMETER = 1 << 2;
        /// A value copied in from an enclosing function
        const CAPTURED = 1 << 3;
    }
}

/// A resolved binding.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub ty: Type,
    pub flags: DeclFlags,
    /// The declaring statement, parameter or signature
    pub span: Span,
    /// Where the binding first received a value
    pub init: Option<Span>,
    /// Frame-relative slot, or absolute slot for globals
    pub slot: usize,
    /// The scope the binding was declared in
    pub scope: ScopeId,
}

impl Declaration {
    pub fn is_mutable(&self) -> bool {
        self.flags.contains(DeclFlags::MUTABLE)
    }

    pub fn is_function(&self) -> bool {
        self.flags.contains(DeclFlags::FUNCTION)
    }

    pub fn is_captured(&self) -> bool {
        self.flags.contains(DeclFlags::CAPTURED)
    }

    pub fn is_initialized(&self) -> bool {
        self.init.is_some()
    }
}

// ============================================================================
// Scopes
// ============================================================================

/// What opened a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Top-level items
    Global,
    /// A function body; starts a new frame
    Function,
    /// A `{ ... }` block inside a function
    Block,
}

/// One lexical nesting level.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    variables: FxHashMap<String, DeclId>,
    structs: FxHashMap<String, Rc<StructType>>,
    types: FxHashMap<String, Type>,
    /// First slot owned by this scope
    pub base: usize,
    /// Declarations made in this scope so far
    pub local_count: usize,
    /// Return type of the enclosing function
    pub return_type: Option<Type>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>, base: usize, return_type: Option<Type>) -> Self {
        Self {
            kind,
            parent,
            variables: FxHashMap::default(),
            structs: FxHashMap::default(),
            types: FxHashMap::default(),
            base,
            local_count: 0,
            return_type,
        }
    }

    /// Number of frame slots in use once this scope's locals are pushed.
    pub fn frame_size(&self) -> usize {
        self.base + self.local_count
    }
}

/// Why a struct could not be registered.
#[derive(Debug, Clone)]
pub enum TypeClash {
    /// Another struct of this name exists in the same scope
    Struct(Rc<StructType>),
    /// The name is a built-in type
    Builtin,
}

/// The scope tree plus every declaration made in it.
#[derive(Debug)]
pub struct Scopes {
    scopes: Vec<Scope>,
    decls: Vec<Declaration>,
    current: ScopeId,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    /// Create the global scope with the built-in types registered.
    pub fn new() -> Self {
        let mut global = Scope::new(ScopeKind::Global, None, 0, None);
        for name in types::BUILTIN_NAMES {
            if let Some(ty) = types::builtin(name) {
                global.types.insert(name.to_string(), ty);
            }
        }
        Self {
            scopes: vec![global],
            decls: Vec::new(),
            current: ScopeId::GLOBAL,
        }
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    fn current_scope(&self) -> &Scope {
        self.scope(self.current)
    }

    fn current_scope_mut(&mut self) -> &mut Scope {
        let index = self.current.index();
        &mut self.scopes[index]
    }

    /// Whether the current scope is the top level.
    pub fn is_global(&self) -> bool {
        self.current == ScopeId::GLOBAL
    }

    /// Open a function body returning `return_type`.
    pub fn push_function(&mut self, return_type: Type) -> ScopeId {
        self.push(Scope::new(
            ScopeKind::Function,
            Some(self.current),
            0,
            Some(return_type),
        ))
    }

    /// Open a block continuing the current frame.
    pub fn push_block(&mut self) -> ScopeId {
        let parent = self.current_scope();
        let scope = Scope::new(
            ScopeKind::Block,
            Some(self.current),
            parent.frame_size(),
            parent.return_type.clone(),
        );
        self.push(scope)
    }

    fn push(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        self.current = id;
        id
    }

    /// Close the current scope, returning how many locals it declared.
    ///
    /// The global scope is never closed.
    pub fn pop(&mut self) -> usize {
        let scope = self.current_scope();
        let count = scope.local_count;
        if let Some(parent) = scope.parent {
            self.current = parent;
        }
        count
    }

    /// Return type of the function being resolved, if any.
    pub fn return_type(&self) -> Option<&Type> {
        self.current_scope().return_type.as_ref()
    }

    /// Slots in use in the current frame.
    pub fn frame_size(&self) -> usize {
        self.current_scope().frame_size()
    }

    /// The function (or global) scope whose frame `scope` belongs to.
    pub fn frame_of(&self, mut scope: ScopeId) -> ScopeId {
        loop {
            let entry = self.scope(scope);
            match (entry.kind, entry.parent) {
                (ScopeKind::Block, Some(parent)) => scope = parent,
                _ => return scope,
            }
        }
    }

    // ==========================================================================
    // Variables
    // ==========================================================================

    /// Declare a binding in the current scope at the next free slot.
    ///
    /// Returns the existing declaration if the name is already taken in
    /// this scope. Shadowing an outer scope's binding is always allowed.
    pub fn declare(
        &mut self,
        name: &str,
        ty: Type,
        flags: DeclFlags,
        span: Span,
        init: Option<Span>,
    ) -> Result<DeclId, DeclId> {
        if let Some(&existing) = self.current_scope().variables.get(name) {
            return Err(existing);
        }

        let id = DeclId(self.decls.len() as u32);
        let slot = self.frame_size();
        self.decls.push(Declaration {
            name: name.to_string(),
            ty,
            flags,
            span,
            init,
            slot,
            scope: self.current,
        });

        let scope = self.current_scope_mut();
        scope.variables.insert(name.to_string(), id);
        scope.local_count += 1;
        Ok(id)
    }

    /// Find a binding declared in the current scope only.
    pub fn local(&self, name: &str) -> Option<DeclId> {
        self.current_scope().variables.get(name).copied()
    }

    /// Find the binding a name refers to from the current scope.
    ///
    /// Once the walk leaves a function scope only globals are visible.
    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        let mut crossed_function = false;
        let mut id = Some(self.current);
        while let Some(scope_id) = id {
            let scope = self.scope(scope_id);
            if !crossed_function || scope.kind == ScopeKind::Global {
                if let Some(&decl) = scope.variables.get(name) {
                    return Some(decl);
                }
            }
            crossed_function |= scope.kind == ScopeKind::Function;
            id = scope.parent;
        }
        None
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    /// Record the first assignment of a binding. Later calls keep the first site.
    pub fn mark_initialized(&mut self, id: DeclId, span: Span) {
        let decl = &mut self.decls[id.index()];
        if decl.init.is_none() {
            decl.init = Some(span);
        }
    }

    /// Whether a declaration lives in frame 0.
    pub fn is_global_decl(&self, id: DeclId) -> bool {
        self.decl(id).scope == ScopeId::GLOBAL
    }

    /// Whether a declaration belongs to a function frame other than the current one.
    pub fn is_foreign_local(&self, id: DeclId) -> bool {
        let scope = self.decl(id).scope;
        scope != ScopeId::GLOBAL && self.frame_of(scope) != self.frame_of(self.current)
    }

    // ==========================================================================
    // Structs and Types
    // ==========================================================================

    /// Register a struct as both a struct and a type name in the current scope.
    pub fn declare_struct(&mut self, struct_type: Rc<StructType>) -> Result<(), TypeClash> {
        let scope = self.current_scope();
        if let Some(existing) = scope.structs.get(&struct_type.name) {
            return Err(TypeClash::Struct(existing.clone()));
        }
        if scope.types.contains_key(&struct_type.name) {
            return Err(TypeClash::Builtin);
        }

        let scope = self.current_scope_mut();
        scope
            .types
            .insert(struct_type.name.clone(), Type::Struct(struct_type.clone()));
        scope.structs.insert(struct_type.name.clone(), struct_type);
        Ok(())
    }

    /// Find a struct by name, walking every enclosing scope.
    pub fn lookup_struct(&self, name: &str) -> Option<Rc<StructType>> {
        self.ancestors()
            .find_map(|scope| scope.structs.get(name).cloned())
    }

    /// Resolve a type name, walking every enclosing scope.
    pub fn lookup_type(&self, name: &str) -> Option<Type> {
        self.ancestors().find_map(|scope| scope.types.get(name).cloned())
    }

    fn ancestors(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(self.current_scope()), |scope| {
            scope.parent.map(|parent| self.scope(parent))
        })
    }
}
