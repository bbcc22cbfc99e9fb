// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Scope management for variable resolution during compilation.
//!
//! The symbol table is a stack of [`Scope`]s, innermost last. Scope 0 is
//! the global scope and also holds the builtins.

use rustc_hash::FxHashMap;

/// Storage class of a resolved name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolScope {
    /// Slot in the globals store
    Global,
    /// Slot relative to the frame's base pointer
    Local,
    /// Index in the builtins table
    Builtin,
    /// Index in the running closure's captured values
    Free,
    /// The running closure itself
    Function,
}

/// A name bound to a storage class and slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// The bound name
    pub name: String,
    /// Where the value lives
    pub scope: SymbolScope,
    /// Slot within that storage class
    pub index: usize,
}

/// One lexical scope.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    store: FxHashMap<String, Symbol>,
    /// Slots handed out by `define` in this scope
    pub num_definitions: usize,
    /// Symbols captured from enclosing scopes, in capture order. Each entry
    /// is the symbol as the enclosing scope sees it.
    pub free_symbols: Vec<Symbol>,
}

/// Stack of lexical scopes.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Creates a table holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Nesting depth; 0 while compiling top-level code.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Enters a function body.
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Leaves a function body, returning its scope. The global scope is
    /// never popped.
    pub fn pop_scope(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Binds `name` to the next slot of the current scope.
    pub fn define(&mut self, name: &str) -> Symbol {
        let scope_kind = if self.depth() == 0 {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let scope = self.current_mut();
        let symbol = Symbol {
            name: name.to_string(),
            scope: scope_kind,
            index: scope.num_definitions,
        };
        scope.num_definitions += 1;
        scope.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Binds `name` to builtin slot `index` in the global scope.
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
        };
        self.scopes[0].store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Binds `name` to the function being compiled in the current scope.
    pub fn define_function_self(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Function,
            index: 0,
        };
        self.current_mut()
            .store
            .insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Resolves `name` from the innermost scope outwards.
    ///
    /// A name found in an enclosing function scope is captured as a free
    /// variable in every scope between there and here. Globals and builtins
    /// are returned as-is at any depth.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        self.resolve_at(self.depth(), name)
    }

    fn resolve_at(&mut self, depth: usize, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.scopes[depth].store.get(name) {
            return Some(symbol.clone());
        }
        if depth == 0 {
            return None;
        }

        let outer = self.resolve_at(depth - 1, name)?;
        match outer.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(outer),
            _ => Some(self.define_free(depth, outer)),
        }
    }

    fn define_free(&mut self, depth: usize, original: Symbol) -> Symbol {
        let scope = &mut self.scopes[depth];
        let symbol = Symbol {
            name: original.name.clone(),
            scope: SymbolScope::Free,
            index: scope.free_symbols.len(),
        };
        scope.free_symbols.push(original);
        scope.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    fn current_mut(&mut self) -> &mut Scope {
        let depth = self.depth();
        &mut self.scopes[depth]
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
