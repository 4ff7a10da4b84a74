use std::collections::HashMap;

use crate::ast::Type;
use crate::error::{Error, Position, Result};
use crate::sema::symbol::Symbol;

/// Name resolution across nested lexical scopes.
///
/// Mutated only via `enter`, `exit`, and `declare` (the shared-resource
/// policy from the concurrency section): the statement emitter is the sole
/// caller, so no other module reaches into a scope's internals.
#[derive(Default)]
pub struct ScopeTable {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn enter(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Returns the symbols declared in the scope being popped, so the
    /// caller (the statement emitter) can release their cells from the
    /// tape allocator in the same order.
    pub fn exit(&mut self) -> Vec<Symbol> {
        let scope = self.scopes.pop().expect("unbalanced scope exit");
        let mut symbols: Vec<_> = scope.into_values().collect();
        symbols.sort_by_key(|s| s.cell);
        symbols
    }

    pub fn declare(&mut self, name: &str, ty: Type, cell: usize, pos: Position) -> Result<()> {
        let depth = self.depth();
        let scope = self.scopes.last_mut().expect("at least one scope");
        if scope.contains_key(name) {
            return Err(Error::semantic(
                pos,
                format!("redeclaration of '{name}' in the same scope"),
            ));
        }
        scope.insert(name.to_string(), Symbol::new(name, ty, cell, depth));
        Ok(())
    }

    pub fn declare_param(&mut self, name: &str, ty: Type, cell: usize, pos: Position) -> Result<()> {
        self.declare(name, ty, cell, pos)?;
        let depth = self.depth();
        if let Some(sym) = self.scopes[depth].get_mut(name) {
            sym.is_param = true;
        }
        Ok(())
    }

    pub fn declare_global(&mut self, name: &str, ty: Type, cell: usize, pos: Position) -> Result<()> {
        let scope = self.scopes.first_mut().expect("global scope always exists");
        if scope.contains_key(name) {
            return Err(Error::semantic(pos, format!("redeclaration of global '{name}'")));
        }
        scope.insert(name.to_string(), Symbol::new(name, ty, cell, 0));
        Ok(())
    }

    pub fn resolve(&self, name: &str, pos: Position) -> Result<&Symbol> {
        for scope in self.scopes.iter().rev() {
            if let Some(sym) = scope.get(name) {
                return Ok(sym);
            }
        }
        Err(Error::semantic(pos, format!("undeclared identifier '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_across_scopes_is_allowed() {
        let mut table = ScopeTable::new();
        let pos = Position::default();
        table.declare_global("x", Type::Int, 0, pos).unwrap();
        table.enter();
        table.declare("x", Type::Int, 1, pos).unwrap();
        assert_eq!(table.resolve("x", pos).unwrap().cell, 1);
        table.exit();
        assert_eq!(table.resolve("x", pos).unwrap().cell, 0);
    }

    #[test]
    fn redeclaration_in_same_scope_errors() {
        let mut table = ScopeTable::new();
        let pos = Position::default();
        table.declare_global("x", Type::Int, 0, pos).unwrap();
        assert!(table.declare_global("x", Type::Int, 1, pos).is_err());
    }

    #[test]
    fn undeclared_identifier_errors() {
        let table = ScopeTable::new();
        assert!(table.resolve("missing", Position::default()).is_err());
    }
}
