#![forbid(unsafe_code)]

use std::collections::HashMap;

use brook_ast::Span;

use crate::types::{FuncType, PrimType, Type};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
}

impl SymbolKind {
    pub fn describe(self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Function => "function",
        }
    }
}

#[derive(Clone, Debug)]
pub struct SymbolInfo {
    pub name: String,
    pub used: bool,
    pub ty: Type,
    pub kind: SymbolKind,
    /// Absent for built-ins.
    pub span: Option<Span>,
}

#[derive(Clone, Debug)]
pub struct TypeInfo {
    pub name: String,
    pub used: bool,
    pub ty: Type,
    pub span: Option<Span>,
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<usize>,
    symbols: HashMap<String, SymbolId>,
    types: HashMap<String, TypeId>,
}

/// Scoped symbol table with two namespaces (symbols and types). Scopes live
/// in an arena so closed scopes remain inspectable for the unused-symbol
/// diagnostic.
#[derive(Debug)]
pub struct Env {
    scopes: Vec<Scope>,
    current: usize,
    symbols: Vec<SymbolInfo>,
    types: Vec<TypeInfo>,
}

impl Env {
    pub fn new() -> Self {
        let mut env = Self {
            scopes: vec![Scope::default()],
            current: 0,
            symbols: Vec::new(),
            types: Vec::new(),
        };

        for prim in [
            PrimType::I8,
            PrimType::I16,
            PrimType::I32,
            PrimType::I64,
            PrimType::U8,
            PrimType::U16,
            PrimType::U32,
            PrimType::U64,
            PrimType::F32,
            PrimType::F64,
            PrimType::Bool,
            PrimType::Str,
            PrimType::Void,
        ] {
            let _ = env.insert_type(TypeInfo {
                name: prim.name().to_string(),
                used: true,
                ty: Type::Prim(prim),
                span: None,
            });
        }

        for (name, sig) in builtin_signatures() {
            let _ = env.insert_symbol(SymbolInfo {
                name: name.to_string(),
                used: true,
                ty: Type::Func(sig),
                kind: SymbolKind::Function,
                span: None,
            });
        }

        env
    }

    pub fn open_scope(&mut self) {
        let scope = Scope {
            parent: Some(self.current),
            symbols: HashMap::new(),
            types: HashMap::new(),
        };
        self.scopes.push(scope);
        self.current = self.scopes.len() - 1;
    }

    /// Closing the root scope is a no-op.
    pub fn close_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    /// Inserts into the current scope; `Err` carries the already-present
    /// symbol so the caller can report where it was declared.
    pub fn insert_symbol(&mut self, info: SymbolInfo) -> Result<SymbolId, SymbolId> {
        if let Some(&existing) = self.scopes[self.current].symbols.get(&info.name) {
            return Err(existing);
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.scopes[self.current]
            .symbols
            .insert(info.name.clone(), id);
        self.symbols.push(info);
        Ok(id)
    }

    pub fn insert_type(&mut self, info: TypeInfo) -> Result<TypeId, TypeId> {
        if let Some(&existing) = self.scopes[self.current].types.get(&info.name) {
            return Err(existing);
        }
        let id = TypeId(self.types.len() as u32);
        self.scopes[self.current].types.insert(info.name.clone(), id);
        self.types.push(info);
        Ok(id)
    }

    pub fn lookup_symbol_local(&self, name: &str) -> Option<SymbolId> {
        self.scopes[self.current].symbols.get(name).copied()
    }

    pub fn lookup_symbol(&self, name: &str) -> Option<SymbolId> {
        let mut scope = self.current;
        loop {
            if let Some(&id) = self.scopes[scope].symbols.get(name) {
                return Some(id);
            }
            scope = self.scopes[scope].parent?;
        }
    }

    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        let mut scope = self.current;
        loop {
            if let Some(&id) = self.scopes[scope].types.get(name) {
                return Some(id);
            }
            scope = self.scopes[scope].parent?;
        }
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolInfo {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut SymbolInfo {
        &mut self.symbols[id.0 as usize]
    }

    pub fn type_info(&self, id: TypeId) -> &TypeInfo {
        &self.types[id.0 as usize]
    }

    pub fn type_info_mut(&mut self, id: TypeId) -> &mut TypeInfo {
        &mut self.types[id.0 as usize]
    }

    /// Every user-declared symbol or type that was never marked used, across
    /// all scopes ever opened.
    pub fn unused_symbols(&self) -> Vec<(String, Span)> {
        let mut unused = Vec::new();
        for info in &self.symbols {
            if !info.used {
                if let Some(span) = info.span {
                    unused.push((info.name.clone(), span));
                }
            }
        }
        for info in &self.types {
            if !info.used {
                if let Some(span) = info.span {
                    unused.push((info.name.clone(), span));
                }
            }
        }
        unused
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

/// Signatures of the built-in functions pre-registered in the root scope.
/// `println` is variadic: a spread parameter whose arguments are not
/// type-checked.
pub fn builtin_signatures() -> Vec<(&'static str, FuncType)> {
    vec![(
        "println",
        FuncType {
            params: Vec::new(),
            ret: Box::new(Type::VOID),
            spread: Some(Box::new(Type::VOID)),
        },
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use brook_ast::span;

    fn var(name: &str) -> SymbolInfo {
        SymbolInfo {
            name: name.to_string(),
            used: false,
            ty: Type::Prim(PrimType::I32),
            kind: SymbolKind::Variable,
            span: Some(span(0, 1)),
        }
    }

    #[test]
    fn duplicate_insert_fails_in_same_scope_only() {
        let mut env = Env::new();
        env.insert_symbol(var("x")).expect("first insert");
        assert!(env.insert_symbol(var("x")).is_err());

        env.open_scope();
        env.insert_symbol(var("x")).expect("shadowing in child scope");
        env.close_scope();
    }

    #[test]
    fn recursive_lookup_walks_parents_local_does_not() {
        let mut env = Env::new();
        let outer = env.insert_symbol(var("x")).expect("insert");
        env.open_scope();
        assert_eq!(env.lookup_symbol("x"), Some(outer));
        assert_eq!(env.lookup_symbol_local("x"), None);
        env.close_scope();
    }

    #[test]
    fn closing_root_scope_is_noop() {
        let mut env = Env::new();
        env.close_scope();
        env.close_scope();
        assert!(env.lookup_type("i32").is_some());
    }

    #[test]
    fn primitives_and_builtins_are_preregistered() {
        let env = Env::new();
        for name in ["i8", "u64", "f32", "bool", "string", "void"] {
            assert!(env.lookup_type(name).is_some(), "missing type {name}");
        }
        let id = env.lookup_symbol("println").expect("println");
        assert_eq!(env.symbol(id).kind, SymbolKind::Function);
        assert!(env.symbol(id).used);
    }

    #[test]
    fn unused_tracking_survives_scope_close() {
        let mut env = Env::new();
        env.open_scope();
        env.insert_symbol(var("dead")).expect("insert");
        env.close_scope();
        let unused = env.unused_symbols();
        assert!(unused.iter().any(|(name, _)| name == "dead"));
    }
}
