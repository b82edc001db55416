#![forbid(unsafe_code)]

use std::fmt::Write as _;

use crate::opcode::{ConstIdx, Instr, Reg};
use crate::value::Value;

/// Index into [`Module::functions`]. Function references in constant pools
/// and the compile-time parent chain both use these indices, so no cyclic
/// ownership arises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncId(pub u32);

/// One constant pool entry. Named entries model `const` declarations and
/// function references; anonymous entries are literals deduplicated by
/// value.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantValue {
    pub name: Option<String>,
    pub value: Value,
}

/// An allocated local-register record. Temporaries stack LIFO on top of
/// named locals and are reclaimed at statement boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalRegister {
    pub name: String,
    pub address: Reg,
    pub depth: u32,
    pub temp: bool,
}

/// A function (or the top-level module) under construction and at runtime:
/// instructions, constant pool, and the compile-time local-register table.
#[derive(Clone, Debug)]
pub struct FunctionObject {
    pub name: String,
    pub instrs: Vec<Instr>,
    pub constants: Vec<ConstantValue>,
    pub locals: Vec<LocalRegister>,
    pub scope_depth: u32,
    pub parent: Option<FuncId>,
}

impl FunctionObject {
    pub fn new(name: impl Into<String>, parent: Option<FuncId>) -> Self {
        Self {
            name: name.into(),
            instrs: Vec::new(),
            constants: Vec::new(),
            locals: Vec::new(),
            scope_depth: 0,
            parent,
        }
    }

    pub fn enter_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Drops every trailing record belonging to the scope being left.
    pub fn leave_scope(&mut self) {
        while let Some(last) = self.locals.last() {
            if last.depth != self.scope_depth {
                break;
            }
            self.locals.pop();
        }
        self.scope_depth = self.scope_depth.saturating_sub(1);
    }

    pub fn add_local(&mut self, name: impl Into<String>) -> Reg {
        let address = Reg(self.locals.len());
        self.locals.push(LocalRegister {
            name: name.into(),
            address,
            depth: self.scope_depth,
            temp: false,
        });
        address
    }

    pub fn add_temp(&mut self) -> Reg {
        let address = Reg(self.locals.len());
        self.locals.push(LocalRegister {
            name: format!("<temp#{}>", self.locals.len()),
            address,
            depth: self.scope_depth,
            temp: true,
        });
        address
    }

    /// Removes the top record if it is a temporary; no-op otherwise.
    pub fn pop_temp_register(&mut self) -> Option<LocalRegister> {
        if !self.locals.last()?.temp {
            return None;
        }
        self.locals.pop()
    }

    /// Trims the trailing run of temporaries; called at statement
    /// boundaries so temporaries never leak across statements.
    pub fn free_all_temp_registers(&mut self) {
        while matches!(self.locals.last(), Some(local) if local.temp) {
            self.locals.pop();
        }
    }

    /// Renames a temporary into a named local in place. Returns false when
    /// the slot is out of range or already bound.
    pub fn bind_local(&mut self, register: Reg, name: impl Into<String>) -> bool {
        let Some(local) = self.locals.get_mut(register.0) else {
            return false;
        };
        if !local.temp {
            return false;
        }
        local.name = name.into();
        local.temp = false;
        true
    }

    /// Linear search from the top so the newest binding shadows older ones.
    pub fn lookup_local(&self, name: &str) -> Option<&LocalRegister> {
        self.locals.iter().rev().find(|local| local.name == name)
    }

    /// Named entry; a duplicate name is a caller error.
    pub fn add_constant(&mut self, name: impl Into<String>, value: Value) -> Result<ConstIdx, String> {
        let name = name.into();
        if self
            .constants
            .iter()
            .any(|c| c.name.as_deref() == Some(name.as_str()))
        {
            return Err(name);
        }
        self.constants.push(ConstantValue {
            name: Some(name),
            value,
        });
        Ok(ConstIdx(self.constants.len() - 1))
    }

    /// Anonymous entry, deduplicated by kind and value.
    pub fn emit_constant_value(&mut self, value: Value) -> ConstIdx {
        if let Some(idx) = self.constants.iter().position(|c| c.value == value) {
            return ConstIdx(idx);
        }
        self.constants.push(ConstantValue { name: None, value });
        ConstIdx(self.constants.len() - 1)
    }

    /// Appends an instruction and returns its address for later patching.
    pub fn emit(&mut self, instr: Instr) -> usize {
        self.instrs.push(instr);
        self.instrs.len() - 1
    }

    pub fn patch(&mut self, address: usize, instr: Instr) {
        self.instrs[address] = instr;
    }
}

/// The compiled program: a function arena whose entry is the top-level
/// module function.
#[derive(Clone, Debug)]
pub struct Module {
    pub functions: Vec<FunctionObject>,
    pub entry: FuncId,
}

impl Module {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            functions: vec![FunctionObject::new(module_name, None)],
            entry: FuncId(0),
        }
    }

    pub fn add_function(&mut self, function: FunctionObject) -> FuncId {
        self.functions.push(function);
        FuncId(self.functions.len() as u32 - 1)
    }

    pub fn function(&self, id: FuncId) -> &FunctionObject {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FuncId) -> &mut FunctionObject {
        &mut self.functions[id.0 as usize]
    }

    /// Walks the parent-function chain looking for a named constant; this is
    /// how a nested function body references an enclosing pool entry.
    pub fn lookup_constant(&self, from: FuncId, name: &str) -> Option<Value> {
        let mut current = Some(from);
        while let Some(id) = current {
            let func = self.function(id);
            for constant in &func.constants {
                if constant.name.as_deref() == Some(name) {
                    return Some(constant.value.clone());
                }
            }
            current = func.parent;
        }
        None
    }

    /// Renders every function object: constant pool, register table and
    /// instruction listing.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for func in &self.functions {
            let _ = writeln!(out, "--------------- function {} ---------------", func.name);
            let _ = writeln!(out, "constants ({}):", func.constants.len());
            for (idx, constant) in func.constants.iter().enumerate() {
                let rendered = match &constant.value {
                    Value::Func(id) => format!("fn#{}", id.0),
                    Value::Str(s) => s.clone(),
                    Value::Builtin(name) => name.clone(),
                    Value::Bool(b) => b.to_string(),
                    Value::I8(v) | Value::I16(v) | Value::I32(v) | Value::I64(v) => v.to_string(),
                    Value::F32(v) | Value::F64(v) => v.to_string(),
                    Value::Undefined => "undefined".to_string(),
                };
                let name = constant.name.as_deref().unwrap_or("");
                let _ = writeln!(
                    out,
                    "    {idx}: <{}> {rendered}  {name}",
                    constant.value.kind_name()
                );
            }
            let _ = writeln!(out, "registers ({}):", func.locals.len());
            for (idx, local) in func.locals.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "    {idx}: {} (temp={}, scope={})",
                    local.name, local.temp, local.depth
                );
            }
            let _ = writeln!(out, "instructions ({}):", func.instrs.len());
            for (idx, instr) in func.instrs.iter().enumerate() {
                let _ = writeln!(out, "    {idx}: {instr}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporaries_stack_lifo() {
        let mut func = FunctionObject::new("t", None);
        let a = func.add_temp();
        let b = func.add_temp();
        assert_eq!((a, b), (Reg(0), Reg(1)));
        assert_eq!(func.pop_temp_register().map(|l| l.address), Some(b));
        assert_eq!(func.pop_temp_register().map(|l| l.address), Some(a));
        assert!(func.pop_temp_register().is_none());
    }

    #[test]
    fn pop_temp_refuses_named_locals() {
        let mut func = FunctionObject::new("t", None);
        func.add_local("x");
        assert!(func.pop_temp_register().is_none());
        assert_eq!(func.locals.len(), 1);
    }

    #[test]
    fn free_all_trims_only_the_trailing_run() {
        let mut func = FunctionObject::new("t", None);
        func.add_temp();
        func.add_local("x");
        func.add_temp();
        func.add_temp();
        func.free_all_temp_registers();
        assert_eq!(func.locals.len(), 2);
        assert!(func.locals[0].temp);
        assert_eq!(func.locals[1].name, "x");
    }

    #[test]
    fn bind_local_renames_a_temporary_in_place() {
        let mut func = FunctionObject::new("t", None);
        let reg = func.add_temp();
        assert!(func.bind_local(reg, "x"));
        assert!(!func.bind_local(reg, "y"));
        assert!(!func.bind_local(Reg(9), "z"));
        assert_eq!(func.lookup_local("x").map(|l| l.address), Some(reg));
    }

    #[test]
    fn leave_scope_drops_that_scopes_records() {
        let mut func = FunctionObject::new("t", None);
        func.add_local("outer");
        func.enter_scope();
        func.add_local("inner");
        func.add_temp();
        func.leave_scope();
        assert_eq!(func.locals.len(), 1);
        assert_eq!(func.locals[0].name, "outer");
    }

    #[test]
    fn lookup_local_prefers_the_newest_binding() {
        let mut func = FunctionObject::new("t", None);
        func.add_local("x");
        func.enter_scope();
        let shadow = func.add_local("x");
        assert_eq!(func.lookup_local("x").map(|l| l.address), Some(shadow));
    }

    #[test]
    fn constants_deduplicate_anonymous_entries() {
        let mut func = FunctionObject::new("t", None);
        let a = func.emit_constant_value(Value::I64(1));
        let b = func.emit_constant_value(Value::I64(1));
        let c = func.emit_constant_value(Value::I64(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn named_constants_reject_duplicates() {
        let mut func = FunctionObject::new("t", None);
        assert!(func.add_constant("ONE", Value::I64(1)).is_ok());
        assert!(func.add_constant("ONE", Value::I64(2)).is_err());
    }

    #[test]
    fn constant_lookup_walks_the_parent_chain() {
        let mut module = Module::new("<module>");
        module
            .function_mut(FuncId(0))
            .add_constant("shared", Value::I64(7))
            .unwrap();
        let child = module.add_function(FunctionObject::new("child", Some(FuncId(0))));
        assert_eq!(
            module.lookup_constant(child, "shared"),
            Some(Value::I64(7))
        );
        assert_eq!(module.lookup_constant(child, "missing"), None);
    }
}
