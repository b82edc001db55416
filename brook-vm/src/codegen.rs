#![forbid(unsafe_code)]

use std::collections::HashMap;

use brook_ast::{
    AssignOp, BinOp, Block, ConstStmt, ElseBranch, Expr, ExprKind, FnDecl, ForStmt, Ident,
    IfExpr, LetStmt, Program, Span, Stmt, TypeRefKind, UnaryOp,
};
use brook_core::{Analysis, Env, Type};

use crate::builtins;
use crate::error::CodegenError;
use crate::function::{FuncId, FunctionObject, Module};
use crate::opcode::{BinaryOp, Instr, Reg, PATCH_TARGET};
use crate::value::Value;

struct ForContext {
    cond_addr: usize,
    break_jumps: Vec<usize>,
    continue_jumps: Vec<usize>,
}

/// Tree-walk lowering from the typed AST to VM instructions: one module
/// function for the top level plus one nested function per declaration.
/// Register allocation is a simple stack discipline; every value-producing
/// expression ends in either a fresh temporary at the top of the register
/// stack or an already-bound local.
pub struct Generator<'a> {
    analysis: &'a Analysis,
    env: &'a Env,
    module: Module,
    current: FuncId,
    for_stack: Vec<ForContext>,
    last_block_expr: Option<Reg>,
    // Function constants are registered (with reserved ids) before any body
    // in the same statement list is emitted, so forward references and
    // mutual recursion resolve.
    pre_registered: HashMap<(FuncId, String), FuncId>,
}

impl<'a> Generator<'a> {
    pub fn new(analysis: &'a Analysis, env: &'a Env) -> Self {
        let module = Module::new("<module>");
        let current = module.entry;
        Self {
            analysis,
            env,
            module,
            current,
            for_stack: Vec::new(),
            last_block_expr: None,
            pre_registered: HashMap::new(),
        }
    }

    pub fn generate(mut self, program: &Program) -> Result<Module, CodegenError> {
        let entry = self.module.entry;
        for name in builtins::names() {
            if self
                .module
                .function_mut(entry)
                .add_constant(*name, Value::Builtin(name.to_string()))
                .is_err()
            {
                return Err(CodegenError::new(
                    format!("duplicate built-in constant '{name}'"),
                    Span::new(0.into(), 0),
                ));
            }
        }

        self.predeclare_functions(&program.stmts)?;
        for stmt in &program.stmts {
            self.emit_stmt(stmt)?;
        }
        Ok(self.module)
    }

    fn func(&self) -> &FunctionObject {
        self.module.function(self.current)
    }

    fn func_mut(&mut self) -> &mut FunctionObject {
        self.module.function_mut(self.current)
    }

    fn emit(&mut self, instr: Instr) -> usize {
        self.func_mut().emit(instr)
    }

    fn predeclare_functions(&mut self, stmts: &[Stmt]) -> Result<(), CodegenError> {
        for stmt in stmts {
            let Stmt::Fn(decl) = stmt else { continue };
            let key = (self.current, decl.name.node.clone());
            if self.pre_registered.contains_key(&key) {
                continue;
            }
            let id = self
                .module
                .add_function(FunctionObject::new(decl.name.node.clone(), Some(self.current)));
            if self
                .func_mut()
                .add_constant(decl.name.node.clone(), Value::Func(id))
                .is_err()
            {
                return Err(CodegenError::new(
                    format!(
                        "constant '{}' already exists in this function's pool",
                        decl.name.node
                    ),
                    decl.name.span,
                ));
            }
            self.pre_registered.insert(key, id);
        }
        Ok(())
    }

    // --- statements ---

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match stmt {
            Stmt::Const(decl) => self.emit_const(decl),
            Stmt::Let(decl) => self.emit_let(decl),
            Stmt::Fn(decl) => self.emit_fn(decl),
            Stmt::For(stmt) => self.emit_for(stmt),
            Stmt::Break { span } => {
                if self.for_stack.is_empty() {
                    return Err(CodegenError::new("break statement outside of a loop", *span));
                }
                let addr = self.emit(Instr::Jump {
                    target: PATCH_TARGET,
                });
                if let Some(ctx) = self.for_stack.last_mut() {
                    ctx.break_jumps.push(addr);
                }
                Ok(())
            }
            Stmt::Continue { span } => {
                if self.for_stack.is_empty() {
                    return Err(CodegenError::new(
                        "continue statement outside of a loop",
                        *span,
                    ));
                }
                let addr = self.emit(Instr::Jump {
                    target: PATCH_TARGET,
                });
                if let Some(ctx) = self.for_stack.last_mut() {
                    ctx.continue_jumps.push(addr);
                }
                Ok(())
            }
            Stmt::Return(ret) => {
                match &ret.expr {
                    Some(expr) => {
                        let from = self.emit_expr_aligned(expr)?;
                        self.emit(Instr::Return { from, count: 1 });
                    }
                    None => {
                        self.emit(Instr::Return {
                            from: Reg(0),
                            count: 0,
                        });
                    }
                }
                Ok(())
            }
            Stmt::Block(block) => self.emit_block(block),
            Stmt::Expr(expr) => {
                let reg = self.emit_expr_aligned(expr)?;
                self.last_block_expr = Some(reg);
                Ok(())
            }
        }
    }

    /// `const` declarations emit no instructions; the folded initializer is
    /// stored as a named pool entry.
    fn emit_const(&mut self, decl: &ConstStmt) -> Result<(), CodegenError> {
        let Some(value) = literal_value(&decl.init) else {
            return Err(CodegenError::new(
                format!(
                    "initializer of constant '{}' must be a literal expression",
                    decl.name.node
                ),
                decl.init.span,
            ));
        };
        if self
            .func_mut()
            .add_constant(decl.name.node.clone(), value)
            .is_err()
        {
            return Err(CodegenError::new(
                format!(
                    "constant '{}' already exists in this function's pool",
                    decl.name.node
                ),
                decl.name.span,
            ));
        }
        Ok(())
    }

    fn emit_let(&mut self, decl: &LetStmt) -> Result<(), CodegenError> {
        let Some(init) = &decl.init else {
            self.func_mut().add_local(decl.name.node.clone());
            return Ok(());
        };

        let left = self.emit_expr_aligned(init)?;
        if !self.func_mut().bind_local(left, decl.name.node.clone()) {
            // The initializer landed in another variable's register (the
            // `let x = y` case); binding would alias them, so allocate a
            // fresh register and copy.
            let reg = self.func_mut().add_local(decl.name.node.clone());
            if left != reg {
                self.emit(Instr::Move { dst: reg, src: left });
            }
        }
        Ok(())
    }

    fn emit_fn(&mut self, decl: &FnDecl) -> Result<(), CodegenError> {
        let key = (self.current, decl.name.node.clone());
        let id = match self.pre_registered.get(&key) {
            Some(id) => *id,
            None => {
                // Function declarations are pre-registered per statement
                // list; a miss here is a generator bug.
                return Err(CodegenError::new(
                    format!("function '{}' was not pre-registered", decl.name.node),
                    decl.name.span,
                ));
            }
        };

        let saved_fn = self.current;
        let saved_last = self.last_block_expr.take();
        // Loop contexts belong to the enclosing function's instruction list.
        let saved_for = std::mem::take(&mut self.for_stack);
        self.current = id;

        for param in &decl.params {
            self.func_mut().add_local(param.name.node.clone());
        }

        self.predeclare_functions(&decl.body.stmts)?;
        for stmt in &decl.body.stmts {
            self.emit_stmt(stmt)?;
        }

        // A non-void function whose body ends in a yielding expression
        // statement returns that value implicitly.
        if !fn_ret_is_void(decl) {
            if matches!(decl.body.stmts.last(), Some(Stmt::Expr(_))) {
                if let Some(from) = self.last_block_expr {
                    self.emit(Instr::Return { from, count: 1 });
                }
            }
        }

        // Synthetic tail return so execution cannot fall off the end.
        self.emit(Instr::Return {
            from: Reg(0),
            count: 0,
        });

        self.current = saved_fn;
        self.last_block_expr = saved_last;
        self.for_stack = saved_for;
        Ok(())
    }

    fn emit_for(&mut self, stmt: &ForStmt) -> Result<(), CodegenError> {
        self.func_mut().enter_scope();

        // Prologue: loop variable starts at the range start.
        let loop_var = self.func_mut().add_local(stmt.var.node.clone());
        let start = self.emit_expr_aligned(&stmt.range.start)?;
        self.emit(Instr::Move {
            dst: loop_var,
            src: start,
        });

        // The end value is pinned under a hidden name so statement-boundary
        // alignment inside the body cannot reclaim its register.
        let end = self.emit_expr(&stmt.range.end)?;
        self.func_mut().bind_local(end, "<range_end>");

        let cond = self.func_mut().add_temp();
        let cond_op = if stmt.range.inclusive {
            BinaryOp::Lte
        } else {
            BinaryOp::Lt
        };
        let cond_addr = self.emit(Instr::Binary {
            op: cond_op,
            dst: cond,
            a: loop_var,
            b: end,
        });
        let exit_jump = self.emit(Instr::JumpIf {
            cond,
            imm: false,
            target: PATCH_TARGET,
        });
        self.func_mut().pop_temp_register();

        self.for_stack.push(ForContext {
            cond_addr,
            break_jumps: Vec::new(),
            continue_jumps: Vec::new(),
        });

        self.predeclare_functions(&stmt.body.stmts)?;
        for body_stmt in &stmt.body.stmts {
            self.emit_stmt(body_stmt)?;
        }

        // Epilogue: increment the loop variable and retest the condition.
        let one = self.func_mut().add_temp();
        self.func_mut().pop_temp_register();
        let one_idx = self.func_mut().emit_constant_value(Value::I64(1));
        let increment_addr = self.emit(Instr::LoadConst {
            dst: one,
            idx: one_idx,
        });
        self.emit(Instr::Binary {
            op: BinaryOp::Add,
            dst: loop_var,
            a: loop_var,
            b: one,
        });
        self.emit(Instr::Jump { target: cond_addr });

        let end_addr = self.func().instrs.len();
        self.func_mut().patch(
            exit_jump,
            Instr::JumpIf {
                cond,
                imm: false,
                target: end_addr,
            },
        );
        if let Some(ctx) = self.for_stack.pop() {
            for addr in ctx.continue_jumps {
                self.func_mut().patch(
                    addr,
                    Instr::Jump {
                        target: increment_addr,
                    },
                );
            }
            for addr in ctx.break_jumps {
                self.func_mut().patch(addr, Instr::Jump { target: end_addr });
            }
        }

        self.func_mut().leave_scope();
        Ok(())
    }

    fn emit_block(&mut self, block: &Block) -> Result<(), CodegenError> {
        self.func_mut().enter_scope();
        self.predeclare_functions(&block.stmts)?;
        for stmt in &block.stmts {
            self.emit_stmt(stmt)?;
        }
        self.func_mut().leave_scope();
        Ok(())
    }

    // --- expressions ---

    /// Statement-level emission: the expression's value register, with every
    /// trailing temporary released afterwards.
    fn emit_expr_aligned(&mut self, expr: &Expr) -> Result<Reg, CodegenError> {
        let reg = self.emit_expr(expr)?;
        self.func_mut().free_all_temp_registers();
        Ok(reg)
    }

    /// Releases operand temporaries so the register table is `len` entries
    /// again. Every value-producing expression must leave its result either
    /// in a fresh temporary at the top of the register stack or in an
    /// already-bound local; call-argument staging depends on it.
    fn trim_temps_to(&mut self, len: usize) {
        while self.func().locals.len() > len {
            if self.func_mut().pop_temp_register().is_none() {
                break;
            }
        }
    }

    fn emit_expr(&mut self, expr: &Expr) -> Result<Reg, CodegenError> {
        match &expr.kind {
            ExprKind::Int(_) | ExprKind::Float(_) => {
                let Some(value) = literal_value(expr) else {
                    return Err(CodegenError::new("malformed numeric literal", expr.span));
                };
                let dst = self.func_mut().add_temp();
                let idx = self.func_mut().emit_constant_value(value);
                self.emit(Instr::LoadConst { dst, idx });
                Ok(dst)
            }
            ExprKind::Bool(value) => {
                let dst = self.func_mut().add_temp();
                self.emit(Instr::LoadBool { dst, imm: *value });
                Ok(dst)
            }
            ExprKind::Str(raw) => {
                let dst = self.func_mut().add_temp();
                self.emit(Instr::LoadString {
                    dst,
                    imm: raw.clone(),
                });
                Ok(dst)
            }
            ExprKind::Ident(name) => {
                if let Some(local) = self.func().lookup_local(name) {
                    return Ok(local.address);
                }
                let Some(value) = self.module.lookup_constant(self.current, name) else {
                    return Err(CodegenError::new(
                        format!("unresolved symbol '{name}'"),
                        expr.span,
                    ));
                };
                let dst = self.func_mut().add_temp();
                let idx = self.func_mut().emit_constant_value(value);
                self.emit(Instr::LoadConst { dst, idx });
                Ok(dst)
            }
            ExprKind::Unary { op, expr: operand } => match op {
                UnaryOp::Pos => self.emit_expr(operand),
                UnaryOp::Neg => {
                    let dst = self.func_mut().add_temp();
                    let src = self.emit_expr(operand)?;
                    self.trim_temps_to(dst.0 + 1);
                    self.emit(Instr::Neg { dst, src });
                    Ok(dst)
                }
                UnaryOp::Not => {
                    let dst = self.func_mut().add_temp();
                    let src = self.emit_expr(operand)?;
                    self.trim_temps_to(dst.0 + 1);
                    self.emit(Instr::Not { dst, src });
                    Ok(dst)
                }
            },
            ExprKind::Binary { op, left, right } => {
                let dst = self.func_mut().add_temp();
                let a = self.emit_expr(left)?;
                let b = self.emit_expr(right)?;
                self.trim_temps_to(dst.0 + 1);
                self.emit(Instr::Binary {
                    op: lower_binop(*op),
                    dst,
                    a,
                    b,
                });
                Ok(dst)
            }
            ExprKind::Assign { op, target, value } => self.emit_assign(*op, target, value),
            ExprKind::If(if_expr) => self.emit_if(if_expr),
            ExprKind::Call { callee, args } => self.emit_call(expr, callee, args),
            ExprKind::Array(_) | ExprKind::Index { .. } => Err(CodegenError::new(
                "array values are not supported by the VM backend",
                expr.span,
            )),
            ExprKind::Range(_) => Err(CodegenError::new(
                "range expression is only valid as a for-loop bound",
                expr.span,
            )),
        }
    }

    fn emit_assign(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
    ) -> Result<Reg, CodegenError> {
        let mark = self.func().locals.len();
        let dst = self.emit_expr(target)?;
        let src = self.emit_expr(value)?;
        match op.binary() {
            None => {
                self.emit(Instr::Move { dst, src });
            }
            Some(bop) => {
                self.emit(Instr::Binary {
                    op: lower_binop(bop),
                    dst,
                    a: dst,
                    b: src,
                });
            }
        }
        self.trim_temps_to(mark);
        Ok(dst)
    }

    fn emit_if(&mut self, if_expr: &IfExpr) -> Result<Reg, CodegenError> {
        let cond = self.emit_expr_aligned(&if_expr.cond)?;
        let false_jump = self.emit(Instr::JumpIf {
            cond,
            imm: false,
            target: PATCH_TARGET,
        });
        let result = self.func_mut().add_temp();

        self.last_block_expr = None;
        self.emit_block(&if_expr.then_block)?;
        if let Some(last) = self.last_block_expr {
            self.emit(Instr::Move { dst: result, src: last });
        }
        let then_jump = self.emit(Instr::Jump {
            target: PATCH_TARGET,
        });

        let else_target = self.func().instrs.len();
        self.func_mut().patch(
            false_jump,
            Instr::JumpIf {
                cond,
                imm: false,
                target: else_target,
            },
        );

        if let Some(else_branch) = &if_expr.else_branch {
            match else_branch.as_ref() {
                ElseBranch::Block(block) => {
                    self.last_block_expr = None;
                    self.emit_block(block)?;
                    if let Some(last) = self.last_block_expr {
                        self.emit(Instr::Move { dst: result, src: last });
                    }
                }
                ElseBranch::If(chained) => {
                    let src = self.emit_expr_aligned(chained)?;
                    self.emit(Instr::Move { dst: result, src });
                }
            }
        }

        let end_target = self.func().instrs.len();
        self.func_mut().patch(
            then_jump,
            Instr::Jump { target: end_target },
        );
        self.last_block_expr = None;
        Ok(result)
    }

    fn emit_call(
        &mut self,
        expr: &Expr,
        callee: &Ident,
        args: &[Expr],
    ) -> Result<Reg, CodegenError> {
        // The callee register doubles as the return-value register.
        let callee_reg = self.func_mut().add_temp();
        let Some(func_ref) = self.module.lookup_constant(self.current, &callee.node) else {
            return Err(CodegenError::new(
                format!("unresolved function '{}'", callee.node),
                callee.span,
            ));
        };
        let idx = self.func_mut().emit_constant_value(func_ref);
        self.emit(Instr::LoadConst {
            dst: callee_reg,
            idx,
        });

        for arg in args {
            let reg = self.emit_expr(arg)?;
            // Arguments must occupy consecutive registers above the callee;
            // a named local gets copied into a fresh temporary.
            let named = {
                let func = self.func();
                reg.0 < func.locals.len() && !func.locals[reg.0].temp
            };
            if named {
                let tmp = self.func_mut().add_temp();
                self.emit(Instr::Move { dst: tmp, src: reg });
            }
        }

        let retc = self.call_ret_count(expr);
        self.emit(Instr::Call {
            callee: callee_reg,
            argc: args.len(),
            retc,
        });

        for _ in args {
            self.func_mut().pop_temp_register();
        }
        Ok(callee_reg)
    }

    fn call_ret_count(&self, call: &Expr) -> usize {
        let Some(sym) = self.analysis.symbol_of(call.id) else {
            return 1;
        };
        match &self.env.symbol(sym).ty {
            Type::Func(sig) if sig.ret.is_void() => 0,
            _ => 1,
        }
    }
}

fn lower_binop(op: BinOp) -> BinaryOp {
    match op {
        BinOp::Add => BinaryOp::Add,
        BinOp::Sub => BinaryOp::Sub,
        BinOp::Mul => BinaryOp::Mul,
        BinOp::Div => BinaryOp::Div,
        BinOp::Rem => BinaryOp::Mod,
        BinOp::Pow => BinaryOp::Pow,
        BinOp::BitAnd | BinOp::And => BinaryOp::And,
        BinOp::BitOr | BinOp::Or => BinaryOp::Or,
        BinOp::BitXor => BinaryOp::Xor,
        BinOp::Shl => BinaryOp::Shl,
        BinOp::Shr => BinaryOp::Shr,
        BinOp::Eq => BinaryOp::Eq,
        BinOp::Ne => BinaryOp::Neq,
        BinOp::Lt => BinaryOp::Lt,
        BinOp::Le => BinaryOp::Lte,
        BinOp::Gt => BinaryOp::Gt,
        BinOp::Ge => BinaryOp::Gte,
    }
}

fn fn_ret_is_void(decl: &FnDecl) -> bool {
    match &decl.ret {
        None => true,
        Some(tr) => matches!(&tr.kind, TypeRefKind::Name(name) if name == "void"),
    }
}

fn literal_value(expr: &Expr) -> Option<Value> {
    match &expr.kind {
        ExprKind::Int(lit) => i64::from_str_radix(&lit.text, lit.base).ok().map(Value::I64),
        ExprKind::Float(lit) => lit.text.parse::<f64>().ok().map(Value::F64),
        ExprKind::Bool(value) => Some(Value::Bool(*value)),
        ExprKind::Str(raw) => Some(Value::Str(raw.clone())),
        _ => None,
    }
}
