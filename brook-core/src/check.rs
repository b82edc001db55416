#![forbid(unsafe_code)]

use std::collections::HashMap;

use brook_ast::{
    BinOp, Block, ConstStmt, ElseBranch, Expr, ExprKind, FloatLit, FnDecl, ForStmt, IfExpr,
    IntLit, LetStmt, NodeId, Program, ReturnStmt, Span, Stmt, TypeRef, TypeRefKind, UnaryOp,
};

use crate::env::{Env, SymbolId, SymbolInfo, SymbolKind};
use crate::error::{SemanticError, SemanticWarning};
use crate::types::{is_compatible, is_left_compatible, FuncType, PrimType, Type};

/// Checker results, recorded out of line and keyed by expression node id.
#[derive(Debug, Default)]
pub struct Analysis {
    expr_types: HashMap<NodeId, Type>,
    resolved: HashMap<NodeId, SymbolId>,
}

impl Analysis {
    pub fn type_of(&self, id: NodeId) -> &Type {
        self.expr_types.get(&id).unwrap_or(&Type::INVALID)
    }

    pub fn symbol_of(&self, id: NodeId) -> Option<SymbolId> {
        self.resolved.get(&id).copied()
    }

    fn record_type(&mut self, id: NodeId, ty: Type) {
        self.expr_types.insert(id, ty);
    }

    fn record_symbol(&mut self, id: NodeId, symbol: SymbolId) {
        self.resolved.insert(id, symbol);
    }
}

pub struct CheckOutcome {
    pub env: Env,
    pub analysis: Analysis,
    pub errors: Vec<SemanticError>,
    pub warnings: Vec<SemanticWarning>,
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Clone, Debug)]
struct FnCtx {
    name: String,
    ret: Type,
}

/// Two-pass semantic analyzer. Pass 1 hoists top-level function signatures
/// (solving mutual recursion); pass 2 visits every statement, assigning
/// inferred types to expression nodes and accumulating diagnostics. A
/// declaration that fails to check is still inserted with an invalid type so
/// later references do not cascade into "not found" errors.
pub struct Checker {
    env: Env,
    analysis: Analysis,
    errors: Vec<SemanticError>,
    warnings: Vec<SemanticWarning>,
    fn_stack: Vec<FnCtx>,
    loop_depth: u32,
}

impl Checker {
    pub fn new() -> Self {
        Self {
            env: Env::new(),
            analysis: Analysis::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
            fn_stack: Vec::new(),
            loop_depth: 0,
        }
    }

    pub fn check_program(mut self, program: &Program) -> CheckOutcome {
        for stmt in &program.stmts {
            if let Stmt::Fn(decl) = stmt {
                self.declare_fn(decl);
            }
        }

        for stmt in &program.stmts {
            match stmt {
                Stmt::Fn(decl) => self.visit_fn(decl, true),
                other => self.visit_stmt(other),
            }
        }

        for (name, span) in self.env.unused_symbols() {
            self.warnings
                .push(SemanticWarning::new(format!("symbol '{name}' is never used"), span));
        }

        CheckOutcome {
            env: self.env,
            analysis: self.analysis,
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.errors.push(SemanticError::new(message, span));
    }

    fn error_help(&mut self, span: Span, message: impl Into<String>, help: impl Into<String>) {
        self.errors
            .push(SemanticError::new(message, span).with_help(help));
    }

    // --- declarations ---

    fn signature_of(&mut self, decl: &FnDecl) -> FuncType {
        let mut params = Vec::new();
        for param in &decl.params {
            let ty = self.resolve_type_ref(&param.ty);
            if ty.is_void() {
                self.error(
                    param.ty.span,
                    format!(
                        "cannot use 'void' as the type of parameter '{}'",
                        param.name.node
                    ),
                );
                params.push(Type::INVALID);
            } else {
                params.push(ty);
            }
        }
        let ret = match &decl.ret {
            Some(tr) => self.resolve_type_ref(tr),
            None => Type::VOID,
        };
        FuncType {
            params,
            ret: Box::new(ret),
            spread: None,
        }
    }

    fn declare_fn(&mut self, decl: &FnDecl) -> FuncType {
        let sig = self.signature_of(decl);

        let is_main = decl.name.node == "main";
        if is_main && !sig.ret.is_void() {
            self.error(decl.name.span, "main function must return void");
        }

        let info = SymbolInfo {
            name: decl.name.node.clone(),
            used: is_main,
            ty: Type::Func(sig.clone()),
            kind: SymbolKind::Function,
            span: Some(decl.name.span),
        };
        if self.env.insert_symbol(info).is_err() {
            self.error(
                decl.name.span,
                format!("'{}' has already been declared in this scope", decl.name.node),
            );
        }
        sig
    }

    fn visit_fn(&mut self, decl: &FnDecl, hoisted: bool) {
        let sig = if hoisted {
            match self
                .env
                .lookup_symbol_local(&decl.name.node)
                .map(|id| self.env.symbol(id).ty.clone())
            {
                Some(Type::Func(sig)) => sig,
                _ => self.signature_of(decl),
            }
        } else {
            self.declare_fn(decl)
        };

        self.env.open_scope();
        for (param, ty) in decl.params.iter().zip(sig.params.iter()) {
            let info = SymbolInfo {
                name: param.name.node.clone(),
                used: false,
                ty: ty.clone(),
                kind: SymbolKind::Variable,
                span: Some(param.name.span),
            };
            if self.env.insert_symbol(info).is_err() {
                self.error(
                    param.name.span,
                    format!("duplicate parameter name '{}'", param.name.node),
                );
            }
        }

        let ret = (*sig.ret).clone();
        self.fn_stack.push(FnCtx {
            name: decl.name.node.clone(),
            ret: ret.clone(),
        });
        // A loop surrounding the declaration does not admit break/continue
        // inside the nested body.
        let saved_loop = std::mem::replace(&mut self.loop_depth, 0);
        let yielded = self.infer_block_value(&decl.body);
        self.loop_depth = saved_loop;
        self.fn_stack.pop();
        self.env.close_scope();

        // A non-void function may produce its result as the body's trailing
        // expression instead of an explicit return.
        if !ret.is_void()
            && !ret.is_invalid()
            && !yielded.is_void()
            && !yielded.is_invalid()
            && !is_left_compatible(&ret, &yielded)
        {
            self.error(
                decl.body.span,
                format!(
                    "function '{}' returns '{}', but its body yields '{}'",
                    decl.name.node, ret, yielded
                ),
            );
        }
    }

    // --- statements ---

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(decl) => self.visit_let(decl),
            Stmt::Const(decl) => self.visit_const(decl),
            Stmt::Fn(decl) => self.visit_fn(decl, false),
            Stmt::Return(ret) => self.visit_return(ret),
            Stmt::For(stmt) => self.visit_for(stmt),
            Stmt::Break { span } => {
                if self.loop_depth == 0 {
                    self.error(*span, "break statement outside of a loop");
                }
            }
            Stmt::Continue { span } => {
                if self.loop_depth == 0 {
                    self.error(*span, "continue statement outside of a loop");
                }
            }
            Stmt::Block(block) => {
                let _ = self.infer_block_value(block);
            }
            Stmt::Expr(expr) => {
                let _ = self.infer_expr(expr);
            }
        }
    }

    fn visit_let(&mut self, decl: &LetStmt) {
        let declared = match (&decl.ty, &decl.init) {
            (None, None) => {
                self.error(
                    decl.span,
                    format!(
                        "variable '{}' needs a type annotation or an initializer",
                        decl.name.node
                    ),
                );
                Type::INVALID
            }
            (Some(tr), None) => self.resolve_type_ref(tr),
            (None, Some(init)) => {
                let ty = self.infer_expr(init);
                if ty.is_void() {
                    self.error(
                        init.span,
                        format!("initializer of '{}' has no value", decl.name.node),
                    );
                    Type::INVALID
                } else {
                    ty.generalized()
                }
            }
            (Some(tr), Some(init)) => {
                let annotated = self.resolve_type_ref(tr);
                let vt = self.infer_expr(init);
                if !annotated.is_invalid()
                    && !vt.is_invalid()
                    && !is_left_compatible(&annotated, &vt)
                {
                    self.error(
                        decl.span,
                        format!(
                            "variable '{}' has type '{}', but its initializer has type '{}'",
                            decl.name.node, annotated, vt
                        ),
                    );
                }
                annotated
            }
        };

        let info = SymbolInfo {
            name: decl.name.node.clone(),
            used: false,
            ty: declared,
            kind: SymbolKind::Variable,
            span: Some(decl.name.span),
        };
        if self.env.insert_symbol(info).is_err() {
            self.error(
                decl.name.span,
                format!(
                    "'{}' has already been declared in this scope",
                    decl.name.node
                ),
            );
        }
    }

    fn visit_const(&mut self, decl: &ConstStmt) {
        let vt = self.infer_expr(&decl.init);
        let value_ok = matches!(
            vt.as_prim(),
            Some(p) if p != PrimType::Void && p != PrimType::Invalid
        );
        if !vt.is_invalid() && !value_ok {
            self.error(
                decl.init.span,
                format!(
                    "initializer of constant '{}' must have a primitive type, found '{}'",
                    decl.name.node, vt
                ),
            );
        }

        let declared = match &decl.ty {
            Some(tr) => {
                let annotated = self.resolve_type_ref(tr);
                if !annotated.is_invalid() && value_ok && !is_left_compatible(&annotated, &vt) {
                    self.error(
                        decl.span,
                        format!(
                            "constant '{}' has type '{}', but its initializer has type '{}'",
                            decl.name.node, annotated, vt
                        ),
                    );
                }
                annotated
            }
            None => vt,
        };

        let info = SymbolInfo {
            name: decl.name.node.clone(),
            used: false,
            ty: declared,
            kind: SymbolKind::Constant,
            span: Some(decl.name.span),
        };
        if self.env.insert_symbol(info).is_err() {
            self.error(
                decl.name.span,
                format!(
                    "'{}' has already been declared in this scope",
                    decl.name.node
                ),
            );
        }
    }

    fn visit_return(&mut self, stmt: &ReturnStmt) {
        let ctx = self.fn_stack.last().cloned();
        let ty = match &stmt.expr {
            Some(expr) => self.infer_expr(expr),
            None => Type::VOID,
        };

        let Some(ctx) = ctx else {
            self.error(stmt.span, "return statement outside of a function body");
            return;
        };

        if !ctx.ret.is_invalid() && !ty.is_invalid() && !is_left_compatible(&ctx.ret, &ty) {
            self.error(
                stmt.span,
                format!(
                    "function '{}' returns '{}', but the return expression has type '{}'",
                    ctx.name, ctx.ret, ty
                ),
            );
        }
    }

    fn visit_for(&mut self, stmt: &ForStmt) {
        let start_t = self.infer_expr(&stmt.range.start);
        let end_t = self.infer_expr(&stmt.range.end);
        for (ty, expr) in [(&start_t, &stmt.range.start), (&end_t, &stmt.range.end)] {
            if !ty.is_invalid() && !ty.is_integer() {
                self.error(
                    expr.span,
                    format!("for range bounds must be integers, found '{ty}'"),
                );
            }
        }

        self.env.open_scope();
        let info = SymbolInfo {
            name: stmt.var.node.clone(),
            used: false,
            ty: Type::Prim(PrimType::I32),
            kind: SymbolKind::Variable,
            span: Some(stmt.var.span),
        };
        let _ = self.env.insert_symbol(info);

        self.loop_depth += 1;
        let _ = self.infer_block_value(&stmt.body);
        self.loop_depth -= 1;
        self.env.close_scope();
    }

    /// Visits a block in a fresh scope and returns the type of its trailing
    /// expression statement, or void when there is none.
    fn infer_block_value(&mut self, block: &Block) -> Type {
        self.env.open_scope();
        let mut yielded = Type::VOID;
        let last = block.stmts.len().saturating_sub(1);
        for (idx, stmt) in block.stmts.iter().enumerate() {
            match stmt {
                Stmt::Expr(expr) if idx == last => {
                    yielded = self.infer_expr(expr);
                }
                other => self.visit_stmt(other),
            }
        }
        self.env.close_scope();
        yielded
    }

    // --- expressions ---

    fn infer_expr(&mut self, expr: &Expr) -> Type {
        let ty = self.infer_expr_kind(expr);
        self.analysis.record_type(expr.id, ty.clone());
        ty
    }

    fn infer_expr_kind(&mut self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::Int(lit) => match int_literal_type(lit) {
                Ok(ty) => Type::Prim(ty),
                Err(message) => {
                    self.error(expr.span, message);
                    Type::INVALID
                }
            },
            ExprKind::Float(lit) => match float_literal_type(lit) {
                Ok(ty) => Type::Prim(ty),
                Err(message) => {
                    self.error(expr.span, message);
                    Type::INVALID
                }
            },
            ExprKind::Bool(_) => Type::BOOL,
            ExprKind::Str(_) => Type::Prim(PrimType::Str),
            ExprKind::Ident(name) => match self.env.lookup_symbol(name) {
                None => {
                    self.error(expr.span, format!("identifier '{name}' not found"));
                    Type::INVALID
                }
                Some(id) => {
                    self.env.symbol_mut(id).used = true;
                    self.analysis.record_symbol(expr.id, id);
                    self.env.symbol(id).ty.clone()
                }
            },
            ExprKind::Unary { op, expr: operand } => {
                let ty = self.infer_expr(operand);
                if ty.is_invalid() {
                    return Type::INVALID;
                }
                match op {
                    UnaryOp::Not => {
                        if ty != Type::BOOL {
                            self.error_help(
                                expr.span,
                                "operator '!' requires a boolean operand",
                                format!("got '{ty}'"),
                            );
                            return Type::INVALID;
                        }
                        Type::BOOL
                    }
                    UnaryOp::Neg => {
                        if !ty.is_numeric() {
                            self.error_help(
                                expr.span,
                                "operator '-' requires a numeric operand",
                                format!("got '{ty}'"),
                            );
                            return Type::INVALID;
                        }
                        if ty.as_prim().map(PrimType::is_unsigned).unwrap_or(false) {
                            self.error(
                                expr.span,
                                format!("cannot negate a value of unsigned type '{ty}'"),
                            );
                            return Type::INVALID;
                        }
                        ty
                    }
                    UnaryOp::Pos => {
                        if !ty.is_numeric() {
                            self.error_help(
                                expr.span,
                                "operator '+' requires a numeric operand",
                                format!("got '{ty}'"),
                            );
                            return Type::INVALID;
                        }
                        ty
                    }
                }
            }
            ExprKind::Binary { op, left, right } => {
                let lt = self.infer_expr(left);
                let rt = self.infer_expr(right);
                if lt.is_invalid() || rt.is_invalid() {
                    return Type::INVALID;
                }

                if op.is_comparison() || op.is_logical() {
                    if !is_compatible(&lt, &rt) {
                        self.error_help(
                            expr.span,
                            format!("operator '{}' requires compatible operands", op.symbol()),
                            format!("got '{lt}' and '{rt}'"),
                        );
                        return Type::INVALID;
                    }
                    return Type::BOOL;
                }

                match binary_result(*op, &lt, &rt) {
                    Ok(ty) => ty,
                    Err(message) => {
                        self.error_help(expr.span, message, format!("got '{lt}' and '{rt}'"));
                        Type::INVALID
                    }
                }
            }
            ExprKind::Assign { op, target, value } => self.infer_assign(expr, *op, target, value),
            ExprKind::If(if_expr) => self.infer_if(if_expr),
            ExprKind::Call { callee, args } => self.infer_call(expr, callee, args),
            ExprKind::Index { base, index } => {
                let bt = self.infer_expr(base);
                let it = self.infer_expr(index);
                match bt {
                    Type::Array { elem, .. } => {
                        if !it.is_invalid() && !it.is_integer() {
                            self.error(
                                index.span,
                                format!("array index must be an integer, found '{it}'"),
                            );
                        }
                        *elem
                    }
                    ty if ty.is_invalid() => Type::INVALID,
                    ty => {
                        self.error(base.span, format!("cannot index a value of type '{ty}'"));
                        Type::INVALID
                    }
                }
            }
            ExprKind::Array(elems) => self.infer_array(expr, elems),
            ExprKind::Range(range) => {
                let _ = self.infer_expr(&range.start);
                let _ = self.infer_expr(&range.end);
                self.error(
                    expr.span,
                    "range expression is only valid as a for-loop bound",
                );
                Type::INVALID
            }
        }
    }

    fn infer_assign(&mut self, expr: &Expr, op: brook_ast::AssignOp, target: &Expr, value: &Expr) -> Type {
        if !matches!(target.kind, ExprKind::Ident(_) | ExprKind::Index { .. }) {
            self.error(
                target.span,
                "left side of assignment must be an identifier or index expression",
            );
            let _ = self.infer_expr(value);
            return Type::INVALID;
        }

        let tt = self.infer_expr(target);
        if let ExprKind::Ident(name) = &target.kind {
            if let Some(id) = self.analysis.symbol_of(target.id) {
                let kind = self.env.symbol(id).kind;
                if kind != SymbolKind::Variable {
                    self.error(
                        target.span,
                        format!("cannot assign to {} '{}'", kind.describe(), name),
                    );
                }
            }
        }

        let vt = self.infer_expr(value);
        if tt.is_invalid() || vt.is_invalid() {
            return tt;
        }

        match op.binary() {
            None => {
                if !is_left_compatible(&tt, &vt) {
                    self.error(
                        expr.span,
                        format!("cannot assign a value of type '{vt}' to a target of type '{tt}'"),
                    );
                }
            }
            Some(bop) => match binary_result(bop, &tt, &vt) {
                Ok(result) => {
                    if !is_left_compatible(&tt, &result) {
                        self.error(
                            expr.span,
                            format!(
                                "result of '{}' has type '{}', which is incompatible with target type '{}'",
                                op.symbol(),
                                result,
                                tt
                            ),
                        );
                    }
                }
                Err(message) => {
                    self.error_help(expr.span, message, format!("got '{tt}' and '{vt}'"));
                }
            },
        }
        tt
    }

    fn infer_if(&mut self, if_expr: &IfExpr) -> Type {
        let ct = self.infer_expr(&if_expr.cond);
        if !ct.is_invalid() && ct != Type::BOOL {
            self.error(
                if_expr.cond.span,
                format!("invalid condition type: expected 'bool', but got '{ct}'"),
            );
        }

        let then_t = self.infer_block_value(&if_expr.then_block);
        let Some(else_branch) = &if_expr.else_branch else {
            return Type::VOID;
        };

        let else_t = match else_branch.as_ref() {
            ElseBranch::Block(block) => self.infer_block_value(block),
            ElseBranch::If(chained) => self.infer_expr(chained),
        };

        // Branch merge: a value is produced only when both branches yield
        // compatible values; everything else is void.
        if then_t.is_invalid() || else_t.is_invalid() {
            return Type::INVALID;
        }
        if then_t.is_void() || else_t.is_void() {
            return Type::VOID;
        }
        if !is_compatible(&then_t, &else_t) {
            return Type::VOID;
        }
        match (then_t.as_prim(), else_t.as_prim()) {
            (Some(a), Some(b)) => Type::Prim(PrimType::max(a, b)),
            _ => then_t,
        }
    }

    fn infer_call(&mut self, expr: &Expr, callee: &brook_ast::Ident, args: &[Expr]) -> Type {
        let Some(sym_id) = self.env.lookup_symbol(&callee.node) else {
            self.error(callee.span, format!("function '{}' not found", callee.node));
            for arg in args {
                let _ = self.infer_expr(arg);
            }
            return Type::INVALID;
        };

        self.env.symbol_mut(sym_id).used = true;
        self.analysis.record_symbol(expr.id, sym_id);
        let info = self.env.symbol(sym_id);
        let kind = info.kind;
        let ty = info.ty.clone();

        if kind != SymbolKind::Function {
            self.error(
                callee.span,
                format!("'{}' is not a function", callee.node),
            );
            for arg in args {
                let _ = self.infer_expr(arg);
            }
            return Type::INVALID;
        }

        let Type::Func(sig) = ty else {
            for arg in args {
                let _ = self.infer_expr(arg);
            }
            return Type::INVALID;
        };

        if sig.spread.is_some() {
            self.warnings.push(SemanticWarning::new(
                format!(
                    "arguments to '{}' are not type-checked (spread parameter)",
                    callee.node
                ),
                expr.span,
            ));
            for arg in args {
                let _ = self.infer_expr(arg);
            }
            return (*sig.ret).clone();
        }

        if args.len() != sig.params.len() {
            self.error(
                expr.span,
                format!(
                    "function '{}' expects {} argument(s), but {} were given",
                    callee.node,
                    sig.params.len(),
                    args.len()
                ),
            );
        }

        for (idx, arg) in args.iter().enumerate() {
            let at = self.infer_expr(arg);
            if let Some(pt) = sig.params.get(idx) {
                if !at.is_invalid() && !pt.is_invalid() && !is_left_compatible(pt, &at) {
                    self.error(
                        arg.span,
                        format!(
                            "argument {} of '{}' expects '{}', found '{}'",
                            idx + 1,
                            callee.node,
                            pt,
                            at
                        ),
                    );
                }
            }
        }

        (*sig.ret).clone()
    }

    fn infer_array(&mut self, expr: &Expr, elems: &[Expr]) -> Type {
        if elems.is_empty() {
            self.error(
                expr.span,
                "cannot infer the element type of an empty array literal",
            );
            return Type::INVALID;
        }

        let mut elem_t = self.infer_expr(&elems[0]);
        let mut reported = false;
        for elem in &elems[1..] {
            let ty = self.infer_expr(elem);
            if elem_t.is_invalid() || ty.is_invalid() {
                elem_t = Type::INVALID;
                continue;
            }
            if !is_compatible(&elem_t, &ty) {
                if !reported {
                    self.error_help(
                        expr.span,
                        "array elements have incompatible types",
                        format!("got '{elem_t}' and '{ty}'"),
                    );
                    reported = true;
                }
                elem_t = Type::INVALID;
                continue;
            }
            if let (Some(a), Some(b)) = (elem_t.as_prim(), ty.as_prim()) {
                elem_t = Type::Prim(PrimType::max(a, b));
            }
        }

        if elem_t.is_invalid() {
            return Type::INVALID;
        }
        Type::Array {
            elem: Box::new(elem_t),
            len: elems.len(),
        }
    }

    fn resolve_type_ref(&mut self, tr: &TypeRef) -> Type {
        match &tr.kind {
            TypeRefKind::Name(name) => match self.env.lookup_type(name) {
                Some(id) => {
                    self.env.type_info_mut(id).used = true;
                    self.env.type_info(id).ty.clone()
                }
                None => {
                    self.error(tr.span, format!("unknown type '{name}'"));
                    Type::INVALID
                }
            },
            TypeRefKind::Array { elem, len } => {
                let elem_t = self.resolve_type_ref(elem);
                Type::Array {
                    elem: Box::new(elem_t),
                    len: len.map(|n| n as usize).unwrap_or(0),
                }
            }
        }
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

/// Result type of arithmetic/bitwise binary operators: float contaminates to
/// f64, otherwise the wider type within one signedness family; mixed-sign
/// integer operands are rejected.
fn binary_result(op: BinOp, lt: &Type, rt: &Type) -> Result<Type, String> {
    if !lt.is_numeric() || !rt.is_numeric() {
        return Err(format!("operator '{}' requires numeric operands", op.symbol()));
    }
    let lp = lt.as_prim().unwrap_or(PrimType::Invalid);
    let rp = rt.as_prim().unwrap_or(PrimType::Invalid);

    if lp.is_float() || rp.is_float() {
        return Ok(Type::Prim(PrimType::F64));
    }
    if lp.is_signed() && rp.is_signed() {
        return Ok(Type::Prim(PrimType::max(lp, rp)));
    }
    if lp.is_unsigned() && rp.is_unsigned() {
        return Ok(Type::Prim(PrimType::max(lp, rp)));
    }
    Err(format!(
        "operator '{}' cannot mix signed and unsigned operands",
        op.symbol()
    ))
}

fn int_bounds(ty: PrimType) -> Option<(i128, i128)> {
    Some(match ty {
        PrimType::I8 => (i8::MIN as i128, i8::MAX as i128),
        PrimType::I16 => (i16::MIN as i128, i16::MAX as i128),
        PrimType::I32 => (i32::MIN as i128, i32::MAX as i128),
        PrimType::I64 => (i64::MIN as i128, i64::MAX as i128),
        PrimType::U8 => (0, u8::MAX as i128),
        PrimType::U16 => (0, u16::MAX as i128),
        PrimType::U32 => (0, u32::MAX as i128),
        PrimType::U64 => (0, u64::MAX as i128),
        _ => return None,
    })
}

fn int_literal_type(lit: &IntLit) -> Result<PrimType, String> {
    let value = i128::from_str_radix(&lit.text, lit.base)
        .map_err(|_| format!("value '{}' is out of integer range", lit.text))?;

    if let Some(suffix) = lit.suffix {
        let ty = PrimType::from_suffix(suffix);
        if ty.is_float() {
            return Ok(ty);
        }
        let (lo, hi) = int_bounds(ty).expect("integer suffix");
        if value < lo || value > hi {
            return Err(format!(
                "value '{}' is out of range for type '{}'",
                lit.text, ty
            ));
        }
        return Ok(ty);
    }

    // Without a suffix, pick the smallest signed type that holds the value.
    for ty in [PrimType::I8, PrimType::I16, PrimType::I32, PrimType::I64] {
        let (lo, hi) = int_bounds(ty).expect("signed bounds");
        if value >= lo && value <= hi {
            return Ok(ty);
        }
    }
    Err(format!("value '{}' is out of integer range", lit.text))
}

fn float_literal_type(lit: &FloatLit) -> Result<PrimType, String> {
    lit.text
        .parse::<f64>()
        .map_err(|_| format!("invalid float literal '{}'", lit.text))?;
    match lit.suffix {
        Some(suffix) => Ok(PrimType::from_suffix(suffix)),
        None => Ok(PrimType::F64),
    }
}
