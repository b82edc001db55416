#![forbid(unsafe_code)]

use brook_ast::{BinOp, Block, ElseBranch, Expr, ExprKind, IntLit, Program, Stmt};

/// Integer constant folding: binary expressions over two integer literals
/// collapse to a single literal for `+ - * / % **`. Runs after type checking
/// and before code generation; the folded literal keeps the node id (and so
/// the recorded type) of the expression it replaces. Division by zero is left
/// unfolded so the VM raises it at runtime.
pub fn fold_program(mut program: Program) -> Program {
    for stmt in &mut program.stmts {
        fold_stmt(stmt);
    }
    program
}

fn fold_block(block: &mut Block) {
    for stmt in &mut block.stmts {
        fold_stmt(stmt);
    }
}

fn fold_stmt(stmt: &mut Stmt) {
    match stmt {
        Stmt::Let(decl) => {
            if let Some(init) = &mut decl.init {
                fold_expr(init);
            }
        }
        Stmt::Const(decl) => fold_expr(&mut decl.init),
        Stmt::Fn(decl) => fold_block(&mut decl.body),
        Stmt::Return(ret) => {
            if let Some(expr) = &mut ret.expr {
                fold_expr(expr);
            }
        }
        Stmt::For(stmt) => {
            fold_expr(&mut stmt.range.start);
            fold_expr(&mut stmt.range.end);
            fold_block(&mut stmt.body);
        }
        Stmt::Break { .. } | Stmt::Continue { .. } => {}
        Stmt::Block(block) => fold_block(block),
        Stmt::Expr(expr) => fold_expr(expr),
    }
}

fn fold_expr(expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Binary { op, left, right } => {
            fold_expr(left);
            fold_expr(right);
            if let Some(folded) = fold_int_binary(*op, left, right) {
                expr.kind = ExprKind::Int(folded);
            }
        }
        ExprKind::Unary { expr: operand, .. } => fold_expr(operand),
        ExprKind::Assign { target, value, .. } => {
            fold_expr(target);
            fold_expr(value);
        }
        ExprKind::If(if_expr) => {
            fold_expr(&mut if_expr.cond);
            fold_block(&mut if_expr.then_block);
            if let Some(else_branch) = &mut if_expr.else_branch {
                match else_branch.as_mut() {
                    ElseBranch::Block(block) => fold_block(block),
                    ElseBranch::If(chained) => fold_expr(chained),
                }
            }
        }
        ExprKind::Call { args, .. } => {
            for arg in args {
                fold_expr(arg);
            }
        }
        ExprKind::Index { base, index } => {
            fold_expr(base);
            fold_expr(index);
        }
        ExprKind::Array(elems) => {
            for elem in elems {
                fold_expr(elem);
            }
        }
        ExprKind::Range(range) => {
            fold_expr(&mut range.start);
            fold_expr(&mut range.end);
        }
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Bool(_)
        | ExprKind::Str(_)
        | ExprKind::Ident(_) => {}
    }
}

fn fold_int_binary(op: BinOp, left: &Expr, right: &Expr) -> Option<IntLit> {
    let (ExprKind::Int(l), ExprKind::Int(r)) = (&left.kind, &right.kind) else {
        return None;
    };
    let lv = i64::from_str_radix(&l.text, l.base).ok()?;
    let rv = i64::from_str_radix(&r.text, r.base).ok()?;

    let value = match op {
        BinOp::Add => lv.wrapping_add(rv),
        BinOp::Sub => lv.wrapping_sub(rv),
        BinOp::Mul => lv.wrapping_mul(rv),
        BinOp::Div => {
            if rv == 0 {
                return None;
            }
            lv.wrapping_div(rv)
        }
        BinOp::Rem => {
            if rv == 0 {
                return None;
            }
            lv.wrapping_rem(rv)
        }
        BinOp::Pow => (lv as f64).powf(rv as f64) as i64,
        _ => return None,
    };

    Some(IntLit {
        text: value.to_string(),
        base: 10,
        suffix: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use brook_ast::{NodeId, Span};

    fn int(text: &str) -> Expr {
        Expr {
            id: NodeId(0),
            span: Span::new(0.into(), 0),
            kind: ExprKind::Int(IntLit {
                text: text.to_string(),
                base: 10,
                suffix: None,
            }),
        }
    }

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr {
            id: NodeId(1),
            span: Span::new(0.into(), 0),
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        }
    }

    fn folded_text(mut expr: Expr) -> Option<String> {
        fold_expr(&mut expr);
        match expr.kind {
            ExprKind::Int(lit) => Some(lit.text),
            _ => None,
        }
    }

    #[test]
    fn folds_arithmetic() {
        assert_eq!(
            folded_text(binary(BinOp::Add, int("1"), int("2"))),
            Some("3".to_string())
        );
        assert_eq!(
            folded_text(binary(BinOp::Mul, int("6"), int("7"))),
            Some("42".to_string())
        );
        assert_eq!(
            folded_text(binary(BinOp::Sub, int("1"), int("2"))),
            Some("-1".to_string())
        );
    }

    #[test]
    fn folds_nested_exponent() {
        // 2 ** (3 ** 2) parsed right-associatively.
        let inner = binary(BinOp::Pow, int("3"), int("2"));
        let outer = binary(BinOp::Pow, int("2"), inner);
        assert_eq!(folded_text(outer), Some("512".to_string()));
    }

    #[test]
    fn division_by_zero_is_left_for_the_vm() {
        let expr = binary(BinOp::Div, int("1"), int("0"));
        assert_eq!(folded_text(expr), None);
        let expr = binary(BinOp::Rem, int("5"), int("0"));
        assert_eq!(folded_text(expr), None);
    }

    #[test]
    fn comparisons_are_not_folded() {
        let expr = binary(BinOp::Lt, int("1"), int("2"));
        assert_eq!(folded_text(expr), None);
    }

    #[test]
    fn folds_negative_results_transitively() {
        // (1 - 2) * 3
        let sub = binary(BinOp::Sub, int("1"), int("2"));
        let mul = binary(BinOp::Mul, sub, int("3"));
        assert_eq!(folded_text(mul), Some("-3".to_string()));
    }
}
