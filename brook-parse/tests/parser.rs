use brook_ast::{AssignOp, BinOp, ElseBranch, ExprKind, Stmt};
use brook_parse::{parse_source, parse_source_with_recovery};

#[test]
fn precedence_additive_vs_multiplicative() {
    let program = parse_source("let a = 1 + 2 * 3\n").expect("parse");
    let Stmt::Let(decl) = &program.stmts[0] else {
        panic!("expected let");
    };
    let init = decl.init.as_ref().expect("initializer");
    let ExprKind::Binary { op, right, .. } = &init.kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinOp::Add);
    let ExprKind::Binary { op: inner, .. } = &right.kind else {
        panic!("expected nested binary");
    };
    assert_eq!(*inner, BinOp::Mul);
}

#[test]
fn exponent_is_right_associative() {
    let program = parse_source("let a = 2 ** 3 ** 2\n").expect("parse");
    let Stmt::Let(decl) = &program.stmts[0] else {
        panic!("expected let");
    };
    let ExprKind::Binary { op, left, right } = &decl.init.as_ref().unwrap().kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinOp::Pow);
    assert!(matches!(left.kind, ExprKind::Int(_)));
    assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Pow, .. }));
}

#[test]
fn assignment_is_right_associative() {
    let program = parse_source("a = b = 1\n").expect("parse");
    let Stmt::Expr(expr) = &program.stmts[0] else {
        panic!("expected expression statement");
    };
    let ExprKind::Assign { op, value, .. } = &expr.kind else {
        panic!("expected assignment");
    };
    assert_eq!(*op, AssignOp::Set);
    assert!(matches!(value.kind, ExprKind::Assign { .. }));
}

#[test]
fn parses_function_declaration() {
    let src = "fn sum(a: i32, b: i32) -> i32 { return a + b }\n";
    let program = parse_source(src).expect("parse");
    let Stmt::Fn(decl) = &program.stmts[0] else {
        panic!("expected fn");
    };
    assert_eq!(decl.name.node, "sum");
    assert_eq!(decl.params.len(), 2);
    assert!(decl.ret.is_some());
    assert_eq!(decl.body.stmts.len(), 1);
}

#[test]
fn parses_for_range_inclusive() {
    let src = "for i in 1..=10 { s += i }\n";
    let program = parse_source(src).expect("parse");
    let Stmt::For(stmt) = &program.stmts[0] else {
        panic!("expected for");
    };
    assert!(stmt.range.inclusive);
    assert_eq!(stmt.var.node, "i");
}

#[test]
fn parses_else_if_chain() {
    let src = "let x = if a { 1 } else if b { 2 } else { 3 }\n";
    let program = parse_source(src).expect("parse");
    let Stmt::Let(decl) = &program.stmts[0] else {
        panic!("expected let");
    };
    let ExprKind::If(if_expr) = &decl.init.as_ref().unwrap().kind else {
        panic!("expected if expression");
    };
    let Some(else_branch) = &if_expr.else_branch else {
        panic!("expected else branch");
    };
    let ElseBranch::If(chained) = else_branch.as_ref() else {
        panic!("expected chained if");
    };
    let ExprKind::If(inner) = &chained.kind else {
        panic!("expected inner if");
    };
    assert!(matches!(
        inner.else_branch.as_deref(),
        Some(ElseBranch::Block(_))
    ));
}

#[test]
fn parses_array_literal_and_index() {
    let src = "let xs = [1, 2, 3]; let y = xs[0]\n";
    let program = parse_source(src).expect("parse");
    assert_eq!(program.stmts.len(), 2);
    let Stmt::Let(first) = &program.stmts[0] else {
        panic!("expected let");
    };
    assert!(matches!(first.init.as_ref().unwrap().kind, ExprKind::Array(_)));
    let Stmt::Let(second) = &program.stmts[1] else {
        panic!("expected let");
    };
    assert!(matches!(
        second.init.as_ref().unwrap().kind,
        ExprKind::Index { .. }
    ));
}

#[test]
fn parses_array_type_annotations() {
    let src = "let xs: i32[3] = [1, 2, 3]\nlet open: i32[] = xs\n";
    parse_source(src).expect("parse");
}

#[test]
fn semicolons_and_newlines_both_terminate() {
    let src = "let a = 1; let b = 2\nlet c = 3\n";
    let program = parse_source(src).expect("parse");
    assert_eq!(program.stmts.len(), 3);
}

#[test]
fn recovery_collects_multiple_errors() {
    let src = "let = 1\nlet b = 2\nfn (x) {}\nlet c = 3\n";
    let (program, errors) = parse_source_with_recovery(src).expect("lex");
    assert_eq!(errors.len(), 2);
    assert_eq!(program.stmts.len(), 2);
}

#[test]
fn stray_token_is_a_parse_error() {
    assert!(parse_source("let a = \n").is_err());
    assert!(parse_source("fn f( { }\n").is_err());
}

#[test]
fn call_with_nested_calls() {
    let src = "println(sum(sum(1, 2), sum(3, 4)))\n";
    let program = parse_source(src).expect("parse");
    let Stmt::Expr(expr) = &program.stmts[0] else {
        panic!("expected expression statement");
    };
    let ExprKind::Call { callee, args } = &expr.kind else {
        panic!("expected call");
    };
    assert_eq!(callee.node, "println");
    assert_eq!(args.len(), 1);
}
