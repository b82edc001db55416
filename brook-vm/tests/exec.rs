use brook_core::{fold_program, Checker};
use brook_parse::parse_source;
use brook_vm::{Generator, RuntimeError, Vm};

fn compile(src: &str, fold: bool) -> brook_vm::Module {
    let program = parse_source(src).expect("parse");
    let outcome = Checker::new().check_program(&program);
    assert!(outcome.is_ok(), "check errors: {:?}", outcome.errors);
    let program = if fold { fold_program(program) } else { program };
    Generator::new(&outcome.analysis, &outcome.env)
        .generate(&program)
        .expect("codegen")
}

fn run(src: &str) -> String {
    let mut vm = Vm::new(compile(src, true));
    vm.capture_output();
    vm.run().expect("run");
    vm.captured().unwrap_or("").to_string()
}

fn run_unfolded(src: &str) -> String {
    let mut vm = Vm::new(compile(src, false));
    vm.capture_output();
    vm.run().expect("run");
    vm.captured().unwrap_or("").to_string()
}

fn run_err(src: &str) -> RuntimeError {
    let mut vm = Vm::new(compile(src, true));
    vm.capture_output();
    vm.run().expect_err("expected a runtime error")
}

#[test]
fn arithmetic_and_precedence() {
    assert_eq!(run("let a = 1 + 2 * 3\nprintln(a)\n"), "7\n");
}

#[test]
fn exponent_is_right_associative() {
    assert_eq!(run("let a = 2 ** 3 ** 2\nprintln(a)\n"), "512\n");
}

#[test]
fn if_expression_yields_a_value() {
    assert_eq!(
        run("let x = if true { 10 } else { 20 }\nprintln(x)\n"),
        "10\n"
    );
    assert_eq!(
        run("let x = if false { 10 } else { 20 }\nprintln(x)\n"),
        "20\n"
    );
}

#[test]
fn else_if_chains_select_the_right_branch() {
    let src = "let x = if false { 1 } else if false { 2 } else { 3 }\nprintln(x)\n";
    assert_eq!(run(src), "3\n");
    let src = "let x = if false { 1 } else if true { 2 } else { 3 }\nprintln(x)\n";
    assert_eq!(run(src), "2\n");
}

#[test]
fn inclusive_range_sum() {
    let src = "let s = 0\nfor i in 1..=10 { s = s + i }\nprintln(s)\n";
    assert_eq!(run(src), "55\n");
}

#[test]
fn exclusive_range_iteration_count() {
    let src = "let c = 0\nfor i in 0..3 { c += 1 }\nprintln(c)\n";
    assert_eq!(run(src), "3\n");
}

#[test]
fn empty_range_runs_zero_iterations() {
    let src = "let c = 0\nfor i in 3..1 { c += 1 }\nprintln(c)\n";
    assert_eq!(run(src), "0\n");
}

#[test]
fn mutual_function_recursion() {
    let src = "\
fn isEven(n: i32) -> bool { if n == 0 { true } else { isOdd(n - 1) } }
fn isOdd(n: i32) -> bool { if n == 0 { false } else { isEven(n - 1) } }
println(isEven(7))
";
    assert_eq!(run(src), "false\n");
}

#[test]
fn nested_calls_and_temporaries() {
    let src = "\
fn sum(a: i32, b: i32) -> i32 { return a + b }
println(sum(sum(1, 2), sum(3, 4)))
";
    assert_eq!(run(src), "10\n");
}

#[test]
fn named_local_arguments_are_staged_contiguously() {
    let src = "\
fn sum(a: i32, b: i32) -> i32 { return a + b }
let x = 4
let y = 6
println(sum(x, y))
";
    assert_eq!(run(src), "10\n");
}

#[test]
fn division_by_zero_is_fatal() {
    assert!(matches!(
        run_err("let a = 1\nprintln(a / 0)\n"),
        RuntimeError::DivisionByZero
    ));
    assert!(matches!(
        run_err("let a = 10\nprintln(a % 0)\n"),
        RuntimeError::DivisionByZero
    ));
}

#[test]
fn float_division_by_zero_follows_ieee() {
    assert_eq!(run("println(1.0 / 0.0)\n"), "inf\n");
}

#[test]
fn break_exits_the_loop() {
    let src = "\
let s = 0
for i in 1..=100 {
    if i > 3 { break }
    s = s + i
}
println(s)
";
    assert_eq!(run(src), "6\n");
}

#[test]
fn continue_skips_to_the_next_iteration() {
    let src = "\
let s = 0
for i in 1..=5 {
    if i % 2 == 0 { continue }
    s = s + i
}
println(s)
";
    assert_eq!(run(src), "9\n");
}

#[test]
fn compound_assignments() {
    let src = "\
let a = 10
a += 5
a -= 3
a *= 2
a /= 4
a %= 4
a **= 3
println(a)
";
    // ((10+5-3)*2/4)%4 = 2, then 2**3 = 8.
    assert_eq!(run(src), "8\n");
}

#[test]
fn bitwise_operators() {
    let src = "let a = 6\nprintln(a & 3, a | 3, a ^ 3, 1 << 4, 16 >> 2)\n";
    assert_eq!(run(src), "2 7 5 16 4\n");
}

#[test]
fn logical_operators_on_booleans() {
    assert_eq!(
        run("println(true && false, true || false, !true)\n"),
        "false true false\n"
    );
}

#[test]
fn comparisons_in_conditions() {
    let src = "if 1 < 2 && 2 <= 2 { println(\"yes\") } else { println(\"no\") }\n";
    assert_eq!(run(src), "yes\n");
}

#[test]
fn float_promotion_in_mixed_arithmetic() {
    assert_eq!(run("println(1.5 + 1)\n"), "2.5\n");
    assert_eq!(run("println(1.5 + 0.5)\n"), "2\n");
}

#[test]
fn unary_operators() {
    assert_eq!(run("let a = 5\nprintln(-a + 3, +a)\n"), "-2 5\n");
    assert_eq!(run("println(-1.5)\n"), "-1.5\n");
}

#[test]
fn string_escapes_decode_at_print_time() {
    assert_eq!(run("println(\"a\\tb\", \"c\")\n"), "a\tb c\n");
    assert_eq!(run("println(\"say \\\"hi\\\"\")\n"), "say \"hi\"\n");
}

#[test]
fn println_renders_value_tags() {
    let src = "fn f() { }\nprintln(f, println, true)\n";
    assert_eq!(run(src), "function build-in-function true\n");
}

#[test]
fn constants_live_in_the_pool() {
    let src = "const ANSWER = 40\nprintln(ANSWER + 2)\n";
    assert_eq!(run(src), "42\n");

    let module = compile(src, true);
    let entry = module.function(module.entry);
    assert!(entry
        .constants
        .iter()
        .any(|c| c.name.as_deref() == Some("ANSWER")));
}

#[test]
fn folded_const_initializers_are_literals() {
    let src = "const SIX = 2 * 3\nprintln(SIX)\n";
    assert_eq!(run(src), "6\n");
}

#[test]
fn nested_function_reads_enclosing_constants() {
    let src = "\
fn outer() -> i32 {
    const K = 5
    fn inner() -> i32 { return K + 1 }
    return inner()
}
println(outer())
";
    assert_eq!(run(src), "6\n");
}

#[test]
fn let_from_variable_copies_instead_of_aliasing() {
    let src = "let y = 1\nlet x = y\ny = 2\nprintln(x, y)\n";
    assert_eq!(run(src), "1 2\n");
}

#[test]
fn block_shadowing_restores_the_outer_binding() {
    let src = "let a = 1\n{ let a = 2\nprintln(a) }\nprintln(a)\n";
    assert_eq!(run(src), "2\n1\n");
}

#[test]
fn if_statement_without_value() {
    let src = "if true { println(1) }\nprintln(2)\n";
    assert_eq!(run(src), "1\n2\n");
}

#[test]
fn main_is_not_invoked_implicitly() {
    let src = "fn main() { println(99) }\nprintln(1)\n";
    assert_eq!(run(src), "1\n");
}

#[test]
fn void_function_calls_leave_undefined_in_the_callee_slot() {
    let src = "fn ping() { println(\"ping\") }\nping()\nprintln(\"done\")\n";
    assert_eq!(run(src), "ping\ndone\n");
}

#[test]
fn explicit_early_return() {
    let src = "\
fn clamp(n: i32) -> i32 {
    if n > 10 { return 10 }
    return n
}
println(clamp(42), clamp(7))
";
    assert_eq!(run(src), "10 7\n");
}

#[test]
fn deep_recursion_overflows_the_stack() {
    let src = "fn f(n: i32) -> i32 { return f(n + 1) }\nprintln(f(0))\n";
    assert!(matches!(run_err(src), RuntimeError::StackOverflow));
}

#[test]
fn folding_roundtrip_produces_identical_output() {
    for src in [
        "println(1 + 2 * 3)\n",
        "println(2 ** 3 ** 2)\n",
        "println(10 % 3, 10 / 3, 10 - 3)\n",
        "let a = 7 * 6\nprintln(a)\n",
        "fn f(n: i32) -> i32 { return n + 2 * 3 }\nprintln(f(4))\n",
    ] {
        assert_eq!(run(src), run_unfolded(src), "source: {src}");
    }
}

#[test]
fn loop_over_function_results() {
    let src = "\
fn double(n: i32) -> i32 { return n * 2 }
let s = 0
for i in 1..=3 { s = s + double(i) }
println(s)
";
    assert_eq!(run(src), "12\n");
}

#[test]
fn dump_lists_functions_constants_and_instructions() {
    let src = "fn sum(a: i32, b: i32) -> i32 { return a + b }\nprintln(sum(1, 2))\n";
    let module = compile(src, true);
    let dump = module.dump();
    assert!(dump.contains("function <module>"));
    assert!(dump.contains("function sum"));
    assert!(dump.contains("Call"));
    assert!(dump.contains("Return"));
    assert!(dump.contains("println"));
}
