use brook_vm::{BinaryOp, FunctionObject, Instr, Module, Reg, RuntimeError, Value, Vm};

fn module_with(instrs: Vec<Instr>) -> Module {
    let mut module = Module::new("<module>");
    let entry = module.entry;
    module
        .function_mut(entry)
        .add_constant("println", Value::Builtin("println".to_string()))
        .expect("builtin constant");
    for instr in instrs {
        module.function_mut(entry).emit(instr);
    }
    module
}

fn run(module: Module) -> Result<String, RuntimeError> {
    let mut vm = Vm::new(module);
    vm.capture_output();
    vm.run()?;
    Ok(vm.captured().unwrap_or("").to_string())
}

fn println_const() -> brook_vm::ConstIdx {
    brook_vm::ConstIdx(0)
}

#[test]
fn load_imm32_and_builtin_call() {
    let module = module_with(vec![
        Instr::LoadConst {
            dst: Reg(0),
            idx: println_const(),
        },
        Instr::LoadImm32 {
            dst: Reg(1),
            imm: 42,
        },
        Instr::Call {
            callee: Reg(0),
            argc: 1,
            retc: 0,
        },
    ]);
    assert_eq!(run(module).expect("run"), "42\n");
}

#[test]
fn halt_stops_execution() {
    let module = module_with(vec![
        Instr::Halt,
        Instr::LoadConst {
            dst: Reg(0),
            idx: println_const(),
        },
        Instr::Call {
            callee: Reg(0),
            argc: 0,
            retc: 0,
        },
    ]);
    assert_eq!(run(module).expect("run"), "");
}

#[test]
fn nop_has_no_effect() {
    let module = module_with(vec![
        Instr::Nop,
        Instr::LoadConst {
            dst: Reg(0),
            idx: println_const(),
        },
        Instr::LoadBool {
            dst: Reg(1),
            imm: true,
        },
        Instr::Call {
            callee: Reg(0),
            argc: 1,
            retc: 0,
        },
    ]);
    assert_eq!(run(module).expect("run"), "true\n");
}

#[test]
fn jump_skips_instructions() {
    let module = module_with(vec![
        Instr::Jump { target: 2 },
        Instr::Halt,
        Instr::LoadConst {
            dst: Reg(0),
            idx: println_const(),
        },
        Instr::LoadImm32 { dst: Reg(1), imm: 7 },
        Instr::Call {
            callee: Reg(0),
            argc: 1,
            retc: 0,
        },
    ]);
    assert_eq!(run(module).expect("run"), "7\n");
}

#[test]
fn jump_past_end_is_fatal() {
    let module = module_with(vec![Instr::Jump { target: 99 }]);
    assert!(matches!(
        run(module),
        Err(RuntimeError::JumpOutOfBounds { target: 99, .. })
    ));
}

#[test]
fn jump_if_matches_the_immediate() {
    // Branch taken when the register equals the immediate boolean.
    let module = module_with(vec![
        Instr::LoadBool {
            dst: Reg(1),
            imm: false,
        },
        Instr::JumpIf {
            cond: Reg(1),
            imm: false,
            target: 3,
        },
        Instr::Halt,
        Instr::LoadConst {
            dst: Reg(0),
            idx: println_const(),
        },
        Instr::LoadImm32 { dst: Reg(1), imm: 1 },
        Instr::Call {
            callee: Reg(0),
            argc: 1,
            retc: 0,
        },
    ]);
    assert_eq!(run(module).expect("run"), "1\n");
}

#[test]
fn calling_a_non_function_is_fatal() {
    let module = module_with(vec![
        Instr::LoadImm32 { dst: Reg(0), imm: 3 },
        Instr::Call {
            callee: Reg(0),
            argc: 0,
            retc: 0,
        },
    ]);
    assert!(matches!(
        run(module),
        Err(RuntimeError::InvalidCallee { .. })
    ));
}

#[test]
fn return_in_the_root_frame_is_malformed() {
    let module = module_with(vec![Instr::Return {
        from: Reg(0),
        count: 0,
    }]);
    assert!(matches!(run(module), Err(RuntimeError::MalformedReturn)));
}

#[test]
fn return_count_must_fit_the_frame() {
    let mut module = Module::new("<module>");
    let entry = module.entry;
    let callee = module.add_function(FunctionObject::new("f", Some(entry)));
    module.function_mut(callee).emit(Instr::Return {
        from: Reg(0),
        count: 0x1000,
    });
    let f_idx = module
        .function_mut(entry)
        .add_constant("f", Value::Func(callee))
        .expect("constant");
    module.function_mut(entry).emit(Instr::LoadConst {
        dst: Reg(0),
        idx: f_idx,
    });
    module.function_mut(entry).emit(Instr::Call {
        callee: Reg(0),
        argc: 0,
        retc: 1,
    });
    assert!(matches!(run(module), Err(RuntimeError::MalformedReturn)));
}

#[test]
fn returned_value_lands_in_the_callee_slot() {
    let mut module = Module::new("<module>");
    let entry = module.entry;
    module
        .function_mut(entry)
        .add_constant("println", Value::Builtin("println".to_string()))
        .expect("builtin constant");

    let callee = module.add_function(FunctionObject::new("five", Some(entry)));
    module.function_mut(callee).emit(Instr::LoadImm32 {
        dst: Reg(0),
        imm: 5,
    });
    module.function_mut(callee).emit(Instr::Return {
        from: Reg(0),
        count: 1,
    });

    let f_idx = module
        .function_mut(entry)
        .add_constant("five", Value::Func(callee))
        .expect("constant");
    for instr in [
        // r1 holds the callee; its slot receives the return value.
        Instr::LoadConst {
            dst: Reg(1),
            idx: f_idx,
        },
        Instr::Call {
            callee: Reg(1),
            argc: 0,
            retc: 1,
        },
        Instr::LoadConst {
            dst: Reg(0),
            idx: brook_vm::ConstIdx(0),
        },
        Instr::Move {
            dst: Reg(1),
            src: Reg(1),
        },
        Instr::Call {
            callee: Reg(0),
            argc: 1,
            retc: 0,
        },
    ] {
        module.function_mut(entry).emit(instr);
    }
    assert_eq!(run(module).expect("run"), "5\n");
}

#[test]
fn zero_count_return_clears_the_callee_slot() {
    let mut module = Module::new("<module>");
    let entry = module.entry;
    module
        .function_mut(entry)
        .add_constant("println", Value::Builtin("println".to_string()))
        .expect("builtin constant");

    let callee = module.add_function(FunctionObject::new("noop", Some(entry)));
    module.function_mut(callee).emit(Instr::Return {
        from: Reg(0),
        count: 0,
    });

    let f_idx = module
        .function_mut(entry)
        .add_constant("noop", Value::Func(callee))
        .expect("constant");
    for instr in [
        Instr::LoadConst {
            dst: Reg(1),
            idx: f_idx,
        },
        Instr::Call {
            callee: Reg(1),
            argc: 0,
            retc: 0,
        },
        Instr::LoadConst {
            dst: Reg(0),
            idx: brook_vm::ConstIdx(0),
        },
        Instr::Call {
            callee: Reg(0),
            argc: 1,
            retc: 0,
        },
    ] {
        module.function_mut(entry).emit(instr);
    }
    assert_eq!(run(module).expect("run"), "undefined\n");
}

#[test]
fn and_or_select_bitwise_or_logical_by_operand_kind() {
    let module = module_with(vec![
        Instr::LoadConst {
            dst: Reg(0),
            idx: println_const(),
        },
        Instr::LoadImm32 { dst: Reg(1), imm: 6 },
        Instr::LoadImm32 { dst: Reg(2), imm: 3 },
        Instr::Binary {
            op: BinaryOp::And,
            dst: Reg(1),
            a: Reg(1),
            b: Reg(2),
        },
        Instr::Call {
            callee: Reg(0),
            argc: 1,
            retc: 0,
        },
        Instr::LoadConst {
            dst: Reg(0),
            idx: println_const(),
        },
        Instr::LoadBool {
            dst: Reg(1),
            imm: true,
        },
        Instr::LoadBool {
            dst: Reg(2),
            imm: false,
        },
        Instr::Binary {
            op: BinaryOp::Or,
            dst: Reg(1),
            a: Reg(1),
            b: Reg(2),
        },
        Instr::Call {
            callee: Reg(0),
            argc: 1,
            retc: 0,
        },
    ]);
    assert_eq!(run(module).expect("run"), "2\ntrue\n");
}

#[test]
fn mixing_kinds_in_arithmetic_is_fatal() {
    let module = module_with(vec![
        Instr::LoadBool {
            dst: Reg(0),
            imm: true,
        },
        Instr::LoadImm32 { dst: Reg(1), imm: 1 },
        Instr::Binary {
            op: BinaryOp::Add,
            dst: Reg(0),
            a: Reg(0),
            b: Reg(1),
        },
    ]);
    assert!(matches!(
        run(module),
        Err(RuntimeError::InvalidOperands { .. })
    ));
}

#[test]
fn unknown_builtin_reference_is_fatal() {
    let mut module = Module::new("<module>");
    let entry = module.entry;
    let idx = module
        .function_mut(entry)
        .add_constant("mystery", Value::Builtin("mystery".to_string()))
        .expect("constant");
    module.function_mut(entry).emit(Instr::LoadConst {
        dst: Reg(0),
        idx,
    });
    module.function_mut(entry).emit(Instr::Call {
        callee: Reg(0),
        argc: 0,
        retc: 0,
    });
    assert!(matches!(run(module), Err(RuntimeError::UnknownBuiltin(_))));
}

#[test]
fn string_and_bool_equality() {
    let module = module_with(vec![
        Instr::LoadConst {
            dst: Reg(0),
            idx: println_const(),
        },
        Instr::LoadString {
            dst: Reg(1),
            imm: "\"a\"".to_string(),
        },
        Instr::LoadString {
            dst: Reg(2),
            imm: "\"a\"".to_string(),
        },
        Instr::Binary {
            op: BinaryOp::Eq,
            dst: Reg(1),
            a: Reg(1),
            b: Reg(2),
        },
        Instr::Call {
            callee: Reg(0),
            argc: 1,
            retc: 0,
        },
    ]);
    assert_eq!(run(module).expect("run"), "true\n");
}

#[test]
fn ordered_comparison_on_strings_is_fatal() {
    let module = module_with(vec![
        Instr::LoadString {
            dst: Reg(0),
            imm: "\"a\"".to_string(),
        },
        Instr::LoadString {
            dst: Reg(1),
            imm: "\"b\"".to_string(),
        },
        Instr::Binary {
            op: BinaryOp::Lt,
            dst: Reg(0),
            a: Reg(0),
            b: Reg(1),
        },
    ]);
    assert!(matches!(
        run(module),
        Err(RuntimeError::InvalidOperands { .. })
    ));
}
