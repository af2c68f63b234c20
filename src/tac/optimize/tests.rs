use super::*;
use crate::ast::{Decl, Expr, FnDecl, Program, Stmt};
use crate::error::ArithmeticError;
use crate::tac::builder::build_program;
use crate::tac::interp::run;
use crate::tac::{listing, BinOp, LabelRole, Polarity, PRINT_INT};

fn assign(target: &str, value: &str) -> TACInstr {
    TACOp::LocalAssign {
        target: target.into(),
        value: value.into(),
    }
    .into()
}

fn bin(dest: &str, lhs: &str, op: BinOp, rhs: &str) -> TACInstr {
    TACOp::BinaryOp {
        dest: dest.into(),
        lhs: lhs.into(),
        op,
        rhs: rhs.into(),
    }
    .into()
}

fn label(name: &str, role: LabelRole) -> TACInstr {
    TACOp::Label {
        name: name.into(),
        role,
    }
    .into()
}

fn jump(target: &str, back_edge: bool) -> TACInstr {
    TACOp::Jump {
        target: target.into(),
        back_edge,
    }
    .into()
}

fn branch(cond: &str, target: &str) -> TACInstr {
    TACOp::CondBranch {
        cond: cond.into(),
        target: target.into(),
        polarity: Polarity::IfTrue,
    }
    .into()
}

fn print(value: &str) -> TACInstr {
    TACOp::PrintOut(value.into()).into()
}

fn body(stream: &[TACInstr]) -> String {
    listing(stream)
}

// ── Pass selection ──

#[test]
fn test_pass_names() {
    assert_eq!("fold".parse::<Pass>().unwrap(), Pass::Fold);
    assert_eq!("propagate".parse::<Pass>().unwrap(), Pass::Propagate);
    assert_eq!(
        "eliminate-dead-code".parse::<Pass>().unwrap(),
        Pass::EliminateDeadCode
    );
    assert_eq!("dce".parse::<Pass>().unwrap(), Pass::EliminateDeadCode);
    assert!("unroll".parse::<Pass>().is_err());
    assert_eq!(Pass::EliminateDeadCode.to_string(), "eliminate-dead-code");
}

#[test]
fn test_run_passes_with_no_passes_is_identity() {
    let ops = vec![bin("t1", "2", BinOp::Add, "3"), assign("x", "t1"), print("x")];
    assert_eq!(run_passes(ops.clone(), &[]), ops);
}

// ── Constant folding ──

#[test]
fn test_fold_assign_sum_scenario() {
    let program = Program {
        decls: vec![Decl::Fn(FnDecl {
            name: "main".into(),
            formals: vec![],
            body: Some(Stmt::block(vec![
                Stmt::expr(Expr::assign(
                    "x",
                    Expr::binary(Expr::int(2), BinOp::Add, Expr::int(3)),
                )),
                Stmt::expr(Expr::call(PRINT_INT, vec![Expr::var("x")])),
            ])),
        })],
    };
    let folded = fold_constants(build_program(&program));
    assert_eq!(
        body(&folded),
        "main:\n    BeginFunc 8\n    x := 5\n    Print x\n    EndFunc\n"
    );
    assert!(folded[2].flags.folded);
}

#[test]
fn test_fold_without_copy_keeps_temp() {
    let folded = fold_constants(vec![bin("t1", "6", BinOp::Mul, "7"), print("t1")]);
    assert_eq!(body(&folded), "    t1 := 42\n    Print t1\n");
}

#[test]
fn test_fold_arithmetic() {
    assert_eq!(fold_binary("7", BinOp::Div, "-2"), Ok(Some(-3)));
    assert_eq!(fold_binary("-7", BinOp::Div, "2"), Ok(Some(-3)));
    assert_eq!(fold_binary("9", BinOp::Sub, "12"), Ok(Some(-3)));
    assert_eq!(
        fold_binary("2147483647", BinOp::Add, "1"),
        Ok(Some(i32::MIN))
    );
    assert_eq!(fold_binary("7", BinOp::Rem, "2"), Ok(None));
    assert_eq!(fold_binary("1", BinOp::Lt, "2"), Ok(None));
}

#[test]
fn test_fold_division_by_zero_passes_through() {
    assert_eq!(
        fold_binary("8", BinOp::Div, "0"),
        Err(ArithmeticError::DivisionByZero { lhs: "8".into() })
    );
    let ops = vec![bin("t1", "8", BinOp::Div, "0"), assign("x", "t1")];
    assert_eq!(fold_constants(ops.clone()), ops);
}

#[test]
fn test_fold_malformed_literal_passes_through() {
    assert_eq!(
        fold_binary("1.5", BinOp::Add, "1"),
        Err(ArithmeticError::MalformedLiteral("1.5".into()))
    );
    let ops = vec![bin("t1", "--", BinOp::Add, "1"), assign("x", "t1")];
    assert_eq!(fold_constants(ops.clone()), ops);
}

#[test]
fn test_fold_fuses_chain() {
    let ops = vec![
        bin("t1", "2", BinOp::Add, "3"),
        assign("x", "t1"),
        bin("t2", "x", BinOp::Add, "1"),
        assign("y", "t2"),
        bin("t3", "y", BinOp::Mul, "2"),
        assign("z", "t3"),
        print("z"),
    ];
    let folded = fold_constants(ops);
    assert_eq!(
        body(&folded),
        "    x := 5\n    y := x + 1\n    z := y * 2\n    Print z\n"
    );
}

#[test]
fn test_fold_chain_stops_at_broken_link() {
    let ops = vec![
        bin("t1", "2", BinOp::Add, "3"),
        assign("x", "t1"),
        print("x"),
        bin("t2", "x", BinOp::Add, "1"),
        assign("y", "t2"),
    ];
    let folded = fold_constants(ops);
    assert_eq!(
        body(&folded),
        "    x := 5\n    Print x\n    t2 := x + 1\n    y := t2\n"
    );
}

#[test]
fn test_fold_chain_skips_comparisons() {
    let ops = vec![
        bin("t1", "2", BinOp::Add, "3"),
        assign("x", "t1"),
        bin("t2", "x", BinOp::Le, "9"),
        assign("b", "t2"),
    ];
    let folded = fold_constants(ops);
    assert_eq!(body(&folded), "    x := 5\n    t2 := x <= 9\n    b := t2\n");
}

#[test]
fn test_repeated_fold_keeps_variables_read_later() {
    let program = Program {
        decls: vec![Decl::Fn(FnDecl {
            name: "main".into(),
            formals: vec![],
            body: Some(Stmt::block(vec![
                Stmt::expr(Expr::assign(
                    "x",
                    Expr::binary(Expr::int(2), BinOp::Add, Expr::int(3)),
                )),
                Stmt::expr(Expr::assign(
                    "y",
                    Expr::binary(Expr::var("x"), BinOp::Add, Expr::int(1)),
                )),
                Stmt::expr(Expr::assign("z", Expr::var("y"))),
                Stmt::expr(Expr::call(PRINT_INT, vec![Expr::var("y")])),
                Stmt::expr(Expr::call(PRINT_INT, vec![Expr::var("z")])),
            ])),
        })],
    };
    let ops = build_program(&program);
    assert_eq!(run(&ops, &[]).unwrap(), vec![6, 6]);

    let twice = run_passes(ops.clone(), &[Pass::Fold, Pass::Fold]);
    assert_eq!(
        body(&twice),
        "main:\n    BeginFunc 20\n    x := 5\n    y := x + 1\n    z := y\n    Print y\n    Print z\n    EndFunc\n"
    );
    assert_eq!(run(&twice, &[]).unwrap(), vec![6, 6]);

    let mixed = run_passes(ops, &[Pass::Fold, Pass::Propagate, Pass::Fold]);
    assert!(mixed.iter().any(|i| matches!(
        &i.op,
        TACOp::LocalAssign { target, value } if target == "y" && value == "6"
    )));
    assert_eq!(run(&mixed, &[]).unwrap(), vec![6, 6]);
}

#[test]
fn test_fold_never_fuses_copy_of_user_variable() {
    let ops = vec![
        assign("x", "5"),
        bin("y", "x", BinOp::Add, "1"),
        assign("z", "y"),
        bin("w", "2", BinOp::Mul, "3"),
        assign("v", "w"),
    ];
    let mut folded_input = ops.clone();
    folded_input[0].flags.folded = true;
    let folded = fold_constants(folded_input);
    assert_eq!(
        body(&folded),
        "    x := 5\n    y := x + 1\n    z := y\n    w := 6\n    v := w\n"
    );
}

// ── Constant propagation ──

#[test]
fn test_propagate_substitutes_recorded_literal() {
    let ops = vec![
        assign("x", "5"),
        bin("t1", "x", BinOp::Add, "1"),
        assign("y", "t1"),
        assign("z", "x"),
        print("x"),
    ];
    let out = propagate_constants(ops);
    assert_eq!(
        body(&out),
        "    x := 5\n    t1 := 5 + 1\n    y := t1\n    z := 5\n    Print x\n"
    );
}

#[test]
fn test_propagate_redefinition_latches_off() {
    let ops = vec![
        assign("x", "5"),
        assign("x", "6"),
        bin("t1", "x", BinOp::Add, "1"),
        assign("y", "3"),
        bin("t2", "y", BinOp::Add, "1"),
    ];
    let out = propagate_constants(ops);
    assert_eq!(
        body(&out),
        "    x := 5\n    x := 6\n    t1 := x + 1\n    y := 3\n    t2 := y + 1\n"
    );
}

#[test]
fn test_propagate_tolerates_one_redefinition_per_if_region() {
    let ops = vec![
        assign("x", "1"),
        branch("c", "L0"),
        jump("L1", false),
        label("L0", LabelRole::Plain),
        assign("x", "2"),
        jump("L2", false),
        label("L1", LabelRole::Plain),
        label("L2", LabelRole::IfEnd),
        bin("t1", "x", BinOp::Add, "1"),
        assign("y", "7"),
        bin("t2", "y", BinOp::Add, "1"),
    ];
    let out = propagate_constants(ops);
    // `x` is unknown after the merge, but propagation is still on.
    assert!(matches!(&out[8].op, TACOp::BinaryOp { lhs, .. } if lhs == "x"));
    assert!(matches!(&out[10].op, TACOp::BinaryOp { lhs, .. } if lhs == "7"));
}

#[test]
fn test_propagate_keeps_then_arm_value_out_of_else_arm() {
    let ops = vec![
        assign("x", "1"),
        branch("c", "L0"),
        jump("L1", false),
        label("L0", LabelRole::Plain),
        assign("x", "2"),
        jump("L2", false),
        label("L1", LabelRole::Plain),
        assign("y", "x"),
        label("L2", LabelRole::IfEnd),
    ];
    let out = propagate_constants(ops.clone());
    assert_eq!(out, ops);
}

#[test]
fn test_propagate_second_redefinition_in_region_latches_off() {
    let ops = vec![
        assign("x", "1"),
        assign("y", "1"),
        branch("c", "L0"),
        label("L0", LabelRole::Plain),
        assign("x", "2"),
        assign("y", "2"),
        label("L1", LabelRole::IfEnd),
        assign("z", "4"),
        bin("t1", "z", BinOp::Add, "1"),
    ];
    let out = propagate_constants(ops);
    assert!(matches!(&out[8].op, TACOp::BinaryOp { lhs, .. } if lhs == "z"));
}

#[test]
fn test_propagate_inner_if_end_keeps_outer_region_open() {
    let ops = vec![
        branch("a", "L0"),
        jump("L1", false),
        label("L0", LabelRole::Plain),
        branch("a", "L3"),
        jump("L4", false),
        label("L3", LabelRole::Plain),
        jump("L4", false),
        label("L4", LabelRole::IfEnd),
        assign("y", "5"),
        jump("L2", false),
        label("L1", LabelRole::Plain),
        assign("z", "y"),
        print("z"),
        label("L2", LabelRole::IfEnd),
    ];
    let out = propagate_constants(ops.clone());
    assert_eq!(out, ops);
}

#[test]
fn test_propagate_loop_inside_if_keeps_if_allowance() {
    let ops = vec![
        assign("x", "1"),
        branch("c", "L0"),
        jump("L1", false),
        label("L0", LabelRole::Plain),
        label("L2", LabelRole::LoopTest),
        branch("c", "L3"),
        jump("L4", false),
        label("L3", LabelRole::Plain),
        jump("L2", true),
        label("L4", LabelRole::LoopEnd),
        assign("x", "2"),
        label("L1", LabelRole::IfEnd),
        bin("t1", "x", BinOp::Add, "1"),
        assign("y", "7"),
        bin("t2", "y", BinOp::Add, "1"),
    ];
    let out = propagate_constants(ops);
    assert!(matches!(&out[12].op, TACOp::BinaryOp { lhs, .. } if lhs == "x"));
    assert!(matches!(&out[14].op, TACOp::BinaryOp { lhs, .. } if lhs == "7"));
}

#[test]
fn test_propagate_leaves_loop_carried_names() {
    let ops = vec![
        assign("i", "0"),
        label("L0", LabelRole::LoopTest),
        bin("t1", "i", BinOp::Lt, "3"),
        branch("t1", "L1"),
        jump("L2", false),
        label("L1", LabelRole::Plain),
        bin("t2", "i", BinOp::Add, "1"),
        assign("i", "t2"),
        jump("L0", true),
        label("L2", LabelRole::LoopEnd),
    ];
    let out = propagate_constants(ops.clone());
    assert_eq!(out, ops);
}

#[test]
fn test_propagate_ignores_globals() {
    let ops = vec![
        TACOp::GlobalAssign {
            name: "g".into(),
            value: "0".into(),
        }
        .into(),
        TACOp::FunctionLabel("main".into()).into(),
        assign("g", "4"),
        bin("t1", "g", BinOp::Add, "1"),
    ];
    let out = propagate_constants(ops.clone());
    assert_eq!(out, ops);
}

// ── Dead-code elimination ──

#[test]
fn test_dce_removes_unused_definition() {
    let ops = vec![assign("x", "1"), assign("y", "2"), print("y")];
    let out = eliminate_dead_code(ops);
    assert_eq!(body(&out), "    y := 2\n    Print y\n");
}

#[test]
fn test_dce_removes_overwritten_definition() {
    let ops = vec![assign("x", "1"), assign("x", "2"), print("x")];
    let out = eliminate_dead_code(ops);
    assert_eq!(body(&out), "    x := 2\n    Print x\n");
}

#[test]
fn test_dce_keeps_definitions_split_by_control_flow() {
    let ops = vec![
        branch("c", "L0"),
        jump("L1", false),
        label("L0", LabelRole::Plain),
        assign("x", "1"),
        jump("L2", false),
        label("L1", LabelRole::Plain),
        assign("x", "2"),
        label("L2", LabelRole::IfEnd),
        print("x"),
    ];
    assert_eq!(eliminate_dead_code(ops.clone()), ops);
}

#[test]
fn test_dce_marks_without_removing() {
    let ops = vec![assign("x", "1"), print("y")];
    let marked = mark_dead(ops);
    assert_eq!(marked.len(), 2);
    assert!(marked[0].flags.dead);
    assert!(!marked[1].flags.dead);
}

#[test]
fn test_dce_exempts_loop_body_and_temp_copies() {
    let ops = vec![
        assign("i", "0"),
        label("L0", LabelRole::LoopTest),
        bin("t1", "i", BinOp::Le, "3"),
        branch("t1", "L1"),
        jump("L2", false),
        label("L1", LabelRole::Plain),
        assign("unused", "9"),
        bin("t2", "i", BinOp::Add, "1"),
        assign("i", "t2"),
        jump("L0", true),
        label("L2", LabelRole::LoopEnd),
        bin("t3", "1", BinOp::Add, "1"),
        assign("never_read", "t3"),
    ];
    let out = eliminate_dead_code(ops.clone());
    assert_eq!(out, ops);
}

#[test]
fn test_dce_chases_chains_and_is_idempotent() {
    let ops = vec![
        assign("a", "3"),
        assign("b", "a"),
        assign("c", "b"),
        TACOp::Return(Some("a".into())).into(),
    ];
    let once = eliminate_dead_code(ops);
    assert_eq!(body(&once), "    a := 3\n    Return a\n");
    assert_eq!(eliminate_dead_code(once.clone()), once);
}

#[test]
fn test_dce_keeps_globals_and_call_arguments() {
    let ops = vec![
        TACOp::GlobalAssign {
            name: "g".into(),
            value: "0".into(),
        }
        .into(),
        assign("g", "1"),
        assign("a", "2"),
        TACOp::PushParam("a".into()).into(),
    ];
    assert_eq!(eliminate_dead_code(ops.clone()), ops);
}

// ── Shared analysis ──

#[test]
fn test_loop_regions_pair_labels_with_back_edges() {
    let ops = vec![
        label("L0", LabelRole::LoopTest),
        jump("L0", false),
        label("L3", LabelRole::LoopTest),
        jump("L3", true),
        jump("L0", true),
    ];
    assert_eq!(loop_regions(&ops), vec![(2, 3), (0, 4)]);
}
