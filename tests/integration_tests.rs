//! End-to-end tests: build program trees, compile them and run the listing
//! on a TM simulator.

mod common;

use cminus::ast::{AstBuilder, BinaryOp, Program};
use cminus::{Bump, CodegenConfig, CompilationError, Compiler, CompilerOptions, DataType, OpCode};
use common::{Machine, TrapError, compile_ok, lexical_options, run};

use DataType::{Bool, Int, Void};

/// `int fact(int n) { if (n <= 1) return 1; else return n * fact(n - 1); }`
fn factorial_program<'ast>(b: &AstBuilder<'ast>) -> Program<'ast> {
    let fact_body = b.compound(
        &[],
        &[b.if_(
            b.binary(b.var("n"), BinaryOp::LessEqual, b.int(1)),
            b.ret(Some(b.int(1))),
            Some(b.ret(Some(b.binary(
                b.var("n"),
                BinaryOp::Mul,
                b.call("fact", &[b.binary(b.var("n"), BinaryOp::Sub, b.int(1))]),
            )))),
        )],
    );
    let main_body = b.compound(&[], &[b.call("output", &[b.call("fact", &[b.call("input", &[])])])]);
    b.program(&[
        b.function(Int, "fact", &[b.scalar(Int, "n")], Some(fact_body)),
        b.function(Void, "main", &[], Some(main_body)),
    ])
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn minimal_main_halts() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = b.compound(&[], &[b.ret(Some(b.int(0)))]);
    let program = b.program(&[b.function(Int, "main", &[], Some(body))]);

    let result = compile_ok(&program);
    let listing = result.listing().unwrap();
    assert_eq!(listing.code().last().map(|i| i.op), Some(OpCode::Halt));

    let mut machine = Machine::new(listing, &[]);
    machine.run().unwrap();
    assert!(machine.output().is_empty());
}

#[test]
fn recursive_factorial() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = factorial_program(&b);

    assert_eq!(run(&program, &[5]), vec![120]);
    assert_eq!(run(&program, &[1]), vec![1]);
    assert_eq!(run(&program, &[10]), vec![3628800]);
}

#[test]
fn while_loop_sums() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = b.compound(
        &[b.scalar(Int, "i"), b.scalar(Int, "sum")],
        &[
            b.assign(b.var_ref("i"), b.int(1)),
            b.assign(b.var_ref("sum"), b.int(0)),
            b.while_(
                b.binary(b.var("i"), BinaryOp::LessEqual, b.int(10)),
                b.compound(
                    &[],
                    &[
                        b.assign(b.var_ref("sum"), b.binary(b.var("sum"), BinaryOp::Add, b.var("i"))),
                        b.assign(b.var_ref("i"), b.binary(b.var("i"), BinaryOp::Add, b.int(1))),
                    ],
                ),
            ),
            b.call("output", &[b.var("sum")]),
        ],
    );
    let program = b.program(&[b.function(Void, "main", &[], Some(body))]);

    assert_eq!(run(&program, &[]), vec![55]);
}

#[test]
fn arrays_global_local_and_by_reference() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    // int sum(int v[], int n): adds the first n elements
    let sum_body = b.compound(
        &[b.scalar(Int, "i"), b.scalar(Int, "s")],
        &[
            b.assign(b.var_ref("i"), b.int(0)),
            b.assign(b.var_ref("s"), b.int(0)),
            b.while_(
                b.binary(b.var("i"), BinaryOp::Less, b.var("n")),
                b.compound(
                    &[],
                    &[
                        b.assign(
                            b.var_ref("s"),
                            b.binary(b.var("s"), BinaryOp::Add, b.index("v", b.var("i"))),
                        ),
                        b.assign(b.var_ref("i"), b.binary(b.var("i"), BinaryOp::Add, b.int(1))),
                    ],
                ),
            ),
            b.ret(Some(b.var("s"))),
        ],
    );

    let main_body = b.compound(
        &[b.scalar(Int, "i"), b.array(Int, "local", 3)],
        &[
            b.assign(b.var_ref("i"), b.int(0)),
            b.while_(
                b.binary(b.var("i"), BinaryOp::Less, b.int(5)),
                b.compound(
                    &[],
                    &[
                        b.assign(
                            b.index_ref("a", b.var("i")),
                            b.binary(b.var("i"), BinaryOp::Mul, b.var("i")),
                        ),
                        b.assign(b.var_ref("i"), b.binary(b.var("i"), BinaryOp::Add, b.int(1))),
                    ],
                ),
            ),
            b.assign(b.index_ref("local", b.int(0)), b.int(7)),
            b.assign(b.index_ref("local", b.int(1)), b.int(8)),
            b.assign(b.index_ref("local", b.int(2)), b.int(9)),
            b.call("output", &[b.call("sum", &[b.var("a"), b.int(5)])]),
            b.call("output", &[b.call("sum", &[b.var("local"), b.int(3)])]),
            b.call("output", &[b.index("a", b.int(4))]),
        ],
    );

    let program = b.program(&[
        b.global(b.array(Int, "a", 5)),
        b.function(
            Int,
            "sum",
            &[b.array_param(Int, "v"), b.scalar(Int, "n")],
            Some(sum_body),
        ),
        b.function(Void, "main", &[], Some(main_body)),
    ]);

    assert_eq!(run(&program, &[]), vec![30, 24, 16]);
}

#[test]
fn callee_writes_through_array_parameter() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let fill_body = b.compound(&[], &[b.assign(b.index_ref("v", b.int(1)), b.int(99))]);
    let main_body = b.compound(
        &[b.array(Int, "data", 2)],
        &[
            b.call("fill", &[b.var("data")]),
            b.call("output", &[b.index("data", b.int(1))]),
        ],
    );
    let program = b.program(&[
        b.function(Void, "fill", &[b.array_param(Int, "v")], Some(fill_body)),
        b.function(Void, "main", &[], Some(main_body)),
    ]);

    assert_eq!(run(&program, &[]), vec![99]);
}

#[test]
fn comparisons_produce_booleans() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    // void show(bool v) { if (v) output(1); else output(0); }
    let show_body = b.compound(
        &[],
        &[b.if_(
            b.var("v"),
            b.call("output", &[b.int(1)]),
            Some(b.call("output", &[b.int(0)])),
        )],
    );
    // Each operator against 4 with a left operand below, equal and above.
    let ops = [
        BinaryOp::Less,
        BinaryOp::LessEqual,
        BinaryOp::Greater,
        BinaryOp::GreaterEqual,
        BinaryOp::Equal,
        BinaryOp::NotEqual,
    ];
    let calls: Vec<_> = ops
        .iter()
        .flat_map(|&op| [3, 4, 5].map(|l| (l, op)))
        .map(|(l, op)| b.call("show", &[b.binary(b.int(l), op, b.int(4))]))
        .collect();
    let program = b.program(&[
        b.function(Void, "show", &[b.scalar(Bool, "v")], Some(show_body)),
        b.function(Void, "main", &[], Some(b.compound(&[], &calls))),
    ]);

    #[rustfmt::skip]
    let expected = vec![
        1, 0, 0, // <
        1, 1, 0, // <=
        0, 0, 1, // >
        0, 1, 1, // >=
        0, 1, 0, // ==
        1, 0, 1, // !=
    ];
    assert_eq!(run(&program, &[]), expected);
}

#[test]
fn arithmetic_and_negation() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = b.compound(
        &[],
        &[
            b.call("output", &[b.binary(b.neg(b.int(7)), BinaryOp::Add, b.int(2))]),
            b.call("output", &[b.binary(b.int(17), BinaryOp::Div, b.int(5))]),
            b.call(
                "output",
                &[b.binary(b.binary(b.int(2), BinaryOp::Mul, b.int(3)), BinaryOp::Sub, b.int(10))],
            ),
        ],
    );
    let program = b.program(&[b.function(Void, "main", &[], Some(body))]);

    assert_eq!(run(&program, &[]), vec![-5, 3, -4]);
}

#[test]
fn prototype_allows_forward_call() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[
        b.prototype(Int, "twice", &[b.scalar(Int, "x")]),
        b.function(
            Void,
            "main",
            &[],
            Some(b.compound(&[], &[b.call("output", &[b.call("twice", &[b.int(21)])])])),
        ),
        b.function(
            Int,
            "twice",
            &[b.scalar(Int, "x")],
            Some(b.compound(&[], &[b.ret(Some(b.binary(b.var("x"), BinaryOp::Add, b.var("x"))))])),
        ),
    ]);

    assert_eq!(run(&program, &[]), vec![42]);
}

#[test]
fn inner_block_shadows_local() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = b.compound(
        &[b.scalar(Int, "x")],
        &[
            b.assign(b.var_ref("x"), b.int(1)),
            b.if_(
                b.bool_lit(true),
                b.compound(
                    &[b.scalar(Int, "x")],
                    &[
                        b.assign(b.var_ref("x"), b.int(2)),
                        b.call("output", &[b.var("x")]),
                    ],
                ),
                None,
            ),
            b.call("output", &[b.var("x")]),
        ],
    );
    let program = b.program(&[b.function(Void, "main", &[], Some(body))]);

    assert_eq!(run(&program, &[]), vec![2, 1]);
}

#[test]
fn globals_are_shared_between_functions() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let bump_body = b.compound(
        &[],
        &[b.assign(b.var_ref("counter"), b.binary(b.var("counter"), BinaryOp::Add, b.int(1)))],
    );
    let main_body = b.compound(
        &[],
        &[
            b.assign(b.var_ref("counter"), b.int(10)),
            b.call("bump", &[]),
            b.call("bump", &[]),
            b.call("output", &[b.var("counter")]),
        ],
    );
    let program = b.program(&[
        b.global(b.scalar(Int, "counter")),
        b.function(Void, "bump", &[], Some(bump_body)),
        b.function(Void, "main", &[], Some(main_body)),
    ]);

    assert_eq!(run(&program, &[]), vec![12]);
}

#[test]
fn return_in_main_stops_execution() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = b.compound(
        &[],
        &[
            b.call("output", &[b.int(1)]),
            b.ret(None),
            b.call("output", &[b.int(2)]),
        ],
    );
    let program = b.program(&[b.function(Void, "main", &[], Some(body))]);

    assert_eq!(run(&program, &[]), vec![1]);
}

#[test]
fn calls_inside_expressions_keep_spilled_operands() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let sq = |x| b.call("sq", &[x]);
    let body = b.compound(
        &[],
        &[
            // sq(2) + sq(3) * sq(4)
            b.call(
                "output",
                &[b.binary(
                    sq(b.int(2)),
                    BinaryOp::Add,
                    b.binary(sq(b.int(3)), BinaryOp::Mul, sq(b.int(4))),
                )],
            ),
            b.call("output", &[sq(sq(b.int(3)))]),
        ],
    );
    let program = b.program(&[
        b.function(
            Int,
            "sq",
            &[b.scalar(Int, "x")],
            Some(b.compound(&[], &[b.ret(Some(b.binary(b.var("x"), BinaryOp::Mul, b.var("x"))))])),
        ),
        b.function(Void, "main", &[], Some(body)),
    ]);

    assert_eq!(run(&program, &[]), vec![148, 81]);
}

#[test]
fn echo_input() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = b.compound(
        &[b.scalar(Int, "n")],
        &[
            b.assign(b.var_ref("n"), b.call("input", &[])),
            b.while_(
                b.binary(b.var("n"), BinaryOp::NotEqual, b.int(0)),
                b.compound(
                    &[],
                    &[
                        b.call("output", &[b.var("n")]),
                        b.assign(b.var_ref("n"), b.call("input", &[])),
                    ],
                ),
            ),
        ],
    );
    let program = b.program(&[b.function(Void, "main", &[], Some(body))]);

    assert_eq!(run(&program, &[4, -2, 9, 0]), vec![4, -2, 9]);

    let result = compile_ok(&program);
    let mut machine = Machine::new(result.listing().unwrap(), &[3]);
    assert!(matches!(machine.run(), Err(TrapError::InputExhausted(_))));
}

#[test]
fn division_by_zero_traps_at_runtime() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = b.compound(&[], &[b.call("output", &[b.binary(b.int(1), BinaryOp::Div, b.int(0))])]);
    let program = b.program(&[b.function(Void, "main", &[], Some(body))]);

    let result = compile_ok(&program);
    let mut machine = Machine::new(result.listing().unwrap(), &[]);
    assert!(matches!(machine.run(), Err(TrapError::DivideByZero(_))));
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn redeclared_local_is_reported_once() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = b.compound(&[b.at(2, 5).scalar(Int, "x"), b.at(3, 5).scalar(Int, "x")], &[]);
    let program = b.program(&[b.at(1, 1).function(Void, "main", &[], Some(body))]);

    let result = Compiler::default().compile(&program);
    let diags = result.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(
        diags.to_string(),
        "Error on line 3, column 5: Variable x has already been declared on line 2, column 5"
    );
    // The listing is still complete.
    assert!(result.generated.as_ref().is_some_and(|g| g.is_success()));
}

#[test]
fn missing_main_is_reported() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[b.function(
        Int,
        "helper",
        &[],
        Some(b.compound(&[], &[b.ret(Some(b.int(1)))])),
    )]);

    let result = Compiler::default().compile(&program);
    assert!(result.analysis.is_success());
    assert!(!result.is_success());
    assert!(
        result
            .diagnostics()
            .iter()
            .any(|e| matches!(e, CompilationError::MissingEntryPoint))
    );
}

#[test]
fn block_cannot_see_function_locals_by_default() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = b.compound(
        &[b.scalar(Int, "x")],
        &[b.if_(b.bool_lit(true), b.assign(b.var_ref("x"), b.int(1)), None)],
    );
    let program = b.program(&[b.function(Void, "main", &[], Some(body))]);

    let default = Compiler::default().compile(&program);
    assert!(matches!(
        default.diagnostics().iter().collect::<Vec<_>>().as_slice(),
        [CompilationError::UndefinedVariable { name, .. }] if name == "x"
    ));
    // Code generation still resolves x through the enclosing frame.
    assert!(default.generated.as_ref().is_some_and(|g| g.is_success()));

    let lexical = Compiler::new(lexical_options()).compile(&program);
    assert!(lexical.is_success(), "{}", lexical.diagnostics());
}

#[test]
fn type_errors_are_collected() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = b.compound(
        &[b.scalar(Int, "i"), b.scalar(Bool, "flag")],
        &[
            b.assign(b.var_ref("i"), b.bool_lit(true)),
            b.assign(b.var_ref("flag"), b.binary(b.var("i"), BinaryOp::Add, b.var("flag"))),
            b.call("output", &[b.var("flag")]),
        ],
    );
    let program = b.program(&[b.function(Void, "main", &[], Some(body))]);

    let result = Compiler::default().compile(&program);
    let diags = result.analysis.diagnostics.into_vec();
    assert_eq!(diags.len(), 3, "{:?}", diags);
    assert!(matches!(
        diags[0],
        CompilationError::TypeMismatch {
            expected: Int,
            found: Bool,
            ..
        }
    ));
    assert!(matches!(diags[1], CompilationError::TypeMismatch { .. }));
    assert!(matches!(
        &diags[2],
        CompilationError::ArgumentTypeMismatch { function, position: 1, .. } if function == "output"
    ));
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn scope_trace() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[
        b.function(
            Int,
            "square",
            &[b.scalar(Int, "n")],
            Some(b.compound(&[], &[b.ret(Some(b.binary(b.var("n"), BinaryOp::Mul, b.var("n"))))])),
        ),
        b.function(
            Void,
            "main",
            &[],
            Some(b.compound(&[], &[b.call("output", &[b.call("square", &[b.int(3)])])])),
        ),
    ]);

    let result = Compiler::default().compile(&program);
    assert!(result.is_success(), "{}", result.diagnostics());
    let expected = "\
Entering the global scope:
    Entering the scope for function square:
        n: int n
    Leaving the function scope
    Entering the scope for function main:
    Leaving the function scope
    square: int square(int n)
    main: void main(void)
Leaving the global scope
";
    assert_eq!(result.trace(), expected);
}

#[test]
fn listing_text_layout() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[b.function(Void, "main", &[], Some(b.compound(&[], &[])))]);

    let listing = Compiler::default().build(&program).unwrap();
    let text = listing.to_string();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("* Standard prelude:"));
    assert_eq!(lines.next(), Some("  0:    LD 6,0(0) \tload gp with maxaddress"));
    assert!(text.contains("* processing function: main"));
    assert!(text.ends_with("HALT 0,0,0 \t\n"));
}

#[test]
fn comments_can_be_disabled() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = factorial_program(&b);

    let quiet = CompilerOptions {
        codegen: CodegenConfig {
            emit_comments: false,
        },
        ..lexical_options()
    };
    let listing = Compiler::new(quiet).build(&program).unwrap();
    assert_eq!(listing.comments().count(), 0);
    assert!(!listing.to_string().lines().any(|line| line.starts_with('*')));

    let mut machine = Machine::new(&listing, &[4]);
    machine.run().unwrap();
    assert_eq!(machine.output(), &[24]);
}
