use std::fs;

use ecru::{CompileOutput, compile};
use walkdir::WalkDir;

#[test]
fn program_files_match_their_expected_output() {
    let mut count = 0;

    for entry in
        WalkDir::new("tests/programs").into_iter()
                                      .filter_map(Result::ok)
                                      .filter(|e| e.path().extension().is_some_and(|ext| ext == "ecru"))
    {
        count += 1;
        let path = entry.path();
        let source = fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));
        let expected = fs::read_to_string(path.with_extension("out")).unwrap_or_default();
        let output = compile(&source);

        assert_eq!(output.buffer.stdout, expected, "stdout of {path:?}");
        match fs::read_to_string(path.with_extension("err")) {
            Ok(kind) => {
                let message = output.error_msg
                                    .unwrap_or_else(|| panic!("{path:?} succeeded but was expected to fail"));
                assert!(message.starts_with(kind.trim()),
                        "{path:?} failed with {message}, expected {}",
                        kind.trim());
            },
            Err(_) => {
                assert!(output.error_msg.is_none(),
                        "{path:?} failed: {}",
                        output.error_msg.unwrap_or_default());
            },
        }
    }

    assert!(count > 0, "No programs found in tests/programs");
}

fn run(src: &str) -> CompileOutput {
    compile(src)
}

fn assert_output(src: &str, expected: &str) {
    let output = run(src);
    if let Some(e) = output.error_msg {
        panic!("Script failed: {e}");
    }
    assert_eq!(output.buffer.stdout, expected, "stdout of {src:?}");
}

fn assert_failure(src: &str, kind: &str) {
    match run(src).error_msg {
        Some(message) => assert!(message.starts_with(kind), "expected {kind}, got {message}"),
        None => panic!("Script succeeded but was expected to fail"),
    }
}

#[test]
fn precedence_of_arithmetic() {
    assert_output("print 1+2*3;", "7");
    assert_output("print (1 + 2) * 3;", "9");
    assert_output("print 2 ^ 3 ^ 2;", "512");
    assert_output("print -2 ^ 2;", "-4");
    assert_output("print 3! + 1;", "7");
}

#[test]
fn declarations_and_assignment() {
    assert_output("x: Z; y: Z = 3; x=y; print 2*x+y;", "9");
    assert_output("x: N; print x;", "1");
    assert_output("x: Z = 4; x *= 3; x -= 2; print x;", "10");
}

#[test]
fn undeclared_assignment_fails_before_running() {
    let output = run("println 1; x=3;");
    assert!(output.error_msg.unwrap().starts_with("UndefinedIdentifierError"));
    assert!(output.buffer.stdout.is_empty());
}

#[test]
fn functions() {
    assert_output("f(x:Z):Z{return x+1;} print f(3);", "4");
    assert_output("g(): void { println \"hi\"; } g(); g();", "hi\nhi\n");
    assert_output("add(a: Z, b: Z): Z { return a + b; } print add(2, 3);", "5");
    assert_output("f: Z -> Z = \\lambda(x: Z) => x * 2; print f(21);", "42");
}

#[test]
fn recursion_keeps_frames_apart() {
    let source = "fib(n: Z): Z {
                      if (n < 2) { return n; }
                      a: Z = fib(n - 1);
                      b: Z = fib(n - 2);
                      return a + b;
                  }
                  print fib(15);";
    assert_output(source, "610");
}

#[test]
fn missing_return_is_reported() {
    assert_failure("f():Z{}", "NonexistentReturnError");
    assert_output("f(): void {} f();", "");
}

#[test]
fn print_modes() {
    assert_output("print 1; print 2;", "12");
    assert_output("println 1; println 2;", "1\n2\n");
    assert_output("pprint 72;", "2^3*3^2");
    assert_output("pprint 0 - 12;", "-2^2*3");
    assert_output("pprintln (1, \"a\");", "(1, \"a\")\n");
}

#[test]
fn control_flow() {
    assert_output("i: Z = 0; while (i < 3) { print i; i += 1; }", "012");
    assert_output("for (i: Z = 3; i > 0; i -= 1) { print i; }", "321");
    assert_output("x: Z = 5; if (x > 3) { print \"big\"; } else if (x > 1) { print \"mid\"; } else { print \"small\"; }",
                  "big");
    assert_output("print 1; return; print 2;", "1");
}

#[test]
fn exact_arithmetic() {
    assert_output("print 7 / 2;", "3");
    assert_output("print (0 - 7) / 2;", "-4");
    assert_output("print (0 - 7) % 2;", "1");
    assert_output("x: Q = 7; print x / 2;", "7/2");
    assert_output("x: Q = 0.1 + 0.2; print x == 0.3;", "true");
    assert_output("print 2 ^ 100;", "1267650600228229401496703205376");
}

#[test]
fn runtime_conversions() {
    assert_output("x: N = 5 - 2; print x;", "3");
    assert_failure("x: N = 2 - 5;", "IllegalTypeConversionError");
    assert_failure("x: Z = 1.5;", "IllegalTypeConversionError");
    assert_failure("x: Q = \"one\";", "IllegalTypeConversionError");
    assert_failure("print (0 - 1)!;", "IllegalTypeConversionError");
}

#[test]
fn static_errors() {
    assert_failure("print 1", "MissingSemicolonError");
    assert_failure("print (1;", "ParserError");
    assert_failure("print 1 # 2;", "UnknownCharacterError");
    assert_failure("x: Z; x: Q;", "RedefinedIdentifierError");
    assert_failure("x: Bool = \"true\";", "IllegalTypeConversionError");
    assert_failure("x: Z = 3; print x(1);", "IllegalCallError");
    assert_failure("x: Z = 3; print x[0];", "IllegalIndexError");
    assert_failure("f(x: Z): Z { return x; } print f(1, 2);", "ArgumentLengthError");
    assert_failure("print (1, 2) + (1, 2, 3);", "DimensionError");
    assert_failure("t: Z^2 = (1, 2); print t[2];", "OutOfBoundsError");
    assert_failure("print \"a\" - 1;", "UnsupportedBinop");
    assert_failure("a: Z/3Z = 1; b: Z/4Z = 1; print a + b;", "UnsupportedBinop");
}

#[test]
fn runtime_errors_keep_earlier_output() {
    let output = run("s: Str = \"abc\"; i: Z = 5; println s[0]; print s[i];");
    assert_eq!(output.buffer.stdout, "a\n");
    assert!(output.error_msg.unwrap().starts_with("OutOfBoundsError"));
    assert!(output.buffer.stderr.starts_with("OutOfBoundsError"));
}

#[test]
fn stack_traces_are_capped() {
    let output = run("f(n: Z): Z { return f(n + 1); } print f(0);");
    assert!(output.error_msg.unwrap().starts_with("StackOverflowError"));
    let stack = output.error_stack.unwrap();
    assert_eq!(stack.lines().filter(|line| line.trim_start().starts_with("at f")).count(), 8);
    assert!(stack.contains("+342 more"));
    assert!(stack.ends_with("at <program>"));
}

#[test]
fn conditions_need_parentheses() {
    assert_failure("x: Z = 2; if x > 1 { print x; }", "ParserError");
    assert_failure("x: Z = 2; while x > 1 { x -= 1; }", "ParserError");
    assert_output("x: Z = 2; if (x > 1) { print x; }", "2");
}

#[test]
fn block_lambdas_return_what_they_return() {
    assert_output("f: Z -> Z = \\lambda(x: Z) { return x + 1; }; print f(2);", "3");
    assert_output("f: Z -> Z = \\lambda(x: Z) { if (x < 0) { return 1; } return x * 2; }; print f(0 - 3); print f(5);",
                  "110");
    assert_output("g: void -> void = \\lambda() { println \"hi\"; }; g();", "hi\n");
}

#[test]
fn deep_nesting_is_a_diagnostic() {
    let depth = 30_000;
    let parens = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));
    assert_failure(&parens, "ParserError");
    assert!(run(&parens).error_msg.unwrap().contains("nested too deeply"));

    for source in [format!("print 1{};", "+1".repeat(depth)),
                   format!("print {}1;", "-".repeat(depth)),
                   format!("print 2{};", "^2".repeat(depth)),
                   format!("print 3{};", "!".repeat(depth)),
                   format!("f(): void {{}} f{};", "()".repeat(depth)),
                   format!("{}{}", "if (true) { ".repeat(depth), "}".repeat(depth)),
                   format!("if (true) {{}}{}", " else if (true) {}".repeat(depth)),
                   format!("f: {}Z;", "Z->".repeat(depth))]
    {
        assert_failure(&source, "ParserError");
    }
}

#[test]
fn moderate_nesting_still_runs() {
    assert_output(&format!("print {}1{};", "(".repeat(100), ")".repeat(100)), "1");
    assert_output(&format!("print 0{};", "+1".repeat(200)), "200");
    let line = format!("print {}1{};", "(".repeat(100), ")".repeat(100));
    assert_output(&line.repeat(50), &"1".repeat(50));
}

#[test]
fn oversized_values_fail_cleanly() {
    assert_failure("x: Z^4000000000;", "ParserError");
    assert_failure("print 2 ^ 4000000000;", "IllegalTypeConversionError");
    assert_output("x: Z^3 = (1, 2, 3); print x[2];", "3");
}

#[test]
fn parse_tree_rendering() {
    assert_eq!(run("x = 3;").parse_tree, "Program(AssignStmt(x,3))");
    assert_eq!(run("").parse_tree, "Program()");
    assert_eq!(run("x").parse_tree, "Error");
    assert_eq!(run("x: Z; x = 3;").parse_tree, "Program(DeclStmt(x,Z),AssignStmt(x,3))");
}

#[test]
fn runs_are_deterministic() {
    let source = "f(n: Z): Z { if (n < 1) { return 0; } return n + f(n - 1); } println f(30); print 1 / 0;";
    assert_eq!(run(source), run(source));
}
