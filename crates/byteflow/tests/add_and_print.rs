//! Section 8, scenario 3: locals, addition, and `printint`.

use byteflow::test_harness;

#[test]
fn adds_two_locals_and_prints_the_sum() {
    let source = "int main(){ int a=3; int b=4; printint(a+b); return 0; }";
    let program = byteflow::compile(source).expect("compiles");
    let result = test_harness::run(&program, &[], 200_000);
    assert!(result.halted);
    assert_eq!(result.stdout_string(), "7");
}

#[test]
fn runs_the_same_under_the_optimizer() {
    let source = "int main(){ int a=3; int b=4; printint(a+b); return 0; }";
    let options = byteflow::CompileOptions {
        optimize: true,
        ..Default::default()
    };
    let output = byteflow::compile_with_options(source, &options).expect("compiles");
    let result = test_harness::run(&output.source, &[], 200_000);
    assert!(result.halted);
    assert_eq!(result.stdout_string(), "7");
}
