//! Section 8, scenario 2: `print` emits a string literal byte for byte.

use byteflow::test_harness;

#[test]
fn print_literal_writes_hi() {
    let program = byteflow::compile(r#"int main(){ print("Hi"); return 0; }"#).expect("compiles");
    let result = test_harness::run(&program, &[], 100_000);
    assert!(result.halted);
    assert_eq!(result.stdout_string(), "Hi");
}
