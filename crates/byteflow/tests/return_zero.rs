//! Section 8, scenario 1: the smallest legal program produces no output.

use byteflow::test_harness;

#[test]
fn smallest_program_produces_no_output() {
    let program = byteflow::compile("int main(){ return 0; }").expect("compiles");
    let result = test_harness::run(&program, &[], 100_000);
    assert!(result.halted, "program did not halt within the step budget");
    assert_eq!(result.output, Vec::<u8>::new());
}
