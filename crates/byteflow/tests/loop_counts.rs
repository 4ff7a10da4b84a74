//! Section 8, scenario 4: a `while` loop counting up with a mutated local.

use byteflow::test_harness;

#[test]
fn while_loop_prints_zero_through_four() {
    let source = "int main(){ int i=0; while(i<5){ printint(i); i=i+1; } return 0; }";
    let program = byteflow::compile(source).expect("compiles");
    let result = test_harness::run(&program, &[], 2_000_000);
    assert!(result.halted, "loop did not halt within the step budget");
    assert_eq!(result.stdout_string(), "01234");
}
