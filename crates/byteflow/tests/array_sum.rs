//! Section 8, scenario 6: summing a fixed-size array.

use byteflow::test_harness;

#[test]
fn sums_a_three_element_array() {
    let source = r#"
        int a[3] = {1, 2, 3};
        int main(){
            int sum = 0;
            int i = 0;
            for (i = 0; i < 3; i = i + 1) { sum = sum + a[i]; }
            printint(sum);
            return 0;
        }
    "#;
    let program = byteflow::compile(source).expect("compiles");
    let result = test_harness::run(&program, &[], 2_000_000);
    assert!(result.halted);
    assert_eq!(result.stdout_string(), "6");
}
