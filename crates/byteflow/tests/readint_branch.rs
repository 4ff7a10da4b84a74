//! Section 8, scenario 5: `readint` feeding an `if`/`else` branch.

use byteflow::test_harness;

const SOURCE: &str = r#"
int main(){
    int x = readint();
    if (x == 0) { print("z"); } else { print("n"); }
    return 0;
}
"#;

#[test]
fn stdin_zero_takes_the_then_branch() {
    let program = byteflow::compile(SOURCE).expect("compiles");
    let result = test_harness::run(&program, b"0", 2_000_000);
    assert!(result.halted);
    assert_eq!(result.stdout_string(), "z");
}

#[test]
fn stdin_nonzero_takes_the_else_branch() {
    let program = byteflow::compile(SOURCE).expect("compiles");
    let result = test_harness::run(&program, b"7", 2_000_000);
    assert!(result.halted);
    assert_eq!(result.stdout_string(), "n");
}
