//! Regression test: writing to an array element at a runtime-computed index.
//! The read path (`a[i]`) was covered by `array_sum.rs`, but the write path
//! (`a[i] = expr;`) went untested and, until fixed, panicked the compiler
//! by leaking `emit_index_write`'s `value` temp above `emit_if_else`'s
//! `else_flag` on the allocator's LIFO stack.

use byteflow::test_harness;

#[test]
fn writes_an_element_then_reads_it_back() {
    let source = r#"
        int a[3] = {0, 0, 0};
        int main(){
            int i = 1;
            int v = 9;
            a[i] = v;
            printint(a[i]);
            return 0;
        }
    "#;
    let program = byteflow::compile(source).expect("compiles");
    let result = test_harness::run(&program, &[], 2_000_000);
    assert!(result.halted);
    assert_eq!(result.stdout_string(), "9");
}

#[test]
fn writing_past_the_end_is_silently_dropped() {
    let source = r#"
        int a[3] = {1, 2, 3};
        int main(){
            int i = 5;
            a[i] = 99;
            printint(a[0]);
            return 0;
        }
    "#;
    let program = byteflow::compile(source).expect("compiles");
    let result = test_harness::run(&program, &[], 2_000_000);
    assert!(result.halted);
    assert_eq!(result.stdout_string(), "1");
}
