mod util;

use indoc::indoc;
use util::{assert_stdout, run_script, EX_USAGE, SUCCESS};

#[test]
fn unterminated_string_is_a_scan_error() {
    run_script("var a = \"oops;").code(EX_USAGE);
}

#[test]
fn unexpected_character_is_a_scan_error() {
    run_script("var a = 1 @ 2;").code(EX_USAGE);
}

#[test]
fn nested_block_comments_are_skipped() {
    assert_stdout(
        "/* outer /* inner */ still outer */ print 1;",
        "1\n",
        SUCCESS,
    );
}

#[test]
fn numbers_and_strings_print_with_lox_rules() {
    let script = indoc! {r#"
        print 1;
        print 1.5;
        print "hello";
    "#};
    assert_stdout(script, "1.0\n1.5\nhello\n", SUCCESS);
}
