mod util;

use indoc::indoc;
use util::{assert_stdout, run_script, EX_USAGE, EX_SOFTWARE, SUCCESS};

#[test]
fn arithmetic_honors_precedence_and_grouping() {
    assert_stdout("print 2 + 3 * 4;", "14.0\n", SUCCESS);
    assert_stdout("print (2 + 3) * 4;", "20.0\n", SUCCESS);
}

#[test]
fn string_concatenation() {
    assert_stdout(r#"print "foo" + "bar";"#, "foobar\n", SUCCESS);
}

#[test]
fn subtracting_a_number_from_a_string_is_a_runtime_error() {
    run_script(r#""a" - 1;"#).code(EX_SOFTWARE);
}

#[test]
fn accessing_a_field_on_nil_is_a_runtime_error() {
    run_script("nil.field;").code(EX_SOFTWARE);
}

#[test]
fn calling_with_the_wrong_arity_is_a_runtime_error() {
    run_script("fun f(a) { return a; } f(1, 2);").code(EX_SOFTWARE);
}

#[test]
fn closures_capture_variables_by_reference() {
    let script = indoc! {r#"
        fun makeCounter() {
            var count = 0;
            fun increment() {
                count = count + 1;
                return count;
            }
            return increment;
        }
        var counter = makeCounter();
        print counter();
        print counter();
        print counter();
    "#};
    assert_stdout(script, "1.0\n2.0\n3.0\n", SUCCESS);
}

#[test]
fn shadowing_in_a_block_does_not_change_an_earlier_closure() {
    // The classic resolver test: `show` closes over the global `a` as it
    // existed when `show` was declared, so re-declaring `a` in the
    // enclosing block afterward has no effect on what `show` prints.
    let script = indoc! {r#"
        var a = "global";
        {
            fun show() { print a; }
            show();
            var a = "block";
            show();
        }
    "#};
    assert_stdout(script, "global\nglobal\n", SUCCESS);
}

#[test]
fn classes_store_fields_and_dispatch_methods() {
    let script = indoc! {r#"
        class Counter {
            init() { this.count = 0; }
            increment() {
                this.count = this.count + 1;
                return this.count;
            }
        }
        var c = Counter();
        print c.increment();
        print c.increment();
    "#};
    assert_stdout(script, "1.0\n2.0\n", SUCCESS);
}

#[test]
fn inheritance_dispatches_through_super() {
    let script = indoc! {r#"
        class Animal {
            speak() { return "..."; }
        }
        class Dog < Animal {
            speak() { return "Woof, " + super.speak(); }
        }
        print Dog().speak();
    "#};
    assert_stdout(script, "Woof, ...\n", SUCCESS);
}

#[test]
fn instantiating_a_class_with_no_init_returns_an_instance() {
    assert_stdout("class Empty {} print Empty();", "Empty instance\n", SUCCESS);
}

#[test]
fn a_method_extracted_from_an_instance_keeps_its_this_binding() {
    let script = indoc! {r#"
        class Box {
            init(v) { this.v = v; }
            val() { return this.v; }
        }
        var box = Box(1);
        var m = box.val;
        print m();
    "#};
    assert_stdout(script, "1.0\n", SUCCESS);
}

#[test]
fn returning_from_top_level_code_is_a_resolve_error() {
    run_script("return 1;").code(EX_USAGE);
}

#[test]
fn a_class_inheriting_from_itself_is_a_resolve_error() {
    run_script("class Oops < Oops {}").code(EX_USAGE);
}

#[test]
fn reading_a_local_variable_in_its_own_initializer_is_a_resolve_error() {
    run_script("{ var a = a; }").code(EX_USAGE);
}
