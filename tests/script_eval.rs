use fieldstore::FieldStore;
use fieldstore::script::{Expr, eval_program, parse_program};
use proptest::prelude::*;
use serde_json::json;

fn eval(source: &str, store: &mut FieldStore) -> Result<(), fieldstore::script::ScriptError> {
    let program = parse_program(source)?;
    eval_program(&program, store)
}

#[test]
fn scripts_only_touch_the_store() {
    // The language has no forms for anything but store fields and values;
    // an attempt to name anything else is an ordinary eval error.
    let mut store = FieldStore::new();
    let err = eval("(open \"/etc/passwd\")", &mut store).unwrap_err();
    assert_eq!(err.to_string(), "unknown form 'open'");
    assert!(store.is_empty());
}

#[test]
fn nested_builders_compose() {
    let mut store = FieldStore::new();
    eval(
        "(set report (object :rows (list (object :id 1) (object :id 2)) :total (+ 1 2)))",
        &mut store,
    )
    .expect("eval");
    assert_eq!(
        store.get("report"),
        Some(&json!({"rows": [{"id": 1}, {"id": 2}], "total": 3}))
    );
}

#[test]
fn comments_and_multiple_forms_run_in_order() {
    let mut store = FieldStore::new();
    eval(
        "; seed the input\n(set array (list 1 2 3))\n(set n (len (get array))) ; aggregate",
        &mut store,
    )
    .expect("eval");
    assert_eq!(store.get("n"), Some(&json!(3)));
}

#[test]
fn set_accepts_string_field_names() {
    let mut store = FieldStore::new();
    eval("(set \"spaced name\" 7)", &mut store).expect("eval");
    assert_eq!(store.get("spaced name"), Some(&json!(7)));
}

#[test]
fn syntax_errors_carry_a_byte_offset() {
    let err = parse_program("(set a \x01\"").unwrap_err();
    assert!(err.to_string().contains("at byte"));
}

proptest! {
    // The parser must reject or accept arbitrary input without panicking;
    // a malicious `run` payload becomes an error response, never a crash.
    #[test]
    fn parser_never_panics(input in ".{0,256}") {
        let _ = parse_program(&input);
    }

    #[test]
    fn integer_literals_parse_exactly(n in any::<i64>()) {
        let program = parse_program(&n.to_string()).expect("parse");
        prop_assert_eq!(program.forms, vec![Expr::Integer(n)]);
    }

    #[test]
    fn sum_matches_reference_addition(values in proptest::collection::vec(-1_000_000i64..1_000_000, 0..64)) {
        let mut store = FieldStore::new();
        store.set("array", json!(values));
        eval("(set total (sum (get array)))", &mut store).expect("eval");
        let expected: i64 = values.iter().sum();
        prop_assert_eq!(store.get("total"), Some(&json!(expected)));
    }
}
