//! Evaluator for the script language.
//!
//! Programs run against the shared [`FieldStore`]: `(get f)` reads a field,
//! `(set f e)` writes one, and the remaining forms build JSON values or do
//! arithmetic. Forms are evaluated strictly in order; when one fails the
//! program stops there and earlier mutations stay in place (no rollback).

use super::{Expr, Program, Result, ScriptError};
use crate::store::FieldStore;
use serde_json::{Number, Value};

/// Evaluate every top-level form of a program, in order.
pub fn eval_program(program: &Program, store: &mut FieldStore) -> Result<()> {
    for form in &program.forms {
        eval_expr(form, store)?;
    }
    Ok(())
}

/// Evaluate a single expression to a JSON value.
pub fn eval_expr(expr: &Expr, store: &mut FieldStore) -> Result<Value> {
    match expr {
        Expr::String(text) => Ok(Value::String(text.clone())),
        Expr::Integer(num) => Ok(Value::from(*num)),
        Expr::Float(num) => float_value(*num),
        Expr::Boolean(flag) => Ok(Value::Bool(*flag)),
        Expr::Null => Ok(Value::Null),
        Expr::Keyword(kw) => Err(eval_error(&format!(
            "keyword ':{kw}' is only valid as an object key"
        ))),
        Expr::Symbol(sym) => Err(eval_error(&format!("unknown symbol '{sym}'"))),
        Expr::List(items) => eval_form(items, store),
    }
}

fn eval_form(items: &[Expr], store: &mut FieldStore) -> Result<Value> {
    let Some(head) = items.first() else {
        return Err(eval_error("empty form"));
    };
    let Expr::Symbol(head) = head else {
        return Err(eval_error(&format!(
            "form head must be a symbol, found {head:?}"
        )));
    };

    let args = &items[1..];
    match head.as_str() {
        "get" => eval_get(args, store),
        "set" => eval_set(args, store),
        "list" => eval_list(args, store),
        "object" => eval_object(args, store),
        "do" => eval_do(args, store),
        "len" => eval_len(args, store),
        "sum" => eval_sum(args, store),
        "+" | "-" | "*" | "/" => eval_arith(head, args, store),
        other => Err(eval_error(&format!("unknown form '{other}'"))),
    }
}

fn eval_get(args: &[Expr], store: &mut FieldStore) -> Result<Value> {
    let [name] = args else {
        return Err(arity_error("get", 1, args.len()));
    };
    let name = field_name(name)?;
    store
        .get(name)
        .cloned()
        .ok_or_else(|| eval_error(&format!("field '{name}' not found")))
}

fn eval_set(args: &[Expr], store: &mut FieldStore) -> Result<Value> {
    let [name, expr] = args else {
        return Err(arity_error("set", 2, args.len()));
    };
    let name = field_name(name)?.to_string();
    let value = eval_expr(expr, store)?;
    store.set(name, value.clone());
    Ok(value)
}

fn eval_list(args: &[Expr], store: &mut FieldStore) -> Result<Value> {
    let mut items = Vec::with_capacity(args.len());
    for arg in args {
        items.push(eval_expr(arg, store)?);
    }
    Ok(Value::Array(items))
}

fn eval_object(args: &[Expr], store: &mut FieldStore) -> Result<Value> {
    if args.len() % 2 != 0 {
        return Err(eval_error("object expects :key value pairs"));
    }
    let mut map = serde_json::Map::with_capacity(args.len() / 2);
    for pair in args.chunks_exact(2) {
        let Expr::Keyword(key) = &pair[0] else {
            return Err(eval_error(&format!(
                "object keys must be keywords, found {:?}",
                pair[0]
            )));
        };
        let value = eval_expr(&pair[1], store)?;
        map.insert(key.clone(), value);
    }
    Ok(Value::Object(map))
}

fn eval_do(args: &[Expr], store: &mut FieldStore) -> Result<Value> {
    let mut last = Value::Null;
    for arg in args {
        last = eval_expr(arg, store)?;
    }
    Ok(last)
}

fn eval_len(args: &[Expr], store: &mut FieldStore) -> Result<Value> {
    let [expr] = args else {
        return Err(arity_error("len", 1, args.len()));
    };
    let value = eval_expr(expr, store)?;
    let len = match &value {
        Value::Array(items) => items.len(),
        Value::String(text) => text.chars().count(),
        other => {
            return Err(eval_error(&format!(
                "len expects an array or string, found {}",
                type_name(other)
            )));
        }
    };
    Ok(Value::from(len as i64))
}

fn eval_sum(args: &[Expr], store: &mut FieldStore) -> Result<Value> {
    let [expr] = args else {
        return Err(arity_error("sum", 1, args.len()));
    };
    let value = eval_expr(expr, store)?;
    let Value::Array(items) = &value else {
        return Err(eval_error(&format!(
            "sum expects an array, found {}",
            type_name(&value)
        )));
    };

    let mut total = Num::Int(0);
    for item in items {
        total = total.add(as_num(item)?)?;
    }
    total.into_value()
}

fn eval_arith(op: &str, args: &[Expr], store: &mut FieldStore) -> Result<Value> {
    match op {
        "+" | "*" => {
            let mut acc = if op == "+" { Num::Int(0) } else { Num::Int(1) };
            for arg in args {
                let operand = as_num(&eval_expr(arg, store)?)?;
                acc = match op {
                    "+" => acc.add(operand)?,
                    _ => acc.mul(operand)?,
                };
            }
            acc.into_value()
        }
        "-" | "/" => {
            let [lhs, rhs] = args else {
                return Err(arity_error(op, 2, args.len()));
            };
            let lhs = as_num(&eval_expr(lhs, store)?)?;
            let rhs = as_num(&eval_expr(rhs, store)?)?;
            let result = if op == "-" { lhs.sub(rhs)? } else { lhs.div(rhs)? };
            result.into_value()
        }
        _ => unreachable!("eval_form routes only arithmetic heads here"),
    }
}

fn field_name(expr: &Expr) -> Result<&str> {
    match expr {
        Expr::Symbol(sym) => Ok(sym),
        Expr::String(text) => Ok(text),
        other => Err(eval_error(&format!(
            "field name must be a symbol or string, found {other:?}"
        ))),
    }
}

/// Numeric tower: arithmetic stays integral until a float operand appears.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn add(self, other: Num) -> Result<Num> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_add(b)
                .map(Num::Int)
                .ok_or_else(|| eval_error("integer overflow in addition")),
            (a, b) => Ok(Num::Float(a.as_f64() + b.as_f64())),
        }
    }

    fn sub(self, other: Num) -> Result<Num> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_sub(b)
                .map(Num::Int)
                .ok_or_else(|| eval_error("integer overflow in subtraction")),
            (a, b) => Ok(Num::Float(a.as_f64() - b.as_f64())),
        }
    }

    fn mul(self, other: Num) -> Result<Num> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_mul(b)
                .map(Num::Int)
                .ok_or_else(|| eval_error("integer overflow in multiplication")),
            (a, b) => Ok(Num::Float(a.as_f64() * b.as_f64())),
        }
    }

    fn div(self, other: Num) -> Result<Num> {
        if other.is_zero() {
            return Err(eval_error("division by zero"));
        }
        match (self, other) {
            // integer division stays integral only when it is exact
            (Num::Int(a), Num::Int(b)) if a % b == 0 => Ok(Num::Int(a / b)),
            (a, b) => Ok(Num::Float(a.as_f64() / b.as_f64())),
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(n) => n == 0,
            Num::Float(f) => f == 0.0,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(f) => f,
        }
    }

    fn into_value(self) -> Result<Value> {
        match self {
            Num::Int(n) => Ok(Value::from(n)),
            Num::Float(f) => float_value(f),
        }
    }
}

fn as_num(value: &Value) -> Result<Num> {
    match value {
        Value::Number(num) => {
            if let Some(int) = num.as_i64() {
                Ok(Num::Int(int))
            } else if let Some(float) = num.as_f64() {
                Ok(Num::Float(float))
            } else {
                Err(eval_error(&format!("number out of range: {num}")))
            }
        }
        other => Err(eval_error(&format!(
            "expected a number, found {}",
            type_name(other)
        ))),
    }
}

fn float_value(f: f64) -> Result<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| eval_error("non-finite float result"))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn eval_error(message: &str) -> ScriptError {
    ScriptError::Eval(message.to_string())
}

fn arity_error(form: &str, expected: usize, found: usize) -> ScriptError {
    ScriptError::Eval(format!(
        "{form} expects {expected} argument{}, found {found}",
        if expected == 1 { "" } else { "s" }
    ))
}
