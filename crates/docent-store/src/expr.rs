//! Aggregation expressions and `$group` accumulators

use crate::value::{
    compare_values, get_path, is_integral, is_truthy, number_value, values_equal,
};
use crate::StoreError;
use docent_domain::Document;
use serde_json::Value;
use std::cmp::Ordering;

/// Evaluate an aggregation expression against a record
///
/// Field references (`"$firm"`) resolve to the field's value, `None` when
/// missing. Operator objects (`{"$toUpper": "$name"}`) are computed, plain
/// objects and arrays are evaluated member-wise, anything else is a literal.
pub(crate) fn evaluate(expr: &Value, doc: &Document) -> Result<Option<Value>, StoreError> {
    match expr {
        Value::String(s) if s == "$$ROOT" || s == "$$CURRENT" => {
            Ok(Some(Value::Object(doc.clone())))
        }
        Value::String(s) if s.starts_with("$$") => Err(StoreError::UnsupportedOperator(s.clone())),
        Value::String(s) if s.starts_with('$') => Ok(get_path(doc, &s[1..])),
        Value::Object(map) if map.len() == 1 && map.keys().all(|k| k.starts_with('$')) => {
            let (op, arg) = map.iter().next().ok_or_else(|| {
                StoreError::InvalidQuery("empty expression".into())
            })?;
            apply_operator(op, arg, doc).map(Some)
        }
        Value::Object(map) => {
            let mut out = Document::new();
            for (key, value) in map {
                if let Some(v) = evaluate(value, doc)? {
                    out.insert(key.clone(), v);
                }
            }
            Ok(Some(Value::Object(out)))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(evaluate(item, doc)?.unwrap_or(Value::Null));
            }
            Ok(Some(Value::Array(out)))
        }
        literal => Ok(Some(literal.clone())),
    }
}

fn eval_or_null(expr: &Value, doc: &Document) -> Result<Value, StoreError> {
    Ok(evaluate(expr, doc)?.unwrap_or(Value::Null))
}

/// Evaluate an operator's arguments, which may be a single expression or a list
fn eval_args(arg: &Value, doc: &Document) -> Result<Vec<Value>, StoreError> {
    match arg {
        Value::Array(items) => items.iter().map(|item| eval_or_null(item, doc)).collect(),
        single => Ok(vec![eval_or_null(single, doc)?]),
    }
}

fn exactly<const N: usize>(op: &str, args: Vec<Value>) -> Result<[Value; N], StoreError> {
    args.try_into().map_err(|args: Vec<Value>| {
        StoreError::InvalidQuery(format!("{} expects {} arguments, got {}", op, N, args.len()))
    })
}

fn apply_operator(op: &str, arg: &Value, doc: &Document) -> Result<Value, StoreError> {
    match op {
        "$literal" => Ok(arg.clone()),
        "$add" | "$multiply" => {
            let args = eval_args(arg, doc)?;
            if args.iter().any(Value::is_null) {
                return Ok(Value::Null);
            }
            let integral = args.iter().all(is_integral);
            let mut acc = if op == "$add" { 0.0 } else { 1.0 };
            for value in &args {
                let n = as_number(op, value)?;
                if op == "$add" {
                    acc += n;
                } else {
                    acc *= n;
                }
            }
            Ok(number_value(acc, integral))
        }
        "$subtract" | "$divide" | "$mod" => {
            let [left, right] = exactly::<2>(op, eval_args(arg, doc)?)?;
            if left.is_null() || right.is_null() {
                return Ok(Value::Null);
            }
            let (l, r) = (as_number(op, &left)?, as_number(op, &right)?);
            let integral = is_integral(&left) && is_integral(&right);
            match op {
                "$subtract" => Ok(number_value(l - r, integral)),
                _ if r == 0.0 => Err(StoreError::InvalidQuery(format!("{} by zero", op))),
                "$divide" => Ok(number_value(l / r, false)),
                _ => Ok(number_value(l % r, integral)),
            }
        }
        "$concat" => {
            let mut out = String::new();
            for value in eval_args(arg, doc)? {
                match value {
                    Value::Null => return Ok(Value::Null),
                    Value::String(s) => out.push_str(&s),
                    other => {
                        return Err(StoreError::InvalidQuery(format!(
                            "$concat only supports strings, got {}",
                            other
                        )))
                    }
                }
            }
            Ok(Value::String(out))
        }
        "$toLower" | "$toUpper" => {
            let [value] = exactly::<1>(op, eval_args(arg, doc)?)?;
            let text = match value {
                Value::Null => String::new(),
                Value::String(s) => s,
                other => other.to_string(),
            };
            Ok(Value::String(if op == "$toLower" {
                text.to_lowercase()
            } else {
                text.to_uppercase()
            }))
        }
        "$size" => {
            let [value] = exactly::<1>(op, eval_args(arg, doc)?)?;
            match value {
                Value::Array(items) => Ok(Value::from(items.len() as u64)),
                _ => Err(StoreError::InvalidQuery("$size argument must be an array".into())),
            }
        }
        "$ifNull" => {
            for value in eval_args(arg, doc)? {
                if !value.is_null() {
                    return Ok(value);
                }
            }
            Ok(Value::Null)
        }
        "$cond" => {
            let (condition, then, otherwise) = match arg {
                Value::Array(items) if items.len() == 3 => (&items[0], &items[1], &items[2]),
                Value::Object(map) => match (map.get("if"), map.get("then"), map.get("else")) {
                    (Some(i), Some(t), Some(e)) => (i, t, e),
                    _ => {
                        return Err(StoreError::InvalidQuery(
                            "$cond expects if, then and else".into(),
                        ))
                    }
                },
                _ => return Err(StoreError::InvalidQuery("malformed $cond".into())),
            };
            if is_truthy(&eval_or_null(condition, doc)?) {
                eval_or_null(then, doc)
            } else {
                eval_or_null(otherwise, doc)
            }
        }
        "$eq" | "$ne" | "$gt" | "$gte" | "$lt" | "$lte" => {
            let [left, right] = exactly::<2>(op, eval_args(arg, doc)?)?;
            let ord = compare_values(&left, &right);
            let result = match op {
                "$eq" => values_equal(&left, &right),
                "$ne" => !values_equal(&left, &right),
                "$gt" => ord == Ordering::Greater,
                "$gte" => ord != Ordering::Less,
                "$lt" => ord == Ordering::Less,
                _ => ord != Ordering::Greater,
            };
            Ok(Value::Bool(result))
        }
        "$and" => Ok(Value::Bool(eval_args(arg, doc)?.iter().all(is_truthy))),
        "$or" => Ok(Value::Bool(eval_args(arg, doc)?.iter().any(is_truthy))),
        "$not" => {
            let [value] = exactly::<1>(op, eval_args(arg, doc)?)?;
            Ok(Value::Bool(!is_truthy(&value)))
        }
        "$in" => {
            let [needle, haystack] = exactly::<2>(op, eval_args(arg, doc)?)?;
            match haystack {
                Value::Array(items) => Ok(Value::Bool(
                    items.iter().any(|item| values_equal(item, &needle)),
                )),
                _ => Err(StoreError::InvalidQuery("$in requires an array".into())),
            }
        }
        "$arrayElemAt" => {
            let [array, index] = exactly::<2>(op, eval_args(arg, doc)?)?;
            let (Value::Array(items), Some(index)) = (array, index.as_i64()) else {
                return Err(StoreError::InvalidQuery(
                    "$arrayElemAt expects an array and an integer".into(),
                ));
            };
            let position = if index < 0 {
                items.len().checked_sub(index.unsigned_abs() as usize)
            } else {
                Some(index as usize)
            };
            Ok(position
                .and_then(|p| items.get(p).cloned())
                .unwrap_or(Value::Null))
        }
        // $sum/$avg/$min/$max over an array argument inside $project
        "$sum" | "$avg" | "$min" | "$max" => {
            let values = match eval_args(arg, doc)? {
                args if args.len() == 1 => match args.into_iter().next() {
                    Some(Value::Array(items)) => items,
                    Some(single) => vec![single],
                    None => Vec::new(),
                },
                args => args,
            };
            let kind = AccumulatorKind::parse(op)?;
            let mut acc = Accumulator::new(kind);
            for value in values {
                acc.push(Some(value));
            }
            Ok(acc.finish())
        }
        other => Err(StoreError::UnsupportedOperator(other.to_string())),
    }
}

fn as_number(op: &str, value: &Value) -> Result<f64, StoreError> {
    value.as_f64().ok_or_else(|| {
        StoreError::InvalidQuery(format!("{} only supports numeric types, got {}", op, value))
    })
}

/// Kind of `$group` accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccumulatorKind {
    Sum,
    Avg,
    Min,
    Max,
    First,
    Last,
    Push,
    AddToSet,
    Count,
}

impl AccumulatorKind {
    pub(crate) fn parse(op: &str) -> Result<Self, StoreError> {
        Ok(match op {
            "$sum" => Self::Sum,
            "$avg" => Self::Avg,
            "$min" => Self::Min,
            "$max" => Self::Max,
            "$first" => Self::First,
            "$last" => Self::Last,
            "$push" => Self::Push,
            "$addToSet" => Self::AddToSet,
            "$count" => Self::Count,
            other => return Err(StoreError::UnsupportedOperator(other.to_string())),
        })
    }
}

/// Running state of one accumulator within one group
#[derive(Debug, Clone)]
pub(crate) struct Accumulator {
    kind: AccumulatorKind,
    sum: f64,
    integral: bool,
    numeric: usize,
    seen: usize,
    best: Option<Value>,
    items: Vec<Value>,
}

impl Accumulator {
    pub(crate) fn new(kind: AccumulatorKind) -> Self {
        Self {
            kind,
            sum: 0.0,
            integral: true,
            numeric: 0,
            seen: 0,
            best: None,
            items: Vec::new(),
        }
    }

    /// Feed one evaluated operand (`None` when the referenced field is missing)
    pub(crate) fn push(&mut self, value: Option<Value>) {
        self.seen += 1;
        match self.kind {
            AccumulatorKind::Count => {}
            AccumulatorKind::Sum | AccumulatorKind::Avg => {
                if let Some(n) = value.as_ref().and_then(Value::as_f64) {
                    self.sum += n;
                    self.numeric += 1;
                    self.integral &= value.as_ref().is_some_and(is_integral);
                }
            }
            AccumulatorKind::Min | AccumulatorKind::Max => {
                let Some(v) = value.filter(|v| !v.is_null()) else {
                    return;
                };
                let wanted = if self.kind == AccumulatorKind::Min {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let replace = match &self.best {
                    None => true,
                    Some(best) => compare_values(&v, best) == wanted,
                };
                if replace {
                    self.best = Some(v);
                }
            }
            AccumulatorKind::First => {
                if self.seen == 1 {
                    self.best = Some(value.unwrap_or(Value::Null));
                }
            }
            AccumulatorKind::Last => self.best = Some(value.unwrap_or(Value::Null)),
            AccumulatorKind::Push => {
                if let Some(v) = value {
                    self.items.push(v);
                }
            }
            AccumulatorKind::AddToSet => {
                if let Some(v) = value {
                    if !self.items.iter().any(|item| values_equal(item, &v)) {
                        self.items.push(v);
                    }
                }
            }
        }
    }

    pub(crate) fn finish(self) -> Value {
        match self.kind {
            AccumulatorKind::Count => Value::from(self.seen as u64),
            AccumulatorKind::Sum => number_value(self.sum, self.integral),
            AccumulatorKind::Avg if self.numeric == 0 => Value::Null,
            AccumulatorKind::Avg => number_value(self.sum / self.numeric as f64, false),
            AccumulatorKind::Min
            | AccumulatorKind::Max
            | AccumulatorKind::First
            | AccumulatorKind::Last => self.best.unwrap_or(Value::Null),
            AccumulatorKind::Push | AccumulatorKind::AddToSet => Value::Array(self.items),
        }
    }
}
