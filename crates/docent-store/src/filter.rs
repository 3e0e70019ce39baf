//! Query filter evaluation
//!
//! Supports the MongoDB query operators the translator is primed to emit:
//! comparison (`$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$nin`),
//! element (`$exists`), evaluation (`$regex` with `$options`), array
//! (`$all`, `$size`, `$elemMatch`) and logical (`$and`, `$or`, `$nor`,
//! `$not`) operators. Anything else is rejected rather than ignored.

use crate::value::{compare_values, lookup_path, same_type, values_equal};
use crate::StoreError;
use docent_domain::Document;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Ordering;

/// Test a record against a filter document
///
/// An empty filter matches every record.
pub fn matches(doc: &Document, filter: &Document) -> Result<bool, StoreError> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for sub in sub_filters(key, condition)? {
                    if !matches(doc, sub)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for sub in sub_filters(key, condition)? {
                    if matches(doc, sub)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$nor" => {
                let mut none = true;
                for sub in sub_filters(key, condition)? {
                    if matches(doc, sub)? {
                        none = false;
                        break;
                    }
                }
                none
            }
            op if op.starts_with('$') => {
                return Err(StoreError::UnsupportedOperator(op.to_string()));
            }
            path => field_matches(doc, path, condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sub_filters<'a>(op: &str, value: &'a Value) -> Result<Vec<&'a Document>, StoreError> {
    let items = value
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| StoreError::InvalidQuery(format!("{} expects a non-empty array", op)))?;
    items
        .iter()
        .map(|item| {
            item.as_object()
                .ok_or_else(|| StoreError::InvalidQuery(format!("{} entries must be objects", op)))
        })
        .collect()
}

fn is_operator_document(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn field_matches(doc: &Document, path: &str, condition: &Value) -> Result<bool, StoreError> {
    let candidates = lookup_path(doc, path);
    match condition {
        Value::Object(ops) if is_operator_document(condition) => {
            operators_match(&candidates, ops)
        }
        literal => Ok(equals_any(&candidates, literal)),
    }
}

/// Evaluate every operator in `ops` against the values found at a path
fn operators_match(candidates: &[&Value], ops: &Document) -> Result<bool, StoreError> {
    for (op, arg) in ops {
        let ok = match op.as_str() {
            "$eq" => equals_any(candidates, arg),
            "$ne" => !equals_any(candidates, arg),
            "$gt" => compares_any(candidates, arg, |o| o == Ordering::Greater),
            "$gte" => compares_any(candidates, arg, |o| o != Ordering::Less),
            "$lt" => compares_any(candidates, arg, |o| o == Ordering::Less),
            "$lte" => compares_any(candidates, arg, |o| o != Ordering::Greater),
            "$in" => {
                let options = expect_array(op, arg)?;
                options.iter().any(|option| in_option_matches(candidates, option))
            }
            "$nin" => {
                let options = expect_array(op, arg)?;
                !options.iter().any(|option| in_option_matches(candidates, option))
            }
            "$exists" => {
                let wanted = crate::value::is_truthy(arg);
                candidates.is_empty() != wanted
            }
            "$regex" => {
                let regex = build_regex(arg, ops.get("$options"))?;
                regex_matches_any(candidates, &regex)
            }
            // consumed by $regex
            "$options" => {
                if !ops.contains_key("$regex") {
                    return Err(StoreError::InvalidQuery("$options without $regex".into()));
                }
                true
            }
            "$not" => !not_operand_matches(candidates, arg)?,
            "$size" => {
                let size = arg.as_u64().ok_or_else(|| {
                    StoreError::InvalidQuery("$size expects a non-negative integer".into())
                })?;
                candidates
                    .iter()
                    .any(|v| v.as_array().is_some_and(|a| a.len() as u64 == size))
            }
            "$all" => {
                let required = expect_array(op, arg)?;
                candidates.iter().any(|v| match v {
                    Value::Array(items) => required
                        .iter()
                        .all(|r| items.iter().any(|item| values_equal(item, r))),
                    single => required.len() == 1 && values_equal(single, &required[0]),
                })
            }
            "$elemMatch" => {
                let sub = arg.as_object().ok_or_else(|| {
                    StoreError::InvalidQuery("$elemMatch expects an object".into())
                })?;
                elem_match_any(candidates, sub)?
            }
            other => return Err(StoreError::UnsupportedOperator(other.to_string())),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn expect_array<'a>(op: &str, arg: &'a Value) -> Result<&'a Vec<Value>, StoreError> {
    arg.as_array()
        .ok_or_else(|| StoreError::InvalidQuery(format!("{} expects an array", op)))
}

/// Equality as MongoDB applies it: a missing field equals `null`, and an
/// array field matches when it equals the literal or contains it.
fn equals_any(candidates: &[&Value], literal: &Value) -> bool {
    if candidates.is_empty() {
        return literal.is_null();
    }
    candidates.iter().any(|v| {
        values_equal(v, literal)
            || matches!(v, Value::Array(items) if items.iter().any(|item| values_equal(item, literal)))
    })
}

fn in_option_matches(candidates: &[&Value], option: &Value) -> bool {
    match option {
        Value::String(s) if s.starts_with('/') => match parse_regex_literal(s) {
            Some(regex) => regex_matches_any(candidates, &regex),
            None => equals_any(candidates, option),
        },
        _ => equals_any(candidates, option),
    }
}

fn compares_any(candidates: &[&Value], bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    let check = |v: &Value| same_type(v, bound) && accept(compare_values(v, bound));
    candidates.iter().any(|&v| match v {
        Value::Array(items) if !bound.is_array() => items.iter().any(&check),
        other => check(other),
    })
}

fn regex_matches_any(candidates: &[&Value], regex: &Regex) -> bool {
    let check = |v: &Value| v.as_str().is_some_and(|s| regex.is_match(s));
    candidates.iter().any(|&v| match v {
        Value::Array(items) => items.iter().any(&check),
        other => check(other),
    })
}

fn not_operand_matches(candidates: &[&Value], arg: &Value) -> Result<bool, StoreError> {
    match arg {
        Value::Object(ops) if is_operator_document(arg) => operators_match(candidates, ops),
        Value::String(s) => {
            let regex = parse_regex_literal(s).map_or_else(|| build_regex(arg, None), Ok)?;
            Ok(regex_matches_any(candidates, &regex))
        }
        _ => Err(StoreError::InvalidQuery(
            "$not expects an operator document or a regex".into(),
        )),
    }
}

fn elem_match_any(candidates: &[&Value], sub: &Document) -> Result<bool, StoreError> {
    let value_level = !sub.is_empty() && sub.keys().all(|k| k.starts_with('$'));
    for candidate in candidates {
        let Value::Array(items) = candidate else {
            continue;
        };
        for item in items {
            let hit = if value_level {
                operators_match(&[item], sub)?
            } else {
                match item {
                    Value::Object(inner) => matches(inner, sub)?,
                    _ => false,
                }
            };
            if hit {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Compile a `$regex` pattern with its `$options` flags
pub(crate) fn build_regex(pattern: &Value, options: Option<&Value>) -> Result<Regex, StoreError> {
    let pattern = pattern
        .as_str()
        .ok_or_else(|| StoreError::InvalidQuery("$regex expects a string".into()))?;
    let flags = match options {
        None => "",
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return Err(StoreError::InvalidQuery("$options expects a string".into())),
    };
    compile(pattern, flags)
}

/// Parse a `/pattern/flags` literal
fn parse_regex_literal(literal: &str) -> Option<Regex> {
    let body = literal.strip_prefix('/')?;
    let end = body.rfind('/')?;
    compile(&body[..end], &body[end + 1..]).ok()
}

fn compile(pattern: &str, flags: &str) -> Result<Regex, StoreError> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => {
                return Err(StoreError::InvalidQuery(format!(
                    "unsupported regex option '{}'",
                    other
                )))
            }
        };
    }
    builder
        .build()
        .map_err(|e| StoreError::InvalidQuery(format!("invalid regex '{}': {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn check(record: Value, filter: Value) -> bool {
        matches(&doc(record), &doc(filter)).unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(check(json!({"a": 1}), json!({})));
    }

    #[test]
    fn test_literal_equality() {
        assert!(check(json!({"firm": "FirmX"}), json!({"firm": "FirmX"})));
        assert!(!check(json!({"firm": "FirmY"}), json!({"firm": "FirmX"})));
        assert!(check(json!({"leaders": ["A", "B"]}), json!({"leaders": "B"})));
        assert!(check(json!({}), json!({"phone": null})));
    }

    #[test]
    fn test_case_insensitive_regex() {
        let record = json!({"position": "Founding Partner"});
        assert!(check(
            record.clone(),
            json!({"position": {"$regex": "founding partner", "$options": "i"}})
        ));
        assert!(!check(record, json!({"position": {"$regex": "founding partner"}})));
    }

    #[test]
    fn test_regex_on_array_elements() {
        let record = json!({"specializations": ["Tax Law", "Estate Planning"]});
        assert!(check(record, json!({"specializations": {"$regex": "estate", "$options": "i"}})));
    }

    #[test]
    fn test_comparisons_stay_within_type() {
        let record = json!({"experience": 5, "compensation": "100k"});
        assert!(check(record.clone(), json!({"experience": {"$gte": 5, "$lt": 10}})));
        assert!(!check(record.clone(), json!({"experience": {"$gt": "1"}})));
        assert!(check(record, json!({"compensation": {"$gt": "050k"}})));
    }

    #[test]
    fn test_in_and_nin() {
        let record = json!({"location": "Chicago"});
        assert!(check(record.clone(), json!({"location": {"$in": ["Boston", "Chicago"]}})));
        assert!(!check(record.clone(), json!({"location": {"$nin": ["Chicago"]}})));
        assert!(check(record, json!({"location": {"$in": ["/^chi/i"]}})));
    }

    #[test]
    fn test_exists() {
        let record = json!({"email": "a@b.c"});
        assert!(check(record.clone(), json!({"email": {"$exists": true}})));
        assert!(check(record, json!({"phone": {"$exists": false}})));
    }

    #[test]
    fn test_logical_operators() {
        let record = json!({"firm": "FirmA", "position": "Partner"});
        assert!(check(
            record.clone(),
            json!({"$or": [{"firm": "FirmB"}, {"position": "Partner"}]})
        ));
        assert!(!check(record.clone(), json!({"$and": [{"firm": "FirmA"}, {"position": "Associate"}]})));
        assert!(check(record.clone(), json!({"$nor": [{"firm": "FirmB"}]})));
        assert!(check(record, json!({"position": {"$not": {"$regex": "^Assoc"}}})));
    }

    #[test]
    fn test_nested_paths_and_elem_match() {
        let record = json!({"team members": [{"name": "A", "role": "Lead"}, {"name": "B", "role": "Member"}]});
        assert!(check(record.clone(), json!({"team members.name": "B"})));
        assert!(check(
            record.clone(),
            json!({"team members": {"$elemMatch": {"name": "A", "role": "Lead"}}})
        ));
        assert!(!check(
            record,
            json!({"team members": {"$elemMatch": {"name": "B", "role": "Lead"}}})
        ));
    }

    #[test]
    fn test_size_and_all() {
        let record = json!({"leaders": ["A", "B"]});
        assert!(check(record.clone(), json!({"leaders": {"$size": 2}})));
        assert!(check(record.clone(), json!({"leaders": {"$all": ["B", "A"]}})));
        assert!(!check(record, json!({"leaders": {"$all": ["C"]}})));
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let result = matches(&doc(json!({"a": 1})), &doc(json!({"a": {"$near": [0, 0]}})));
        assert!(matches!(result, Err(StoreError::UnsupportedOperator(op)) if op == "$near"));

        let result = matches(&doc(json!({"a": 1})), &doc(json!({"$where": "true"})));
        assert!(matches!(result, Err(StoreError::UnsupportedOperator(_))));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let result = matches(&doc(json!({"a": "x"})), &doc(json!({"a": {"$regex": "("}})));
        assert!(matches!(result, Err(StoreError::InvalidQuery(_))));
    }
}
