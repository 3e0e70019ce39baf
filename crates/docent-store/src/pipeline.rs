//! Aggregation pipeline evaluation for the in-memory store

use crate::expr::{evaluate, Accumulator, AccumulatorKind};
use crate::filter::matches;
use crate::projection::project_all;
use crate::value::{compare_values, get_path, remove_path, set_path, values_equal};
use crate::{MemoryStore, StoreError};
use docent_domain::{Document, Record};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Run `pipeline` over `records`, stage by stage
///
/// `store` is consulted by the cross-collection stages (`$lookup`,
/// `$unionWith`).
pub(crate) fn run(
    store: &MemoryStore,
    mut records: Vec<Record>,
    pipeline: &[Document],
) -> Result<Vec<Record>, StoreError> {
    for stage in pipeline {
        let (name, spec) = single_entry(stage)?;
        records = match name {
            "$match" => {
                let filter = as_document(name, spec)?;
                let mut kept = Vec::with_capacity(records.len());
                for record in records {
                    if matches(&record, filter)? {
                        kept.push(record);
                    }
                }
                kept
            }
            "$project" => project_all(records, as_document(name, spec)?)?,
            "$addFields" | "$set" => add_fields(records, as_document(name, spec)?)?,
            "$unset" => unset(records, spec)?,
            "$group" => group(records, as_document(name, spec)?)?,
            "$sort" => sort(records, as_document(name, spec)?)?,
            "$limit" => {
                let n = as_count(name, spec)?;
                records.truncate(n);
                records
            }
            "$skip" => {
                let n = as_count(name, spec)?;
                records.into_iter().skip(n).collect()
            }
            "$unwind" => unwind(records, spec)?,
            "$count" => count(records, spec)?,
            "$sortByCount" => sort_by_count(records, spec)?,
            "$replaceRoot" => {
                let new_root = as_document(name, spec)?
                    .get("newRoot")
                    .ok_or_else(|| StoreError::InvalidQuery("$replaceRoot requires newRoot".into()))?;
                replace_root(records, new_root)?
            }
            "$replaceWith" => replace_root(records, spec)?,
            "$lookup" => lookup(store, records, as_document(name, spec)?)?,
            "$unionWith" => union_with(store, records, spec)?,
            "$out" | "$merge" => return Err(StoreError::ReadOnly(name.to_string())),
            other => return Err(StoreError::UnsupportedOperator(other.to_string())),
        };
    }
    Ok(records)
}

fn single_entry(stage: &Document) -> Result<(&str, &Value), StoreError> {
    let mut entries = stage.iter();
    match (entries.next(), entries.next()) {
        (Some((name, spec)), None) => Ok((name.as_str(), spec)),
        _ => Err(StoreError::InvalidQuery(
            "each pipeline stage must have exactly one field".into(),
        )),
    }
}

fn as_document<'a>(stage: &str, spec: &'a Value) -> Result<&'a Document, StoreError> {
    spec.as_object()
        .ok_or_else(|| StoreError::InvalidQuery(format!("{} expects an object", stage)))
}

fn as_count(stage: &str, spec: &Value) -> Result<usize, StoreError> {
    spec.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| StoreError::InvalidQuery(format!("{} expects a non-negative integer", stage)))
}

fn field_ref<'a>(stage: &str, spec: &'a Value) -> Result<&'a str, StoreError> {
    spec.as_str()
        .and_then(|s| s.strip_prefix('$'))
        .ok_or_else(|| StoreError::InvalidQuery(format!("{} expects a '$field' path", stage)))
}

fn add_fields(records: Vec<Record>, spec: &Document) -> Result<Vec<Record>, StoreError> {
    records
        .into_iter()
        .map(|mut record| -> Result<Record, StoreError> {
            let mut computed = Vec::with_capacity(spec.len());
            for (path, expr) in spec {
                computed.push((path, evaluate(expr, &record)?));
            }
            for (path, value) in computed {
                match value {
                    Some(v) => set_path(&mut record, path, v),
                    None => remove_path(&mut record, path),
                }
            }
            Ok(record)
        })
        .collect()
}

fn unset(records: Vec<Record>, spec: &Value) -> Result<Vec<Record>, StoreError> {
    let paths: Vec<&str> = match spec {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| StoreError::InvalidQuery("$unset expects field names".into()))
            })
            .collect::<Result<_, _>>()?,
        _ => return Err(StoreError::InvalidQuery("$unset expects field names".into())),
    };
    Ok(records
        .into_iter()
        .map(|mut record| {
            for path in &paths {
                remove_path(&mut record, path);
            }
            record
        })
        .collect())
}

fn group(records: Vec<Record>, spec: &Document) -> Result<Vec<Record>, StoreError> {
    let id_expr = spec
        .get("_id")
        .ok_or_else(|| StoreError::InvalidQuery("$group requires an _id".into()))?;

    let mut fields = Vec::new();
    for (name, acc_spec) in spec.iter().filter(|(k, _)| k.as_str() != "_id") {
        let (op, operand) = acc_spec
            .as_object()
            .filter(|m| m.len() == 1)
            .and_then(|m| m.iter().next())
            .ok_or_else(|| {
                StoreError::InvalidQuery(format!("$group field '{}' must be an accumulator", name))
            })?;
        fields.push((name.clone(), AccumulatorKind::parse(op)?, operand));
    }

    // groups keep first-seen order
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Value, Vec<Accumulator>)> = Vec::new();

    for record in &records {
        let key = evaluate(id_expr, record)?.unwrap_or(Value::Null);
        let slot = *index.entry(key.to_string()).or_insert_with(|| {
            groups.push((
                key.clone(),
                fields.iter().map(|(_, kind, _)| Accumulator::new(*kind)).collect(),
            ));
            groups.len() - 1
        });
        for (acc, (_, _, operand)) in groups[slot].1.iter_mut().zip(&fields) {
            acc.push(evaluate(operand, record)?);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, accs)| {
            let mut out = Document::new();
            out.insert("_id".to_string(), key);
            for (acc, (name, _, _)) in accs.into_iter().zip(&fields) {
                out.insert(name.clone(), acc.finish());
            }
            out
        })
        .collect())
}

fn sort(mut records: Vec<Record>, spec: &Document) -> Result<Vec<Record>, StoreError> {
    let mut keys = Vec::with_capacity(spec.len());
    for (path, direction) in spec {
        let descending = match direction.as_i64() {
            Some(1) => false,
            Some(-1) => true,
            _ => {
                return Err(StoreError::InvalidQuery(format!(
                    "$sort direction for '{}' must be 1 or -1",
                    path
                )))
            }
        };
        keys.push((path.as_str(), descending));
    }
    if keys.is_empty() {
        return Err(StoreError::InvalidQuery("$sort needs at least one key".into()));
    }

    // sort_by is stable, so ties keep their input order
    records.sort_by(|a, b| {
        for (path, descending) in &keys {
            let left = get_path(a, path).unwrap_or(Value::Null);
            let right = get_path(b, path).unwrap_or(Value::Null);
            let ord = compare_values(&left, &right);
            let ord = if *descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(records)
}

fn unwind(records: Vec<Record>, spec: &Value) -> Result<Vec<Record>, StoreError> {
    let (path, preserve) = match spec {
        Value::String(_) => (field_ref("$unwind", spec)?, false),
        Value::Object(options) => {
            let path = options
                .get("path")
                .ok_or_else(|| StoreError::InvalidQuery("$unwind requires a path".into()))?;
            let preserve = options
                .get("preserveNullAndEmptyArrays")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            (field_ref("$unwind", path)?, preserve)
        }
        _ => return Err(StoreError::InvalidQuery("$unwind expects a path".into())),
    };

    let mut out = Vec::new();
    for record in records {
        match get_path(&record, path) {
            Some(Value::Array(items)) if !items.is_empty() => {
                for item in items {
                    let mut copy = record.clone();
                    set_path(&mut copy, path, item);
                    out.push(copy);
                }
            }
            Some(Value::Array(_)) | Some(Value::Null) | None => {
                if preserve {
                    out.push(record);
                }
            }
            Some(_) => out.push(record),
        }
    }
    Ok(out)
}

fn count(records: Vec<Record>, spec: &Value) -> Result<Vec<Record>, StoreError> {
    let name = spec
        .as_str()
        .filter(|s| !s.is_empty() && !s.starts_with('$') && !s.contains('.'))
        .ok_or_else(|| StoreError::InvalidQuery("$count expects a plain field name".into()))?;
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Document::new();
    out.insert(name.to_string(), Value::from(records.len() as u64));
    Ok(vec![out])
}

fn sort_by_count(records: Vec<Record>, spec: &Value) -> Result<Vec<Record>, StoreError> {
    let mut group_spec = Document::new();
    group_spec.insert("_id".to_string(), spec.clone());
    group_spec.insert("count".to_string(), serde_json::json!({"$sum": 1}));
    let grouped = group(records, &group_spec)?;

    let mut sort_spec = Document::new();
    sort_spec.insert("count".to_string(), Value::from(-1));
    sort(grouped, &sort_spec)
}

fn replace_root(records: Vec<Record>, new_root: &Value) -> Result<Vec<Record>, StoreError> {
    records
        .iter()
        .map(|record| -> Result<Record, StoreError> {
            match evaluate(new_root, record)? {
                Some(Value::Object(doc)) => Ok(doc),
                _ => Err(StoreError::InvalidQuery(
                    "replacement root must evaluate to an object".into(),
                )),
            }
        })
        .collect()
}

fn lookup(
    store: &MemoryStore,
    records: Vec<Record>,
    spec: &Document,
) -> Result<Vec<Record>, StoreError> {
    let text = |key: &str| {
        spec.get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::InvalidQuery(format!("$lookup requires '{}'", key)))
    };
    let from = text("from")?;
    let local_field = text("localField")?;
    let foreign_field = text("foreignField")?;
    let alias = text("as")?;

    let foreign = store.records(from)?;
    records
        .into_iter()
        .map(|mut record| {
            let local = get_path(&record, local_field).unwrap_or(Value::Null);
            let local_values: Vec<&Value> = match &local {
                Value::Array(items) => items.iter().collect(),
                single => vec![single],
            };
            let joined: Vec<Value> = foreign
                .iter()
                .filter(|other| {
                    let theirs = get_path(other, foreign_field).unwrap_or(Value::Null);
                    local_values.iter().any(|mine| match &theirs {
                        Value::Array(items) => items.iter().any(|t| values_equal(t, mine)),
                        single => values_equal(single, mine),
                    })
                })
                .map(|other| Value::Object(other.clone()))
                .collect();
            set_path(&mut record, alias, Value::Array(joined));
            Ok(record)
        })
        .collect()
}

fn union_with(
    store: &MemoryStore,
    mut records: Vec<Record>,
    spec: &Value,
) -> Result<Vec<Record>, StoreError> {
    let (collection, pipeline) = match spec {
        Value::String(name) => (name.as_str(), Vec::new()),
        Value::Object(options) => {
            let name = options
                .get("coll")
                .and_then(Value::as_str)
                .ok_or_else(|| StoreError::InvalidQuery("$unionWith requires 'coll'".into()))?;
            let stages = match options.get("pipeline") {
                None => Vec::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|s| {
                        s.as_object().cloned().ok_or_else(|| {
                            StoreError::InvalidQuery("pipeline stages must be objects".into())
                        })
                    })
                    .collect::<Result<_, _>>()?,
                Some(_) => {
                    return Err(StoreError::InvalidQuery(
                        "$unionWith pipeline must be an array".into(),
                    ))
                }
            };
            (name, stages)
        }
        _ => return Err(StoreError::InvalidQuery("$unionWith expects a collection".into())),
    };

    let other = store.records(collection)?.to_vec();
    records.extend(run(store, other, &pipeline)?);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::from_value(json!({
            "teams": [
                {"_id": 1, "name": "Ann", "firm": "FirmA", "education": ["JD", "BA"]},
                {"_id": 2, "name": "Bob", "firm": "FirmA", "education": []},
                {"_id": 3, "name": "Cy", "firm": "FirmB"}
            ],
            "practices": [
                {"_id": 10, "title": "Tax", "firm": "FirmA", "leaders": ["Ann"]}
            ]
        }))
        .unwrap()
    }

    fn aggregate(pipeline: Value) -> Result<Vec<Value>, StoreError> {
        let store = store();
        let stages: Vec<Document> = pipeline
            .as_array()
            .unwrap()
            .iter()
            .map(|s| doc(s.clone()))
            .collect();
        let records = store.records("teams")?.to_vec();
        Ok(run(&store, records, &stages)?
            .into_iter()
            .map(Value::Object)
            .collect())
    }

    #[test]
    fn test_group_count_per_firm() {
        let rows = aggregate(json!([
            {"$group": {"_id": "$firm", "total_members": {"$sum": 1}}}
        ]))
        .unwrap();
        assert_eq!(
            rows,
            vec![
                json!({"_id": "FirmA", "total_members": 2}),
                json!({"_id": "FirmB", "total_members": 1}),
            ]
        );
    }

    #[test]
    fn test_match_sort_limit_project() {
        let rows = aggregate(json!([
            {"$match": {"firm": "FirmA"}},
            {"$sort": {"name": -1}},
            {"$limit": 1},
            {"$project": {"_id": 0, "name": 1}}
        ]))
        .unwrap();
        assert_eq!(rows, vec![json!({"name": "Bob"})]);
    }

    #[test]
    fn test_unwind_drops_empty_unless_preserved() {
        let rows = aggregate(json!([{"$unwind": "$education"}])).unwrap();
        assert_eq!(rows.len(), 2);

        let rows = aggregate(json!([
            {"$unwind": {"path": "$education", "preserveNullAndEmptyArrays": true}}
        ]))
        .unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_count_stage() {
        let rows = aggregate(json!([{"$match": {"firm": "FirmB"}}, {"$count": "n"}])).unwrap();
        assert_eq!(rows, vec![json!({"n": 1})]);

        let rows = aggregate(json!([{"$match": {"firm": "None"}}, {"$count": "n"}])).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_sort_by_count() {
        let rows = aggregate(json!([{"$sortByCount": "$firm"}])).unwrap();
        assert_eq!(rows[0], json!({"_id": "FirmA", "count": 2}));
    }

    #[test]
    fn test_add_fields_and_unset() {
        let rows = aggregate(json!([
            {"$match": {"_id": 1}},
            {"$addFields": {"degrees": {"$size": "$education"}}},
            {"$unset": ["education", "_id"]}
        ]))
        .unwrap();
        assert_eq!(rows, vec![json!({"name": "Ann", "firm": "FirmA", "degrees": 2})]);
    }

    #[test]
    fn test_lookup_joins_on_array_field() {
        let rows = aggregate(json!([
            {"$match": {"name": "Ann"}},
            {"$lookup": {"from": "practices", "localField": "name", "foreignField": "leaders", "as": "leads"}},
            {"$project": {"_id": 0, "practice": {"$arrayElemAt": ["$leads.title", 0]}}}
        ]))
        .unwrap();
        assert_eq!(rows, vec![json!({"practice": "Tax"})]);
    }

    #[test]
    fn test_union_with() {
        let rows = aggregate(json!([
            {"$project": {"_id": 0, "firm": 1}},
            {"$unionWith": {"coll": "practices", "pipeline": [{"$project": {"_id": 0, "firm": 1}}]}}
        ]))
        .unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_write_stages_rejected() {
        let result = aggregate(json!([{"$out": "stolen"}]));
        assert!(matches!(result, Err(StoreError::ReadOnly(stage)) if stage == "$out"));
    }

    #[test]
    fn test_unknown_stage_rejected() {
        let result = aggregate(json!([{"$facet": {}}]));
        assert!(matches!(result, Err(StoreError::UnsupportedOperator(_))));
    }

    #[test]
    fn test_malformed_stage_rejected() {
        let result = aggregate(json!([{"$match": {}, "$limit": 1}]));
        assert!(matches!(result, Err(StoreError::InvalidQuery(_))));
    }
}
