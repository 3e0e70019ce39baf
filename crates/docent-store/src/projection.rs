//! Projection of records, shared by `find` and `$project`

use crate::expr::evaluate;
use crate::value::{get_path, is_truthy, remove_path, set_path};
use crate::StoreError;
use docent_domain::{Document, Record};
use serde_json::Value;

/// A parsed projection document
#[derive(Debug, Clone)]
pub(crate) enum Projection<'a> {
    /// Keep only the listed paths (plus `_id` unless excluded) and computed fields
    Include {
        paths: Vec<&'a str>,
        computed: Vec<(&'a str, &'a Value)>,
        keep_id: bool,
    },
    /// Drop the listed paths
    Exclude { paths: Vec<&'a str> },
}

impl<'a> Projection<'a> {
    /// Parse a projection, rejecting mixed inclusion and exclusion
    ///
    /// `_id` may be excluded from an inclusion projection; any other mix is
    /// an error, as in MongoDB.
    pub(crate) fn parse(spec: &'a Document) -> Result<Self, StoreError> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        let mut computed = Vec::new();
        let mut keep_id = true;

        for (path, flag) in spec {
            match flag {
                Value::Bool(_) | Value::Number(_) => {
                    let on = is_truthy(flag);
                    if path == "_id" {
                        keep_id = on;
                    } else if on {
                        include.push(path.as_str());
                    } else {
                        exclude.push(path.as_str());
                    }
                }
                expr => computed.push((path.as_str(), expr)),
            }
        }

        let inclusive = !include.is_empty() || !computed.is_empty();
        if inclusive && !exclude.is_empty() {
            return Err(StoreError::InvalidQuery(
                "projection cannot mix inclusion and exclusion".into(),
            ));
        }

        if inclusive {
            Ok(Projection::Include {
                paths: include,
                computed,
                keep_id,
            })
        } else {
            if !keep_id {
                exclude.push("_id");
            }
            Ok(Projection::Exclude { paths: exclude })
        }
    }

    /// Apply the projection to one record
    pub(crate) fn apply(&self, record: &Record) -> Result<Record, StoreError> {
        match self {
            Projection::Include {
                paths,
                computed,
                keep_id,
            } => {
                let mut out = Document::new();
                if *keep_id {
                    if let Some(id) = record.get("_id") {
                        out.insert("_id".to_string(), id.clone());
                    }
                }
                for path in paths {
                    if let Some(value) = get_path(record, path) {
                        set_path(&mut out, path, value);
                    }
                }
                for (path, expr) in computed {
                    if let Some(value) = evaluate(expr, record)? {
                        set_path(&mut out, path, value);
                    }
                }
                Ok(out)
            }
            Projection::Exclude { paths } => {
                let mut out = record.clone();
                for path in paths {
                    remove_path(&mut out, path);
                }
                Ok(out)
            }
        }
    }
}

/// Project every record
pub(crate) fn project_all(records: Vec<Record>, spec: &Document) -> Result<Vec<Record>, StoreError> {
    let projection = Projection::parse(spec)?;
    records.iter().map(|r| projection.apply(r)).collect()
}
