//! Descriptor validation logic

use crate::{ContractViolation, GuardConfig};
use docent_domain::{CollectionSchema, Document, QueryDescriptor, QueryPlan, SchemaContract};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Result of checking one descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct GuardReport {
    /// Whether the descriptor may be executed
    pub status: GuardStatus,

    /// Every violation found, in discovery order
    pub violations: Vec<ContractViolation>,
}

/// Guard verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStatus {
    /// Descriptor stays inside the contract
    Accepted,

    /// Descriptor must not reach the store
    Rejected,
}

/// The Contract Guard checks descriptors before execution
#[derive(Debug, Clone)]
pub struct ContractGuard {
    contract: &'static SchemaContract,
    config: GuardConfig,
}

impl ContractGuard {
    /// Create a guard over a contract
    pub fn new(contract: &'static SchemaContract, config: GuardConfig) -> Self {
        Self { contract, config }
    }

    /// Guard over the standard contract with default rules
    pub fn standard() -> Self {
        Self::new(SchemaContract::standard(), GuardConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// The contract being enforced
    pub fn contract(&self) -> &'static SchemaContract {
        self.contract
    }

    /// Check a descriptor, stopping at the first violation
    ///
    /// Only the parts of the descriptor that will actually run are checked:
    /// when a pipeline is present, the filter and projection are ignored.
    pub fn check(&self, descriptor: &QueryDescriptor) -> Result<(), ContractViolation> {
        match self.inspect(descriptor).violations.into_iter().next() {
            None => Ok(()),
            Some(violation) => {
                warn!(
                    collection = %descriptor.collection,
                    "Descriptor rejected: {}", violation
                );
                Err(violation)
            }
        }
    }

    /// Check a descriptor and report every violation
    pub fn inspect(&self, descriptor: &QueryDescriptor) -> GuardReport {
        let mut checker = Checker {
            guard: self,
            violations: Vec::new(),
        };

        match self.contract.collection(&descriptor.collection) {
            None => checker.violations.push(ContractViolation::UnknownCollection {
                collection: descriptor.collection.clone(),
            }),
            Some(schema) => {
                let scope = Scope::of(schema);
                match descriptor.plan() {
                    QueryPlan::Aggregate { pipeline } => {
                        checker.check_pipeline(scope, pipeline);
                    }
                    QueryPlan::ProjectedFind {
                        filter, projection, ..
                    } => {
                        checker.check_filter(&scope, filter);
                        checker.check_projection(&scope, projection);
                    }
                    QueryPlan::Find { filter, .. } => checker.check_filter(&scope, filter),
                }
            }
        }

        let status = if checker.violations.is_empty() {
            GuardStatus::Accepted
        } else {
            GuardStatus::Rejected
        };
        debug!(
            collection = %descriptor.collection,
            violations = checker.violations.len(),
            "Contract check finished"
        );

        GuardReport {
            status,
            violations: checker.violations,
        }
    }
}

/// Fields visible at some point of a query
#[derive(Debug, Clone)]
struct Scope {
    collection: &'static str,
    /// `None` once a stage reshapes records beyond tracking
    fields: Option<BTreeSet<String>>,
}

impl Scope {
    fn of(schema: &'static CollectionSchema) -> Self {
        Self {
            collection: schema.name,
            fields: Some(schema.fields.iter().map(|f| f.to_string()).collect()),
        }
    }

    fn with_fields<I: IntoIterator<Item = String>>(&self, fields: I) -> Self {
        Self {
            collection: self.collection,
            fields: Some(fields.into_iter().collect()),
        }
    }

    fn untracked(&self) -> Self {
        Self {
            collection: self.collection,
            fields: None,
        }
    }
}

fn root(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

struct Checker<'g> {
    guard: &'g ContractGuard,
    violations: Vec<ContractViolation>,
}

impl Checker<'_> {
    fn check_field(&mut self, scope: &Scope, path: &str) {
        if !self.guard.config.check_fields {
            return;
        }
        if let Some(fields) = &scope.fields {
            if !fields.contains(root(path)) {
                self.violations.push(ContractViolation::UnknownField {
                    collection: scope.collection.to_string(),
                    field: path.to_string(),
                });
            }
        }
    }

    fn check_filter(&mut self, scope: &Scope, filter: &Document) {
        for (key, condition) in filter {
            match key.as_str() {
                "$and" | "$or" | "$nor" => {
                    for sub in condition.as_array().into_iter().flatten() {
                        if let Value::Object(sub) = sub {
                            self.check_filter(scope, sub);
                        }
                    }
                }
                "$expr" => self.check_expression(scope, condition),
                // $text, $comment and friends name no fields
                op if op.starts_with('$') => {}
                path => self.check_field(scope, path),
            }
        }
    }

    /// Check `$field` references inside an aggregation expression
    fn check_expression(&mut self, scope: &Scope, expr: &Value) {
        match expr {
            Value::String(s) if s.starts_with("$$") => {}
            Value::String(s) if s.starts_with('$') => self.check_field(scope, &s[1..]),
            Value::Object(map) => {
                for (key, value) in map {
                    if key != "$literal" {
                        self.check_expression(scope, value);
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.check_expression(scope, item);
                }
            }
            _ => {}
        }
    }

    /// Check a projection and return the fields it leaves visible
    fn check_projection(&mut self, scope: &Scope, projection: &Document) -> Scope {
        let mut included = BTreeSet::new();
        let mut excluded = BTreeSet::new();
        let mut keep_id = true;

        for (path, flag) in projection {
            match flag {
                Value::Bool(_) | Value::Number(_) => {
                    let on = flag.as_bool().unwrap_or_else(|| flag.as_f64() != Some(0.0));
                    if path == "_id" {
                        keep_id = on;
                        continue;
                    }
                    self.check_field(scope, path);
                    if on {
                        included.insert(root(path).to_string());
                    } else {
                        excluded.insert(root(path).to_string());
                    }
                }
                expr => {
                    self.check_expression(scope, expr);
                    included.insert(root(path).to_string());
                }
            }
        }

        if included.is_empty() {
            if !keep_id {
                excluded.insert("_id".to_string());
            }
            match &scope.fields {
                Some(fields) => scope.with_fields(fields.difference(&excluded).cloned()),
                None => scope.untracked(),
            }
        } else {
            if keep_id {
                included.insert("_id".to_string());
            }
            scope.with_fields(included)
        }
    }

    /// Check a contract collection reached from inside a pipeline
    fn check_foreign(&mut self, stage: &str, collection: &str) -> Option<&'static CollectionSchema> {
        let schema = self.guard.contract.collection(collection);
        if schema.is_none() || !self.guard.config.allow_cross_collection {
            self.violations.push(ContractViolation::ForeignCollection {
                stage: stage.to_string(),
                collection: collection.to_string(),
            });
            return None;
        }
        schema
    }

    fn malformed(&mut self, message: impl Into<String>) {
        self.violations
            .push(ContractViolation::MalformedStage(message.into()));
    }

    /// Check a pipeline stage by stage, returning the final scope
    fn check_pipeline(&mut self, mut scope: Scope, pipeline: &[Document]) -> Scope {
        if let Some(limit) = self.guard.config.max_pipeline_stages {
            if pipeline.len() > limit {
                self.violations.push(ContractViolation::PipelineTooLong {
                    stages: pipeline.len(),
                    limit,
                });
            }
        }

        for stage in pipeline {
            let mut entries = stage.iter();
            let (name, spec) = match (entries.next(), entries.next()) {
                (Some((name, spec)), None) => (name.as_str(), spec),
                _ => {
                    self.malformed("each stage must have exactly one field");
                    continue;
                }
            };
            scope = self.check_stage(scope, name, spec);
        }
        scope
    }

    fn check_stage(&mut self, scope: Scope, name: &str, spec: &Value) -> Scope {
        match (name, spec) {
            ("$out" | "$merge", _) => {
                self.violations.push(ContractViolation::WriteStage {
                    stage: name.to_string(),
                });
                scope
            }
            ("$match", Value::Object(filter)) => {
                self.check_filter(&scope, filter);
                scope
            }
            ("$project", Value::Object(projection)) => self.check_projection(&scope, projection),
            ("$group", Value::Object(group)) => {
                let mut produced = vec!["_id".to_string()];
                for (field, expr) in group {
                    self.check_expression(&scope, expr);
                    if field != "_id" {
                        produced.push(field.clone());
                    }
                }
                scope.with_fields(produced)
            }
            ("$addFields" | "$set", Value::Object(fields)) => {
                for expr in fields.values() {
                    self.check_expression(&scope, expr);
                }
                match &scope.fields {
                    Some(existing) => scope.with_fields(
                        existing
                            .iter()
                            .cloned()
                            .chain(fields.keys().map(|k| root(k).to_string())),
                    ),
                    None => scope,
                }
            }
            ("$unset", names) => {
                let removed: BTreeSet<&str> = match names {
                    Value::String(s) => [s.as_str()].into_iter().collect(),
                    Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                    _ => BTreeSet::new(),
                };
                match &scope.fields {
                    Some(existing) => scope.with_fields(
                        existing
                            .iter()
                            .filter(|f| !removed.contains(f.as_str()))
                            .cloned(),
                    ),
                    None => scope,
                }
            }
            ("$sort", Value::Object(keys)) => {
                for path in keys.keys() {
                    self.check_field(&scope, path);
                }
                scope
            }
            ("$unwind", Value::String(_)) => {
                self.check_expression(&scope, spec);
                scope
            }
            ("$unwind", Value::Object(options)) => {
                if let Some(path) = options.get("path") {
                    self.check_expression(&scope, path);
                }
                match (&scope.fields, options.get("includeArrayIndex").and_then(Value::as_str)) {
                    (Some(existing), Some(index)) => scope.with_fields(
                        existing.iter().cloned().chain([index.to_string()]),
                    ),
                    _ => scope,
                }
            }
            ("$count", Value::String(field)) => scope.with_fields([field.clone()]),
            ("$sortByCount", expr) => {
                self.check_expression(&scope, expr);
                scope.with_fields(["_id".to_string(), "count".to_string()])
            }
            ("$limit" | "$skip" | "$sample", _) => scope,
            ("$lookup", Value::Object(options)) => self.check_lookup(scope, name, options),
            ("$graphLookup", Value::Object(options)) => self.check_lookup(scope, name, options),
            ("$unionWith", _) => self.check_union(scope, spec),
            ("$replaceRoot", Value::Object(options)) => match options.get("newRoot") {
                Some(new_root) => self.check_new_root(scope, new_root),
                None => {
                    self.malformed("$replaceRoot requires 'newRoot'");
                    scope
                }
            },
            ("$replaceWith", new_root) => self.check_new_root(scope, new_root),
            ("$facet", Value::Object(facets)) => self.check_facet(scope, facets),
            ("$bucket" | "$bucketAuto", Value::Object(options)) => {
                self.check_bucket(scope, name, options)
            }
            ("$match" | "$project" | "$group" | "$addFields" | "$set" | "$sort" | "$count"
            | "$lookup" | "$graphLookup" | "$replaceRoot" | "$facet" | "$bucket"
            | "$bucketAuto", _) => {
                self.malformed(format!("{} has the wrong argument type", name));
                scope
            }
            _ => {
                self.violations.push(ContractViolation::UnsupportedStage {
                    stage: name.to_string(),
                });
                scope
            }
        }
    }

    /// A literal document gives the new field set; anything else is untracked
    fn check_new_root(&mut self, scope: Scope, new_root: &Value) -> Scope {
        self.check_expression(&scope, new_root);
        match new_root {
            Value::Object(fields) if !fields.keys().any(|k| k.starts_with('$')) => {
                scope.with_fields(fields.keys().map(|k| root(k).to_string()))
            }
            _ => scope.untracked(),
        }
    }

    /// Each facet is a full pipeline over the incoming records
    fn check_facet(&mut self, scope: Scope, facets: &Document) -> Scope {
        for (facet, pipeline) in facets {
            let Some(items) = pipeline.as_array() else {
                self.malformed(format!("$facet '{}' must be a pipeline", facet));
                continue;
            };
            let stages: Vec<Document> = items.iter().filter_map(|s| s.as_object().cloned()).collect();
            if stages.len() != items.len() {
                self.malformed(format!("$facet '{}' has a stage that is not a document", facet));
            }
            self.check_pipeline(scope.clone(), &stages);
        }
        scope.with_fields(facets.keys().cloned())
    }

    fn check_bucket(&mut self, scope: Scope, stage: &str, options: &Document) -> Scope {
        match options.get("groupBy") {
            Some(group_by) => self.check_expression(&scope, group_by),
            None => self.malformed(format!("{} requires 'groupBy'", stage)),
        }

        let mut produced = vec!["_id".to_string()];
        match options.get("output") {
            Some(Value::Object(output)) => {
                for (field, accumulator) in output {
                    self.check_expression(&scope, accumulator);
                    produced.push(root(field).to_string());
                }
            }
            Some(_) => self.malformed(format!("{} 'output' must be a document", stage)),
            None => produced.push("count".to_string()),
        }
        scope.with_fields(produced)
    }

    fn check_lookup(&mut self, scope: Scope, stage: &str, options: &Document) -> Scope {
        let Some(from) = options.get("from").and_then(Value::as_str) else {
            self.malformed(format!("{} requires 'from'", stage));
            return scope;
        };
        let foreign = self.check_foreign(stage, from);

        let (local_key, foreign_key) = if stage == "$graphLookup" {
            ("connectFromField", "connectToField")
        } else {
            ("localField", "foreignField")
        };
        if let Some(local) = options.get(local_key).and_then(Value::as_str) {
            if stage == "$lookup" {
                self.check_field(&scope, local);
            }
        }
        if let Some(start) = options.get("startWith") {
            self.check_expression(&scope, start);
        }
        if let Some(vars) = options.get("let") {
            self.check_expression(&scope, vars);
        }
        if let (Some(schema), Some(field)) = (foreign, options.get(foreign_key).and_then(Value::as_str)) {
            self.check_field(&Scope::of(schema), field);
        }
        if let (Some(schema), Some(Value::Array(stages))) = (foreign, options.get("pipeline")) {
            let stages: Vec<Document> = stages.iter().filter_map(|s| s.as_object().cloned()).collect();
            self.check_pipeline(Scope::of(schema), &stages);
        }

        match (&scope.fields, options.get("as").and_then(Value::as_str)) {
            (Some(existing), Some(alias)) => {
                scope.with_fields(existing.iter().cloned().chain([root(alias).to_string()]))
            }
            (None, _) => scope,
            (Some(_), None) => {
                self.malformed(format!("{} requires 'as'", stage));
                scope
            }
        }
    }

    fn check_union(&mut self, scope: Scope, spec: &Value) -> Scope {
        let (collection, stages): (&str, Vec<Document>) = match spec {
            Value::String(name) => (name.as_str(), Vec::new()),
            Value::Object(options) => match options.get("coll").and_then(Value::as_str) {
                Some(name) => (
                    name,
                    options
                        .get("pipeline")
                        .and_then(Value::as_array)
                        .map(|items| items.iter().filter_map(|s| s.as_object().cloned()).collect())
                        .unwrap_or_default(),
                ),
                None => {
                    self.malformed("$unionWith requires 'coll'");
                    return scope;
                }
            },
            _ => {
                self.malformed("$unionWith expects a collection");
                return scope;
            }
        };

        let Some(schema) = self.check_foreign("$unionWith", collection) else {
            return scope;
        };
        let other = self.check_pipeline(Scope::of(schema), &stages);
        match (&scope.fields, other.fields) {
            (Some(mine), Some(theirs)) => scope.with_fields(mine.iter().cloned().chain(theirs)),
            _ => scope.untracked(),
        }
    }
}
