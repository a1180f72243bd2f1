//! Free text to table filters, validated against a caller-supplied schema.
//!
//! The caller describes the table it is showing as a [`FieldSchema`]. The
//! [`SchemaFilterTranslator`] asks the NLU to turn a query into
//! `{field, operator, value}` triples and then throws away every triple whose
//! field is not one of the schema's `accessorKey`s. The translator never fails:
//! the worst case is an empty list, which leaves the table unfiltered.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::nlu::{self, Nlu};
use crate::prompt;
use crate::sanitizer::{FilterSanitizer, Sanitizer};

/// One filterable column of the caller's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Canonical machine name; the only value a condition's `field` may take
    pub accessor_key: String,
    /// Human-readable column label
    #[serde(default)]
    pub label: String,
    /// Alternative words users say for this column ("father" for "guardian")
    #[serde(default)]
    pub synonyms: BTreeSet<String>,
}

impl FieldSpec {
    /// Creates a field with no label or synonyms.
    pub fn new(accessor_key: impl Into<String>) -> Self {
        Self {
            accessor_key: accessor_key.into(),
            label: String::new(),
            synonyms: BTreeSet::new(),
        }
    }

    /// Sets the column label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Adds a synonym hint.
    pub fn with_synonym(mut self, synonym: impl Into<String>) -> Self {
        self.synonyms.insert(synonym.into());
        self
    }
}

/// Why a field schema was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field has a blank `accessorKey`
    #[error("field {index} has an empty accessorKey")]
    EmptyKey {
        /// Position of the offending field
        index: usize,
    },
    /// Two fields share an `accessorKey`
    #[error("duplicate accessorKey '{0}'")]
    DuplicateKey(String),
}

/// Ordered set of filterable fields with unique `accessorKey`s.
///
/// Deserialises from a plain JSON array of [`FieldSpec`]s and refuses arrays
/// that break the uniqueness invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Builds a schema, checking that every key is non-empty and unique.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for (index, field) in fields.iter().enumerate() {
            if field.accessor_key.trim().is_empty() {
                return Err(SchemaError::EmptyKey { index });
            }
            if !seen.insert(field.accessor_key.as_str()) {
                return Err(SchemaError::DuplicateKey(field.accessor_key.clone()));
            }
        }
        Ok(Self { fields })
    }

    /// Fields in caller order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Returns `true` if `key` is exactly one of the schema's accessor keys.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.accessor_key == key)
    }

    /// Returns `true` if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<Vec<FieldSpec>> for FieldSchema {
    type Error = SchemaError;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<FieldSchema> for Vec<FieldSpec> {
    fn from(schema: FieldSchema) -> Self {
        schema.fields
    }
}

/// Comparison a filter condition applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Exact match
    Equals,
    /// Substring match
    Contains,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOperator::Equals => write!(f, "equals"),
            FilterOperator::Contains => write!(f, "contains"),
        }
    }
}

impl FromStr for FilterOperator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equals" => Ok(FilterOperator::Equals),
            "contains" => Ok(FilterOperator::Contains),
            _ => Err(()),
        }
    }
}

/// Value side of a filter condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Text value
    Text(String),
    /// Numeric value, kept in its JSON form
    Number(serde_json::Number),
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Number(n.into())
    }
}

/// One validated condition; a result list is ANDed together by the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Accessor key of the targeted column
    pub field: String,
    /// Comparison to apply
    pub operator: FilterOperator,
    /// Value to compare against
    pub value: FilterValue,
}

/// Translates free-text queries into schema-checked filter conditions.
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use async_trait::async_trait;
/// use campus_gate::{FieldSchema, FieldSpec, Nlu, NluError, SchemaFilterTranslator};
///
/// struct Canned;
///
/// #[async_trait]
/// impl Nlu for Canned {
///     async fn translate_text(&self, _prompt: &str) -> Result<String, NluError> {
///         Ok(r#"[{"field":"guardian","operator":"contains","value":"Singh"},
///                {"field":"password","operator":"equals","value":"x"}]"#.to_string())
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let schema = FieldSchema::new(vec![
///     FieldSpec::new("lastname"),
///     FieldSpec::new("guardian").with_synonym("father"),
/// ]).unwrap();
///
/// let translator = SchemaFilterTranslator::new(Arc::new(Canned));
/// let conditions = translator.translate("students whose father is Singh", &schema).await;
///
/// // The invented "password" field is dropped.
/// assert_eq!(conditions.len(), 1);
/// assert_eq!(conditions[0].field, "guardian");
/// # });
/// ```
#[derive(Clone)]
pub struct SchemaFilterTranslator {
    nlu: Arc<dyn Nlu>,
    timeout: Duration,
}

impl fmt::Debug for SchemaFilterTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaFilterTranslator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SchemaFilterTranslator {
    /// Creates a translator using the default NLU timeout.
    pub fn new(nlu: Arc<dyn Nlu>) -> Self {
        Self {
            nlu,
            timeout: nlu::DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the bound on each NLU call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Translates `query` into conditions over `schema`.
    ///
    /// Never fails. Transport errors, timeouts and unusable replies all yield
    /// an empty list; single bad elements are dropped and the rest are kept in
    /// the order the NLU produced them.
    pub async fn translate(&self, query: &str, schema: &FieldSchema) -> Vec<FilterCondition> {
        if query.trim().is_empty() || schema.is_empty() {
            debug!("nothing to translate; applying no filters");
            return Vec::new();
        }

        let request = prompt::filter_prompt(query, schema);
        let reply = match nlu::call_bounded(self.nlu.as_ref(), &request, self.timeout).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(error = %err, "filter translation unavailable; applying no filters");
                return Vec::new();
            }
        };

        match FilterSanitizer::new(schema).sanitize(reply) {
            Ok(conditions) => {
                let conditions = conditions.into_inner();
                debug!(count = conditions.len(), "filter conditions accepted");
                conditions
            }
            Err(err) => {
                warn!(error = %err, "unusable filter reply; applying no filters");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FailingNlu, RecordingNlu, StaticNlu};

    fn student_schema() -> FieldSchema {
        FieldSchema::new(vec![
            FieldSpec::new("lastname").with_label("Last name"),
            FieldSpec::new("guardian")
                .with_label("Guardian")
                .with_synonym("father")
                .with_synonym("mother"),
        ])
        .expect("valid schema")
    }

    #[test]
    fn schema_rejects_duplicate_keys() {
        let result = FieldSchema::new(vec![FieldSpec::new("grade"), FieldSpec::new("grade")]);
        assert_eq!(result, Err(SchemaError::DuplicateKey("grade".to_string())));
    }

    #[test]
    fn schema_rejects_blank_keys() {
        let result = FieldSchema::new(vec![FieldSpec::new("grade"), FieldSpec::new(" ")]);
        assert_eq!(result, Err(SchemaError::EmptyKey { index: 1 }));
    }

    #[test]
    fn schema_deserializes_from_camel_case_array() {
        let schema: FieldSchema = serde_json::from_str(
            r#"[{"accessorKey":"guardian","label":"Guardian","synonyms":["father"]},
                {"accessorKey":"lastname"}]"#,
        )
        .expect("valid schema json");

        assert!(schema.contains("guardian"));
        assert!(schema.contains("lastname"));
        assert!(!schema.contains("Guardian"));
        assert!(schema.fields()[0].synonyms.contains("father"));
    }

    #[test]
    fn schema_deserialization_enforces_uniqueness() {
        let result: Result<FieldSchema, _> =
            serde_json::from_str(r#"[{"accessorKey":"a"},{"accessorKey":"a"}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn condition_serializes_in_wire_shape() {
        let condition = FilterCondition {
            field: "grade".to_string(),
            operator: FilterOperator::Equals,
            value: FilterValue::from(7_i64),
        };
        assert_eq!(
            serde_json::to_string(&condition).unwrap(),
            r#"{"field":"grade","operator":"equals","value":7}"#
        );
    }

    #[tokio::test]
    async fn father_resolves_to_guardian() {
        let nlu = StaticNlu::new(
            "```json\n[{\"field\":\"guardian\",\"operator\":\"equals\",\"value\":\"Singh\"}]\n```",
        );
        let translator = SchemaFilterTranslator::new(Arc::new(nlu));

        let conditions = translator
            .translate("students whose father is Singh", &student_schema())
            .await;

        assert_eq!(
            conditions,
            vec![FilterCondition {
                field: "guardian".to_string(),
                operator: FilterOperator::Equals,
                value: "Singh".into(),
            }]
        );
    }

    #[tokio::test]
    async fn unknown_fields_are_dropped_and_order_kept() {
        let nlu = StaticNlu::new(
            r#"[{"field":"lastname","operator":"contains","value":"Ka"},
                {"field":"father","operator":"equals","value":"Singh"},
                {"field":"guardian","operator":"contains","value":"Singh"}]"#,
        );
        let translator = SchemaFilterTranslator::new(Arc::new(nlu));

        let conditions = translator.translate("q", &student_schema()).await;
        let fields: Vec<&str> = conditions.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["lastname", "guardian"]);
    }

    #[tokio::test]
    async fn prose_reply_yields_no_filters_every_time() {
        let nlu = StaticNlu::new("Sure! Here are the students you asked about.");
        let translator = SchemaFilterTranslator::new(Arc::new(nlu));

        let first = translator.translate("hello there", &student_schema()).await;
        let second = translator.translate("hello there", &student_schema()).await;
        assert!(first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn transport_failure_yields_no_filters() {
        let translator = SchemaFilterTranslator::new(Arc::new(FailingNlu));
        assert!(translator.translate("q", &student_schema()).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_nlu_times_out_to_no_filters() {
        let nlu = StaticNlu::new("[]").delayed(Duration::from_secs(30));
        let translator =
            SchemaFilterTranslator::new(Arc::new(nlu)).with_timeout(Duration::from_secs(2));

        assert!(translator.translate("q", &student_schema()).await.is_empty());
    }

    #[tokio::test]
    async fn prompt_carries_query_and_full_schema() {
        let nlu = Arc::new(RecordingNlu::new("[]"));
        let translator = SchemaFilterTranslator::new(nlu.clone());

        translator
            .translate("students whose father is Singh", &student_schema())
            .await;

        let prompts = nlu.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("students whose father is Singh"));
        assert!(prompts[0].contains("\"guardian\""));
        assert!(prompts[0].contains("\"father\""));
        assert!(prompts[0].contains("\"lastname\""));
    }

    #[tokio::test]
    async fn empty_schema_skips_the_nlu() {
        let nlu = Arc::new(RecordingNlu::new("[]"));
        let translator = SchemaFilterTranslator::new(nlu.clone());

        let conditions = translator.translate("q", &FieldSchema::default()).await;
        assert!(conditions.is_empty());
        assert!(nlu.prompts().is_empty());
    }
}
