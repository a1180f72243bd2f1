//! Prompt text sent to the NLU.
//!
//! The user's query is embedded as a JSON string literal so that quotes and
//! newlines in it cannot break out of the instruction layout. None of this is
//! a security boundary; the sanitizers are.

use serde_json::{json, Value};

use crate::filter::FieldSchema;
use crate::navigation::SiteRoute;

/// Builds the filter-translation prompt for `query` over `schema`.
pub fn filter_prompt(query: &str, schema: &FieldSchema) -> String {
    let fields: Vec<Value> = schema
        .fields()
        .iter()
        .map(|f| {
            json!({
                "accessorKey": f.accessor_key,
                "label": f.label,
                "synonyms": f.synonyms,
            })
        })
        .collect();

    format!(
        r#"You convert a user's request into filters for a data table.

TABLE FIELDS (JSON):
{fields}

RULES:
1. Respond with ONLY a JSON array. Each element is {{"field": ..., "operator": ..., "value": ...}}.
2. "field" MUST be exactly one of the accessorKey values above. Use the labels and synonyms to map the user's words to an accessorKey (for example a synonym "father" maps to its field's accessorKey).
3. "operator" MUST be "equals" or "contains".
4. "value" is a string or a number taken from the request. Do not invent values.
5. If the request does not describe a filter over these fields (greetings, questions, chit-chat), respond with [].

USER REQUEST (JSON string):
{query}"#,
        fields = Value::Array(fields),
        query = Value::String(query.to_string()),
    )
}

/// Builds the navigation prompt for `query` over an already role-filtered
/// route list.
pub fn navigation_prompt(query: &str, routes: &[&SiteRoute]) -> String {
    let listed: Vec<Value> = routes
        .iter()
        .map(|r| {
            json!({
                "path": r.path,
                "name": r.name,
                "description": r.description,
            })
        })
        .collect();

    format!(
        r#"You pick the one page a user wants to open.

AVAILABLE PAGES (JSON):
{routes}

RULES:
1. Match the request against the pages above ONLY. No other page exists.
2. If exactly one page clearly matches, respond with {{"route": "<path>"}} using its path verbatim.
3. If the request is ambiguous, matches no page, or asks for something not listed, respond with {{}}.
4. Respond with ONLY that JSON object and nothing else.

USER REQUEST (JSON string):
{query}"#,
        routes = Value::Array(listed),
        query = Value::String(query.to_string()),
    )
}
