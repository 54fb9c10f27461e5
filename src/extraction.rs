//! Structured field extraction: schema, prompt, response parsing and
//! validation.
//!
//! The model is asked for a single JSON object keyed by schema field names,
//! plus an optional `uncertain_fields` array. Parsing is tolerant of prose
//! around the object; anything that is not a JSON object is reported as the
//! pseudo-field `parse_error` so the extraction gate routes it to review.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::answer::{format_context, Prompt};
use crate::gate::ReviewGate;
use crate::models::{Chunk, ExtractionRecord, GateDecision};

/// Marker placed in `uncertain_fields` when the reply holds no usable JSON.
pub const PARSE_ERROR: &str = "parse_error";

const UNCERTAIN_KEY: &str = "uncertain_fields";

pub const EXTRACTION_SYSTEM: &str = "You extract structured data from the provided document chunks. Output valid JSON only.\n\
For each field you are uncertain about, include an \"uncertain_fields\" array listing those field names.\n\
If a field is missing or unclear, use null for its value and add it to \"uncertain_fields\".";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    pub name: String,
    pub description: String,
    /// Required fields must not be null.
    pub required: bool,
}

impl SchemaField {
    pub fn optional(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: false,
        }
    }

    pub fn required(name: &str, description: &str) -> Self {
        Self {
            required: true,
            ..Self::optional(name, description)
        }
    }
}

/// Ordered set of string fields to extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionSchema {
    pub fields: Vec<SchemaField>,
}

impl ExtractionSchema {
    /// Preset for contracts: dates, parties, amounts and a summary.
    pub fn contract() -> Self {
        Self {
            fields: vec![
                SchemaField::optional("dates", "Relevant dates mentioned"),
                SchemaField::optional("parties", "People or organizations involved"),
                SchemaField::optional("amounts", "Monetary amounts or quantities"),
                SchemaField::optional("summary", "Brief summary of the document"),
            ],
        }
    }

    /// Default retrieval query: the field names joined by spaces.
    pub fn retrieval_query(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn describe(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("- {}: {}", f.name, f.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ExtractionSchema {
    fn default() -> Self {
        Self::contract()
    }
}

pub fn extraction_prompt(schema: &ExtractionSchema, chunks: &[Chunk]) -> Prompt {
    Prompt {
        system: EXTRACTION_SYSTEM.to_string(),
        user: format!(
            "Context (chunks from the document):\n\n{}\n\n\
             Extract the following fields into a JSON object. Use the exact field names. \
             Add an \"uncertain_fields\" array if any value is uncertain.\n\n\
             Schema / fields:\n{}\n\n\
             Output only one JSON object with the field names as keys and \"uncertain_fields\" \
             as an optional array of strings.",
            format_context(chunks),
            schema.describe()
        ),
    }
}

/// Schema-field values and uncertainty flags pulled from a model reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedExtraction {
    pub values: Map<String, Value>,
    pub uncertain_fields: BTreeSet<String>,
}

impl ParsedExtraction {
    fn parse_error() -> Self {
        Self {
            values: Map::new(),
            uncertain_fields: BTreeSet::from([PARSE_ERROR.to_string()]),
        }
    }
}

/// Parse the outermost `{...}` of a reply. Keys outside the schema are
/// dropped; schema fields the model omitted become null.
pub fn parse_extraction_response(content: &str, schema: &ExtractionSchema) -> ParsedExtraction {
    let content = content.trim();

    let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) else {
        return ParsedExtraction::parse_error();
    };
    if end <= start {
        return ParsedExtraction::parse_error();
    }

    let mut object = match serde_json::from_str::<Value>(&content[start..=end]) {
        Ok(Value::Object(object)) => object,
        _ => return ParsedExtraction::parse_error(),
    };

    let uncertain_fields = match object.remove(UNCERTAIN_KEY) {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => BTreeSet::new(),
    };

    let values = schema
        .fields
        .iter()
        .map(|f| {
            let value = object.remove(&f.name).unwrap_or(Value::Null);
            (f.name.clone(), value)
        })
        .collect();

    ParsedExtraction {
        values,
        uncertain_fields,
    }
}

/// Check extracted values against the schema. Returns one message per
/// offending field, formatted `<field>: <problem>`.
pub fn validate_record(values: &Map<String, Value>, schema: &ExtractionSchema) -> Vec<String> {
    schema
        .fields
        .iter()
        .filter_map(|f| match values.get(&f.name) {
            None | Some(Value::Null) if f.required => Some(format!("{}: Field required", f.name)),
            None | Some(Value::Null) | Some(Value::String(_)) => None,
            Some(_) => Some(format!("{}: Input should be a valid string", f.name)),
        })
        .collect()
}

/// A gated extraction result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutcome {
    #[serde(flatten)]
    pub record: ExtractionRecord,
    #[serde(flatten)]
    pub decision: GateDecision,
}

/// Parse, validate and gate a raw extraction reply.
pub fn review_extraction(
    content: &str,
    schema: &ExtractionSchema,
    gate: &ReviewGate,
) -> ExtractionOutcome {
    let parsed = parse_extraction_response(content, schema);
    if parsed.uncertain_fields.contains(PARSE_ERROR) {
        warn!("extraction reply did not contain a JSON object");
    }

    let validation_errors = validate_record(&parsed.values, schema);

    let fields: BTreeMap<String, Option<String>> = schema
        .fields
        .iter()
        .map(|f| {
            let value = match parsed.values.get(&f.name) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            };
            (f.name.clone(), value)
        })
        .collect();

    let record = ExtractionRecord {
        fields,
        uncertain_fields: parsed.uncertain_fields,
        validation_errors,
    };
    let decision = gate.extraction(&record);

    ExtractionOutcome { record, decision }
}
