//! JSON schema builders for MCP tools.

use serde_json::{Map, Value, json};

/// Build the schema describing the `summarize-document` tool input.
pub(crate) fn summarize_document_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "path".into(),
        string_schema("Path to a PDF on the server's filesystem"),
    );
    properties.insert(
        "text".into(),
        string_schema("Already extracted text to summarize instead of a PDF"),
    );

    let mut mode_schema = Map::new();
    mode_schema.insert("type".into(), Value::String("string".into()));
    mode_schema.insert(
        "description".into(),
        Value::String(
            "single-stage returns the joined chunk summaries; two-stage summarizes them once more"
                .into(),
        ),
    );
    mode_schema.insert(
        "enum".into(),
        Value::Array(
            ["single-stage", "two-stage"]
                .into_iter()
                .map(|variant| Value::String(variant.into()))
                .collect(),
        ),
    );
    properties.insert("mode".into(), Value::Object(mode_schema));

    properties.insert(
        "chunk_size".into(),
        positive_integer_schema("Chunk budget in the configured unit (words by default)"),
    );

    let mut clean_schema = Map::new();
    clean_schema.insert("type".into(), Value::String("boolean".into()));
    clean_schema.insert(
        "description".into(),
        Value::String("Strip LaTeX-style commands and collapse whitespace before chunking".into()),
    );
    properties.insert("clean".into(), Value::Object(clean_schema));

    let mut schema = finalize_object_schema(properties, &[]);
    schema.insert(
        "oneOf".into(),
        json!([{ "required": ["path"] }, { "required": ["text"] }]),
    );
    schema.insert(
        "examples".into(),
        json!([
            { "path": "/docs/report.pdf" },
            { "text": "Paste of a long article.", "mode": "single-stage", "chunk_size": 300 }
        ]),
    );
    schema
}

/// Build the schema describing the `extract-text` tool input.
pub(crate) fn extract_text_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "path".into(),
        string_schema("Path to a PDF on the server's filesystem"),
    );
    properties.insert(
        "max_chars".into(),
        positive_integer_schema("Preview length in characters (defaults to PREVIEW_MAX_CHARS)"),
    );
    finalize_object_schema(properties, &["path"])
}

/// Schema representing an empty object (used for parameterless tools).
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    finalize_object_schema(Map::new(), &[])
}

fn string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn positive_integer_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("integer".into()));
    schema.insert("description".into(), Value::String(description.into()));
    schema.insert("minimum".into(), Value::Number(1.into()));
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_schema_accepts_path_or_text() {
        let schema = summarize_document_input_schema();
        assert!(schema.get("required").is_none());
        assert_eq!(schema["oneOf"].as_array().map(Vec::len), Some(2));
        assert_eq!(schema["properties"]["mode"]["enum"][1], "two-stage");
        assert_eq!(schema["properties"]["chunk_size"]["minimum"], 1);
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn extract_schema_requires_path() {
        let schema = extract_text_input_schema();
        assert_eq!(schema["required"], json!(["path"]));
    }
}
