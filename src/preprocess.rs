//! Chunk preprocessing.
//!
//! Turns the chunking service's transcript into the payload the LLM service
//! consumes. Pure and deterministic: no I/O, and the input is only borrowed.

use crate::error::{PodsumError, Result};
use crate::services::ChunkingResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Locations searched, in order, when the chunk list is wrapped in an object.
const CHUNK_POINTERS: [&str; 3] = ["/chunks", "/results/chunks", "/results/utterances"];

/// Field names that may carry a chunk's text, in order of preference.
const TEXT_FIELDS: [&str; 3] = ["text", "content", "transcript"];

/// One transcript chunk as sent to the LLM service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedChunk {
    pub index: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// LLM service request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedChunks {
    pub chunks: Vec<ProcessedChunk>,
    /// All chunk texts joined by blank lines.
    pub text: String,
}

/// Normalize a chunking result into [`ProcessedChunks`].
///
/// Accepts a bare array of chunks or an object holding one under `chunks`,
/// `results.chunks` or `results.utterances`. A chunk is a string or an object
/// with `text`, `content` or `transcript`, plus optional `start`, `end`
/// (seconds) and `speaker`. Blank chunks are dropped and indices are assigned
/// to the survivors.
pub fn preprocess(result: &ChunkingResult) -> Result<ProcessedChunks> {
    let items = locate_chunks(result.as_value())?;

    let mut chunks = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        if let Some(mut chunk) = parse_chunk(position, item)? {
            chunk.index = chunks.len();
            chunks.push(chunk);
        }
    }

    if chunks.is_empty() {
        return Err(PodsumError::Validation(
            "chunking result contains no transcript text".to_string(),
        ));
    }

    let text = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(ProcessedChunks { chunks, text })
}

fn locate_chunks(value: &Value) -> Result<&[Value]> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(_) => {
            let (pointer, found) = CHUNK_POINTERS
                .iter()
                .find_map(|p| value.pointer(p).map(|v| (*p, v)))
                .ok_or_else(|| {
                    PodsumError::Validation(
                        "chunking result has no chunks, results.chunks or results.utterances"
                            .to_string(),
                    )
                })?;

            found.as_array().map(Vec::as_slice).ok_or_else(|| {
                PodsumError::Validation(format!(
                    "chunking result field {} is {}, expected an array",
                    pointer,
                    type_name(found)
                ))
            })
        }
        other => Err(PodsumError::Validation(format!(
            "chunking result is {}, expected an array or object",
            type_name(other)
        ))),
    }
}

fn parse_chunk(position: usize, item: &Value) -> Result<Option<ProcessedChunk>> {
    let invalid = |msg: String| PodsumError::Validation(format!("chunk {}: {}", position, msg));

    let (text, start, end, speaker) = match item {
        Value::String(s) => (s.as_str(), None, None, None),
        Value::Object(fields) => {
            let text = match TEXT_FIELDS.iter().find_map(|f| fields.get(*f)) {
                Some(Value::String(s)) => s.as_str(),
                Some(other) => {
                    return Err(invalid(format!("text is {}, expected a string", type_name(other))))
                }
                None => return Err(invalid("no text, content or transcript field".to_string())),
            };

            let start =
                seconds(fields.get("start")).map_err(|t| invalid(format!("start is {}", t)))?;
            let end = seconds(fields.get("end")).map_err(|t| invalid(format!("end is {}", t)))?;
            if let (Some(s), Some(e)) = (start, end) {
                if e < s {
                    return Err(invalid(format!("ends at {} before it starts at {}", e, s)));
                }
            }

            let speaker = match fields.get("speaker") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                Some(other) => {
                    return Err(invalid(format!("speaker is {}", type_name(other))))
                }
            };

            (text, start, end, speaker)
        }
        other => return Err(invalid(format!("is {}, expected string or object", type_name(other)))),
    };

    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    Ok(Some(ProcessedChunk {
        index: position,
        text: text.to_string(),
        start,
        end,
        speaker,
    }))
}

/// Optional timestamp; `Err` carries the offending JSON type.
fn seconds(value: Option<&Value>) -> std::result::Result<Option<f64>, &'static str> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or("not representable"),
        Some(other) => Err(type_name(other)),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunking(value: Value) -> ChunkingResult {
        ChunkingResult::new(value)
    }

    #[test]
    fn test_object_chunks_with_timing() {
        let input = chunking(json!({
            "chunks": [
                { "text": " Welcome to the show. ", "start": 0.0, "end": 12.5, "speaker": 0 },
                { "content": "Today we talk about Rust.", "start": 12.5, "end": 30 }
            ]
        }));

        let processed = preprocess(&input).unwrap();
        assert_eq!(processed.chunks.len(), 2);
        assert_eq!(processed.chunks[0].text, "Welcome to the show.");
        assert_eq!(processed.chunks[0].speaker.as_deref(), Some("0"));
        assert_eq!(processed.chunks[1].index, 1);
        assert_eq!(processed.chunks[1].end, Some(30.0));
        assert_eq!(
            processed.text,
            "Welcome to the show.\n\nToday we talk about Rust."
        );
    }

    #[test]
    fn test_bare_array_and_utterances() {
        let bare = preprocess(&chunking(json!(["one", "two"]))).unwrap();
        assert_eq!(bare.text, "one\n\ntwo");

        let utterances = preprocess(&chunking(json!({
            "results": { "utterances": [{ "transcript": "hi there" }] }
        })))
        .unwrap();
        assert_eq!(utterances.chunks[0].text, "hi there");
        assert_eq!(utterances.chunks[0].start, None);
    }

    #[test]
    fn test_blank_chunks_dropped_and_reindexed() {
        let processed = preprocess(&chunking(json!(["", "  ", "kept", { "text": "\n" }, "also"])))
            .unwrap();
        let indices: Vec<usize> = processed.chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(processed.chunks[1].text, "also");
    }

    #[test]
    fn test_malformed_inputs_are_validation_errors() {
        let cases = [
            json!("just a string"),
            json!({ "segments": [] }),
            json!({ "chunks": "nope" }),
            json!([42]),
            json!([{ "words": [] }]),
            json!([{ "text": 7 }]),
            json!([{ "text": "x", "start": "zero" }]),
            json!([{ "text": "x", "start": 10, "end": 5 }]),
            json!([]),
            json!(["   "]),
        ];

        for case in cases {
            let err = preprocess(&chunking(case.clone())).unwrap_err();
            assert!(
                matches!(err, PodsumError::Validation(_)),
                "expected validation error for {}",
                case
            );
        }
    }

    #[test]
    fn test_deterministic_and_non_mutating() {
        let input = chunking(json!({
            "results": { "chunks": [{ "text": "a", "start": 1 }, "b", { "content": "c" }] }
        }));
        let before = input.clone();

        let first = preprocess(&input).unwrap();
        let second = preprocess(&input).unwrap();

        assert_eq!(first, second);
        assert_eq!(input, before);
    }

    #[test]
    fn test_serialized_shape_omits_missing_fields() {
        let processed = preprocess(&chunking(json!(["only text"]))).unwrap();
        let value = serde_json::to_value(&processed).unwrap();
        assert_eq!(
            value,
            json!({ "chunks": [{ "index": 0, "text": "only text" }], "text": "only text" })
        );
    }
}
