use rustc_hash::FxHashMap;
use serde_json::{Value, json};

use crate::{
    error::mapper::MapperError,
    schema::chat::{
        ChatCompletionChunk, ChatCompletionResponse, ChunkChoice, ChunkDelta,
        DeltaFunction, DeltaToolCall,
    },
};

/// Soft cap on the `delta.content` length of re-chunked responses.
pub const MAX_CHUNK_CONTENT: usize = 50;

/// Mutable state threaded through a stream-chunk transform, for providers
/// whose events don't repeat the message envelope on every frame.
#[derive(Debug, Default)]
pub struct StreamState {
    pub id: Option<String>,
    pub model: Option<String>,
    pub created: Option<i64>,
    /// Provider content-block index -> OpenAI tool-call index.
    pub tool_indices: FxHashMap<u64, u32>,
    pub next_tool_index: u32,
}

impl StreamState {
    pub fn tool_index(&mut self, block_index: u64) -> u32 {
        if let Some(index) = self.tool_indices.get(&block_index) {
            return *index;
        }
        let index = self.next_tool_index;
        self.next_tool_index += 1;
        self.tool_indices.insert(block_index, index);
        index
    }
}

/// Splits `content` into pieces of at most `max` characters, breaking only
/// on whitespace. Concatenating the pieces reproduces the input exactly; a
/// single word longer than `max` stays whole.
#[must_use]
pub fn split_content(content: &str, max: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in split_keeping_whitespace(content) {
        if !current.is_empty() && current.len() + word.len() > max {
            pieces.push(std::mem::take(&mut current));
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Splits into alternating word+trailing-whitespace units so no characters
/// are lost when re-joining.
fn split_keeping_whitespace(input: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut in_whitespace = input.starts_with(char::is_whitespace);
    for (i, c) in input.char_indices() {
        let is_ws = c.is_whitespace();
        // a unit ends when whitespace flips back to a word character
        if in_whitespace && !is_ws && i > start {
            units.push(&input[start..i]);
            start = i;
        }
        in_whitespace = is_ws;
    }
    if start < input.len() {
        units.push(&input[start..]);
    }
    units
}

fn chunk_envelope(
    response: &ChatCompletionResponse,
    delta: ChunkDelta,
    finish_reason: Option<String>,
) -> ChatCompletionChunk {
    ChatCompletionChunk {
        id: response.id.clone(),
        object: ChatCompletionChunk::OBJECT.to_string(),
        created: response.created,
        model: response.model.clone(),
        choices: vec![ChunkChoice {
            index: 0,
            delta,
            finish_reason,
            logprobs: None,
        }],
        usage: None,
        system_fingerprint: response.system_fingerprint.clone(),
    }
}

/// Re-emits a non-streaming canonical chat response as a chunk sequence:
/// a role chunk, word-boundary content chunks, a tool-call chunk when the
/// message carried tool calls, and a final chunk bearing `finish_reason`.
pub fn chat_response_to_chunks(
    body: Value,
) -> Result<Vec<Value>, MapperError> {
    let response: ChatCompletionResponse = serde_json::from_value(body)?;
    let Some(choice) = response.choices.first() else {
        return Ok(Vec::new());
    };

    let mut chunks = Vec::new();
    chunks.push(chunk_envelope(
        &response,
        ChunkDelta {
            role: Some("assistant".to_string()),
            ..Default::default()
        },
        None,
    ));

    if let Some(content) = &choice.message.content {
        for piece in split_content(content, MAX_CHUNK_CONTENT) {
            chunks.push(chunk_envelope(
                &response,
                ChunkDelta {
                    content: Some(piece),
                    ..Default::default()
                },
                None,
            ));
        }
    }

    if let Some(tool_calls) = &choice.message.tool_calls {
        let deltas = tool_calls
            .iter()
            .enumerate()
            .map(|(i, call)| DeltaToolCall {
                index: u32::try_from(i).unwrap_or(u32::MAX),
                id: Some(call.id.clone()),
                r#type: Some(call.r#type.clone()),
                function: DeltaFunction {
                    name: Some(call.function.name.clone()),
                    arguments: Some(call.function.arguments.clone()),
                },
            })
            .collect();
        chunks.push(chunk_envelope(
            &response,
            ChunkDelta {
                tool_calls: Some(deltas),
                ..Default::default()
            },
            None,
        ));
    }

    let finish_reason = choice
        .finish_reason
        .clone()
        .unwrap_or_else(|| "stop".to_string());
    let mut last = chunk_envelope(
        &response,
        ChunkDelta::default(),
        Some(finish_reason),
    );
    last.usage = response.usage.clone();
    chunks.push(last);

    chunks
        .into_iter()
        .map(|chunk| serde_json::to_value(chunk).map_err(MapperError::from))
        .collect()
}

/// Stamps the producing provider into a chunk before re-emission.
pub fn stamp_provider(chunk: &mut Value, provider: &str) {
    if let Some(map) = chunk.as_object_mut() {
        map.insert("provider".to_string(), json!(provider));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_round_trips_exactly() {
        let input = "Hello world, this is a test.";
        let pieces = split_content(input, MAX_CHUNK_CONTENT);
        assert_eq!(pieces.concat(), input);
        assert!(pieces.iter().all(|p| p.len() <= MAX_CHUNK_CONTENT));
    }

    #[test]
    fn split_breaks_only_on_whitespace() {
        let input =
            "the quick brown fox jumps over the lazy dog again and again \
             until everyone is thoroughly bored of the sentence";
        let pieces = split_content(input, MAX_CHUNK_CONTENT);
        assert!(pieces.len() > 1);
        assert_eq!(pieces.concat(), input);
        for piece in &pieces[..pieces.len() - 1] {
            // every break lands after whitespace, so pieces other than the
            // last end with a space
            assert!(piece.ends_with(char::is_whitespace));
        }
    }

    #[test]
    fn oversized_single_word_stays_whole() {
        let word = "x".repeat(80);
        let pieces = split_content(&word, MAX_CHUNK_CONTENT);
        assert_eq!(pieces, vec![word]);
    }

    #[test]
    fn response_chunks_end_with_finish_reason() {
        let body = serde_json::json!({
            "id": "resp-1",
            "object": "chat.completion",
            "created": 1,
            "model": "m",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello world"},
                "finish_reason": "stop"
            }]
        });
        let chunks = chat_response_to_chunks(body).unwrap();
        let contents: String = chunks
            .iter()
            .filter_map(|c| {
                c["choices"][0]["delta"]["content"]
                    .as_str()
                    .map(str::to_string)
            })
            .collect();
        assert_eq!(contents, "Hello world");
        let last = chunks.last().unwrap();
        assert_eq!(last["choices"][0]["finish_reason"], "stop");
    }
}
