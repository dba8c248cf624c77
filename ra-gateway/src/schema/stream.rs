use bytes::Bytes;

/// The terminator frame every stream ends with.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Frames a JSON payload as one SSE event.
#[must_use]
pub fn frame(payload: &serde_json::Value) -> Bytes {
    let mut out = String::with_capacity(8 + payload.to_string().len());
    out.push_str("data: ");
    out.push_str(&payload.to_string());
    out.push_str("\n\n");
    Bytes::from(out)
}

#[must_use]
pub fn done_frame() -> Bytes {
    Bytes::from_static(DONE_FRAME.as_bytes())
}

/// Strips the `data: ` prefix from a raw SSE line, if present.
#[must_use]
pub fn strip_data_prefix(line: &str) -> &str {
    line.strip_prefix("data: ")
        .or_else(|| line.strip_prefix("data:"))
        .unwrap_or(line)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_sse_shaped() {
        let framed = frame(&serde_json::json!({"a": 1}));
        assert_eq!(&framed[..], b"data: {\"a\":1}\n\n");
    }

    #[test]
    fn prefix_strip_tolerates_missing_space() {
        assert_eq!(strip_data_prefix("data: {\"x\":1}"), "{\"x\":1}");
        assert_eq!(strip_data_prefix("data:{\"x\":1}"), "{\"x\":1}");
        assert_eq!(strip_data_prefix("{\"x\":1}"), "{\"x\":1}");
    }

    #[test]
    fn done_frame_is_exact() {
        assert_eq!(&done_frame()[..], b"data: [DONE]\n\n");
    }
}
