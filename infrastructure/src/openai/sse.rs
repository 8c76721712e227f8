//! Server-Sent Events line parser
//!
//! Buffers raw bytes from a chunked response, splits them into lines and
//! yields the payload of every `data:` line. Comments, blank lines and the
//! `[DONE]` marker are skipped.

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::pin::Pin;

/// Parse SSE `data:` payloads out of a byte stream.
///
/// A read error is yielded once and ends the stream. Content left in the
/// buffer when the body ends is parsed as a final line.
pub fn parse_sse_lines<S, E>(byte_stream: S) -> impl Stream<Item = Result<String, E>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    let stream: Pin<Box<S>> = Box::pin(byte_stream);
    futures::stream::unfold(
        (stream, BytesMut::with_capacity(8192), false),
        |(mut stream, mut buffer, done)| async move {
            if done {
                return None;
            }

            loop {
                if let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    let mut line_bytes = buffer.split_to(newline_pos + 1);
                    line_bytes.truncate(line_bytes.len() - 1);
                    if line_bytes.last() == Some(&b'\r') {
                        line_bytes.truncate(line_bytes.len() - 1);
                    }

                    // Invalid UTF-8 lines are skipped
                    let Ok(line) = std::str::from_utf8(&line_bytes) else {
                        continue;
                    };
                    if let Some(data) = extract_sse_data(line) {
                        return Some((Ok(data), (stream, buffer, false)));
                    }
                    continue;
                }

                match stream.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => return Some((Err(e), (stream, buffer, true))),
                    None => {
                        let data = std::str::from_utf8(&buffer)
                            .ok()
                            .and_then(extract_sse_data)?;
                        buffer.clear();
                        return Some((Ok(data), (stream, buffer, true)));
                    }
                }
            }
        },
    )
}

/// Extract the payload of one SSE line.
///
/// Returns `None` for comments, empty lines, non-data fields and `[DONE]`.
fn extract_sse_data(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }

    let data = trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))?
        .trim();

    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    Some(data.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect(chunks: Vec<&'static str>) -> Vec<Result<String, String>> {
        let bytes = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, String>(Bytes::from_static(c.as_bytes()))),
        );
        parse_sse_lines(bytes).collect().await
    }

    #[tokio::test]
    async fn test_lines_split_across_chunks() {
        let items = collect(vec![
            "data: {\"a\":",
            "1}\n\n: keep-alive\n",
            "data:{\"b\":2}\r\n\r\n",
            "data: [DONE]\n\n",
        ])
        .await;
        assert_eq!(
            items,
            vec![Ok(r#"{"a":1}"#.to_string()), Ok(r#"{"b":2}"#.to_string())]
        );
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let items = collect(vec!["data: first\n", "data: last"]).await;
        assert_eq!(items, vec![Ok("first".to_string()), Ok("last".to_string())]);
    }

    #[tokio::test]
    async fn test_read_error_ends_stream() {
        let bytes = stream::iter(vec![
            Ok(Bytes::from_static(b"data: one\n")),
            Err("connection reset".to_string()),
            Ok(Bytes::from_static(b"data: two\n")),
        ]);
        let items: Vec<_> = parse_sse_lines(bytes).collect().await;
        assert_eq!(
            items,
            vec![Ok("one".to_string()), Err("connection reset".to_string())]
        );
    }

    #[test]
    fn test_extract_sse_data() {
        assert_eq!(extract_sse_data("data: x").as_deref(), Some("x"));
        assert_eq!(extract_sse_data("event: message"), None);
        assert_eq!(extract_sse_data(": ping"), None);
        assert_eq!(extract_sse_data("data: [DONE]"), None);
        assert_eq!(extract_sse_data("data:"), None);
    }
}
