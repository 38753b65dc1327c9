//! Stream Event Parsing
//!
//! Turns the raw text of a streamed completion body into discrete
//! [`StreamEvent`]s. The body is a sequence of newline-terminated lines;
//! only lines starting with `data:` carry an event, everything else
//! (blank lines, comments) is discarded.
//!
//! The parser is a pure incremental reducer with no transport
//! dependency: feed it chunks as they arrive and collect events. A line
//! is only parsed once its terminating newline has been seen; the
//! trailing incomplete line is carried over between feeds, so no event
//! is ever emitted twice and none is lost to chunk boundaries. One
//! undecodable line is logged and skipped without aborting the lines
//! after it.

use crate::backend::types::StreamEvent;

/// Prefix marking an event-bearing line
pub const DATA_PREFIX: &str = "data:";

/// Incremental parser for streamed completion bodies
#[derive(Debug, Default)]
pub struct SseParser {
    /// Unterminated trailing input carried between feeds
    tail: String,
    /// Bytes of the cumulative body already consumed, for [`Self::feed_cumulative`]
    consumed: usize,
}

impl SseParser {
    /// Create a parser with no buffered input
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a newly-arrived chunk and return the events it completes
    ///
    /// Events are returned in the order their lines appeared. The chunk
    /// need not align with line boundaries.
    pub fn feed(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.tail.push_str(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.tail.find('\n') {
            let line: String = self.tail.drain(..=pos).collect();
            if let Some(event) = decode_line(line.trim()) {
                events.push(event);
            }
        }
        events
    }

    /// Consume a growing cumulative body, as delivered by transports that
    /// re-send the full text received so far on every progress tick
    ///
    /// Only the suffix not seen in a previous call is processed, so each
    /// well-formed line is emitted exactly once no matter how the body is
    /// chunked across calls.
    pub fn feed_cumulative(&mut self, body: &str) -> Vec<StreamEvent> {
        let Some(fresh) = body.get(self.consumed..) else {
            return Vec::new();
        };
        self.consumed = body.len();
        self.feed(fresh)
    }

    /// Flush the buffered trailing line at end of stream
    ///
    /// The final line of a body is not always newline-terminated;
    /// end-of-stream is the only signal that it is complete.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let tail = std::mem::take(&mut self.tail);
        decode_line(tail.trim()).into_iter().collect()
    }
}

/// Decode one complete line, or `None` for non-data and malformed lines
fn decode_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?.trim_start();
    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(error) => {
            tracing::warn!(%error, line, "skipping undecodable stream line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::EventData;

    fn answers(events: &[StreamEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match &e.data {
                EventData::Answer(payload) => payload.answer.clone(),
                EventData::Control(_) => None,
            })
            .collect()
    }

    const BODY: &str = concat!(
        "data:{\"code\":0,\"data\":{\"answer\":\"你\"}}\n",
        "\n",
        "data:{\"code\":0,\"data\":{\"answer\":\"你好\"}}\n",
        ": keep-alive comment\n",
        "data:{\"code\":0,\"data\":true}\n",
    );

    #[test]
    fn test_one_shot_parse() {
        let mut parser = SseParser::new();
        let events = parser.feed(BODY);
        assert_eq!(events.len(), 3);
        assert_eq!(answers(&events), vec!["你", "你好"]);
        assert!(matches!(events[2].data, EventData::Control(true)));
    }

    #[test]
    fn test_split_anywhere_yields_same_events() {
        let reference = {
            let mut parser = SseParser::new();
            answers(&parser.feed(BODY))
        };

        // split the body at every byte position that is a char boundary
        for split in 0..=BODY.len() {
            if !BODY.is_char_boundary(split) {
                continue;
            }
            let mut parser = SseParser::new();
            let mut events = parser.feed(&BODY[..split]);
            events.extend(parser.feed(&BODY[split..]));
            assert_eq!(answers(&events), reference, "split at byte {split}");
        }
    }

    #[test]
    fn test_cumulative_delivery_emits_each_line_once() {
        let reference = {
            let mut parser = SseParser::new();
            answers(&parser.feed(BODY))
        };

        for split in 0..=BODY.len() {
            if !BODY.is_char_boundary(split) {
                continue;
            }
            let mut parser = SseParser::new();
            let mut events = parser.feed_cumulative(&BODY[..split]);
            // the transport re-delivers the whole body, grown
            events.extend(parser.feed_cumulative(BODY));
            events.extend(parser.feed_cumulative(BODY));
            assert_eq!(answers(&events), reference, "split at byte {split}");
        }
    }

    #[test]
    fn test_partial_line_not_parsed_until_terminated() {
        let mut parser = SseParser::new();
        let events = parser.feed("data:{\"code\":0,\"data\":{\"answer\":\"par");
        assert!(events.is_empty());

        let events = parser.feed("tial\"}}\n");
        assert_eq!(answers(&events), vec!["partial"]);
    }

    #[test]
    fn test_malformed_line_does_not_abort_later_lines() {
        let mut parser = SseParser::new();
        let events = parser.feed(concat!(
            "data:{not json at all\n",
            "data:{\"code\":0,\"data\":{\"answer\":\"ok\"}}\n",
        ));
        assert_eq!(answers(&events), vec!["ok"]);
    }

    #[test]
    fn test_non_data_lines_discarded() {
        let mut parser = SseParser::new();
        let events = parser.feed("event: message\nretry: 1000\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_finish_flushes_unterminated_final_line() {
        let mut parser = SseParser::new();
        assert!(parser
            .feed("data:{\"code\":0,\"data\":{\"answer\":\"end\"}}")
            .is_empty());
        let events = parser.finish();
        assert_eq!(answers(&events), vec!["end"]);
        // a second finish has nothing left to flush
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn test_data_prefix_with_space_is_tolerated() {
        let mut parser = SseParser::new();
        let events = parser.feed("data: {\"code\":0,\"data\":{\"answer\":\"spaced\"}}\n");
        assert_eq!(answers(&events), vec!["spaced"]);
    }
}
