//! Normalization of backend response shapes into the internal segment model.
//!
//! The segment-array field name and per-segment field names vary across
//! backends and response versions, so everything is probed through alias
//! tables instead of typed deserialization. No backend-specific name leaks
//! past this module.

use super::backend::{ChunkTranscript, Segment};
use serde_json::Value;

const ARRAY_ALIASES: &[&str] = &["segments", "results", "utterances", "chunks", "words"];
const TEXT_ALIASES: &[&str] = &["text", "transcript", "transcription", "content"];
const START_ALIASES: &[&str] = &["start", "start_time", "startTime", "from", "start_seconds", "offset"];
const END_ALIASES: &[&str] = &["end", "end_time", "endTime", "to", "end_seconds"];
const SPEAKER_ALIASES: &[&str] = &["speaker", "speaker_id", "speakerId", "speaker_label"];

/// Normalize a structured backend response into text plus segments.
///
/// When the response carries segments but no top-level text, a text body is
/// synthesized from the segments with chunk-local bracket stamps so the plain
/// merger has lines to work with.
pub fn normalize_response(json: &Value) -> ChunkTranscript {
    let segments = response_segments(json);
    let text = top_level_text(json)
        .unwrap_or_else(|| text_from_segments(&segments));
    ChunkTranscript { text, segments }
}

fn field<'a>(obj: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|name| obj.get(name))
}

fn top_level_text(json: &Value) -> Option<String> {
    let text = field(json, TEXT_ALIASES)?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn text_from_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| format!("{} {}", bracket_stamp(s.start_secs), s.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bracket_stamp(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("[{:02}:{:02}:{:02}]", h, m, s)
    } else {
        format!("[{:02}:{:02}]", m, s)
    }
}

/// Locate the segment array, looking one level deep for shapes such as
/// `{"results": {"utterances": [...]}}`.
fn find_segment_array(json: &Value) -> Option<&Vec<Value>> {
    for alias in ARRAY_ALIASES {
        match json.get(alias) {
            Some(Value::Array(items)) => return Some(items),
            Some(nested @ Value::Object(_)) => {
                for inner in ARRAY_ALIASES {
                    if let Some(Value::Array(items)) = nested.get(inner) {
                        return Some(items);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn response_segments(json: &Value) -> Vec<Segment> {
    let Some(items) = find_segment_array(json) else {
        return Vec::new();
    };
    let mut segments: Vec<Segment> = Vec::with_capacity(items.len());
    for item in items {
        let Some(segment) = normalize_segment(item) else {
            continue;
        };
        if segment.text.trim().is_empty() {
            continue;
        }
        // Defensive de-duplication against upstream repetition: consecutive
        // same-speaker segments with identical text collapse into one.
        if let Some(last) = segments.last_mut() {
            if last.speaker == segment.speaker && last.text.trim() == segment.text.trim() {
                last.end_secs = last.end_secs.max(segment.end_secs);
                continue;
            }
        }
        segments.push(segment);
    }
    segments
}

fn normalize_segment(item: &Value) -> Option<Segment> {
    let text = field(item, TEXT_ALIASES)?.as_str()?.trim().to_string();
    let start = field(item, START_ALIASES)
        .and_then(time_value)
        .or_else(|| nested_timestamp(item, START_ALIASES, 0))?;
    let end = field(item, END_ALIASES)
        .and_then(time_value)
        .or_else(|| nested_timestamp(item, END_ALIASES, 1))
        .unwrap_or(start);
    Some(Segment {
        start_secs: start,
        end_secs: end.max(start),
        text,
        speaker: field(item, SPEAKER_ALIASES).and_then(speaker_value),
    })
}

/// `{"timestamp": {"start": ..}}` or `{"timestamp": [start, end]}`.
fn nested_timestamp(item: &Value, aliases: &[&str], index: usize) -> Option<f64> {
    let ts = item.get("timestamp").or_else(|| item.get("timestamps"))?;
    match ts {
        Value::Object(_) => field(ts, aliases).and_then(time_value),
        Value::Array(parts) => parts.get(index).and_then(time_value),
        _ => None,
    }
}

/// Accept raw seconds, clock strings (`MM:SS`, `H:MM:SS.ss`) and SRT-style
/// `HH:MM:SS,mmm` encodings.
fn time_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_time_string(s),
        _ => None,
    }
}

fn parse_time_string(s: &str) -> Option<f64> {
    let s = s.trim().replace(',', ".");
    if s.is_empty() {
        return None;
    }
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    let mut total = 0.0;
    for part in &parts {
        total = total * 60.0 + part.trim().parse::<f64>().ok()?;
    }
    (total >= 0.0).then_some(total)
}

fn speaker_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(format!("Speaker {}", n)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_seconds_shape() {
        let json = json!({
            "text": "hello world",
            "segments": [
                {"start": 0.0, "end": 1.5, "text": "hello"},
                {"start": 1.5, "end": 3.0, "text": "world"},
            ]
        });
        let t = normalize_response(&json);
        assert_eq!(t.text, "hello world");
        assert_eq!(t.segments.len(), 2);
        assert_eq!(t.segments[1].start_secs, 1.5);
        assert!(t.segments[0].speaker.is_none());
    }

    #[test]
    fn normalizes_nested_utterances_with_numeric_speakers() {
        let json = json!({
            "results": {
                "utterances": [
                    {"start_time": 0.2, "end_time": 4.0, "transcript": "first turn", "speaker": 0},
                    {"start_time": 4.1, "end_time": 8.0, "transcript": "second turn", "speaker": 1},
                ]
            }
        });
        let t = normalize_response(&json);
        assert_eq!(t.segments.len(), 2);
        assert_eq!(t.segments[0].speaker.as_deref(), Some("Speaker 0"));
        assert_eq!(t.segments[1].text, "second turn");
    }

    #[test]
    fn normalizes_clock_and_srt_time_strings() {
        let json = json!({
            "segments": [
                {"from": "1:02", "to": "1:05.5", "content": "short clock"},
                {"startTime": "01:00:01,250", "endTime": "01:00:03,000", "content": "srt style", "speaker_label": "A"},
            ]
        });
        let t = normalize_response(&json);
        assert_eq!(t.segments[0].start_secs, 62.0);
        assert_eq!(t.segments[0].end_secs, 65.5);
        assert_eq!(t.segments[1].start_secs, 3601.25);
        assert_eq!(t.segments[1].speaker.as_deref(), Some("A"));
    }

    #[test]
    fn normalizes_nested_timestamp_object_and_array() {
        let json = json!({
            "chunks": [
                {"timestamp": {"start": 1.0, "end": 2.0}, "text": "object form"},
                {"timestamp": [2.0, 3.5], "text": "array form"},
            ]
        });
        let t = normalize_response(&json);
        assert_eq!(t.segments.len(), 2);
        assert_eq!(t.segments[1].start_secs, 2.0);
        assert_eq!(t.segments[1].end_secs, 3.5);
    }

    #[test]
    fn collapses_consecutive_identical_same_speaker_segments() {
        let json = json!({
            "segments": [
                {"start": 0.0, "end": 2.0, "text": "repeated line", "speaker": "S1"},
                {"start": 2.0, "end": 4.0, "text": "repeated line", "speaker": "S1"},
                {"start": 4.0, "end": 6.0, "text": "repeated line", "speaker": "S2"},
            ]
        });
        let t = normalize_response(&json);
        assert_eq!(t.segments.len(), 2);
        assert_eq!(t.segments[0].end_secs, 4.0);
        assert_eq!(t.segments[1].speaker.as_deref(), Some("S2"));
    }

    #[test]
    fn synthesizes_text_from_segments_when_body_missing() {
        let json = json!({
            "segments": [
                {"start": 61.0, "end": 63.0, "text": "a minute in"},
            ]
        });
        let t = normalize_response(&json);
        assert_eq!(t.text, "[01:01] a minute in");
    }

    #[test]
    fn unusable_response_yields_empty_transcript() {
        let t = normalize_response(&json!({"status": "ok"}));
        assert!(t.is_empty());
        let t = normalize_response(&json!({"segments": [{"start": 1.0}]}));
        assert!(t.is_empty());
    }
}
