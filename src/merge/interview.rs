//! Speaker-attributed interview transcript merging.

use crate::transcription::ChunkTranscript;
use serde::{Deserialize, Serialize};

/// One speaker turn in the diarized representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewEntry {
    pub speaker: String,
    pub transcription: String,
}

/// Recover speaker turns from one chunk's transcript.
///
/// Structured path first: every segment must carry a speaker. Otherwise the
/// text body is tried as a JSON array of `{speaker, transcription}` objects
/// (tolerating prose around the array). `None` means the chunk has no usable
/// speaker structure.
pub fn entries_from_transcript(transcript: &ChunkTranscript) -> Option<Vec<InterviewEntry>> {
    if !transcript.segments.is_empty()
        && transcript.segments.iter().all(|s| s.speaker.is_some())
    {
        let entries = transcript
            .segments
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .map(|s| InterviewEntry {
                speaker: s.speaker.clone().unwrap_or_default(),
                transcription: s.text.trim().to_string(),
            })
            .collect::<Vec<_>>();
        if !entries.is_empty() {
            return Some(entries);
        }
    }
    entries_from_json(&transcript.text)
}

fn entries_from_json(text: &str) -> Option<Vec<InterviewEntry>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(&text[start..=end]).ok()?;
    let items = value.as_array()?;
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let speaker = item.get("speaker")?.as_str()?.trim().to_string();
        let transcription = item
            .get("transcription")
            .or_else(|| item.get("text"))?
            .as_str()?
            .trim()
            .to_string();
        if speaker.is_empty() || transcription.is_empty() {
            continue;
        }
        entries.push(InterviewEntry {
            speaker,
            transcription,
        });
    }
    (!entries.is_empty()).then_some(entries)
}

fn normalized(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Concatenate per-chunk entries in chunk order, dropping an entry that
/// repeats the previous one with the same speaker (the overlap zone).
pub fn merge_interview(chunks: &[Vec<InterviewEntry>]) -> Vec<InterviewEntry> {
    let mut merged: Vec<InterviewEntry> = Vec::new();
    for entries in chunks {
        for entry in entries {
            if let Some(last) = merged.last() {
                if last.speaker == entry.speaker
                    && normalized(&last.transcription) == normalized(&entry.transcription)
                {
                    continue;
                }
            }
            merged.push(entry.clone());
        }
    }
    merged
}

pub fn format_interview(entries: &[InterviewEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}: {}", e.speaker, e.transcription))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::Segment;

    fn entry(speaker: &str, text: &str) -> InterviewEntry {
        InterviewEntry {
            speaker: speaker.to_string(),
            transcription: text.to_string(),
        }
    }

    #[test]
    fn extracts_entries_from_diarized_segments() {
        let transcript = ChunkTranscript {
            text: String::new(),
            segments: vec![
                Segment { start_secs: 0.0, end_secs: 2.0, text: "hi".into(), speaker: Some("A".into()) },
                Segment { start_secs: 2.0, end_secs: 4.0, text: "hey".into(), speaker: Some("B".into()) },
            ],
        };
        let entries = entries_from_transcript(&transcript).unwrap();
        assert_eq!(entries, vec![entry("A", "hi"), entry("B", "hey")]);
    }

    #[test]
    fn segment_without_speaker_disqualifies_structured_path() {
        let transcript = ChunkTranscript {
            text: "no json here".into(),
            segments: vec![
                Segment { start_secs: 0.0, end_secs: 2.0, text: "hi".into(), speaker: None },
            ],
        };
        assert!(entries_from_transcript(&transcript).is_none());
    }

    #[test]
    fn extracts_entries_from_json_text_with_surrounding_prose() {
        let transcript = ChunkTranscript {
            text: "Here is the transcript:\n[{\"speaker\": \"Host\", \"transcription\": \"Welcome back.\"}]\nDone.".into(),
            segments: Vec::new(),
        };
        let entries = entries_from_transcript(&transcript).unwrap();
        assert_eq!(entries, vec![entry("Host", "Welcome back.")]);
    }

    #[test]
    fn merge_drops_same_speaker_duplicate_at_the_seam() {
        let chunks = vec![
            vec![entry("A", "first"), entry("B", "the seam line")],
            vec![entry("B", "The  seam LINE"), entry("A", "after")],
        ];
        let merged = merge_interview(&chunks);
        assert_eq!(
            merged,
            vec![entry("A", "first"), entry("B", "the seam line"), entry("A", "after")]
        );
    }

    #[test]
    fn same_text_different_speaker_is_kept() {
        let chunks = vec![
            vec![entry("A", "yes")],
            vec![entry("B", "yes")],
        ];
        assert_eq!(merge_interview(&chunks).len(), 2);
    }

    #[test]
    fn formats_speaker_turns() {
        let text = format_interview(&[entry("A", "one"), entry("B", "two")]);
        assert_eq!(text, "A: one\n\nB: two");
    }
}
