use crate::error::CongruenceError;
use crate::types::{ClauseSpan, SentimentSegment, Transcript, TranscriptWord};

const CLAUSE_PUNCTUATION: [char; 6] = ['.', ',', ';', ':', '?', '!'];
const TEXT_PUNCTUATION_WHITELIST: [char; 6] = ['.', ',', '\'', '?', '!', '-'];

/// Builds contiguous clause windows from the sentiment boundaries (or, when the
/// text classifier returned nothing, from clause punctuation in the words).
///
/// Clause windows follow the [start_ms, end_ms) contract. Gaps between
/// consecutive windows are split at their midpoint, the first clause starts at
/// 0 and the last one reaches the end of the recording.
pub fn segment_clauses(
    transcript: &Transcript,
    segments: &[SentimentSegment],
) -> Result<Vec<ClauseSpan>, CongruenceError> {
    validate_words(&transcript.words)?;

    let windows: Vec<(u64, u64, Option<&str>)> = if segments.is_empty() {
        punctuation_windows(&transcript.words)
    } else {
        validate_segments(segments)?;
        segments
            .iter()
            .map(|segment| (segment.start_ms, segment.end_ms, segment.text.as_deref()))
            .collect()
    };

    if windows.is_empty() {
        return Ok(Vec::new());
    }

    let recording_end = transcript
        .words
        .last()
        .map(|word| word.end_ms)
        .into_iter()
        .chain(transcript.duration_ms)
        .max();
    let bounds = close_gaps(
        windows.iter().map(|&(start, end, _)| (start, end)).collect(),
        recording_end,
    );

    let spans = bounds
        .into_iter()
        .zip(windows.iter())
        .enumerate()
        .map(|(index, ((start_ms, end_ms), &(_, _, fallback_text)))| {
            let from_words = words_within(&transcript.words, start_ms, end_ms);
            let raw_text = if from_words.is_empty() {
                fallback_text.unwrap_or_default().to_string()
            } else {
                from_words
            };
            ClauseSpan {
                id: format!("clause-{}", index + 1),
                index,
                start_ms,
                end_ms,
                text: clean_text(&raw_text),
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        clause_count = spans.len(),
        word_count = transcript.words.len(),
        from_sentiment = !segments.is_empty(),
        "segmentation: clause windows built"
    );
    Ok(spans)
}

fn validate_words(words: &[TranscriptWord]) -> Result<(), CongruenceError> {
    for (idx, word) in words.iter().enumerate() {
        if word.end_ms <= word.start_ms {
            return Err(CongruenceError::malformed_transcript(format!(
                "word #{idx} '{}' has a degenerate interval [{}, {})",
                word.text, word.start_ms, word.end_ms
            )));
        }
    }
    for (idx, pair) in words.windows(2).enumerate() {
        if pair[1].start_ms < pair[0].end_ms {
            return Err(CongruenceError::malformed_transcript(format!(
                "word #{} '{}' starts at {} ms before word #{idx} '{}' ends at {} ms",
                idx + 1,
                pair[1].text,
                pair[1].start_ms,
                pair[0].text,
                pair[0].end_ms
            )));
        }
    }
    Ok(())
}

fn validate_segments(segments: &[SentimentSegment]) -> Result<(), CongruenceError> {
    for (idx, segment) in segments.iter().enumerate() {
        if segment.end_ms <= segment.start_ms {
            return Err(CongruenceError::malformed_transcript(format!(
                "clause boundary #{idx} has a degenerate interval [{}, {})",
                segment.start_ms, segment.end_ms
            )));
        }
    }
    for (idx, pair) in segments.windows(2).enumerate() {
        if pair[1].start_ms < pair[0].end_ms {
            return Err(CongruenceError::malformed_transcript(format!(
                "clause boundary #{} [{}, {}) overlaps or precedes boundary #{idx} [{}, {})",
                idx + 1,
                pair[1].start_ms,
                pair[1].end_ms,
                pair[0].start_ms,
                pair[0].end_ms
            )));
        }
    }
    Ok(())
}

fn punctuation_windows(words: &[TranscriptWord]) -> Vec<(u64, u64, Option<&str>)> {
    let mut windows = Vec::new();
    let mut run_start: Option<u64> = None;
    for word in words {
        let start = *run_start.get_or_insert(word.start_ms);
        if word.text.trim_end().ends_with(&CLAUSE_PUNCTUATION[..]) {
            windows.push((start, word.end_ms, None));
            run_start = None;
        }
    }
    if let (Some(start), Some(last)) = (run_start, words.last()) {
        windows.push((start, last.end_ms, None));
    }
    windows
}

/// Input windows are validated: ordered, non-overlapping, non-degenerate.
fn close_gaps(mut bounds: Vec<(u64, u64)>, recording_end: Option<u64>) -> Vec<(u64, u64)> {
    for idx in 1..bounds.len() {
        let gap_start = bounds[idx - 1].1;
        let gap_end = bounds[idx].0;
        if gap_end > gap_start {
            let mid = gap_start + (gap_end - gap_start) / 2;
            bounds[idx - 1].1 = mid;
            bounds[idx].0 = mid;
        }
    }
    if let Some(first) = bounds.first_mut() {
        first.0 = 0;
    }
    if let (Some(last), Some(end)) = (bounds.last_mut(), recording_end) {
        last.1 = last.1.max(end);
    }
    bounds
}

fn words_within(words: &[TranscriptWord], start_ms: u64, end_ms: u64) -> String {
    words
        .iter()
        .filter(|word| {
            let mid = word.start_ms + (word.end_ms - word.start_ms) / 2;
            start_ms <= mid && mid < end_ms
        })
        .map(|word| word.text.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_text(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter(|c| {
            c.is_alphanumeric() || c.is_whitespace() || TEXT_PUNCTUATION_WHITELIST.contains(c)
        })
        .collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}
