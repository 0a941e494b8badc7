use crate::core::{ErrorKind, OCRError};
use crate::domain::RegionId;
use crate::processors::BoundingBox;
use serde::{Deserialize, Serialize};

/// Recognized text of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub region_id: RegionId,
    pub text: String,
    /// Decoder confidence in `[0, 1]`.
    pub confidence: f32,
    /// Zero-based row in reading order.
    pub line: usize,
    pub polygon: BoundingBox,
}

/// A region that could not be recognized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFailure {
    pub region_id: RegionId,
    pub kind: ErrorKind,
    pub message: String,
}

impl RegionFailure {
    pub fn from_error(region_id: RegionId, error: &OCRError) -> Self {
        Self {
            region_id,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// How a `process` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptStatus {
    /// Every region was recognized.
    Complete,
    /// At least one region failed; the rest are present.
    PartialFailure,
    /// Cancellation stopped dispatch; see `skipped`.
    Cancelled,
}

/// The result of running the pipeline over one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    failures: Vec<RegionFailure>,
    skipped: Vec<RegionId>,
    status: TranscriptStatus,
}

impl Transcript {
    /// Assembles a transcript. Entries must already be in reading order.
    pub fn new(
        entries: Vec<TranscriptEntry>,
        failures: Vec<RegionFailure>,
        skipped: Vec<RegionId>,
        cancelled: bool,
    ) -> Self {
        let status = if cancelled {
            TranscriptStatus::Cancelled
        } else if failures.is_empty() {
            TranscriptStatus::Complete
        } else {
            TranscriptStatus::PartialFailure
        };
        Self {
            entries,
            failures,
            skipped,
            status,
        }
    }

    /// A transcript for an image without any text regions.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), false)
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn failures(&self) -> &[RegionFailure] {
        &self.failures
    }

    /// Ids of failed regions in reading order.
    pub fn failed_regions(&self) -> Vec<RegionId> {
        self.failures.iter().map(|f| f.region_id).collect()
    }

    /// Regions never dispatched because of cancellation.
    pub fn skipped(&self) -> &[RegionId] {
        &self.skipped
    }

    pub fn status(&self) -> TranscriptStatus {
        self.status
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.failures.is_empty() && self.skipped.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        self.status != TranscriptStatus::Complete
    }

    /// Renders the text: regions of a row joined by a space, rows by a newline.
    pub fn text(&self) -> String {
        let mut lines: Vec<(usize, Vec<&str>)> = Vec::new();
        for entry in self.entries.iter().filter(|e| !e.text.is_empty()) {
            match lines.last_mut() {
                Some((line, words)) if *line == entry.line => words.push(&entry.text),
                _ => lines.push((entry.line, vec![&entry.text])),
            }
        }
        lines
            .into_iter()
            .map(|(_, words)| words.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Converts a transcript with failures into [`OCRError::PartialFailure`].
    pub fn into_complete(self) -> Result<Self, OCRError> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(OCRError::PartialFailure {
                failed: self.failed_regions(),
                total: self.entries.len() + self.failures.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, text: &str, line: usize) -> TranscriptEntry {
        TranscriptEntry {
            region_id: RegionId(id),
            text: text.to_string(),
            confidence: 0.9,
            line,
            polygon: BoundingBox::from_coords(0.0, 0.0, 1.0, 1.0),
        }
    }

    #[test]
    fn test_text_joins_rows_and_regions() {
        let transcript = Transcript::new(
            vec![
                entry(2, "HELLO", 0),
                entry(0, "WORLD", 0),
                entry(1, "", 1),
                entry(3, "again", 2),
            ],
            Vec::new(),
            Vec::new(),
            false,
        );
        assert_eq!(transcript.text(), "HELLO WORLD\nagain");
        assert_eq!(transcript.status(), TranscriptStatus::Complete);
    }

    #[test]
    fn test_failures_make_transcript_partial() {
        let failure = RegionFailure::from_error(RegionId(1), &OCRError::geometry("collinear"));
        let transcript = Transcript::new(vec![entry(0, "ok", 0)], vec![failure], Vec::new(), false);
        assert!(transcript.is_partial());
        assert_eq!(transcript.failed_regions(), vec![RegionId(1)]);
        match transcript.into_complete() {
            Err(OCRError::PartialFailure { failed, total }) => {
                assert_eq!(failed, vec![RegionId(1)]);
                assert_eq!(total, 2);
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_transcript() {
        let transcript = Transcript::empty();
        assert!(transcript.is_empty());
        assert_eq!(transcript.text(), "");
        assert!(transcript.into_complete().is_ok());
    }

    #[test]
    fn test_serializes_to_json() {
        let transcript = Transcript::new(vec![entry(0, "hi", 0)], Vec::new(), Vec::new(), false);
        let json = serde_json::to_value(&transcript).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["entries"][0]["text"], "hi");
        assert_eq!(json["entries"][0]["region_id"], 0);
    }
}
