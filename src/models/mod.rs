use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::utils::format_elapsed;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSpec {
    pub title: String,
    pub description: String,
}

impl ChapterSpec {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Which collaborator call is being made. Chapter indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStep {
    Outline,
    ParseOutline,
    Introduction,
    Conclusion,
    Chapter(usize),
}

impl fmt::Display for GenerationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationStep::Outline => write!(f, "outline"),
            GenerationStep::ParseOutline => write!(f, "outline parsing"),
            GenerationStep::Introduction => write!(f, "introduction"),
            GenerationStep::Conclusion => write!(f, "conclusion"),
            GenerationStep::Chapter(n) => write!(f, "chapter {}", n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Outline,
    Introduction,
    Chapter(usize),
    Conclusion,
    CompleteBook,
    Summary,
}

impl ArtifactKind {
    /// File name inside the output directory.
    ///
    /// Numbered artifacts share one zero-padded width derived from the
    /// chapter count, so sorting names sorts reading order.
    pub fn file_name(&self, chapter_count: usize) -> String {
        let width = index_width(chapter_count);
        match self {
            ArtifactKind::Outline => format!("{:0w$}_outline.txt", 1, w = width),
            ArtifactKind::Introduction => format!("{:0w$}_introduction.txt", 2, w = width),
            ArtifactKind::Chapter(n) => {
                format!("{:0w$}_chapter_{:0w$}.txt", n + 2, n, w = width)
            }
            ArtifactKind::Conclusion => {
                format!("{:0w$}_conclusion.txt", chapter_count + 3, w = width)
            }
            ArtifactKind::CompleteBook => "COMPLETE_BOOK.txt".to_string(),
            ArtifactKind::Summary => "generation_summary.txt".to_string(),
        }
    }
}

fn index_width(chapter_count: usize) -> usize {
    (chapter_count + 3).to_string().len().max(2)
}

/// A generated text blob. Never mutated once created.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub content: String,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    Introduction,
    Chapter { index: usize, title: String },
    Conclusion,
}

#[derive(Debug, Clone)]
pub struct BookSection {
    pub kind: SectionKind,
    pub content: String,
}

impl BookSection {
    pub fn heading(&self) -> String {
        match &self.kind {
            SectionKind::Introduction => "Introduction".to_string(),
            SectionKind::Chapter { index, title } => format!("Chapter {}: {}", index, title),
            SectionKind::Conclusion => "Conclusion".to_string(),
        }
    }

    /// Markdown block as it appears in the complete book.
    pub fn render(&self, book_title: &str) -> String {
        match &self.kind {
            SectionKind::Introduction => format!(
                "# {}\n\n## Introduction\n\n{}\n\n",
                book_title, self.content
            ),
            _ => format!("# {}\n\n{}\n\n", self.heading(), self.content),
        }
    }
}

/// Sections generated so far, in reading order. Lives only for one run.
#[derive(Debug, Clone, Default)]
pub struct BookState {
    pub sections: Vec<BookSection>,
}

impl BookState {
    pub fn push(&mut self, kind: SectionKind, content: impl Into<String>) {
        self.sections.push(BookSection {
            kind,
            content: content.into(),
        });
    }

    pub fn chapter_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| matches!(s.kind, SectionKind::Chapter { .. }))
            .count()
    }

    pub fn complete_text(&self, book_title: &str) -> String {
        self.sections
            .iter()
            .map(|s| s.render(book_title))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Outcome of a full generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub run_id: String,
    pub title: String,
    pub output_dir: PathBuf,
    /// Chapter plan the run used, parsed or default.
    pub chapters: Vec<ChapterSpec>,
    pub chapters_written: usize,
    pub failed_steps: Vec<GenerationStep>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
    pub word_count: usize,
    pub char_count: usize,
    pub written: Vec<PathBuf>,
}

impl GenerationReport {
    /// Human-readable summary, persisted as `generation_summary.txt`.
    pub fn format_summary(&self) -> String {
        let mut summary = String::from("\nBOOK GENERATION COMPLETE\n\n");

        summary.push_str(&format!("Title: {}\n", self.title));
        summary.push_str(&format!("Chapters Planned: {}\n", self.chapters.len()));
        summary.push_str(&format!("Chapters Generated: {}\n", self.chapters_written));
        summary.push_str(&format!(
            "Start Time: {}\n",
            self.started_at.format("%H:%M:%S")
        ));
        summary.push_str(&format!(
            "End Time: {}\n",
            self.finished_at.format("%H:%M:%S")
        ));
        summary.push_str(&format!("Total Time: {}\n", format_elapsed(self.elapsed)));
        summary.push_str(&format!("Run ID: {}\n\n", self.run_id));

        summary.push_str(&format!("Files saved in: {}/\n", self.output_dir.display()));
        summary.push_str("- Complete book: COMPLETE_BOOK.txt\n");
        summary.push_str("- Individual chapters: NN_chapter_NN.txt\n");
        summary.push_str("- Introduction & Conclusion included\n\n");

        if !self.failed_steps.is_empty() {
            let failed: Vec<String> = self.failed_steps.iter().map(|s| s.to_string()).collect();
            summary.push_str(&format!("Skipped steps: {}\n\n", failed.join(", ")));
        }

        summary.push_str(&format!("Word count estimate: {} words\n", self.word_count));
        summary.push_str(&format!("Character count: {} characters\n", self.char_count));

        summary
    }
}

// Gemini `generateContent` wire types.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_file_names_sort_in_reading_order() {
        for count in [1usize, 9, 10, 15, 120] {
            let mut names = vec![
                ArtifactKind::Outline.file_name(count),
                ArtifactKind::Introduction.file_name(count),
            ];
            names.extend((1..=count).map(|n| ArtifactKind::Chapter(n).file_name(count)));
            names.push(ArtifactKind::Conclusion.file_name(count));

            let mut sorted = names.clone();
            sorted.sort();
            assert_eq!(sorted, names, "ordering broken for {} chapters", count);
        }
    }

    #[test]
    fn test_file_names_match_classic_layout() {
        assert_eq!(ArtifactKind::Outline.file_name(10), "01_outline.txt");
        assert_eq!(ArtifactKind::Introduction.file_name(10), "02_introduction.txt");
        assert_eq!(ArtifactKind::Chapter(1).file_name(10), "03_chapter_01.txt");
        assert_eq!(ArtifactKind::Chapter(10).file_name(10), "12_chapter_10.txt");
        assert_eq!(ArtifactKind::Conclusion.file_name(10), "13_conclusion.txt");
        assert_eq!(ArtifactKind::Conclusion.file_name(97), "100_conclusion.txt");
        assert_eq!(ArtifactKind::Chapter(5).file_name(97), "007_chapter_005.txt");
    }

    #[test]
    fn test_book_state_assembles_blocks() {
        let mut state = BookState::default();
        state.push(SectionKind::Introduction, "Welcome.");
        state.push(
            SectionKind::Chapter {
                index: 1,
                title: "Crust".to_string(),
            },
            "Flour.",
        );
        state.push(SectionKind::Conclusion, "Bye.");

        assert_eq!(state.chapter_count(), 1);
        assert_eq!(
            state.complete_text("Pie"),
            "# Pie\n\n## Introduction\n\nWelcome.\n\n\n# Chapter 1: Crust\n\nFlour.\n\n\n# Conclusion\n\nBye.\n\n"
        );
        assert_eq!(BookState::default().complete_text("Pie"), "");
    }

    #[test]
    fn test_step_display() {
        assert_eq!(GenerationStep::Chapter(7).to_string(), "chapter 7");
        assert_eq!(GenerationStep::ParseOutline.to_string(), "outline parsing");
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest::from_prompt("Bake a pie");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Bake a pie");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "baker"}]},
                "finishReason": "STOP"
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello, baker"));
        assert_eq!(response.candidates[0].finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert!(response.text().is_none());
    }
}
