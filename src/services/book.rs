//! Book assembly driver.
//!
//! Runs the fixed sequence outline → chapter plan → introduction/conclusion →
//! chapters → complete book → summary. One collaborator call is in flight at
//! a time and every call is followed by a flat pacing delay. A failed step is
//! logged and skipped; only cancellation and I/O failures on the output
//! directory stop the run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{BookConfig, PREVIOUS_CONTEXT_CHARS};
use crate::error::{BookError, Result};
use crate::models::{
    Artifact, ArtifactKind, BookState, ChapterSpec, GenerationReport, GenerationStep, SectionKind,
};
use crate::services::epub::{EPUB_FILE_NAME, render_epub};
use crate::services::llm::TextGenerator;
use crate::services::outline::{decode_chapters, default_chapters};
use crate::services::prompts::PromptBuilder;
use crate::services::storage::ArtifactStore;
use crate::utils::{char_count, format_elapsed, tail_chars, word_count};

/// Continuity context carried from one chapter to the next.
#[derive(Debug, Default)]
pub struct ChapterChain {
    previous: String,
}

impl ChapterChain {
    /// Context for the next chapter; empty until a chapter succeeds.
    pub fn context(&self) -> &str {
        &self.previous
    }

    pub fn advance(&mut self, chapter_content: &str) {
        self.previous = tail_chars(chapter_content, PREVIOUS_CONTEXT_CHARS).to_string();
    }
}

pub struct BookDriver {
    config: BookConfig,
    generator: Arc<dyn TextGenerator>,
    store: ArtifactStore,
    cancel: CancellationToken,
}

impl BookDriver {
    pub fn new(
        config: BookConfig,
        generator: Arc<dyn TextGenerator>,
        cancel: CancellationToken,
    ) -> Self {
        let store = ArtifactStore::new(config.output_dir.clone());
        Self {
            config,
            generator,
            store,
            cancel,
        }
    }

    async fn call(&self, prompt: &str, step: GenerationStep) -> Result<String> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BookError::Cancelled),
            result = self.generator.generate(prompt, step) => {
                result.map_err(|source| BookError::CollaboratorCallFailed { step, source })
            }
        }
    }

    /// Flat rate-limit wait. Returns `Cancelled` if interrupted.
    async fn pace(&self) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BookError::Cancelled),
            _ = tokio::time::sleep(self.config.pacing_delay) => Ok(()),
        }
    }

    pub async fn generate_outline(&self) -> Result<String> {
        tracing::info!("Generating book outline...");
        let outline = self
            .call(&PromptBuilder::outline(&self.config.title), GenerationStep::Outline)
            .await?;
        tracing::info!("Book outline generated");
        Ok(outline)
    }

    /// Chapter plan from an outline. Falls back to the default plan on any
    /// non-fatal failure.
    pub async fn parse_outline(&self, outline: &str) -> Result<Vec<ChapterSpec>> {
        tracing::info!("Parsing outline into chapters...");
        let parsed = self
            .call(
                &PromptBuilder::parse_outline(outline),
                GenerationStep::ParseOutline,
            )
            .await
            .and_then(|response| decode_chapters(&response));

        match parsed {
            Ok(chapters) => {
                tracing::info!("Parsed {} chapters from outline", chapters.len());
                Ok(chapters)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!("Error parsing outline: {}. Using default chapters", e);
                Ok(default_chapters())
            }
        }
    }

    pub async fn generate_chapter(
        &self,
        index: usize,
        title: &str,
        description: &str,
        previous_context: &str,
    ) -> Result<String> {
        tracing::info!("Generating Chapter {}: {}...", index, title);
        let prompt = PromptBuilder::chapter(
            &self.config.title,
            index,
            title,
            description,
            previous_context,
        );
        let content = self.call(&prompt, GenerationStep::Chapter(index)).await?;
        tracing::info!("Chapter {} completed", index);
        Ok(content)
    }

    /// Two independent calls with a pacing delay between them.
    ///
    /// A cancellation during the delay is reported through the conclusion.
    pub async fn generate_intro_and_conclusion(&self) -> (Result<String>, Result<String>) {
        tracing::info!("Generating introduction and conclusion...");
        let intro = self
            .call(
                &PromptBuilder::introduction(&self.config.title),
                GenerationStep::Introduction,
            )
            .await;
        if matches!(intro, Err(BookError::Cancelled)) {
            return (intro, Err(BookError::Cancelled));
        }
        if let Err(e) = self.pace().await {
            return (intro, Err(e));
        }

        let conclusion = self
            .call(
                &PromptBuilder::conclusion(&self.config.title),
                GenerationStep::Conclusion,
            )
            .await;
        (intro, conclusion)
    }

    /// Write an artifact. Failures are logged, never returned.
    pub async fn persist(&self, artifact: &Artifact, chapter_count: usize) -> Option<PathBuf> {
        match self.store.write(artifact, chapter_count).await {
            Ok(path) => {
                tracing::info!("Saved progress to {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        }
    }

    /// Run the whole sequence. Artifacts are on disk as soon as they exist.
    pub async fn run_full_generation(&self) -> Result<GenerationReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("book_run", run_id = %run_id);
        self.run(run_id).instrument(span).await
    }

    async fn run(&self, run_id: String) -> Result<GenerationReport> {
        let started_at = Local::now();
        let start = Instant::now();
        tracing::info!(
            "Starting book generation at {}",
            started_at.format("%H:%M:%S")
        );
        tracing::info!("Book: {}", self.config.title);

        self.store.prepare().await?;

        let mut written = Vec::new();
        let mut failed_steps = Vec::new();

        // Outline, then the chapter plan it yields.
        let outline = match self.generate_outline().await {
            Ok(outline) => {
                let artifact = Artifact::new(ArtifactKind::Outline, outline);
                written.extend(self.persist(&artifact, 0).await);
                self.pace().await?;
                Some(artifact.content)
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("Error generating outline: {}", e);
                failed_steps.push(GenerationStep::Outline);
                None
            }
        };

        let chapters = match outline {
            Some(ref outline) => {
                let chapters = self.parse_outline(outline).await?;
                self.pace().await?;
                chapters
            }
            None => default_chapters(),
        };
        let chapter_count = chapters.len();

        if outline.is_some() {
            self.renumber_outline(chapter_count, &mut written).await;
        }

        let mut state = BookState::default();

        let (introduction, conclusion) = self.generate_intro_and_conclusion().await;
        match introduction {
            Ok(intro) => {
                let artifact = Artifact::new(ArtifactKind::Introduction, intro);
                written.extend(self.persist(&artifact, chapter_count).await);
                state.push(SectionKind::Introduction, artifact.content);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("Error generating introduction: {}", e);
                failed_steps.push(GenerationStep::Introduction);
            }
        }
        let conclusion = match conclusion {
            Ok(text) => Some(text),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("Error generating conclusion: {}", e);
                failed_steps.push(GenerationStep::Conclusion);
                None
            }
        };
        self.pace().await?;

        let mut chain = ChapterChain::default();
        for (i, chapter) in chapters.iter().enumerate() {
            let index = i + 1;
            let generated = self
                .generate_chapter(index, &chapter.title, &chapter.description, chain.context())
                .await;
            match generated {
                Ok(content) => {
                    let artifact = Artifact::new(ArtifactKind::Chapter(index), content);
                    written.extend(self.persist(&artifact, chapter_count).await);
                    chain.advance(&artifact.content);
                    state.push(
                        SectionKind::Chapter {
                            index,
                            title: chapter.title.clone(),
                        },
                        artifact.content,
                    );
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Error generating chapter {}: {}", index, e);
                    failed_steps.push(GenerationStep::Chapter(index));
                }
            }

            if index < chapter_count {
                self.pace().await?;
            }
            tracing::info!(
                "Progress: {}/{} chapters | Elapsed: {}",
                index,
                chapter_count,
                format_elapsed(start.elapsed())
            );
        }

        // The last chapter has no pacing wait after it.
        if self.cancel.is_cancelled() {
            return Err(BookError::Cancelled);
        }

        if let Some(conclusion) = conclusion {
            let artifact = Artifact::new(ArtifactKind::Conclusion, conclusion);
            written.extend(self.persist(&artifact, chapter_count).await);
            state.push(SectionKind::Conclusion, artifact.content);
        }

        let complete_book = state.complete_text(&self.config.title);
        written.extend(
            self.persist(
                &Artifact::new(ArtifactKind::CompleteBook, complete_book.as_str()),
                chapter_count,
            )
            .await,
        );

        if self.config.export_epub {
            written.extend(self.export_epub(&state).await);
        }

        let finished_at = Local::now();
        let mut report = GenerationReport {
            run_id,
            title: self.config.title.clone(),
            output_dir: self.store.root().to_path_buf(),
            chapters,
            chapters_written: state.chapter_count(),
            failed_steps,
            started_at,
            finished_at,
            elapsed: start.elapsed(),
            word_count: word_count(&complete_book),
            char_count: char_count(&complete_book),
            written,
        };

        let summary = Artifact::new(ArtifactKind::Summary, report.format_summary());
        report.written.extend(self.persist(&summary, chapter_count).await);

        tracing::info!(
            "Book generation finished in {}",
            format_elapsed(report.elapsed)
        );
        Ok(report)
    }

    /// The outline is written before the chapter count is known. Re-number it
    /// when the count widens the index.
    async fn renumber_outline(&self, chapter_count: usize, written: &mut [PathBuf]) {
        let provisional = ArtifactKind::Outline.file_name(0);
        let final_name = ArtifactKind::Outline.file_name(chapter_count);
        if provisional == final_name {
            return;
        }
        let provisional_path = self.store.root().join(&provisional);
        let Some(entry) = written.iter_mut().find(|p| **p == provisional_path) else {
            return;
        };
        match self.store.rename(&provisional, &final_name).await {
            Ok(path) => *entry = path,
            Err(e) => tracing::warn!("Could not renumber outline: {}", e),
        }
    }

    async fn export_epub(&self, state: &BookState) -> Option<PathBuf> {
        let bytes = match render_epub(&self.config.title, state) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("{}", e);
                return None;
            }
        };
        match self.store.write_bytes(EPUB_FILE_NAME, &bytes).await {
            Ok(path) => {
                tracing::info!("Saved EPUB to {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        }
    }
}
