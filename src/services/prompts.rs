//! Prompt templates for every collaborator call.
//!
//! The templates keep the pie/baking framing consistent across the book.

use crate::config::PROMPT_CONTEXT_CHARS;
use crate::utils::tail_chars;

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn outline(title: &str) -> String {
        format!(
            r#"Create a detailed outline for a Python programming book titled "{title}".

The book should use pie/baking metaphors throughout to make Python concepts accessible and fun.
Include:
- 12-15 chapters covering Python from basics to intermediate concepts
- Each chapter should have 3-5 main sections
- Use cooking/baking analogies to explain programming concepts
- Progress from basic ingredients (variables) to complex recipes (functions, classes, etc.)
- Include practical projects that build throughout the book

Format as a structured outline with chapter titles and brief descriptions.
Make it comprehensive but approachable for beginners."#
        )
    }

    pub fn parse_outline(outline: &str) -> String {
        format!(
            r#"Parse this book outline and extract exactly the chapter titles and descriptions:

{outline}

Return ONLY a JSON array of objects with this exact format:
[
  {{"title": "Chapter Title", "description": "Brief description of what this chapter covers"}},
  ...
]

No additional text, just the JSON array."#
        )
    }

    /// Chapter prompt. Only the last few hundred characters of
    /// `previous_context` are embedded.
    pub fn chapter(
        title: &str,
        index: usize,
        chapter_title: &str,
        description: &str,
        previous_context: &str,
    ) -> String {
        let context = if previous_context.is_empty() {
            "This is the first chapter."
        } else {
            tail_chars(previous_context, PROMPT_CONTEXT_CHARS)
        };

        format!(
            r#"Write a complete chapter for the Python book "{title}".

Chapter {index}: {chapter_title}
Description: {description}

Requirements:
- Write 3000-4000 words for this chapter
- Use pie/baking metaphors consistently throughout
- Include practical Python code examples
- Add exercises at the end of each major section
- Make it beginner-friendly but comprehensive
- Include real-world applications
- Use humor and engaging analogies

Previous context: {context}

Structure:
1. Chapter introduction with baking metaphor
2. 3-4 main sections with code examples
3. Practical project/recipe
4. Chapter summary
5. Exercises (3-5 problems)

Write in a conversational, encouraging tone. Make Python feel as approachable as baking a pie!"#
        )
    }

    pub fn introduction(title: &str) -> String {
        format!(
            r#"Write a compelling introduction for "{title}".

Include:
- Welcome message to readers
- Why Python is like baking
- What readers will learn
- How to use this book
- Encouragement for beginners

Make it warm, welcoming, and exciting. About 800-1000 words."#
        )
    }

    pub fn conclusion(title: &str) -> String {
        format!(
            r#"Write a motivating conclusion for "{title}".

Include:
- Congratulations to readers
- Summary of journey
- Next steps in Python learning
- Resources for continued learning
- Final encouragement

About 600-800 words with a celebratory tone."#
        )
    }
}
