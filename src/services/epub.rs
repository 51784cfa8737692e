use epub_builder::{EpubBuilder, EpubContent, ReferenceType, ZipLibrary};
use regex::Regex;

use crate::error::BookError;
use crate::models::{BookSection, BookState};

pub const EPUB_FILE_NAME: &str = "COMPLETE_BOOK.epub";

/// Block-level patterns, compiled once per export.
struct MarkupRules {
    paragraph_break: Regex,
    heading: Regex,
}

impl MarkupRules {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            paragraph_break: Regex::new(r"\n\s*\n")?,
            heading: Regex::new(r"^#{1,6}\s+(.+)$")?,
        })
    }

    fn split_paragraphs<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.paragraph_break
            .split(text)
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .collect()
    }

    /// Text of a single-line Markdown heading (`#` to `######`).
    fn markdown_heading<'a>(&self, block: &'a str) -> Option<&'a str> {
        if block.contains('\n') {
            return None;
        }
        let captures = self.heading.captures(block)?;
        captures.get(1).map(|m| m.as_str().trim())
    }
}

/// Package the generated sections as an EPUB, one XHTML file per section.
pub fn render_epub(book_title: &str, state: &BookState) -> Result<Vec<u8>, BookError> {
    let rules = MarkupRules::new().map_err(export_err)?;
    let pages: Vec<(String, String, String)> = state
        .sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            (
                format!("section_{:03}.xhtml", i + 1),
                section.heading(),
                section_to_xhtml(section, &rules),
            )
        })
        .collect();

    let zip = ZipLibrary::new().map_err(export_err)?;
    let mut builder = EpubBuilder::new(zip).map_err(export_err)?;
    builder
        .metadata("title", book_title)
        .map_err(export_err)?;
    builder
        .metadata("lang", "en")
        .map_err(export_err)?;

    for (href, heading, xhtml) in &pages {
        builder
            .add_content(
                EpubContent::new(href.as_str(), xhtml.as_bytes())
                    .title(heading.as_str())
                    .reftype(ReferenceType::Text),
            )
            .map_err(export_err)?;
    }
    builder.inline_toc();

    let mut output = Vec::<u8>::new();
    builder
        .generate(&mut output)
        .map_err(export_err)?;
    Ok(output)
}

fn export_err(e: impl std::fmt::Display) -> BookError {
    BookError::ExportFailed(e.to_string())
}

fn section_to_xhtml(section: &BookSection, rules: &MarkupRules) -> String {
    let heading = html_escape::encode_text(&section.heading()).to_string();
    let mut body = format!("<h1>{}</h1>\n", heading);

    for block in rules.split_paragraphs(&section.content) {
        match rules.markdown_heading(block) {
            Some(text) => body.push_str(&format!(
                "<h2>{}</h2>\n",
                html_escape::encode_text(text)
            )),
            None => body.push_str(&format!(
                "<p>{}</p>\n",
                html_escape::encode_text(block).replace('\n', "<br/>")
            )),
        }
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{heading}</title></head>
<body>
{body}</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectionKind;

    #[test]
    fn test_section_to_xhtml_escapes_and_splits() {
        let section = BookSection {
            kind: SectionKind::Chapter {
                index: 2,
                title: "Fillings & Toppings".to_string(),
            },
            content: "## Mixing\n\nif x < 3:\n    bake()\n\n\nDone.".to_string(),
        };
        let xhtml = section_to_xhtml(&section, &MarkupRules::new().unwrap());

        assert!(xhtml.contains("<h1>Chapter 2: Fillings &amp; Toppings</h1>"));
        assert!(xhtml.contains("<h2>Mixing</h2>"));
        assert!(xhtml.contains("<p>if x &lt; 3:<br/>    bake()</p>"));
        assert!(xhtml.contains("<p>Done.</p>"));
    }

    #[test]
    fn test_markdown_heading() {
        let rules = MarkupRules::new().unwrap();
        assert_eq!(rules.markdown_heading("### Recipe"), Some("Recipe"));
        assert_eq!(rules.markdown_heading("#hashtag"), None);
        assert_eq!(rules.markdown_heading("# One\nTwo"), None);
    }

    #[test]
    fn test_render_epub_produces_zip() {
        let mut state = BookState::default();
        state.push(SectionKind::Introduction, "Welcome, bakers.");
        state.push(SectionKind::Conclusion, "Go bake.");

        let bytes = render_epub("Pie Book", &state).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
