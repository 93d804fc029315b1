//! Documentation search.
//!
//! SYSTEM CONTEXT
//! ==============
//! The docs portal ships its pages as Markdown/MDX files. At startup this
//! module scans the content directory once, splits each page into heading
//! sections, and keeps the result in memory for `/api/search`.
//!
//! DESIGN
//! ======
//! Pages are parsed with `pulldown-cmark`; code blocks and raw HTML/JSX stay
//! out of the index. Every query term must appear (case-insensitively) in the
//! candidate text. Page-title hits rank above heading hits, which rank above
//! body-text hits.

use std::path::{Component, Path, PathBuf};

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const DEFAULT_SEARCH_LIMIT: usize = 20;
const DOC_EXTENSIONS: &[&str] = &["md", "mdx"];

#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("docs scan task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    title: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// `None` for content before the first heading.
    pub heading: Option<String>,
    pub anchor: Option<String>,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocPage {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Page,
    Heading,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub content: String,
    pub url: String,
}

// =============================================================================
// PARSING
// =============================================================================

/// Split `---` fenced YAML front matter from the body.
#[must_use]
pub fn split_front_matter(source: &str) -> (Option<&str>, &str) {
    let Some(rest) = source.strip_prefix("---\n").or_else(|| source.strip_prefix("---\r\n")) else {
        return (None, source);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, source)
}

/// GitHub-style heading anchor: lowercase, spaces to dashes, punctuation dropped.
#[must_use]
pub fn slugify(heading: &str) -> String {
    heading
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '-' => Some('-'),
            c if c.is_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Map a content-relative path onto its public URL under `/docs`.
#[must_use]
pub fn page_url(relative: &Path) -> String {
    let mut parts: Vec<String> = relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.last().is_some_and(|last| last == "index") {
        parts.pop();
    }
    if parts.is_empty() { "/docs".to_owned() } else { format!("/docs/{}", parts.join("/")) }
}

/// MDX module lines parse as plain paragraphs; they are not content.
fn is_mdx_module_line(text: &str) -> bool {
    text.starts_with("import ") || text.starts_with("export ")
}

#[derive(Default)]
struct SectionBuilder {
    sections: Vec<Section>,
    /// First level-1 heading, used as the page title fallback.
    h1: Option<String>,
    heading: Option<(HeadingLevel, String)>,
    block: String,
    code_depth: usize,
}

impl SectionBuilder {
    fn new() -> Self {
        Self {
            sections: vec![Section { heading: None, anchor: None, paragraphs: Vec::new() }],
            ..Self::default()
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.code_depth > 0 {
            return;
        }
        match &mut self.heading {
            Some((_, heading)) => heading.push_str(text),
            None => self.block.push_str(text),
        }
    }

    fn flush_block(&mut self) {
        let text = self.block.split_whitespace().collect::<Vec<_>>().join(" ");
        self.block.clear();
        if text.is_empty() || is_mdx_module_line(&text) {
            return;
        }
        if let Some(section) = self.sections.last_mut() {
            section.paragraphs.push(text);
        }
    }

    fn finish_heading(&mut self) {
        let Some((level, raw)) = self.heading.take() else {
            return;
        };
        let heading = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if level == HeadingLevel::H1 && self.h1.is_none() {
            self.h1 = Some(heading.clone());
        }
        let anchor = Some(slugify(&heading));
        self.sections.push(Section { heading: Some(heading), anchor, paragraphs: Vec::new() });
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_block();
                self.heading = Some((level, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => self.finish_heading(),
            Event::Start(Tag::CodeBlock(_)) => {
                self.flush_block();
                self.code_depth += 1;
            }
            Event::End(TagEnd::CodeBlock) => self.code_depth = self.code_depth.saturating_sub(1),
            Event::Start(Tag::Item)
            | Event::End(TagEnd::Paragraph | TagEnd::Item | TagEnd::TableHead | TagEnd::TableRow) => self.flush_block(),
            Event::Text(text) | Event::Code(text) => self.push_text(&text),
            Event::SoftBreak | Event::HardBreak | Event::End(TagEnd::TableCell) => self.push_text(" "),
            _ => {}
        }
    }

    fn finish(mut self) -> (Vec<Section>, Option<String>) {
        self.finish_heading();
        self.flush_block();
        self.sections.retain(|s| s.heading.is_some() || !s.paragraphs.is_empty());
        (self.sections, self.h1)
    }
}

/// Split a Markdown body into heading sections of plain-text paragraphs.
/// Code blocks and raw HTML/JSX are not indexed. Also returns the first
/// level-1 heading.
fn split_sections(body: &str) -> (Vec<Section>, Option<String>) {
    let mut builder = SectionBuilder::new();
    for event in Parser::new_ext(body, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH) {
        builder.event(event);
    }
    builder.finish()
}

/// Parse one page's source. `fallback_title` is used when neither front
/// matter nor a top-level heading provides one.
///
/// # Errors
///
/// Returns a YAML error if the front matter is malformed.
pub fn parse_page(url: String, source: &str, fallback_title: &str) -> Result<DocPage, serde_yaml::Error> {
    let (front, body) = split_front_matter(source);
    let front: FrontMatter = match front {
        Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str(yaml)?,
        _ => FrontMatter::default(),
    };
    let (sections, h1) = split_sections(body);
    let title = front.title.or(h1).unwrap_or_else(|| fallback_title.to_owned());

    Ok(DocPage { url, title, description: front.description, sections })
}

fn has_doc_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DOC_EXTENSIONS.contains(&e))
}

/// Every `.md`/`.mdx` file under `dir`, in file-name order. Only an unreadable
/// root is an error; unreadable subdirectories are logged and skipped.
fn collect_doc_files(dir: &Path) -> Result<Vec<PathBuf>, DocsError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                let source = e.into_io_error().unwrap_or_else(|| std::io::Error::other("docs directory walk failed"));
                return Err(DocsError::Io { path, source });
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable docs entry");
                continue;
            }
        };
        if entry.file_type().is_file() && has_doc_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

async fn load_page(dir: &Path, path: &Path) -> Result<DocPage, DocsError> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DocsError::Io { path: path.to_path_buf(), source })?;
    let relative = path.strip_prefix(dir).unwrap_or(path);
    let fallback = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    parse_page(page_url(relative), &source, &fallback)
        .map_err(|source| DocsError::FrontMatter { path: path.to_path_buf(), source })
}

// =============================================================================
// INDEX
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct DocsIndex {
    pages: Vec<DocPage>,
}

impl DocsIndex {
    #[must_use]
    pub fn from_pages(pages: Vec<DocPage>) -> Self {
        Self { pages }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Scan `dir` recursively for `.md`/`.mdx` pages. A page that cannot be
    /// read or has malformed front matter is logged and left out.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` itself cannot be read.
    pub async fn load(dir: &Path) -> Result<Self, DocsError> {
        let root = dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_doc_files(&root)).await??;

        let mut pages = Vec::with_capacity(files.len());
        for path in files {
            match load_page(dir, &path).await {
                Ok(page) => {
                    debug!(url = %page.url, "docs page indexed");
                    pages.push(page);
                }
                Err(e) => warn!(error = %e, "docs page skipped"),
            }
        }

        Ok(Self { pages })
    }

    /// Search titles, headings, and body text. Every whitespace-separated term
    /// must match. An empty query returns nothing.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Vec::new();
        }
        let matches = |text: &str| {
            let text = text.to_lowercase();
            terms.iter().all(|term| text.contains(term.as_str()))
        };

        let mut page_hits = Vec::new();
        let mut heading_hits = Vec::new();
        let mut text_hits = Vec::new();

        for page in &self.pages {
            if matches(&page.title) {
                page_hits.push(SearchResult {
                    id: page.url.clone(),
                    kind: ResultKind::Page,
                    content: page.title.clone(),
                    url: page.url.clone(),
                });
            }
            for (section_idx, section) in page.sections.iter().enumerate() {
                let url = match &section.anchor {
                    Some(anchor) => format!("{}#{anchor}", page.url),
                    None => page.url.clone(),
                };
                if let Some(heading) = section.heading.as_deref().filter(|h| matches(h)) {
                    heading_hits.push(SearchResult {
                        id: format!("{}-h{section_idx}", page.url),
                        kind: ResultKind::Heading,
                        content: heading.to_owned(),
                        url: url.clone(),
                    });
                }
                for (para_idx, paragraph) in section.paragraphs.iter().enumerate() {
                    if matches(paragraph) {
                        text_hits.push(SearchResult {
                            id: format!("{}-s{section_idx}-p{para_idx}", page.url),
                            kind: ResultKind::Text,
                            content: paragraph.clone(),
                            url: url.clone(),
                        });
                    }
                }
            }
        }

        page_hits
            .into_iter()
            .chain(heading_hits)
            .chain(text_hits)
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
