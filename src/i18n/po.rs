//! Gettext `.po` catalog reader.
//!
//! DESIGN
//! ======
//! A line-oriented state machine. Keyword lines (`msgctxt`, `msgid`,
//! `msgid_plural`, `msgstr`, `msgstr[n]`) open a field; bare quoted lines
//! continue the most recently opened field. An entry is complete once a new
//! `msgctxt`/`msgid`, a comment, or a blank line follows its `msgstr`.
//!
//! Obsolete (`#~`) entries are dropped while reading. Fuzzy and header
//! entries are kept by `parse` and filtered out by `to_messages`.

use super::Messages;

/// Separator between context and id in context-qualified keys (gettext EOT).
pub const CONTEXT_SEPARATOR: char = '\u{4}';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoEntry {
    pub context: Option<String>,
    pub id: String,
    pub id_plural: Option<String>,
    /// `msgstr` at index 0, or `msgstr[n]` at index `n` for plural entries.
    pub translations: Vec<String>,
    pub fuzzy: bool,
}

impl PoEntry {
    /// The header entry carries catalog metadata, not a message.
    #[must_use]
    pub fn is_header(&self) -> bool {
        self.id.is_empty() && self.context.is_none()
    }
}

/// Highest accepted `msgstr[N]`. Real plural rules use at most six forms.
const MAX_PLURAL_INDEX: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoErrorKind {
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unexpected characters after closing quote")]
    TrailingCharacters,
    #[error("expected a quoted string")]
    ExpectedString,
    #[error("invalid escape sequence \\{0}")]
    InvalidEscape(char),
    #[error("unknown keyword {0:?}")]
    UnknownKeyword(String),
    #[error("string continuation without a keyword")]
    OrphanString,
    #[error("{0} before msgid")]
    MissingMsgid(&'static str),
    #[error("invalid plural index {0:?}")]
    BadPluralIndex(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct PoError {
    pub line: usize,
    pub kind: PoErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Context,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Debug, Default)]
struct Pending {
    context: Option<String>,
    id: Option<String>,
    id_plural: Option<String>,
    translations: Vec<String>,
    fuzzy: bool,
}

impl Pending {
    fn has_translation(&self) -> bool {
        !self.translations.is_empty()
    }

    fn is_empty(&self) -> bool {
        self.context.is_none() && self.id.is_none()
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Context => self.context.get_or_insert_with(String::new),
            Field::Id => self.id.get_or_insert_with(String::new),
            Field::IdPlural => self.id_plural.get_or_insert_with(String::new),
            Field::Str(index) => {
                if self.translations.len() <= index {
                    self.translations.resize(index + 1, String::new());
                }
                &mut self.translations[index]
            }
        }
    }
}

struct Parser {
    entries: Vec<PoEntry>,
    pending: Pending,
    field: Option<Field>,
    next_fuzzy: bool,
}

impl Parser {
    fn flush(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        self.field = None;
        if let Some(id) = pending.id {
            self.entries.push(PoEntry {
                context: pending.context,
                id,
                id_plural: pending.id_plural,
                translations: pending.translations,
                fuzzy: pending.fuzzy,
            });
        }
    }

    /// Start a new field, flushing the previous entry when this keyword begins one.
    fn open(&mut self, field: Field, value: String, line: usize) -> Result<(), PoError> {
        match field {
            Field::Context => {
                if !self.pending.is_empty() {
                    self.flush();
                }
            }
            Field::Id => {
                if self.pending.id.is_some() {
                    self.flush();
                }
            }
            Field::IdPlural => {
                if self.pending.id.is_none() {
                    return Err(PoError { line, kind: PoErrorKind::MissingMsgid("msgid_plural") });
                }
            }
            Field::Str(_) => {
                if self.pending.id.is_none() {
                    return Err(PoError { line, kind: PoErrorKind::MissingMsgid("msgstr") });
                }
            }
        }

        if self.pending.is_empty() {
            self.pending.fuzzy = std::mem::take(&mut self.next_fuzzy);
        }
        *self.pending.field_mut(field) = value;
        self.field = Some(field);
        Ok(())
    }

    fn line(&mut self, raw: &str, line: usize) -> Result<(), PoError> {
        let text = raw.trim();

        if text.is_empty() {
            if self.pending.has_translation() {
                self.flush();
            }
            return Ok(());
        }

        if let Some(comment) = text.strip_prefix('#') {
            if self.pending.has_translation() {
                self.flush();
            }
            // Obsolete entries are commented out wholesale.
            if comment.starts_with('~') {
                return Ok(());
            }
            if let Some(flags) = comment.strip_prefix(',') {
                if flags.split(',').any(|f| f.trim() == "fuzzy") {
                    self.next_fuzzy = true;
                }
            }
            return Ok(());
        }

        if text.starts_with('"') {
            let Some(field) = self.field else {
                return Err(PoError { line, kind: PoErrorKind::OrphanString });
            };
            let value = parse_quoted(text, line)?;
            self.pending.field_mut(field).push_str(&value);
            return Ok(());
        }

        let (keyword, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        let field = match keyword {
            "msgctxt" => Field::Context,
            "msgid" => Field::Id,
            "msgid_plural" => Field::IdPlural,
            "msgstr" => Field::Str(0),
            other => match other.strip_prefix("msgstr[").and_then(|s| s.strip_suffix(']')) {
                Some(index) => {
                    let bad = || PoError { line, kind: PoErrorKind::BadPluralIndex(index.to_owned()) };
                    let index = index.parse::<usize>().map_err(|_| bad())?;
                    if index > MAX_PLURAL_INDEX {
                        return Err(bad());
                    }
                    Field::Str(index)
                }
                None => return Err(PoError { line, kind: PoErrorKind::UnknownKeyword(other.to_owned()) }),
            },
        };
        let value = parse_quoted(rest.trim(), line)?;
        self.open(field, value, line)
    }
}

/// Decode one quoted `.po` string literal, including C escapes.
fn parse_quoted(text: &str, line: usize) -> Result<String, PoError> {
    let err = |kind| PoError { line, kind };

    let Some(body) = text.strip_prefix('"') else {
        return Err(err(PoErrorKind::ExpectedString));
    };

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    loop {
        match chars.next() {
            None => return Err(err(PoErrorKind::UnterminatedString)),
            Some('"') => break,
            Some('\\') => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => return Err(err(PoErrorKind::InvalidEscape(other))),
                None => return Err(err(PoErrorKind::UnterminatedString)),
            },
            Some(c) => out.push(c),
        }
    }

    if !chars.as_str().trim().is_empty() {
        return Err(err(PoErrorKind::TrailingCharacters));
    }
    Ok(out)
}

/// Parse a `.po` document into its entries.
///
/// # Errors
///
/// Returns the first syntax error with its 1-based line number.
pub fn parse(input: &str) -> Result<Vec<PoEntry>, PoError> {
    let mut parser = Parser { entries: Vec::new(), pending: Pending::default(), field: None, next_fuzzy: false };
    for (idx, raw) in input.lines().enumerate() {
        parser.line(raw, idx + 1)?;
    }
    parser.flush();
    Ok(parser.entries)
}

fn message_key(context: Option<&str>, id: &str) -> String {
    match context {
        Some(ctx) => format!("{ctx}{CONTEXT_SEPARATOR}{id}"),
        None => id.to_owned(),
    }
}

/// Flatten entries into a message map. Untranslated strings fall back to
/// their source text.
#[must_use]
pub fn to_messages(entries: &[PoEntry]) -> Messages {
    let mut messages = Messages::new();
    for entry in entries {
        if entry.is_header() || entry.fuzzy {
            continue;
        }
        let translated = |index: usize, source: &str| {
            entry
                .translations
                .get(index)
                .filter(|s| !s.is_empty())
                .cloned()
                .unwrap_or_else(|| source.to_owned())
        };

        let context = entry.context.as_deref();
        messages.insert(message_key(context, &entry.id), translated(0, &entry.id));
        if let Some(plural) = &entry.id_plural {
            messages.insert(message_key(context, plural), translated(1, plural));
        }
    }
    messages
}

/// Parse a `.po` document straight into a message map.
///
/// # Errors
///
/// Returns the first syntax error with its 1-based line number.
pub fn parse_messages(input: &str) -> Result<Messages, PoError> {
    parse(input).map(|entries| to_messages(&entries))
}

#[cfg(test)]
#[path = "po_test.rs"]
mod tests;
