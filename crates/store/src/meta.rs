//! Sidecar metadata codec.
//!
//! Each stored document carries a `<id>.meta` sidecar next to its content
//! file: UTF-8 text, one `key=value` per line, keys among `title`, `author`,
//! `description`, `date`. Values are backslash-escaped so embedded newlines
//! survive the line-oriented format. No header, no versioning; the format is
//! private to the store.

use doc_model::DocumentMetadata;

/// Extension of sidecar files, without the dot.
pub const SIDECAR_EXTENSION: &str = "meta";

/// Decoded contents of a sidecar file.
///
/// Absent keys (or an absent file) leave the corresponding fields empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sidecar {
    pub metadata: DocumentMetadata,
    pub date: String,
}

/// Parses sidecar text.
///
/// Values are split at the first `=` and unescaped; lines without a `=` and
/// unknown keys are ignored rather than treated as errors.
pub fn parse(text: &str) -> Sidecar {
    let mut sidecar = Sidecar::default();

    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        match key {
            "title" => sidecar.metadata.title = unescape(value),
            "author" => sidecar.metadata.author = unescape(value),
            "description" => sidecar.metadata.description = unescape(value),
            "date" => sidecar.date = unescape(value),
            _ => {}
        }
    }

    sidecar
}

/// Serializes metadata to sidecar text, fixed key order, trailing newline.
pub fn serialize(metadata: &DocumentMetadata, date: &str) -> String {
    format!(
        "title={}\nauthor={}\ndescription={}\ndate={}\n",
        escape(&metadata.title),
        escape(&metadata.author),
        escape(&metadata.description),
        escape(date)
    )
}

/// `\` -> `\\`, newline -> `\n`, carriage return -> `\r`. Keeps every value
/// on its own line so a multiline description cannot smuggle in a new key.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            // Unknown escape or trailing backslash: keep it verbatim.
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
