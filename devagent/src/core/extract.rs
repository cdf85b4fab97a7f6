//! Parsing of semi-structured model output into named fields.
//!
//! Two shapes are recognised:
//!
//! - **pair**: a title block and a body block separated by the first blank line;
//! - **triple**: `Title:`, `Body:` and `Labels:` sections in that order.
//!
//! Parsing is all-or-nothing. Callers decide what a failure means: the pull
//! request flow falls back to [`DEFAULT_TITLE`], the issue flow reports the
//! raw text.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Title used when a pull request description cannot be split.
pub const DEFAULT_TITLE: &str = "Update code";

const TITLE_MARKER: &str = "Title:";
const BODY_MARKER: &str = "Body:";
const LABELS_MARKER: &str = "Labels:";

static TRIPLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\ATitle:\s*(.*?)\n+Body:\s*(.*?)\n+Labels:\s*(.*)\z")
        .expect("triple pattern should compile")
});

/// Expected structure of a model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Pair,
    Triple,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleBody {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Successfully parsed model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredText {
    Pair(TitleBody),
    Triple(IssueDraft),
}

/// Model output did not match the requested [`Shape`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no blank line separates a non-empty title from a non-empty body")]
    NoBlankLine { raw: String },
    #[error("missing `{marker}` section")]
    MissingMarker { marker: &'static str, raw: String },
    #[error("`Title:`, `Body:` and `Labels:` sections are out of order")]
    OutOfOrder { raw: String },
}

impl ParseError {
    /// The unparsed model text.
    pub fn raw(&self) -> &str {
        match self {
            ParseError::NoBlankLine { raw }
            | ParseError::MissingMarker { raw, .. }
            | ParseError::OutOfOrder { raw } => raw,
        }
    }
}

pub fn extract(text: &str, shape: Shape) -> Result<StructuredText, ParseError> {
    match shape {
        Shape::Pair => extract_pair(text).map(StructuredText::Pair),
        Shape::Triple => extract_triple(text).map(StructuredText::Triple),
    }
}

/// Split at the first blank line. Both sides are returned exactly as written.
pub fn extract_pair(text: &str) -> Result<TitleBody, ParseError> {
    let no_split = || ParseError::NoBlankLine {
        raw: text.to_string(),
    };
    let (title, body) = text.split_once("\n\n").ok_or_else(no_split)?;
    if title.trim().is_empty() || body.trim().is_empty() {
        return Err(no_split());
    }
    Ok(TitleBody {
        title: title.to_string(),
        body: body.to_string(),
    })
}

/// [`extract_pair`], falling back to `(DEFAULT_TITLE, text)`.
pub fn pair_or_default(text: &str) -> TitleBody {
    extract_pair(text).unwrap_or_else(|_| TitleBody {
        title: DEFAULT_TITLE.to_string(),
        body: text.to_string(),
    })
}

pub fn extract_triple(text: &str) -> Result<IssueDraft, ParseError> {
    let trimmed = text.trim_start();
    let Some(caps) = TRIPLE_RE.captures(trimmed) else {
        return Err(diagnose_triple(text));
    };
    let labels = caps[3]
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect();
    Ok(IssueDraft {
        title: caps[1].to_string(),
        body: caps[2].to_string(),
        labels,
    })
}

fn diagnose_triple(text: &str) -> ParseError {
    let raw = text.to_string();
    for marker in [TITLE_MARKER, BODY_MARKER, LABELS_MARKER] {
        if !text.contains(marker) {
            return ParseError::MissingMarker { marker, raw };
        }
    }
    ParseError::OutOfOrder { raw }
}
