use once_cell::sync::Lazy;
use regex::Regex;

use crate::inference::InferenceError;

pub const ELLIPSIS: &str = "...";

/// A heading-anchored capture: the first heading keyword, then that line and
/// up to `following_lines` more, whitespace-collapsed and capped at
/// `max_chars` characters.
pub struct SectionRule {
    pub field: &'static str,
    pub max_chars: usize,
    pattern: Result<Regex, regex::Error>,
}

pub static SKILLS: Lazy<SectionRule> = Lazy::new(|| {
    SectionRule::new(
        "skills",
        &["skills", "technical skills", "core competencies", "technologies"],
        10,
        500,
    )
});

pub static EDUCATION: Lazy<SectionRule> = Lazy::new(|| {
    SectionRule::new("education", &["education", "academic", "qualification"], 5, 300)
});

pub static WORK_EXPERIENCE: Lazy<SectionRule> = Lazy::new(|| {
    SectionRule::new(
        "work_experience",
        &[
            "experience",
            "work experience",
            "employment",
            "professional experience",
        ],
        15,
        1000,
    )
});

pub static CERTIFICATIONS: Lazy<SectionRule> = Lazy::new(|| {
    SectionRule::new(
        "certifications",
        &["certification[s]?", "certificate[s]?", "license[s]?"],
        8,
        500,
    )
});

impl SectionRule {
    /// `headings` are regex alternatives, tried leftmost-first.
    fn new(
        field: &'static str,
        headings: &[&str],
        following_lines: usize,
        max_chars: usize,
    ) -> Self {
        let pattern = Regex::new(&format!(
            r"(?i-u:{})(?-u:[:\s])*([^\n\r]*(?:\n[^\n\r]*){{0,{following_lines}}})",
            headings.join("|"),
        ));
        Self {
            field,
            max_chars,
            pattern,
        }
    }

    pub fn capture(&self, text: &str) -> Result<Option<String>, InferenceError> {
        let pattern = self.pattern.as_ref().map_err(|e| e.clone())?;
        Ok(pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|section| truncate(&collapse_whitespace(section.as_str()), self.max_chars)))
    }
}

/// ASCII whitespace: space, `\t`, `\n`, `\x0B`, `\x0C`, `\r`.
fn is_ascii_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r')
}

/// Runs of ASCII whitespace become one space; the ends are then stripped of
/// anything at or below U+0020, control characters included.
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if is_ascii_space(c) {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out.trim_matches(|c: char| c <= ' ').to_string()
}

/// Caps `s` at `max_chars` characters, marking a cut with [`ELLIPSIS`].
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &s[..cut]),
        None => s.to_string(),
    }
}
