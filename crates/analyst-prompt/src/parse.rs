//! Tolerant extraction of structured fields from free-form model output
//!
//! Parsing is total: every field has a default and no input makes it fail.

use analyst_core::{AnalystResult, AnalystRole, Recommendation};
use regex::Regex;
use std::sync::LazyLock;

/// Score used when the text carries none
pub const DEFAULT_SCORE: f64 = 70.0;

/// Confidence used when the text carries none
pub const DEFAULT_CONFIDENCE: f64 = 70.0;

/// Maximum items kept per list
pub const MAX_LIST_ITEMS: usize = 5;

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:综合评分|评分|overall\s+score|score)\s*[:：]?\s*(\d{1,3}(?:\.\d+)?)")
        .unwrap_or_else(|e| unreachable!("score pattern: {e}"))
});

static CONFIDENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:综合置信度|置信度|confidence)\s*[:：]?\s*(\d{1,3}(?:\.\d+)?)")
        .unwrap_or_else(|e| unreachable!("confidence pattern: {e}"))
});

static RECOMMENDATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)(?:操作建议|投资建议|建议|recommendation)\s*[:：]\s*([^\n]+)")
        .unwrap_or_else(|e| unreachable!("recommendation pattern: {e}"))
});

static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•·]|\d{1,2}[.、)）]|[（(]\d{1,2}[)）])\s*(.+)$")
        .unwrap_or_else(|e| unreachable!("bullet pattern: {e}"))
});

const KEY_FACTOR_MARKERS: &[&str] = &["关键因素", "主要因素", "key factors"];
const RISK_MARKERS: &[&str] = &["主要风险", "风险因素", "风险", "risks"];
const OPPORTUNITY_MARKERS: &[&str] = &["投资机会", "机会", "opportunities"];
const SUMMARY_MARKERS: &[&str] = &["执行摘要", "摘要", "summary"];

/// Every marker that opens a section; used to stop list collection
const SECTION_MARKERS: &[&[&str]] = &[
    KEY_FACTOR_MARKERS,
    RISK_MARKERS,
    OPPORTUNITY_MARKERS,
    SUMMARY_MARKERS,
    &["综合评分", "评分", "overall score", "score"],
    &["综合置信度", "置信度", "confidence"],
    &["操作建议", "投资建议", "建议", "recommendation"],
];

/// Parse one role's raw answer
pub fn parse_output(role: AnalystRole, raw: &str) -> AnalystResult {
    let text = raw.replace("**", "").replace("__", "");
    let lines: Vec<&str> = text.lines().collect();

    AnalystResult {
        role,
        score: extract_number(&SCORE_RE, &text).unwrap_or(DEFAULT_SCORE),
        confidence: extract_number(&CONFIDENCE_RE, &text)
            .map(scale_fraction)
            .unwrap_or(DEFAULT_CONFIDENCE),
        recommendation: extract_recommendation(&text).unwrap_or_default(),
        key_factors: extract_list(&lines, KEY_FACTOR_MARKERS),
        risks: extract_list(&lines, RISK_MARKERS),
        opportunities: extract_list(&lines, OPPORTUNITY_MARKERS),
        summary: extract_paragraph(&lines, SUMMARY_MARKERS),
        raw_text: raw.to_string(),
        degraded: false,
    }
}

fn extract_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
        .find(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 100.0))
}

/// `0.85` style confidences are read as percentages
fn scale_fraction(value: f64) -> f64 {
    if value > 0.0 && value <= 1.0 && value.fract() != 0.0 {
        value * 100.0
    } else {
        value
    }
}

fn extract_recommendation(text: &str) -> Option<Recommendation> {
    RECOMMENDATION_RE
        .captures_iter(text)
        .find_map(|c| Recommendation::from_label(c.get(1)?.as_str()))
}

/// Strip heading decoration such as `#`, `>` and list markers
///
/// The flag tells whether the line carried a list marker.
fn normalize_heading(line: &str) -> (&str, bool) {
    let trimmed = line.trim().trim_start_matches(['#', '>', ' ']).trim_start();
    match BULLET_RE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(m) => (m.as_str().trim(), true),
        None => (trimmed.trim(), false),
    }
}

/// If `line` opens a section named by `markers`, return its inline body
///
/// A bulleted line only counts as a heading when nothing follows its colon,
/// so list items like `- 风险可控` stay items.
fn section_body<'a>(line: &'a str, markers: &[&str]) -> Option<&'a str> {
    let (heading, bulleted) = normalize_heading(line);
    // ASCII-only lowering keeps byte offsets valid
    let lowered = heading.to_ascii_lowercase();

    for marker in markers {
        if !lowered.starts_with(marker) {
            continue;
        }
        let rest = &heading[marker.len()..];
        if let Some(idx) = rest.find([':', '：']) {
            if rest[..idx].chars().count() <= 6 {
                let colon_len = rest[idx..].chars().next().map_or(1, char::len_utf8);
                let body = rest[idx + colon_len..].trim();
                if bulleted && !body.is_empty() {
                    continue;
                }
                return Some(body);
            }
        } else if !bulleted && rest.trim().chars().count() <= 4 {
            return Some("");
        }
    }
    None
}

fn is_any_section(line: &str) -> bool {
    SECTION_MARKERS
        .iter()
        .any(|markers| section_body(line, markers).is_some())
}

fn bullet_item(line: &str) -> Option<&str> {
    BULLET_RE
        .captures(line.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// Collect the bullet lines that follow a section heading
fn extract_list(lines: &[&str], markers: &[&str]) -> Vec<String> {
    let Some(start) = lines.iter().position(|l| section_body(l, markers).is_some()) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    if let Some(inline) = section_body(lines[start], markers).filter(|s| !s.is_empty()) {
        items.extend(
            inline
                .split(['；', ';', '、'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string),
        );
    }

    for line in &lines[start + 1..] {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(item) = bullet_item(line) {
            if is_any_section(line) && !items.is_empty() {
                break;
            }
            items.push(item.to_string());
        } else {
            break;
        }
    }

    items.truncate(MAX_LIST_ITEMS);
    items
}

/// Inline body of a heading, or the lines up to the next blank line or heading
fn extract_paragraph(lines: &[&str], markers: &[&str]) -> Option<String> {
    let start = lines.iter().position(|l| section_body(l, markers).is_some())?;
    let mut parts: Vec<&str> = Vec::new();
    if let Some(inline) = section_body(lines[start], markers).filter(|s| !s.is_empty()) {
        parts.push(inline);
    }
    for line in &lines[start + 1..] {
        let line = line.trim();
        if line.is_empty() {
            if parts.is_empty() {
                continue;
            }
            break;
        }
        if is_any_section(line) {
            break;
        }
        parts.push(line);
    }
    let summary = parts.join(" ");
    (!summary.is_empty()).then_some(summary)
}
