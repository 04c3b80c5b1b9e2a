// src/services/format.rs
//
// Display helpers shared by the painter. Everything here is total: bad input
// turns into the placeholder dash, never an error.
use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const PLACEHOLDER: &str = "-";
pub const ELLIPSIS: &str = "...";

/// Normalize free text so it survives the builtin (WinAnsi) PDF fonts.
pub fn sanitize(raw: &str) -> String {
    let mut replaced = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\u{20B9}' => replaced.push_str("Rs "),
            '\u{2018}' | '\u{2019}' => replaced.push('\''),
            '\u{201C}' | '\u{201D}' => replaced.push('"'),
            '\u{2013}' | '\u{2014}' => replaced.push('-'),
            '\u{2022}' | '\u{2023}' | '\u{2043}' => replaced.push('*'),
            c if c.is_whitespace() => replaced.push(' '),
            c if c.is_ascii_graphic() => replaced.push(c),
            _ => {}
        }
    }
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitized text, or the placeholder when nothing printable is left.
pub fn clean(raw: &str) -> String {
    let text = sanitize(raw);
    if text.is_empty() { PLACEHOLDER.to_string() } else { text }
}

pub fn text_or_dash(value: Option<&str>) -> String {
    value.map(clean).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Cut `text` to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= ELLIPSIS.len() {
        return text.chars().take(max_chars).collect();
    }
    let kept: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}

/// `Rs` amount with Indian digit grouping. Missing, zero and non-finite
/// amounts all render as the placeholder.
pub fn currency(amount: Option<f64>) -> String {
    match amount {
        Some(v) if v.is_finite() && v != 0.0 => format!("Rs {}", grouped(v, indian_grouping)),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Whole-number count with western grouping.
pub fn count(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => grouped(v.round(), western_grouping),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn percent(part: f64, whole: f64) -> String {
    if whole > 0.0 && part.is_finite() && whole.is_finite() {
        format!("{:.1}%", part / whole * 100.0)
    } else {
        PLACEHOLDER.to_string()
    }
}

/// `DD-Mon-YYYY`, e.g. `05-Mar-2024`.
pub fn date(raw: Option<&str>) -> String {
    raw.and_then(parse_date)
        .map(|d| d.format("%d-%b-%Y").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// `1st`, `2nd`, `3rd`, `4th`, `11th`, `21st`...
pub fn ordinal(n: u64) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Greedy word wrap. Words longer than a line are split hard.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: String = word.to_string();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max_chars).collect();
            word = word.chars().skip(max_chars).collect();
            lines.push(head);
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() { word.len() } else { current.len() + 1 + word.len() };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn grouped(value: f64, group: fn(&str) -> String) -> String {
    let cents = (value.abs() * 100.0).round();
    let whole = (cents / 100.0).trunc();
    let frac = (cents - whole * 100.0) as u32;
    let mut out = String::new();
    if value < 0.0 && cents > 0.0 {
        out.push('-');
    }
    out.push_str(&group(&format!("{whole:.0}")));
    match frac {
        0 => {}
        f if f % 10 == 0 => out.push_str(&format!(".{}", f / 10)),
        f => out.push_str(&format!(".{f:02}")),
    }
    out
}

fn indian_grouping(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (h, t) = rest.split_at(rest.len() - 2);
        groups.push(t);
        rest = h;
    }
    groups.push(rest);
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

fn western_grouping(digits: &str) -> String {
    let mut groups = Vec::new();
    let mut rest = digits;
    while rest.len() > 3 {
        let (h, t) = rest.split_at(rest.len() - 3);
        groups.push(t);
        rest = h;
    }
    groups.push(rest);
    groups.reverse();
    groups.join(",")
}
