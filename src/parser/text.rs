// src/parser/text.rs

//! Line and token scanners shared by the extraction passes.
//!
//! Everything here is a hand-written scanner over fixed, well-known tokens:
//! notice numbers, notice headers, `Chart <id>` references and
//! `Charts affected -` lists. None of them can fail; a non-matching input
//! simply yields `None` or an empty list.

use crate::models::{ChartId, TpKind};

/// Iterate lines together with the byte offset where each line starts.
///
/// A trailing `\r` is removed from the yielded line.
pub fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split('\n').map(move |line| {
        let start = offset;
        offset += line.len() + 1;
        (start, line.strip_suffix('\r').unwrap_or(line))
    })
}

/// A notice number as printed: `770`, `759*`, `762(T)/26`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NmToken {
    /// Printed number without `*`
    pub printed: String,
    pub base: u32,
    pub is_new: bool,
    pub tp_kind: Option<TpKind>,
    /// Bytes consumed from the input
    pub len: usize,
}

fn leading_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

/// Parse a notice number at the start of `s`.
pub fn parse_nm_token(s: &str) -> Option<NmToken> {
    let digits = leading_digits(s);
    if !(3..=5).contains(&digits) {
        return None;
    }
    let base: u32 = s[..digits].parse().ok()?;
    let rest = &s[digits..];

    if rest.starts_with('*') {
        return Some(NmToken {
            printed: s[..digits].to_string(),
            base,
            is_new: true,
            tp_kind: None,
            len: digits + 1,
        });
    }

    if let Some(tp_kind) = parse_tp_suffix(rest) {
        let (kind, suffix_len) = tp_kind;
        return Some(NmToken {
            printed: s[..digits + suffix_len].to_string(),
            base,
            is_new: false,
            tp_kind: Some(kind),
            len: digits + suffix_len,
        });
    }

    Some(NmToken {
        printed: s[..digits].to_string(),
        base,
        is_new: false,
        tp_kind: None,
        len: digits,
    })
}

/// Parse `(T)/YY` or `(P)/YYYY`, returning the kind and suffix length.
fn parse_tp_suffix(s: &str) -> Option<(TpKind, usize)> {
    let bytes = s.as_bytes();
    if bytes.len() < 6 || bytes[0] != b'(' || bytes[2] != b')' || bytes[3] != b'/' {
        return None;
    }
    let kind = TpKind::from_letter(bytes[1] as char)?;
    let year_digits = leading_digits(&s[4..]);
    if !(2..=4).contains(&year_digits) {
        return None;
    }
    Some((kind, 4 + year_digits))
}

/// A notice header line found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine<'a> {
    /// Byte offset of the line start
    pub offset: usize,
    pub nm: NmToken,
    /// Text after the spacing: `ENGLAND - East Coast - ...`
    pub rest: &'a str,
}

/// Parse a notice header: number, 3+ blanks, ALL-CAPS place, then a dash.
///
/// Index entries such as `759*2.8      1, 2` are rejected by the spacing rule.
pub fn parse_header_line(line: &str) -> Option<(NmToken, &str)> {
    let nm = parse_nm_token(line)?;
    let after = &line[nm.len..];
    let blanks = after.bytes().take_while(|b| *b == b' ' || *b == b'\t').count();
    if blanks < 3 {
        return None;
    }
    let rest = &after[blanks..];
    if !is_place_then_dash(rest) {
        return None;
    }
    Some((nm, rest.trim_end()))
}

/// `ENGLAND - ...`, `NEW ZEALAND -`, `CANADA-  ...` style place prefix.
fn is_place_then_dash(s: &str) -> bool {
    let mut letters = 0;
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_uppercase() => letters += 1,
        _ => return false,
    }
    for (i, c) in chars {
        match c {
            'A'..='Z' => letters += 1,
            ' ' | '\t' => {}
            '-' => {
                let next = s[i + 1..].chars().next();
                return letters >= 2 && next.is_none_or(char::is_whitespace);
            }
            _ => return false,
        }
    }
    false
}

/// First pass over a text: every notice header, in order.
pub fn find_headers(text: &str) -> Vec<HeaderLine<'_>> {
    lines_with_offsets(text)
        .filter_map(|(offset, line)| {
            parse_header_line(line).map(|(nm, rest)| HeaderLine { offset, nm, rest })
        })
        .collect()
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// A `Chart <id>` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRef<'a> {
    /// Byte offset of the word `Chart`
    pub offset: usize,
    pub id: ChartId,
    pub token: &'a str,
    /// Character right after the id, if any
    pub followed_by: Option<char>,
}

impl ChartRef<'_> {
    /// The strict direct-match form: id followed by whitespace, `(` or `[`.
    pub fn is_direct_form(&self) -> bool {
        matches!(self.followed_by, Some(c) if c.is_whitespace() || c == '(' || c == '[')
    }
}

/// Every `Chart <id>` reference in a text (case-insensitive, word-bounded).
pub fn chart_references(text: &str) -> Vec<ChartRef<'_>> {
    let lowered = text.to_ascii_lowercase();
    let bytes = lowered.as_bytes();
    let mut refs = Vec::new();
    let mut from = 0;

    while let Some(found) = lowered[from..].find("chart") {
        let start = from + found;
        from = start + 5;

        if start > 0 && is_word_byte(bytes[start - 1]) {
            continue;
        }
        let ws = text[from..]
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(char::len_utf8)
            .sum::<usize>();
        if ws == 0 {
            continue;
        }
        let token_start = from + ws;
        let token_len = bytes[token_start..]
            .iter()
            .take_while(|b| is_word_byte(**b))
            .count();
        let token = &text[token_start..token_start + token_len];
        if let Some(id) = ChartId::parse(token) {
            refs.push(ChartRef {
                offset: start,
                id,
                token,
                followed_by: text[token_start + token_len..].chars().next(),
            });
        }
    }
    refs
}

/// Position just after the dash of the next `Chart(s) affected -` at or
/// after byte `from`.
fn find_affected_marker(text: &str, from: usize) -> Option<usize> {
    let lowered = text.to_ascii_lowercase();
    let bytes = lowered.as_bytes();
    let mut from = from;

    while let Some(found) = lowered[from..].find("chart") {
        let start = from + found;
        from = start + 5;
        if start > 0 && is_word_byte(bytes[start - 1]) {
            continue;
        }
        let mut pos = from;
        if bytes.get(pos) == Some(&b's') {
            pos += 1;
        }
        let ws = bytes[pos..].iter().take_while(|b| b.is_ascii_whitespace()).count();
        if ws == 0 || !lowered[pos + ws..].starts_with("affected") {
            continue;
        }
        pos += ws + "affected".len();
        pos += bytes[pos..].iter().take_while(|b| b.is_ascii_whitespace()).count();
        if bytes.get(pos) == Some(&b'-') {
            return Some(pos + 1);
        }
    }
    None
}

/// Longest prefix of one line made of list characters.
fn list_prefix(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\r' | b'-' | b'(' | b')' | b',' | b'_' | b'0'..=b'9' => i += 1,
            b'I' if line[i..].starts_with("INT") => i += 3,
            _ => break,
        }
    }
    &line[..i]
}

/// Parse chart numbers out of list text, skipping `INT nnnn` cross-references.
///
/// Panel ids such as `5607_7` reduce to their base chart.
pub fn parse_chart_list(list: &str) -> Vec<u32> {
    let bytes = list.as_bytes();
    let mut charts: Vec<u32> = Vec::new();
    let mut after_int = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_digit() {
            let digits = leading_digits(&list[i..]);
            let mut end = i + digits;
            if bytes.get(end) == Some(&b'_') {
                end += 1 + leading_digits(&list[end + 1..]);
            }
            let followed_by_word = bytes.get(end).is_some_and(|b| b.is_ascii_alphabetic());
            if !after_int && !followed_by_word && (1..=5).contains(&digits) {
                if let Ok(n) = list[i..i + digits].parse::<u32>() {
                    if n > 0 && !charts.contains(&n) {
                        charts.push(n);
                    }
                }
            }
            after_int = false;
            i = end;
        } else if b.is_ascii_alphabetic() {
            let len = bytes[i..].iter().take_while(|b| b.is_ascii_alphabetic()).count();
            after_int = &list[i..i + len] == "INT";
            i += len;
        } else {
            if !b.is_ascii_whitespace() {
                after_int = false;
            }
            i += 1;
        }
    }
    charts
}

/// Text of the list that starts at `start`, joined across wrapped lines.
///
/// The list continues onto the next line when a line ends with, or the
/// next line starts with, a `-` or `,` separator.
fn collect_list(text: &str, start: usize) -> String {
    let mut collected = String::new();
    let mut lines = text[start..].split('\n').peekable();

    while let Some(line) = lines.next() {
        let part = list_prefix(line);
        collected.push_str(part);
        collected.push(' ');

        let whole_line = part.len() == line.len();
        let trailing_sep = part.trim_end().ends_with(['-', ',']);
        let next_leads = lines
            .peek()
            .is_some_and(|next| next.trim_start().starts_with(['-', ',']));
        if !(whole_line && (trailing_sep || next_leads)) {
            break;
        }
    }
    collected
}

/// Charts named by every `Chart(s) affected -` list in `text`, in order of
/// first appearance.
///
/// `None` when the text has no such list.
pub fn affected_charts(text: &str) -> Option<Vec<u32>> {
    let mut start = find_affected_marker(text, 0)?;
    let mut charts: Vec<u32> = Vec::new();
    loop {
        for chart in parse_chart_list(&collect_list(text, start)) {
            if !charts.contains(&chart) {
                charts.push(chart);
            }
        }
        match find_affected_marker(text, start) {
            Some(next) => start = next,
            None => return Some(charts),
        }
    }
}
