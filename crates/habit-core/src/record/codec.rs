//! Line codec: `id\tname\treward\tscore\tgates\n`.
//!
//! Free-text fields are backslash-escaped so a tab or newline inside a name
//! or reward cannot split the record:
//!
//! | raw  | encoded |
//! |------|---------|
//! | `\`  | `\\`    |
//! | TAB  | `\t`    |
//! | LF   | `\n`    |
//! | CR   | `\r`    |
//!
//! Decoding keeps unknown escapes and a trailing lone backslash literally, so
//! lines written before escaping existed still decode to the same text.

use super::{FieldProblem, HabitRecord, ParseError, RecordField};

const SEPARATOR: char = '\t';

/// Encode one record as a newline-terminated line.
pub fn encode(record: &HabitRecord) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\n",
        record.id,
        escape(&record.name),
        escape(&record.reward),
        record.score,
        record.gates_passed
    )
}

/// Decode one line, with or without its trailing newline.
///
/// Every field is examined even after a failure so the error lists all of
/// them. Any problem rejects the whole line.
pub fn decode(line: &str) -> Result<HabitRecord, ParseError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let fields: Vec<&str> = line.split(SEPARATOR).collect();
    let mut problems = Vec::new();

    if fields.len() > RecordField::ALL.len() {
        problems.push(FieldProblem::FieldCount(fields.len()));
    }

    let id = number(&fields, RecordField::Id, &mut problems);
    let name = text(&fields, RecordField::Name, &mut problems);
    let reward = text(&fields, RecordField::Reward, &mut problems);
    let score = number(&fields, RecordField::Score, &mut problems);
    let gates_passed = number(&fields, RecordField::Gates, &mut problems);

    match (id, name, reward, score, gates_passed) {
        (Some(id), Some(name), Some(reward), Some(score), Some(gates_passed))
            if problems.is_empty() =>
        {
            Ok(HabitRecord {
                id,
                name,
                reward,
                score,
                gates_passed,
            })
        }
        _ => Err(ParseError { problems }),
    }
}

/// Decode one raw line as read from disk. Invalid UTF-8 is a malformed line
/// like any other.
pub fn decode_bytes(line: &[u8]) -> Result<HabitRecord, ParseError> {
    match std::str::from_utf8(line) {
        Ok(text) => decode(text),
        Err(_) => Err(ParseError {
            problems: vec![FieldProblem::InvalidUtf8],
        }),
    }
}

fn position(field: RecordField) -> usize {
    match field {
        RecordField::Id => 0,
        RecordField::Name => 1,
        RecordField::Reward => 2,
        RecordField::Score => 3,
        RecordField::Gates => 4,
    }
}

fn text(fields: &[&str], field: RecordField, problems: &mut Vec<FieldProblem>) -> Option<String> {
    match fields.get(position(field)) {
        Some(raw) => Some(unescape(raw)),
        None => {
            problems.push(FieldProblem::Missing(field));
            None
        }
    }
}

fn number(fields: &[&str], field: RecordField, problems: &mut Vec<FieldProblem>) -> Option<u64> {
    match fields.get(position(field)).map(|raw| raw.trim()) {
        None | Some("") => {
            problems.push(FieldProblem::Missing(field));
            None
        }
        Some(raw) => match raw.parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                problems.push(FieldProblem::NotANumber {
                    field,
                    value: raw.to_string(),
                });
                None
            }
        },
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut chars = encoded.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
