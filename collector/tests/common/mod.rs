#![allow(dead_code)]

use std::io::Read;

use chrono::{Duration, FixedOffset, TimeZone};

use study_collector::models::questionnaire::{LikertSelection, QuestionnaireForm, ITEMS};
use study_collector::models::target::lookup_target;
use study_collector::models::Timestamp;
use study_collector::ExperimentSession;

pub fn new_session() -> ExperimentSession {
    ExperimentSession::new(chrono_tz::America::Edmonton)
}

/// Fixed-offset timestamps so assertions are deterministic.
pub fn ts(secs: i64) -> Timestamp {
    FixedOffset::west_opt(6 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 6, 2, 9, 30, 0)
        .unwrap()
        + Duration::seconds(secs)
}

/// A token the step's target accepts.
pub fn correct_answer_for(step: u8) -> &'static str {
    lookup_target(step).accepted[0]
}

/// Begin, answer correctly once, confirm.
pub fn complete_step(session: &mut ExperimentSession, started: i64, answered: i64, note: &str) {
    let step = session.current_step();
    session.begin_step(ts(started)).unwrap();
    session
        .submit_attempt(correct_answer_for(step), ts(answered))
        .unwrap();
    session.finalize_step(note).unwrap();
}

/// All 24 items answered with the same score.
pub fn filled_form(score: u8) -> QuestionnaireForm {
    let mut form = QuestionnaireForm::new();
    for item in &ITEMS {
        form.select(&LikertSelection {
            code: item.code.to_string(),
            score,
        })
        .unwrap();
    }
    form
}

/// Extracts one named entry of a zip archive as UTF-8 text.
pub fn read_archive_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

pub fn archive_entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    archive.file_names().map(|name| name.to_string()).collect()
}

/// Minimal RFC 4180 reader, enough to round-trip our own tables.
pub fn parse_csv(data: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = data.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                '\r' => {}
                _ => field.push(c),
            }
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
