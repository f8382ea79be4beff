use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::models::participant_label;
use crate::models::questionnaire::ITEMS;
use crate::models::record::{QuestionnaireRecord, TaskRecord};

pub const EXPERIMENT_CSV_ENTRY: &str = "experiment_data.csv";
pub const QUESTIONNAIRE_CSV_ENTRY: &str = "questionnaire_data.csv";

/// Quotes a field when it contains a comma, quote or line break; inner quotes
/// are doubled.
fn escape_csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Task table: header plus one row per confirmed step, fixed column order.
pub fn build_experiment_csv(records: &[TaskRecord]) -> Vec<u8> {
    let mut lines = vec![
        "Participant,StepID,StepGroup,System,TargetLabel,StartTime,EndTime,TotalDuration,AttemptCount,ErrorCount,FirstAttemptCorrect,Note"
            .to_string(),
    ];

    for record in records {
        lines.push(format!(
            "{},{},{},{},{},{},{},{:.2},{},{},{},{}",
            escape_csv_field(&record.participant),
            record.step_id,
            record.step_group,
            escape_csv_field(record.system.as_str()),
            escape_csv_field(&record.target_label),
            record.start_time.to_rfc3339(),
            record.end_time.to_rfc3339(),
            record.total_duration,
            record.attempt_count,
            record.error_count,
            record.first_attempt_correct,
            escape_csv_field(&record.note),
        ));
    }

    lines.join("\n").into_bytes()
}

/// Questionnaire table: participant/system/group plus the 24 item scores in
/// fixed item order.
pub fn build_questionnaire_csv(records: &[QuestionnaireRecord]) -> Vec<u8> {
    let mut header = String::from("Participant,System,StepGroup");
    for item in &ITEMS {
        header.push(',');
        header.push_str(item.code);
    }
    let mut lines = vec![header];

    for record in records {
        let mut line = format!(
            "{},{},{}",
            escape_csv_field(&record.participant),
            escape_csv_field(record.system.as_str()),
            record.step_group,
        );
        for score in &record.scores {
            line.push(',');
            line.push_str(&score.to_string());
        }
        lines.push(line);
    }

    lines.join("\n").into_bytes()
}

/// Deflate-compressed zip with up to two CSV entries; an entry is omitted
/// entirely when its record set is empty.
pub fn build_archive(
    task_records: &[TaskRecord],
    questionnaire_records: &[QuestionnaireRecord],
) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    if !task_records.is_empty() {
        writer
            .start_file(EXPERIMENT_CSV_ENTRY, options)
            .context("Failed to open experiment data entry")?;
        writer
            .write_all(&build_experiment_csv(task_records))
            .context("Failed to write experiment data entry")?;
    }

    if !questionnaire_records.is_empty() {
        writer
            .start_file(QUESTIONNAIRE_CSV_ENTRY, options)
            .context("Failed to open questionnaire data entry")?;
        writer
            .write_all(&build_questionnaire_csv(questionnaire_records))
            .context("Failed to write questionnaire data entry")?;
    }

    let cursor = writer.finish().context("Failed to finish archive")?;
    Ok(cursor.into_inner())
}

/// Archive name carries the zero-padded two-digit participant id.
pub fn archive_file_name(participant_id: u32) -> String {
    format!("experiment_data_{}.zip", participant_label(participant_id))
}

/// Single XLSX workbook with both tables as sheets, for researchers who want
/// a spreadsheet without re-importing CSV.
pub fn build_workbook(
    task_records: &[TaskRecord],
    questionnaire_records: &[QuestionnaireRecord],
) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Experiment")?;
    let experiment_columns = [
        "Participant",
        "StepID",
        "StepGroup",
        "System",
        "TargetLabel",
        "StartTime",
        "EndTime",
        "TotalDuration",
        "AttemptCount",
        "ErrorCount",
        "FirstAttemptCorrect",
        "Note",
    ];
    for (col, title) in experiment_columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }
    for (index, record) in task_records.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, &record.participant)?;
        worksheet.write_number(row, 1, record.step_id as f64)?;
        worksheet.write_string(row, 2, record.step_group.as_str())?;
        worksheet.write_string(row, 3, record.system.as_str())?;
        worksheet.write_string(row, 4, &record.target_label)?;
        worksheet.write_string(row, 5, &record.start_time.to_rfc3339())?;
        worksheet.write_string(row, 6, &record.end_time.to_rfc3339())?;
        worksheet.write_number(row, 7, record.total_duration)?;
        worksheet.write_number(row, 8, record.attempt_count as f64)?;
        worksheet.write_number(row, 9, record.error_count as f64)?;
        worksheet.write_boolean(row, 10, record.first_attempt_correct)?;
        worksheet.write_string(row, 11, &record.note)?;
    }

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Questionnaire")?;
    worksheet.write_string_with_format(0, 0, "Participant", &header_format)?;
    worksheet.write_string_with_format(0, 1, "System", &header_format)?;
    worksheet.write_string_with_format(0, 2, "StepGroup", &header_format)?;
    for (offset, item) in ITEMS.iter().enumerate() {
        worksheet.write_string_with_format(0, offset as u16 + 3, item.code, &header_format)?;
    }
    for (index, record) in questionnaire_records.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, &record.participant)?;
        worksheet.write_string(row, 1, record.system.as_str())?;
        worksheet.write_string(row, 2, record.step_group.as_str())?;
        for (offset, score) in record.scores.iter().enumerate() {
            worksheet.write_number(row, offset as u16 + 3, *score as f64)?;
        }
    }

    let mut cursor = Cursor::new(Vec::new());
    workbook
        .save_to_writer(&mut cursor)
        .context("Failed to render workbook")?;
    Ok(cursor.into_inner())
}
