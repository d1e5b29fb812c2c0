//! Output formatting for CLI display.

use std::fmt::Write as _;

use crate::model::{AnswerValue, Question, QuestionKind, Sender, TripReport, TripReportWithChat};
use crate::survey::SurveyProgress;

/// One line per report: short id, date, trip type, total and species.
pub(super) fn format_report_line(report: &TripReport) -> String {
    let short_id = &report.id.to_string()[..8];
    let species = report
        .catches
        .iter()
        .map(|c| format!("{} ×{}", c.species, c.count))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{short_id}  {}  [{}]  {} capturas  {species}",
        report.date, report.trip_type, report.total_count
    )
}

/// A report in full, followed by its chat when it has one.
pub(super) fn format_report(entry: &TripReportWithChat) -> String {
    let report = &entry.report;
    let mut out = String::new();
    let _ = writeln!(out, "Parte {}", report.id);
    let _ = writeln!(out, "  Fecha:      {}", report.date);
    if let (Some(start), Some(end)) = (report.start_time, report.end_time) {
        let _ = write!(
            out,
            "  Horario:    {} - {}",
            start.strftime("%H:%M"),
            end.strftime("%H:%M")
        );
        if let Some(minutes) = report.duration_minutes {
            let _ = write!(out, " ({}h{:02})", minutes / 60, minutes % 60);
        }
        out.push('\n');
    } else if let Some(start) = report.start_time {
        let _ = writeln!(out, "  Inicio:     {}", start.strftime("%H:%M"));
    }
    let _ = writeln!(out, "  Modalidad:  {}", report.trip_type);
    let _ = writeln!(out, "  Cañas:      {}", report.rods);
    if let Some(location) = &report.location {
        let _ = writeln!(out, "  Lugar:      {}", location.name);
    }
    let _ = writeln!(out, "  Capturas:   {}", report.total_count);
    for catch in &report.catches {
        let _ = write!(out, "    - {} ×{}", catch.species, catch.count);
        if let Some(observation) = &catch.observation {
            let _ = write!(out, " ({observation})");
        }
        out.push('\n');
    }
    if !report.photos.is_empty() {
        let _ = writeln!(out, "  Fotos:      {}", report.photos.join(", "));
    }
    if let Some(transcript) = &report.transcript {
        let _ = writeln!(out, "  Dictado:    «{transcript}»");
    }

    if entry.has_chat() {
        out.push_str("\nConversación:\n");
        for message in &entry.messages {
            let who = match message.sender {
                Sender::User => ">",
                Sender::Assistant => "<",
            };
            for (i, line) in message.text.lines().enumerate() {
                let marker = if i == 0 { who } else { " " };
                let _ = writeln!(out, "  {marker} {line}");
            }
        }
    }
    out
}

/// An answer as the user would have typed it.
pub(super) fn format_answer(value: &AnswerValue) -> String {
    match value {
        AnswerValue::FreeText(text) | AnswerValue::SingleChoice(text) => text.clone(),
        AnswerValue::MultipleChoice(options) => options.join(", "),
        AnswerValue::Scale(n) => n.to_string(),
        AnswerValue::YesNo(true) => "sí".to_string(),
        AnswerValue::YesNo(false) => "no".to_string(),
    }
}

/// A text progress bar: `[######----] 60%`.
pub(super) fn format_progress(progress: &SurveyProgress) -> String {
    const WIDTH: usize = 10;
    let percent = progress.percent();
    let filled = usize::from(percent) * WIDTH / 100;
    format!(
        "[{}{}] {percent}%",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled)
    )
}

/// A question with its numbered options and an input hint.
pub(super) fn format_question(question: &Question, position: usize, total: usize) -> String {
    let mut out = format!("\n{position}/{total}. {}", question.text);
    if !question.mandatory {
        out.push_str(" (opcional)");
    }
    out.push('\n');
    for (i, option) in question.options.iter().enumerate() {
        let _ = writeln!(out, "   {}) {option}", i + 1);
    }
    let hint = match question.kind {
        QuestionKind::FreeText => "Escribe tu respuesta",
        QuestionKind::SingleChoice => "Elige un número",
        QuestionKind::MultipleChoice => "Elige uno o varios números separados por comas",
        QuestionKind::Scale => "Del 1 al 5",
        QuestionKind::YesNo => "sí / no",
    };
    if question.placeholder.is_empty() {
        let _ = write!(out, "   ({hint})");
    } else {
        let _ = write!(out, "   ({hint}; {})", question.placeholder);
    }
    out
}
