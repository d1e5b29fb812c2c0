//! Interactive questionnaire on a line-based terminal.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use crate::model::{Answer, AnswerValue, Question, QuestionKind};
use crate::report::parse::normalize;
use crate::survey::{AnswerError, SCALE_RANGE, Survey};

use super::format::{format_answer, format_progress, format_question};

const BACK: &[&str] = &["atras", "volver", "<"];

/// Walks the user through `survey`.
///
/// Returns the answer set once every question has been handled, or `None`
/// when input ends first.
pub(super) fn run<R: BufRead, W: Write>(
    survey: &mut Survey,
    input: R,
    mut output: W,
) -> io::Result<Option<BTreeMap<u32, Answer>>> {
    let total = survey.progress().total();
    let mut lines = input.lines();

    while let Some(question) = survey.current_question() {
        let position = survey.progress().current() + 1;
        writeln!(output, "\n{}", format_progress(survey.progress()))?;
        writeln!(output, "{}", format_question(question, position, total))?;
        if let Some(previous) = survey.progress().answer_for(question.id) {
            writeln!(output, "   Respuesta actual: {}", format_answer(&previous.value))?;
        }
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next().transpose()? else {
            return Ok(None);
        };
        let line = line.trim();

        if BACK.contains(&normalize(line).as_str()) {
            if survey.back().is_err() {
                writeln!(output, "Ya estás en la primera pregunta.")?;
            }
            continue;
        }

        let step = if line.is_empty() && !question.mandatory {
            survey.skip()
        } else {
            match parse_answer(question, line) {
                Ok(value) => survey.answer_current(value),
                Err(e) => Err(e.into()),
            }
        };
        if let Err(e) = step {
            writeln!(output, "{e}")?;
        }
    }

    match survey.finish() {
        Ok(answers) => Ok(Some(answers.clone())),
        Err(e) => {
            writeln!(output, "{e}")?;
            Ok(None)
        }
    }
}

/// Reads a typed line as an answer to `question`.
///
/// Choices are picked by number or by their text.
fn parse_answer(question: &Question, line: &str) -> Result<AnswerValue, AnswerError> {
    let missing = || AnswerError::missing(question.kind);
    match question.kind {
        QuestionKind::FreeText => Ok(AnswerValue::FreeText(line.to_string())),
        QuestionKind::SingleChoice => pick_option(question, line)
            .map(AnswerValue::SingleChoice)
            .ok_or_else(missing),
        QuestionKind::MultipleChoice => {
            let picked = line
                .split([',', ';'])
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| pick_option(question, part))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(missing)?;
            Ok(AnswerValue::MultipleChoice(picked))
        }
        QuestionKind::Scale => line
            .parse::<i32>()
            .ok()
            .filter(|n| SCALE_RANGE.contains(n))
            .map(AnswerValue::Scale)
            .ok_or_else(missing),
        QuestionKind::YesNo => match normalize(line).as_str() {
            "si" | "s" | "vale" => Ok(AnswerValue::YesNo(true)),
            "no" | "n" => Ok(AnswerValue::YesNo(false)),
            _ => Err(missing()),
        },
    }
}

fn pick_option(question: &Question, text: &str) -> Option<String> {
    if let Ok(n) = text.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| question.options.get(i))
            .cloned();
    }
    let wanted = normalize(text);
    question
        .options
        .iter()
        .find(|option| normalize(option) == wanted)
        .cloned()
}
