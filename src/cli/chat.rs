//! Line-based chat on a terminal.
//!
//! Plain lines are messages. A leading `/` marks a command:
//!
//! - `/voz <archivo>`: dictate a voice note
//! - `/foto <archivo>`: attach a photo
//! - `/campo <nombre>`: edit a field of the report in progress
//! - `/enviar`, `/cancelar`: finish or drop the report
//! - `/salir`: leave the chat

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::conversation::{Conversation, SubmitError};
use crate::report::ReportField;
use crate::report::parse::normalize;

const GREETING: &str = "Hola, soy el asistente de Juka. Cuéntame tu jornada de pesca o \
    pregúntame lo que quieras. Escribe /ayuda para ver los comandos.";

const HELP: &str = "Comandos:
  /voz <archivo>    dictar una nota de voz
  /foto <archivo>   adjuntar una foto e identificar la especie
  /campo <nombre>   corregir un dato del parte
  /enviar           guardar el parte
  /cancelar         descartar el parte
  /salir            terminar";

/// One line of user input.
#[derive(Debug, PartialEq)]
enum Line {
    Text(String),
    Voice(PathBuf),
    Photo(PathBuf),
    Field(ReportField),
    UnknownField(String),
    Submit,
    Cancel,
    Quit,
    Help,
    Unknown(String),
}

impl Line {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Some(Self::Text(line.to_string()));
        };
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        let parsed = match (normalize(name).as_str(), arg) {
            ("voz" | "audio", path) if !path.is_empty() => Self::Voice(PathBuf::from(path)),
            ("foto" | "imagen", path) if !path.is_empty() => Self::Photo(PathBuf::from(path)),
            ("campo", name) => match ReportField::from_name(name) {
                Some(field) => Self::Field(field),
                None => Self::UnknownField(name.to_string()),
            },
            ("enviar", _) => Self::Submit,
            ("cancelar", _) => Self::Cancel,
            ("salir" | "fin", _) => Self::Quit,
            ("ayuda" | "?", _) => Self::Help,
            _ => Self::Unknown(line.to_string()),
        };
        Some(parsed)
    }
}

/// Runs the chat until `/salir` or end of input.
pub(super) fn run<R: BufRead, W: Write>(
    conversation: &mut Conversation<'_>,
    input: R,
    mut output: W,
) -> io::Result<()> {
    writeln!(output, "{GREETING}")?;
    let mut lines = input.lines();

    loop {
        write!(output, "{}", input_marker(conversation))?;
        output.flush()?;
        let Some(line) = lines.next().transpose()? else {
            writeln!(output)?;
            break;
        };
        let Some(line) = Line::parse(&line) else {
            continue;
        };

        let reply = match line {
            Line::Text(text) => conversation.send(&text),
            Line::Voice(path) => conversation.send_voice(&path),
            Line::Photo(path) => conversation.attach_photo(&path),
            Line::Field(field) => conversation.select_field(field),
            Line::UnknownField(name) => {
                let known: Vec<&str> = ReportField::ALL.iter().map(|f| f.label()).collect();
                format!(
                    "No conozco el campo «{name}». Campos: {}.",
                    known.join(", ")
                )
            }
            Line::Submit => match conversation.submit_report() {
                Ok(submitted) => submitted.message(),
                Err(SubmitError::Incomplete(e)) => match conversation.session() {
                    Some(session) => format!("{e}\n{}", session.prompt()),
                    None => e.to_string(),
                },
                Err(e) => e.user_message(),
            },
            Line::Cancel => {
                if conversation.cancel_report() {
                    "Parte cancelado. No se ha guardado nada.".to_string()
                } else {
                    SubmitError::NoReport.user_message()
                }
            }
            Line::Quit => break,
            Line::Help => HELP.to_string(),
            Line::Unknown(command) => {
                format!("No conozco el comando {command}. Escribe /ayuda.")
            }
        };
        writeln!(output, "{reply}")?;
    }

    writeln!(output, "¡Hasta la próxima!")?;
    Ok(())
}

/// Input marker naming the report field being asked for.
fn input_marker(conversation: &Conversation<'_>) -> String {
    let Some(session) = conversation.session() else {
        return "> ".to_string();
    };
    match session.current_field() {
        Some(field) if field.is_mandatory() => format!("[{field}]> "),
        Some(field) => format!("[{field}, opcional]> "),
        None if session.is_ready() => "[parte listo]> ".to_string(),
        None => "[parte]> ".to_string(),
    }
}
