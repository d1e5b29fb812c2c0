//! CLI interface for Juka.
//!
//! `juka chat` and `juka survey` are interactive and read from stdin; the
//! other commands are one-shot: arguments in, plain text out.
//!
//! Report ids accept a full UUID or an unambiguous prefix.

mod chat;
mod format;
mod survey;

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use jiff::Timestamp;
use uuid::Uuid;

use crate::achievements::{self, CATALOG};
use crate::config::Config;
use crate::conversation::{Conversation, Services};
use crate::model::{TripReport, TripReportWithChat};
use crate::services::{
    FileNameClassifier, OfflineAssistant, RuleExtractor, SpeciesClassifier,
    TranscriptFileRecognizer,
};
use crate::storage::{AchievementStore, ReportStore, Storage};
use crate::survey::Survey;
use crate::user::resolve_user;

use format::{format_report, format_report_line};

/// Juka: your fishing logbook, one conversation at a time.
#[derive(Debug, Parser)]
#[command(name = "juka", after_long_help = USAGE_HELP)]
pub struct Cli {
    /// Angler to act as. Falls back to `JUKA_USER`, then `user-id` in the config.
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

const USAGE_HELP: &str = r#"Logging a trip:
  juka --user marina chat
  > ayer pesqué 3 lubinas desde la orilla
  < ¿Con cuántas cañas pescaste?
  > 2
  > enviar

In chat:
  /voz nota.txt      dictate (transcript file)
  /foto dorada.jpg   attach a photo and identify the species
  /campo lugar       edit a field (especies, cantidad, fecha, modalidad,
                     cañas, lugar, inicio, fin)
  /enviar /cancelar /salir"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chat with the assistant and log trips.
    Chat,

    /// Browse logged trips.
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },

    /// Answer the app questionnaire.
    ///
    /// Type "atrás" to go back; an empty line skips an optional question.
    Survey,

    /// Show the achievement catalogue and what you have unlocked.
    Achievements,

    /// Identify the species in a photo.
    Identify {
        /// Path to the image.
        image: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// List trips, newest first.
    List {
        /// Show at most this many.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one trip with its chat.
    Show {
        /// Report ID: full UUID or unambiguous prefix.
        id: String,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, storage: &Storage) -> Result<(), String> {
    let cli = Cli::parse();

    let user = || resolve_user(cli.user.as_deref(), config);

    match cli.command {
        Command::Chat => cmd_chat(config, storage, &user()?),
        Command::Report { command } => match command {
            ReportCommand::List { limit } => cmd_list(storage, &user()?, limit),
            ReportCommand::Show { id } => cmd_show(storage, &user()?, &id),
        },
        Command::Survey => cmd_survey(storage, &user()?),
        Command::Achievements => cmd_achievements(storage, &user()?),
        Command::Identify { image } => cmd_identify(&image),
    }
}

fn cmd_chat(config: &Config, storage: &Storage, user: &str) -> Result<(), String> {
    let services = Services {
        store: storage,
        extractor: &RuleExtractor,
        assistant: &OfflineAssistant,
        speech: &TranscriptFileRecognizer,
        classifier: &FileNameClassifier,
    };
    let mut conversation = Conversation::new(user, services, config.settings());

    let stdin = io::stdin();
    let stdout = io::stdout();
    chat::run(&mut conversation, stdin.lock(), stdout.lock())
        .map_err(|e| format!("chat failed: {e}"))
}

fn cmd_list(storage: &Storage, user: &str, limit: Option<usize>) -> Result<(), String> {
    let reports = storage
        .reports_with_chat(user, limit)
        .map_err(|e| format!("failed to list reports: {e}"))?;

    if reports.is_empty() {
        println!("No hay partes");
        return Ok(());
    }

    for entry in &reports {
        let line = format_report_line(&entry.report);
        if entry.has_chat() {
            println!("{line}  ({} mensajes)", entry.messages.len());
        } else {
            println!("{line}");
        }
    }

    Ok(())
}

fn cmd_show(storage: &Storage, user: &str, reference: &str) -> Result<(), String> {
    let report = resolve_report(storage, user, reference)?;
    let messages = storage
        .list_chat_for(report.id)
        .map_err(|e| format!("failed to load chat: {e}"))?;

    print!("{}", format_report(&TripReportWithChat { report, messages }));
    Ok(())
}

fn cmd_survey(storage: &Storage, user: &str) -> Result<(), String> {
    let mut survey = Survey::canonical().map_err(|e| format!("invalid questionnaire: {e}"))?;
    let previous = storage
        .load_survey(user)
        .map_err(|e| format!("failed to load survey: {e}"))?;
    if !previous.is_empty() {
        println!("Ya respondiste la encuesta; tus nuevas respuestas sustituirán a las anteriores.");
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let answers = survey::run(&mut survey, stdin.lock(), stdout.lock())
        .map_err(|e| format!("survey failed: {e}"))?;
    let Some(answers) = answers else {
        eprintln!("Encuesta abandonada; no se ha guardado nada.");
        return Ok(());
    };

    let now = Timestamp::now();
    storage
        .save_survey(user, &answers, now)
        .map_err(|e| format!("failed to save survey: {e}"))?;
    println!("¡Gracias por responder la encuesta!");

    let unlocked = achievements::refresh(storage, user, now)
        .map_err(|e| format!("failed to update achievements: {e}"))?;
    for achievement in unlocked {
        println!("🏆 Logro desbloqueado: {}", achievement.title);
    }
    Ok(())
}

fn cmd_achievements(storage: &Storage, user: &str) -> Result<(), String> {
    let held = storage
        .load_achievements(user)
        .map_err(|e| format!("failed to load achievements: {e}"))?;

    for achievement in &CATALOG {
        match held.iter().find(|h| h.achievement_id == achievement.id) {
            Some(h) => println!(
                "[x] {}  {} ({})",
                achievement.title,
                achievement.description,
                h.unlocked_at.strftime("%Y-%m-%d")
            ),
            None => println!("[ ] {}  {}", achievement.title, achievement.description),
        }
    }
    println!("{}/{} desbloqueados", held.len(), CATALOG.len());
    Ok(())
}

fn cmd_identify(image: &Path) -> Result<(), String> {
    let guess = FileNameClassifier
        .classify(image)
        .map_err(|e| format!("failed to identify {}: {e}", image.display()))?;

    println!("{} ({}%)", guess.species, guess.confidence());
    Ok(())
}

/// Resolve a report reference (full UUID or unambiguous prefix) to a report.
fn resolve_report(storage: &Storage, user: &str, reference: &str) -> Result<TripReport, String> {
    // Try full UUID first.
    if let Ok(id) = reference.parse::<Uuid>() {
        let report = storage
            .load_report(id)
            .map_err(|e| format!("report not found: {e}"))?;
        if report.user_id != user {
            return Err(format!("no report matching '{reference}'"));
        }
        return Ok(report);
    }

    let ids = storage
        .find_report_ids(user, reference)
        .map_err(|e| format!("failed to look up reports: {e}"))?;

    match ids.as_slice() {
        [] => Err(format!("no report matching '{reference}'")),
        [id] => storage
            .load_report(*id)
            .map_err(|e| format!("failed to load report: {e}")),
        many => {
            let short: Vec<String> = many.iter().map(|id| id.to_string()[..8].to_string()).collect();
            Err(format!(
                "'{reference}' is ambiguous: matches {} reports: {}",
                many.len(),
                short.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use jiff::civil::date;
    use tempfile::TempDir;

    use crate::model::{Catch, STATUS_COMPLETED, TripType};

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("juka")).unwrap();
        (dir, storage)
    }

    fn sample_report(id: Uuid, user: &str) -> TripReport {
        TripReport {
            id,
            user_id: user.into(),
            date: date(2024, 5, 11),
            start_time: None,
            end_time: None,
            duration_minutes: None,
            catches: vec![Catch {
                species: "Sargo".into(),
                count: 1,
                observation: None,
            }],
            total_count: 1,
            trip_type: TripType::Kayak,
            rods: 1,
            location: None,
            photos: vec![],
            transcript: None,
            user_info: BTreeMap::new(),
            created_at: Timestamp::now(),
            status: STATUS_COMPLETED.into(),
        }
    }

    #[test]
    fn resolves_full_id_and_prefix() {
        let (_dir, storage) = test_storage();
        let id: Uuid = "a3b0fc12-0000-4000-8000-000000000001".parse().unwrap();
        storage.save_report(&sample_report(id, "marina"), &[]).unwrap();

        assert_eq!(resolve_report(&storage, "marina", &id.to_string()).unwrap().id, id);
        assert_eq!(resolve_report(&storage, "marina", "a3b0").unwrap().id, id);
    }

    #[test]
    fn other_users_reports_are_not_visible() {
        let (_dir, storage) = test_storage();
        let id: Uuid = "a3b0fc12-0000-4000-8000-000000000001".parse().unwrap();
        storage.save_report(&sample_report(id, "marina"), &[]).unwrap();

        assert!(resolve_report(&storage, "pablo", "a3b").is_err());
        assert!(resolve_report(&storage, "pablo", &id.to_string()).is_err());
    }

    #[test]
    fn ambiguous_prefix_lists_candidates() {
        let (_dir, storage) = test_storage();
        let first: Uuid = "a3b0fc12-0000-4000-8000-000000000001".parse().unwrap();
        let second: Uuid = "a3b19999-0000-4000-8000-000000000002".parse().unwrap();
        storage.save_report(&sample_report(first, "marina"), &[]).unwrap();
        storage.save_report(&sample_report(second, "marina"), &[]).unwrap();

        let err = resolve_report(&storage, "marina", "a3b").unwrap_err();
        assert!(err.contains("ambiguous"));
        assert!(err.contains("a3b0fc12"));
        assert!(err.contains("a3b19999"));
    }

    #[test]
    fn unknown_prefix_fails() {
        let (_dir, storage) = test_storage();
        let err = resolve_report(&storage, "marina", "ffff").unwrap_err();
        assert_eq!(err, "no report matching 'ffff'");
    }
}
