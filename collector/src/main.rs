use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use study_collector::models::questionnaire::{QuestionnaireForm, ITEMS, LIKERT_LABELS};
use study_collector::models::LAST_STEP;
use study_collector::services::export_service;
use study_collector::{Config, ExperimentSession, Phase};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "study_collector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting usability-study collector console");

    let config = Config::load().context("Failed to load configuration")?;
    let tz = config.tz()?;
    tracing::info!("Capturing timestamps in {}", config.timezone);

    let mut session = ExperimentSession::new(tz);
    let mut form = QuestionnaireForm::new();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        render(&session, &form);
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line.context("Failed to read console input")?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" {
            break;
        }
        dispatch(&mut session, &mut form, &config, input)?;
    }

    Ok(())
}

fn dispatch(
    session: &mut ExperimentSession,
    form: &mut QuestionnaireForm,
    config: &Config,
    input: &str,
) -> Result<()> {
    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };

    let outcome = match (session.phase(), command) {
        (Phase::Setup, "start") => match rest.parse::<u32>() {
            Ok(id) => session.start_experiment(id),
            Err(_) => {
                println!("usage: start <participant id>");
                Ok(())
            }
        },
        (Phase::InStep, "begin") => {
            let now = session.now();
            session.begin_step(now)
        }
        (Phase::InStep, "try") => {
            let now = session.now();
            session.submit_attempt(rest, now).map(|correct| {
                if correct {
                    println!("correct");
                } else {
                    println!("incorrect, keep trying");
                }
            })
        }
        (Phase::InStep, "done") => session.finalize_step(rest),
        (Phase::InStep, "back") => session.previous_step(),
        (Phase::InStep, "reset") => session.reset_step(),
        (Phase::GroupComplete(_), "continue") => {
            *form = QuestionnaireForm::new();
            session.continue_to_questionnaire()
        }
        (Phase::Questionnaire(_), "set") => match rest.split_once(char::is_whitespace) {
            Some((code, value)) => form.select_label(code, value.trim()),
            None => {
                println!("usage: set <ITEM_CODE> <1-7>");
                Ok(())
            }
        },
        (Phase::Questionnaire(_), "missing") => {
            println!("unanswered: {}", form.missing().join(", "));
            Ok(())
        }
        (Phase::Questionnaire(_), "back") => session.questionnaire_back(),
        (Phase::Questionnaire(_), "submit") => session.submit_questionnaire(form),
        (Phase::Complete, "export") => {
            write_exports(session, config)?;
            Ok(())
        }
        (Phase::Complete, "new") => {
            session.reset_experiment();
            *form = QuestionnaireForm::new();
            Ok(())
        }
        (_, "dump") => {
            println!(
                "{}",
                serde_json::to_string_pretty(&session.snapshot())
                    .context("Failed to serialize session snapshot")?
            );
            Ok(())
        }
        _ => {
            println!("unknown command '{}' in the {} phase", command, session.phase());
            Ok(())
        }
    };

    if let Err(err) = outcome {
        println!("[{}] {}", err.code(), err);
    }
    Ok(())
}

fn write_exports(session: &ExperimentSession, config: &Config) -> Result<()> {
    let Some(participant_id) = session.participant() else {
        println!("no participant on record");
        return Ok(());
    };

    let archive =
        export_service::build_archive(session.task_records(), session.questionnaire_records())?;
    fs::create_dir_all(&config.export_dir)
        .with_context(|| format!("Failed to create export dir {}", config.export_dir))?;
    let path = Path::new(&config.export_dir).join(export_service::archive_file_name(participant_id));
    fs::write(&path, archive).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "archive written");
    println!("archive written to {}", path.display());

    let workbook =
        export_service::build_workbook(session.task_records(), session.questionnaire_records())?;
    let xlsx_path = path.with_extension("xlsx");
    fs::write(&xlsx_path, workbook)
        .with_context(|| format!("Failed to write {}", xlsx_path.display()))?;
    println!("workbook written to {}", xlsx_path.display());
    Ok(())
}

fn render(session: &ExperimentSession, form: &QuestionnaireForm) {
    match session.phase() {
        Phase::Setup => {
            println!();
            println!("-- setup --");
            println!("commands: start <participant id 1-12>, quit");
        }
        Phase::InStep => {
            let step = session.current_step();
            let target = session.current_target();
            println!();
            println!("-- step {step}/{LAST_STEP} --");
            if let (Some(group), Some(system)) = (session.current_group(), session.current_system())
            {
                println!("group {group} | system {system}");
            }
            println!("target: {}", target.label);
            match session.elapsed_seconds(session.now()) {
                Some(elapsed) => println!(
                    "elapsed {:.1}s | attempts {}{}",
                    elapsed,
                    session.attempt_count(),
                    if session.can_finalize() {
                        " | ready to confirm"
                    } else {
                        ""
                    }
                ),
                None => println!("timer not started"),
            }
            println!("commands: begin, try <answer>, done [note], back, reset, dump, quit");
        }
        Phase::GroupComplete(group) => {
            println!();
            println!("-- group {group} complete --");
            if let Some(assignment) = session.assignment() {
                println!("system evaluated: {}", assignment.system_for(group));
            }
            println!("commands: continue (to questionnaire), dump, quit");
        }
        Phase::Questionnaire(group) => {
            println!();
            println!(
                "-- questionnaire for group {group} ({}/{} answered) --",
                form.answered_count(),
                ITEMS.len()
            );
            if let Some(item) = ITEMS.iter().find(|item| form.score_for(item.code).is_none()) {
                println!("next: {} [{}]", item.code, item.instrument.title());
                println!("  {}", item.prompt);
                println!("  scale: {} .. {}", LIKERT_LABELS[0], LIKERT_LABELS[6]);
            }
            println!("commands: set <CODE> <1-7>, missing, submit, back, dump, quit");
        }
        Phase::Complete => {
            println!();
            println!("-- experiment complete --");
            println!(
                "{} task records, {} questionnaire records",
                session.task_records().len(),
                session.questionnaire_records().len()
            );
            println!("commands: export, dump, new, quit");
        }
    }
}
