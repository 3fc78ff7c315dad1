//! Interactive read–render loop.
//!
//! Generic over the input reader and output writer so sessions can be driven
//! from stdin/stdout or from in-memory buffers.

use anyhow::Result;
use socratic_core::{StateSnapshot, StaticConfiguration, Tutor, TurnReply};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

/// Inputs that end the session, compared case-insensitively.
pub const EXIT_TOKENS: &[&str] = &["exit", "quit", "salir", "sair", "quitter"];

const RULE: &str = "========================================";

pub fn is_exit_token(input: &str) -> bool {
    let input = input.trim();
    EXIT_TOKENS
        .iter()
        .any(|token| token.eq_ignore_ascii_case(input))
}

pub fn status_line(snapshot: &StateSnapshot) -> String {
    format!(
        "[STATUS] Lvl {} | Flow: {} | Mode: {}",
        snapshot.mastery_level,
        snapshot.flow,
        snapshot.mode.as_str().to_uppercase()
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reads one line, returning `None` at end of input.
async fn read_line<R>(input: &mut R) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Shows the numbered domain menu until a valid choice is made.
///
/// Returns `None` if the input ends before a domain is chosen.
pub async fn select_domain<R, W>(
    config: &StaticConfiguration,
    input: &mut R,
    out: &mut W,
) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let domains: Vec<&str> = config.domains().collect();
    writeln!(out, "\nSelect your domain of mastery:")?;
    for (i, domain) in domains.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, capitalize(domain))?;
    }

    loop {
        write!(out, "\nNumber > ")?;
        out.flush()?;
        let Some(line) = read_line(input).await? else {
            return Ok(None);
        };
        let choice = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| domains.get(i));
        match choice {
            Some(domain) => return Ok(Some(domain.to_string())),
            None => writeln!(out, "Invalid selection.")?,
        }
    }
}

/// Runs turns until an exit token or end of input.
pub async fn run_session<R, W>(tutor: &mut Tutor, input: &mut R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let domain = tutor.controller().state().domain().to_string();
    writeln!(out, "\n[INIT] Domain initialized: {}", domain.to_uppercase())?;
    writeln!(
        out,
        "[INIT] Starting at Level 1: {}",
        tutor.controller().topic_for(1)
    )?;

    loop {
        let snapshot = tutor.controller().snapshot();
        writeln!(out, "\n{}", status_line(&snapshot))?;
        writeln!(
            out,
            "[INFO] Level {}: {}",
            snapshot.mastery_level, snapshot.mastery_topic
        )?;
        write!(out, "\n> Your Input: ")?;
        out.flush()?;

        let Some(line) = read_line(input).await? else {
            info!("Input closed, ending session");
            break;
        };
        let user_input = line.trim();
        if user_input.is_empty() {
            continue;
        }
        if is_exit_token(user_input) {
            info!("Exit requested by learner");
            break;
        }

        writeln!(out, "\n{RULE}\n>>> ARCHITECT RESPONDING... <<<\n{RULE}\n")?;

        let mut write_error = None;
        let report = tutor
            .take_turn(user_input, |chunk| {
                if write_error.is_none() {
                    if let Err(e) = write!(out, "{chunk}").and_then(|_| out.flush()) {
                        write_error = Some(e);
                    }
                }
            })
            .await;
        if let Some(e) = write_error {
            return Err(e.into());
        }

        if let TurnReply::BackendError(_) = &report.reply {
            write!(out, "{}", report.reply.as_history_text())?;
        }
        writeln!(out, "\n")?;

        if let Some(level_up) = report.outcome.and_then(|outcome| outcome.level_up) {
            writeln!(
                out,
                "[MASTERY] Level up: {} - {}",
                level_up.level, level_up.topic
            )?;
        }
    }

    writeln!(out, "Session terminated. Go build something robust.")?;
    Ok(())
}
