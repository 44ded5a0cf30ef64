use super::commands::{Command, HELP_TEXT, is_command_line, parse_command};
use super::theme::Theme;
use crate::assistant::{AnswerSource, Reply, Responder, Role, Session};
use crate::config::{CompletionConfig, ThemeToken};
use crate::knowledge::{KnowledgeStore, MatchConfig};
use crate::llm::backend::CompletionBackend;
use crate::llm::provider::LlmResult;
use crate::trace::{SessionTrace, TraceKind};
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

pub const PROMPT: &str = "you> ";

pub struct AppState {
    pub session_id: String,
    pub store: KnowledgeStore,
    pub matching: MatchConfig,
    pub completion: CompletionConfig,
    /// Holds the startup error when no fallback backend could be built.
    pub llm: LlmResult<CompletionBackend>,
    pub session: Session,
    pub theme: Theme,
    pub trace: SessionTrace,
}

pub async fn run_repl(state: &mut AppState) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{}", state.theme.paint(ThemeToken::SystemInfo, &banner(state)));

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                    break;
                }

                if !line.is_empty() {
                    let _ = rl.add_history_entry(line);
                }

                handle_line(state, line).await;
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

async fn handle_line(state: &mut AppState, line: &str) {
    if is_command_line(line) {
        match parse_command(line) {
            Ok(command) => run_command(state, command),
            Err(err) => println!(
                "{}",
                state.theme.paint(ThemeToken::SystemError, err.message())
            ),
        }
        return;
    }

    ask(state, line).await;
}

async fn ask(state: &mut AppState, question: &str) {
    state.trace.record(TraceKind::Question, question);

    let reply = Responder::new(
        &state.store,
        &state.matching,
        &state.completion,
        state.llm.as_ref().ok(),
    )
    .reply(question)
    .await;

    trace_reply(&state.trace, &reply);
    println!("{}", render_reply(&state.theme, &reply));
    if let Some(hint) = failure_hint(&reply) {
        println!("{}", state.theme.paint(ThemeToken::SystemError, hint));
    }

    state.session.push_question(question);
    state.session.push_reply(&reply);
}

fn trace_reply(trace: &SessionTrace, reply: &Reply) {
    match reply.source {
        AnswerSource::Knowledge { score } => {
            trace.record(TraceKind::KnowledgeMatch, &format!("score {score:.2}"));
        }
        AnswerSource::Generated => {
            trace.record(TraceKind::KnowledgeMiss, &miss_summary(reply));
        }
        AnswerSource::Degraded => {
            trace.record(TraceKind::KnowledgeMiss, &miss_summary(reply));
            let reason = reply.failure.as_ref().map_or_else(
                || "no completion service configured".to_string(),
                ToString::to_string,
            );
            trace.record(TraceKind::Degraded, &reason);
        }
        AnswerSource::Validation => trace.warning("empty question"),
    }
    trace.record(TraceKind::Answer, &reply.text);
}

fn miss_summary(reply: &Reply) -> String {
    format!(
        "best score {:.2}, {} context entries",
        reply.best_score, reply.context_entries
    )
}

pub(crate) fn badge(source: AnswerSource) -> Option<String> {
    match source {
        AnswerSource::Knowledge { score } => Some(format!("[knowledge {score:.2}]")),
        AnswerSource::Generated => Some("[generated]".to_string()),
        AnswerSource::Degraded => Some("[unavailable]".to_string()),
        AnswerSource::Validation => None,
    }
}

fn answer_token(source: AnswerSource) -> ThemeToken {
    match source {
        AnswerSource::Knowledge { .. } => ThemeToken::AnswerKnowledge,
        AnswerSource::Generated => ThemeToken::AnswerGenerated,
        AnswerSource::Degraded => ThemeToken::AnswerDegraded,
        AnswerSource::Validation => ThemeToken::SystemInfo,
    }
}

fn render_answer(theme: &Theme, source: AnswerSource, text: &str) -> String {
    let body = theme.paint(answer_token(source), text);
    match badge(source) {
        Some(badge) => format!("{} {body}", theme.paint(ThemeToken::Badge, &badge)),
        None => body,
    }
}

fn render_reply(theme: &Theme, reply: &Reply) -> String {
    render_answer(theme, reply.source, &reply.text)
}

fn failure_hint(reply: &Reply) -> Option<&'static str> {
    let failure = reply.failure.as_ref()?;
    if failure.is_auth() {
        Some("The completion service rejected the configured API key.")
    } else if failure.is_rate_limited() {
        Some("The completion service is rate limiting requests; try again shortly.")
    } else {
        None
    }
}

fn run_command(state: &mut AppState, command: Command) {
    for line in command_output(state, command) {
        println!("{line}");
    }
}

fn command_output(state: &mut AppState, command: Command) -> Vec<String> {
    let info = |text: &str| state.theme.paint(ThemeToken::SystemInfo, text);
    match command {
        Command::Help => vec![info(HELP_TEXT)],
        Command::Clear => {
            state.session.clear();
            vec![info("Conversation cleared.")]
        }
        Command::History(limit) => history_lines(&state.session, &state.theme, limit),
        Command::Samples => sample_lines(&state.store).iter().map(|l| info(l)).collect(),
        Command::Status => status_lines(state).iter().map(|l| info(l)).collect(),
        Command::Trace => {
            let location = match state.trace.file_path() {
                Some(path) => path.display().to_string(),
                None => "disabled".to_string(),
            };
            vec![info(&format!("Trace file: {location}"))]
        }
    }
}

fn history_lines(session: &Session, theme: &Theme, limit: Option<usize>) -> Vec<String> {
    if session.is_empty() {
        return vec![theme.paint(ThemeToken::SystemInfo, "No conversation yet.")];
    }

    let turns = match limit {
        Some(n) => session.last(n),
        None => session.turns(),
    };
    turns
        .iter()
        .map(|turn| match (turn.role, turn.source) {
            (Role::User, _) => format!(
                "{} {}",
                theme.paint(ThemeToken::HistoryUser, PROMPT.trim_end()),
                turn.text
            ),
            (Role::Assistant, Some(source)) => render_answer(theme, source, &turn.text),
            (Role::Assistant, None) => turn.text.clone(),
        })
        .collect()
}

fn sample_lines(store: &KnowledgeStore) -> Vec<String> {
    if store.is_empty() {
        return vec!["No sample questions: the knowledge base is empty.".to_string()];
    }

    let mut lines = vec!["Try asking:".to_string()];
    lines.extend(
        store
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| format!("  {}. {}", index + 1, entry.question)),
    );
    lines
}

fn status_lines(state: &AppState) -> Vec<String> {
    vec![
        format!("Knowledge entries: {}", state.store.len()),
        format!("Match threshold: {:.2}", state.matching.threshold),
        format!("Fallback: {}", fallback_status(&state.llm)),
        format!("Session: {}", state.session_id),
    ]
}

fn fallback_status(llm: &LlmResult<CompletionBackend>) -> String {
    match llm {
        Ok(backend) => format!("available ({})", backend.describe()),
        Err(err) => format!("unavailable ({err})"),
    }
}

fn banner(state: &AppState) -> String {
    let fallback = match &state.llm {
        Ok(backend) => format!("fallback via {}", backend.describe()),
        Err(_) => "no fallback service".to_string(),
    };
    format!(
        "agentdesk ready: {} knowledge entries, {fallback}. Type /help for commands, exit to quit.",
        state.store.len()
    )
}
