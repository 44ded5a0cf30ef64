#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    Clear,
    History(Option<usize>),
    Samples,
    Status,
    Trace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

pub(crate) const HELP_TEXT: &str = "Available commands:\n  /help          Show this command list\n  /clear         Clear the conversation transcript\n  /history [n]   Show the transcript (or the last n turns)\n  /samples       List sample questions from the knowledge base\n  /status        Show knowledge base and fallback status\n  /trace         Show path to the current trace file\nType exit or quit to leave.";

pub(crate) fn parse_command(line: &str) -> Result<Command, ParseError> {
    if !is_command_line(line) {
        return Err(ParseError::new("not a command"));
    }

    let command_text = &line.trim()[1..];
    let mut parts = command_text.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_ascii_lowercase();
    if name.is_empty() {
        return Err(ParseError::new("empty command. Try /help"));
    }
    let rest = parts.next().map(str::trim).unwrap_or("");

    match name.as_str() {
        "help" => expect_no_args(rest, Command::Help, "usage: /help"),
        "clear" => expect_no_args(rest, Command::Clear, "usage: /clear"),
        "history" => parse_history(rest),
        "samples" => expect_no_args(rest, Command::Samples, "usage: /samples"),
        "status" => expect_no_args(rest, Command::Status, "usage: /status"),
        "trace" => expect_no_args(rest, Command::Trace, "usage: /trace"),
        _ => Err(ParseError::new(format!(
            "unknown command '/{name}'. Try /help"
        ))),
    }
}

pub(crate) fn is_command_line(line: &str) -> bool {
    line.trim_start().starts_with('/')
}

fn expect_no_args(rest: &str, command: Command, usage: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::new(usage))
    }
}

fn parse_history(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Ok(Command::History(None));
    }

    let value = rest
        .parse::<usize>()
        .map_err(|_| ParseError::new("usage: /history [n]"))?;
    if value == 0 {
        return Err(ParseError::new("usage: /history [n] (n must be >= 1)"));
    }

    Ok(Command::History(Some(value)))
}
