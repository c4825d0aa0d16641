//! Terminal printer for observer events.
//!
//! Assistant messages go to stdout; action traces, questions and status go
//! to stderr so piping stdout captures only what the agent said.

use crate::agent::{AgentEvent, QuestionPrompt};
use crossterm::style::{Color, Print, PrintStyledContent, Stylize};
use crossterm::QueueableCommand;
use std::io::{self, Write};

const ACTION_GLYPH: &str = "•";
const QUESTION_GLYPH: &str = "?";

/// Writes events to an output/trace stream pair.
pub struct EventPrinter<O: Write, T: Write> {
    out: O,
    trace: T,
    color: bool,
}

impl EventPrinter<io::Stdout, io::Stderr> {
    pub fn stdio(color: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), color)
    }
}

impl<O: Write, T: Write> EventPrinter<O, T> {
    pub fn new(out: O, trace: T, color: bool) -> Self {
        Self { out, trace, color }
    }

    pub fn render(&mut self, event: &AgentEvent) -> io::Result<()> {
        match event {
            AgentEvent::AgentMessage(message) => {
                writeln!(self.out, "{}", message.content)?;
                self.out.flush()
            }
            AgentEvent::AgentAction(action) => {
                let line = match &action.detail {
                    Some(detail) => format!("{} {detail}", action.tool),
                    None => action.tool.clone(),
                };
                self.styled_line(ACTION_GLYPH, Color::DarkCyan, &line)
            }
            AgentEvent::AskUser(notice) => {
                self.question(&QuestionPrompt::from(notice.clone()))
            }
            AgentEvent::AgentDone(done) => match &done.error {
                Some(error) => self.error(error),
                None => Ok(()),
            },
            AgentEvent::Config(summary) => {
                let backend = if summary.backend_url.is_empty() {
                    "-"
                } else {
                    summary.backend_url.as_str()
                };
                let line = format!(
                    "{} via {} (backend: {backend}, key: {})",
                    summary.model,
                    summary.mode,
                    if summary.has_api_key { "set" } else { "unset" }
                );
                self.styled_line("config", Color::DarkGrey, &line)
            }
        }
    }

    /// Question text plus numbered options, the recommended one marked.
    pub fn question(&mut self, prompt: &QuestionPrompt) -> io::Result<()> {
        self.styled_line(QUESTION_GLYPH, Color::Yellow, &prompt.question)?;
        let recommended = prompt.recommended();
        for (index, option) in prompt.options.iter().enumerate() {
            let marker = if recommended == Some(index) {
                " (recommended)"
            } else {
                ""
            };
            writeln!(self.trace, "  {}. {option}{marker}", index + 1)?;
        }
        let hint = if prompt.has_options() {
            "Answer with a number or text (blank = Yes): "
        } else {
            "Answer (blank = Yes): "
        };
        write!(self.trace, "{hint}")?;
        self.trace.flush()
    }

    pub fn warn(&mut self, message: &str) -> io::Result<()> {
        self.styled_line("warning:", Color::Yellow, message)
    }

    pub fn error(&mut self, message: &str) -> io::Result<()> {
        self.styled_line("error:", Color::Red, message)
    }

    fn styled_line(&mut self, label: &str, color: Color, text: &str) -> io::Result<()> {
        if self.color {
            self.trace
                .queue(PrintStyledContent(label.with(color).bold()))?
                .queue(Print(format!(" {text}\n")))?;
        } else {
            writeln!(self.trace, "{label} {text}")?;
        }
        self.trace.flush()
    }
}
