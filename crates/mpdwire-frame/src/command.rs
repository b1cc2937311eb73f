//! Command serialization.
//!
//! A command is a name followed by zero or more arguments. Arguments are
//! always double-quoted on the wire, so they may contain spaces.

use crate::error::{FrameError, Result};

/// Enters wait-mode.
pub const IDLE: &str = "idle";
/// Interrupts wait-mode.
pub const NOIDLE: &str = "noidle";
/// Opens a command list.
pub const COMMAND_LIST_BEGIN: &str = "command_list_begin";
/// Closes a command list.
pub const COMMAND_LIST_END: &str = "command_list_end";
/// Asks the server to hang up.
pub const CLOSE: &str = "close";

/// How argument text is escaped inside its double quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuoteStyle {
    /// Escape `"` only.
    QuotesOnly,
    /// Escape `\` and `"`. Arguments without a backslash encode exactly as
    /// with [`QuoteStyle::QuotesOnly`].
    #[default]
    Full,
}

/// A single protocol command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<String>,
}

impl Command {
    /// Create a command without arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The arguments, unquoted.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl From<&str> for Command {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// An ordered batch sent as one `command_list_begin` … `command_list_end` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandList {
    commands: Vec<Command>,
}

impl CommandList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command.
    pub fn push(&mut self, command: impl Into<Command>) {
        self.commands.push(command.into());
    }

    /// Builder-style [`CommandList::push`].
    pub fn with(mut self, command: impl Into<Command>) -> Self {
        self.push(command);
        self
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when no command has been added.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over the commands in order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}

impl<C: Into<Command>> FromIterator<C> for CommandList {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Wrap `arg` in double quotes, escaping per `style`.
pub fn quote_argument(arg: &str, style: QuoteStyle) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for ch in arg.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' if style == QuoteStyle::Full => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Render one command as a wire line, without the trailing newline.
pub fn encode_command(command: &Command, style: QuoteStyle) -> Result<String> {
    validate_name(&command.name)?;

    let mut line = command.name.clone();
    for arg in &command.args {
        if arg.contains(['\n', '\r']) {
            return Err(FrameError::InvalidCommand(format!(
                "argument of `{}` contains a line break",
                command.name
            )));
        }
        line.push(' ');
        line.push_str(&quote_argument(arg, style));
    }
    Ok(line)
}

/// Render a batch as a `command_list_begin` … `command_list_end` block,
/// newline-joined, without the trailing newline.
pub fn encode_command_list(list: &CommandList, style: QuoteStyle) -> Result<String> {
    if list.is_empty() {
        return Err(FrameError::InvalidCommand("empty command list".to_string()));
    }

    let mut lines = Vec::with_capacity(list.len() + 2);
    lines.push(COMMAND_LIST_BEGIN.to_string());
    for command in list.iter() {
        lines.push(encode_command(command, style)?);
    }
    lines.push(COMMAND_LIST_END.to_string());
    Ok(lines.join("\n"))
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FrameError::InvalidCommand("empty command name".to_string()));
    }
    if name.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return Err(FrameError::InvalidCommand(format!(
            "command name {name:?} contains whitespace"
        )));
    }
    Ok(())
}
