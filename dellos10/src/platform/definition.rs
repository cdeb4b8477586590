//! Platform definition for vendor-specific session settings.

use regex::bytes::Regex;

/// Platform definition containing the settings a session needs.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "dell_os10").
    pub name: String,

    /// Pattern matching any prompt before the base prompt is known.
    pub prompt_pattern: Regex,

    /// Prompt terminators, in order of preference.
    pub prompt_terminators: Vec<char>,

    /// Markers that flag a command reply as an error.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when the session is established.
    pub on_open_commands: Vec<String>,

    /// Commands to run before the session is closed.
    pub on_close_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a new platform definition with a prompt pattern.
    pub fn new(name: impl Into<String>, prompt_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            prompt_pattern: Regex::new(prompt_pattern)?,
            prompt_terminators: vec!['#', '>'],
            failed_when_contains: vec![],
            on_open_commands: vec![],
            on_close_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
        })
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Add an on_close command.
    pub fn with_on_close_command(mut self, command: impl Into<String>) -> Self {
        self.on_close_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// First failure marker contained in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|marker| output.contains(marker.as_str()))
            .map(String::as_str)
    }
}
