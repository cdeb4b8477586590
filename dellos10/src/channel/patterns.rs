//! Prompt pattern helpers.

use regex::bytes::Regex;

/// Compile a prompt pattern string into a regex.
///
/// Anchors to end of string by default if no anchor is specified, so the
/// pattern only matches a trailing prompt.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("{}\\s*$", pattern)
    };

    Regex::new(&pattern)
}

/// Build the prompt regex for a known base prompt.
///
/// The base prompt is the hostname part (`OS10` for `OS10#`); any mode
/// suffix such as `(config)` or `(conf-if-eth1/1/1)` may follow it.
pub fn base_prompt_pattern(base_prompt: &str, terminators: &[char]) -> Result<Regex, regex::Error> {
    let terminators: String = terminators
        .iter()
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    Regex::new(&format!(
        r"(?m)^{}(?:\([^\r\n)]{{0,64}}\))?[{}]\s?$",
        regex::escape(base_prompt),
        terminators
    ))
}

/// Extract the base prompt from the output that ends with a prompt.
///
/// Takes the last non-empty line, drops the terminator and any mode suffix.
pub fn extract_base_prompt(output: &str, terminators: &[char]) -> Option<String> {
    let line = output.lines().rev().map(str::trim).find(|l| !l.is_empty())?;
    let line = line.strip_suffix(|c: char| terminators.contains(&c))?;
    let base = match line.find('(') {
        Some(pos) if pos > 0 => &line[..pos],
        _ => line,
    };
    (!base.is_empty()).then(|| base.to_string())
}

/// Strip the command echo from the start of a reply.
pub fn strip_command_echo(raw: &str, command: &str) -> String {
    let raw = raw.replace("\r\n", "\n").replace('\r', "");
    let trimmed = raw.trim_start_matches('\n');
    trimmed
        .strip_prefix(command)
        .unwrap_or(trimmed)
        .trim_start_matches('\n')
        .to_string()
}

/// Strip the command echo from the start and the prompt line from the end.
///
/// The reply is known to end with a prompt, so its last line is dropped.
pub fn normalize_output(raw: &str, command: &str) -> String {
    let output = strip_command_echo(raw, command);
    let output = output.trim_end();
    match output.rfind('\n') {
        Some(pos) => output[..pos].trim_end().to_string(),
        None => String::new(),
    }
}
