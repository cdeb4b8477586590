//! Structural diff of two configuration texts.
//!
//! Both texts are parsed into blocks keyed by their directive line, with
//! nested blocks taken from indentation. Comment (`!`) and blank lines are
//! ignored, as are differences in indentation width.

/// One directive and the directives nested under it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Block<'a> {
    /// The line as written, indentation included.
    line: &'a str,
    children: Vec<Block<'a>>,
}

impl Block<'_> {
    fn key(&self) -> &str {
        self.line.trim()
    }

    fn flatten(&self, out: &mut Vec<String>) {
        out.push(self.line.to_string());
        for child in &self.children {
            child.flatten(out);
        }
    }
}

/// Lines that differ between a candidate and a running configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiff {
    /// Candidate lines missing from the running configuration, each preceded
    /// by the parent directives it needs. Candidate order.
    pub additions: Vec<String>,
    /// Running lines absent from the candidate, with their parents. Running
    /// order. Whether to negate them is left to the caller.
    pub removals: Vec<String>,
}

impl ConfigDiff {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// The additions as one command per line.
    pub fn commands(&self) -> String {
        self.additions.join("\n")
    }
}

/// Compare `candidate` against `running`.
pub fn diff(candidate: &str, running: &str) -> ConfigDiff {
    let candidate = parse(candidate);
    let running = parse(running);
    ConfigDiff {
        additions: difference(&candidate, &running),
        removals: difference(&running, &candidate),
    }
}

fn parse(text: &str) -> Vec<Block<'_>> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with('!')
        })
        .map(|line| (line.len() - line.trim_start().len(), line))
        .collect();
    collapse(blocks(&lines))
}

/// Fold sibling blocks with the same directive into the first one, so a
/// section written twice compares as one.
fn collapse(blocks: Vec<Block<'_>>) -> Vec<Block<'_>> {
    let mut merged: Vec<Block<'_>> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match merged.iter_mut().find(|b| b.key() == block.key()) {
            Some(first) => first.children.extend(block.children),
            None => merged.push(block),
        }
    }
    for block in &mut merged {
        block.children = collapse(std::mem::take(&mut block.children));
    }
    merged
}

fn blocks<'a>(lines: &[(usize, &'a str)]) -> Vec<Block<'a>> {
    let mut result = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let (indent, line) = lines[i];
        let end = lines[i + 1..]
            .iter()
            .position(|(child_indent, _)| *child_indent <= indent)
            .map_or(lines.len(), |offset| i + 1 + offset);
        result.push(Block {
            line,
            children: blocks(&lines[i + 1..end]),
        });
        i = end;
    }
    result
}

/// Lines of `left` not present in `right`, in `left` order.
fn difference(left: &[Block<'_>], right: &[Block<'_>]) -> Vec<String> {
    let mut out = Vec::new();
    for block in left {
        match right.iter().find(|other| other.key() == block.key()) {
            None => block.flatten(&mut out),
            Some(other) => {
                let nested = difference(&block.children, &other.children);
                if !nested.is_empty() {
                    out.push(block.line.to_string());
                    out.extend(nested);
                }
            }
        }
    }
    out
}
