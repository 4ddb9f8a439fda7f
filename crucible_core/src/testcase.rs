use serde::{Deserialize, Serialize};

use crate::compare::normalize_newlines;

/// Upper bound on generated inputs per attempt, so a runaway generator
/// cannot turn one job into an unbounded number of sandbox runs.
pub const MAX_GENERATED_INPUTS: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testcase {
    pub ord: u32,
    pub input: String,
    pub output: String,
}

/// Parse generator stdout into test inputs. Two encodings are accepted: a
/// JSON array of strings, or newline-delimited blocks separated by a line
/// containing only `---`. An input that itself needs a bare `---` line can
/// only be expressed in the JSON encoding.
pub fn parse_generated_inputs(stdout: &str) -> Vec<String> {
    let normalized = normalize_newlines(stdout);
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return Vec::new();
    }

    if let Ok(inputs) = serde_json::from_str::<Vec<String>>(normalized) {
        return inputs;
    }

    let mut inputs = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut saw_separator = false;

    for line in normalized.split('\n') {
        if line.trim() == "---" {
            inputs.push(buffer.join("\n"));
            buffer.clear();
            saw_separator = true;
            continue;
        }
        buffer.push(line);
    }

    if !buffer.is_empty() || saw_separator {
        inputs.push(buffer.join("\n"));
    }

    inputs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_array_encoding() {
        let inputs = parse_generated_inputs("[\"5\\n\", \"10\\n\"]");
        assert_eq!(inputs, vec!["5\n", "10\n"]);
    }

    #[test]
    fn non_string_json_falls_back_to_blocks() {
        let inputs = parse_generated_inputs("[1, 2]");
        assert_eq!(inputs, vec!["[1, 2]"]);
    }

    #[test]
    fn delimiter_encoding() {
        let inputs = parse_generated_inputs("1 2\n---\n3 4\n5 6\n---\n7\n");
        assert_eq!(inputs, vec!["1 2", "3 4\n5 6", "7"]);
    }

    #[test]
    fn single_block_without_separator() {
        let inputs = parse_generated_inputs("1 2\n3 4\n");
        assert_eq!(inputs, vec!["1 2\n3 4"]);
    }

    #[test]
    fn trailing_separator_keeps_the_empty_block() {
        let inputs = parse_generated_inputs("1 2\n---\n");
        assert_eq!(inputs, vec!["1 2", ""]);
    }

    #[test]
    fn empty_output_yields_nothing() {
        assert!(parse_generated_inputs("").is_empty());
        assert!(parse_generated_inputs("  \n  ").is_empty());
    }
}
