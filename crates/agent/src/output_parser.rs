//! Lenient parser for ReAct-style model output.
//!
//! The model is asked to answer with either
//!
//! ```text
//! Thought: ...
//! Action: <tool name>
//! Action Input: <query>
//! ```
//!
//! or `Final Answer: ...`. Small models drift from that format, so labels
//! are matched case-insensitively, markdown bold and bullets around labels
//! are ignored, values lose wrapping quotes or backticks, and a missing
//! `Action Input:` means an empty query. Whichever of `Action:` and
//! `Final Answer:` comes first wins.

/// What the model decided to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOutput {
    /// Run a tool and observe the result.
    Action {
        tool: String,
        input: String,
        /// Text before the `Action:` line, without its `Thought:` label.
        thought: String,
    },
    /// Stop with an answer.
    Finish { answer: String },
}

/// Output that is neither an action nor a final answer. The message is fed
/// back to the model as the observation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Invalid Format: Missing 'Action:' after 'Thought:'")]
    MissingAction,

    #[error("Invalid Format: Empty response, expected 'Action:' or 'Final Answer:'")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Thought,
    Action,
    ActionInput,
    Observation,
    FinalAnswer,
}

/// Split `Label: value` lines. Anything else is plain text.
fn labelled(line: &str) -> Option<(Label, &str)> {
    let colon = line.find(':')?;
    let key: String = line[..colon]
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`' | '#'))
        .collect();
    let key = key
        .trim_start_matches(|c: char| c == '-' || c == '>' || c.is_whitespace())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();

    let label = match key.as_str() {
        "thought" => Label::Thought,
        "action" => Label::Action,
        "action input" => Label::ActionInput,
        "observation" => Label::Observation,
        "final answer" => Label::FinalAnswer,
        _ => return None,
    };
    let value = line[colon + 1..].trim_matches(|c: char| c == '*' || c.is_whitespace());
    Some((label, value))
}

/// Strip matching quotes, backticks or code fences around a value.
fn unquote(value: &str) -> &str {
    let mut s = value.trim();
    'outer: loop {
        for q in ["```", "`", "\"", "'"] {
            if s.len() >= 2 * q.len() && s.starts_with(q) && s.ends_with(q) {
                s = s[q.len()..s.len() - q.len()].trim();
                continue 'outer;
            }
        }
        return s;
    }
}

pub fn parse(text: &str) -> Result<ParsedOutput, FormatError> {
    if text.trim().is_empty() {
        return Err(FormatError::Empty);
    }

    let lines: Vec<&str> = text.lines().collect();
    let mut action_at = None;
    let mut final_at = None;
    for (i, line) in lines.iter().enumerate() {
        match labelled(line).map(|(label, _)| label) {
            Some(Label::Action) if action_at.is_none() => action_at = Some(i),
            Some(Label::FinalAnswer) if final_at.is_none() => final_at = Some(i),
            _ => {}
        }
    }

    match (action_at, final_at) {
        (Some(a), f) if f.is_none_or(|f| a < f) => parse_action(&lines, a),
        (Some(a), None) => parse_action(&lines, a),
        (_, Some(f)) => Ok(ParsedOutput::Finish {
            answer: block(&lines, f, |_| false),
        }),
        (None, None) => Err(FormatError::MissingAction),
    }
}

fn parse_action(lines: &[&str], at: usize) -> Result<ParsedOutput, FormatError> {
    let tool = lines
        .get(at)
        .and_then(|line| labelled(line))
        .map(|(_, value)| unquote(value).trim_end_matches('.').trim().to_string())
        .unwrap_or_default();
    if tool.is_empty() {
        return Err(FormatError::MissingAction);
    }

    let input = lines
        .iter()
        .enumerate()
        .skip(at + 1)
        .find(|(_, line)| matches!(labelled(line), Some((Label::ActionInput, _))))
        .map(|(j, _)| block(lines, j, |_| true))
        .map(|raw| unquote(&raw).to_string())
        .unwrap_or_default();

    let thought = lines[..at]
        .iter()
        .enumerate()
        .map(|(i, line)| match labelled(line) {
            Some((Label::Thought, value)) if i == 0 => value,
            _ => *line,
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    Ok(ParsedOutput::Action { tool, input, thought })
}

/// The value of the labelled line at `start` plus the lines after it, up to
/// the next line whose label satisfies `stops`.
fn block(lines: &[&str], start: usize, stops: impl Fn(Label) -> bool) -> String {
    let mut parts = Vec::new();
    if let Some((_, first)) = lines.get(start).and_then(|line| labelled(line)) {
        parts.push(first);
    }
    for line in &lines[start + 1..] {
        if labelled(line).is_some_and(|(label, _)| stops(label)) {
            break;
        }
        parts.push(*line);
    }
    parts.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(tool: &str, input: &str) -> (String, String) {
        (tool.to_string(), input.to_string())
    }

    fn expect_action(text: &str) -> (String, String) {
        match parse(text) {
            Ok(ParsedOutput::Action { tool, input, .. }) => (tool, input),
            other => panic!("expected action, got {other:?}"),
        }
    }

    fn expect_answer(text: &str) -> String {
        match parse(text) {
            Ok(ParsedOutput::Finish { answer }) => answer,
            other => panic!("expected final answer, got {other:?}"),
        }
    }

    #[test]
    fn plain_action() {
        let text = "I should use the calculator.\nAction: Calculator\nAction Input: 2 + 2";
        assert_eq!(expect_action(text), action("Calculator", "2 + 2"));
    }

    #[test]
    fn thought_label_is_stripped() {
        let text = "Thought: I need the derivative.\nAction: Calculus\nAction Input: d/dx x^3";
        match parse(text).unwrap() {
            ParsedOutput::Action { thought, .. } => assert_eq!(thought, "I need the derivative."),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn labels_are_case_insensitive_and_bold_tolerant() {
        let text = "**Action:** `Wikipedia`\n**action input:** \"Fourier transform\"";
        assert_eq!(expect_action(text), action("Wikipedia", "Fourier transform"));
    }

    #[test]
    fn bulleted_labels() {
        let text = "- Action: Statistics\n- Action Input: mean of 1, 2, 3";
        assert_eq!(expect_action(text), action("Statistics", "mean of 1, 2, 3"));
    }

    #[test]
    fn missing_input_is_empty() {
        assert_eq!(expect_action("Action: Reasoning tool"), action("Reasoning tool", ""));
    }

    #[test]
    fn multiline_input_stops_at_observation() {
        let text = "Action: LinearAlgebra\nAction Input: det of\n[[1, 2], [3, 4]]\nObservation: made up";
        assert_eq!(expect_action(text), action("LinearAlgebra", "det of\n[[1, 2], [3, 4]]"));
    }

    #[test]
    fn fenced_input_is_unwrapped() {
        assert_eq!(
            expect_action("Action: Calculator\nAction Input: ```37593 * 67```"),
            action("Calculator", "37593 * 67")
        );
    }

    #[test]
    fn trailing_period_on_tool_name() {
        assert_eq!(expect_action("Action: Calculator.\nAction Input: 1+1").0, "Calculator");
    }

    #[test]
    fn final_answer_multiline() {
        let text = "Thought: I now know the final answer\nFinal Answer: x = 2\nbecause 2*2 + 3 = 7";
        assert_eq!(expect_answer(text), "x = 2\nbecause 2*2 + 3 = 7");
    }

    #[test]
    fn final_answer_keeps_inner_colons() {
        assert_eq!(expect_answer("Final Answer: ratio is 3:4"), "ratio is 3:4");
    }

    #[test]
    fn earliest_marker_wins() {
        let text = "Final Answer: 42\nAction: Calculator\nAction Input: 6*7";
        assert_eq!(expect_answer(text), "42\nAction: Calculator\nAction Input: 6*7");

        let text = "Action: Calculator\nAction Input: 6*7\nFinal Answer: 42";
        assert_eq!(expect_action(text), action("Calculator", "6*7"));
    }

    #[test]
    fn unlabelled_text_is_missing_action() {
        assert_eq!(parse("The answer is 4."), Err(FormatError::MissingAction));
    }

    #[test]
    fn empty_action_is_missing_action() {
        assert_eq!(parse("Action:   \nAction Input: 2+2"), Err(FormatError::MissingAction));
    }

    #[test]
    fn blank_output() {
        assert_eq!(parse("  \n "), Err(FormatError::Empty));
    }

    #[test]
    fn error_text_matches_observation_format() {
        assert!(FormatError::MissingAction.to_string().starts_with("Invalid Format"));
    }
}
