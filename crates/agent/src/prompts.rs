//! Prompt text for the ReAct loop.

use mathwise_core::tool::ToolRegistry;

/// Generation stops here so the model cannot invent tool results.
pub const STOP_SEQUENCE: &str = "\nObservation:";

const FORMAT_INSTRUCTIONS: &str = "\
Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

/// The system prompt: persona, the tool list and the answer format.
pub fn system_prompt(system_message: &str, tools: &ToolRegistry) -> String {
    let listing = tools
        .definitions()
        .iter()
        .map(|def| format!("{}: {}", def.name, def.description))
        .collect::<Vec<_>>()
        .join("\n");
    let format = FORMAT_INSTRUCTIONS.replace("{tool_names}", &tools.names().join(", "));

    format!(
        "{}\n\nYou have access to the following tools:\n\n{listing}\n\n{format}\n\nBegin!",
        system_message.trim_end()
    )
}

/// The question followed by the steps taken so far.
pub fn question_prompt(input: &str, scratchpad: &str) -> String {
    format!("Question: {input}\nThought:{scratchpad}")
}

/// Observation for an action naming a tool that does not exist.
pub fn invalid_tool(name: &str, tools: &ToolRegistry) -> String {
    format!(
        "{name} is not a valid tool, try one of [{}].",
        tools.names().join(", ")
    )
}
