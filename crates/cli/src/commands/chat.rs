//! `mathwise chat` — Interactive or single-question tutoring.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use mathwise_agent::{AgentStreamEvent, ChatSession, ReactAgent};
use mathwise_config::AppConfig;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub async fn run(message: Option<String>, show_thoughts: bool) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    super::require_api_key(&config)?;

    let agent = ReactAgent::from_config(&config).context("Failed to build the math agent")?;
    let tool_names = agent.tools().names().join(", ");
    let mut session = ChatSession::from_config(Arc::new(agent), &config);
    let mut stdout = std::io::stdout();

    if let Some(question) = message {
        eprint!("  Thinking...");
        let outcome = session.submit(&question).await;
        eprint!("\r              \r");
        println!("{}", outcome.text());
        if !outcome.is_success() {
            anyhow::bail!("the question could not be answered");
        }
        return Ok(());
    }

    tracing::debug!(session_id = %session.id(), "Interactive chat started");
    print_banner(&mut stdout, &config, &tool_names)?;
    let stdin = BufReader::new(tokio::io::stdin());
    chat_loop(&mut session, stdin, &mut stdout, show_thoughts).await?;

    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Input<'a> {
    Empty,
    Exit,
    Clear,
    Memory,
    Help,
    Ask(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Self::Empty,
            "exit" | "quit" | "/exit" | "/quit" => Self::Exit,
            "/clear" => Self::Clear,
            "/memory" => Self::Memory,
            "/help" => Self::Help,
            question => Self::Ask(question),
        }
    }
}

/// Read questions line by line until EOF or `exit`.
async fn chat_loop<R, W>(
    session: &mut ChatSession,
    reader: R,
    out: &mut W,
    show_thoughts: bool,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();

    for line in session.history().iter() {
        print_reply(out, &line.content)?;
    }
    prompt(out)?;

    while let Some(line) = lines.next_line().await? {
        match Input::parse(&line) {
            Input::Empty => {}
            Input::Exit => break,
            Input::Clear => {
                session.clear();
                if let Some(notice) = session.history().last() {
                    print_reply(out, &notice.content)?;
                }
            }
            Input::Memory => {
                let rows = session.memory_debug();
                if rows.is_empty() {
                    writeln!(out, "  Memory is empty.")?;
                } else {
                    writeln!(
                        out,
                        "  Memory ({} of {} turns):",
                        rows.len(),
                        session.memory().capacity()
                    )?;
                    for row in rows {
                        writeln!(out, "    {row}")?;
                    }
                }
                writeln!(out)?;
            }
            Input::Help => print_help(out)?,
            Input::Ask(question) => {
                let answer = if show_thoughts {
                    ask_with_thoughts(session, question, out).await?
                } else {
                    session.submit(question).await
                };
                print_reply(out, answer.text())?;
            }
        }
        prompt(out)?;
    }

    Ok(())
}

/// Submit while printing each agent step as it arrives.
async fn ask_with_thoughts<W: Write>(
    session: &mut ChatSession,
    question: &str,
    out: &mut W,
) -> anyhow::Result<mathwise_agent::TurnOutcome> {
    let (tx, mut rx) = mpsc::channel::<AgentStreamEvent>(32);

    let submit = async move {
        let outcome = session.submit_with_events(question, Some(&tx)).await;
        drop(tx);
        outcome
    };
    let print = async {
        while let Some(event) = rx.recv().await {
            if let Some(line) = event.display_line() {
                writeln!(out, "  {line}")?;
            }
        }
        Ok::<(), std::io::Error>(())
    };

    let (outcome, printed) = tokio::join!(submit, print);
    printed?;
    Ok(outcome)
}

fn prompt<W: Write>(out: &mut W) -> std::io::Result<()> {
    write!(out, "  You > ")?;
    out.flush()
}

fn print_reply<W: Write>(out: &mut W, text: &str) -> std::io::Result<()> {
    writeln!(out)?;
    for line in text.lines() {
        writeln!(out, "  Assistant > {line}")?;
    }
    writeln!(out)
}

fn print_help<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "  Commands:")?;
    writeln!(out, "    /clear   Start over with an empty memory")?;
    writeln!(out, "    /memory  Show the turns the tutor remembers")?;
    writeln!(out, "    /help    Show this help")?;
    writeln!(out, "    exit     Quit")?;
    writeln!(out)
}

fn print_banner<W: Write>(out: &mut W, config: &AppConfig, tools: &str) -> std::io::Result<()> {
    let ui = &config.ui;
    writeln!(out)?;
    writeln!(out, "  ╔══════════════════════════════════════════════╗")?;
    writeln!(out, "  ║  {} {:<42}║", ui.icon, ui.title)?;
    writeln!(out, "  ╚══════════════════════════════════════════════╝")?;
    writeln!(out)?;
    writeln!(out, "  Provider:  {}", config.provider)?;
    writeln!(out, "  Model:     {}", config.model)?;
    writeln!(out, "  Tools:     {tools}")?;
    writeln!(out, "  Memory:    last {} turns", config.memory.window_size)?;
    writeln!(out)?;
    writeln!(out, "  Topics:")?;
    for domain in &ui.domains {
        writeln!(out, "    - {domain}")?;
    }
    writeln!(out)?;
    writeln!(out, "  Try asking:")?;
    for example in &ui.example_problems {
        writeln!(out, "    - {example}")?;
    }
    writeln!(out)?;
    writeln!(out, "  Type /help for commands, 'exit' or Ctrl+C to quit.")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathwise_agent::{Agent, AgentRun};
    use mathwise_core::error::AgentError;
    use mathwise_core::message::Message;

    /// Answers every question by echoing it, and reports one thought.
    struct EchoAgent;

    #[async_trait::async_trait]
    impl Agent for EchoAgent {
        async fn run(
            &self,
            input: &str,
            _memory: &[Message],
            events: Option<&mpsc::Sender<AgentStreamEvent>>,
        ) -> Result<AgentRun, AgentError> {
            if let Some(tx) = events {
                let _ = tx
                    .send(AgentStreamEvent::Thought {
                        content: format!("thinking about {input}"),
                    })
                    .await;
            }
            Ok(AgentRun {
                answer: format!("answer to {input}"),
                trace: Vec::new(),
                iterations: 1,
                tool_calls_made: 0,
            })
        }
    }

    fn session() -> ChatSession {
        ChatSession::from_config(Arc::new(EchoAgent), &AppConfig::default())
    }

    async fn drive(session: &mut ChatSession, script: &str, show_thoughts: bool) -> String {
        let mut out = Vec::new();
        chat_loop(session, script.as_bytes(), &mut out, show_thoughts)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Input::parse("  "), Input::Empty);
        assert_eq!(Input::parse("quit"), Input::Exit);
        assert_eq!(Input::parse("/clear"), Input::Clear);
        assert_eq!(Input::parse(" /memory "), Input::Memory);
        assert_eq!(Input::parse("Solve 2x+3=7"), Input::Ask("Solve 2x+3=7"));
    }

    #[tokio::test]
    async fn greets_then_answers() {
        let mut session = session();
        let output = drive(&mut session, "What is 2+2?\n", false).await;

        assert!(output.contains(&format!(
            "Assistant > {}",
            AppConfig::default().ui.welcome_message.lines().next().unwrap()
        )));
        assert!(output.contains("Assistant > answer to What is 2+2?"));
        assert_eq!(session.memory().len(), 2);
    }

    #[tokio::test]
    async fn exit_stops_reading() {
        let mut session = session();
        let output = drive(&mut session, "exit\nWhat is 2+2?\n", false).await;
        assert!(!output.contains("answer to"));
        assert!(session.memory().is_empty());
    }

    #[tokio::test]
    async fn clear_and_memory_commands() {
        let mut session = session();
        let output = drive(&mut session, "hi\n/memory\n/clear\n/memory\n", false).await;

        assert!(output.contains("Memory (2 of 10 turns):"));
        assert!(output.contains("user: hi"));
        assert!(output.contains("Memory is empty."));
        assert!(session.memory().is_empty());
    }

    #[tokio::test]
    async fn show_thoughts_prints_steps() {
        let mut session = session();
        let output = drive(&mut session, "integrate x\n", true).await;
        let thought = output.find("💭 thinking about integrate x").unwrap();
        let answer = output.find("Assistant > answer to integrate x").unwrap();
        assert!(thought < answer);
    }
}
