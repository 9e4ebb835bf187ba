//! Prompt-template tools.
//!
//! Each of these tools fills a fixed expert prompt with the query and makes
//! one completion call. The model does the actual solving; the template
//! steers it towards a step-by-step worked answer.

use async_trait::async_trait;
use mathwise_core::error::ToolError;
use mathwise_core::tool::Tool;
use mathwise_providers::LlmClient;

/// The prompt-backed tools, as a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptToolKind {
    Reasoning,
    Calculus,
    LinearAlgebra,
    Statistics,
    ComplexProblemSolver,
}

impl PromptToolKind {
    pub const ALL: [PromptToolKind; 5] = [
        PromptToolKind::Reasoning,
        PromptToolKind::Calculus,
        PromptToolKind::LinearAlgebra,
        PromptToolKind::Statistics,
        PromptToolKind::ComplexProblemSolver,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PromptToolKind::Reasoning => "Reasoning tool",
            PromptToolKind::Calculus => "Calculus",
            PromptToolKind::LinearAlgebra => "LinearAlgebra",
            PromptToolKind::Statistics => "Statistics",
            PromptToolKind::ComplexProblemSolver => "ComplexProblemSolver",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PromptToolKind::Reasoning => "A tool for answering logic-based and reasoning questions.",
            PromptToolKind::Calculus => {
                "Solves calculus problems including derivatives, integrals, limits, series, and differential equations."
            }
            PromptToolKind::LinearAlgebra => {
                "Solves linear algebra problems including matrices, determinants, eigenvalues, vector spaces, and transformations."
            }
            PromptToolKind::Statistics => {
                "Solves statistics problems including probability, distributions, hypothesis testing, confidence intervals, and regression analysis."
            }
            PromptToolKind::ComplexProblemSolver => {
                "Breaks down any complex mathematical problem into manageable steps and solves it methodically."
            }
        }
    }

    /// The prompt template; `{question}` is replaced by the query.
    pub fn template(self) -> &'static str {
        match self {
            PromptToolKind::Reasoning => REASONING_TEMPLATE,
            PromptToolKind::Calculus => CALCULUS_TEMPLATE,
            PromptToolKind::LinearAlgebra => LINEAR_ALGEBRA_TEMPLATE,
            PromptToolKind::Statistics => STATISTICS_TEMPLATE,
            PromptToolKind::ComplexProblemSolver => COMPLEX_PROBLEM_TEMPLATE,
        }
    }

    pub fn render(self, question: &str) -> String {
        self.template().replace("{question}", question)
    }
}

const REASONING_TEMPLATE: &str = "\
You're an expert mathematician specializing in solving complex mathematical problems. \
Please use your extensive knowledge to provide detailed solutions.

Refer to the earlier conversation when context is important: variables, equations and \
concepts established before should be used consistently.

For the current question: {question}

Think step by step:
1. Identify the mathematical domain (algebra, calculus, statistics, etc.)
2. Recall any relevant formulas, theorems, or principles
3. Break down the problem into manageable parts
4. Work through each part methodically
5. Show all your work and reasoning
6. Verify your solution

Provide a clear, detailed explanation that would help a student understand not just the answer, but the process.";

const CALCULUS_TEMPLATE: &str = "\
You are a calculus expert. Solve the following calculus problem step by step:

Problem: {question}

Show your work in detail:
1. Identify what type of calculus problem this is (differentiation, integration, etc.)
2. List any relevant formulas or theorems
3. Show each step of your solution with explanations
4. Check your answer if possible";

const LINEAR_ALGEBRA_TEMPLATE: &str = "\
You are a linear algebra expert. Solve the following linear algebra problem step by step:

Problem: {question}

Show your work in detail:
1. Identify what type of linear algebra problem this is (matrix operations, eigenvalues, etc.)
2. List any relevant formulas or theorems
3. Show each step of your solution with explanations
4. Check your answer if possible";

const STATISTICS_TEMPLATE: &str = "\
You are a statistics expert. Solve the following statistics problem step by step:

Problem: {question}

Show your work in detail:
1. Identify what type of statistics problem this is (probability, hypothesis testing, etc.)
2. List any relevant formulas or theorems
3. Show each step of your solution with explanations
4. Check your answer if possible";

const COMPLEX_PROBLEM_TEMPLATE: &str = "\
You are an expert mathematician who excels at breaking down complex problems.

Problem: {question}

Think step by step:
1. What's the core concept being tested here?
2. Break the problem into smaller sub-problems
3. Solve each sub-problem methodically
4. Combine the results to find the final answer
5. Verify the solution makes sense

Provide your complete thought process and final answer.";

/// A prompt-template tool bound to an LLM client.
pub struct PromptTool {
    kind: PromptToolKind,
    llm: LlmClient,
}

impl PromptTool {
    pub fn new(kind: PromptToolKind, llm: LlmClient) -> Self {
        Self { kind, llm }
    }

    pub fn kind(&self) -> PromptToolKind {
        self.kind
    }
}

#[async_trait]
impl Tool for PromptTool {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidInput {
                tool_name: self.kind.name().into(),
                reason: "empty question".into(),
            });
        }

        self.llm
            .ask(&self.kind.render(query))
            .await
            .map_err(|e| ToolError::Upstream {
                tool_name: self.kind.name().into(),
                reason: e.to_string(),
            })
    }
}
