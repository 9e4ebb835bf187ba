//! Calculator tool — evaluates mathematical expressions.
//!
//! Expressions are evaluated locally with a recursive-descent parser:
//! `+ - * / % ^`, parentheses, unary signs, postfix `!`, implicit
//! multiplication (`2pi`, `3(4+1)`), the usual functions (`sqrt`, `sin`,
//! `ln`, `log`, ...) and the constants `pi`, `e` and `tau`.
//!
//! When the input is a word problem rather than an expression and an
//! [`LlmClient`] is attached, the model is asked to translate it into a
//! single expression, which is then evaluated locally.

use async_trait::async_trait;
use mathwise_core::error::ToolError;
use mathwise_core::tool::Tool;
use mathwise_providers::LlmClient;

pub const NAME: &str = "Calculator";

/// Nesting cap for parentheses, signs, powers and function calls.
const MAX_DEPTH: usize = 256;

const TRANSLATE_PROMPT: &str = "\
Translate a math problem into a single expression that a calculator can evaluate.
Use only numbers, + - * / % ^, parentheses, the functions sqrt, sin, cos, tan, asin, acos, atan, \
ln, log, exp, abs, floor, ceil, round and the constants pi and e.
Reply in exactly this format and nothing else:

```text
<expression>
```

Question: {question}";

pub struct CalculatorTool {
    llm: Option<LlmClient>,
}

impl CalculatorTool {
    /// Local evaluation only.
    pub fn new() -> Self {
        Self { llm: None }
    }

    /// Fall back to the model for inputs that are not plain expressions.
    pub fn with_llm(llm: LlmClient) -> Self {
        Self { llm: Some(llm) }
    }

    async fn translate(&self, llm: &LlmClient, question: &str) -> Result<String, ToolError> {
        let prompt = TRANSLATE_PROMPT.replace("{question}", question);
        let reply = llm.ask(&prompt).await.map_err(|e| ToolError::Upstream {
            tool_name: NAME.into(),
            reason: e.to_string(),
        })?;

        if let Some(answer) = reply.trim().strip_prefix("Answer:") {
            return Ok(format!("Answer: {}", answer.trim()));
        }

        let expression = extract_expression(&reply).ok_or_else(|| ToolError::InvalidInput {
            tool_name: NAME.into(),
            reason: format!("could not read an expression from the model reply: {reply}"),
        })?;

        tracing::debug!(question, expression = %expression, "Translated word problem");
        evaluate(&expression)
            .map(|v| format!("Answer: {}", format_number(v)))
            .map_err(|e| ToolError::InvalidInput {
                tool_name: NAME.into(),
                reason: format!("{e} in translated expression '{expression}'"),
            })
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A tool for answering math related questions. Only input mathematical expression need to be provided"
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        let cleaned = clean_input(query);
        if cleaned.is_empty() {
            return Err(ToolError::InvalidInput {
                tool_name: NAME.into(),
                reason: "empty expression".into(),
            });
        }

        match evaluate(cleaned) {
            Ok(value) => Ok(format!("Answer: {}", format_number(value))),
            Err(local_error) => match &self.llm {
                Some(llm) => self.translate(llm, cleaned).await,
                None => Err(ToolError::InvalidInput {
                    tool_name: NAME.into(),
                    reason: local_error,
                }),
            },
        }
    }
}

/// Strip the decoration models tend to put around an expression.
fn clean_input(raw: &str) -> &str {
    let s = raw.trim().trim_end_matches(['=', '?']).trim();
    let s = s.trim_matches(['`', '"', '\'']).trim();
    s.trim_end_matches(['=', '?']).trim()
}

/// Pull the expression out of a ```text fenced block, or take the last
/// non-empty line when there is no fence.
fn extract_expression(reply: &str) -> Option<String> {
    if let Some(start) = reply.find("```") {
        let after = &reply[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        let end = body.find("```").unwrap_or(body.len());
        let expr = body[..end].trim();
        return (!expr.is_empty()).then(|| expr.to_string());
    }
    reply
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .map(String::from)
}

/// Format a result: integers without a trailing `.0`, other values rounded
/// to 12 decimal places with trailing zeros removed.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    if value.abs() >= 1e15 || (value != 0.0 && value.abs() < 1e-9) {
        return format!("{value:e}");
    }
    let fixed = format!("{value:.12}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

// ── Recursive-descent expression evaluator ────────────────────────────────

/// Evaluate a mathematical expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser::new(&tokens);
    let result = parser.parse_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(format!(
            "Unexpected token at position {}: {:?}",
            parser.pos, parser.tokens[parser.pos]
        ));
    }
    if !result.is_finite() {
        return Err("Result is not a finite number".into());
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            ',' if i + 1 < chars.len() && chars[i + 1].is_ascii_digit() => {
                // thousands separator: 1,000
                i += 1;
            }
            '+' => { tokens.push(Token::Plus); i += 1; }
            '-' | '−' => { tokens.push(Token::Minus); i += 1; }
            '*' if chars.get(i + 1) == Some(&'*') => { tokens.push(Token::Caret); i += 2; }
            '*' | '×' | '·' => { tokens.push(Token::Star); i += 1; }
            '/' | '÷' => { tokens.push(Token::Slash); i += 1; }
            '%' => { tokens.push(Token::Percent); i += 1; }
            '^' => { tokens.push(Token::Caret); i += 1; }
            '!' => { tokens.push(Token::Bang); i += 1; }
            '(' | '[' => { tokens.push(Token::LParen); i += 1; }
            ')' | ']' => { tokens.push(Token::RParen); i += 1; }
            'π' => { tokens.push(Token::Ident("pi".into())); i += 1; }
            '√' => { tokens.push(Token::Ident("sqrt".into())); i += 1; }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // scientific notation: 1e-3, 2.5E6
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let num_str: String = chars[start..i].iter().collect();
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| format!("Invalid number: {}", num_str))?;
                tokens.push(Token::Number(num));
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(ident.to_ascii_lowercase()));
            }
            c => return Err(format!("Unexpected character: '{}'", c)),
        }
    }

    Ok(tokens)
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "tau" => Some(std::f64::consts::TAU),
        _ => None,
    }
}

fn apply_function(name: &str, x: f64) -> Result<f64, String> {
    let value = match name {
        "sqrt" => {
            if x < 0.0 {
                return Err("Square root of a negative number".into());
            }
            x.sqrt()
        }
        "cbrt" => x.cbrt(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "asin" | "arcsin" => x.asin(),
        "acos" | "arccos" => x.acos(),
        "atan" | "arctan" => x.atan(),
        "sinh" => x.sinh(),
        "cosh" => x.cosh(),
        "tanh" => x.tanh(),
        "ln" | "log" | "log10" | "log2" if x <= 0.0 => {
            return Err("Logarithm of a non-positive number".into());
        }
        "ln" => x.ln(),
        "log" | "log10" => x.log10(),
        "log2" => x.log2(),
        "exp" => x.exp(),
        "abs" => x.abs(),
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "round" => x.round(),
        other => return Err(format!("Unknown function: {other}")),
    };
    Ok(value)
}

fn factorial(n: f64) -> Result<f64, String> {
    if n < 0.0 || n.fract() != 0.0 {
        return Err("Factorial needs a non-negative integer".into());
    }
    if n > 170.0 {
        return Err("Factorial too large".into());
    }
    Ok((1..=n as u64).map(|k| k as f64).product())
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0, depth: 0 }
    }

    /// Run `parse` one nesting level deeper.
    fn nested(&mut self, parse: fn(&mut Self) -> Result<f64, String>) -> Result<f64, String> {
        if self.depth >= MAX_DEPTH {
            return Err("Expression nested too deeply".into());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<f64, String> {
        let mut left = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.consume();
                    left += self.parse_term()?;
                }
                Token::Minus => {
                    self.consume();
                    left -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // term = unary (('*' | '/' | '%') unary | implicit-product)*
    fn parse_term(&mut self) -> Result<f64, String> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.consume();
                    left *= self.parse_unary()?;
                }
                Token::Slash => {
                    self.consume();
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err("Division by zero".into());
                    }
                    left /= right;
                }
                Token::Percent => {
                    self.consume();
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err("Modulo by zero".into());
                    }
                    left %= right;
                }
                // 2pi, 3(4 + 1), 2sqrt(2)
                Token::LParen | Token::Ident(_) => {
                    left *= self.parse_power()?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // unary = ('-' | '+') unary | power
    fn parse_unary(&mut self) -> Result<f64, String> {
        self.nested(Self::unary)
    }

    fn unary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                Ok(-self.parse_unary()?)
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // power = postfix ('^' unary)?    (right-associative, binds tighter than unary minus)
    fn parse_power(&mut self) -> Result<f64, String> {
        let base = self.parse_postfix()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            let exponent = self.parse_unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // postfix = primary '!'*
    fn parse_postfix(&mut self) -> Result<f64, String> {
        let mut value = self.parse_primary()?;
        while let Some(Token::Bang) = self.peek() {
            self.consume();
            value = factorial(value)?;
        }
        Ok(value)
    }

    // primary = NUMBER | CONST | FUNC primary | '(' expr ')'
    fn parse_primary(&mut self) -> Result<f64, String> {
        self.nested(Self::primary)
    }

    fn primary(&mut self) -> Result<f64, String> {
        match self.consume().cloned() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Ident(name)) => {
                if let Some(value) = constant(&name) {
                    return Ok(value);
                }
                let arg = self.parse_power()?;
                apply_function(&name, arg)
            }
            Some(Token::LParen) => {
                let val = self.parse_expr()?;
                match self.consume() {
                    Some(Token::RParen) => Ok(val),
                    _ => Err("Expected closing parenthesis".into()),
                }
            }
            Some(tok) => Err(format!("Unexpected token: {:?}", tok)),
            None => Err("Unexpected end of expression".into()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
