//! PDL parser
//!
//! Line-oriented and lenient: constructs it does not understand are skipped
//! and reported as diagnostics instead of aborting the parse.
//!
//! ## Grammar
//! ```text
//! namespace <dotted.name>
//! option <key> = "<value>"
//! message <Name> { [repeated] <type> <field> = <id>; ... }
//! service <Name> { rpc <Method>(<Req>) returns (<Resp>); ... }
//! // comment
//! ```
//!
//! Statements end at `;`, `{`, `}` or a line break, so a whole message may
//! sit on one line.

use super::diagnostic::Diagnostic;
use super::ir::{
    FieldType, ProtocolDefinition, ProtocolField, ProtocolMessage, ProtocolMethod, ProtocolService,
};

/// Parser output: the definition plus everything that was skipped
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub definition: ProtocolDefinition,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Parse PDL source text
pub fn parse(source: &str) -> ParseOutput {
    let tokens = tokenize(source);
    let mut parser = Parser::default();
    for token in tokens {
        parser.feed(token);
    }
    parser.finish()
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Statement(String),
    Open,
    Close,
}

#[derive(Debug, Clone)]
struct Token {
    line: usize,
    kind: TokenKind,
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                current.push(c);
                if c == '"' {
                    in_quotes = false;
                }
                continue;
            }
            match c {
                '"' => {
                    in_quotes = true;
                    current.push(c);
                }
                '/' if chars.peek() == Some(&'/') => break,
                ';' => flush(&mut current, line, &mut tokens),
                '{' => {
                    flush(&mut current, line, &mut tokens);
                    tokens.push(Token { line, kind: TokenKind::Open });
                }
                '}' => {
                    flush(&mut current, line, &mut tokens);
                    tokens.push(Token { line, kind: TokenKind::Close });
                }
                _ => current.push(c),
            }
        }
        flush(&mut current, line, &mut tokens);
    }

    tokens
}

fn flush(current: &mut String, line: usize, tokens: &mut Vec<Token>) {
    let text = current.trim();
    if !text.is_empty() {
        tokens.push(Token {
            line,
            kind: TokenKind::Statement(text.to_string()),
        });
    }
    current.clear();
}

// =============================================================================
// Statement Parser
// =============================================================================

#[derive(Debug, Default)]
enum State {
    #[default]
    TopLevel,
    /// Saw `message Name`, waiting for `{`
    MessageHeader(ProtocolMessage),
    /// Saw `service Name`, waiting for `{`
    ServiceHeader(ProtocolService),
    Message(ProtocolMessage),
    Service(ProtocolService),
    /// Skipping an unsupported nested block; holds the enclosing state and depth
    Skipping(Box<State>, usize),
}

#[derive(Default)]
struct Parser {
    definition: ProtocolDefinition,
    diagnostics: Vec<Diagnostic>,
    state: State,
}

impl Parser {
    fn feed(&mut self, token: Token) {
        let state = std::mem::take(&mut self.state);
        self.state = match state {
            State::TopLevel => self.top_level(token),
            State::MessageHeader(message) => match token.kind {
                TokenKind::Open => State::Message(message),
                _ => {
                    self.diagnostics.push(Diagnostic::error(
                        message.line,
                        format!("expected `{{` after `message {}`", message.name),
                    ));
                    self.top_level(token)
                }
            },
            State::ServiceHeader(service) => match token.kind {
                TokenKind::Open => State::Service(service),
                _ => {
                    self.diagnostics.push(Diagnostic::error(
                        service.line,
                        format!("expected `{{` after `service {}`", service.name),
                    ));
                    self.top_level(token)
                }
            },
            State::Message(mut message) => match token.kind {
                TokenKind::Close => {
                    self.definition.messages.push(message);
                    State::TopLevel
                }
                TokenKind::Open => {
                    self.diagnostics.push(Diagnostic::error(
                        token.line,
                        "nested blocks are not supported inside a message",
                    ));
                    State::Skipping(Box::new(State::Message(message)), 1)
                }
                TokenKind::Statement(text) => {
                    match parse_field(&text, token.line) {
                        Ok(field) => message.fields.push(field),
                        Err(diagnostic) => self.diagnostics.push(diagnostic),
                    }
                    State::Message(message)
                }
            },
            State::Service(mut service) => match token.kind {
                TokenKind::Close => {
                    self.definition.services.push(service);
                    State::TopLevel
                }
                TokenKind::Open => {
                    self.diagnostics.push(Diagnostic::error(
                        token.line,
                        "nested blocks are not supported inside a service",
                    ));
                    State::Skipping(Box::new(State::Service(service)), 1)
                }
                TokenKind::Statement(text) => {
                    match parse_rpc(&text, token.line) {
                        Ok(method) => service.methods.push(method),
                        Err(diagnostic) => self.diagnostics.push(diagnostic),
                    }
                    State::Service(service)
                }
            },
            State::Skipping(outer, depth) => match token.kind {
                TokenKind::Open => State::Skipping(outer, depth + 1),
                TokenKind::Close if depth == 1 => *outer,
                TokenKind::Close => State::Skipping(outer, depth - 1),
                TokenKind::Statement(_) => State::Skipping(outer, depth),
            },
        };
    }

    fn top_level(&mut self, token: Token) -> State {
        let text = match token.kind {
            TokenKind::Statement(text) => text,
            TokenKind::Open => {
                self.diagnostics
                    .push(Diagnostic::error(token.line, "unexpected `{` at top level"));
                return State::Skipping(Box::new(State::TopLevel), 1);
            }
            TokenKind::Close => {
                self.diagnostics
                    .push(Diagnostic::error(token.line, "unexpected `}` at top level"));
                return State::TopLevel;
            }
        };

        let (keyword, rest) = split_keyword(&text);
        match keyword {
            "namespace" => {
                if rest.split('.').all(is_identifier) {
                    self.definition.namespace = rest.to_string();
                } else {
                    self.diagnostics.push(Diagnostic::error(
                        token.line,
                        format!("invalid namespace `{}`", rest),
                    ));
                }
                State::TopLevel
            }
            "option" => {
                match parse_option(rest) {
                    Some((key, value)) => {
                        self.definition.options.insert(key, value);
                    }
                    None => self.diagnostics.push(Diagnostic::error(
                        token.line,
                        format!("malformed option `{}`", text),
                    )),
                }
                State::TopLevel
            }
            "message" if is_identifier(rest) => State::MessageHeader(ProtocolMessage {
                name: rest.to_string(),
                fields: Vec::new(),
                type_tag: 0,
                line: token.line,
            }),
            "service" if is_identifier(rest) => State::ServiceHeader(ProtocolService {
                name: rest.to_string(),
                methods: Vec::new(),
                line: token.line,
            }),
            _ => {
                self.diagnostics.push(Diagnostic::error(
                    token.line,
                    format!("unrecognized statement `{}`", text),
                ));
                State::TopLevel
            }
        }
    }

    fn finish(mut self) -> ParseOutput {
        match std::mem::take(&mut self.state) {
            State::TopLevel => {}
            State::Message(message) => {
                self.diagnostics.push(Diagnostic::warning(
                    message.line,
                    format!("message `{}` is missing its closing `}}`", message.name),
                ));
                self.definition.messages.push(message);
            }
            State::Service(service) => {
                self.diagnostics.push(Diagnostic::warning(
                    service.line,
                    format!("service `{}` is missing its closing `}}`", service.name),
                ));
                self.definition.services.push(service);
            }
            State::MessageHeader(message) => self.diagnostics.push(Diagnostic::error(
                message.line,
                format!("message `{}` has no body", message.name),
            )),
            State::ServiceHeader(service) => self.diagnostics.push(Diagnostic::error(
                service.line,
                format!("service `{}` has no body", service.name),
            )),
            State::Skipping(..) => self
                .diagnostics
                .push(Diagnostic::error(0, "unterminated block at end of input")),
        }

        self.definition.assign_type_tags();
        ParseOutput {
            definition: self.definition,
            diagnostics: self.diagnostics,
        }
    }
}

// =============================================================================
// Statement Grammars
// =============================================================================

/// `[repeated] <type> <name> = <id>`
fn parse_field(text: &str, line: usize) -> Result<ProtocolField, Diagnostic> {
    let spaced = text.replace('=', " = ");
    let words: Vec<&str> = spaced.split_whitespace().collect();

    let (repeated, rest) = match words.as_slice() {
        ["repeated", rest @ ..] => (true, rest),
        rest => (false, rest),
    };

    let [type_name, name, "=", id] = rest else {
        return Err(Diagnostic::error(
            line,
            format!("unrecognized field declaration `{}`", text),
        ));
    };

    if !is_type_name(type_name) || !is_identifier(name) {
        return Err(Diagnostic::error(
            line,
            format!("invalid field declaration `{}`", text),
        ));
    }

    let id: i32 = id
        .parse()
        .map_err(|_| Diagnostic::error(line, format!("invalid field id `{}`", id)))?;

    let (field_type, custom_type) = match FieldType::from_primitive_name(type_name) {
        Some(ty) => (ty, None),
        None => (FieldType::Struct, Some(type_name.to_string())),
    };

    Ok(ProtocolField {
        name: name.to_string(),
        field_type,
        id,
        repeated,
        custom_type,
        line,
    })
}

/// `rpc <Method>(<Req>) returns (<Resp>)`
fn parse_rpc(text: &str, line: usize) -> Result<ProtocolMethod, Diagnostic> {
    let malformed = || Diagnostic::error(line, format!("unrecognized rpc declaration `{}`", text));

    let (keyword, rest) = split_keyword(text);
    if keyword != "rpc" {
        return Err(malformed());
    }

    let (name, rest) = rest.split_once('(').ok_or_else(malformed)?;
    let (request, rest) = rest.split_once(')').ok_or_else(malformed)?;
    let rest = rest.trim_start().strip_prefix("returns").ok_or_else(malformed)?;
    let response = rest
        .trim()
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(malformed)?;

    let (name, request, response) = (name.trim(), request.trim(), response.trim());
    if !is_identifier(name) || !is_type_name(request) || !is_type_name(response) {
        return Err(malformed());
    }

    Ok(ProtocolMethod {
        name: name.to_string(),
        request_type: request.to_string(),
        response_type: response.to_string(),
        line,
    })
}

/// `<key> = "<value>"`
fn parse_option(rest: &str) -> Option<(String, String)> {
    let (key, value) = rest.split_once('=')?;
    let key = key.trim();
    let value = value.trim().strip_prefix('"')?.strip_suffix('"')?;
    if !is_type_name(key) {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

fn split_keyword(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (text, ""),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Identifiers, optionally dotted (`Other.Message`)
fn is_type_name(s: &str) -> bool {
    s.split('.').all(is_identifier)
}
