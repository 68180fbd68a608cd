//! Lexer - tokenizes source code into tokens.
//!
//! Newlines are significant: after a token that can end a statement
//! (identifier, literal, `)`, `]`, `}`, `++`, `--`, `return`, `break`,
//! `continue`), a line break produces a synthetic `;` token, so the
//! parser only ever deals in explicit statement terminators.

use crate::error::{syntax_error, ParseError};

/// Line/column location of a token in the source text. Both are
/// 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 1-based source line.
    pub line: u32,
    /// 1-based column within the line, counted in characters.
    pub column: u32,
}

impl Position {
    /// Position of the first character of a source text.
    pub fn start() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Reserved words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// func keyword
    Func,
    /// return keyword
    Return,
    /// if keyword
    If,
    /// else keyword
    Else,
    /// for keyword
    For,
    /// range keyword
    Range,
    /// break keyword
    Break,
    /// continue keyword
    Continue,
    /// true literal
    True,
    /// false literal
    False,
    /// nil literal
    Nil,
    /// in operator
    In,
}

impl Keyword {
    /// The source spelling of the keyword.
    pub fn word(self) -> &'static str {
        match self {
            Keyword::Func => "func",
            Keyword::Return => "return",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::For => "for",
            Keyword::Range => "range",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Nil => "nil",
            Keyword::In => "in",
        }
    }
}

/// Punctuators (operators and delimiters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuator {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// Statement terminator, written or synthesized from a newline
    Semicolon,
    /// `,`
    Comma,
    /// `.` attribute access
    Dot,
    /// `:` map key separator and slice bound separator
    Colon,
    /// `:=` declaration
    Declare,
    /// `=` assignment
    Assign,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `**` exponentiation
    StarStar,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Not,
    /// `&` bitwise and, set intersection
    And,
    /// `|` bitwise or, set union
    Or,
    /// `^` bitwise xor
    Xor,
    /// `<<`
    LtLt,
    /// `>>`
    GtGt,
    /// Increment
    PlusPlus,
    /// Decrement
    MinusMinus,
    /// Plus equals
    PlusEq,
    /// Minus equals
    MinusEq,
    /// Multiply equals
    StarEq,
    /// Divide equals
    SlashEq,
}

impl Punctuator {
    /// The source spelling of the punctuator.
    pub fn symbol(self) -> &'static str {
        match self {
            Punctuator::LParen => "(",
            Punctuator::RParen => ")",
            Punctuator::LBrace => "{",
            Punctuator::RBrace => "}",
            Punctuator::LBracket => "[",
            Punctuator::RBracket => "]",
            Punctuator::Semicolon => ";",
            Punctuator::Comma => ",",
            Punctuator::Dot => ".",
            Punctuator::Colon => ":",
            Punctuator::Declare => ":=",
            Punctuator::Assign => "=",
            Punctuator::Plus => "+",
            Punctuator::Minus => "-",
            Punctuator::Star => "*",
            Punctuator::Slash => "/",
            Punctuator::Percent => "%",
            Punctuator::StarStar => "**",
            Punctuator::EqEq => "==",
            Punctuator::NotEq => "!=",
            Punctuator::Lt => "<",
            Punctuator::LtEq => "<=",
            Punctuator::Gt => ">",
            Punctuator::GtEq => ">=",
            Punctuator::AndAnd => "&&",
            Punctuator::OrOr => "||",
            Punctuator::Not => "!",
            Punctuator::And => "&",
            Punctuator::Or => "|",
            Punctuator::Xor => "^",
            Punctuator::LtLt => "<<",
            Punctuator::GtGt => ">>",
            Punctuator::PlusPlus => "++",
            Punctuator::MinusMinus => "--",
            Punctuator::PlusEq => "+=",
            Punctuator::MinusEq => "-=",
            Punctuator::StarEq => "*=",
            Punctuator::SlashEq => "/=",
        }
    }
}

/// Token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier (variable or attribute name)
    Ident(String),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal, escapes already resolved
    Str(String),
    /// Keyword
    Keyword(Keyword),
    /// Punctuator/operator
    Punctuator(Punctuator),
    /// End of file
    EOF,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{name}"),
            Token::Int(value) => write!(f, "{value}"),
            Token::Float(value) => write!(f, "{value}"),
            Token::Str(value) => write!(f, "\"{value}\""),
            Token::Keyword(keyword) => write!(f, "{}", keyword.word()),
            Token::Punctuator(punctuator) => write!(f, "{}", punctuator.symbol()),
            Token::EOF => write!(f, "end of input"),
        }
    }
}

/// True for tokens that may end a statement; a newline after one of
/// these produces a synthetic `;`.
fn ends_statement(token: Option<&Token>) -> bool {
    match token {
        Some(Token::Ident(_)) | Some(Token::Int(_)) | Some(Token::Float(_))
        | Some(Token::Str(_)) => true,
        Some(Token::Keyword(keyword)) => matches!(
            keyword,
            Keyword::True
                | Keyword::False
                | Keyword::Nil
                | Keyword::Return
                | Keyword::Break
                | Keyword::Continue
        ),
        Some(Token::Punctuator(punctuator)) => matches!(
            punctuator,
            Punctuator::RParen
                | Punctuator::RBracket
                | Punctuator::RBrace
                | Punctuator::PlusPlus
                | Punctuator::MinusMinus
        ),
        _ => false,
    }
}

/// Lexer for source code
pub struct Lexer {
    chars: Vec<char>,
    /// Index of the next unread character.
    pub position: usize,
    /// Current 1-based line.
    pub line: u32,
    /// Current 1-based column.
    pub column: u32,
    /// One-token lookahead cache filled by [`Lexer::peek_token`].
    pub current_token: Option<Token>,
    /// Start position of the token `peek_token` returns (or the token
    /// `next_token` most recently returned).
    pub token_position: Position,
    /// Most recently scanned token, consulted for terminator insertion.
    pub last_token: Option<Token>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            current_token: None,
            token_position: Position::start(),
            last_token: None,
        }
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        if let Some(token) = self.current_token.take() {
            return Ok(token);
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it
    pub fn peek_token(&mut self) -> Result<&Token, ParseError> {
        match self.current_token.take() {
            Some(token) => Ok(self.current_token.insert(token)),
            None => {
                let token = self.scan_token()?;
                Ok(self.current_token.insert(token))
            }
        }
    }

    /// Check whether a `func` token is followed by a name, which makes
    /// it a declaration rather than a function literal. The next token
    /// must be `func`; the lexer is left untouched.
    pub fn check_func_declaration(&mut self) -> Result<bool, ParseError> {
        let saved = self.save_state();
        let result = self.scan_func_declaration();
        self.restore_state(saved);
        result
    }

    fn scan_func_declaration(&mut self) -> Result<bool, ParseError> {
        if self.next_token()? != Token::Keyword(Keyword::Func) {
            return Ok(false);
        }
        Ok(matches!(self.next_token()?, Token::Ident(_)))
    }

    /// Check whether the upcoming tokens form a range clause header:
    /// `ident := range` or `ident, ident := range`. The lexer is left
    /// untouched.
    pub fn check_range_clause(&mut self) -> Result<bool, ParseError> {
        let saved = self.save_state();
        let result = self.scan_range_clause();
        self.restore_state(saved);
        result
    }

    fn scan_range_clause(&mut self) -> Result<bool, ParseError> {
        if !matches!(self.next_token()?, Token::Ident(_)) {
            return Ok(false);
        }
        let mut token = self.next_token()?;
        if token == Token::Punctuator(Punctuator::Comma) {
            if !matches!(self.next_token()?, Token::Ident(_)) {
                return Ok(false);
            }
            token = self.next_token()?;
        }
        if token != Token::Punctuator(Punctuator::Declare) {
            return Ok(false);
        }
        Ok(self.next_token()? == Token::Keyword(Keyword::Range))
    }

    fn save_state(&self) -> LexerState {
        LexerState {
            position: self.position,
            line: self.line,
            column: self.column,
            current_token: self.current_token.clone(),
            token_position: self.token_position,
            last_token: self.last_token.clone(),
        }
    }

    fn restore_state(&mut self, state: LexerState) {
        self.position = state.position;
        self.line = state.line;
        self.column = state.column;
        self.current_token = state.current_token;
        self.token_position = state.token_position;
        self.last_token = state.last_token;
    }

    fn scan_token(&mut self) -> Result<Token, ParseError> {
        let line_before = self.line;
        self.skip_whitespace_and_comments();

        let start = Position { line: self.line, column: self.column };
        if self.line > line_before && ends_statement(self.last_token.as_ref()) {
            self.last_token = Some(Token::Punctuator(Punctuator::Semicolon));
            self.token_position = start;
            return Ok(Token::Punctuator(Punctuator::Semicolon));
        }
        self.token_position = start;

        if self.is_at_end() {
            self.last_token = Some(Token::EOF);
            return Ok(Token::EOF);
        }

        let ch = self.advance();
        let token = match ch {
            '(' => Token::Punctuator(Punctuator::LParen),
            ')' => Token::Punctuator(Punctuator::RParen),
            '{' => Token::Punctuator(Punctuator::LBrace),
            '}' => Token::Punctuator(Punctuator::RBrace),
            '[' => Token::Punctuator(Punctuator::LBracket),
            ']' => Token::Punctuator(Punctuator::RBracket),
            ';' => Token::Punctuator(Punctuator::Semicolon),
            ',' => Token::Punctuator(Punctuator::Comma),
            '.' => Token::Punctuator(Punctuator::Dot),
            '%' => Token::Punctuator(Punctuator::Percent),
            '^' => Token::Punctuator(Punctuator::Xor),

            ':' => {
                if self.match_char('=') {
                    Token::Punctuator(Punctuator::Declare)
                } else {
                    Token::Punctuator(Punctuator::Colon)
                }
            }

            '=' => {
                if self.match_char('=') {
                    Token::Punctuator(Punctuator::EqEq)
                } else {
                    Token::Punctuator(Punctuator::Assign)
                }
            }

            '!' => {
                if self.match_char('=') {
                    Token::Punctuator(Punctuator::NotEq)
                } else {
                    Token::Punctuator(Punctuator::Not)
                }
            }

            '+' => {
                if self.match_char('+') {
                    Token::Punctuator(Punctuator::PlusPlus)
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::PlusEq)
                } else {
                    Token::Punctuator(Punctuator::Plus)
                }
            }

            '-' => {
                if self.match_char('-') {
                    Token::Punctuator(Punctuator::MinusMinus)
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::MinusEq)
                } else {
                    Token::Punctuator(Punctuator::Minus)
                }
            }

            '*' => {
                if self.match_char('*') {
                    Token::Punctuator(Punctuator::StarStar)
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::StarEq)
                } else {
                    Token::Punctuator(Punctuator::Star)
                }
            }

            '/' => {
                if self.match_char('=') {
                    Token::Punctuator(Punctuator::SlashEq)
                } else {
                    Token::Punctuator(Punctuator::Slash)
                }
            }

            '<' => {
                if self.match_char('<') {
                    Token::Punctuator(Punctuator::LtLt)
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::LtEq)
                } else {
                    Token::Punctuator(Punctuator::Lt)
                }
            }

            '>' => {
                if self.match_char('>') {
                    Token::Punctuator(Punctuator::GtGt)
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::GtEq)
                } else {
                    Token::Punctuator(Punctuator::Gt)
                }
            }

            '&' => {
                if self.match_char('&') {
                    Token::Punctuator(Punctuator::AndAnd)
                } else {
                    Token::Punctuator(Punctuator::And)
                }
            }

            '|' => {
                if self.match_char('|') {
                    Token::Punctuator(Punctuator::OrOr)
                } else {
                    Token::Punctuator(Punctuator::Or)
                }
            }

            '"' | '\'' => self.scan_string(ch, start)?,

            _ if ch.is_ascii_digit() => self.scan_number(ch, start)?,

            _ if is_ident_start(ch) => self.scan_identifier(ch),

            _ => {
                return Err(syntax_error(
                    format!("unexpected character '{ch}'"),
                    start,
                ))
            }
        };

        self.last_token = Some(token.clone());
        Ok(token)
    }

    fn scan_string(&mut self, quote: char, start: Position) -> Result<Token, ParseError> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\n' {
                return Err(syntax_error("unterminated string literal", start));
            }
            if self.peek() == '\\' {
                self.advance();
                if self.is_at_end() {
                    return Err(syntax_error("unterminated string literal", start));
                }
                let escaped = self.advance();
                match unescape(escaped) {
                    Some(ch) => value.push(ch),
                    None => {
                        return Err(syntax_error(
                            format!("invalid escape sequence '\\{escaped}'"),
                            start,
                        ))
                    }
                }
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return Err(syntax_error("unterminated string literal", start));
        }
        self.advance();
        Ok(Token::Str(value))
    }

    fn scan_number(&mut self, first: char, start: Position) -> Result<Token, ParseError> {
        // Hex literal: 0x1f
        if first == '0' && (self.peek() == 'x' || self.peek() == 'X') {
            self.advance();
            let mut digits = String::new();
            while !self.is_at_end() && self.peek().is_ascii_hexdigit() {
                digits.push(self.advance());
            }
            if digits.is_empty() {
                return Err(syntax_error("invalid hexadecimal literal", start));
            }
            return match i64::from_str_radix(&digits, 16) {
                Ok(value) => Ok(Token::Int(value)),
                Err(_) => Err(syntax_error("integer literal out of range", start)),
            };
        }

        let mut digits = first.to_string();
        let mut is_float = false;

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            digits.push(self.advance());
        }

        // A dot only continues the number when a digit follows, so
        // `1.foo` stays an int followed by an attribute access.
        if self.peek() == '.' && self.peek_next().is_some_and(|ch| ch.is_ascii_digit()) {
            is_float = true;
            digits.push(self.advance());
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                digits.push(self.advance());
            }
        }

        if self.peek() == 'e' || self.peek() == 'E' {
            is_float = true;
            digits.push(self.advance());
            if self.peek() == '+' || self.peek() == '-' {
                digits.push(self.advance());
            }
            if self.is_at_end() || !self.peek().is_ascii_digit() {
                return Err(syntax_error("invalid float literal", start));
            }
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                digits.push(self.advance());
            }
        }

        if is_float {
            return match digits.parse::<f64>() {
                Ok(value) => Ok(Token::Float(value)),
                Err(_) => Err(syntax_error("invalid float literal", start)),
            };
        }
        match digits.parse::<i64>() {
            Ok(value) => Ok(Token::Int(value)),
            Err(_) => Err(syntax_error("integer literal out of range", start)),
        }
    }

    fn scan_identifier(&mut self, first: char) -> Token {
        let mut ident = first.to_string();
        while !self.is_at_end() && is_ident_continue(self.peek()) {
            ident.push(self.advance());
        }

        match ident.as_str() {
            "func" => Token::Keyword(Keyword::Func),
            "return" => Token::Keyword(Keyword::Return),
            "if" => Token::Keyword(Keyword::If),
            "else" => Token::Keyword(Keyword::Else),
            "for" => Token::Keyword(Keyword::For),
            "range" => Token::Keyword(Keyword::Range),
            "break" => Token::Keyword(Keyword::Break),
            "continue" => Token::Keyword(Keyword::Continue),
            "true" => Token::Keyword(Keyword::True),
            "false" => Token::Keyword(Keyword::False),
            "nil" => Token::Keyword(Keyword::Nil),
            "in" => Token::Keyword(Keyword::In),
            _ => Token::Ident(ident),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                '\r' => {
                    self.advance();
                    if !self.is_at_end() && self.peek() == '\n' {
                        self.advance();
                    }
                    self.line += 1;
                    self.column = 1;
                }
                '#' => self.skip_line_comment(),
                '/' if self.peek_next() == Some('/') => self.skip_line_comment(),
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars.get(self.position).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.position];
        self.position += 1;
        self.column += 1;
        ch
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.chars.get(self.position) != Some(&expected) {
            return false;
        }
        self.position += 1;
        self.column += 1;
        true
    }
}

struct LexerState {
    position: usize,
    line: u32,
    column: u32,
    current_token: Option<Token>,
    token_position: Position,
    last_token: Option<Token>,
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

fn unescape(ch: char) -> Option<char> {
    match ch {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '\\' => Some('\\'),
        '\'' => Some('\''),
        '"' => Some('"'),
        '0' => Some('\0'),
        _ => None,
    }
}
