//! Recursive descent parser.
//!
//! Statements are terminated by `;` tokens, which the lexer synthesizes
//! from newlines, so `x := 1` and `-2` on separate lines are two
//! statements. Compound assignment (`+=`, `-=`, `*=`, `/=`) and postfix
//! `++`/`--` are rewritten here into plain assignments; index and
//! attribute targets therefore evaluate their subexpressions twice.

use bytecode_system::BinaryOp;

use crate::ast::{Expression, PrefixOperator, Program, Statement};
use crate::error::{syntax_error, unexpected_token, ParseError};
use crate::lexer::{Keyword, Lexer, Position, Punctuator, Token};

/// Parse a complete source text.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(source).parse()
}

/// Parser for source code
pub struct Parser {
    lexer: Lexer,
    /// Loop nesting depth, for break/continue placement checks.
    loop_depth: usize,
    /// Function nesting depth, for return placement checks.
    func_depth: usize,
}

impl Parser {
    /// Create a new parser for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
            loop_depth: 0,
            func_depth: 0,
        }
    }

    /// Parse the source into a program
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_terminators()?;
            if self.is_at_end()? {
                break;
            }
            statements.push(self.parse_statement()?);
            self.check_statement_end()?;
        }
        Ok(Program { statements })
    }

    fn is_at_end(&mut self) -> Result<bool, ParseError> {
        Ok(matches!(self.lexer.peek_token()?, Token::EOF))
    }

    /// Start position of the next token.
    fn position(&mut self) -> Result<Position, ParseError> {
        self.lexer.peek_token()?;
        Ok(self.lexer.token_position)
    }

    fn skip_terminators(&mut self) -> Result<(), ParseError> {
        while self.check_punctuator(Punctuator::Semicolon)? {
            self.lexer.next_token()?;
        }
        Ok(())
    }

    fn check_statement_end(&mut self) -> Result<(), ParseError> {
        let token = self.lexer.peek_token()?.clone();
        match token {
            Token::Punctuator(Punctuator::Semicolon | Punctuator::RBrace) | Token::EOF => Ok(()),
            got => Err(unexpected_token(
                "';' or a new line",
                &got,
                self.lexer.token_position,
            )),
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let token = self.lexer.peek_token()?.clone();
        match token {
            Token::Keyword(Keyword::Func) => {
                if self.lexer.check_func_declaration()? {
                    self.parse_function_declaration()
                } else {
                    self.parse_simple_statement()
                }
            }
            Token::Keyword(Keyword::Return) => self.parse_return_statement(),
            Token::Keyword(Keyword::For) => self.parse_for_statement(),
            Token::Keyword(Keyword::Break) => self.parse_break_statement(),
            Token::Keyword(Keyword::Continue) => self.parse_continue_statement(),
            _ => self.parse_simple_statement(),
        }
    }

    /// Parse a declaration, assignment, or expression statement. Used
    /// directly for `for` init and post clauses, where block statements
    /// cannot appear.
    fn parse_simple_statement(&mut self) -> Result<Statement, ParseError> {
        let position = self.position()?;
        let expression = self.parse_expression()?;

        let token = self.lexer.peek_token()?.clone();
        match token {
            Token::Punctuator(Punctuator::Declare) => {
                self.lexer.next_token()?;
                let name = match expression {
                    Expression::Ident { name, .. } => name,
                    _ => {
                        return Err(syntax_error(
                            "expected an identifier on the left side of ':='",
                            position,
                        ))
                    }
                };
                let value = self.parse_expression()?;
                Ok(Statement::Declare { name, value, position })
            }
            Token::Punctuator(Punctuator::Assign) => {
                self.lexer.next_token()?;
                self.validate_assign_target(&expression)?;
                let value = self.parse_expression()?;
                Ok(Statement::Assign { target: expression, value, position })
            }
            Token::Punctuator(
                operator @ (Punctuator::PlusEq
                | Punctuator::MinusEq
                | Punctuator::StarEq
                | Punctuator::SlashEq),
            ) => {
                self.lexer.next_token()?;
                self.validate_assign_target(&expression)?;
                let operator = match operator {
                    Punctuator::PlusEq => BinaryOp::Add,
                    Punctuator::MinusEq => BinaryOp::Sub,
                    Punctuator::StarEq => BinaryOp::Mul,
                    _ => BinaryOp::Div,
                };
                let right = self.parse_expression()?;
                let value = Expression::Infix {
                    left: Box::new(expression.clone()),
                    operator,
                    right: Box::new(right),
                    position,
                };
                Ok(Statement::Assign { target: expression, value, position })
            }
            Token::Punctuator(step @ (Punctuator::PlusPlus | Punctuator::MinusMinus)) => {
                self.lexer.next_token()?;
                self.validate_assign_target(&expression)?;
                let operator = if step == Punctuator::PlusPlus {
                    BinaryOp::Add
                } else {
                    BinaryOp::Sub
                };
                let value = Expression::Infix {
                    left: Box::new(expression.clone()),
                    operator,
                    right: Box::new(Expression::Int { value: 1, position }),
                    position,
                };
                Ok(Statement::Assign { target: expression, value, position })
            }
            _ => Ok(Statement::Expression { expression, position }),
        }
    }

    fn validate_assign_target(&self, target: &Expression) -> Result<(), ParseError> {
        match target {
            Expression::Ident { .. } | Expression::Index { .. } | Expression::Attr { .. } => Ok(()),
            other => Err(syntax_error("invalid assignment target", other.position())),
        }
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, ParseError> {
        let position = self.position()?;
        self.expect_keyword(Keyword::Func)?;
        let name = self.expect_identifier()?;
        let (params, body) = self.parse_function_parts(position)?;
        Ok(Statement::Function { name, params, body, position })
    }

    /// Parse the parameter list and body shared by function declarations
    /// and function literals.
    fn parse_function_parts(
        &mut self,
        position: Position,
    ) -> Result<(Vec<String>, Vec<Statement>), ParseError> {
        self.expect_punctuator(Punctuator::LParen)?;
        let mut params = Vec::new();
        loop {
            self.skip_terminators()?;
            if self.check_punctuator(Punctuator::RParen)? {
                break;
            }
            let param = self.expect_identifier()?;
            if params.contains(&param) {
                return Err(syntax_error(
                    format!("duplicate parameter \"{param}\""),
                    position,
                ));
            }
            params.push(param);
            self.skip_terminators()?;
            if self.check_punctuator(Punctuator::Comma)? {
                self.lexer.next_token()?;
            } else {
                break;
            }
        }
        self.expect_punctuator(Punctuator::RParen)?;

        // A function body is a fresh loop context: break and continue
        // may not escape through the function boundary.
        let saved_loop_depth = self.loop_depth;
        self.loop_depth = 0;
        self.func_depth += 1;
        let body = self.parse_block();
        self.loop_depth = saved_loop_depth;
        self.func_depth -= 1;
        Ok((params, body?))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        let position = self.position()?;
        self.expect_keyword(Keyword::Return)?;
        if self.func_depth == 0 {
            return Err(syntax_error("return outside of a function", position));
        }
        let value = match self.lexer.peek_token()? {
            Token::Punctuator(Punctuator::Semicolon | Punctuator::RBrace) | Token::EOF => None,
            _ => Some(self.parse_expression()?),
        };
        Ok(Statement::Return { value, position })
    }

    fn parse_break_statement(&mut self) -> Result<Statement, ParseError> {
        let position = self.position()?;
        self.expect_keyword(Keyword::Break)?;
        if self.loop_depth == 0 {
            return Err(syntax_error("break outside of a loop", position));
        }
        Ok(Statement::Break { position })
    }

    fn parse_continue_statement(&mut self) -> Result<Statement, ParseError> {
        let position = self.position()?;
        self.expect_keyword(Keyword::Continue)?;
        if self.loop_depth == 0 {
            return Err(syntax_error("continue outside of a loop", position));
        }
        Ok(Statement::Continue { position })
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        let position = self.position()?;
        self.expect_keyword(Keyword::For)?;
        self.loop_depth += 1;
        let result = self.parse_for_clauses(position);
        self.loop_depth -= 1;
        result
    }

    fn parse_for_clauses(&mut self, position: Position) -> Result<Statement, ParseError> {
        // for { }
        if self.check_punctuator(Punctuator::LBrace)? {
            let body = self.parse_block()?;
            return Ok(Statement::For {
                init: None,
                condition: None,
                post: None,
                body,
                position,
            });
        }

        // for x := range c { }  /  for k, v := range c { }
        if matches!(self.lexer.peek_token()?, Token::Ident(_)) && self.lexer.check_range_clause()? {
            let first = self.expect_identifier()?;
            let second = if self.check_punctuator(Punctuator::Comma)? {
                self.lexer.next_token()?;
                Some(self.expect_identifier()?)
            } else {
                None
            };
            self.expect_punctuator(Punctuator::Declare)?;
            self.expect_keyword(Keyword::Range)?;
            let iterable = self.parse_expression()?;
            let body = self.parse_block()?;
            return Ok(Statement::ForRange {
                first,
                second,
                iterable,
                body,
                position,
            });
        }

        // for ; cond; post { }
        if self.check_punctuator(Punctuator::Semicolon)? {
            self.lexer.next_token()?;
            return self.parse_for_three_clause(None, position);
        }

        let first = self.parse_simple_statement()?;

        // for cond { }
        if self.check_punctuator(Punctuator::LBrace)? {
            let condition = match first {
                Statement::Expression { expression, .. } => expression,
                _ => {
                    return Err(unexpected_token(
                        "';'",
                        &Token::Punctuator(Punctuator::LBrace),
                        self.lexer.token_position,
                    ))
                }
            };
            let body = self.parse_block()?;
            return Ok(Statement::For {
                init: None,
                condition: Some(condition),
                post: None,
                body,
                position,
            });
        }

        self.expect_punctuator(Punctuator::Semicolon)?;
        self.parse_for_three_clause(Some(Box::new(first)), position)
    }

    fn parse_for_three_clause(
        &mut self,
        init: Option<Box<Statement>>,
        position: Position,
    ) -> Result<Statement, ParseError> {
        let condition = if self.check_punctuator(Punctuator::Semicolon)? {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punctuator(Punctuator::Semicolon)?;
        let post = if self.check_punctuator(Punctuator::LBrace)? {
            None
        } else {
            Some(Box::new(self.parse_simple_statement()?))
        };
        let body = self.parse_block()?;
        Ok(Statement::For {
            init,
            condition,
            post,
            body,
            position,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut statements = Vec::new();
        loop {
            self.skip_terminators()?;
            if self.check_punctuator(Punctuator::RBrace)? {
                break;
            }
            if self.is_at_end()? {
                return Err(unexpected_token(
                    "'}'",
                    &Token::EOF,
                    self.lexer.token_position,
                ));
            }
            statements.push(self.parse_statement()?);
            self.check_statement_end()?;
        }
        self.lexer.next_token()?;
        Ok(statements)
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_or_expression()
    }

    fn parse_or_expression(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_and_expression()?;

        while self.check_punctuator(Punctuator::OrOr)? {
            self.lexer.next_token()?;
            let right = self.parse_and_expression()?;
            let position = left.position();
            left = Expression::Infix {
                left: Box::new(left),
                operator: BinaryOp::Or,
                right: Box::new(right),
                position,
            };
        }

        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_comparison_expression()?;

        while self.check_punctuator(Punctuator::AndAnd)? {
            self.lexer.next_token()?;
            let right = self.parse_comparison_expression()?;
            let position = left.position();
            left = Expression::Infix {
                left: Box::new(left),
                operator: BinaryOp::And,
                right: Box::new(right),
                position,
            };
        }

        Ok(left)
    }

    fn parse_comparison_expression(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_additive_expression()?;

        loop {
            let operator = match self.lexer.peek_token()? {
                Token::Punctuator(Punctuator::EqEq) => BinaryOp::Eq,
                Token::Punctuator(Punctuator::NotEq) => BinaryOp::Ne,
                Token::Punctuator(Punctuator::Lt) => BinaryOp::Lt,
                Token::Punctuator(Punctuator::LtEq) => BinaryOp::Le,
                Token::Punctuator(Punctuator::Gt) => BinaryOp::Gt,
                Token::Punctuator(Punctuator::GtEq) => BinaryOp::Ge,
                Token::Keyword(Keyword::In) => BinaryOp::In,
                _ => break,
            };
            self.lexer.next_token()?;
            let right = self.parse_additive_expression()?;
            let position = left.position();
            left = Expression::Infix {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                position,
            };
        }

        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative_expression()?;

        loop {
            let operator = match self.lexer.peek_token()? {
                Token::Punctuator(Punctuator::Plus) => BinaryOp::Add,
                Token::Punctuator(Punctuator::Minus) => BinaryOp::Sub,
                Token::Punctuator(Punctuator::Or) => BinaryOp::BitOr,
                Token::Punctuator(Punctuator::Xor) => BinaryOp::BitXor,
                _ => break,
            };
            self.lexer.next_token()?;
            let right = self.parse_multiplicative_expression()?;
            let position = left.position();
            left = Expression::Infix {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                position,
            };
        }

        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary_expression()?;

        loop {
            let operator = match self.lexer.peek_token()? {
                Token::Punctuator(Punctuator::Star) => BinaryOp::Mul,
                Token::Punctuator(Punctuator::Slash) => BinaryOp::Div,
                Token::Punctuator(Punctuator::Percent) => BinaryOp::Mod,
                Token::Punctuator(Punctuator::LtLt) => BinaryOp::Shl,
                Token::Punctuator(Punctuator::GtGt) => BinaryOp::Shr,
                Token::Punctuator(Punctuator::And) => BinaryOp::BitAnd,
                _ => break,
            };
            self.lexer.next_token()?;
            let right = self.parse_unary_expression()?;
            let position = left.position();
            left = Expression::Infix {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                position,
            };
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, ParseError> {
        let operator = match self.lexer.peek_token()? {
            Token::Punctuator(Punctuator::Minus) => Some(PrefixOperator::Minus),
            Token::Punctuator(Punctuator::Not) => Some(PrefixOperator::Not),
            _ => None,
        };

        if let Some(operator) = operator {
            let position = self.position()?;
            self.lexer.next_token()?;
            let operand = Box::new(self.parse_unary_expression()?);
            return Ok(Expression::Prefix { operator, operand, position });
        }

        self.parse_power_expression()
    }

    /// Parse exponentiation, which is right-associative and binds
    /// tighter than unary minus: `-2 ** 2` is `-(2 ** 2)` and
    /// `2 ** -1` is legal.
    fn parse_power_expression(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_postfix_expression()?;

        if self.check_punctuator(Punctuator::StarStar)? {
            self.lexer.next_token()?;
            let right = self.parse_unary_expression()?;
            let position = left.position();
            return Ok(Expression::Infix {
                left: Box::new(left),
                operator: BinaryOp::Pow,
                right: Box::new(right),
                position,
            });
        }

        Ok(left)
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            match self.lexer.peek_token()? {
                Token::Punctuator(Punctuator::LParen) => {
                    self.lexer.next_token()?;
                    let arguments = self.parse_expression_list(Punctuator::RParen)?;
                    let position = expr.position();
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        arguments,
                        position,
                    };
                }
                Token::Punctuator(Punctuator::LBracket) => {
                    self.lexer.next_token()?;
                    expr = self.parse_index_or_slice(expr)?;
                }
                Token::Punctuator(Punctuator::Dot) => {
                    self.lexer.next_token()?;
                    let name = self.expect_identifier()?;
                    let position = expr.position();
                    expr = Expression::Attr {
                        object: Box::new(expr),
                        name,
                        position,
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse the rest of `object[...` as an index or slice expression;
    /// the opening bracket is already consumed.
    fn parse_index_or_slice(&mut self, object: Expression) -> Result<Expression, ParseError> {
        let position = object.position();

        if self.check_punctuator(Punctuator::Colon)? {
            self.lexer.next_token()?;
            let stop = self.parse_slice_bound()?;
            self.expect_punctuator(Punctuator::RBracket)?;
            return Ok(Expression::Slice {
                object: Box::new(object),
                start: None,
                stop,
                position,
            });
        }

        let index = self.parse_expression()?;
        if self.check_punctuator(Punctuator::Colon)? {
            self.lexer.next_token()?;
            let stop = self.parse_slice_bound()?;
            self.expect_punctuator(Punctuator::RBracket)?;
            return Ok(Expression::Slice {
                object: Box::new(object),
                start: Some(Box::new(index)),
                stop,
                position,
            });
        }

        self.expect_punctuator(Punctuator::RBracket)?;
        Ok(Expression::Index {
            object: Box::new(object),
            index: Box::new(index),
            position,
        })
    }

    fn parse_slice_bound(&mut self) -> Result<Option<Box<Expression>>, ParseError> {
        if self.check_punctuator(Punctuator::RBracket)? {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.parse_expression()?)))
        }
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, ParseError> {
        let position = self.position()?;
        let token = self.lexer.peek_token()?.clone();
        match token {
            Token::Int(value) => {
                self.lexer.next_token()?;
                Ok(Expression::Int { value, position })
            }
            Token::Float(value) => {
                self.lexer.next_token()?;
                Ok(Expression::Float { value, position })
            }
            Token::Str(value) => {
                self.lexer.next_token()?;
                Ok(Expression::Str { value, position })
            }
            Token::Ident(name) => {
                self.lexer.next_token()?;
                Ok(Expression::Ident { name, position })
            }
            Token::Keyword(Keyword::True) => {
                self.lexer.next_token()?;
                Ok(Expression::Bool { value: true, position })
            }
            Token::Keyword(Keyword::False) => {
                self.lexer.next_token()?;
                Ok(Expression::Bool { value: false, position })
            }
            Token::Keyword(Keyword::Nil) => {
                self.lexer.next_token()?;
                Ok(Expression::Nil { position })
            }
            Token::Keyword(Keyword::If) => self.parse_if_expression(),
            Token::Keyword(Keyword::Func) => self.parse_function_literal(),
            Token::Punctuator(Punctuator::LParen) => {
                self.lexer.next_token()?;
                let expr = self.parse_expression()?;
                self.expect_punctuator(Punctuator::RParen)?;
                Ok(expr)
            }
            Token::Punctuator(Punctuator::LBracket) => self.parse_list_literal(),
            Token::Punctuator(Punctuator::LBrace) => self.parse_map_literal(),
            other => Err(unexpected_token("an expression", &other, position)),
        }
    }

    fn parse_if_expression(&mut self) -> Result<Expression, ParseError> {
        let position = self.position()?;
        self.expect_keyword(Keyword::If)?;
        let condition = Box::new(self.parse_expression()?);
        let consequence = self.parse_block()?;

        // `else` must follow the closing brace on the same line; a
        // newline in between ends the statement instead.
        let alternative = if self.check_keyword(Keyword::Else)? {
            self.lexer.next_token()?;
            if self.check_keyword(Keyword::If)? {
                let nested = self.parse_if_expression()?;
                let nested_position = nested.position();
                Some(vec![Statement::Expression {
                    expression: nested,
                    position: nested_position,
                }])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(Expression::If {
            condition,
            consequence,
            alternative,
            position,
        })
    }

    fn parse_function_literal(&mut self) -> Result<Expression, ParseError> {
        let position = self.position()?;
        self.expect_keyword(Keyword::Func)?;
        let name = if matches!(self.lexer.peek_token()?, Token::Ident(_)) {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        let (params, body) = self.parse_function_parts(position)?;
        Ok(Expression::Func { name, params, body, position })
    }

    fn parse_list_literal(&mut self) -> Result<Expression, ParseError> {
        let position = self.position()?;
        self.expect_punctuator(Punctuator::LBracket)?;
        let elements = self.parse_expression_list(Punctuator::RBracket)?;
        Ok(Expression::List { elements, position })
    }

    fn parse_map_literal(&mut self) -> Result<Expression, ParseError> {
        let position = self.position()?;
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut entries = Vec::new();
        loop {
            self.skip_terminators()?;
            if self.check_punctuator(Punctuator::RBrace)? {
                break;
            }
            let key = match self.lexer.next_token()? {
                Token::Ident(name) => name,
                Token::Str(value) => value,
                got => {
                    return Err(unexpected_token(
                        "a map key",
                        &got,
                        self.lexer.token_position,
                    ))
                }
            };
            self.expect_punctuator(Punctuator::Colon)?;
            entries.push((key, self.parse_expression()?));
            self.skip_terminators()?;
            if self.check_punctuator(Punctuator::Comma)? {
                self.lexer.next_token()?;
            } else {
                break;
            }
        }
        self.expect_punctuator(Punctuator::RBrace)?;
        Ok(Expression::Map { entries, position })
    }

    /// Parse comma-separated expressions up to (but not consuming past)
    /// the closing punctuator; the opener is already consumed. Newlines
    /// around elements are tolerated.
    fn parse_expression_list(&mut self, closer: Punctuator) -> Result<Vec<Expression>, ParseError> {
        let mut elements = Vec::new();
        loop {
            self.skip_terminators()?;
            if self.check_punctuator(closer)? {
                break;
            }
            elements.push(self.parse_expression()?);
            self.skip_terminators()?;
            if self.check_punctuator(Punctuator::Comma)? {
                self.lexer.next_token()?;
            } else {
                break;
            }
        }
        self.expect_punctuator(closer)?;
        Ok(elements)
    }

    fn check_punctuator(&mut self, punctuator: Punctuator) -> Result<bool, ParseError> {
        Ok(matches!(self.lexer.peek_token()?, Token::Punctuator(x) if *x == punctuator))
    }

    fn check_keyword(&mut self, keyword: Keyword) -> Result<bool, ParseError> {
        Ok(matches!(self.lexer.peek_token()?, Token::Keyword(x) if *x == keyword))
    }

    fn expect_punctuator(&mut self, punctuator: Punctuator) -> Result<(), ParseError> {
        let token = self.lexer.next_token()?;
        if token == Token::Punctuator(punctuator) {
            return Ok(());
        }
        Err(unexpected_token(
            &format!("'{}'", punctuator.symbol()),
            &token,
            self.lexer.token_position,
        ))
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        let token = self.lexer.next_token()?;
        if token == Token::Keyword(keyword) {
            return Ok(());
        }
        Err(unexpected_token(
            &format!("'{}'", keyword.word()),
            &token,
            self.lexer.token_position,
        ))
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        let token = self.lexer.next_token()?;
        if let Token::Ident(name) = token {
            return Ok(name);
        }
        Err(unexpected_token(
            "an identifier",
            &token,
            self.lexer.token_position,
        ))
    }
}
