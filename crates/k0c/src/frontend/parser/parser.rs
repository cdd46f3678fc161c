//! k0 recursive descent parser
//!
//! Declarations and statements are parsed by recursive descent; expressions
//! by a function-per-level precedence ladder, loosest binding first:
//! assignment, elvis, `||`, `&&`, equality, relational (including `in`/`is`),
//! range, additive, multiplicative, unary prefix, postfix, primary. Binary
//! operators are left-associative, assignment is right-associative.
//!
//! On a grammar violation the parser records a diagnostic and synchronizes to
//! the next statement boundary, so independent errors in one file are all
//! reported in a single pass.

use crate::common::{CompileError, CompileResult, Diagnostic, Span};
use crate::frontend::ast::*;
use crate::frontend::lexer::{Lexer, RawFragment, Token, TokenKind, has_template, split_template,
                             unescape_char};

/// k0 parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            diagnostics: Vec::new(),
        }
    }

    /// Parse a complete source unit.
    ///
    /// Always returns a `Program`; grammar violations are collected in the
    /// diagnostic list rather than aborting the parse.
    pub fn parse_program(mut self) -> (Program, Vec<Diagnostic>) {
        let start = self.lexer.peek().span;
        let mut decls = Vec::new();

        while !self.check(&TokenKind::Eof) {
            match self.parse_declaration() {
                Ok(decl) => decls.push(decl),
                Err(err) => {
                    self.diagnostics.push(err.into());
                    self.synchronize_top_level();
                }
            }
            while self.lexer.match_token(&TokenKind::Semi) {}
        }

        let end = self.lexer.peek().span;
        // Lexical errors were discovered first; keep them ahead of syntax ones
        let mut diagnostics = self.lexer.take_diagnostics();
        diagnostics.append(&mut self.diagnostics);
        (Program::new(decls, Span::new(start.start, end.end)), diagnostics)
    }

    // ==================== Declarations ====================

    fn parse_declaration(&mut self) -> CompileResult<Decl> {
        let start = self.lexer.peek().span;
        let kind = if self.check(&TokenKind::Fun) {
            DeclKind::Fun(self.parse_fun_decl()?)
        } else if self.check(&TokenKind::Sealed) || self.check(&TokenKind::Class) {
            DeclKind::Class(self.parse_class_decl()?)
        } else if self.check(&TokenKind::Val)
            || self.check(&TokenKind::Var)
            || self.check(&TokenKind::Const)
        {
            DeclKind::Var(self.parse_var_decl()?)
        } else {
            let token = self.lexer.next_token();
            return Err(CompileError::parser(
                format!("expected declaration, found {}", token.kind),
                token.span,
            ));
        };

        let end = self.lexer.peek().span;
        Ok(Decl::new(kind, Span::new(start.start, end.start)))
    }

    fn parse_fun_decl(&mut self) -> CompileResult<FunDecl> {
        let start = self.expect(TokenKind::Fun)?.span;
        let (name, name_span) = self.expect_identifier()?;

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.check(&TokenKind::Eof) {
            let (param_name, param_span) = self.expect_identifier()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            let end = ty.span;
            params.push(Param {
                name: param_name,
                ty,
                span: param_span.to(end),
            });
            if !self.lexer.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        let return_type = if self.lexer.match_token(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = if self.lexer.match_token(&TokenKind::Eq) {
            FunBody::Expr(Box::new(self.parse_expression()?))
        } else {
            FunBody::Block(self.parse_block()?)
        };

        let end = match &body {
            FunBody::Block(block) => block.span,
            FunBody::Expr(expr) => expr.span,
        };

        Ok(FunDecl {
            name,
            name_span,
            params,
            return_type,
            body,
            span: start.to(end),
        })
    }

    fn parse_class_decl(&mut self) -> CompileResult<ClassDecl> {
        let sealed = self.lexer.match_token(&TokenKind::Sealed);
        let start = self.expect(TokenKind::Class)?.span;
        let (name, name_span) = self.expect_identifier()?;

        let mut fields = Vec::new();
        if self.lexer.match_token(&TokenKind::LParen) {
            while !self.check(&TokenKind::RParen) && !self.check(&TokenKind::Eof) {
                let field_start = self.lexer.peek().span;
                let mutable = if self.lexer.match_token(&TokenKind::Var) {
                    true
                } else {
                    self.lexer.match_token(&TokenKind::Val);
                    false
                };
                let (field_name, _) = self.expect_identifier()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                let field_end = ty.span;
                fields.push(ClassField {
                    name: field_name,
                    ty,
                    mutable,
                    span: field_start.to(field_end),
                });
                if !self.lexer.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        let supertype = if self.lexer.match_token(&TokenKind::Colon) {
            let (super_name, _) = self.expect_identifier()?;
            self.expect(TokenKind::LParen)?;
            self.expect(TokenKind::RParen)?;
            Some(super_name)
        } else {
            None
        };

        let end = self.lexer.peek().span;
        Ok(ClassDecl {
            name,
            name_span,
            sealed,
            supertype,
            fields,
            span: start.to(Span::new(end.start, end.start)),
        })
    }

    fn parse_var_decl(&mut self) -> CompileResult<VarDecl> {
        let start = self.lexer.peek().span;
        let is_const = self.lexer.match_token(&TokenKind::Const);

        let mutable = if self.lexer.match_token(&TokenKind::Var) {
            if is_const {
                return Err(CompileError::parser(
                    "'const' may only modify 'val' declarations",
                    start,
                ));
            }
            true
        } else {
            self.expect(TokenKind::Val)?;
            false
        };

        let (name, name_span) = self.expect_identifier()?;

        let declared_type = if self.lexer.match_token(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        // Declaration-with-constructor form from the fixtures:
        //   var data: Array<Int>(8) { 0 }
        let init = if let Some(ty) = declared_type
            .as_ref()
            .filter(|t| matches!(t.kind, TypeExprKind::Array(_)))
            .filter(|_| self.check(&TokenKind::LParen))
        {
            let TypeExprKind::Array(element) = &ty.kind else {
                unreachable!()
            };
            Some(self.parse_array_constructor((**element).clone(), ty.span)?)
        } else if self.lexer.match_token(&TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let end = init
            .as_ref()
            .map(|e| e.span)
            .or_else(|| declared_type.as_ref().map(|t| t.span))
            .unwrap_or(name_span);

        Ok(VarDecl {
            name,
            name_span,
            mutable,
            is_const,
            declared_type,
            init,
            span: start.to(end),
        })
    }

    // ==================== Types ====================

    fn parse_type(&mut self) -> CompileResult<TypeExpr> {
        let (name, name_span) = self.expect_identifier()?;

        let mut ty = if name == "Array" && self.lexer.match_token(&TokenKind::Lt) {
            let element = self.parse_type()?;
            let end = self.expect(TokenKind::Gt)?.span;
            TypeExpr::new(
                TypeExprKind::Array(Box::new(element)),
                name_span.to(end),
            )
        } else {
            TypeExpr::new(TypeExprKind::Named(name), name_span)
        };

        while self.check(&TokenKind::Question) {
            let end = self.lexer.next_token().span;
            let span = ty.span.to(end);
            ty = TypeExpr::new(TypeExprKind::Nullable(Box::new(ty)), span);
        }

        Ok(ty)
    }

    // ==================== Statements ====================

    fn parse_block(&mut self) -> CompileResult<Block> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.diagnostics.push(err.into());
                    self.synchronize();
                }
            }
            while self.lexer.match_token(&TokenKind::Semi) {}
        }

        let end = self.expect(TokenKind::RBrace)?.span;
        Ok(Block::new(stmts, start.to(end)))
    }

    /// A loop/branch body: a block, or a single statement wrapped in one
    fn parse_body(&mut self) -> CompileResult<Block> {
        if self.check(&TokenKind::LBrace) {
            self.parse_block()
        } else {
            let stmt = self.parse_statement()?;
            let span = stmt.span;
            Ok(Block::new(vec![stmt], span))
        }
    }

    fn parse_statement(&mut self) -> CompileResult<Stmt> {
        let start = self.lexer.peek().span;

        if self.check(&TokenKind::Fun) {
            return Err(CompileError::parser(
                "nested function declarations are not permitted",
                start,
            ));
        }

        if self.check(&TokenKind::Val)
            || self.check(&TokenKind::Var)
            || self.check(&TokenKind::Const)
        {
            let decl = self.parse_var_decl()?;
            let span = decl.span;
            return Ok(Stmt::new(StmtKind::Var(decl), span));
        }

        if self.check(&TokenKind::If) {
            return self.parse_if_statement();
        }

        if self.lexer.match_token(&TokenKind::While) {
            self.expect(TokenKind::LParen)?;
            let condition = self.parse_expression()?;
            self.expect(TokenKind::RParen)?;
            let body = self.parse_body()?;
            let span = start.to(body.span);
            return Ok(Stmt::new(StmtKind::While { condition, body }, span));
        }

        if self.lexer.match_token(&TokenKind::Do) {
            let body = self.parse_body()?;
            self.expect(TokenKind::While)?;
            self.expect(TokenKind::LParen)?;
            let condition = self.parse_expression()?;
            let end = self.expect(TokenKind::RParen)?.span;
            return Ok(Stmt::new(
                StmtKind::DoWhile { body, condition },
                start.to(end),
            ));
        }

        if self.lexer.match_token(&TokenKind::For) {
            self.expect(TokenKind::LParen)?;
            let (binding, binding_span) = self.expect_identifier()?;
            self.expect(TokenKind::In)?;
            let iterable = self.parse_expression()?;
            self.expect(TokenKind::RParen)?;
            let body = self.parse_body()?;
            let span = start.to(body.span);
            return Ok(Stmt::new(
                StmtKind::For {
                    binding,
                    binding_span,
                    iterable,
                    body,
                },
                span,
            ));
        }

        if self.check(&TokenKind::When) {
            let when = self.parse_when_statement()?;
            let span = when.span;
            return Ok(Stmt::new(StmtKind::When(when), span));
        }

        if self.lexer.match_token(&TokenKind::Return) {
            let value = if self.check(&TokenKind::RBrace)
                || self.check(&TokenKind::Semi)
                || self.check(&TokenKind::Eof)
                || self.lexer.peek().kind.starts_statement()
            {
                None
            } else {
                Some(self.parse_expression()?)
            };
            let end = value.as_ref().map(|e| e.span).unwrap_or(start);
            return Ok(Stmt::new(StmtKind::Return(value), start.to(end)));
        }

        if self.lexer.match_token(&TokenKind::Break) {
            return Ok(Stmt::new(StmtKind::Break, start));
        }

        if self.lexer.match_token(&TokenKind::Continue) {
            return Ok(Stmt::new(StmtKind::Continue, start));
        }

        if self.check(&TokenKind::LBrace) {
            let block = self.parse_block()?;
            let span = block.span;
            return Ok(Stmt::new(StmtKind::Block(block), span));
        }

        let expr = self.parse_expression()?;
        let span = expr.span;
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }

    fn parse_if_statement(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::If)?.span;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let then_block = self.parse_body()?;

        let else_block = if self.lexer.match_token(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(Box::new(self.parse_if_statement()?))
            } else {
                let block = self.parse_body()?;
                let span = block.span;
                Some(Box::new(Stmt::new(StmtKind::Block(block), span)))
            }
        } else {
            None
        };

        let end = else_block
            .as_ref()
            .map(|s| s.span)
            .unwrap_or(then_block.span);
        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_block,
                else_block,
            },
            start.to(end),
        ))
    }

    fn parse_when_statement(&mut self) -> CompileResult<WhenStmt> {
        let start = self.expect(TokenKind::When)?.span;

        let subject = if self.lexer.match_token(&TokenKind::LParen) {
            let subject = self.parse_expression()?;
            self.expect(TokenKind::RParen)?;
            Some(subject)
        } else {
            None
        };

        self.expect(TokenKind::LBrace)?;
        let mut arms = Vec::new();
        let mut else_seen = false;

        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            let arm_start = self.lexer.peek().span;
            let pattern = if self.check(&TokenKind::Else) {
                let span = self.lexer.next_token().span;
                if else_seen {
                    self.diagnostics.push(Diagnostic::syntax(
                        "duplicate 'else' arm in when",
                        span,
                    ));
                }
                else_seen = true;
                WhenPattern::Else
            } else if self.lexer.match_token(&TokenKind::Is) {
                let (name, span) = self.expect_identifier()?;
                WhenPattern::Is { name, span }
            } else if self.lexer.match_token(&TokenKind::In) {
                WhenPattern::In(self.parse_expression()?)
            } else {
                WhenPattern::Expr(self.parse_expression()?)
            };

            self.expect(TokenKind::Arrow)?;
            let body = self.parse_body()?;
            let span = arm_start.to(body.span);
            arms.push(WhenArm {
                pattern,
                body,
                span,
            });
            while self.lexer.match_token(&TokenKind::Semi) {}
        }

        let end = self.expect(TokenKind::RBrace)?.span;
        Ok(WhenStmt {
            subject,
            arms,
            span: start.to(end),
        })
    }

    // ==================== Expressions ====================

    pub fn parse_expression(&mut self) -> CompileResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> CompileResult<Expr> {
        let target = self.parse_elvis()?;

        let op = if self.check(&TokenKind::Eq) {
            None
        } else if self.check(&TokenKind::PlusEq) {
            Some(BinOp::Add)
        } else if self.check(&TokenKind::MinusEq) {
            Some(BinOp::Sub)
        } else {
            return Ok(target);
        };

        let op_span = self.lexer.next_token().span;
        if !matches!(
            target.kind,
            ExprKind::Identifier(_) | ExprKind::Index { .. } | ExprKind::Member { .. }
        ) {
            return Err(CompileError::parser("invalid assignment target", op_span));
        }

        // Right-associative: a = b = 3 assigns 3 to both
        let value = self.parse_assignment()?;
        let span = target.span.to(value.span);
        Ok(Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                op,
                value: Box::new(value),
            },
            span,
        ))
    }

    fn parse_elvis(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_logical_or()?;
        while self.lexer.match_token(&TokenKind::Elvis) {
            let fallback = self.parse_logical_or()?;
            let span = expr.span.to(fallback.span);
            expr = Expr::new(
                ExprKind::Elvis {
                    value: Box::new(expr),
                    fallback: Box::new(fallback),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_logical_or(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_logical_and()?;
        while self.lexer.match_token(&TokenKind::PipePipe) {
            let right = self.parse_logical_and()?;
            expr = Self::binary(BinOp::Or, expr, right);
        }
        Ok(expr)
    }

    fn parse_logical_and(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_equality()?;
        while self.lexer.match_token(&TokenKind::AmpAmp) {
            let right = self.parse_equality()?;
            expr = Self::binary(BinOp::And, expr, right);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_relational()?;
        loop {
            let op = if self.lexer.match_token(&TokenKind::EqEqEq) {
                BinOp::RefEq
            } else if self.lexer.match_token(&TokenKind::EqEq) {
                BinOp::Eq
            } else if self.lexer.match_token(&TokenKind::NotEq) {
                BinOp::Ne
            } else {
                return Ok(expr);
            };
            let right = self.parse_relational()?;
            expr = Self::binary(op, expr, right);
        }
    }

    fn parse_relational(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_range()?;
        loop {
            if self.lexer.match_token(&TokenKind::In) {
                let range = self.parse_range()?;
                let span = expr.span.to(range.span);
                expr = Expr::new(
                    ExprKind::InRange {
                        value: Box::new(expr),
                        range: Box::new(range),
                    },
                    span,
                );
                continue;
            }
            if self.lexer.match_token(&TokenKind::Is) {
                let (ty_name, name_span) = self.expect_identifier()?;
                let span = expr.span.to(name_span);
                expr = Expr::new(
                    ExprKind::Is {
                        value: Box::new(expr),
                        ty_name,
                    },
                    span,
                );
                continue;
            }
            let op = if self.lexer.match_token(&TokenKind::LtEq) {
                BinOp::Le
            } else if self.lexer.match_token(&TokenKind::GtEq) {
                BinOp::Ge
            } else if self.lexer.match_token(&TokenKind::Lt) {
                BinOp::Lt
            } else if self.lexer.match_token(&TokenKind::Gt) {
                BinOp::Gt
            } else {
                return Ok(expr);
            };
            let right = self.parse_range()?;
            expr = Self::binary(op, expr, right);
        }
    }

    fn parse_range(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_additive()?;
        loop {
            let inclusive = if self.lexer.match_token(&TokenKind::DotDotLt) {
                false
            } else if self.lexer.match_token(&TokenKind::DotDot) {
                true
            } else {
                return Ok(expr);
            };
            let end = self.parse_additive()?;
            let span = expr.span.to(end.span);
            expr = Expr::new(
                ExprKind::Range {
                    start: Box::new(expr),
                    end: Box::new(end),
                    inclusive,
                },
                span,
            );
        }
    }

    fn parse_additive(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = if self.lexer.match_token(&TokenKind::Plus) {
                BinOp::Add
            } else if self.lexer.match_token(&TokenKind::Minus) {
                BinOp::Sub
            } else {
                return Ok(expr);
            };
            let right = self.parse_multiplicative()?;
            expr = Self::binary(op, expr, right);
        }
    }

    fn parse_multiplicative(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = if self.lexer.match_token(&TokenKind::Star) {
                BinOp::Mul
            } else if self.lexer.match_token(&TokenKind::Slash) {
                BinOp::Div
            } else if self.lexer.match_token(&TokenKind::Percent) {
                BinOp::Rem
            } else {
                return Ok(expr);
            };
            let right = self.parse_unary()?;
            expr = Self::binary(op, expr, right);
        }
    }

    fn parse_unary(&mut self) -> CompileResult<Expr> {
        let start = self.lexer.peek().span;

        let op = if self.lexer.match_token(&TokenKind::Bang) {
            Some(UnaryOp::Not)
        } else if self.lexer.match_token(&TokenKind::Minus) {
            Some(UnaryOp::Neg)
        } else {
            None
        };
        if let Some(op) = op {
            let operand = self.parse_unary()?;
            let span = start.to(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        let inc_dec = if self.lexer.match_token(&TokenKind::PlusPlus) {
            Some(IncDecOp::Inc)
        } else if self.lexer.match_token(&TokenKind::MinusMinus) {
            Some(IncDecOp::Dec)
        } else {
            None
        };
        if let Some(op) = inc_dec {
            let target = self.parse_unary()?;
            let span = start.to(target.span);
            return Ok(Expr::new(
                ExprKind::IncDec {
                    op,
                    prefix: true,
                    target: Box::new(target),
                },
                span,
            ));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.lexer.match_token(&TokenKind::LParen) {
                let mut args = Vec::new();
                while !self.check(&TokenKind::RParen) && !self.check(&TokenKind::Eof) {
                    args.push(self.parse_expression()?);
                    if !self.lexer.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
                let end = self.expect(TokenKind::RParen)?.span;
                let span = expr.span.to(end);
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else if self.lexer.match_token(&TokenKind::LBracket) {
                let index = self.parse_expression()?;
                let end = self.expect(TokenKind::RBracket)?.span;
                let span = expr.span.to(end);
                expr = Expr::new(
                    ExprKind::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else if self.lexer.match_token(&TokenKind::Dot) {
                let (name, name_span) = self.expect_identifier()?;
                let span = expr.span.to(name_span);
                expr = Expr::new(
                    ExprKind::Member {
                        base: Box::new(expr),
                        name,
                        safe: false,
                    },
                    span,
                );
            } else if self.lexer.match_token(&TokenKind::QuestionDot) {
                let (name, name_span) = self.expect_identifier()?;
                let span = expr.span.to(name_span);
                expr = Expr::new(
                    ExprKind::Member {
                        base: Box::new(expr),
                        name,
                        safe: true,
                    },
                    span,
                );
            } else if self.check(&TokenKind::PlusPlus) || self.check(&TokenKind::MinusMinus) {
                let token = self.lexer.next_token();
                let op = if matches!(token.kind, TokenKind::PlusPlus) {
                    IncDecOp::Inc
                } else {
                    IncDecOp::Dec
                };
                let span = expr.span.to(token.span);
                expr = Expr::new(
                    ExprKind::IncDec {
                        op,
                        prefix: false,
                        target: Box::new(expr),
                    },
                    span,
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> CompileResult<Expr> {
        let token = self.lexer.next_token();
        let span = token.span;

        match token.kind {
            TokenKind::IntLiteral(text) => match text.parse::<i64>() {
                Ok(value) => Ok(Expr::new(ExprKind::IntLiteral(value), span)),
                Err(_) => {
                    self.diagnostics.push(Diagnostic::syntax(
                        format!("integer literal '{text}' is out of range"),
                        span,
                    ));
                    Ok(Expr::new(ExprKind::IntLiteral(0), span))
                }
            },
            TokenKind::FloatLiteral(text) => {
                let is_single = text.ends_with('f') || text.ends_with('F');
                let digits = if is_single {
                    &text[..text.len() - 1]
                } else {
                    text.as_str()
                };
                let value = digits.parse::<f64>().unwrap_or(0.0);
                Ok(Expr::new(ExprKind::FloatLiteral { value, is_single }, span))
            }
            TokenKind::True => Ok(Expr::new(ExprKind::BoolLiteral(true), span)),
            TokenKind::False => Ok(Expr::new(ExprKind::BoolLiteral(false), span)),
            TokenKind::Null => Ok(Expr::new(ExprKind::NullLiteral, span)),
            TokenKind::CharLiteral(text) => match unescape_char(&text) {
                Some(c) => Ok(Expr::new(ExprKind::CharLiteral(c), span)),
                None => Err(CompileError::parser(
                    format!("malformed character literal {text}"),
                    span,
                )),
            },
            TokenKind::StringLiteral(text) | TokenKind::TripleStringLiteral(text) => {
                Ok(self.parse_string_literal(&text, span))
            }
            TokenKind::Identifier(name) => {
                if name == "Array" && self.check(&TokenKind::Lt) {
                    self.lexer.next_token();
                    let element = self.parse_type()?;
                    self.expect(TokenKind::Gt)?;
                    return self.parse_array_constructor(element, span);
                }
                Ok(Expr::new(ExprKind::Identifier(name), span))
            }
            TokenKind::LParen => {
                let inner = self.parse_expression()?;
                let end = self.expect(TokenKind::RParen)?.span;
                Ok(Expr::new(
                    ExprKind::Paren(Box::new(inner)),
                    span.to(end),
                ))
            }
            other => Err(CompileError::parser(
                format!("expected expression, found {other}"),
                span,
            )),
        }
    }

    /// `(size) { initLambda }` after the element type has been parsed
    fn parse_array_constructor(
        &mut self,
        element: TypeExpr,
        start: Span,
    ) -> CompileResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let size = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let lambda_start = self.expect(TokenKind::LBrace)?.span;
        // Optional explicit parameter: { i -> expr }
        let params = if matches!(self.lexer.peek().kind, TokenKind::Identifier(_))
            && self.lexer.check_lookahead(&TokenKind::Arrow)
        {
            let (name, name_span) = self.expect_identifier()?;
            self.expect(TokenKind::Arrow)?;
            vec![(name, name_span)]
        } else {
            Vec::new()
        };
        let body = self.parse_expression()?;
        let lambda_end = self.expect(TokenKind::RBrace)?.span;

        let lambda_span = lambda_start.to(lambda_end);
        let init = Expr::new(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            lambda_span,
        );

        let span = start.to(lambda_end);
        Ok(Expr::new(
            ExprKind::ArrayLiteral {
                element,
                size: Box::new(size),
                init: Box::new(init),
            },
            span,
        ))
    }

    /// Split a string lexeme into template segments, re-parsing each embedded
    /// expression at its true offset inside the compilation unit.
    fn parse_string_literal(&mut self, lexeme: &str, span: Span) -> Expr {
        if !has_template(lexeme) {
            let fragments = split_template(lexeme, span, &mut self.diagnostics);
            let text = fragments
                .into_iter()
                .map(|f| match f {
                    RawFragment::Text(t) => t,
                    RawFragment::Expr { .. } => String::new(),
                })
                .collect::<String>();
            return Expr::new(ExprKind::StringLiteral(text), span);
        }

        let mut segments = Vec::new();
        for fragment in split_template(lexeme, span, &mut self.diagnostics) {
            match fragment {
                RawFragment::Text(text) => segments.push(TemplateSegment::Text(text)),
                RawFragment::Expr { source, offset } => {
                    if let Some(expr) = self.parse_fragment(&source, offset) {
                        segments.push(TemplateSegment::Expr(Box::new(expr)));
                    }
                }
            }
        }
        Expr::new(ExprKind::StringTemplate(segments), span)
    }

    fn parse_fragment(&mut self, source: &str, offset: usize) -> Option<Expr> {
        let mut sub = Parser::new(source);
        let result = sub.parse_expression();

        let mut nested = sub.lexer.take_diagnostics();
        nested.append(&mut sub.diagnostics);
        for mut diag in nested {
            diag.span = diag.span.offset(offset);
            self.diagnostics.push(diag);
        }

        match result {
            Ok(mut expr) => {
                if !sub.check(&TokenKind::Eof) {
                    let extra = sub.lexer.peek().span.offset(offset);
                    self.diagnostics.push(Diagnostic::syntax(
                        "unexpected trailing tokens in template expression",
                        extra,
                    ));
                }
                shift_expr_spans(&mut expr, offset);
                Some(expr)
            }
            Err(err) => {
                let mut diag = Diagnostic::from(err);
                diag.span = diag.span.offset(offset);
                self.diagnostics.push(diag);
                None
            }
        }
    }

    // ==================== Helpers ====================

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.to(right.span);
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    fn check(&mut self, expected: &TokenKind) -> bool {
        self.lexer.check(expected)
    }

    fn expect(&mut self, expected: TokenKind) -> CompileResult<Token> {
        self.lexer.expect(expected)
    }

    fn expect_identifier(&mut self) -> CompileResult<(String, Span)> {
        let token = self.lexer.next_token();
        match token.kind {
            TokenKind::Identifier(name) => Ok((name, token.span)),
            other => Err(CompileError::parser(
                format!("expected identifier, found {other}"),
                token.span,
            )),
        }
    }

    /// Skip tokens until a statement boundary so parsing can resume after an
    /// error: a `;`, a block delimiter, or a keyword that starts a statement.
    fn synchronize(&mut self) {
        loop {
            if self.lexer.match_token(&TokenKind::Semi) {
                return;
            }
            let kind = &self.lexer.peek().kind;
            if matches!(kind, TokenKind::RBrace | TokenKind::LBrace | TokenKind::Eof)
                || kind.starts_statement()
            {
                return;
            }
            self.lexer.next_token();
        }
    }

    /// Recover at the top level: skip to the next declaration keyword
    fn synchronize_top_level(&mut self) {
        loop {
            match &self.lexer.peek().kind {
                TokenKind::Fun
                | TokenKind::Class
                | TokenKind::Sealed
                | TokenKind::Val
                | TokenKind::Var
                | TokenKind::Const
                | TokenKind::Eof => return,
                _ => {
                    self.lexer.next_token();
                }
            }
        }
    }
}

/// Shift every span in an expression tree by `offset` bytes. Used when a
/// template fragment, parsed in isolation, is re-anchored to its position in
/// the enclosing string literal.
fn shift_expr_spans(expr: &mut Expr, offset: usize) {
    expr.span = expr.span.offset(offset);
    match &mut expr.kind {
        ExprKind::IntLiteral(_)
        | ExprKind::FloatLiteral { .. }
        | ExprKind::BoolLiteral(_)
        | ExprKind::CharLiteral(_)
        | ExprKind::StringLiteral(_)
        | ExprKind::NullLiteral
        | ExprKind::Identifier(_) => {}
        ExprKind::StringTemplate(segments) => {
            for segment in segments {
                if let TemplateSegment::Expr(inner) = segment {
                    shift_expr_spans(inner, offset);
                }
            }
        }
        ExprKind::Binary { left, right, .. } => {
            shift_expr_spans(left, offset);
            shift_expr_spans(right, offset);
        }
        ExprKind::Unary { operand, .. } => shift_expr_spans(operand, offset),
        ExprKind::IncDec { target, .. } => shift_expr_spans(target, offset),
        ExprKind::Assign { target, value, .. } => {
            shift_expr_spans(target, offset);
            shift_expr_spans(value, offset);
        }
        ExprKind::Call { callee, args } => {
            shift_expr_spans(callee, offset);
            for arg in args {
                shift_expr_spans(arg, offset);
            }
        }
        ExprKind::Index { base, index } => {
            shift_expr_spans(base, offset);
            shift_expr_spans(index, offset);
        }
        ExprKind::Member { base, .. } => shift_expr_spans(base, offset),
        ExprKind::Lambda { body, .. } => shift_expr_spans(body, offset),
        ExprKind::ArrayLiteral { size, init, .. } => {
            shift_expr_spans(size, offset);
            shift_expr_spans(init, offset);
        }
        ExprKind::Range { start, end, .. } => {
            shift_expr_spans(start, offset);
            shift_expr_spans(end, offset);
        }
        ExprKind::Is { value, .. } => shift_expr_spans(value, offset),
        ExprKind::InRange { value, range } => {
            shift_expr_spans(value, offset);
            shift_expr_spans(range, offset);
        }
        ExprKind::Elvis { value, fallback } => {
            shift_expr_spans(value, offset);
            shift_expr_spans(fallback, offset);
        }
        ExprKind::Paren(inner) => shift_expr_spans(inner, offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        let (program, diags) = Parser::new(source).parse_program();
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        program
    }

    fn parse_expr(source: &str) -> Expr {
        let program = parse_ok(&format!("val probe = {source}"));
        let DeclKind::Var(decl) = &program.decls[0].kind else {
            panic!("expected var declaration");
        };
        decl.init.clone().expect("initializer")
    }

    #[test]
    fn test_precedence_mul_over_add() {
        // 1 + 2 * 3 must parse as 1 + (2 * 3)
        let expr = parse_expr("1 + 2 * 3");
        let ExprKind::Binary { op, left, right } = &expr.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(left.kind, ExprKind::IntLiteral(1)));
        let ExprKind::Binary { op, .. } = &right.kind else {
            panic!("expected nested multiplication");
        };
        assert_eq!(*op, BinOp::Mul);
    }

    #[test]
    fn test_assignment_right_associative() {
        let program = parse_ok("fun main() { a = b = 3 }");
        let DeclKind::Fun(fun) = &program.decls[0].kind else {
            panic!()
        };
        let FunBody::Block(block) = &fun.body else {
            panic!()
        };
        let StmtKind::Expr(expr) = &block.stmts[0].kind else {
            panic!()
        };
        let ExprKind::Assign { target, value, .. } = &expr.kind else {
            panic!("expected assignment");
        };
        assert!(matches!(&target.kind, ExprKind::Identifier(n) if n == "a"));
        // The right side is itself an assignment: b = 3
        assert!(matches!(&value.kind, ExprKind::Assign { .. }));
    }

    #[test]
    fn test_relational_binds_tighter_than_logical() {
        let expr = parse_expr("a > b && c <= d");
        let ExprKind::Binary { op, left, right } = &expr.kind else {
            panic!()
        };
        assert_eq!(*op, BinOp::And);
        assert!(matches!(&left.kind, ExprKind::Binary { op: BinOp::Gt, .. }));
        assert!(matches!(&right.kind, ExprKind::Binary { op: BinOp::Le, .. }));
    }

    #[test]
    fn test_range_expression() {
        let expr = parse_expr("1..5");
        assert!(matches!(
            expr.kind,
            ExprKind::Range {
                inclusive: true,
                ..
            }
        ));
        let expr = parse_expr("0..<10");
        assert!(matches!(
            expr.kind,
            ExprKind::Range {
                inclusive: false,
                ..
            }
        ));
    }

    #[test]
    fn test_elvis_and_safe_call() {
        let expr = parse_expr("s?.length ?: 0");
        let ExprKind::Elvis { value, fallback } = &expr.kind else {
            panic!("expected elvis");
        };
        assert!(matches!(
            &value.kind,
            ExprKind::Member { safe: true, name, .. } if name == "length"
        ));
        assert!(matches!(fallback.kind, ExprKind::IntLiteral(0)));
    }

    #[test]
    fn test_member_chain_call() {
        let expr = parse_expr("java.lang.Math.abs(-10)");
        let ExprKind::Call { callee, args } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        assert!(matches!(&callee.kind, ExprKind::Member { name, .. } if name == "abs"));
    }

    #[test]
    fn test_postfix_increment() {
        let expr = parse_expr("i++");
        assert!(matches!(
            expr.kind,
            ExprKind::IncDec {
                op: IncDecOp::Inc,
                prefix: false,
                ..
            }
        ));
    }

    #[test]
    fn test_string_template() {
        let expr = parse_expr(r#""Sum: $c and ${a + b}""#);
        let ExprKind::StringTemplate(segments) = &expr.kind else {
            panic!("expected template");
        };
        assert_eq!(segments.len(), 4);
        assert!(matches!(&segments[0], TemplateSegment::Text(t) if t == "Sum: "));
        assert!(matches!(&segments[1], TemplateSegment::Expr(_)));
        assert!(matches!(&segments[2], TemplateSegment::Text(t) if t == " and "));
        assert!(
            matches!(&segments[3], TemplateSegment::Expr(e)
                if matches!(e.kind, ExprKind::Binary { op: BinOp::Add, .. }))
        );
    }

    #[test]
    fn test_function_declaration() {
        let program = parse_ok("fun add(x: Int, y: Int): Int { return x + y }");
        let DeclKind::Fun(fun) = &program.decls[0].kind else {
            panic!()
        };
        assert_eq!(fun.name, "add");
        assert_eq!(fun.params.len(), 2);
        assert!(fun.return_type.is_some());
    }

    #[test]
    fn test_expression_body_function() {
        let program = parse_ok("fun double(x: Int) = x * 2");
        let DeclKind::Fun(fun) = &program.decls[0].kind else {
            panic!()
        };
        assert!(matches!(fun.body, FunBody::Expr(_)));
        assert!(fun.return_type.is_none());
    }

    #[test]
    fn test_sealed_class_hierarchy() {
        let program = parse_ok(
            "sealed class Result\n\
             class Success(val value: String) : Result()\n\
             class Error(val message: String) : Result()",
        );
        assert_eq!(program.decls.len(), 3);
        let DeclKind::Class(sealed) = &program.decls[0].kind else {
            panic!()
        };
        assert!(sealed.sealed);
        let DeclKind::Class(sub) = &program.decls[1].kind else {
            panic!()
        };
        assert_eq!(sub.supertype.as_deref(), Some("Result"));
        assert_eq!(sub.fields.len(), 1);
    }

    #[test]
    fn test_when_with_subject() {
        let program = parse_ok(
            "fun main() { when (r) { is Success -> println(1)\n is Error -> println(2)\n else -> println(3) } }",
        );
        let DeclKind::Fun(fun) = &program.decls[0].kind else {
            panic!()
        };
        let FunBody::Block(block) = &fun.body else {
            panic!()
        };
        let StmtKind::When(when) = &block.stmts[0].kind else {
            panic!()
        };
        assert!(when.subject.is_some());
        assert_eq!(when.arms.len(), 3);
        assert!(matches!(&when.arms[0].pattern, WhenPattern::Is { name, .. } if name == "Success"));
        assert!(matches!(when.arms[2].pattern, WhenPattern::Else));
    }

    #[test]
    fn test_duplicate_else_arm_reported() {
        let (_, diags) = Parser::new(
            "fun main() { when (x) { 1 -> println(1)\n else -> println(2)\n else -> println(3) } }",
        )
        .parse_program();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("duplicate 'else'"));
    }

    #[test]
    fn test_array_declaration_with_constructor() {
        let program = parse_ok("fun main() { var data: Array<Int>(4) { 0 }\n data[0] = 9 }");
        let DeclKind::Fun(fun) = &program.decls[0].kind else {
            panic!()
        };
        let FunBody::Block(block) = &fun.body else {
            panic!()
        };
        let StmtKind::Var(decl) = &block.stmts[0].kind else {
            panic!("expected var declaration");
        };
        assert!(matches!(
            decl.init.as_ref().map(|e| &e.kind),
            Some(ExprKind::ArrayLiteral { .. })
        ));
        let StmtKind::Expr(assign) = &block.stmts[1].kind else {
            panic!()
        };
        let ExprKind::Assign { target, .. } = &assign.kind else {
            panic!("expected index assignment");
        };
        assert!(matches!(target.kind, ExprKind::Index { .. }));
    }

    #[test]
    fn test_do_while_and_for() {
        parse_ok(
            "fun main() {\n\
                var i = 0\n\
                do { println(i); i++ } while (i < 3)\n\
                for (j in 1..5) { if (j == 3) { break } }\n\
            }",
        );
    }

    #[test]
    fn test_error_recovery_two_errors() {
        // Two unrelated syntax errors on different lines, one invocation
        let (_, diags) = Parser::new(
            "fun main() {\n\
                val = 5\n\
                val ok = 1\n\
                if x > 2) { println(1) }\n\
            }",
        )
        .parse_program();
        let errors: Vec<_> = diags.iter().filter(|d| d.is_error()).collect();
        assert!(errors.len() >= 2, "expected two errors, got {diags:?}");
    }

    #[test]
    fn test_nested_function_rejected() {
        let (_, diags) =
            Parser::new("fun outer() { fun inner() { } }").parse_program();
        assert!(
            diags
                .iter()
                .any(|d| d.message.contains("nested function"))
        );
    }

    #[test]
    fn test_const_var_rejected() {
        let (_, diags) = Parser::new("fun main() { const var x = 1 }").parse_program();
        assert!(diags.iter().any(|d| d.message.contains("'const'")));
    }

    #[test]
    fn test_nullable_type_annotation() {
        let program = parse_ok("val s: String? = null");
        let DeclKind::Var(decl) = &program.decls[0].kind else {
            panic!()
        };
        assert!(matches!(
            decl.declared_type.as_ref().map(|t| &t.kind),
            Some(TypeExprKind::Nullable(_))
        ));
    }

    #[test]
    fn test_shebang_and_comments() {
        parse_ok(
            "#!/usr/bin/env kotlin\n\
             // leading comment\n\
             /* block */\n\
             fun main() { println(\"ok\") }",
        );
    }
}
