#![forbid(unsafe_code)]

use brook_ast::{
    span_between, AssignOp, BinOp, Block, ConstStmt, ElseBranch, Expr, ExprKind, FloatLit, FnDecl,
    ForStmt, Ident, IfExpr, IntLit, LetStmt, NodeId, Param, Program, RangeExpr, ReturnStmt, Span,
    Spanned, Stmt, TypeRef, TypeRefKind, UnaryOp,
};
use brook_lex::{Token, TokenKind};

use crate::error::ParseError;

fn join(a: Span, b: Span) -> Span {
    let start = a.offset().min(b.offset());
    let end = (a.offset() + a.len()).max(b.offset() + b.len());
    span_between(start, end)
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    idx: usize,
    next_id: u32,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            idx: 0,
            next_id: 0,
        }
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut stmts = Vec::new();
        self.skip_terminators();
        while !self.at_eof() {
            stmts.push(self.parse_stmt()?);
            self.skip_terminators();
        }
        Ok(Program { stmts })
    }

    /// Best-effort parse: on error, resynchronize at the next statement
    /// boundary and keep going so every syntax error in the file surfaces.
    pub fn parse_program_with_recovery(&mut self) -> (Program, Vec<ParseError>) {
        let mut stmts = Vec::new();
        let mut errors = Vec::new();
        self.skip_terminators();
        while !self.at_eof() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }
            self.skip_terminators();
        }
        (Program { stmts }, errors)
    }

    // --- cursor helpers ---

    fn peek(&self) -> &Token {
        // The token stream always ends with Eof.
        &self.tokens[self.idx.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek2_kind(&self) -> &TokenKind {
        let idx = (self.idx + 1).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.idx < self.tokens.len() - 1 {
            self.idx += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, context: &str) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            Ok(self.bump())
        } else {
            Err(self.error_here(format!(
                "expected {} {}, found {}",
                kind.describe(),
                context,
                self.peek_kind().describe()
            )))
        }
    }

    fn error_here(&self, message: String) -> ParseError {
        ParseError {
            message,
            span: self.peek().span,
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline) {
            self.bump();
        }
    }

    fn skip_terminators(&mut self) {
        while self.peek_kind().is_terminator() {
            self.bump();
        }
    }

    fn synchronize(&mut self) {
        while !self.at_eof() {
            if self.peek_kind().is_terminator() {
                self.bump();
                return;
            }
            self.bump();
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn mk_expr(&mut self, span: Span, kind: ExprKind) -> Expr {
        Expr {
            id: self.fresh_id(),
            span,
            kind,
        }
    }

    /// A statement ends at a newline, `;`, `}` or end of file. The brace and
    /// Eof cases are not consumed; they belong to the enclosing construct.
    fn expect_statement_end(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::Semicolon => {
                self.bump();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            other => Err(self.error_here(format!(
                "expected newline or ';' after statement, found {}",
                other.describe()
            ))),
        }
    }

    // --- statements ---

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenKind::KwLet => self.parse_let(),
            TokenKind::KwConst => self.parse_const(),
            TokenKind::KwFn => self.parse_fn(),
            TokenKind::KwReturn => self.parse_return(),
            TokenKind::KwFor => self.parse_for(),
            TokenKind::KwBreak => {
                let tok = self.bump();
                self.expect_statement_end()?;
                Ok(Stmt::Break { span: tok.span })
            }
            TokenKind::KwContinue => {
                let tok = self.bump();
                self.expect_statement_end()?;
                Ok(Stmt::Continue { span: tok.span })
            }
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                self.expect_statement_end()?;
                Ok(Stmt::Block(block))
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect_statement_end()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_ident(&mut self, context: &str) -> Result<Ident, ParseError> {
        match self.peek_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let tok = self.bump();
                Ok(Spanned::new(tok.span, name))
            }
            other => Err(self.error_here(format!(
                "expected identifier {}, found {}",
                context,
                other.describe()
            ))),
        }
    }

    fn parse_let(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.bump();
        let name = self.parse_ident("after 'let'")?;

        let ty = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type_ref()?)
        } else {
            None
        };

        let init = if self.eat(&TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let end = init
            .as_ref()
            .map(|e| e.span)
            .or_else(|| ty.as_ref().map(|t| t.span))
            .unwrap_or(name.span);
        let span = join(kw.span, end);
        self.expect_statement_end()?;
        Ok(Stmt::Let(LetStmt {
            span,
            name,
            ty,
            init,
        }))
    }

    fn parse_const(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.bump();
        let name = self.parse_ident("after 'const'")?;

        let ty = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type_ref()?)
        } else {
            None
        };

        self.expect(&TokenKind::Eq, "in constant declaration")?;
        let init = self.parse_expr()?;
        let span = join(kw.span, init.span);
        self.expect_statement_end()?;
        Ok(Stmt::Const(ConstStmt {
            span,
            name,
            ty,
            init,
        }))
    }

    fn parse_fn(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.bump();
        let name = self.parse_ident("after 'fn'")?;

        self.expect(&TokenKind::LParen, "after function name")?;
        self.skip_newlines();
        let mut params = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen | TokenKind::Eof) {
            let pname = self.parse_ident("in parameter list")?;
            self.expect(&TokenKind::Colon, "after parameter name")?;
            let pty = self.parse_type_ref()?;
            params.push(Param {
                span: join(pname.span, pty.span),
                name: pname,
                ty: pty,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(&TokenKind::RParen, "after parameter list")?;

        let ret = if self.eat(&TokenKind::Arrow) {
            Some(self.parse_type_ref()?)
        } else {
            None
        };

        let body = self.parse_block()?;
        let span = join(kw.span, body.span);
        self.expect_statement_end()?;
        Ok(Stmt::Fn(FnDecl {
            span,
            name,
            params,
            ret,
            body,
        }))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.bump();
        let expr = if matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let span = expr
            .as_ref()
            .map(|e| join(kw.span, e.span))
            .unwrap_or(kw.span);
        self.expect_statement_end()?;
        Ok(Stmt::Return(ReturnStmt { span, expr }))
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.bump();
        let var = self.parse_ident("after 'for'")?;
        self.expect(&TokenKind::KwIn, "after loop variable")?;

        let range_expr = self.parse_range()?;
        let range = match range_expr.kind {
            ExprKind::Range(range) => range,
            _ => {
                return Err(ParseError {
                    message: "expected a range ('start..end' or 'start..=end') in for loop"
                        .to_string(),
                    span: range_expr.span,
                })
            }
        };

        let body = self.parse_block()?;
        let span = join(kw.span, body.span);
        self.expect_statement_end()?;
        Ok(Stmt::For(ForStmt {
            span,
            var,
            range,
            body,
        }))
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect(&TokenKind::LBrace, "to open block")?;
        self.skip_terminators();
        let mut stmts = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
            self.skip_terminators();
        }
        let close = self.expect(&TokenKind::RBrace, "to close block")?;
        Ok(Block {
            span: join(open.span, close.span),
            stmts,
        })
    }

    fn parse_type_ref(&mut self) -> Result<TypeRef, ParseError> {
        let name = self.parse_ident("in type position")?;
        let mut ty = TypeRef {
            span: name.span,
            kind: TypeRefKind::Name(name.node),
        };

        // `T[3]` fixed-length, `T[]` open-length array; nests left to right.
        while self.eat(&TokenKind::LBracket) {
            let len = match self.peek_kind() {
                TokenKind::Int { text, base, .. } => {
                    let value = u64::from_str_radix(text, *base).map_err(|_| {
                        self.error_here("invalid array length literal".to_string())
                    })?;
                    self.bump();
                    Some(value)
                }
                _ => None,
            };
            let close = self.expect(&TokenKind::RBracket, "after array length")?;
            ty = TypeRef {
                span: join(ty.span, close.span),
                kind: TypeRefKind::Array {
                    elem: Box::new(ty),
                    len,
                },
            };
        }
        Ok(ty)
    }

    // --- expressions ---

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_range()?;

        let op = match self.peek_kind() {
            TokenKind::Eq => AssignOp::Set,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::StarStarEq => AssignOp::Pow,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Rem,
            TokenKind::AmpEq => AssignOp::BitAnd,
            TokenKind::PipeEq => AssignOp::BitOr,
            TokenKind::CaretEq => AssignOp::BitXor,
            TokenKind::ShlEq => AssignOp::Shl,
            TokenKind::ShrEq => AssignOp::Shr,
            _ => return Ok(left),
        };
        self.bump();

        // Right-associative: `a = b = c` assigns `c` to `b`, then to `a`.
        let value = self.parse_assign()?;
        let span = join(left.span, value.span);
        Ok(self.mk_expr(
            span,
            ExprKind::Assign {
                op,
                target: Box::new(left),
                value: Box::new(value),
            },
        ))
    }

    fn parse_range(&mut self) -> Result<Expr, ParseError> {
        let start = self.parse_or()?;
        let inclusive = match self.peek_kind() {
            TokenKind::DotDot => false,
            TokenKind::DotDotEq => true,
            _ => return Ok(start),
        };
        self.bump();
        let end = self.parse_or()?;
        let span = join(start.span, end.span);
        Ok(self.mk_expr(
            span,
            ExprKind::Range(RangeExpr {
                span,
                start: Box::new(start),
                end: Box::new(end),
                inclusive,
            }),
        ))
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek_kind(), TokenKind::OrOr) {
            self.bump();
            let right = self.parse_and()?;
            let span = join(left.span, right.span);
            left = self.mk_expr(
                span,
                ExprKind::Binary {
                    op: BinOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while matches!(self.peek_kind(), TokenKind::AndAnd) {
            self.bump();
            let right = self.parse_equality()?;
            let span = join(left.span, right.span);
            left = self.mk_expr(
                span,
                ExprKind::Binary {
                    op: BinOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_comparison()?;
            let span = join(left.span, right.span);
            left = self.mk_expr(
                span,
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitwise()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_bitwise()?;
            let span = join(left.span, right.span);
            left = self.mk_expr(
                span,
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
    }

    fn parse_bitwise(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Amp => BinOp::BitAnd,
                TokenKind::Pipe => BinOp::BitOr,
                TokenKind::Caret => BinOp::BitXor,
                TokenKind::Shl => BinOp::Shl,
                TokenKind::Shr => BinOp::Shr,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_additive()?;
            let span = join(left.span, right.span);
            left = self.mk_expr(
                span,
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            let span = join(left.span, right.span);
            left = self.mk_expr(
                span,
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_exponent()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_exponent()?;
            let span = join(left.span, right.span);
            left = self.mk_expr(
                span,
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
    }

    fn parse_exponent(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_unary()?;
        if matches!(self.peek_kind(), TokenKind::StarStar) {
            self.bump();
            // Right-associative: `2 ** 3 ** 2` is `2 ** (3 ** 2)`.
            let right = self.parse_exponent()?;
            let span = join(left.span, right.span);
            return Ok(self.mk_expr(
                span,
                ExprKind::Binary {
                    op: BinOp::Pow,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            ));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let tok = self.bump();
        let operand = self.parse_unary()?;
        let span = join(tok.span, operand.span);
        Ok(self.mk_expr(
            span,
            ExprKind::Unary {
                op,
                expr: Box::new(operand),
            },
        ))
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        while self.eat(&TokenKind::LBracket) {
            let index = self.parse_expr()?;
            let close = self.expect(&TokenKind::RBracket, "after index expression")?;
            let span = join(expr.span, close.span);
            expr = self.mk_expr(
                span,
                ExprKind::Index {
                    base: Box::new(expr),
                    index: Box::new(index),
                },
            );
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind().clone() {
            TokenKind::Int { text, base, suffix } => {
                let tok = self.bump();
                Ok(self.mk_expr(tok.span, ExprKind::Int(IntLit { text, base, suffix })))
            }
            TokenKind::Float { text, suffix } => {
                let tok = self.bump();
                Ok(self.mk_expr(tok.span, ExprKind::Float(FloatLit { text, suffix })))
            }
            TokenKind::Str(raw) => {
                let tok = self.bump();
                Ok(self.mk_expr(tok.span, ExprKind::Str(raw)))
            }
            TokenKind::KwTrue => {
                let tok = self.bump();
                Ok(self.mk_expr(tok.span, ExprKind::Bool(true)))
            }
            TokenKind::KwFalse => {
                let tok = self.bump();
                Ok(self.mk_expr(tok.span, ExprKind::Bool(false)))
            }
            TokenKind::Ident(name) => {
                if matches!(self.peek2_kind(), TokenKind::LParen) {
                    return self.parse_call();
                }
                let tok = self.bump();
                Ok(self.mk_expr(tok.span, ExprKind::Ident(name)))
            }
            TokenKind::KwIf => self.parse_if_expr(),
            TokenKind::LParen => {
                self.bump();
                self.skip_newlines();
                let inner = self.parse_expr()?;
                self.skip_newlines();
                self.expect(&TokenKind::RParen, "to close grouping")?;
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_array(),
            other => Err(self.error_here(format!(
                "expected expression, found {}",
                other.describe()
            ))),
        }
    }

    fn parse_call(&mut self) -> Result<Expr, ParseError> {
        let callee = self.parse_ident("as call target")?;
        self.expect(&TokenKind::LParen, "after callee")?;
        self.skip_newlines();

        let mut args = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen | TokenKind::Eof) {
            args.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.skip_newlines();
        let close = self.expect(&TokenKind::RParen, "after call arguments")?;
        let span = join(callee.span, close.span);
        Ok(self.mk_expr(span, ExprKind::Call { callee, args }))
    }

    fn parse_array(&mut self) -> Result<Expr, ParseError> {
        let open = self.bump();
        self.skip_newlines();
        let mut elems = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBracket | TokenKind::Eof) {
            elems.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.skip_newlines();
        let close = self.expect(&TokenKind::RBracket, "to close array literal")?;
        let span = join(open.span, close.span);
        Ok(self.mk_expr(span, ExprKind::Array(elems)))
    }

    fn parse_if_expr(&mut self) -> Result<Expr, ParseError> {
        let kw = self.bump();
        let cond = self.parse_expr()?;
        let then_block = self.parse_block()?;

        let mut end = then_block.span;
        let else_branch = if self.eat(&TokenKind::KwElse) {
            if matches!(self.peek_kind(), TokenKind::KwIf) {
                let chained = self.parse_if_expr()?;
                end = chained.span;
                Some(Box::new(ElseBranch::If(chained)))
            } else {
                let block = self.parse_block()?;
                end = block.span;
                Some(Box::new(ElseBranch::Block(block)))
            }
        } else {
            None
        };

        let span = join(kw.span, end);
        Ok(self.mk_expr(
            span,
            ExprKind::If(IfExpr {
                cond: Box::new(cond),
                then_block,
                else_branch,
            }),
        ))
    }
}
