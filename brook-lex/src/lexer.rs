#![forbid(unsafe_code)]

use brook_ast::{span_between, NumSuffix, Span};
use logos::Logos;
use miette::Diagnostic;
use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Debug, Error, Diagnostic)]
#[error("lex error: {message}")]
#[diagnostic(code(brook::lex))]
pub struct LexError {
    pub message: String,
    #[label]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
struct IntParts {
    text: String,
    base: u32,
    suffix: Option<NumSuffix>,
}

#[derive(Clone, Debug, PartialEq)]
struct FloatParts {
    text: String,
    suffix: Option<NumSuffix>,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"//[^\n]*")]
enum RawToken {
    #[token("let")]
    KwLet,
    #[token("const")]
    KwConst,
    #[token("type")]
    KwType,
    #[token("struct")]
    KwStruct,
    #[token("fn")]
    KwFn,
    #[token("return")]
    KwReturn,
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("for")]
    KwFor,
    #[token("in")]
    KwIn,
    #[token("break")]
    KwBreak,
    #[token("continue")]
    KwContinue,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,

    #[token("->")]
    Arrow,

    #[token("**=")]
    StarStarEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,

    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,

    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,

    #[token("**")]
    StarStar,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token("...")]
    Ellipsis,
    #[token("..=")]
    DotDotEq,
    #[token("..")]
    DotDot,
    #[token(".")]
    Dot,

    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("=")]
    Eq,
    #[token(",")]
    Comma,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token("\n")]
    Newline,

    #[regex(r"0b[01_]+(#[a-zA-Z][a-zA-Z0-9]*)?", |lex| parse_int_prefixed(lex.slice(), 2))]
    #[regex(r"0o[0-7_]+(#[a-zA-Z][a-zA-Z0-9]*)?", |lex| parse_int_prefixed(lex.slice(), 8))]
    #[regex(r"0x[0-9a-fA-F_]+(#[a-zA-Z][a-zA-Z0-9]*)?", |lex| parse_int_prefixed(lex.slice(), 16))]
    #[regex(r"[0-9][0-9_]*(#[a-zA-Z][a-zA-Z0-9]*)?", |lex| parse_int_decimal(lex.slice()))]
    Int(Option<IntParts>),

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*(#[a-zA-Z][a-zA-Z0-9]*)?", |lex| parse_float(lex.slice()))]
    Float(Option<FloatParts>),

    // The raw slice (quotes included) is kept; escapes are decoded only
    // when a value is displayed.
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| lex.slice().to_string())]
    Str(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

fn split_suffix(s: &str) -> Option<(&str, Option<NumSuffix>)> {
    match s.split_once('#') {
        None => Some((s, None)),
        Some((body, tag)) => {
            let suffix = NumSuffix::from_str(tag)?;
            Some((body, Some(suffix)))
        }
    }
}

fn strip_underscores(s: &str) -> Option<String> {
    if s.is_empty() {
        return None;
    }
    if s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return None;
    }
    Some(s.replace('_', ""))
}

fn parse_int_decimal(s: &str) -> Option<IntParts> {
    let (body, suffix) = split_suffix(s)?;
    let text = strip_underscores(body)?;
    Some(IntParts {
        text,
        base: 10,
        suffix,
    })
}

fn parse_int_prefixed(s: &str, base: u32) -> Option<IntParts> {
    let (body, suffix) = split_suffix(s)?;
    let digits = body.get(2..)?;
    let text = strip_underscores(digits)?;
    Some(IntParts { text, base, suffix })
}

fn parse_float(s: &str) -> Option<FloatParts> {
    let (body, suffix) = split_suffix(s)?;
    if let Some(tag) = suffix {
        if !tag.is_float() {
            return None;
        }
    }
    let text = strip_underscores(body)?;
    Some(FloatParts { text, suffix })
}

pub struct Lexer<'a> {
    src: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src }
    }

    pub fn lex(&self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut lex = RawToken::lexer(self.src);

        while let Some(raw) = lex.next() {
            let range = lex.span();
            let span = span_between(range.start, range.end);

            let kind = match raw {
                Ok(RawToken::KwLet) => TokenKind::KwLet,
                Ok(RawToken::KwConst) => TokenKind::KwConst,
                Ok(RawToken::KwType) => TokenKind::KwType,
                Ok(RawToken::KwStruct) => TokenKind::KwStruct,
                Ok(RawToken::KwFn) => TokenKind::KwFn,
                Ok(RawToken::KwReturn) => TokenKind::KwReturn,
                Ok(RawToken::KwIf) => TokenKind::KwIf,
                Ok(RawToken::KwElse) => TokenKind::KwElse,
                Ok(RawToken::KwFor) => TokenKind::KwFor,
                Ok(RawToken::KwIn) => TokenKind::KwIn,
                Ok(RawToken::KwBreak) => TokenKind::KwBreak,
                Ok(RawToken::KwContinue) => TokenKind::KwContinue,
                Ok(RawToken::KwTrue) => TokenKind::KwTrue,
                Ok(RawToken::KwFalse) => TokenKind::KwFalse,

                Ok(RawToken::Arrow) => TokenKind::Arrow,

                Ok(RawToken::StarStarEq) => TokenKind::StarStarEq,
                Ok(RawToken::ShlEq) => TokenKind::ShlEq,
                Ok(RawToken::ShrEq) => TokenKind::ShrEq,
                Ok(RawToken::PlusEq) => TokenKind::PlusEq,
                Ok(RawToken::MinusEq) => TokenKind::MinusEq,
                Ok(RawToken::StarEq) => TokenKind::StarEq,
                Ok(RawToken::SlashEq) => TokenKind::SlashEq,
                Ok(RawToken::PercentEq) => TokenKind::PercentEq,
                Ok(RawToken::AmpEq) => TokenKind::AmpEq,
                Ok(RawToken::PipeEq) => TokenKind::PipeEq,
                Ok(RawToken::CaretEq) => TokenKind::CaretEq,

                Ok(RawToken::EqEq) => TokenKind::EqEq,
                Ok(RawToken::Ne) => TokenKind::Ne,
                Ok(RawToken::Le) => TokenKind::Le,
                Ok(RawToken::Ge) => TokenKind::Ge,
                Ok(RawToken::Shl) => TokenKind::Shl,
                Ok(RawToken::Shr) => TokenKind::Shr,
                Ok(RawToken::Lt) => TokenKind::Lt,
                Ok(RawToken::Gt) => TokenKind::Gt,

                Ok(RawToken::AndAnd) => TokenKind::AndAnd,
                Ok(RawToken::OrOr) => TokenKind::OrOr,
                Ok(RawToken::Amp) => TokenKind::Amp,
                Ok(RawToken::Pipe) => TokenKind::Pipe,
                Ok(RawToken::Caret) => TokenKind::Caret,
                Ok(RawToken::Bang) => TokenKind::Bang,

                Ok(RawToken::StarStar) => TokenKind::StarStar,
                Ok(RawToken::Plus) => TokenKind::Plus,
                Ok(RawToken::Minus) => TokenKind::Minus,
                Ok(RawToken::Star) => TokenKind::Star,
                Ok(RawToken::Slash) => TokenKind::Slash,
                Ok(RawToken::Percent) => TokenKind::Percent,

                Ok(RawToken::Ellipsis) => TokenKind::Ellipsis,
                Ok(RawToken::DotDotEq) => TokenKind::DotDotEq,
                Ok(RawToken::DotDot) => TokenKind::DotDot,
                Ok(RawToken::Dot) => TokenKind::Dot,

                Ok(RawToken::Colon) => TokenKind::Colon,
                Ok(RawToken::Semicolon) => TokenKind::Semicolon,
                Ok(RawToken::Eq) => TokenKind::Eq,
                Ok(RawToken::Comma) => TokenKind::Comma,

                Ok(RawToken::LParen) => TokenKind::LParen,
                Ok(RawToken::RParen) => TokenKind::RParen,
                Ok(RawToken::LBrace) => TokenKind::LBrace,
                Ok(RawToken::RBrace) => TokenKind::RBrace,
                Ok(RawToken::LBracket) => TokenKind::LBracket,
                Ok(RawToken::RBracket) => TokenKind::RBracket,

                Ok(RawToken::Newline) => TokenKind::Newline,

                Ok(RawToken::Int(Some(parts))) => TokenKind::Int {
                    text: parts.text,
                    base: parts.base,
                    suffix: parts.suffix,
                },
                Ok(RawToken::Int(None)) => {
                    return Err(LexError {
                        message: "invalid integer literal".to_string(),
                        span,
                    });
                }
                Ok(RawToken::Float(Some(parts))) => TokenKind::Float {
                    text: parts.text,
                    suffix: parts.suffix,
                },
                Ok(RawToken::Float(None)) => {
                    return Err(LexError {
                        message: "invalid float literal".to_string(),
                        span,
                    });
                }
                Ok(RawToken::Str(raw)) => TokenKind::Str(raw),
                Ok(RawToken::Ident(name)) => TokenKind::Ident(name),

                Err(_) => {
                    let message = if lex.slice().starts_with('"') {
                        "unterminated string literal".to_string()
                    } else {
                        "unexpected character".to_string()
                    };
                    return Err(LexError { message, span });
                }
            };

            tokens.push(Token { kind, span });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            span: span_between(self.src.len(), self.src.len()),
        });

        Ok(tokens)
    }
}
