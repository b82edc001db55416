#![forbid(unsafe_code)]

use brook_ast::{NumSuffix, Span};

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwLet,
    KwConst,
    KwType,
    KwStruct,
    KwFn,
    KwReturn,
    KwIf,
    KwElse,
    KwFor,
    KwIn,
    KwBreak,
    KwContinue,
    KwTrue,
    KwFalse,

    // Operators / punctuation
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,

    Bang,
    Amp,
    Pipe,
    AndAnd,
    OrOr,
    Caret,
    Shl,
    Shr,

    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,

    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    StarStarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,

    Arrow,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Comma,
    Dot,
    DotDot,
    DotDotEq,
    Ellipsis,
    Colon,
    Semicolon,

    /// Statement terminator alongside `;`.
    Newline,
    Eof,

    // Literals / identifiers
    /// Digits with underscores and base prefix stripped.
    Int {
        text: String,
        base: u32,
        suffix: Option<NumSuffix>,
    },
    Float {
        text: String,
        suffix: Option<NumSuffix>,
    },
    /// Raw source text including the surrounding quotes; escapes stay
    /// encoded until display time.
    Str(String),
    Ident(String),
}

impl TokenKind {
    /// Short description used in parser diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::KwLet => "'let'".to_string(),
            TokenKind::KwConst => "'const'".to_string(),
            TokenKind::KwType => "'type'".to_string(),
            TokenKind::KwStruct => "'struct'".to_string(),
            TokenKind::KwFn => "'fn'".to_string(),
            TokenKind::KwReturn => "'return'".to_string(),
            TokenKind::KwIf => "'if'".to_string(),
            TokenKind::KwElse => "'else'".to_string(),
            TokenKind::KwFor => "'for'".to_string(),
            TokenKind::KwIn => "'in'".to_string(),
            TokenKind::KwBreak => "'break'".to_string(),
            TokenKind::KwContinue => "'continue'".to_string(),
            TokenKind::KwTrue => "'true'".to_string(),
            TokenKind::KwFalse => "'false'".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::StarStar => "'**'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Percent => "'%'".to_string(),
            TokenKind::Bang => "'!'".to_string(),
            TokenKind::Amp => "'&'".to_string(),
            TokenKind::Pipe => "'|'".to_string(),
            TokenKind::AndAnd => "'&&'".to_string(),
            TokenKind::OrOr => "'||'".to_string(),
            TokenKind::Caret => "'^'".to_string(),
            TokenKind::Shl => "'<<'".to_string(),
            TokenKind::Shr => "'>>'".to_string(),
            TokenKind::Lt => "'<'".to_string(),
            TokenKind::Gt => "'>'".to_string(),
            TokenKind::Le => "'<='".to_string(),
            TokenKind::Ge => "'>='".to_string(),
            TokenKind::EqEq => "'=='".to_string(),
            TokenKind::Ne => "'!='".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::PlusEq => "'+='".to_string(),
            TokenKind::MinusEq => "'-='".to_string(),
            TokenKind::StarEq => "'*='".to_string(),
            TokenKind::StarStarEq => "'**='".to_string(),
            TokenKind::SlashEq => "'/='".to_string(),
            TokenKind::PercentEq => "'%='".to_string(),
            TokenKind::AmpEq => "'&='".to_string(),
            TokenKind::PipeEq => "'|='".to_string(),
            TokenKind::CaretEq => "'^='".to_string(),
            TokenKind::ShlEq => "'<<='".to_string(),
            TokenKind::ShrEq => "'>>='".to_string(),
            TokenKind::Arrow => "'->'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::DotDot => "'..'".to_string(),
            TokenKind::DotDotEq => "'..='".to_string(),
            TokenKind::Ellipsis => "'...'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Int { text, .. } => format!("integer '{text}'"),
            TokenKind::Float { text, .. } => format!("float '{text}'"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Ident(name) => format!("identifier '{name}'"),
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Semicolon)
    }
}
