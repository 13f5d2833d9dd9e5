//! Tokenizer for the SQL dialect.
//!
//! Turns a statement string into a sequence of typed tokens. Matching is
//! longest-match in **declaration order**: keywords are declared before
//! the identifier rule so `SELECT` can never tokenize as an identifier,
//! and plural keywords (`DATABASES`, `TABLES`) are declared before their
//! singular forms.
//!
//! Keywords are case-insensitive and normalized to uppercase in the token
//! text. Identifiers preserve source case. Literals preserve their source
//! characters, surrounding quotes included. Whitespace is skipped.

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use regex::Regex;

use crate::parser::ParseError;

// ------------------------------------------------------------------------------------------------
// Token types
// ------------------------------------------------------------------------------------------------

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Keywords
    Create,
    Use,
    Databases,
    Database,
    Tables,
    Table,
    Drop,
    Show,
    Select,
    From,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Where,
    And,

    // Punctuation
    Star,
    Comma,
    LParen,
    RParen,
    Semicolon,
    Equals,

    // Values
    Identifier,
    Literal,

    // Skipped, never emitted
    Whitespace,
}

impl TokenType {
    /// Whether tokens of this kind are keyword tokens (normalized to
    /// uppercase in the output).
    fn is_keyword(self) -> bool {
        !matches!(
            self,
            TokenType::Star
                | TokenType::Comma
                | TokenType::LParen
                | TokenType::RParen
                | TokenType::Semicolon
                | TokenType::Equals
                | TokenType::Identifier
                | TokenType::Literal
                | TokenType::Whitespace
        )
    }
}

/// One token: its kind and its textual value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenType,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenType, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Tokenizer
// ------------------------------------------------------------------------------------------------

/// The pattern table, in match-priority order.
const TOKEN_PATTERNS: &[(TokenType, &str)] = &[
    (TokenType::Create, r"(?i)CREATE\b"),
    (TokenType::Use, r"(?i)USE\b"),
    (TokenType::Databases, r"(?i)DATABASES\b"),
    (TokenType::Database, r"(?i)DATABASE\b"),
    (TokenType::Tables, r"(?i)TABLES\b"),
    (TokenType::Table, r"(?i)TABLE\b"),
    (TokenType::Drop, r"(?i)DROP\b"),
    (TokenType::Show, r"(?i)SHOW\b"),
    (TokenType::Select, r"(?i)SELECT\b"),
    (TokenType::From, r"(?i)FROM\b"),
    (TokenType::Insert, r"(?i)INSERT\b"),
    (TokenType::Into, r"(?i)INTO\b"),
    (TokenType::Values, r"(?i)VALUES\b"),
    (TokenType::Update, r"(?i)UPDATE\b"),
    (TokenType::Set, r"(?i)SET\b"),
    (TokenType::Delete, r"(?i)DELETE\b"),
    (TokenType::Where, r"(?i)WHERE\b"),
    (TokenType::And, r"(?i)AND\b"),
    (TokenType::Star, r"\*"),
    (TokenType::Comma, r","),
    (TokenType::LParen, r"\("),
    (TokenType::RParen, r"\)"),
    (TokenType::Semicolon, r";"),
    (TokenType::Equals, r"="),
    (TokenType::Identifier, r"[A-Za-z_][A-Za-z0-9_]*"),
    (TokenType::Literal, r#"'[^']*'|"[^"]*"|-?[0-9]+(\.[0-9]+)?"#),
    (TokenType::Whitespace, r"\s+"),
];

/// A SQL-dialect tokenizer with a fixed, precompiled pattern table.
#[derive(Debug)]
pub struct Tokenizer {
    patterns: Vec<(TokenType, Regex)>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Compiles the pattern table. Every pattern is anchored to the start
    /// of the remaining input so matching can walk the string by offset.
    pub fn new() -> Self {
        let patterns = TOKEN_PATTERNS
            .iter()
            .map(|(kind, pattern)| {
                let anchored = format!(r"\A(?:{pattern})");
                // The table is static and covered by tests; a failure to
                // compile is unreachable at runtime.
                let re = Regex::new(&anchored).unwrap_or_else(|e| {
                    unreachable!("invalid token pattern {:?}: {}", pattern, e)
                });
                (*kind, re)
            })
            .collect();

        Self { patterns }
    }

    /// Tokenizes `sql` into a sequence of tokens, skipping whitespace.
    ///
    /// Fails with [`ParseError::IllegalCharacter`] at the byte offset of
    /// the first character no rule matches.
    pub fn tokenize(&self, sql: &str) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < sql.len() {
            let rest = &sql[pos..];
            let matched = self
                .patterns
                .iter()
                .find_map(|(kind, re)| re.find(rest).map(|m| (*kind, m.as_str())));

            match matched {
                Some((kind, text)) => {
                    if kind != TokenType::Whitespace {
                        let text = if kind.is_keyword() {
                            text.to_uppercase()
                        } else {
                            text.to_string()
                        };
                        tokens.push(Token::new(kind, text));
                    }
                    pos += text.len();
                }
                None => {
                    // `pos` is always on a char boundary here.
                    let ch = rest.chars().next().unwrap_or('\u{FFFD}');
                    return Err(ParseError::IllegalCharacter { ch, offset: pos });
                }
            }
        }

        Ok(tokens)
    }
}
