//! # Query Front-End
//!
//! The SQL-dialect front-end: a tokenizer, a small combinator grammar,
//! and one parser per statement, each a fixed rule sequence terminated by
//! a semicolon that builds a typed [`Statement`](ast::Statement).
//!
//! ## Dispatch
//!
//! The statement parser is selected by a two-level lookahead: the first
//! token picks the statement family, and for the ambiguous prefixes
//! (`CREATE`, `DROP`, `SHOW`) the second token disambiguates. When
//! dispatch fails — or the input ends before it can complete — the error
//! lists the grammar of every statement still reachable at that point.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`tokenizer`] | Regex-table tokenizer, declaration-order matching |
//! | [`grammar`] | `Token` / `Or` / `Multiple` combinators + WHERE rules |
//! | [`ast`] | Typed statement and WHERE-clause representation |

// ------------------------------------------------------------------------------------------------
// Submodules
// ------------------------------------------------------------------------------------------------

pub mod ast;
pub mod grammar;
pub mod tokenizer;

#[cfg(test)]
mod tests;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

use crate::parser::ast::{SelectColumns, Statement, WhereClause};
use crate::parser::grammar::{Rule, RuleValue};
use crate::parser::tokenizer::{Token, TokenType};

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors produced while tokenizing or parsing a statement.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A character no tokenizer rule recognizes.
    #[error("Illegal character {ch:?} at offset {offset}")]
    IllegalCharacter { ch: char, offset: usize },

    /// A token that does not fit the grammar at its position.
    #[error("Invalid syntax; unexpected token {token:?} at position {position}. Expected:\n{expected}")]
    UnexpectedToken {
        token: String,
        position: usize,
        expected: String,
    },

    /// The token stream ended before the statement was complete.
    #[error("Invalid syntax; unexpected end of input. Expected:\n{expected}")]
    UnexpectedEnd { expected: String },

    /// Grammar and AST builder out of sync — a programming error.
    #[error("Internal parser error: {0}")]
    Internal(String),
}

// ------------------------------------------------------------------------------------------------
// Statement parsers
// ------------------------------------------------------------------------------------------------

/// One statement's parser: its dispatch keys, grammar-help line, rule
/// sequence, and AST builder.
struct StatementParser {
    first: TokenType,
    second: Option<TokenType>,
    help: &'static str,
    grammar: Vec<Rule>,
    build: fn(Vec<RuleValue>) -> Result<Statement, ParseError>,
}

impl StatementParser {
    /// Runs the rule sequence over `tokens` and builds the AST node.
    fn parse(&self, tokens: &[Token]) -> Result<Statement, ParseError> {
        let mut values = Vec::with_capacity(self.grammar.len());
        let mut pos = 0;

        for rule in &self.grammar {
            match rule.parse(tokens, pos) {
                Some((value, next)) => {
                    values.push(value);
                    pos = next;
                }
                None => {
                    return Err(match tokens.get(pos) {
                        Some(token) => ParseError::UnexpectedToken {
                            token: token.text.clone(),
                            position: pos,
                            expected: self.help.to_string(),
                        },
                        None => ParseError::UnexpectedEnd {
                            expected: self.help.to_string(),
                        },
                    });
                }
            }
        }

        (self.build)(values)
    }
}

// ------------------------------------------------------------------------------------------------
// Parser (dispatch)
// ------------------------------------------------------------------------------------------------

/// The statement-level parser: dispatches on up to two tokens of
/// lookahead and delegates to the matching [`StatementParser`].
pub struct Parser {
    parsers: Vec<StatementParser>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            parsers: statement_parsers(),
        }
    }

    /// Parses one statement from `tokens`.
    pub fn parse(&self, tokens: &[Token]) -> Result<Statement, ParseError> {
        let first = match tokens.first() {
            Some(token) => token,
            None => {
                return Err(ParseError::UnexpectedEnd {
                    expected: enumerate_help(&self.parsers),
                });
            }
        };

        let candidates: Vec<&StatementParser> = self
            .parsers
            .iter()
            .filter(|p| p.first == first.kind)
            .collect();

        if candidates.is_empty() {
            return Err(ParseError::UnexpectedToken {
                token: first.text.clone(),
                position: 0,
                expected: enumerate_help(&self.parsers),
            });
        }

        // Ambiguous prefixes (CREATE / DROP / SHOW) need a second token.
        let chosen = if candidates.iter().any(|p| p.second.is_some()) {
            let second = match tokens.get(1) {
                Some(token) => token,
                None => {
                    return Err(ParseError::UnexpectedEnd {
                        expected: enumerate_help_refs(&candidates),
                    });
                }
            };

            match candidates.iter().find(|p| p.second == Some(second.kind)) {
                Some(parser) => *parser,
                None => {
                    return Err(ParseError::UnexpectedToken {
                        token: second.text.clone(),
                        position: 1,
                        expected: enumerate_help_refs(&candidates),
                    });
                }
            }
        } else {
            candidates[0]
        };

        chosen.parse(tokens)
    }
}

fn enumerate_help(parsers: &[StatementParser]) -> String {
    parsers
        .iter()
        .map(|p| format!("  {}", p.help))
        .collect::<Vec<_>>()
        .join("\n")
}

fn enumerate_help_refs(parsers: &[&StatementParser]) -> String {
    parsers
        .iter()
        .map(|p| format!("  {}", p.help))
        .collect::<Vec<_>>()
        .join("\n")
}

// ------------------------------------------------------------------------------------------------
// Grammar table
// ------------------------------------------------------------------------------------------------

fn statement_parsers() -> Vec<StatementParser> {
    use TokenType::*;

    vec![
        StatementParser {
            first: Create,
            second: Some(Database),
            help: "CREATE DATABASE <database>;",
            grammar: vec![
                Rule::Token(Create),
                Rule::Token(Database),
                Rule::Token(Identifier),
                Rule::Token(Semicolon),
            ],
            build: build_create_database,
        },
        StatementParser {
            first: Show,
            second: Some(Databases),
            help: "SHOW DATABASES;",
            grammar: vec![
                Rule::Token(Show),
                Rule::Token(Databases),
                Rule::Token(Semicolon),
            ],
            build: |_| Ok(Statement::ShowDatabases),
        },
        StatementParser {
            first: Drop,
            second: Some(Database),
            help: "DROP DATABASE <database>;",
            grammar: vec![
                Rule::Token(Drop),
                Rule::Token(Database),
                Rule::Token(Identifier),
                Rule::Token(Semicolon),
            ],
            build: build_drop_database,
        },
        StatementParser {
            first: Use,
            second: None,
            help: "USE <database>;",
            grammar: vec![
                Rule::Token(Use),
                Rule::Token(Identifier),
                Rule::Token(Semicolon),
            ],
            build: build_use_database,
        },
        StatementParser {
            first: Create,
            second: Some(Table),
            help: "CREATE TABLE <table> (<column>, ...);",
            grammar: vec![
                Rule::Token(Create),
                Rule::Token(Table),
                Rule::Token(Identifier),
                Rule::Token(LParen),
                Rule::multiple(Rule::Token(Identifier)),
                Rule::Token(RParen),
                Rule::Token(Semicolon),
            ],
            build: build_create_table,
        },
        StatementParser {
            first: Show,
            second: Some(Tables),
            help: "SHOW TABLES;",
            grammar: vec![
                Rule::Token(Show),
                Rule::Token(Tables),
                Rule::Token(Semicolon),
            ],
            build: |_| Ok(Statement::ShowTables),
        },
        StatementParser {
            first: Drop,
            second: Some(Table),
            help: "DROP TABLE <table>;",
            grammar: vec![
                Rule::Token(Drop),
                Rule::Token(Table),
                Rule::Token(Identifier),
                Rule::Token(Semicolon),
            ],
            build: build_drop_table,
        },
        StatementParser {
            first: Select,
            second: None,
            help: "SELECT * | <column>, ... FROM <table> [WHERE <condition>];",
            grammar: vec![
                Rule::Token(Select),
                Rule::or(vec![
                    Rule::Token(Star),
                    Rule::multiple(Rule::Token(Identifier)),
                ]),
                Rule::Token(From),
                Rule::Token(Identifier),
                Rule::maybe(Rule::Where),
                Rule::Token(Semicolon),
            ],
            build: build_select,
        },
        StatementParser {
            first: Insert,
            second: None,
            help: "INSERT INTO <table> (<column>, ...) VALUES (<value>, ...);",
            grammar: vec![
                Rule::Token(Insert),
                Rule::Token(Into),
                Rule::Token(Identifier),
                Rule::Token(LParen),
                Rule::multiple(Rule::Token(Identifier)),
                Rule::Token(RParen),
                Rule::Token(Values),
                Rule::Token(LParen),
                Rule::multiple(Rule::or(vec![
                    Rule::Token(Identifier),
                    Rule::Token(Literal),
                ])),
                Rule::Token(RParen),
                Rule::Token(Semicolon),
            ],
            build: build_insert,
        },
        StatementParser {
            first: Update,
            second: None,
            help: "UPDATE <table> SET <column> = <value>, ... [WHERE <condition>];",
            grammar: vec![
                Rule::Token(Update),
                Rule::Token(Identifier),
                Rule::Token(Set),
                Rule::multiple(Rule::Assignment),
                Rule::maybe(Rule::Where),
                Rule::Token(Semicolon),
            ],
            build: build_update,
        },
        StatementParser {
            first: Delete,
            second: None,
            help: "DELETE FROM <table> [WHERE <condition>];",
            grammar: vec![
                Rule::Token(Delete),
                Rule::Token(From),
                Rule::Token(Identifier),
                Rule::maybe(Rule::Where),
                Rule::Token(Semicolon),
            ],
            build: build_delete,
        },
    ]
}

// ------------------------------------------------------------------------------------------------
// AST builders
// ------------------------------------------------------------------------------------------------

fn build_create_database(mut values: Vec<RuleValue>) -> Result<Statement, ParseError> {
    Ok(Statement::CreateDatabase {
        name: text_at(&mut values, 2)?,
    })
}

fn build_drop_database(mut values: Vec<RuleValue>) -> Result<Statement, ParseError> {
    Ok(Statement::DropDatabase {
        name: text_at(&mut values, 2)?,
    })
}

fn build_use_database(mut values: Vec<RuleValue>) -> Result<Statement, ParseError> {
    Ok(Statement::UseDatabase {
        name: text_at(&mut values, 1)?,
    })
}

fn build_create_table(mut values: Vec<RuleValue>) -> Result<Statement, ParseError> {
    Ok(Statement::CreateTable {
        table: text_at(&mut values, 2)?,
        columns: texts_at(&mut values, 4)?,
    })
}

fn build_drop_table(mut values: Vec<RuleValue>) -> Result<Statement, ParseError> {
    Ok(Statement::DropTable {
        table: text_at(&mut values, 2)?,
    })
}

fn build_select(mut values: Vec<RuleValue>) -> Result<Statement, ParseError> {
    let columns = if matches!(values.get(1), Some(RuleValue::Text(star)) if star == "*") {
        SelectColumns::All
    } else if matches!(values.get(1), Some(RuleValue::List(_))) {
        SelectColumns::Columns(texts_at(&mut values, 1)?)
    } else {
        return Err(ParseError::Internal(format!(
            "bad SELECT column list: {:?}",
            values.get(1)
        )));
    };

    Ok(Statement::Select {
        columns,
        table: text_at(&mut values, 3)?,
        where_clause: where_at(&mut values, 4)?,
    })
}

fn build_insert(mut values: Vec<RuleValue>) -> Result<Statement, ParseError> {
    Ok(Statement::Insert {
        table: text_at(&mut values, 2)?,
        columns: texts_at(&mut values, 4)?,
        values: texts_at(&mut values, 8)?,
    })
}

fn build_update(mut values: Vec<RuleValue>) -> Result<Statement, ParseError> {
    Ok(Statement::Update {
        table: text_at(&mut values, 1)?,
        set_clause: pairs_at(&mut values, 3)?,
        where_clause: where_at(&mut values, 4)?,
    })
}

fn build_delete(mut values: Vec<RuleValue>) -> Result<Statement, ParseError> {
    Ok(Statement::Delete {
        table: text_at(&mut values, 2)?,
        where_clause: where_at(&mut values, 3)?,
    })
}

// ------------------------------------------------------------------------------------------------
// Value extraction helpers
// ------------------------------------------------------------------------------------------------

fn text_at(values: &mut [RuleValue], index: usize) -> Result<String, ParseError> {
    match values.get_mut(index) {
        Some(RuleValue::Text(text)) => Ok(std::mem::take(text)),
        other => Err(ParseError::Internal(format!(
            "expected token text at {index}, found {other:?}"
        ))),
    }
}

fn texts_at(values: &mut [RuleValue], index: usize) -> Result<Vec<String>, ParseError> {
    match values.get_mut(index) {
        Some(RuleValue::List(items)) => std::mem::take(items)
            .into_iter()
            .map(|item| match item {
                RuleValue::Text(text) => Ok(text),
                other => Err(ParseError::Internal(format!(
                    "expected token text in list at {index}, found {other:?}"
                ))),
            })
            .collect(),
        other => Err(ParseError::Internal(format!(
            "expected list at {index}, found {other:?}"
        ))),
    }
}

fn pairs_at(values: &mut [RuleValue], index: usize) -> Result<Vec<(String, String)>, ParseError> {
    match values.get_mut(index) {
        Some(RuleValue::List(items)) => std::mem::take(items)
            .into_iter()
            .map(|item| match item {
                RuleValue::Pair(column, value) => Ok((column, value)),
                other => Err(ParseError::Internal(format!(
                    "expected assignment in list at {index}, found {other:?}"
                ))),
            })
            .collect(),
        other => Err(ParseError::Internal(format!(
            "expected list at {index}, found {other:?}"
        ))),
    }
}

fn where_at(values: &mut [RuleValue], index: usize) -> Result<Option<WhereClause>, ParseError> {
    match values.get_mut(index) {
        Some(slot @ RuleValue::Condition(_)) => {
            match std::mem::replace(slot, RuleValue::None) {
                RuleValue::Condition(clause) => Ok(Some(clause)),
                other => Err(ParseError::Internal(format!(
                    "WHERE slot at {index} changed underfoot: {other:?}"
                ))),
            }
        }
        Some(RuleValue::None) => Ok(None),
        other => Err(ParseError::Internal(format!(
            "expected optional WHERE at {index}, found {other:?}"
        ))),
    }
}
