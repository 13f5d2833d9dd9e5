//! Grammar combinators over token streams.
//!
//! A [`Rule`] consumes tokens starting at a position and either fails
//! (`None`) or yields a [`RuleValue`] plus the new position. Three
//! primitives — [`Rule::Token`], [`Rule::Or`], [`Rule::Multiple`] — cover
//! the statement grammars; [`Rule::Maybe`] wraps an optional trailing
//! clause, and [`Rule::Assignment`] / [`Rule::Where`] package the two
//! WHERE-level rules (`IDENTIFIER '=' LITERAL`, and the conjunction).
//!
//! `Multiple` is **one or more**: the CREATE TABLE grammar relies on an
//! empty column list failing the whole statement. Between successive
//! items a comma is consumed when present.
//!
//! Conjunction parsing is right-associative and tries the conjunction
//! shape before the single condition, so `a = 1 AND b = 2` cannot
//! short-circuit after `a = 1`.

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use crate::parser::ast::WhereClause;
use crate::parser::tokenizer::{Token, TokenType};

// ------------------------------------------------------------------------------------------------
// Rules
// ------------------------------------------------------------------------------------------------

/// A grammar rule over a token stream.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Matches one token of the given kind, yielding its text.
    Token(TokenType),

    /// First-match-wins over the alternatives.
    Or(Vec<Rule>),

    /// One or more applications of the inner rule, commas tolerated
    /// between items. Fails on zero matches.
    Multiple(Box<Rule>),

    /// Zero-or-one application. Never fails; yields [`RuleValue::None`]
    /// without consuming tokens when the inner rule does not match.
    Maybe(Box<Rule>),

    /// `IDENTIFIER '=' LITERAL`, yielding a column/value pair.
    Assignment,

    /// `WHERE <condition>`, yielding the parsed [`WhereClause`].
    Where,
}

/// The value produced by a successful rule application.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleValue {
    /// A single token's text.
    Text(String),

    /// The values collected by [`Rule::Multiple`].
    List(Vec<RuleValue>),

    /// A column/value pair from [`Rule::Assignment`].
    Pair(String, String),

    /// A parsed WHERE clause.
    Condition(WhereClause),

    /// An optional rule that did not match.
    None,
}

/// A successful parse: the value and the position after it.
pub type ParseOutcome = Option<(RuleValue, usize)>;

impl Rule {
    /// Convenience constructor for [`Rule::Or`].
    pub fn or(rules: impl Into<Vec<Rule>>) -> Self {
        Rule::Or(rules.into())
    }

    /// Convenience constructor for [`Rule::Multiple`].
    pub fn multiple(rule: Rule) -> Self {
        Rule::Multiple(Box::new(rule))
    }

    /// Convenience constructor for [`Rule::Maybe`].
    pub fn maybe(rule: Rule) -> Self {
        Rule::Maybe(Box::new(rule))
    }

    /// Applies the rule to `tokens` at `pos`.
    pub fn parse(&self, tokens: &[Token], pos: usize) -> ParseOutcome {
        match self {
            Rule::Token(kind) => {
                let token = tokens.get(pos)?;
                if token.kind == *kind {
                    Some((RuleValue::Text(token.text.clone()), pos + 1))
                } else {
                    None
                }
            }

            Rule::Or(rules) => rules.iter().find_map(|rule| rule.parse(tokens, pos)),

            Rule::Multiple(rule) => {
                let mut values = Vec::new();
                let mut current = pos;

                while let Some((value, next)) = rule.parse(tokens, current) {
                    values.push(value);
                    current = next;

                    // Items may be separated by a comma.
                    if let Some((_, after)) = Rule::Token(TokenType::Comma).parse(tokens, current) {
                        current = after;
                    }
                }

                if values.is_empty() {
                    None
                } else {
                    Some((RuleValue::List(values), current))
                }
            }

            Rule::Maybe(rule) => match rule.parse(tokens, pos) {
                Some(result) => Some(result),
                None => Some((RuleValue::None, pos)),
            },

            Rule::Assignment => {
                let (column, value, next) = parse_assignment(tokens, pos)?;
                Some((RuleValue::Pair(column, value), next))
            }

            Rule::Where => {
                let (_, next) = Rule::Token(TokenType::Where).parse(tokens, pos)?;
                let (clause, next) = parse_condition(tokens, next)?;
                Some((RuleValue::Condition(clause), next))
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// WHERE-clause rules
// ------------------------------------------------------------------------------------------------

/// Parses a full condition: a conjunction if one is present, otherwise a
/// single equality. The conjunction must be tried first.
pub fn parse_condition(tokens: &[Token], pos: usize) -> Option<(WhereClause, usize)> {
    parse_conjunction(tokens, pos).or_else(|| parse_simple_condition(tokens, pos))
}

/// Parses `IDENTIFIER '=' LITERAL` into an equality condition.
pub fn parse_simple_condition(tokens: &[Token], pos: usize) -> Option<(WhereClause, usize)> {
    let (column, value, next) = parse_assignment(tokens, pos)?;
    Some((WhereClause::equals(column, value), next))
}

/// Parses `simple AND (conjunction | simple)`, right-associative.
fn parse_conjunction(tokens: &[Token], pos: usize) -> Option<(WhereClause, usize)> {
    let (left, pos) = parse_simple_condition(tokens, pos)?;
    let (_, pos) = Rule::Token(TokenType::And).parse(tokens, pos)?;
    let (right, pos) = parse_condition(tokens, pos)?;
    Some((WhereClause::and(left, right), pos))
}

/// Shared shape of assignments and equality conditions.
fn parse_assignment(tokens: &[Token], pos: usize) -> Option<(String, String, usize)> {
    let (column, pos) = match Rule::Token(TokenType::Identifier).parse(tokens, pos)? {
        (RuleValue::Text(text), next) => (text, next),
        _ => return None,
    };
    let (_, pos) = Rule::Token(TokenType::Equals).parse(tokens, pos)?;
    let (value, pos) = match Rule::Token(TokenType::Literal).parse(tokens, pos)? {
        (RuleValue::Text(text), next) => (text, next),
        _ => return None,
    };
    Some((column, value, pos))
}
