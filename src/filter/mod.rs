// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Boolean tag filter expressions.
//!
//! A filter is written as whitespace-separated tag names combined with
//! `and`, `or`, `not` and parentheses, e.g.
//! `(highway_primary or highway_secondary) and not surface_gravel`.
//! A `key_*` token matches any tag of the `key` group.
//!
//! `not` binds tighter than `and`, which binds tighter than `or`.
//! Expressions are compiled once into postfix form with [Expression::compile]
//! and can then be evaluated against many tag sets.

mod compile;
mod eval;
mod presets;

pub use eval::MatchError;
pub use presets::{preset, PRESETS};

use crate::tags::{GroupId, Tag, Vocabulary};

/// Boolean operators available in filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Not,
    And,
    Or,
}

impl Operator {
    fn parse(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("not") {
            Some(Self::Not)
        } else if word.eq_ignore_ascii_case("and") {
            Some(Self::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Self::Or)
        } else {
            None
        }
    }

    /// Lower values bind tighter.
    fn precedence(self) -> u8 {
        match self {
            Self::Not => 0,
            Self::And => 1,
            Self::Or => 2,
        }
    }

    /// Checks whether `self`, waiting on the operator stack, must be emitted
    /// before `incoming` is pushed. Binary operators are left-associative,
    /// while the prefix `not` never forces out another `not`.
    fn pops_before(self, incoming: Self) -> bool {
        if incoming == Self::Not {
            self.precedence() < incoming.precedence()
        } else {
            self.precedence() <= incoming.precedence()
        }
    }
}

/// Element of a compiled, postfix expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Tag(Tag),

    /// True if any member of a wildcard group is present.
    AnyOf {
        group: GroupId,
        members: Vec<Tag>,
    },

    And,
    Or,
    Not,
}

impl From<Operator> for Token {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Not => Token::Not,
            Operator::And => Token::And,
            Operator::Or => Token::Or,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "#{}", tag.0),
            Self::AnyOf { group, .. } => write!(f, "#group{}_*", group.0),
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Not => write!(f, "not"),
        }
    }
}

/// Error conditions which may occur in [Expression::compile].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,

    #[error("unknown tag: {0:?}")]
    UnknownTag(String),

    #[error("unknown tag group: {0:?}")]
    UnknownGroup(String),

    #[error("missing operand for {operator:?} (postfix position {position})")]
    MissingOperand { operator: String, position: usize },

    #[error("expression reduces to {0} values instead of one")]
    OperandCount(usize),
}

/// A compiled tag filter.
///
/// An expression compiled from empty (or whitespace-only) text matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    text: String,
    postfix: Vec<Token>,
    and_count: usize,
    or_count: usize,
    not_count: usize,
}

impl Expression {
    /// Compiles filter text, or the name of one of the [PRESETS], into an [Expression].
    pub fn compile(text: &str, vocabulary: &Vocabulary) -> Result<Self, CompileError> {
        let source = preset(text.trim()).unwrap_or(text);
        let postfix = compile::to_postfix(source, vocabulary)?;
        if !source.trim().is_empty() {
            compile::validate(&postfix)?;
        }

        let count = |wanted: &Token| postfix.iter().filter(|&t| t == wanted).count();
        let and_count = count(&Token::And);
        let or_count = count(&Token::Or);
        let not_count = count(&Token::Not);

        Ok(Self {
            text: text.to_string(),
            postfix,
            and_count,
            or_count,
            not_count,
        })
    }

    /// Returns an expression matching every tag set.
    pub fn match_all() -> Self {
        Self {
            text: String::new(),
            postfix: Vec::new(),
            and_count: 0,
            or_count: 0,
            not_count: 0,
        }
    }

    /// Returns the text this expression was compiled from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn postfix(&self) -> &[Token] {
        &self.postfix
    }

    pub fn is_empty(&self) -> bool {
        self.postfix.is_empty()
    }

    pub fn and_count(&self) -> usize {
        self.and_count
    }

    pub fn or_count(&self) -> usize {
        self.or_count
    }

    pub fn not_count(&self) -> usize {
        self.not_count
    }

    /// Checks if `tag` appears anywhere as an operand, regardless of the
    /// boolean structure. Wildcard operands contain all of their group's tags.
    pub fn has(&self, tag: Tag) -> bool {
        self.postfix.iter().any(|token| match token {
            Token::Tag(t) => *t == tag,
            Token::AnyOf { members, .. } => members.contains(&tag),
            _ => false,
        })
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
