// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use smallvec::SmallVec;

use super::{Expression, Token};
use crate::tags::{tag_set_contains, Tag};

/// Expressions with at most this many tokens are evaluated without a heap allocation.
const INLINE_STACK: usize = 32;

/// Internal inconsistency detected while evaluating an [Expression].
///
/// Compiled expressions are validated, so these errors indicate a bug
/// rather than bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("operator at postfix position {0} has too few operands")]
    StackUnderflow(usize),

    #[error("evaluation left {0} values on the stack instead of one")]
    StackImbalance(usize),
}

impl Expression {
    /// Evaluates the expression, using `has_tag` to check for tag presence.
    ///
    /// Evaluation stops as soon as the remaining operators can no longer
    /// change the result.
    pub fn matches<F: FnMut(Tag) -> bool>(&self, has_tag: F) -> Result<bool, MatchError> {
        self.evaluate(has_tag, true)
    }

    /// Same as [Expression::matches], but always evaluates the whole expression.
    pub fn matches_exhaustive<F: FnMut(Tag) -> bool>(
        &self,
        has_tag: F,
    ) -> Result<bool, MatchError> {
        self.evaluate(has_tag, false)
    }

    /// Evaluates the expression against a sorted and de-duplicated tag set.
    pub fn matches_tags(&self, tags: &[Tag]) -> Result<bool, MatchError> {
        self.matches(|tag| tag_set_contains(tags, tag))
    }

    fn evaluate<F: FnMut(Tag) -> bool>(
        &self,
        mut has_tag: F,
        early_exit: bool,
    ) -> Result<bool, MatchError> {
        if self.postfix.is_empty() {
            return Ok(true);
        }

        let mut stack: SmallVec<[bool; INLINE_STACK]> = SmallVec::with_capacity(self.postfix.len());
        let mut ands_left = self.and_count;
        let mut ors_left = self.or_count;
        let mut nots_left = self.not_count;

        for (position, token) in self.postfix.iter().enumerate() {
            match token {
                Token::Tag(tag) => stack.push(has_tag(*tag)),

                Token::AnyOf { members, .. } => {
                    stack.push(members.iter().any(|&tag| has_tag(tag)));
                }

                Token::Not => {
                    let a = stack.pop().ok_or(MatchError::StackUnderflow(position))?;
                    stack.push(!a);
                    nots_left -= 1;
                }

                Token::And | Token::Or => {
                    let b = stack.pop().ok_or(MatchError::StackUnderflow(position))?;
                    let a = stack.pop().ok_or(MatchError::StackUnderflow(position))?;
                    if *token == Token::And {
                        stack.push(a && b);
                        ands_left -= 1;
                    } else {
                        stack.push(a || b);
                        ors_left -= 1;
                    }
                }
            }

            // With only ORs left a single true decides the result,
            // with only ANDs left a single false does.
            if early_exit && nots_left == 0 {
                if let Some(&top) = stack.last() {
                    if (ands_left == 0 && top) || (ors_left == 0 && !top) {
                        return Ok(top);
                    }
                }
            }
        }

        match stack.as_slice() {
            &[result] => Ok(result),
            other => Err(MatchError::StackImbalance(other.len())),
        }
    }
}
