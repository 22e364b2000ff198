// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::{CompileError, Operator, Token};
use crate::tags::Vocabulary;

/// Wildcard suffix expanding a key into all tags of its group.
const WILDCARD_SUFFIX: &str = "_*";

/// Entry of the operator stack during the shunting-yard conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Open,
    Op(Operator),
}

/// Converts infix filter text into postfix [Tokens](Token).
///
/// Parentheses are padded with spaces, so `(a` and `a)` tokenize correctly,
/// and `None` acts as the end sentinel which flushes the operator stack.
pub(super) fn to_postfix(text: &str, vocabulary: &Vocabulary) -> Result<Vec<Token>, CompileError> {
    let padded = text.replace('(', " ( ").replace(')', " ) ");
    let words = padded.split_whitespace().map(Some).chain(std::iter::once(None));

    let mut output = Vec::new();
    let mut stack: Vec<Pending> = Vec::new();

    for word in words {
        match word {
            None => {
                while let Some(pending) = stack.pop() {
                    match pending {
                        Pending::Open => return Err(CompileError::UnbalancedParenthesis),
                        Pending::Op(op) => output.push(op.into()),
                    }
                }
            }

            Some("(") => stack.push(Pending::Open),

            Some(")") => loop {
                match stack.pop() {
                    Some(Pending::Open) => break,
                    Some(Pending::Op(op)) => output.push(op.into()),
                    None => return Err(CompileError::UnbalancedParenthesis),
                }
            },

            Some(word) => match Operator::parse(word) {
                Some(op) => {
                    while let Some(&Pending::Op(top)) = stack.last() {
                        if !top.pops_before(op) {
                            break;
                        }
                        stack.pop();
                        output.push(top.into());
                    }
                    stack.push(Pending::Op(op));
                }
                None => output.push(operand(word, vocabulary)?),
            },
        }
    }

    Ok(output)
}

fn operand(word: &str, vocabulary: &Vocabulary) -> Result<Token, CompileError> {
    if let Some(prefix) = word.strip_suffix(WILDCARD_SUFFIX) {
        let group = vocabulary
            .group_lookup(prefix)
            .ok_or_else(|| CompileError::UnknownGroup(prefix.to_string()))?;
        return Ok(Token::AnyOf {
            group,
            members: vocabulary.group_members(group).to_vec(),
        });
    }

    let tag = vocabulary.intern(word);
    if tag.is_known() {
        Ok(Token::Tag(tag))
    } else {
        Err(CompileError::UnknownTag(word.to_string()))
    }
}

/// Simulates the evaluation stack depth to reject operators without operands
/// and leftover operands. Non-empty expressions must reduce to exactly one value.
pub(super) fn validate(postfix: &[Token]) -> Result<(), CompileError> {
    let mut depth: usize = 0;

    for (position, token) in postfix.iter().enumerate() {
        let required = match token {
            Token::Tag(_) | Token::AnyOf { .. } => {
                depth += 1;
                continue;
            }
            Token::Not => 1,
            Token::And | Token::Or => 2,
        };

        if depth < required {
            return Err(CompileError::MissingOperand {
                operator: token.to_string(),
                position,
            });
        }
        depth -= required - 1;
    }

    if depth == 1 {
        Ok(())
    } else {
        Err(CompileError::OperandCount(depth))
    }
}
