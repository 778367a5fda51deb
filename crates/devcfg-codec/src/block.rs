//! Identifier-keyed nested blocks and pre-render validation.

use crate::error::{CodecError, CodecResult, ValidationProblem};

/// A nested block, identified within its parent by one or more fields.
pub trait Block {
    /// Keyword of the block, used in diagnostics.
    fn kind(&self) -> &'static str;

    /// Identifier fields as `(field name, value)` pairs, in declared order.
    fn identifier(&self) -> Vec<(&'static str, &str)>;

    /// Returns true if nothing is configured besides the identifier.
    fn is_empty_config(&self) -> bool;

    /// Returns the identifier values joined by a space.
    fn identifier_text(&self) -> String {
        self.identifier()
            .iter()
            .map(|(_, value)| *value)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns true if this block's identifier values equal `key`.
    fn has_identifier(&self, key: &[&str]) -> bool {
        let identifier = self.identifier();
        identifier.len() == key.len()
            && identifier.iter().zip(key).all(|((_, value), k)| value == k)
    }
}

/// Returns the block identified by `key`, starting a new one with `make` if
/// none exists yet.
///
/// Lines of one logical block need not be contiguous in a dump; each line
/// finds its block here. Blocks keep the order in which they first appeared.
pub fn block_entry<'v, B, F>(blocks: &'v mut Vec<B>, key: &[&str], make: F) -> &'v mut B
where
    B: Block,
    F: FnOnce() -> B,
{
    let index = match blocks.iter().position(|b| b.has_identifier(key)) {
        Some(index) => index,
        None => {
            blocks.push(make());
            blocks.len() - 1
        }
    };
    &mut blocks[index]
}

/// Collects validation problems before anything is rendered.
#[derive(Debug, Default)]
pub struct Validator {
    problems: Vec<ValidationProblem>,
}

impl Validator {
    /// Creates an empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a problem.
    pub fn push(&mut self, problem: ValidationProblem) {
        self.problems.push(problem);
    }

    /// Records a missing identifier if `value` is empty.
    pub fn require(&mut self, block: &str, field: &str, value: &str) {
        if value.is_empty() {
            self.push(ValidationProblem::MissingIdentifier {
                block: block.to_string(),
                field: field.to_string(),
            });
        }
    }

    /// Records an empty block if `is_empty` holds.
    pub fn non_empty(&mut self, block: &str, identifier: &str, is_empty: bool) {
        if is_empty {
            self.push(ValidationProblem::EmptyBlock {
                block: block.to_string(),
                identifier: identifier.to_string(),
            });
        }
    }

    /// Checks a list of sibling blocks: identifiers present, unique and
    /// every block non-empty.
    pub fn blocks<'a, B, I>(&mut self, blocks: I)
    where
        B: Block + 'a,
        I: IntoIterator<Item = &'a B>,
    {
        let mut seen: Vec<Vec<String>> = Vec::new();
        for block in blocks {
            let key: Vec<String> = block
                .identifier()
                .into_iter()
                .map(|(field, value)| {
                    self.require(block.kind(), field, value);
                    value.to_string()
                })
                .collect();
            let identifier = block.identifier_text();
            if seen.contains(&key) {
                self.push(ValidationProblem::DuplicateIdentifier {
                    block: block.kind().to_string(),
                    identifier: identifier.clone(),
                });
            } else {
                seen.push(key);
            }
            self.non_empty(block.kind(), &identifier, block.is_empty_config());
        }
    }

    /// Returns every recorded problem as one error, or `Ok` if none.
    pub fn finish(self) -> CodecResult<()> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(CodecError::Validation {
                problems: self.problems,
            })
        }
    }
}
