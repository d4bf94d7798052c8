//! Stack-based type tree parser

use thiserror::Error;

use super::node::TypeNode;
use super::tokenizer::{Token, tokenize};

/// Aggregate type that the parser wraps in a virtual array at level 1
pub const NESTED: &str = "Nested";

/// Malformed type declaration
///
/// `position` is the zero-based index of the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("empty type declaration")]
    Empty,

    #[error("'{marker}' at token {position} does not follow a type")]
    MissingOperand { marker: char, position: usize },

    #[error("')' at token {position} closes nothing")]
    UnbalancedClose { position: usize },

    #[error("',' at token {position} is outside any parameter list")]
    StrayComma { position: usize },

    #[error("unexpected '{token}' at token {position}, expected ',' or ')'")]
    UnexpectedToken { token: String, position: usize },

    #[error("{open} unclosed '(' at end of declaration")]
    Unclosed { open: usize },
}

/// Parse a type declaration into a tree
///
/// Nodes under construction live on an explicit stack, so nesting depth is
/// bounded by memory rather than by the call stack. A `Nested` directly
/// inside the outermost type is wrapped in a virtual `Array` node to mark it
/// as an array of tuples; the wrapper is invisible in the textual form.
///
/// ```
/// use clickload_types::grammar::parse_type;
///
/// let node = parse_type("Tuple(Nested(a Int32, b String))").unwrap();
/// let wrapper = &node.children()[0];
/// assert!(wrapper.is_virtual());
/// assert_eq!(wrapper.children()[0].value(), "Nested");
/// assert_eq!(node.to_string(), "Tuple(Nested(a Int32, b String))");
/// ```
pub fn parse_type(input: &str) -> Result<TypeNode, StructureError> {
    let mut stack: Vec<TypeNode> = Vec::new();
    let mut current: Option<TypeNode> = None;
    let mut level = 0usize;

    for (position, token) in tokenize(input).enumerate() {
        match token {
            Token::Open => {
                let node = current.take().ok_or(StructureError::MissingOperand {
                    marker: '(',
                    position,
                })?;
                stack.push(node);
                level += 1;
            }

            Token::Comma => {
                let node = current.take().ok_or(StructureError::MissingOperand {
                    marker: ',',
                    position,
                })?;
                let parent = stack
                    .last_mut()
                    .ok_or(StructureError::StrayComma { position })?;
                parent.children.push(node);

                // A wrapper holds exactly one Nested; the comma belongs to
                // the real parent underneath it.
                if let Some(wrapper) = stack.pop_if(|top| top.is_virtual) {
                    level -= 1;
                    let parent = stack
                        .last_mut()
                        .ok_or(StructureError::StrayComma { position })?;
                    parent.children.push(wrapper);
                }
            }

            Token::Close => {
                let node = current.take().ok_or(StructureError::MissingOperand {
                    marker: ')',
                    position,
                })?;
                let mut parent = stack
                    .pop()
                    .ok_or(StructureError::UnbalancedClose { position })?;
                parent.children.push(node);
                level -= 1;

                if parent.is_virtual {
                    let mut outer = stack
                        .pop()
                        .ok_or(StructureError::UnbalancedClose { position })?;
                    outer.children.push(parent);
                    level -= 1;
                    parent = outer;
                }

                current = Some(parent);
            }

            Token::Text(text) => {
                if current.is_some() {
                    return Err(StructureError::UnexpectedToken {
                        token: text.to_string(),
                        position,
                    });
                }

                let nested_child = stack
                    .last()
                    .is_some_and(|parent| parent.parsed_value() == NESTED);

                if text == NESTED && level == 1 {
                    stack.push(TypeNode::virtual_array(level));
                    current = Some(TypeNode::new(text, level, nested_child));
                    level += 1;
                } else {
                    current = Some(TypeNode::new(text, level, nested_child));
                }
            }
        }
    }

    if !stack.is_empty() {
        let open = stack.iter().filter(|node| !node.is_virtual).count();
        return Err(StructureError::Unclosed { open });
    }

    current.ok_or(StructureError::Empty)
}
