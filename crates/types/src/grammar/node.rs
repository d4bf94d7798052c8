//! Syntax tree node for parsed type declarations

use std::fmt;

/// One node of a parsed type declaration
///
/// `value` holds the raw token text. Members of a `Nested` aggregate carry
/// their column name in the same token (`"id UInt64"`), which [`name`] and
/// [`parsed_value`] split apart.
///
/// Virtual nodes are synthesized by the parser (the implicit array around a
/// level-1 `Nested`) and never show up in the textual form.
///
/// [`name`]: TypeNode::name
/// [`parsed_value`]: TypeNode::parsed_value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub(super) value: String,
    pub(super) level: usize,
    pub(super) children: Vec<TypeNode>,
    pub(super) nested_child: bool,
    pub(super) is_virtual: bool,
}

impl TypeNode {
    pub(super) fn new(value: impl Into<String>, level: usize, nested_child: bool) -> Self {
        Self {
            value: value.into(),
            level,
            children: Vec::new(),
            nested_child,
            is_virtual: false,
        }
    }

    /// Synthetic `Array` that marks a `Nested` as an array of tuples
    pub(super) fn virtual_array(level: usize) -> Self {
        Self {
            value: "Array".into(),
            level,
            children: Vec::new(),
            nested_child: false,
            is_virtual: true,
        }
    }

    /// Raw token text
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Nesting depth (root = 0)
    pub fn level(&self) -> usize {
        self.level
    }

    /// Parameters in declaration order
    pub fn children(&self) -> &[TypeNode] {
        &self.children
    }

    /// Whether this node is a named member of a `Nested` aggregate
    pub fn is_nested_child(&self) -> bool {
        self.nested_child
    }

    /// Whether the parser synthesized this node
    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// Whether the node has no parameters
    pub fn is_scalar(&self) -> bool {
        self.children.is_empty()
    }

    /// Member name of a `Nested` child (`"id"` for `"id UInt64"`)
    pub fn name(&self) -> Option<&str> {
        self.split_member().map(|(name, _)| name)
    }

    /// Type part of the value (`"UInt64"` for a `"id UInt64"` member)
    pub fn parsed_value(&self) -> &str {
        self.split_member().map_or(&self.value, |(_, value)| value)
    }

    /// The only child, if there is exactly one
    pub fn single_child(&self) -> Option<&TypeNode> {
        match self.children.as_slice() {
            [child] => Some(child),
            _ => None,
        }
    }

    /// Skip through virtual wrappers to the first real node
    pub fn unwrap_virtual(&self) -> &TypeNode {
        let mut node = self;
        while node.is_virtual {
            match node.single_child() {
                Some(child) => node = child,
                None => break,
            }
        }
        node
    }

    fn split_member(&self) -> Option<(&str, &str)> {
        if !self.nested_child || self.level == 0 {
            return None;
        }
        match self.value.rfind(' ') {
            Some(index) if index > 0 => Some((&self.value[..index], &self.value[index + 1..])),
            _ => None,
        }
    }
}

/// Pending output while rendering a tree
enum Piece<'a> {
    Node(&'a TypeNode),
    Text(&'static str),
}

impl fmt::Display for TypeNode {
    /// Renders without recursion so arbitrarily deep trees print safely
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![Piece::Node(self)];

        while let Some(piece) = pending.pop() {
            let node = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Node(node) => node,
            };

            // Virtual nodes print only their children
            let parenthesized = !node.is_virtual && !node.children.is_empty();
            if !node.is_virtual {
                f.write_str(&node.value)?;
            }

            if parenthesized {
                pending.push(Piece::Text(")"));
            }
            for (i, child) in node.children.iter().enumerate().rev() {
                pending.push(Piece::Node(child));
                if i > 0 {
                    pending.push(Piece::Text(", "));
                }
            }
            if parenthesized {
                pending.push(Piece::Text("("));
            }
        }
        Ok(())
    }
}

impl Drop for TypeNode {
    /// Flattens the subtree first so dropping a deep tree does not recurse
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}
