//! Parse command - show how a type declaration is understood
//!
//! # Usage
//!
//! ```bash
//! clickload parse "Map(String, Nullable(UInt64))"           # round-trip text
//! clickload parse "Tuple(Nested(a UInt8, b String))" --tree # syntax tree
//! clickload parse "LowCardinality(String)" --resolve        # canonical type
//! ```

use std::fmt::Write;

use anyhow::{Context, Result};
use clap::Args;
use clickload_types::{ClickHouseTypeResolver, TypeNode, parse_type};

/// Parse command arguments
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Type declaration, e.g. "Array(Nullable(String))"
    #[arg(value_name = "DECL")]
    pub declaration: String,

    /// Print the syntax tree instead of the round-trip text
    #[arg(long)]
    pub tree: bool,

    /// Also resolve the declaration to a column type
    #[arg(long)]
    pub resolve: bool,
}

/// Run the parse command
pub fn run(args: ParseArgs) -> Result<()> {
    print!("{}", render(&args)?);
    Ok(())
}

fn render(args: &ParseArgs) -> Result<String> {
    let root = parse_type(&args.declaration)
        .with_context(|| format!("failed to parse '{}'", args.declaration))?;

    let mut out = if args.tree {
        render_tree(&root)
    } else {
        format!("{root}\n")
    };

    if args.resolve {
        let resolved = ClickHouseTypeResolver::new()
            .resolve_type(&root)
            .with_context(|| format!("failed to resolve '{}'", args.declaration))?;
        let _ = writeln!(out, "resolved: {resolved}");
    }

    Ok(out)
}

/// One line per node, indented by level
fn render_tree(root: &TypeNode) -> String {
    let mut out = String::new();
    let mut stack = vec![(root, 0usize)];

    while let Some((node, depth)) = stack.pop() {
        let _ = write!(out, "{}{}", "  ".repeat(depth), node.parsed_value());
        if let Some(name) = node.name() {
            let _ = write!(out, " name={name}");
        }
        let _ = write!(out, " level={}", node.level());
        if node.is_virtual() {
            out.push_str(" virtual");
        }
        out.push('\n');

        stack.extend(node.children().iter().rev().map(|child| (child, depth + 1)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(declaration: &str, tree: bool, resolve: bool) -> ParseArgs {
        ParseArgs {
            declaration: declaration.into(),
            tree,
            resolve,
        }
    }

    #[test]
    fn test_round_trip_text() {
        let out = render(&args("Map(String,  Array(UInt8))", false, false)).unwrap();
        assert_eq!(out, "Map(String, Array(UInt8))\n");
    }

    #[test]
    fn test_tree_marks_virtual_wrapper() {
        let out = render(&args("Tuple(Nested(id UInt64, tags String))", true, false)).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Tuple level=0",
                "  Array level=1 virtual",
                "    Nested level=1",
                "      UInt64 name=id level=3",
                "      String name=tags level=3",
            ]
        );
    }

    #[test]
    fn test_resolve_appends_canonical_type() {
        let out = render(&args("LowCardinality(Nullable(String))", false, true)).unwrap();
        assert!(out.starts_with("LowCardinality(Nullable(String))\n"));
        assert!(out.contains("resolved: "));
    }

    #[test]
    fn test_structure_error_has_context() {
        let err = render(&args("Array(UInt8", false, false)).unwrap_err();
        assert!(err.to_string().contains("failed to parse 'Array(UInt8'"));
    }

    #[test]
    fn test_unknown_type_fails_resolution() {
        let err = render(&args("Geometry", false, true)).unwrap_err();
        assert!(err.to_string().contains("failed to resolve"));
    }
}
