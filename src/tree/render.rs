//! Plain-text rendering of a feature forest.

use crate::models::FeatureNode;

const LEAF: char = '○';
const BRANCH: char = '●';

/// Symbol for a node: filled when it has children.
fn node_symbol(node: &FeatureNode) -> char {
    if node.is_leaf() {
        LEAF
    } else {
        BRANCH
    }
}

/// Render features as an ASCII tree annotated with line counts.
///
/// Example output:
/// ```text
/// Shop (20/130 lines)
/// ├── ● Checkout (80/100 lines)
/// │   └── ○ Payment (20 lines)
/// └── ○ Catalog (10 lines)
/// ```
///
/// A node whose own lines differ from its total shows both as `own/total`.
pub fn render_tree(nodes: &[FeatureNode]) -> String {
    let mut output = String::new();
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i == nodes.len() - 1;
        render_node(&mut output, node, "", is_last, true);
    }
    output
}

fn line_label(node: &FeatureNode) -> String {
    if node.lines == node.total_lines {
        format!("({} lines)", node.total_lines)
    } else {
        format!("({}/{} lines)", node.lines, node.total_lines)
    }
}

fn render_node(
    output: &mut String,
    node: &FeatureNode,
    prefix: &str,
    is_last: bool,
    is_root: bool,
) {
    if is_root {
        output.push_str(&node.name);
    } else {
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
        output.push(node_symbol(node));
        output.push(' ');
        output.push_str(&node.name);
    }
    output.push(' ');
    output.push_str(&line_label(node));
    output.push('\n');

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{}{}", prefix, continuation)
    };

    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, child, &child_prefix, child_is_last, false);
    }
}
