use super::tree::PhyloTree;

/// Serialize a tree to Newick. Unrooted NJ trees are written from their
/// final joining node; rooted trees from the root.
pub fn to_newick(tree: &PhyloTree) -> String {
    let start = tree
        .root()
        .unwrap_or_else(|| tree.num_nodes().saturating_sub(1));

    let mut out = String::new();
    write_subtree(tree, start, &mut out);
    out.push(';');
    out
}

fn needs_quoting(label: &str) -> bool {
    label.chars().any(|ch| {
        ch.is_whitespace() || matches!(ch, ':' | ',' | '(' | ')' | ';' | '[' | ']' | '\'')
    })
}

fn write_label(out: &mut String, label: &str) {
    if label.is_empty() {
        return;
    }
    if !needs_quoting(label) {
        out.push_str(label);
        return;
    }
    out.push('\'');
    for ch in label.chars() {
        if ch == '\'' {
            out.push_str("''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
}

fn write_subtree(tree: &PhyloTree, idx: usize, out: &mut String) {
    let node = tree.node(idx);

    if !node.children.is_empty() {
        out.push('(');
        for (i, &child) in node.children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_subtree(tree, child, out);
            if let Some(bl) = tree.node(child).branch_length {
                out.push_str(&format!(":{bl:.6}"));
            }
        }
        out.push(')');
    }
    if let Some(ref label) = node.label {
        write_label(out, label);
    }
}
