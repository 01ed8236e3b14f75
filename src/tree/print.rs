//! Box-drawing tree dump.

use std::fmt::{self, Write};

use crate::dimension::Dimension;

use super::node::{Child, TreeNode};

pub(crate) fn render<T: fmt::Display>(
    root: &Child<T>,
    dimensions: &[Box<dyn Dimension>],
) -> String {
    let mut out = String::new();
    print_node(&mut out, dimensions, "", true, root, "root");
    out
}

fn print_node<T: fmt::Display>(
    out: &mut String,
    dimensions: &[Box<dyn Dimension>],
    prefix: &str,
    is_tail: bool,
    node: &Child<T>,
    label: &str,
) {
    let _ = write!(out, "{}{}{}:", prefix, if is_tail { "└── " } else { "├── " }, label);

    let Some(node) = node else {
        out.push('\n');
        return;
    };

    match &**node {
        TreeNode::Leaf(payloads) => {
            let payloads: Vec<String> = payloads.iter().map(|p| p.to_string()).collect();
            let _ = writeln!(out, "dn|[{}]", payloads.join(","));
        }
        TreeNode::Node(n) => {
            let dimension = dimensions[n.dimension].as_ref();
            let _ = writeln!(
                out,
                "kdn|d:{}/{},sv:{}",
                dimension.name(),
                n.dimension,
                dimension.render(n.split_value)
            );

            let mut children: Vec<(String, &Child<T>)> = n
                .scalar_children()
                .into_iter()
                .map(|(label, child)| (label.to_string(), child))
                .collect();
            for set in &n.sets {
                let values: Vec<String> = set
                    .bitset
                    .iter()
                    .map(|idx| dimension.render(idx as i64))
                    .collect();
                let label = format!(
                    "{}[{}]",
                    if set.include { "in:" } else { "not in:" },
                    values.join(",")
                );
                children.push((label, &set.subtree));
            }
            children.retain(|(_, child)| child.is_some());

            let child_prefix = format!("{}{}", prefix, if is_tail { "    " } else { "│   " });
            let count = children.len();
            for (i, (label, child)) in children.into_iter().enumerate() {
                print_node(out, dimensions, &child_prefix, i + 1 == count, child, &label);
            }
        }
    }
}
