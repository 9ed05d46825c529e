use crate::ast::QueryNode;

/// Index path from the root `columns` array down to one leaf selection.
pub type TreePath = Vec<usize>;

/// What the current index path points at inside the columns tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafStatus {
    /// The addressed node branches further; descend.
    NotEnoughBranches,
    /// The path runs deeper than the tree does; the malformed branch is
    /// dropped without a report.
    TooManyBranches,
    /// Nothing at the addressed index; move to the parent's next sibling.
    NoLeaf,
    /// A genuine selection leaf.
    FoundLeaf,
}

/// Enumerate every reachable leaf of the columns tree, depth-first, as one
/// `TreePath` per leaf.
///
/// The traversal keeps a single mutable index vector instead of a stack of
/// iterators: at each step the path is re-classified against the tree and
/// either extended, popped, or advanced to the next sibling. Output order
/// is strict left-to-right document order, which fixes the order of the
/// emitted SQL columns and their paired aliases.
///
/// A dotted-name node that carries both `columns` and an alias is itself a
/// terminal leaf (it compiles to a nested JSON aggregation), so the walk
/// stops there instead of descending into its children.
pub fn map_trees(columns: &[QueryNode]) -> Vec<TreePath> {
    let mut map = Vec::new();
    let mut tree: TreePath = vec![0];

    while !tree.is_empty() {
        match leaf_status(columns, &tree, 0) {
            LeafStatus::NotEnoughBranches => tree.push(0),
            LeafStatus::TooManyBranches => {
                tree.pop();
            }
            LeafStatus::NoLeaf => {
                tree.pop();
                if let Some(last) = tree.last_mut() {
                    *last += 1;
                }
            }
            LeafStatus::FoundLeaf => {
                map.push(tree.clone());
                if let Some(last) = tree.last_mut() {
                    *last += 1;
                }
            }
        }
    }

    map
}

fn leaf_status(columns: &[QueryNode], tree: &[usize], index: usize) -> LeafStatus {
    let node = columns.get(tree[index]);

    if index + 1 < tree.len() {
        // The path claims there is more below this node.
        return match node.and_then(|n| n.columns.as_deref()) {
            Some(children) => leaf_status(children, tree, index + 1),
            None => LeafStatus::TooManyBranches,
        };
    }

    match node {
        Some(n) if !n.name.is_empty() => {
            if n.columns.is_some() && n.alias.is_some() {
                // Nested JSON aggregation: terminal despite having children.
                LeafStatus::FoundLeaf
            } else if n.columns.is_some() {
                LeafStatus::NotEnoughBranches
            } else {
                LeafStatus::FoundLeaf
            }
        }
        _ => LeafStatus::NoLeaf,
    }
}
