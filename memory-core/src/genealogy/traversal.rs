//! DFS-based ancestor/descendant traversal with cycle detection.

use crate::error::{Error, Result};
use crate::types::Memory;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Result of a `genealogy(memory_id, workspace)` query (§4.1, §6).
#[derive(Debug, Clone)]
pub struct Genealogy {
    pub ancestors: Vec<Uuid>,
    pub descendants: Vec<Uuid>,
    /// Ancestor chain from root to target, inclusive of the target.
    pub chain: Vec<Uuid>,
    pub stage: u32,
    pub is_root: bool,
    pub is_leaf: bool,
}

/// An in-memory edge index built from one `scan` of the workspace:
/// forward edges (child -> parents) as carried directly on each `Memory`,
/// and the reverse index (parent -> children) built once here.
struct EdgeIndex<'a> {
    by_id: HashMap<Uuid, &'a Memory>,
    children: HashMap<Uuid, Vec<Uuid>>,
}

impl<'a> EdgeIndex<'a> {
    fn build(memories: &'a [Memory]) -> Self {
        let mut by_id = HashMap::with_capacity(memories.len());
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();

        for m in memories {
            by_id.insert(m.id, m);
        }
        for m in memories {
            for parent in m.parent_id.iter().chain(m.derived_from.iter()) {
                children.entry(*parent).or_default().push(m.id);
            }
        }

        Self { by_id, children }
    }

    fn parents_of(&self, id: Uuid) -> Vec<Uuid> {
        let Some(m) = self.by_id.get(&id) else {
            return Vec::new();
        };
        m.parent_id.iter().copied().chain(m.derived_from.iter().copied()).collect()
    }
}

/// Compute the genealogy of `target` within the set of Memories already
/// fetched from the store for this workspace (i.e. the caller has already
/// called `scan(workspace_filter)`; this function does no I/O).
///
/// # Errors
///
/// Returns [`Error::GenealogyCycle`] if a visited node is re-encountered
/// during traversal, per §4.6.
pub fn genealogy_of(target: Uuid, memories: &[Memory]) -> Result<Genealogy> {
    let index = EdgeIndex::build(memories);

    let ancestors = collect_ancestors(&index, target)?;
    let chain = build_chain(&index, target, &ancestors);
    let descendants = collect_descendants(&index, target)?;

    let stage = if ancestors.is_empty() {
        0
    } else {
        ancestors
            .iter()
            .filter_map(|id| index.by_id.get(id))
            .map(|m| m.evolution_stage)
            .max()
            .map_or(0, |max_stage| max_stage + 1)
    };

    Ok(Genealogy {
        is_root: ancestors.is_empty(),
        is_leaf: index.children.get(&target).is_none_or(Vec::is_empty),
        ancestors,
        descendants,
        chain,
        stage,
    })
}

/// DFS visitation state for cycle detection: a node is `Gray` while it is
/// on the current path (an ancestor of the node the DFS is presently
/// exploring) and `Black` once that whole subtree has been explored. Only
/// re-entering a `Gray` node is a true cycle — re-entering a `Black` node
/// just means the DAG has converging paths (a multi-parent merge) and
/// should be deduped, not rejected.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Gray,
    Black,
}

fn collect_ancestors(index: &EdgeIndex, target: Uuid) -> Result<Vec<Uuid>> {
    let mut colors = HashMap::new();
    let mut ancestors = Vec::new();
    colors.insert(target, Color::Gray);
    visit(target, &mut colors, &mut ancestors, |id| index.parents_of(id))?;
    Ok(ancestors)
}

fn collect_descendants(index: &EdgeIndex, target: Uuid) -> Result<Vec<Uuid>> {
    let mut colors = HashMap::new();
    let mut descendants = Vec::new();
    colors.insert(target, Color::Gray);
    visit(target, &mut colors, &mut descendants, |id| {
        index.children.get(&id).cloned().unwrap_or_default()
    })?;
    Ok(descendants)
}

/// Recursive DFS over `target`'s neighbors (parents or children, per
/// `neighbors_of`), collecting every distinct node reachable from `target`
/// into `out` and raising [`Error::GenealogyCycle`] only when the walk
/// revisits a node still on its own current path.
fn visit(
    target: Uuid,
    colors: &mut HashMap<Uuid, Color>,
    out: &mut Vec<Uuid>,
    neighbors_of: impl Fn(Uuid) -> Vec<Uuid> + Copy,
) -> Result<()> {
    for node in neighbors_of(target) {
        match colors.get(&node) {
            Some(Color::Gray) => return Err(Error::GenealogyCycle(node)),
            Some(Color::Black) => continue,
            None => {
                colors.insert(node, Color::Gray);
                out.push(node);
                visit(node, colors, out, neighbors_of)?;
                colors.insert(node, Color::Black);
            }
        }
    }
    Ok(())
}

/// Build the root→target ancestor chain for rendering, ordering by
/// `evolution_stage` ascending (roots first). Ties (e.g. a multi-parent
/// merge) are broken by UUID for determinism.
fn build_chain(index: &EdgeIndex, target: Uuid, ancestors: &[Uuid]) -> Vec<Uuid> {
    let mut chain: Vec<Uuid> = ancestors.to_vec();
    chain.sort_by_key(|id| {
        let stage = index.by_id.get(id).map_or(0, |m| m.evolution_stage);
        (stage, *id)
    });
    chain.push(target);
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, Outcome};

    fn memory(id: Uuid, parent: Option<Uuid>, derived_from: Vec<Uuid>, stage: u32) -> Memory {
        let mut m = Memory::new(
            "ws1".into(),
            "t".into(),
            "d".into(),
            "c".into(),
            vec![0.1],
            Difficulty::Simple,
            "dom".into(),
            Outcome::Success,
        );
        m.id = id;
        m.parent_id = parent;
        m.derived_from = derived_from;
        m.evolution_stage = stage;
        m
    }

    #[test]
    fn root_has_no_ancestors_and_stage_zero() {
        let root = memory(Uuid::new_v4(), None, vec![], 0);
        let id = root.id;
        let g = genealogy_of(id, &[root]).unwrap();
        assert!(g.is_root);
        assert!(g.ancestors.is_empty());
        assert_eq!(g.stage, 0);
    }

    #[test]
    fn multi_parent_merge_reports_both_ancestors_and_stage_one() {
        let r1 = memory(Uuid::new_v4(), None, vec![], 0);
        let r2 = memory(Uuid::new_v4(), None, vec![], 0);
        let merged = memory(Uuid::new_v4(), None, vec![r1.id, r2.id], 1);
        let target = merged.id;
        let memories = vec![r1.clone(), r2.clone(), merged];

        let g = genealogy_of(target, &memories).unwrap();
        assert_eq!(g.stage, 1);
        assert!(g.ancestors.contains(&r1.id));
        assert!(g.ancestors.contains(&r2.id));
        assert_eq!(g.chain.last(), Some(&target));
        assert_eq!(g.chain.len(), 3);
        assert!(g.chain[..2].contains(&r1.id) && g.chain[..2].contains(&r2.id));
    }

    #[test]
    fn diamond_shared_ancestor_is_not_a_false_cycle() {
        let root = memory(Uuid::new_v4(), None, vec![], 0);
        let a = memory(Uuid::new_v4(), Some(root.id), vec![], 1);
        let b = memory(Uuid::new_v4(), Some(root.id), vec![], 1);
        let merged = memory(Uuid::new_v4(), None, vec![a.id, b.id], 2);
        let target = merged.id;
        let memories = vec![root.clone(), a.clone(), b.clone(), merged];

        let g = genealogy_of(target, &memories).unwrap();
        assert_eq!(g.stage, 2);
        assert!(g.ancestors.contains(&root.id));
        assert!(g.ancestors.contains(&a.id));
        assert!(g.ancestors.contains(&b.id));
        assert_eq!(g.ancestors.iter().filter(|id| **id == root.id).count(), 1);
    }

    #[test]
    fn cycle_is_detected_and_rejected() {
        let a_id = Uuid::new_v4();
        let b_id = Uuid::new_v4();
        let a = memory(a_id, Some(b_id), vec![], 1);
        let b = memory(b_id, Some(a_id), vec![], 1);
        let result = genealogy_of(a_id, &[a, b]);
        assert!(matches!(result, Err(Error::GenealogyCycle(_))));
    }

    #[test]
    fn leaf_detection() {
        let root = memory(Uuid::new_v4(), None, vec![], 0);
        let root_id = root.id;
        let child = memory(Uuid::new_v4(), Some(root_id), vec![], 1);
        let memories = vec![root, child];
        let g = genealogy_of(root_id, &memories).unwrap();
        assert!(!g.is_leaf);
    }
}
