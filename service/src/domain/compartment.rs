//! Compartment tree enumerated once per scan.
//!
//! Compartments are kept in an arena keyed by id, with parent links stored
//! as ids. Paths are resolved recursively and memoized when the tree is
//! built, so every later lookup is a map hit.

use std::collections::HashMap;

use ociaction_common::{Compartment, ROOT_MARKER};

use super::error::CompartmentError;

#[derive(Debug, Clone)]
pub struct CompartmentTree {
    tenancy_id: String,
    order: Vec<String>,
    nodes: HashMap<String, Compartment>,
    paths: HashMap<String, String>,
}

impl CompartmentTree {
    /// Build the tree and memoize the path of every compartment whose parent
    /// chain reaches the tenancy. Unresolvable entries are kept; asking for
    /// their path reports why.
    pub fn new(tenancy_id: impl Into<String>, compartments: Vec<Compartment>) -> Self {
        let tenancy_id = tenancy_id.into();
        let mut order = Vec::with_capacity(compartments.len());
        let mut nodes = HashMap::with_capacity(compartments.len());
        for compartment in compartments {
            if compartment.id == tenancy_id {
                continue;
            }
            if !nodes.contains_key(&compartment.id) {
                order.push(compartment.id.clone());
            }
            nodes.insert(compartment.id.clone(), compartment);
        }

        let mut paths = HashMap::with_capacity(nodes.len());
        for id in &order {
            // Errors surface again from `resolve_path`.
            let _ = walk(&tenancy_id, &nodes, id, &mut paths, 0);
        }

        Self {
            tenancy_id,
            order,
            nodes,
            paths,
        }
    }

    #[must_use]
    pub fn tenancy_id(&self) -> &str {
        &self.tenancy_id
    }

    /// Number of enumerated compartments, the tenancy root excluded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `/`-joined ancestor names from the tenancy root down to `id`,
    /// e.g. `root/prod/ops`. The tenancy itself resolves to `root`.
    pub fn resolve_path(&self, id: &str) -> Result<String, CompartmentError> {
        if id == self.tenancy_id {
            return Ok(ROOT_MARKER.to_string());
        }
        if let Some(path) = self.paths.get(id) {
            return Ok(path.clone());
        }
        let mut scratch = HashMap::new();
        walk(&self.tenancy_id, &self.nodes, id, &mut scratch, 0)
    }

    /// Display name of a compartment; the tenancy is named `root`.
    pub fn name(&self, id: &str) -> Result<&str, CompartmentError> {
        if id == self.tenancy_id {
            return Ok(ROOT_MARKER);
        }
        self.nodes
            .get(id)
            .map(|c| c.name.as_str())
            .ok_or_else(|| CompartmentError::NotFound(id.to_string()))
    }

    /// Every compartment an instance listing must cover: the tenancy root
    /// first, then the enumerated compartments in provider order.
    #[must_use]
    pub fn scan_targets(&self) -> Vec<&str> {
        std::iter::once(self.tenancy_id.as_str())
            .chain(self.order.iter().map(String::as_str))
            .collect()
    }
}

fn walk(
    tenancy_id: &str,
    nodes: &HashMap<String, Compartment>,
    id: &str,
    memo: &mut HashMap<String, String>,
    hops: usize,
) -> Result<String, CompartmentError> {
    if id == tenancy_id {
        return Ok(ROOT_MARKER.to_string());
    }
    if let Some(path) = memo.get(id) {
        return Ok(path.clone());
    }
    if hops > nodes.len() {
        return Err(CompartmentError::Cycle(id.to_string()));
    }
    let node = nodes
        .get(id)
        .ok_or_else(|| CompartmentError::NotFound(id.to_string()))?;
    let parent = walk(tenancy_id, nodes, &node.parent_id, memo, hops + 1)?;
    let path = format!("{parent}/{}", node.name);
    memo.insert(id.to_string(), path.clone());
    Ok(path)
}
