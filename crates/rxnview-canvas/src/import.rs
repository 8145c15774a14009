//! Batch replacement or merge of scene contents from an external model.
//!
//! A batch names every element by id. It is applied to a working copy of
//! the scene, which replaces the live scene only when every entry
//! succeeded.

use std::collections::HashMap;
use std::fmt;

use rxnview_core::{Bounds, CanvasError, ElementId, Point};
use serde::{Deserialize, Serialize};

use crate::element::{HandleRole, ReactionEdge};
use crate::scene::SceneGraph;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportNode {
    pub id: ElementId,
    #[serde(default)]
    pub label: String,
    pub bounds: Bounds,
    #[serde(default)]
    pub compartment: Option<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportCompartment {
    pub id: ElementId,
    #[serde(default)]
    pub label: String,
    pub bounds: Bounds,
}

/// A saved handle position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportHandle {
    pub role: HandleRole,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReaction {
    pub id: ElementId,
    #[serde(default)]
    pub label: String,
    pub sources: Vec<ElementId>,
    pub targets: Vec<ElementId>,
    /// Positions for handles; missing roles get their default placement.
    #[serde(default)]
    pub handles: Vec<ImportHandle>,
}

/// Element definitions supplied by model import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportBatch {
    pub compartments: Vec<ImportCompartment>,
    pub nodes: Vec<ImportNode>,
    pub reactions: Vec<ImportReaction>,
}

impl ImportBatch {
    pub fn is_empty(&self) -> bool {
        self.compartments.is_empty() && self.nodes.is_empty() && self.reactions.is_empty()
    }

    fn max_id(&self) -> Option<ElementId> {
        self.compartments
            .iter()
            .map(|c| c.id)
            .chain(self.nodes.iter().map(|n| n.id))
            .chain(self.reactions.iter().map(|r| r.id))
            .max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Discard the current contents first.
    Replace,
    /// Update elements with matching ids, insert the rest.
    Merge,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Replace => write!(f, "replace"),
            ImportMode::Merge => write!(f, "merge"),
        }
    }
}

/// What an import did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub mode: ImportMode,
    pub nodes: usize,
    pub compartments: usize,
    pub reactions: usize,
    pub created: usize,
    pub updated: usize,
}

impl SceneGraph {
    /// Applies `batch` atomically.
    ///
    /// Compartments are placed first, then nodes (clamped into their
    /// compartment), then reactions. Any failing entry aborts the whole
    /// batch and leaves the scene as it was.
    ///
    /// # Errors
    ///
    /// * `InteractionInProgress` while the structure lock is held
    /// * `DuplicateId` when the batch names one id twice
    /// * `KindMismatch` when merging onto an id of another kind
    /// * `InvalidReference` for unknown endpoints or compartments
    /// * `DegenerateGeometry` for zero-area rectangles or zero-length reactions
    /// * `OutOfRange` for `ElementId(u64::MAX)`, which would exhaust the id space
    pub fn apply_import(
        &mut self,
        batch: &ImportBatch,
        mode: ImportMode,
    ) -> Result<ImportSummary, CanvasError> {
        if self.is_structure_locked() {
            return Err(CanvasError::locked("import a model"));
        }

        let mut work = self.clone();
        if mode == ImportMode::Replace {
            work.clear()?;
        }
        if let Some(max) = batch.max_id() {
            work.reserve_ids_through(max)?;
        }

        let mut seen = std::collections::HashSet::new();
        let mut summary = ImportSummary {
            mode,
            nodes: batch.nodes.len(),
            compartments: batch.compartments.len(),
            reactions: batch.reactions.len(),
            created: 0,
            updated: 0,
        };
        let mut count = |created: bool| {
            if created {
                summary.created += 1;
            } else {
                summary.updated += 1;
            }
        };
        let mut claim = |id: ElementId| {
            if seen.insert(id) {
                Ok(())
            } else {
                Err(CanvasError::DuplicateId { id })
            }
        };

        for comp in &batch.compartments {
            claim(comp.id)?;
            count(work.upsert_compartment(comp.id, &comp.label, comp.bounds)?);
        }
        for node in &batch.nodes {
            claim(node.id)?;
            count(work.upsert_node(node.id, &node.label, node.bounds)?);
        }
        for node in &batch.nodes {
            let current = work.node(node.id)?.compartment;
            if node.compartment.is_some() || current.is_some() {
                work.set_compartment(node.id, node.compartment)?;
            }
        }
        for reaction in &batch.reactions {
            claim(reaction.id)?;
            let edge = ReactionEdge::new(
                reaction.label.clone(),
                reaction.sources.clone(),
                reaction.targets.clone(),
            )?;
            let handles: HashMap<HandleRole, Point> = reaction
                .handles
                .iter()
                .map(|h| (h.role, h.position))
                .collect();
            count(work.upsert_reaction(reaction.id, edge, &handles)?);
        }

        *self = work;
        tracing::info!(
            "Imported model ({}): {} compartments, {} nodes, {} reactions",
            mode,
            summary.compartments,
            summary.nodes,
            summary.reactions
        );
        Ok(summary)
    }
}
