//! Id-keyed storage for scene objects with stable creation order.

use std::collections::HashMap;

use rxnview_core::{CanvasError, ElementId};

use crate::element::{SceneElement, SceneObject};

/// Owns every `SceneObject` and hands out ids and creation sequence numbers.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    objects: HashMap<ElementId, SceneObject>,
    order: Vec<ElementId>,
    next_id: u64,
    next_sequence: u64,
}

impl ElementStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Inserts an element under a freshly allocated id.
    ///
    /// Fails with `OutOfRange` once the id space is exhausted.
    pub fn insert(&mut self, element: SceneElement) -> Result<ElementId, CanvasError> {
        let id = ElementId(self.next_id.max(1));
        self.next_id = successor(id)?;
        self.push(id, element);
        Ok(id)
    }

    /// Inserts an element under an externally chosen id.
    pub fn insert_with_id(
        &mut self,
        id: ElementId,
        element: SceneElement,
    ) -> Result<(), CanvasError> {
        if self.objects.contains_key(&id) {
            return Err(CanvasError::DuplicateId { id });
        }
        self.reserve_ids_through(id)?;
        self.push(id, element);
        Ok(())
    }

    /// Guarantees that ids up to and including `id` are never allocated.
    ///
    /// `ElementId(u64::MAX)` leaves no id to allocate afterwards and is
    /// rejected with `OutOfRange`.
    pub fn reserve_ids_through(&mut self, id: ElementId) -> Result<(), CanvasError> {
        self.next_id = self.next_id.max(successor(id)?);
        Ok(())
    }

    fn push(&mut self, id: ElementId, element: SceneElement) {
        let obj = SceneObject::new(id, element, self.next_sequence);
        self.next_sequence += 1;
        self.objects.insert(id, obj);
        self.order.push(id);
    }

    pub fn get(&self, id: ElementId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    pub fn remove(&mut self, id: ElementId) -> Option<SceneObject> {
        let obj = self.objects.remove(&id)?;
        self.order.retain(|&o| o != id);
        Some(obj)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.order.iter().filter_map(|id| self.objects.get(id))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.values_mut()
    }

    /// Ids in creation order.
    pub fn ids(&self) -> &[ElementId] {
        &self.order
    }

    /// Objects sorted bottom-to-top.
    pub fn paint_order(&self) -> Vec<&SceneObject> {
        let mut objs: Vec<&SceneObject> = self.iter().collect();
        objs.sort_by_key(|o| o.paint_key());
        objs
    }

    /// Removes everything but keeps id allocation monotonic.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.order.clear();
    }
}

fn successor(id: ElementId) -> Result<u64, CanvasError> {
    id.0.checked_add(1).ok_or_else(|| CanvasError::OutOfRange {
        what: "element id".to_string(),
        value: id.0 as f64,
        min: 1.0,
        max: (u64::MAX - 1) as f64,
    })
}
