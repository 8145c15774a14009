use rxnview_core::{Bounds, ElementId, ElementKind, SelectedElement};

use crate::spatial_index::SpatialIndex;
use crate::store::ElementStore;

/// Manages element selection state and selection operations.
///
/// `SelectionManager` is responsible for:
/// - Tracking which element is the "primary" selection
/// - Single selection, toggling and extension (Shift/Ctrl+click)
/// - Rectangle-based selection (marquee)
/// - Producing the selection-change payload for observers
///
/// # Selection Model
///
/// - **Flags**: the `selected` flag on each `SceneObject` is the source of truth
/// - **Primary Selection**: the most recently selected element
/// - **Handles**: reaction handles are never selectable; they become
///   pickable while their reaction is selected
///
/// Every mutating operation returns whether the selected set changed, so
/// callers publish a notification only on real changes.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    primary: Option<ElementId>,
}

impl SelectionManager {
    /// Creates a new `SelectionManager` with no selection.
    ///
    /// # Examples
    ///
    /// ```
    /// use rxnview_canvas::selection_manager::SelectionManager;
    ///
    /// let manager = SelectionManager::new();
    /// assert_eq!(manager.primary(), None);
    /// ```
    pub fn new() -> Self {
        Self { primary: None }
    }

    /// Returns the most recently selected element.
    pub fn primary(&self) -> Option<ElementId> {
        self.primary
    }

    /// Selected ids in creation order.
    pub fn selected_ids(&self, store: &ElementStore) -> Vec<ElementId> {
        store.iter().filter(|o| o.selected).map(|o| o.id).collect()
    }

    /// Selected ids paired with their kinds, in creation order.
    pub fn selected_elements(&self, store: &ElementStore) -> Vec<SelectedElement> {
        store
            .iter()
            .filter(|o| o.selected)
            .map(|o| SelectedElement {
                id: o.id,
                kind: o.kind(),
            })
            .collect()
    }

    pub fn selected_count(&self, store: &ElementStore) -> usize {
        store.iter().filter(|o| o.selected).count()
    }

    pub fn is_selected(&self, store: &ElementStore, id: ElementId) -> bool {
        store.get(id).is_some_and(|o| o.selected)
    }

    /// Replaces the selection with exactly `id`.
    ///
    /// # Returns
    ///
    /// `true` if the selected set changed. Unknown ids and handles clear the
    /// selection.
    pub fn select_only(&mut self, store: &mut ElementStore, id: ElementId) -> bool {
        self.select_ids(store, &[id])
    }

    /// Replaces the selection with the selectable members of `ids`.
    pub fn select_ids(&mut self, store: &mut ElementStore, ids: &[ElementId]) -> bool {
        let mut changed = false;
        for obj in store.iter_mut() {
            let want = obj.kind() != ElementKind::Handle && ids.contains(&obj.id);
            if obj.selected != want {
                obj.selected = want;
                changed = true;
            }
        }
        self.primary = ids
            .iter()
            .rev()
            .copied()
            .find(|&id| self.is_selected(store, id));
        changed
    }

    /// Flips the selection state of one element (Shift/Ctrl+click).
    ///
    /// # Returns
    ///
    /// `true` if the element exists and was toggled.
    pub fn toggle(&mut self, store: &mut ElementStore, id: ElementId) -> bool {
        let Some(obj) = store.get_mut(id) else {
            return false;
        };
        if obj.kind() == ElementKind::Handle {
            return false;
        }
        obj.selected = !obj.selected;
        if obj.selected {
            self.primary = Some(id);
        } else if self.primary == Some(id) {
            self.primary = None;
        }
        true
    }

    /// Adds `ids` to the current selection.
    pub fn extend(&mut self, store: &mut ElementStore, ids: &[ElementId]) -> bool {
        let mut changed = false;
        for &id in ids {
            if let Some(obj) = store.get_mut(id) {
                if obj.kind() != ElementKind::Handle && !obj.selected {
                    obj.selected = true;
                    self.primary = Some(id);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Selectable elements whose bounds overlap `rect`, in paint order.
    ///
    /// Negative widths or heights are normalized by `Bounds::new`.
    pub fn elements_in_rect(
        &self,
        store: &ElementStore,
        spatial_index: &SpatialIndex,
        rect: &Bounds,
    ) -> Vec<ElementId> {
        let mut hits: Vec<_> = spatial_index
            .query(rect)
            .into_iter()
            .filter_map(|id| store.get(id))
            .filter(|o| o.kind() != ElementKind::Handle)
            .collect();
        hits.sort_by_key(|o| o.paint_key());
        hits.into_iter().map(|o| o.id).collect()
    }

    /// Marquee selection.
    ///
    /// # Arguments
    ///
    /// * `rect` - Logical marquee rectangle
    /// * `additive` - Keep the existing selection and add the hits
    pub fn select_in_rect(
        &mut self,
        store: &mut ElementStore,
        spatial_index: &SpatialIndex,
        rect: &Bounds,
        additive: bool,
    ) -> bool {
        let hits = self.elements_in_rect(store, spatial_index, rect);
        if additive {
            self.extend(store, &hits)
        } else {
            self.select_ids(store, &hits)
        }
    }

    /// Selects every node, compartment and reaction.
    pub fn select_all(&mut self, store: &mut ElementStore) -> bool {
        let mut changed = false;
        for obj in store.iter_mut() {
            if obj.kind() != ElementKind::Handle && !obj.selected {
                obj.selected = true;
                changed = true;
            }
        }
        self.primary = store
            .iter()
            .filter(|o| o.selected)
            .last()
            .map(|o| o.id);
        changed
    }

    /// Deselects all elements and clears the primary selection.
    pub fn deselect_all(&mut self, store: &mut ElementStore) -> bool {
        let mut changed = false;
        for obj in store.iter_mut() {
            if obj.selected {
                obj.selected = false;
                changed = true;
            }
        }
        self.primary = None;
        changed
    }

    /// Drops the primary selection if that element no longer exists.
    pub fn prune(&mut self, store: &ElementStore) {
        if self.primary.is_some_and(|id| !store.contains(id)) {
            self.primary = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{NodeElement, SceneElement};

    fn setup() -> (ElementStore, SpatialIndex, Vec<ElementId>) {
        let mut store = ElementStore::new();
        let mut index = SpatialIndex::default();
        let mut ids = Vec::new();
        for (i, x) in [0.0, 100.0, 200.0].iter().enumerate() {
            let rect = Bounds::from_origin_size(*x, 0.0, 50.0, 50.0);
            let id = store
                .insert(SceneElement::Node(NodeElement::new(format!("n{}", i), rect)))
                .unwrap();
            index.insert(id, &rect);
            ids.push(id);
        }
        (store, index, ids)
    }

    #[test]
    fn test_select_only_and_toggle() {
        let (mut store, _, ids) = setup();
        let mut sel = SelectionManager::new();

        assert!(sel.select_only(&mut store, ids[0]));
        assert!(!sel.select_only(&mut store, ids[0]));
        assert_eq!(sel.primary(), Some(ids[0]));

        assert!(sel.toggle(&mut store, ids[1]));
        assert_eq!(sel.selected_ids(&store), vec![ids[0], ids[1]]);

        assert!(sel.toggle(&mut store, ids[1]));
        assert_eq!(sel.selected_ids(&store), vec![ids[0]]);
    }

    #[test]
    fn test_select_in_rect_normalizes_and_replaces() {
        let (mut store, index, ids) = setup();
        let mut sel = SelectionManager::new();
        sel.select_only(&mut store, ids[2]);

        // Dragged from bottom-right to top-left.
        let rect = Bounds::new(120.0, 40.0, -10.0, -10.0);
        assert!(sel.select_in_rect(&mut store, &index, &rect, false));
        assert_eq!(sel.selected_ids(&store), vec![ids[0], ids[1]]);

        let rect = Bounds::new(210.0, 10.0, 220.0, 20.0);
        assert!(sel.select_in_rect(&mut store, &index, &rect, true));
        assert_eq!(sel.selected_count(&store), 3);
    }

    #[test]
    fn test_select_all_and_clear() {
        let (mut store, _, ids) = setup();
        let mut sel = SelectionManager::new();
        assert!(sel.select_all(&mut store));
        assert_eq!(sel.primary(), Some(ids[2]));
        assert!(!sel.select_all(&mut store));
        assert!(sel.deselect_all(&mut store));
        assert!(sel.selected_ids(&store).is_empty());
        assert_eq!(sel.primary(), None);
    }
}
