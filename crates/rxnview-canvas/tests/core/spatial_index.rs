use rxnview_canvas::SpatialIndex;
use rxnview_core::{Bounds, ElementId, Point};

fn sorted(mut ids: Vec<ElementId>) -> Vec<ElementId> {
    ids.sort();
    ids
}

#[test]
fn test_spatial_index_creation() {
    let index = SpatialIndex::new(Bounds::new(-100.0, -100.0, 100.0, 100.0), 8, 16);
    let stats = index.stats();
    assert_eq!(stats.total_items, 0);
    assert_eq!(stats.total_nodes, 1);
    assert!(index.is_empty());
}

#[test]
fn test_spatial_index_insert_and_query() {
    let mut index = SpatialIndex::new(Bounds::new(-100.0, -100.0, 100.0, 100.0), 8, 16);
    index.insert(ElementId(1), &Bounds::new(-50.0, -50.0, -40.0, -40.0));
    index.insert(ElementId(2), &Bounds::new(40.0, 40.0, 50.0, 50.0));

    let hits = index.query(&Bounds::new(-60.0, -60.0, -30.0, -30.0));
    assert_eq!(hits, vec![ElementId(1)]);

    let all = sorted(index.query(&Bounds::new(-100.0, -100.0, 100.0, 100.0)));
    assert_eq!(all, vec![ElementId(1), ElementId(2)]);
}

#[test]
fn test_spatial_index_splits_under_load() {
    let mut index = SpatialIndex::new(Bounds::new(0.0, 0.0, 1000.0, 1000.0), 6, 4);
    for i in 0..100u64 {
        let x = (i % 10) as f64 * 100.0 + 10.0;
        let y = (i / 10) as f64 * 100.0 + 10.0;
        index.insert(ElementId(i + 1), &Bounds::from_origin_size(x, y, 20.0, 20.0));
    }
    let stats = index.stats();
    assert_eq!(stats.total_items, 100);
    assert!(stats.total_nodes > 1);
    assert!(stats.max_depth <= 6);

    let hits = index.query_point(&Point::new(115.0, 215.0));
    assert_eq!(hits, vec![ElementId(22)]);
}

#[test]
fn test_items_outside_root_are_kept() {
    let mut index = SpatialIndex::new(Bounds::new(0.0, 0.0, 100.0, 100.0), 4, 2);
    index.insert(ElementId(7), &Bounds::new(500.0, 500.0, 520.0, 520.0));
    assert_eq!(index.len(), 1);
    assert_eq!(
        index.query(&Bounds::new(490.0, 490.0, 510.0, 510.0)),
        vec![ElementId(7)]
    );
}

#[test]
fn test_update_moves_entry() {
    let mut index = SpatialIndex::new(Bounds::new(0.0, 0.0, 1000.0, 1000.0), 6, 2);
    let id = ElementId(3);
    index.insert(id, &Bounds::new(10.0, 10.0, 20.0, 20.0));
    index.update(id, &Bounds::new(810.0, 810.0, 820.0, 820.0));

    assert!(index.query_point(&Point::new(15.0, 15.0)).is_empty());
    assert_eq!(index.query_point(&Point::new(815.0, 815.0)), vec![id]);
    assert_eq!(index.bounds_of(id), Some(Bounds::new(810.0, 810.0, 820.0, 820.0)));
    assert_eq!(index.len(), 1);
}

#[test]
fn test_remove_and_clear() {
    let mut index = SpatialIndex::default();
    index.insert(ElementId(1), &Bounds::new(0.0, 0.0, 10.0, 10.0));
    index.insert(ElementId(2), &Bounds::new(5.0, 5.0, 15.0, 15.0));

    assert!(index.remove(ElementId(1)));
    assert!(!index.remove(ElementId(1)));
    assert_eq!(index.query_point(&Point::new(7.0, 7.0)), vec![ElementId(2)]);

    index.clear();
    assert!(index.is_empty());
    assert!(index.query_point(&Point::new(7.0, 7.0)).is_empty());
}
