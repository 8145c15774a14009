#[path = "core/scene.rs"]
mod scene;
#[path = "core/selection.rs"]
mod selection;
#[path = "core/spatial_index.rs"]
mod spatial_index;
#[path = "core/viewport.rs"]
mod viewport;
