//! Coordinate transformation between logical and device space.
//!
//! Logical coordinates are model units, independent of pan and zoom. Device
//! coordinates are pixels of one viewport with (0,0) at its top-left corner.
//! Both spaces have +Y pointing down, so no axis flip is involved.
//!
//! ```text
//! device  = (logical - origin) * scale * dpi_scale
//! logical = device / (scale * dpi_scale) + origin
//! ```

use std::fmt;

use rxnview_core::{Bounds, CanvasError, Point, ViewportConfig};

const UNBOUNDED_MIN_SCALE: f64 = 1e-6;
const UNBOUNDED_MAX_SCALE: f64 = 1e6;

/// Pan/zoom state of a single viewport.
///
/// One instance backs the main canvas and another backs the minimap.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSpace {
    origin: Point,
    scale: f64,
    dpi_scale: f64,
    width: f64,
    height: f64,
    min_scale: f64,
    max_scale: f64,
    zoom_step: f64,
    pan_limits: Option<Bounds>,
}

impl CoordinateSpace {
    /// Creates a space for a viewport of the given device size, at scale 1.
    pub fn new(width: f64, height: f64) -> Self {
        let defaults = ViewportConfig::default();
        Self {
            origin: Point::zero(),
            scale: 1.0,
            dpi_scale: 1.0,
            width: width.max(0.0),
            height: height.max(0.0),
            min_scale: defaults.min_scale,
            max_scale: defaults.max_scale,
            zoom_step: defaults.zoom_step,
            pan_limits: None,
        }
    }

    /// Creates a space using the zoom range, zoom step and pan limits of `config`.
    ///
    /// Each value goes through its setter, so a config that skipped
    /// `CanvasConfig::validate` is rejected here instead of panicking later.
    pub fn from_config(
        config: &ViewportConfig,
        width: f64,
        height: f64,
    ) -> Result<Self, CanvasError> {
        let mut space = Self::new(width, height);
        space.set_scale_limits(config.min_scale, config.max_scale)?;
        space.set_zoom_step(config.zoom_step)?;
        space.set_pan_limits(config.pan_limits)?;
        space.reset();
        Ok(space)
    }

    /// A space whose zoom range is wide enough for any fit, without pan limits.
    pub(crate) fn unbounded(width: f64, height: f64) -> Self {
        Self {
            min_scale: UNBOUNDED_MIN_SCALE,
            max_scale: UNBOUNDED_MAX_SCALE,
            ..Self::new(width, height)
        }
    }

    /// Logical point shown at the device origin.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Zoom factor, device units per logical unit before DPI scaling.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dpi_scale(&self) -> f64 {
        self.dpi_scale
    }

    /// Device pixels per logical unit.
    pub fn effective_scale(&self) -> f64 {
        self.scale * self.dpi_scale
    }

    pub fn viewport_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f64 {
        self.max_scale
    }

    pub fn zoom_step(&self) -> f64 {
        self.zoom_step
    }

    pub fn pan_limits(&self) -> Option<Bounds> {
        self.pan_limits
    }

    /// Replaces the allowed zoom range and re-clamps the current scale.
    pub fn set_scale_limits(&mut self, min: f64, max: f64) -> Result<(), CanvasError> {
        if !(min > 0.0 && min.is_finite()) || !(max >= min && max.is_finite()) {
            return Err(CanvasError::OutOfRange {
                what: "scale limits".to_string(),
                value: min,
                min: f64::MIN_POSITIVE,
                max,
            });
        }
        self.min_scale = min;
        self.max_scale = max;
        self.scale = self.scale.clamp(min, max);
        self.clamp_origin();
        Ok(())
    }

    pub fn set_zoom_step(&mut self, step: f64) -> Result<(), CanvasError> {
        if !(step > 1.0 && step.is_finite()) {
            return Err(CanvasError::OutOfRange {
                what: "zoom step".to_string(),
                value: step,
                min: 1.0,
                max: f64::MAX,
            });
        }
        self.zoom_step = step;
        Ok(())
    }

    /// Restricts panning to `limits`. The bounds must be finite with non-zero area.
    pub fn set_pan_limits(&mut self, limits: Option<Bounds>) -> Result<(), CanvasError> {
        if let Some(b) = &limits {
            let finite = [b.min_x, b.min_y, b.max_x, b.max_y]
                .iter()
                .all(|v| v.is_finite());
            if !finite || b.is_degenerate() {
                return Err(CanvasError::DegenerateGeometry {
                    reason: format!("pan limits {:?} need finite corners and non-zero area", b),
                });
            }
        }
        self.pan_limits = limits;
        self.clamp_origin();
        Ok(())
    }

    /// Sets the viewport size (typically called when the window resizes).
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.clamp_origin();
    }

    /// Sets the display's DPI factor. Non-positive values are rejected.
    pub fn set_dpi_scale(&mut self, dpi_scale: f64) -> Result<(), CanvasError> {
        if !(dpi_scale > 0.0 && dpi_scale.is_finite()) {
            return Err(CanvasError::OutOfRange {
                what: "dpi scale".to_string(),
                value: dpi_scale,
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
            });
        }
        self.dpi_scale = dpi_scale;
        self.clamp_origin();
        Ok(())
    }

    /// Converts a logical point to device coordinates.
    pub fn to_device(&self, logical: Point) -> Point {
        (logical - self.origin) * self.effective_scale()
    }

    /// Converts a device point to logical coordinates.
    pub fn to_logical(&self, device: Point) -> Point {
        device / self.effective_scale() + self.origin
    }

    /// Converts a device distance to a logical distance.
    pub fn length_to_logical(&self, device_length: f64) -> f64 {
        device_length / self.effective_scale()
    }

    pub fn length_to_device(&self, logical_length: f64) -> f64 {
        logical_length * self.effective_scale()
    }

    pub fn bounds_to_device(&self, logical: &Bounds) -> Bounds {
        Bounds::from_points(
            self.to_device(logical.origin()),
            self.to_device(logical.far_corner()),
        )
    }

    pub fn bounds_to_logical(&self, device: &Bounds) -> Bounds {
        Bounds::from_points(
            self.to_logical(device.origin()),
            self.to_logical(device.far_corner()),
        )
    }

    /// Logical region currently visible in the viewport.
    pub fn visible_bounds(&self) -> Bounds {
        self.bounds_to_logical(&Bounds::new(0.0, 0.0, self.width, self.height))
    }

    /// Pans so the content follows a pointer that moved by `delta_device`.
    pub fn pan(&mut self, delta_device: Point) {
        if !delta_device.is_finite() {
            return;
        }
        self.origin -= delta_device / self.effective_scale();
        self.clamp_origin();
    }

    /// Places `origin` at the device top-left corner, subject to pan limits.
    pub fn set_origin(&mut self, origin: Point) {
        if !origin.is_finite() {
            return;
        }
        self.origin = origin;
        self.clamp_origin();
    }

    /// Multiplies the scale by `factor`, keeping `anchor_device` fixed.
    ///
    /// The resulting scale is clamped to the configured range. Returns
    /// whether the scale changed. Non-finite or non-positive factors are
    /// ignored.
    pub fn zoom(&mut self, factor: f64, anchor_device: Point) -> bool {
        if !(factor > 0.0 && factor.is_finite()) {
            return false;
        }
        self.set_scale(self.scale * factor, anchor_device)
    }

    /// Sets the scale directly, keeping `anchor_device` fixed.
    pub fn set_scale(&mut self, scale: f64, anchor_device: Point) -> bool {
        if !scale.is_finite() || !anchor_device.is_finite() {
            return false;
        }
        let new_scale = scale.clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() <= f64::EPSILON * self.scale {
            return false;
        }

        let anchor_logical = self.to_logical(anchor_device);
        self.scale = new_scale;
        // Solve to_device(anchor_logical) == anchor_device for the origin.
        self.origin = anchor_logical - anchor_device / self.effective_scale();
        self.clamp_origin();
        true
    }

    /// Zooms in by one configured step at the anchor.
    pub fn zoom_in(&mut self, anchor_device: Point) -> bool {
        self.zoom(self.zoom_step, anchor_device)
    }

    /// Zooms out by one configured step at the anchor.
    pub fn zoom_out(&mut self, anchor_device: Point) -> bool {
        self.zoom(1.0 / self.zoom_step, anchor_device)
    }

    /// Device point at the center of the viewport.
    pub fn device_center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Centers the viewport on a logical point.
    pub fn center_on(&mut self, logical: Point) {
        self.set_origin(logical - self.device_center() / self.effective_scale());
    }

    /// Fits `bounds` into the viewport with `padding` device pixels per side,
    /// then centers it. Degenerate bounds only center the view.
    pub fn fit_to_bounds(&mut self, bounds: &Bounds, padding: f64) -> bool {
        if !bounds.is_finite() {
            return false;
        }
        if bounds.is_degenerate() {
            self.center_on(bounds.center());
            return true;
        }

        let avail_w = (self.width - padding * 2.0).max(1.0);
        let avail_h = (self.height - padding * 2.0).max(1.0);
        let fit = (avail_w / bounds.width()).min(avail_h / bounds.height()) / self.dpi_scale;

        self.scale = fit.clamp(self.min_scale, self.max_scale);
        self.center_on(bounds.center());
        true
    }

    /// Resets the viewport to scale 1 with the logical origin at the top-left.
    pub fn reset(&mut self) {
        self.scale = 1.0_f64.clamp(self.min_scale, self.max_scale);
        self.origin = Point::zero();
        self.clamp_origin();
    }

    fn clamp_origin(&mut self) {
        let Some(limits) = self.pan_limits else {
            return;
        };
        let eff = self.effective_scale();
        let vis_w = self.width / eff;
        let vis_h = self.height / eff;

        let axis = |origin: f64, lo: f64, hi: f64, visible: f64| -> f64 {
            if visible >= hi - lo {
                // The whole range fits; keep it centered.
                (lo + hi) / 2.0 - visible / 2.0
            } else {
                origin.clamp(lo, hi - visible)
            }
        };

        self.origin = Point::new(
            axis(self.origin.x, limits.min_x, limits.max_x, vis_w),
            axis(self.origin.y, limits.min_y, limits.max_y, vis_h),
        );
    }
}

impl fmt::Display for CoordinateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zoom: {:.2}x | Origin: ({:.1}, {:.1})",
            self.scale, self.origin.x, self.origin.y
        )
    }
}

impl Default for CoordinateSpace {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    #[test]
    fn test_roundtrip_with_dpi() {
        let mut space = CoordinateSpace::new(640.0, 480.0);
        space.set_dpi_scale(2.0).unwrap();
        space.set_origin(Point::new(-30.0, 12.5));
        space.zoom(1.7, Point::new(10.0, 10.0));

        let p = Point::new(123.4, -56.7);
        assert!(close(space.to_logical(space.to_device(p)), p));
    }

    #[test]
    fn test_zoom_anchor_fixed() {
        let mut space = CoordinateSpace::new(800.0, 600.0);
        space.set_scale(2.0, Point::zero());
        let anchor = Point::new(100.0, 100.0);
        assert!(close(space.to_logical(anchor), Point::new(50.0, 50.0)));

        assert!(space.zoom(2.0, anchor));
        assert!((space.scale() - 4.0).abs() < EPS);
        assert!(close(space.to_logical(anchor), Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_zoom_clamps_silently() {
        let mut space = CoordinateSpace::new(800.0, 600.0);
        space.zoom(1000.0, Point::zero());
        assert_eq!(space.scale(), space.max_scale());
        // Already at the limit: nothing changes.
        assert!(!space.zoom(2.0, Point::zero()));

        space.zoom(1e-9, Point::zero());
        assert_eq!(space.scale(), space.min_scale());

        assert!(!space.zoom(-1.0, Point::zero()));
        assert!(!space.zoom(f64::NAN, Point::zero()));
    }

    #[test]
    fn test_pan_moves_content_with_pointer() {
        let mut space = CoordinateSpace::new(800.0, 600.0);
        space.set_scale(2.0, Point::zero());
        let p = Point::new(10.0, 10.0);
        let before = space.to_device(p);
        space.pan(Point::new(30.0, -20.0));
        let after = space.to_device(p);
        assert!(close(after - before, Point::new(30.0, -20.0)));
    }

    #[test]
    fn test_pan_limits_clamp_origin() {
        let mut space = CoordinateSpace::new(100.0, 100.0);
        space
            .set_pan_limits(Some(Bounds::new(0.0, 0.0, 1000.0, 620.0)))
            .unwrap();
        space.pan(Point::new(500.0, 500.0));
        assert!(close(space.origin(), Point::zero()));

        space.pan(Point::new(-5000.0, -5000.0));
        assert!(close(space.origin(), Point::new(900.0, 520.0)));
    }

    #[test]
    fn test_fit_to_bounds_centers_content() {
        let mut space = CoordinateSpace::new(400.0, 200.0);
        let content = Bounds::new(0.0, 0.0, 100.0, 100.0);
        space.fit_to_bounds(&content, 0.0);
        assert!((space.scale() - 2.0).abs() < EPS);
        assert!(close(space.to_device(content.center()), Point::new(200.0, 100.0)));
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let mut space = CoordinateSpace::default();
        assert!(matches!(
            space.set_scale_limits(0.0, 2.0),
            Err(CanvasError::OutOfRange { .. })
        ));
        assert!(space.set_scale_limits(3.0, 2.0).is_err());
        assert!(space.set_dpi_scale(0.0).is_err());
        assert!(space.set_scale_limits(0.5, 2.0).is_ok());
    }

    #[test]
    fn test_non_finite_pan_limits_rejected() {
        let mut space = CoordinateSpace::new(100.0, 100.0);
        let nan = Bounds {
            min_x: f64::NAN,
            min_y: 0.0,
            max_x: 500.0,
            max_y: 500.0,
        };
        assert!(matches!(
            space.set_pan_limits(Some(nan)),
            Err(CanvasError::DegenerateGeometry { .. })
        ));
        assert!(space.set_pan_limits(Some(Bounds::new(0.0, 0.0, 0.0, 10.0))).is_err());
        assert_eq!(space.pan_limits(), None);

        // Panning still works after the rejected calls.
        space.pan(Point::new(10.0, 0.0));
        assert!(close(space.origin(), Point::new(-10.0, 0.0)));
    }

    #[test]
    fn test_from_config_rejects_unvalidated_values() {
        let mut config = ViewportConfig::default();
        config.max_scale = f64::NAN;
        assert!(CoordinateSpace::from_config(&config, 800.0, 600.0).is_err());

        let mut config = ViewportConfig::default();
        config.zoom_step = 1.0;
        assert!(CoordinateSpace::from_config(&config, 800.0, 600.0).is_err());

        let mut config = ViewportConfig::default();
        config.min_scale = 2.0;
        config.max_scale = 4.0;
        let space = CoordinateSpace::from_config(&config, 800.0, 600.0).unwrap();
        assert_eq!(space.scale(), 2.0);
    }

    #[test]
    fn test_visible_bounds() {
        let mut space = CoordinateSpace::new(200.0, 100.0);
        space.set_scale(2.0, Point::zero());
        space.set_origin(Point::new(10.0, 20.0));
        assert_eq!(space.visible_bounds(), Bounds::new(10.0, 20.0, 110.0, 70.0));
    }
}
