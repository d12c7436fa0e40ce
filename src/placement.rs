//! Mapping from on-screen preview coordinates to PDF page coordinates.
//!
//! A page preview is drawn with its origin at the top-left and y growing
//! downward. PDF user space has its origin at the bottom-left and y growing
//! upward, so the vertical axis is flipped after scaling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// A click on a rendered page, relative to the top-left of its container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenClick {
    pub x: f32,
    pub y: f32,
    pub container_width: f32,
    pub container_height: f32,
}

/// Page dimensions in PDF user-space units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativePageSize {
    pub width: f32,
    pub height: f32,
}

/// A point in PDF user space, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativeCoordinate {
    pub x: f32,
    pub y: f32,
}

impl ScreenClick {
    /// Horizontal and vertical factors from preview pixels to native units
    pub fn scale_factors(&self, native: NativePageSize) -> Result<(f32, f32), PlacementError> {
        check_dimensions("container", self.container_width, self.container_height)?;
        check_dimensions("page", native.width, native.height)?;

        Ok((
            native.width / self.container_width,
            native.height / self.container_height,
        ))
    }
}

fn check_dimensions(what: &str, width: f32, height: f32) -> Result<(), PlacementError> {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(PlacementError::InvalidGeometry(format!(
            "{} size must be positive, got {}x{}",
            what, width, height
        )))
    }
}

/// Convert a preview click into the page's native coordinate space.
///
/// Each axis is scaled on its own, so a preview that was stretched
/// non-uniformly still lands on the right spot. No rounding is applied.
pub fn to_native_coordinate(
    click: &ScreenClick,
    native: NativePageSize,
) -> Result<NativeCoordinate, PlacementError> {
    if !click.x.is_finite() || !click.y.is_finite() {
        return Err(PlacementError::InvalidGeometry(format!(
            "click position must be finite, got ({}, {})",
            click.x, click.y
        )));
    }

    let (scale_x, scale_y) = click.scale_factors(native)?;
    let coordinate = NativeCoordinate {
        x: click.x * scale_x,
        y: native.height - click.y * scale_y,
    };

    tracing::debug!(
        screen_x = click.x,
        screen_y = click.y,
        native_x = coordinate.x,
        native_y = coordinate.y,
        "mapped click to page coordinates"
    );
    Ok(coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(x: f32, y: f32, w: f32, h: f32) -> ScreenClick {
        ScreenClick {
            x,
            y,
            container_width: w,
            container_height: h,
        }
    }

    const LETTER: NativePageSize = NativePageSize {
        width: 400.0,
        height: 600.0,
    };

    #[test]
    fn test_scales_and_flips() {
        let c = to_native_coordinate(&click(100.0, 50.0, 200.0, 300.0), LETTER).unwrap();
        assert_eq!(c, NativeCoordinate { x: 200.0, y: 500.0 });
    }

    #[test]
    fn test_top_left_maps_to_page_top() {
        let c = to_native_coordinate(&click(0.0, 0.0, 200.0, 300.0), LETTER).unwrap();
        assert_eq!(c, NativeCoordinate { x: 0.0, y: 600.0 });
    }

    #[test]
    fn test_bottom_left_maps_to_origin() {
        let c = to_native_coordinate(&click(0.0, 300.0, 200.0, 300.0), LETTER).unwrap();
        assert_eq!(c, NativeCoordinate { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_bottom_right_maps_to_page_corner() {
        let c = to_native_coordinate(&click(200.0, 300.0, 200.0, 300.0), LETTER).unwrap();
        assert_eq!(c, NativeCoordinate { x: 400.0, y: 0.0 });
    }

    #[test]
    fn test_stretched_preview_uses_per_axis_scale() {
        // Preview squashed to half height: 400x150 for a 400x600 page.
        let c = to_native_coordinate(&click(100.0, 75.0, 400.0, 150.0), LETTER).unwrap();
        assert_eq!(c, NativeCoordinate { x: 100.0, y: 300.0 });
    }

    #[test]
    fn test_scale_factors() {
        let factors = click(0.0, 0.0, 200.0, 300.0).scale_factors(LETTER).unwrap();
        assert_eq!(factors, (2.0, 2.0));
    }

    #[test]
    fn test_zero_width_container_rejected() {
        let err = to_native_coordinate(&click(10.0, 10.0, 0.0, 300.0), LETTER).unwrap_err();
        assert!(matches!(err, PlacementError::InvalidGeometry(_)));
    }

    #[test]
    fn test_negative_height_container_rejected() {
        assert!(to_native_coordinate(&click(10.0, 10.0, 200.0, -1.0), LETTER).is_err());
    }

    #[test]
    fn test_degenerate_page_rejected() {
        let page = NativePageSize {
            width: 0.0,
            height: 600.0,
        };
        assert!(to_native_coordinate(&click(10.0, 10.0, 200.0, 300.0), page).is_err());
    }

    #[test]
    fn test_nan_click_rejected() {
        assert!(to_native_coordinate(&click(f32::NAN, 10.0, 200.0, 300.0), LETTER).is_err());
    }
}
