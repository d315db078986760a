/// Preview-gravity surface mappers.
///
/// These mirror how a camera preview layer lays its video out: stretched,
/// letterboxed (aspect fit) or cropped (aspect fill). The scale/offset math
/// is the same as a detector's letterbox preprocessing, run in reverse.
use crate::config::VideoGravity;
use crate::perception::traits::SurfaceMapper;
use crate::perception::types::{DisplayMappedBox, ImageSize, SurfaceBounds, UnitRect};

/// Everything needed to place an analyzed image onto the preview surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewGeometry {
    pub source: ImageSize,
    pub surface: SurfaceBounds,
    pub gravity: VideoGravity,
}

/// Displayed image rectangle inside the surface, in points. Offsets are
/// negative when the image is cropped.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    offset_x: f64,
    offset_y: f64,
    width: f64,
    height: f64,
}

impl PreviewGeometry {
    pub fn new(source: ImageSize, surface: SurfaceBounds, gravity: VideoGravity) -> Self {
        Self {
            source,
            surface,
            gravity,
        }
    }

    fn placement(&self) -> Placement {
        let (sw, sh) = (self.surface.width, self.surface.height);
        let stretch = Placement {
            offset_x: 0.0,
            offset_y: 0.0,
            width: sw,
            height: sh,
        };

        // Without a usable source aspect there is nothing to preserve.
        if self.source.is_empty() {
            return stretch;
        }
        let (iw, ih) = (self.source.width as f64, self.source.height as f64);

        let scale = match self.gravity {
            VideoGravity::Resize => return stretch,
            VideoGravity::ResizeAspect => (sw / iw).min(sh / ih),
            VideoGravity::ResizeAspectFill => (sw / iw).max(sh / ih),
        };
        let (dw, dh) = (iw * scale, ih * scale);
        Placement {
            offset_x: (sw - dw) / 2.0,
            offset_y: (sh - dh) / 2.0,
            width: dw,
            height: dh,
        }
    }
}

impl SurfaceMapper for PreviewGeometry {
    fn map_to_surface(&self, rect: UnitRect) -> DisplayMappedBox {
        let p = self.placement();
        DisplayMappedBox {
            origin_x: rect.origin_x * p.width + p.offset_x,
            origin_y: rect.origin_y * p.height + p.offset_y,
            width: rect.width * p.width,
            height: rect.height * p.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::transform::transform;
    use crate::perception::types::RawDetectionBox;

    const EPS: f64 = 1e-9;

    fn assert_box(actual: DisplayMappedBox, expected: [f64; 4]) {
        let got = [actual.origin_x, actual.origin_y, actual.width, actual.height];
        for (g, e) in got.iter().zip(expected) {
            assert!((g - e).abs() < EPS, "got {got:?}, expected {expected:?}");
        }
    }

    #[test]
    fn stretch_maps_unit_square_onto_surface() {
        let geo = PreviewGeometry::new(
            ImageSize::new(1920, 1080),
            SurfaceBounds::new(400.0, 400.0),
            VideoGravity::Resize,
        );
        let mapped = geo.map_to_surface(UnitRect::new(0.25, 0.5, 0.5, 0.25));
        assert_box(mapped, [100.0, 200.0, 200.0, 100.0]);
    }

    #[test]
    fn aspect_fill_crops_wide_source_horizontally() {
        // 16:9 into a square: height fills, width overflows by 400*(16/9) - 400.
        let geo = PreviewGeometry::new(
            ImageSize::new(1600, 900),
            SurfaceBounds::new(400.0, 400.0),
            VideoGravity::ResizeAspectFill,
        );
        let full = geo.map_to_surface(UnitRect::new(0.0, 0.0, 1.0, 1.0));
        let dw = 1600.0 * (400.0 / 900.0);
        assert_box(full, [(400.0 - dw) / 2.0, 0.0, dw, 400.0]);
        assert!(full.origin_x < 0.0);

        // A centred box stays centred.
        let centre = geo.map_to_surface(UnitRect::new(0.45, 0.45, 0.1, 0.1));
        let cx = centre.origin_x + centre.width / 2.0;
        let cy = centre.origin_y + centre.height / 2.0;
        assert!((cx - 200.0).abs() < EPS);
        assert!((cy - 200.0).abs() < EPS);
    }

    #[test]
    fn aspect_fit_letterboxes_wide_source() {
        let geo = PreviewGeometry::new(
            ImageSize::new(1600, 900),
            SurfaceBounds::new(400.0, 400.0),
            VideoGravity::ResizeAspect,
        );
        let full = geo.map_to_surface(UnitRect::new(0.0, 0.0, 1.0, 1.0));
        assert_box(full, [0.0, 100.0, 400.0, 225.0]);
    }

    #[test]
    fn empty_source_falls_back_to_stretch() {
        let geo = PreviewGeometry::new(
            ImageSize::new(0, 720),
            SurfaceBounds::new(200.0, 100.0),
            VideoGravity::ResizeAspectFill,
        );
        let mapped = geo.map_to_surface(UnitRect::new(0.5, 0.5, 0.5, 0.5));
        assert_box(mapped, [100.0, 50.0, 100.0, 50.0]);
    }

    #[test]
    fn matching_aspect_needs_no_crop() {
        let surface = SurfaceBounds::new(800.0, 450.0);
        let geo = PreviewGeometry::new(
            ImageSize::new(1280, 720),
            surface,
            VideoGravity::ResizeAspectFill,
        );
        let raw = RawDetectionBox::new(0.2, 0.3, 0.1, 0.1);
        let out = transform(&raw, surface, &geo).unwrap();
        assert!((out.origin_x - 0.2).abs() < EPS);
        assert!((out.origin_y - 0.6).abs() < EPS);
        assert!((out.width - 0.1).abs() < EPS);
        assert!((out.height - 0.1).abs() < EPS);
    }
}
