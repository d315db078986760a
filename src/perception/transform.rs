/// Detection-to-overlay coordinate transform.
///
/// Three ordered stages per box:
///
/// 1. Flip the vertical origin (detector boxes are bottom-left based).
/// 2. Place the top-left unit rect on the surface via a [`SurfaceMapper`].
/// 3. Re-normalize the mapped point rect against the surface bounds.
///
/// The transform is stateless and never fails. A degenerate surface drops
/// the box instead of producing a placeholder.
use crate::perception::traits::SurfaceMapper;
use crate::perception::types::{
    DisplayMappedBox, NormalizedDisplayRect, RawDetectionBox, SurfaceBounds, UnitRect,
};

/// Stage 1: bottom-left origin to top-left origin, still unit-normalized.
pub fn flip_to_top_left(raw: &RawDetectionBox) -> UnitRect {
    UnitRect {
        origin_x: raw.origin_x,
        origin_y: 1.0 - raw.origin_y - raw.height,
        width: raw.width,
        height: raw.height,
    }
}

/// Stage 3: surface points to surface-relative unit coordinates.
/// Returns `None` when `bounds` has no area.
pub fn normalize_to_surface(
    mapped: &DisplayMappedBox,
    bounds: SurfaceBounds,
) -> Option<NormalizedDisplayRect> {
    if bounds.is_degenerate() {
        return None;
    }
    Some(NormalizedDisplayRect {
        origin_x: mapped.origin_x / bounds.width,
        origin_y: mapped.origin_y / bounds.height,
        width: mapped.width / bounds.width,
        height: mapped.height / bounds.height,
    })
}

/// Run all three stages on a single box.
pub fn transform<M>(
    raw: &RawDetectionBox,
    bounds: SurfaceBounds,
    mapper: &M,
) -> Option<NormalizedDisplayRect>
where
    M: SurfaceMapper + ?Sized,
{
    let meta = flip_to_top_left(raw);
    let mapped = mapper.map_to_surface(meta);
    normalize_to_surface(&mapped, bounds)
}

/// Transform a whole detection batch, preserving input order.
pub fn transform_batch<M>(
    raws: &[RawDetectionBox],
    bounds: SurfaceBounds,
    mapper: &M,
) -> Vec<NormalizedDisplayRect>
where
    M: SurfaceMapper + ?Sized,
{
    if bounds.is_degenerate() && !raws.is_empty() {
        tracing::debug!(
            width = bounds.width,
            height = bounds.height,
            skipped = raws.len(),
            "degenerate surface, dropping batch"
        );
    }
    raws.iter()
        .filter_map(|raw| transform(raw, bounds, mapper))
        .collect()
}
