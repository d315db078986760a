use crate::perception::types::{DisplayMappedBox, UnitRect};

/// Strategy that places a top-left, unit-normalized image rectangle onto the
/// destination surface, returning point coordinates local to that surface.
///
/// Implementations own the scaling policy (crop, letterbox, stretch). Callers
/// only rely on the units: unit rect in, surface points out.
pub trait SurfaceMapper {
    fn map_to_surface(&self, rect: UnitRect) -> DisplayMappedBox;
}

impl<F> SurfaceMapper for F
where
    F: Fn(UnitRect) -> DisplayMappedBox,
{
    fn map_to_surface(&self, rect: UnitRect) -> DisplayMappedBox {
        self(rect)
    }
}
