use crate::{
    foundation::core::{OverlayId, Point},
    scene::store::OverlayScene,
};

/// Draw order re-ranked for one pointer position: hits nearest-first, then everything else.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitList {
    ordered: Vec<OverlayId>,
    hit_count: usize,
}

impl HitList {
    /// List for a pass with no pointer target: the draw order, no hits.
    pub fn unranked(draw_order: &[OverlayId]) -> Self {
        Self {
            ordered: draw_order.to_vec(),
            hit_count: 0,
        }
    }

    pub fn ordered(&self) -> &[OverlayId] {
        &self.ordered
    }

    pub fn hits(&self) -> &[OverlayId] {
        &self.ordered[..self.hit_count]
    }

    /// Drawn overlays that were not hit, in draw order.
    pub fn rest(&self) -> &[OverlayId] {
        &self.ordered[self.hit_count..]
    }

    pub fn hit_count(&self) -> usize {
        self.hit_count
    }

    /// The pointer target, when anything was hit.
    pub fn topmost(&self) -> Option<&OverlayId> {
        self.hits().first()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// Rank `draw_order` against `pointer`.
///
/// Hits sort by ascending [`distance_to`](crate::Overlay::distance_to); on equal distance the
/// overlay drawn later wins. Overlays still waiting for their mask are not drawn, so they are
/// never hit. Static passes and passes without a pointer skip hit-testing.
pub fn resolve_hits(
    scene: &OverlayScene,
    draw_order: &[OverlayId],
    pointer: Option<Point>,
    static_mode: bool,
) -> HitList {
    let Some(point) = pointer.filter(|_| !static_mode) else {
        return HitList::unranked(draw_order);
    };

    let mut hits: Vec<(f64, usize)> = Vec::new();
    let mut rest = Vec::new();
    for (draw_idx, id) in draw_order.iter().enumerate() {
        match scene.get(id) {
            Some(o) if !o.needs_resource() && o.hit_test(point) => {
                hits.push((o.distance_to(point), draw_idx))
            }
            _ => rest.push(id.clone()),
        }
    }
    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(b.1.cmp(&a.1)));

    let hit_count = hits.len();
    let mut ordered: Vec<OverlayId> = hits
        .into_iter()
        .map(|(_, idx)| draw_order[idx].clone())
        .collect();
    ordered.extend(rest);
    HitList { ordered, hit_count }
}

#[cfg(test)]
#[path = "../../tests/unit/order/hit.rs"]
mod tests;
