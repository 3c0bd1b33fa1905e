use crate::foundation::error::{VeneerError, VeneerResult};

/// Per-overlay resource/draw progress.
///
/// Moves strictly one step forward at a time; [`RenderStatus::reset`] is the only way back.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
    /// Registered, no resource fetched yet.
    #[default]
    Pending,
    /// Required resources are loaded.
    Decoded,
    /// Selected for the current draw pass and being rasterized.
    Painting,
    /// Drawing completed at least once.
    Painted,
}

impl RenderStatus {
    /// The only state reachable from `self` without a reset.
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Decoded),
            Self::Decoded => Some(Self::Painting),
            Self::Painting => Some(Self::Painted),
            Self::Painted => None,
        }
    }

    /// Step to `next`, rejecting skips and backward moves.
    pub fn advance(&mut self, next: Self) -> VeneerResult<()> {
        if self.successor() != Some(next) {
            return Err(VeneerError::scene(format!(
                "illegal render status transition {self:?} -> {next:?}"
            )));
        }
        *self = next;
        Ok(())
    }

    /// Explicit reset after a resource reload request.
    pub fn reset(&mut self) {
        *self = Self::Pending;
    }

    /// Whether an overlay in this state may emit draw commands.
    pub fn is_drawable(self) -> bool {
        self >= Self::Painting
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Decoded => "decoded",
            Self::Painting => "painting",
            Self::Painted => "painted",
        }
    }
}
