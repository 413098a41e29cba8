//! Status probe: the single read path every other component relies on.

use tracing::{debug, warn};

use crate::api::VolumeApi;
use crate::types::VolumeId;
use crate::volume::{VolumeState, VolumeStatus};

use super::VolumeLifecycle;

/// Result of a single status read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProbeResult {
    /// The platform returned the volume.
    Observed(VolumeState),
    /// The platform answered 404: the volume no longer exists.
    Gone,
    /// The read itself failed (transport or decoding).
    Unavailable,
}

impl ProbeResult {
    /// Returns the observed state, if any.
    #[must_use]
    pub const fn state(&self) -> Option<&VolumeState> {
        match self {
            Self::Observed(state) => Some(state),
            Self::Gone | Self::Unavailable => None,
        }
    }
}

impl<A: VolumeApi> VolumeLifecycle<A> {
    /// Reads the current state of a volume. Never fails: inability to observe
    /// is reported as [`ProbeResult::Unavailable`].
    pub async fn check_status(&self, volume_id: &VolumeId) -> ProbeResult {
        match self.api.get_volume(volume_id).await {
            Ok(volume) => {
                if let VolumeStatus::Other(raw) = &volume.status {
                    debug!(%volume_id, status = %raw, "volume reported an unmodelled status");
                }
                ProbeResult::Observed(volume.into_state())
            }
            Err(err) if err.is_not_found() => ProbeResult::Gone,
            Err(err) => {
                warn!(%volume_id, error = %err, "volume status probe failed");
                ProbeResult::Unavailable
            }
        }
    }
}
