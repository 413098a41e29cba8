//! Unit tests for the volume lifecycle manager.
//!
//! All tests run on a paused Tokio clock, so budgets and settle delays
//! advance instantly while `Instant` arithmetic stays exact.

use crate::api::ApiError;
use crate::lifecycle::{LifecycleTimings, VolumeLifecycle};
use crate::test_support::ScriptedVolumeApi;
use crate::types::{InstanceId, VolumeId};

fn lifecycle(api: &ScriptedVolumeApi) -> VolumeLifecycle<ScriptedVolumeApi> {
    VolumeLifecycle::new(api.clone(), LifecycleTimings::default())
}

fn volume_id(raw: &str) -> VolumeId {
    VolumeId::from(raw)
}

fn instance_id(raw: &str) -> InstanceId {
    InstanceId::from(raw)
}

fn conflict() -> ApiError {
    ApiError::Conflict {
        message: String::from("volume is busy"),
    }
}

fn forbidden() -> ApiError {
    ApiError::Forbidden {
        message: String::from("policy does not allow this action"),
    }
}

fn transport() -> ApiError {
    ApiError::Transport {
        message: String::from("connection reset"),
    }
}

mod wait;
