//! Sound playback contract.
//!
//! The simulation never plays audio itself. It writes fire-and-forget
//! `PlaySound` messages; whichever audio backend the host app installs reads
//! them.

use std::sync::Arc;

use bevy::prelude::*;

#[derive(Message, Clone, Debug, PartialEq)]
pub struct PlaySound {
    pub clip: Arc<str>,
    /// Seconds before playback starts.
    pub delay: f32,
    /// Pitch is picked uniformly in `1 ± pitch_variance`.
    pub pitch_variance: f32,
    /// 0 = fully 2D, 1 = fully positional.
    pub spatial_blend: f32,
}

impl PlaySound {
    pub fn flat(clip: Arc<str>, pitch_variance: f32) -> Self {
        Self { clip, delay: 0.0, pitch_variance, spatial_blend: 0.0 }
    }
}
