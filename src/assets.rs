//! Asset readiness and fallbacks
//!
//! Loading itself belongs to the host (GLTF, textures, sound files). The
//! core only tracks which assets are still pending and, when a load fails,
//! swaps in a deterministic stand-in so play never blocks on a missing file.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Model,
    Texture,
    Sound,
}

impl AssetKind {
    /// Guess from the file extension
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "gltf" | "glb" => Some(AssetKind::Model),
            "png" | "jpg" | "jpeg" | "webp" => Some(AssetKind::Texture),
            "mp3" | "ogg" | "wav" => Some(AssetKind::Sound),
            _ => None,
        }
    }

    pub fn fallback(&self) -> Fallback {
        match self {
            AssetKind::Model => Fallback::BoxGeometry,
            AssetKind::Texture => Fallback::Checkerboard,
            AssetKind::Sound => Fallback::SilentAudio,
        }
    }
}

/// Deterministic stand-in for a failed asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Plain box sized to the character's collision body
    BoxGeometry,
    SilentAudio,
    Checkerboard,
}

/// Where the player's renderable came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Loaded(String),
    Fallback(Fallback),
}

/// Map a model load result to the source the player will use
pub fn resolve_model(model_ref: &str, result: Result<(), AssetError>) -> ModelSource {
    match result {
        Ok(()) => {
            log::info!("Model ready: {}", model_ref);
            ModelSource::Loaded(model_ref.to_string())
        }
        Err(e) => {
            log::warn!("{}; using box geometry", e);
            ModelSource::Fallback(Fallback::BoxGeometry)
        }
    }
}

/// Outcome of one tracked asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStatus {
    Pending,
    Ready,
    Fallback(Fallback),
}

/// Pending/complete bookkeeping for every asset the host was asked to load
#[derive(Debug, Clone, Default)]
pub struct AssetTracker {
    assets: BTreeMap<String, (AssetKind, AssetStatus)>,
}

impl AssetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, path: &str, kind: AssetKind) {
        self.assets
            .entry(path.to_string())
            .or_insert((kind, AssetStatus::Pending));
    }

    /// Record a load result; failures resolve to the kind's fallback
    pub fn complete(&mut self, path: &str, result: Result<(), AssetError>) -> AssetStatus {
        let kind = match self.assets.get(path) {
            Some((kind, _)) => *kind,
            None => {
                let kind = AssetKind::from_path(path).unwrap_or(AssetKind::Texture);
                log::debug!("Untracked asset completed: {}", path);
                kind
            }
        };
        let status = match result {
            Ok(()) => AssetStatus::Ready,
            Err(e) => {
                let fallback = kind.fallback();
                log::warn!("{}; falling back to {:?}", e, fallback);
                AssetStatus::Fallback(fallback)
            }
        };
        self.assets.insert(path.to_string(), (kind, status.clone()));
        status
    }

    pub fn status(&self, path: &str) -> Option<&AssetStatus> {
        self.assets.get(path).map(|(_, status)| status)
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.assets
            .iter()
            .filter(|(_, (_, status))| *status == AssetStatus::Pending)
            .map(|(path, _)| path.as_str())
    }

    /// Everything requested has resolved, one way or the other
    pub fn is_ready(&self) -> bool {
        self.pending().next().is_none()
    }
}

/// RGBA checkerboard texture (`size` x `size`, squares of `cell` pixels)
pub fn checkerboard_rgba(size: usize, cell: usize) -> Vec<u8> {
    const LIGHT: [u8; 4] = [0xcc, 0xcc, 0xcc, 0xff];
    const DARK: [u8; 4] = [0x44, 0x44, 0x44, 0xff];
    let cell = cell.max(1);
    let mut pixels = Vec::with_capacity(size * size * 4);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / cell) + (y / cell)) % 2 == 0;
            pixels.extend_from_slice(if light { &LIGHT } else { &DARK });
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(AssetKind::from_path("models/nox.gltf"), Some(AssetKind::Model));
        assert_eq!(AssetKind::from_path("sounds/coin.MP3"), Some(AssetKind::Sound));
        assert_eq!(AssetKind::from_path("textures/track.png"), Some(AssetKind::Texture));
        assert_eq!(AssetKind::from_path("README"), None);
    }

    #[test]
    fn test_tracker_readiness() {
        let mut tracker = AssetTracker::new();
        tracker.request("models/dax/dax.gltf", AssetKind::Model);
        tracker.request("sounds/coin.mp3", AssetKind::Sound);
        assert!(!tracker.is_ready());

        assert_eq!(tracker.complete("models/dax/dax.gltf", Ok(())), AssetStatus::Ready);
        let status = tracker.complete(
            "sounds/coin.mp3",
            Err(AssetError::Decode {
                path: "sounds/coin.mp3".into(),
                reason: "truncated".into(),
            }),
        );
        assert_eq!(status, AssetStatus::Fallback(Fallback::SilentAudio));
        assert!(tracker.is_ready());
    }

    #[test]
    fn test_checkerboard_alternates() {
        let px = checkerboard_rgba(4, 2);
        assert_eq!(px.len(), 4 * 4 * 4);
        assert_eq!(&px[0..4], &[0xcc, 0xcc, 0xcc, 0xff]);
        // Pixel (2, 0) starts the next cell
        assert_eq!(&px[8..12], &[0x44, 0x44, 0x44, 0xff]);
        // Pixel (2, 2) is light again
        let idx = (2 * 4 + 2) * 4;
        assert_eq!(&px[idx..idx + 4], &[0xcc, 0xcc, 0xcc, 0xff]);
    }
}
