// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration loaded from environment variables.

/// Inspector configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Frames per second used when a document authors none.
    pub fallback_fps: f64,
    /// Playback speed a freshly opened document starts with.
    pub default_playback_speed: f64,
    /// Whether variant selections are written to the document or kept for the session.
    pub persist_variant_selection: bool,
    /// Directory (under the asset root) imported resources are copied into.
    pub asset_dir_name: String,
    /// `tracing-subscriber` filter directive.
    pub log_filter: String,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            fallback_fps: std::env::var("USDA_LITE_FALLBACK_FPS")
                .unwrap_or_else(|_| "24".into())
                .parse()
                .unwrap_or(24.0),
            default_playback_speed: std::env::var("USDA_LITE_PLAYBACK_SPEED")
                .unwrap_or_else(|_| "1.0".into())
                .parse()
                .unwrap_or(1.0),
            persist_variant_selection: std::env::var("USDA_LITE_PERSIST_VARIANTS")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            asset_dir_name: std::env::var("USDA_LITE_ASSET_DIR")
                .unwrap_or_else(|_| "Assets".into()),
            log_filter: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,usda_lite_engine=debug".into()),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_fps: 24.0,
            default_playback_speed: 1.0,
            persist_variant_selection: true,
            asset_dir_name: "Assets".into(),
            log_filter: "info,usda_lite_engine=debug".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.fallback_fps, 24.0);
        assert_eq!(config.default_playback_speed, 1.0);
        assert!(config.persist_variant_selection);
        assert_eq!(config.asset_dir_name, "Assets");
    }
}
