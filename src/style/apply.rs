//! Style application: validate, resolve the sprite, compile, install.
//!
//! Steps run strictly in sequence within one call. The only suspension
//! points are the sprite fetches. The target layer is touched once, at the
//! end, and only when every step succeeded.

use std::sync::Arc;

use crate::error::StyleResult;
use crate::fetch::{FileFetcher, ResourceFetcher};
use crate::layer::StyleTarget;
use crate::style::compiler::{default_resolutions, CompiledStyle};
use crate::style::parser::{validate_style, StyleInput};
use crate::style::sprite::SpriteResolver;

/// Progress of one style application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyState {
    Idle,
    Validating,
    ResolvingSprite,
    Compiling,
    Installed,
    Failed,
}

impl ApplyState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplyState::Installed | ApplyState::Failed)
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOptions {
    /// Output device pixel ratio; selects the sprite density variant.
    pub pixel_ratio: f64,
    /// Resolution of each zoom level, largest first.
    pub resolutions: Vec<f64>,
    /// Token appended to `mapbox://` sprite URLs.
    pub access_token: Option<String>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            resolutions: default_resolutions(),
            access_token: None,
        }
    }
}

impl ApplyOptions {
    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    pub fn with_resolutions(mut self, resolutions: Vec<f64>) -> Self {
        self.resolutions = resolutions;
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }
}

/// Applies GL styles to layers, fetching sprites through `fetcher`.
///
/// Concurrent applications against the same layer are not serialized:
/// each installs its function when it finishes, so the last to finish wins.
#[derive(Clone)]
pub struct StyleApplier {
    fetcher: Arc<dyn ResourceFetcher>,
    options: ApplyOptions,
}

impl StyleApplier {
    pub fn new(fetcher: impl ResourceFetcher + 'static) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            options: ApplyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ApplyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ApplyOptions {
        &self.options
    }

    /// Validate `style`, load its sprite, compile it for `source_name` and
    /// install the result on `layer`.
    ///
    /// Relative sprite references resolve against `base_directory`. On
    /// failure the layer keeps whatever function it had.
    pub async fn apply_style(
        &self,
        layer: &dyn StyleTarget,
        style: impl Into<StyleInput>,
        source_name: &str,
        base_directory: Option<&str>,
    ) -> StyleResult<()> {
        let mut state = ApplyState::Idle;
        let result = self
            .run(layer, style.into(), source_name, base_directory, &mut state)
            .await;
        match &result {
            Ok(()) => log::info!(
                "Installed style for source '{}' on {}",
                source_name,
                layer.kind()
            ),
            Err(e) => {
                transition(&mut state, ApplyState::Failed);
                log::warn!(
                    "[{}] applying style for source '{}' failed: {}",
                    e.category(),
                    source_name,
                    e
                );
            }
        }
        result
    }

    /// Blocking form of [`StyleApplier::apply_style`].
    pub fn apply_style_blocking(
        &self,
        layer: &dyn StyleTarget,
        style: impl Into<StyleInput>,
        source_name: &str,
        base_directory: Option<&str>,
    ) -> StyleResult<()> {
        pollster::block_on(self.apply_style(layer, style, source_name, base_directory))
    }

    async fn run(
        &self,
        layer: &dyn StyleTarget,
        style: StyleInput,
        source_name: &str,
        base_directory: Option<&str>,
        state: &mut ApplyState,
    ) -> StyleResult<()> {
        transition(state, ApplyState::Validating);
        let validated = validate_style(style, layer, source_name)?;

        transition(state, ApplyState::ResolvingSprite);
        let atlas = SpriteResolver::new(self.fetcher.as_ref(), self.options.pixel_ratio)
            .with_base_directory(base_directory)
            .with_access_token(self.options.access_token.as_deref())
            .resolve(validated.spec.sprite.as_deref())
            .await?;

        transition(state, ApplyState::Compiling);
        let function = CompiledStyle::compile(&validated.spec, &validated.source_name, atlas)
            .with_resolutions(self.options.resolutions.clone())
            .into_function();

        layer.set_style_function(function);
        transition(state, ApplyState::Installed);
        Ok(())
    }
}

fn transition(state: &mut ApplyState, next: ApplyState) {
    log::debug!("style application {:?} -> {:?}", state, next);
    *state = next;
}

/// Apply `style` to `layer` with default options, reading sprites from the
/// local filesystem.
pub async fn apply_style(
    layer: &dyn StyleTarget,
    style: impl Into<StyleInput>,
    source_name: &str,
    base_directory: Option<&str>,
) -> StyleResult<()> {
    StyleApplier::new(FileFetcher::new())
        .apply_style(layer, style, source_name, base_directory)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StyleError;
    use crate::layer::MapLayer;
    use serde_json::json;

    fn style(sprite: Option<&str>) -> serde_json::Value {
        json!({
            "version": 8,
            "sprite": sprite,
            "sources": {"tiles": {"type": "vector"}},
            "layers": [{"id": "water", "type": "fill", "source": "tiles"}]
        })
    }

    #[test]
    fn test_options_defaults() {
        let options = ApplyOptions::default();
        assert_eq!(options.pixel_ratio, 1.0);
        assert_eq!(options.resolutions.len(), 25);
        assert!(options.access_token.is_none());

        let options = options.with_pixel_ratio(2.0).with_access_token("pk.test");
        assert_eq!(options.pixel_ratio, 2.0);
        assert_eq!(options.access_token.as_deref(), Some("pk.test"));
    }

    #[test]
    fn test_state_reaches_installed() {
        let applier = StyleApplier::new(FileFetcher::new());
        let layer = MapLayer::vector_tile();
        let mut state = ApplyState::Idle;
        pollster::block_on(applier.run(&layer, style(None).into(), "tiles", None, &mut state))
            .unwrap();
        assert_eq!(state, ApplyState::Installed);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_state_stops_at_failing_step() {
        let dir = tempfile::tempdir().unwrap();
        let applier = StyleApplier::new(FileFetcher::with_root(dir.path()));
        let layer = MapLayer::vector_tile();

        let mut state = ApplyState::Idle;
        let result = pollster::block_on(applier.run(
            &layer,
            style(Some("missing")).into(),
            "tiles",
            None,
            &mut state,
        ));
        assert!(matches!(result, Err(StyleError::SpriteNotFound { .. })));
        assert_eq!(state, ApplyState::ResolvingSprite);
        assert!(layer.style_function().is_none());
    }

    #[test]
    fn test_failure_keeps_installed_function() {
        let applier = StyleApplier::new(FileFetcher::new());
        let layer = MapLayer::vector_tile();
        applier
            .apply_style_blocking(&layer, style(None), "tiles", None)
            .unwrap();
        let installed = layer.style_function().unwrap();

        let err = applier
            .apply_style_blocking(&layer, style(None), "nope", None)
            .unwrap_err();
        assert!(matches!(err, StyleError::SourceTypeMismatch { .. }));
        assert!(Arc::ptr_eq(&layer.style_function().unwrap(), &installed));
    }
}
