use std::path::{Path, PathBuf};

use crate::cache;
use crate::decode::{self, decode_bytes};
use crate::error::{DecodeError, PaletteError};
use crate::sample;
use crate::select::{PaletteResult, select};

pub const DEFAULT_PRECISION: u32 = 10;
pub const DEFAULT_RESULT_LIMIT: usize = 10;
const DATAFILES_DIR: &str = "datafiles";

/// Where a [`Palette`] run currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Configured,
    Decoded,
    Counted,
    Selected,
    Persisted,
    /// A stored artifact was returned without decoding the source.
    CacheHit,
}

/// Inputs for a palette run.
#[derive(Clone, Debug)]
pub struct PaletteConfig {
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
    base_dir: PathBuf,
    precision: u32,
    result_limit: usize,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            base_dir: PathBuf::from("."),
            precision: DEFAULT_PRECISION,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl PaletteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Store the artifact here instead of under `<base_dir>/datafiles/`.
    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Some(path.into());
        self
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Sampling stride in pixels. Zero is treated as one when sampling.
    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn configured_precision(&self) -> u32 {
        self.precision
    }

    pub fn effective_precision(&self) -> u32 {
        self.precision.max(1)
    }

    pub fn limit(&self) -> usize {
        self.result_limit
    }

    /// The artifact path: the explicit override, or
    /// `<base_dir>/datafiles/<source file name>.json`.
    pub fn destination_path(&self) -> Option<PathBuf> {
        if let Some(dest) = self.destination.as_ref().filter(|d| !d.as_os_str().is_empty()) {
            return Some(dest.clone());
        }
        let name = self.source_path()?.file_name()?;
        let mut file = name.to_os_string();
        file.push(".json");
        Some(self.base_dir.join(DATAFILES_DIR).join(file))
    }
}

/// Dominant color extraction for one image.
#[derive(Debug)]
pub struct Palette {
    config: PaletteConfig,
    colors: Option<PaletteResult>,
    stage: Stage,
}

impl Palette {
    pub fn new(config: PaletteConfig) -> Self {
        Self {
            config,
            colors: None,
            stage: Stage::Configured,
        }
    }

    /// Build with default settings for `source` and run immediately.
    pub fn from_source(source: impl Into<PathBuf>) -> Result<Self, PaletteError> {
        let mut palette = Self::new(PaletteConfig::new().source(source));
        palette.run()?;
        Ok(palette)
    }

    pub fn config(&self) -> &PaletteConfig {
        &self.config
    }

    /// Replace the configuration. Any previous result is discarded.
    pub fn set_config(&mut self, config: PaletteConfig) {
        self.config = config;
        self.colors = None;
        self.stage = Stage::Configured;
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The last computed or loaded result, kept even if saving it failed.
    pub fn colors(&self) -> Option<&PaletteResult> {
        self.colors.as_ref()
    }

    /// Return the cached palette if there is one, otherwise compute and save it.
    ///
    /// A cached palette is cut down to the configured result limit.
    pub fn run(&mut self) -> Result<&PaletteResult, PaletteError> {
        if let Some(dest) = self.config.destination_path() {
            if let Some(cached) = cache::load(&dest) {
                let cached = select(cached.entries(), self.config.limit());
                if !cached.is_empty() {
                    tracing::info!(path = %dest.display(), "Returning palette from cache");
                    self.advance(Stage::CacheHit);
                    let cached: &PaletteResult = self.colors.insert(cached);
                    return Ok(cached);
                }
            }
        }

        let result = self.compute()?;
        let persisted = self.persist(Some(&result));
        let colors: &PaletteResult = self.colors.insert(result);
        persisted?;
        Ok(colors)
    }

    /// Compute the palette from the source image without touching the cache.
    pub fn get_palette(&mut self) -> Result<&PaletteResult, PaletteError> {
        let result = self.compute()?;
        let colors: &PaletteResult = self.colors.insert(result);
        Ok(colors)
    }

    /// Persist the current result to the configured destination.
    pub fn save(&mut self) -> Result<(), PaletteError> {
        let colors = self.colors.take();
        let persisted = self.persist(colors.as_ref());
        self.colors = colors;
        persisted
    }

    fn persist(&mut self, colors: Option<&PaletteResult>) -> Result<(), PaletteError> {
        let dest = self
            .config
            .destination_path()
            .ok_or(PaletteError::Config("No destination given for save"))?;
        let colors = match colors {
            Some(colors) if !colors.is_empty() => colors,
            _ => {
                return Err(PaletteError::EmptyResult {
                    path: self.config.source_path().unwrap_or(Path::new("")).to_path_buf(),
                });
            }
        };

        cache::store(&dest, colors)?;
        self.advance(Stage::Persisted);
        Ok(())
    }

    fn compute(&mut self) -> Result<PaletteResult, PaletteError> {
        self.colors = None;
        self.stage = Stage::Configured;

        let source = self
            .config
            .source_path()
            .ok_or(PaletteError::Config("Image was not provided"))?
            .to_path_buf();
        if let Err(e) = std::fs::File::open(&source) {
            return Err(PaletteError::io(
                format!("Image {} is not readable", source.display()),
                e,
            ));
        }

        let image = decode::decode_file(&source)?;
        self.advance(Stage::Decoded);

        let histogram = sample::count(&image, self.config.effective_precision())
            .map_err(|e| PaletteError::decode(&source, e))?;
        self.advance(Stage::Counted);

        let result = select(histogram.entries(), self.config.limit());
        if result.is_empty() {
            return Err(PaletteError::EmptyResult { path: source });
        }
        self.advance(Stage::Selected);
        Ok(result)
    }

    fn advance(&mut self, stage: Stage) {
        tracing::debug!(from = ?self.stage, to = ?stage, "Palette stage");
        self.stage = stage;
    }
}

/// Compute a palette from an encoded image held in memory.
pub fn palette_from_bytes(
    input: &[u8],
    precision: u32,
    limit: usize,
) -> Result<PaletteResult, DecodeError> {
    let image = decode_bytes(input)?;
    let histogram = sample::count(&image, precision)?;
    Ok(select(histogram.entries(), limit))
}
