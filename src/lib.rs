use wasm_bindgen::prelude::*;
use js_sys::{Array, Object, Reflect};

pub mod cache;
pub mod decode;
pub mod engine;
pub mod error;
pub mod quantize;
pub mod sample;
pub mod select;

pub use decode::{DecodedImage, PixelSource, decode_bytes, decode_file};
pub use engine::{
    DEFAULT_PRECISION, DEFAULT_RESULT_LIMIT, Palette, PaletteConfig, Stage, palette_from_bytes,
};
pub use error::{DecodeError, PaletteError};
pub use quantize::{ColorBucket, quantize};
pub use sample::{Histogram, count};
pub use select::{PaletteResult, select};

/// Extract the dominant colors of an encoded GIF, JPEG or PNG image.
///
/// Pixels are sampled every `precision` pixels on both axes and snapped to a
/// coarse grid of 51-step levels before counting. The returned object has
/// two parallel arrays, most frequent color first:
///
/// - `colors`: uppercase `RRGGBB` strings
/// - `counts`: number of samples that fell into each color
///
/// Nothing is cached; this is the in-memory counterpart of [`Palette::get_palette`].
#[wasm_bindgen]
pub fn extract_palette(
    input: Vec<u8>,
    precision: u32,
    colors: usize,
) -> Result<Object, JsValue> {
    let result = palette_from_bytes(&input, precision, colors)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    if result.is_empty() {
        return Err(JsValue::from_str("Couldn't detect colors from image"));
    }

    let colors_js = Array::new();
    let counts_js = Array::new();
    for (bucket, count) in result.iter() {
        colors_js.push(&JsValue::from_str(&bucket.to_string()));
        counts_js.push(&JsValue::from_f64(*count as f64));
    }

    let out = Object::new();
    Reflect::set(&out, &JsValue::from_str("colors"), &colors_js)?;
    Reflect::set(&out, &JsValue::from_str("counts"), &counts_js)?;

    Ok(out)
}
