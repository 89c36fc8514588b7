//! WASM bindings for browser-based conversion.
//!
//! This module exposes the conversion pipeline to JavaScript via wasm-bindgen.

use wasm_bindgen::prelude::*;

use crate::{ConversionConfig, Converter, LineHeight, OutputKind};

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: crate::Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn converter(format: &str, line_height: &str) -> Result<Converter, JsValue> {
    let output: OutputKind = format.parse().map_err(js_error)?;
    let line_height = LineHeight::new(line_height).map_err(js_error)?;
    Converter::new(ConversionConfig::new(output).with_line_height(line_height)).map_err(js_error)
}

/// Convert an EPUB or PDF.
///
/// `format` is `"epub"` or `"md"`; the result is EPUB bytes or UTF-8
/// Markdown.
#[wasm_bindgen]
pub fn convert(data: &[u8], format: &str, line_height: &str) -> Result<Vec<u8>, JsValue> {
    converter(format, line_height)?
        .convert(data, None)
        .map_err(js_error)
}

/// Title of an EPUB or PDF, as it would appear after conversion.
#[wasm_bindgen]
pub fn document_title(data: &[u8]) -> Result<String, JsValue> {
    let converter = Converter::new(ConversionConfig::default()).map_err(js_error)?;
    Ok(converter.inspect(data, None).map_err(js_error)?.title)
}
