//! WebAssembly bindings for the Routix editor.
//!
//! The editor only loads, saves, previews, and checks documents; it never
//! evaluates workflows, so nothing here touches the engine.
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { parse_to_model, model_to_source } from './routix_parser.js';
//!
//! await init();
//!
//! const model = parse_to_model(source);
//! model.workflows[0].phases[0].rules[0].condition.right.value = 10;
//! const preview = model_to_source(model);
//! ```

use crate::validation::{SemanticError, Severity};
use crate::RoutixError;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct ValidationReport {
    errors: Vec<SemanticError>,
    warnings: Vec<SemanticError>,
}

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

fn to_js_error(err: RoutixError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Parse Routix source and return the structured model as a JavaScript object.
#[wasm_bindgen]
pub fn parse_to_model(source: &str) -> Result<JsValue, JsValue> {
    let program = crate::parse(source).map_err(to_js_error)?;
    let model = crate::to_model(&program);
    model
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Render a structured model (as produced by `parse_to_model`) as source text.
#[wasm_bindgen]
pub fn model_to_source(model: JsValue) -> Result<String, JsValue> {
    let model: crate::Model = serde_wasm_bindgen::from_value(model)
        .map_err(|e| JsValue::from_str(&format!("Failed to read model: {}", e)))?;
    let program = crate::from_model(&model).map_err(|e| to_js_error(e.into()))?;
    Ok(crate::serialize(&program))
}

/// Parse Routix source, then serialize it back in canonical form.
#[wasm_bindgen]
pub fn normalize_source(source: &str) -> Result<String, JsValue> {
    let program = crate::parse(source).map_err(to_js_error)?;
    Ok(crate::serialize(&program))
}

/// Validate Routix source and return structured errors and warnings.
///
/// Returns an object with `errors` and `warnings` arrays. A syntax error is
/// reported as a single entry in `errors`.
#[wasm_bindgen]
pub fn validate_source(source: &str) -> Result<JsValue, JsValue> {
    let (errors, warnings) = match crate::parse(source) {
        Ok(program) => crate::validate_program(&program)
            .into_iter()
            .partition(|i| i.severity == Severity::Error),
        Err(err) => {
            let span = match &err {
                RoutixError::Lex(e) => Some(e.span.clone()),
                RoutixError::Parse(e) => Some(e.span.clone()),
                RoutixError::Model(_) => None,
            };
            let error = SemanticError {
                message: err.to_string(),
                span,
                severity: Severity::Error,
                hint: None,
            };
            (vec![error], vec![])
        }
    };

    let report = ValidationReport { errors, warnings };
    serde_wasm_bindgen::to_value(&report).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get the version of the parser.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
