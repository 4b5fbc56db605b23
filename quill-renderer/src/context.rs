//! Template context: [`RenderContext`] plus caller bindings, as a [`tera::Context`].

use serde_json::{Map, Value};

use quill_core::RenderContext;

use crate::error::RenderError;

/// Caller-supplied template variables.
pub type Bindings = Map<String, Value>;

/// Seed a context with `data`, then layer `bindings` on top.
///
/// Bindings win over metadata keys of the same name.
pub fn build_context(data: &RenderContext, bindings: &Bindings) -> Result<tera::Context, RenderError> {
    let mut ctx = tera::Context::from_serialize(data).map_err(|e| RenderError::from_tera(&e))?;
    for (key, value) in bindings {
        ctx.insert(key.as_str(), value);
    }
    Ok(ctx)
}

/// Interpret a command-line value: JSON literal when it parses, otherwise
/// the raw string.
pub fn parse_literal(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
