//! Deferred per-cell display transforms.
//!
//! A transform is stored with the cell and only evaluated at render or export
//! time, when the printed string is produced. Typical uses are thousands
//! separators, ellipsis trimming, or ANSI colors:
//!
//! ```rust
//! use gridlinelib::{Transform, Value};
//!
//! let shout = Transform::custom(|v: &Value| Value::from(v.to_string().to_uppercase()));
//! assert_eq!(shout.apply(&Value::from("acme")), Value::from("ACME"));
//! ```
//!
//! Colors add bytes that the terminal does not display. Render such tables
//! with `measure_transformed(false)` so widths come from the raw values.

use console::Style;
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

type TransformFn = dyn Fn(&Value) -> Value + Send + Sync;

/// A deferred cell transform.
#[derive(Clone, Default)]
pub enum Transform {
    /// Leave the value as is
    #[default]
    Identity,
    /// Apply an opaque function
    Custom(Arc<TransformFn>),
    /// A printed string restored from rich JSON. The function that produced it
    /// is gone, so the string is used verbatim as the transformed form.
    Recorded(String),
}

impl Transform {
    /// Wrap a closure as a transform
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Transform::Custom(Arc::new(f))
    }

    /// Paint values with a terminal style (colors are always emitted).
    pub fn styled(style: Style) -> Self {
        let style = style.force_styling(true);
        Transform::custom(move |v| Value::Str(style.apply_to(v.to_string()).to_string()))
    }

    /// Apply to a value. `Recorded` yields its stored string.
    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Transform::Identity => value.clone(),
            Transform::Custom(f) => f(value),
            Transform::Recorded(s) => Value::Str(s.clone()),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Transform::Identity)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Identity => f.write_str("Identity"),
            Transform::Custom(_) => f.write_str("Custom(..)"),
            Transform::Recorded(s) => f.debug_tuple("Recorded").field(s).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let v = Value::from(3);
        assert_eq!(Transform::Identity.apply(&v), v);
        assert!(Transform::default().is_identity());
    }

    #[test]
    fn test_recorded_ignores_input() {
        let t = Transform::Recorded("fixed".into());
        assert_eq!(t.apply(&Value::from(1)), Value::from("fixed"));
    }

    #[test]
    fn test_styled_adds_escapes() {
        let t = Transform::styled(Style::new().red());
        let out = t.apply(&Value::from("loss")).to_string();
        assert!(out.contains("loss"));
        assert!(out.starts_with('\u{1b}'));
        assert_eq!(console::measure_text_width(&out), 4);
    }

    #[test]
    fn test_debug_hides_closure() {
        assert_eq!(format!("{:?}", Transform::custom(|v| v.clone())), "Custom(..)");
    }
}
