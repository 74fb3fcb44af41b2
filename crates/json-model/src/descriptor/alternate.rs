//! Fallback conversions tried when a field's primary conversion fails.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::TypeDescriptor;
use crate::error::ConversionError;
use crate::registry::Registry;
use crate::value::Value;

pub type Transformer = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;
pub type Jsonifier = Arc<dyn Fn(&Value) -> Result<JsonValue, String> + Send + Sync>;

/// An alternate source type for a field, with the function that turns a
/// value of that type into the field's target type and, optionally, the
/// function used to dump the target value when the primary dump fails.
#[derive(Clone)]
pub struct AlternateConversion {
    descriptor: TypeDescriptor,
    transformer: Transformer,
    jsonifier: Option<Jsonifier>,
}

impl AlternateConversion {
    pub fn new(
        descriptor: TypeDescriptor,
        transformer: impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            descriptor,
            transformer: Arc::new(transformer),
            jsonifier: None,
        }
    }

    pub fn with_jsonifier(
        mut self,
        jsonifier: impl Fn(&Value) -> Result<JsonValue, String> + Send + Sync + 'static,
    ) -> Self {
        self.jsonifier = Some(Arc::new(jsonifier));
        self
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn jsonifier(&self) -> Option<&Jsonifier> {
        self.jsonifier.as_ref()
    }

    /// Parse `raw` as the alternate type, then transform it.
    pub(crate) fn convert(&self, raw: &Value, registry: &Registry) -> Result<Value, ConversionError> {
        let parsed = self.descriptor.parse_value(raw, registry)?;
        (self.transformer)(parsed).map_err(|message| ConversionError::new(&self.descriptor, message))
    }
}

impl fmt::Debug for AlternateConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlternateConversion")
            .field("type", &format_args!("{}", self.descriptor))
            .field("jsonifier", &self.jsonifier.is_some())
            .finish()
    }
}
