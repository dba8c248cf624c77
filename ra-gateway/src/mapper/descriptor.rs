use serde_json::Value;

use crate::error::mapper::MapperError;

pub type JsonMap = serde_json::Map<String, Value>;

/// Declarative mapping of one canonical field onto one provider parameter.
///
/// A transform receives the whole canonical body so expansions (one field to
/// several provider fields) and cross-field rewrites stay pure functions.
pub struct ParamDescriptor {
    pub param: &'static str,
    pub required: bool,
    pub default: Option<fn() -> Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub transform: Option<fn(&JsonMap) -> Result<Option<Value>, MapperError>>,
}

impl ParamDescriptor {
    #[must_use]
    pub const fn copy(param: &'static str) -> Self {
        Self {
            param,
            required: false,
            default: None,
            min: None,
            max: None,
            transform: None,
        }
    }

    #[must_use]
    pub const fn required(param: &'static str) -> Self {
        Self {
            required: true,
            ..Self::copy(param)
        }
    }

    #[must_use]
    pub const fn clamped(param: &'static str, min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::copy(param)
        }
    }

    #[must_use]
    pub const fn with_transform(
        param: &'static str,
        transform: fn(&JsonMap) -> Result<Option<Value>, MapperError>,
    ) -> Self {
        Self {
            transform: Some(transform),
            ..Self::copy(param)
        }
    }

    #[must_use]
    pub const fn required_transform(
        param: &'static str,
        transform: fn(&JsonMap) -> Result<Option<Value>, MapperError>,
    ) -> Self {
        Self {
            required: true,
            transform: Some(transform),
            ..Self::copy(param)
        }
    }

    #[must_use]
    pub const fn with_default(
        param: &'static str,
        default: fn() -> Value,
    ) -> Self {
        Self {
            default: Some(default),
            ..Self::copy(param)
        }
    }

    #[must_use]
    pub const fn required_with(
        param: &'static str,
        transform: fn(&JsonMap) -> Result<Option<Value>, MapperError>,
        default: fn() -> Value,
    ) -> Self {
        Self {
            required: true,
            transform: Some(transform),
            default: Some(default),
            ..Self::copy(param)
        }
    }
}

/// One canonical field fanned out to one or more provider parameters.
pub struct FieldMap {
    pub field: &'static str,
    pub params: &'static [ParamDescriptor],
}

impl FieldMap {
    #[must_use]
    pub const fn new(
        field: &'static str,
        params: &'static [ParamDescriptor],
    ) -> Self {
        Self { field, params }
    }
}

fn clamp(value: Value, descriptor: &ParamDescriptor) -> Value {
    let (Some(number), true) = (
        value.as_f64(),
        descriptor.min.is_some() || descriptor.max.is_some(),
    ) else {
        return value;
    };
    let clamped = number
        .max(descriptor.min.unwrap_or(f64::NEG_INFINITY))
        .min(descriptor.max.unwrap_or(f64::INFINITY));
    if (clamped - number).abs() < f64::EPSILON {
        value
    } else {
        serde_json::Number::from_f64(clamped)
            .map_or(value, Value::Number)
    }
}

/// The transform algorithm: walks the adapter's field maps over the
/// canonical body and produces the provider body.
///
/// Canonical fields without a map entry are dropped; absent fields with a
/// `default` are filled; absent `required` fields fail the request.
pub fn apply_field_maps(
    maps: &[FieldMap],
    body: &JsonMap,
) -> Result<JsonMap, MapperError> {
    let mut out = JsonMap::new();
    for map in maps {
        let present = body.get(map.field);
        for descriptor in map.params {
            let value = match descriptor.transform {
                Some(transform) => transform(body)?,
                None => present.cloned(),
            };
            match value {
                Some(value) => {
                    out.insert(
                        descriptor.param.to_string(),
                        clamp(value, descriptor),
                    );
                }
                None => {
                    if let Some(default) = descriptor.default {
                        out.insert(descriptor.param.to_string(), default());
                    } else if descriptor.required {
                        return Err(MapperError::MissingRequiredParameter(
                            map.field,
                        ));
                    }
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: Value) -> JsonMap {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn unmapped_fields_are_dropped() {
        static MAPS: &[FieldMap] =
            &[FieldMap::new("model", &[ParamDescriptor::copy("model")])];
        let out = apply_field_maps(
            MAPS,
            &body(json!({"model": "m", "secret_extra": 1})),
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out["model"], json!("m"));
    }

    #[test]
    fn required_missing_field_fails() {
        static MAPS: &[FieldMap] =
            &[FieldMap::new("model", &[ParamDescriptor::required("model")])];
        let err = apply_field_maps(MAPS, &body(json!({}))).unwrap_err();
        assert!(matches!(err, MapperError::MissingRequiredParameter("model")));
    }

    #[test]
    fn defaults_fill_absent_fields() {
        static MAPS: &[FieldMap] = &[FieldMap::new(
            "max_tokens",
            &[ParamDescriptor::with_default("max_tokens", || json!(1024))],
        )];
        let out = apply_field_maps(MAPS, &body(json!({}))).unwrap();
        assert_eq!(out["max_tokens"], json!(1024));
    }

    #[test]
    fn clamps_apply_to_numbers() {
        static MAPS: &[FieldMap] = &[FieldMap::new(
            "temperature",
            &[ParamDescriptor::clamped("temperature", 0.0, 1.0)],
        )];
        let out =
            apply_field_maps(MAPS, &body(json!({"temperature": 1.8})))
                .unwrap();
        assert_eq!(out["temperature"], json!(1.0));
    }

    #[test]
    fn one_field_can_fan_out_to_several_params() {
        fn width(body: &JsonMap) -> Result<Option<Value>, MapperError> {
            Ok(body
                .get("size")
                .and_then(|v| v.as_str())
                .and_then(|s| s.split_once('x'))
                .and_then(|(w, _)| w.parse::<u32>().ok())
                .map(Value::from))
        }
        fn height(body: &JsonMap) -> Result<Option<Value>, MapperError> {
            Ok(body
                .get("size")
                .and_then(|v| v.as_str())
                .and_then(|s| s.split_once('x'))
                .and_then(|(_, h)| h.parse::<u32>().ok())
                .map(Value::from))
        }
        static MAPS: &[FieldMap] = &[FieldMap::new(
            "size",
            &[
                ParamDescriptor::with_transform("width", width),
                ParamDescriptor::with_transform("height", height),
            ],
        )];
        let out =
            apply_field_maps(MAPS, &body(json!({"size": "1024x768"})))
                .unwrap();
        assert_eq!(out["width"], json!(1024));
        assert_eq!(out["height"], json!(768));
    }
}
