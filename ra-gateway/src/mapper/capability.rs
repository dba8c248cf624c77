use serde_json::Value;

use super::descriptor::JsonMap;

/// What to do with a mapped parameter for a given model family.
#[derive(Debug, Clone, Copy)]
pub enum ParamAction {
    /// The model doesn't accept the parameter; dropped with a warning.
    Unsupported,
    /// The model uses a different parameter name, e.g.
    /// `max_tokens` -> `max_completion_tokens`.
    Rename(&'static str),
    /// The model accepts a different numeric range; scaled then capped.
    Scale { factor: f64, max: f64 },
}

/// One row of a provider's model-capability table.
pub struct CapabilityRule {
    pub model_prefixes: &'static [&'static str],
    pub param: &'static str,
    pub action: ParamAction,
}

impl CapabilityRule {
    #[must_use]
    pub const fn new(
        model_prefixes: &'static [&'static str],
        param: &'static str,
        action: ParamAction,
    ) -> Self {
        Self {
            model_prefixes,
            param,
            action,
        }
    }

    fn matches(&self, model: &str) -> bool {
        self.model_prefixes
            .iter()
            .any(|prefix| model.starts_with(prefix))
    }
}

/// Applies the capability table to a mapped provider body in place.
pub fn apply(rules: &[CapabilityRule], model: &str, body: &mut JsonMap) {
    for rule in rules {
        if !rule.matches(model) || !body.contains_key(rule.param) {
            continue;
        }
        match rule.action {
            ParamAction::Unsupported => {
                tracing::warn!(
                    model = model,
                    param = rule.param,
                    "dropping parameter unsupported by model"
                );
                body.remove(rule.param);
            }
            ParamAction::Rename(to) => {
                if let Some(value) = body.remove(rule.param) {
                    body.insert(to.to_string(), value);
                }
            }
            ParamAction::Scale { factor, max } => {
                if let Some(number) =
                    body.get(rule.param).and_then(Value::as_f64)
                {
                    let scaled = (number * factor).min(max);
                    if let Some(scaled) =
                        serde_json::Number::from_f64(scaled)
                    {
                        body.insert(
                            rule.param.to_string(),
                            Value::Number(scaled),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    static RULES: &[CapabilityRule] = &[
        CapabilityRule::new(
            &["o1", "o3", "gpt-5"],
            "max_tokens",
            ParamAction::Rename("max_completion_tokens"),
        ),
        CapabilityRule::new(
            &["o1", "o3", "gpt-5"],
            "temperature",
            ParamAction::Unsupported,
        ),
        CapabilityRule::new(
            &["claude-"],
            "temperature",
            ParamAction::Scale {
                factor: 0.5,
                max: 1.0,
            },
        ),
    ];

    fn body(value: serde_json::Value) -> JsonMap {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn renames_for_matching_models_only() {
        let mut mapped =
            body(json!({"max_tokens": 100, "temperature": 0.4}));
        apply(RULES, "o3-mini", &mut mapped);
        assert_eq!(mapped["max_completion_tokens"], json!(100));
        assert!(!mapped.contains_key("max_tokens"));
        assert!(!mapped.contains_key("temperature"));

        let mut untouched =
            body(json!({"max_tokens": 100, "temperature": 0.4}));
        apply(RULES, "gpt-4o", &mut untouched);
        assert_eq!(untouched["max_tokens"], json!(100));
        assert_eq!(untouched["temperature"], json!(0.4));
    }

    #[test]
    fn scales_and_caps_ranges() {
        let mut mapped = body(json!({"temperature": 1.6}));
        apply(RULES, "claude-3-haiku-20240307", &mut mapped);
        assert_eq!(mapped["temperature"], json!(0.8));

        let mut capped = body(json!({"temperature": 2.5}));
        apply(RULES, "claude-3-haiku-20240307", &mut capped);
        assert_eq!(capped["temperature"], json!(1.0));
    }
}
