use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap as HashMap;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}")
        .expect("placeholder pattern is valid")
});

/// Renders `{{variable}}` placeholders in a system prompt.
///
/// Placeholders without a matching variable are left as literal text.
#[must_use]
pub fn render(template: &str, variables: Option<&HashMap<String, String>>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            variables
                .and_then(|vars| vars.get(name).cloned())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_variables() {
        let vars = vars(&[("name", "Ada"), ("tone", "formal")]);
        assert_eq!(
            render("Hello {{name}}, be {{ tone }}.", Some(&vars)),
            "Hello Ada, be formal."
        );
    }

    #[test]
    fn missing_variables_stay_literal() {
        let vars = vars(&[("name", "Ada")]);
        assert_eq!(
            render("Hello {{name}}, {{missing}}!", Some(&vars)),
            "Hello Ada, {{missing}}!"
        );
        assert_eq!(render("{{x}}", None), "{{x}}");
    }

    #[test]
    fn text_without_placeholders_is_untouched() {
        assert_eq!(render("plain text", None), "plain text");
    }
}
