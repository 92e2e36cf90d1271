//! Environment-variable substitution for configuration values.
//!
//! Distinguishes `$VAR`, `${VAR}`, and literal `$$`, per SPEC_FULL.md §9. Substitution fails
//! closed: a referenced variable that is not set in the process environment is a
//! [`WarningsError::Config`], naming both the offending configuration key and the variable.
//!
//! `cq_description_template` is special: its `$description`/`${description}` placeholder must
//! survive this pass untouched (it is resolved later, per [`Finding`](crate::finding::Finding),
//! by [`render_description`]) — grounded on the two-phase substitution used by the original
//! `cq_description_template` setter.

use crate::error::WarningsError;

/// Substitutes `$VAR`/`${VAR}` references in `value` against the process environment.
///
/// `key_context` names the configuration key `value` came from, for error messages.
/// Names listed in `preserve` are left as literal `$name`/`${name}` tokens instead of being
/// looked up (used to keep `$description` intact inside a `cq_description_template`).
pub fn substitute(value: &str, key_context: &str, preserve: &[&str]) -> Result<String, WarningsError> {
    let bytes = value.as_bytes();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'$' {
            let ch = value[i..].chars().next().expect("valid utf8 boundary");
            out.push(ch);
            i += ch.len_utf8();
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1] == b'$' {
            out.push('$');
            i += 2;
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            let Some(end) = value[i + 2..].find('}') else {
                return Err(WarningsError::Config(format!(
                    "Unterminated '${{' in configuration value '{key_context}'"
                )));
            };
            let name = &value[i + 2..i + 2 + end];
            out.push_str(&resolve(name, key_context, preserve, true)?);
            i = i + 2 + end + 1;
            continue;
        }

        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }
        if end > start {
            let name = &value[start..end];
            out.push_str(&resolve(name, key_context, preserve, false)?);
            i = end;
            continue;
        }

        out.push('$');
        i += 1;
    }
    Ok(out)
}

fn resolve(name: &str, key_context: &str, preserve: &[&str], braced: bool) -> Result<String, WarningsError> {
    if preserve.contains(&name) {
        return Ok(if braced {
            format!("${{{name}}}")
        } else {
            format!("${name}")
        });
    }
    std::env::var(name).map_err(|_| {
        WarningsError::Config(format!(
            "Failed to find environment variable from configuration value '{key_context}': '{name}'"
        ))
    })
}

/// Resolves a checker's `cq_description_template` config field: substitutes environment
/// variables (preserving the `$description`/`${description}` placeholder) and defaults to a
/// bare `$description` when the field is unset.
pub fn resolve_cq_description_template(raw: Option<&str>, key_context: &str) -> Result<String, WarningsError> {
    match raw {
        Some(value) => substitute(value, key_context, &["description"]),
        None => Ok("$description".to_string()),
    }
}

/// Renders a `cq_description_template` (already env-var-substituted via [`substitute`], with
/// `description` preserved) against a concrete Finding description.
pub fn render_description(template: &str, description: &str) -> String {
    template
        .replace("${description}", description)
        .replace("$description", description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_braced_and_bare_forms() {
        std::env::set_var("WG_TEST_VAR", "42");
        assert_eq!(substitute("min=${WG_TEST_VAR}", "min", &[]).unwrap(), "min=42");
        assert_eq!(substitute("min=$WG_TEST_VAR", "min", &[]).unwrap(), "min=42");
        std::env::remove_var("WG_TEST_VAR");
    }

    #[test]
    fn literal_dollar_dollar_is_preserved_as_single_dollar() {
        assert_eq!(substitute("price: $$5", "max", &[]).unwrap(), "price: $5");
    }

    #[test]
    fn missing_variable_fails_closed() {
        let err = substitute("$DOES_NOT_EXIST_WG", "cq_description_template", &[]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cq_description_template"));
        assert!(msg.contains("DOES_NOT_EXIST_WG"));
    }

    #[test]
    fn preserved_names_are_left_literal() {
        let out = substitute(
            "$description — see $WG_OTHER_VAR",
            "cq_description_template",
            &["description"],
        );
        assert!(out.is_err()); // WG_OTHER_VAR still undefined, and not preserved
        std::env::set_var("WG_OTHER_VAR", "note");
        let out = substitute(
            "$description — see $WG_OTHER_VAR",
            "cq_description_template",
            &["description"],
        )
        .unwrap();
        assert_eq!(out, "$description — see note");
        std::env::remove_var("WG_OTHER_VAR");
    }

    #[test]
    fn render_description_fills_placeholder() {
        assert_eq!(render_description("$description (coverity)", "oops"), "oops (coverity)");
        assert_eq!(render_description("${description}!", "oops"), "oops!");
    }
}
