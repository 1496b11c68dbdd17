//! Call-sign helpers and template-variable substitution.
//!
//! Call texts are templates over `{{Var}}` tokens (`CS_Full`, `Dep_Name`,
//! ...) plus `[placeholder]` brackets the pilot fills in by hand. This module
//! owns the call-sign abbreviation rules and the variable substitution used
//! when rendering a sheet.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::dataset::Airport;

/// Variable bindings for template substitution.
pub type TemplateVars = BTreeMap<String, String>;

fn var_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid template-variable pattern"))
}

/// Abbreviate a full call sign, e.g. "Skyhawk 12345" becomes "Skyhawk 345".
///
/// A single-word call sign is returned unchanged.
#[must_use]
pub fn abbreviate(full: &str) -> String {
    let parts: Vec<&str> = full.split_whitespace().collect();
    if parts.len() < 2 {
        return full.trim().to_string();
    }
    format!("{} {}", parts[0], tail_chars(parts[parts.len() - 1], 3))
}

/// The last three characters of the registration number, used on subsequent
/// calls once ATC has acknowledged the full call sign.
#[must_use]
pub fn short_form(full: &str) -> String {
    let parts: Vec<&str> = full.split_whitespace().collect();
    if parts.len() < 2 {
        return full.trim().to_string();
    }
    tail_chars(parts[parts.len() - 1], 3)
}

fn tail_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(n)).collect()
}

/// Substitute `{{Var}}` tokens using the given bindings.
///
/// Unbound tokens are left in place so the gap stays visible on the sheet.
#[must_use]
pub fn substitute(text: &str, vars: &TemplateVars) -> String {
    var_token_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            vars.get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Build the variable bindings for one leg of a route.
///
/// Missing airports fall back to visible placeholders rather than empty
/// strings.
#[must_use]
pub fn leg_vars(call_sign: &str, from: Option<&Airport>, to: Option<&Airport>) -> TemplateVars {
    let mut vars = TemplateVars::new();

    let cs_full = if call_sign.trim().is_empty() {
        "[Call Sign]".to_string()
    } else {
        call_sign.trim().to_string()
    };
    let cs_abbr = if call_sign.trim().is_empty() {
        "[Call Sign]".to_string()
    } else {
        abbreviate(call_sign)
    };
    vars.insert("CS_Full".to_string(), cs_full);
    vars.insert("CS_Abbr".to_string(), cs_abbr);

    bind_airport(&mut vars, "Dep", from, "[Departure]");
    bind_airport(&mut vars, "Arr", to, "[Arrival]");
    vars
}

fn bind_airport(
    vars: &mut TemplateVars,
    prefix: &str,
    airport: Option<&Airport>,
    placeholder: &str,
) {
    match airport {
        Some(a) => {
            vars.insert(format!("{prefix}_Name"), a.short_name().to_string());
            vars.insert(format!("{prefix}_Abridged"), a.abridged.clone());
            vars.insert(
                format!("{prefix}_Traffic"),
                format!("{} Traffic", a.short_name()),
            );
        }
        None => {
            vars.insert(format!("{prefix}_Name"), placeholder.to_string());
            vars.insert(format!("{prefix}_Abridged"), placeholder.to_string());
            vars.insert(format!("{prefix}_Traffic"), format!("{placeholder} Traffic"));
        }
    }
}
