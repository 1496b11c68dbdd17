//! Taxi-route shorthand parser.
//!
//! Turns terse taxi shorthand like `a b cross 17 hold short c` into a
//! readback line: phonetic letters are expanded, runway designators are
//! upper-cased, `hold short` and `cross` forms are spelled out, and filler
//! words are dropped. The abbreviated call sign is appended when provided.

use std::sync::OnceLock;

use regex::Regex;

/// Expand a single letter to its ICAO phonetic word.
#[must_use]
pub fn phonetic(letter: char) -> Option<&'static str> {
    match letter.to_ascii_lowercase() {
        'a' => Some("Alpha"),
        'b' => Some("Bravo"),
        'c' => Some("Charlie"),
        'd' => Some("Delta"),
        'e' => Some("Echo"),
        'f' => Some("Foxtrot"),
        'g' => Some("Golf"),
        'h' => Some("Hotel"),
        'i' => Some("India"),
        'j' => Some("Juliet"),
        'k' => Some("Kilo"),
        'l' => Some("Lima"),
        'm' => Some("Mike"),
        'n' => Some("November"),
        'o' => Some("Oscar"),
        'p' => Some("Papa"),
        'q' => Some("Quebec"),
        'r' => Some("Romeo"),
        's' => Some("Sierra"),
        't' => Some("Tango"),
        'u' => Some("Uniform"),
        'v' => Some("Victor"),
        'w' => Some("Whiskey"),
        'x' => Some("X-ray"),
        'y' => Some("Yankee"),
        'z' => Some("Zulu"),
        _ => None,
    }
}

/// Recognize an already-spelled phonetic word, returning its canonical form.
fn phonetic_word(token: &str) -> Option<&'static str> {
    ('a'..='z').find_map(|letter| {
        let word = phonetic(letter)?;
        (word.to_lowercase() == token).then_some(word)
    })
}

fn runway_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}[lrcLRC]?$").expect("valid runway pattern"))
}

fn is_runway(token: &str) -> bool {
    runway_re().is_match(token)
}

/// Parse taxi shorthand into a readback line.
///
/// Returns an empty string for blank input. When `call_sign_abbr` is
/// non-empty it is appended as the readback suffix.
#[must_use]
pub fn parse_taxi_route(input: &str, call_sign_abbr: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }

    let tokens: Vec<String> = input
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect();

    let mut result: Vec<String> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i].as_str();
        let next = tokens.get(i + 1).map(String::as_str);

        if token == "back" && next == Some("taxi") {
            result.push("back taxi".to_string());
            i += 2;
            continue;
        }

        if token == "hold" && next == Some("short") {
            i += 2;
            if let Some(target) = tokens.get(i) {
                if is_runway(target) {
                    result.push(format!("hold short runway {}", target.to_uppercase()));
                } else if let Some(word) = single_letter_phonetic(target).or_else(|| phonetic_word(target))
                {
                    result.push(format!("hold short taxiway {word}"));
                } else {
                    result.push(format!("hold short {target}"));
                }
                i += 1;
            }
            continue;
        }

        if token == "cross" || token == "crossing" {
            i += 1;
            if let Some(target) = tokens.get(i) {
                if is_runway(target) {
                    result.push(format!("cross runway {}", target.to_uppercase()));
                    i += 1;
                }
            }
            continue;
        }

        if let Some(word) = single_letter_phonetic(token) {
            result.push(word.to_string());
            i += 1;
            continue;
        }

        if let Some(word) = phonetic_word(token) {
            result.push(word.to_string());
            i += 1;
            continue;
        }

        if is_runway(token) {
            result.push(token.to_uppercase());
            i += 1;
            continue;
        }

        if matches!(token, "via" | "to" | "then" | "and") {
            i += 1;
            continue;
        }

        result.push(token.to_string());
        i += 1;
    }

    if result.is_empty() {
        return String::new();
    }
    let formatted = result.join(", ");
    if call_sign_abbr.is_empty() {
        formatted
    } else {
        format!("{formatted}, {call_sign_abbr}")
    }
}

fn single_letter_phonetic(token: &str) -> Option<&'static str> {
    let mut chars = token.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    phonetic(first)
}
