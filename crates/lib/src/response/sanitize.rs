//! # JSON Sanitizer
//!
//! String-level repairs for the malformations language models put into
//! otherwise valid JSON. Every rule is an independent pure function over
//! strings; [`sanitize`] runs them in a fixed order until the text stops
//! changing, which makes it idempotent.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Fields that always carry a bare number.
pub const NUMERIC_FIELDS: [&str; 7] = [
    "calories", "protein", "carbs", "fat", "fiber", "sugar", "sodium",
];

/// Upper bound on full rule passes; real model output settles in two.
const MAX_PASSES: usize = 5;

/// A named sanitization rule.
pub type Rule = (&'static str, fn(&str) -> String);

/// The rules in the order [`sanitize`] applies them.
///
/// Bracket balancing runs after every quote repair so that its string-aware
/// scan sees the final quoting, and trailing commas are removed last because
/// balancing can expose new ones.
pub const RULES: [Rule; 9] = [
    ("strip_control_chars", strip_control_chars),
    (
        "remove_trailing_quotes_after_numbers",
        remove_trailing_quotes_after_numbers,
    ),
    ("unquote_numeric_fields", unquote_numeric_fields),
    ("quote_unit_values", quote_unit_values),
    ("repair_diet_field", repair_diet_field),
    ("fix_doubled_trailing_quotes", fix_doubled_trailing_quotes),
    ("fix_unquoted_continuation", fix_unquoted_continuation),
    ("balance_brackets", balance_brackets),
    ("remove_trailing_commas", remove_trailing_commas),
];

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

// `"field": 6"` with the stray quote glued to the number.
static NUMBER_STRAY_QUOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("[^"]+"\s*:\s*-?\d+(?:\.\d+)?)"(\s*(?:[,}\]]|$))"#).expect("valid regex")
});

// `"field": 40g"`, a unit-suffixed number with a stray quote.
static UNIT_STRAY_QUOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("[^"]+"\s*:\s*-?\d+(?:\.\d+)?\s*[A-Za-z]+)"(\s*(?:[,}\]]|$))"#)
        .expect("valid regex")
});

// `"field": 6 "`, whitespace between the number and the stray quote.
static SPACED_STRAY_QUOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("[^"]+"\s*:\s*-?\d+(?:\.\d+)?)\s+"(\s*(?:[,}\]]|$))"#).expect("valid regex")
});

static QUOTED_NUMERIC_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#""(calories|protein|carbs|fat|fiber|sugar|sodium)"\s*:\s*"\s*(-?\d+(?:\.\d+)?)\s*(?:"|$)"#,
    )
    .expect("valid regex")
});

static BARE_UNIT_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"("[^"]+"\s*:\s*)(-?\d+(?:\.\d+)?\s*(?:mg|kg|kcal|cal|cups|cup|grams|gram|g|ml|l|oz|lbs|lb|tbsp|tsp|servings|serving|minutes|mins|min|hours|hrs|hr))(\s*(?:[,}\]]|$))"#,
    )
    .expect("valid regex")
});

// The second token may be unterminated when the output was cut off inside it.
static SPLIT_DIET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""diet"\s*:\s*"([^"]*)"\s*,\s*"([^"]*)(?:"(\s*(?:[,}\]]|$))|$)"#)
        .expect("valid regex")
});

static DOUBLED_QUOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"\\:,\[{])""(\s*(?:[,}\]]|$))"#).expect("valid regex")
});

static UNQUOTED_CONTINUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"("[^"]+"\s*:\s*"[^"]*)"\s*,\s*([A-Za-z][A-Za-z0-9 '&.\-]*?)(\s*(?:[,}\]]|$))"#,
    )
    .expect("valid regex")
});

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));

/// Runs every rule in [`RULES`] until the output is a fixed point.
pub fn sanitize(text: &str) -> String {
    let mut current = apply_rules(text);
    for _ in 1..MAX_PASSES {
        let next = apply_rules(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn apply_rules(text: &str) -> String {
    RULES
        .iter()
        .fold(text.to_string(), |acc, (_, rule)| rule(&acc))
}

/// Replaces control characters (`\r`, `\n`, `\t`, ...) with spaces and
/// collapses runs of whitespace into one space.
///
/// Models embed literal newlines inside string values, which strict JSON
/// parsers reject.
pub fn strip_control_chars(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    WHITESPACE_RUN.replace_all(&replaced, " ").into_owned()
}

/// `"field": 6"` → `"field": 6`, in three passes: a quote glued to the
/// number, a quote after a unit suffix, and a quote separated by whitespace.
pub fn remove_trailing_quotes_after_numbers(text: &str) -> String {
    let first = NUMBER_STRAY_QUOTE.replace_all(text, "${1}${2}");
    let second = UNIT_STRAY_QUOTE.replace_all(&first, "${1}${2}");
    SPACED_STRAY_QUOTE
        .replace_all(&second, "${1}${2}")
        .into_owned()
}

/// `"calories": "450"` → `"calories": 450` for the fields in [`NUMERIC_FIELDS`].
pub fn unquote_numeric_fields(text: &str) -> String {
    QUOTED_NUMERIC_FIELD
        .replace_all(text, "\"${1}\": ${2}")
        .into_owned()
}

/// `"portion": 40g` → `"portion": "40g"`. Numeral+unit tokens are strings.
pub fn quote_unit_values(text: &str) -> String {
    BARE_UNIT_VALUE
        .replace_all(text, "${1}\"${2}\"${3}")
        .into_owned()
}

/// Rejoins a `"diet"` value that an unescaped comma split into two sibling
/// strings: `"diet": "Vegetarian", "Gluten-Free"` → `"diet": "Vegetarian, Gluten-Free"`.
pub fn repair_diet_field(text: &str) -> String {
    let mut current = text.to_string();
    // Each pass joins one split; values with several commas need several.
    for _ in 0..8 {
        let next = SPLIT_DIET
            .replace_all(&current, |caps: &Captures| {
                let tail = caps.get(3).map_or("", |m| m.as_str());
                format!(
                    "\"diet\": \"{}, {}\"{}",
                    caps[1].trim(),
                    caps[2].trim(),
                    tail
                )
            })
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// `"value""` → `"value"`. Empty strings (`""`) are left alone.
pub fn fix_doubled_trailing_quotes(text: &str) -> String {
    DOUBLED_QUOTE.replace_all(text, "${1}\"${2}").into_owned()
}

/// Pulls unquoted text that follows a comma back into the preceding string:
/// `"cuisine": "Italian", Mediterranean}` → `"cuisine": "Italian, Mediterranean"}`.
pub fn fix_unquoted_continuation(text: &str) -> String {
    UNQUOTED_CONTINUATION
        .replace_all(text, |caps: &Captures| {
            let continuation = caps[2].trim();
            if matches!(continuation, "true" | "false" | "null") {
                return caps[0].to_string();
            }
            format!("{}, {}\"{}", &caps[1], continuation, &caps[3])
        })
        .into_owned()
}

/// Appends the closers a truncated document is missing.
///
/// The scan is string-aware: brackets inside string literals do not count,
/// an unterminated string is closed first, and closers are emitted in reverse
/// nesting order so `[{"a": 1` becomes `[{"a": 1}]`.
pub fn balance_brackets(text: &str) -> String {
    let mut expected_closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => expected_closers.push('}'),
            '[' => expected_closers.push(']'),
            '}' | ']' => {
                if expected_closers.last() == Some(&c) {
                    expected_closers.pop();
                }
            }
            _ => {}
        }
    }

    if !in_string && expected_closers.is_empty() {
        return text.to_string();
    }

    let mut repaired = text.to_string();
    if in_string {
        if escaped {
            // A dangling backslash would escape the closing quote.
            repaired.pop();
        }
        repaired.push('"');
    }
    repaired.extend(expected_closers.iter().rev());
    repaired
}

/// `[1, 2,]` → `[1, 2]` and `{"a": 1, }` → `{"a": 1}`.
pub fn remove_trailing_commas(text: &str) -> String {
    TRAILING_COMMA.replace_all(text, "${1}").into_owned()
}
