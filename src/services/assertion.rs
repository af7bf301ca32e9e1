use serde_json::Value;

use crate::models::{Assertion, AssertionKind, AssertionResult, ResponseSnapshot};

/// Actual value reported when a JSON path cannot be resolved
pub const JSON_PATH_ERROR: &str = "Error evaluating JSON path";
/// Actual value reported when a header is absent
pub const UNDEFINED: &str = "undefined";
/// Actual value reported for every assertion of a step whose request failed
pub const REQUEST_FAILED: &str = "Request failed";

/// Evaluate one assertion against a completed round trip.
///
/// Comparisons happen on strings after stringification. This never fails:
/// anything that cannot be evaluated becomes `passed = false` with a
/// sentinel `actual`.
pub fn evaluate(
    assertion: &Assertion,
    response: &ResponseSnapshot,
    duration_ms: i64,
) -> AssertionResult {
    let expected = assertion.expected.as_str();

    let (passed, actual) = match assertion.kind {
        AssertionKind::Status => {
            let actual = response.status.to_string();
            (actual == expected, actual)
        }
        AssertionKind::Json => match resolve_json_path(&response.body, &assertion.target) {
            Some(actual) => (actual == expected, actual),
            None => (false, JSON_PATH_ERROR.to_string()),
        },
        AssertionKind::Header => {
            let actual = find_header(response, &assertion.target)
                .unwrap_or(UNDEFINED)
                .to_string();
            (actual == expected, actual)
        }
        AssertionKind::ResponseTime => {
            let passed = parse_leading_int(expected).is_some_and(|limit| duration_ms <= limit);
            (passed, duration_ms.to_string())
        }
    };

    AssertionResult {
        name: assertion.display_name(),
        passed,
        expected: assertion.expected.clone(),
        actual,
    }
}

/// Result for an assertion that could not be evaluated because the request failed
pub fn request_failed(assertion: &Assertion) -> AssertionResult {
    AssertionResult {
        name: assertion.display_name(),
        passed: false,
        expected: assertion.expected.clone(),
        actual: REQUEST_FAILED.to_string(),
    }
}

/// Walk a dot separated path such as `$.data.user.id` through object keys.
///
/// Only object keys are supported; a leading `$` segment marks the root.
/// Returns the compact JSON rendering of the value found, see [`stringify`].
fn resolve_json_path(body: &str, path: &str) -> Option<String> {
    let root: Value = serde_json::from_str(body).ok()?;

    let mut current = &root;
    for segment in path.split('.') {
        if segment.starts_with('$') {
            continue;
        }
        current = current.as_object()?.get(segment)?;
    }

    stringify(current)
}

/// Compact JSON text with numbers in their shortest JavaScript form, so
/// `5.0` reads `5` and `1e2` reads `100`. Object keys keep body order.
fn stringify(value: &Value) -> Option<String> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Some(out)
}

fn write_value(out: &mut String, value: &Value) -> Option<()> {
    match value {
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => out.push_str(&i.to_string()),
            (_, Some(u), _) => out.push_str(&u.to_string()),
            (_, _, Some(f)) => out.push_str(&format_number(f)),
            _ => out.push_str(&n.to_string()),
        },
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).ok()?);
                out.push(':');
                write_value(out, item)?;
            }
            out.push('}');
        }
        // null, booleans and strings already render like JavaScript
        scalar => out.push_str(&serde_json::to_string(scalar).ok()?),
    }
    Some(())
}

/// JavaScript `Number#toString` for a finite f64
fn format_number(f: f64) -> String {
    let abs = f.abs();
    if f == 0.0 {
        "0".to_string()
    } else if abs >= 1e21 || abs < 1e-6 {
        // Rust writes `1e21` / `1e-7`, JavaScript `1e+21` / `1e-7`
        let exp = format!("{:e}", f);
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                format!("{}e+{}", mantissa, power)
            }
            _ => exp,
        }
    } else if f.fract() == 0.0 {
        format!("{:.0}", f)
    } else {
        f.to_string()
    }
}

fn find_header<'a>(response: &'a ResponseSnapshot, name: &str) -> Option<&'a str> {
    response
        .headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Parse the leading integer of `text`, ignoring surrounding whitespace and
/// any trailing characters (`"1000ms"` is 1000). `None` when no digits lead.
fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude = rest[..digits_len].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
