//! Conversion between application property names (camelCase) and wire
//! field names (snake_case).
//!
//! The two functions are not inverses for every input. `to_camel(to_snake(x))`
//! returns `x` for underscore-free identifiers; identifiers that already
//! contain `_` lose it (`user_Id` -> `userId`). All-caps runs have no
//! lowercase-to-uppercase boundary, so `HTTPServer` passes through `to_snake`
//! untouched and never becomes a snake_case name.

/// Insert `_` at every lowercase→uppercase ASCII boundary and lowercase the
/// uppercase letter. Everything else passes through.
pub fn to_snake(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len() + 4);
    let mut prev_lower = false;
    for c in identifier.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
            // Boundaries are matched against the input, not the output.
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase();
        }
    }
    out
}

/// Split on `_`, drop empty segments, keep the first segment as-is and
/// capitalize the first character of each following one.
pub fn to_camel(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len());
    for (i, segment) in identifier.split('_').filter(|s| !s.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(segment);
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
