//! Naming Conventions - Identifier casing utilities for default key and accessor names

/// Convert an identifier to snake_case (`AuthorName` -> `author_name`).
pub fn underscore(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for (i, ch) in input.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Collapse `_x` sequences into `X` (`author_id` -> `authorId`, `Author_id` -> `AuthorId`).
///
/// The leading segment keeps its original casing so the convention of the
/// caller-supplied alias survives.
pub fn camelize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut upper_next = false;
    for ch in input.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Apply [`underscore`] only when `condition` holds.
pub fn underscore_if(input: &str, condition: bool) -> String {
    if condition {
        underscore(input)
    } else {
        input.to_string()
    }
}

/// Apply [`camelize`] only when `condition` holds.
pub fn camelize_if(input: &str, condition: bool) -> String {
    if condition {
        camelize(input)
    } else {
        input.to_string()
    }
}

/// Uppercase the first character (`author` -> `Author`).
pub fn upper_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Default foreign-key name for an association: the alias joined with the
/// referenced key, cased per the source entity's `underscored` setting.
pub fn default_foreign_key(alias: &str, target_key: &str, underscored: bool) -> String {
    let joined = format!("{}_{}", underscore_if(alias, underscored), target_key);
    camelize_if(&joined, !underscored)
}
