//! Inverting a [Variation](crate::variation::Variation): recovering field
//! values from an input string that is assumed to match its `parts`.
//!
//! The search explores, depth-first, every position a literal token could
//! occupy in the input, since a short or repeated literal can occur more
//! than once and only cross-key consistency or downstream feasibility can
//! tell the candidates apart. [`parse`] returns every fully-resolved field
//! mapping it found (ideally exactly one) plus the most specific error
//! encountered along the way, so that callers can build a precise
//! [`TemplateError`](crate::error::TemplateError).

use crate::{
    key::{Key as _, Value},
    variation::Part,
};
use indexmap::IndexMap;
use path_clean::PathClean;
use std::path::Path;

const PATH_SEPARATOR: char = '/';

/// The result of attempting to match an input string against one
/// variation's parts.
#[derive(Debug, Default)]
pub(crate) struct ParseOutcome {
    /// Every distinct field mapping that consumed the whole input. Zero
    /// means failure, one means success, more than one means ambiguity.
    pub fully_resolved: Vec<IndexMap<String, Value>>,
    /// The most specific error encountered, if any branch failed.
    pub error: Option<String>,
}

/// Match `input` against `parts`, skipping validation (but not matching)
/// for any key named in `skip_keys`.
pub(crate) fn parse(
    input: &str,
    parts: &[Part],
    skip_keys: &[String],
) -> ParseOutcome {
    parse_rec(input, parts, skip_keys, &IndexMap::new())
}

fn parse_rec(
    input: &str,
    parts: &[Part],
    skip_keys: &[String],
    fields: &IndexMap<String, Value>,
) -> ParseOutcome {
    if input.is_empty() {
        return ParseOutcome {
            fully_resolved: vec![fields.clone()],
            error: None,
        };
    }
    if parts.is_empty() {
        let error = format!("Path still remains (after parsing): \"{input}\"");
        tracing::debug!(target: "sgtk_template::parser", %error);
        return ParseOutcome {
            fully_resolved: Vec::new(),
            error: Some(error),
        };
    }

    let normal = normalize_path(input);
    let lower = normal.to_lowercase();

    let children = match &parts[0] {
        Part::Literal(lit) => {
            let lit_lower = lit.to_lowercase();
            if lower.starts_with(&lit_lower) {
                vec![parse_rec(
                    &normal[lit.len()..],
                    &parts[1..],
                    skip_keys,
                    fields,
                )]
            } else {
                let error = format!(
                    "Template has no keys and first token ({lit_lower}) \
                     doesn't match the input path ({lower})"
                );
                tracing::debug!(target: "sgtk_template::parser", %error);
                return ParseOutcome {
                    fully_resolved: Vec::new(),
                    error: Some(error),
                };
            }
        }
        Part::Key(key) => {
            match resolve_key(&normal, &lower, key, parts.get(1..).unwrap_or(&[]), skip_keys, fields) {
                Ok(possibilities) => possibilities
                    .into_iter()
                    .map(|(value, remaining)| {
                        let mut next_fields = fields.clone();
                        next_fields.insert(key.name().to_string(), value);
                        parse_rec(
                            &remaining,
                            parts.get(2..).unwrap_or(&[]),
                            skip_keys,
                            &next_fields,
                        )
                    })
                    .collect(),
                Err(error) => {
                    tracing::debug!(target: "sgtk_template::parser", %error);
                    return ParseOutcome {
                        fully_resolved: Vec::new(),
                        error: Some(error),
                    };
                }
            }
        }
    };

    resolve_children(&normal, skip_keys, &children)
}

/// Collapse this node's children: a single unique resolution wins; a
/// single child error is inherited; multiple distinct resolutions become
/// an ambiguity; otherwise every child error is folded into one message.
fn resolve_children(
    normal_path: &str,
    skip_keys: &[String],
    children: &[ParseOutcome],
) -> ParseOutcome {
    let mut resolved_fields: Vec<IndexMap<String, Value>> = Vec::new();
    let mut child_errors: Vec<String> = Vec::new();

    for child in children {
        if let Some(error) = &child.error {
            child_errors.push(error.clone());
        }
        for fields in &child.fully_resolved {
            if !resolved_fields.contains(fields) {
                resolved_fields.push(fields.clone());
            }
        }
    }

    if resolved_fields.len() == 1 {
        let mut fields = resolved_fields.into_iter().next().unwrap();
        fields.retain(|name, _| !skip_keys.iter().any(|s| s == name));
        ParseOutcome {
            fully_resolved: vec![fields],
            error: None,
        }
    } else if resolved_fields.len() > 1 {
        let mut lines = vec![format!("\"{normal_path}\"")];
        lines.extend(resolved_fields.iter().map(|f| format!("{f:?}")));
        let error = format!(
            "Multiple possible solutions found for {}",
            lines.join("\n - ")
        );
        tracing::warn!(target: "sgtk_template::parser", %error);
        ParseOutcome {
            fully_resolved: resolved_fields,
            error: Some(error),
        }
    } else if child_errors.len() == 1 {
        ParseOutcome {
            fully_resolved: Vec::new(),
            error: Some(child_errors.into_iter().next().unwrap()),
        }
    } else {
        let mut lines = vec![format!("\"{normal_path}\"")];
        lines.extend(child_errors);
        let error = format!("No possible solutions found for {}", lines.join("\n * "));
        tracing::debug!(target: "sgtk_template::parser", %error);
        ParseOutcome {
            fully_resolved: Vec::new(),
            error: Some(error),
        }
    }
}

/// One occurrence of a static token in the lowercased input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TokenPosition {
    start: usize,
    end: usize,
}

/// Resolve the first key in `parts` (already split off by the caller) by
/// finding every textually-valid candidate end-position for it, then
/// validating/converting the substring each one implies.
fn resolve_key(
    normal_path: &str,
    lower_path: &str,
    key: &crate::key::KeyDef,
    remaining_after_key: &[Part],
    skip_keys: &[String],
    fields: &IndexMap<String, Value>,
) -> Result<Vec<(Value, String)>, String> {
    let key_length = key.length();
    let key_name = key.name();
    let previous_resolve = fields.get(key_name);

    let token_positions = all_token_positions(lower_path, normal_path.len(), remaining_after_key)?;
    let next_token_positions = &token_positions[0];

    let mut possibilities: Vec<(Value, String)> = Vec::new();
    for position in next_token_positions {
        if let Some(length) = key_length
            && position.start < length
        {
            continue;
        }

        let path_sub_str = &normal_path[..position.start];
        let using_previous = previous_resolve.is_some();

        let possible_value = if skip_keys.iter().any(|k| k == key_name) {
            Some(Value::String(path_sub_str.to_string()))
        } else if path_sub_str.contains(PATH_SEPARATOR) {
            tracing::debug!(
                target: "sgtk_template::parser",
                key = key_name,
                value = path_sub_str,
                "invalid value for key: contains a path separator",
            );
            None
        } else {
            match key.value_from_str(path_sub_str) {
                Ok(value) => match previous_resolve {
                    Some(previous) if &value != previous => {
                        tracing::debug!(
                            target: "sgtk_template::parser",
                            key = key_name,
                            ?value,
                            ?previous,
                            "current value doesn't match previously resolved value",
                        );
                        None
                    }
                    _ => Some(value),
                },
                Err(error) => {
                    tracing::debug!(
                        target: "sgtk_template::parser",
                        key = key_name,
                        value = path_sub_str,
                        %error,
                        "failed to convert value for key",
                    );
                    None
                }
            }
        };

        if let Some(value) = possible_value {
            let remaining = normal_path[position.end..].to_string();
            if using_previous {
                possibilities = vec![(value, remaining)];
                break;
            }
            possibilities.push((value, remaining));
        }
    }

    Ok(possibilities)
}

/// Find every occurrence of each remaining static token in the input,
/// pruned so that each token's candidate positions are consistent with
/// the order the tokens must appear in. Returns, per token, its list of
/// candidate `(start, end)` positions; index 0 is the token immediately
/// following the key currently being resolved.
fn all_token_positions(
    lower_path: &str,
    input_len: usize,
    remaining_parts: &[Part],
) -> Result<Vec<Vec<TokenPosition>>, String> {
    let static_tokens: Vec<String> = remaining_parts
        .iter()
        .filter_map(|part| match part {
            Part::Literal(lit) => Some(lit.to_lowercase()),
            Part::Key(_) => None,
        })
        .collect();

    let mut start_pos = 0usize;
    let mut token_positions: Vec<Vec<TokenPosition>> = Vec::new();

    for token in &static_tokens {
        let previous_start = start_pos;
        let mut positions = Vec::new();

        for position in find_token_positions(lower_path, token) {
            if position.start >= previous_start {
                if positions.is_empty() {
                    start_pos = position.end;
                }
                positions.push(position);
            }
        }

        if positions.is_empty() {
            let error = format!(
                "Path does not fit the template:\n{lower_path}\n{}^--- failed to \
                 find token \"{token}\" from here",
                " ".repeat(start_pos)
            );
            return Err(error);
        }
        token_positions.push(positions);
    }

    let mut max_index = lower_path.len();
    for index in (0..token_positions.len()).rev() {
        let mut new_max = None;
        let mut pruned = Vec::new();
        for position in &token_positions[index] {
            if position.start < max_index {
                new_max = Some(new_max.map_or(position.start, |m: usize| m.max(position.start)));
                pruned.push(*position);
            }
        }
        token_positions[index] = pruned;
        max_index = new_max.unwrap_or(0);
    }

    if token_positions.is_empty() {
        Ok(vec![vec![TokenPosition {
            start: input_len,
            end: input_len,
        }]])
    } else {
        Ok(token_positions)
    }
}

/// Non-overlapping occurrences of `token` in `haystack`, left to right. An
/// empty token matches (zero-width) at every position, including past the
/// end of the string — this lets two adjacent keys with nothing between
/// them still search the whole remaining input.
fn find_token_positions(haystack: &str, token: &str) -> Vec<TokenPosition> {
    if token.is_empty() {
        return (0..=haystack.len())
            .map(|i| TokenPosition { start: i, end: i })
            .collect();
    }
    haystack
        .match_indices(token)
        .map(|(start, matched)| TokenPosition {
            start,
            end: start + matched.len(),
        })
        .collect()
}

/// Collapse redundant separators and resolve `.`/`..` components, without
/// touching the filesystem.
pub(crate) fn normalize_path(path: &str) -> String {
    Path::new(path).clean().to_string_lossy().into_owned()
}
