//! Tokenising a definition string into literal/optional segments, and
//! expanding optional sections into the set of concrete variation strings.

use crate::error::DefinitionError;
use winnow::{
    Parser,
    combinator::{alt, delimited, repeat},
    token::take_while,
};

/// One piece of a raw definition, before optional-section resolution
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Plain characters, outside of any `[...]` section
    Literal(String),
    /// The inner contents of a `[...]` section, brackets stripped
    Optional(String),
}

/// A literal substring or a `{key_name}` reference, as found by scanning a
/// single (already bracket-resolved) definition string
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(String),
    KeyRef(String),
}

/// Characters allowed in a template key name: `[a-zA-Z_ 0-9.]+`
fn is_key_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ' ' || c == '.'
}

fn optional_segment(input: &mut &str) -> winnow::Result<Segment> {
    delimited(
        '[',
        take_while(0.., |c| c != ']').map(str::to_string),
        ']',
    )
    .map(Segment::Optional)
    .parse_next(input)
}

fn literal_segment(input: &mut &str) -> winnow::Result<Segment> {
    take_while(1.., |c| c != '[' && c != ']')
        .map(|s: &str| Segment::Literal(s.to_string()))
        .parse_next(input)
}

fn segments(input: &mut &str) -> winnow::Result<Vec<Segment>> {
    repeat(0.., alt((optional_segment, literal_segment))).parse_next(input)
}

/// Split a raw definition into literal and optional segments. Fails if
/// brackets are unbalanced (a stray `[` or `]`).
fn split_segments(definition: &str) -> Result<Vec<Segment>, DefinitionError> {
    segments.parse(definition).map_err(|_| {
        DefinitionError::UnbalancedBrackets {
            definition: definition.to_string(),
        }
    })
}

/// Does this optional section's contents include at least one `{key}`
/// reference?
fn contains_key_ref(s: &str) -> bool {
    scan_tokens(s).iter().any(|t| matches!(t, Token::KeyRef(_)))
}

/// Expand a definition's optional sections into every concrete variation
/// string, longest-first with duplicates removed (matching
/// [`Template::_definition_variations`] in the original implementation).
pub(crate) fn expand_variations(
    definition: &str,
) -> Result<Vec<String>, DefinitionError> {
    let segments = split_segments(definition)?;

    let mut definitions = vec![String::new()];
    for segment in segments {
        match segment {
            Segment::Literal(literal) => {
                if literal.contains('[') || literal.contains(']') {
                    return Err(DefinitionError::UnbalancedBrackets {
                        definition: definition.to_string(),
                    });
                }
                for def in &mut definitions {
                    def.push_str(&literal);
                }
            }
            Segment::Optional(inner) => {
                if !contains_key_ref(&inner) {
                    return Err(DefinitionError::EmptyOptionalSection {
                        section: inner,
                    });
                }
                // Every existing definition branches: with and without this
                // section included.
                let mut with_section = definitions.clone();
                for def in &mut with_section {
                    def.push_str(&inner);
                }
                definitions.extend(with_section);
            }
        }
    }

    // Longest (most inclusive) first; stable sort preserves enumeration
    // order among ties.
    definitions.sort_by_key(|def| std::cmp::Reverse(def.len()));

    let mut seen = std::collections::HashSet::new();
    definitions.retain(|def| seen.insert(def.clone()));

    Ok(definitions)
}

/// Scan a concrete (bracket-free) definition string into alternating
/// literal/key-reference tokens, e.g. `"shots/{Shot}/work"` becomes
/// `[Literal("shots/"), KeyRef("Shot"), Literal("/work")]`.
pub(crate) fn scan_tokens(definition: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let bytes = definition.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{'
            && let Some(close) = definition[i + 1..].find('}')
        {
            let name = &definition[i + 1..i + 1 + close];
            if !name.is_empty() && name.chars().all(is_key_name_char) {
                if literal_start < i {
                    tokens.push(Token::Literal(
                        definition[literal_start..i].to_string(),
                    ));
                }
                tokens.push(Token::KeyRef(name.to_string()));
                i += 1 + close + 1;
                literal_start = i;
                continue;
            }
        }
        i += 1;
    }
    if literal_start < definition.len() {
        tokens.push(Token::Literal(definition[literal_start..].to_string()));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn expands_optional_sections() {
        let variations = expand_variations("{foo}[_{bar}]").unwrap();
        assert_eq!(variations, vec!["{foo}_{bar}", "{foo}"]);
    }

    #[test]
    fn expands_multiple_optional_sections() {
        let variations = expand_variations("{Shot}[_{name}][.{ext}]").unwrap();
        assert_eq!(
            variations,
            vec![
                "{Shot}_{name}.{ext}",
                "{Shot}_{name}",
                "{Shot}.{ext}",
                "{Shot}",
            ]
        );
    }

    #[test]
    fn no_optional_sections() {
        assert_eq!(
            expand_variations("{foo}_{bar}").unwrap(),
            vec!["{foo}_{bar}"]
        );
    }

    #[test]
    fn rejects_empty_optional_section() {
        let err = expand_variations("foo[bar]").unwrap_err();
        assert!(matches!(err, DefinitionError::EmptyOptionalSection { .. }));
    }

    #[test]
    fn rejects_stray_brackets() {
        assert!(expand_variations("foo]bar").is_err());
        assert!(expand_variations("foo[bar").is_err());
    }

    #[rstest]
    #[case::literals_and_keys(
        "shots/{Shot}/work/{name}.ma",
        vec![
            Token::Literal("shots/".into()),
            Token::KeyRef("Shot".into()),
            Token::Literal("/work/".into()),
            Token::KeyRef("name".into()),
            Token::Literal(".ma".into()),
        ],
    )]
    #[case::leading_and_trailing_key(
        "{a}_{b}",
        vec![
            Token::KeyRef("a".into()),
            Token::Literal("_".into()),
            Token::KeyRef("b".into()),
        ],
    )]
    #[case::single_key("{a}", vec![Token::KeyRef("a".into())])]
    #[case::no_keys("just/literal/text", vec![Token::Literal("just/literal/text".into())])]
    fn scans_expected_tokens(#[case] input: &str, #[case] expected: Vec<Token>) {
        assert_eq!(scan_tokens(input), expected);
    }
}
