use crate::error::{Error, Result};
use serde_json::Value as JsonValue;

/// Greedy bracket match: from the first `open` to the last `close` in `text`.
pub fn find_block(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&text[start..end + close.len_utf8()])
}

/// Strict JSON parse, falling back to a relaxed parse of Python-flavoured literals.
pub fn parse_lenient(block: &str) -> Result<JsonValue> {
    match serde_json::from_str(block) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            tracing::debug!(error = %strict_err, "strict JSON parse failed, normalizing literals");
            let relaxed = normalize_literals(block);
            serde_json::from_str(&relaxed).map_err(|_| {
                Error::Extraction(format!(
                    "Failed to parse JSON. Raw extracted string:\n{}",
                    block
                ))
            })
        }
    }
}

/// Locates the first `{...}` block in `text` and parses it leniently.
pub fn extract_object(text: &str) -> Result<JsonValue> {
    let block = find_block(text, '{', '}').ok_or_else(|| {
        Error::Extraction(format!(
            "Could not parse JSON from LLM response. Raw text:\n{}",
            text
        ))
    })?;
    parse_lenient(block)
}

/// Locates the first `[...]` block in `text` and parses it leniently.
pub fn extract_array(text: &str) -> Result<JsonValue> {
    let block = find_block(text, '[', ']').ok_or_else(|| {
        Error::Extraction(format!(
            "Could not find a JSON array in LLM response. Raw text:\n{}",
            text
        ))
    })?;
    parse_lenient(block)
}

/// Rewrites `None`/`True`/`False`, single-quoted strings and trailing commas
/// into strict JSON. String contents are left untouched.
pub fn normalize_literals(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let sc = chars[i];
                    out.push(sc);
                    i += 1;
                    if sc == '\\' {
                        if let Some(&next) = chars.get(i) {
                            out.push(next);
                            i += 1;
                        }
                    } else if sc == '"' {
                        break;
                    }
                }
            }
            '\'' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let sc = chars[i];
                    i += 1;
                    match sc {
                        '\\' => match chars.get(i) {
                            Some('\'') => {
                                out.push('\'');
                                i += 1;
                            }
                            Some(&next) => {
                                out.push('\\');
                                out.push(next);
                                i += 1;
                            }
                            None => out.push('\\'),
                        },
                        '"' => out.push_str("\\\""),
                        '\'' => break,
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
            ',' => {
                let next_significant = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next_significant, Some('}') | Some(']')) {
                    out.push(',');
                }
                i += 1;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "None" => out.push_str("null"),
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    _ => out.push_str(&word),
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_object_inside_prose() {
        let text = r#"Some prose {"candidates":[]} trailing"#;
        assert_eq!(extract_object(text).unwrap(), json!({"candidates": []}));
    }

    #[test]
    fn block_spans_first_open_to_last_close() {
        let text = "a {x} b {y} c";
        assert_eq!(find_block(text, '{', '}'), Some("{x} b {y}"));
        assert_eq!(find_block("} before {", '{', '}'), None);
    }

    #[test]
    fn python_literals_are_normalized() {
        let text = "{'name': 'Asha', 'active': True, 'notes': None, 'remote': False,}";
        let value = parse_lenient(text).unwrap();
        assert_eq!(
            value,
            json!({"name": "Asha", "active": true, "notes": null, "remote": false})
        );
    }

    #[test]
    fn literals_inside_strings_are_preserved() {
        let text = r#"{"note": "True story, None of it", "ok": True}"#;
        let value = parse_lenient(text).unwrap();
        assert_eq!(value["note"], "True story, None of it");
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn single_quoted_string_with_double_quote_is_escaped() {
        let normalized = normalize_literals(r#"{'q': 'say "hi"', 'it\'s': 1}"#);
        let value: JsonValue = serde_json::from_str(&normalized).unwrap();
        assert_eq!(value["q"], r#"say "hi""#);
        assert_eq!(value["it's"], 1);
    }

    #[test]
    fn unparseable_block_is_an_extraction_error() {
        let err = extract_object("here {not json at all} ok").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert!(err.to_string().contains("{not json at all}"));
    }

    #[test]
    fn missing_block_is_an_extraction_error() {
        let err = extract_object("no braces here").unwrap_err();
        assert!(err.to_string().contains("Could not parse JSON"));
    }

    #[test]
    fn array_block_is_found() {
        let value = extract_array("Here you go:\n[{\"Name\": \"A\"}]\nThanks").unwrap();
        assert_eq!(value, json!([{"Name": "A"}]));
    }
}
