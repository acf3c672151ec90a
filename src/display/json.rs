//! JSON payload rendering.

use serde_json::Value;

use super::text::{format_text, FormatError, LineFormat};

const INDENT: &str = "  ";

/// Render `node` as an indented tree, cut off below `max_level` and after
/// `max_children` entries per container.
///
/// Arrays expand while `level < max_level`; objects expand while
/// `level <= max_level` and otherwise show a `...` line.
pub fn traverse_json(node: &Value, level: usize, max_level: usize, max_children: usize) -> String {
    let pad = INDENT.repeat(level);
    let child_pad = INDENT.repeat(level + 1);

    match node {
        Value::Array(items) => {
            let mut out = format!("{pad}[\n");
            if level < max_level {
                for (i, item) in items.iter().enumerate() {
                    if i >= max_children {
                        out.push_str(&format!("{child_pad}...\n"));
                        break;
                    }
                    out.push_str(&traverse_json(item, level + 1, max_level, max_children));
                }
            }
            out.push_str(&format!("{pad}]\n"));
            out
        }
        Value::Object(map) => {
            let mut out = format!("{pad}{{\n");
            if level <= max_level {
                for (i, (key, value)) in map.iter().enumerate() {
                    if i >= max_children {
                        out.push_str(&format!("{child_pad}...\n"));
                        break;
                    }
                    out.push_str(&format!("{child_pad}\"{key}\": "));
                    if is_container(value) {
                        out.push('\n');
                        out.push_str(&traverse_json(value, level + 1, max_level, max_children));
                    } else {
                        out.push_str(&scalar(value));
                        out.push('\n');
                    }
                }
            } else {
                out.push_str(&format!("{child_pad}...\n"));
            }
            out.push_str(&format!("{pad}}}\n"));
            out
        }
        scalar_value => format!("{pad}{}\n", scalar(scalar_value)),
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

/// First `numlines` lines of `value` as pretty JSON.
pub fn json_head(value: &Value, numlines: usize) -> String {
    // Serializing a `Value` cannot fail.
    let pretty = serde_json::to_string_pretty(value).unwrap_or_default();
    pretty.lines().take(numlines).collect::<Vec<_>>().join("\n")
}

/// Format `value` for display.
///
/// When `depth` or `children` is given the depth-limited tree is used, with
/// depth defaulting to 100 and children to the depth. Otherwise the value is
/// rendered as pretty JSON.
pub fn format_data(
    value: &Value,
    nlines: Option<usize>,
    fmt: &LineFormat,
    depth: Option<usize>,
    children: Option<usize>,
) -> Result<Vec<String>, FormatError> {
    if depth.is_some() || children.is_some() {
        let depth = depth.unwrap_or(100);
        let children = children.unwrap_or(depth);
        let tree = traverse_json(value, 0, depth, children);
        return format_text(&tree, nlines, fmt, false);
    }

    let pretty = serde_json::to_string_pretty(value)?;
    format_text(&pretty, nlines, fmt, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Overflow;
    use serde_json::json;

    #[test]
    fn test_traverse_scalars() {
        assert_eq!(traverse_json(&json!("hi"), 1, 5, 5), "  \"hi\"\n");
        assert_eq!(traverse_json(&json!(42), 0, 5, 5), "42\n");
        assert_eq!(traverse_json(&json!(1.5), 0, 5, 5), "1.5\n");
        assert_eq!(traverse_json(&json!(null), 0, 5, 5), "null\n");
    }

    #[test]
    fn test_traverse_nested() {
        let value = json!({"name": "x", "tags": ["a", "b"], "ok": true});
        // Object keys keep payload order.
        let expected = "{\n  \"name\": \"x\"\n  \"tags\": \n  [\n    \"a\"\n    \"b\"\n  ]\n  \"ok\": true\n}\n";
        assert_eq!(traverse_json(&value, 0, 5, 5), expected);
    }

    #[test]
    fn test_traverse_limits_children() {
        let value = json!([1, 2, 3, 4]);
        assert_eq!(traverse_json(&value, 0, 5, 2), "[\n  1\n  2\n  ...\n]\n");
    }

    #[test]
    fn test_traverse_limits_depth() {
        // Arrays stop expanding at max_level.
        assert_eq!(traverse_json(&json!([[1]]), 0, 1, 5), "[\n  [\n  ]\n]\n");

        // Objects expand at max_level and elide below it.
        let value = json!({"a": {"b": {"c": 1}}});
        let expected = "{\n  \"a\": \n  {\n    \"b\": \n    {\n      ...\n    }\n  }\n}\n";
        assert_eq!(traverse_json(&value, 0, 1, 5), expected);
    }

    #[test]
    fn test_json_head() {
        let value: Value = serde_json::from_str(r#"{"c": 3, "a": 1, "b": 2}"#).unwrap();
        assert_eq!(json_head(&value, 2), "{\n  \"c\": 3,");
        assert_eq!(json_head(&value, 100), serde_json::to_string_pretty(&value).unwrap());
    }

    #[test]
    fn test_format_data() {
        let fmt = LineFormat {
            width: Some(80),
            mode: Overflow::Truncate,
            ..LineFormat::default()
        };
        let value = json!({"list": [1, 2, 3]});

        let pretty = format_data(&value, Some(2), &fmt, None, None).unwrap();
        assert_eq!(pretty, vec!["{", "  \"list\": ["]);

        let tree = format_data(&value, None, &fmt, None, Some(1)).unwrap();
        assert_eq!(tree, vec!["{", "  \"list\": ", "  [", "    1", "    ...", "  ]", "}"]);
    }
}
