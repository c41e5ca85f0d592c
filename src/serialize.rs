//! Concrete-syntax-tree to JSON serialization.
//!
//! The output shape is fixed by the number of children a node has:
//!
//! | children | value                                |
//! |----------|--------------------------------------|
//! | 0        | `"label"`                            |
//! | 1        | `{"label": <child>}`                 |
//! | 2 or more| `{"label": [<child>, <child>, ...]}` |
//!
//! Single-child rules are collapsed into a nested object instead of a one-element array, so
//! pass-through grammar rules do not bloat the output.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::diagnostics::Result;
use crate::err_msg;
use crate::syntax::{RuleNames, SyntaxNode};

/// Four spaces per nesting level in pretty output.
const PRETTY_INDENT: &[u8] = b"    ";

/// Deepest tree [`encode`] and [`decode`] accept, counted in non-leaf nodes.
///
/// Encoding, comparing and dropping a [`SerializedValue`] recurse once per level, so deeper
/// documents are rejected with an error instead.
pub const MAX_DEPTH: usize = 1024;

/// Serialized form of one syntax tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializedValue {
    /// Node without children; its label is the payload.
    Leaf(String),
    /// Node with exactly one child.
    Unary(String, Box<SerializedValue>),
    /// Node with two or more children, in source order.
    Nary(String, Vec<SerializedValue>),
}

impl SerializedValue {
    /// The node label: leaf text or rule name.
    pub fn label(&self) -> &str {
        match self {
            SerializedValue::Leaf(text) => text,
            SerializedValue::Unary(name, _) | SerializedValue::Nary(name, _) => name,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, SerializedValue::Leaf(_))
    }

    /// Nesting depth: 0 for a leaf, otherwise one more than the deepest child.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 0)];
        while let Some((value, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            match value {
                SerializedValue::Leaf(_) => {}
                SerializedValue::Unary(_, child) => pending.push((child, depth + 1)),
                SerializedValue::Nary(_, children) => {
                    pending.extend(children.iter().map(|child| (child, depth + 1)))
                }
            }
        }
        deepest
    }

    /// Converts into the equivalent `serde_json` value.
    pub fn to_json_value(&self) -> Value {
        match self {
            SerializedValue::Leaf(text) => Value::String(text.clone()),
            SerializedValue::Unary(name, child) => single_key(name, child.to_json_value()),
            SerializedValue::Nary(name, children) => single_key(
                name,
                Value::Array(children.iter().map(Self::to_json_value).collect()),
            ),
        }
    }
}

fn single_key(name: &str, value: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(name.to_string(), value);
    Value::Object(map)
}

impl Serialize for SerializedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SerializedValue::Leaf(text) => serializer.serialize_str(text),
            SerializedValue::Unary(name, child) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(name, child)?;
                map.end()
            }
            SerializedValue::Nary(name, children) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(name, children)?;
                map.end()
            }
        }
    }
}

impl TryFrom<Value> for SerializedValue {
    type Error = crate::CsyntaxError;

    fn try_from(value: Value) -> Result<Self> {
        from_json(value)
    }
}

/// One partly decoded object: its label, the JSON children still to convert and the
/// children converted so far.
struct DecodeFrame {
    label: String,
    nary: bool,
    pending: std::vec::IntoIter<Value>,
    values: Vec<SerializedValue>,
}

impl DecodeFrame {
    fn close(self) -> SerializedValue {
        let mut values = self.values;
        if self.nary {
            return SerializedValue::Nary(self.label, values);
        }
        match values.pop() {
            Some(child) => SerializedValue::Unary(self.label, Box::new(child)),
            None => SerializedValue::Leaf(self.label),
        }
    }
}

enum Opened {
    Leaf(SerializedValue),
    Node(DecodeFrame),
}

// Converts over an explicit stack. JSON values are taken apart as they are visited, so
// nothing here recurses, even on the error path.
fn from_json(root: Value) -> Result<SerializedValue> {
    let mut stack: Vec<DecodeFrame> = Vec::new();
    let mut next = root;

    loop {
        let mut value = match open_json(next, &stack) {
            Ok(Opened::Leaf(leaf)) => leaf,
            Ok(Opened::Node(mut frame)) => {
                if stack.len() >= MAX_DEPTH {
                    let err = err_msg!(
                        Decode,
                        "tree at {} is nested deeper than {} levels",
                        json_path(&stack),
                        MAX_DEPTH
                    );
                    frame.pending.for_each(discard);
                    abandon(stack);
                    return Err(err);
                }
                match frame.pending.next() {
                    Some(child) => {
                        stack.push(frame);
                        next = child;
                        continue;
                    }
                    None => frame.close(),
                }
            }
            Err(e) => {
                abandon(stack);
                return Err(e);
            }
        };

        loop {
            let Some(mut parent) = stack.pop() else {
                return Ok(value);
            };
            parent.values.push(value);
            match parent.pending.next() {
                Some(child) => {
                    stack.push(parent);
                    next = child;
                    break;
                }
                None => value = parent.close(),
            }
        }
    }
}

fn open_json(value: Value, stack: &[DecodeFrame]) -> Result<Opened> {
    let map = match value {
        Value::String(text) => return Ok(Opened::Leaf(SerializedValue::Leaf(text))),
        Value::Object(map) if map.len() == 1 => map,
        other => {
            let err = match &other {
                Value::Object(map) => err_msg!(
                    Decode,
                    "expected exactly one key at {}, found {}",
                    json_path(stack),
                    map.len()
                ),
                _ => err_msg!(
                    Decode,
                    "expected a string or a single-key object at {}, found {}",
                    json_path(stack),
                    json_kind(&other)
                ),
            };
            discard(other);
            return Err(err);
        }
    };
    let Some((label, inner)) = map.into_iter().next() else {
        return Err(err_msg!(Decode, "empty object at {}", json_path(stack)));
    };

    let (nary, children) = match inner {
        Value::Array(items) if items.len() >= 2 => (true, items),
        Value::Array(items) => {
            let err = err_msg!(
                Decode,
                "array at {}.{} has {} elements; multi-child nodes have at least 2",
                json_path(stack),
                label,
                items.len()
            );
            items.into_iter().for_each(discard);
            return Err(err);
        }
        child => (false, vec![child]),
    };
    Ok(Opened::Node(DecodeFrame {
        label,
        nary,
        values: Vec::with_capacity(children.len()),
        pending: children.into_iter(),
    }))
}

/// `$.label[index]...` path of the node about to be converted.
fn json_path(stack: &[DecodeFrame]) -> String {
    let mut path = String::from("$");
    for frame in stack {
        path.push('.');
        path.push_str(&frame.label);
        if frame.nary {
            path.push_str(&format!("[{}]", frame.values.len()));
        }
    }
    path
}

fn abandon(stack: Vec<DecodeFrame>) {
    for frame in stack {
        frame.pending.for_each(discard);
    }
}

/// Drops a JSON value of any depth without recursing.
fn discard(value: Value) {
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => pending.extend(items),
            Value::Object(map) => pending.extend(map.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// TRAVERSAL
// ============================================================================

/// One open node on the traversal stack.
struct Frame<N> {
    label: String,
    child_count: usize,
    pending: std::vec::IntoIter<N>,
    values: Vec<SerializedValue>,
}

impl<N: SyntaxNode> Frame<N> {
    fn open(node: N, names: &dyn RuleNames<N::Rule>) -> Self {
        let children = node.children();
        let child_count = node.child_count();
        debug_assert_eq!(child_count, children.len());
        Self {
            label: node.label(names),
            child_count,
            values: Vec::with_capacity(children.len()),
            pending: children.into_iter(),
        }
    }

    fn close(self) -> SerializedValue {
        match self.child_count {
            0 => SerializedValue::Leaf(self.label),
            1 => {
                let mut values = self.values;
                match values.pop() {
                    Some(child) => SerializedValue::Unary(self.label, Box::new(child)),
                    None => SerializedValue::Leaf(self.label),
                }
            }
            _ => SerializedValue::Nary(self.label, self.values),
        }
    }
}

/// Serializes a syntax tree.
///
/// Post-order traversal over an explicit stack, so the walk itself never recurses. Children
/// keep their source order. The result can only be encoded up to [`MAX_DEPTH`] levels.
pub fn serialize<N: SyntaxNode>(root: N, names: &dyn RuleNames<N::Rule>) -> SerializedValue {
    let mut stack: Vec<Frame<N>> = Vec::new();
    let mut current = Frame::open(root, names);

    loop {
        if let Some(child) = current.pending.next() {
            let parent = std::mem::replace(&mut current, Frame::open(child, names));
            stack.push(parent);
            continue;
        }

        let value = current.close();
        match stack.pop() {
            Some(mut parent) => {
                parent.values.push(value);
                current = parent;
            }
            None => return value,
        }
    }
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encodes a serialized tree as JSON text, indented with four spaces when `pretty`.
///
/// Trees nested deeper than [`MAX_DEPTH`] are refused with an `Internal` error.
pub fn encode(value: &SerializedValue, pretty: bool) -> Result<String> {
    let depth = value.depth();
    if depth > MAX_DEPTH {
        return Err(err_msg!(
            Internal,
            "syntax tree is nested {} levels deep; at most {} can be encoded",
            depth,
            MAX_DEPTH
        ));
    }

    let mut out = Vec::new();
    let written = if pretty {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(PRETTY_INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        value.serialize(&mut serializer)
    } else {
        serde_json::to_writer(&mut out, value)
    };
    written.map_err(|e| err_msg!(Internal, "failed to encode syntax tree as JSON: {}", e))?;

    String::from_utf8(out)
        .map_err(|e| err_msg!(Internal, "encoded JSON is not valid UTF-8: {}", e))
}

/// Parses JSON text into a `serde_json` value with no nesting limit.
///
/// Syntax trees of ordinary C files nest deeper than serde_json's default limit of 128. The
/// deserializer runs under `serde_stacker`, which grows the stack on demand, so hostile input
/// cannot overflow it.
pub fn parse_json(text: &str) -> Result<Value> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))
        .map_err(|e| err_msg!(Decode, "invalid JSON: {}", e))?;
    if let Err(e) = deserializer.end() {
        discard(value);
        return Err(err_msg!(Decode, "trailing characters after JSON document: {}", e));
    }
    Ok(value)
}

/// Decodes JSON text produced by [`encode`] (pretty or compact) back into a tree.
///
/// Documents nested deeper than [`MAX_DEPTH`] are rejected with a `Decode` error.
pub fn decode(text: &str) -> Result<SerializedValue> {
    SerializedValue::try_from(parse_json(text)?)
}

/// Compares two JSON documents structurally, ignoring formatting.
pub fn structurally_equal(expected: &str, actual: &str) -> Result<bool> {
    Ok(decode(expected)? == decode(actual)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{DebugRuleNames, LabeledNode};
    use crate::ErrorType;

    fn leaf(label: &str) -> LabeledNode {
        LabeledNode::leaf(label)
    }

    fn node(label: &str, children: Vec<LabeledNode>) -> LabeledNode {
        LabeledNode::node(label, children)
    }

    fn to_json(tree: &LabeledNode) -> String {
        encode(&serialize(tree, &DebugRuleNames), false).unwrap()
    }

    #[test]
    fn leaf_serializes_to_its_label() {
        let tree = leaf("x");
        assert_eq!(
            serialize(&tree, &DebugRuleNames),
            SerializedValue::Leaf("x".into())
        );
        assert_eq!(to_json(&tree), r#""x""#);
    }

    #[test]
    fn single_child_collapses_to_object() {
        let tree = node("expr", vec![leaf("42")]);
        assert_eq!(to_json(&tree), r#"{"expr":"42"}"#);
    }

    #[test]
    fn multiple_children_become_ordered_array() {
        let tree = node("stmt", vec![leaf("a"), leaf(";")]);
        assert_eq!(to_json(&tree), r#"{"stmt":["a",";"]}"#);
    }

    #[test]
    fn three_level_tree() {
        let tree = node(
            "compilationUnit",
            vec![node("decl", vec![leaf("int"), leaf("x")])],
        );
        assert_eq!(to_json(&tree), r#"{"compilationUnit":{"decl":["int","x"]}}"#);
    }

    #[test]
    fn mixed_shapes_keep_order() {
        let tree = node(
            "call",
            vec![
                leaf("f"),
                leaf("("),
                node("args", vec![node("arg", vec![leaf("1")]), leaf(","), leaf("2")]),
                leaf(")"),
            ],
        );
        let expected = SerializedValue::Nary(
            "call".into(),
            vec![
                SerializedValue::Leaf("f".into()),
                SerializedValue::Leaf("(".into()),
                SerializedValue::Nary(
                    "args".into(),
                    vec![
                        SerializedValue::Unary(
                            "arg".into(),
                            Box::new(SerializedValue::Leaf("1".into())),
                        ),
                        SerializedValue::Leaf(",".into()),
                        SerializedValue::Leaf("2".into()),
                    ],
                ),
                SerializedValue::Leaf(")".into()),
            ],
        );
        assert_eq!(serialize(&tree, &DebugRuleNames), expected);
    }

    #[test]
    fn pretty_output_uses_four_space_indent() {
        let tree = node("stmt", vec![leaf("a"), leaf(";")]);
        let text = encode(&serialize(&tree, &DebugRuleNames), true).unwrap();
        assert_eq!(text, "{\n    \"stmt\": [\n        \"a\",\n        \";\"\n    ]\n}");
    }

    #[test]
    fn pretty_and_compact_decode_equal() {
        let tree = node(
            "compilationUnit",
            vec![
                node("decl", vec![leaf("int"), node("declarator", vec![leaf("x")])]),
                leaf("<EOF>"),
            ],
        );
        let value = serialize(&tree, &DebugRuleNames);
        let pretty = encode(&value, true).unwrap();
        let compact = encode(&value, false).unwrap();
        assert_ne!(pretty, compact);
        assert_eq!(decode(&pretty).unwrap(), value);
        assert_eq!(decode(&compact).unwrap(), value);
        assert!(structurally_equal(&pretty, &compact).unwrap());
    }

    #[test]
    fn labels_needing_escapes_survive_round_trip() {
        let tree = node("stringLiteral", vec![leaf("\"a\\n\""), leaf("'\\t'")]);
        let value = serialize(&tree, &DebugRuleNames);
        assert_eq!(decode(&encode(&value, true).unwrap()).unwrap(), value);
    }

    #[test]
    fn equal_trees_serialize_equally() {
        let build = || node("stmt", vec![node("expr", vec![leaf("x")]), leaf(";")]);
        let (a, b) = (build(), build());
        assert_eq!(
            encode(&serialize(&a, &DebugRuleNames), true).unwrap(),
            encode(&serialize(&b, &DebugRuleNames), true).unwrap()
        );
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        const DEPTH: usize = 10_000;
        let mut tree = leaf("x");
        for _ in 0..DEPTH {
            tree = node("wrap", vec![tree]);
        }

        let mut value = serialize(&tree, &DebugRuleNames);

        // Both chains are torn down by hand; dropping them recursively would overflow.
        while let Some(child) = tree.children.pop() {
            tree = child;
        }
        let mut depth = 0;
        loop {
            match value {
                SerializedValue::Unary(name, child) => {
                    assert_eq!(name, "wrap");
                    value = *child;
                    depth += 1;
                }
                other => {
                    assert_eq!(other, SerializedValue::Leaf("x".into()));
                    break;
                }
            }
        }
        assert_eq!(depth, DEPTH);
    }

    #[test]
    fn to_json_value_matches_encoding() {
        let tree = node("stmt", vec![node("expr", vec![leaf("x")]), leaf(";")]);
        let value = serialize(&tree, &DebugRuleNames);
        let parsed = parse_json(&encode(&value, false).unwrap()).unwrap();
        assert_eq!(value.to_json_value(), parsed);
    }

    #[test]
    fn decode_rejects_shapes_the_serializer_never_produces() {
        for text in [
            "42",
            "null",
            "[\"a\", \"b\"]",
            "{}",
            r#"{"a": "x", "b": "y"}"#,
            r#"{"a": ["only"]}"#,
            r#"{"a": []}"#,
            r#"{"a": {"b": true}}"#,
        ] {
            let err = decode(text).unwrap_err();
            assert_eq!(err.error_type(), ErrorType::Decode, "input: {text}");
        }
    }

    #[test]
    fn decode_reports_invalid_json() {
        let err = decode("{\"a\": ").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Decode);
        let err = decode("\"a\" \"b\"").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Decode);
    }

    fn nested_document(depth: usize) -> String {
        format!("{}\"x\"{}", "{\"e\":".repeat(depth), "}".repeat(depth))
    }

    #[test]
    fn decode_handles_deep_documents() {
        let value = decode(&nested_document(500)).unwrap();
        assert_eq!(value.label(), "e");
        assert_eq!(value.depth(), 500);
        assert_eq!(decode(&nested_document(MAX_DEPTH)).unwrap().depth(), MAX_DEPTH);
    }

    #[test]
    fn decode_rejects_documents_past_the_depth_limit() {
        let err = decode(&nested_document(MAX_DEPTH + 1)).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Decode);
        assert!(err.to_string().contains("nested deeper than"));

        // Far past the limit the document is still parsed and taken apart without recursion.
        let err = decode(&nested_document(100_000)).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Decode);
        let arrays = format!("{}{}", "[".repeat(100_000), "]".repeat(100_000));
        assert_eq!(decode(&arrays).unwrap_err().error_type(), ErrorType::Decode);
    }

    #[test]
    fn decode_errors_name_the_offending_path() {
        let err = decode(r#"{"a": ["x", {"b": 1}]}"#).unwrap_err();
        assert!(err.to_string().contains("$.a[1].b"), "{err}");
        let err = decode(r#"{"a": {"b": []}}"#).unwrap_err();
        assert!(err.to_string().contains("$.a.b"), "{err}");
    }

    #[test]
    fn encode_refuses_trees_past_the_depth_limit() {
        let mut value = SerializedValue::Leaf("x".into());
        for _ in 0..=MAX_DEPTH {
            value = SerializedValue::Unary("wrap".into(), Box::new(value));
        }
        assert_eq!(value.depth(), MAX_DEPTH + 1);
        let err = encode(&value, false).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Internal);
    }

    #[test]
    fn depth_follows_the_deepest_child() {
        let tree = node("a", vec![leaf("x"), node("b", vec![node("c", vec![leaf("y")])])]);
        assert_eq!(serialize(&tree, &DebugRuleNames).depth(), 3);
        assert_eq!(SerializedValue::Leaf("x".into()).depth(), 0);
    }
}
