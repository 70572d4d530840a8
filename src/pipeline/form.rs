use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::pipeline::body::{BodyError, BodyLimits};

/// One bracketed part of a form key.
#[derive(Debug, PartialEq, Eq)]
enum Segment {
    /// `[]`
    Append,
    /// `[2]`, for indices up to the array limit.
    Index(usize),
    /// `[name]`, or an index above the array limit.
    Key(String),
}

/// The value tree built up while pairs are read. Arrays are sparse until the tree is converted.
#[derive(Debug)]
enum Node {
    Leaf(String),
    Array(BTreeMap<usize, Node>),
    Object(BTreeMap<String, Node>),
}

impl Node {
    fn into_value(self) -> Value {
        match self {
            Node::Leaf(value) => Value::String(value),
            Node::Array(items) => Value::Array(items.into_values().map(Node::into_value).collect()),
            Node::Object(fields) => Value::Object(
                fields.into_iter().map(|(key, node)| (key, node.into_value())).collect::<Map<String, Value>>()
            ),
        }
    }
}

/// Decodes an URL-encoded body into a nested object, expanding bracketed keys.
/// `a[b]=1&c[]=2&c[]=3` decodes to `{"a": {"b": "1"}, "c": ["2", "3"]}`.
pub fn parse(input: &[u8], limits: &BodyLimits) -> Result<Value, BodyError> {
    let pairs: Vec<_> = form_urlencoded::parse(input).take(limits.max_parameters + 1).collect();
    if pairs.len() > limits.max_parameters {
        return Err(BodyError::TooManyParameters);
    }

    let mut root: BTreeMap<String, Node> = BTreeMap::new();
    for (key, value) in pairs {
        if key.is_empty() {
            continue;
        }
        let (name, segments) = split_key(&key, limits);
        let existing = root.remove(&name);
        root.insert(name, assign(existing, &segments, value.into_owned()));
    }

    Ok(Node::Object(root).into_value())
}

/// Splits `a[b][0]` into the root name `a` and its segments. Segments beyond the depth limit, and any text
/// following the last well-formed bracket, are kept as one literal key.
fn split_key(key: &str, limits: &BodyLimits) -> (String, Vec<Segment>) {
    let open = key.find('[').filter(|&i| key[i..].contains(']'));
    let (name, mut rest) = match open {
        _ if limits.max_depth == 0 => return (key.to_string(), vec![]),
        None => return (key.to_string(), vec![]),
        Some(0) => match key.find(']') {
            Some(close) if close > 1 => (&key[1..close], &key[close + 1..]),
            _ => return (key.to_string(), vec![]),
        },
        Some(open) => (&key[..open], &key[open..]),
    };

    let mut segments = vec![];
    while segments.len() < limits.max_depth && rest.starts_with('[') {
        let close = match rest.find(']') {
            Some(close) => close,
            None => break,
        };
        let inner = &rest[1..close];
        if inner.contains('[') {
            break;
        }
        segments.push(segment(inner, limits.array_limit));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Key(rest.to_string()));
    }

    (name.to_string(), segments)
}

fn segment(inner: &str, array_limit: usize) -> Segment {
    if inner.is_empty() {
        return Segment::Append;
    }
    match inner.parse::<usize>() {
        Ok(index) if index <= array_limit && index.to_string() == inner => Segment::Index(index),
        _ => Segment::Key(inner.to_string()),
    }
}

fn next_index(items: &BTreeMap<usize, Node>) -> usize {
    items.keys().next_back().map_or(0, |last| last + 1)
}

/// Places the leaf value at the path given by the segments, starting from the existing node in this slot.
fn assign(slot: Option<Node>, segments: &[Segment], leaf: String) -> Node {
    let (first, rest) = match segments.split_first() {
        None => {
            return match slot {
                None => Node::Leaf(leaf),
                Some(Node::Array(mut items)) => {
                    items.insert(next_index(&items), Node::Leaf(leaf));
                    Node::Array(items)
                }
                Some(other) => Node::Array(BTreeMap::from([(0, other), (1, Node::Leaf(leaf))])),
            };
        }
        Some(split) => split,
    };

    match (first, slot) {
        (Segment::Key(key), Some(Node::Object(mut fields))) => {
            let existing = fields.remove(key);
            fields.insert(key.clone(), assign(existing, rest, leaf));
            Node::Object(fields)
        }
        (Segment::Key(key), Some(Node::Array(items))) => {
            let mut fields: BTreeMap<String, Node> = items.into_iter()
                .map(|(index, node)| (index.to_string(), node))
                .collect();
            let existing = fields.remove(key);
            fields.insert(key.clone(), assign(existing, rest, leaf));
            Node::Object(fields)
        }
        (Segment::Key(key), Some(leaf_node @ Node::Leaf(_))) => {
            let object = Node::Object(BTreeMap::from([(key.clone(), assign(None, rest, leaf))]));
            Node::Array(BTreeMap::from([(0, leaf_node), (1, object)]))
        }
        (Segment::Key(key), None) => Node::Object(BTreeMap::from([(key.clone(), assign(None, rest, leaf))])),

        (Segment::Index(index), Some(Node::Object(mut fields))) => {
            let key = index.to_string();
            let existing = fields.remove(&key);
            fields.insert(key, assign(existing, rest, leaf));
            Node::Object(fields)
        }
        (Segment::Append, Some(Node::Object(mut fields))) => {
            fields.insert(fields.len().to_string(), assign(None, rest, leaf));
            Node::Object(fields)
        }
        (position, slot) => {
            let mut items = match slot {
                Some(Node::Array(items)) => items,
                Some(other) => BTreeMap::from([(0, other)]),
                None => BTreeMap::new(),
            };
            let index = match position {
                Segment::Index(index) if rest.is_empty() && items.contains_key(index) => next_index(&items),
                Segment::Index(index) => *index,
                _ => next_index(&items),
            };
            let existing = items.remove(&index);
            items.insert(index, assign(existing, rest, leaf));
            Node::Array(items)
        }
    }
}
