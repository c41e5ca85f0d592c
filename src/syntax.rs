//! Syntax tree capability shared by every tree csyntax can serialize.
//!
//! The serializer never sees a concrete parser. It sees a [`SyntaxNode`]: something that can
//! resolve its label against a rule-name table, list its children in source order and count
//! them. The generated C parser's `pest` pairs implement it, and so does the owned
//! [`LabeledNode`] tree used to build trees by hand.

use std::borrow::Cow;
use std::fmt::Debug;

use pest::iterators::Pair;
use pest::RuleType;

/// Represents a byte span in the source code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl From<pest::Span<'_>> for Span {
    fn from(span: pest::Span<'_>) -> Self {
        Span {
            start: span.start(),
            end: span.end(),
        }
    }
}

/// Resolves a grammar rule to its human-readable name.
pub trait RuleNames<R> {
    fn rule_name(&self, rule: R) -> Cow<'_, str>;
}

/// Names every rule after its `Debug` representation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugRuleNames;

impl<R: Debug> RuleNames<R> for DebugRuleNames {
    fn rule_name(&self, rule: R) -> Cow<'_, str> {
        Cow::Owned(format!("{rule:?}"))
    }
}

/// A node of a rooted, ordered, labeled tree.
///
/// Implementations must return children in the order they appeared in the source, and
/// `child_count` must agree with `children().len()`.
pub trait SyntaxNode: Sized {
    /// Rule type the label table is keyed by.
    type Rule;

    /// The rule name of an internal node, or the token text of a leaf.
    fn label(&self, names: &dyn RuleNames<Self::Rule>) -> String;

    fn children(&self) -> Vec<Self>;

    fn child_count(&self) -> usize {
        self.children().len()
    }
}

/// An owned labeled tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabeledNode {
    pub label: String,
    pub children: Vec<LabeledNode>,
}

impl LabeledNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn node(label: impl Into<String>, children: Vec<LabeledNode>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Owned nodes carry their label; the rule table is not consulted.
impl<'a> SyntaxNode for &'a LabeledNode {
    type Rule = ();

    fn label(&self, _names: &dyn RuleNames<()>) -> String {
        self.label.clone()
    }

    fn children(&self) -> Vec<Self> {
        let node: &'a LabeledNode = *self;
        node.children.iter().collect()
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Pairs produced by any `pest`-generated parser.
///
/// A pair with inner pairs is labeled by its rule name. A pair without inner pairs is a token
/// and is labeled by the text it matched, unless it matched nothing (end of input, empty
/// productions), in which case its rule name is used.
impl<'i, R: RuleType> SyntaxNode for Pair<'i, R> {
    type Rule = R;

    fn label(&self, names: &dyn RuleNames<R>) -> String {
        let text = self.as_str();
        if self.child_count() == 0 && !text.is_empty() {
            return text.to_string();
        }
        names.rule_name(self.as_rule()).into_owned()
    }

    fn children(&self) -> Vec<Self> {
        self.clone().into_inner().collect()
    }

    fn child_count(&self) -> usize {
        self.clone().into_inner().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_takes_pest_byte_offsets() {
        let span = pest::Span::new("int x;", 4, 5).unwrap();
        assert_eq!(Span::from(span), Span { start: 4, end: 5 });
        assert_eq!(Span::default(), Span { start: 0, end: 0 });
    }

    #[test]
    fn labeled_node_exposes_children_in_order() {
        let tree = LabeledNode::node(
            "stmt",
            vec![LabeledNode::leaf("a"), LabeledNode::leaf(";")],
        );
        let root = &tree;
        assert_eq!(root.label(&DebugRuleNames), "stmt");
        assert_eq!(root.child_count(), 2);
        let labels: Vec<_> = root
            .children()
            .into_iter()
            .map(|c| c.label(&DebugRuleNames))
            .collect();
        assert_eq!(labels, vec!["a", ";"]);
        assert!(root.children()[0].is_leaf());
    }

    #[test]
    fn debug_rule_names_use_variant_names() {
        #[derive(Debug)]
        enum Rule {
            Declaration,
        }
        assert_eq!(DebugRuleNames.rule_name(Rule::Declaration), "Declaration");
    }
}
