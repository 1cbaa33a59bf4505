//! Schema registry
//!
//! A [`Schema`] is the closed, immutable set of node and mark types one
//! editor instance works with, together with their attributes and content
//! rules. It is the single source of truth for both directions: the parser
//! only produces kinds the schema contains, and the serializer refuses trees
//! that do not conform to it.
//!
//! Schemas select a subset of the kinds in [`NodeKind`] and [`MarkKind`].
//! `doc`, `paragraph` and `text` are always required; the list kinds and
//! `list_item` only make sense together.

mod kinds;

pub use kinds::{MarkKind, NodeKind};

use crate::error::SchemaViolation;
use crate::model::{Mark, Node};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Deepest node level [`Schema::check`] accepts, counting `doc` as 1.
pub const MAX_DEPTH: usize = 64;

/// What a node may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentModel {
    /// One or more nodes of the block group
    Blocks,
    /// Zero or more nodes of the inline group, marks allowed
    Inline,
    /// Zero or more unmarked text nodes
    Text,
    /// One or more list items
    ListItems,
    /// A leaf
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    Integer,
    String,
    OptionalString,
    Boolean,
}

/// One attribute of a node or mark type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttrSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: AttrType,
    /// `None` means the attribute is required.
    pub default: Option<Value>,
}

impl AttrSpec {
    fn required(name: &'static str, ty: AttrType) -> Self {
        AttrSpec {
            name,
            ty,
            default: None,
        }
    }

    fn with_default(name: &'static str, ty: AttrType, default: Value) -> Self {
        AttrSpec {
            name,
            ty,
            default: Some(default),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSpec {
    pub kind: NodeKind,
    pub content: ContentModel,
    pub attrs: Vec<AttrSpec>,
}

impl NodeSpec {
    fn for_kind(kind: NodeKind) -> Self {
        use AttrType::*;
        let (content, attrs) = match kind {
            NodeKind::Doc | NodeKind::Blockquote | NodeKind::ListItem => {
                (ContentModel::Blocks, vec![])
            }
            NodeKind::Paragraph => (ContentModel::Inline, vec![]),
            NodeKind::Heading => (
                ContentModel::Inline,
                vec![AttrSpec::with_default("level", Integer, json!(1))],
            ),
            NodeKind::CodeBlock => (
                ContentModel::Text,
                vec![AttrSpec::with_default("language", OptionalString, Value::Null)],
            ),
            NodeKind::OrderedList => (
                ContentModel::ListItems,
                vec![
                    AttrSpec::with_default("order", Integer, json!(1)),
                    AttrSpec::with_default("tight", Boolean, json!(false)),
                ],
            ),
            NodeKind::BulletList => (
                ContentModel::ListItems,
                vec![AttrSpec::with_default("tight", Boolean, json!(false))],
            ),
            NodeKind::Image => (
                ContentModel::Empty,
                vec![
                    AttrSpec::required("src", String),
                    AttrSpec::with_default("alt", OptionalString, Value::Null),
                    AttrSpec::with_default("title", OptionalString, Value::Null),
                ],
            ),
            NodeKind::Emoji => (
                ContentModel::Empty,
                vec![
                    AttrSpec::required("short_name", String),
                    AttrSpec::required("text", String),
                ],
            ),
            NodeKind::HorizontalRule | NodeKind::Text | NodeKind::HardBreak => {
                (ContentModel::Empty, vec![])
            }
        };
        NodeSpec {
            kind,
            content,
            attrs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkSpec {
    pub kind: MarkKind,
    pub attrs: Vec<AttrSpec>,
    /// Marks that cannot share a mark set with this one
    pub excludes: Vec<MarkKind>,
}

impl MarkSpec {
    fn for_kind(kind: MarkKind) -> Self {
        let attrs = match kind {
            MarkKind::Link => vec![
                AttrSpec::required("href", AttrType::String),
                AttrSpec::with_default("title", AttrType::OptionalString, Value::Null),
            ],
            MarkKind::Em | MarkKind::Strong | MarkKind::Strike | MarkKind::Code => vec![],
        };
        MarkSpec {
            kind,
            attrs,
            excludes: vec![kind],
        }
    }
}

/// Immutable registry of the node and mark types of one editor instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    nodes: BTreeMap<NodeKind, NodeSpec>,
    marks: BTreeMap<MarkKind, MarkSpec>,
}

impl Schema {
    /// Every node and mark kind: the full Markdown schema.
    pub fn markdown() -> Self {
        Schema::assemble(
            NodeKind::ALL.into_iter().collect(),
            MarkKind::ALL.into_iter().collect(),
        )
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Builds a schema from type names, e.g. taken from a configuration file.
    pub fn from_names<N, M>(nodes: N, marks: M) -> Result<Self, SchemaViolation>
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let mut builder = Schema::builder();
        for name in nodes {
            builder = builder.node(name.as_ref().parse()?);
        }
        for name in marks {
            builder = builder.mark(name.as_ref().parse()?);
        }
        builder.build()
    }

    fn assemble(nodes: BTreeSet<NodeKind>, marks: BTreeSet<MarkKind>) -> Self {
        Schema {
            nodes: nodes
                .into_iter()
                .map(|kind| (kind, NodeSpec::for_kind(kind)))
                .collect(),
            marks: marks
                .into_iter()
                .map(|kind| (kind, MarkSpec::for_kind(kind)))
                .collect(),
        }
    }

    pub fn has_node(&self, kind: NodeKind) -> bool {
        self.nodes.contains_key(&kind)
    }

    pub fn has_mark(&self, kind: MarkKind) -> bool {
        self.marks.contains_key(&kind)
    }

    /// Looks up a node type by name.
    pub fn node_type(&self, name: &str) -> Result<&NodeSpec, SchemaViolation> {
        name.parse::<NodeKind>()
            .ok()
            .and_then(|kind| self.nodes.get(&kind))
            .ok_or_else(|| SchemaViolation::UnknownNodeType(name.to_string()))
    }

    /// Looks up a mark type by name.
    pub fn mark_type(&self, name: &str) -> Result<&MarkSpec, SchemaViolation> {
        name.parse::<MarkKind>()
            .ok()
            .and_then(|kind| self.marks.get(&kind))
            .ok_or_else(|| SchemaViolation::UnknownMarkType(name.to_string()))
    }

    pub fn is_node(&self, name: &str) -> bool {
        self.node_type(name).is_ok()
    }

    pub fn is_mark(&self, name: &str) -> bool {
        self.mark_type(name).is_ok()
    }

    /// Attribute specs of a node or mark type.
    pub fn attrs(&self, type_name: &str) -> Result<&[AttrSpec], SchemaViolation> {
        if let Ok(spec) = self.node_type(type_name) {
            return Ok(&spec.attrs);
        }
        self.mark_type(type_name)
            .map(|spec| spec.attrs.as_slice())
            .map_err(|err| {
                if type_name.parse::<NodeKind>().is_ok() {
                    SchemaViolation::UnknownNodeType(type_name.to_string())
                } else if type_name.parse::<MarkKind>().is_ok() {
                    err
                } else {
                    SchemaViolation::UnknownType(type_name.to_string())
                }
            })
    }

    pub fn attr(&self, type_name: &str, attr: &str) -> Result<&AttrSpec, SchemaViolation> {
        self.attrs(type_name)?
            .iter()
            .find(|spec| spec.name == attr)
            .ok_or_else(|| SchemaViolation::UnknownAttribute {
                type_name: type_name.to_string(),
                attr: attr.to_string(),
            })
    }

    pub fn node_names(&self) -> Vec<&'static str> {
        self.nodes.keys().map(|kind| kind.name()).collect()
    }

    pub fn mark_names(&self) -> Vec<&'static str> {
        self.marks.keys().map(|kind| kind.name()).collect()
    }

    pub fn node_kinds(&self) -> impl Iterator<Item = NodeKind> + '_ {
        self.nodes.keys().copied()
    }

    pub fn mark_kinds(&self) -> impl Iterator<Item = MarkKind> + '_ {
        self.marks.keys().copied()
    }

    pub fn content_model(&self, kind: NodeKind) -> Option<ContentModel> {
        self.nodes.get(&kind).map(|spec| spec.content)
    }

    /// Whether `child` may appear directly inside `parent`.
    pub fn allows(&self, parent: NodeKind, child: NodeKind) -> bool {
        if !self.has_node(child) {
            return false;
        }
        match self.content_model(parent) {
            Some(ContentModel::Blocks) => child.is_block(),
            Some(ContentModel::Inline) => child.is_inline(),
            Some(ContentModel::Text) => child == NodeKind::Text,
            Some(ContentModel::ListItems) => child == NodeKind::ListItem,
            Some(ContentModel::Empty) | None => false,
        }
    }

    /// Whether inline children of `parent` may carry marks.
    pub fn allows_marks(&self, parent: NodeKind) -> bool {
        self.content_model(parent) == Some(ContentModel::Inline)
    }

    /// Checks a whole document against the schema, including its depth
    /// against [`MAX_DEPTH`].
    pub fn check(&self, doc: &Node) -> Result<(), SchemaViolation> {
        if doc.kind() != NodeKind::Doc {
            return Err(SchemaViolation::InvalidContent {
                parent: "(root)".to_string(),
                child: doc.kind().name().to_string(),
            });
        }

        // Depth-first, in document order, with the parent kind of each node.
        let mut stack = vec![(doc, None, 1)];
        while let Some((node, parent, depth)) = stack.pop() {
            let kind = node.kind();
            if !self.has_node(kind) {
                return Err(SchemaViolation::UnknownNodeType(kind.name().to_string()));
            }
            if let Some(parent) = parent {
                if !self.allows(parent, kind) {
                    return Err(SchemaViolation::InvalidContent {
                        parent: parent.name().to_string(),
                        child: kind.name().to_string(),
                    });
                }
                self.check_marks(parent, node.marks())?;
            }
            self.check_attrs(node)?;

            let content = node.content();
            if content.is_empty()
                && matches!(
                    self.content_model(kind),
                    Some(ContentModel::Blocks | ContentModel::ListItems)
                )
            {
                return Err(SchemaViolation::EmptyContent(kind.name().to_string()));
            }
            if !content.is_empty() && depth >= MAX_DEPTH {
                return Err(SchemaViolation::TooDeep(MAX_DEPTH));
            }
            stack.extend(content.iter().rev().map(|child| (child, Some(kind), depth + 1)));
        }
        Ok(())
    }

    fn check_attrs(&self, node: &Node) -> Result<(), SchemaViolation> {
        match node {
            Node::Heading { attrs, .. } if !(1..=6).contains(&attrs.level) => {
                Err(SchemaViolation::InvalidAttribute {
                    type_name: "heading".to_string(),
                    attr: "level".to_string(),
                    reason: format!("{} is outside 1..=6", attrs.level),
                })
            }
            Node::Text { text, .. } if text.is_empty() => {
                Err(SchemaViolation::EmptyContent("text".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_marks(&self, parent: NodeKind, marks: &[Mark]) -> Result<(), SchemaViolation> {
        let mut seen = BTreeSet::new();
        for mark in marks {
            let kind = mark.kind();
            if !self.has_mark(kind) {
                return Err(SchemaViolation::UnknownMarkType(kind.name().to_string()));
            }
            if !self.allows_marks(parent) {
                return Err(SchemaViolation::InvalidMark {
                    parent: parent.name().to_string(),
                    mark: kind.name().to_string(),
                });
            }
            let excluded = self.marks[&kind]
                .excludes
                .iter()
                .any(|other| seen.contains(other));
            if excluded {
                return Err(SchemaViolation::DuplicateMark(kind.name().to_string()));
            }
            seen.insert(kind);
        }
        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema::markdown()
    }
}

/// Selects the kinds of a [`Schema`]; validated by [`SchemaBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    nodes: BTreeSet<NodeKind>,
    marks: BTreeSet<MarkKind>,
}

impl SchemaBuilder {
    /// A builder preloaded with every kind, for subtracting from.
    pub fn markdown() -> Self {
        SchemaBuilder {
            nodes: NodeKind::ALL.into_iter().collect(),
            marks: MarkKind::ALL.into_iter().collect(),
        }
    }

    pub fn node(mut self, kind: NodeKind) -> Self {
        self.nodes.insert(kind);
        self
    }

    pub fn nodes(mut self, kinds: impl IntoIterator<Item = NodeKind>) -> Self {
        self.nodes.extend(kinds);
        self
    }

    pub fn mark(mut self, kind: MarkKind) -> Self {
        self.marks.insert(kind);
        self
    }

    pub fn marks(mut self, kinds: impl IntoIterator<Item = MarkKind>) -> Self {
        self.marks.extend(kinds);
        self
    }

    pub fn without_node(mut self, kind: NodeKind) -> Self {
        self.nodes.remove(&kind);
        self
    }

    pub fn without_mark(mut self, kind: MarkKind) -> Self {
        self.marks.remove(&kind);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaViolation> {
        for required in [NodeKind::Doc, NodeKind::Paragraph, NodeKind::Text] {
            if !self.nodes.contains(&required) {
                return Err(SchemaViolation::MissingRequired(required.name().to_string()));
            }
        }

        let has_item = self.nodes.contains(&NodeKind::ListItem);
        if let Some(list) = self.nodes.iter().find(|kind| kind.is_list()) {
            if !has_item {
                return Err(SchemaViolation::InvalidContent {
                    parent: list.name().to_string(),
                    child: NodeKind::ListItem.name().to_string(),
                });
            }
        } else if has_item {
            return Err(SchemaViolation::MissingRequired(format!(
                "{} or {} (required by list_item)",
                NodeKind::BulletList.name(),
                NodeKind::OrderedList.name()
            )));
        }

        Ok(Schema::assemble(self.nodes, self.marks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Schema {
        Schema::builder()
            .nodes([NodeKind::Doc, NodeKind::Paragraph, NodeKind::Text])
            .build()
            .unwrap()
    }

    #[test]
    fn markdown_schema_enumerates_every_kind() {
        let schema = Schema::markdown();
        assert_eq!(schema.node_names().len(), NodeKind::ALL.len());
        assert_eq!(
            schema.mark_names(),
            vec!["link", "em", "strong", "strike", "code"]
        );
    }

    #[test]
    fn lookups_distinguish_nodes_and_marks() {
        let schema = Schema::markdown();
        assert!(schema.is_node("heading"));
        assert!(!schema.is_mark("heading"));
        assert!(schema.is_mark("strike"));
        assert_eq!(
            schema.node_type("table").unwrap_err(),
            SchemaViolation::UnknownNodeType("table".into())
        );
        assert_eq!(
            minimal().mark_type("em").unwrap_err(),
            SchemaViolation::UnknownMarkType("em".into())
        );
    }

    #[test]
    fn attribute_specs_carry_defaults() {
        let schema = Schema::markdown();
        let level = schema.attr("heading", "level").unwrap();
        assert_eq!(level.default, Some(json!(1)));
        let href = schema.attr("link", "href").unwrap();
        assert_eq!(href.default, None);
        assert!(matches!(
            schema.attr("paragraph", "level"),
            Err(SchemaViolation::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn attribute_lookup_names_the_missing_kind() {
        assert_eq!(
            minimal().attrs("link").unwrap_err(),
            SchemaViolation::UnknownMarkType("link".into())
        );
        assert_eq!(
            minimal().attrs("image").unwrap_err(),
            SchemaViolation::UnknownNodeType("image".into())
        );
        assert_eq!(
            Schema::markdown().attrs("underline").unwrap_err(),
            SchemaViolation::UnknownType("underline".into())
        );
    }

    #[test]
    fn build_requires_doc_paragraph_and_text() {
        let err = Schema::builder()
            .nodes([NodeKind::Doc, NodeKind::Text])
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaViolation::MissingRequired("paragraph".into()));
    }

    #[test]
    fn lists_and_items_come_together() {
        let without_items = SchemaBuilder::markdown().without_node(NodeKind::ListItem).build();
        assert!(without_items.is_err());

        let only_items = SchemaBuilder::markdown()
            .without_node(NodeKind::BulletList)
            .without_node(NodeKind::OrderedList)
            .build();
        assert!(only_items.is_err());

        let bullets_only = SchemaBuilder::markdown()
            .without_node(NodeKind::OrderedList)
            .build();
        assert!(bullets_only.is_ok());
    }

    #[test]
    fn from_names_rejects_unknown_names() {
        let err = Schema::from_names(["doc", "paragraph", "text", "table"], ["em"]).unwrap_err();
        assert_eq!(err, SchemaViolation::UnknownNodeType("table".into()));
        let schema = Schema::from_names(["doc", "paragraph", "text"], ["em"]).unwrap();
        assert!(schema.has_mark(MarkKind::Em));
    }

    #[test]
    fn content_models_gate_children() {
        let schema = Schema::markdown();
        assert!(schema.allows(NodeKind::Doc, NodeKind::Heading));
        assert!(!schema.allows(NodeKind::Paragraph, NodeKind::Heading));
        assert!(schema.allows(NodeKind::BulletList, NodeKind::ListItem));
        assert!(!schema.allows(NodeKind::BulletList, NodeKind::Paragraph));
        assert!(schema.allows(NodeKind::CodeBlock, NodeKind::Text));
        assert!(!schema.allows(NodeKind::CodeBlock, NodeKind::HardBreak));
        assert!(!schema.allows_marks(NodeKind::CodeBlock));
        assert!(!minimal().allows(NodeKind::Doc, NodeKind::Heading));
    }

    #[test]
    fn check_accepts_valid_documents() {
        let doc = Node::doc(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::bullet_list(
                true,
                vec![Node::list_item(vec![Node::paragraph(vec![
                    Node::marked_text("x", vec![Mark::Em]),
                ])])],
            ),
        ]);
        assert_eq!(Schema::markdown().check(&doc), Ok(()));
    }

    #[test]
    fn check_reports_the_first_violation() {
        let schema = Schema::markdown();

        let marked_code = Node::doc(vec![Node::CodeBlock {
            attrs: Default::default(),
            content: vec![Node::marked_text("x", vec![Mark::Strong])],
        }]);
        assert!(matches!(
            schema.check(&marked_code),
            Err(SchemaViolation::InvalidMark { .. })
        ));

        let duplicate = Node::doc(vec![Node::paragraph(vec![Node::Text {
            text: "x".into(),
            marks: vec![Mark::Em, Mark::Em],
        }])]);
        assert_eq!(
            schema.check(&duplicate),
            Err(SchemaViolation::DuplicateMark("em".into()))
        );

        let level = Node::doc(vec![Node::heading(9, vec![])]);
        assert!(matches!(
            schema.check(&level),
            Err(SchemaViolation::InvalidAttribute { .. })
        ));

        assert_eq!(
            schema.check(&Node::doc(vec![])),
            Err(SchemaViolation::EmptyContent("doc".into()))
        );
        assert!(schema.check(&Node::paragraph(vec![])).is_err());
    }

    #[test]
    fn check_rejects_kinds_outside_the_schema() {
        let doc = Node::doc(vec![Node::paragraph(vec![Node::marked_text(
            "x",
            vec![Mark::Strong],
        )])]);
        assert_eq!(
            minimal().check(&doc),
            Err(SchemaViolation::UnknownMarkType("strong".into()))
        );

        let doc = Node::doc(vec![Node::horizontal_rule()]);
        assert_eq!(
            minimal().check(&doc),
            Err(SchemaViolation::UnknownNodeType("horizontal_rule".into()))
        );
    }

    #[test]
    fn check_bounds_the_nesting_depth() {
        fn quoted(levels: usize) -> Node {
            let mut node = Node::paragraph(vec![Node::text("x")]);
            for _ in 0..levels {
                node = Node::blockquote(vec![node]);
            }
            Node::doc(vec![node])
        }
        // doc, the quotes, paragraph and text
        assert_eq!(Schema::markdown().check(&quoted(MAX_DEPTH - 3)), Ok(()));
        assert_eq!(
            Schema::markdown().check(&quoted(MAX_DEPTH - 2)),
            Err(SchemaViolation::TooDeep(MAX_DEPTH))
        );
    }
}
