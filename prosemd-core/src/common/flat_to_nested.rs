//! Folds a flat stream of open/close/leaf events into a nested document tree.
//!
//! # The High-Level Concept
//!
//! The algorithm keeps a stack of open containers. Opening a container pushes
//! a frame, closing it pops the frame, turns it into a [`Node`] and appends
//! that node to the container below. Leaves are appended to the innermost
//! open container. Marks are not containers: they are kept on a separate
//! stack and stamped onto every inline leaf added while they are open.
//!
//! # Staying Inside the Schema
//!
//! Every push and append is checked against the content model of the
//! receiving container, and the builder repairs what does not fit instead of
//! failing:
//!
//! - Inline content arriving where blocks are expected opens an *implicit*
//!   paragraph (and, inside a list, an implicit list item first). Implicit
//!   frames close as soon as something they cannot hold arrives, or when the
//!   container they were opened in closes.
//! - A container the schema does not allow at this point, or one the caller
//!   has no node for, becomes a *transparent* frame: it produces no node and
//!   its content lands in the nearest real container.
//! - A close with no matching open is ignored; whatever is still open at the
//!   end is closed; containers that must hold content and ended up empty get
//!   an empty paragraph.
//!
//! The result is always valid under the schema the builder was created with.

use crate::mapping::Attrs;
use crate::model::{normalize_marks, Mark, Node};
use crate::schema::{ContentModel, MarkKind, NodeKind, Schema};
use crate::tokenizer::TokenKind;

#[derive(Debug)]
enum FrameKind {
    Node {
        kind: NodeKind,
        attrs: Attrs,
        implicit: bool,
    },
    Transparent,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    opened_by: Option<TokenKind>,
    content: Vec<Node>,
}

impl Frame {
    fn node(kind: NodeKind, attrs: Attrs, opened_by: Option<TokenKind>, implicit: bool) -> Self {
        Frame {
            kind: FrameKind::Node {
                kind,
                attrs,
                implicit,
            },
            opened_by,
            content: Vec::new(),
        }
    }

    fn is_implicit(&self) -> bool {
        matches!(self.kind, FrameKind::Node { implicit: true, .. })
    }
}

/// Incremental, schema-aware tree construction.
#[derive(Debug)]
pub struct TreeBuilder<'s> {
    schema: &'s Schema,
    stack: Vec<Frame>,
    /// Open marks in the order they were opened
    marks: Vec<Mark>,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        TreeBuilder {
            schema,
            stack: vec![Frame::node(NodeKind::Doc, Attrs::None, None, false)],
            marks: Vec::new(),
        }
    }

    /// Opens a container node, or a transparent frame if the schema does not
    /// allow `kind` here.
    pub fn open(&mut self, kind: NodeKind, attrs: Attrs, opened_by: TokenKind) {
        if self.place_block(kind) {
            self.stack
                .push(Frame::node(kind, attrs, Some(opened_by), false));
        } else {
            tracing::trace!(node = %kind, context = %self.context(), "node not allowed here, flattening");
            self.stack.push(Frame {
                kind: FrameKind::Transparent,
                opened_by: Some(opened_by),
                content: Vec::new(),
            });
        }
    }

    /// Opens a container that produces no node of its own.
    pub fn open_transparent(&mut self, opened_by: TokenKind) {
        tracing::trace!(token = %opened_by, "unmapped container, flattening");
        while self.top().is_implicit() {
            self.pop_frame();
        }
        self.stack.push(Frame {
            kind: FrameKind::Transparent,
            opened_by: Some(opened_by),
            content: Vec::new(),
        });
    }

    /// Closes the innermost frame opened by `opened_by`, and everything
    /// opened inside it.
    pub fn close(&mut self, opened_by: TokenKind) {
        let Some(index) = self
            .stack
            .iter()
            .rposition(|frame| frame.opened_by == Some(opened_by))
        else {
            tracing::trace!(token = %opened_by, "close without matching open ignored");
            return;
        };
        while self.stack.len() > index {
            self.pop_frame();
        }
    }

    /// Appends a block-level leaf (a rule, a whole code block).
    ///
    /// Returns `false` if the schema allows no such node here.
    pub fn block_leaf(&mut self, node: Node) -> bool {
        if !self.place_block(node.kind()) {
            tracing::trace!(node = %node.kind(), "block leaf not allowed here, dropped");
            return false;
        }
        self.receiver().push(node);
        true
    }

    /// Appends an inline leaf carrying the currently open marks.
    pub fn inline(&mut self, node: Node) {
        self.ensure_inline_context();
        let context = self.context();
        match self.schema.content_model(context) {
            Some(ContentModel::Inline) => {
                let marks = self.active_marks();
                let node = with_marks(node, marks);
                push_inline(self.receiver(), node);
            }
            Some(ContentModel::Text) => {
                let text = match &node {
                    Node::Image { attrs, .. } => attrs.alt.clone().unwrap_or_default(),
                    other => other.text_content(),
                };
                if !text.is_empty() {
                    push_inline(self.receiver(), Node::text(text));
                }
            }
            _ => {
                tracing::trace!(node = %node.kind(), context = %context, "inline node dropped");
            }
        }
    }

    /// Appends text carrying the currently open marks.
    pub fn text(&mut self, text: &str) {
        if !text.is_empty() {
            self.inline(Node::text(text));
        }
    }

    /// Appends text carrying the open marks plus `mark`.
    pub fn text_with_mark(&mut self, text: &str, mark: Mark) {
        if text.is_empty() {
            return;
        }
        self.marks.push(mark);
        self.text(text);
        self.marks.pop();
    }

    pub fn push_mark(&mut self, mark: Mark) {
        self.marks.push(mark);
    }

    /// Closes the most recently opened mark of `kind`.
    pub fn pop_mark(&mut self, kind: MarkKind) {
        if let Some(index) = self.marks.iter().rposition(|mark| mark.kind() == kind) {
            self.marks.remove(index);
        } else {
            tracing::trace!(mark = %kind, "mark close without matching open ignored");
        }
    }

    /// Closes every open frame and returns the document.
    pub fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.pop_frame();
        }
        let root = self.stack.pop().map(|frame| frame.content).unwrap_or_default();
        Node::doc(fill_required(NodeKind::Doc, root))
    }

    fn top(&self) -> &Frame {
        // The root frame is never popped before `finish`.
        &self.stack[self.stack.len() - 1]
    }

    fn receiver_index(&self) -> usize {
        self.stack
            .iter()
            .rposition(|frame| matches!(frame.kind, FrameKind::Node { .. }))
            .unwrap_or(0)
    }

    fn receiver(&mut self) -> &mut Vec<Node> {
        let index = self.receiver_index();
        &mut self.stack[index].content
    }

    /// Kind of the nearest real container.
    fn context(&self) -> NodeKind {
        match &self.stack[self.receiver_index()].kind {
            FrameKind::Node { kind, .. } => *kind,
            FrameKind::Transparent => NodeKind::Doc,
        }
    }

    fn active_marks(&self) -> Vec<Mark> {
        normalize_marks(self.marks.clone())
    }

    /// Makes room for a block of `kind`, closing implicit frames or opening
    /// an implicit list item as needed. Returns whether it can be placed.
    fn place_block(&mut self, kind: NodeKind) -> bool {
        loop {
            let context = self.context();
            if self.schema.allows(context, kind) {
                return true;
            }
            if self.top().is_implicit() {
                self.pop_frame();
                continue;
            }
            if self.schema.content_model(context) == Some(ContentModel::ListItems)
                && self.schema.allows(NodeKind::ListItem, kind)
            {
                self.push_implicit(NodeKind::ListItem);
                return true;
            }
            return false;
        }
    }

    fn ensure_inline_context(&mut self) {
        loop {
            match self.schema.content_model(self.context()) {
                Some(ContentModel::Blocks) => self.push_implicit(NodeKind::Paragraph),
                Some(ContentModel::ListItems) => self.push_implicit(NodeKind::ListItem),
                _ => return,
            }
        }
    }

    fn push_implicit(&mut self, kind: NodeKind) {
        tracing::trace!(node = %kind, "opening implicit node");
        self.stack.push(Frame::node(kind, Attrs::None, None, true));
    }

    fn pop_frame(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame.kind {
            FrameKind::Transparent => {}
            FrameKind::Node { kind, attrs, .. } => {
                let node = build_node(kind, attrs, frame.content);
                self.receiver().push(node);
            }
        }
    }
}

fn with_marks(node: Node, marks: Vec<Mark>) -> Node {
    match node {
        Node::Text { text, .. } => Node::Text { text, marks },
        Node::Image { attrs, .. } => Node::Image { attrs, marks },
        Node::Emoji { attrs, .. } => Node::Emoji { attrs, marks },
        other => other,
    }
}

/// Appends an inline node, merging adjacent text with identical marks.
fn push_inline(content: &mut Vec<Node>, node: Node) {
    if let (
        Some(Node::Text {
            text: last_text,
            marks: last_marks,
        }),
        Node::Text { text, marks },
    ) = (content.last_mut(), &node)
    {
        if last_marks == marks {
            last_text.push_str(text);
            return;
        }
    }
    content.push(node);
}

fn fill_required(kind: NodeKind, content: Vec<Node>) -> Vec<Node> {
    if !content.is_empty() {
        return content;
    }
    match kind {
        NodeKind::Doc | NodeKind::Blockquote | NodeKind::ListItem => {
            vec![Node::paragraph(Vec::new())]
        }
        NodeKind::BulletList | NodeKind::OrderedList => {
            vec![Node::list_item(vec![Node::paragraph(Vec::new())])]
        }
        _ => content,
    }
}

/// Builds a node of `kind` from its extracted attributes and children.
pub fn build_node(kind: NodeKind, attrs: Attrs, content: Vec<Node>) -> Node {
    let content = fill_required(kind, content);
    match (kind, attrs) {
        (NodeKind::Doc, _) => Node::Doc { content },
        (NodeKind::Paragraph, _) => Node::Paragraph { content },
        (NodeKind::Blockquote, _) => Node::Blockquote { content },
        (NodeKind::ListItem, _) => Node::ListItem { content },
        (NodeKind::Heading, Attrs::Heading(attrs)) => Node::Heading { attrs, content },
        (NodeKind::Heading, _) => Node::Heading {
            attrs: Default::default(),
            content,
        },
        (NodeKind::CodeBlock, Attrs::CodeBlock(attrs)) => Node::CodeBlock { attrs, content },
        (NodeKind::CodeBlock, _) => Node::CodeBlock {
            attrs: Default::default(),
            content,
        },
        (NodeKind::OrderedList, Attrs::OrderedList(attrs)) => Node::OrderedList { attrs, content },
        (NodeKind::OrderedList, _) => Node::OrderedList {
            attrs: Default::default(),
            content,
        },
        (NodeKind::BulletList, Attrs::BulletList(attrs)) => Node::BulletList { attrs, content },
        (NodeKind::BulletList, _) => Node::BulletList {
            attrs: Default::default(),
            content,
        },
        (NodeKind::HorizontalRule, _) => Node::HorizontalRule,
        (NodeKind::HardBreak, _) => Node::HardBreak,
        (NodeKind::Image, Attrs::Image(attrs)) => Node::Image {
            attrs,
            marks: Vec::new(),
        },
        (NodeKind::Image, _) => Node::Image {
            attrs: Default::default(),
            marks: Vec::new(),
        },
        (NodeKind::Emoji, Attrs::Emoji(attrs)) => Node::Emoji {
            attrs,
            marks: Vec::new(),
        },
        (NodeKind::Emoji, _) => Node::Emoji {
            attrs: Default::default(),
            marks: Vec::new(),
        },
        (NodeKind::Text, _) => Node::text(
            content
                .iter()
                .map(Node::text_content)
                .collect::<String>(),
        ),
    }
}
