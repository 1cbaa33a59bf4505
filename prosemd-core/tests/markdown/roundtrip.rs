//! Round-trip properties
//!
//! Trees drawn from a generated grammar must survive serialize → parse
//! unchanged, and arbitrary text must always parse to a valid tree.

use crate::common::{blocks, markdown, parse, serialize};
use prosemd_core::tokenizer::MAX_NESTING;
use prosemd_core::{Format, Mark, MarkKind, Node, NodeKind, Schema, SchemaBuilder};
use proptest::prelude::*;

/// Words with punctuation that may sit right against a delimiter.
fn words() -> impl Strategy<Value = String> {
    prop::collection::vec(r#"[("]?[a-z]{1,8}[)!?.,"]?"#, 1..4).prop_map(|words| words.join(" "))
}

fn plain_words() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 1..3).prop_map(|words| words.join(" "))
}

fn marks() -> impl Strategy<Value = Vec<Mark>> {
    prop_oneof![
        3 => Just(vec![]),
        1 => Just(vec![Mark::Em]),
        1 => Just(vec![Mark::Strong]),
        1 => Just(vec![Mark::Code]),
        1 => Just(vec![Mark::Strike]),
        1 => Just(vec![Mark::Em, Mark::Strong]),
        1 => Just(vec![Mark::link("https://example.com/x", None)]),
    ]
}

#[derive(Debug, Clone)]
enum Segment {
    Text(String, Vec<Mark>),
    Leaf(Node),
}

#[derive(Debug, Clone, Copy)]
enum Join {
    Space,
    /// No space, when exactly one side carries marks.
    Glue,
    Break,
}

fn segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        8 => (words(), marks()).prop_map(|(text, marks)| Segment::Text(text, marks)),
        1 => (plain_words(), proptest::option::of(plain_words())).prop_map(|(alt, title)| {
            Segment::Leaf(Node::image("img.png", Some(&alt), title.as_deref()))
        }),
        1 => Just(Segment::Leaf(Node::emoji(":rabbit:", "🐰"))),
    ]
}

fn join(breaks: bool) -> BoxedStrategy<Join> {
    if breaks {
        prop_oneof![4 => Just(Join::Space), 2 => Just(Join::Glue), 1 => Just(Join::Break)].boxed()
    } else {
        prop_oneof![2 => Just(Join::Space), 1 => Just(Join::Glue)].boxed()
    }
}

/// Appends text, merging into the previous leaf when the marks agree.
fn push_text(nodes: &mut Vec<Node>, text: &str, marks: Vec<Mark>) {
    if let Some(Node::Text {
        text: last,
        marks: last_marks,
    }) = nodes.last_mut()
    {
        if *last_marks == marks {
            last.push_str(text);
            return;
        }
    }
    nodes.push(Node::marked_text(text, marks));
}

fn push_segment(nodes: &mut Vec<Node>, segment: Segment) {
    match segment {
        Segment::Text(text, marks) => push_text(nodes, &text, marks),
        Segment::Leaf(node) => nodes.push(node),
    }
}

fn glues(prev: &Segment, next: &Segment) -> bool {
    match (prev, next) {
        (Segment::Text(_, a), Segment::Text(_, b)) => a.is_empty() != b.is_empty(),
        _ => false,
    }
}

/// Inline content; `breaks` allows hard breaks between segments.
fn inline(breaks: bool) -> impl Strategy<Value = Vec<Node>> {
    (
        segment(),
        prop::collection::vec((join(breaks), segment()), 0..4),
    )
        .prop_map(|(first, rest)| {
            let mut nodes = Vec::new();
            let mut prev = first.clone();
            push_segment(&mut nodes, first);
            for (join, next) in rest {
                match join {
                    Join::Break => nodes.push(Node::hard_break()),
                    Join::Glue if glues(&prev, &next) => {}
                    Join::Space | Join::Glue => push_text(&mut nodes, " ", vec![]),
                }
                prev = next.clone();
                push_segment(&mut nodes, next);
            }
            nodes
        })
}

fn leaf_block() -> impl Strategy<Value = Node> {
    prop_oneof![
        6 => inline(true).prop_map(Node::paragraph),
        1 => Just(Node::paragraph(vec![])),
        2 => (1u8..=6, inline(false)).prop_map(|(level, content)| Node::heading(level, content)),
        2 => (
            proptest::option::of("[a-z]{1,5}"),
            prop::collection::vec(words(), 1..4)
        )
            .prop_map(|(language, lines)| Node::code_block(language.as_deref(), &lines.join("\n"))),
        1 => Just(Node::horizontal_rule()),
    ]
}

fn flat_item() -> BoxedStrategy<Node> {
    inline(true)
        .prop_map(|content| Node::list_item(vec![Node::paragraph(content)]))
        .boxed()
}

/// A list of `items`; nested ordered lists start at 1 so they can
/// interrupt the paragraph before them.
fn list(items: BoxedStrategy<Node>, tight: bool, min: usize, nested: bool) -> BoxedStrategy<Node> {
    let order = if nested { Just(1u32).boxed() } else { (1u32..=5).boxed() };
    (any::<bool>(), order, prop::collection::vec(items, min..4))
        .prop_map(move |(bullet, order, items)| {
            if bullet {
                Node::bullet_list(tight, items)
            } else {
                Node::ordered_list(order, tight, items)
            }
        })
        .boxed()
}

/// Tight lists whose items may end in a nested tight list.
fn tight_list(depth: u32, nested: bool) -> BoxedStrategy<Node> {
    let item = if depth == 0 {
        flat_item()
    } else {
        (
            inline(true),
            proptest::option::of(tight_list(depth - 1, true)),
        )
            .prop_map(|(content, sublist)| {
                let mut blocks = vec![Node::paragraph(content)];
                blocks.extend(sublist);
                Node::list_item(blocks)
            })
            .boxed()
    };
    list(item, true, 1, nested)
}

/// Loose lists need two items; a single one reads back as tight.
fn loose_list() -> BoxedStrategy<Node> {
    list(flat_item(), false, 2, false)
}

fn block() -> impl Strategy<Value = Node> {
    let flat = prop_oneof![
        6 => leaf_block().boxed(),
        1 => tight_list(2, false),
        1 => loose_list(),
    ];
    flat.prop_recursive(3, 16, 3, |inner| {
        prop::collection::vec(inner, 1..3).prop_map(Node::blockquote)
    })
}

fn document() -> impl Strategy<Value = Node> {
    prop::collection::vec(block(), 1..6).prop_map(Node::doc)
}

/// Text built from the characters Markdown gives meaning to.
fn markdownish() -> impl Strategy<Value = String> {
    "[-#*_`>\\[\\]()!:~ a-z0-9\n.|<&\\\\]{0,160}"
}

proptest! {
    #[test]
    fn generated_trees_round_trip(doc in document()) {
        let md = serialize(&doc);
        prop_assert_eq!(parse(&md), doc, "markdown was:\n{}", md);
    }

    #[test]
    fn serialization_is_idempotent(doc in document()) {
        let once = serialize(&doc);
        let twice = serialize(&parse(&once));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn arbitrary_input_parses_to_a_valid_tree(source in markdownish()) {
        let format = markdown();
        let doc = format.parse(&source).unwrap();
        prop_assert_eq!(Schema::markdown().check(&doc), Ok(()));
        prop_assert!(format.serialize(&doc).is_ok());
    }

    #[test]
    fn arbitrary_input_respects_a_narrow_schema(source in markdownish()) {
        let schema = SchemaBuilder::default()
            .nodes([NodeKind::Doc, NodeKind::Paragraph, NodeKind::Text, NodeKind::Heading])
            .mark(MarkKind::Em)
            .build()
            .unwrap();
        let format = prosemd_core::MarkdownFormat::for_schema(&schema).unwrap();
        let doc = format.parse(&source).unwrap();
        prop_assert_eq!(schema.check(&doc), Ok(()));
        prop_assert!(format.serialize(&doc).is_ok());
    }
}

fn assert_round_trip(doc: Node) {
    let md = serialize(&doc);
    assert_eq!(parse(&md), doc, "markdown was:\n{md}");
}

fn item(text: &str) -> Node {
    Node::list_item(vec![Node::paragraph(vec![Node::text(text)])])
}

#[test]
fn round_trip_fixed_document() {
    assert_round_trip(Node::doc(vec![
        Node::heading(1, vec![Node::text("Title")]),
        Node::paragraph(vec![
            Node::text("go to "),
            Node::marked_text("the site", vec![Mark::link("https://x.com", Some("T"))]),
            Node::text(" now"),
        ]),
        Node::bullet_list(true, vec![item("item")]),
        Node::bullet_list(true, vec![item("second list")]),
    ]));
}

#[test]
fn round_trip_marks_against_punctuation() {
    assert_round_trip(Node::doc(vec![Node::paragraph(vec![
        Node::text("a"),
        Node::marked_text("(b)", vec![Mark::Em]),
        Node::text("c"),
    ])]));
    assert_round_trip(Node::doc(vec![Node::paragraph(vec![
        Node::text("x"),
        Node::marked_text("!y", vec![Mark::Strong]),
    ])]));
    assert_round_trip(Node::doc(vec![Node::paragraph(vec![
        Node::text("x"),
        Node::marked_text("\"q\"", vec![Mark::Em, Mark::Strong]),
        Node::text("z"),
    ])]));
}

#[test]
fn round_trip_normalizes_list_tightness() {
    let loose_single = Node::doc(vec![Node::bullet_list(false, vec![item("a")])]);
    assert_eq!(
        parse(&serialize(&loose_single)),
        Node::doc(vec![Node::bullet_list(true, vec![item("a")])])
    );

    let two_paragraphs = Node::list_item(vec![
        Node::paragraph(vec![Node::text("a")]),
        Node::paragraph(vec![Node::text("b")]),
    ]);
    let tight_but_spread = Node::doc(vec![Node::ordered_list(
        1,
        true,
        vec![two_paragraphs.clone(), item("c")],
    )]);
    assert_eq!(
        parse(&serialize(&tight_but_spread)),
        Node::doc(vec![Node::ordered_list(
            1,
            false,
            vec![two_paragraphs, item("c")]
        )])
    );
}

#[test]
fn round_trip_keeps_empty_paragraphs() {
    assert_round_trip(Node::doc(vec![
        Node::paragraph(vec![Node::text("a")]),
        Node::paragraph(vec![]),
        Node::paragraph(vec![Node::text("b")]),
    ]));
    assert_round_trip(Node::doc(vec![Node::blockquote(vec![Node::paragraph(
        vec![],
    )])]));
}

#[test]
fn round_trip_keeps_line_breaks_inside_text() {
    assert_round_trip(Node::doc(vec![Node::paragraph(vec![
        Node::text("a\nb"),
        Node::hard_break(),
        Node::text("c"),
    ])]));
    assert_round_trip(Node::doc(vec![Node::heading(3, vec![Node::text("a\r\nb")])]));
}

#[test]
fn deeply_nested_input_is_capped() {
    let doc = parse(&format!("{}x", ">".repeat(1000)));
    assert_eq!(Schema::markdown().check(&doc), Ok(()));

    let top = blocks(doc.clone());
    let mut depth = 0;
    let mut node = &top[0];
    while let Node::Blockquote { content } = node {
        depth += 1;
        node = &content[0];
    }
    assert_eq!(depth, MAX_NESTING);
    assert_eq!(node, &Node::paragraph(vec![Node::text("x")]));

    assert_round_trip(doc);
}

#[test]
fn deeply_nested_lists_are_capped() {
    let doc = parse(&format!("{}x", "* ".repeat(500)));
    assert_eq!(Schema::markdown().check(&doc), Ok(()));
    assert_round_trip(doc);
}
