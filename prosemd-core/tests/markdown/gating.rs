//! Schema gating: a parser never produces what its schema lacks.

use crate::common::blocks;
use prosemd_core::tokenizer::{Feature, Tokenizer};
use prosemd_core::{
    Format, Mark, MarkKind, MarkdownFormat, MarkdownParser, Node, NodeKind, Schema, SchemaBuilder,
};

fn parser_without_mark(kind: MarkKind) -> MarkdownParser {
    let schema = SchemaBuilder::markdown().without_mark(kind).build().unwrap();
    MarkdownParser::new(&schema).unwrap()
}

fn parser_without_node(kind: NodeKind) -> MarkdownParser {
    let schema = SchemaBuilder::markdown().without_node(kind).build().unwrap();
    MarkdownParser::new(&schema).unwrap()
}

fn para(text: &str) -> Node {
    Node::paragraph(vec![Node::text(text)])
}

#[test]
fn test_missing_marks_stay_literal() {
    let cases = [
        (MarkKind::Em, "_x_"),
        (MarkKind::Em, "*x*"),
        (MarkKind::Strong, "**x**"),
        (MarkKind::Strong, "__x__"),
        (MarkKind::Strike, "~~x~~"),
        (MarkKind::Code, "`x`"),
    ];
    for (kind, source) in cases {
        assert_eq!(
            blocks(parser_without_mark(kind).parse(source)),
            vec![para(source)],
            "{kind}"
        );
    }
}

#[test]
fn test_missing_link_keeps_the_source() {
    let parser = parser_without_mark(MarkKind::Link);
    assert_eq!(
        blocks(parser.parse(r#"[site](https://x.com "T")"#)),
        vec![para(r#"[site](https://x.com "T")"#)]
    );
    assert_eq!(
        blocks(parser.parse("see https://x.com")),
        vec![para("see https://x.com")]
    );
    assert_eq!(
        blocks(parser.parse("<https://x.com>")),
        vec![para("<https://x.com>")]
    );
}

#[test]
fn test_other_marks_still_apply() {
    assert_eq!(
        blocks(parser_without_mark(MarkKind::Strong).parse("_a_ **b**")),
        vec![Node::paragraph(vec![
            Node::marked_text("a", vec![Mark::Em]),
            Node::text(" **b**"),
        ])]
    );
}

#[test]
fn test_missing_heading_keeps_the_hashes() {
    assert_eq!(
        blocks(parser_without_node(NodeKind::Heading).parse("## Title")),
        vec![para("## Title")]
    );
}

#[test]
fn test_missing_code_block_keeps_the_fence() {
    assert_eq!(
        blocks(parser_without_node(NodeKind::CodeBlock).parse("```js\nx\n```")),
        vec![Node::paragraph(vec![
            Node::text("```js"),
            Node::hard_break(),
            Node::text("x"),
            Node::hard_break(),
            Node::text("```"),
        ])]
    );
}

#[test]
fn test_missing_horizontal_rule_keeps_its_spelling() {
    let parser = parser_without_node(NodeKind::HorizontalRule);
    assert_eq!(
        blocks(parser.parse("a\n\n***\n\nb")),
        vec![para("a"), para("***"), para("b")]
    );
    assert_eq!(blocks(parser.parse("* * *")), vec![para("* * *")]);
    assert_eq!(blocks(parser.parse("---")), vec![para("---")]);
}

#[test]
fn test_missing_blockquote_unwraps() {
    assert_eq!(
        blocks(parser_without_node(NodeKind::Blockquote).parse("> quoted")),
        vec![para("quoted")]
    );
}

#[test]
fn test_missing_hard_break_keeps_newlines() {
    assert_eq!(
        blocks(parser_without_node(NodeKind::HardBreak).parse("a\nb")),
        vec![para("a\nb")]
    );
}

#[test]
fn test_missing_emoji_keeps_shortcode() {
    assert_eq!(
        blocks(parser_without_node(NodeKind::Emoji).parse(":rabbit:")),
        vec![para(":rabbit:")]
    );
}

#[test]
fn test_missing_image_keeps_the_source() {
    assert_eq!(
        blocks(parser_without_node(NodeKind::Image).parse("![alt](a.png)")),
        vec![para("![alt](a.png)")]
    );
}

#[test]
fn test_full_tokenizer_flattens_unmapped_structure() {
    let schema = SchemaBuilder::markdown()
        .without_node(NodeKind::Blockquote)
        .without_mark(MarkKind::Em)
        .build()
        .unwrap();
    let parser = MarkdownParser::with_tokenizer(&schema, Tokenizer::full());
    assert_eq!(
        blocks(parser.parse("> _quoted_ text\n\nafter")),
        vec![para("quoted text"), para("after")]
    );
}

#[test]
fn test_tables_flatten_with_extra_feature() {
    let format =
        MarkdownFormat::configured(&Schema::markdown(), Default::default(), [Feature::Table])
            .unwrap();
    let doc = format.parse("| a | b |\n|---|---|\n| 1 | 2 |").unwrap();
    assert_eq!(
        blocks(doc),
        vec![para("a"), para("b"), para("1"), para("2")]
    );
}

#[test]
fn test_serializer_rejects_gated_kinds() {
    let schema = SchemaBuilder::markdown()
        .without_node(NodeKind::Image)
        .build()
        .unwrap();
    let format = MarkdownFormat::for_schema(&schema).unwrap();
    let doc = Node::doc(vec![Node::paragraph(vec![Node::image("a.png", None, None)])]);
    assert!(format.serialize(&doc).is_err());
}

#[test]
fn test_gated_round_trip() {
    let schema = SchemaBuilder::markdown()
        .without_mark(MarkKind::Strong)
        .build()
        .unwrap();
    let format = MarkdownFormat::for_schema(&schema).unwrap();
    let doc = format.parse("**x** and _y_").unwrap();
    let md = format.serialize(&doc).unwrap();
    assert_eq!(md, r"\*\*x\*\* and _y_");
    assert_eq!(format.parse(&md).unwrap(), doc);
}
