//! Export tests for Markdown format (tree → Markdown)

use crate::common::{fixture, parse, serialize};
use insta::assert_snapshot;
use prosemd_core::formats::HardBreakStyle;
use prosemd_core::{
    FormatError, Mark, MarkdownSerializer, Node, Schema, SchemaViolation, SerializerOptions,
};

fn para(content: Vec<Node>) -> Node {
    Node::paragraph(content)
}

fn item(content: Vec<Node>) -> Node {
    Node::list_item(vec![para(content)])
}

#[test]
fn test_kitchensink_canonical_markdown() {
    let md = serialize(&parse(&fixture("kitchensink.md")));
    assert_snapshot!(md, @r#"
    # Kitchen Sink

    A paragraph with _emphasis_, **strong**, ~~strike~~, `code` and a\
    [link](https://example.com "Example").

    ## Lists

    * first
    * second
      1. nested one
      2. nested two

    3. three
    4. four

    > A quote\
    > spanning lines.

    ```rust
    fn main() {}
    ```

    ---

    Autolink <https://example.com> and :rabbit: and ![logo](logo.png).

    ```
    indented code
    ```
    "#);
}

#[test]
fn test_kitchensink_is_stable() {
    let once = serialize(&parse(&fixture("kitchensink.md")));
    let twice = serialize(&parse(&once));
    assert_eq!(once, twice);
}

#[test]
fn test_configured_markers() {
    let options = SerializerOptions {
        bullet_marker: '-',
        emphasis_marker: '*',
        strong_marker: '_',
        hard_break: HardBreakStyle::Spaces,
    };
    let serializer = MarkdownSerializer::with_options(&Schema::markdown(), options);
    let doc = Node::doc(vec![Node::bullet_list(
        true,
        vec![
            item(vec![Node::marked_text("em", vec![Mark::Em])]),
            item(vec![
                Node::marked_text("strong", vec![Mark::Strong]),
                Node::hard_break(),
                Node::text("next"),
            ]),
        ],
    )]);
    assert_eq!(
        serializer.serialize(&doc).unwrap(),
        "- *em*\n- __strong__  \n  next"
    );
}

#[test]
fn test_link_reproduced() {
    let doc = parse(r#"[site](https://x.com "T")"#);
    assert_eq!(serialize(&doc), r#"[site](https://x.com "T")"#);
}

#[test]
fn test_link_spanning_marks() {
    let href = Mark::link("https://x.com", None);
    let doc = Node::doc(vec![para(vec![
        Node::marked_text("plain ", vec![href.clone()]),
        Node::marked_text("bold", vec![href, Mark::Strong]),
        Node::text(" after"),
    ])]);
    assert_eq!(serialize(&doc), "[plain **bold**](https://x.com) after");
}

#[test]
fn test_adjacent_links_stay_apart() {
    let doc = Node::doc(vec![para(vec![
        Node::marked_text("a", vec![Mark::link("https://a.com", None)]),
        Node::marked_text("b", vec![Mark::link("https://b.com", None)]),
    ])]);
    assert_eq!(serialize(&doc), "[a](https://a.com)[b](https://b.com)");
}

#[test]
fn test_link_destination_with_spaces() {
    let doc = Node::doc(vec![para(vec![Node::marked_text(
        "doc",
        vec![Mark::link("my file.md", None)],
    )])]);
    let md = serialize(&doc);
    assert_eq!(md, "[doc](<my file.md>)");
    assert_eq!(parse(&md), doc);
}

#[test]
fn test_special_characters_survive() {
    let text = "1) not a list, # not a heading, *stars*, [brackets] & <tags> ~~tilde~~ a_b\\c";
    let doc = Node::doc(vec![para(vec![Node::text(text)])]);
    assert_eq!(parse(&serialize(&doc)), doc);
}

#[test]
fn test_code_block_containing_fences() {
    let doc = Node::doc(vec![Node::code_block(Some("md"), "```\ninner\n```")]);
    let md = serialize(&doc);
    assert_eq!(md, "````md\n```\ninner\n```\n````");
    assert_eq!(parse(&md), doc);
}

#[test]
fn test_heading_with_break_round_trips() {
    let doc = Node::doc(vec![Node::heading(
        2,
        vec![Node::text("two"), Node::hard_break(), Node::text("lines")],
    )]);
    let md = serialize(&doc);
    assert_eq!(md, "two\\\nlines\n---");
    assert_eq!(parse(&md), doc);
}

#[test]
fn test_item_holding_a_code_block() {
    let doc = Node::doc(vec![Node::ordered_list(
        1,
        true,
        vec![Node::list_item(vec![
            para(vec![Node::text("run")]),
            Node::code_block(Some("sh"), "make\nmake test"),
        ])],
    )]);
    let md = serialize(&doc);
    assert_eq!(md, "1. run\n   ```sh\n   make\n   make test\n   ```");
    assert_eq!(parse(&md), doc);
}

#[test]
fn test_invalid_trees_are_rejected() {
    let doc = Node::doc(vec![para(vec![Node::heading(1, vec![])])]);
    assert_eq!(
        MarkdownSerializer::new(&Schema::markdown()).serialize(&doc),
        Err(SchemaViolation::InvalidContent {
            parent: "paragraph".to_string(),
            child: "heading".to_string(),
        })
    );

    let format = crate::common::markdown();
    let doc = Node::doc(vec![Node::heading(9, vec![Node::text("deep")])]);
    assert!(matches!(
        prosemd_core::Format::serialize(&format, &doc),
        Err(FormatError::Schema(SchemaViolation::InvalidAttribute { .. }))
    ));
}
