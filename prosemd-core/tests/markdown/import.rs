//! Import tests for Markdown format (Markdown → tree)

use crate::common::{blocks, fixture, parse};
use insta::assert_snapshot;
use prosemd_core::{Format, Mark, Node, Schema, TreeFormat};

fn para(content: Vec<Node>) -> Node {
    Node::paragraph(content)
}

fn item(text: &str) -> Node {
    Node::list_item(vec![para(vec![Node::text(text)])])
}

#[test]
fn test_paragraph_simple() {
    assert_eq!(
        blocks(parse("This is a simple paragraph.\n")),
        vec![para(vec![Node::text("This is a simple paragraph.")])]
    );
}

#[test]
fn test_setext_headings() {
    assert_eq!(
        blocks(parse("Title\n=====\n\nSub\n---")),
        vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::heading(2, vec![Node::text("Sub")]),
        ]
    );
}

#[test]
fn test_code_fence_info_string() {
    assert_eq!(
        blocks(parse("```js\nx\n```\n\n```\ny\n```\n\n~~~   \nz\n~~~")),
        vec![
            Node::code_block(Some("js"), "x"),
            Node::code_block(None, "y"),
            Node::code_block(None, "z"),
        ]
    );
}

#[test]
fn test_every_bullet_marker() {
    for md in ["- a\n- b", "* a\n* b", "+ a\n+ b"] {
        assert_eq!(
            blocks(parse(md)),
            vec![Node::bullet_list(true, vec![item("a"), item("b")])],
            "{md}"
        );
    }
}

#[test]
fn test_ordered_list_start_and_delimiters() {
    assert_eq!(
        blocks(parse("2. Two\n3. Three")),
        vec![Node::ordered_list(2, true, vec![item("Two"), item("Three")])]
    );
    assert_eq!(
        blocks(parse("1) one")),
        vec![Node::ordered_list(1, true, vec![item("one")])]
    );
    assert_eq!(
        blocks(parse("0. zero")),
        vec![Node::ordered_list(0, true, vec![item("zero")])]
    );
}

#[test]
fn test_loose_list() {
    assert_eq!(
        blocks(parse("- a\n\n- b")),
        vec![Node::bullet_list(false, vec![item("a"), item("b")])]
    );
}

#[test]
fn test_nested_structure() {
    assert_eq!(
        blocks(parse("> - a\n>   > b")),
        vec![Node::blockquote(vec![Node::bullet_list(
            true,
            vec![Node::list_item(vec![
                para(vec![Node::text("a")]),
                Node::blockquote(vec![para(vec![Node::text("b")])]),
            ])]
        )])]
    );
}

#[test]
fn test_link_forms() {
    let link = |text: &str, href: &str| Node::marked_text(text, vec![Mark::link(href, None)]);

    assert_eq!(
        blocks(parse(r#"[site](https://x.com "T")"#)),
        vec![para(vec![Node::marked_text(
            "site",
            vec![Mark::link("https://x.com", Some("T"))]
        )])]
    );
    assert_eq!(
        blocks(parse("[ref][r]\n\n[r]: https://x.com")),
        vec![para(vec![link("ref", "https://x.com")])]
    );
    assert_eq!(
        blocks(parse("<https://x.com>")),
        vec![para(vec![link("https://x.com", "https://x.com")])]
    );
    assert_eq!(
        blocks(parse("see https://x.com")),
        vec![para(vec![
            Node::text("see "),
            link("https://x.com", "https://x.com"),
        ])]
    );
}

#[test]
fn test_entities_and_escapes_are_decoded() {
    assert_eq!(
        blocks(parse(r"&amp; &copy; \*not em\*")),
        vec![para(vec![Node::text("& © *not em*")])]
    );
}

#[test]
fn test_nested_marks() {
    assert_eq!(
        blocks(parse("***both*** _a **b**_")),
        vec![para(vec![
            Node::marked_text("both", vec![Mark::Em, Mark::Strong]),
            Node::text(" "),
            Node::marked_text("a ", vec![Mark::Em]),
            Node::marked_text("b", vec![Mark::Em, Mark::Strong]),
        ])]
    );
}

#[test]
fn test_two_space_hard_break() {
    assert_eq!(
        blocks(parse("a  \nb")),
        vec![para(vec![
            Node::text("a"),
            Node::hard_break(),
            Node::text("b"),
        ])]
    );
}

#[test]
fn test_raw_html_is_text() {
    assert_eq!(
        blocks(parse("<div>\nhi\n</div>\n\na <b>b</b>")),
        vec![
            para(vec![
                Node::text("<div>"),
                Node::hard_break(),
                Node::text("hi"),
                Node::hard_break(),
                Node::text("</div>"),
            ]),
            para(vec![Node::text("a <b>b</b>")]),
        ]
    );
}

#[test]
fn test_parse_is_schema_valid() {
    let doc = parse(&fixture("kitchensink.md"));
    assert_eq!(Schema::markdown().check(&doc), Ok(()));
}

#[test]
fn test_kitchensink_tree() {
    let doc = parse(&fixture("kitchensink.md"));
    assert_snapshot!(TreeFormat.serialize(&doc).unwrap(), @r#"
    doc
      heading level=1
        text "Kitchen Sink"
      paragraph
        text "A paragraph with "
        text "emphasis" [em]
        text ", "
        text "strong" [strong]
        text ", "
        text "strike" [strike]
        text ", "
        text "code" [code]
        text " and a"
        hard_break
        text "link" [link href="https://example.com" title="Example"]
        text "."
      heading level=2
        text "Lists"
      bullet_list tight=true
        list_item
          paragraph
            text "first"
        list_item
          paragraph
            text "second"
          ordered_list order=1 tight=true
            list_item
              paragraph
                text "nested one"
            list_item
              paragraph
                text "nested two"
      ordered_list order=3 tight=true
        list_item
          paragraph
            text "three"
        list_item
          paragraph
            text "four"
      blockquote
        paragraph
          text "A quote"
          hard_break
          text "spanning lines."
      code_block language="rust"
        text "fn main() {}"
      horizontal_rule
      paragraph
        text "Autolink "
        text "https://example.com" [link href="https://example.com"]
        text " and "
        emoji :rabbit:
        text " and "
        image src="logo.png" alt="logo"
        text "."
      code_block
        text "indented code"
    "#);
}
