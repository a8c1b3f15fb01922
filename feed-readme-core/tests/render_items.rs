use feed_readme_core::contract::FeedItem;
use feed_readme_core::error::RenderError;
use feed_readme_core::render::{render_items, ItemRenderer};

fn item(title: &str, link: &str) -> FeedItem {
    FeedItem::new().with("title", title).with("link", link)
}

fn two_items() -> Vec<FeedItem> {
    vec![item("A", "http://a"), item("B", "http://b")]
}

#[test]
fn renders_only_the_first_max_items() {
    let rendered = render_items(&two_items(), 1, "- [{{title}}]({{link}})").unwrap();
    assert_eq!(rendered, "- [A](http://a)");
}

#[test]
fn joins_blocks_with_a_single_newline() {
    let rendered = render_items(&two_items(), 5, "- [{{title}}]({{link}})").unwrap();
    assert_eq!(rendered, "- [A](http://a)\n- [B](http://b)");
}

#[test]
fn zero_max_or_empty_feed_renders_nothing() {
    struct TestCase {
        name: &'static str,
        items: Vec<FeedItem>,
        max: usize,
        template: &'static str,
    }

    let test_cases = vec![
        TestCase {
            name: "max of zero",
            items: two_items(),
            max: 0,
            template: "- {{title}}",
        },
        TestCase {
            name: "empty feed",
            items: vec![],
            max: 3,
            template: "- {{title}}",
        },
        TestCase {
            name: "template is not compiled when nothing is selected",
            items: vec![],
            max: 3,
            template: "{{#each}",
        },
    ];

    for tc in test_cases {
        let rendered = render_items(&tc.items, tc.max, tc.template)
            .unwrap_or_else(|e| panic!("{}: unexpected error {e}", tc.name));
        assert_eq!(rendered, "", "{}", tc.name);
    }
}

#[test]
fn absent_fields_render_as_empty_text() {
    let items = vec![FeedItem::new().with("title", "Only a title")];
    let rendered = render_items(&items, 1, "{{title}}|{{link}}|{{pubDate}}").unwrap();
    assert_eq!(rendered, "Only a title||");
}

#[test]
fn list_fields_can_be_looped() {
    let items = vec![FeedItem::new()
        .with("title", "Post")
        .with("categories", vec!["rust".to_string(), "feeds".to_string()])];
    let rendered = render_items(
        &items,
        1,
        "{{title}}:{{#each categories}} #{{this}}{{/each}}",
    )
    .unwrap();
    assert_eq!(rendered, "Post: #rust #feeds");
}

#[test]
fn double_braces_escape_and_triple_braces_do_not() {
    let items = vec![FeedItem::new().with("title", "Fish & <Chips>")];
    let escaped = render_items(&items, 1, "{{title}}").unwrap();
    let raw = render_items(&items, 1, "{{{title}}}").unwrap();
    assert_eq!(escaped, "Fish &amp; &lt;Chips&gt;");
    assert_eq!(raw, "Fish & <Chips>");
}

#[test]
fn broken_template_is_a_template_error() {
    let err = render_items(&two_items(), 2, "{{#each categories}}").unwrap_err();
    assert!(matches!(err, RenderError::Template(_)), "got {err:?}");
}

#[test]
fn renderer_keeps_item_order() {
    let renderer = ItemRenderer::new("{{title}}").unwrap();
    let blocks = renderer
        .render_blocks(&[item("first", ""), item("second", ""), item("third", "")])
        .unwrap();
    assert_eq!(blocks, vec!["first", "second", "third"]);
}
