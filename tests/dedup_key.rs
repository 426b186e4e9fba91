// tests/dedup_key.rs
use sector_news_relay::ingest::dedup::DedupKey;
use sector_news_relay::RawItem;

#[test]
fn same_url_means_same_key_regardless_of_other_fields() {
    let a = RawItem::new("a", "标题一", "内容一", "https://e.test/n/1");
    let b = RawItem::new("b", "完全不同", "", " https://e.test/n/1 ").with_tags(["稀土"]);
    assert_eq!(DedupKey::of(&a), DedupKey::of(&b));
    assert_eq!(DedupKey::of(&a).as_str(), "url:https://e.test/n/1");
}

#[test]
fn empty_url_falls_back_to_title() {
    let a = RawItem::new("a", "黄金 | 伦敦金 现价:2351.2", "x", "");
    let b = RawItem::new("b", "黄金 | 伦敦金 现价:2351.2", "y", "");
    assert_eq!(DedupKey::of(&a), DedupKey::of(&b));
    assert!(DedupKey::of(&a).as_str().starts_with("title:"));
}

#[test]
fn content_only_items_get_a_stable_fingerprint() {
    let a = RawItem::new("a", "", "只有正文的快讯", "");
    let b = RawItem::new("b", "", "只有正文的快讯", "");
    let c = RawItem::new("c", "", "另一条快讯", "");
    assert_eq!(DedupKey::of(&a), DedupKey::of(&b));
    assert_ne!(DedupKey::of(&a), DedupKey::of(&c));
    assert!(DedupKey::of(&a).as_str().starts_with("raw:"));
}
