// Browser tests for the DOM-facing pieces: replication and id resolution.
// Run with `wasm-pack test --headless --firefox` (or chrome).

#![cfg(target_arch = "wasm32")]

use feebea::config::Selectors;
use feebea::identity::DuplicateIdentityResolver;
use feebea::replicate::{ContentReplicator, CopyEvent, COPY_ATTRIBUTE, COPY_COUNT};
use wasm_bindgen_test::*;
use web_sys::Document;

wasm_bindgen_test_configure!(run_in_browser);

const PAGE: &str = r#"<div id="infinite-scroll-container">
  <div class="container">
    <h1 id="title">Feebea</h1>
    <label for="name">Name</label>
    <input id="name" aria-describedby="title hint">
    <p id="hint">hint</p>
  </div>
</div>"#;

fn mount() -> Document {
    let doc = web_sys::window().unwrap().document().unwrap();
    doc.body().unwrap().set_inner_html(PAGE);
    doc
}

#[wasm_bindgen_test]
fn replicates_into_three_copies() {
    let doc = mount();
    let replicator = ContentReplicator::new(&Selectors::default());
    let mut events = Vec::new();
    let set = replicator.replicate(&doc, &mut events).unwrap();

    assert_eq!(set.copies().len(), COPY_COUNT);
    assert_eq!(events, vec![CopyEvent::CopyCreated { index: 0 }, CopyEvent::CopyCreated { index: 2 }]);
    let numbers: Vec<String> = set.copies().iter().map(|c| c.get_attribute(COPY_ATTRIBUTE).unwrap()).collect();
    assert_eq!(numbers, vec!["1", "2", "3"]);
    assert!(set.copies()[0].has_attribute("aria-hidden"));
    assert!(!set.middle().unwrap().has_attribute("aria-hidden"));

    // A second pass over an already replicated page adopts it.
    let mut again = Vec::new();
    let adopted = replicator.replicate(&doc, &mut again).unwrap();
    assert_eq!(adopted.copies().len(), COPY_COUNT);
    assert!(again.is_empty());
}

#[wasm_bindgen_test]
fn resolves_duplicate_ids_per_copy() {
    let doc = mount();
    let replicator = ContentReplicator::new(&Selectors::default());
    let set = replicator.replicate(&doc, &mut Vec::new()).unwrap();
    let mut resolver = DuplicateIdentityResolver::new();
    resolver.resolve_all(&set.subtrees().unwrap());

    for id in ["title", "name", "hint", "name--copy2", "name--copy3"] {
        assert_eq!(doc.query_selector_all(&format!("[id=\"{id}\"]")).unwrap().length(), 1, "id {id}");
    }
    let middle = set.middle().unwrap();
    let label = middle.query_selector("label").unwrap().unwrap();
    assert_eq!(label.get_attribute("for").as_deref(), Some("name--copy2"));
    let input = middle.query_selector("input").unwrap().unwrap();
    assert_eq!(input.get_attribute("aria-describedby").as_deref(), Some("title--copy2 hint--copy2"));
    assert_eq!(resolver.map().id_in_copy("name", 3), "name--copy3");
}

#[wasm_bindgen_test]
fn refresh_rebuilds_clones_from_the_middle_copy() {
    let doc = mount();
    let replicator = ContentReplicator::new(&Selectors::default());
    let mut set = replicator.replicate(&doc, &mut Vec::new()).unwrap();
    let middle = set.middle().unwrap().clone();
    middle.query_selector("h1").unwrap().unwrap().set_text_content(Some("changed"));

    let mut events = Vec::new();
    replicator.refresh(&mut set, &mut events).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(set.middle(), Some(&middle));
    for copy in set.copies() {
        assert_eq!(copy.query_selector("h1").unwrap().unwrap().text_content().as_deref(), Some("changed"));
    }
}
