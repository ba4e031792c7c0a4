use desk_router::{
    canonicalize, encode_panes_segment, parse_panes_segment, PaneParams, RouterPaneSibling, RouterPanes,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn any_text() -> impl Strategy<Value = String> {
    "\\PC{0,8}"
}

fn any_id() -> impl Strategy<Value = String> {
    "\\PC{1,8}"
}

fn any_params() -> impl Strategy<Value = PaneParams> {
    proptest::collection::vec(
        (prop_oneof![Just("view".to_string()), Just("rev".to_string()), any_text()], any_text()),
        0..4,
    )
    .prop_map(|entries| entries.into_iter().collect())
}

fn any_sibling() -> impl Strategy<Value = RouterPaneSibling> {
    (any_id(), any_params(), proptest::option::of(any_id())).prop_map(|(id, params, payload_ref)| RouterPaneSibling {
        id,
        params,
        payload: None,
        payload_ref,
    })
}

fn single_sibling_panes() -> impl Strategy<Value = RouterPanes> {
    proptest::collection::vec(any_sibling().prop_map(|s| vec![s]), 0..5)
}

fn split_panes() -> impl Strategy<Value = RouterPanes> {
    proptest::collection::vec(proptest::collection::vec(any_sibling(), 1..4), 0..4)
}

proptest! {
    #[test]
    fn prop_single_sibling_groups_round_trip(panes in single_sibling_panes()) {
        let encoded = encode_panes_segment(&panes);
        let parsed = parse_panes_segment(&encoded).unwrap();
        prop_assert_eq!(parsed, panes);
    }

    #[test]
    fn prop_encoding_is_stable_after_one_round(panes in split_panes()) {
        let encoded = encode_panes_segment(&panes);
        let reencoded = encode_panes_segment(&parse_panes_segment(&encoded).unwrap());
        prop_assert_eq!(reencoded, encoded);
    }

    #[test]
    fn prop_canonical_form_is_a_fixed_point(panes in split_panes()) {
        let canonical = canonicalize(&panes).unwrap();
        prop_assert_eq!(canonicalize(&canonical).unwrap(), canonical);
    }

    #[test]
    fn prop_parse_never_panics(input in "\\PC{0,40}") {
        let _ = parse_panes_segment(&input);
    }
}

#[test]
fn leading_slash_is_optional() {
    assert_eq!(
        parse_panes_segment("/author;a1").unwrap(),
        parse_panes_segment("author;a1").unwrap()
    );
}

#[test]
fn sibling_inheritance_survives_round_trip() {
    let input = "book;b1,perspective=drafts,view=editor,ref9|,view=preview|b2";
    let panes = parse_panes_segment(input).unwrap();
    let group = &panes[1];

    assert_eq!(group[1].id, "b1");
    assert_eq!(group[1].param("perspective"), Some("drafts"));
    assert_eq!(group[1].payload_ref.as_deref(), Some("ref9"));
    assert_eq!(group[2].id, "b2");
    assert_eq!(group[2].param("view"), None);
    assert_eq!(group[2].param("perspective"), Some("drafts"));

    assert_eq!(encode_panes_segment(&panes), input);
}

#[test]
fn empty_groups_are_dropped() {
    let panes = parse_panes_segment("a;;b;").unwrap();
    assert_eq!(panes.len(), 2);
    assert_eq!(encode_panes_segment(&panes), "a;b");
}
