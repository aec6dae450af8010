use proptest::prelude::*;
use trellis::negotiation::{negotiate, parse_accept};

const OFFERS: [&str; 3] = ["text/html", "application/json", "application/xml"];
const DEFAULT: &str = "application/json";

fn media_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("text/html".to_string()),
        Just("application/json".to_string()),
        Just("application/xml".to_string()),
        Just("image/png".to_string()),
        Just("text/*".to_string()),
        Just("application/*".to_string()),
        Just("*/*".to_string()),
        "[a-z]{1,8}/[a-z]{1,8}",
    ]
}

fn accept_entry() -> impl Strategy<Value = String> {
    (media_type(), prop::option::of(0u32..=1000)).prop_map(|(media, q)| match q {
        Some(q) => format!("{};q={}", media, q as f32 / 1000.0),
        None => media,
    })
}

fn accept_header() -> impl Strategy<Value = String> {
    prop::collection::vec(accept_entry(), 0..6).prop_map(|entries| entries.join(", "))
}

proptest! {
    #[test]
    fn result_is_an_offer_or_the_default(accept in accept_header()) {
        let chosen = negotiate(Some(accept.as_str()), &OFFERS, DEFAULT);
        prop_assert!(OFFERS.contains(&chosen.as_str()) || chosen == DEFAULT);
    }

    #[test]
    fn case_does_not_matter(accept in accept_header()) {
        prop_assert_eq!(
            negotiate(Some(accept.to_ascii_uppercase().as_str()), &OFFERS, DEFAULT),
            negotiate(Some(accept.as_str()), &OFFERS, DEFAULT)
        );
    }

    #[test]
    fn single_exact_offer_wins(index in 0usize..OFFERS.len(), q in 1u32..=1000) {
        let accept = format!("{};q={}", OFFERS[index], q as f32 / 1000.0);
        prop_assert_eq!(negotiate(Some(accept.as_str()), &OFFERS, DEFAULT), OFFERS[index]);
    }

    #[test]
    fn full_wildcard_prefers_first_offer(offset in 0usize..OFFERS.len()) {
        let mut offers = OFFERS.to_vec();
        offers.rotate_left(offset);
        prop_assert_eq!(negotiate(Some("*/*"), &offers, DEFAULT), offers[0]);
    }

    #[test]
    fn zero_quality_entries_are_never_chosen(index in 0usize..OFFERS.len()) {
        let accept = format!("{};q=0", OFFERS[index]);
        prop_assert_eq!(negotiate(Some(accept.as_str()), &OFFERS, DEFAULT), DEFAULT);
    }

    #[test]
    fn parsed_qualities_are_in_range(accept in accept_header()) {
        for spec in parse_accept(&accept) {
            prop_assert!(spec.quality > 0.0 && spec.quality <= 1.0);
        }
    }
}

#[test]
fn exact_match_beats_wildcard_at_equal_quality() {
    assert_eq!(
        negotiate(Some("*/*, application/json"), &OFFERS, "text/html"),
        "application/json"
    );
}

#[test]
fn no_header_uses_default() {
    assert_eq!(negotiate(None, &OFFERS, DEFAULT), DEFAULT);
}
