#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use lifecycle_logger::lifecycle::carrier::meta_variables;
use lifecycle_logger::lifecycle::discovery::INBOUND_HEADER_KEYS;
use lifecycle_logger::lifecycle::{LifeCycleToken, TOKEN_ALPHABET, TOKEN_LENGTH};
use proptest::prelude::*;

#[test]
fn generated_tokens_use_alphabet_and_length() {
    for _ in 0..200 {
        let token = LifeCycleToken::generate();
        assert_eq!(token.as_str().len(), TOKEN_LENGTH);
        assert!(token.as_str().bytes().all(|b| TOKEN_ALPHABET.contains(&b)));
    }
}

#[test]
fn generated_tokens_are_distinct() {
    let tokens: std::collections::HashSet<String> = (0..1000)
        .map(|_| LifeCycleToken::generate().export_identity())
        .collect();
    assert_eq!(tokens.len(), 1000);
}

#[test]
fn raw_headers_reach_discovery() {
    let env = meta_variables([("Host", "example.com"), ("Life-Cycle-Token", "UPSTREAM")]);
    let token = LifeCycleToken::from_headers(&env);
    assert_eq!(token.parent().unwrap().as_str(), "UPSTREAM");
}

#[test]
fn each_header_spelling_is_recognized() {
    for key in INBOUND_HEADER_KEYS {
        let env = HashMap::from([(key.to_string(), "UPSTREAM".to_string())]);
        let token = LifeCycleToken::from_headers(&env);
        assert_eq!(token.parent().unwrap().as_str(), "UPSTREAM", "{key}");
    }
}

proptest! {
    #[test]
    fn derive_child_links_to_exported_identity(parent in proptest::option::of("[A-Z0-9]{30}")) {
        let token = match parent {
            Some(parent) => LifeCycleToken::with_parent(parent),
            None => LifeCycleToken::generate(),
        };
        let restored = LifeCycleToken::derive_child_from(&token.export_identity());

        prop_assert_eq!(restored.parent().unwrap().to_string(), token.to_string());
        prop_assert_ne!(restored.to_string(), token.to_string());
        prop_assert!(LifeCycleToken::is_well_formed(restored.as_str()));
    }

    #[test]
    fn argv_value_after_first_colon(value in "[A-Za-z0-9:]{1,40}", before in "[a-z-]{0,10}") {
        let args = [before, format!("lifecycleToken:{value}"), "lifecycleToken:OTHER".to_string()];
        let token = LifeCycleToken::from_argv(args);
        prop_assert_eq!(token.parent().unwrap().as_str(), value.as_str());
    }
}
