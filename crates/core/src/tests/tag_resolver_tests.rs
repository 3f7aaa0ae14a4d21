// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{CoreError, TagResolution, TagResolver};
use patrol_domain::DomainError;

use super::helpers::{checkpoint, seeded_store};

#[test]
fn test_resolves_checkpoint_on_active_route() {
    let mut store = seeded_store();

    let resolution: TagResolution = TagResolver::new(&mut store).resolve("0A1B", "R1").unwrap();

    assert_eq!(resolution.checkpoint.checkpoint_id, "CP-1");
    assert_eq!(resolution.tag.as_str(), "0A1B");
    assert!(resolution.ambiguity.is_none());
}

#[test]
fn test_shared_tag_prefers_checkpoint_on_active_route() {
    // CP-1 (R1) stores 0A1B and CP-9 (R2) stores the byte-reversed 1b0a.
    let mut store = seeded_store();

    let resolution: TagResolution = TagResolver::new(&mut store).resolve("0A1B", "R2").unwrap();

    assert_eq!(resolution.checkpoint.checkpoint_id, "CP-9");
}

#[test]
fn test_scanner_formatting_is_ignored() {
    let mut store = seeded_store();

    let resolution = TagResolver::new(&mut store)
        .resolve(" 0x0a:1b ", "r1 ")
        .unwrap();

    assert_eq!(resolution.checkpoint.checkpoint_id, "CP-1");
}

#[test]
fn test_unknown_tag_is_rejected() {
    let mut store = seeded_store();

    let err = TagResolver::new(&mut store)
        .resolve("DEADBEEF", "R1")
        .unwrap_err();

    assert_eq!(
        err,
        CoreError::NoMatchingTag {
            tag: String::from("DEADBEEF"),
        }
    );
}

#[test]
fn test_tag_on_other_route_is_rejected() {
    let mut store = seeded_store();

    let err = TagResolver::new(&mut store)
        .resolve("C0FFEE", "R2")
        .unwrap_err();

    match err {
        CoreError::TagNotOnActiveRoute {
            route_id,
            bound_routes,
            ..
        } => {
            assert_eq!(route_id, "R2");
            assert_eq!(bound_routes, vec![String::from("R1")]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_ambiguous_binding_uses_first_checkpoint_and_reports_it() {
    let mut store = seeded_store();
    store.data.checkpoints.push(checkpoint("CP-0", "R1", "1B0A"));

    let resolution = TagResolver::new(&mut store).resolve("0a1b", "R1").unwrap();

    assert_eq!(resolution.checkpoint.checkpoint_id, "CP-0");
    let ambiguity = resolution.ambiguity.unwrap();
    assert_eq!(ambiguity.candidates, vec!["CP-0", "CP-1"]);
    assert_eq!(ambiguity.route_id, "R1");
}

#[test]
fn test_malformed_tag_is_a_domain_violation() {
    let mut store = seeded_store();

    let err = TagResolver::new(&mut store).resolve("0A1", "R1").unwrap_err();

    assert!(matches!(
        err,
        CoreError::DomainViolation(DomainError::InvalidTagId { .. })
    ));
}
