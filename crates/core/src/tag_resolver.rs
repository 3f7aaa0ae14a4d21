// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Resolves a scanned tag to a checkpoint on the active route.

use crate::error::CoreError;
use crate::store::InspectionStore;
use patrol_domain::{Checkpoint, TagId};
use serde::Serialize;
use tracing::{info, warn};

/// More than one checkpoint on the active route is bound to the same tag.
///
/// Resolution still succeeds with the first candidate by checkpoint id;
/// this value reports the data-quality problem to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousTagBinding {
    pub tag: String,
    pub route_id: String,
    /// Candidate checkpoint ids, in resolution order.
    pub candidates: Vec<String>,
}

impl std::fmt::Display for AmbiguousTagBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tag {} is bound to {} checkpoints on route {}: {}",
            self.tag,
            self.candidates.len(),
            self.route_id,
            self.candidates.join(", ")
        )
    }
}

/// The checkpoint a tag resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagResolution {
    pub tag: TagId,
    pub checkpoint: Checkpoint,
    pub ambiguity: Option<AmbiguousTagBinding>,
}

/// Resolves tags through the store's checkpoint bindings.
pub struct TagResolver<'a, S: InspectionStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: InspectionStore + ?Sized> TagResolver<'a, S> {
    pub const fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Resolves `raw_tag` for a round on `active_route_id`.
    ///
    /// Both byte orders and both letter cases of the tag are looked up.
    ///
    /// # Errors
    ///
    /// - `DomainViolation` if the tag is not valid hex
    /// - `NoMatchingTag` if no checkpoint is bound to the tag
    /// - `TagNotOnActiveRoute` if every binding is on another route
    pub fn resolve(
        &mut self,
        raw_tag: &str,
        active_route_id: &str,
    ) -> Result<TagResolution, CoreError> {
        let tag: TagId = TagId::parse(raw_tag)?;
        let variants: Vec<String> = tag.lookup_variants();

        let mut candidates: Vec<Checkpoint> = self.store.checkpoints_by_tags(&variants)?;
        candidates.sort_by(|a, b| a.checkpoint_id.cmp(&b.checkpoint_id));
        candidates.dedup_by(|a, b| a.checkpoint_id == b.checkpoint_id);

        if candidates.is_empty() {
            info!(tag = %tag, "Scanned tag is not bound to any checkpoint");
            return Err(CoreError::NoMatchingTag {
                tag: tag.to_string(),
            });
        }

        let bound_routes: Vec<String> = candidates.iter().map(|c| c.route_id.clone()).collect();
        let mut on_route: Vec<Checkpoint> = candidates
            .into_iter()
            .filter(|c| c.is_on_route(active_route_id))
            .collect();

        if on_route.is_empty() {
            info!(
                tag = %tag,
                route_id = active_route_id,
                "Scanned tag belongs to another route"
            );
            return Err(CoreError::TagNotOnActiveRoute {
                tag: tag.to_string(),
                route_id: active_route_id.to_string(),
                bound_routes,
            });
        }

        let ambiguity: Option<AmbiguousTagBinding> = (on_route.len() > 1).then(|| {
            let binding = AmbiguousTagBinding {
                tag: tag.to_string(),
                route_id: active_route_id.to_string(),
                candidates: on_route.iter().map(|c| c.checkpoint_id.clone()).collect(),
            };
            warn!(%binding, "Ambiguous tag binding, using first candidate");
            binding
        });

        let checkpoint: Checkpoint = on_route.swap_remove(0);
        Ok(TagResolution {
            tag,
            checkpoint,
            ambiguity,
        })
    }
}
