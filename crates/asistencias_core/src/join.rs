//! crates/asistencias_core/src/join.rs
//!
//! Collection Joiner: client-side joins between collections. The default
//! predicate is equality on trim+lowercased string keys, which is how
//! `Solicitudes.tituloOportunidad` matches `Asistencias.tituloPrograma`.
//! For assignment lookups the store's `IN` filter takes at most
//! [`MAX_IN_KEYS`] keys, so larger sets are chunked.

use std::collections::{HashMap, HashSet};

use crate::domain::{Application, Assignment, Offer, OfferState};
use crate::ports::{DocumentStore, PortResult, MAX_IN_KEYS};

/// Canonical join key for denormalized titles: trimmed and lowercased.
/// Display values are never normalized, only keys.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// How an application points at its offer. New records resolve the offer ID
/// at write time; legacy records only carry the denormalized title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferRef {
    ById(String),
    ByTitle(String),
}

impl Application {
    pub fn offer_ref(&self) -> OfferRef {
        match &self.oferta_id {
            Some(id) if !id.is_empty() => OfferRef::ById(id.clone()),
            _ => OfferRef::ByTitle(self.titulo_oportunidad.clone()),
        }
    }
}

/// Equality join of two in-memory collections on normalized string keys.
/// Empty inputs yield an empty result. Rows with an empty key on either
/// side are skipped, matching how the controllers treat blank titles.
pub fn join_by_title<'a, L, R>(
    left: &'a [L],
    right: &'a [R],
    left_key: impl Fn(&L) -> &str,
    right_key: impl Fn(&R) -> &str,
) -> Vec<(&'a L, &'a R)> {
    let mut by_key: HashMap<String, Vec<&R>> = HashMap::new();
    for row in right {
        let key = normalize_title(right_key(row));
        if !key.is_empty() {
            by_key.entry(key).or_default().push(row);
        }
    }

    let mut pairs = Vec::new();
    for row in left {
        let key = normalize_title(left_key(row));
        if key.is_empty() {
            continue;
        }
        if let Some(matches) = by_key.get(&key) {
            for matched in matches {
                pairs.push((row, *matched));
            }
        }
    }
    pairs
}

/// Finds an offer in state Abierto for the given reference. `ById` is an
/// exact ID match; `ByTitle` is the normalized-title match the wire
/// contract relies on. First match wins, as in the source system.
pub fn find_open_offer<'a>(offers: &'a [Offer], target: &OfferRef) -> Option<&'a Offer> {
    offers.iter().find(|offer| {
        offer.estado == OfferState::Abierto
            && match target {
                OfferRef::ById(id) => offer.id == *id,
                OfferRef::ByTitle(title) => {
                    normalize_title(&offer.titulo_programa) == normalize_title(title)
                }
            }
    })
}

/// Finds the first offer whose title matches, regardless of state. Used at
/// application-registration time to pin the stable offer ID.
pub fn find_offer_by_title<'a>(offers: &'a [Offer], title: &str) -> Option<&'a Offer> {
    let wanted = normalize_title(title);
    offers
        .iter()
        .find(|offer| normalize_title(&offer.titulo_programa) == wanted)
}

/// Fetches all assignments referencing any of `offer_ids`, issuing
/// ceil(n / chunk_size) `IN` queries. Duplicate input IDs are collapsed and
/// results are deduplicated by assignment ID, so no row is dropped or
/// returned twice across chunk boundaries. Result order is not guaranteed.
pub async fn assignments_for_offers(
    store: &dyn DocumentStore,
    offer_ids: &[String],
    chunk_size: usize,
) -> PortResult<Vec<Assignment>> {
    let chunk_size = chunk_size.clamp(1, MAX_IN_KEYS);

    let mut seen_ids = HashSet::new();
    let unique_ids: Vec<String> = offer_ids
        .iter()
        .filter(|id| seen_ids.insert(id.as_str()))
        .cloned()
        .collect();

    let mut assignments = Vec::new();
    let mut seen_assignments = HashSet::new();
    for chunk in unique_ids.chunks(chunk_size) {
        for assignment in store.assignments_by_offer_ids(chunk).await? {
            if seen_assignments.insert(assignment.id.clone()) {
                assignments.push(assignment);
            }
        }
    }
    Ok(assignments)
}
