//! The mutation engine.
//!
//! One pure function per mutation kind, each taking a snapshot and a payload
//! and returning the next snapshot. The functions never fail: a payload that
//! refers to a card or category that doesn't exist yields the input snapshot
//! unchanged. Each function only needs the capability it touches, so
//! `card_move` works on anything that is a [`CardSet`].

use std::collections::HashSet;

use cardboard_api::{
    Card, CardAdd, CardEdit, CardId, CardMove, CardMoveToAfter, CardMoveToBefore, Category,
    CategoryAdd, CategoryReorder, Comment, CommentAdd, MoveDirection, Mutation, Project,
    ProjectAdd, Timestamp,
};
use cardboard_core::{CardSet, CategorySet, CommentSet, ProjectSet};
use tracing::debug;

use crate::snapshot::AppSnapshot;

/// Apply any mutation to a snapshot.
///
/// `at` is the time the update was applied. Only `commentAdd` reads it, since
/// comments carry no creation time of their own on the wire.
pub fn apply_mutation(snapshot: &AppSnapshot, mutation: &Mutation, at: Timestamp) -> AppSnapshot {
    match mutation {
        Mutation::CardAdd(payload) => card_add(snapshot, payload),
        Mutation::CardEdit(payload) => card_edit(snapshot, payload),
        Mutation::CardMove(payload) => card_move(snapshot, payload),
        Mutation::CardMoveToAfter(payload) => card_move_to_after(snapshot, payload),
        Mutation::CardMoveToBefore(payload) => card_move_to_before(snapshot, payload),
        Mutation::CategoryAdd(payload) => category_add(snapshot, payload),
        Mutation::CategoryReorder(payload) => category_reorder(snapshot, payload),
        Mutation::CommentAdd(payload) => comment_add(snapshot, payload, at),
        Mutation::ProjectAdd(payload) => project_add(snapshot, payload),
    }
}

// =============================================================================
// Cards
// =============================================================================

/// Append a card numbered from the snapshot's counter, then bump the counter.
pub fn card_add<S: CardSet + Clone>(snapshot: &S, payload: &CardAdd) -> S {
    if snapshot.card(&payload.id).is_some() {
        debug!("cardAdd: card {} already exists, ignoring", payload.id);
        return snapshot.clone();
    }

    let number = snapshot.next_card_number();
    let mut cards = snapshot.cards().to_vec();
    cards.push(Card {
        id: payload.id.clone(),
        number,
        text: payload.text.clone(),
        category_id: payload.category_id.clone(),
        status: Default::default(),
        parent_card_id: payload.parent_card_id.clone(),
        is_subboard_root: false,
        created_at: payload.created_at,
    });

    snapshot
        .with_cards(cards)
        .with_next_card_number(number + 1)
}

/// Apply only the fields present in `payload.edits`.
pub fn card_edit<S: CardSet + Clone>(snapshot: &S, payload: &CardEdit) -> S {
    let Some(index) = snapshot.card_index(&payload.id) else {
        debug!("cardEdit: card {} not found, ignoring", payload.id);
        return snapshot.clone();
    };

    let mut cards = snapshot.cards().to_vec();
    let card = &mut cards[index];
    let edits = &payload.edits;

    if let Some(category_id) = &edits.category_id {
        card.category_id = category_id.clone();
    }
    if let Some(is_subboard_root) = edits.is_subboard_root {
        card.is_subboard_root = is_subboard_root;
    }
    if let Some(parent_card_id) = &edits.parent_card_id {
        card.parent_card_id = parent_card_id.clone();
    }
    if let Some(status) = edits.status {
        card.status = status;
    }
    if let Some(text) = &edits.text {
        card.text = text.clone();
    }

    snapshot.with_cards(cards)
}

/// Swap a card with its previous or next sibling.
///
/// Siblings are the cards sharing its `parent_card_id`, in collection order.
/// Moving the first sibling up or the last one down changes nothing.
pub fn card_move<S: CardSet + Clone>(snapshot: &S, payload: &CardMove) -> S {
    let Some(card) = snapshot.card(&payload.id) else {
        debug!("cardMove: card {} not found, ignoring", payload.id);
        return snapshot.clone();
    };

    let siblings = snapshot.sibling_indices(card.parent_card_id.as_ref());
    let Some(position) = siblings
        .iter()
        .position(|&index| snapshot.cards()[index].id == payload.id)
    else {
        return snapshot.clone();
    };

    let neighbour = match payload.direction {
        MoveDirection::Up => position.checked_sub(1),
        MoveDirection::Down => Some(position + 1).filter(|&next| next < siblings.len()),
    };
    let Some(neighbour) = neighbour else {
        return snapshot.clone();
    };

    let mut cards = snapshot.cards().to_vec();
    cards.swap(siblings[position], siblings[neighbour]);
    snapshot.with_cards(cards)
}

#[derive(Clone, Copy)]
enum Placement {
    After,
    Before,
}

/// Take `moved` out of the collection, re-insert it next to `anchor`, and
/// reparent it. Everything else keeps its relative order.
fn relocate<S: CardSet + Clone>(
    snapshot: &S,
    moved: &CardId,
    anchor: &CardId,
    parent_card_id: &Option<CardId>,
    placement: Placement,
) -> S {
    if moved == anchor {
        return snapshot.clone();
    }
    let Some(from) = snapshot.card_index(moved) else {
        debug!("move: card {moved} not found, ignoring");
        return snapshot.clone();
    };
    if snapshot.card(anchor).is_none() {
        debug!("move: anchor card {anchor} not found, ignoring");
        return snapshot.clone();
    }

    let mut cards = snapshot.cards().to_vec();
    let mut card = cards.remove(from);
    card.parent_card_id = parent_card_id.clone();

    let Some(anchor_index) = cards.iter().position(|c| &c.id == anchor) else {
        return snapshot.clone();
    };
    let to = match placement {
        Placement::After => anchor_index + 1,
        Placement::Before => anchor_index,
    };
    cards.insert(to, card);

    snapshot.with_cards(cards)
}

pub fn card_move_to_after<S: CardSet + Clone>(snapshot: &S, payload: &CardMoveToAfter) -> S {
    relocate(
        snapshot,
        &payload.move_card_id,
        &payload.after_card_id,
        &payload.parent_card_id,
        Placement::After,
    )
}

pub fn card_move_to_before<S: CardSet + Clone>(snapshot: &S, payload: &CardMoveToBefore) -> S {
    relocate(
        snapshot,
        &payload.move_card_id,
        &payload.before_card_id,
        &payload.parent_card_id,
        Placement::Before,
    )
}

// =============================================================================
// Categories, comments, projects
// =============================================================================

pub fn category_add<S: CategorySet + Clone>(snapshot: &S, payload: &CategoryAdd) -> S {
    if snapshot.category(&payload.id).is_some() {
        debug!("categoryAdd: category {} already exists, ignoring", payload.id);
        return snapshot.clone();
    }

    let mut categories = snapshot.categories().to_vec();
    categories.push(Category {
        id: payload.id.clone(),
        name: payload.name.clone(),
        color: payload.color.clone(),
    });
    snapshot.with_categories(categories)
}

/// Put the named categories first, in the given order, followed by every
/// other category in its original relative order.
///
/// Unknown and repeated ids are skipped, so membership never changes.
pub fn category_reorder<S: CategorySet + Clone>(snapshot: &S, payload: &CategoryReorder) -> S {
    let original = snapshot.categories();
    let mut emitted = HashSet::with_capacity(original.len());
    let mut reordered = Vec::with_capacity(original.len());

    let walk = payload.ids.iter().chain(original.iter().map(|c| &c.id));
    for id in walk {
        if emitted.contains(id) {
            continue;
        }
        if let Some(category) = snapshot.category(id) {
            emitted.insert(id.clone());
            reordered.push(category.clone());
        }
    }

    snapshot.with_categories(reordered)
}

/// Append a comment. The card itself is not modified.
pub fn comment_add<S: CommentSet + CardSet + Clone>(
    snapshot: &S,
    payload: &CommentAdd,
    created_at: Timestamp,
) -> S {
    if snapshot.card(&payload.card_id).is_none() {
        debug!("commentAdd: card {} not found, ignoring", payload.card_id);
        return snapshot.clone();
    }
    if snapshot.comments().iter().any(|c| c.id == payload.id) {
        debug!("commentAdd: comment {} already exists, ignoring", payload.id);
        return snapshot.clone();
    }

    let mut comments = snapshot.comments().to_vec();
    comments.push(Comment {
        id: payload.id.clone(),
        card_id: payload.card_id.clone(),
        text: payload.text.clone(),
        created_at,
    });
    snapshot.with_comments(comments)
}

pub fn project_add<S: ProjectSet + Clone>(snapshot: &S, payload: &ProjectAdd) -> S {
    if snapshot.project(&payload.id).is_some() {
        debug!("projectAdd: project {} already exists, ignoring", payload.id);
        return snapshot.clone();
    }

    let mut projects = snapshot.projects().to_vec();
    projects.push(Project {
        id: payload.id.clone(),
        name: payload.name.clone(),
    });
    snapshot.with_projects(projects)
}
