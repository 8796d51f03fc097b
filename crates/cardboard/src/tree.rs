//! Card tree builder.
//!
//! Derives the board-scoped hierarchy from a flat card collection. The input
//! is expected to be already filtered by status; a card whose parent was
//! filtered out has no path from any board root and is absent from the result.

use std::collections::{HashMap, HashSet};

use cardboard_api::{BoardId, Card, CardId, CardTree};

type ChildIndex<'a> = HashMap<&'a CardId, Vec<&'a Card>>;

/// Build the trees shown on `board`.
///
/// On the root board every top-level card is a tree. On a subboard the result
/// is the subboard root with its children expanded; it's empty if that card
/// is missing or not flagged as a subboard root. A subboard root met anywhere
/// below the top of a tree is shown without its children.
pub fn build_card_trees(cards: &[Card], board: &BoardId) -> Vec<CardTree> {
    let index = index_children(cards);

    match &board.board_root_id {
        None => cards
            .iter()
            .filter(|card| card.is_top_level())
            .map(|card| assemble(card, !card.is_subboard_root, &index))
            .collect(),
        Some(root_id) => cards
            .iter()
            .find(|card| &card.id == root_id)
            .filter(|card| card.is_subboard_root)
            .map(|card| vec![assemble(card, true, &index)])
            .unwrap_or_default(),
    }
}

fn index_children(cards: &[Card]) -> ChildIndex<'_> {
    let mut index: ChildIndex<'_> = HashMap::new();
    for card in cards {
        if let Some(parent) = &card.parent_card_id {
            index.entry(parent).or_default().push(card);
        }
    }
    index
}

fn children<'a>(index: &'a ChildIndex<'a>, card: &Card) -> std::slice::Iter<'a, &'a Card> {
    index
        .get(&card.id)
        .map(|children| children.iter())
        .unwrap_or_default()
}

struct Frame<'a> {
    card: &'a Card,
    pending: std::slice::Iter<'a, &'a Card>,
    children: Vec<CardTree>,
}

/// Assemble one tree with an explicit stack, so nesting depth is bounded by
/// memory rather than the call stack.
fn assemble<'a>(root: &'a Card, expand_root: bool, index: &'a ChildIndex<'a>) -> CardTree {
    // Parent links can loop back through a subboard root; expand each card once.
    let mut visited: HashSet<&CardId> = HashSet::from([&root.id]);
    let mut stack = vec![Frame {
        card: root,
        pending: if expand_root {
            children(index, root)
        } else {
            Default::default()
        },
        children: Vec::new(),
    }];
    let mut finished = CardTree::leaf(root.clone());

    while let Some(mut frame) = stack.pop() {
        if let Some(&child) = frame.pending.next() {
            stack.push(frame);
            if visited.insert(&child.id) {
                stack.push(Frame {
                    card: child,
                    pending: if child.is_subboard_root {
                        Default::default()
                    } else {
                        children(index, child)
                    },
                    children: Vec::new(),
                });
            }
            continue;
        }

        let tree = CardTree {
            card: frame.card.clone(),
            children: frame.children,
        };
        match stack.last_mut() {
            Some(parent) => parent.children.push(tree),
            None => finished = tree,
        }
    }

    finished
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardboard_api::{CardStatus, CategoryId, Timestamp};

    fn card(id: &str, parent: Option<&str>, subboard_root: bool) -> Card {
        Card {
            id: CardId::new(id),
            number: 0,
            text: id.to_string(),
            category_id: CategoryId::new("cat"),
            status: CardStatus::None,
            parent_card_id: parent.map(CardId::new),
            is_subboard_root: subboard_root,
            created_at: Timestamp::EPOCH,
        }
    }

    fn ids(tree: &CardTree) -> Vec<&str> {
        tree.card_ids().into_iter().map(CardId::as_str).collect()
    }

    fn scoped_cards() -> Vec<Card> {
        vec![
            card("root1", None, false),
            card("child1", Some("root1"), true),
            card("grandchild1", Some("child1"), false),
        ]
    }

    #[test]
    fn test_root_board_stops_at_subboard_roots() {
        let trees = build_card_trees(&scoped_cards(), &BoardId::root());

        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].card.id.as_str(), "root1");
        assert_eq!(trees[0].children.len(), 1);
        assert_eq!(trees[0].children[0].card.id.as_str(), "child1");
        assert!(trees[0].children[0].children.is_empty());
    }

    #[test]
    fn test_subboard_expands_its_root() {
        let trees = build_card_trees(&scoped_cards(), &BoardId::subboard("child1"));

        assert_eq!(trees.len(), 1);
        assert_eq!(ids(&trees[0]), vec!["child1", "grandchild1"]);
    }

    #[test]
    fn test_subboard_requires_flagged_existing_card() {
        let cards = scoped_cards();
        assert!(build_card_trees(&cards, &BoardId::subboard("root1")).is_empty());
        assert!(build_card_trees(&cards, &BoardId::subboard("missing")).is_empty());
    }

    #[test]
    fn test_top_level_subboard_root_is_collapsed_on_root_board() {
        let cards = vec![card("sb", None, true), card("inner", Some("sb"), false)];
        let trees = build_card_trees(&cards, &BoardId::root());
        assert_eq!(trees.len(), 1);
        assert!(trees[0].children.is_empty());
    }

    #[test]
    fn test_children_keep_collection_order() {
        let cards = vec![
            card("p", None, false),
            card("b", Some("p"), false),
            card("q", None, false),
            card("a", Some("p"), false),
            card("c", Some("b"), false),
        ];
        let trees = build_card_trees(&cards, &BoardId::root());
        assert_eq!(trees.len(), 2);
        assert_eq!(ids(&trees[0]), vec!["p", "b", "c", "a"]);
        assert_eq!(ids(&trees[1]), vec!["q"]);
    }

    #[test]
    fn test_card_under_filtered_parent_vanishes() {
        // `middle` was filtered out upstream; `leaf` is visible but orphaned.
        let cards = vec![card("top", None, false), card("leaf", Some("middle"), false)];
        let trees = build_card_trees(&cards, &BoardId::root());
        assert_eq!(trees.len(), 1);
        assert_eq!(ids(&trees[0]), vec!["top"]);
    }

    #[test]
    fn test_parent_cycle_through_subboard_root_terminates() {
        let cards = vec![card("x", Some("y"), true), card("y", Some("x"), false)];
        let trees = build_card_trees(&cards, &BoardId::subboard("x"));
        assert_eq!(ids(&trees[0]), vec!["x", "y"]);
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let mut cards = vec![card("n0", None, false)];
        for i in 1..50_000 {
            cards.push(card(&format!("n{i}"), Some(&format!("n{}", i - 1)), false));
        }
        let trees = build_card_trees(&cards, &BoardId::root());
        assert_eq!(trees[0].card_ids().len(), 50_000);
        drop(trees);
    }
}
