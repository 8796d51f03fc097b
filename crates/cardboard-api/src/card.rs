use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CardId, CategoryId, CommentId, Timestamp};

// =============================================================================
// Card
// =============================================================================

/// Lifecycle status of a card.
///
/// Cards are never removed from a snapshot; deleting one sets `Deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    #[default]
    None,
    Done,
    Deleted,
}

impl CardStatus {
    pub const ALL: [CardStatus; 3] = [CardStatus::None, CardStatus::Done, CardStatus::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::None => "none",
            CardStatus::Done => "done",
            CardStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A card in the hierarchical board.
///
/// `number` is the human-facing display number. It is assigned once, at
/// creation, from the snapshot's counter and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub number: u64,
    pub text: String,
    pub category_id: CategoryId,
    pub status: CardStatus,
    pub parent_card_id: Option<CardId>,
    pub is_subboard_root: bool,
    pub created_at: Timestamp,
}

impl Card {
    pub fn is_top_level(&self) -> bool {
        self.parent_card_id.is_none()
    }

    pub fn has_parent(&self, parent: &CardId) -> bool {
        self.parent_card_id.as_ref() == Some(parent)
    }
}

/// An append-only comment owned by exactly one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub card_id: CardId,
    pub text: String,
    pub created_at: Timestamp,
}

// =============================================================================
// Boards and trees
// =============================================================================

/// Identifies either the root board (`board_root_id == None`) or the subboard
/// rooted at a specific card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardId {
    pub board_root_id: Option<CardId>,
}

impl BoardId {
    pub fn root() -> Self {
        Self {
            board_root_id: None,
        }
    }

    pub fn subboard(card_id: impl Into<CardId>) -> Self {
        Self {
            board_root_id: Some(card_id.into()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.board_root_id.is_none()
    }
}

/// A card together with the subtree visible beneath it on one board.
///
/// Always derived from the flat card collection, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTree {
    pub card: Card,
    pub children: Vec<CardTree>,
}

// Boards can nest arbitrarily deep; unlink descendants onto a heap stack so
// dropping never recurses.
impl Drop for CardTree {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

impl CardTree {
    pub fn leaf(card: Card) -> Self {
        Self {
            card,
            children: Vec::new(),
        }
    }

    /// Ids of this node and every descendant, depth first.
    pub fn card_ids(&self) -> Vec<&CardId> {
        let mut ids = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            ids.push(&node.card.id);
            stack.extend(node.children.iter().rev());
        }
        ids
    }
}

/// One entry in a card's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CardEvent {
    Created {
        #[serde(rename = "createdAt")]
        created_at: Timestamp,
    },
    Comment {
        comment: Comment,
        #[serde(rename = "createdAt")]
        created_at: Timestamp,
    },
}

impl CardEvent {
    pub fn created_at(&self) -> Timestamp {
        match self {
            CardEvent::Created { created_at } | CardEvent::Comment { created_at, .. } => {
                *created_at
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, parent: Option<&str>) -> Card {
        Card {
            id: CardId::new(id),
            number: 1,
            text: "text".to_string(),
            category_id: CategoryId::new("cat"),
            status: CardStatus::None,
            parent_card_id: parent.map(CardId::new),
            is_subboard_root: false,
            created_at: Timestamp::EPOCH,
        }
    }

    #[test]
    fn test_status_literals() {
        for status in CardStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!(serde_json::from_str::<CardStatus>("\"archived\"").is_err());
    }

    #[test]
    fn test_card_wire_shape() {
        let json = serde_json::to_value(card("c1", Some("p1"))).unwrap();
        assert_eq!(json["parentCardId"], "p1");
        assert_eq!(json["isSubboardRoot"], false);
        assert_eq!(json["categoryId"], "cat");
        assert_eq!(json["status"], "none");
    }

    #[test]
    fn test_board_id_wire_shape() {
        assert_eq!(
            serde_json::to_value(BoardId::root()).unwrap(),
            serde_json::json!({"boardRootId": null})
        );
        assert_eq!(
            serde_json::to_value(BoardId::subboard("c1")).unwrap(),
            serde_json::json!({"boardRootId": "c1"})
        );
    }

    #[test]
    fn test_card_tree_ids_are_depth_first() {
        let tree = CardTree {
            card: card("a", None),
            children: vec![
                CardTree {
                    card: card("b", Some("a")),
                    children: vec![CardTree::leaf(card("c", Some("b")))],
                },
                CardTree::leaf(card("d", Some("a"))),
            ],
        };
        let ids: Vec<&str> = tree.card_ids().into_iter().map(CardId::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_deep_card_tree_drops() {
        let mut tree = CardTree::leaf(card("n0", None));
        for i in 1..100_000 {
            let parent = format!("n{}", i - 1);
            tree = CardTree {
                card: card(&format!("n{i}"), Some(&parent)),
                children: vec![tree],
            };
        }
        assert_eq!(tree.card_ids().len(), 100_000);
        drop(tree);
    }
}
