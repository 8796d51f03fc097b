//! Mutation payloads and the update envelope.
//!
//! A mutation is a closed, tagged union. On the wire it is an object whose
//! `type` field names the kind, next to the kind's own camelCase fields:
//!
//! ```json
//! {"updateId": "0190...", "mutation": {"type": "cardMove", "id": "c1", "direction": "up"}}
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::{CardId, CardStatus, CategoryId, CommentId, PresetColorId, ProjectId, Timestamp, UpdateId};

/// Every state transition the engine knows how to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mutation {
    CardAdd(CardAdd),
    CardEdit(CardEdit),
    CardMove(CardMove),
    CardMoveToAfter(CardMoveToAfter),
    CardMoveToBefore(CardMoveToBefore),
    CategoryAdd(CategoryAdd),
    CategoryReorder(CategoryReorder),
    CommentAdd(CommentAdd),
    ProjectAdd(ProjectAdd),
}

impl Mutation {
    /// The wire tag of this mutation, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::CardAdd(_) => "cardAdd",
            Mutation::CardEdit(_) => "cardEdit",
            Mutation::CardMove(_) => "cardMove",
            Mutation::CardMoveToAfter(_) => "cardMoveToAfter",
            Mutation::CardMoveToBefore(_) => "cardMoveToBefore",
            Mutation::CategoryAdd(_) => "categoryAdd",
            Mutation::CategoryReorder(_) => "categoryReorder",
            Mutation::CommentAdd(_) => "commentAdd",
            Mutation::ProjectAdd(_) => "projectAdd",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAdd {
    pub id: CardId,
    pub category_id: CategoryId,
    pub parent_card_id: Option<CardId>,
    pub text: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEdit {
    pub id: CardId,
    pub edits: CardEdits,
}

/// Sparse card update: only fields that are present are applied.
///
/// `parent_card_id` is tri-state. Absent leaves the parent alone,
/// `Some(None)` (JSON `null`) detaches the card to the top level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEdits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_subboard_root: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_card_id: Option<Option<CardId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CardStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CardEdits {
    pub fn is_empty(&self) -> bool {
        self == &CardEdits::default()
    }
}

/// Marks a field as present even when its value is `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardMove {
    pub id: CardId,
    pub direction: MoveDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMoveToAfter {
    pub after_card_id: CardId,
    pub move_card_id: CardId,
    pub parent_card_id: Option<CardId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMoveToBefore {
    pub before_card_id: CardId,
    pub move_card_id: CardId,
    pub parent_card_id: Option<CardId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAdd {
    pub id: CategoryId,
    pub name: String,
    pub color: PresetColorId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReorder {
    pub ids: Vec<CategoryId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAdd {
    pub id: CommentId,
    pub card_id: CardId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAdd {
    pub id: ProjectId,
    pub name: String,
}

/// A mutation stamped with the id used to correlate its acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEnvelope {
    pub update_id: UpdateId,
    pub mutation: Mutation,
}

impl UpdateEnvelope {
    pub fn new(update_id: UpdateId, mutation: Mutation) -> Self {
        Self {
            update_id,
            mutation,
        }
    }
}

/// Reply of the update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub snapshot_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = UpdateEnvelope::new(
            UpdateId::new("u1"),
            Mutation::CardMove(CardMove {
                id: CardId::new("c1"),
                direction: MoveDirection::Up,
            }),
        );
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "updateId": "u1",
                "mutation": {"type": "cardMove", "id": "c1", "direction": "up"}
            })
        );
    }

    #[test]
    fn test_card_add_wire_shape() {
        let mutation: Mutation = serde_json::from_value(json!({
            "type": "cardAdd",
            "id": "c1",
            "categoryId": "cat",
            "parentCardId": null,
            "text": "hello",
            "createdAt": {"seconds": 10, "nanos": 0}
        }))
        .unwrap();
        assert_eq!(mutation.kind(), "cardAdd");
        let Mutation::CardAdd(add) = mutation else {
            panic!("expected cardAdd");
        };
        assert_eq!(add.parent_card_id, None);
        assert_eq!(add.created_at, Timestamp::new(10, 0));
    }

    #[test]
    fn test_card_edits_parent_is_tri_state() {
        let absent: CardEdits = serde_json::from_value(json!({"text": "t"})).unwrap();
        assert_eq!(absent.parent_card_id, None);

        let cleared: CardEdits = serde_json::from_value(json!({"parentCardId": null})).unwrap();
        assert_eq!(cleared.parent_card_id, Some(None));

        let set: CardEdits = serde_json::from_value(json!({"parentCardId": "p"})).unwrap();
        assert_eq!(set.parent_card_id, Some(Some(CardId::new("p"))));
    }

    #[test]
    fn test_card_edits_serialize_sparsely() {
        let edits = CardEdits {
            status: Some(CardStatus::Done),
            parent_card_id: Some(None),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&edits).unwrap(),
            json!({"status": "done", "parentCardId": null})
        );
        assert!(CardEdits::default().is_empty());
    }

    #[test]
    fn test_unknown_mutation_type_is_rejected() {
        let result = serde_json::from_value::<Mutation>(json!({"type": "cardDelete", "id": "c1"}));
        assert!(result.is_err());
    }
}
