//! The immutable application snapshot.
//!
//! `AppSnapshot` bundles every domain collection at one point in history. It
//! implements each capability trait from `cardboard-core`; all `with_*`
//! methods return a new snapshot and share the untouched collections with the
//! receiver, so deriving a snapshot only copies the collection that changed.

use std::sync::Arc;

use cardboard_api::{Card, CardId, Category, CategoryId, Comment, PresetColor, Project};
use cardboard_core::{CardSet, CategorySet, ColorSet, CommentSet, ProjectSet};
use serde::{Deserialize, Serialize};

/// One consistent view of all collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    cards: Arc<Vec<Card>>,
    categories: Arc<Vec<Category>>,
    comments: Arc<Vec<Comment>>,
    projects: Arc<Vec<Project>>,
    next_card_number: u64,
}

impl Default for AppSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl AppSnapshot {
    /// Empty collections, card numbering starting at 1.
    pub fn empty() -> Self {
        Self {
            cards: Arc::new(Vec::new()),
            categories: Arc::new(Vec::new()),
            comments: Arc::new(Vec::new()),
            projects: Arc::new(Vec::new()),
            next_card_number: 1,
        }
    }

    /// Preset color of a category, or white if either the category or its
    /// color reference doesn't resolve.
    pub fn category_color(&self, category_id: &CategoryId) -> PresetColor {
        match self.category(category_id) {
            Some(category) => self.color(&category.color),
            None => PresetColor::white(),
        }
    }

    /// Preset color of a card, resolved through its category.
    pub fn card_color(&self, card_id: &CardId) -> PresetColor {
        match self.card(card_id) {
            Some(card) => self.category_color(&card.category_id),
            None => PresetColor::white(),
        }
    }
}

impl CardSet for AppSnapshot {
    fn cards(&self) -> &[Card] {
        &self.cards
    }

    fn with_cards(&self, cards: Vec<Card>) -> Self {
        Self {
            cards: Arc::new(cards),
            ..self.clone()
        }
    }

    fn next_card_number(&self) -> u64 {
        self.next_card_number
    }

    fn with_next_card_number(&self, next: u64) -> Self {
        Self {
            next_card_number: next,
            ..self.clone()
        }
    }
}

impl CategorySet for AppSnapshot {
    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn with_categories(&self, categories: Vec<Category>) -> Self {
        Self {
            categories: Arc::new(categories),
            ..self.clone()
        }
    }
}

impl CommentSet for AppSnapshot {
    fn comments(&self) -> &[Comment] {
        &self.comments
    }

    fn with_comments(&self, comments: Vec<Comment>) -> Self {
        Self {
            comments: Arc::new(comments),
            ..self.clone()
        }
    }
}

impl ColorSet for AppSnapshot {}

impl ProjectSet for AppSnapshot {
    fn projects(&self) -> &[Project] {
        &self.projects
    }

    fn with_projects(&self, projects: Vec<Project>) -> Self {
        Self {
            projects: Arc::new(projects),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardboard_api::{CardStatus, PresetColorId, Timestamp};

    fn category(id: &str, color: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: id.to_string(),
            color: PresetColorId::new(color),
        }
    }

    #[test]
    fn test_with_methods_leave_receiver_untouched() {
        let empty = AppSnapshot::empty();
        let with_category = empty.with_categories(vec![category("c", "red")]);

        assert!(empty.categories().is_empty());
        assert_eq!(with_category.categories().len(), 1);
        // untouched collections are shared, not copied
        assert!(Arc::ptr_eq(&empty.cards, &with_category.cards));
    }

    #[test]
    fn test_color_resolution_falls_back_to_white() {
        let snapshot = AppSnapshot::empty().with_categories(vec![
            category("known", "green"),
            category("dangling", "chartreuse"),
        ]);
        let snapshot = snapshot.with_cards(vec![Card {
            id: CardId::new("card"),
            number: 1,
            text: "t".to_string(),
            category_id: CategoryId::new("known"),
            status: CardStatus::None,
            parent_card_id: None,
            is_subboard_root: false,
            created_at: Timestamp::EPOCH,
        }]);

        assert_eq!(snapshot.category_color(&CategoryId::new("known")).name, "Green");
        assert_eq!(
            snapshot.category_color(&CategoryId::new("dangling")),
            PresetColor::white()
        );
        assert_eq!(
            snapshot.category_color(&CategoryId::new("missing")),
            PresetColor::white()
        );
        assert_eq!(snapshot.card_color(&CardId::new("card")).name, "Green");
        assert_eq!(snapshot.card_color(&CardId::new("nope")), PresetColor::white());
    }

    #[test]
    fn test_snapshot_serialization_round_trip() {
        let snapshot = AppSnapshot::empty().with_categories(vec![category("c", "red")]);
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: AppSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.next_card_number(), 1);
    }
}
