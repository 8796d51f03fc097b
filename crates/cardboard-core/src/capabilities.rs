//! Capability traits implemented by snapshot aggregates.
//!
//! Each trait covers one collection. Implementations are persistent: the
//! `with_*` methods return a new value and leave the receiver untouched, so a
//! snapshot can be shared freely while new ones are derived from it.

use cardboard_api::{
    Card, CardId, Category, CategoryId, Comment, PresetColor, PresetColorId, Project, ProjectId,
};

/// Cards in collection order, plus the display-number counter.
pub trait CardSet: Sized {
    fn cards(&self) -> &[Card];

    /// Replace the card collection.
    fn with_cards(&self, cards: Vec<Card>) -> Self;

    /// Number the next added card will receive.
    fn next_card_number(&self) -> u64;

    fn with_next_card_number(&self, next: u64) -> Self;

    fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards().iter().find(|card| &card.id == id)
    }

    fn card_index(&self, id: &CardId) -> Option<usize> {
        self.cards().iter().position(|card| &card.id == id)
    }

    /// Direct children of `parent`, in collection order.
    fn children_of(&self, parent: &CardId) -> Vec<&Card> {
        self.cards()
            .iter()
            .filter(|card| card.has_parent(parent))
            .collect()
    }

    /// Collection indices of every card sharing `parent`, in collection order.
    ///
    /// `None` selects the top-level cards.
    fn sibling_indices(&self, parent: Option<&CardId>) -> Vec<usize> {
        self.cards()
            .iter()
            .enumerate()
            .filter(|(_, card)| card.parent_card_id.as_ref() == parent)
            .map(|(index, _)| index)
            .collect()
    }
}

/// Categories in their significant display order.
pub trait CategorySet: Sized {
    fn categories(&self) -> &[Category];

    fn with_categories(&self, categories: Vec<Category>) -> Self;

    fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories().iter().find(|category| &category.id == id)
    }
}

/// Append-only comments.
pub trait CommentSet: Sized {
    fn comments(&self) -> &[Comment];

    fn with_comments(&self, comments: Vec<Comment>) -> Self;

    fn comments_for(&self, card_id: &CardId) -> Vec<&Comment> {
        self.comments()
            .iter()
            .filter(|comment| &comment.card_id == card_id)
            .collect()
    }
}

/// The preset color catalogue.
pub trait ColorSet {
    fn colors(&self) -> Vec<PresetColor> {
        PresetColor::catalogue()
    }

    /// Resolve a color reference, falling back to the reserved white.
    fn color(&self, id: &PresetColorId) -> PresetColor {
        self.colors()
            .into_iter()
            .find(|color| &color.id == id)
            .unwrap_or_else(PresetColor::white)
    }
}

pub trait ProjectSet: Sized {
    fn projects(&self) -> &[Project];

    fn with_projects(&self, projects: Vec<Project>) -> Self;

    fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects().iter().find(|project| &project.id == id)
    }
}
