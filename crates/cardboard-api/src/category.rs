use serde::{Deserialize, Serialize};

use crate::{CategoryId, PresetColorId, ProjectId};

/// A named, colored grouping of cards.
///
/// The order of categories within a snapshot is significant: it is the order
/// used for listing and selection, and it changes only through a reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: PresetColorId,
}

/// A category joined with the preset color its `color` reference resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithColor {
    pub category: Category,
    pub color: PresetColor,
}

/// An entry in the fixed color catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetColor {
    pub id: PresetColorId,
    pub name: String,
    pub hex: String,
}

impl PresetColor {
    fn preset(id: &str, name: &str, hex: &str) -> Self {
        Self {
            id: PresetColorId::new(id),
            name: name.to_string(),
            hex: hex.to_string(),
        }
    }

    /// The catalogue offered for categories, in display order.
    pub fn catalogue() -> Vec<PresetColor> {
        vec![
            Self::preset("red", "Red", "#f28b82"),
            Self::preset("orange", "Orange", "#fbbc04"),
            Self::preset("yellow", "Yellow", "#fff475"),
            Self::preset("green", "Green", "#ccff90"),
            Self::preset("teal", "Teal", "#a7ffeb"),
            Self::preset("blue", "Blue", "#aecbfa"),
            Self::preset("purple", "Purple", "#d7aefb"),
            Self::preset("grey", "Grey", "#e8eaed"),
        ]
    }

    /// Reserved fallback for anything whose color does not resolve.
    ///
    /// Not part of [`PresetColor::catalogue`].
    pub fn white() -> PresetColor {
        Self::preset("white", "White", "#ffffff")
    }

    pub fn find(id: &PresetColorId) -> Option<PresetColor> {
        Self::catalogue().into_iter().find(|color| &color.id == id)
    }
}

/// Top-level container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
}
