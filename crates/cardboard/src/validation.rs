//! Form input validation.
//!
//! Every function returns the full list of problems it found; an empty list
//! means the input is acceptable. Nothing here fails or panics.

use cardboard_api::{PresetColor, PresetColorId, ValidationError};
use cardboard_core::CategorySet;

pub const CARD_TEXT_ELEMENT: &str = "card-text";
pub const COMMENT_TEXT_ELEMENT: &str = "comment-text";
pub const CATEGORY_NAME_ELEMENT: &str = "category-name";
pub const CATEGORY_COLOR_ELEMENT: &str = "category-color";
pub const PROJECT_NAME_ELEMENT: &str = "project-name";

fn required(element_id: &str, value: &str, label: &str) -> Option<ValidationError> {
    value.trim().is_empty().then(|| {
        ValidationError::new(
            element_id,
            "Required",
            format!("{label} is required."),
        )
    })
}

pub fn validate_card_text(text: &str) -> Vec<ValidationError> {
    required(CARD_TEXT_ELEMENT, text, "Card text")
        .into_iter()
        .collect()
}

pub fn validate_comment_text(text: &str) -> Vec<ValidationError> {
    required(COMMENT_TEXT_ELEMENT, text, "Comment text")
        .into_iter()
        .collect()
}

pub fn validate_project_name(name: &str) -> Vec<ValidationError> {
    required(PROJECT_NAME_ELEMENT, name, "Project name")
        .into_iter()
        .collect()
}

/// Check a new category against the existing ones.
///
/// Names must be non-blank and unique ignoring case and surrounding
/// whitespace; the color must come from the preset catalogue.
pub fn validate_category_add<S: CategorySet>(
    existing: &S,
    name: &str,
    color: &PresetColorId,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(error) = required(CATEGORY_NAME_ELEMENT, name, "Category name") {
        errors.push(error);
    } else {
        let wanted = name.trim().to_lowercase();
        let taken = existing
            .categories()
            .iter()
            .any(|category| category.name.trim().to_lowercase() == wanted);
        if taken {
            errors.push(ValidationError::new(
                CATEGORY_NAME_ELEMENT,
                "Already in use",
                format!("A category named \"{}\" already exists.", name.trim()),
            ));
        }
    }

    if PresetColor::find(color).is_none() {
        errors.push(ValidationError::new(
            CATEGORY_COLOR_ELEMENT,
            "Pick a color",
            "Category color must be one of the preset colors.",
        ));
    }

    errors
}
