//! Untyped query wire shapes.
//!
//! A [`QueryRequest`] names one read and its parameters; a [`QueryResult`] is
//! the matching answer. Typed access lives in the engine's `Query<R>`, which
//! converts to and from these shapes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    BoardId, Card, CardEvent, CardId, CardStatus, CardTree, Category, CategoryWithColor,
    PresetColor, Project, ProjectId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QueryRequest {
    #[serde(rename_all = "camelCase")]
    Card { card_id: CardId },
    #[serde(rename_all = "camelCase")]
    ParentCard { card_id: CardId },
    #[serde(rename_all = "camelCase")]
    CardChildCount { card_id: CardId },
    #[serde(rename_all = "camelCase")]
    CardHistory { card_id: CardId },
    #[serde(rename_all = "camelCase")]
    SearchCards { search_term: String },
    #[serde(rename_all = "camelCase")]
    BoardCardTrees {
        board_id: BoardId,
        card_statuses: Vec<CardStatus>,
    },
    #[serde(rename_all = "camelCase")]
    ParentBoard { board_id: BoardId },
    AllCategories,
    AvailableCategories,
    AllColors,
    AllProjects,
    #[serde(rename_all = "camelCase")]
    Project { project_id: ProjectId },
}

impl QueryRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryRequest::Card { .. } => "card",
            QueryRequest::ParentCard { .. } => "parentCard",
            QueryRequest::CardChildCount { .. } => "cardChildCount",
            QueryRequest::CardHistory { .. } => "cardHistory",
            QueryRequest::SearchCards { .. } => "searchCards",
            QueryRequest::BoardCardTrees { .. } => "boardCardTrees",
            QueryRequest::ParentBoard { .. } => "parentBoard",
            QueryRequest::AllCategories => "allCategories",
            QueryRequest::AvailableCategories => "availableCategories",
            QueryRequest::AllColors => "allColors",
            QueryRequest::AllProjects => "allProjects",
            QueryRequest::Project { .. } => "project",
        }
    }
}

/// Answer to one [`QueryRequest`], tagged by result shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum QueryResult {
    Card(Option<Card>),
    Cards(Vec<Card>),
    Count(usize),
    History(Vec<CardEvent>),
    Trees(Vec<CardTree>),
    BoardId(BoardId),
    Categories(Vec<Category>),
    CategoriesWithColor(Vec<CategoryWithColor>),
    Colors(Vec<PresetColor>),
    Projects(Vec<Project>),
    Project(Option<Project>),
}

impl QueryResult {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryResult::Card(_) => "card",
            QueryResult::Cards(_) => "cards",
            QueryResult::Count(_) => "count",
            QueryResult::History(_) => "history",
            QueryResult::Trees(_) => "trees",
            QueryResult::BoardId(_) => "boardId",
            QueryResult::Categories(_) => "categories",
            QueryResult::CategoriesWithColor(_) => "categoriesWithColor",
            QueryResult::Colors(_) => "colors",
            QueryResult::Projects(_) => "projects",
            QueryResult::Project(_) => "project",
        }
    }
}

/// A named batch of queries answered in one round trip.
///
/// Insertion order is preserved and is the order of the response's results.
pub type QueryBatch = IndexMap<String, QueryRequest>;

/// Reply of the query endpoint: results in request order, all taken from the
/// snapshot at `snapshot_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub snapshot_index: usize,
    pub results: Vec<QueryResult>,
}
