//! Typed query algebra.
//!
//! A [`Query<R>`] names one read together with a proof that `R` is the type
//! that read produces. The proof is an [`Is<A, B>`] value, which can only be
//! built for `A == B`, so `execute` can hand back a precisely typed `R` for
//! every variant without casting. Queries of different result types are
//! batched by lowering them to [`QueryRequest`]s; a [`BatchKey<R>`] keeps the
//! typed query around to decode its answer afterwards.

use std::fmt;
use std::marker::PhantomData;

use cardboard_api::{
    ApiError, BoardId, Card, CardEvent, CardId, CardStatus, CardTree, Category,
    CategoryWithColor, PresetColor, Project, ProjectId, QueryBatch, QueryRequest, QueryResponse,
    QueryResult,
};
use cardboard_core::{CardSet, CategorySet, ColorSet, CommentSet, ProjectSet};

use crate::snapshot::AppSnapshot;
use crate::tree::build_card_trees;

// =============================================================================
// Type equality witness
// =============================================================================

/// Evidence that `A` and `B` are the same type.
///
/// The only constructor is [`Is::refl`], which produces `Is<T, T>`. Holding an
/// `Is<A, B>` therefore proves `A == B`, and [`Is::cast`] is the identity.
pub struct Is<A, B> {
    coerce: fn(A) -> B,
    _marker: PhantomData<fn(B) -> A>,
}

impl<T> Is<T, T> {
    pub fn refl() -> Self {
        Is {
            coerce: std::convert::identity,
            _marker: PhantomData,
        }
    }
}

impl<A, B> Is<A, B> {
    pub fn cast(&self, value: A) -> B {
        (self.coerce)(value)
    }
}

impl<A, B> Clone for Is<A, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, B> Copy for Is<A, B> {}

impl<A, B> PartialEq for Is<A, B> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<A, B> fmt::Debug for Is<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Is")
    }
}

// =============================================================================
// Queries
// =============================================================================

/// One read operation whose result type is `R`.
///
/// Build values with the constructor functions in this module ([`card`],
/// [`board_card_trees`], ...); they fix `R` for each variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Query<R> {
    Card {
        card_id: CardId,
        proof: Is<Option<Card>, R>,
    },
    ParentCard {
        card_id: CardId,
        proof: Is<Option<Card>, R>,
    },
    CardChildCount {
        card_id: CardId,
        proof: Is<usize, R>,
    },
    CardHistory {
        card_id: CardId,
        proof: Is<Vec<CardEvent>, R>,
    },
    SearchCards {
        search_term: String,
        proof: Is<Vec<Card>, R>,
    },
    BoardCardTrees {
        board_id: BoardId,
        card_statuses: Vec<CardStatus>,
        proof: Is<Vec<CardTree>, R>,
    },
    ParentBoard {
        board_id: BoardId,
        proof: Is<BoardId, R>,
    },
    AllCategories {
        proof: Is<Vec<Category>, R>,
    },
    AvailableCategories {
        proof: Is<Vec<CategoryWithColor>, R>,
    },
    AllColors {
        proof: Is<Vec<PresetColor>, R>,
    },
    AllProjects {
        proof: Is<Vec<Project>, R>,
    },
    Project {
        project_id: ProjectId,
        proof: Is<Option<Project>, R>,
    },
}

pub fn card(card_id: impl Into<CardId>) -> Query<Option<Card>> {
    Query::Card {
        card_id: card_id.into(),
        proof: Is::refl(),
    }
}

pub fn parent_card(card_id: impl Into<CardId>) -> Query<Option<Card>> {
    Query::ParentCard {
        card_id: card_id.into(),
        proof: Is::refl(),
    }
}

pub fn card_child_count(card_id: impl Into<CardId>) -> Query<usize> {
    Query::CardChildCount {
        card_id: card_id.into(),
        proof: Is::refl(),
    }
}

pub fn card_history(card_id: impl Into<CardId>) -> Query<Vec<CardEvent>> {
    Query::CardHistory {
        card_id: card_id.into(),
        proof: Is::refl(),
    }
}

pub fn search_cards(search_term: impl Into<String>) -> Query<Vec<Card>> {
    Query::SearchCards {
        search_term: search_term.into(),
        proof: Is::refl(),
    }
}

pub fn board_card_trees(
    board_id: BoardId,
    card_statuses: impl IntoIterator<Item = CardStatus>,
) -> Query<Vec<CardTree>> {
    Query::BoardCardTrees {
        board_id,
        card_statuses: card_statuses.into_iter().collect(),
        proof: Is::refl(),
    }
}

pub fn parent_board(board_id: BoardId) -> Query<BoardId> {
    Query::ParentBoard {
        board_id,
        proof: Is::refl(),
    }
}

pub fn all_categories() -> Query<Vec<Category>> {
    Query::AllCategories { proof: Is::refl() }
}

pub fn available_categories() -> Query<Vec<CategoryWithColor>> {
    Query::AvailableCategories { proof: Is::refl() }
}

pub fn all_colors() -> Query<Vec<PresetColor>> {
    Query::AllColors { proof: Is::refl() }
}

pub fn all_projects() -> Query<Vec<Project>> {
    Query::AllProjects { proof: Is::refl() }
}

pub fn project(project_id: impl Into<ProjectId>) -> Query<Option<Project>> {
    Query::Project {
        project_id: project_id.into(),
        proof: Is::refl(),
    }
}

impl<R> Query<R> {
    /// Lower to the untyped wire request.
    pub fn to_request(&self) -> QueryRequest {
        match self {
            Query::Card { card_id, .. } => QueryRequest::Card {
                card_id: card_id.clone(),
            },
            Query::ParentCard { card_id, .. } => QueryRequest::ParentCard {
                card_id: card_id.clone(),
            },
            Query::CardChildCount { card_id, .. } => QueryRequest::CardChildCount {
                card_id: card_id.clone(),
            },
            Query::CardHistory { card_id, .. } => QueryRequest::CardHistory {
                card_id: card_id.clone(),
            },
            Query::SearchCards { search_term, .. } => QueryRequest::SearchCards {
                search_term: search_term.clone(),
            },
            Query::BoardCardTrees {
                board_id,
                card_statuses,
                ..
            } => QueryRequest::BoardCardTrees {
                board_id: board_id.clone(),
                card_statuses: card_statuses.clone(),
            },
            Query::ParentBoard { board_id, .. } => QueryRequest::ParentBoard {
                board_id: board_id.clone(),
            },
            Query::AllCategories { .. } => QueryRequest::AllCategories,
            Query::AvailableCategories { .. } => QueryRequest::AvailableCategories,
            Query::AllColors { .. } => QueryRequest::AllColors,
            Query::AllProjects { .. } => QueryRequest::AllProjects,
            Query::Project { project_id, .. } => QueryRequest::Project {
                project_id: project_id.clone(),
            },
        }
    }

    /// Kind of [`QueryResult`] this query is answered with.
    pub fn result_kind(&self) -> &'static str {
        match self {
            Query::Card { .. } | Query::ParentCard { .. } => "card",
            Query::CardChildCount { .. } => "count",
            Query::CardHistory { .. } => "history",
            Query::SearchCards { .. } => "cards",
            Query::BoardCardTrees { .. } => "trees",
            Query::ParentBoard { .. } => "boardId",
            Query::AllCategories { .. } => "categories",
            Query::AvailableCategories { .. } => "categoriesWithColor",
            Query::AllColors { .. } => "colors",
            Query::AllProjects { .. } => "projects",
            Query::Project { .. } => "project",
        }
    }

    /// Recover the typed answer from an untyped result.
    ///
    /// Fails with [`ApiError::ResultMismatch`] when the result has a different
    /// shape than this query produces.
    pub fn decode(&self, result: QueryResult) -> Result<R, ApiError> {
        match (self, result) {
            (Query::Card { proof, .. } | Query::ParentCard { proof, .. }, QueryResult::Card(v)) => {
                Ok(proof.cast(v))
            }
            (Query::CardChildCount { proof, .. }, QueryResult::Count(v)) => Ok(proof.cast(v)),
            (Query::CardHistory { proof, .. }, QueryResult::History(v)) => Ok(proof.cast(v)),
            (Query::SearchCards { proof, .. }, QueryResult::Cards(v)) => Ok(proof.cast(v)),
            (Query::BoardCardTrees { proof, .. }, QueryResult::Trees(v)) => Ok(proof.cast(v)),
            (Query::ParentBoard { proof, .. }, QueryResult::BoardId(v)) => Ok(proof.cast(v)),
            (Query::AllCategories { proof }, QueryResult::Categories(v)) => Ok(proof.cast(v)),
            (Query::AvailableCategories { proof }, QueryResult::CategoriesWithColor(v)) => {
                Ok(proof.cast(v))
            }
            (Query::AllColors { proof }, QueryResult::Colors(v)) => Ok(proof.cast(v)),
            (Query::AllProjects { proof }, QueryResult::Projects(v)) => Ok(proof.cast(v)),
            (Query::Project { proof, .. }, QueryResult::Project(v)) => Ok(proof.cast(v)),
            (query, other) => Err(ApiError::ResultMismatch {
                expected: query.result_kind().to_string(),
                found: other.kind().to_string(),
            }),
        }
    }
}

// =============================================================================
// Execution
// =============================================================================

/// Evaluate a query against one snapshot.
pub fn execute<R>(snapshot: &AppSnapshot, query: &Query<R>) -> R {
    match query {
        Query::Card { card_id, proof } => proof.cast(snapshot.card(card_id).cloned()),
        Query::ParentCard { card_id, proof } => proof.cast(
            snapshot
                .card(card_id)
                .and_then(|card| card.parent_card_id.as_ref())
                .and_then(|parent| snapshot.card(parent))
                .cloned(),
        ),
        Query::CardChildCount { card_id, proof } => {
            proof.cast(snapshot.children_of(card_id).len())
        }
        Query::CardHistory { card_id, proof } => proof.cast(history(snapshot, card_id)),
        Query::SearchCards { search_term, proof } => proof.cast(search(snapshot, search_term)),
        Query::BoardCardTrees {
            board_id,
            card_statuses,
            proof,
        } => {
            let visible: Vec<Card> = snapshot
                .cards()
                .iter()
                .filter(|card| card_statuses.contains(&card.status))
                .cloned()
                .collect();
            proof.cast(build_card_trees(&visible, board_id))
        }
        Query::ParentBoard { board_id, proof } => proof.cast(enclosing_board(snapshot, board_id)),
        Query::AllCategories { proof } => proof.cast(snapshot.categories().to_vec()),
        Query::AvailableCategories { proof } => proof.cast(
            snapshot
                .categories()
                .iter()
                .map(|category| CategoryWithColor {
                    category: category.clone(),
                    color: snapshot.color(&category.color),
                })
                .collect(),
        ),
        Query::AllColors { proof } => proof.cast(snapshot.colors()),
        Query::AllProjects { proof } => proof.cast(snapshot.projects().to_vec()),
        Query::Project { project_id, proof } => {
            proof.cast(snapshot.project(project_id).cloned())
        }
    }
}

/// Creation event followed by comment events in time order.
fn history(snapshot: &AppSnapshot, card_id: &CardId) -> Vec<CardEvent> {
    let Some(card) = snapshot.card(card_id) else {
        return Vec::new();
    };

    let mut comments: Vec<CardEvent> = snapshot
        .comments_for(card_id)
        .into_iter()
        .map(|comment| CardEvent::Comment {
            comment: comment.clone(),
            created_at: comment.created_at,
        })
        .collect();
    comments.sort_by_key(CardEvent::created_at);

    let mut events = Vec::with_capacity(comments.len() + 1);
    events.push(CardEvent::Created {
        created_at: card.created_at,
    });
    events.extend(comments);
    events
}

/// Case-insensitive substring match on card text, in collection order.
fn search(snapshot: &AppSnapshot, term: &str) -> Vec<Card> {
    let needle = term.to_lowercase();
    snapshot
        .cards()
        .iter()
        .filter(|card| card.text.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Nearest subboard root strictly above the board's root card.
fn enclosing_board(snapshot: &AppSnapshot, board: &BoardId) -> BoardId {
    let Some(start) = &board.board_root_id else {
        return BoardId::root();
    };

    let mut seen = std::collections::HashSet::from([start]);
    let mut parent = snapshot
        .card(start)
        .and_then(|card| card.parent_card_id.as_ref());

    while let Some(id) = parent {
        if !seen.insert(id) {
            break;
        }
        let Some(card) = snapshot.card(id) else {
            break;
        };
        if card.is_subboard_root {
            return BoardId::subboard(card.id.clone());
        }
        parent = card.parent_card_id.as_ref();
    }

    BoardId::root()
}

/// Untyped executor: answer a wire request against one snapshot.
pub fn execute_request(snapshot: &AppSnapshot, request: &QueryRequest) -> QueryResult {
    match request {
        QueryRequest::Card { card_id } => {
            QueryResult::Card(execute(snapshot, &card(card_id.clone())))
        }
        QueryRequest::ParentCard { card_id } => {
            QueryResult::Card(execute(snapshot, &parent_card(card_id.clone())))
        }
        QueryRequest::CardChildCount { card_id } => {
            QueryResult::Count(execute(snapshot, &card_child_count(card_id.clone())))
        }
        QueryRequest::CardHistory { card_id } => {
            QueryResult::History(execute(snapshot, &card_history(card_id.clone())))
        }
        QueryRequest::SearchCards { search_term } => {
            QueryResult::Cards(execute(snapshot, &search_cards(search_term.clone())))
        }
        QueryRequest::BoardCardTrees {
            board_id,
            card_statuses,
        } => QueryResult::Trees(execute(
            snapshot,
            &board_card_trees(board_id.clone(), card_statuses.iter().copied()),
        )),
        QueryRequest::ParentBoard { board_id } => {
            QueryResult::BoardId(execute(snapshot, &parent_board(board_id.clone())))
        }
        QueryRequest::AllCategories => {
            QueryResult::Categories(execute(snapshot, &all_categories()))
        }
        QueryRequest::AvailableCategories => {
            QueryResult::CategoriesWithColor(execute(snapshot, &available_categories()))
        }
        QueryRequest::AllColors => QueryResult::Colors(execute(snapshot, &all_colors())),
        QueryRequest::AllProjects => QueryResult::Projects(execute(snapshot, &all_projects())),
        QueryRequest::Project { project_id } => {
            QueryResult::Project(execute(snapshot, &project(project_id.clone())))
        }
    }
}

/// Answer every request of a batch, in batch order.
pub fn execute_batch(snapshot: &AppSnapshot, batch: &QueryBatch) -> Vec<QueryResult> {
    batch
        .values()
        .map(|request| execute_request(snapshot, request))
        .collect()
}

// =============================================================================
// Typed batches
// =============================================================================

/// Builder for a batch of differently typed queries.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    requests: QueryBatch,
}

/// Handle to one entry of a [`Batch`], used to decode its answer.
#[derive(Debug, Clone)]
pub struct BatchKey<R> {
    name: String,
    position: usize,
    query: Query<R>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named query. Re-using a name replaces the earlier entry's request
    /// but keeps its position.
    pub fn add<R: Clone>(&mut self, name: impl Into<String>, query: &Query<R>) -> BatchKey<R> {
        let name = name.into();
        let (position, _) = self.requests.insert_full(name.clone(), query.to_request());
        BatchKey {
            name,
            position,
            query: query.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn requests(&self) -> &QueryBatch {
        &self.requests
    }

    pub fn into_requests(self) -> QueryBatch {
        self.requests
    }
}

impl<R> BatchKey<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decode this entry's answer from a batch response.
    pub fn get(&self, response: &QueryResponse) -> Result<R, ApiError> {
        let result = response
            .results
            .get(self.position)
            .ok_or_else(|| ApiError::ResultMismatch {
                expected: self.query.result_kind().to_string(),
                found: format!("no result for `{}`", self.name),
            })?;
        self.query.decode(result.clone())
    }
}

#[cfg(test)]
mod tests;
