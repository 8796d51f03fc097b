use super::*;
use cardboard_api::{
    CardAdd, CardEdit, CardEdits, CategoryAdd, CategoryId, CommentAdd, CommentId, Mutation,
    PresetColorId, ProjectAdd, Timestamp,
};

use crate::mutations::apply_mutation;

fn apply_all(mutations: Vec<(Mutation, i64)>) -> AppSnapshot {
    mutations
        .into_iter()
        .fold(AppSnapshot::empty(), |snapshot, (mutation, at)| {
            apply_mutation(&snapshot, &mutation, Timestamp::new(at, 0))
        })
}

fn add_card(id: &str, parent: Option<&str>, text: &str, created: i64) -> (Mutation, i64) {
    (
        Mutation::CardAdd(CardAdd {
            id: CardId::new(id),
            category_id: CategoryId::new("work"),
            parent_card_id: parent.map(CardId::new),
            text: text.to_string(),
            created_at: Timestamp::new(created, 0),
        }),
        0,
    )
}

fn make_subboard_root(id: &str) -> (Mutation, i64) {
    edit(id, CardEdits {
        is_subboard_root: Some(true),
        ..Default::default()
    })
}

fn edit(id: &str, edits: CardEdits) -> (Mutation, i64) {
    (
        Mutation::CardEdit(CardEdit {
            id: CardId::new(id),
            edits,
        }),
        0,
    )
}

fn comment(id: &str, card_id: &str, at: i64) -> (Mutation, i64) {
    (
        Mutation::CommentAdd(CommentAdd {
            id: CommentId::new(id),
            card_id: CardId::new(card_id),
            text: format!("comment {id}"),
        }),
        at,
    )
}

fn category(id: &str, color: &str) -> (Mutation, i64) {
    (
        Mutation::CategoryAdd(CategoryAdd {
            id: CategoryId::new(id),
            name: id.to_string(),
            color: PresetColorId::new(color),
        }),
        0,
    )
}

fn sample() -> AppSnapshot {
    apply_all(vec![
        category("work", "blue"),
        category("home", "no-such-color"),
        add_card("plan", None, "Write Spec", 10),
        add_card("sub", Some("plan"), "Subboard", 11),
        make_subboard_root("sub"),
        add_card("task", Some("sub"), "Draft outline", 12),
        add_card("note", Some("task"), "remember this", 13),
        add_card("done", Some("plan"), "Old work", 14),
        edit("done", CardEdits {
            status: Some(cardboard_api::CardStatus::Done),
            ..Default::default()
        }),
        comment("m2", "plan", 30),
        comment("m1", "plan", 20),
        (
            Mutation::ProjectAdd(ProjectAdd {
                id: ProjectId::new("p1"),
                name: "Launch".to_string(),
            }),
            0,
        ),
    ])
}

#[test]
fn test_card_and_parent_lookup() {
    let s = sample();
    assert_eq!(execute(&s, &card("task")).unwrap().text, "Draft outline");
    assert_eq!(execute(&s, &card("missing")), None);
    assert_eq!(execute(&s, &parent_card("task")).unwrap().id.as_str(), "sub");
    assert_eq!(execute(&s, &parent_card("plan")), None);
}

#[test]
fn test_child_count() {
    let s = sample();
    assert_eq!(execute(&s, &card_child_count("plan")), 2);
    assert_eq!(execute(&s, &card_child_count("note")), 0);
}

#[test]
fn test_history_starts_with_creation_then_comments_by_time() {
    let s = sample();
    let events = execute(&s, &card_history("plan"));

    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        CardEvent::Created {
            created_at: Timestamp::new(10, 0)
        }
    );
    let times: Vec<i64> = events.iter().map(|e| e.created_at().seconds).collect();
    assert_eq!(times, vec![10, 20, 30]);
    assert!(execute(&s, &card_history("missing")).is_empty());
}

#[test]
fn test_search_is_case_insensitive_substring() {
    let s = sample();
    for term in ["write", "SPEC", "e sp"] {
        let found = execute(&s, &search_cards(term));
        assert_eq!(found.len(), 1, "term {term:?}");
        assert_eq!(found[0].id.as_str(), "plan");
    }
    assert!(execute(&s, &search_cards("nothing like it")).is_empty());
}

#[test]
fn test_board_trees_filter_by_status() {
    let s = sample();
    let open = execute(
        &s,
        &board_card_trees(BoardId::root(), [cardboard_api::CardStatus::None]),
    );
    assert_eq!(open.len(), 1);
    let children: Vec<&str> = open[0].children.iter().map(|t| t.card.id.as_str()).collect();
    assert_eq!(children, vec!["sub"]);
    assert!(open[0].children[0].children.is_empty());

    let all = execute(&s, &board_card_trees(BoardId::root(), CardStatus::ALL));
    assert_eq!(all[0].children.len(), 2);

    let sub = execute(
        &s,
        &board_card_trees(BoardId::subboard("sub"), [cardboard_api::CardStatus::None]),
    );
    let ids: Vec<&str> = sub[0].card_ids().into_iter().map(CardId::as_str).collect();
    assert_eq!(ids, vec!["sub", "task", "note"]);
}

#[test]
fn test_parent_board_walks_to_enclosing_subboard() {
    let s = sample();
    assert_eq!(execute(&s, &parent_board(BoardId::root())), BoardId::root());
    assert_eq!(
        execute(&s, &parent_board(BoardId::subboard("sub"))),
        BoardId::root()
    );

    let nested = apply_mutation(
        &s,
        &make_subboard_root("note").0,
        Timestamp::EPOCH,
    );
    assert_eq!(
        execute(&nested, &parent_board(BoardId::subboard("note"))),
        BoardId::subboard("sub")
    );
}

#[test]
fn test_category_and_color_projections() {
    let s = sample();
    let names: Vec<String> = execute(&s, &all_categories())
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["work", "home"]);

    let available = execute(&s, &available_categories());
    assert_eq!(available[0].color.hex, "#aecbfa");
    assert_eq!(available[1].color, PresetColor::white());

    assert_eq!(execute(&s, &all_colors()), PresetColor::catalogue());
    assert_eq!(execute(&s, &all_projects()).len(), 1);
    assert_eq!(execute(&s, &project("p1")).unwrap().name, "Launch");
    assert_eq!(execute(&s, &project("p2")), None);
}

#[test]
fn test_typed_and_untyped_execution_agree() {
    let s = sample();
    let query = board_card_trees(BoardId::subboard("sub"), CardStatus::ALL);

    let untyped = execute_request(&s, &query.to_request());
    assert_eq!(query.decode(untyped).unwrap(), execute(&s, &query));
}

#[test]
fn test_decode_rejects_mismatched_result() {
    let err = card_child_count("plan")
        .decode(QueryResult::Cards(Vec::new()))
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::ResultMismatch {
            expected: "count".to_string(),
            found: "cards".to_string(),
        }
    );
}

#[test]
fn test_heterogeneous_batch() {
    let s = sample();
    let mut batch = Batch::new();
    let count = batch.add("count", &card_child_count("plan"));
    let found = batch.add("found", &search_cards("draft"));
    let colors = batch.add("colors", &all_colors());
    assert_eq!(batch.len(), 3);

    let response = QueryResponse {
        snapshot_index: 0,
        results: execute_batch(&s, batch.requests()),
    };

    let count: usize = count.get(&response).unwrap();
    let found: Vec<Card> = found.get(&response).unwrap();
    assert_eq!(count, 2);
    assert_eq!(found[0].id.as_str(), "task");
    assert_eq!(colors.get(&response).unwrap().len(), 8);
}

#[test]
fn test_batch_key_reports_missing_result() {
    let mut batch = Batch::new();
    let key = batch.add("card", &card("plan"));
    let response = QueryResponse {
        snapshot_index: 0,
        results: Vec::new(),
    };
    assert!(matches!(
        key.get(&response),
        Err(ApiError::ResultMismatch { .. })
    ));
}
