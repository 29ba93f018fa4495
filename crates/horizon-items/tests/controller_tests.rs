//! Tests for applying snapshots through the update controller.

mod common;

use common::{RecordingView, ViewCall, string_controller};
use horizon_items::prelude::*;

fn attached<T>() -> (std::rc::Rc<RecordingView>, std::rc::Rc<ItemsController<T>>)
where
    T: std::fmt::Display + PartialEq + 'static,
{
    let view = RecordingView::new();
    let controller = string_controller::<T>();
    controller.set_view(&view);
    view.attach_data_source(controller.clone());
    (view, controller)
}

#[test]
fn test_first_population_is_single_full_insert() {
    common::init_tracing();
    let (view, controller) = attached::<i32>();

    controller.update_collection(vec![Section::new(vec![1, 2]).with_id("A")]);

    assert_eq!(
        view.mutations(),
        vec![ViewCall::Reload {
            sections: 1,
            items: 2
        }]
    );
    assert_eq!(view.render(), vec![vec!["1", "2"]]);
}

#[test]
fn test_identical_snapshot_makes_no_calls() {
    let (view, controller) = attached::<i32>();

    for _ in 0..3 {
        controller.update_collection(vec![
            Section::new(vec![1, 2]).with_id("A"),
            Section::new(vec![3]).with_id("B"),
        ]);
    }

    assert_eq!(view.mutations().len(), 1);
}

#[test]
fn test_content_change_is_reload_without_section_change() {
    let (view, controller) = attached::<i32>();

    controller.update_collection(vec![Section::new(vec![1, 2, 3]).with_id("A")]);
    controller.update_collection(vec![Section::new(vec![1, 2, 4]).with_id("A")]);

    let mutations = view.mutations();
    let ViewCall::Batch(changes) = &mutations[1] else {
        panic!("expected a batch, got {:?}", mutations[1]);
    };
    assert!(changes.deleted_sections().is_empty());
    assert!(changes.inserted_sections().is_empty());
    assert!(changes.moved_sections().is_empty());
    assert_eq!(changes.reloaded_items(), &[IndexPath::new(0, 2)]);
    assert_eq!(changes.len(), 1);
    assert_eq!(view.displayed(), vec![vec!["1", "2", "4"]]);
}

#[test]
fn test_pure_section_reorder_is_one_move() {
    let (view, controller) = attached::<&str>();

    controller.update_collection(vec![
        Section::new(vec!["a1"]).with_id("A"),
        Section::new(vec!["b1", "b2"]).with_id("B"),
    ]);
    controller.update_collection(vec![
        Section::new(vec!["b1", "b2"]).with_id("B"),
        Section::new(vec!["a1"]).with_id("A"),
    ]);

    let mutations = view.mutations();
    let ViewCall::Batch(changes) = &mutations[1] else {
        panic!("expected a batch");
    };
    assert_eq!(changes.moved_sections().len(), 1);
    assert_eq!(
        changes
            .operations()
            .filter(|op| matches!(
                op,
                Operation::DeleteItem(_)
                    | Operation::InsertItem(_)
                    | Operation::MoveItem { .. }
                    | Operation::ReloadItem(_)
            ))
            .count(),
        0
    );
    assert_eq!(view.displayed(), vec![vec!["b1", "b2"], vec!["a1"]]);
}

#[test]
fn test_identity_survives_content_change() {
    let (view, controller) = attached::<i32>();

    controller.update_collection(vec![
        Section::new(vec![1]).with_header("Odd"),
        Section::new(vec![2]).with_header("Even"),
    ]);
    controller.update_collection(vec![
        Section::new(vec![1, 3, 5]).with_header("Odd"),
        Section::new(vec![2]).with_header("Even"),
    ]);

    let mutations = view.mutations();
    let ViewCall::Batch(changes) = &mutations[1] else {
        panic!("expected a batch");
    };
    assert!(changes.inserted_sections().is_empty());
    assert_eq!(
        changes.inserted_items(),
        &[IndexPath::new(0, 1), IndexPath::new(0, 2)]
    );
}

#[test]
fn test_untitled_sections_never_match() {
    let (view, controller) = attached::<i32>();

    controller.update_collection(vec![Section::new(vec![1])]);
    controller.update_collection(vec![Section::new(vec![1])]);

    let mutations = view.mutations();
    let ViewCall::Batch(changes) = &mutations[1] else {
        panic!("expected a batch");
    };
    assert_eq!(changes.deleted_sections(), &[0]);
    assert_eq!(changes.inserted_sections(), &[0]);
}

#[test]
fn test_flat_snapshots_diff_items() {
    let (view, controller) = attached::<char>();

    controller.update_collection(Snapshot::items(vec!['a', 'b', 'c']));
    controller.update_collection(Snapshot::items(vec!['c', 'a', 'b']));

    let mutations = view.mutations();
    let ViewCall::Batch(changes) = &mutations[1] else {
        panic!("expected a batch");
    };
    assert_eq!(
        changes.moved_items(),
        &[(IndexPath::new(0, 2), IndexPath::new(0, 0))]
    );
    assert_eq!(view.displayed(), vec![vec!["c", "a", "b"]]);
}

#[test]
fn test_released_view_is_silent() {
    let (view, controller) = attached::<i32>();
    controller.update_collection(vec![vec![1]]);
    drop(view);

    controller.update_collection(vec![vec![1, 2]]);
    controller.update_collection(vec![vec![1, 2, 3]]);

    assert!(controller.view().is_none());
    assert_eq!(controller.snapshot().total_items(), 3);
}

#[test]
fn test_new_view_after_release_is_loaded_in_full() {
    let (view, controller) = attached::<i32>();
    controller.update_collection(vec![vec![1]]);
    drop(view);
    controller.update_collection(vec![vec![1, 2]]);

    let replacement = RecordingView::new();
    controller.set_view(&replacement);
    replacement.attach_data_source(controller.clone());
    controller.update_collection(vec![vec![1, 2, 3]]);

    assert_eq!(
        replacement.mutations(),
        vec![ViewCall::Reload {
            sections: 1,
            items: 3
        }]
    );
    assert_eq!(replacement.displayed(), vec![vec!["1", "2", "3"]]);

    controller.update_collection(vec![vec![3, 1]]);
    assert_eq!(replacement.displayed(), replacement.render());
}

#[test]
fn test_diff_options_are_honored() {
    let view = RecordingView::new();
    let controller = ItemsController::with_options(
        "cell",
        |cell: &mut String, _, item: &i32| *cell = item.to_string(),
        DiffOptions::default().with_moves(false).with_reloads(false),
    );
    controller.set_view(&view);
    view.attach_data_source(controller.clone());

    controller.update_collection(Snapshot::items(vec![1, 2, 3]));
    controller.update_collection(Snapshot::items(vec![3, 1, 9]));

    let mutations = view.mutations();
    let ViewCall::Batch(changes) = &mutations[1] else {
        panic!("expected a batch");
    };
    assert!(changes.moved_items().is_empty());
    assert!(changes.reloaded_items().is_empty());
    // 3 stays; 1 and 2 go; 1 and 9 come after it.
    assert_eq!(
        changes.deleted_items(),
        &[IndexPath::new(0, 0), IndexPath::new(0, 1)]
    );
    assert_eq!(
        changes.inserted_items(),
        &[IndexPath::new(0, 1), IndexPath::new(0, 2)]
    );
    assert_eq!(view.displayed(), vec![vec!["3", "1", "9"]]);
}

#[test]
fn test_snapshot_sequence_converges() {
    let (view, controller) = attached::<u32>();

    let states: Vec<Vec<Vec<u32>>> = vec![
        vec![vec![1, 2, 3], vec![4]],
        vec![vec![3, 2, 1], vec![4, 5]],
        vec![vec![2], vec![], vec![6, 7]],
        vec![vec![7, 6], vec![2]],
        vec![],
        vec![vec![8]],
    ];

    for state in &states {
        controller.update_collection(state.clone());
        let expected: Vec<Vec<String>> = state
            .iter()
            .map(|section| section.iter().map(u32::to_string).collect())
            .collect();
        assert_eq!(view.displayed(), expected);
        assert_eq!(view.render(), expected);
    }
}

#[test]
fn test_sectioned_edits_replay_correctly() {
    let (view, controller) = attached::<&str>();

    let s = |id: &str, items: &[&'static str]| Section::new(items.to_vec()).with_id(id);
    let states = vec![
        vec![s("fruit", &["apple", "pear", "plum"]), s("veg", &["leek", "kale"])],
        vec![s("veg", &["kale", "leek", "okra"]), s("fruit", &["pear", "fig"])],
        vec![
            s("nuts", &["pecan"]),
            s("fruit", &["fig", "pear", "apple"]),
            s("veg", &["okra"]),
        ],
        vec![s("veg", &["okra", "kale"]), s("nuts", &["pecan", "cashew"])],
        vec![s("veg", &["okra", "kale"]).with_footer("2 items"), s("nuts", &["cashew"])],
    ];

    for state in states {
        controller.update_collection(state);
        assert_eq!(view.displayed(), view.render());
    }
    assert_eq!(view.mutations().len(), 5);
}
