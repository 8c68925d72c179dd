use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use nbwidget::{
    core::{
        msg::{Callbacks, CommId, ExecutionState, GroupKey, StatusMsg, SyncMsg, ViewId},
        view::UiEvent,
    },
    domain::attributes::Attributes,
    infrastructure::comm::Outbound,
    test_helpers::{comm_msg, drain, drain_sync, manager_with_cells, open},
    WidgetManager,
};

fn attrs(value: Value) -> Attributes {
    Attributes::from_value(value).unwrap()
}

fn display(manager: &mut WidgetManager, comm_id: &str, data: Value) {
    let mut data = data;
    data["method"] = json!("display");
    manager.handle_comm_msg(&comm_msg(comm_id, data)).unwrap();
}

fn remote_update(manager: &mut WidgetManager, comm_id: &str, state: Value) {
    manager
        .handle_comm_msg(&comm_msg(comm_id, json!({"method": "update", "state": state})))
        .unwrap();
}

fn idle() -> StatusMsg {
    StatusMsg {
        execution_state: ExecutionState::Idle,
    }
}

#[test]
fn test_throttled_view_changes_flush_as_one_patch() {
    let (mut manager, mut rx) = manager_with_cells(1, 3);
    manager.handle_comm_open(&open("c1", "WidgetModel")).unwrap();
    display(&mut manager, "c1", json!({"view_name": "WidgetView"}));
    let view = ViewId(1);

    for change in [
        json!({"a": 1}),
        json!({"a": 2}),
        json!({"b": 1}),
        json!({"a": 3, "c": 1}),
    ] {
        manager.update_other_views(view, &attrs(change)).unwrap();
    }

    assert_eq!(
        drain_sync(&mut rx),
        vec![
            SyncMsg::Patch { data: attrs(json!({"a": 1})) },
            SyncMsg::Patch { data: attrs(json!({"a": 2})) },
            SyncMsg::Patch { data: attrs(json!({"b": 1})) },
        ]
    );

    manager.handle_status(&CommId::from("c1"), &idle());
    assert_eq!(
        drain_sync(&mut rx),
        vec![SyncMsg::Patch { data: attrs(json!({"a": 3, "c": 1})) }]
    );
    let model = manager.model(&CommId::from("c1")).unwrap();
    assert_eq!(model.pending_msgs(), 3);
    assert_eq!(model.attributes(), &attrs(json!({"a": 3, "b": 1, "c": 1})));
}

#[test]
fn test_remote_update_refreshes_views_without_echo() {
    let (mut manager, mut rx) = manager_with_cells(1, 3);
    manager.handle_comm_open(&open("c1", "BoolWidgetModel")).unwrap();
    display(&mut manager, "c1", json!({"view_name": "CheckboxView", "cell_index": 0}));

    remote_update(&mut manager, "c1", json!({"value": true, "description": "Title"}));

    assert!(drain(&mut rx).is_empty());
    let html = manager.render_area(GroupKey::Cell(0));
    assert!(html.contains("<input checked=\"checked\" type=\"checkbox\">"), "{html}");
    assert!(html.contains("<div class=\"widget-hlabel\">Title</div>"), "{html}");
}

#[test]
fn test_remote_visibility_change_toggles_once() {
    let (mut manager, mut rx) = manager_with_cells(1, 3);
    manager.handle_comm_open(&open("c1", "BoolWidgetModel")).unwrap();
    display(&mut manager, "c1", json!({"view_name": "CheckboxView"}));

    remote_update(&mut manager, "c1", json!({"visible": false}));
    remote_update(&mut manager, "c1", json!({"visible": false, "value": true}));

    let base = manager.view(ViewId(1)).unwrap().base();
    assert!(!base.is_visible());
    assert_eq!(base.visibility_changes(), 1);
    assert!(base.element().is_hidden());
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_css_overrides_apply_to_style_target() {
    let (mut manager, _rx) = manager_with_cells(1, 3);
    manager.handle_comm_open(&open("c1", "BoolWidgetModel")).unwrap();
    display(&mut manager, "c1", json!({"view_name": "ToggleButtonView"}));

    remote_update(&mut manager, "c1", json!({"_css": {"": {"width": "80px"}}}));

    let element = manager.view(ViewId(1)).unwrap().base().element();
    assert_eq!(element.style("width"), None);
    assert_eq!(element.find("button").unwrap().style("width"), Some("80px"));
    assert!(manager
        .model(&CommId::from("c1"))
        .unwrap()
        .attributes()
        .get("_css")
        .is_none());
}

#[test]
fn test_interaction_updates_sibling_views() {
    let (mut manager, mut rx) = manager_with_cells(1, 3);
    manager.handle_comm_open(&open("c1", "BoolWidgetModel")).unwrap();
    display(&mut manager, "c1", json!({"view_name": "CheckboxView"}));
    display(&mut manager, "c1", json!({"view_name": "ToggleButtonView"}));

    manager.handle_ui_event(ViewId(2), &UiEvent::Click).unwrap();

    assert_eq!(
        drain(&mut rx),
        vec![Outbound::CommMsg {
            comm_id: CommId::from("c1"),
            data: SyncMsg::Patch { data: attrs(json!({"value": true})) },
            callbacks: Callbacks {
                output: Some(GroupKey::Cell(0))
            },
        }]
    );
    let checkbox = manager.view(ViewId(1)).unwrap().base().element();
    assert_eq!(checkbox.find("input").unwrap().attr("checked"), Some("checked"));
    let toggle = manager.view(ViewId(2)).unwrap().base().element();
    assert!(toggle.find("button").unwrap().has_class("active"));
}

#[test]
fn test_button_click_sends_custom_message_and_routes_output() {
    let (mut manager, mut rx) = manager_with_cells(2, 3);
    manager.handle_comm_open(&open("c1", "ButtonWidgetModel")).unwrap();
    display(&mut manager, "c1", json!({"view_name": "ButtonView", "cell_index": 1}));

    manager.handle_ui_event(ViewId(1), &UiEvent::Click).unwrap();
    assert_eq!(
        drain_sync(&mut rx),
        vec![SyncMsg::Custom {
            content: json!({"event": "click"})
        }]
    );

    manager.handle_output(&CommId::from("c1"), "clicked!");
    assert_eq!(
        manager.document().get_cell(1).unwrap().outputs,
        vec!["clicked!".to_string()]
    );
    assert!(manager.document().get_cell(0).unwrap().outputs.is_empty());

    remote_update(&mut manager, "c1", json!({"disabled": true}));
    manager.handle_ui_event(ViewId(1), &UiEvent::Click).unwrap();
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_display_without_child_capability_falls_back_to_area() {
    let (mut manager, _rx) = manager_with_cells(1, 3);
    manager.handle_comm_open(&open("parent", "ButtonWidgetModel")).unwrap();
    manager.handle_comm_open(&open("child", "BoolWidgetModel")).unwrap();
    display(&mut manager, "parent", json!({"view_name": "ButtonView"}));
    display(
        &mut manager,
        "child",
        json!({"view_name": "CheckboxView", "parent": "parent"}),
    );

    let area = manager.document().widget_area(GroupKey::Cell(0));
    assert_eq!(area.views(), &[ViewId(1), ViewId(2)]);
    assert!(area.is_shown());
}

#[test]
fn test_display_delegates_to_container_parent() {
    let (mut manager, mut rx) = manager_with_cells(1, 3);
    manager.handle_comm_open(&open("box", "ContainerWidgetModel")).unwrap();
    manager.handle_comm_open(&open("btn", "ButtonWidgetModel")).unwrap();
    display(&mut manager, "box", json!({"view_name": "ContainerView"}));
    display(&mut manager, "btn", json!({"view_name": "ButtonView", "parent": "box"}));
    remote_update(&mut manager, "btn", json!({"description": "Go now"}));

    assert_eq!(
        manager.document().widget_area(GroupKey::Cell(0)).views(),
        &[ViewId(1)]
    );
    assert_eq!(manager.view(ViewId(1)).unwrap().children(), &[ViewId(2)]);
    assert_eq!(
        manager.render_view(ViewId(1)),
        "<div class=\"widget-container\"><button class=\"btn\">Go&nbsp;now</button></div>"
    );

    // Removing the container takes the child with it.
    assert!(manager.remove_view(ViewId(1)));
    assert!(manager.view(ViewId(2)).is_none());
    assert_eq!(
        drain(&mut rx),
        vec![
            Outbound::CommClose {
                comm_id: CommId::from("btn")
            },
            Outbound::CommClose {
                comm_id: CommId::from("box")
            },
        ]
    );
}

#[test]
fn test_parent_in_other_group_is_not_used() {
    let (mut manager, _rx) = manager_with_cells(2, 3);
    manager.handle_comm_open(&open("box", "ContainerWidgetModel")).unwrap();
    manager.handle_comm_open(&open("btn", "ButtonWidgetModel")).unwrap();
    display(&mut manager, "box", json!({"view_name": "ContainerView", "cell_index": 0}));
    display(
        &mut manager,
        "btn",
        json!({"view_name": "ButtonView", "parent": "box", "cell_index": 1}),
    );

    assert!(manager.view(ViewId(1)).unwrap().children().is_empty());
    assert_eq!(
        manager.document().widget_area(GroupKey::Cell(1)).views(),
        &[ViewId(2)]
    );
}

#[test]
fn test_teardown_is_idempotent() {
    let (mut manager, mut rx) = manager_with_cells(1, 3);
    manager.handle_comm_open(&open("c1", "IntWidgetModel")).unwrap();
    display(&mut manager, "c1", json!({"view_name": "IntTextView"}));
    display(&mut manager, "c1", json!({"view_name": "IntTextView"}));

    assert!(manager.remove_view(ViewId(1)));
    assert!(drain(&mut rx).is_empty());
    assert!(manager.remove_view(ViewId(2)));
    assert!(!manager.remove_view(ViewId(2)));
    assert!(!manager.remove_view(ViewId(1)));

    assert_eq!(
        drain(&mut rx),
        vec![Outbound::CommClose {
            comm_id: CommId::from("c1")
        }]
    );
    assert!(manager.model(&CommId::from("c1")).is_none());
    assert!(manager
        .document()
        .widget_area(GroupKey::Cell(0))
        .views()
        .is_empty());
}

#[test]
fn test_backend_close_tears_down_views_without_echo() {
    let (mut manager, mut rx) = manager_with_cells(1, 3);
    manager.handle_comm_open(&open("c1", "BoolWidgetModel")).unwrap();
    display(&mut manager, "c1", json!({"view_name": "CheckboxView"}));
    display(&mut manager, "c1", json!({"view_name": "ToggleButtonView"}));

    manager.handle_comm_close(&CommId::from("c1"));

    assert_eq!(manager.view_ids().count(), 0);
    assert!(manager.model(&CommId::from("c1")).is_none());
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_malformed_and_unknown_messages_are_ignored() {
    let (mut manager, mut rx) = manager_with_cells(1, 3);
    manager.handle_comm_open(&open("c1", "WidgetModel")).unwrap();

    manager
        .handle_comm_msg(&comm_msg("c1", json!({"state": {"a": 1}})))
        .unwrap();
    manager
        .handle_comm_msg(&comm_msg("nope", json!({"method": "update", "state": {}})))
        .unwrap();

    assert!(manager
        .model(&CommId::from("c1"))
        .unwrap()
        .attributes()
        .is_empty());
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_registry_errors_are_reported() {
    let (mut manager, _rx) = manager_with_cells(1, 3);

    let err = manager
        .handle_comm_open(&open("c1", "SpaceshipWidgetModel"))
        .unwrap_err();
    assert!(err.to_string().contains("SpaceshipWidgetModel"));

    manager.handle_comm_open(&open("c1", "WidgetModel")).unwrap();
    assert!(manager.handle_comm_open(&open("c1", "WidgetModel")).is_err());

    let err = manager
        .handle_comm_msg(&comm_msg(
            "c1",
            json!({"method": "display", "view_name": "SpaceshipView"}),
        ))
        .unwrap_err();
    assert!(err.to_string().contains("unknown widget view type"));

    assert!(manager
        .register_view_type("ButtonView", nbwidget::core::view::BaseView::create)
        .is_err());
    assert!(manager
        .register_model_type("", nbwidget::presentation::widgets::widget_model)
        .is_err());
}

#[test]
fn test_display_group_resolved_from_parent_message() {
    let (mut manager, _rx) = manager_with_cells(3, 3);
    manager.record_execution(2, "exec-2").unwrap();
    manager.document_mut().cell_executed(1, "exec-1").unwrap();
    manager.handle_comm_open(&open("c1", "WidgetModel")).unwrap();

    let mut msg = comm_msg("c1", json!({"method": "display", "view_name": "WidgetView"}));
    msg.parent_msg_id = Some("exec-2".to_string());
    manager.handle_comm_msg(&msg).unwrap();

    assert_eq!(
        manager.document().widget_area(GroupKey::Cell(2)).views(),
        &[ViewId(1)]
    );
    assert_eq!(
        manager.view(ViewId(1)).unwrap().base().group(),
        GroupKey::Cell(2)
    );
}

#[test]
fn test_progress_view_tracks_remote_value() {
    let (mut manager, mut rx) = manager_with_cells(1, 3);
    manager
        .handle_comm_open(&open("p1", "BoundedIntWidgetModel"))
        .unwrap();
    display(&mut manager, "p1", json!({"view_name": "ProgressView"}));
    remote_update(&mut manager, "p1", json!({"value": 30, "max": 60}));

    let html = manager.render_view(ViewId(1));
    assert!(html.contains("class=\"progress-bar\" style=\"width: 50%\""), "{html}");

    manager
        .handle_ui_event(ViewId(1), &UiEvent::Slide { value: 10 })
        .unwrap();
    assert!(drain(&mut rx).is_empty());
}
