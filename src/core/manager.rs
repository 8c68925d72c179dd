//! Widget manager: type registries, model/view arena and inbound dispatch.
//!
//! The manager owns every model (keyed by comm id) and every view (keyed by
//! [`ViewId`]). Models only hold view ids and views only hold the comm id of
//! their model, so neither side owns the other.

use std::collections::BTreeMap;

use color_eyre::eyre::{bail, eyre, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    core::{
        model::WidgetModel,
        msg::{CommId, CommMsg, CommOpen, GroupKey, ModelMsg, StatusMsg, ViewId},
        view::{Interaction, UiEvent, ViewBase, WidgetView},
    },
    domain::{attributes::Attributes, document::Document},
    infrastructure::{
        comm::{Comm, CommManager},
        config::WidgetConfig,
    },
    presentation::widgets,
};

pub type ModelCtor = fn(Box<dyn Comm>) -> WidgetModel;
pub type ViewCtor = fn(ViewBase) -> Box<dyn WidgetView>;

/// Where a view's element was attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    Area(GroupKey),
    Parent(ViewId),
}

struct ViewSlot {
    view: Box<dyn WidgetView>,
    placement: Placement,
}

pub struct WidgetManager {
    comm_manager: Box<dyn CommManager>,
    document: Box<dyn Document>,
    model_types: BTreeMap<String, ModelCtor>,
    view_types: BTreeMap<String, ViewCtor>,
    models: BTreeMap<CommId, WidgetModel>,
    views: BTreeMap<ViewId, ViewSlot>,
    next_view_id: u64,
    msg_throttle: usize,
}

impl WidgetManager {
    pub fn new(
        comm_manager: Box<dyn CommManager>,
        document: Box<dyn Document>,
        config: &WidgetConfig,
    ) -> Self {
        Self {
            comm_manager,
            document,
            model_types: BTreeMap::new(),
            view_types: BTreeMap::new(),
            models: BTreeMap::new(),
            views: BTreeMap::new(),
            next_view_id: 1,
            msg_throttle: config.msg_throttle,
        }
    }

    /// Registers the built-in widget set.
    pub fn with_default_widgets(mut self) -> Result<Self> {
        widgets::register_defaults(&mut self)?;
        Ok(self)
    }

    /// Records a model constructor and registers `name` as a comm target.
    pub fn register_model_type(&mut self, name: &str, ctor: ModelCtor) -> Result<()> {
        validate_type_name(name, self.model_types.contains_key(name), "model")?;
        self.comm_manager.register_target(name);
        self.model_types.insert(name.to_string(), ctor);
        Ok(())
    }

    pub fn register_view_type(&mut self, name: &str, ctor: ViewCtor) -> Result<()> {
        validate_type_name(name, self.view_types.contains_key(name), "view")?;
        self.view_types.insert(name.to_string(), ctor);
        Ok(())
    }

    pub fn model_type_names(&self) -> impl Iterator<Item = &str> {
        self.model_types.keys().map(String::as_str)
    }

    pub fn view_type_names(&self) -> impl Iterator<Item = &str> {
        self.view_types.keys().map(String::as_str)
    }

    pub fn model(&self, id: &CommId) -> Option<&WidgetModel> {
        self.models.get(id)
    }

    pub fn model_ids(&self) -> impl Iterator<Item = &CommId> {
        self.models.keys()
    }

    pub fn view(&self, id: ViewId) -> Option<&dyn WidgetView> {
        self.views.get(&id).map(|slot| slot.view.as_ref())
    }

    pub fn view_ids(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.views.keys().copied()
    }

    pub fn document(&self) -> &dyn Document {
        self.document.as_ref()
    }

    pub fn document_mut(&mut self) -> &mut dyn Document {
        self.document.as_mut()
    }

    /// Instantiates the model registered for the open request's target.
    pub fn handle_comm_open(&mut self, open: &CommOpen) -> Result<CommId> {
        if !self.comm_manager.has_target(&open.target_name) {
            bail!("no comm target registered for {}", open.target_name);
        }
        let ctor = self
            .model_types
            .get(&open.target_name)
            .ok_or_else(|| eyre!("unknown widget model type: {}", open.target_name))?;
        if self.models.contains_key(&open.comm_id) {
            bail!("comm {} is already open", open.comm_id);
        }
        let comm = self.comm_manager.new_comm(open.comm_id.clone());
        let model = ctor(comm).with_msg_throttle(self.msg_throttle);
        info!("Opened {} on comm {}", open.target_name, open.comm_id);
        self.models.insert(open.comm_id.clone(), model);
        Ok(open.comm_id.clone())
    }

    /// Dispatches a backend message to its model. Messages for unknown comms
    /// and payloads without a recognized method are ignored.
    pub fn handle_comm_msg(&mut self, msg: &CommMsg) -> Result<()> {
        if !self.models.contains_key(&msg.comm_id) {
            debug!("Ignoring message for unknown comm {}", msg.comm_id);
            return Ok(());
        }
        let Some(model_msg) = ModelMsg::parse(&msg.data) else {
            debug!("Ignoring malformed message on comm {}: {}", msg.comm_id, msg.data);
            return Ok(());
        };
        match model_msg {
            ModelMsg::Display {
                view_name,
                parent,
                cell_index,
            } => {
                let group = self.resolve_group(cell_index, msg.parent_msg_id.as_deref());
                self.display_view(&msg.comm_id, &view_name, parent.as_ref(), group)?;
            }
            ModelMsg::Update { state } => {
                self.handle_update(&msg.comm_id, state)?;
            }
        }
        Ok(())
    }

    /// Applies backend state and refreshes every view of the model.
    pub fn handle_update(&mut self, comm_id: &CommId, state: Attributes) -> Result<()> {
        let model = self
            .models
            .get_mut(comm_id)
            .ok_or_else(|| eyre!("unknown comm {comm_id}"))?;
        let merged = model.apply_remote_update(state);
        self.refresh_views(comm_id, None);
        merged
    }

    pub fn handle_status(&mut self, comm_id: &CommId, status: &StatusMsg) {
        match self.models.get_mut(comm_id) {
            Some(model) => model.handle_status(status),
            None => debug!("Ignoring status for unknown comm {comm_id}"),
        }
    }

    /// Routes backend output to the output area of the group that last
    /// modified the model.
    pub fn handle_output(&mut self, comm_id: &CommId, text: &str) {
        let Some(GroupKey::Cell(index)) = self.models.get(comm_id).and_then(|m| m.output_group())
        else {
            debug!("Dropping output for comm {comm_id}: no output area");
            return;
        };
        match self.document.get_cell_mut(index) {
            Some(cell) => cell.append_output(text),
            None => debug!("Dropping output for comm {comm_id}: cell {index} is gone"),
        }
    }

    /// The backend closed the comm: tears down every view and drops the model.
    pub fn handle_comm_close(&mut self, comm_id: &CommId) {
        let Some(model) = self.models.remove(comm_id) else {
            return;
        };
        info!("Comm {comm_id} closed by backend");
        for view in model.all_views() {
            self.remove_view(view);
        }
    }

    pub fn record_execution(&mut self, cell_index: usize, msg_id: &str) -> Result<()> {
        self.document.cell_executed(cell_index, msg_id)
    }

    fn resolve_group(&self, cell_index: Option<usize>, parent_msg_id: Option<&str>) -> GroupKey {
        cell_index
            .or_else(|| parent_msg_id.and_then(|id| self.document.cell_index_for_msg(id)))
            .or_else(|| self.document.get_selected_cell())
            .map_or(GroupKey::Detached, GroupKey::Cell)
    }

    /// Creates views of `view_name` for a model. Views are delegated to every
    /// parent view in the same group that can host children; without such a
    /// parent a standalone view goes into the group's widget area.
    pub fn display_view(
        &mut self,
        comm_id: &CommId,
        view_name: &str,
        parent: Option<&CommId>,
        group: GroupKey,
    ) -> Result<Vec<ViewId>> {
        let ctor = *self
            .view_types
            .get(view_name)
            .ok_or_else(|| eyre!("unknown widget view type: {view_name}"))?;
        if !self.models.contains_key(comm_id) {
            bail!("unknown comm {comm_id}");
        }

        let mut new_views = Vec::new();
        if let Some(parent_id) = parent {
            let parent_views = self
                .models
                .get(parent_id)
                .map(|m| m.views_in(group).to_vec())
                .unwrap_or_default();
            for parent_view in parent_views {
                if !self.accepts_children(parent_view) {
                    continue;
                }
                let child = self.create_view(ctor, comm_id, group, Placement::Parent(parent_view));
                if let Some(host) = self
                    .views
                    .get_mut(&parent_view)
                    .and_then(|slot| slot.view.as_container())
                {
                    host.display_child(child);
                }
                new_views.push(child);
            }
        }

        if new_views.is_empty() {
            let view = self.create_view(ctor, comm_id, group, Placement::Area(group));
            let area = self.document.widget_area_mut(group);
            area.append(view);
            area.show();
            new_views.push(view);
        }

        for view in &new_views {
            self.refresh_view(*view);
        }
        debug!("Displayed {view_name} for comm {comm_id} in {group}: {new_views:?}");
        Ok(new_views)
    }

    fn accepts_children(&mut self, view: ViewId) -> bool {
        self.views
            .get_mut(&view)
            .and_then(|slot| slot.view.as_container())
            .is_some()
    }

    fn create_view(
        &mut self,
        ctor: ViewCtor,
        comm_id: &CommId,
        group: GroupKey,
        placement: Placement,
    ) -> ViewId {
        let id = ViewId(self.next_view_id);
        self.next_view_id += 1;
        if let Some(model) = self.models.get_mut(comm_id) {
            model.add_view(group, id);
            model.subscribe(id);
        }
        let view = ctor(ViewBase::new(comm_id.clone(), group));
        self.views.insert(id, ViewSlot { view, placement });
        id
    }

    fn refresh_view(&mut self, id: ViewId) {
        let Some(slot) = self.views.get_mut(&id) else {
            return;
        };
        if let Some(model) = self.models.get(slot.view.base().model()) {
            slot.view.refresh(model);
        }
    }

    /// Refreshes every view subscribed to the model except `except`.
    fn refresh_views(&mut self, comm_id: &CommId, except: Option<ViewId>) {
        let subscribers = self
            .models
            .get(comm_id)
            .map(|m| m.subscribers().to_vec())
            .unwrap_or_default();
        for view in subscribers.into_iter().filter(|v| Some(*v) != except) {
            self.refresh_view(view);
        }
    }

    /// Local change from `caller`: sets and syncs the attributes, then
    /// refreshes the sibling views. Returns the model snapshot.
    pub fn update_other_views(&mut self, caller: ViewId, changes: &Attributes) -> Result<Attributes> {
        let comm_id = self
            .views
            .get(&caller)
            .map(|slot| slot.view.base().model().clone())
            .ok_or_else(|| eyre!("unknown view {caller}"))?;
        let model = self
            .models
            .get_mut(&comm_id)
            .ok_or_else(|| eyre!("unknown comm {comm_id}"))?;
        model.set_last_modified_view(caller);
        model.set(changes);
        let snapshot = model.request_sync(changes, true);
        self.refresh_views(&comm_id, Some(caller));
        Ok(snapshot)
    }

    /// Delivers user interaction to a view and applies what it asks for.
    pub fn handle_ui_event(&mut self, view_id: ViewId, event: &UiEvent) -> Result<()> {
        let slot = self
            .views
            .get_mut(&view_id)
            .ok_or_else(|| eyre!("unknown view {view_id}"))?;
        let comm_id = slot.view.base().model().clone();
        let model = self
            .models
            .get_mut(&comm_id)
            .ok_or_else(|| eyre!("unknown comm {comm_id}"))?;
        let Some(interaction) = slot.view.handle_event(event, model) else {
            return Ok(());
        };
        match interaction {
            Interaction::Sync(changes) => {
                self.update_other_views(view_id, &changes)?;
            }
            Interaction::Custom(content) => {
                model.set_last_modified_view(view_id);
                model.send_custom(content);
            }
        }
        Ok(())
    }

    /// Sends an application-level message on behalf of a view.
    pub fn send_custom(&mut self, view_id: ViewId, content: Value) -> Result<()> {
        let comm_id = self
            .views
            .get(&view_id)
            .map(|slot| slot.view.base().model().clone())
            .ok_or_else(|| eyre!("unknown view {view_id}"))?;
        if let Some(model) = self.models.get_mut(&comm_id) {
            model.set_last_modified_view(view_id);
            model.send_custom(content);
        }
        Ok(())
    }

    /// Tears a view down after its element left the page. Child views go with
    /// it. When the model has no views left its comm is closed and the model
    /// dropped. Returns `false` when the view was already gone.
    pub fn remove_view(&mut self, view_id: ViewId) -> bool {
        let Some(slot) = self.views.remove(&view_id) else {
            return false;
        };

        match slot.placement {
            Placement::Area(group) => {
                self.document.widget_area_mut(group).remove(view_id);
            }
            Placement::Parent(parent) => {
                if let Some(host) = self
                    .views
                    .get_mut(&parent)
                    .and_then(|p| p.view.as_container())
                {
                    host.remove_child(view_id);
                }
            }
        }

        for child in slot.view.children().to_vec() {
            self.remove_view(child);
        }

        let comm_id = slot.view.base().model();
        if let Some(model) = self.models.get_mut(comm_id) {
            model.unsubscribe(view_id);
            model.remove_view(view_id);
            if !model.has_views() {
                model.close_comm();
                self.models.remove(comm_id);
            }
        }
        debug!("Removed {view_id}");
        true
    }

    /// Markup of a view including any hosted child views.
    pub fn render_view(&self, id: ViewId) -> String {
        let Some(slot) = self.views.get(&id) else {
            return String::new();
        };
        let children: String = slot
            .view
            .children()
            .iter()
            .map(|child| self.render_view(*child))
            .collect();
        slot.view.base().element().to_html_with(&children)
    }

    /// Markup of a group's widget area, empty while the area is hidden.
    pub fn render_area(&self, group: GroupKey) -> String {
        let area = self.document.widget_area(group);
        if !area.is_shown() {
            return String::new();
        }
        let views: String = area.views().iter().map(|v| self.render_view(*v)).collect();
        format!("<div class=\"widget-area\"><div class=\"widget-subarea\">{views}</div></div>")
    }

    pub fn render_document(&self) -> String {
        let mut out = String::new();
        for index in 0..self.document.cell_count() {
            let group = GroupKey::Cell(index);
            out.push_str(&format!("[cell {index}]\n"));
            let area = self.render_area(group);
            if !area.is_empty() {
                out.push_str(&area);
                out.push('\n');
            }
            if let Some(cell) = self.document.get_cell(index) {
                for line in &cell.outputs {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        let detached = self.render_area(GroupKey::Detached);
        if !detached.is_empty() {
            out.push_str("[detached]\n");
            out.push_str(&detached);
            out.push('\n');
        }
        out
    }
}

fn validate_type_name(name: &str, taken: bool, kind: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("{kind} type name must not be empty");
    }
    if taken {
        warn!("Rejecting duplicate {kind} type {name}");
        bail!("{kind} type {name} is already registered");
    }
    Ok(())
}
