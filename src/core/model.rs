//! Widget model: synchronized state bound to one backend comm.

use std::collections::BTreeMap;

use color_eyre::eyre::Result;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    core::{
        coalescer::{Coalescer, IdleAction},
        msg::{Callbacks, CommId, ExecutionState, GroupKey, StatusMsg, SyncMsg, ViewId},
    },
    domain::attributes::{Attributes, CssOverrides, CSS_KEY},
    infrastructure::comm::Comm,
};

/// Number of sync messages allowed in flight before patches are buffered.
pub const DEFAULT_MSG_THROTTLE: usize = 3;

pub struct WidgetModel {
    type_name: String,
    comm: Box<dyn Comm>,
    attributes: Attributes,
    css: CssOverrides,
    views: BTreeMap<GroupKey, Vec<ViewId>>,
    subscribers: Vec<ViewId>,
    pending_msgs: usize,
    msg_throttle: usize,
    msg_buffer: Option<Attributes>,
    last_modified_view: Option<ViewId>,
    updating: bool,
}

impl WidgetModel {
    pub fn new(type_name: &str, comm: Box<dyn Comm>) -> Self {
        Self {
            type_name: type_name.to_string(),
            comm,
            attributes: Attributes::new(),
            css: CssOverrides::default(),
            views: BTreeMap::new(),
            subscribers: Vec::new(),
            pending_msgs: 0,
            msg_throttle: DEFAULT_MSG_THROTTLE,
            msg_buffer: None,
            last_modified_view: None,
            updating: false,
        }
    }

    /// Initial attribute values, applied without syncing.
    pub fn with_defaults(mut self, defaults: Attributes) -> Self {
        self.attributes.merge(&defaults);
        self
    }

    pub fn with_msg_throttle(mut self, msg_throttle: usize) -> Self {
        self.msg_throttle = msg_throttle;
        self
    }

    pub fn id(&self) -> &CommId {
        self.comm.id()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn css(&self) -> &CssOverrides {
        &self.css
    }

    pub fn pending_msgs(&self) -> usize {
        self.pending_msgs
    }

    pub fn msg_throttle(&self) -> usize {
        self.msg_throttle
    }

    pub fn msg_buffer(&self) -> Option<&Attributes> {
        self.msg_buffer.as_ref()
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn last_modified_view(&self) -> Option<ViewId> {
        self.last_modified_view
    }

    pub fn set_last_modified_view(&mut self, view: ViewId) {
        self.last_modified_view = Some(view);
    }

    /// Local mutation. Does not sync; callers follow up with [`Self::request_sync`].
    pub fn set(&mut self, changes: &Attributes) {
        self.attributes.merge(changes);
    }

    /// Persists a local change to the backend, subject to the throttle.
    ///
    /// Returns the full state snapshot. Delivery is fire-and-forget: a failed
    /// send is logged and never retried.
    pub fn request_sync(&mut self, changed: &Attributes, patch: bool) -> Attributes {
        let snapshot = self.attributes.clone();
        if self.updating {
            return snapshot;
        }

        if Coalescer::decide_buffer(self.pending_msgs, self.msg_throttle) {
            debug!(
                "Throttling sync for comm {} ({} in flight)",
                self.id(),
                self.pending_msgs
            );
            let buffer = self.msg_buffer.take();
            self.msg_buffer = Some(Coalescer::coalesce(buffer, changed, &snapshot, patch));
        } else {
            let msg = if patch {
                SyncMsg::Patch {
                    data: changed.clone(),
                }
            } else {
                SyncMsg::Update {
                    data: snapshot.clone(),
                }
            };
            let callbacks = self.callbacks();
            match self.comm.send(msg, callbacks) {
                Ok(()) => self.pending_msgs += 1,
                Err(e) => warn!("Dropping sync for comm {}: {e}", self.id()),
            }
        }

        snapshot
    }

    /// Sends an application-level message that bypasses state sync.
    pub fn send_custom(&mut self, content: Value) {
        let callbacks = self.callbacks();
        if let Err(e) = self.comm.send(SyncMsg::Custom { content }, callbacks) {
            warn!("Dropping custom message for comm {}: {e}", self.id());
        }
    }

    pub fn handle_status(&mut self, status: &StatusMsg) {
        if status.execution_state == ExecutionState::Idle {
            self.on_backend_idle();
        }
    }

    /// The backend finished processing one message. Flushes the buffered
    /// patch into the freed slot, or releases the slot when nothing waits.
    pub fn on_backend_idle(&mut self) {
        let has_buffer = self.msg_buffer.as_ref().is_some_and(|b| !b.is_empty());
        match Coalescer::decide_idle(self.pending_msgs, self.msg_throttle, has_buffer) {
            IdleAction::Flush => {
                let data = self.msg_buffer.take().unwrap_or_default();
                debug!("Flushing buffered patch for comm {}", self.id());
                let callbacks = self.callbacks();
                if let Err(e) = self.comm.send(SyncMsg::Patch { data }, callbacks) {
                    warn!("Dropping buffered patch for comm {}: {e}", self.id());
                }
            }
            IdleAction::Release => {
                self.pending_msgs = self.pending_msgs.saturating_sub(1);
            }
        }
    }

    /// Merges backend state without echoing it back.
    ///
    /// The `updating` flag is cleared even when `_css` is malformed; every
    /// other key is still applied.
    pub fn apply_remote_update(&mut self, state: Attributes) -> Result<()> {
        self.updating = true;
        let merged = self.merge_remote_state(state);
        self.updating = false;
        merged
    }

    /// Merges every key; a malformed `_css` is reported once the rest is in.
    fn merge_remote_state(&mut self, state: Attributes) -> Result<()> {
        let mut css = Ok(());
        for (key, value) in state.0 {
            if key == CSS_KEY {
                css = CssOverrides::from_value(value).map(|parsed| self.css = parsed);
            } else {
                self.attributes.insert(key, value);
            }
        }
        css
    }

    fn callbacks(&self) -> Callbacks {
        Callbacks {
            output: self.output_group(),
        }
    }

    /// Group of the last modified view, if that view is still attached.
    pub fn output_group(&self) -> Option<GroupKey> {
        let view = self.last_modified_view?;
        self.views
            .iter()
            .find(|(_, views)| views.contains(&view))
            .map(|(key, _)| *key)
    }

    pub fn subscribe(&mut self, view: ViewId) {
        if !self.subscribers.contains(&view) {
            self.subscribers.push(view);
        }
    }

    pub fn unsubscribe(&mut self, view: ViewId) {
        self.subscribers.retain(|v| *v != view);
    }

    pub fn subscribers(&self) -> &[ViewId] {
        &self.subscribers
    }

    pub fn add_view(&mut self, group: GroupKey, view: ViewId) {
        self.views.entry(group).or_default().push(view);
    }

    /// Deregisters a view, dropping its group entry when it was the last one.
    /// Returns whether the view was registered.
    pub fn remove_view(&mut self, view: ViewId) -> bool {
        let Some(group) = self
            .views
            .iter()
            .find(|(_, views)| views.contains(&view))
            .map(|(key, _)| *key)
        else {
            return false;
        };
        if let Some(views) = self.views.get_mut(&group) {
            views.retain(|v| *v != view);
            if views.is_empty() {
                self.views.remove(&group);
            }
        }
        if self.last_modified_view == Some(view) {
            self.last_modified_view = None;
        }
        true
    }

    pub fn views_in(&self, group: GroupKey) -> &[ViewId] {
        self.views.get(&group).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn groups(&self) -> impl Iterator<Item = GroupKey> + '_ {
        self.views.keys().copied()
    }

    pub fn all_views(&self) -> Vec<ViewId> {
        self.views.values().flatten().copied().collect()
    }

    pub fn has_views(&self) -> bool {
        !self.views.is_empty()
    }

    pub fn close_comm(&mut self) {
        if !self.comm.is_closed() {
            debug!("Closing comm {}", self.id());
            self.comm.close();
        }
    }

    pub fn is_comm_closed(&self) -> bool {
        self.comm.is_closed()
    }
}

impl std::fmt::Debug for WidgetModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetModel")
            .field("id", self.id())
            .field("type_name", &self.type_name)
            .field("attributes", &self.attributes)
            .field("pending_msgs", &self.pending_msgs)
            .field("msg_buffer", &self.msg_buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{channel_comm, drain_sync};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        Attributes::from_value(value).unwrap()
    }

    fn idle() -> StatusMsg {
        StatusMsg {
            execution_state: ExecutionState::Idle,
        }
    }

    #[test]
    fn test_throttled_patches_coalesce_and_flush_on_idle() {
        let (comm, mut rx) = channel_comm("c1");
        let mut model = WidgetModel::new("WidgetModel", comm);

        for change in [
            json!({"a": 1}),
            json!({"a": 2}),
            json!({"b": 1}),
            json!({"a": 3, "c": 1}),
        ] {
            let change = attrs(change);
            model.set(&change);
            model.request_sync(&change, true);
        }

        assert_eq!(
            drain_sync(&mut rx),
            vec![
                SyncMsg::Patch { data: attrs(json!({"a": 1})) },
                SyncMsg::Patch { data: attrs(json!({"a": 2})) },
                SyncMsg::Patch { data: attrs(json!({"b": 1})) },
            ]
        );
        assert_eq!(model.pending_msgs(), 3);
        assert_eq!(model.msg_buffer(), Some(&attrs(json!({"a": 3, "c": 1}))));

        model.handle_status(&idle());
        assert_eq!(
            drain_sync(&mut rx),
            vec![SyncMsg::Patch { data: attrs(json!({"a": 3, "c": 1})) }]
        );
        assert_eq!(model.pending_msgs(), 3);
        assert_eq!(model.msg_buffer(), None);

        model.handle_status(&idle());
        assert_eq!(model.pending_msgs(), 2);
        assert!(drain_sync(&mut rx).is_empty());
    }

    #[test]
    fn test_never_more_than_throttle_in_flight() {
        let (comm, mut rx) = channel_comm("c1");
        let mut model = WidgetModel::new("WidgetModel", comm).with_msg_throttle(2);

        for i in 0..10 {
            let change = Attributes::new().with("value", i);
            model.set(&change);
            model.request_sync(&change, true);
            assert!(model.pending_msgs() <= 2);
        }
        assert_eq!(drain_sync(&mut rx).len(), 2);
        assert_eq!(model.msg_buffer(), Some(&Attributes::new().with("value", 9)));

        // One flush per idle, and only one buffered patch exists.
        model.on_backend_idle();
        model.on_backend_idle();
        assert_eq!(drain_sync(&mut rx).len(), 1);
        assert_eq!(model.pending_msgs(), 1);
    }

    #[test]
    fn test_full_update_sends_snapshot_and_replaces_buffer() {
        let (comm, mut rx) = channel_comm("c1");
        let mut model = WidgetModel::new("WidgetModel", comm)
            .with_defaults(attrs(json!({"value": 0, "description": "x"})))
            .with_msg_throttle(1);

        let snapshot = model.request_sync(&Attributes::new(), false);
        assert_eq!(snapshot, *model.attributes());
        assert_eq!(
            drain_sync(&mut rx),
            vec![SyncMsg::Update { data: snapshot.clone() }]
        );

        let change = attrs(json!({"value": 5}));
        model.set(&change);
        model.request_sync(&change, true);
        model.request_sync(&Attributes::new(), false);
        assert_eq!(model.msg_buffer(), Some(model.attributes()));
    }

    #[test]
    fn test_remote_update_does_not_echo() {
        let (comm, mut rx) = channel_comm("c1");
        let mut model = WidgetModel::new("WidgetModel", comm);

        model
            .apply_remote_update(attrs(json!({"value": 7, "_css": {"": {"width": "5px"}}})))
            .unwrap();

        assert!(drain_sync(&mut rx).is_empty());
        assert_eq!(model.pending_msgs(), 0);
        assert!(!model.is_updating());
        assert_eq!(model.attributes(), &attrs(json!({"value": 7})));
        assert_eq!(model.css()[""]["width"], json!("5px"));
    }

    #[test]
    fn test_failed_remote_merge_clears_updating_flag() {
        let (comm, mut rx) = channel_comm("c1");
        let mut model = WidgetModel::new("WidgetModel", comm);

        assert!(model
            .apply_remote_update(attrs(json!({"_css": 3, "value": 1})))
            .is_err());
        assert!(!model.is_updating());
        assert_eq!(model.attributes().get_i64("value"), Some(1));

        let change = attrs(json!({"value": 2}));
        model.request_sync(&change, true);
        assert_eq!(drain_sync(&mut rx), vec![SyncMsg::Patch { data: change }]);
    }

    #[test]
    fn test_idle_never_underflows() {
        let (comm, _rx) = channel_comm("c1");
        let mut model = WidgetModel::new("WidgetModel", comm);
        model.on_backend_idle();
        model.handle_status(&StatusMsg {
            execution_state: ExecutionState::Busy,
        });
        assert_eq!(model.pending_msgs(), 0);
    }

    #[test]
    fn test_output_group_follows_last_modified_view() {
        let (comm, mut rx) = channel_comm("c1");
        let mut model = WidgetModel::new("WidgetModel", comm);
        model.add_view(GroupKey::Cell(2), ViewId(1));
        model.set_last_modified_view(ViewId(1));
        assert_eq!(model.output_group(), Some(GroupKey::Cell(2)));

        model.send_custom(json!({"event": "click"}));
        let sent = rx.try_recv().unwrap();
        assert!(matches!(
            sent,
            crate::infrastructure::comm::Outbound::CommMsg {
                callbacks: Callbacks { output: Some(GroupKey::Cell(2)) },
                ..
            }
        ));

        assert!(model.remove_view(ViewId(1)));
        assert!(!model.remove_view(ViewId(1)));
        assert_eq!(model.output_group(), None);
        assert!(!model.has_views());
    }
}
