//! In-memory host
//!
//! A mutable node tree plus a recording gesture host, implementing every
//! host trait. Tests and demos use it to stand in for a real accessibility
//! service: the tree can be edited while the engine is polling it, actions
//! and gestures are logged, and hooks let a scenario react to them (e.g. a
//! drag that reveals more rows).

use crate::element::{Node, NodeImpl};
use crate::gesture::{Gesture, GestureOutcome};
use crate::platforms::{GestureCallback, HostDispatcher, RootProvider};
use crate::types::{GlobalAction, NodeAction, Rect};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

pub type NodeId = usize;

/// Declarative description of a subtree to insert.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    key: Option<String>,
    class_name: String,
    text: Option<String>,
    content_description: Option<String>,
    clickable: bool,
    long_clickable: bool,
    scrollable: bool,
    bounds: Rect,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    /// Name this node so it can be looked up with [`MemoryTree::id`].
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.content_description = Some(desc.into());
        self
    }

    pub fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    pub fn long_clickable(mut self) -> Self {
        self.long_clickable = true;
        self
    }

    pub fn scrollable(mut self) -> Self {
        self.scrollable = true;
        self
    }

    pub fn bounds(mut self, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        self.bounds = Rect::new(left, top, right, bottom);
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children<I: IntoIterator<Item = NodeSpec>>(mut self, children: I) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    key: Option<String>,
    class_name: String,
    text: Option<String>,
    content_description: Option<String>,
    clickable: bool,
    long_clickable: bool,
    scrollable: bool,
    bounds: Rect,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Default)]
struct TreeState {
    nodes: Vec<Option<NodeData>>,
    root: Option<NodeId>,
    keys: HashMap<String, NodeId>,
}

impl TreeState {
    fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn insert(&mut self, spec: NodeSpec, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        if let Some(key) = &spec.key {
            self.keys.insert(key.clone(), id);
        }
        self.nodes.push(Some(NodeData {
            key: spec.key,
            class_name: spec.class_name,
            text: spec.text,
            content_description: spec.content_description,
            clickable: spec.clickable,
            long_clickable: spec.long_clickable,
            scrollable: spec.scrollable,
            bounds: spec.bounds,
            parent,
            children: Vec::new(),
        }));
        for child in spec.children {
            let child_id = self.insert(child, Some(id));
            if let Some(Some(data)) = self.nodes.get_mut(id) {
                data.children.push(child_id);
            }
        }
        id
    }

    fn remove(&mut self, id: NodeId) {
        let Some(data) = self.nodes.get_mut(id).and_then(Option::take) else {
            return;
        };
        if let Some(key) = &data.key {
            self.keys.remove(key);
        }
        for child in data.children {
            self.remove(child);
        }
    }
}

/// Action performed on a memory node, in the order the engine issued them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub node: NodeId,
    pub key: Option<String>,
    pub action: NodeAction,
}

type ActionHook = Arc<dyn Fn(&MemoryTree, NodeId, &NodeAction) + Send + Sync>;

struct Shared {
    state: RwLock<TreeState>,
    actions: Mutex<Vec<ActionRecord>>,
    action_hook: Mutex<Option<ActionHook>>,
    root_requests: AtomicUsize,
    positional_index: AtomicBool,
}

fn read(lock: &RwLock<TreeState>) -> RwLockReadGuard<'_, TreeState> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(lock: &RwLock<TreeState>) -> RwLockWriteGuard<'_, TreeState> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn guard<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mutable tree shared between the test scenario and the engine.
#[derive(Clone)]
pub struct MemoryTree {
    shared: Arc<Shared>,
}

impl fmt::Debug for MemoryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = read(&self.shared.state);
        f.debug_struct("MemoryTree")
            .field("nodes", &state.nodes.iter().flatten().count())
            .field("root", &state.root)
            .finish()
    }
}

impl MemoryTree {
    pub fn new(root: NodeSpec) -> Self {
        let mut state = TreeState::default();
        let root_id = state.insert(root, None);
        state.root = Some(root_id);
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(state),
                actions: Mutex::new(Vec::new()),
                action_hook: Mutex::new(None),
                root_requests: AtomicUsize::new(0),
                positional_index: AtomicBool::new(true),
            }),
        }
    }

    /// Whether nodes report [`NodeImpl::index_in_parent`]. With `false`,
    /// sibling lookups must fall back to identity scans.
    pub fn set_positional_index(&self, enabled: bool) {
        self.shared
            .positional_index
            .store(enabled, Ordering::Relaxed);
    }

    pub fn root(&self) -> Option<Node> {
        let root = read(&self.shared.state).root?;
        Some(self.node(root))
    }

    /// Handle for `id`. The handle reads live state, so it goes blank if the
    /// node is removed later.
    pub fn node(&self, id: NodeId) -> Node {
        Node::from_impl(MemoryNode {
            shared: self.shared.clone(),
            id,
        })
    }

    /// Id of the node inserted with `key`.
    pub fn id(&self, key: &str) -> Option<NodeId> {
        read(&self.shared.state).keys.get(key).copied()
    }

    /// Handle for the node inserted with `key`.
    pub fn node_by_key(&self, key: &str) -> Option<Node> {
        self.id(key).map(|id| self.node(id))
    }

    /// Id behind a handle created by this tree.
    pub fn id_of(&self, node: &Node) -> Option<NodeId> {
        node.as_impl::<MemoryNode>()
            .filter(|memory| Arc::ptr_eq(&memory.shared, &self.shared))
            .map(|memory| memory.id)
    }

    pub fn key_of(&self, node: &Node) -> Option<String> {
        let id = self.id_of(node)?;
        read(&self.shared.state).get(id)?.key.clone()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        read(&self.shared.state).get(id).is_some()
    }

    /// Insert `spec` as a child of `parent`, at `index` or at the end.
    pub fn insert(&self, parent: NodeId, index: Option<usize>, spec: NodeSpec) -> Option<NodeId> {
        let mut state = write(&self.shared.state);
        state.get(parent)?;
        let id = state.insert(spec, Some(parent));
        if let Some(Some(data)) = state.nodes.get_mut(parent) {
            let at = index.unwrap_or(data.children.len()).min(data.children.len());
            data.children.insert(at, id);
        }
        Some(id)
    }

    /// Detach and drop `id` with its subtree.
    pub fn remove(&self, id: NodeId) {
        let mut state = write(&self.shared.state);
        let parent = state.get(id).and_then(|data| data.parent);
        if let Some(Some(data)) = parent.and_then(|p| state.nodes.get_mut(p)) {
            data.children.retain(|child| *child != id);
        }
        if state.root == Some(id) {
            state.root = None;
        }
        state.remove(id);
    }

    pub fn set_text(&self, id: NodeId, text: Option<&str>) {
        if let Some(Some(data)) = write(&self.shared.state).nodes.get_mut(id) {
            data.text = text.map(str::to_string);
        }
    }

    pub fn set_clickable(&self, id: NodeId, clickable: bool) {
        if let Some(Some(data)) = write(&self.shared.state).nodes.get_mut(id) {
            data.clickable = clickable;
        }
    }

    /// Run `hook` after every recorded action, outside of any tree lock.
    pub fn on_action<F>(&self, hook: F)
    where
        F: Fn(&MemoryTree, NodeId, &NodeAction) + Send + Sync + 'static,
    {
        let hook: ActionHook = Arc::new(hook);
        *guard(&self.shared.action_hook) = Some(hook);
    }

    pub fn actions(&self) -> Vec<ActionRecord> {
        guard(&self.shared.actions).clone()
    }

    pub fn clear_actions(&self) {
        guard(&self.shared.actions).clear();
    }

    /// How often the tree was asked for a root via [`RootProvider`].
    pub fn root_requests(&self) -> usize {
        self.shared.root_requests.load(Ordering::SeqCst)
    }

    fn perform(&self, id: NodeId, action: &NodeAction) -> bool {
        let (accepted, key) = {
            let mut state = write(&self.shared.state);
            let Some(Some(data)) = state.nodes.get_mut(id) else {
                return false;
            };
            let accepted = match action {
                NodeAction::Click => data.clickable,
                NodeAction::LongClick => data.long_clickable,
                NodeAction::ScrollForward | NodeAction::ScrollBackward => data.scrollable,
                NodeAction::SetText(text) => {
                    data.text = Some(text.clone());
                    true
                }
            };
            (accepted, data.key.clone())
        };

        trace!("memory node {} {} accepted: {}", id, action.name(), accepted);
        guard(&self.shared.actions).push(ActionRecord {
            node: id,
            key,
            action: action.clone(),
        });
        let hook = guard(&self.shared.action_hook).clone();
        if let Some(hook) = hook {
            hook(self, id, action);
        }
        accepted
    }
}

impl RootProvider for MemoryTree {
    fn current_root(&self, _force_refresh: bool) -> Option<Node> {
        self.shared.root_requests.fetch_add(1, Ordering::SeqCst);
        self.root()
    }
}

/// Handle into a [`MemoryTree`].
pub struct MemoryNode {
    shared: Arc<Shared>,
    id: NodeId,
}

impl MemoryNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn tree(&self) -> MemoryTree {
        MemoryTree {
            shared: self.shared.clone(),
        }
    }

    fn with<T>(&self, default: T, f: impl FnOnce(&NodeData) -> T) -> T {
        read(&self.shared.state).get(self.id).map(f).unwrap_or(default)
    }
}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryNode").field("id", &self.id).finish()
    }
}

impl NodeImpl for MemoryNode {
    fn class_name(&self) -> String {
        self.with(String::new(), |d| d.class_name.clone())
    }

    fn text(&self) -> Option<String> {
        self.with(None, |d| d.text.clone())
    }

    fn content_description(&self) -> Option<String> {
        self.with(None, |d| d.content_description.clone())
    }

    fn is_clickable(&self) -> bool {
        self.with(false, |d| d.clickable)
    }

    fn is_long_clickable(&self) -> bool {
        self.with(false, |d| d.long_clickable)
    }

    fn is_scrollable(&self) -> bool {
        self.with(false, |d| d.scrollable)
    }

    fn child_count(&self) -> usize {
        self.with(0, |d| d.children.len())
    }

    fn child(&self, index: usize) -> Option<Node> {
        let child = self.with(None, |d| d.children.get(index).copied())?;
        Some(self.tree().node(child))
    }

    fn parent(&self) -> Option<Node> {
        let parent = self.with(None, |d| d.parent)?;
        Some(self.tree().node(parent))
    }

    fn bounds_in_screen(&self) -> Rect {
        self.with(Rect::default(), |d| d.bounds)
    }

    fn perform_action(&self, action: &NodeAction) -> bool {
        self.tree().perform(self.id, action)
    }

    fn refresh(&self) -> bool {
        read(&self.shared.state).get(self.id).is_some()
    }

    fn index_in_parent(&self) -> Option<usize> {
        if !self.shared.positional_index.load(Ordering::Relaxed) {
            return None;
        }
        let state = read(&self.shared.state);
        let parent = state.get(self.id)?.parent?;
        state
            .get(parent)?
            .children
            .iter()
            .position(|child| *child == self.id)
    }

    fn same_node(&self, other: &dyn NodeImpl) -> bool {
        other
            .as_any()
            .downcast_ref::<MemoryNode>()
            .is_some_and(|o| o.id == self.id && Arc::ptr_eq(&o.shared, &self.shared))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

type GestureHook = Arc<dyn Fn(&Gesture) + Send + Sync>;

/// Host that records gestures and global actions.
///
/// Accepted gestures complete immediately on the calling thread.
pub struct MemoryHost {
    width: i32,
    height: i32,
    accept_gestures: AtomicBool,
    gestures: Mutex<Vec<Gesture>>,
    global_actions: Mutex<Vec<GlobalAction>>,
    gesture_hook: Mutex<Option<GestureHook>>,
}

impl MemoryHost {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            accept_gestures: AtomicBool::new(true),
            gestures: Mutex::new(Vec::new()),
            global_actions: Mutex::new(Vec::new()),
            gesture_hook: Mutex::new(None),
        }
    }

    /// Make the host refuse (or accept again) gesture dispatches.
    pub fn set_accept_gestures(&self, accept: bool) {
        self.accept_gestures.store(accept, Ordering::Relaxed);
    }

    /// Run `hook` for every accepted gesture, before its completion fires.
    pub fn on_gesture<F>(&self, hook: F)
    where
        F: Fn(&Gesture) + Send + Sync + 'static,
    {
        let hook: GestureHook = Arc::new(hook);
        *guard(&self.gesture_hook) = Some(hook);
    }

    pub fn gestures(&self) -> Vec<Gesture> {
        guard(&self.gestures).clone()
    }

    pub fn global_actions(&self) -> Vec<GlobalAction> {
        guard(&self.global_actions).clone()
    }
}

impl HostDispatcher for MemoryHost {
    fn perform_global_action(&self, action: GlobalAction) -> bool {
        guard(&self.global_actions).push(action);
        true
    }

    fn dispatch_gesture(&self, gesture: Gesture, on_result: GestureCallback) -> bool {
        if !self.accept_gestures.load(Ordering::Relaxed) {
            return false;
        }
        guard(&self.gestures).push(gesture.clone());
        let hook = guard(&self.gesture_hook).clone();
        if let Some(hook) = hook {
            hook(&gesture);
        }
        on_result(GestureOutcome::Completed);
        true
    }

    fn screen_width(&self) -> i32 {
        self.width
    }

    fn screen_height(&self) -> i32 {
        self.height
    }
}
