//! In-memory scripted DOM for deterministic tests.
//!
//! A [`MockSession`] holds a flat list of nodes, each registered under the
//! exact [`Locator`]s that should find it. Page transitions are modelled as
//! click [`Reaction`]s that attach, detach, show or hide other nodes; timing
//! is modelled by changes scheduled against a shared [`FakeClock`], so a
//! [`Waiter`](crate::Waiter) built on the same clock sees them appear at
//! exactly the virtual instant they were scheduled for.
//!
//! Handles encode the node's render generation. [`MockSession::rerender`]
//! bumps the generation, after which any handle resolved earlier reports
//! [`HarnessError::StaleReference`].

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, FakeClock};
use crate::driver::{BoundingBox, ElementHandle, ScriptArg, Session};
use crate::interaction::SCRIPT_CLICK;
use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};

const ACTION_PREFIXES: [&str; 7] = [
    "click:",
    "select:",
    "send_keys:",
    "clear:",
    "script:",
    "move_to:",
    "navigate:",
];

/// Index of a node registered with a [`MockSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Initial description of a mock DOM node
#[derive(Debug, Clone, PartialEq)]
pub struct MockNode {
    tag: String,
    text: String,
    value: String,
    attributes: BTreeMap<String, String>,
    attached: bool,
    displayed: bool,
    enabled: bool,
    selected: bool,
    obscured: bool,
    offscreen: bool,
    width: f64,
    height: f64,
}

impl MockNode {
    /// Attached, displayed, enabled node with a 100x20 box
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            text: String::new(),
            value: String::new(),
            attributes: BTreeMap::new(),
            attached: true,
            displayed: true,
            enabled: true,
            selected: false,
            obscured: false,
            offscreen: false,
            width: 100.0,
            height: 20.0,
        }
    }

    /// Set rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the editable value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Start outside the DOM
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.attached = false;
        self
    }

    /// Start hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Start disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set selected state
    #[must_use]
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Covered by an overlay: native clicks are intercepted
    #[must_use]
    pub fn obscured(mut self) -> Self {
        self.obscured = true;
        self
    }

    /// Outside the viewport until moved to
    #[must_use]
    pub fn offscreen(mut self) -> Self {
        self.offscreen = true;
        self
    }

    /// Set rendered size
    #[must_use]
    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// A state change applied to one node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    /// Insert into or remove from the DOM; removal invalidates handles
    Attached(bool),
    /// Show or hide
    Displayed(bool),
    /// Enable or disable
    Enabled(bool),
    /// Set selected state
    Selected(bool),
    /// Cover or uncover with an overlay
    Obscured(bool),
    /// Replace rendered text
    Text(String),
    /// Replace the node in place; earlier handles go stale
    Rerender,
}

/// Side effect triggered by clicking a node
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// Apply a change to nodes immediately
    Apply(Vec<NodeId>, NodeChange),
    /// Apply a change to nodes after a delay on the session clock
    After(Duration, Vec<NodeId>, NodeChange),
    /// Open or close the native dialog
    Alert(bool),
    /// Change the current URL
    Navigate(String),
}

#[derive(Debug)]
struct NodeState {
    node: MockNode,
    parent: Option<NodeId>,
    locators: Vec<Locator>,
    generation: u32,
}

#[derive(Debug)]
enum Effect {
    Node(NodeId, NodeChange),
    Alert(bool),
}

#[derive(Debug)]
struct Scheduled {
    at: Duration,
    effect: Effect,
}

#[derive(Debug, Default)]
struct MockState {
    nodes: Vec<NodeState>,
    pending: Vec<Scheduled>,
    reactions: HashMap<NodeId, Vec<Reaction>>,
    navigations: HashMap<String, Vec<Reaction>>,
    script_results: HashMap<String, serde_json::Value>,
    alert_open: bool,
    url: String,
    history: Vec<String>,
}

/// Scripted in-memory [`Session`]
#[derive(Debug)]
pub struct MockSession {
    clock: Arc<FakeClock>,
    state: RefCell<MockState>,
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    /// Create an empty session with its own clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(FakeClock::new()))
    }

    /// Create an empty session driven by `clock`
    #[must_use]
    pub fn with_clock(clock: Arc<FakeClock>) -> Self {
        Self {
            clock,
            state: RefCell::new(MockState {
                url: "about:blank".to_string(),
                ..MockState::default()
            }),
        }
    }

    /// Clock that scheduled changes are measured against
    #[must_use]
    pub fn clock(&self) -> Arc<FakeClock> {
        self.clock.clone()
    }

    /// Register a top-level node findable by each of `locators`
    pub fn add(&self, node: MockNode, locators: &[Locator]) -> NodeId {
        self.insert(None, node, locators)
    }

    /// Register a node below `parent`, findable by scoped searches from it
    pub fn add_child(&self, parent: NodeId, node: MockNode, locators: &[Locator]) -> NodeId {
        self.insert(Some(parent), node, locators)
    }

    fn insert(&self, parent: Option<NodeId>, node: MockNode, locators: &[Locator]) -> NodeId {
        let mut state = self.state.borrow_mut();
        let id = NodeId(state.nodes.len());
        state.nodes.push(NodeState {
            node,
            parent,
            locators: locators.to_vec(),
            generation: 0,
        });
        id
    }

    /// Run `reaction` whenever `id` is clicked, natively or by script
    pub fn on_click(&self, id: NodeId, reaction: Reaction) {
        self.state
            .borrow_mut()
            .reactions
            .entry(id)
            .or_default()
            .push(reaction);
    }

    /// Run `reaction` whenever the session navigates to `url`
    pub fn on_navigate(&self, url: impl Into<String>, reaction: Reaction) {
        self.state
            .borrow_mut()
            .navigations
            .entry(url.into())
            .or_default()
            .push(reaction);
    }

    /// Apply a change to a node now
    pub fn apply(&self, id: NodeId, change: NodeChange) {
        self.state.borrow_mut().apply_change(id, change);
    }

    /// Apply a change to a node once the clock reaches `at`
    pub fn schedule(&self, at: Duration, id: NodeId, change: NodeChange) {
        self.state.borrow_mut().pending.push(Scheduled {
            at,
            effect: Effect::Node(id, change),
        });
    }

    /// Open or close the dialog once the clock reaches `at`
    pub fn schedule_alert(&self, at: Duration, open: bool) {
        self.state.borrow_mut().pending.push(Scheduled {
            at,
            effect: Effect::Alert(open),
        });
    }

    /// Open or close the native dialog now
    pub fn set_alert(&self, open: bool) {
        self.state.borrow_mut().alert_open = open;
    }

    /// Replace a node in place, invalidating every handle to it
    pub fn rerender(&self, id: NodeId) {
        self.apply(id, NodeChange::Rerender);
    }

    /// Canned return value for a script other than the script click
    pub fn set_script_result(&self, script: impl Into<String>, value: serde_json::Value) {
        let _ = self
            .state
            .borrow_mut()
            .script_results
            .insert(script.into(), value);
    }

    /// Current editable value of a node
    #[must_use]
    pub fn value_of(&self, id: NodeId) -> String {
        self.settle();
        self.state
            .borrow()
            .nodes
            .get(id.0)
            .map(|n| n.node.value.clone())
            .unwrap_or_default()
    }

    /// Current selected state of a node
    #[must_use]
    pub fn is_node_selected(&self, id: NodeId) -> bool {
        self.settle();
        self.state
            .borrow()
            .nodes
            .get(id.0)
            .is_some_and(|n| n.node.selected)
    }

    /// Whether a node and all its ancestors are in the DOM
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.settle();
        self.state.borrow().is_live(id)
    }

    /// Every recorded call, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.clone()
    }

    /// Check if a call starting with `prefix` was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.state
            .borrow()
            .history
            .iter()
            .any(|c| c.starts_with(prefix))
    }

    /// Number of recorded calls that change page state
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.state
            .borrow()
            .history
            .iter()
            .filter(|c| ACTION_PREFIXES.iter().any(|p| c.starts_with(p)))
            .count()
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().history.push(call);
    }

    fn settle(&self) {
        let now = self.clock.now();
        self.state.borrow_mut().apply_due(now);
    }

    fn resolve(&self, handle: &ElementHandle) -> HarnessResult<NodeId> {
        self.settle();
        self.state.borrow().resolve(handle)
    }

    fn with_node<T>(&self, handle: &ElementHandle, f: impl FnOnce(&MockNode) -> T) -> HarnessResult<T> {
        let id = self.resolve(handle)?;
        let state = self.state.borrow();
        Ok(f(&state.nodes[id.0].node))
    }

    fn ensure_interactable(&self, id: NodeId, handle: &ElementHandle) -> HarnessResult<()> {
        let state = self.state.borrow();
        let node = &state.nodes[id.0].node;
        let reason = if !node.displayed {
            Some("element is not displayed")
        } else if !node.enabled {
            Some("element is disabled")
        } else if node.offscreen {
            Some("element is outside the viewport")
        } else if node.obscured {
            Some("element click intercepted by an overlay")
        } else {
            None
        };
        reason.map_or(Ok(()), |reason| {
            Err(HarnessError::NotInteractable {
                locator: handle.locator().clone(),
                reason: reason.to_string(),
            })
        })
    }

    fn activate(&self, id: NodeId) {
        let now = self.clock.now();
        self.state.borrow_mut().activate(id, now);
    }
}

impl MockState {
    fn is_live(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.nodes.get(node_id.0) {
                Some(n) if n.node.attached => current = n.parent,
                _ => return false,
            }
        }
        true
    }

    fn resolve(&self, handle: &ElementHandle) -> HarnessResult<NodeId> {
        let stale = || HarnessError::StaleReference {
            locator: handle.locator().clone(),
        };
        let (index, generation) = parse_handle_id(handle.id())
            .ok_or_else(|| HarnessError::driver(format!("unknown handle id {}", handle.id())))?;
        let id = NodeId(index);
        match self.nodes.get(index) {
            Some(n) if n.generation == generation && self.is_live(id) => Ok(id),
            Some(_) => Err(stale()),
            None => Err(HarnessError::driver(format!("unknown handle id {}", handle.id()))),
        }
    }

    fn handle(&self, id: NodeId, locator: &Locator) -> ElementHandle {
        ElementHandle::new(
            format!("{id}#{}", self.nodes[id.0].generation),
            locator.clone(),
        )
    }

    fn apply_due(&mut self, now: Duration) {
        if self.pending.iter().all(|s| s.at > now) {
            return;
        }
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by_key(|s| s.at);
        let (due, later): (Vec<_>, Vec<_>) = pending.into_iter().partition(|s| s.at <= now);
        self.pending = later;
        for scheduled in due {
            self.apply_effect(scheduled.effect);
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Node(id, change) => self.apply_change(id, change),
            Effect::Alert(open) => self.alert_open = open,
        }
    }

    fn apply_change(&mut self, id: NodeId, change: NodeChange) {
        let Some(state) = self.nodes.get_mut(id.0) else {
            return;
        };
        let node = &mut state.node;
        match change {
            NodeChange::Attached(attached) => {
                if node.attached != attached {
                    state.generation += 1;
                }
                node.attached = attached;
            }
            NodeChange::Displayed(displayed) => node.displayed = displayed,
            NodeChange::Enabled(enabled) => node.enabled = enabled,
            NodeChange::Selected(selected) => node.selected = selected,
            NodeChange::Obscured(obscured) => node.obscured = obscured,
            NodeChange::Text(text) => node.text = text,
            NodeChange::Rerender => state.generation += 1,
        }
    }

    fn run_reactions(&mut self, reactions: Vec<Reaction>, now: Duration) {
        for reaction in reactions {
            match reaction {
                Reaction::Apply(ids, change) => {
                    for id in ids {
                        self.apply_change(id, change.clone());
                    }
                }
                Reaction::After(delay, ids, change) => {
                    for id in ids {
                        self.pending.push(Scheduled {
                            at: now + delay,
                            effect: Effect::Node(id, change.clone()),
                        });
                    }
                }
                Reaction::Alert(open) => self.alert_open = open,
                Reaction::Navigate(url) => self.url = url,
            }
        }
    }

    fn activate(&mut self, id: NodeId, now: Duration) {
        let (tag, input_type, parent) = {
            let state = &self.nodes[id.0];
            (
                state.node.tag.clone(),
                state.node.attributes.get("type").cloned(),
                state.parent,
            )
        };

        match (tag.as_str(), input_type.as_deref()) {
            ("option", _) | ("input", Some("radio")) => {
                for sibling in &mut self.nodes {
                    if sibling.parent == parent && sibling.node.tag == tag {
                        sibling.node.selected = false;
                    }
                }
                self.nodes[id.0].node.selected = true;
            }
            ("input", Some("checkbox")) => {
                let node = &mut self.nodes[id.0].node;
                node.selected = !node.selected;
            }
            _ => {}
        }

        let reactions = self.reactions.get(&id).cloned().unwrap_or_default();
        self.run_reactions(reactions, now);
    }
}

fn parse_handle_id(id: &str) -> Option<(usize, u32)> {
    let (node, generation) = id.strip_prefix('n')?.split_once('#')?;
    Some((node.parse().ok()?, generation.parse().ok()?))
}

impl Session for MockSession {
    fn find_elements(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
    ) -> HarnessResult<Vec<ElementHandle>> {
        self.settle();
        let parent = scope.map(|h| self.state.borrow().resolve(h)).transpose()?;
        let state = self.state.borrow();
        Ok(state
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i), n))
            .filter(|(id, n)| {
                n.locators.contains(locator)
                    && parent.map_or(true, |p| n.parent == Some(p))
                    && state.is_live(*id)
            })
            .map(|(id, _)| state.handle(id, locator))
            .collect())
    }

    fn is_displayed(&self, handle: &ElementHandle) -> HarnessResult<bool> {
        self.with_node(handle, |n| n.displayed)
    }

    fn is_enabled(&self, handle: &ElementHandle) -> HarnessResult<bool> {
        self.with_node(handle, |n| n.enabled)
    }

    fn is_selected(&self, handle: &ElementHandle) -> HarnessResult<bool> {
        self.with_node(handle, |n| n.selected)
    }

    fn bounding_box(&self, handle: &ElementHandle) -> HarnessResult<BoundingBox> {
        self.with_node(handle, |n| {
            if n.displayed {
                BoundingBox::new(0.0, 0.0, n.width, n.height)
            } else {
                BoundingBox::default()
            }
        })
    }

    fn text(&self, handle: &ElementHandle) -> HarnessResult<String> {
        // option labels stay readable while their dropdown is closed
        self.with_node(handle, |n| {
            if n.displayed || n.tag == "option" {
                n.text.clone()
            } else {
                String::new()
            }
        })
    }

    fn tag_name(&self, handle: &ElementHandle) -> HarnessResult<String> {
        self.with_node(handle, |n| n.tag.clone())
    }

    fn click(&self, handle: &ElementHandle) -> HarnessResult<()> {
        self.record(format!("click:{}", handle.locator()));
        let id = self.resolve(handle)?;
        self.ensure_interactable(id, handle)?;
        self.activate(id);
        Ok(())
    }

    fn select_option(&self, select: &ElementHandle, option: &ElementHandle) -> HarnessResult<()> {
        self.record(format!("select:{}:{}", select.locator(), option.locator()));
        let select_id = self.resolve(select)?;
        let option_id = self.resolve(option)?;
        {
            let state = self.state.borrow();
            if state.nodes[option_id.0].parent != Some(select_id) {
                return Err(HarnessError::driver(format!(
                    "{} is not an option of {}",
                    option.locator(),
                    select.locator()
                )));
            }
            let dropdown = &state.nodes[select_id.0].node;
            let reason = if !dropdown.displayed {
                Some("dropdown is not displayed")
            } else if !dropdown.enabled {
                Some("dropdown is disabled")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(HarnessError::NotInteractable {
                    locator: select.locator().clone(),
                    reason: reason.to_string(),
                });
            }
        }
        self.activate(option_id);
        Ok(())
    }

    fn send_keys(&self, handle: &ElementHandle, text: &str) -> HarnessResult<()> {
        self.record(format!("send_keys:{}:{text}", handle.locator()));
        let id = self.resolve(handle)?;
        self.ensure_interactable(id, handle)?;
        self.state.borrow_mut().nodes[id.0].node.value.push_str(text);
        Ok(())
    }

    fn clear(&self, handle: &ElementHandle) -> HarnessResult<()> {
        self.record(format!("clear:{}", handle.locator()));
        let id = self.resolve(handle)?;
        self.ensure_interactable(id, handle)?;
        self.state.borrow_mut().nodes[id.0].node.value.clear();
        Ok(())
    }

    fn execute_script(
        &self,
        script: &str,
        args: &[ScriptArg],
    ) -> HarnessResult<serde_json::Value> {
        self.record(format!("script:{script}"));
        if script.trim() == SCRIPT_CLICK {
            let Some(ScriptArg::Element(handle)) = args.first() else {
                return Err(HarnessError::Script {
                    message: "arguments[0] is not an element".to_string(),
                });
            };
            let id = self.resolve(handle)?;
            self.activate(id);
            return Ok(serde_json::Value::Null);
        }
        Ok(self
            .state
            .borrow()
            .script_results
            .get(script)
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    fn move_to(&self, handle: &ElementHandle) -> HarnessResult<()> {
        self.record(format!("move_to:{}", handle.locator()));
        let id = self.resolve(handle)?;
        self.state.borrow_mut().nodes[id.0].node.offscreen = false;
        Ok(())
    }

    fn is_alert_present(&self) -> HarnessResult<bool> {
        self.settle();
        Ok(self.state.borrow().alert_open)
    }

    fn current_url(&self) -> HarnessResult<String> {
        Ok(self.state.borrow().url.clone())
    }

    fn navigate(&self, url: &str) -> HarnessResult<()> {
        self.record(format!("navigate:{url}"));
        let now = self.clock.now();
        let mut state = self.state.borrow_mut();
        state.url = url.to_string();
        let reactions = state.navigations.get(url).cloned().unwrap_or_default();
        state.run_reactions(reactions, now);
        Ok(())
    }
}
