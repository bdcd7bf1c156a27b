//! In-memory page that speaks the engine traits
//!
//! Nodes carry a tag, attributes and an optional click reaction. Removed
//! nodes stay addressable but report `ElementDetached`, like a re-rendered
//! node in a real browser.

use crate::platforms::DomEngine;
use crate::{AutomationError, DomElement, DomElementImpl, Selector};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

pub type NodeId = usize;
pub type Reaction = Arc<dyn Fn(&mut Dom, NodeId) + Send + Sync>;

struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    attached: bool,
    on_click: Option<Reaction>,
}

pub struct Dom {
    nodes: Vec<Node>,
    /// Every click, described by the clicked node's identifying attribute
    pub clicks: Vec<String>,
    /// (node description, text) for every `type_text`
    pub typed: Vec<(String, String)>,
    pub visited: Vec<String>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let root = Node {
            tag: "html".to_string(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
            attached: true,
            on_click: None,
        };
        Self {
            nodes: vec![root],
            clicks: Vec::new(),
            typed: Vec::new(),
            visited: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn append(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children: Vec::new(),
            parent: Some(parent),
            attached: self.nodes[parent].attached,
            on_click: None,
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn on_click(&mut self, node: NodeId, reaction: impl Fn(&mut Dom, NodeId) + Send + Sync + 'static) {
        self.nodes[node].on_click = Some(Arc::new(reaction));
    }

    /// Detach a node and its subtree
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|&c| c != node);
        }
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            self.nodes[id].attached = false;
            stack.extend(self.nodes[id].children.iter().copied());
        }
    }

    pub fn clear_children(&mut self, node: NodeId) {
        for child in self.nodes[node].children.clone() {
            self.remove(child);
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node].attrs.get(name).map(String::as_str)
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.nodes[node].attached
    }

    /// First attached node whose attribute equals `value`
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&id| self.attr(id, name) == Some(value))
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&id| self.nodes[id].tag == tag)
            .collect()
    }

    // Strict descendants, pre-order (document order)
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    fn matches(&self, node: NodeId, step: &Selector) -> bool {
        let Selector::Element { tag, attributes } = step else {
            return false;
        };
        let n = &self.nodes[node];
        tag.as_ref().map_or(true, |t| *t == n.tag)
            && attributes
                .iter()
                .all(|a| a.matches(n.attrs.get(&a.name).map(String::as_str)))
    }

    pub fn query(&self, scope: NodeId, selector: &Selector) -> Result<Vec<NodeId>, AutomationError> {
        if let Selector::Invalid(reason) = selector {
            return Err(AutomationError::InvalidArgument(reason.clone()));
        }
        let mut current = vec![scope];
        for step in selector.steps() {
            let (step, direct_only) = match step {
                Selector::Child(inner) => (inner.as_ref(), true),
                s => (s, false),
            };
            let mut next = Vec::new();
            for &base in &current {
                let candidates = if direct_only {
                    self.nodes[base].children.clone()
                } else {
                    self.descendants(base)
                };
                for id in candidates {
                    if self.matches(id, step) && !next.contains(&id) {
                        next.push(id);
                    }
                }
            }
            current = next;
        }
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|id| current.contains(id))
            .collect())
    }

    fn describe(&self, node: NodeId) -> String {
        let n = &self.nodes[node];
        if let Some(tid) = n.attrs.get("data-tid") {
            tid.clone()
        } else if let Some(track) = n.attrs.get("track-data") {
            format!("join:{track}")
        } else {
            n.tag.clone()
        }
    }
}

/// Engine over a shared [`Dom`]
#[derive(Clone)]
pub struct FakeEngine {
    dom: Arc<Mutex<Dom>>,
}

impl FakeEngine {
    pub fn new(dom: Dom) -> Self {
        Self {
            dom: Arc::new(Mutex::new(dom)),
        }
    }

    pub fn dom(&self) -> MutexGuard<'_, Dom> {
        self.dom.lock().unwrap()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.dom().clicks.clone()
    }

    fn element(&self, id: NodeId) -> DomElement {
        DomElement::new(Box::new(FakeElement {
            dom: self.dom.clone(),
            id,
        }))
    }
}

#[async_trait::async_trait]
impl DomEngine for FakeEngine {
    async fn navigate(&self, url: &str) -> Result<(), AutomationError> {
        self.dom().visited.push(url.to_string());
        Ok(())
    }

    async fn query_all(&self, selector: &Selector) -> Result<Vec<DomElement>, AutomationError> {
        let ids = {
            let dom = self.dom();
            dom.query(dom.root(), selector)?
        };
        Ok(ids.into_iter().map(|id| self.element(id)).collect())
    }
}

#[derive(Clone)]
pub struct FakeElement {
    dom: Arc<Mutex<Dom>>,
    id: NodeId,
}

impl fmt::Debug for FakeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FakeElement({})", self.id)
    }
}

impl FakeElement {
    fn live(&self) -> Result<MutexGuard<'_, Dom>, AutomationError> {
        let dom = self.dom.lock().unwrap();
        if dom.is_attached(self.id) {
            Ok(dom)
        } else {
            Err(AutomationError::ElementDetached(format!("node {}", self.id)))
        }
    }
}

#[async_trait::async_trait]
impl DomElementImpl for FakeElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, AutomationError> {
        Ok(self.live()?.attr(self.id, name).map(str::to_string))
    }

    async fn click(&self) -> Result<(), AutomationError> {
        let mut dom = self.live()?;
        let described = dom.describe(self.id);
        dom.clicks.push(described);
        if let Some(reaction) = dom.nodes[self.id].on_click.clone() {
            reaction(&mut *dom, self.id);
        }
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        let mut dom = self.live()?;
        let described = dom.describe(self.id);
        dom.typed.push((described, text.to_string()));
        Ok(())
    }

    async fn is_attached(&self) -> Result<bool, AutomationError> {
        Ok(self.dom.lock().unwrap().is_attached(self.id))
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<DomElement>, AutomationError> {
        let ids = self.live()?.query(self.id, selector)?;
        Ok(ids
            .into_iter()
            .map(|id| {
                DomElement::new(Box::new(FakeElement {
                    dom: self.dom.clone(),
                    id,
                }))
            })
            .collect())
    }

    fn clone_box(&self) -> Box<dyn DomElementImpl> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_follows_descendant_chain_in_document_order() {
        let mut dom = Dom::new();
        let root = dom.root();
        let list = dom.append(root, "ul", &[]);
        let late = dom.append(root, "li", &[("data-tid", "outside")]);
        let a = dom.append(list, "li", &[("data-tid", "a")]);
        let b = dom.append(list, "li", &[("data-tid", "b")]);

        let found = dom.query(root, &Selector::from("ul li")).unwrap();
        assert_eq!(found, vec![a, b]);
        let all = dom.query(root, &Selector::from("li")).unwrap();
        assert_eq!(all, vec![a, b, late]);
    }

    #[test]
    fn child_step_skips_deeper_descendants() {
        let mut dom = Dom::new();
        let root = dom.root();
        let list = dom.append(root, "ul", &[]);
        let direct = dom.append(list, "li", &[]);
        let wrapper = dom.append(list, "div", &[]);
        dom.append(wrapper, "li", &[]);

        let found = dom.query(root, &Selector::from("ul>li")).unwrap();
        assert_eq!(found, vec![direct]);
        assert_eq!(dom.query(root, &Selector::from("ul li")).unwrap().len(), 2);
    }

    #[test]
    fn removed_subtree_is_detached() {
        let mut dom = Dom::new();
        let root = dom.root();
        let panel = dom.append(root, "div", &[]);
        let item = dom.append(panel, "li", &[]);
        dom.remove(panel);
        assert!(!dom.is_attached(item));
        assert!(dom.query(root, &Selector::from("li")).unwrap().is_empty());
    }
}
