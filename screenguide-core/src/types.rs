use serde::{Deserialize, Serialize};

/// Screen rectangle of a UI element, in physical pixels.
///
/// The Android client reports bounds as `{l, t, r, b}`; the long names are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UiBounds {
    #[serde(rename = "l", alias = "left")]
    pub left: i32,
    #[serde(rename = "t", alias = "top")]
    pub top: i32,
    #[serde(rename = "r", alias = "right")]
    pub right: i32,
    #[serde(rename = "b", alias = "bottom")]
    pub bottom: i32,
}

impl UiBounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<UiBounds>,

    // Hierarchical trees nest children; the accessibility collector sends a flat list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UiElement>,
}

impl UiElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_name(mut self, v: impl Into<String>) -> Self {
        self.class_name = Some(v.into());
        self
    }

    pub fn with_text(mut self, v: impl Into<String>) -> Self {
        self.text = Some(v.into());
        self
    }

    pub fn with_content_description(mut self, v: impl Into<String>) -> Self {
        self.content_description = Some(v.into());
        self
    }

    pub fn with_view_id(mut self, v: impl Into<String>) -> Self {
        self.view_id = Some(v.into());
        self
    }

    pub fn with_bounds(mut self, bounds: UiBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_child(mut self, child: UiElement) -> Self {
        self.children.push(child);
        self
    }

    /// True when at least one identifying field is populated.
    pub fn is_actionable(&self) -> bool {
        [
            &self.class_name,
            &self.text,
            &self.content_description,
            &self.view_id,
        ]
        .iter()
        .any(|f| populated(f).is_some())
            || self.bounds.is_some()
    }

    /// Structural equality over the identifying fields (children are ignored).
    pub fn same_identity(&self, other: &UiElement) -> bool {
        populated(&self.class_name) == populated(&other.class_name)
            && populated(&self.text) == populated(&other.text)
            && populated(&self.content_description) == populated(&other.content_description)
            && populated(&self.view_id) == populated(&other.view_id)
            && self.bounds == other.bounds
    }

    /// A copy without nested children, as returned to the client.
    pub fn detached(&self) -> UiElement {
        UiElement {
            children: Vec::new(),
            ..self.clone()
        }
    }
}

pub(crate) fn populated(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Snapshot of on-screen elements as collected by the accessibility service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTree {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<i64>,
    pub nodes: Vec<UiElement>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UiTreeWire {
    Payload {
        #[serde(default)]
        package: Option<String>,
        #[serde(default, rename = "eventType")]
        event_type: Option<i64>,
        nodes: Vec<UiElement>,
    },
    List(Vec<UiElement>),
    Root(UiElement),
}

impl<'de> Deserialize<'de> for UiTree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match UiTreeWire::deserialize(deserializer)? {
            UiTreeWire::Payload {
                package,
                event_type,
                nodes,
            } => UiTree {
                package,
                event_type,
                nodes,
            },
            UiTreeWire::List(nodes) => UiTree {
                nodes,
                ..Default::default()
            },
            UiTreeWire::Root(root) if root.is_actionable() || !root.children.is_empty() => {
                UiTree {
                    nodes: vec![root],
                    ..Default::default()
                }
            }
            UiTreeWire::Root(_) => {
                return Err(serde::de::Error::custom(
                    "UI tree object has no nodes and no element fields",
                ));
            }
        })
    }
}

impl UiTree {
    pub fn from_nodes(nodes: Vec<UiElement>) -> Self {
        Self {
            nodes,
            ..Default::default()
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Every element, depth-first in pre-order.
    pub fn elements(&self) -> Vec<&UiElement> {
        let mut out = Vec::new();
        let mut stack: Vec<&UiElement> = self.nodes.iter().rev().collect();
        while let Some(el) = stack.pop() {
            out.push(el);
            stack.extend(el.children.iter().rev());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.elements().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, element: &UiElement) -> bool {
        self.elements().iter().any(|e| e.same_identity(element))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisorMode {
    Image,
    UiTree,
}

impl AdvisorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AdvisorMode::Image => "image",
            AdvisorMode::UiTree => "ui-tree",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenRepresentation {
    Image { mime_type: String, bytes: Vec<u8> },
    UiTree(UiTree),
}

impl ScreenRepresentation {
    pub fn image(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::Image {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn mode(&self) -> AdvisorMode {
        match self {
            ScreenRepresentation::Image { .. } => AdvisorMode::Image,
            ScreenRepresentation::UiTree(_) => AdvisorMode::UiTree,
        }
    }

    pub fn tree(&self) -> Option<&UiTree> {
        match self {
            ScreenRepresentation::UiTree(t) => Some(t),
            ScreenRepresentation::Image { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ScreenRepresentation::Image { bytes, .. } => bytes.is_empty(),
            ScreenRepresentation::UiTree(t) => t.is_empty(),
        }
    }
}

/// Reference UI-structure schema, only ever used as a prompt hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorContext(pub String);

impl PriorContext {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub mission_achieved: bool,
    #[serde(rename = "ai_response")]
    pub advice_text: String,
    #[serde(
        rename = "selected_ui_element",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_element: Option<UiElement>,
}

impl Verdict {
    pub fn achieved(advice_text: impl Into<String>) -> Self {
        Self {
            mission_achieved: true,
            advice_text: advice_text.into(),
            selected_element: None,
        }
    }

    pub fn next_step(advice_text: impl Into<String>, element: Option<UiElement>) -> Self {
        Self {
            mission_achieved: false,
            advice_text: advice_text.into(),
            selected_element: element,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_collector_payload() {
        let raw = r#"{
            "eventType": 2048,
            "package": "jp.naver.line.android",
            "nodes": [
                {"className": "android.widget.FrameLayout", "text": null, "contentDescription": null, "viewId": null, "bounds": {"l": 0, "t": 0, "r": 1080, "b": 2340}},
                {"className": "android.widget.ImageView", "text": null, "contentDescription": "Back", "viewId": "btn_back", "bounds": {"l": 0, "t": 80, "r": 120, "b": 200}}
            ]
        }"#;
        let tree = UiTree::from_json(raw).unwrap();
        assert_eq!(tree.package.as_deref(), Some("jp.naver.line.android"));
        assert_eq!(tree.event_type, Some(2048));
        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.nodes[1].bounds,
            Some(UiBounds::new(0, 80, 120, 200))
        );
    }

    #[test]
    fn parses_nested_root_and_walks_preorder() {
        let raw = r#"{"className": "root", "children": [
            {"className": "a", "children": [{"className": "a1"}]},
            {"className": "b", "bounds": {"left": 1, "top": 2, "right": 3, "bottom": 4}}
        ]}"#;
        let tree = UiTree::from_json(raw).unwrap();
        let names: Vec<_> = tree
            .elements()
            .iter()
            .map(|e| e.class_name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["root", "a", "a1", "b"]);
        assert!(tree.contains(
            &UiElement::new()
                .with_class_name("b")
                .with_bounds(UiBounds::new(1, 2, 3, 4))
        ));
    }

    #[test]
    fn bare_array_is_a_tree() {
        let tree = UiTree::from_json(r#"[{"viewId": "x"}]"#).unwrap();
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn unrelated_object_is_not_a_tree() {
        assert!(UiTree::from_json(r#"{"nodes": "oops"}"#).is_err());
        assert!(UiTree::from_json(r#"{"foo": 1}"#).is_err());
    }

    #[test]
    fn blank_fields_are_not_actionable() {
        assert!(!UiElement::new().with_text("  ").is_actionable());
        assert!(UiElement::new().with_view_id("btn_back").is_actionable());
        assert!(
            UiElement::new()
                .with_bounds(UiBounds::new(0, 0, 1, 1))
                .is_actionable()
        );
    }

    #[test]
    fn verdict_serializes_client_keys() {
        let v = Verdict::next_step(
            "Tap back",
            Some(UiElement::new().with_view_id("btn_back")),
        );
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["mission_achieved"], false);
        assert_eq!(json["ai_response"], "Tap back");
        assert_eq!(json["selected_ui_element"]["viewId"], "btn_back");

        let done = serde_json::to_value(Verdict::achieved("Done")).unwrap();
        assert!(done.get("selected_ui_element").is_none());
    }

    #[test]
    fn bounds_serialize_short_keys() {
        let json = serde_json::to_value(UiBounds::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, serde_json::json!({"l": 1, "t": 2, "r": 3, "b": 4}));
    }
}
