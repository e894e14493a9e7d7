//! In-memory document built from HTML markup.
//!
//! Markup is parsed once with `scraper`; the element tree is then flattened
//! into an arena so classes and media state can change while the engine runs.

use super::{Document, DomError, NodeId};
use crate::modal::{DialogId, DIALOG_ATTR, MEDIA_TAGS, OPEN_ATTR};
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    parent: Option<NodeId>,
    attrs: HashMap<String, String>,
    classes: Vec<String>,
    playing: bool,
}

/// Document backed by parsed markup
#[derive(Debug, Clone, Default)]
pub struct MarkupDocument {
    elements: Vec<Element>,
    dialogs: HashMap<DialogId, NodeId>,
    ids: HashMap<String, NodeId>,
    triggers: usize,
}

impl MarkupDocument {
    /// Parse markup. Dialog names must be unique.
    pub fn parse(markup: &str) -> Result<Self, DomError> {
        let html = Html::parse_document(markup);
        let mut document = Self::default();
        document.collect(html.root_element(), None)?;

        debug!(
            elements = document.elements.len(),
            dialogs = document.dialogs.len(),
            triggers = document.triggers,
            "Parsed markup"
        );

        Ok(document)
    }

    /// Read and parse a markup file
    pub async fn load(path: &Path) -> Result<Self, DomError> {
        debug!("Loading markup from: {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    fn collect(&mut self, element: ElementRef<'_>, parent: Option<NodeId>) -> Result<(), DomError> {
        let node = NodeId(self.elements.len());
        let value = element.value();

        let tag = value.name().to_ascii_lowercase();
        let attrs: HashMap<String, String> = value
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        let classes = value.classes().map(str::to_string).collect();
        let playing = MEDIA_TAGS.contains(&tag.as_str()) && attrs.contains_key("autoplay");

        if let Some(name) = attrs.get(DIALOG_ATTR) {
            let dialog = DialogId::new(name.clone());
            if self.dialogs.insert(dialog.clone(), node).is_some() {
                return Err(DomError::DuplicateDialog(dialog));
            }
        }
        if attrs.contains_key(OPEN_ATTR) {
            self.triggers += 1;
        }
        if let Some(id) = attrs.get("id") {
            self.ids.entry(id.clone()).or_insert(node);
        }

        self.elements.push(Element {
            tag,
            parent,
            attrs,
            classes,
            playing,
        });

        for child in element.children().filter_map(ElementRef::wrap) {
            self.collect(child, Some(node))?;
        }

        Ok(())
    }

    /// Element declared with `id="<id>"`
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.elements.get(node.0).map(|element| element.tag.as_str())
    }

    /// Names of every declared dialog, sorted
    pub fn dialog_names(&self) -> Vec<DialogId> {
        let mut names: Vec<DialogId> = self.dialogs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Dialogs currently carrying `class`
    pub fn dialogs_with_class(&self, class: &str) -> Vec<DialogId> {
        let mut names: Vec<DialogId> = self
            .dialogs
            .iter()
            .filter(|(_, node)| self.has_class(**node, class))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn is_playing(&self, node: NodeId) -> bool {
        self.elements
            .get(node.0)
            .map(|element| element.playing)
            .unwrap_or(false)
    }

    /// Start playback on a media element; other elements are left alone
    pub fn play(&mut self, node: NodeId) {
        if let Some(element) = self.elements.get_mut(node.0) {
            if MEDIA_TAGS.contains(&element.tag.as_str()) {
                element.playing = true;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Document for MarkupDocument {
    fn has_triggers(&self) -> bool {
        self.triggers > 0
    }

    fn find_dialog(&self, dialog: &DialogId) -> Option<NodeId> {
        self.dialogs.get(dialog).copied()
    }

    fn find_by_class(&self, class: &str) -> Option<NodeId> {
        self.elements
            .iter()
            .position(|element| element.classes.iter().any(|c| c == class))
            .map(NodeId)
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.elements
            .get(node.0)
            .and_then(|element| element.attrs.get(name))
            .map(String::as_str)
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.elements
            .get(node.0)
            .map(|element| element.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.elements.get_mut(node.0) {
            if !element.classes.iter().any(|c| c == class) {
                element.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.elements.get_mut(node.0) {
            element.classes.retain(|c| c != class);
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.elements.get(node.0).and_then(|element| element.parent)
    }

    fn pause_media(&mut self, root: NodeId) -> usize {
        let playing: Vec<usize> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.playing)
            .filter(|(index, _)| self.contains(root, NodeId(*index)))
            .map(|(index, _)| index)
            .collect();

        for index in &playing {
            self.elements[*index].playing = false;
        }

        playing.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <a id="open-contact" href="/contact" data-open-modal="contact"><span id="label">Contact</span></a>
          <div class="modal" data-modal="contact">
            <button id="close-contact" data-close-modal>x</button>
            <video id="clip" autoplay></video>
            <audio id="song"></audio>
          </div>
          <video id="outside" autoplay></video>
        </body></html>
    "#;

    #[test]
    fn test_parse_markup_contract() {
        let document = MarkupDocument::parse(PAGE).unwrap();

        assert!(document.has_triggers());
        assert_eq!(document.dialog_names(), vec![DialogId::from("contact")]);

        let dialog = document.find_dialog(&DialogId::from("contact")).unwrap();
        assert!(document.has_class(dialog, "modal"));
        assert_eq!(document.tag(dialog), Some("div"));
        assert!(document.find_dialog(&DialogId::from("missing")).is_none());
    }

    #[test]
    fn test_closest_with_attr_walks_ancestors() {
        let document = MarkupDocument::parse(PAGE).unwrap();
        let label = document.element_by_id("label").unwrap();
        let link = document.element_by_id("open-contact").unwrap();

        assert_eq!(
            document.closest_with_attr(label, OPEN_ATTR),
            Some((link, "contact".to_string()))
        );
        assert!(document.closest_with_attr(label, DIALOG_ATTR).is_none());
    }

    #[test]
    fn test_empty_attribute_value() {
        let document = MarkupDocument::parse(PAGE).unwrap();
        let close = document.element_by_id("close-contact").unwrap();

        assert_eq!(document.attr(close, "data-close-modal"), Some(""));
    }

    #[test]
    fn test_class_toggle() {
        let mut document = MarkupDocument::parse(PAGE).unwrap();
        let dialog = document.find_dialog(&DialogId::from("contact")).unwrap();

        document.add_class(dialog, "modal--active");
        document.add_class(dialog, "modal--active");
        assert_eq!(document.find_by_class("modal--active"), Some(dialog));
        assert_eq!(
            document.dialogs_with_class("modal--active"),
            vec![DialogId::from("contact")]
        );

        document.remove_class(dialog, "modal--active");
        assert!(document.find_by_class("modal--active").is_none());
        assert!(document.has_class(dialog, "modal"));
    }

    #[test]
    fn test_pause_media_is_scoped_to_root() {
        let mut document = MarkupDocument::parse(PAGE).unwrap();
        let dialog = document.find_dialog(&DialogId::from("contact")).unwrap();
        let clip = document.element_by_id("clip").unwrap();
        let song = document.element_by_id("song").unwrap();
        let outside = document.element_by_id("outside").unwrap();

        document.play(song);
        assert_eq!(document.pause_media(dialog), 2);
        assert!(!document.is_playing(clip));
        assert!(!document.is_playing(song));
        assert!(document.is_playing(outside));
        assert_eq!(document.pause_media(dialog), 0);
    }

    #[test]
    fn test_play_ignores_non_media() {
        let mut document = MarkupDocument::parse(PAGE).unwrap();
        let link = document.element_by_id("open-contact").unwrap();

        document.play(link);
        assert!(!document.is_playing(link));
    }

    #[test]
    fn test_duplicate_dialog_rejected() {
        let markup = r#"<div data-modal="a"></div><div data-modal="a"></div>"#;

        match MarkupDocument::parse(markup) {
            Err(DomError::DuplicateDialog(id)) => assert_eq!(id.as_str(), "a"),
            other => panic!("expected duplicate dialog error, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_no_triggers() {
        let document = MarkupDocument::parse(r#"<div data-modal="a"></div>"#).unwrap();
        assert!(!document.has_triggers());
    }
}
