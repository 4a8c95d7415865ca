use std::collections::HashMap;

/// One `<outline>` element: its attribute map plus ordered children.
///
/// The tree is built once by the parser and read-only afterwards.
/// Attribute keys are unique (last occurrence on the element wins);
/// children keep document order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Outline {
    attributes: HashMap<String, String>,
    children: Vec<Outline>,
}

impl Outline {
    pub(crate) fn with_attributes(attrs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut attributes = HashMap::new();
        for (name, value) in attrs {
            attributes.insert(name, value);
        }
        Self {
            attributes,
            children: Vec::new(),
        }
    }

    pub(crate) fn push_child(&mut self, child: Outline) {
        self.children.push(child);
    }

    /// Look up an attribute by name. Absent keys yield `None`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Direct children, in the order their start tags appeared.
    pub fn children(&self) -> &[Outline] {
        &self.children
    }
}

/// The result of a parse: an optional title and the root entry container.
///
/// The title field mirrors the OPML head element but is never populated
/// by the parser (the head is not an outline and is skipped); it exists
/// so downstream code has one place to carry it if it ever learns it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Document {
    title: Option<String>,
    body: Outline,
}

impl Document {
    pub(crate) fn new(body: Outline) -> Self {
        Self { title: None, body }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The root entry container. Its attribute map is always empty.
    pub fn body(&self) -> &Outline {
        &self.body
    }

    /// Top-level outline entries, in document order.
    pub fn outlines(&self) -> &[Outline] {
        self.body.children()
    }
}
