//! Document adapter over a parsed markup tree
//!
//! The index builder and the extractor only talk to [`MarkupNode`]; the
//! concrete tree comes from `roxmltree`. Tag names are compared by local
//! name, so the AUTOSAR default namespace does not get in the way.

use crate::types::Result;

/// Read-only view of one element in a markup tree
///
/// Implementors provide the four primitive accessors; the query helpers used
/// by the extractor are built on top of them.
pub trait MarkupNode: Copy + PartialEq {
    /// Local tag name of this element
    fn tag(&self) -> &str;

    /// Enclosing element, if any
    fn parent_element(&self) -> Option<Self>;

    /// Element children, in document order
    fn element_children(&self) -> impl Iterator<Item = Self>;

    /// Element descendants (excluding `self`), in document order
    fn element_descendants(&self) -> impl Iterator<Item = Self>;

    /// Concatenated text content of this element and everything below it
    fn text_content(&self) -> String;

    /// Attribute value by name
    fn attribute_value(&self, name: &str) -> Option<String>;

    /// Text of the first element named `tag` anywhere below this node
    fn first_child_text(&self, tag: &str) -> Option<String> {
        self.element_descendants()
            .find(|node| node.tag() == tag)
            .map(|node| node.text_content())
    }

    /// All elements named `tag` anywhere below this node
    fn all_descendants(&self, tag: &str) -> Vec<Self> {
        self.element_descendants()
            .filter(|node| node.tag() == tag)
            .collect()
    }

    /// Only the immediate children named `tag`
    fn direct_children(&self, tag: &str) -> Vec<Self> {
        self.element_children()
            .filter(|node| node.tag() == tag)
            .collect()
    }

    /// Elements matching a descendant path such as `["DESC", "L-2"]`
    ///
    /// The last tag names the matched element; every earlier tag must appear,
    /// in order, among its ancestors below `self`.
    fn select(&self, path: &[&str]) -> Vec<Self> {
        let Some((target, ancestors)) = path.split_last() else {
            return Vec::new();
        };

        self.element_descendants()
            .filter(|node| node.tag() == *target && self.has_ancestor_path(*node, ancestors))
            .collect()
    }

    /// First element matching a descendant path
    fn select_first(&self, path: &[&str]) -> Option<Self> {
        let (target, ancestors) = path.split_last()?;

        self.element_descendants()
            .find(|node| node.tag() == *target && self.has_ancestor_path(*node, ancestors))
    }

    /// Text of the first element matching a descendant path
    fn select_text(&self, path: &[&str]) -> Option<String> {
        self.select_first(path).map(|node| node.text_content())
    }

    /// Check that `ancestors` appear in order on the way from `node` up to `self`
    fn has_ancestor_path(&self, node: Self, ancestors: &[&str]) -> bool {
        let mut remaining = ancestors.len();
        let mut current = node.parent_element();

        while remaining > 0 {
            match current {
                Some(parent) if parent == *self => return false,
                Some(parent) => {
                    if parent.tag() == ancestors[remaining - 1] {
                        remaining -= 1;
                    }
                    current = parent.parent_element();
                }
                None => return false,
            }
        }

        true
    }
}

impl<'a, 'input: 'a> MarkupNode for roxmltree::Node<'a, 'input> {
    fn tag(&self) -> &str {
        self.tag_name().name()
    }

    fn parent_element(&self) -> Option<Self> {
        self.parent().filter(|node| node.is_element())
    }

    fn element_children(&self) -> impl Iterator<Item = Self> {
        self.children().filter(|node| node.is_element())
    }

    fn element_descendants(&self) -> impl Iterator<Item = Self> {
        // descendants() starts with the node itself
        self.descendants().skip(1).filter(|node| node.is_element())
    }

    fn text_content(&self) -> String {
        self.descendants()
            .filter(|node| node.is_text())
            .filter_map(|node| node.text())
            .collect()
    }

    fn attribute_value(&self, name: &str) -> Option<String> {
        self.attribute(name).map(str::to_string)
    }
}

/// A well-formed ARXML document held in memory
pub struct ArxmlDocument<'input> {
    doc: roxmltree::Document<'input>,
}

impl<'input> ArxmlDocument<'input> {
    /// Parse document text; fails only if the text is not well-formed markup
    ///
    /// A document type declaration is accepted.
    pub fn parse(text: &'input str) -> Result<Self> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, options)?;
        Ok(Self { doc })
    }

    /// Document root; every element of the document is below it
    pub fn root(&self) -> roxmltree::Node<'_, 'input> {
        self.doc.root()
    }
}
