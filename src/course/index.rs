//! Id lookups over the parsed document, built once before any chain walk.

use roxmltree::{Document, Node};
use std::collections::HashMap;

pub(crate) struct NodeIndex<'a, 'input> {
    course_controls: HashMap<&'a str, Node<'a, 'input>>,
    controls: HashMap<&'a str, Node<'a, 'input>>,
}

impl<'a, 'input> NodeIndex<'a, 'input> {
    pub(crate) fn build(doc: &'a Document<'input>) -> Self {
        let mut course_controls = HashMap::new();
        let mut controls = HashMap::new();

        for node in doc.descendants().filter(Node::is_element) {
            let Some(id) = node.attribute("id") else {
                continue;
            };
            // Ids are unique per element type; keep the first like a
            // document-order scan would.
            match node.tag_name().name() {
                "course-control" => {
                    course_controls.entry(id).or_insert(node);
                }
                "control" => {
                    controls.entry(id).or_insert(node);
                }
                _ => {}
            }
        }

        Self {
            course_controls,
            controls,
        }
    }

    pub(crate) fn course_control(&self, id: &str) -> Option<Node<'a, 'input>> {
        self.course_controls.get(id).copied()
    }

    pub(crate) fn control(&self, id: &str) -> Option<Node<'a, 'input>> {
        self.controls.get(id).copied()
    }
}
