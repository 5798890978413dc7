use std::collections::HashSet;
use std::sync::LazyLock;

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Node, Selector};
use tracing::debug;

use super::labels::{classify, FieldLabel};
use super::Package;

static MARKER: LazyLock<Selector> = LazyLock::new(|| Selector::parse("em").unwrap());
static CODE_BLOCK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("pre code").unwrap());
static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static FILE_REF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr td code a.filename").unwrap());

/// Elements that end a value sharing its line with other markers.
const BLOCK_TAGS: &[&str] = &["p", "pre", "table", "div", "dl", "ul", "ol", "br"];

struct Marker<'a> {
    kind: FieldLabel,
    em: ElementRef<'a>,
    /// The `em`, or its `span.emphasis` wrapper when there is one.
    label: NodeRef<'a, Node>,
}

/// Nodes already attributed to a field. Text lookups skip these subtrees,
/// so whatever a definition block still yields afterwards is its description.
#[derive(Default)]
struct Consumed {
    nodes: HashSet<NodeId>,
}

impl Consumed {
    fn mark(&mut self, node: NodeRef<'_, Node>) {
        self.nodes.insert(node.id());
    }

    /// `node` itself or one of its ancestors was consumed.
    fn covers(&self, node: NodeRef<'_, Node>) -> bool {
        self.nodes.contains(&node.id()) || node.ancestors().any(|a| self.nodes.contains(&a.id()))
    }

    /// First unconsumed match in `scope` that follows `marker` in document order.
    fn first_after<'a>(
        &self,
        scope: NodeRef<'a, Node>,
        marker: NodeRef<'a, Node>,
        selector: &Selector,
    ) -> Option<ElementRef<'a>> {
        scope
            .descendants()
            .skip_while(|n| n.id() != marker.id())
            .filter_map(ElementRef::wrap)
            .find(|el| selector.matches(el) && !self.covers(**el))
    }

    fn text(&self, node: NodeRef<'_, Node>) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeRef<'_, Node>, out: &mut String) {
        if self.nodes.contains(&node.id()) {
            return;
        }
        match node.value() {
            Node::Text(text) => out.push_str(text),
            _ => {
                for child in node.children() {
                    self.collect_text(child, out);
                }
            }
        }
    }
}

struct Block<'a> {
    definition: ElementRef<'a>,
    /// Labels of every `em`, recognized or not; a shared-line value ends at one.
    stops: HashSet<NodeId>,
    /// Line (label parent) of each recognized marker, with repeats.
    lines: Vec<NodeId>,
    consumed: Consumed,
}

/// Build the record for one definition block. The document is left untouched.
pub fn extract(name: String, definition: ElementRef<'_>) -> Package {
    let mut pkg = Package {
        name,
        ..Package::default()
    };

    let mut stops = HashSet::new();
    let mut markers = Vec::new();
    for em in definition.select(&MARKER) {
        let label = label_of(em);
        stops.insert(label.id());

        let text = em.text().collect::<String>();
        match classify(&text) {
            Some(kind) => markers.push(Marker { kind, em, label }),
            None => debug!(package = %pkg.name, marker = text.trim(), "unrecognized marker"),
        }
    }

    let mut block = Block {
        definition,
        stops,
        lines: markers
            .iter()
            .filter_map(|m| m.label.parent())
            .map(|line| line.id())
            .collect(),
        consumed: Consumed::default(),
    };

    for marker in &markers {
        match marker.kind {
            FieldLabel::Type => pkg.r#type = block.inline_value(marker),
            FieldLabel::Default => pkg.default = block.value_or_code_block(marker),
            FieldLabel::Example => pkg.example = block.value_or_code_block(marker),
            FieldLabel::DeclaredBy => pkg.declared_by = block.declarations(marker),
        }
    }

    pkg.description = block.consumed.text(*definition).trim().to_string();
    pkg
}

fn label_of(em: ElementRef<'_>) -> NodeRef<'_, Node> {
    match em.parent().and_then(ElementRef::wrap) {
        Some(span)
            if span.value().name() == "span"
                && span.value().classes().any(|c| c == "emphasis") =>
        {
            *span
        }
        _ => *em,
    }
}

impl<'a> Block<'a> {
    /// A line is shared when it is the block itself or holds several markers.
    fn is_shared(&self, line: NodeRef<'a, Node>) -> bool {
        line.id() == self.definition.id()
            || self.lines.iter().filter(|id| **id == line.id()).count() > 1
    }

    /// Up to three levels above the marker, but never past the block.
    fn scope(&self, marker: &Marker<'a>) -> NodeRef<'a, Node> {
        let mut node = *marker.em;
        for _ in 0..3 {
            if node.id() == self.definition.id() {
                break;
            }
            match node.parent() {
                Some(parent) => node = parent,
                None => break,
            }
        }
        node
    }

    /// Text of the marker's own line without the marker, or on a shared line
    /// the text following the marker. Consumes what it reads.
    fn inline_value(&mut self, marker: &Marker<'a>) -> String {
        self.consumed.mark(marker.label);
        let Some(line) = marker.label.parent() else {
            return String::new();
        };
        if self.is_shared(line) {
            return self.trailing_text(marker.label);
        }

        let value = self.consumed.text(line).trim().to_string();
        self.consumed.mark(line);
        value
    }

    /// Siblings after `label` up to the next marker or block element.
    fn trailing_text(&mut self, label: NodeRef<'a, Node>) -> String {
        let mut value = String::new();
        for sibling in label.next_siblings() {
            if self.stops.contains(&sibling.id()) {
                break;
            }
            if let Some(el) = sibling.value().as_element() {
                if BLOCK_TAGS.contains(&el.name()) {
                    break;
                }
            }
            value.push_str(&self.consumed.text(sibling));
            self.consumed.mark(sibling);
        }
        value.trim().to_string()
    }

    fn value_or_code_block(&mut self, marker: &Marker<'a>) -> String {
        let value = self.inline_value(marker);
        if !value.is_empty() {
            return value;
        }

        let scope = self.scope(marker);
        let Some(code) = self.consumed.first_after(scope, marker.label, &CODE_BLOCK) else {
            return String::new();
        };
        self.consumed.mark(*code);
        code.text().collect::<String>().trim().to_string()
    }

    fn declarations(&mut self, marker: &Marker<'a>) -> Vec<String> {
        self.consumed.mark(marker.label);
        let scope = self.scope(marker);
        let Some(table) = self.consumed.first_after(scope, marker.label, &TABLE) else {
            debug!("declared-by marker without a table");
            return Vec::new();
        };
        self.consumed.mark(*table);

        table
            .select(&FILE_REF)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect()
    }
}
