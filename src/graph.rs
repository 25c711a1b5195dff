//! Diagram graph assembly and Graphviz DOT emission.
//!
//! [`assemble`] walks a harness into a pure node-and-edge model;
//! [`Graph::to_dot`] serializes that model to deterministic DOT text
//! for the `dot` layout engine. Node labels are Graphviz HTML-like
//! tables with one port per pin side.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::colors::ColorMode;
use crate::components::{Cable, CableCategory, Connector, Mate};
use crate::error::HarnessError;
use crate::harness::Harness;
use crate::options::RenderOptions;

/// Escape text for embedding in HTML-like labels and report markup.
pub(crate) fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// Manual adjustments applied at DOT emission: per-node attribute
/// overrides and raw appended lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tweak {
    #[serde(rename = "override")]
    pub overrides: BTreeMap<String, BTreeMap<String, String>>,
    pub append: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    /// HTML-like table label.
    pub label: String,
    pub shape: &'static str,
    pub style: &'static str,
    pub fillcolor: String,
}

#[derive(Debug, Clone)]
pub struct EdgeEnd {
    pub node: String,
    pub port: Option<String>,
}

impl EdgeEnd {
    fn new(node: &str, port: Option<String>) -> Self {
        Self {
            node: node.to_string(),
            port,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: EdgeEnd,
    pub to: EdgeEnd,
    /// `:`-joined HTML color list (Graphviz parallel-stripe syntax).
    pub color: String,
    pub style: &'static str,
    pub dir: Option<&'static str>,
    pub penwidth: Option<u32>,
}

/// The assembled diagram.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Walk the harness into a graph.
pub(crate) fn assemble(harness: &Harness) -> Result<Graph, HarnessError> {
    let options = &harness.options;
    let mode = options.color_mode;

    // any striped wire in the harness pads every wire to three stripes
    // so all edges render with the same thickness
    let pad = harness
        .cables()
        .any(|cable| cable.colors.iter().any(|color| color.len() > 1));

    let mut graph = Graph::default();

    for connector in harness.connectors() {
        graph.nodes.push(Node {
            id: connector.name.clone(),
            label: connector_label(connector, mode),
            shape: "box",
            style: "filled",
            fillcolor: options.connector_bgcolor(connector.bgcolor.as_ref()).html(),
        });
        for (first, second) in &connector.loops {
            if let (Some(first_at), Some(second_at)) =
                (connector.pin_index(first), connector.pin_index(second))
            {
                graph.edges.push(Edge {
                    from: EdgeEnd::new(&connector.name, Some(format!("p{}l", first_at + 1))),
                    to: EdgeEnd::new(&connector.name, Some(format!("p{}l", second_at + 1))),
                    color: "#000000".to_string(),
                    style: "bold",
                    dir: None,
                    penwidth: None,
                });
            }
        }
    }

    for cable in harness.cables() {
        let style = match cable.category {
            CableCategory::Bundle => "filled,dashed",
            CableCategory::Cable => "filled",
        };
        graph.nodes.push(Node {
            id: cable.name.clone(),
            label: cable_label(cable, mode, pad)?,
            shape: "box",
            style,
            fillcolor: options
                .cable_bgcolor(cable.bgcolor.as_ref(), cable.category)
                .html(),
        });

        for connection in cable.connections() {
            let Some(color) = cable.wire_color(connection.wire) else {
                continue;
            };
            let color_list = if pad { color.html_padded()? } else { color.html() };

            if let Some(from) = &connection.from {
                let port = harness
                    .connector(&from.connector)
                    .and_then(|c| c.pin_index(&from.pin))
                    .map(|at| format!("p{}r", at + 1));
                graph.edges.push(Edge {
                    from: EdgeEnd::new(&from.connector, port),
                    to: EdgeEnd::new(&cable.name, Some(format!("w{}l", connection.wire))),
                    color: color_list.clone(),
                    style: "bold",
                    dir: None,
                    penwidth: None,
                });
            }
            if let Some(to) = &connection.to {
                let port = harness
                    .connector(&to.connector)
                    .and_then(|c| c.pin_index(&to.pin))
                    .map(|at| format!("p{}l", at + 1));
                graph.edges.push(Edge {
                    from: EdgeEnd::new(&cable.name, Some(format!("w{}r", connection.wire))),
                    to: EdgeEnd::new(&to.connector, port),
                    color: color_list,
                    style: "bold",
                    dir: None,
                    penwidth: None,
                });
            }
        }
    }

    for mate in harness.mates() {
        let edge = match mate {
            Mate::Pin { from, to, arrow } => {
                let from_port = harness
                    .connector(&from.connector)
                    .and_then(|c| c.pin_index(&from.pin))
                    .map(|at| format!("p{}r", at + 1));
                let to_port = harness
                    .connector(&to.connector)
                    .and_then(|c| c.pin_index(&to.pin))
                    .map(|at| format!("p{}l", at + 1));
                Edge {
                    from: EdgeEnd::new(&from.connector, from_port),
                    to: EdgeEnd::new(&to.connector, to_port),
                    color: "#000000".to_string(),
                    style: "dashed",
                    dir: Some(arrow.direction.dot_dir()),
                    penwidth: weight_penwidth(arrow.weight),
                }
            }
            Mate::Component { from, to, arrow } => Edge {
                from: EdgeEnd::new(from, None),
                to: EdgeEnd::new(to, None),
                color: "#000000".to_string(),
                style: "dashed",
                dir: Some(arrow.direction.dot_dir()),
                penwidth: weight_penwidth(arrow.weight),
            },
        };
        graph.edges.push(edge);
    }

    Ok(graph)
}

fn weight_penwidth(weight: crate::components::ArrowWeight) -> Option<u32> {
    match weight {
        crate::components::ArrowWeight::Single => None,
        crate::components::ArrowWeight::Double => Some(2),
    }
}

fn connector_label(connector: &Connector, mode: ColorMode) -> String {
    let mut rows = String::new();
    let _ = write!(
        rows,
        "<tr><td colspan=\"3\"><b>{}</b></td></tr>",
        html_escape(&connector.name)
    );

    // part info comes from the BOM key so diagram and table agree
    let part = crate::bom::connector_key(connector, mode);
    let _ = write!(
        rows,
        "<tr><td colspan=\"3\">{}</td></tr>",
        html_escape(&part.description)
    );
    if let Some(pn) = &part.pn {
        let _ = write!(rows, "<tr><td colspan=\"3\">PN: {}</td></tr>", html_escape(pn));
    }

    for (at, pin) in connector.pins.iter().enumerate() {
        let label = connector
            .pinlabels
            .get(at)
            .map(|text| html_escape(text))
            .unwrap_or_default();
        let active = connector.active_sides_at(at).unwrap_or_default();
        let pin_text = if active.any() {
            html_escape(&pin.to_string())
        } else {
            // unconnected pins render dimmed
            format!("<font color=\"#999999\">{}</font>", html_escape(&pin.to_string()))
        };
        let port = at + 1;
        let _ = write!(
            rows,
            "<tr><td port=\"p{port}l\">{pin_text}</td><td>{label}</td><td port=\"p{port}r\">{pin_text}</td></tr>"
        );
    }

    format!(
        "<table border=\"0\" cellspacing=\"0\" cellpadding=\"3\" cellborder=\"1\">{rows}</table>"
    )
}

fn cable_label(cable: &Cable, mode: ColorMode, pad: bool) -> Result<String, HarnessError> {
    let mut rows = String::new();
    let _ = write!(
        rows,
        "<tr><td colspan=\"3\"><b>{}</b></td></tr>",
        html_escape(&cable.name)
    );

    // part info comes from the BOM key so diagram and table agree
    let part = crate::bom::cable_key(cable, mode);
    let _ = write!(
        rows,
        "<tr><td colspan=\"3\">{}</td></tr>",
        html_escape(&part.description)
    );
    if let Some(pn) = &part.pn {
        let _ = write!(rows, "<tr><td colspan=\"3\">PN: {}</td></tr>", html_escape(pn));
    }

    for wire in 1..=cable.wirecount() {
        let Some(color) = cable.wire_color(wire) else {
            continue;
        };
        let mut text = html_escape(&color.render(mode));
        if let Some(label) = cable.wire_label(wire) {
            text = format!("{} {}", html_escape(label), text);
        }
        let _ = write!(
            rows,
            "<tr><td port=\"w{wire}l\">{wire}</td><td>{text}</td><td port=\"w{wire}r\">{wire}</td></tr>"
        );

        let stripes = if pad {
            color.padded()?
        } else {
            color.colors().to_vec()
        };
        let mut cells = String::new();
        for stripe in &stripes {
            let _ = write!(cells, "<td bgcolor=\"{}\" height=\"6\"></td>", stripe.html());
        }
        let _ = write!(
            rows,
            "<tr><td colspan=\"3\"><table border=\"0\" cellborder=\"0\" cellspacing=\"0\" width=\"100\"><tr>{cells}</tr></table></td></tr>"
        );
    }

    if cable.shield {
        rows.push_str("<tr><td></td><td>Shield</td><td></td></tr>");
    }

    Ok(format!(
        "<table border=\"0\" cellspacing=\"0\" cellpadding=\"3\" cellborder=\"1\">{rows}</table>"
    ))
}

/// One DOT attribute value: plain values are quoted, HTML-like labels
/// are wrapped in angle brackets.
enum AttrValue {
    Quoted(String),
    Html(String),
}

fn write_attrs(out: &mut String, attrs: &BTreeMap<String, AttrValue>) {
    out.push('[');
    for (at, (key, value)) in attrs.iter().enumerate() {
        if at > 0 {
            out.push(' ');
        }
        match value {
            AttrValue::Quoted(text) => {
                let _ = write!(out, "{key}=\"{text}\"");
            }
            AttrValue::Html(text) => {
                let _ = write!(out, "{key}=<{text}>");
            }
        }
    }
    out.push(']');
}

fn edge_end(out: &mut String, end: &EdgeEnd) {
    let _ = write!(out, "\"{}\"", end.node);
    if let Some(port) = &end.port {
        let _ = write!(out, ":{port}");
    }
}

impl Graph {
    /// Serialize to DOT. Output is deterministic for a fixed graph,
    /// options, and tweak set.
    pub fn to_dot(&self, options: &RenderOptions, tweak: &Tweak) -> String {
        let mut out = String::new();
        out.push_str("graph {\n");
        let _ = writeln!(
            out,
            "\tgraph [bgcolor=\"{}\" fontname=\"{}\" nodesep=\"0.33\" rankdir=\"LR\" ranksep=\"2\"]",
            self_or_white(&options.bgcolor.html()),
            options.fontname
        );
        let _ = writeln!(
            out,
            "\tnode [fillcolor=\"{}\" fontname=\"{}\" shape=\"box\" style=\"filled\"]",
            self_or_white(&options.bgcolor_node.html()),
            options.fontname
        );
        let _ = writeln!(out, "\tedge [fontname=\"{}\" style=\"bold\"]", options.fontname);

        for node in &self.nodes {
            let mut attrs: BTreeMap<String, AttrValue> = BTreeMap::new();
            attrs.insert(
                "fillcolor".to_string(),
                AttrValue::Quoted(node.fillcolor.clone()),
            );
            attrs.insert("label".to_string(), AttrValue::Html(node.label.clone()));
            attrs.insert("shape".to_string(), AttrValue::Quoted(node.shape.to_string()));
            attrs.insert("style".to_string(), AttrValue::Quoted(node.style.to_string()));
            if let Some(overrides) = tweak.overrides.get(&node.id) {
                for (key, value) in overrides {
                    attrs.insert(key.clone(), AttrValue::Quoted(value.clone()));
                }
            }
            let _ = write!(out, "\t\"{}\" ", node.id);
            write_attrs(&mut out, &attrs);
            out.push('\n');
        }

        for edge in &self.edges {
            let mut attrs: BTreeMap<String, AttrValue> = BTreeMap::new();
            attrs.insert("color".to_string(), AttrValue::Quoted(edge.color.clone()));
            if let Some(dir) = edge.dir {
                attrs.insert("dir".to_string(), AttrValue::Quoted(dir.to_string()));
            }
            if let Some(penwidth) = edge.penwidth {
                attrs.insert(
                    "penwidth".to_string(),
                    AttrValue::Quoted(penwidth.to_string()),
                );
            }
            attrs.insert("style".to_string(), AttrValue::Quoted(edge.style.to_string()));
            out.push('\t');
            edge_end(&mut out, &edge.from);
            out.push_str(" -- ");
            edge_end(&mut out, &edge.to);
            out.push(' ');
            write_attrs(&mut out, &attrs);
            out.push('\n');
        }

        for line in &tweak.append {
            let _ = writeln!(out, "\t{line}");
        }

        out.push_str("}\n");
        out
    }
}

fn self_or_white(html: &str) -> &str {
    if html.is_empty() {
        "#ffffff"
    } else {
        html
    }
}
