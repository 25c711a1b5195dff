//! Output emitters: BOM tables, TSV, SVG post-processing, the HTML
//! report, and the file-writing driver.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use log::warn;
use std::fmt;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use crate::bom::BomEntry;
use crate::components::Metadata;
use crate::error::HarnessError;
use crate::graph::html_escape;
use crate::harness::Harness;

/// BOM table as text rows, header first.
pub fn bom_rows(entries: &[BomEntry]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "#".to_string(),
        "Description".to_string(),
        "Qty".to_string(),
        "Unit".to_string(),
        "Designators".to_string(),
        "PN".to_string(),
        "Manufacturer".to_string(),
        "MPN".to_string(),
    ]];
    for entry in entries {
        rows.push(vec![
            entry.id.to_string(),
            entry.key.description.clone(),
            format_qty(entry.qty),
            entry.key.unit.clone().unwrap_or_default(),
            entry.designators.join(", "),
            entry.key.pn.clone().unwrap_or_default(),
            entry.key.manufacturer.clone().unwrap_or_default(),
            entry.key.mpn.clone().unwrap_or_default(),
        ]);
    }
    rows
}

fn format_qty(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{}", qty as i64)
    } else {
        format!("{qty}")
    }
}

/// Serialize rows as tab-separated text. Cell content never contains
/// tabs or newlines afterwards.
pub fn rows_to_tsv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| cell.replace(['\t', '\n', '\r'], " "))
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

/// Inline external bitmap references of an SVG as base64 data URIs.
/// Unreadable targets are left untouched and logged.
pub fn embed_svg_images(svg: &str, base: &Path) -> String {
    const NEEDLE: &str = "xlink:href=\"";
    let mut out = String::with_capacity(svg.len());
    let mut rest = svg;
    while let Some(at) = rest.find(NEEDLE) {
        let (head, tail) = rest.split_at(at + NEEDLE.len());
        out.push_str(head);
        let Some(end) = tail.find('"') else {
            rest = tail;
            break;
        };
        let target = &tail[..end];
        match embed_target(target, base) {
            Some(data_uri) => out.push_str(&data_uri),
            None => out.push_str(target),
        }
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

fn embed_target(target: &str, base: &Path) -> Option<String> {
    let media = match target.rsplit('.').next() {
        Some("png") => "png",
        Some("jpg") | Some("jpeg") => "jpeg",
        Some("gif") => "gif",
        _ => return None,
    };
    let path = base.join(target);
    match fs::read(&path) {
        Ok(bytes) => Some(format!(
            "data:image/{media};base64,{}",
            BASE64.encode(bytes)
        )),
        Err(err) => {
            warn!("cannot embed {}: {err}", path.display());
            None
        }
    }
}

/// Run the Graphviz `dot` layout engine over DOT text. Returns `None`
/// (with a logged warning) when `dot` is unavailable or fails, so
/// callers can degrade to DOT-only output.
pub fn render_svg(dot_source: &str) -> Option<String> {
    let mut child = match Command::new("dot")
        .arg("-Tsvg")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            warn!("graphviz dot not available: {err}");
            return None;
        }
    };
    if let Some(stdin) = child.stdin.as_mut() {
        if let Err(err) = stdin.write_all(dot_source.as_bytes()) {
            warn!("failed to feed dot: {err}");
            return None;
        }
    }
    match child.wait_with_output() {
        Ok(output) if output.status.success() => String::from_utf8(output.stdout).ok(),
        Ok(output) => {
            warn!("dot exited with {}", output.status);
            None
        }
        Err(err) => {
            warn!("dot failed: {err}");
            None
        }
    }
}

/// Assemble the HTML report: metadata, inline diagram, BOM table, and
/// a footer with timestamp and document fingerprint.
pub fn html_report(
    metadata: &Metadata,
    svg: Option<&str>,
    bom: &[Vec<String>],
    fingerprint: Option<&str>,
) -> String {
    let title = metadata
        .title
        .as_deref()
        .map(html_escape)
        .unwrap_or_else(|| "Wiring harness".to_string());

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{title}</title>\n"));
    out.push_str(
        "<style>\nbody { font-family: sans-serif; margin: 2em; }\n\
         table { border-collapse: collapse; }\n\
         th, td { border: 1px solid #999999; padding: 0.3em 0.6em; text-align: left; }\n\
         footer { margin-top: 2em; color: #666666; font-size: smaller; }\n</style>\n",
    );
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!("<h1>{title}</h1>\n"));

    if let Some(description) = &metadata.description {
        out.push_str(&format!("<p>{}</p>\n", html_escape(description)));
    }
    let mut byline: Vec<String> = Vec::new();
    if let Some(author) = &metadata.author {
        byline.push(html_escape(author));
    }
    if let Some(date) = &metadata.date {
        byline.push(html_escape(date));
    }
    if !byline.is_empty() {
        out.push_str(&format!("<p>{}</p>\n", byline.join(" · ")));
    }

    match svg {
        Some(svg) => {
            out.push_str("<div class=\"diagram\">\n");
            out.push_str(svg);
            out.push_str("\n</div>\n");
        }
        None => out.push_str("<p><em>Diagram rendering requires the Graphviz dot tool.</em></p>\n"),
    }

    out.push_str("<h2>Bill of Materials</h2>\n<table>\n");
    for (at, row) in bom.iter().enumerate() {
        let tag = if at == 0 { "th" } else { "td" };
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<{tag}>{}</{tag}>", html_escape(cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");

    if let Some(notes) = &metadata.notes {
        out.push_str(&format!("<p>{}</p>\n", html_escape(notes)));
    }

    out.push_str(&format!(
        "<footer>Generated {} by wireloom {}",
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
        crate::TOOL_VERSION
    ));
    if let Some(fingerprint) = fingerprint {
        out.push_str(&format!(" · document {fingerprint}"));
    }
    out.push_str("</footer>\n</body>\n</html>\n");
    out
}

/// Output artifact selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Gv,
    Svg,
    Tsv,
    Html,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "gv" => Ok(Self::Gv),
            "svg" => Ok(Self::Svg),
            "tsv" => Ok(Self::Tsv),
            "html" => Ok(Self::Html),
            other => Err(format!("unknown output format {other:?}")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Gv => "gv",
            Self::Svg => "svg",
            Self::Tsv => "tsv",
            Self::Html => "html",
        };
        f.write_str(text)
    }
}

fn path_with(base: &Path, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}.{extension}", base.display()))
}

/// Write the selected artifacts next to `base` (`base.gv`, `base.svg`,
/// `base.bom.tsv`, `base.html`). Each handle is scoped to its own
/// write and released before the next.
pub fn write_outputs(
    harness: &mut Harness,
    base: &Path,
    formats: &[OutputFormat],
    fingerprint: Option<&str>,
) -> Result<(), HarnessError> {
    let want = |format: OutputFormat| formats.contains(&format);
    let dot = harness.to_dot()?;

    if want(OutputFormat::Gv) {
        fs::write(path_with(base, "gv"), &dot)?;
    }

    let svg = if want(OutputFormat::Svg) || want(OutputFormat::Html) {
        let image_base = base.parent().unwrap_or_else(|| Path::new("."));
        render_svg(&dot).map(|svg| embed_svg_images(&svg, image_base))
    } else {
        None
    };
    if want(OutputFormat::Svg) {
        if let Some(svg) = &svg {
            fs::write(path_with(base, "svg"), svg)?;
        }
    }

    let rows = bom_rows(harness.bom());
    if want(OutputFormat::Tsv) {
        fs::write(path_with(base, "bom.tsv"), rows_to_tsv(&rows))?;
    }
    if want(OutputFormat::Html) {
        let report = html_report(&harness.metadata, svg.as_deref(), &rows, fingerprint);
        fs::write(path_with(base, "html"), report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::BomKey;

    fn entry(description: &str, qty: f64) -> BomEntry {
        BomEntry {
            id: 1,
            key: BomKey {
                description: description.to_string(),
                unit: Some("m".to_string()),
                ..BomKey::default()
            },
            qty,
            designators: vec!["W1".to_string(), "W2".to_string()],
        }
    }

    #[test]
    fn bom_rows_have_header_and_formatted_qty() {
        let rows = bom_rows(&[entry("Wire, RD", 2.0), entry("Wire, BU", 2.5)]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], "#");
        assert_eq!(rows[1][2], "2");
        assert_eq!(rows[2][2], "2.5");
        assert_eq!(rows[1][4], "W1, W2");
    }

    #[test]
    fn tsv_sanitizes_cells() {
        let rows = vec![vec!["a\tb".to_string(), "c\nd".to_string()]];
        assert_eq!(rows_to_tsv(&rows), "a b\tc d\n");
    }

    #[test]
    fn html_report_contains_bom_and_metadata() {
        let metadata = Metadata {
            title: Some("Demo <harness>".to_string()),
            description: Some("Two boards".to_string()),
            ..Metadata::default()
        };
        let rows = bom_rows(&[entry("Wire, RD", 1.0)]);
        let report = html_report(&metadata, None, &rows, Some("abc123"));
        assert!(report.contains("<h1>Demo &lt;harness&gt;</h1>"));
        assert!(report.contains("Two boards"));
        assert!(report.contains("<th>Description</th>"));
        assert!(report.contains("<td>Wire, RD</td>"));
        assert!(report.contains("document abc123"));
        assert!(report.contains("requires the Graphviz dot tool"));
    }

    #[test]
    fn svg_embedding_inlines_existing_images() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("logo.png"), b"fakepng").unwrap();

        let svg = r#"<svg><image xlink:href="logo.png"/><image xlink:href="missing.png"/></svg>"#;
        let embedded = embed_svg_images(svg, dir.path());
        assert!(embedded.contains("data:image/png;base64,"));
        // unreadable target stays as-is
        assert!(embedded.contains("xlink:href=\"missing.png\""));
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("gv".parse::<OutputFormat>().unwrap(), OutputFormat::Gv);
        assert_eq!("html".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }
}
