//! Minimal Plotly figure model.
//!
//! Figures are plain `serde_json` values in Plotly's schema, laid out on a
//! subplot grid and written as standalone HTML pages that load plotly.js
//! from its CDN.

use std::path::Path;

use serde_json::{json, Map, Value};

use crate::error::ReportError;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// What a grid cell holds: cartesian axes, a domain trace such as a pie, or
/// nothing because a cell to its left spans over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Xy,
    Domain,
    Covered,
}

/// Subplot layout, row 1 at the top.
#[derive(Debug, Clone)]
pub struct SubplotGrid {
    rows: usize,
    cols: usize,
    kinds: Vec<CellKind>,
    spans: Vec<usize>,
    row_heights: Vec<f64>,
    horizontal_spacing: f64,
    vertical_spacing: f64,
    titles: Vec<String>,
}

impl SubplotGrid {
    /// Grid of cartesian cells with equal row heights.
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows,
            cols,
            kinds: vec![CellKind::Xy; rows * cols],
            spans: vec![1; rows * cols],
            row_heights: vec![1.0; rows],
            horizontal_spacing: 0.2 / cols as f64,
            vertical_spacing: 0.3 / rows as f64,
            titles: Vec::new(),
        }
    }

    pub fn domain_cell(mut self, row: usize, col: usize) -> Self {
        if let Some(i) = self.index(row, col) {
            self.kinds[i] = CellKind::Domain;
        }
        self
    }

    /// Let the first cell of `row` span every column.
    pub fn full_width_row(mut self, row: usize) -> Self {
        if let Some(first) = self.index(row, 1) {
            self.spans[first] = self.cols;
            for i in first + 1..first + self.cols {
                self.kinds[i] = CellKind::Covered;
            }
        }
        self
    }

    /// Relative row heights, top to bottom. Ignored unless one per row.
    pub fn row_heights(mut self, heights: &[f64]) -> Self {
        if heights.len() == self.rows && heights.iter().all(|h| *h > 0.0) {
            self.row_heights = heights.to_vec();
        }
        self
    }

    pub fn vertical_spacing(mut self, spacing: f64) -> Self {
        self.vertical_spacing = spacing;
        self
    }

    pub fn horizontal_spacing(mut self, spacing: f64) -> Self {
        self.horizontal_spacing = spacing;
        self
    }

    /// Titles of the visible cells in row-major order.
    pub fn titles<S: Into<String>>(mut self, titles: impl IntoIterator<Item = S>) -> Self {
        self.titles = titles.into_iter().map(Into::into).collect();
        self
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row >= 1 && row <= self.rows && col >= 1 && col <= self.cols)
            .then(|| (row - 1) * self.cols + (col - 1))
    }

    fn kind(&self, row: usize, col: usize) -> Option<CellKind> {
        self.index(row, col).map(|i| self.kinds[i])
    }

    /// 1-based axis number of a cartesian cell.
    fn axis_number(&self, row: usize, col: usize) -> Option<usize> {
        let idx = self.index(row, col)?;
        if self.kinds[idx] != CellKind::Xy {
            return None;
        }
        Some(self.kinds[..=idx].iter().filter(|k| **k == CellKind::Xy).count())
    }

    /// (x domain, y domain) of a cell in paper coordinates.
    fn cell_domain(&self, row: usize, col: usize) -> ([f64; 2], [f64; 2]) {
        let width = (1.0 - self.horizontal_spacing * (self.cols - 1) as f64) / self.cols as f64;
        let x0 = (col - 1) as f64 * (width + self.horizontal_spacing);
        let span = self.index(row, col).map_or(1, |i| self.spans[i]);
        let x1 = x0 + span as f64 * width + (span - 1) as f64 * self.horizontal_spacing;

        let total: f64 = self.row_heights.iter().sum();
        let available = 1.0 - self.vertical_spacing * (self.rows - 1) as f64;
        let above: f64 = self.row_heights[..row - 1].iter().sum();
        let top = 1.0 - above / total * available - (row - 1) as f64 * self.vertical_spacing;
        let height = self.row_heights[row - 1] / total * available;

        ([round(x0), round(x1)], [round(top - height), round(top)])
    }
}

fn round(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

fn axis_key(prefix: &str, n: usize) -> String {
    if n == 1 {
        format!("{prefix}axis")
    } else {
        format!("{prefix}axis{n}")
    }
}

fn axis_ref(prefix: &str, n: usize) -> String {
    if n == 1 {
        prefix.to_string()
    } else {
        format!("{prefix}{n}")
    }
}

/// A Plotly figure: traces plus layout.
#[derive(Debug, Clone)]
pub struct Figure {
    grid: SubplotGrid,
    traces: Vec<Value>,
    layout: Map<String, Value>,
}

impl Figure {
    /// Single-cell figure.
    pub fn new() -> Self {
        Self::with_grid(SubplotGrid::new(1, 1))
    }

    pub fn with_grid(grid: SubplotGrid) -> Self {
        let mut layout = Map::new();
        let mut annotations = Vec::new();
        let mut titles = grid.titles.iter();
        for row in 1..=grid.rows {
            for col in 1..=grid.cols {
                if grid.kind(row, col) == Some(CellKind::Covered) {
                    continue;
                }
                let (x, y) = grid.cell_domain(row, col);
                if let Some(n) = grid.axis_number(row, col) {
                    layout.insert(
                        axis_key("x", n),
                        json!({"domain": x, "anchor": axis_ref("y", n)}),
                    );
                    layout.insert(
                        axis_key("y", n),
                        json!({"domain": y, "anchor": axis_ref("x", n)}),
                    );
                }
                if let Some(title) = titles.next().filter(|t| !t.is_empty()) {
                    annotations.push(json!({
                        "text": format!("<b>{title}</b>"),
                        "x": (x[0] + x[1]) / 2.0,
                        "y": y[1],
                        "xref": "paper",
                        "yref": "paper",
                        "xanchor": "center",
                        "yanchor": "bottom",
                        "showarrow": false,
                        "font": {"size": 14},
                    }));
                }
            }
        }
        layout.insert("annotations".into(), Value::Array(annotations));
        layout.insert("shapes".into(), Value::Array(Vec::new()));
        Self {
            grid,
            traces: Vec::new(),
            layout,
        }
    }

    /// Place a trace in a grid cell. Cartesian traces get their axis
    /// references, domain traces their paper domain.
    pub fn add_trace(&mut self, mut trace: Value, row: usize, col: usize) -> &mut Self {
        if let Some(obj) = trace.as_object_mut() {
            match self.grid.kind(row, col) {
                Some(CellKind::Xy) => {
                    if let Some(n) = self.grid.axis_number(row, col) {
                        obj.insert("xaxis".into(), json!(axis_ref("x", n)));
                        obj.insert("yaxis".into(), json!(axis_ref("y", n)));
                    }
                }
                Some(CellKind::Domain) => {
                    let (x, y) = self.grid.cell_domain(row, col);
                    obj.insert("domain".into(), json!({"x": x, "y": y}));
                }
                Some(CellKind::Covered) | None => {
                    tracing::warn!(row, col, "trace placed outside a visible subplot cell")
                }
            }
        }
        self.traces.push(trace);
        self
    }

    /// Merge `props` into the x and y axis of a cartesian cell.
    pub fn update_axes(&mut self, row: usize, col: usize, x: Value, y: Value) -> &mut Self {
        if let Some(n) = self.grid.axis_number(row, col) {
            for (prefix, props) in [("x", x), ("y", y)] {
                let key = axis_key(prefix, n);
                if let (Some(Value::Object(axis)), Value::Object(props)) =
                    (self.layout.get_mut(&key), props)
                {
                    axis.extend(props);
                }
            }
        }
        self
    }

    pub fn axis_titles(&mut self, row: usize, col: usize, x: &str, y: &str) -> &mut Self {
        self.update_axes(
            row,
            col,
            json!({"title": {"text": x}}),
            json!({"title": {"text": y}}),
        )
    }

    /// Horizontal dashed line across a cartesian cell, with a label.
    pub fn add_hline(&mut self, row: usize, col: usize, y: f64, color: &str, label: &str) -> &mut Self {
        let Some(n) = self.grid.axis_number(row, col) else {
            return self;
        };
        let xref = format!("{} domain", axis_ref("x", n));
        let yref = axis_ref("y", n);
        self.push_layout_item(
            "shapes",
            json!({
                "type": "line",
                "xref": xref,
                "yref": yref,
                "x0": 0, "x1": 1, "y0": y, "y1": y,
                "line": {"color": color, "width": 2, "dash": "dash"},
            }),
        );
        self.push_layout_item(
            "annotations",
            json!({
                "text": label,
                "xref": xref,
                "yref": yref,
                "x": 1, "y": y,
                "xanchor": "right",
                "yanchor": "bottom",
                "showarrow": false,
                "font": {"color": color, "size": 11},
            }),
        )
    }

    /// Shaded vertical band between `x0` and `x1` in a cartesian cell.
    pub fn add_vrect(&mut self, row: usize, col: usize, x0: f64, x1: f64, color: &str, label: &str) -> &mut Self {
        let Some(n) = self.grid.axis_number(row, col) else {
            return self;
        };
        let xref = axis_ref("x", n);
        let yref = format!("{} domain", axis_ref("y", n));
        self.push_layout_item(
            "shapes",
            json!({
                "type": "rect",
                "xref": xref,
                "yref": yref,
                "x0": x0, "x1": x1, "y0": 0, "y1": 1,
                "fillcolor": color,
                "opacity": 0.15,
                "layer": "below",
                "line": {"width": 0},
            }),
        );
        self.push_layout_item(
            "annotations",
            json!({
                "text": label,
                "xref": xref,
                "yref": yref,
                "x": (x0 + x1) / 2.0, "y": 1,
                "yanchor": "bottom",
                "showarrow": false,
                "font": {"size": 11},
            }),
        )
    }

    /// Free annotation in paper coordinates.
    pub fn add_annotation(&mut self, annotation: Value) -> &mut Self {
        self.push_layout_item("annotations", annotation)
    }

    pub fn update_layout(&mut self, key: &str, value: Value) -> &mut Self {
        self.layout.insert(key.to_string(), value);
        self
    }

    fn push_layout_item(&mut self, key: &str, item: Value) -> &mut Self {
        match self.layout.get_mut(key) {
            Some(Value::Array(items)) => items.push(item),
            _ => {
                self.layout.insert(key.to_string(), Value::Array(vec![item]));
            }
        }
        self
    }

    pub fn traces(&self) -> &[Value] {
        &self.traces
    }

    pub fn layout(&self) -> &Map<String, Value> {
        &self.layout
    }

    pub fn to_json(&self) -> Value {
        json!({"data": self.traces, "layout": self.layout})
    }

    /// Standalone HTML page rendering the figure.
    pub fn to_html(&self, page_title: &str) -> Result<String, ReportError> {
        // `</` inside inline JSON would close the script element.
        let figure = serde_json::to_string(&self.to_json())?.replace("</", "<\\/");
        let title = escape_html(page_title);
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="figure" style="width:100%;"></div>
<script>
const figure = {figure};
Plotly.newPlot("figure", figure.data, figure.layout, {{"responsive": true}});
</script>
</body>
</html>
"#
        ))
    }

    pub fn write_html(&self, path: &Path, page_title: &str) -> Result<(), ReportError> {
        std::fs::write(path, self.to_html(page_title)?)?;
        tracing::info!(path = %path.display(), traces = self.traces.len(), "wrote dashboard");
        Ok(())
    }
}

impl Default for Figure {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_axes_and_domains() {
        let grid = SubplotGrid::new(2, 2)
            .domain_cell(1, 2)
            .horizontal_spacing(0.1)
            .vertical_spacing(0.1);
        let fig = Figure::with_grid(grid);
        let layout = fig.layout();
        // Three cartesian cells, the pie cell takes no axes.
        assert!(layout.contains_key("xaxis"));
        assert!(layout.contains_key("xaxis2"));
        assert!(layout.contains_key("xaxis3"));
        assert!(!layout.contains_key("xaxis4"));
        assert_eq!(layout["xaxis"]["domain"], json!([0.0, 0.45]));
        assert_eq!(layout["yaxis"]["domain"], json!([0.55, 1.0]));
        assert_eq!(layout["xaxis2"]["domain"], json!([0.0, 0.45]));
        assert_eq!(layout["xaxis3"]["domain"], json!([0.55, 1.0]));
        assert_eq!(layout["yaxis3"]["anchor"], json!("x3"));
    }

    #[test]
    fn test_full_width_row() {
        let grid = SubplotGrid::new(2, 2)
            .full_width_row(1)
            .horizontal_spacing(0.1)
            .vertical_spacing(0.1)
            .titles(["Timeline", "Left", "Right"]);
        let fig = Figure::with_grid(grid);
        let layout = fig.layout();
        assert_eq!(layout["xaxis"]["domain"], json!([0.0, 1.0]));
        assert_eq!(layout["xaxis2"]["domain"], json!([0.0, 0.45]));
        assert_eq!(layout["xaxis3"]["domain"], json!([0.55, 1.0]));
        assert!(!layout.contains_key("xaxis4"));
        let titles: Vec<&str> = layout["annotations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["text"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["<b>Timeline</b>", "<b>Left</b>", "<b>Right</b>"]);
    }

    #[test]
    fn test_row_heights() {
        let grid = SubplotGrid::new(2, 1).row_heights(&[3.0, 1.0]).vertical_spacing(0.0);
        let fig = Figure::with_grid(grid);
        assert_eq!(fig.layout()["yaxis"]["domain"], json!([0.25, 1.0]));
        assert_eq!(fig.layout()["yaxis2"]["domain"], json!([0.0, 0.25]));
    }

    #[test]
    fn test_trace_placement() {
        let grid = SubplotGrid::new(1, 2).domain_cell(1, 1).horizontal_spacing(0.0);
        let mut fig = Figure::with_grid(grid);
        fig.add_trace(json!({"type": "pie"}), 1, 1)
            .add_trace(json!({"type": "bar"}), 1, 2);
        assert_eq!(fig.traces()[0]["domain"]["x"], json!([0.0, 0.5]));
        assert_eq!(fig.traces()[1]["xaxis"], json!("x"));
        assert_eq!(fig.traces()[1]["yaxis"], json!("y"));
    }

    #[test]
    fn test_titles_and_shapes() {
        let grid = SubplotGrid::new(1, 1).titles(["Spike"]);
        let mut fig = Figure::with_grid(grid);
        fig.add_hline(1, 1, 54.4, "red", "baseline")
            .add_vrect(1, 1, 10.0, 20.0, "orange", "window");
        let shapes = fig.layout()["shapes"].as_array().unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0]["xref"], json!("x domain"));
        assert_eq!(shapes[1]["x0"], json!(10.0));
        let annotations = fig.layout()["annotations"].as_array().unwrap();
        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[0]["text"], json!("<b>Spike</b>"));
    }

    #[test]
    fn test_html_escapes_script_close() {
        let mut fig = Figure::new();
        fig.add_trace(json!({"type": "bar", "name": "</script><b>"}), 1, 1);
        let html = fig.to_html("A & B").unwrap();
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("<\\/script>"));
        assert_eq!(html.matches("</script>").count(), 2);
    }
}
