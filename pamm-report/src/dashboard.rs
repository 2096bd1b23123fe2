use pamm_dataset::Dataset;
use pamm_stats::activity::{
    activity_series, hourly_activity, kind_counts, protocol_share, time_series_by_protocol,
    top_validators_by_events, BlockThroughput,
};
use pamm_stats::clients::{ClientComparison, ClientMetrics};
use pamm_stats::spike::{SlotPoint, SpikeAnalysis};
use pamm_types::constants::{
    DEFAULT_ROLLING_WINDOW, DEFAULT_SAMPLE_STRIDE, DEFAULT_TIME_BIN_SECS, PROTOCOL_TIME_BIN_SECS,
    TOP_VALIDATORS_PANEL, VALIDATOR_LABEL_CHARS,
};
use pamm_types::time::format_timestamp;
use pamm_types::ClientType;
use serde_json::{json, Value};

use crate::error::ReportError;
use crate::figure::{Figure, SubplotGrid};
use crate::format::{format_count, format_signed_pct, short_id};

const KIND_COLORS: [&str; 2] = ["#457B9D", "#E63946"];
const THROUGHPUT_COLOR: &str = "#E63946";
const VALIDATOR_COLOR: &str = "#06AED5";
const HOURLY_COLOR: &str = "#F77F00";
const PEAK_TEXT_COLOR: &str = "#8B0000";
const SPIKE_SHADE: &str = "rgba(255, 0, 0, 0.6)";

pub fn client_color(client: ClientType) -> &'static str {
    match client {
        ClientType::JitoSolana => "#009DFF",
        ClientType::Harmonic => "#227B52",
        ClientType::Other => "#888888",
    }
}

/// Knobs of the dataset overview dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewOptions {
    pub bin_secs: i64,
    pub rolling_window: usize,
    pub sample_stride: usize,
    pub top_validators: usize,
}

impl Default for OverviewOptions {
    fn default() -> Self {
        Self {
            bin_secs: DEFAULT_TIME_BIN_SECS,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            top_validators: TOP_VALIDATORS_PANEL,
        }
    }
}

/// File name of a protocol dashboard, e.g. `dashboard_humidifi.html`.
pub fn protocol_dashboard_file(protocol: &str) -> String {
    format!("dashboard_{}.html", protocol.to_lowercase())
}

fn times(bins: impl Iterator<Item = i64>) -> Vec<String> {
    bins.map(format_timestamp).collect()
}

fn kind_bar(events: &[pamm_types::AmmEvent]) -> Value {
    let counts = kind_counts(events);
    let labels: Vec<&str> = counts.iter().map(|(k, _)| k.as_str()).collect();
    let values: Vec<u64> = counts.iter().map(|(_, c)| *c).collect();
    let colors: Vec<&str> = (0..counts.len()).map(|i| KIND_COLORS[i % KIND_COLORS.len()]).collect();
    json!({
        "type": "bar",
        "x": labels,
        "y": values,
        "marker": {"color": colors},
        "text": values,
        "texttemplate": "%{text:,}",
        "textposition": "outside",
        "showlegend": false,
        "hovertemplate": "<b>%{x}</b><br>Count: %{y:,}<extra></extra>",
    })
}

fn top_validator_bar(events: &[pamm_types::AmmEvent], n: usize) -> Value {
    // Reversed so the busiest validator is drawn at the top.
    let top: Vec<(String, u64)> = top_validators_by_events(events, n).into_iter().rev().collect();
    let labels: Vec<String> = top
        .iter()
        .map(|(v, _)| format!("{}...", short_id(v, VALIDATOR_LABEL_CHARS)))
        .collect();
    let values: Vec<u64> = top.iter().map(|(_, c)| *c).collect();
    json!({
        "type": "bar",
        "orientation": "h",
        "x": values,
        "y": labels,
        "marker": {"color": VALIDATOR_COLOR},
        "text": values,
        "texttemplate": "%{text:,}",
        "textposition": "outside",
        "showlegend": false,
        "hovertemplate": "<b>%{y}</b><br>Events: %{x:,}<extra></extra>",
    })
}

/// Five-panel overview of the whole dataset.
pub fn overview_dashboard(dataset: &Dataset, opts: &OverviewOptions) -> Result<Figure, ReportError> {
    dataset.ensure_not_empty()?;
    let events = dataset.events();

    let grid = SubplotGrid::new(3, 2)
        .full_width_row(1)
        .domain_cell(2, 1)
        .row_heights(&[0.35, 0.35, 0.3])
        .vertical_spacing(0.12)
        .horizontal_spacing(0.15)
        .titles([
            format!("AMM Activity Timeline ({}-min intervals)", opts.bin_secs / 60),
            "Protocol Market Share".to_string(),
            "Event Type Distribution".to_string(),
            "Transactions Per Block (Rolling Avg)".to_string(),
            format!("Top {} Most Active Validators", opts.top_validators),
        ]);
    let mut fig = Figure::with_grid(grid);

    for (protocol, series) in time_series_by_protocol(events, opts.bin_secs)? {
        let counts: Vec<u64> = series.values().copied().collect();
        fig.add_trace(
            json!({
                "type": "scatter",
                "mode": "lines",
                "name": protocol,
                "stackgroup": "one",
                "x": times(series.keys().copied()),
                "y": counts,
                "hovertemplate": "<b>%{fullData.name}</b><br>Time: %{x}<br>Events: %{y}<extra></extra>",
            }),
            1,
            1,
        );
    }

    let shares = protocol_share(events);
    fig.add_trace(
        json!({
            "type": "pie",
            "labels": shares.iter().map(|s| s.label.as_str()).collect::<Vec<_>>(),
            "values": shares.iter().map(|s| s.count).collect::<Vec<_>>(),
            "hole": 0.4,
            "textinfo": "label+percent",
            "showlegend": false,
            "hovertemplate": "<b>%{label}</b><br>Events: %{value:,}<br>Share: %{percent}<extra></extra>",
        }),
        2,
        1,
    );

    fig.add_trace(kind_bar(events), 2, 2);

    let throughput = BlockThroughput::compute(events, opts.rolling_window)?;
    let sampled = throughput.sampled(opts.sample_stride);
    fig.add_trace(
        json!({
            "type": "scatter",
            "mode": "lines",
            "name": format!("{}-block MA", opts.rolling_window),
            "x": sampled.iter().map(|(slot, _)| *slot).collect::<Vec<_>>(),
            "y": sampled.iter().map(|(_, avg)| *avg).collect::<Vec<_>>(),
            "line": {"color": THROUGHPUT_COLOR, "width": 2},
            "showlegend": false,
            "hovertemplate": "Block: %{x}<br>Avg Tx: %{y:.1f}<extra></extra>",
        }),
        3,
        1,
    );

    fig.add_trace(top_validator_bar(events, opts.top_validators), 3, 2);

    fig.axis_titles(1, 1, "Time", "Events")
        .axis_titles(2, 2, "", "Count")
        .axis_titles(3, 1, "Block Number", "Tx Count")
        .axis_titles(3, 2, "Event Count", "");

    let range = dataset
        .time_range()
        .map(|(start, end)| format!("{} to {}", format_timestamp(start), format_timestamp(end)))
        .unwrap_or_default();
    fig.update_layout(
        "title",
        json!({
            "text": format!(
                "<b>PropAMM Dataset Analysis Dashboard</b><br><sub>Data Range: {range} | Total Events: {}</sub>",
                format_count(dataset.len() as u64)
            ),
            "x": 0.5,
            "xanchor": "center",
            "font": {"size": 20},
        }),
    )
    .update_layout("height", json!(1400))
    .update_layout("showlegend", json!(true))
    .update_layout(
        "legend",
        json!({"orientation": "h", "yanchor": "bottom", "y": 1.02, "xanchor": "center", "x": 0.5}),
    );
    Ok(fig)
}

/// Four-panel dashboard for a single protocol.
///
/// Fails with the list of available protocols when `protocol` has no events.
pub fn protocol_dashboard(dataset: &Dataset, protocol: &str, top_n: usize) -> Result<Figure, ReportError> {
    let subset = dataset.filter_protocol(protocol)?;
    let events = subset.events();

    let grid = SubplotGrid::new(3, 2)
        .full_width_row(1)
        .full_width_row(3)
        .row_heights(&[0.4, 0.3, 0.3])
        .vertical_spacing(0.1)
        .titles([
            format!("{protocol} Activity Over Time (1-min intervals)"),
            format!("{protocol} Event Type Distribution"),
            format!("{protocol} Hourly Activity Pattern"),
            format!("Top {top_n} Most Active Validators for {protocol}"),
        ]);
    let mut fig = Figure::with_grid(grid);

    let activity = activity_series(events, PROTOCOL_TIME_BIN_SECS)?;
    fig.add_trace(
        json!({
            "type": "scatter",
            "mode": "lines",
            "fill": "tozeroy",
            "name": "Events",
            "x": times(activity.keys().copied()),
            "y": activity.values().copied().collect::<Vec<_>>(),
            "line": {"color": VALIDATOR_COLOR, "width": 2},
            "hovertemplate": "Time: %{x}<br>Events: %{y}<extra></extra>",
        }),
        1,
        1,
    );

    fig.add_trace(kind_bar(events), 2, 1);

    let hourly = hourly_activity(events);
    fig.add_trace(
        json!({
            "type": "bar",
            "x": hourly.keys().copied().collect::<Vec<_>>(),
            "y": hourly.values().copied().collect::<Vec<_>>(),
            "marker": {"color": HOURLY_COLOR},
            "showlegend": false,
        }),
        2,
        2,
    );

    fig.add_trace(top_validator_bar(events, top_n), 3, 1);

    fig.axis_titles(1, 1, "Time", "Events")
        .axis_titles(2, 1, "", "Count")
        .axis_titles(2, 2, "Hour of Day", "Events")
        .axis_titles(3, 1, "Event Count", "");
    fig.update_layout("title", json!(format!("<b>{protocol} Protocol Dashboard</b>")))
        .update_layout("height", json!(1100))
        .update_layout("showlegend", json!(false));

    tracing::debug!(protocol, events = events.len(), "built protocol dashboard");
    Ok(fig)
}

fn percentile_annotation(metrics: &ClientMetrics, position: usize) -> Value {
    let p = &metrics.percentiles;
    let text = format!(
        "<b>{}</b><br>p99: {:.1}<br>p95: {:.1}<br>p75: {:.1}<br>p50: {:.1}<br>p25: {:.1}<br>mean: {:.1}",
        metrics.client, p.p99, p.p95, p.p75, p.p50, p.p25, metrics.efficiency.mean
    );
    json!({
        "x": position,
        "y": p.p99 + 10.0,
        "xref": "x2",
        "yref": "y2",
        "text": text,
        "showarrow": false,
        "font": {"size": 10, "family": "monospace"},
        "align": "left",
        "xanchor": "left",
        "bgcolor": "rgba(255, 255, 255, 0.9)",
        "bordercolor": client_color(metrics.client),
        "borderwidth": 2,
        "borderpad": 6,
    })
}

fn scatter_points(name: &str, points: &[&SlotPoint], color: &str, show_legend: bool) -> Value {
    json!({
        "type": "scatter",
        "mode": "markers",
        "name": name,
        "x": points.iter().map(|p| p.slot).collect::<Vec<_>>(),
        "y": points.iter().map(|p| p.events).collect::<Vec<_>>(),
        "marker": {"size": 4, "color": color},
        "showlegend": show_legend,
        "hovertemplate": format!("<b>{name}</b><br>Slot: %{{x}}<br>Events: %{{y}}<extra></extra>"),
    })
}

/// Four-panel Jito-solana vs Harmonic block packing dashboard.
pub fn client_dashboard(cmp: &ClientComparison, spike: &SpikeAnalysis) -> Figure {
    let window = spike.config.window.label();
    let spike_title = match (
        spike.client(ClientType::Harmonic),
        spike.client(ClientType::JitoSolana),
    ) {
        (Some(h), Some(j)) => format!(
            "Spike Analysis: {window} Window (Harmonic {:.2} vs Jito {:.2} avg)",
            h.avg, j.avg
        ),
        _ => format!("Spike Analysis: {window} Window"),
    };
    let grid = SubplotGrid::new(4, 1)
        .row_heights(&[0.25, 0.20, 0.25, 0.30])
        .vertical_spacing(0.10)
        .titles([
            "Raw Data: Block Packing Efficiency by Slot (All Data Points)".to_string(),
            "Statistical Comparison: Events per Slot with Key Percentiles".to_string(),
            format!("Time Series: Average Events per Slot ({}-minute bins)", cmp.bin_secs / 60),
            spike_title,
        ]);
    let mut fig = Figure::with_grid(grid);

    let clients = [&cmp.jito, &cmp.harmonic];

    for metrics in clients {
        let name = metrics.client.as_str();
        fig.add_trace(
            json!({
                "type": "scatter",
                "mode": "markers",
                "name": name,
                "legendgroup": name,
                "x": metrics.slot_events.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
                "y": metrics.slot_events.iter().map(|(_, e)| *e).collect::<Vec<_>>(),
                "marker": {"size": 4, "color": client_color(metrics.client), "opacity": 0.6},
                "hovertemplate": "<b>%{fullData.name}</b><br>Slot: %{x}<br>Events: %{y}<extra></extra>",
            }),
            1,
            1,
        );
    }

    for (position, metrics) in clients.iter().enumerate() {
        let name = metrics.client.as_str();
        fig.add_trace(
            json!({
                "type": "box",
                "name": name,
                "legendgroup": name,
                "showlegend": false,
                "y": metrics.slot_event_values(),
                "marker": {"color": client_color(metrics.client)},
                "boxmean": "sd",
                "boxpoints": "outliers",
                "hovertemplate": "<b>%{fullData.name}</b><br>Value: %{y}<extra></extra>",
            }),
            2,
            1,
        );
        fig.add_annotation(percentile_annotation(metrics, position));
    }

    for metrics in clients {
        let name = metrics.client.as_str();
        fig.add_trace(
            json!({
                "type": "scatter",
                "mode": "lines",
                "name": name,
                "legendgroup": name,
                "showlegend": false,
                "connectgaps": false,
                "x": times(metrics.efficiency_series.keys().copied()),
                "y": metrics.efficiency_series.values().copied().collect::<Vec<_>>(),
                "line": {"width": 2, "color": client_color(metrics.client)},
                "hovertemplate": "<b>%{fullData.name}</b><br>Time: %{x}<br>Avg Events/Slot: %{y:.2f}<extra></extra>",
            }),
            3,
            1,
        );
    }

    add_spike_panel(&mut fig, spike);

    fig.axis_titles(1, 1, "Slot Number", "Events per Slot")
        .axis_titles(2, 1, "Client Type", "Events per Slot")
        .axis_titles(3, 1, &format!("Time ({}-min bins)", cmp.bin_secs / 60), "Avg Events per Slot")
        .axis_titles(4, 1, "Slot Number", "Events per Slot");
    fig.update_layout("height", json!(1400))
        .update_layout("showlegend", json!(true))
        .update_layout("barmode", json!("overlay"))
        .update_layout("hovermode", json!("closest"))
        .update_layout(
            "title",
            json!({
                "text": "<b>Validator Client Performance: Jito-solana vs Harmonic</b><br>\
                         <sub>Panel 1: Raw data | Panel 2: Statistical comparison | \
                         Panel 3: Time series | Panel 4: Spike window</sub>",
                "font": {"size": 18},
            }),
        );
    fig
}

fn add_spike_panel(fig: &mut Figure, spike: &SpikeAnalysis) {
    for client in ClientType::COMPARED {
        let Some(points) = spike.context.get(&client) else {
            continue;
        };
        let regular: Vec<&SlotPoint> = points.iter().filter(|p| !spike.is_peak(p.slot)).collect();
        fig.add_trace(scatter_points(client.as_str(), &regular, client_color(client), false), 4, 1);
    }

    let peaks: Vec<(ClientType, &SlotPoint)> = ClientType::COMPARED
        .into_iter()
        .filter_map(|c| spike.context.get(&c).map(|pts| (c, pts)))
        .flat_map(|(c, pts)| pts.iter().filter(|p| spike.is_peak(p.slot)).map(move |p| (c, p)))
        .collect();
    if !peaks.is_empty() {
        fig.add_trace(
            json!({
                "type": "scatter",
                "mode": "markers+text",
                "name": "Peak Slots",
                "x": peaks.iter().map(|(_, p)| p.slot).collect::<Vec<_>>(),
                "y": peaks.iter().map(|(_, p)| p.events).collect::<Vec<_>>(),
                "text": peaks.iter().map(|(_, p)| p.events.to_string()).collect::<Vec<_>>(),
                "textposition": "top center",
                "textfont": {"size": 10, "color": PEAK_TEXT_COLOR, "family": "monospace"},
                "marker": {
                    "size": 4,
                    "color": peaks.iter().map(|(c, _)| client_color(*c)).collect::<Vec<_>>(),
                },
                "hovertemplate": "<b>PEAK SLOT</b><br>Slot: %{x}<br>Events: %{y}<extra></extra>",
            }),
            4,
            1,
        );
    }

    for client in [ClientType::Harmonic, ClientType::JitoSolana] {
        if let Some(s) = spike.client(client) {
            let label = format!("{} baseline: {:.2}", short_client(client), s.baseline);
            fig.add_hline(4, 1, s.baseline, client_color(client), &label);
        }
    }

    if let Some((first, last)) = spike.slot_span {
        fig.add_vrect(4, 1, first as f64, last as f64, SPIKE_SHADE, "Spike Window");
    }

    for (client, x) in [(ClientType::Harmonic, 0.25), (ClientType::JitoSolana, 0.75)] {
        let Some(s) = spike.client(client) else {
            continue;
        };
        let change = s.change_pct().map(format_signed_pct).unwrap_or_else(|| "n/a".to_string());
        fig.add_annotation(json!({
            "x": x,
            "y": 0.95,
            "xref": "x4 domain",
            "yref": "y4 domain",
            "text": format!(
                "<b>{client} Spike</b><br>Avg: {:.1}<br>Blocks: {}<br>vs baseline: {change}",
                s.avg, s.blocks
            ),
            "showarrow": false,
            "font": {"size": 10, "family": "monospace"},
            "align": "left",
            "bgcolor": "rgba(255, 255, 255, 0.9)",
            "bordercolor": client_color(client),
            "borderwidth": 2,
            "borderpad": 6,
        }));
    }
}

fn short_client(client: ClientType) -> &'static str {
    match client {
        ClientType::JitoSolana => "Jito",
        other => other.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pamm_dataset::DatasetError;
    use pamm_stats::spike::SpikeConfig;
    use pamm_types::{AmmEvent, ClientMapping, EventKind, TimeWindow};

    fn ev(slot: u64, time: i64, validator: &str, amm: Option<&str>, kind: EventKind) -> AmmEvent {
        AmmEvent {
            slot,
            time,
            validator: validator.into(),
            amm: amm.map(str::to_string),
            kind,
        }
    }

    fn dataset() -> Dataset {
        let mut events = Vec::new();
        for slot in 0..30u64 {
            let validator = if slot % 2 == 0 { "JitoValidatorAAAAAAAA" } else { "HarmonicValidatorBBBB" };
            let amm = if slot % 3 == 0 { Some("HumidiFi") } else if slot % 3 == 1 { Some("ZeroFi") } else { None };
            for i in 0..=(slot % 4) {
                let kind = if i % 2 == 0 { EventKind::Oracle } else { EventKind::Trade };
                events.push(ev(slot, 1_767_801_600 + slot as i64 * 60, validator, amm, kind));
            }
        }
        Dataset::from_events(events, "memory")
    }

    fn mapping() -> ClientMapping {
        let mut m = ClientMapping::new();
        m.assign("JitoValidatorAAAAAAAA", ClientType::JitoSolana);
        m.assign("HarmonicValidatorBBBB", ClientType::Harmonic);
        m
    }

    #[test]
    fn test_overview_panels() {
        let opts = OverviewOptions {
            rolling_window: 3,
            sample_stride: 2,
            ..Default::default()
        };
        let fig = overview_dashboard(&dataset(), &opts).unwrap();
        let types: Vec<&str> = fig.traces().iter().map(|t| t["type"].as_str().unwrap()).collect();
        // Protocol series (HumidiFi, Unknown, ZeroFi), pie, kinds, throughput, validators.
        assert_eq!(types, vec!["scatter", "scatter", "scatter", "pie", "bar", "scatter", "bar"]);

        let pie = &fig.traces()[3];
        assert!(!pie["labels"].as_array().unwrap().contains(&json!("Unknown")));
        assert!(pie.get("domain").is_some());

        let validators = &fig.traces()[6];
        assert_eq!(validators["y"][0], json!("JitoVali..."));
        assert_eq!(validators["y"][1], json!("Harmonic..."));
        assert_eq!(fig.traces()[5]["x"].as_array().unwrap().len(), 15);
    }

    #[test]
    fn test_protocol_dashboard() {
        let fig = protocol_dashboard(&dataset(), "HumidiFi", 10).unwrap();
        assert_eq!(fig.traces().len(), 4);
        assert_eq!(fig.layout()["title"], json!("<b>HumidiFi Protocol Dashboard</b>"));
        assert_eq!(protocol_dashboard_file("HumidiFi"), "dashboard_humidifi.html");
    }

    #[test]
    fn test_unknown_protocol_lists_available() {
        let err = protocol_dashboard(&dataset(), "Nope", 10).unwrap_err();
        match err {
            ReportError::Dataset(DatasetError::UnknownProtocol { available, .. }) => {
                assert_eq!(available, vec!["HumidiFi".to_string(), "ZeroFi".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_client_dashboard() {
        let data = dataset();
        let cmp = ClientComparison::compute(data.events(), &mapping(), 300).unwrap();
        let config = SpikeConfig::new(
            TimeWindow::new(1_767_801_600 + 600, 1_767_801_600 + 900).unwrap(),
            TimeWindow::new(1_767_801_600, 1_767_801_600 + 1800).unwrap(),
            2,
        )
        .unwrap();
        let spike = SpikeAnalysis::compute(data.events(), &mapping(), &cmp, config);
        let fig = client_dashboard(&cmp, &spike);

        let names: Vec<&str> = fig.traces().iter().filter_map(|t| t["name"].as_str()).collect();
        assert!(names.contains(&"Peak Slots"));
        assert_eq!(fig.traces().iter().filter(|t| t["type"] == "box").count(), 2);

        let shapes = fig.layout()["shapes"].as_array().unwrap();
        // Two baselines and the shaded window.
        assert_eq!(shapes.len(), 3);
        let html = fig.to_html("clients").unwrap();
        assert!(html.contains("Spike Window"));
    }
}
