//! Plotly-compatible figure specifications.
//!
//! The structs serialize to the `{data: [...], layout: {...}}` shape that
//! `Plotly.react` accepts; optional attributes are omitted when unset.

use serde::Serialize;

pub const CHART_HEIGHT: u32 = 400;
pub const DATA_BACKGROUND: &str = "rgba(240, 240, 240, 0.8)";
pub const PLACEHOLDER_BACKGROUND: &str = "white";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// A figure with no series, only a title carrying `message`.
    pub fn placeholder(message: &str) -> Self {
        let hidden = Axis {
            title: None,
            showgrid: Some(false),
            zeroline: Some(false),
            visible: Some(false),
        };
        Self {
            data: Vec::new(),
            layout: Layout {
                title: Title::new(message),
                height: CHART_HEIGHT,
                plot_bgcolor: PLACEHOLDER_BACKGROUND.to_string(),
                xaxis: Some(hidden.clone()),
                yaxis: Some(hidden),
            },
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.data.is_empty()
    }

    pub fn title(&self) -> &str {
        &self.layout.title.text
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(ScatterTrace),
    Bar(BarTrace),
    Pie(PieTrace),
    Box(BoxTrace),
}

impl Trace {
    pub fn name(&self) -> Option<&str> {
        match self {
            Trace::Scatter(t) => Some(&t.name),
            Trace::Bar(t) => Some(&t.name),
            Trace::Pie(_) => None,
            Trace::Box(t) => Some(&t.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterTrace {
    pub name: String,
    pub mode: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarTrace {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieTrace {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub textposition: String,
    pub textinfo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxTrace {
    pub name: String,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizemode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizeref: Option<f64>,
}

impl Marker {
    pub fn colored(color: &str) -> Self {
        Self {
            color: Some(color.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub height: u32,
    pub plot_bgcolor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
}

impl Layout {
    /// Standard layout of a data chart.
    pub fn titled(title: &str, x_title: Option<&str>, y_title: Option<&str>) -> Self {
        Self {
            title: Title::new(title),
            height: CHART_HEIGHT,
            plot_bgcolor: DATA_BACKGROUND.to_string(),
            xaxis: x_title.map(Axis::titled),
            yaxis: y_title.map(Axis::titled),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zeroline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl Axis {
    pub fn titled(text: &str) -> Self {
        Self {
            title: Some(Title::new(text)),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholder_serializes_without_traces() {
        let fig = Figure::placeholder("No data");
        let v = serde_json::to_value(&fig).unwrap();
        assert_eq!(v["data"], json!([]));
        assert_eq!(v["layout"]["title"]["text"], "No data");
        assert_eq!(v["layout"]["plot_bgcolor"], "white");
        assert_eq!(v["layout"]["xaxis"]["visible"], false);
        assert!(v["layout"]["xaxis"].get("title").is_none());
    }

    #[test]
    fn traces_carry_plotly_type_tag() {
        let bar = Trace::Bar(BarTrace {
            name: "Done".to_string(),
            x: vec!["Done".to_string()],
            y: vec![1.0],
            marker: Some(Marker::colored("#8dd3c7")),
        });
        let v = serde_json::to_value(&bar).unwrap();
        assert_eq!(v["type"], "bar");
        assert_eq!(v["marker"]["color"], "#8dd3c7");
        assert!(v["marker"].get("size").is_none());

        let pie = Trace::Pie(PieTrace {
            labels: vec![],
            values: vec![],
            textposition: "inside".to_string(),
            textinfo: "percent+label".to_string(),
        });
        assert_eq!(serde_json::to_value(&pie).unwrap()["type"], "pie");
    }
}
