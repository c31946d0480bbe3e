use serde::{Deserialize, Serialize};

use super::fund::{Holding, RiskLevel};

/// Color palette for a signed value.
///
/// Source-market convention: rising is shown in a warm color (red),
/// falling in a cool color (green).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTone {
    /// Value >= 0. Warm palette.
    Rising,
    /// Value < 0. Cool palette.
    Falling,
}

/// A formatted signed percentage, e.g. `+1.88%` / `-0.24%`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentDisplay {
    pub value: f64,
    pub text: String,
    pub tone: ChangeTone,
}

/// Visual treatment of the risk badge. Binary even though the data has five levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTone {
    High,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBadge {
    pub level: RiskLevel,
    pub label: String,
    pub tone: RiskTone,
}

/// Mini trend chart data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Sparkline {
    /// Normalized points in [0, 100], oldest first.
    Points { values: Vec<f64> },
    /// Fewer than two history points; render the message instead of a chart.
    Placeholder { message: String },
}

impl Sparkline {
    pub fn points(&self) -> Option<&[f64]> {
        match self {
            Sparkline::Points { values } => Some(values),
            Sparkline::Placeholder { .. } => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Sparkline::Placeholder { .. })
    }
}

/// List tile for one visible fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundCard {
    pub id: String,
    pub code: String,
    pub name: String,
    pub category: String,
    pub nav: String,
    pub change: PercentDisplay,
    pub risk: RiskBadge,
    pub tags: Vec<String>,
    pub is_favorite: bool,
}

/// A trailing-return cell in the detail panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnDisplay {
    pub horizon: String,
    pub value: PercentDisplay,
    /// Bar length in percent of the available width, within [0, 100].
    pub bar_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownDisplay {
    pub value: PercentDisplay,
    pub bar_width: f64,
}

/// Everything the detail panel shows for one fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundDetail {
    pub card: FundCard,
    pub description: String,
    pub manager: String,
    pub sector: Option<String>,
    pub returns: Vec<ReturnDisplay>,
    pub drawdown: Option<DrawdownDisplay>,
    pub holdings: Vec<Holding>,
    pub min_amount: String,
    pub sparkline: Sparkline,
}

/// Header above the fund grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingHeader {
    pub title: String,
    pub count: usize,
}

/// Result of rendering the visible fund list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum FundListing {
    Funds {
        header: ListingHeader,
        cards: Vec<FundCard>,
    },
    /// Filters matched nothing. A valid terminal state, not an error.
    NoResults { header: ListingHeader },
}

impl FundListing {
    pub fn header(&self) -> &ListingHeader {
        match self {
            FundListing::Funds { header, .. } | FundListing::NoResults { header } => header,
        }
    }

    pub fn cards(&self) -> &[FundCard] {
        match self {
            FundListing::Funds { cards, .. } => cards,
            FundListing::NoResults { .. } => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FundListing::NoResults { .. })
    }
}
