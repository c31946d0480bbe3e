use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ordinal risk rating of a fund, lowest to highest.
///
/// Serialized as the label used by the source market (低 / 中低 / 中 / 中高 / 高),
/// so catalog snapshots stay human-readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "低")]
    Low,
    #[serde(rename = "中低")]
    LowMedium,
    #[serde(rename = "中")]
    Medium,
    #[serde(rename = "中高")]
    MediumHigh,
    #[serde(rename = "高")]
    High,
}

impl RiskLevel {
    /// All five levels in ascending order.
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Low,
        RiskLevel::LowMedium,
        RiskLevel::Medium,
        RiskLevel::MediumHigh,
        RiskLevel::High,
    ];

    /// Display label of this level.
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "低",
            RiskLevel::LowMedium => "中低",
            RiskLevel::Medium => "中",
            RiskLevel::MediumHigh => "中高",
            RiskLevel::High => "高",
        }
    }

    /// Parse a display label back into a level.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.label() == label.trim())
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One position in a fund's published holdings.
/// `weight` is a display string ("8.52%"), never validated or summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub name: String,
    pub weight: String,
}

impl Holding {
    pub fn new(name: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: weight.into(),
        }
    }
}

/// A single historical NAV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

/// Trailing returns in percent. Any horizon may be absent depending on the data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailingReturns {
    pub one_week: Option<f64>,
    pub one_month: Option<f64>,
    pub one_year: Option<f64>,
    pub three_year: Option<f64>,
}

/// A mutual fund as loaded into the catalog. Immutable for the session.
///
/// Favorites and the simulated price overlay refer to a record by `id` only;
/// neither ever mutates the record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundRecord {
    /// Unique within one catalog snapshot.
    pub id: String,

    /// Ticker code, e.g. "005827". Not guaranteed unique across data sources.
    pub code: String,

    pub name: String,

    /// Fund-type tag (混合型, 债券型, etf, ...).
    pub category: String,

    /// Thematic sector tag. Some catalogs don't carry one.
    #[serde(default)]
    pub sector: Option<String>,

    pub manager: String,

    /// Current net asset value per unit. Always > 0.
    pub current_nav: f64,

    /// Baseline daily change in percent, as published.
    pub change_percent: f64,

    #[serde(default)]
    pub returns: TrailingReturns,

    /// Maximum drawdown in percent (negative).
    #[serde(default)]
    pub max_drawdown: Option<f64>,

    pub risk_level: RiskLevel,

    #[serde(default)]
    pub holdings: Vec<Holding>,

    #[serde(default)]
    pub description: String,

    /// Minimum subscription amount in yuan.
    #[serde(default)]
    pub min_amount: f64,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Ordered oldest-first. May be empty.
    #[serde(default)]
    pub history: Vec<NavPoint>,
}

impl FundRecord {
    /// Minimal constructor; optional fields start empty and are filled with the `with_*` helpers.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        manager: impl Into<String>,
        current_nav: f64,
        change_percent: f64,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            category: category.into(),
            sector: None,
            manager: manager.into(),
            current_nav,
            change_percent,
            returns: TrailingReturns::default(),
            max_drawdown: None,
            risk_level,
            holdings: Vec::new(),
            description: String::new(),
            min_amount: 0.0,
            tags: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_returns(mut self, returns: TrailingReturns) -> Self {
        self.returns = returns;
        self
    }

    pub fn with_max_drawdown(mut self, drawdown: f64) -> Self {
        self.max_drawdown = Some(drawdown);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_min_amount(mut self, amount: f64) -> Self {
        self.min_amount = amount;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_holdings(mut self, holdings: Vec<Holding>) -> Self {
        self.holdings = holdings;
        self
    }

    pub fn with_history(mut self, history: Vec<NavPoint>) -> Self {
        self.history = history;
        self
    }

    /// Sector if present, otherwise the category. Used wherever a single
    /// thematic label is needed (e.g. narrative prompts).
    pub fn sector_or_category(&self) -> &str {
        self.sector.as_deref().unwrap_or(&self.category)
    }
}
