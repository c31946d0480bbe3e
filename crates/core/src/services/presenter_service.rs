use crate::models::display::{
    ChangeTone, DrawdownDisplay, FundCard, FundDetail, FundListing, ListingHeader, PercentDisplay,
    ReturnDisplay, RiskBadge, RiskTone, Sparkline,
};
use crate::models::fund::{FundRecord, NavPoint, RiskLevel};
use crate::models::overlay::PriceOverlay;
use crate::models::settings::BarScale;
use crate::models::taxonomy::{Taxonomy, ALL_TAXONOMY_ID};

/// Title of the listing when no category/sector is selected.
pub const ALL_FUNDS_TITLE: &str = "全部实时行情";

/// Shown instead of a sparkline when there is too little history.
pub const NO_TREND_MESSAGE: &str = "暂无走势数据";

/// Normalized value used for every point of a flat series.
const FLAT_SERIES_LEVEL: f64 = 50.0;

/// Turns fund records into display models.
///
/// Stateless apart from the bar scale. Only ever called for visible funds.
pub struct PresenterService {
    bar_scale: BarScale,
}

impl PresenterService {
    pub fn new(bar_scale: BarScale) -> Self {
        Self { bar_scale }
    }

    pub fn bar_scale(&self) -> BarScale {
        self.bar_scale
    }

    /// List tile, with the live overlay value in place of the baseline change.
    pub fn card(&self, fund: &FundRecord, overlay: &PriceOverlay, is_favorite: bool) -> FundCard {
        FundCard {
            id: fund.id.clone(),
            code: fund.code.clone(),
            name: fund.name.clone(),
            category: fund.category.clone(),
            nav: format_nav(fund.current_nav),
            change: format_percent(overlay.current_change(fund)),
            risk: risk_badge(fund.risk_level),
            tags: fund.tags.clone(),
            is_favorite,
        }
    }

    /// Detail panel for one fund.
    pub fn detail(
        &self,
        fund: &FundRecord,
        overlay: &PriceOverlay,
        is_favorite: bool,
    ) -> FundDetail {
        let horizons = [
            ("近1周", fund.returns.one_week),
            ("近1月", fund.returns.one_month),
            ("近1年", fund.returns.one_year),
            ("近3年", fund.returns.three_year),
        ];
        let returns = horizons
            .into_iter()
            .filter_map(|(horizon, value)| {
                value.map(|v| ReturnDisplay {
                    horizon: horizon.to_string(),
                    value: format_percent(v),
                    bar_width: bar_width(v, self.bar_scale),
                })
            })
            .collect();

        FundDetail {
            card: self.card(fund, overlay, is_favorite),
            description: fund.description.clone(),
            manager: fund.manager.clone(),
            sector: fund.sector.clone(),
            returns,
            drawdown: fund.max_drawdown.map(|d| DrawdownDisplay {
                value: format_percent(d),
                bar_width: bar_width(d, self.bar_scale),
            }),
            holdings: fund.holdings.clone(),
            min_amount: format_amount(fund.min_amount),
            sparkline: sparkline(&fund.history),
        }
    }

    /// Wrap already-built cards; an empty list becomes the no-results state.
    pub fn listing(
        &self,
        taxonomy: &Taxonomy,
        taxonomy_id: &str,
        cards: Vec<FundCard>,
    ) -> FundListing {
        let header = listing_header(taxonomy, taxonomy_id, cards.len());
        if cards.is_empty() {
            FundListing::NoResults { header }
        } else {
            FundListing::Funds { header, cards }
        }
    }
}

impl Default for PresenterService {
    fn default() -> Self {
        Self::new(BarScale::default())
    }
}

/// Header for the grid: fixed title for "all", else the entry's display name.
pub fn listing_header(taxonomy: &Taxonomy, taxonomy_id: &str, count: usize) -> ListingHeader {
    let title = if taxonomy_id == ALL_TAXONOMY_ID {
        ALL_FUNDS_TITLE.to_string()
    } else {
        taxonomy.display_name(taxonomy_id).to_string()
    };
    ListingHeader { title, count }
}

/// Rising for zero and above, falling below zero. The sign alone decides.
pub fn change_tone(value: f64) -> ChangeTone {
    if value >= 0.0 {
        ChangeTone::Rising
    } else {
        ChangeTone::Falling
    }
}

/// Two decimals, `%` suffix, explicit `+` for values >= 0.
pub fn format_percent(value: f64) -> PercentDisplay {
    // -0.0 compares equal to zero; print it as +0.00%.
    let value = if value == 0.0 { 0.0 } else { value };
    let tone = change_tone(value);
    let sign = if tone == ChangeTone::Rising { "+" } else { "" };
    PercentDisplay {
        value,
        text: format!("{sign}{value:.2}%"),
        tone,
    }
}

/// Four decimals, no sign.
pub fn format_nav(nav: f64) -> String {
    format!("{nav:.4}")
}

/// Binary treatment: any level whose label carries the "high" token (中高, 高).
pub fn risk_tone(level: RiskLevel) -> RiskTone {
    if level.label().contains('高') {
        RiskTone::High
    } else {
        RiskTone::Normal
    }
}

pub fn risk_badge(level: RiskLevel) -> RiskBadge {
    RiskBadge {
        level,
        label: level.label().to_string(),
        tone: risk_tone(level),
    }
}

/// `min(100, |value| * factor + offset)`, never below 0. NaN input gives 0.
pub fn bar_width(value: f64, scale: BarScale) -> f64 {
    let width = value.abs() * scale.factor + scale.offset;
    if width.is_nan() {
        return 0.0;
    }
    width.clamp(0.0, 100.0)
}

/// Normalize a series to [0, 100]. A flat series maps every point to the mid line.
/// `None` for fewer than two points.
pub fn normalize_series(values: &[f64]) -> Option<Vec<f64>> {
    if values.len() < 2 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range == 0.0 || !range.is_finite() {
        return Some(vec![FLAT_SERIES_LEVEL; values.len()]);
    }
    Some(values.iter().map(|v| (v - min) / range * 100.0).collect())
}

pub fn sparkline(history: &[NavPoint]) -> Sparkline {
    let navs: Vec<f64> = history.iter().map(|p| p.nav).collect();
    match normalize_series(&navs) {
        Some(values) => Sparkline::Points { values },
        None => Sparkline::Placeholder {
            message: NO_TREND_MESSAGE.to_string(),
        },
    }
}

/// Yuan amount with thousands separators: `¥1,000`, `¥12.50`.
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    if frac == 0 {
        format!("{sign}¥{grouped}")
    } else {
        format!("{sign}¥{grouped}.{frac:02}")
    }
}
