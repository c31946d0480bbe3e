use chrono::{Duration, NaiveDate};
use rand::Rng;

use crate::models::fund::{FundRecord, Holding, NavPoint, RiskLevel, TrailingReturns};

use super::builtin::sector_names;

/// Size of the demo tail appended after the curated funds.
pub const DEFAULT_SYNTHETIC_COUNT: usize = 200;

/// Length of the generated NAV history, in days.
pub const SYNTHETIC_HISTORY_DAYS: usize = 30;

/// First code handed out to generated funds; keeps them clear of the curated `0000xx` codes.
const FIRST_SYNTHETIC_CODE: usize = 100_001;

const COMPANIES: [&str; 10] = [
    "易方达", "华夏", "广发", "南方", "嘉实", "富国", "汇添富", "招商", "博时", "鹏华",
];

const MANAGERS: [&str; 12] = [
    "张坤", "刘彦春", "葛兰", "谢治宇", "朱少醒", "萧楠", "周蔚文", "胡昕炜", "傅鹏博", "王宗合",
    "杨锐文", "蔡嵩松",
];

const CATEGORIES: [(&str, &str); 5] = [
    ("混合型", "混合"),
    ("etf", "ETF"),
    ("index", "指数"),
    ("债券型", "债券"),
    ("货币市场", "货币"),
];

const HOLDING_POOL: [&str; 12] = [
    "贵州茅台", "宁德时代", "招商银行", "中国平安", "迈瑞医疗", "隆基绿能", "五粮液", "美的集团",
    "中芯国际", "比亚迪", "长江电力", "紫金矿业",
];

const TAG_POOL: [&str; 8] = [
    "定投优选", "长期持有", "高弹性", "稳健", "低费率", "明星经理", "热门赛道", "分红",
];

/// Generate `count` demo funds by cycling through the sector, manager and
/// company pools and drawing every numeric field from `rng` once.
///
/// Ids are `syn-0001`, `syn-0002`, ...; history ends on `end_date`.
pub fn generate_synthetic_tail<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    end_date: NaiveDate,
) -> Vec<FundRecord> {
    let sectors = sector_names();
    (0..count)
        .map(|i| generate_one(&mut *rng, i, &sectors, end_date))
        .collect()
}

fn generate_one<R: Rng + ?Sized>(
    rng: &mut R,
    index: usize,
    sectors: &[String],
    end_date: NaiveDate,
) -> FundRecord {
    let sector = &sectors[index % sectors.len()];
    let company = COMPANIES[index % COMPANIES.len()];
    let manager = MANAGERS[index % MANAGERS.len()];
    let (category, suffix) = CATEGORIES[index % CATEGORIES.len()];

    let nav = round_to(rng.gen_range(0.8..=5.0), 4);
    let change = round_to(rng.gen_range(-3.0..=3.0), 2);
    let risk = match category {
        "货币市场" => RiskLevel::Low,
        "债券型" => RiskLevel::ALL[rng.gen_range(0..2)],
        _ => RiskLevel::ALL[rng.gen_range(2..5)],
    };
    let returns = TrailingReturns {
        one_week: Some(round_to(rng.gen_range(-5.0..=5.0), 2)),
        one_month: Some(round_to(rng.gen_range(-10.0..=10.0), 2)),
        one_year: Some(round_to(rng.gen_range(-30.0..=60.0), 2)),
        three_year: Some(round_to(rng.gen_range(-40.0..=120.0), 2)),
    };
    let drawdown = round_to(rng.gen_range(-45.0..=-3.0), 2);
    let min_amount = [1.0, 10.0, 100.0, 1000.0][rng.gen_range(0..4)];

    let holdings = (0..3)
        .map(|k| {
            let name = HOLDING_POOL[(index + k * 5) % HOLDING_POOL.len()];
            Holding::new(name, format!("{:.2}%", rng.gen_range(2.0..=9.5)))
        })
        .collect();

    let extra_tag = TAG_POOL[rng.gen_range(0..TAG_POOL.len())];

    FundRecord::new(
        format!("syn-{:04}", index + 1),
        format!("{:06}", FIRST_SYNTHETIC_CODE + index),
        format!("{company}{sector}{suffix}"),
        category,
        manager,
        nav,
        change,
        risk,
    )
    .with_sector(sector.clone())
    .with_returns(returns)
    .with_max_drawdown(drawdown)
    .with_description(format!("{company}旗下聚焦{sector}主题的{suffix}产品，由{manager}管理。"))
    .with_min_amount(min_amount)
    .with_tags([sector.as_str(), extra_tag])
    .with_holdings(holdings)
    .with_history(random_walk_history(rng, nav, end_date))
}

/// Walk backwards from the current NAV so the last point equals it.
fn random_walk_history<R: Rng + ?Sized>(
    rng: &mut R,
    nav: f64,
    end_date: NaiveDate,
) -> Vec<NavPoint> {
    let mut points = Vec::with_capacity(SYNTHETIC_HISTORY_DAYS);
    let mut value = nav;
    for offset in 0..SYNTHETIC_HISTORY_DAYS {
        points.push(NavPoint {
            date: end_date - Duration::days(offset as i64),
            nav: round_to(value, 4),
        });
        let daily: f64 = rng.gen_range(-0.02..=0.02);
        value = (value / (1.0 + daily)).max(0.01);
    }
    points.reverse();
    points
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
