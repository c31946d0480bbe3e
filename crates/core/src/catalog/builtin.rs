use crate::errors::CoreError;
use crate::models::catalog::FundCatalog;
use crate::models::fund::{FundRecord, RiskLevel, TrailingReturns};
use crate::models::taxonomy::{FilterAxis, Taxonomy, TaxonomyEntry, ALL_TAXONOMY_ID};

/// Category bar of the demo dashboard. Ids are the raw `category` values.
pub fn category_taxonomy() -> Taxonomy {
    Taxonomy::new(
        FilterAxis::Category,
        vec![
            TaxonomyEntry::new(ALL_TAXONOMY_ID, "全部基金", "📊"),
            TaxonomyEntry::new("混合型", "混合型", "🌀"),
            TaxonomyEntry::new("etf", "ETF", "⚡"),
            TaxonomyEntry::new("index", "指数型", "🔢"),
            TaxonomyEntry::new("货币市场", "货币型", "💰"),
            TaxonomyEntry::new("债券型", "债券型", "🛡️"),
        ],
    )
}

/// Thematic sector bar used by sector-based catalogs.
pub fn sector_taxonomy() -> Taxonomy {
    let sectors = [
        ("消费白酒", "🍶"),
        ("医疗健康", "💊"),
        ("科技半导体", "💾"),
        ("人工智能AI", "🤖"),
        ("新能源", "🔋"),
        ("红利价值", "💎"),
        ("指数宽基", "📈"),
        ("QDII海外", "🌏"),
        ("债券固收", "🛡️"),
        ("黄金贵金属", "🪙"),
        ("国防军工", "🚀"),
        ("银行金融", "🏦"),
        ("地产基建", "🏗️"),
        ("ESG绿色", "🌱"),
    ];

    let mut entries = vec![TaxonomyEntry::new(ALL_TAXONOMY_ID, "全部分类", "📊")];
    entries.extend(
        sectors
            .iter()
            .map(|(name, icon)| TaxonomyEntry::new(*name, *name, *icon)),
    );
    Taxonomy::new(FilterAxis::Sector, entries)
}

/// Sector names in taxonomy order, without the "all" sentinel.
pub fn sector_names() -> Vec<String> {
    sector_taxonomy()
        .entries
        .into_iter()
        .filter(|e| !e.is_all())
        .map(|e| e.id)
        .collect()
}

/// The six hand-curated demo funds.
pub fn builtin_funds() -> Vec<FundRecord> {
    vec![
        FundRecord::new(
            "1",
            "000001",
            "中银创业板混合基金",
            "混合型",
            "李华",
            3.5502,
            1.88,
            RiskLevel::MediumHigh,
        )
        .with_sector("科技半导体")
        .with_description(
            "本基金主要投资于创业板上市公司，通过精选具有高成长性的企业，追求资产的长期稳健增值。",
        )
        .with_returns(TrailingReturns {
            one_year: Some(5.57),
            three_year: Some(42.85),
            ..Default::default()
        })
        .with_min_amount(10.0)
        .with_tags(["成长股", "波动大"]),
        FundRecord::new(
            "2",
            "000002",
            "招商消费ETF基金",
            "etf",
            "张三",
            4.7609,
            -0.24,
            RiskLevel::High,
        )
        .with_sector("消费白酒")
        .with_description("紧密跟踪消费指数，涵盖白酒、家电、食品饮料等核心消费赛道龙头。")
        .with_returns(TrailingReturns {
            one_year: Some(3.93),
            three_year: Some(-2.36),
            ..Default::default()
        })
        .with_min_amount(10.0)
        .with_tags(["蓝筹", "消费"]),
        FundRecord::new(
            "3",
            "000003",
            "易方达沪深300ETF基金",
            "etf",
            "王五",
            4.9393,
            -3.84,
            RiskLevel::Medium,
        )
        .with_sector("指数宽基")
        .with_description("代表A股核心资产，具有极高的市场代表性和流动性，适合定投。")
        .with_returns(TrailingReturns {
            one_year: Some(38.62),
            three_year: Some(67.07),
            ..Default::default()
        })
        .with_min_amount(10.0)
        .with_tags(["核心资产", "指数"]),
        FundRecord::new(
            "4",
            "000004",
            "广发创业板指数基金",
            "index",
            "赵六",
            4.6083,
            -3.30,
            RiskLevel::MediumHigh,
        )
        .with_sector("科技半导体")
        .with_description("布局高科技、高成长领域，受政策利好支撑，是科技赛道的重要工具。")
        .with_returns(TrailingReturns {
            one_year: Some(33.52),
            three_year: Some(15.96),
            ..Default::default()
        })
        .with_min_amount(10.0)
        .with_tags(["科技", "高弹性"]),
        FundRecord::new(
            "5",
            "000005",
            "中银稳健货币基金",
            "货币市场",
            "孙七",
            3.5093,
            0.49,
            RiskLevel::Low,
        )
        .with_sector("债券固收")
        .with_description("主要投资于短期货币工具，流动性好，风险极低，是闲置资金的避风港。")
        .with_returns(TrailingReturns {
            one_year: Some(31.49),
            three_year: Some(76.19),
            ..Default::default()
        })
        .with_min_amount(1.0)
        .with_tags(["货币", "无风险"]),
        FundRecord::new(
            "6",
            "000006",
            "富国科技债券基金",
            "债券型",
            "周八",
            5.6625,
            1.31,
            RiskLevel::Low,
        )
        .with_sector("债券固收")
        .with_description("在保障债券利息收益的同时，配置部分转债以增强收益。")
        .with_returns(TrailingReturns {
            one_year: Some(39.97),
            three_year: Some(54.40),
            ..Default::default()
        })
        .with_min_amount(100.0)
        .with_tags(["稳健", "债牛"]),
    ]
}

/// Demo catalog: the built-in funds under the category taxonomy.
pub fn builtin_catalog() -> Result<FundCatalog, CoreError> {
    FundCatalog::new(builtin_funds(), category_taxonomy())
}
