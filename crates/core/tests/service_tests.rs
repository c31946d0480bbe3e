use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

use fund_dashboard_core::catalog::builtin::{category_taxonomy, sector_taxonomy};
use fund_dashboard_core::errors::CoreError;
use fund_dashboard_core::models::catalog::FundCatalog;
use fund_dashboard_core::models::display::{ChangeTone, FundListing, RiskTone, Sparkline};
use fund_dashboard_core::models::fund::{FundRecord, Holding, NavPoint, RiskLevel, TrailingReturns};
use fund_dashboard_core::models::narrative::{NarrativePrompt, NarrativeRequest, NARRATIVE_FALLBACK};
use fund_dashboard_core::models::overlay::PriceOverlay;
use fund_dashboard_core::models::selection::{FundSortOrder, ViewMode};
use fund_dashboard_core::models::settings::{BarScale, SimulationScope};
use fund_dashboard_core::models::taxonomy::Taxonomy;
use fund_dashboard_core::providers::traits::NarrativeProvider;
use fund_dashboard_core::services::favorites_service::FavoritesRegistry;
use fund_dashboard_core::services::filter_service::FilterService;
use fund_dashboard_core::services::narrative_service::NarrativeService;
use fund_dashboard_core::services::presenter_service::{
    bar_width, format_amount, format_nav, format_percent, listing_header, normalize_series,
    risk_tone, sparkline, PresenterService, ALL_FUNDS_TITLE, NO_TREND_MESSAGE,
};
use fund_dashboard_core::services::price_simulation_service::PriceSimulator;
use fund_dashboard_core::storage::{KeyValueStore, MemoryStore};

// ═══════════════════════════════════════════════════════════════════
//  Fixtures
// ═══════════════════════════════════════════════════════════════════

fn sample_funds() -> Vec<FundRecord> {
    vec![
        FundRecord::new(
            "1",
            "005827",
            "易方达蓝筹精选混合",
            "混合型",
            "张坤",
            2.1,
            0.5,
            RiskLevel::MediumHigh,
        )
        .with_sector("消费白酒")
        .with_returns(TrailingReturns {
            one_year: Some(10.0),
            ..Default::default()
        }),
        FundRecord::new(
            "2",
            "161725",
            "招商中证白酒指数",
            "index",
            "侯昊",
            1.2,
            -1.0,
            RiskLevel::High,
        )
        .with_sector("消费白酒"),
        FundRecord::new(
            "3",
            "003834",
            "华夏能源革新股票",
            "股票型",
            "郑泽鸿",
            3.4,
            2.0,
            RiskLevel::High,
        )
        .with_sector("新能源")
        .with_returns(TrailingReturns {
            one_year: Some(20.0),
            ..Default::default()
        }),
        FundRecord::new(
            "4",
            "513100",
            "Invesco QQQ ETF",
            "etf",
            "Li Ming",
            1.5,
            0.0,
            RiskLevel::Medium,
        ),
    ]
}

fn category_catalog() -> FundCatalog {
    FundCatalog::new(sample_funds(), category_taxonomy()).unwrap()
}

fn sector_catalog() -> FundCatalog {
    FundCatalog::new(sample_funds(), sector_taxonomy()).unwrap()
}

fn ids(funds: &[&FundRecord]) -> Vec<String> {
    funds.iter().map(|f| f.id.clone()).collect()
}

fn favs(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn search(catalog: &FundCatalog, text: &str) -> Vec<String> {
    let funds = FilterService::new().visible_funds(
        catalog,
        &BTreeSet::new(),
        ViewMode::AllFunds,
        "all",
        text,
    );
    ids(&funds)
}

fn in_taxonomy(catalog: &FundCatalog, taxonomy_id: &str) -> Vec<String> {
    let funds = FilterService::new().visible_funds(
        catalog,
        &BTreeSet::new(),
        ViewMode::AllFunds,
        taxonomy_id,
        "",
    );
    ids(&funds)
}

// ═══════════════════════════════════════════════════════════════════
//  FilterService
// ═══════════════════════════════════════════════════════════════════

mod filter {
    use super::*;

    #[test]
    fn all_and_empty_search_is_whole_catalog() {
        let catalog = category_catalog();
        assert_eq!(search(&catalog, ""), vec!["1", "2", "3", "4"]);
        assert_eq!(search(&catalog, "   "), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn search_by_code_name_and_nonsense() {
        let catalog = category_catalog();
        assert_eq!(search(&catalog, "005827"), vec!["1"]);
        assert_eq!(search(&catalog, "蓝筹"), vec!["1"]);
        assert!(search(&catalog, "zzz").is_empty());
    }

    #[test]
    fn search_by_partial_code() {
        let catalog = category_catalog();
        assert_eq!(search(&catalog, "5827"), vec!["1"]);
    }

    #[test]
    fn search_matches_manager_and_trims() {
        let catalog = category_catalog();
        assert_eq!(search(&catalog, "  张坤 "), vec!["1"]);
    }

    #[test]
    fn search_matches_sector() {
        let catalog = category_catalog();
        assert_eq!(search(&catalog, "新能源"), vec!["3"]);
        assert_eq!(search(&catalog, "白酒"), vec!["1", "2"]);
    }

    #[test]
    fn search_matches_category() {
        let catalog = category_catalog();
        assert_eq!(search(&catalog, "股票型"), vec!["3"]);
    }

    #[test]
    fn search_matches_category_display_name() {
        let catalog = category_catalog();
        // Raw id is "index"; the chip shows "指数型".
        assert_eq!(search(&catalog, "指数型"), vec!["2"]);
        assert_eq!(search(&catalog, "index"), vec!["2"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let catalog = category_catalog();
        assert_eq!(search(&catalog, "ETF"), vec!["4"]);
        assert_eq!(search(&catalog, "qqq"), vec!["4"]);
        assert_eq!(search(&catalog, "li ming"), vec!["4"]);
    }

    #[test]
    fn category_axis_exact_match() {
        let catalog = category_catalog();
        assert_eq!(in_taxonomy(&catalog, "混合型"), vec!["1"]);
    }

    #[test]
    fn taxonomy_match_is_case_sensitive() {
        let catalog = category_catalog();
        assert!(in_taxonomy(&catalog, "ETF").is_empty());
    }

    #[test]
    fn sector_axis_skips_records_without_sector() {
        let catalog = sector_catalog();
        assert_eq!(in_taxonomy(&catalog, "消费白酒"), vec!["1", "2"]);
        assert!(in_taxonomy(&catalog, "QDII海外").is_empty());
    }

    #[test]
    fn favorites_only_keeps_catalog_order_and_ignores_unknown_ids() {
        let catalog = category_catalog();
        let service = FilterService::new();
        let favorites = favs(&["4", "2", "ghost"]);
        let funds = service.visible_funds(&catalog, &favorites, ViewMode::FavoritesOnly, "all", "");
        assert_eq!(ids(&funds), vec!["2", "4"]);
    }

    #[test]
    fn favorites_only_with_no_favorites_is_empty() {
        let catalog = category_catalog();
        let funds = FilterService::new().visible_funds(
            &catalog,
            &BTreeSet::new(),
            ViewMode::FavoritesOnly,
            "all",
            "",
        );
        assert!(funds.is_empty());
    }

    #[test]
    fn filters_combine_as_and() {
        let catalog = sector_catalog();
        let favorites = favs(&["1", "2"]);
        let funds = FilterService::new().visible_funds(
            &catalog,
            &favorites,
            ViewMode::FavoritesOnly,
            "消费白酒",
            "指数",
        );
        assert_eq!(ids(&funds), vec!["2"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Display sort
// ═══════════════════════════════════════════════════════════════════

mod sorting {
    use super::*;

    fn sorted(order: FundSortOrder, overlay: &PriceOverlay) -> Vec<String> {
        let catalog = category_catalog();
        let service = FilterService::new();
        let mut funds: Vec<&FundRecord> = catalog.funds().iter().collect();
        service.sort_funds(&mut funds, order, overlay);
        ids(&funds)
    }

    #[test]
    fn catalog_order_is_untouched() {
        assert_eq!(sorted(FundSortOrder::Catalog, &PriceOverlay::new()), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn change_orders_use_live_values() {
        let mut overlay = PriceOverlay::new();
        overlay.set("4", 3.0);
        assert_eq!(sorted(FundSortOrder::ChangeDesc, &overlay), vec!["4", "3", "1", "2"]);
        assert_eq!(sorted(FundSortOrder::ChangeAsc, &overlay), vec!["2", "1", "3", "4"]);
    }

    #[test]
    fn nav_desc() {
        assert_eq!(sorted(FundSortOrder::NavDesc, &PriceOverlay::new()), vec!["3", "1", "4", "2"]);
    }

    #[test]
    fn one_year_return_puts_missing_last() {
        assert_eq!(
            sorted(FundSortOrder::Return1YDesc, &PriceOverlay::new()),
            vec!["3", "1", "2", "4"]
        );
    }

    #[test]
    fn name_asc() {
        assert_eq!(sorted(FundSortOrder::NameAsc, &PriceOverlay::new()), vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn ties_keep_catalog_order() {
        let mut overlay = PriceOverlay::new();
        for id in ["1", "2", "3", "4"] {
            overlay.set(id, 1.0);
        }
        assert_eq!(sorted(FundSortOrder::ChangeDesc, &overlay), vec!["1", "2", "3", "4"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  PresenterService
// ═══════════════════════════════════════════════════════════════════

mod presenter {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn percent_formatting() {
        let up = format_percent(1.88);
        assert_eq!(up.text, "+1.88%");
        assert_eq!(up.tone, ChangeTone::Rising);

        let down = format_percent(-0.24);
        assert_eq!(down.text, "-0.24%");
        assert_eq!(down.tone, ChangeTone::Falling);

        assert_eq!(format_percent(0.0).text, "+0.00%");
        assert_eq!(format_percent(0.0).tone, ChangeTone::Rising);
        assert_eq!(format_percent(-0.0).text, "+0.00%");
        assert_eq!(format_percent(12.346).text, "+12.35%");
    }

    #[test]
    fn nav_has_four_decimals() {
        assert_eq!(format_nav(3.5502), "3.5502");
        assert_eq!(format_nav(1.0), "1.0000");
        assert_eq!(format_nav(2.123456), "2.1235");
    }

    #[test]
    fn risk_tones() {
        assert_eq!(risk_tone(RiskLevel::High), RiskTone::High);
        assert_eq!(risk_tone(RiskLevel::MediumHigh), RiskTone::High);
        assert_eq!(risk_tone(RiskLevel::Medium), RiskTone::Normal);
        assert_eq!(risk_tone(RiskLevel::LowMedium), RiskTone::Normal);
        assert_eq!(risk_tone(RiskLevel::Low), RiskTone::Normal);
    }

    #[test]
    fn bar_width_is_clamped() {
        let scale = BarScale::default();
        assert_eq!(bar_width(10.0, scale), 25.0);
        assert_eq!(bar_width(-10.0, scale), 25.0);
        assert_eq!(bar_width(0.0, scale), 5.0);
        assert_eq!(bar_width(-500.0, scale), 100.0);
        assert_eq!(bar_width(f64::NAN, scale), 0.0);
        assert_eq!(bar_width(f64::INFINITY, scale), 100.0);
    }

    #[test]
    fn bar_width_never_negative() {
        let scale = BarScale { factor: 1.0, offset: -50.0 };
        assert_eq!(bar_width(10.0, scale), 0.0);
    }

    #[test]
    fn normalize_two_points() {
        assert_eq!(normalize_series(&[5.0, 15.0]), Some(vec![0.0, 100.0]));
        assert_eq!(normalize_series(&[2.0, 1.0, 1.5]), Some(vec![100.0, 0.0, 50.0]));
    }

    #[test]
    fn normalize_flat_series_sits_on_mid_line() {
        assert_eq!(normalize_series(&[10.0, 10.0, 10.0]), Some(vec![50.0, 50.0, 50.0]));
    }

    #[test]
    fn normalize_too_short() {
        assert_eq!(normalize_series(&[]), None);
        assert_eq!(normalize_series(&[1.0]), None);
    }

    #[test]
    fn sparkline_placeholder_for_short_history() {
        let one = vec![NavPoint { date: d(1), nav: 1.0 }];
        let s = sparkline(&one);
        assert!(s.is_placeholder());
        assert_eq!(
            s,
            Sparkline::Placeholder {
                message: NO_TREND_MESSAGE.to_string()
            }
        );
        assert!(sparkline(&[]).is_placeholder());
    }

    #[test]
    fn sparkline_points_oldest_first() {
        let history = vec![
            NavPoint { date: d(1), nav: 1.0 },
            NavPoint { date: d(2), nav: 1.2 },
            NavPoint { date: d(3), nav: 1.1 },
        ];
        let s = sparkline(&history);
        let points = s.points().unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], 0.0);
        assert_eq!(points[1], 100.0);
        assert!((points[2] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn amounts() {
        assert_eq!(format_amount(10.0), "¥10");
        assert_eq!(format_amount(1000.0), "¥1,000");
        assert_eq!(format_amount(1_234_567.5), "¥1,234,567.50");
        assert_eq!(format_amount(0.0), "¥0");
        assert_eq!(format_amount(100.0), "¥100");
    }

    #[test]
    fn header_titles() {
        let taxonomy = category_taxonomy();
        assert_eq!(listing_header(&taxonomy, "all", 6).title, ALL_FUNDS_TITLE);
        assert_eq!(listing_header(&taxonomy, "etf", 2).title, "ETF");
        assert_eq!(listing_header(&taxonomy, "etf", 2).count, 2);
        assert_eq!(listing_header(&taxonomy, "unlisted", 0).title, "unlisted");
    }

    #[test]
    fn card_uses_overlay_value() {
        let fund = &sample_funds()[0];
        let presenter = PresenterService::default();
        let mut overlay = PriceOverlay::new();

        let card = presenter.card(fund, &overlay, true);
        assert_eq!(card.change.text, "+0.50%");
        assert_eq!(card.nav, "2.1000");
        assert_eq!(card.risk.label, "中高");
        assert_eq!(card.risk.tone, RiskTone::High);
        assert!(card.is_favorite);

        overlay.set("1", -1.234);
        let card = presenter.card(fund, &overlay, false);
        assert_eq!(card.change.text, "-1.23%");
        assert_eq!(card.change.tone, ChangeTone::Falling);
    }

    #[test]
    fn detail_lists_only_present_horizons() {
        let fund = FundRecord::new(
            "9",
            "000009",
            "测试基金",
            "混合型",
            "某人",
            1.0,
            0.0,
            RiskLevel::Low,
        )
        .with_returns(TrailingReturns {
            one_week: Some(-1.0),
            three_year: Some(30.0),
            ..Default::default()
        })
        .with_max_drawdown(-500.0)
        .with_min_amount(1000.0)
        .with_holdings(vec![Holding::new("贵州茅台", "8.52%")]);
        let detail = PresenterService::default().detail(&fund, &PriceOverlay::new(), false);

        let horizons: Vec<&str> = detail.returns.iter().map(|r| r.horizon.as_str()).collect();
        assert_eq!(horizons, vec!["近1周", "近3年"]);
        assert_eq!(detail.returns[0].value.text, "-1.00%");
        assert_eq!(detail.returns[0].bar_width, 7.0);
        assert_eq!(detail.returns[1].bar_width, 65.0);

        let drawdown = detail.drawdown.unwrap();
        assert_eq!(drawdown.value.text, "-500.00%");
        assert_eq!(drawdown.bar_width, 100.0);

        assert_eq!(detail.min_amount, "¥1,000");
        assert_eq!(detail.holdings[0].name, "贵州茅台");
        assert!(detail.sparkline.is_placeholder());
    }

    #[test]
    fn listing_empty_becomes_no_results() {
        let presenter = PresenterService::default();
        let taxonomy = category_taxonomy();
        let listing = presenter.listing(&taxonomy, "etf", vec![]);
        assert!(matches!(listing, FundListing::NoResults { .. }));
        assert!(listing.is_empty());
        assert_eq!(listing.header().title, "ETF");
        assert_eq!(listing.header().count, 0);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  PriceSimulator
// ═══════════════════════════════════════════════════════════════════

mod simulator {
    use super::*;

    #[test]
    fn rejects_bad_half_width() {
        assert!(PriceSimulator::new(-0.1, SimulationScope::All).is_err());
        assert!(PriceSimulator::new(f64::NAN, SimulationScope::All).is_err());
        assert!(PriceSimulator::new(f64::INFINITY, SimulationScope::All).is_err());
        assert!(PriceSimulator::new(0.0, SimulationScope::All).is_ok());
    }

    #[test]
    fn rejects_half_width_whose_span_overflows() {
        assert!(PriceSimulator::new(1e308, SimulationScope::All).is_err());
        assert!(PriceSimulator::new(f64::MAX, SimulationScope::All).is_err());
        assert!(PriceSimulator::new(1e300, SimulationScope::All).is_ok());
    }

    #[test]
    fn first_tick_stays_within_half_width_of_baseline() {
        let catalog = category_catalog();
        let sim = PriceSimulator::new(2.0, SimulationScope::All).unwrap();
        let mut overlay = PriceOverlay::new();
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(sim.tick(&catalog, &mut overlay, &mut rng), 4);
        for fund in catalog.funds() {
            let v = overlay.get(&fund.id).unwrap();
            assert!((v - fund.change_percent).abs() <= 2.0, "{} drifted to {v}", fund.id);
        }
    }

    #[test]
    fn steps_from_previous_value_not_baseline() {
        let catalog = category_catalog();
        let sim = PriceSimulator::new(2.0, SimulationScope::All).unwrap();
        let mut overlay = PriceOverlay::new();
        overlay.set("1", 100.0);
        let mut rng = StdRng::seed_from_u64(8);

        sim.tick(&catalog, &mut overlay, &mut rng);
        let v = overlay.get("1").unwrap();
        assert!((98.0..=102.0).contains(&v), "got {v}");
    }

    #[test]
    fn prefix_scope_leaves_tail_alone() {
        let catalog = category_catalog();
        let sim = PriceSimulator::new(2.0, SimulationScope::Prefix(2)).unwrap();
        let mut overlay = PriceOverlay::new();
        let mut rng = StdRng::seed_from_u64(9);

        assert_eq!(sim.tick(&catalog, &mut overlay, &mut rng), 2);
        assert!(overlay.get("1").is_some());
        assert!(overlay.get("2").is_some());
        assert_eq!(overlay.get("3"), None);
        assert_eq!(overlay.current_change(&catalog.funds()[3]), 0.0);
    }

    #[test]
    fn prefix_larger_than_catalog() {
        let catalog = category_catalog();
        let sim = PriceSimulator::new(2.0, SimulationScope::Prefix(100)).unwrap();
        let mut overlay = PriceOverlay::new();
        assert_eq!(sim.tick(&catalog, &mut overlay, &mut StdRng::seed_from_u64(1)), 4);
    }

    #[test]
    fn zero_half_width_keeps_values() {
        let catalog = category_catalog();
        let sim = PriceSimulator::new(0.0, SimulationScope::All).unwrap();
        let mut overlay = PriceOverlay::new();
        sim.tick(&catalog, &mut overlay, &mut StdRng::seed_from_u64(1));
        for fund in catalog.funds() {
            assert_eq!(overlay.get(&fund.id), Some(fund.change_percent));
        }
    }

    #[test]
    fn same_seed_same_walk() {
        let catalog = category_catalog();
        let sim = PriceSimulator::new(2.0, SimulationScope::All).unwrap();
        let run = |seed| {
            let mut overlay = PriceOverlay::new();
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..5 {
                sim.tick(&catalog, &mut overlay, &mut rng);
            }
            overlay
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn empty_catalog_is_a_no_op() {
        let catalog = FundCatalog::new(vec![], Taxonomy::default()).unwrap();
        let sim = PriceSimulator::new(2.0, SimulationScope::All).unwrap();
        let mut overlay = PriceOverlay::new();
        assert_eq!(sim.tick(&catalog, &mut overlay, &mut StdRng::seed_from_u64(1)), 0);
        assert!(overlay.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  FavoritesRegistry
// ═══════════════════════════════════════════════════════════════════

/// Store whose reads succeed but every write fails.
struct ReadOnlyStore {
    initial: Option<String>,
}

impl KeyValueStore for ReadOnlyStore {
    fn name(&self) -> &str {
        "read-only"
    }

    fn read(&self, _key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.initial.clone())
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), CoreError> {
        Err(CoreError::Storage("quota exceeded".into()))
    }
}

/// Store that cannot even be read.
struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn name(&self) -> &str {
        "broken"
    }

    fn read(&self, _key: &str) -> Result<Option<String>, CoreError> {
        Err(CoreError::Storage("disk on fire".into()))
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), CoreError> {
        Ok(())
    }
}

mod favorites {
    use super::*;

    const KEY: &str = "fund_favorites";

    fn stored(store: &MemoryStore) -> Option<String> {
        store.read(KEY).unwrap()
    }

    #[test]
    fn empty_store_loads_empty_set() {
        let registry = FavoritesRegistry::load(Box::new(MemoryStore::new()), KEY);
        assert!(registry.is_empty());
        assert_eq!(registry.storage_key(), KEY);
    }

    #[test]
    fn toggle_is_an_involution_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let mut registry = FavoritesRegistry::load(Box::new(Arc::clone(&store)), KEY);

        assert!(registry.toggle("1").unwrap());
        assert!(registry.is_favorite("1"));
        assert_eq!(stored(&store).as_deref(), Some(r#"["1"]"#));

        assert!(!registry.toggle("1").unwrap());
        assert!(!registry.is_favorite("1"));
        assert_eq!(stored(&store).as_deref(), Some("[]"));
    }

    #[test]
    fn persisted_list_is_sorted() {
        let store = Arc::new(MemoryStore::new());
        let mut registry = FavoritesRegistry::load(Box::new(Arc::clone(&store)), KEY);
        registry.toggle("3").unwrap();
        registry.toggle("1").unwrap();
        assert_eq!(stored(&store).as_deref(), Some(r#"["1","3"]"#));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn reload_sees_previous_session() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut registry = FavoritesRegistry::load(Box::new(Arc::clone(&store)), KEY);
            registry.toggle("2").unwrap();
            registry.toggle("5").unwrap();
        }
        let reloaded = FavoritesRegistry::load(Box::new(Arc::clone(&store)), KEY);
        assert_eq!(reloaded.all(), &favs(&["2", "5"]));
    }

    #[test]
    fn malformed_entry_loads_empty_and_is_overwritten() {
        let store = Arc::new(MemoryStore::with_entry(KEY, "not json"));
        let mut registry = FavoritesRegistry::load(Box::new(Arc::clone(&store)), KEY);
        assert!(registry.is_empty());

        registry.toggle("4").unwrap();
        assert_eq!(stored(&store).as_deref(), Some(r#"["4"]"#));
    }

    #[test]
    fn wrong_shape_loads_empty() {
        let store = MemoryStore::with_entry(KEY, r#"{"1": true}"#);
        let registry = FavoritesRegistry::load(Box::new(store), KEY);
        assert!(registry.is_empty());
    }

    #[test]
    fn unreadable_store_loads_empty() {
        let registry = FavoritesRegistry::load(Box::new(BrokenStore), KEY);
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_write_rolls_back() {
        let store = ReadOnlyStore {
            initial: Some(r#"["1"]"#.into()),
        };
        let mut registry = FavoritesRegistry::load(Box::new(store), KEY);
        assert!(registry.is_favorite("1"));

        assert!(matches!(registry.toggle("2"), Err(CoreError::Storage(_))));
        assert!(!registry.is_favorite("2"));

        assert!(registry.toggle("1").is_err());
        assert!(registry.is_favorite("1"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ids_are_not_checked_against_anything() {
        let mut registry = FavoritesRegistry::load(Box::new(MemoryStore::new()), KEY);
        assert!(registry.toggle("no-such-fund").unwrap());
        assert!(registry.is_favorite("no-such-fund"));
    }

    #[test]
    fn duplicates_in_storage_collapse() {
        let store = MemoryStore::with_entry(KEY, r#"["1","1","2"]"#);
        let registry = FavoritesRegistry::load(Box::new(store), KEY);
        assert_eq!(registry.len(), 2);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  NarrativeService
// ═══════════════════════════════════════════════════════════════════

/// Provider returning a fixed text and recording every request.
struct EchoProvider {
    reply: String,
    seen: Arc<Mutex<Vec<NarrativeRequest>>>,
}

#[async_trait]
impl NarrativeProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, request: &NarrativeRequest) -> Result<String, CoreError> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

struct FailingProvider;

#[async_trait]
impl NarrativeProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _request: &NarrativeRequest) -> Result<String, CoreError> {
        Err(CoreError::Network("timed out".into()))
    }
}

/// Provider that takes a while to answer.
struct SlowProvider;

#[async_trait]
impl NarrativeProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn generate(&self, _request: &NarrativeRequest) -> Result<String, CoreError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("done".into())
    }
}

mod narrative {
    use super::*;

    fn echo(reply: &str, grounded: bool) -> (NarrativeService, Arc<Mutex<Vec<NarrativeRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = EchoProvider {
            reply: reply.into(),
            seen: Arc::clone(&seen),
        };
        (NarrativeService::new(Some(Box::new(provider)), grounded), seen)
    }

    #[tokio::test]
    async fn success_returns_provider_text() {
        let (service, seen) = echo("## 市场\n偏暖", false);
        let narrative = service.request(&NarrativePrompt::Market).await;

        assert_eq!(narrative.text, "## 市场\n偏暖");
        assert!(!narrative.is_fallback);
        assert_eq!(service.latest(), Some(narrative));
        assert!(!service.is_loading());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].prompt, NarrativePrompt::Market.to_text());
        assert!(!seen[0].grounded);
    }

    #[tokio::test]
    async fn grounded_flag_is_forwarded() {
        let (service, seen) = echo("ok", true);
        service.request(&NarrativePrompt::Market).await;
        assert!(seen.lock().unwrap()[0].grounded);
    }

    #[tokio::test]
    async fn fund_prompt_reaches_provider() {
        let (service, seen) = echo("ok", false);
        let fund = &sample_funds()[0];
        service.request(&NarrativePrompt::for_fund(fund)).await;
        assert!(seen.lock().unwrap()[0].prompt.contains("005827"));
    }

    #[tokio::test]
    async fn failure_yields_fallback_and_clears_loading() {
        let service = NarrativeService::new(Some(Box::new(FailingProvider)), false);
        let narrative = service.request(&NarrativePrompt::Market).await;

        assert_eq!(narrative.text, NARRATIVE_FALLBACK);
        assert!(narrative.is_fallback);
        assert!(!service.is_loading());
        assert_eq!(service.latest().unwrap().text, NARRATIVE_FALLBACK);
    }

    #[tokio::test]
    async fn no_provider_yields_fallback() {
        let service = NarrativeService::disabled();
        assert!(!service.has_provider());
        assert_eq!(service.provider_name(), None);

        let narrative = service.request(&NarrativePrompt::Market).await;
        assert!(narrative.is_fallback);
    }

    #[tokio::test]
    async fn clear_dismisses_latest() {
        let (service, _) = echo("ok", false);
        service.request(&NarrativePrompt::Market).await;
        assert!(service.latest().is_some());
        service.clear();
        assert!(service.latest().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn loading_while_in_flight() {
        let service = Arc::new(NarrativeService::new(Some(Box::new(SlowProvider)), false));
        assert!(!service.is_loading());

        let worker = Arc::clone(&service);
        let handle = tokio::spawn(async move {
            let prompt = NarrativePrompt::Market;
            worker.request(&prompt).await
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(service.is_loading());
        assert!(service.latest().is_none());

        let narrative = handle.await.unwrap();
        assert_eq!(narrative.text, "done");
        assert!(!service.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_request_clears_loading() {
        let service = Arc::new(NarrativeService::new(Some(Box::new(SlowProvider)), false));
        let worker = Arc::clone(&service);
        let handle = tokio::spawn(async move {
            let prompt = NarrativePrompt::Market;
            worker.request(&prompt).await
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(service.is_loading());

        handle.abort();
        let _ = handle.await;
        assert!(!service.is_loading());
    }
}
