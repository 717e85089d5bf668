//! 리밸런싱 엔진 통합 테스트.
//!
//! 검증 항목:
//! 1. 두 종목 지수 추종 리밸런싱 (수량 변화, 행동, 우선순위)
//! 2. 이미 균형 잡힌 포트폴리오
//! 3. 알 수 없는 전략 유형 / 빈 포트폴리오 에러
//! 4. 가격 0 제외, 필요 현금 비음수, 결정적 순서
//! 5. 순숏 포트폴리오 비중, Decimal 범위 초과

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use rebalancer_core::{
    DecimalExt, Position, PriceMap, RebalanceAction, RebalanceError, StrategyConfig, StrategyType,
};
use rebalancer_strategy::{
    priority_for_deviation, QuantityThreshold, RebalanceEngine, StrategyRegistry,
};

// ============================================================================
// 헬퍼 함수
// ============================================================================

fn prices(entries: &[(&str, Decimal)]) -> PriceMap {
    entries
        .iter()
        .map(|(secid, price)| (secid.to_string(), *price))
        .collect()
}

fn engine_for(config: &StrategyConfig) -> RebalanceEngine {
    StrategyRegistry::builtin()
        .engine(config, QuantityThreshold::default())
        .unwrap()
}

fn two_asset_portfolio() -> (Vec<Position>, PriceMap) {
    (
        vec![
            Position::new("SBER", dec!(100), dec!(95)),
            Position::new("GAZP", dec!(100), dec!(120)),
        ],
        prices(&[("SBER", dec!(100)), ("GAZP", dec!(100))]),
    )
}

// ============================================================================
// 시나리오
// ============================================================================

#[test]
fn test_two_asset_index_rebalance() {
    let (positions, price_map) = two_asset_portfolio();
    let engine = engine_for(&StrategyConfig::new(StrategyType::LazyIndexTracking));

    let result = engine.calculate_rebalance(1, &positions, &price_map).unwrap();

    assert_eq!(result.strategy_type, StrategyType::LazyIndexTracking);
    assert_eq!(result.current_total_value, dec!(20000));
    assert_eq!(result.target_total_value, dec!(20000));
    assert_eq!(result.total_transactions, 2);

    let sber = result.recommendation("SBER").unwrap();
    assert!(sber.target_weight.approx_eq(dec!(0.5663), dec!(0.0001)));
    assert!((sber.target_quantity * dec!(100)).approx_eq(dec!(11326), dec!(1)));
    assert!(sber.quantity_change.approx_eq(dec!(13.26), dec!(0.01)));
    assert_eq!(sber.action, RebalanceAction::Buy);
    assert_eq!(sber.current_weight, dec!(0.5));
    assert_eq!(sber.priority, 2);

    let gazp = result.recommendation("GAZP").unwrap();
    assert!(gazp.target_weight.approx_eq(dec!(0.4337), dec!(0.0001)));
    assert!((gazp.target_quantity * dec!(100)).approx_eq(dec!(8674), dec!(1)));
    assert!(gazp.quantity_change.approx_eq(dec!(-13.26), dec!(0.01)));
    assert_eq!(gazp.action, RebalanceAction::Sell);

    // 매수와 매도가 상쇄됨
    assert!(result.cash_required >= Decimal::ZERO);
    assert!(result.cash_required < dec!(0.01));
    assert!(result.estimated_total_cost.approx_eq(dec!(2650.6), dec!(0.1)));
}

#[test]
fn test_already_balanced_portfolio_has_no_recommendations() {
    let positions = vec![Position::new("SBER", dec!(50), dec!(280))];
    let price_map = prices(&[("SBER", dec!(300))]);

    for min_amount in [Decimal::ZERO, dec!(1), dec!(1000), dec!(1_000_000)] {
        for strategy_type in StrategyType::ALL {
            let config = StrategyConfig::new(strategy_type)
                .with_min_transaction_amount(min_amount)
                .with_parameter("target_weights", serde_json::json!({ "SBER": 1 }));
            let result = engine_for(&config)
                .calculate_rebalance(1, &positions, &price_map)
                .unwrap();

            assert!(
                result.is_empty(),
                "{strategy_type} with min amount {min_amount} produced recommendations"
            );
            assert_eq!(result.total_transactions, 0);
            assert_eq!(result.cash_required, Decimal::ZERO);
        }
    }
}

#[test]
fn test_unknown_strategy_type() {
    let registry = StrategyRegistry::builtin();

    let err = registry.resolve("momentum_rotation").unwrap_err();
    assert_eq!(
        err,
        RebalanceError::UnknownStrategyType("momentum_rotation".to_string())
    );
    assert!(!err.is_retryable());
}

#[test]
fn test_empty_portfolio() {
    let engine = engine_for(&StrategyConfig::new(StrategyType::LazyIndexTracking));
    let err = engine
        .calculate_rebalance(5, &[], &prices(&[("SBER", dec!(100))]))
        .unwrap_err();

    assert_eq!(err, RebalanceError::EmptyPortfolio(5));
}

// ============================================================================
// 속성
// ============================================================================

#[test]
fn test_priority_monotonicity() {
    let tiers: Vec<u8> = [dec!(0.12), dec!(0.06), dec!(0.03), dec!(0.015), dec!(0.005)]
        .into_iter()
        .map(priority_for_deviation)
        .collect();

    assert_eq!(tiers, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_idempotent_recommendations() {
    let positions = vec![
        Position::new("LKOH", dec!(40), dec!(0)),
        Position::new("SBER", dec!(300), dec!(0)),
        Position::new("AAPL", dec!(5), dec!(0)),
        Position::new("GAZP", dec!(10), dec!(0)),
        Position::new("MOEX", dec!(80), dec!(0)),
    ];
    let price_map = prices(&[
        ("LKOH", dec!(7000)),
        ("SBER", dec!(300)),
        ("AAPL", dec!(15000)),
        ("GAZP", dec!(150)),
        ("MOEX", dec!(200)),
    ]);
    let config = StrategyConfig::new(StrategyType::LazyIndexTracking)
        .with_min_transaction_amount(dec!(100))
        .with_rebalance_threshold(dec!(0.005));
    let engine = engine_for(&config);

    let first = engine.calculate_rebalance(1, &positions, &price_map).unwrap();
    let second = engine.calculate_rebalance(1, &positions, &price_map).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first.recommendations, second.recommendations);
    assert_eq!(first.cash_required, second.cash_required);
    assert_eq!(first.estimated_total_cost, second.estimated_total_cost);

    // 우선순위 오름차순, 같은 우선순위 내에서는 증권 코드 순
    for pair in first.recommendations.windows(2) {
        assert!(
            (pair[0].priority, pair[0].secid.as_str()) < (pair[1].priority, pair[1].secid.as_str())
        );
    }
}

#[test]
fn test_zero_price_never_recommended() {
    let positions = vec![
        Position::new("SBER", dec!(100), dec!(0)),
        Position::new("GAZP", dec!(500), dec!(0)),
        Position::new("YNDX", dec!(10), dec!(0)),
    ];
    let price_map = prices(&[("SBER", dec!(100)), ("GAZP", dec!(0))]);
    let config = StrategyConfig::new(StrategyType::EqualWeight)
        .with_min_transaction_amount(Decimal::ZERO)
        .with_max_weight_deviation(Decimal::ZERO);

    let result = engine_for(&config)
        .calculate_rebalance(1, &positions, &price_map)
        .unwrap();

    assert_eq!(result.current_total_value, dec!(10000));
    assert_eq!(result.total_transactions, 1);
    assert!(result.recommendation("GAZP").is_none());
    assert!(result.recommendation("YNDX").is_none());
}

#[test]
fn test_cash_required_not_negative_with_only_sells() {
    // A는 과대 비중(20%), B1..B10은 소폭 과소 비중(8% vs 9.09%)
    let mut positions = vec![Position::new("A", dec!(200), dec!(0))];
    let mut price_map = prices(&[("A", dec!(1))]);
    for i in 1..=10 {
        let secid = format!("B{i}");
        positions.push(Position::new(secid.clone(), dec!(80), dec!(0)));
        price_map.insert(secid, dec!(1));
    }
    let config = StrategyConfig::new(StrategyType::EqualWeight)
        .with_min_transaction_amount(dec!(50))
        .with_max_weight_deviation(dec!(0.005));

    let result = engine_for(&config)
        .calculate_rebalance(1, &positions, &price_map)
        .unwrap();

    // 매수 건은 금액이 작아 필터링되고 매도만 남음
    assert_eq!(result.total_transactions, 1);
    assert_eq!(result.recommendations[0].action, RebalanceAction::Sell);
    assert_eq!(result.cash_required, Decimal::ZERO);
    assert!(result.buy_recommendations().is_empty());
}

#[test]
fn test_security_price_threshold_changes_action_for_expensive_security() {
    // LKOH 1주 = 7000: 가정 단가 100이면 임계값 10주, 실제 가격이면 0.14주
    let positions = vec![
        Position::new("LKOH", dec!(10), dec!(0)),
        Position::new("SBER", dec!(100), dec!(0)),
    ];
    let price_map = prices(&[("LKOH", dec!(7000)), ("SBER", dec!(300))]);
    let config = StrategyConfig::new(StrategyType::EqualWeight)
        .with_min_transaction_amount(dec!(1000))
        .with_max_weight_deviation(dec!(0.01));

    let assumed = engine_for(&config)
        .calculate_rebalance(1, &positions, &price_map)
        .unwrap();
    let own = StrategyRegistry::builtin()
        .engine(&config, QuantityThreshold::SecurityPrice)
        .unwrap()
        .calculate_rebalance(1, &positions, &price_map)
        .unwrap();

    // 총 100000, 목표 50000 → LKOH 목표 7.14주 (변화 -2.86)
    assert_eq!(
        assumed.recommendation("LKOH").unwrap().action,
        RebalanceAction::Hold
    );
    assert_eq!(own.recommendation("LKOH").unwrap().action, RebalanceAction::Sell);
}

// ============================================================================
// 숏 포지션 / 범위 초과
// ============================================================================

#[test]
fn test_net_short_portfolio_reports_zero_current_weight() {
    let positions = vec![
        Position::new("SBER", dec!(10), dec!(0)),
        Position::new("GAZP", dec!(-20), dec!(0)),
    ];
    let price_map = prices(&[("SBER", dec!(100)), ("GAZP", dec!(100))]);
    let config = StrategyConfig::new(StrategyType::EqualWeight)
        .with_min_transaction_amount(Decimal::ZERO)
        .with_max_weight_deviation(Decimal::ZERO);

    let result = engine_for(&config)
        .calculate_rebalance(1, &positions, &price_map)
        .unwrap();

    assert!(result.current_total_value < Decimal::ZERO);
    for rec in &result.recommendations {
        assert!(rec.current_weight >= Decimal::ZERO && rec.current_weight <= Decimal::ONE);
        assert!(rec.estimated_cost >= Decimal::ZERO);
    }
}

#[test]
fn test_out_of_range_market_value_is_rejected() {
    let positions = vec![Position::new("SBER", dec!(1000000000000000), dec!(0))];
    let price_map = prices(&[("SBER", dec!(1000000000000000))]);
    let config = StrategyConfig::new(StrategyType::EqualWeight);

    let err = engine_for(&config)
        .calculate_rebalance(1, &positions, &price_map)
        .unwrap_err();

    assert!(matches!(err, RebalanceError::Overflow(_)));
}
