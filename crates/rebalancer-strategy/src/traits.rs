//! WeightCalculator trait 정의.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use rebalancer_core::{Position, RebalanceRecommendation, StrategyConfig, StrategyType, Weight};

/// 증권 코드 → 목표 비중. 순회 순서가 결정적이도록 BTreeMap을 사용합니다.
pub type TargetWeights = BTreeMap<String, Weight>;

/// 리밸런싱 전략의 목표 비중 계산기.
///
/// 모든 전략은 엔진에서 사용되기 위해 이 trait를 구현해야 합니다.
/// 구현체는 보유 중인 증권만 다루며 새로운 증권을 추가하지 않습니다.
pub trait WeightCalculator: Send + Sync {
    /// 전략 유형 반환.
    fn strategy_type(&self) -> StrategyType;

    /// 보유 포지션별 목표 비중 계산.
    ///
    /// 입력의 모든 증권 코드가 키로 포함되어야 하고, 비중은 음수가 아니며
    /// 포지션이 하나 이상이면 합계가 1이어야 합니다. 빈 입력이면 빈 맵을 반환합니다.
    fn calculate_target_weights(&self, positions: &[Position]) -> TargetWeights;

    /// 추천 필터.
    ///
    /// 기본 필터는 `max_weight_deviation`을 비중 편차 임계값으로 사용합니다.
    fn recommendation_filter(&self, config: &StrategyConfig) -> RecommendationFilter {
        RecommendationFilter::new(config.max_weight_deviation, config.min_transaction_amount)
    }
}

/// 추천이 살아남기 위한 조건: 비중 편차와 거래 금액 모두 임계값 이상.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationFilter {
    /// 최소 비중 편차
    pub min_weight_deviation: Decimal,
    /// 최소 거래 금액
    pub min_transaction_amount: Decimal,
}

impl RecommendationFilter {
    pub fn new(min_weight_deviation: Decimal, min_transaction_amount: Decimal) -> Self {
        Self {
            min_weight_deviation,
            min_transaction_amount,
        }
    }

    /// 추천이 필터를 통과하는지 확인합니다.
    pub fn accepts(&self, recommendation: &RebalanceRecommendation) -> bool {
        recommendation.weight_deviation() >= self.min_weight_deviation
            && recommendation.estimated_cost >= self.min_transaction_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebalancer_core::RebalanceAction;
    use rust_decimal_macros::dec;

    fn recommendation(current: Decimal, target: Decimal, cost: Decimal) -> RebalanceRecommendation {
        RebalanceRecommendation {
            secid: "SBER".to_string(),
            current_quantity: dec!(10),
            current_weight: current,
            target_weight: target,
            target_quantity: dec!(10),
            quantity_change: dec!(0),
            action: RebalanceAction::Hold,
            estimated_cost: cost,
            priority: 5,
        }
    }

    #[test]
    fn test_filter_requires_both_thresholds() {
        let filter = RecommendationFilter::new(dec!(0.05), dec!(1000));

        assert!(filter.accepts(&recommendation(dec!(0.40), dec!(0.35), dec!(1000))));
        assert!(!filter.accepts(&recommendation(dec!(0.40), dec!(0.36), dec!(5000))));
        assert!(!filter.accepts(&recommendation(dec!(0.40), dec!(0.30), dec!(999.99))));
    }
}
