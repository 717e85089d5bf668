//! IMOEX 지수 느슨한 추종 전략.
//!
//! 보유 종목 중 지수 구성 종목에는 지수 비중을 부여하고, 나머지 종목에는
//! 남은 비중을 균등 분배한 뒤 전체를 정규화합니다. 잦은 거래를 피하기 위해
//! 필터 임계값은 `rebalance_threshold`의 2배를 사용합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::debug;

use rebalancer_core::{
    Position, RebalanceOutcome, StrategyConfig, StrategyType, Weight,
};

use super::{normalize_weights, unique_secids};
use crate::traits::{RecommendationFilter, TargetWeights, WeightCalculator};

/// `parameters`에서 지수 비중 테이블을 재정의하는 키.
pub const INDEX_WEIGHTS_PARAM: &str = "index_weights";

/// IMOEX 주요 구성 종목 비중 (근사치).
pub const IMOEX_WEIGHTS: [(&str, Weight); 20] = [
    ("SBER", dec!(0.141)),
    ("GAZP", dec!(0.108)),
    ("LKOH", dec!(0.081)),
    ("YNDX", dec!(0.073)),
    ("GMKN", dec!(0.056)),
    ("NVTK", dec!(0.045)),
    ("ROSN", dec!(0.044)),
    ("TCSG", dec!(0.041)),
    ("PLZL", dec!(0.039)),
    ("MTSS", dec!(0.037)),
    ("MAGN", dec!(0.032)),
    ("NLMK", dec!(0.031)),
    ("RUAL", dec!(0.027)),
    ("CHMF", dec!(0.026)),
    ("ALRS", dec!(0.024)),
    ("VTBR", dec!(0.023)),
    ("TATN", dec!(0.022)),
    ("HYDR", dec!(0.021)),
    ("SNGS", dec!(0.018)),
    ("MOEX", dec!(0.017)),
];

/// 지수 추종 비중 계산기.
#[derive(Debug, Clone)]
pub struct LazyIndexTrackingCalculator {
    reference: HashMap<String, Weight>,
}

impl Default for LazyIndexTrackingCalculator {
    fn default() -> Self {
        Self::with_reference(
            IMOEX_WEIGHTS
                .iter()
                .map(|(secid, weight)| (secid.to_string(), *weight)),
        )
    }
}

impl LazyIndexTrackingCalculator {
    /// 내장 IMOEX 테이블로 계산기 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 사용자 지정 지수 구성 테이블로 계산기 생성.
    pub fn with_reference(reference: impl IntoIterator<Item = (String, Weight)>) -> Self {
        Self {
            reference: reference.into_iter().collect(),
        }
    }

    /// 설정에서 계산기 생성. `index_weights` 파라미터가 있으면 내장 테이블을 대체합니다.
    pub fn from_config(config: &StrategyConfig) -> RebalanceOutcome<Self> {
        Ok(match config.weight_table(INDEX_WEIGHTS_PARAM)? {
            Some(table) => Self::with_reference(table),
            None => Self::default(),
        })
    }

    /// 증권의 지수 비중.
    pub fn reference_weight(&self, secid: &str) -> Option<Weight> {
        self.reference.get(secid).copied()
    }
}

impl WeightCalculator for LazyIndexTrackingCalculator {
    fn strategy_type(&self) -> StrategyType {
        StrategyType::LazyIndexTracking
    }

    fn calculate_target_weights(&self, positions: &[Position]) -> TargetWeights {
        let secids = unique_secids(positions);
        if secids.is_empty() {
            return TargetWeights::new();
        }

        let mut weights = TargetWeights::new();
        let mut matched_weight = Decimal::ZERO;
        let mut unmatched = Vec::new();

        for secid in secids {
            match self.reference_weight(secid) {
                Some(weight) => {
                    matched_weight += weight;
                    weights.insert(secid.to_string(), weight);
                }
                None => unmatched.push(secid),
            }
        }

        // 지수에 없는 종목은 남은 비중을 균등 분배
        let residual = Decimal::ONE - matched_weight;
        let share = if residual > Decimal::ZERO && !unmatched.is_empty() {
            residual / Decimal::from(unmatched.len())
        } else {
            Decimal::ZERO
        };
        for secid in &unmatched {
            weights.insert(secid.to_string(), share);
        }

        debug!(
            matched = weights.len() - unmatched.len(),
            unmatched = unmatched.len(),
            matched_weight = %matched_weight,
            "index weights assigned"
        );

        normalize_weights(weights)
    }

    fn recommendation_filter(&self, config: &StrategyConfig) -> RecommendationFilter {
        RecommendationFilter::new(
            config.rebalance_threshold * Decimal::TWO,
            config.min_transaction_amount,
        )
    }
}
