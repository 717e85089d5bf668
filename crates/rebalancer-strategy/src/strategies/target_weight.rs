//! 사용자 지정 목표 비중 전략.
//!
//! `parameters.target_weights` 테이블(또는 분석 시 전달된 사용자 비중)을 보유 종목에 적용합니다.
//! 테이블에 없는 보유 종목은 0 비중(전량 매도 대상)이 됩니다.

use std::collections::HashMap;

use rebalancer_core::{
    Position, RebalanceError, RebalanceOutcome, StrategyConfig, StrategyType, Weight,
};

use super::{normalize_weights, unique_secids};
use crate::traits::{TargetWeights, WeightCalculator};

/// 목표 비중 테이블 파라미터 키.
pub const TARGET_WEIGHTS_PARAM: &str = "target_weights";

/// 목표 비중 계산기.
#[derive(Debug, Clone)]
pub struct TargetWeightCalculator {
    targets: HashMap<String, Weight>,
}

impl TargetWeightCalculator {
    /// 목표 비중 테이블로 계산기 생성.
    pub fn new(targets: impl IntoIterator<Item = (String, Weight)>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }

    /// 설정에서 계산기 생성. `target_weights` 파라미터가 필수입니다.
    pub fn from_config(config: &StrategyConfig) -> RebalanceOutcome<Self> {
        config
            .weight_table(TARGET_WEIGHTS_PARAM)?
            .map(Self::new)
            .ok_or_else(|| {
                RebalanceError::InvalidConfig(format!(
                    "{} strategy requires parameters.{}",
                    StrategyType::TargetWeight,
                    TARGET_WEIGHTS_PARAM
                ))
            })
    }
}

impl WeightCalculator for TargetWeightCalculator {
    fn strategy_type(&self) -> StrategyType {
        StrategyType::TargetWeight
    }

    fn calculate_target_weights(&self, positions: &[Position]) -> TargetWeights {
        let weights: TargetWeights = unique_secids(positions)
            .into_iter()
            .map(|secid| {
                let weight = self.targets.get(secid).copied().unwrap_or_default();
                (secid.to_string(), weight)
            })
            .collect();

        normalize_weights(weights)
    }
}
