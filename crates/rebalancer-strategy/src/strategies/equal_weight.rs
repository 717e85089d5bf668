//! 동일 비중 전략.

use rebalancer_core::{Position, StrategyType};

use super::{equal_weights, unique_secids};
use crate::traits::{TargetWeights, WeightCalculator};

/// 보유 종목마다 1/N 비중을 부여하는 계산기.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeightCalculator;

impl WeightCalculator for EqualWeightCalculator {
    fn strategy_type(&self) -> StrategyType {
        StrategyType::EqualWeight
    }

    fn calculate_target_weights(&self, positions: &[Position]) -> TargetWeights {
        equal_weights(&unique_secids(positions))
    }
}
