//! 내장 리밸런싱 전략.
//!
//! - **lazy_index**: IMOEX 구성 비중 느슨한 추종
//! - **target_weight**: 사용자 지정 목표 비중
//! - **equal_weight**: 보유 종목 동일 비중

pub mod equal_weight;
pub mod lazy_index;
pub mod target_weight;

pub use equal_weight::EqualWeightCalculator;
pub use lazy_index::LazyIndexTrackingCalculator;
pub use target_weight::TargetWeightCalculator;

use rust_decimal::Decimal;
use std::collections::HashSet;

use rebalancer_core::Position;

use crate::traits::TargetWeights;

/// 입력 순서를 유지하며 중복을 제거한 증권 코드 목록.
pub(crate) fn unique_secids(positions: &[Position]) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(positions.len());
    positions
        .iter()
        .map(|p| p.secid.as_str())
        .filter(|secid| seen.insert(*secid))
        .collect()
}

/// 모든 증권에 1/N 비중 할당.
pub(crate) fn equal_weights(secids: &[&str]) -> TargetWeights {
    if secids.is_empty() {
        return TargetWeights::new();
    }
    let share = Decimal::ONE / Decimal::from(secids.len());
    secids.iter().map(|s| (s.to_string(), share)).collect()
}

/// 비중을 합계 1.0으로 정규화.
///
/// 합계가 0이면 동일 비중으로 대체합니다.
pub(crate) fn normalize_weights(weights: TargetWeights) -> TargetWeights {
    let total: Decimal = weights.values().copied().sum();

    if total <= Decimal::ZERO {
        let secids: Vec<&str> = weights.keys().map(String::as_str).collect();
        return equal_weights(&secids);
    }

    weights
        .into_iter()
        .map(|(secid, weight)| (secid, weight / total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_weights() {
        let weights: TargetWeights = [("SPY".to_string(), dec!(60)), ("TLT".to_string(), dec!(40))]
            .into_iter()
            .collect();

        let normalized = normalize_weights(weights);

        assert_eq!(normalized["SPY"], dec!(0.6));
        assert_eq!(normalized["TLT"], dec!(0.4));
    }

    #[test]
    fn test_normalize_all_zero_falls_back_to_equal() {
        let weights: TargetWeights = [("A".to_string(), dec!(0)), ("B".to_string(), dec!(0))]
            .into_iter()
            .collect();

        let normalized = normalize_weights(weights);

        assert_eq!(normalized["A"], dec!(0.5));
        assert_eq!(normalized["B"], dec!(0.5));
    }

    #[test]
    fn test_unique_secids_keeps_first_seen_order() {
        let positions = vec![
            Position::new("GAZP", dec!(1), dec!(0)),
            Position::new("SBER", dec!(1), dec!(0)),
            Position::new("GAZP", dec!(2), dec!(0)),
        ];
        assert_eq!(unique_secids(&positions), vec!["GAZP", "SBER"]);
    }
}
