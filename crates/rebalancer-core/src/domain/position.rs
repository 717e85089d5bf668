//! 보유 포지션과 현재가 맵.
//!
//! 엔진은 포지션을 읽기만 하며, 소유권은 호출자에게 있습니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{RebalanceError, RebalanceOutcome};
use crate::types::{Price, Quantity};

/// 포트폴리오 식별자.
pub type PortfolioId = u64;

/// 증권 코드 (예: "SBER", "GAZP") → 현재가.
///
/// 가격 0은 "현재 거래 불가"를 의미하며 해당 종목은 추천에서 제외됩니다.
pub type PriceMap = HashMap<String, Price>;

/// 포트폴리오에 보유 중인 단일 증권 포지션.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// 증권 코드
    pub secid: String,
    /// 보유 수량 (음수 = 숏)
    pub quantity: Quantity,
    /// 평균 매입 단가
    #[serde(default)]
    pub avg_cost: Price,
}

impl Position {
    /// 새 포지션을 생성합니다.
    pub fn new(secid: impl Into<String>, quantity: Quantity, avg_cost: Price) -> Self {
        Self {
            secid: secid.into(),
            quantity,
            avg_cost,
        }
    }

    /// 주어진 가격 맵으로 평가한 시장 가치. 가격이 없으면 0.
    ///
    /// # 에러
    ///
    /// 수량 × 가격이 Decimal 범위를 넘으면 `RebalanceError::Overflow`.
    pub fn market_value(&self, prices: &PriceMap) -> RebalanceOutcome<Decimal> {
        self.quantity
            .checked_mul(price_of(prices, &self.secid))
            .ok_or_else(|| RebalanceError::Overflow(format!("market value of {}", self.secid)))
    }
}

/// 가격 맵에서 증권 가격을 조회합니다. 누락된 증권은 0으로 취급합니다.
pub fn price_of(prices: &PriceMap, secid: &str) -> Price {
    prices.get(secid).copied().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_value_missing_price_is_zero() {
        let position = Position::new("SBER", dec!(10), dec!(250));
        let mut prices = PriceMap::new();

        assert_eq!(position.market_value(&prices).unwrap(), Decimal::ZERO);

        prices.insert("SBER".to_string(), dec!(300));
        assert_eq!(position.market_value(&prices).unwrap(), dec!(3000));
    }

    #[test]
    fn test_market_value_overflow() {
        let position = Position::new("SBER", dec!(1000000000000000), dec!(0));
        let prices: PriceMap = [("SBER".to_string(), dec!(1000000000000000))].into();

        assert_eq!(
            position.market_value(&prices).unwrap_err(),
            RebalanceError::Overflow("market value of SBER".to_string())
        );
    }

    #[test]
    fn test_deserialize_without_avg_cost() {
        let position: Position =
            serde_json::from_str(r#"{"secid":"LKOH","quantity":"3"}"#).unwrap();
        assert_eq!(position.quantity, dec!(3));
        assert_eq!(position.avg_cost, Decimal::ZERO);
    }
}
