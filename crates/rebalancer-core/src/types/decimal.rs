//! 정밀한 금융 계산을 위한 Decimal 유틸리티.

use rust_decimal::{Decimal, RoundingStrategy};

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 보유/주문 수량 타입 (음수 = 숏).
pub type Quantity = Decimal;

/// 포트폴리오 비중 타입 (0.01 = 1%).
pub type Weight = Decimal;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 퍼센트 문자열로 변환합니다 (예: "5.25%").
    fn to_percentage_string(&self) -> String;

    /// 지정된 소수점 자릿수로 반올림합니다 (0.5는 0에서 멀어지는 방향).
    fn round_money(&self, dp: u32) -> Decimal;

    /// 두 값의 차이가 허용 오차 이내인지 확인합니다.
    fn approx_eq(&self, other: Decimal, tolerance: Decimal) -> bool;
}

impl DecimalExt for Decimal {
    fn to_percentage_string(&self) -> String {
        let pct = *self * Decimal::ONE_HUNDRED;
        format!("{:.2}%", pct)
    }

    fn round_money(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
    }

    fn approx_eq(&self, other: Decimal, tolerance: Decimal) -> bool {
        (*self - other).abs() <= tolerance
    }
}
