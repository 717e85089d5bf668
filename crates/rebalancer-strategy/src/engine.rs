//! 리밸런싱 의사결정 엔진.
//!
//! 순수 동기 계산입니다. 입력(포지션, 가격 맵)은 호출자가 이미 확보한 값이며
//! 엔진은 공유 가변 상태나 I/O 없이 새 `RebalanceResult`를 생성합니다.
//!
//! 단계:
//! 1. 평가 - `Σ 수량 × 가격` (가격 누락 = 0)
//! 2. 계산기로 목표 비중 산출
//! 3. 가격이 있는 포지션별 편차, 행동, 우선순위, 예상 금액 계산
//! 4. 전략이 제공한 필터 적용
//! 5. 필요 현금 = max(매수 - 매도, 0)

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::{debug, info};

use rebalancer_core::{
    price_of, EngineSettings, PortfolioId, Position, Price, PriceMap, Quantity,
    RebalanceAction, RebalanceError, RebalanceOutcome, RebalanceRecommendation, RebalanceResult,
    StrategyConfig, ThresholdBasis, Weight,
};

use crate::traits::WeightCalculator;

/// 매수/매도 판정용 최소 수량 임계값 산출 방식.
///
/// 임계값 = `min_transaction_amount / 기준 가격`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityThreshold {
    /// 모든 증권에 같은 가정 단가 사용
    AssumedUnitPrice(Price),
    /// 증권 자신의 현재가 사용
    SecurityPrice,
}

impl Default for QuantityThreshold {
    fn default() -> Self {
        QuantityThreshold::AssumedUnitPrice(dec!(100))
    }
}

impl From<&EngineSettings> for QuantityThreshold {
    fn from(settings: &EngineSettings) -> Self {
        match settings.quantity_threshold {
            ThresholdBasis::AssumedUnitPrice => {
                QuantityThreshold::AssumedUnitPrice(settings.assumed_unit_price)
            }
            ThresholdBasis::SecurityPrice => QuantityThreshold::SecurityPrice,
        }
    }
}

impl QuantityThreshold {
    /// 증권 가격과 최소 거래 금액으로 수량 임계값을 계산합니다.
    ///
    /// 기준 가격이 0 이하이면 0, 나눗셈이 범위를 넘으면 `None`.
    pub fn quantity(&self, min_transaction_amount: Decimal, price: Price) -> Option<Quantity> {
        let basis = match self {
            QuantityThreshold::AssumedUnitPrice(assumed) => *assumed,
            QuantityThreshold::SecurityPrice => price,
        };
        if basis <= Decimal::ZERO {
            return Some(Decimal::ZERO);
        }
        min_transaction_amount.checked_div(basis)
    }
}

/// 비중 편차에 따른 우선순위 (1 = 가장 긴급).
///
/// `≥10% → 1`, `≥5% → 2`, `≥2% → 3`, `≥1% → 4`, 그 외 `5`.
pub fn priority_for_deviation(deviation: Weight) -> u8 {
    let deviation = deviation.abs();
    if deviation >= dec!(0.10) {
        1
    } else if deviation >= dec!(0.05) {
        2
    } else if deviation >= dec!(0.02) {
        3
    } else if deviation >= dec!(0.01) {
        4
    } else {
        5
    }
}

/// 포트폴리오 리밸런싱 엔진.
///
/// 선택된 계산기와 그 전략 설정으로 매개변수화됩니다.
pub struct RebalanceEngine {
    calculator: Box<dyn WeightCalculator>,
    config: StrategyConfig,
    quantity_threshold: QuantityThreshold,
}

impl std::fmt::Debug for RebalanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebalanceEngine")
            .field("strategy_type", &self.calculator.strategy_type())
            .field("config", &self.config)
            .field("quantity_threshold", &self.quantity_threshold)
            .finish()
    }
}

impl RebalanceEngine {
    /// 새 엔진 생성.
    pub fn new(calculator: Box<dyn WeightCalculator>, config: StrategyConfig) -> Self {
        Self {
            calculator,
            config,
            quantity_threshold: QuantityThreshold::default(),
        }
    }

    /// 수량 임계값 산출 방식을 설정합니다.
    pub fn with_quantity_threshold(mut self, threshold: QuantityThreshold) -> Self {
        self.quantity_threshold = threshold;
        self
    }

    /// 전략 설정.
    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// 비중 계산기.
    pub fn calculator(&self) -> &dyn WeightCalculator {
        self.calculator.as_ref()
    }

    /// 리밸런싱 계산.
    ///
    /// # 에러
    ///
    /// - 포지션이 비어 있으면 `RebalanceError::EmptyPortfolio`
    /// - 중간 계산이 Decimal 범위를 넘으면 `RebalanceError::Overflow`
    pub fn calculate_rebalance(
        &self,
        portfolio_id: PortfolioId,
        positions: &[Position],
        current_prices: &PriceMap,
    ) -> RebalanceOutcome<RebalanceResult> {
        if positions.is_empty() {
            return Err(RebalanceError::EmptyPortfolio(portfolio_id));
        }

        let positions = consolidate_positions(positions)?;
        let strategy_type = self.calculator.strategy_type();

        let total_value = positions.iter().try_fold(Decimal::ZERO, |acc, p| {
            checked(acc.checked_add(p.market_value(current_prices)?), "total value")
        })?;

        let target_weights = self.calculator.calculate_target_weights(&positions);

        let mut recommendations = Vec::with_capacity(positions.len());
        let mut estimated_total_cost = Decimal::ZERO;

        for position in &positions {
            let price = price_of(current_prices, &position.secid);
            if price <= Decimal::ZERO {
                debug!(secid = %position.secid, "no tradable price, skipped");
                continue;
            }

            let recommendation = self.evaluate_position(
                position,
                price,
                total_value,
                target_weights
                    .get(&position.secid)
                    .copied()
                    .unwrap_or_default(),
            )?;
            estimated_total_cost = checked(
                estimated_total_cost.checked_add(recommendation.estimated_cost),
                "estimated total cost",
            )?;
            recommendations.push(recommendation);
        }

        let filter = self.calculator.recommendation_filter(&self.config);
        let evaluated = recommendations.len();
        recommendations.retain(|r| filter.accepts(r));
        recommendations.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.secid.cmp(&b.secid))
        });

        let cash_required = cash_required(&recommendations)?;
        let estimated_fees = recommendations.iter().try_fold(Decimal::ZERO, |acc, r| {
            let fee = checked(
                r.estimated_cost
                    .checked_mul(self.config.transaction_cost_percent),
                "estimated fees",
            )?;
            checked(acc.checked_add(fee), "estimated fees")
        })?;

        info!(
            portfolio_id,
            strategy = %strategy_type,
            total_value = %total_value,
            evaluated,
            recommended = recommendations.len(),
            cash_required = %cash_required,
            "rebalance calculated"
        );

        Ok(RebalanceResult {
            portfolio_id,
            strategy_type,
            current_total_value: total_value,
            // 단일 기간 리밸런싱은 구성만 바꾸고 규모는 유지
            target_total_value: total_value,
            cash_required,
            total_transactions: recommendations.len(),
            recommendations,
            estimated_total_cost,
            estimated_fees,
            created_at: Utc::now(),
        })
    }

    fn evaluate_position(
        &self,
        position: &Position,
        price: Price,
        total_value: Decimal,
        target_weight: Weight,
    ) -> RebalanceOutcome<RebalanceRecommendation> {
        let secid = position.secid.as_str();
        let current_value = checked(position.quantity.checked_mul(price), secid)?;
        // 총 가치 ≤ 0 (순숏 포함)이면 현재 비중 0
        let current_weight = if total_value <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            checked(current_value.checked_div(total_value), secid)?
        };

        let target_value = checked(total_value.checked_mul(target_weight), secid)?;
        let target_quantity = checked(target_value.checked_div(price), secid)?;
        let quantity_change = checked(target_quantity.checked_sub(position.quantity), secid)?;

        let threshold = checked(
            self.quantity_threshold
                .quantity(self.config.min_transaction_amount, price),
            secid,
        )?;
        let action = if quantity_change > threshold {
            RebalanceAction::Buy
        } else if quantity_change < -threshold {
            RebalanceAction::Sell
        } else {
            RebalanceAction::Hold
        };

        let priority =
            priority_for_deviation(checked(current_weight.checked_sub(target_weight), secid)?);
        let estimated_cost = checked(quantity_change.abs().checked_mul(price), secid)?;

        debug!(
            secid = %position.secid,
            current_weight = %current_weight,
            target_weight = %target_weight,
            quantity_change = %quantity_change,
            action = %action,
            priority,
            "position evaluated"
        );

        Ok(RebalanceRecommendation {
            secid: position.secid.clone(),
            current_quantity: position.quantity,
            current_weight,
            target_weight,
            target_quantity,
            quantity_change,
            action,
            estimated_cost,
            priority,
        })
    }
}

/// 범위 초과(`None`)를 `RebalanceError::Overflow`로 변환합니다.
fn checked(value: Option<Decimal>, context: &str) -> RebalanceOutcome<Decimal> {
    value.ok_or_else(|| RebalanceError::Overflow(context.to_string()))
}

/// 같은 증권 코드의 포지션을 합칩니다 (첫 등장 순서 유지, 평균 단가는 수량 가중).
fn consolidate_positions(positions: &[Position]) -> RebalanceOutcome<Vec<Position>> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(positions.len());
    let mut merged: Vec<Position> = Vec::with_capacity(positions.len());

    for position in positions {
        match index.get(position.secid.as_str()) {
            Some(&i) => {
                let existing = &mut merged[i];
                let secid = position.secid.as_str();
                let quantity = checked(existing.quantity.checked_add(position.quantity), secid)?;
                if !quantity.is_zero() {
                    let cost = checked(
                        existing
                            .avg_cost
                            .checked_mul(existing.quantity)
                            .zip(position.avg_cost.checked_mul(position.quantity))
                            .and_then(|(a, b)| a.checked_add(b))
                            .and_then(|total| total.checked_div(quantity)),
                        secid,
                    )?;
                    existing.avg_cost = cost;
                }
                existing.quantity = quantity;
            }
            None => {
                index.insert(position.secid.as_str(), merged.len());
                merged.push(position.clone());
            }
        }
    }

    Ok(merged)
}

/// 필요 현금: 매수 금액 - 매도 금액, 0 미만은 0.
fn cash_required(recommendations: &[RebalanceRecommendation]) -> RebalanceOutcome<Decimal> {
    let net = recommendations.iter().try_fold(Decimal::ZERO, |acc, r| {
        let next = match r.action {
            RebalanceAction::Buy => acc.checked_add(r.estimated_cost),
            RebalanceAction::Sell => acc.checked_sub(r.estimated_cost),
            RebalanceAction::Hold => Some(acc),
        };
        checked(next, "cash required")
    })?;
    Ok(net.max(Decimal::ZERO))
}
