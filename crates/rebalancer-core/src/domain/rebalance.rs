//! 리밸런싱 계산 결과 값 객체.
//!
//! 계산마다 새로 생성되며 생성 후에는 변경되지 않습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{PortfolioId, StrategyType};
use crate::types::{Price, Quantity, Weight};

/// 리밸런싱 추천 행동.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for RebalanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceAction::Buy => write!(f, "BUY"),
            RebalanceAction::Sell => write!(f, "SELL"),
            RebalanceAction::Hold => write!(f, "HOLD"),
        }
    }
}

/// 단일 증권에 대한 리밸런싱 추천.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceRecommendation {
    /// 증권 코드
    pub secid: String,
    /// 현재 보유 수량
    pub current_quantity: Quantity,
    /// 현재 비중 (0 ~ 1)
    pub current_weight: Weight,
    /// 목표 비중 (0 ~ 1)
    pub target_weight: Weight,
    /// 목표 수량
    pub target_quantity: Quantity,
    /// 수량 변화 (목표 - 현재)
    pub quantity_change: Quantity,
    /// 추천 행동
    pub action: RebalanceAction,
    /// 예상 거래 금액 (|수량 변화| * 가격)
    pub estimated_cost: Price,
    /// 우선순위 (1 = 가장 긴급, 5 = 가장 낮음)
    pub priority: u8,
}

impl RebalanceRecommendation {
    /// 현재 비중과 목표 비중의 절대 편차.
    pub fn weight_deviation(&self) -> Weight {
        (self.current_weight - self.target_weight).abs()
    }
}

/// 포트폴리오 리밸런싱 분석 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceResult {
    pub portfolio_id: PortfolioId,
    pub strategy_type: StrategyType,
    /// 현재 포트폴리오 총 가치
    pub current_total_value: Decimal,
    /// 목표 총 가치 (단일 기간 리밸런싱에서는 현재 가치와 동일)
    pub target_total_value: Decimal,
    /// 필요 현금 (순매수 금액, 0 이상)
    pub cash_required: Decimal,
    /// 필터를 통과한 추천 (우선순위, 증권 코드 순)
    pub recommendations: Vec<RebalanceRecommendation>,
    pub total_transactions: usize,
    /// 가격이 있는 모든 포지션의 예상 거래 금액 합계 (필터 전)
    pub estimated_total_cost: Decimal,
    /// 통과한 추천에 대한 예상 수수료
    pub estimated_fees: Decimal,
    pub created_at: DateTime<Utc>,
}

impl RebalanceResult {
    /// 추천이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    /// 매수 추천만 반환합니다.
    pub fn buy_recommendations(&self) -> Vec<&RebalanceRecommendation> {
        self.by_action(RebalanceAction::Buy)
    }

    /// 매도 추천만 반환합니다.
    pub fn sell_recommendations(&self) -> Vec<&RebalanceRecommendation> {
        self.by_action(RebalanceAction::Sell)
    }

    /// 증권 코드로 추천을 찾습니다.
    pub fn recommendation(&self, secid: &str) -> Option<&RebalanceRecommendation> {
        self.recommendations.iter().find(|r| r.secid == secid)
    }

    fn by_action(&self, action: RebalanceAction) -> Vec<&RebalanceRecommendation> {
        self.recommendations
            .iter()
            .filter(|r| r.action == action)
            .collect()
    }
}
