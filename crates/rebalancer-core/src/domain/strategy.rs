//! 리밸런싱 전략 정의.
//!
//! - `StrategyType` - 전략 유형 태그
//! - `StrategyConfig` - 임계값과 비용을 제어하는 불변 파라미터 집합
//! - `Strategy` - 저장된 전략 엔티티
//! - `PortfolioStrategy` - 포트폴리오와 전략의 연결

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::PortfolioId;
use crate::error::{RebalanceError, RebalanceOutcome};
use crate::types::Weight;

/// 전략 식별자.
pub type StrategyId = u64;

/// 리밸런싱 전략 유형.
///
/// 표현은 닫힌 enum이지만 동작은 레지스트리가 태그로 디스패치합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// IMOEX 지수 구성 비중을 느슨하게 추종
    LazyIndexTracking,
    /// 사용자가 지정한 목표 비중
    TargetWeight,
    /// 보유 종목 동일 비중
    EqualWeight,
}

impl StrategyType {
    /// 모든 전략 유형.
    pub const ALL: [StrategyType; 3] = [
        StrategyType::LazyIndexTracking,
        StrategyType::TargetWeight,
        StrategyType::EqualWeight,
    ];

    /// 태그 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::LazyIndexTracking => "lazy_index_tracking",
            StrategyType::TargetWeight => "target_weight",
            StrategyType::EqualWeight => "equal_weight",
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyType {
    type Err = RebalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        StrategyType::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| RebalanceError::UnknownStrategyType(s.to_string()))
    }
}

/// 리밸런싱 전략 설정.
///
/// 계산 한 번 동안 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// 전략 유형
    pub strategy_type: StrategyType,

    /// 전략별 추가 파라미터 (예: `target_weights`, `index_weights`)
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,

    /// 최소 거래 금액 (기본값: 1000)
    #[serde(default = "default_min_transaction_amount")]
    pub min_transaction_amount: Decimal,

    /// 기본 필터의 최소 비중 편차 (기본값: 5%)
    #[serde(default = "default_max_weight_deviation")]
    pub max_weight_deviation: Decimal,

    /// 리밸런싱 발동 임계값 (기본값: 2%)
    #[serde(default = "default_rebalance_threshold")]
    pub rebalance_threshold: Decimal,

    /// 거래 수수료율 (기본값: 0.1%)
    #[serde(default = "default_transaction_cost_percent")]
    pub transaction_cost_percent: Decimal,
}

fn default_min_transaction_amount() -> Decimal {
    dec!(1000)
}
fn default_max_weight_deviation() -> Decimal {
    dec!(0.05)
}
fn default_rebalance_threshold() -> Decimal {
    dec!(0.02)
}
fn default_transaction_cost_percent() -> Decimal {
    dec!(0.001)
}

impl StrategyConfig {
    /// 기본 파라미터로 설정을 생성합니다.
    pub fn new(strategy_type: StrategyType) -> Self {
        Self {
            strategy_type,
            parameters: serde_json::Map::new(),
            min_transaction_amount: default_min_transaction_amount(),
            max_weight_deviation: default_max_weight_deviation(),
            rebalance_threshold: default_rebalance_threshold(),
            transaction_cost_percent: default_transaction_cost_percent(),
        }
    }

    /// 최소 거래 금액을 설정합니다.
    pub fn with_min_transaction_amount(mut self, amount: Decimal) -> Self {
        self.min_transaction_amount = amount;
        self
    }

    /// 기본 필터의 비중 편차 임계값을 설정합니다.
    pub fn with_max_weight_deviation(mut self, deviation: Decimal) -> Self {
        self.max_weight_deviation = deviation;
        self
    }

    /// 리밸런싱 임계값을 설정합니다.
    pub fn with_rebalance_threshold(mut self, threshold: Decimal) -> Self {
        self.rebalance_threshold = threshold;
        self
    }

    /// 수수료율을 설정합니다.
    pub fn with_transaction_cost_percent(mut self, percent: Decimal) -> Self {
        self.transaction_cost_percent = percent;
        self
    }

    /// 파라미터를 추가합니다.
    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// 동일한 임계값으로 다른 전략 유형의 설정을 만듭니다.
    pub fn for_type(&self, strategy_type: StrategyType) -> Self {
        Self {
            strategy_type,
            ..self.clone()
        }
    }

    /// 필드 범위를 검증합니다.
    pub fn validate(&self) -> RebalanceOutcome<()> {
        if self.min_transaction_amount < Decimal::ZERO {
            return Err(RebalanceError::InvalidConfig(format!(
                "min_transaction_amount must be >= 0, got {}",
                self.min_transaction_amount
            )));
        }
        if self.transaction_cost_percent < Decimal::ZERO {
            return Err(RebalanceError::InvalidConfig(format!(
                "transaction_cost_percent must be >= 0, got {}",
                self.transaction_cost_percent
            )));
        }
        for (name, value) in [
            ("max_weight_deviation", self.max_weight_deviation),
            ("rebalance_threshold", self.rebalance_threshold),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(RebalanceError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// `parameters`의 비중 테이블(secid → weight)을 읽습니다.
    ///
    /// 값은 숫자 또는 문자열 모두 허용합니다. 키가 없으면 `None`.
    pub fn weight_table(&self, key: &str) -> RebalanceOutcome<Option<Vec<(String, Weight)>>> {
        let Some(value) = self.parameters.get(key) else {
            return Ok(None);
        };

        let object = value.as_object().ok_or_else(|| {
            RebalanceError::InvalidConfig(format!("parameter '{}' must be an object", key))
        })?;

        let mut table = Vec::with_capacity(object.len());
        for (secid, raw) in object {
            let weight = parse_weight(raw).ok_or_else(|| {
                RebalanceError::InvalidConfig(format!(
                    "parameter '{}': weight for {} is not a number",
                    key, secid
                ))
            })?;
            if weight < Decimal::ZERO {
                return Err(RebalanceError::InvalidConfig(format!(
                    "parameter '{}': weight for {} is negative",
                    key, secid
                )));
            }
            table.push((secid.clone(), weight));
        }
        Ok(Some(table))
    }
}

fn parse_weight(raw: &serde_json::Value) -> Option<Decimal> {
    match raw {
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        _ => None,
    }
}

/// 저장된 리밸런싱 전략.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub strategy_type: StrategyType,
    pub config: StrategyConfig,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 포트폴리오에 연결된 전략.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStrategy {
    pub id: u64,
    pub portfolio_id: PortfolioId,
    pub strategy_id: StrategyId,
    pub is_active: bool,
    /// 마지막 리밸런싱 적용 시각
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_rebalance: Option<DateTime<Utc>>,
    /// 예약된 다음 리밸런싱 시각
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_rebalance: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
