//! 전략 레지스트리.
//!
//! 전략 유형 태그를 `WeightCalculator` 생성자로 매핑합니다.
//! 등록은 정적 설정이며 시작 이후 변경되지 않습니다.

use serde_json::json;

use rebalancer_core::{RebalanceError, RebalanceOutcome, StrategyConfig, StrategyType};

use crate::engine::{QuantityThreshold, RebalanceEngine};
use crate::strategies::{EqualWeightCalculator, LazyIndexTrackingCalculator, TargetWeightCalculator};
use crate::traits::WeightCalculator;

/// 전략 설정으로 계산기를 생성하는 팩토리 함수.
pub type CalculatorFactory = fn(&StrategyConfig) -> RebalanceOutcome<Box<dyn WeightCalculator>>;

/// 등록된 전략 항목.
#[derive(Clone, Copy)]
pub struct StrategyEntry {
    /// 전략 유형 태그
    pub strategy_type: StrategyType,
    /// 표시 이름
    pub name: &'static str,
    /// 전략 설명
    pub description: &'static str,
    /// 팩토리 함수
    pub factory: CalculatorFactory,
}

impl std::fmt::Debug for StrategyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyEntry")
            .field("strategy_type", &self.strategy_type)
            .field("name", &self.name)
            .field("factory", &"<fn>")
            .finish()
    }
}

fn lazy_index_factory(config: &StrategyConfig) -> RebalanceOutcome<Box<dyn WeightCalculator>> {
    Ok(Box::new(LazyIndexTrackingCalculator::from_config(config)?))
}

fn target_weight_factory(config: &StrategyConfig) -> RebalanceOutcome<Box<dyn WeightCalculator>> {
    Ok(Box::new(TargetWeightCalculator::from_config(config)?))
}

fn equal_weight_factory(_config: &StrategyConfig) -> RebalanceOutcome<Box<dyn WeightCalculator>> {
    Ok(Box::new(EqualWeightCalculator))
}

/// 내장 전략 목록.
pub static BUILTIN_STRATEGIES: [StrategyEntry; 3] = [
    StrategyEntry {
        strategy_type: StrategyType::LazyIndexTracking,
        name: "Lazy IMOEX tracking",
        description: "IMOEX 구성 비중을 느슨하게 추종 (필터 임계값 = 2 × rebalance_threshold)",
        factory: lazy_index_factory,
    },
    StrategyEntry {
        strategy_type: StrategyType::TargetWeight,
        name: "Target weights",
        description: "parameters.target_weights에 지정한 비중으로 리밸런싱",
        factory: target_weight_factory,
    },
    StrategyEntry {
        strategy_type: StrategyType::EqualWeight,
        name: "Equal weight",
        description: "보유 종목 동일 비중",
        factory: equal_weight_factory,
    },
];

/// 전략 레지스트리 조회 API.
#[derive(Debug, Clone, Copy)]
pub struct StrategyRegistry {
    entries: &'static [StrategyEntry],
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StrategyRegistry {
    /// 주어진 항목으로 레지스트리 생성.
    pub const fn new(entries: &'static [StrategyEntry]) -> Self {
        Self { entries }
    }

    /// 내장 전략 레지스트리.
    pub fn builtin() -> Self {
        Self::new(&BUILTIN_STRATEGIES)
    }

    /// 모든 등록 항목.
    pub fn all(&self) -> impl Iterator<Item = &'static StrategyEntry> {
        self.entries.iter()
    }

    /// 태그로 팩토리 조회.
    ///
    /// # 에러
    ///
    /// 등록되지 않은 태그면 `RebalanceError::UnknownStrategyType`.
    pub fn resolve(&self, tag: &str) -> RebalanceOutcome<CalculatorFactory> {
        let query = tag.trim().to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.strategy_type.as_str() == query)
            .map(|entry| entry.factory)
            .ok_or_else(|| RebalanceError::UnknownStrategyType(tag.to_string()))
    }

    /// 설정을 검증하고 설정의 전략 유형에 맞는 계산기를 생성.
    pub fn create(&self, config: &StrategyConfig) -> RebalanceOutcome<Box<dyn WeightCalculator>> {
        config.validate()?;
        let factory = self.resolve(config.strategy_type.as_str())?;
        factory(config)
    }

    /// 설정으로 엔진 생성.
    pub fn engine(
        &self,
        config: &StrategyConfig,
        threshold: QuantityThreshold,
    ) -> RebalanceOutcome<RebalanceEngine> {
        let calculator = self.create(config)?;
        Ok(RebalanceEngine::new(calculator, config.clone()).with_quantity_threshold(threshold))
    }

    /// 등록된 태그 목록.
    pub fn list_tags(&self) -> Vec<&'static str> {
        self.all().map(|entry| entry.strategy_type.as_str()).collect()
    }

    /// 전략 목록 (JSON).
    pub fn to_json(&self) -> serde_json::Value {
        let strategies: Vec<_> = self
            .all()
            .map(|entry| {
                json!({
                    "id": entry.strategy_type,
                    "name": entry.name,
                    "description": entry.description,
                })
            })
            .collect();
        json!({ "strategies": strategies })
    }
}
