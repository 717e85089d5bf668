//! 리밸런싱 전략 및 의사결정 엔진.
//!
//! 이 크레이트가 제공하는 기능:
//! - 목표 비중 계산을 위한 `WeightCalculator` trait 및 내장 전략
//!   (지수 추종, 목표 비중, 동일 비중)
//! - 평가, 편차 계산, 행동 분류, 필터링을 수행하는 `RebalanceEngine`
//! - 전략 유형 태그를 계산기로 매핑하는 정적 `StrategyRegistry`
//! - 저장소/시세 협력자를 묶는 `RebalanceService`
//!
//! # 예제
//!
//! ```rust,ignore
//! use rebalancer_core::{Position, PriceMap, StrategyConfig, StrategyType};
//! use rebalancer_strategy::StrategyRegistry;
//! use rust_decimal_macros::dec;
//!
//! let positions = vec![
//!     Position::new("SBER", dec!(100), dec!(90)),
//!     Position::new("GAZP", dec!(100), dec!(110)),
//! ];
//! let prices: PriceMap = [("SBER".into(), dec!(100)), ("GAZP".into(), dec!(100))].into();
//!
//! let config = StrategyConfig::new(StrategyType::LazyIndexTracking);
//! let engine = StrategyRegistry::builtin().engine(&config, Default::default())?;
//! let result = engine.calculate_rebalance(1, &positions, &prices)?;
//! ```

pub mod engine;
pub mod memory;
pub mod registry;
pub mod service;
pub mod strategies;
pub mod traits;

// 주요 타입 재내보내기
pub use engine::{priority_for_deviation, QuantityThreshold, RebalanceEngine};
pub use memory::{InMemoryPortfolioBook, InMemoryStrategyRepository, StaticPriceProvider, StrategyUpdate};
pub use registry::{CalculatorFactory, StrategyEntry, StrategyRegistry};
pub use service::{PositionStore, PriceProvider, RebalanceService, StrategyRepository};
pub use strategies::{EqualWeightCalculator, LazyIndexTrackingCalculator, TargetWeightCalculator};
pub use traits::{RecommendationFilter, TargetWeights, WeightCalculator};
