//! 리밸런싱 서비스.
//!
//! 포지션 저장소, 시세 제공자, 전략 저장소를 묶어 포트폴리오 단위 분석을 수행합니다.
//! 포트폴리오/전략 존재 여부 확인은 엔진이 아닌 이 계층의 책임입니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Instrument};

use rebalancer_core::{
    rebalance_span, EngineSettings, PortfolioId, PortfolioStrategy, Position, PriceMap,
    RebalanceError, RebalanceOutcome, RebalanceResult, Strategy, StrategyId, StrategyType,
    Weight,
};

use crate::engine::QuantityThreshold;
use crate::registry::StrategyRegistry;
use crate::strategies::target_weight::TARGET_WEIGHTS_PARAM;

/// 포트폴리오 포지션 저장소.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// 포트폴리오의 포지션 조회.
    ///
    /// 알 수 없는 포트폴리오면 `RebalanceError::PortfolioNotFound`.
    async fn get_positions_for_portfolio(
        &self,
        portfolio_id: PortfolioId,
    ) -> RebalanceOutcome<Vec<Position>>;
}

/// 현재가 제공자.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// 증권 코드 목록의 현재가 조회. 누락된 항목은 엔진에서 가격 0으로 취급됩니다.
    async fn get_current_prices(&self, secids: &[String]) -> RebalanceOutcome<PriceMap>;
}

/// 전략 저장소.
#[async_trait]
pub trait StrategyRepository: Send + Sync {
    /// 전략 조회. 없으면 `RebalanceError::StrategyNotFound`.
    async fn get_strategy(&self, strategy_id: StrategyId) -> RebalanceOutcome<Strategy>;

    /// 포트폴리오의 활성 전략 연결 조회.
    async fn active_assignment(&self, portfolio_id: PortfolioId) -> Option<PortfolioStrategy>;

    /// 활성 연결에 마지막 리밸런싱 시각 기록. 연결이 없으면 false.
    async fn record_rebalance(&self, portfolio_id: PortfolioId, at: DateTime<Utc>) -> bool;
}

/// 리밸런싱 분석 서비스.
#[derive(Clone)]
pub struct RebalanceService {
    positions: Arc<dyn PositionStore>,
    prices: Arc<dyn PriceProvider>,
    strategies: Arc<dyn StrategyRepository>,
    registry: StrategyRegistry,
    settings: EngineSettings,
}

impl RebalanceService {
    /// 새 서비스 생성.
    pub fn new(
        positions: Arc<dyn PositionStore>,
        prices: Arc<dyn PriceProvider>,
        strategies: Arc<dyn StrategyRepository>,
    ) -> Self {
        Self {
            positions,
            prices,
            strategies,
            registry: StrategyRegistry::builtin(),
            settings: EngineSettings::default(),
        }
    }

    /// 레지스트리를 교체합니다.
    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// 엔진 설정을 교체합니다.
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 포트폴리오 리밸런싱 분석.
    ///
    /// `strategy_id`가 없으면 포트폴리오의 활성 전략을 사용합니다.
    /// `custom_weights`는 목표 비중 전략에만 적용됩니다.
    pub async fn analyze(
        &self,
        portfolio_id: PortfolioId,
        strategy_id: Option<StrategyId>,
        custom_weights: Option<&[(String, Weight)]>,
    ) -> RebalanceOutcome<RebalanceResult> {
        let positions = self.positions.get_positions_for_portfolio(portfolio_id).await?;
        if positions.is_empty() {
            return Err(RebalanceError::EmptyPortfolio(portfolio_id));
        }

        let strategy_id = match strategy_id {
            Some(id) => id,
            None => self
                .strategies
                .active_assignment(portfolio_id)
                .await
                .map(|assignment| assignment.strategy_id)
                .ok_or(RebalanceError::NoActiveStrategy(portfolio_id))?,
        };
        let strategy = self.strategies.get_strategy(strategy_id).await?;

        let mut config = strategy.config.for_type(strategy.strategy_type);
        if let Some(weights) = custom_weights {
            if strategy.strategy_type == StrategyType::TargetWeight {
                // 문자열로 넣어 Decimal 정밀도 유지
                let table: serde_json::Map<String, serde_json::Value> = weights
                    .iter()
                    .map(|(secid, weight)| (secid.clone(), weight.to_string().into()))
                    .collect();
                config = config.with_parameter(TARGET_WEIGHTS_PARAM, table.into());
            } else {
                warn!(
                    portfolio_id,
                    strategy = %strategy.strategy_type,
                    "custom weights ignored for non target-weight strategy"
                );
            }
        }

        let engine = self
            .registry
            .engine(&config, QuantityThreshold::from(&self.settings))?;

        let span = rebalance_span!("analyze", portfolio_id, strategy.strategy_type);
        async move {
            let prices = self.fetch_prices(&positions).await?;
            engine.calculate_rebalance(portfolio_id, &positions, &prices)
        }
        .instrument(span)
        .await
    }

    /// 여러 포트폴리오를 동시에 분석합니다. 각 포트폴리오는 활성 전략을 사용합니다.
    pub async fn analyze_many(
        &self,
        portfolio_ids: &[PortfolioId],
    ) -> Vec<(PortfolioId, RebalanceOutcome<RebalanceResult>)> {
        let analyses = portfolio_ids.iter().map(|&id| async move {
            (id, self.analyze(id, None, None).await)
        });
        join_all(analyses).await
    }

    /// 리밸런싱 추천 적용.
    ///
    /// 실제 주문 실행은 하지 않으며, 확인된 경우 활성 연결의 마지막 리밸런싱 시각만 기록합니다.
    pub async fn apply(&self, portfolio_id: PortfolioId, confirm: bool) -> bool {
        if !confirm {
            return false;
        }
        let recorded = self.strategies.record_rebalance(portfolio_id, Utc::now()).await;
        info!(portfolio_id, recorded, "rebalance applied");
        true
    }

    async fn fetch_prices(&self, positions: &[Position]) -> RebalanceOutcome<PriceMap> {
        let mut secids: Vec<String> = positions.iter().map(|p| p.secid.clone()).collect();
        secids.sort();
        secids.dedup();

        let timeout = Duration::from_millis(self.settings.price_timeout_ms);
        tokio::time::timeout(timeout, self.prices.get_current_prices(&secids))
            .await
            .map_err(|_| {
                RebalanceError::Timeout(format!(
                    "price fetch exceeded {}ms",
                    self.settings.price_timeout_ms
                ))
            })?
    }
}
