//! 메모리 기반 협력자 구현.
//!
//! 테스트와 CLI에서 사용하는 포트폴리오/전략 저장소 및 고정 시세 제공자입니다.
//! 전역 싱글턴 없이 인스턴스마다 상태를 가집니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use rebalancer_core::{
    PortfolioId, PortfolioStrategy, Position, PriceMap, RebalanceError, RebalanceOutcome,
    Strategy, StrategyConfig, StrategyId,
};

use crate::service::{PositionStore, PriceProvider, StrategyRepository};

/// 메모리 기반 포트폴리오 포지션 저장소.
#[derive(Debug, Default)]
pub struct InMemoryPortfolioBook {
    portfolios: RwLock<HashMap<PortfolioId, Vec<Position>>>,
}

impl InMemoryPortfolioBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// 포트폴리오의 포지션 전체를 교체합니다 (없으면 생성).
    pub async fn set_positions(&self, portfolio_id: PortfolioId, positions: Vec<Position>) {
        self.portfolios.write().await.insert(portfolio_id, positions);
    }

    /// 포트폴리오에 포지션을 추가합니다.
    pub async fn add_position(&self, portfolio_id: PortfolioId, position: Position) {
        self.portfolios
            .write()
            .await
            .entry(portfolio_id)
            .or_default()
            .push(position);
    }

    /// 포트폴리오를 삭제합니다.
    pub async fn remove_portfolio(&self, portfolio_id: PortfolioId) -> bool {
        self.portfolios.write().await.remove(&portfolio_id).is_some()
    }
}

#[async_trait]
impl PositionStore for InMemoryPortfolioBook {
    async fn get_positions_for_portfolio(
        &self,
        portfolio_id: PortfolioId,
    ) -> RebalanceOutcome<Vec<Position>> {
        self.portfolios
            .read()
            .await
            .get(&portfolio_id)
            .cloned()
            .ok_or(RebalanceError::PortfolioNotFound(portfolio_id))
    }
}

/// 고정된 가격 맵을 반환하는 시세 제공자.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceProvider {
    prices: PriceMap,
}

impl StaticPriceProvider {
    pub fn new(prices: PriceMap) -> Self {
        Self { prices }
    }
}

#[async_trait]
impl PriceProvider for StaticPriceProvider {
    async fn get_current_prices(&self, secids: &[String]) -> RebalanceOutcome<PriceMap> {
        Ok(secids
            .iter()
            .filter_map(|secid| {
                self.prices
                    .get(secid)
                    .map(|price| (secid.clone(), *price))
            })
            .collect())
    }
}

/// 전략 수정 요청. `None` 필드는 유지됩니다.
#[derive(Debug, Clone, Default)]
pub struct StrategyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub config: Option<StrategyConfig>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default)]
struct StrategyBook {
    strategies: BTreeMap<StrategyId, Strategy>,
    assignments: BTreeMap<u64, PortfolioStrategy>,
    next_strategy_id: StrategyId,
    next_assignment_id: u64,
}

impl StrategyBook {
    fn active_assignment_mut(&mut self, portfolio_id: PortfolioId) -> Option<&mut PortfolioStrategy> {
        self.assignments
            .values_mut()
            .find(|a| a.portfolio_id == portfolio_id && a.is_active)
    }
}

/// 메모리 기반 전략 저장소 (전략 CRUD + 포트폴리오 연결).
#[derive(Debug, Default)]
pub struct InMemoryStrategyRepository {
    book: RwLock<StrategyBook>,
}

impl InMemoryStrategyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 전략 생성. 전략 유형은 설정에서 가져옵니다.
    pub async fn create(
        &self,
        name: impl Into<String>,
        config: StrategyConfig,
        description: Option<String>,
    ) -> RebalanceOutcome<Strategy> {
        config.validate()?;

        let mut book = self.book.write().await;
        book.next_strategy_id += 1;
        let now = Utc::now();
        let strategy = Strategy {
            id: book.next_strategy_id,
            name: name.into(),
            description,
            strategy_type: config.strategy_type,
            config,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(strategy_id = strategy.id, strategy = %strategy.strategy_type, "strategy created");
        book.strategies.insert(strategy.id, strategy.clone());
        Ok(strategy)
    }

    /// 전략 조회.
    pub async fn get(&self, strategy_id: StrategyId) -> Option<Strategy> {
        self.book.read().await.strategies.get(&strategy_id).cloned()
    }

    /// 전략 목록 (ID 순).
    pub async fn list(&self, active_only: bool) -> Vec<Strategy> {
        self.book
            .read()
            .await
            .strategies
            .values()
            .filter(|s| !active_only || s.is_active)
            .cloned()
            .collect()
    }

    /// 전략 수정. 전략이 없으면 `None`.
    pub async fn update(
        &self,
        strategy_id: StrategyId,
        update: StrategyUpdate,
    ) -> RebalanceOutcome<Option<Strategy>> {
        if let Some(config) = &update.config {
            config.validate()?;
        }

        let mut book = self.book.write().await;
        let Some(strategy) = book.strategies.get_mut(&strategy_id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            strategy.name = name;
        }
        if let Some(description) = update.description {
            strategy.description = Some(description);
        }
        if let Some(config) = update.config {
            strategy.strategy_type = config.strategy_type;
            strategy.config = config;
        }
        if let Some(is_active) = update.is_active {
            strategy.is_active = is_active;
        }
        strategy.updated_at = Utc::now();

        Ok(Some(strategy.clone()))
    }

    /// 전략 삭제. 해당 전략의 포트폴리오 연결도 함께 삭제합니다.
    pub async fn delete(&self, strategy_id: StrategyId) -> bool {
        let mut book = self.book.write().await;
        if book.strategies.remove(&strategy_id).is_none() {
            return false;
        }
        book.assignments.retain(|_, a| a.strategy_id != strategy_id);
        true
    }

    /// 포트폴리오에 전략 연결. 기존 활성 연결은 비활성화됩니다.
    pub async fn assign(
        &self,
        portfolio_id: PortfolioId,
        strategy_id: StrategyId,
    ) -> RebalanceOutcome<PortfolioStrategy> {
        let mut book = self.book.write().await;
        if !book.strategies.contains_key(&strategy_id) {
            return Err(RebalanceError::StrategyNotFound(strategy_id));
        }

        for assignment in book.assignments.values_mut() {
            if assignment.portfolio_id == portfolio_id {
                assignment.is_active = false;
            }
        }

        book.next_assignment_id += 1;
        let assignment = PortfolioStrategy {
            id: book.next_assignment_id,
            portfolio_id,
            strategy_id,
            is_active: true,
            last_rebalance: None,
            next_rebalance: None,
            created_at: Utc::now(),
        };
        book.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    /// 포트폴리오의 활성 연결 해제.
    pub async fn unassign(&self, portfolio_id: PortfolioId) -> bool {
        let mut book = self.book.write().await;
        match book.active_assignment_mut(portfolio_id) {
            Some(assignment) => {
                assignment.is_active = false;
                true
            }
            None => false,
        }
    }

    /// 다음 자동 리밸런싱 시각 예약. 활성 연결이 없으면 false.
    pub async fn schedule_rebalance(&self, portfolio_id: PortfolioId, at: DateTime<Utc>) -> bool {
        let mut book = self.book.write().await;
        match book.active_assignment_mut(portfolio_id) {
            Some(assignment) => {
                assignment.next_rebalance = Some(at);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl StrategyRepository for InMemoryStrategyRepository {
    async fn get_strategy(&self, strategy_id: StrategyId) -> RebalanceOutcome<Strategy> {
        self.get(strategy_id)
            .await
            .ok_or(RebalanceError::StrategyNotFound(strategy_id))
    }

    async fn active_assignment(&self, portfolio_id: PortfolioId) -> Option<PortfolioStrategy> {
        self.book
            .read()
            .await
            .assignments
            .values()
            .find(|a| a.portfolio_id == portfolio_id && a.is_active)
            .cloned()
    }

    async fn record_rebalance(&self, portfolio_id: PortfolioId, at: DateTime<Utc>) -> bool {
        let mut book = self.book.write().await;
        match book.active_assignment_mut(portfolio_id) {
            Some(assignment) => {
                assignment.last_rebalance = Some(at);
                true
            }
            None => false,
        }
    }
}
