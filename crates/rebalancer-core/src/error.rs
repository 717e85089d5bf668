//! 리밸런싱 시스템의 에러 타입.
//!
//! 입력 검증 실패(포트폴리오/전략 부재, 빈 포트폴리오 등)와
//! 외부 협력자(시세 제공자) 실패를 구분합니다.

use thiserror::Error;

use crate::domain::{PortfolioId, StrategyId};

/// 리밸런싱 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RebalanceError {
    /// 포트폴리오를 찾을 수 없음
    #[error("포트폴리오를 찾을 수 없음: {0}")]
    PortfolioNotFound(PortfolioId),

    /// 전략을 찾을 수 없음
    #[error("전략을 찾을 수 없음: {0}")]
    StrategyNotFound(StrategyId),

    /// 포트폴리오에 활성 전략이 없음
    #[error("활성 전략 없음: 포트폴리오 {0}")]
    NoActiveStrategy(PortfolioId),

    /// 레지스트리에 등록되지 않은 전략 유형
    #[error("알 수 없는 전략 유형: {0}")]
    UnknownStrategyType(String),

    /// 포지션이 없는 포트폴리오
    #[error("포지션 없음: 포트폴리오 {0}")]
    EmptyPortfolio(PortfolioId),

    /// 잘못된 전략 설정
    #[error("잘못된 전략 설정: {0}")]
    InvalidConfig(String),

    /// 시세 조회 실패
    #[error("시세 에러: {0}")]
    MarketData(String),

    /// 협력자 호출 타임아웃
    #[error("타임아웃: {0}")]
    Timeout(String),

    /// Decimal 범위를 벗어난 계산
    #[error("산술 오버플로: {0}")]
    Overflow(String),
}

/// 리밸런싱 작업을 위한 Result 타입.
pub type RebalanceOutcome<T> = Result<T, RebalanceError>;

impl RebalanceError {
    /// 재시도 가능한 에러인지 확인합니다.
    ///
    /// 입력 검증 에러는 엔진 오용을 뜻하므로 재시도 대상이 아닙니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RebalanceError::MarketData(_) | RebalanceError::Timeout(_))
    }

    /// 호출자의 잘못된 입력으로 인한 에러인지 확인합니다 (API 계층의 4xx).
    pub fn is_client_error(&self) -> bool {
        !self.is_retryable()
    }
}
