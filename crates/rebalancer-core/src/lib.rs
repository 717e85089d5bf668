//! # Rebalancer Core
//!
//! 포트폴리오 리밸런싱 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 리밸런싱 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 보유 포지션 및 가격 맵
//! - 전략 설정 및 전략 유형 태그
//! - 리밸런싱 추천 및 결과 값 객체
//! - 에러 분류
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use self::config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
