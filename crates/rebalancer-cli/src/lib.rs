//! 리밸런서 CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 포트폴리오 파일 기반 리밸런싱 분석
//! - 등록된 전략 목록 조회

pub mod commands;
