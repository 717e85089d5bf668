//! 리밸런싱 계산을 위한 도메인 모델.

mod position;
mod rebalance;
mod strategy;

pub use position::*;
pub use rebalance::*;
pub use strategy::*;
