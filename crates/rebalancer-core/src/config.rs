//! 설정 관리.
//!
//! TOML 파일과 `REBALANCER__` 접두사 환경 변수에서 애플리케이션 설정을 로드합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{StrategyConfig, StrategyType};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 리밸런싱 엔진 설정
    #[serde(default)]
    pub engine: EngineSettings,
    /// 새 전략에 적용되는 기본 임계값
    #[serde(default)]
    pub strategy_defaults: StrategyDefaults,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 매수/매도/보유 판정용 최소 수량 임계값의 기준 가격.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdBasis {
    /// 고정 가정 단가로 나눔 (기존 동작)
    #[default]
    AssumedUnitPrice,
    /// 해당 증권의 실제 가격으로 나눔
    SecurityPrice,
}

/// 리밸런싱 엔진 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    /// 수량 임계값 기준
    #[serde(default)]
    pub quantity_threshold: ThresholdBasis,
    /// `AssumedUnitPrice` 기준에서 사용하는 가정 단가
    #[serde(default = "default_assumed_unit_price")]
    pub assumed_unit_price: Decimal,
    /// 시세 조회 타임아웃 (밀리초)
    #[serde(default = "default_price_timeout_ms")]
    pub price_timeout_ms: u64,
}

fn default_assumed_unit_price() -> Decimal {
    dec!(100)
}
fn default_price_timeout_ms() -> u64 {
    5_000
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            quantity_threshold: ThresholdBasis::default(),
            assumed_unit_price: default_assumed_unit_price(),
            price_timeout_ms: default_price_timeout_ms(),
        }
    }
}

/// 전략 기본 임계값.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyDefaults {
    pub min_transaction_amount: Decimal,
    pub max_weight_deviation: Decimal,
    pub rebalance_threshold: Decimal,
    pub transaction_cost_percent: Decimal,
}

impl Default for StrategyDefaults {
    fn default() -> Self {
        let base = StrategyConfig::new(StrategyType::LazyIndexTracking);
        Self {
            min_transaction_amount: base.min_transaction_amount,
            max_weight_deviation: base.max_weight_deviation,
            rebalance_threshold: base.rebalance_threshold,
            transaction_cost_percent: base.transaction_cost_percent,
        }
    }
}

impl StrategyDefaults {
    /// 기본 임계값으로 전략 설정을 생성합니다.
    pub fn to_config(&self, strategy_type: StrategyType) -> StrategyConfig {
        StrategyConfig::new(strategy_type)
            .with_min_transaction_amount(self.min_transaction_amount)
            .with_max_weight_deviation(self.max_weight_deviation)
            .with_rebalance_threshold(self.rebalance_threshold)
            .with_transaction_cost_percent(self.transaction_cost_percent)
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ::config::ConfigError> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()))
            .add_source(env_source());

        builder.build()?.try_deserialize()
    }

    /// 파일 없이 기본값과 환경 변수만으로 설정을 로드합니다.
    pub fn from_env() -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }

    /// TOML 문자열에서 설정을 로드합니다.
    pub fn from_toml_str(content: &str) -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .add_source(::config::File::from_str(content, ::config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn env_source() -> ::config::Environment {
    ::config::Environment::with_prefix("REBALANCER")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
