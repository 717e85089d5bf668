//! 리밸런싱 분석 명령어.
//!
//! 포트폴리오 파일(포지션, 현재가, 전략 설정)을 읽어 메모리 저장소에 적재하고
//! 리밸런싱 서비스로 추천을 계산합니다.
//!
//! # 사용 예시
//!
//! ```bash
//! # 파일에 정의된 전략으로 분석
//! rebalancer analyze -i config/sample_portfolio.toml
//!
//! # 전략 유형 지정 + 결과 저장
//! rebalancer analyze -i config/sample_portfolio.toml -s equal_weight -o out/result.json
//!
//! # 확장자가 .json이 아니면 텍스트 요약으로 저장
//! rebalancer analyze -i config/sample_portfolio.toml -o out/summary.txt
//! ```

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use rebalancer_core::{
    AppConfig, DecimalExt, PortfolioId, Position, PriceMap, RebalanceResult, StrategyConfig, StrategyType,
};
use rebalancer_strategy::{
    InMemoryPortfolioBook, InMemoryStrategyRepository, RebalanceService, StaticPriceProvider,
};

/// 분석 CLI 설정
#[derive(Debug, Clone, Default)]
pub struct AnalyzeCliConfig {
    /// 포트폴리오 파일 경로 (TOML 또는 JSON)
    pub input_path: String,
    /// 전략 유형 재정의 (옵션)
    pub strategy: Option<String>,
    /// 결과 저장 경로 (옵션, 없으면 stdout)
    pub output_path: Option<String>,
}

/// 포트폴리오 파일 형식
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioFile {
    /// 포트폴리오 ID
    #[serde(default = "default_portfolio_id")]
    pub portfolio_id: PortfolioId,
    /// 전략 이름
    #[serde(default)]
    pub name: Option<String>,
    /// 보유 포지션
    #[serde(default)]
    pub positions: Vec<Position>,
    /// 증권별 현재가
    #[serde(default)]
    pub prices: PriceMap,
    /// 전략 설정 (없으면 애플리케이션 기본값 + 지수 추종)
    #[serde(default)]
    pub strategy: Option<StrategyConfig>,
    /// 분석 시점에 적용할 목표 비중 (target_weight 전략 전용)
    #[serde(default)]
    pub custom_weights: Option<BTreeMap<String, Decimal>>,
}

fn default_portfolio_id() -> PortfolioId {
    1
}

/// 리밸런싱 분석 실행
pub async fn run_analyze(config: &AnalyzeCliConfig, app: &AppConfig) -> Result<RebalanceResult> {
    info!("Running rebalance analysis for {}", config.input_path);

    let portfolio = load_portfolio_file(&config.input_path)?;
    let result = analyze_portfolio(portfolio, config.strategy.as_deref(), app).await?;

    match &config.output_path {
        Some(path) => {
            save_result(&result, path)?;
            info!("Result saved to {}", path);
        }
        None => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(result)
}

/// 파싱된 포트폴리오를 메모리 저장소에 적재하고 분석합니다.
pub async fn analyze_portfolio(
    portfolio: PortfolioFile,
    strategy_override: Option<&str>,
    app: &AppConfig,
) -> Result<RebalanceResult> {
    let strategy_config = resolve_strategy_config(&portfolio, strategy_override, app)?;
    let portfolio_id = portfolio.portfolio_id;
    debug!(
        portfolio_id,
        positions = portfolio.positions.len(),
        prices = portfolio.prices.len(),
        strategy = %strategy_config.strategy_type,
        "portfolio loaded"
    );

    let book = Arc::new(InMemoryPortfolioBook::new());
    book.set_positions(portfolio_id, portfolio.positions).await;

    let repo = Arc::new(InMemoryStrategyRepository::new());
    let name = portfolio
        .name
        .unwrap_or_else(|| strategy_config.strategy_type.to_string());
    let strategy = repo
        .create(name, strategy_config, None)
        .await
        .context("invalid strategy config")?;
    repo.assign(portfolio_id, strategy.id).await?;

    let service = RebalanceService::new(
        book,
        Arc::new(StaticPriceProvider::new(portfolio.prices)),
        repo,
    )
    .with_settings(app.engine.clone());

    let custom_weights: Option<Vec<(String, Decimal)>> = portfolio
        .custom_weights
        .map(|weights| weights.into_iter().collect());

    service
        .analyze(portfolio_id, None, custom_weights.as_deref())
        .await
        .with_context(|| format!("rebalance analysis failed for portfolio {}", portfolio_id))
}

/// 파일 설정, 전략 유형 재정의, 애플리케이션 기본값을 합쳐 전략 설정을 만듭니다.
fn resolve_strategy_config(
    portfolio: &PortfolioFile,
    strategy_override: Option<&str>,
    app: &AppConfig,
) -> Result<StrategyConfig> {
    let base = portfolio.strategy.clone().unwrap_or_else(|| {
        app.strategy_defaults
            .to_config(StrategyType::LazyIndexTracking)
    });

    match strategy_override {
        Some(tag) => {
            let strategy_type: StrategyType = tag.parse()?;
            Ok(base.for_type(strategy_type))
        }
        None => Ok(base),
    }
}

/// 포트폴리오 파일 로드
pub fn load_portfolio_file(path: &str) -> Result<PortfolioFile> {
    let path = Path::new(path);

    if !path.exists() {
        return Err(anyhow!("Portfolio file not found: {}", path.display()));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "toml") {
        parse_portfolio_toml(&content)
    } else if path.extension().is_some_and(|ext| ext == "json") {
        Ok(serde_json::from_str(&content)?)
    } else {
        Err(anyhow!(
            "Unsupported portfolio format. Use .toml or .json: {}",
            path.display()
        ))
    }
}

/// TOML 포트폴리오 파싱
pub fn parse_portfolio_toml(content: &str) -> Result<PortfolioFile> {
    toml::from_str(content).context("invalid portfolio TOML")
}

/// 분석 결과 텍스트 요약
pub fn format_summary(result: &RebalanceResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n📊 포트폴리오 {} 리밸런싱 ({})\n",
        result.portfolio_id, result.strategy_type
    ));
    out.push_str("═══════════════════════════════════════════════════════════════\n");
    out.push_str(&format!(
        "  총 평가금액: {}\n",
        result.current_total_value.round_money(2)
    ));
    out.push_str(&format!(
        "  필요 현금:   {}\n",
        result.cash_required.round_money(2)
    ));
    out.push_str(&format!(
        "  예상 수수료: {}\n\n",
        result.estimated_fees.round_money(2)
    ));
    out.push_str(&format!(
        "  {:<10} | {:>8} | {:>8} | {:<4} | {:>12}\n",
        "종목", "현재", "목표", "행동", "수량 변화"
    ));
    out.push_str("  ─────────────────────────────────────────────────────────────\n");
    for rec in &result.recommendations {
        out.push_str(&format!(
            "  {:<10} | {:>8} | {:>8} | {:<4} | {:>12}\n",
            rec.secid,
            rec.current_weight.to_percentage_string(),
            rec.target_weight.to_percentage_string(),
            rec.action,
            rec.quantity_change.round_money(4)
        ));
    }
    out.push_str("═══════════════════════════════════════════════════════════════\n");
    out
}

/// 결과를 파일로 저장 (.json이면 JSON, 그 외에는 텍스트 요약)
fn save_result(result: &RebalanceResult, path: &str) -> Result<()> {
    let path = Path::new(path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rendered = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::to_string_pretty(result)?
    } else {
        format_summary(result)
    };

    std::fs::write(path, rendered)?;
    Ok(())
}

// ==================== 테스트 ====================

#[cfg(test)]
mod tests {
    use super::*;
    use rebalancer_core::{RebalanceAction, RebalanceError};
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
portfolio_id = 7
name = "IMOEX core"

[[positions]]
secid = "SBER"
quantity = 100
avg_cost = 95

[[positions]]
secid = "GAZP"
quantity = 100

[prices]
SBER = "100"
GAZP = "100"

[strategy]
strategy_type = "lazy_index_tracking"
min_transaction_amount = 1000
rebalance_threshold = 0.02
"#;

    #[test]
    fn test_parse_portfolio_toml() {
        let portfolio = parse_portfolio_toml(SAMPLE).unwrap();

        assert_eq!(portfolio.portfolio_id, 7);
        assert_eq!(portfolio.positions.len(), 2);
        assert_eq!(portfolio.positions[1].avg_cost, Decimal::ZERO);
        assert_eq!(portfolio.prices["SBER"], dec!(100));

        let strategy = portfolio.strategy.unwrap();
        assert_eq!(strategy.strategy_type, StrategyType::LazyIndexTracking);
        assert_eq!(strategy.max_weight_deviation, dec!(0.05));
    }

    #[test]
    fn test_strategy_override() {
        let portfolio = parse_portfolio_toml(SAMPLE).unwrap();
        let app = AppConfig::default();

        let config = resolve_strategy_config(&portfolio, Some("equal_weight"), &app).unwrap();
        assert_eq!(config.strategy_type, StrategyType::EqualWeight);
        assert_eq!(config.min_transaction_amount, dec!(1000));

        let err = resolve_strategy_config(&portfolio, Some("momentum"), &app).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RebalanceError>(),
            Some(&RebalanceError::UnknownStrategyType("momentum".to_string()))
        );
    }

    #[test]
    fn test_missing_strategy_uses_app_defaults() {
        let portfolio = parse_portfolio_toml("[[positions]]\nsecid = \"SBER\"\nquantity = 1\n").unwrap();
        let mut app = AppConfig::default();
        app.strategy_defaults.min_transaction_amount = dec!(250);

        let config = resolve_strategy_config(&portfolio, None, &app).unwrap();

        assert_eq!(portfolio.portfolio_id, 1);
        assert_eq!(config.strategy_type, StrategyType::LazyIndexTracking);
        assert_eq!(config.min_transaction_amount, dec!(250));
    }

    #[tokio::test]
    async fn test_analyze_sample_portfolio() {
        let portfolio = parse_portfolio_toml(SAMPLE).unwrap();

        let result = analyze_portfolio(portfolio, None, &AppConfig::default())
            .await
            .unwrap();

        assert_eq!(result.portfolio_id, 7);
        assert_eq!(result.total_transactions, 2);
        assert_eq!(
            result.recommendation("SBER").unwrap().action,
            RebalanceAction::Buy
        );
    }

    #[tokio::test]
    async fn test_summary_shows_weights_as_percentages() {
        let portfolio = parse_portfolio_toml(SAMPLE).unwrap();
        let result = analyze_portfolio(portfolio, None, &AppConfig::default())
            .await
            .unwrap();

        let summary = format_summary(&result);
        let sber = result.recommendation("SBER").unwrap();

        assert!(summary.contains("포트폴리오 7"));
        assert!(summary.contains("50.00%"));
        assert!(summary.contains(&sber.target_weight.to_percentage_string()));
        assert!(summary.contains("SBER"));
        assert!(summary.contains("GAZP"));
    }

    #[tokio::test]
    async fn test_analyze_empty_positions() {
        let portfolio = parse_portfolio_toml("portfolio_id = 3\n").unwrap();

        let err = analyze_portfolio(portfolio, None, &AppConfig::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<RebalanceError>(),
            Some(&RebalanceError::EmptyPortfolio(3))
        );
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(load_portfolio_file("portfolio.yaml").is_err());
    }
}
