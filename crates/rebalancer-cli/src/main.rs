//! 포트폴리오 리밸런서 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 샘플 포트폴리오 분석
//! rebalancer analyze -i config/sample_portfolio.toml
//!
//! # 동일 비중 전략으로 분석, 설정 파일 지정
//! rebalancer analyze -i portfolio.json -s equal_weight -c config/default.toml
//!
//! # 전략 목록 보기
//! rebalancer strategies
//! rebalancer strategies --json
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use rebalancer_cli::commands::analyze::{run_analyze, AnalyzeCliConfig};
use rebalancer_cli::commands::strategies::print_strategies;
use rebalancer_core::{init_logging, AppConfig, DecimalExt, LogConfig};

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Portfolio rebalancer CLI - 목표 비중 기반 리밸런싱 추천", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 포트폴리오 파일로 리밸런싱 분석 실행
    Analyze {
        /// 포트폴리오 파일 (TOML 또는 JSON)
        #[arg(short, long)]
        input: String,

        /// 전략 유형 재정의 (lazy_index_tracking, target_weight, equal_weight)
        #[arg(short, long)]
        strategy: Option<String>,

        /// 애플리케이션 설정 파일 (없으면 환경 변수와 기본값)
        #[arg(short, long)]
        config: Option<String>,

        /// 결과 저장 경로 (.json이면 JSON, 그 외 텍스트 요약; 지정하지 않으면 stdout JSON)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// 등록된 리밸런싱 전략 목록
    Strategies {
        /// JSON 형식으로 출력
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

fn load_app_config(path: Option<&str>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            AppConfig::load(path).with_context(|| format!("failed to load config {}", path))
        }
        None => AppConfig::from_env().context("failed to load config from environment"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일은 선택 사항
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            strategy,
            config,
            output,
        } => {
            let app = load_app_config(config.as_deref())?;
            init_logging(LogConfig::from(&app.logging))
                .map_err(|e| anyhow!("failed to initialize logging: {}", e))?;

            let cli_config = AnalyzeCliConfig {
                input_path: input,
                strategy,
                output_path: output,
            };

            match run_analyze(&cli_config, &app).await {
                Ok(result) => {
                    info!(
                        "✅ {} recommendations, cash required {}",
                        result.total_transactions,
                        result.cash_required.round_money(2)
                    );
                }
                Err(e) => {
                    error!("Analysis failed: {:#}", e);
                    return Err(e);
                }
            }
        }

        Commands::Strategies { json } => {
            print_strategies(json)?;
        }
    }

    Ok(())
}
