//! 전략 목록 명령어.

use anyhow::Result;

use rebalancer_strategy::StrategyRegistry;

/// 등록된 전략 목록을 표 형식으로 만듭니다.
pub fn format_strategies(registry: &StrategyRegistry) -> String {
    let mut out = String::new();
    out.push_str("\n📋 사용 가능한 리밸런싱 전략:\n");
    out.push_str("═══════════════════════════════════════════════════════════════\n\n");
    out.push_str(&format!("  {:<22} | {}\n", "전략 타입", "설명"));
    out.push_str("  ─────────────────────────────────────────────────────────────\n");
    for entry in registry.all() {
        out.push_str(&format!(
            "  {:<22} | {}\n",
            entry.strategy_type.as_str(),
            entry.description
        ));
    }
    out.push_str("\n═══════════════════════════════════════════════════════════════\n");
    out
}

/// 전략 목록 출력 (`json`이면 JSON 형식).
pub fn print_strategies(json: bool) -> Result<()> {
    let registry = StrategyRegistry::builtin();
    if json {
        println!("{}", serde_json::to_string_pretty(&registry.to_json())?);
    } else {
        println!("{}", format_strategies(&registry));
    }
    Ok(())
}
