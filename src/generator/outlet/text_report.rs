use crate::generator::blackboard::IntelligenceState;

/// 文本报告中展示的特性数量
const FEATURES_SHOWN: usize = 5;

const RULE_WIDTH: usize = 60;

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() { "N/A" } else { value }
}

fn heading(title: &str) -> String {
    format!("\n\n{}\n{}\n", title, "-".repeat(RULE_WIDTH))
}

/// 渲染分节的文本报告
pub fn render_text(state: &IntelligenceState) -> String {
    let mut out = String::from("📊 FINAL RESULTS\n");
    out.push_str(&"=".repeat(RULE_WIDTH));

    out.push_str(&heading("🎯 DISCOVERED COMPETITORS"));
    for (i, competitor) in state.competitors.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n", i + 1, competitor.name));
        out.push_str(&format!("   URL: {}\n", or_na(&competitor.url)));
        out.push_str(&format!("   Category: {}\n", or_na(&competitor.category)));
        out.push_str(&format!("   Position: {}\n", or_na(&competitor.market_position)));
        out.push_str(&format!("   Score: {:.2}\n", competitor.relevance_score));
        out.push_str(&format!("   Reason: {}\n", or_na(&competitor.relevance_reason)));
    }

    out.push_str(&heading("📈 COMPETITIVE ANALYSIS"));
    out.push_str(&format!("{}\n", state.competitive_analysis));

    out.push_str(&heading("⚖️ FEATURE COMPARISON"));
    let features = &state.feature_comparison.features;
    out.push_str(&format!("Total features analyzed: {}\n", features.len()));
    for feature in features.iter().take(FEATURES_SHOWN) {
        out.push_str(&format!("\n• {}\n", feature.name));
        out.push_str(&format!("  Your Opportunity: {}\n", or_na(&feature.your_opportunity)));
        out.push_str(&format!("  Strategic Value: {}\n", feature.strategic_value));
        out.push_str(&format!("  Complexity: {}\n", feature.implementation_complexity));
    }

    out.push_str(&heading("💡 STRATEGIC RECOMMENDATIONS"));
    out.push_str(&format!("{}\n", state.strategic_recommendations));

    out.push_str(&heading("📡 AGENT MESSAGES"));
    for message in &state.messages {
        out.push_str(&format!("  {}\n", message));
    }

    out.push('\n');
    out.push_str(&"=".repeat(RULE_WIDTH));
    out
}
