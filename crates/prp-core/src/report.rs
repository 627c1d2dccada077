//! Optimized vs. baseline prompt statistics over recent daily logs.

use crate::config::CostConfig;
use crate::event_log::PromptRecord;
use crate::transcript::{with_commas, TokenTotals};
use chrono::{DateTime, Local};
use serde::Serialize;

pub const DEFAULT_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizedStats {
    pub total_original_chars: usize,
    pub total_compressed_chars: usize,
    pub total_savings: usize,
    pub avg_original_length: f64,
    pub avg_compressed_length: f64,
    pub avg_savings_per_prompt: f64,
    /// Percent of original characters removed.
    pub compression_ratio: f64,
    pub simple_queries: usize,
    pub simple_query_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineStats {
    pub total_chars: usize,
    pub avg_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub baseline_avg_length: f64,
    pub optimized_avg_length: f64,
    pub savings_percentage: f64,
    pub chars_saved_per_prompt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportAnalysis {
    pub total_prompts: usize,
    pub optimized_prompts: usize,
    pub baseline_prompts: usize,
    pub optimization: Option<OptimizedStats>,
    pub baseline: Option<BaselineStats>,
    pub comparison: Option<Comparison>,
}

pub fn analyze(records: &[PromptRecord]) -> ReportAnalysis {
    let (baseline, optimized): (Vec<&PromptRecord>, Vec<&PromptRecord>) =
        records.iter().partition(|r| r.is_baseline());

    let optimization = (!optimized.is_empty()).then(|| {
        let n = optimized.len() as f64;
        let total_original: usize = optimized.iter().map(|r| r.original_length).sum();
        let total_compressed: usize = optimized
            .iter()
            .map(|r| r.compressed_length.unwrap_or(0))
            .sum();
        let total_savings: usize = optimized.iter().map(|r| r.token_savings.unwrap_or(0)).sum();
        let simple_queries = optimized
            .iter()
            .filter(|r| r.is_simple_query.unwrap_or(false))
            .count();
        OptimizedStats {
            total_original_chars: total_original,
            total_compressed_chars: total_compressed,
            total_savings,
            avg_original_length: total_original as f64 / n,
            avg_compressed_length: total_compressed as f64 / n,
            avg_savings_per_prompt: total_savings as f64 / n,
            compression_ratio: total_savings as f64 / total_original.max(1) as f64 * 100.0,
            simple_queries,
            simple_query_rate: simple_queries as f64 / n * 100.0,
        }
    });

    let baseline_stats = (!baseline.is_empty()).then(|| {
        let total: usize = baseline.iter().map(|r| r.original_length).sum();
        BaselineStats {
            total_chars: total,
            avg_length: total as f64 / baseline.len() as f64,
        }
    });

    let comparison = match (&optimization, &baseline_stats) {
        (Some(opt), Some(base)) if base.avg_length > 0.0 => Some(Comparison {
            baseline_avg_length: base.avg_length,
            optimized_avg_length: opt.avg_compressed_length,
            savings_percentage: (base.avg_length - opt.avg_compressed_length) / base.avg_length
                * 100.0,
            chars_saved_per_prompt: base.avg_length - opt.avg_compressed_length,
        }),
        _ => None,
    };

    ReportAnalysis {
        total_prompts: records.len(),
        optimized_prompts: optimized.len(),
        baseline_prompts: baseline.len(),
        optimization,
        baseline: baseline_stats,
        comparison,
    }
}

/// Markdown report. `session` is the current transcript's token totals when
/// one could be read.
pub fn render(
    analysis: &ReportAnalysis,
    days: u32,
    session: Option<&TokenTotals>,
    cost: &CostConfig,
    now: DateTime<Local>,
) -> String {
    let mut out = Vec::new();
    out.push("# Token Optimization Effectiveness Report".to_string());
    out.push(format!("Generated: {}", now.format("%Y-%m-%d %H:%M:%S")));
    out.push(format!("Analysis Period: Last {days} days"));
    out.push(String::new());

    out.push("## Summary".to_string());
    out.push(format!(
        "- Total prompts analyzed: {}",
        with_commas(analysis.total_prompts as u64)
    ));
    out.push(format!(
        "- Optimized prompts: {}",
        with_commas(analysis.optimized_prompts as u64)
    ));
    out.push(format!(
        "- Baseline prompts: {}",
        with_commas(analysis.baseline_prompts as u64)
    ));
    if let Some(tokens) = session {
        out.push(format!("- Current session tokens: {}", with_commas(tokens.total)));
        if let Some(comp) = &analysis.comparison {
            // Negative savings clamp to zero tokens.
            let saved =
                (tokens.total as f64 * comp.savings_percentage / 100.0).round().max(0.0) as u64;
            out.push(format!(
                "- Estimated token savings: {} ({:.1}%)",
                with_commas(saved),
                comp.savings_percentage
            ));
        }
    }
    out.push(String::new());

    if let Some(stats) = &analysis.optimization {
        out.push("## Optimization Performance".to_string());
        out.push(format!(
            "- Average original prompt length: {:.0} chars",
            stats.avg_original_length
        ));
        out.push(format!(
            "- Average compressed prompt length: {:.0} chars",
            stats.avg_compressed_length
        ));
        out.push(format!(
            "- Average savings per prompt: {:.1} chars",
            stats.avg_savings_per_prompt
        ));
        out.push(format!(
            "- Overall compression ratio: {:.1}%",
            stats.compression_ratio
        ));
        out.push(format!(
            "- Simple queries detected: {} ({:.1}%)",
            stats.simple_queries, stats.simple_query_rate
        ));
        out.push(String::new());
    }

    if let Some(comp) = &analysis.comparison {
        out.push("## A/B Test Results".to_string());
        out.push(format!(
            "- Baseline average prompt: {:.0} chars",
            comp.baseline_avg_length
        ));
        out.push(format!(
            "- Optimized average prompt: {:.0} chars",
            comp.optimized_avg_length
        ));
        out.push(format!(
            "- **Characters saved per prompt: {:.0}**",
            comp.chars_saved_per_prompt
        ));
        out.push(format!(
            "- **Savings percentage: {:.1}%**",
            comp.savings_percentage
        ));
        out.push(String::new());
    }

    if let Some(tokens) = session {
        out.push("## Current Session Token Usage".to_string());
        out.push(format!("- Input tokens: {}", with_commas(tokens.input_tokens)));
        out.push(format!("- Output tokens: {}", with_commas(tokens.output_tokens)));
        out.push(format!(
            "- Cache creation: {}",
            with_commas(tokens.cache_creation_input_tokens)
        ));
        out.push(format!(
            "- Cache read: {}",
            with_commas(tokens.cache_read_input_tokens)
        ));
        out.push(format!("- **Total: {}**", with_commas(tokens.total)));
        out.push(format!("- Estimated cost: ${:.6}", cost.estimate(tokens.total)));
        out.push(String::new());
    }

    out.push("## Recommendations".to_string());
    if analysis.baseline_prompts == 0 {
        out.push("- Run A/B testing to measure baseline vs optimized performance".to_string());
        out.push("- Use `prp optimize off` to disable optimizations temporarily".to_string());
    }
    if let Some(stats) = &analysis.optimization {
        if stats.simple_query_rate > 20.0 {
            out.push(
                "- Consider routing simple queries to a smaller model for additional savings"
                    .to_string(),
            );
        }
        if stats.compression_ratio < 5.0 {
            out.push(
                "- Prompt compression is minimal - consider more aggressive optimization"
                    .to_string(),
            );
        }
    }
    out.push("- Monitor cache hit rates to optimize caching strategy".to_string());

    out.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
