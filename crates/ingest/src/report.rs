use corpus_segmenter::verify::VerificationReport;

const MAX_CHUNK_ROWS: usize = 20;
const MAX_VIOLATION_ROWS: usize = 50;

/// Run details shown above the verification tables
#[derive(Debug, Clone, Default)]
pub struct ReportMeta {
    pub sources: Vec<String>,
    pub tokenizer: Option<String>,
    pub policy: Option<String>,
    pub chunk_window: Option<usize>,
    pub subchunk_window: Option<usize>,
}

pub fn render_verification_report(report: &VerificationReport, meta: &ReportMeta) -> String {
    let mut md = String::new();
    md.push_str("# Segmentation verification report\n\n");
    md.push_str(&format!(
        "- Status: `{}`\n",
        if report.is_healthy() { "healthy" } else { "attention" }
    ));
    if !meta.sources.is_empty() {
        md.push_str(&format!("- Sources: `{}`\n", meta.sources.len()));
    }
    if let Some(tokenizer) = &meta.tokenizer {
        md.push_str(&format!("- Tokenizer: `{tokenizer}`\n"));
    }
    if let Some(policy) = &meta.policy {
        md.push_str(&format!("- Sentence policy: `{policy}`\n"));
    }
    if let (Some(chunk), Some(sub)) = (meta.chunk_window, meta.subchunk_window) {
        md.push_str(&format!("- Windows: `{chunk}` / `{sub}` tokens\n"));
    }
    md.push('\n');

    md.push_str("## Summary\n\n");
    md.push_str("| chunks | sub_chunks | sentences | anchored | ratio | threshold | token_sum_failures |\n");
    md.push_str("|---:|---:|---:|---:|---:|---:|---:|\n");
    md.push_str(&format!(
        "| `{}` | `{}` | `{}` | `{}` | `{:.4}` | `{:.2}` | `{}` |\n\n",
        report.chunk_count,
        report.subchunk_count,
        report.sentence_count,
        report.anchored_count,
        report.anchoring_ratio,
        report.threshold,
        report.token_sum_failures().count(),
    ));
    if report.below_threshold {
        md.push_str(&format!(
            "Anchoring ratio `{:.4}` is below the `{:.2}` threshold.\n\n",
            report.anchoring_ratio, report.threshold
        ));
    }

    let flagged: Vec<_> = report
        .chunks
        .iter()
        .filter(|c| c.below_threshold || !c.token_sum_ok || !c.token_span_ok)
        .collect();
    if !flagged.is_empty() {
        md.push_str("## Chunks needing attention\n\n");
        md.push_str("| chunk | tokens | sub_chunk_sum | sentences | anchored | ratio |\n");
        md.push_str("|---|---:|---:|---:|---:|---:|\n");
        for chunk in flagged.iter().take(MAX_CHUNK_ROWS) {
            md.push_str(&format!(
                "| `{}` | `{}` | `{}` | `{}` | `{}` | `{:.3}` |\n",
                chunk.chunk_id,
                chunk.token_count,
                chunk.subchunk_token_sum,
                chunk.sentence_count,
                chunk.anchored_count,
                chunk.anchoring_ratio,
            ));
        }
        push_omitted(&mut md, flagged.len(), MAX_CHUNK_ROWS);
        md.push('\n');
    }

    if !report.partition_violations.is_empty() {
        md.push_str("## Partition violations\n\n");
        md.push_str("| id | kind | detail |\n");
        md.push_str("|---|---|---|\n");
        for violation in report.partition_violations.iter().take(MAX_VIOLATION_ROWS) {
            md.push_str(&format!(
                "| `{}` | `{}` | {} |\n",
                violation.id,
                violation.kind,
                escape_cell(&violation.detail),
            ));
        }
        push_omitted(&mut md, report.partition_violations.len(), MAX_VIOLATION_ROWS);
        md.push('\n');
    }

    if !report.sentence_violations.is_empty() {
        md.push_str("## Sentence violations\n\n");
        md.push_str("| sentence | chunk | kind | detail |\n");
        md.push_str("|---|---|---|---|\n");
        for violation in report.sentence_violations.iter().take(MAX_VIOLATION_ROWS) {
            md.push_str(&format!(
                "| `{}` | `{}` | `{}` | {} |\n",
                violation.sentence_id,
                violation.chunk_id,
                violation.kind,
                escape_cell(&violation.detail),
            ));
        }
        push_omitted(&mut md, report.sentence_violations.len(), MAX_VIOLATION_ROWS);
        md.push('\n');
    }

    if report.is_healthy() {
        md.push_str("All structural checks passed.\n");
    }

    md
}

fn push_omitted(md: &mut String, total: usize, shown: usize) {
    if total > shown {
        md.push_str(&format!("\n_{} more not shown._\n", total - shown));
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
