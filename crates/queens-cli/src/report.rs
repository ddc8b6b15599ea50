//! Per-puzzle results and batch aggregation.

use serde::Serialize;

/// Outcome and counters for one puzzle in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct PuzzleReport {
    pub index: usize,
    pub size: usize,
    pub solved: bool,
    pub queens_placed: usize,
    pub probes_used: usize,
    pub probe_limit: usize,
    pub inferences: usize,
    pub backtracks: usize,
    pub initial_masked: usize,
    /// Fraction of ground-truth queen positions matched, in `[0, 1]`.
    /// Zero when no ground truth was available for the puzzle.
    pub correctness: f64,
}

/// Aggregate statistics over a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total_puzzles: usize,
    pub solved_puzzles: usize,
    pub failed_puzzles: usize,
    pub success_rate: f64,

    pub avg_correctness_all: f64,
    pub avg_correctness_solved: f64,
    pub avg_correctness_failed: f64,

    pub total_probes_used: usize,
    pub total_probe_limit: usize,
    pub avg_probes_used: f64,
    pub probe_budget_utilization: f64,

    pub total_inferences: usize,
    pub avg_inferences: f64,
    /// Cells inferred per probe spent; zero when no probe was spent.
    pub probe_inference_ratio: f64,

    pub total_initial_masked: usize,
    pub total_revealed: usize,
    pub reveal_percentage: f64,

    pub total_backtracks: usize,
    pub avg_backtracks: f64,

    pub avg_grid_size: f64,
}

impl BatchSummary {
    pub fn from_reports(reports: &[PuzzleReport]) -> Self {
        let mut agg = BatchSummary {
            total_puzzles: reports.len(),
            ..BatchSummary::default()
        };

        let mut correctness_all = 0.0;
        let mut correctness_solved = 0.0;
        let mut correctness_failed = 0.0;
        let mut grid_sizes = 0usize;

        for rep in reports {
            if rep.solved {
                agg.solved_puzzles += 1;
                correctness_solved += rep.correctness;
            } else {
                agg.failed_puzzles += 1;
                correctness_failed += rep.correctness;
            }
            correctness_all += rep.correctness;

            agg.total_probes_used += rep.probes_used;
            agg.total_probe_limit += rep.probe_limit;
            agg.total_inferences += rep.inferences;
            agg.total_initial_masked += rep.initial_masked;
            agg.total_backtracks += rep.backtracks;
            grid_sizes += rep.size;
        }
        agg.total_revealed = agg.total_probes_used + agg.total_inferences;

        if agg.total_puzzles > 0 {
            let n = agg.total_puzzles as f64;
            agg.success_rate = agg.solved_puzzles as f64 / n * 100.0;
            agg.avg_correctness_all = correctness_all / n * 100.0;
            agg.avg_probes_used = agg.total_probes_used as f64 / n;
            agg.avg_inferences = agg.total_inferences as f64 / n;
            agg.avg_backtracks = agg.total_backtracks as f64 / n;
            agg.avg_grid_size = grid_sizes as f64 / n;
        }
        if agg.solved_puzzles > 0 {
            agg.avg_correctness_solved = correctness_solved / agg.solved_puzzles as f64 * 100.0;
        }
        if agg.failed_puzzles > 0 {
            agg.avg_correctness_failed = correctness_failed / agg.failed_puzzles as f64 * 100.0;
        }
        if agg.total_probe_limit > 0 {
            agg.probe_budget_utilization =
                agg.total_probes_used as f64 / agg.total_probe_limit as f64 * 100.0;
        }
        if agg.total_probes_used > 0 {
            agg.probe_inference_ratio =
                agg.total_inferences as f64 / agg.total_probes_used as f64;
        }
        if agg.total_initial_masked > 0 {
            agg.reveal_percentage =
                agg.total_revealed as f64 / agg.total_initial_masked as f64 * 100.0;
        }

        agg
    }

    /// Render the multi-section text report.
    pub fn render_text(&self, config: &str) -> String {
        let rule = "-".repeat(80);
        let border = "=".repeat(80);
        let mut out = String::new();

        out.push_str(&format!("{border}\n"));
        out.push_str("                       BATCH SOLVER RESULTS\n");
        out.push_str(&format!("{border}\n\n"));
        out.push_str(&format!("Configuration: {config}\n"));
        out.push_str(&format!("Total Puzzles: {}\n\n", self.total_puzzles));

        out.push_str(&format!("{rule}\n  Success\n{rule}\n"));
        out.push_str(&format!(
            "Puzzles Solved:                  {} / {}\n",
            self.solved_puzzles, self.total_puzzles
        ));
        out.push_str(&format!(
            "Success Rate:                    {:.2}%\n",
            self.success_rate
        ));
        out.push_str(&format!(
            "Average Correctness (All):       {:.2}%\n",
            self.avg_correctness_all
        ));
        out.push_str(&format!(
            "Average Correctness (Solved):    {:.2}%\n",
            self.avg_correctness_solved
        ));
        out.push_str(&format!(
            "Average Correctness (Failed):    {:.2}%\n\n",
            self.avg_correctness_failed
        ));

        out.push_str(&format!("{rule}\n  Probes\n{rule}\n"));
        out.push_str(&format!(
            "Total Probes Used:               {} / {} (budget)\n",
            self.total_probes_used, self.total_probe_limit
        ));
        out.push_str(&format!(
            "Average Probes per Puzzle:       {:.2}\n",
            self.avg_probes_used
        ));
        out.push_str(&format!(
            "Probe Budget Utilization:        {:.2}%\n\n",
            self.probe_budget_utilization
        ));

        out.push_str(&format!("{rule}\n  Inference\n{rule}\n"));
        out.push_str(&format!(
            "Total Inferences Made:           {}\n",
            self.total_inferences
        ));
        out.push_str(&format!(
            "Average Inferences per Puzzle:   {:.2}\n",
            self.avg_inferences
        ));
        out.push_str(&format!(
            "Probe-to-Inference Ratio:        1:{:.2}\n\n",
            self.probe_inference_ratio
        ));

        out.push_str(&format!("{rule}\n  Knowledge\n{rule}\n"));
        out.push_str(&format!(
            "Total Initially Masked Cells:    {}\n",
            self.total_initial_masked
        ));
        out.push_str(&format!(
            "Total Cells Revealed:            {}\n",
            self.total_revealed
        ));
        out.push_str(&format!(
            "Reveal Percentage:               {:.2}%\n\n",
            self.reveal_percentage
        ));

        out.push_str(&format!("{rule}\n  Search\n{rule}\n"));
        out.push_str(&format!(
            "Total Backtracks:                {}\n",
            self.total_backtracks
        ));
        out.push_str(&format!(
            "Average Backtracks per Puzzle:   {:.2}\n",
            self.avg_backtracks
        ));
        out.push_str(&format!(
            "Average Grid Size:               {:.2}\n",
            self.avg_grid_size
        ));
        out.push_str(&format!("{border}\n"));

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reports() -> Vec<PuzzleReport> {
        vec![
            PuzzleReport {
                index: 1,
                size: 7,
                solved: true,
                queens_placed: 7,
                probes_used: 6,
                probe_limit: 8,
                inferences: 9,
                backtracks: 13,
                initial_masked: 17,
                correctness: 1.0,
            },
            PuzzleReport {
                index: 2,
                size: 9,
                solved: false,
                queens_placed: 5,
                probes_used: 8,
                probe_limit: 8,
                inferences: 4,
                backtracks: 762,
                initial_masked: 27,
                correctness: 0.25,
            },
        ]
    }

    #[test]
    fn test_aggregates_counts_and_rates() {
        let agg = BatchSummary::from_reports(&sample_reports());
        assert_eq!(agg.total_puzzles, 2);
        assert_eq!(agg.solved_puzzles, 1);
        assert_eq!(agg.failed_puzzles, 1);
        assert!((agg.success_rate - 50.0).abs() < 1e-9);
        assert!((agg.avg_correctness_all - 62.5).abs() < 1e-9);
        assert!((agg.avg_correctness_solved - 100.0).abs() < 1e-9);
        assert!((agg.avg_correctness_failed - 25.0).abs() < 1e-9);
        assert_eq!(agg.total_probes_used, 14);
        assert_eq!(agg.total_probe_limit, 16);
        assert!((agg.probe_budget_utilization - 87.5).abs() < 1e-9);
        assert_eq!(agg.total_revealed, 27);
        assert!((agg.probe_inference_ratio - 13.0 / 14.0).abs() < 1e-9);
        assert!((agg.avg_grid_size - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_batch_divides_nothing() {
        let agg = BatchSummary::from_reports(&[]);
        assert_eq!(agg.total_puzzles, 0);
        assert_eq!(agg.success_rate, 0.0);
        assert_eq!(agg.probe_inference_ratio, 0.0);
        assert_eq!(agg.reveal_percentage, 0.0);
    }

    #[test]
    fn test_text_report_carries_key_lines() {
        let agg = BatchSummary::from_reports(&sample_reports());
        let text = agg.render_text("masking 30%, probe budget 50%");
        assert!(text.contains("Configuration: masking 30%, probe budget 50%"));
        assert!(text.contains("Puzzles Solved:                  1 / 2"));
        assert!(text.contains("Probe Budget Utilization:        87.50%"));
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let agg = BatchSummary::from_reports(&sample_reports());
        let json = serde_json::to_value(&agg).unwrap();
        assert_eq!(json["total_puzzles"], 2);
        assert_eq!(json["solved_puzzles"], 1);
    }
}
