//! Console output for command results

use ballot_application::FinalizeDelegatesOutput;
use ballot_domain::{
    Apportionment, ConfigIssue, ElectionOutcome, ElectionStatus, NominationStatus, TallyOutcome,
    Verdict,
};
use colored::Colorize;

/// Formats command results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn format_apportionment(result: &Apportionment) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Delegate Apportionment"));
        output.push('\n');
        output.push_str(&format!(
            "{} {} seats, {} members, quota {:.3}\n",
            "Totals:".cyan().bold(),
            result.total_delegates,
            result.total_members,
            result.quota
        ));

        output.push_str(&Self::section_header("Allocation"));
        output.push_str(&format!(
            "{:<16} {:>8} {:>10} {:>7} {:>9} {:>6}\n",
            "group", "members", "share", "floor", "leftover", "seats"
        ));
        for line in &result.lines {
            let leftover = if line.received_leftover { "+1" } else { "" };
            output.push_str(&format!(
                "{:<16} {:>8} {:>10.3} {:>7} {} {}\n",
                line.group_id.as_str(),
                line.member_count,
                line.exact_share,
                line.initial,
                format!("{:>9}", leftover).green(),
                format!("{:>6}", line.allocated).bold()
            ));
        }
        output
    }

    pub fn format_finalize(result: &FinalizeDelegatesOutput) -> String {
        let mut output = Self::format_apportionment(&result.apportionment);

        output.push_str(&Self::section_header("Nominations"));
        for decision in &result.decisions {
            let status = match decision.status {
                NominationStatus::Confirmed => decision.status.as_str().green().bold(),
                NominationStatus::Standby => decision.status.as_str().yellow(),
                NominationStatus::Nominated => decision.status.as_str().normal(),
            };
            output.push_str(&format!(
                "  {:<16} {:<12} {}\n",
                decision.group_id.as_str(),
                decision.nomination_id.as_str(),
                status
            ));
        }
        output.push_str(&format!(
            "\n{} {} confirmed, finalized at {}\n",
            "Done:".cyan().bold(),
            result.confirmed().count(),
            result.finalized_at.to_rfc3339()
        ));
        output
    }

    pub fn format_tally(outcome: &TallyOutcome) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Vote Tally"));
        output.push('\n');

        let count = &outcome.count;
        output.push_str(&format!(
            "{} {} accept, {} reject, {} abstain\n",
            "Votes:".cyan().bold(),
            count.accept,
            count.reject,
            count.abstain
        ));
        output.push_str(&format!(
            "{} {}/{} ({:.0}%), quorum {:.0}% {}\n",
            "Turnout:".cyan().bold(),
            count.total,
            outcome.rule.total_eligible,
            outcome.turnout() * 100.0,
            outcome.rule.quorum.value() * 100.0,
            if outcome.quorum_reached {
                "reached".green()
            } else {
                "not reached".red()
            }
        ));
        output.push_str(&format!(
            "{} {}\n\n",
            "Rule:".cyan().bold(),
            outcome.rule.majority.description()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Verdict:".bold(),
            Self::verdict(outcome.verdict)
        ));
        output
    }

    pub fn format_election(outcome: &ElectionOutcome) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Election Result"));
        output.push('\n');

        let mut tallies = outcome.tallies.clone();
        tallies.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.candidate_id.cmp(&b.candidate_id)));
        for tally in &tallies {
            let padded = format!("{:<20}", tally.candidate_id.as_str());
            let name = if outcome.winner.as_ref() == Some(&tally.candidate_id) {
                padded.green().bold()
            } else {
                padded.normal()
            };
            output.push_str(&format!("  {} {:>6}\n", name, tally.votes));
        }

        output.push_str(&format!(
            "\n{} {} votes cast\n",
            "Total:".cyan().bold(),
            outcome.total_votes
        ));
        let status = match outcome.status {
            ElectionStatus::Completed => outcome.status.as_str().green().bold(),
            ElectionStatus::RunoffRequired => outcome.status.as_str().yellow().bold(),
            _ => outcome.status.as_str().red().bold(),
        };
        output.push_str(&format!("{} {}", "Status:".bold(), status));
        if outcome.is_tie {
            output.push_str(" (tie at the top)");
        }
        output.push('\n');
        output
    }

    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        let mut output = String::new();
        for issue in issues {
            let label = if issue.is_error() {
                "error:".red().bold()
            } else {
                "warning:".yellow().bold()
            };
            output.push_str(&format!("{} {}\n", label, issue.message));
        }
        output
    }

    fn verdict(verdict: Verdict) -> colored::ColoredString {
        match verdict {
            Verdict::Passed => verdict.as_str().green().bold(),
            Verdict::Rejected => verdict.as_str().red().bold(),
            Verdict::QuorumNotReached => verdict.as_str().yellow().bold(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }
}
