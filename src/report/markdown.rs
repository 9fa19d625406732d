//! This module contains the Markdown projection of the report, intended for
//! human consumption.

use std::fmt::Write;

use crate::report::Report;

impl Report {
    /// Renders the report as a Markdown document.
    ///
    /// Each finding becomes one section titled by its human-readable name,
    /// followed by its catalog identifier, severity, location, and gas
    /// estimate, and then its description text.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        // Writing into a String cannot fail, so the results are ignored.
        let _ = writeln!(output, "# Analysis results for {}", self.contract());

        if self.is_empty() {
            let _ = writeln!(output, "\nThe analysis was completed successfully. No issues were detected.");
            return output;
        }

        for finding in self.findings() {
            let _ = writeln!(output, "\n## {}\n", finding.title);
            let _ = writeln!(output, "- SWC ID: {}", finding.swc_id);
            let _ = writeln!(output, "- Severity: {}", finding.severity);
            let _ = writeln!(output, "- Contract: {}", self.contract());
            let _ = writeln!(output, "- Function name: `{}`", finding.function_name);
            let _ = writeln!(output, "- PC address: {}", finding.instruction_pointer);
            let _ = writeln!(
                output,
                "- Estimated Gas Usage: {} - {}",
                finding.min_gas_used, finding.max_gas_used
            );
            let _ = writeln!(output, "\n### Description\n");
            let _ = writeln!(
                output,
                "{}\n{}",
                finding.description.head, finding.description.tail
            );
        }

        if self.coverage_truncated() {
            let _ = writeln!(
                output,
                "\n*Exploration was truncated by a resource budget, so the results may not \
                 cover the whole bytecode.*"
            );
        }

        output
    }
}

#[cfg(test)]
mod test {
    use crate::report::{swc::SwcId, Description, Finding, Report, Severity};

    #[test]
    fn empty_reports_say_so() {
        let report = Report::new(&[0x00]).with_contract_name("Token");
        let markdown = report.to_markdown();

        assert!(markdown.starts_with("# Analysis results for Token"));
        assert!(markdown.contains("No issues were detected."));
    }

    #[test]
    fn findings_render_as_sections() {
        let mut report = Report::new(&[0x00]).with_contract_name("Token");
        report.add_finding(Finding::new(
            SwcId::DeprecatedFunctionsUsage,
            Severity::Medium,
            "Use of callcode",
            Description::new("Use of callcode is deprecated.", "Use delegatecall instead."),
            42,
            (700, 35_400),
        ));

        let markdown = report.to_markdown();

        assert!(markdown.contains("## Use of callcode"));
        assert!(markdown.contains("- SWC ID: SWC-111"));
        assert!(markdown.contains("- Severity: Medium"));
        assert!(markdown.contains("- Contract: Token"));
        assert!(markdown.contains("- Function name: `unknown`"));
        assert!(markdown.contains("- PC address: 42"));
        assert!(markdown.contains("- Estimated Gas Usage: 700 - 35400"));
        assert!(markdown.contains("### Description"));
        assert!(markdown.contains("Use of callcode is deprecated.\nUse delegatecall instead."));
    }

    #[test]
    fn truncated_coverage_is_called_out() {
        let report = Report::new(&[0x00]).with_coverage_truncated(true);
        assert!(report.to_markdown().contains("truncated by a resource budget"));
    }
}
