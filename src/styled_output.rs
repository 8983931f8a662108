//! Styled terminal output for search results using anstyle.
//!
//! Colors are used only when stdout is a terminal and `NO_COLOR` is unset.

use anstyle::{AnsiColor, Color, Style};
use std::fmt::Write;
use std::io::{self, Write as IoWrite};

use crate::dataset::Record;
use crate::output::{Advisory, SearchReport};
use crate::query::QueryMode;

const RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Style definitions for different UI elements
pub struct Styles {
    pub header: Style,
    pub warning: Style,
    pub info: Style,
    pub muted: Style,
    pub bold: Style,
    pub domain: Style,
    pub payload: Style,
    pub term: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            header: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Blue))),
            warning: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
            info: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))),
            muted: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))),
            bold: Style::new().bold(),
            domain: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
            payload: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
            term: Style::new()
                .fg_color(Some(Color::Ansi(AnsiColor::Magenta)))
                .underline(),
        }
    }
}

/// Styled output formatter for search results
pub struct StyledFormatter {
    styles: Styles,
    use_colors: bool,
}

impl StyledFormatter {
    /// Create a new styled formatter
    pub fn new() -> Self {
        Self {
            styles: Styles::default(),
            use_colors: Self::should_use_colors(),
        }
    }

    /// Create a formatter without colors (for non-interactive use)
    pub fn without_colors() -> Self {
        Self {
            styles: Styles::default(),
            use_colors: false,
        }
    }

    /// Determine if colors should be used based on environment
    fn should_use_colors() -> bool {
        atty::is(atty::Stream::Stdout) && std::env::var("NO_COLOR").is_err()
    }

    /// Apply style to text if colors are enabled
    fn styled(&self, text: &str, style: &Style) -> String {
        if self.use_colors {
            format!("{}{}{}", style.render(), text, style.render_reset())
        } else {
            text.to_string()
        }
    }

    /// Format a search report
    pub fn format_report(&self, report: &SearchReport) -> Result<String, std::fmt::Error> {
        let mut output = String::new();

        self.write_header(&mut output, report)?;
        if let Some(advisory) = report.advisory() {
            self.write_advisory(&mut output, advisory)?;
        }
        self.write_records(&mut output, report)?;
        self.write_footer(&mut output, report)?;

        Ok(output)
    }

    fn write_header(&self, output: &mut String, report: &SearchReport) -> std::fmt::Result {
        let results = &report.results;
        writeln!(output)?;
        writeln!(output, "{}", self.styled(RULE, &self.styles.muted))?;

        let title = match results.directive {
            Some(directive) if results.mode == QueryMode::CspDirective => {
                format!("🔎 Bypasses for {directive}")
            }
            _ => format!("🔎 Bypasses matching \"{}\"", results.query),
        };
        writeln!(output, "  {}", self.styled(&title, &self.styles.header))?;

        if results.mode == QueryMode::CspDirective {
            let terms = if results.terms.is_empty() {
                self.styled("(no host sources)", &self.styles.muted)
            } else {
                results
                    .terms
                    .iter()
                    .map(|t| self.styled(t, &self.styles.term))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            writeln!(
                output,
                "  {} Terms: {}",
                self.styled("🌐", &self.styles.info),
                terms
            )?;
        }

        writeln!(output, "{}", self.styled(RULE, &self.styles.muted))?;
        Ok(())
    }

    fn write_advisory(&self, output: &mut String, advisory: &Advisory) -> std::fmt::Result {
        writeln!(output)?;
        writeln!(
            output,
            "  {} {}",
            self.styled("⚠️", &self.styles.warning),
            self.styled(advisory.title, &self.styles.warning)
        )?;
        writeln!(
            output,
            "    {} {}",
            self.styled("├─", &self.styles.muted),
            self.styled(advisory.payload, &self.styles.payload)
        )?;
        writeln!(
            output,
            "    {} {}",
            self.styled("└─", &self.styles.muted),
            self.styled(advisory.note, &self.styles.muted)
        )?;
        Ok(())
    }

    fn write_records(&self, output: &mut String, report: &SearchReport) -> std::fmt::Result {
        let records = &report.results.records;
        writeln!(output)?;
        if records.is_empty() {
            writeln!(
                output,
                "  {}",
                self.styled("No matching entries.", &self.styles.muted)
            )?;
            return Ok(());
        }
        for record in records {
            self.write_record(output, record)?;
        }
        Ok(())
    }

    fn write_record(&self, output: &mut String, record: &Record) -> std::fmt::Result {
        writeln!(
            output,
            "  {} {}",
            self.styled("●", &self.styles.domain),
            self.styled(&record.domain, &self.styles.domain)
        )?;
        let branch = if record.author().is_some() { "├─" } else { "└─" };
        writeln!(
            output,
            "    {} {}",
            self.styled(branch, &self.styles.muted),
            self.styled(&record.code, &self.styles.payload)
        )?;
        if let Some(author) = record.author() {
            writeln!(
                output,
                "    {} by {}",
                self.styled("└─", &self.styles.muted),
                self.styled(author, &self.styles.bold)
            )?;
        }
        writeln!(output)?;
        Ok(())
    }

    fn write_footer(&self, output: &mut String, report: &SearchReport) -> std::fmt::Result {
        let meta = &report.metadata;
        writeln!(output, "{}", self.styled(RULE, &self.styles.muted))?;

        let shown = report.results.records.len();
        let summary = if report.is_truncated() {
            format!("{shown} of {} result(s)", meta.total_matches)
        } else {
            format!("{shown} result(s)")
        };
        writeln!(
            output,
            "  {} {} from {} record(s)",
            self.styled("📊", &self.styles.info),
            self.styled(&summary, &self.styles.bold),
            meta.dataset_size
        )?;

        if let Some(ref link) = meta.share_link {
            writeln!(
                output,
                "  {} {}",
                self.styled("🔗", &self.styles.info),
                self.styled(link, &self.styles.term)
            )?;
        }

        if !meta.warnings.is_empty() {
            for warning in &meta.warnings {
                writeln!(
                    output,
                    "  {} {}",
                    self.styled("•", &self.styles.warning),
                    self.styled(warning, &self.styles.warning)
                )?;
            }
        }

        if let Some(ref credits) = meta.credits
            && !credits.is_empty()
        {
            writeln!(
                output,
                "  {} {}",
                self.styled("Credits:", &self.styles.muted),
                credits
            )?;
        }

        writeln!(output, "{}", self.styled(RULE, &self.styles.muted))?;
        Ok(())
    }

    /// Print a report to stdout
    pub fn print_report(&self, report: &SearchReport) -> io::Result<()> {
        let formatted = self
            .format_report(report)
            .map_err(|e| io::Error::other(format!("{}", e)))?;
        print!("{}", formatted);
        io::stdout().flush()?;
        Ok(())
    }
}

impl Default for StyledFormatter {
    fn default() -> Self {
        Self::new()
    }
}
