use clap::ValueEnum;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use ltlmon_core::Monitor;

/// Verification progress bar
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum Bar {
    /// Fancy Unicode progress bars
    #[default]
    Unicode,
    /// Basic ASCII progress bars
    Ascii,
}

impl Bar {
    fn style(&self, template: &str, unicode_template: &str) -> ProgressStyle {
        const FINE_BAR: &str = "█▉▊▋▌▍▎▏  ";
        const ASCII_BAR: &str = "#--";

        let (template, chars) = if let Bar::Ascii = self {
            (template, ASCII_BAR)
        } else {
            (unicode_template, FINE_BAR)
        };
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(chars)
    }

    /// Prints progress bars following the given [`Monitor`] until `finished` returns `true`.
    pub(crate) fn print_progress_bar<F>(
        &self,
        traces: u64,
        guarantees: Vec<String>,
        monitor: &Monitor,
        name: String,
        finished: F,
    ) where
        F: Fn() -> bool,
    {
        const ASCII_SPINNER: &str = "|/-\\";

        let bars = MultiProgress::new();

        // Spinner
        let spinner_style = ProgressStyle::with_template("{elapsed_precise} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let spinner_style = if let Bar::Ascii = self {
            spinner_style.tick_chars(ASCII_SPINNER)
        } else {
            spinner_style
        };
        let spinner = ProgressBar::new_spinner()
            .with_style(spinner_style)
            .with_message(format!("Monitoring {name} over {traces} traces"));
        let spinner = bars.add(spinner);

        // Progress bar
        let progress_style = self.style(
            "{bar:50} {percent:>3}% ({pos}/{len}) ETA: {eta}",
            "{bar:50.white.on_black} {percent:>3}% ({pos}/{len}) ETA: {eta}",
        );
        let progress_bar = bars.add(ProgressBar::new(traces).with_style(progress_style));

        let line_style = ProgressStyle::with_template("Property rates:")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let line = ProgressBar::new(0).with_style(line_style);
        let line = if !guarantees.is_empty() {
            bars.add(line)
        } else {
            line
        };

        // Property bars
        let prop_style = self.style(
            "{bar:50} {percent:>3}% {prefix} {msg}",
            "{bar:50.green.on_red} {percent:>3}% {prefix} {msg}",
        );

        // Guarantees property bars
        let bars_guarantees = guarantees
            .iter()
            .map(|name| {
                bars.add(
                    ProgressBar::new(1)
                        .with_style(prop_style.clone())
                        .with_position(1)
                        .with_prefix(name.clone()),
                )
            })
            .collect::<Vec<_>>();

        let overall_line_style = ProgressStyle::with_template("Overall success rate:")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let overall_line = bars.add(ProgressBar::new(0).with_style(overall_line_style));

        // Overall property bar
        let overall_bar = bars.add(
            ProgressBar::new(1)
                .with_style(prop_style)
                .with_position(1)
                .with_prefix("TOTAL"),
        );

        bars.set_move_cursor(true);
        while !finished() {
            let runs = monitor.runs() as u64;
            if runs > progress_bar.position() {
                // Status spinner
                spinner.tick();
                progress_bar.set_position(runs);
                if !guarantees.is_empty() {
                    line.tick();
                }

                // Incomplete runs do not count towards success rates
                let completed = (monitor.successes() + monitor.failures()) as u64;
                let violations = monitor.violations();
                for (i, bar) in bars_guarantees.iter().enumerate() {
                    let violations = violations.get(i).copied().unwrap_or(0);
                    bar.set_position(completed.saturating_sub(violations as u64));
                    bar.set_length(completed);
                    if violations > 0 {
                        bar.set_message(format!("({violations} failed)"));
                    }
                    bar.tick();
                }

                // Overall property bar
                overall_line.tick();
                let failures = monitor.failures() as u64;
                overall_bar.set_position(completed.saturating_sub(failures));
                overall_bar.set_length(completed);
                if failures > 0 {
                    overall_bar.set_message(format!("({failures} failed)"));
                }
                overall_bar.tick();
            }
            // Sleep a while to limit update/refresh rate.
            std::thread::sleep(std::time::Duration::from_millis(100));
        }

        // Clean up terminal
        bars.set_move_cursor(false);
        spinner.finish_and_clear();
        progress_bar.finish_and_clear();
        line.finish_and_clear();
        bars_guarantees.iter().for_each(|b| b.finish_and_clear());
        overall_line.finish_and_clear();
        overall_bar.finish_and_clear();
    }
}
