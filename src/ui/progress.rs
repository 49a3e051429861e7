use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::config::PROGRESS_STEPS;
use crate::types::Progress;

const BAR_TEMPLATE: &str = "{msg} [{bar:40.cyan/blue}] {percent:>3}% ({elapsed_precise}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg} ({elapsed_precise})";

/// Terminal progress display driven by [`Progress`] events.
///
/// Starts as a bar and switches to a spinner for good once an indeterminate
/// event arrives.
pub struct Bar {
    bar: ProgressBar,
    indeterminate: bool,
}

impl Bar {
    pub fn new(description: &str) -> Self {
        let bar = ProgressBar::new(PROGRESS_STEPS);
        bar.set_style(style(BAR_TEMPLATE, ProgressStyle::default_bar()).progress_chars("●○ "));
        bar.set_message(description.to_owned());

        Self { bar, indeterminate: false }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn update(&mut self, progress: Progress) {
        match progress {
            Progress::Fraction(fraction) => {
                if !self.indeterminate {
                    self.bar.set_position((fraction.clamp(0.0, 1.0) * PROGRESS_STEPS as f64) as u64);
                }
            }
            Progress::Indeterminate => {
                if !self.indeterminate {
                    self.indeterminate = true;
                    self.bar.set_style(style(SPINNER_TEMPLATE, ProgressStyle::default_spinner()));
                    self.bar.enable_steady_tick(Duration::from_millis(100));
                }
                self.bar.tick();
            }
        }
    }

    pub fn println(&self, line: impl AsRef<str>) {
        self.bar.println(line);
    }

    pub fn set_message(&self, msg: &str) {
        self.bar.set_message(msg.to_owned());
    }

    pub fn finish(&self, msg: &str) {
        self.bar.set_position(PROGRESS_STEPS);
        self.bar.finish_with_message(msg.to_owned());
    }

    pub fn abandon(&self, msg: &str) {
        self.bar.abandon_with_message(msg.to_owned());
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

fn style(template: &str, fallback: ProgressStyle) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switches_to_spinner_once() {
        let mut bar = Bar::new("Encrypting...");
        bar.update(Progress::Fraction(0.5));
        assert_eq!(bar.bar.position(), PROGRESS_STEPS / 2);

        bar.update(Progress::Indeterminate);
        bar.update(Progress::Fraction(0.9));
        assert!(bar.indeterminate);
        assert_eq!(bar.bar.position(), PROGRESS_STEPS / 2);

        bar.finish("Done");
        assert!(bar.bar.is_finished());
    }
}
