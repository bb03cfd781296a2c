use cinepick_models::ProgressState;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

/// Renders run progress as a bar on a terminal, or as structured log lines otherwise.
pub struct RunProgressUI {
    bar: Option<ProgressBar>,
    last_logged: Option<(u64, String)>,
}

impl RunProgressUI {
    pub fn new(label: &str, enabled: bool) -> Self {
        if !(enabled && is_interactive()) {
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Running in non-interactive mode - progress bar disabled, using structured logging"
            );
            return Self {
                bar: None,
                last_logged: None,
            };
        }

        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}% {msg}",
        ) {
            bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        bar.set_message(format!("{}: starting...", label));
        bar.enable_steady_tick(std::time::Duration::from_millis(120));

        Self {
            bar: Some(bar),
            last_logged: None,
        }
    }

    pub fn update(&mut self, state: &ProgressState) {
        let percent = state.percent() as u64;
        match &self.bar {
            Some(bar) => {
                bar.set_position(percent);
                bar.set_message(state.status.clone());
            }
            None => {
                let key = (percent, state.status.clone());
                if self.last_logged.as_ref() != Some(&key) {
                    tracing::info!(
                        operation = "progress",
                        percent = percent,
                        status = %state.status,
                        "Run progress update"
                    );
                    self.last_logged = Some(key);
                }
            }
        }
    }

    pub fn finish(&self, state: &ProgressState) {
        if let Some(bar) = &self.bar {
            bar.set_position(state.percent() as u64);
            bar.finish_with_message(state.status.clone());
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
