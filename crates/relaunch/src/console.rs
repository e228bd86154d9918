use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;
use relaunch_core::{ErrorReport, Phase, ProgressSink};

const PB_STYLE: &str = "{spinner:.blue} {prefix:>22.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {percent:>3}% {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

/// Bar resolution; progress fractions are scaled onto it.
const PB_LEN: u64 = 1000;

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(pb_style)
});

/// Terminal progress for a launch.
pub struct ConsoleSink {
    pb: ProgressBar,
}

impl ConsoleSink {
    pub fn new(visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let pb = ProgressBar::with_draw_target(Some(PB_LEN), target);
        let pb = if let Some(style) = PB_TEMPLATE.as_ref() {
            pb.with_style(style.clone())
        } else {
            pb
        };
        Self { pb }
    }

    fn position(&self) -> u64 {
        self.pb.position()
    }
}

impl ProgressSink for ConsoleSink {
    fn on_phase_start(&mut self, phase: Phase) {
        match phase {
            Phase::Running => self.pb.finish_and_clear(),
            Phase::Failed => self.pb.abandon(),
            _ => self.pb.set_prefix(phase.name()),
        }
    }

    fn on_progress(&mut self, fraction: f64) {
        let pos = (fraction.clamp(0.0, 1.0) * PB_LEN as f64).round() as u64;
        // Never move backwards.
        if pos > self.position() {
            self.pb.set_position(pos);
        }
    }

    fn on_status_text(&mut self, text: &str) {
        self.pb.set_message(text.to_string());
    }

    fn on_error(&mut self, report: &ErrorReport) {
        self.pb.suspend(|| eprintln!("{report}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_sink_tracks_progress() {
        let mut sink = ConsoleSink::new(false);
        sink.on_phase_start(Phase::ArtifactSync);
        sink.on_progress(0.4);
        assert_eq!(sink.position(), 400);
        sink.on_progress(0.2);
        assert_eq!(sink.position(), 400);
        sink.on_progress(1.2);
        assert_eq!(sink.position(), PB_LEN);
    }

    #[test]
    fn test_template_is_valid() {
        assert!(PB_TEMPLATE.is_some());
    }
}
