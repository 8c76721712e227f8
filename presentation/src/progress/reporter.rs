//! Progress reporting for consultation rounds

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mdt_domain::{AgentStatus, Role};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

/// Receives role status changes while a round runs
pub trait RoundProgress: Send + Sync {
    fn on_status(&self, role: Role, status: AgentStatus);

    /// The round is over; tidy up the display.
    fn finish(&self);
}

/// Status board with one spinner line per role
pub struct StatusBoard {
    multi: MultiProgress,
    bars: Mutex<BTreeMap<Role, ProgressBar>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(BTreeMap::new()),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_for(&self, bars: &mut BTreeMap<Role, ProgressBar>, role: Role) -> ProgressBar {
        bars.entry(role)
            .or_insert_with(|| {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.set_prefix(format!("{:<18}", role.as_str()));
                pb
            })
            .clone()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundProgress for StatusBoard {
    fn on_status(&self, role: Role, status: AgentStatus) {
        if status == AgentStatus::Offline {
            return;
        }
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let pb = self.bar_for(&mut bars, role);
        match status {
            AgentStatus::Working | AgentStatus::Planning => {
                pb.enable_steady_tick(Duration::from_millis(100));
                pb.set_message(status.as_str().to_string());
            }
            AgentStatus::Done => pb.finish_with_message(format!("{}", "done".green())),
            AgentStatus::Idle => pb.set_message(status.as_str().dimmed().to_string()),
            AgentStatus::Offline => {}
        }
    }

    fn finish(&self) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        for (_, pb) in std::mem::take(&mut *bars) {
            if !pb.is_finished() {
                pb.finish_with_message(format!("{}", "skipped".dimmed()));
            }
        }
    }
}

/// Status board that shows nothing
pub struct NoProgress;

impl RoundProgress for NoProgress {
    fn on_status(&self, _role: Role, _status: AgentStatus) {}

    fn finish(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_tracks_roles() {
        let board = StatusBoard::new();
        board.on_status(Role::Radiologist, AgentStatus::Idle);
        board.on_status(Role::Pathologist, AgentStatus::Offline);
        board.on_status(Role::Radiologist, AgentStatus::Working);
        board.on_status(Role::Radiologist, AgentStatus::Done);
        board.on_status(Role::Moderator, AgentStatus::Idle);

        {
            let bars = board.bars.lock().unwrap();
            assert_eq!(bars.len(), 2);
            assert!(bars[&Role::Radiologist].is_finished());
            assert!(!bars[&Role::Moderator].is_finished());
        }

        board.finish();
        assert!(board.bars.lock().unwrap().is_empty());
    }
}
