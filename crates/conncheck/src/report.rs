//! Per-phase pass/fail report for one connection attempt.

use chipper_voice::{ErrorKind, StreamKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Warn,
    Fail,
    Skip,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
            Status::Skip => "SKIP",
        }
    }
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub status: Status,
}

/// The phases an attempt in `mode` runs through, paired with the reason
/// code a failure in that phase produces.
fn phases(mode: StreamKind) -> Vec<(&'static str, ErrorKind)> {
    let mut phases = Vec::with_capacity(5);
    if mode == StreamKind::ConnectionCheck {
        phases.push(("Connectivity (http)", ErrorKind::Connectivity));
        phases.push(("Connectivity (https)", ErrorKind::Tls));
    }
    phases.push(("Token", ErrorKind::Token));
    phases.push(("Transport", ErrorKind::Connecting));
    phases.push(("Stream", ErrorKind::NewStream));
    phases
}

/// Expand an attempt outcome into per-phase checks.
///
/// Phases before the failing one passed; phases after it never ran.  With
/// no token configured the token phase is reported as skipped unless it is
/// the one that failed.
pub fn checks(mode: StreamKind, failed: Option<ErrorKind>, token_configured: bool) -> Vec<Check> {
    let mut reached_failure = false;
    phases(mode)
        .into_iter()
        .map(|(name, kind)| {
            let status = if reached_failure {
                Status::Skip
            } else if failed == Some(kind) {
                reached_failure = true;
                Status::Fail
            } else if kind == ErrorKind::Token && !token_configured {
                Status::Skip
            } else {
                Status::Pass
            };
            Check { name, status }
        })
        .collect()
}

/// Config problems never stop the attempt, so they only warn.
pub fn config_status(issues: &[String]) -> Status {
    if issues.is_empty() {
        Status::Pass
    } else {
        Status::Warn
    }
}

pub fn print_check(name: &str, status: Status, detail: &str) {
    let label = status.label();
    if detail.is_empty() {
        println!("  [{label}] {name}");
    } else {
        println!("  [{label}] {name}: {detail}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(checks: &[Check]) -> Vec<Status> {
        checks.iter().map(|c| c.status).collect()
    }

    #[test]
    fn config_issues_warn() {
        assert_eq!(config_status(&[]), Status::Pass);
        let issues = vec!["device.app_version is empty (sent in User-Agent)".to_string()];
        assert_eq!(config_status(&issues), Status::Warn);
    }

    #[test]
    fn check_mode_success_passes_every_phase() {
        let report = checks(StreamKind::ConnectionCheck, None, true);
        assert_eq!(report.len(), 5);
        assert!(report.iter().all(|c| c.status == Status::Pass));
    }

    #[test]
    fn tls_failure_skips_later_phases() {
        let report = checks(StreamKind::ConnectionCheck, Some(ErrorKind::Tls), true);
        assert_eq!(
            statuses(&report),
            vec![
                Status::Pass,
                Status::Fail,
                Status::Skip,
                Status::Skip,
                Status::Skip
            ]
        );
    }

    #[test]
    fn other_modes_have_no_probe_phases() {
        let report = checks(StreamKind::Intent, Some(ErrorKind::NewStream), false);
        let names: Vec<_> = report.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Token", "Transport", "Stream"]);
        assert_eq!(
            statuses(&report),
            vec![Status::Skip, Status::Pass, Status::Fail]
        );
    }

    #[test]
    fn missing_required_token_fails_token_phase() {
        let report = checks(StreamKind::KnowledgeGraph, Some(ErrorKind::Token), false);
        assert_eq!(
            statuses(&report),
            vec![Status::Fail, Status::Skip, Status::Skip]
        );
    }
}
