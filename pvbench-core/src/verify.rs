//! Output Equivalence
//!
//! Before anything is timed, every adapter-backed case builds its vector once
//! and reads it back. All of them must hold exactly `0..len`.

use crate::adapter::Element;
use crate::case::CaseError;
use crate::registry::CaseRegistry;
use crate::workload::AppendWorkload;
use thiserror::Error;

/// How one case's contents went wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchDetail {
    /// Built successfully but holds the wrong elements
    Contents {
        /// Elements the case produced
        actual_len: usize,
        /// First index whose element differs, if within both lengths
        first_difference: Option<usize>,
    },
    /// Building or reading back failed
    Failed(CaseError),
}

/// A case that did not produce `0..len`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceMismatch {
    /// Case name
    pub case: String,
    /// What differed
    pub detail: MismatchDetail,
}

impl std::fmt::Display for EquivalenceMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            MismatchDetail::Contents {
                actual_len,
                first_difference: Some(index),
            } => write!(
                f,
                "{}: {actual_len} elements, first difference at index {index}",
                self.case
            ),
            MismatchDetail::Contents { actual_len, .. } => {
                write!(f, "{}: {actual_len} elements", self.case)
            }
            MismatchDetail::Failed(err) => write!(f, "{}: {err}", self.case),
        }
    }
}

/// One or more cases disagree with the expected contents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} case(s) produced unexpected contents for {len} pushes: {}", .mismatches.len(), join(.mismatches))]
pub struct EquivalenceError {
    /// Pushes per invocation
    pub len: u32,
    /// Offending cases in registration order
    pub mismatches: Vec<EquivalenceMismatch>,
}

fn join(mismatches: &[EquivalenceMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Materialize every adapter-backed, non-skipped case and compare it to
/// `workload.expected()`. Returns how many cases were checked.
pub fn check_equivalence(
    registry: &mut CaseRegistry,
    workload: AppendWorkload,
) -> Result<usize, EquivalenceError> {
    let expected = workload.expected();
    let mut checked = 0;
    let mut mismatches = Vec::new();

    for case in registry.iter_mut() {
        if case.skip_reason().is_some() {
            continue;
        }
        let Some(contents) = case.materialize() else {
            continue;
        };
        checked += 1;

        let detail = match contents {
            Ok(actual) if actual == expected => {
                tracing::debug!(case = case.name(), "contents verified");
                continue;
            }
            Ok(actual) => MismatchDetail::Contents {
                actual_len: actual.len(),
                first_difference: first_difference(&expected, &actual),
            },
            Err(err) => MismatchDetail::Failed(err),
        };

        mismatches.push(EquivalenceMismatch {
            case: case.name().to_string(),
            detail,
        });
    }

    if mismatches.is_empty() {
        Ok(checked)
    } else {
        Err(EquivalenceError {
            len: workload.len(),
            mismatches,
        })
    }
}

fn first_difference(expected: &[Element], actual: &[Element]) -> Option<usize> {
    expected.iter().zip(actual).position(|(e, a)| e != a)
}
