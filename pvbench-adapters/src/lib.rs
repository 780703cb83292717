#![warn(missing_docs)]
//! pvbench Adapters
//!
//! Concrete persistent vectors behind the `Adapter` contract:
//! - `RpdsVector` / `RpdsVectorSync`: `rpds` tries with `Rc` / `Arc` nodes
//! - `ImVector`: `im`'s RRB vector
//! - `CopyArray`: copy-on-push `Arc<[u32]>` baseline, bounded length
//! - `Released<A>`: any of the above behind manually-released handles

mod array;
mod im_vector;
mod released;
mod rpds_vector;

pub use array::{ARRAY_MAX_LEN, CopyArray};
pub use im_vector::ImVector;
pub use released::{Released, ReleasedHandle};
pub use rpds_vector::{RpdsVector, RpdsVectorSync};

use pvbench_core::{AppendWorkload, CaseRegistry, RegistryError};

/// Case names registered by [`register_push_suite`], in order
pub const PUSH_SUITE: [&str; 6] = [
    "rpds.Vector",
    "rpds.VectorSync",
    "im.Vector",
    "array",
    "rpds.Vector-Released",
    "im.Vector-Released",
];

/// Register the standard push suite against `workload`
pub fn register_push_suite(
    registry: &mut CaseRegistry,
    workload: AppendWorkload,
) -> Result<(), RegistryError> {
    registry.register_adapter(RpdsVector, workload)?;
    registry.register_adapter(RpdsVectorSync, workload)?;
    registry.register_adapter(ImVector, workload)?;
    registry.register_adapter(CopyArray::new(), workload)?;
    registry.register_adapter(Released::new(RpdsVector), workload)?;
    registry.register_adapter(Released::new(ImVector), workload)?;
    tracing::debug!(cases = registry.len(), len = workload.len(), "push suite registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvbench_core::check_equivalence;

    #[test]
    fn test_suite_order() {
        let mut registry = CaseRegistry::new();
        register_push_suite(&mut registry, AppendWorkload::default()).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), PUSH_SUITE);
    }

    #[test]
    fn test_suite_registers_once() {
        let mut registry = CaseRegistry::new();
        register_push_suite(&mut registry, AppendWorkload::new(1)).unwrap();
        assert_eq!(
            register_push_suite(&mut registry, AppendWorkload::new(1)),
            Err(RegistryError::DuplicateName("rpds.Vector".into()))
        );
    }

    #[test]
    fn test_all_adapters_agree() {
        for len in [0, 1, 31, 32, 33, 1025] {
            let workload = AppendWorkload::new(len);
            let mut registry = CaseRegistry::new();
            register_push_suite(&mut registry, workload).unwrap();
            assert_eq!(check_equivalence(&mut registry, workload), Ok(PUSH_SUITE.len()));
        }
    }

    #[test]
    fn test_array_skipped_past_limit() {
        let mut registry = CaseRegistry::new();
        register_push_suite(&mut registry, AppendWorkload::new(ARRAY_MAX_LEN as u32 + 1)).unwrap();
        let skipped: Vec<_> = registry
            .iter()
            .filter(|case| case.skip_reason().is_some())
            .map(|case| case.name())
            .collect();
        assert_eq!(skipped, vec!["array"]);
    }
}
