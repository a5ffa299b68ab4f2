//! Write-time predicates.

use shared_types::Contract;

/// Whether `quantity` more units may be added to `contract` right now:
/// unlocked, and the new total stays within the threshold.
pub fn admits(contract: &Contract, quantity: u64) -> bool {
    !contract.is_locked
        && contract
            .batteries_shipped
            .checked_add(quantity)
            .is_some_and(|projected| projected <= contract.threshold)
}
