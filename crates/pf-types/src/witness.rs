use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single key the EVM may have touched during a run.
///
/// `slot.is_none()` means this is an *account* reference (balance, nonce, or
/// code); `slot.is_some()` means a *storage* reference. A storage reference
/// always implies the corresponding account reference is present too (see
/// [`WitnessTable::touch_storage`]).
pub type WitnessKey = (Address, Option<U256>);

/// The set of keys touched by a single EVM run, in first-touch order, plus
/// whether each account's code was read.
///
/// Order is the order of first touch within one run. Equality is
/// deliberately order-insensitive and structural (spec invariant): two
/// tables are equal iff they contain the same keys with the same
/// `codeTouched` flags, regardless of touch order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WitnessTable {
    entries: IndexMap<WitnessKey, bool>,
}

impl WitnessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record an account-field read (balance, nonce, or storage-root check).
    /// Idempotent: the first insertion fixes the key's position.
    pub fn touch_account(&mut self, address: Address) {
        self.entries.entry((address, None)).or_insert(false);
    }

    /// Record a code read: implies an account touch, and OR-merges
    /// `codeTouched` into `true`.
    pub fn touch_code(&mut self, address: Address) {
        let touched = self.entries.entry((address, None)).or_insert(false);
        *touched = true;
    }

    /// Record a storage slot read: implies both a storage touch and an
    /// account touch for the same address.
    pub fn touch_storage(&mut self, address: Address, slot: U256) {
        self.entries.entry((address, Some(slot))).or_insert(false);
        self.touch_account(address);
    }

    /// Iterate all keys in first-touch order.
    pub fn iter(&self) -> impl Iterator<Item = (&WitnessKey, &bool)> {
        self.entries.iter()
    }

    pub fn code_touched(&self, address: Address) -> bool {
        self.entries.get(&(address, None)).copied().unwrap_or(false)
    }

    pub fn contains(&self, key: &WitnessKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn as_structural_map(&self) -> HashMap<&WitnessKey, &bool> {
        self.entries.iter().collect()
    }
}

impl PartialEq for WitnessTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.as_structural_map() == other.as_structural_map()
    }
}

impl Eq for WitnessTable {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn equality_ignores_touch_order() {
        let a = address!("0000000000000000000000000000000000000001");
        let b = address!("0000000000000000000000000000000000000002");

        let mut first = WitnessTable::new();
        first.touch_account(a);
        first.touch_account(b);

        let mut second = WitnessTable::new();
        second.touch_account(b);
        second.touch_account(a);

        assert_eq!(first, second);
    }

    #[test]
    fn code_touch_is_or_merged() {
        let a = address!("0000000000000000000000000000000000000001");
        let mut table = WitnessTable::new();
        table.touch_account(a);
        assert!(!table.code_touched(a));
        table.touch_code(a);
        assert!(table.code_touched(a));
        // A later plain account touch must not clear codeTouched.
        table.touch_account(a);
        assert!(table.code_touched(a));
    }

    #[test]
    fn storage_touch_implies_account_touch() {
        let a = address!("0000000000000000000000000000000000000001");
        let mut table = WitnessTable::new();
        table.touch_storage(a, U256::from(1));
        assert!(table.contains(&(a, None)));
        assert!(table.contains(&(a, Some(U256::from(1)))));
    }

    #[test]
    fn first_insertion_fixes_position() {
        let a = address!("0000000000000000000000000000000000000001");
        let b = address!("0000000000000000000000000000000000000002");
        let mut table = WitnessTable::new();
        table.touch_account(a);
        table.touch_account(b);
        table.touch_account(a);
        let order: Vec<_> = table.iter().map(|(k, _)| k.0).collect();
        assert_eq!(order, vec![a, b]);
    }
}
