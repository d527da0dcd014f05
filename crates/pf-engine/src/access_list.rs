//! Builds the canonical EIP-2930 access list from a converged witness
//! (spec §4.F step 2, §6 "Access list encoding").

use std::collections::{BTreeMap, BTreeSet};

use pf_types::{AccessList, AccessListItem, Address, WitnessTable, B256};

/// Groups the witness's storage touches under their addresses, excluding
/// `from`. `BTreeMap`/`BTreeSet` give the canonical big-endian ascending
/// order for free: `Address` and `U256` both order lexicographically over
/// their big-endian byte representation.
pub(crate) fn build(witness: &WitnessTable, from: Address) -> AccessList {
    let mut grouped: BTreeMap<Address, BTreeSet<B256>> = BTreeMap::new();

    for (key, _) in witness.iter() {
        let (address, slot) = *key;
        if address == from {
            continue;
        }
        let entry = grouped.entry(address).or_default();
        if let Some(slot) = slot {
            entry.insert(B256::from(slot.to_be_bytes()));
        }
    }

    AccessList(
        grouped
            .into_iter()
            .map(|(address, slots)| AccessListItem {
                address,
                storage_keys: slots.into_iter().collect(),
            })
            .collect(),
    )
}
