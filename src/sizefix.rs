//! Repairs undersized struct sizes by propagating descendant requirements
//! upward through the inheritance chain.
//!
//! Engine reflection occasionally under-reports a parent struct's
//! properties-size relative to what its members actually consume. Left
//! alone this produces structs whose members overrun their own declared
//! size, and descendants whose inherited prefix doesn't match their
//! parent's real footprint. This pass corrects both.

use nohash_hasher::IntMap;

use crate::reader::Addr;

/// `address -> corrected_size`, keyed by the struct's own remote address.
/// Addresses are already unique 64-bit identities, so a `nohash` map avoids
/// re-hashing them for no benefit.
pub struct SizeFixer {
	corrected: IntMap<Addr, u32>,
}

impl SizeFixer {
	/// Builds the map from `(struct addr, parent addr, reported size,
	/// required size)` entries — one per struct, gathered by the package
	/// builder while it walks every struct's members for emission, so the
	/// fixer itself never has to touch the target.
	pub fn from_requirements(entries: &[(Addr, Option<Addr>, u32, u32)]) -> Self {
		let mut corrected: IntMap<Addr, u32> = entries.iter().map(|(a, _, reported, _)| (*a, *reported)).collect();
		let required: IntMap<Addr, u32> = entries.iter().map(|(a, _, _, req)| (*a, *req)).collect();
		let parents: IntMap<Addr, Option<Addr>> = entries.iter().map(|(a, p, _, _)| (*a, *p)).collect();

		let addrs: Vec<Addr> = entries.iter().map(|(a, ..)| *a).collect();
		#[cfg(feature = "tracing")]
		let mut rounds = 0u32;
		for _ in 0..addrs.len() + 1 {
			#[cfg(feature = "tracing")]
			{
				rounds += 1;
			}
			let mut changed = false;
			for &addr in &addrs {
				let mut value = corrected[&addr];
				if let Some(&req) = required.get(&addr) {
					value = value.max(req);
				}
				if let Some(Some(parent)) = parents.get(&addr) {
					if let Some(&parent_size) = corrected.get(parent) {
						value = value.max(parent_size);
					}
				}
				if value != corrected[&addr] {
					corrected.insert(addr, value);
					changed = true;
				}
			}
			if !changed {
				break;
			}
		}
		#[cfg(feature = "tracing")]
		tracing::debug!(rounds, structs = addrs.len(), "class size fixer converged");
		Self { corrected }
	}

	pub fn size_of(&self, addr: Addr) -> Option<u32> {
		self.corrected.get(&addr).copied()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parent_size_grows_to_cover_a_descendants_inherited_prefix() {
		// parent reports 0x10; child inherits and has a member at 0x18 size 4
		let entries = vec![(0x1000u64, None, 0x10u32, 0u32), (0x2000u64, Some(0x1000), 0x1C, 0x1C)];
		let fixer = SizeFixer::from_requirements(&entries);
		assert_eq!(fixer.size_of(0x1000), Some(0x1C));
		assert_eq!(fixer.size_of(0x2000), Some(0x1C));
	}

	#[test]
	fn running_twice_is_idempotent() {
		let entries = vec![(0x1000u64, None, 0x10u32, 0x20u32)];
		let a = SizeFixer::from_requirements(&entries);
		let b = SizeFixer::from_requirements(&entries);
		assert_eq!(a.size_of(0x1000), b.size_of(0x1000));
	}
}
