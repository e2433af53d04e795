use bitflags::bitflags;

bitflags! {
	/// A subset of `EPropertyFlags` relevant to SDK generation: the rest of
	/// the engine's ~60 flags are carried by the target but never drive a
	/// decision this tool makes.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct PropertyFlags: u64 {
		const PARM            = 0x0000_0080;
		const REFERENCE_PARM   = 0x0000_0100;
		const RETURN_PARM      = 0x0000_0400;
		const CONST_PARM       = 0x0000_0002;
	}
}

bitflags! {
	/// A subset of `EFunctionFlags`.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct FunctionFlags: u64 {
		const STATIC     = 0x0000_0200;
		const NATIVE     = 0x0000_0400;
		const CONST      = 0x0040_0000;
		const EVENT      = 0x0000_0800;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn return_and_reference_parm_are_distinguishable_from_parm() {
		let f = PropertyFlags::PARM | PropertyFlags::RETURN_PARM;
		assert!(f.contains(PropertyFlags::PARM));
		assert!(f.contains(PropertyFlags::RETURN_PARM));
	}
}
