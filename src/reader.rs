use owning_ref::ArcRef;
use std::fmt::Debug;
use std::mem::MaybeUninit;
use std::sync::Arc;

use crate::errors::EnvironmentError;

/// An address in the target process's virtual address space.
pub type Addr = u64;

/// Typed access to a running target's virtual memory.
///
/// Implementations must never panic on an unmapped page; a failed read is
/// reported through the return value, not a panic or an error type, so that
/// every caller can fall back to a default value and keep going (torn reads
/// are expected, not exceptional, when walking live reflection data).
///
/// The production backend (opening a process handle, walking its module
/// list, issuing `ReadProcessMemory`-style calls) is an external collaborator
/// and is intentionally not implemented here; the engine only depends on
/// this trait, which keeps it testable against an in-memory fake.
pub trait MemoryReader: Debug {
	fn read(&self, addr: Addr, buf: &mut [u8]) -> bool;
}

/// Reads a `T` out of the target at `addr`, returning `T::default()` if the
/// read fails. Mirrors the failure-tolerant `ReadAs<T>` helper of the source
/// tool: callers never have to special-case a torn read.
pub fn read_as<T: Copy + Default>(reader: &dyn MemoryReader, addr: Addr) -> T {
	read_pod(reader, addr).unwrap_or_default()
}

/// Like [`read_as`], but distinguishes failure from a legitimately
/// default-valued read.
pub fn read_pod<T: Copy>(reader: &dyn MemoryReader, addr: Addr) -> Option<T> {
	let mut value = MaybeUninit::<T>::uninit();
	let buf = unsafe {
		std::slice::from_raw_parts_mut(value.as_mut_ptr() as *mut u8, std::mem::size_of::<T>())
	};
	if reader.read(addr, buf) {
		Some(unsafe { value.assume_init() })
	} else {
		None
	}
}

/// A local snapshot of the target's primary module image, taken once at
/// startup so that code-address translations (function entry points) are
/// stable even as the live process continues executing.
#[derive(Clone)]
pub struct ModuleImage {
	base: Addr,
	data: ArcRef<[u8]>,
}

impl Debug for ModuleImage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ModuleImage")
			.field("base", &format_args!("{:#x}", self.base))
			.field("size", &self.data.len())
			.finish()
	}
}

impl ModuleImage {
	/// Copies `size` bytes starting at `base` out of the target into a local
	/// buffer. The copy, not the live process, backs every subsequent read
	/// through this image.
	pub fn snapshot(reader: &dyn MemoryReader, base: Addr, size: usize) -> Result<Self, EnvironmentError> {
		let mut data = vec![0u8; size];
		if !reader.read(base, &mut data) {
			return Err(EnvironmentError::CannotReadImage);
		}
		let arc = ArcRef::new(Arc::new(data)).map(|v| &v[..]);
		Ok(Self { base, data: arc })
	}

	pub fn base(&self) -> Addr {
		self.base
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Translates a live address inside this image into a relative virtual
	/// address, if it actually falls within the snapshotted range.
	pub fn rva(&self, addr: Addr) -> Option<u64> {
		let offset = addr.checked_sub(self.base)?;
		(offset < self.data.len() as u64).then_some(offset)
	}

	pub fn bytes(&self) -> &[u8] {
		&self.data
	}
}

/// An in-memory fake standing in for a live process, used by every test in
/// this crate above the raw reader. Backed by a flat byte buffer addressed
/// from a configurable base, with an optional set of additional disjoint
/// regions (so tests can model separate heap allocations without padding
/// the whole address space out to the highest pointer used).
#[derive(Debug, Default)]
pub struct FakeReader {
	regions: Vec<(Addr, Vec<u8>)>,
}

impl FakeReader {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a region of `len` zeroed bytes starting at `base`, returning
	/// `base` for convenience when chaining allocations.
	pub fn alloc(&mut self, base: Addr, len: usize) -> Addr {
		self.regions.push((base, vec![0u8; len]));
		base
	}

	pub fn write(&mut self, addr: Addr, bytes: &[u8]) {
		let (base, buf) = self
			.region_mut(addr, bytes.len())
			.expect("write outside any allocated FakeReader region");
		let start = (addr - base) as usize;
		buf[start..start + bytes.len()].copy_from_slice(bytes);
	}

	pub fn write_pod<T: Copy>(&mut self, addr: Addr, value: T) {
		let bytes = unsafe {
			std::slice::from_raw_parts(&value as *const T as *const u8, std::mem::size_of::<T>())
		};
		self.write(addr, bytes);
	}

	fn region_mut(&mut self, addr: Addr, len: usize) -> Option<(Addr, &mut Vec<u8>)> {
		self.regions.iter_mut().find_map(|(base, buf)| {
			let end = *base + buf.len() as u64;
			(addr >= *base && addr + len as u64 <= end).then_some((*base, buf))
		})
	}
}

impl MemoryReader for FakeReader {
	fn read(&self, addr: Addr, buf: &mut [u8]) -> bool {
		for (base, region) in &self.regions {
			let end = *base + region.len() as u64;
			if addr >= *base && addr + buf.len() as u64 <= end {
				let start = (addr - base) as usize;
				buf.copy_from_slice(&region[start..start + buf.len()]);
				return true;
			}
		}
		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn read_as_returns_default_on_torn_read() {
		let reader = FakeReader::new();
		let value: u32 = read_as(&reader, 0x1000);
		assert_eq!(value, 0);
	}

	#[test]
	fn read_as_round_trips_a_written_value() {
		let mut reader = FakeReader::new();
		reader.alloc(0x1000, 0x10);
		reader.write_pod(0x1004, 0xDEADBEEFu32);
		let value: u32 = read_as(&reader, 0x1004);
		assert_eq!(value, 0xDEADBEEF);
	}

	#[test]
	fn module_image_rva_translates_addresses_inside_the_snapshot() {
		let mut reader = FakeReader::new();
		reader.alloc(0x4000_0000, 0x100);
		reader.write_pod(0x4000_0050, 1u8);
		let image = ModuleImage::snapshot(&reader, 0x4000_0000, 0x100).unwrap();
		assert_eq!(image.rva(0x4000_0050), Some(0x50));
		assert_eq!(image.rva(0x3FFF_FFFF), None);
		assert_eq!(image.rva(0x4000_0100), None);
	}
}
