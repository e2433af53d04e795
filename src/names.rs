use std::cell::RefCell;
use std::rc::Rc;

use fxhash::FxHashMap;

use crate::offsets::EngineOffsets;
use crate::reader::{read_as, Addr, MemoryReader};

/// The in-place byte transform a caller can supply to decrypt narrow name
/// entries. Some targets obfuscate their name table; this hook exists so
/// the core never has to know how.
pub type Decryptor = fn(&mut [u8]);

/// Decodes the target's interned-name table. Indices decompose into
/// `(block, offset)` the same way the engine itself addresses them: a
/// block id from the high bits, an entry offset (in stride units) from the
/// low bits.
pub struct NamePool<'r> {
	reader: &'r dyn MemoryReader,
	offsets: &'r EngineOffsets,
	chunks: Vec<Addr>,
	decrypt: Option<Decryptor>,
	cache: RefCell<FxHashMap<u32, Rc<str>>>,
}

impl<'r> std::fmt::Debug for NamePool<'r> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NamePool")
			.field("blocks", &self.chunks.len())
			.field("cached", &self.cache.borrow().len())
			.finish()
	}
}

impl<'r> NamePool<'r> {
	pub fn new(reader: &'r dyn MemoryReader, offsets: &'r EngineOffsets, chunks: Vec<Addr>) -> Self {
		Self { reader, offsets, chunks, decrypt: None, cache: RefCell::new(FxHashMap::default()) }
	}

	pub fn with_decryptor(mut self, decrypt: Decryptor) -> Self {
		self.decrypt = Some(decrypt);
		self
	}

	fn stride(&self) -> u32 {
		self.offsets.name_entry.stride
	}

	/// Splits a pool index into `(block id, byte offset within the block)`.
	fn decompose(&self, index: u32) -> (u32, u32) {
		let block = index >> self.offsets.name_pool_block_shift;
		let slot = index & self.offsets.name_pool_block_mask;
		(block, slot * self.stride())
	}

	fn entry_addr(&self, index: u32) -> Option<Addr> {
		let (block, offset) = self.decompose(index);
		let base = *self.chunks.get(block as usize)?;
		Some(base + offset as u64)
	}

	/// Reads the wide-flag and length out of an entry's header.
	fn info(&self, entry: Addr) -> (bool, u32) {
		let header: u16 = read_as(self.reader, entry + self.offsets.name_entry.info as u64);
		let wide = (header >> self.offsets.name_entry.wide_bit) & 1 != 0;
		let len = (header >> self.offsets.name_entry.len_bit) as u32;
		(wide, len)
	}

	/// Reads and decodes the payload string of an entry, given its already
	/// decoded `(wide, len)` header fields.
	fn string_at(&self, entry: Addr, wide: bool, len: u32) -> String {
		let payload = entry + self.offsets.name_entry.header_size as u64;
		if wide {
			let mut units = vec![0u16; len as usize];
			let buf = unsafe {
				std::slice::from_raw_parts_mut(units.as_mut_ptr() as *mut u8, units.len() * 2)
			};
			self.reader.read(payload, buf);
			String::from_utf16_lossy(&units)
		} else {
			let mut bytes = vec![0u8; len as usize];
			self.reader.read(payload, &mut bytes);
			if let Some(decrypt) = self.decrypt {
				decrypt(&mut bytes);
			}
			String::from_utf8_lossy(&bytes).into_owned()
		}
	}

	/// The byte size of an entry given its header fields, rounded up to the
	/// stride so that adjacent entries in a block stay aligned.
	pub fn entry_size(&self, wide: bool, len: u32) -> u32 {
		let payload = len * if wide { 2 } else { 1 };
		align_up(self.offsets.name_entry.header_size + payload, self.stride())
	}

	/// Resolves an index (and its numbered-name suffix) into a display
	/// string. Numbered names (number > 0) render as `name_N`.
	pub fn resolve(&self, index: u32, number: u32) -> Rc<str> {
		let bare = self.resolve_bare(index);
		if number > 0 {
			return Rc::from(format!("{bare}_{number}").as_str());
		}
		bare
	}

	/// Resolves `index` to its bare entry text, independent of any numbered
	/// suffix, decoding from the target at most once per index.
	fn resolve_bare(&self, index: u32) -> Rc<str> {
		if let Some(hit) = self.cache.borrow().get(&index) {
			return hit.clone();
		}
		let resolved: Rc<str> = match self.entry_addr(index) {
			None => Rc::from(""),
			Some(entry) => {
				let (wide, len) = self.info(entry);
				Rc::from(self.string_at(entry, wide, len).as_str())
			},
		};
		self.cache.borrow_mut().insert(index, resolved.clone());
		resolved
	}

	/// Walks every entry in every configured block, assigning monotonically
	/// increasing ids. The final block is typically only partially filled;
	/// it is walked the same way as any other, stopping at the first entry
	/// whose header decodes to a zero length (the unused remainder).
	pub fn dump(&self, mut callback: impl FnMut(u32, &str)) {
		let block_bytes = (self.offsets.name_pool_block_mask + 1) * self.stride();
		let mut id = 0u32;
		for &base in &self.chunks {
			let mut cursor = 0u32;
			while cursor < block_bytes {
				let entry = base + cursor as u64;
				let (wide, len) = self.info(entry);
				if len == 0 {
					break;
				}
				let text = self.string_at(entry, wide, len);
				callback(id, &text);
				id += 1;
				cursor += self.entry_size(wide, len);
			}
		}
		#[cfg(feature = "tracing")]
		tracing::debug!(decoded = id, blocks = self.chunks.len(), "name pool dump complete");
	}
}

fn align_up(value: u32, align: u32) -> u32 {
	if align == 0 {
		return value;
	}
	(value + align - 1) / align * align
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::offsets::default_offsets;
	use crate::reader::FakeReader;

	fn offsets() -> EngineOffsets {
		default_offsets().remove("UE4_25").unwrap()
	}

	fn write_entry(reader: &mut FakeReader, offsets: &EngineOffsets, addr: Addr, wide: bool, text: &str) {
		let len = text.encode_utf16().count() as u16;
		let header = (len << offsets.name_entry.len_bit) | ((wide as u16) << offsets.name_entry.wide_bit);
		reader.write_pod(addr, header);
		let payload = addr + offsets.name_entry.header_size as u64;
		if wide {
			let units: Vec<u16> = text.encode_utf16().collect();
			let bytes =
				unsafe { std::slice::from_raw_parts(units.as_ptr() as *const u8, units.len() * 2) };
			reader.write(payload, bytes);
		} else {
			reader.write(payload, text.as_bytes());
		}
	}

	#[test]
	fn resolves_a_narrow_entry_by_index() {
		let offsets = offsets();
		let mut reader = FakeReader::new();
		let block = reader.alloc(0x5000_0000, 0x1000);
		write_entry(&mut reader, &offsets, block, false, "Object");

		let pool = NamePool::new(&reader, &offsets, vec![block]);
		assert_eq!(&*pool.resolve(0, 0), "Object");
	}

	#[test]
	fn numbered_names_get_a_suffix() {
		let offsets = offsets();
		let mut reader = FakeReader::new();
		let block = reader.alloc(0x5000_0000, 0x1000);
		write_entry(&mut reader, &offsets, block, false, "Pawn");

		let pool = NamePool::new(&reader, &offsets, vec![block]);
		assert_eq!(&*pool.resolve(0, 3), "Pawn_3");
	}

	#[test]
	fn dump_stops_at_the_unfilled_remainder_of_the_last_block() {
		let offsets = offsets();
		let mut reader = FakeReader::new();
		let block = reader.alloc(0x5000_0000, 0x1000);
		let pool = NamePool::new(&reader, &offsets, vec![block]);
		write_entry(&mut reader, &offsets, block, false, "Object");
		let next = block + pool.entry_size(false, "Object".len() as u32) as u64;
		write_entry(&mut reader, &offsets, next, false, "Class");
		let mut seen = Vec::new();
		pool.dump(|id, name| seen.push((id, name.to_string())));
		assert_eq!(seen, vec![(0, "Object".to_string()), (1, "Class".to_string())]);
	}
}
