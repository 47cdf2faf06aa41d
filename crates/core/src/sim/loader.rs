//! Executable image loading.
//!
//! Two on-disk layouts are accepted:
//! 1. **Headered:** a 12-byte header (the magic `"BS94"` followed by a
//!    big-endian 32-bit relocation address), then the program bytes. The
//!    header is only honored when the file is strictly longer than the
//!    header itself.
//! 2. **Plain:** raw program bytes, loaded verbatim at the caller-supplied
//!    address.
//!
//! Validation happens before any byte is copied, so a failed load leaves
//! memory untouched.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::common::constants::{INSTRUCTION_SIZE, MEMORY_SIZE};
use crate::common::events::LoadError;
use crate::mem::AddressSpace;

/// `"BS94"` as a big-endian 32-bit word.
pub const IMAGE_MAGIC: u32 = 0x4253_3934;

/// Size of the headered-image prefix in bytes.
const HEADER_SIZE: usize = 12;

/// A successfully loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedImage {
    /// Address the program bytes were copied to.
    pub load_address: i32,
    /// Number of program bytes copied.
    pub program_size: i32,
}

/// Reads `path` and loads it at `default_address` (or the header's
/// relocation address for headered images).
pub fn load_file(
    mem: &mut AddressSpace,
    path: &Path,
    default_address: i32,
) -> Result<LoadedImage, LoadError> {
    let bytes = fs::read(path)?;
    let image = load_bytes(mem, &bytes, default_address)?;
    info!(
        path = %path.display(),
        addr = format_args!("${:08X}", image.load_address),
        size = image.program_size,
        "image loaded"
    );
    Ok(image)
}

/// Loads an in-memory image. Headered images relocate themselves; plain
/// images land at `default_address` in full.
pub fn load_bytes(
    mem: &mut AddressSpace,
    bytes: &[u8],
    default_address: i32,
) -> Result<LoadedImage, LoadError> {
    let (addr, program) = match parse_header(bytes) {
        Some(reloc) => (reloc, &bytes[HEADER_SIZE..]),
        None => (default_address, bytes),
    };

    if addr < 0 || addr as usize >= MEMORY_SIZE || addr % INSTRUCTION_SIZE != 0 {
        return Err(LoadError::BadAddress(addr));
    }
    let size = program.len();
    if size == 0 || (addr as usize) + size > MEMORY_SIZE {
        return Err(LoadError::TooLarge { addr, size });
    }

    // Bounds were checked above, so this cannot fail.
    mem.copy_in(addr, program);

    Ok(LoadedImage {
        load_address: addr,
        program_size: size as i32,
    })
}

/// Returns the relocation address when `bytes` carries a valid header.
fn parse_header(bytes: &[u8]) -> Option<i32> {
    if bytes.len() <= HEADER_SIZE {
        return None;
    }
    let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if magic != IMAGE_MAGIC {
        return None;
    }
    Some(i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]))
}
