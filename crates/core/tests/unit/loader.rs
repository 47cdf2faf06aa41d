//! Image loader tests: plain and headered layouts, relocation, and the
//! validate-before-copy guarantee.

use std::io::Write;

use jagrisc_core::common::constants::MEMORY_SIZE;
use jagrisc_core::common::events::LoadError;
use jagrisc_core::config::Config;
use jagrisc_core::mem::AddressSpace;
use jagrisc_core::sim::loader::{LoadedImage, load_bytes, load_file};
use pretty_assertions::assert_eq;

use crate::common::{LOAD, headered};

fn space() -> AddressSpace {
    AddressSpace::new(&Config::default())
}

#[test]
fn plain_image_loads_in_full_at_the_default_address() {
    let mut mem = space();
    let image = load_bytes(&mut mem, &[1, 2, 3, 4, 5, 6], LOAD).expect("load");
    assert_eq!(
        image,
        LoadedImage {
            load_address: LOAD,
            program_size: 6,
        }
    );
    assert_eq!(mem.slice(LOAD, 6), Some(&[1, 2, 3, 4, 5, 6][..]));
}

#[test]
fn headered_image_relocates_itself() {
    let mut mem = space();
    let image = headered(0x00F0_4000, &[0xAA; 8]);
    assert_eq!(image.len(), 20);

    let loaded = load_bytes(&mut mem, &image, LOAD).expect("load");
    assert_eq!(loaded.load_address, 0x00F0_4000);
    assert_eq!(loaded.program_size, 8);
    assert_eq!(mem.slice(0x00F0_4000, 8), Some(&[0xAA; 8][..]));
    // The header itself is not copied anywhere.
    assert_eq!(mem.peek_long(LOAD), Some(0));
}

#[test]
fn header_needs_a_nonempty_body() {
    // Exactly the header and nothing after it: treated as a plain image.
    let mut mem = space();
    let image = headered(0x00F0_4000, &[]);
    assert_eq!(image.len(), 12);

    let loaded = load_bytes(&mut mem, &image, LOAD).expect("load");
    assert_eq!(loaded.load_address, LOAD);
    assert_eq!(loaded.program_size, 12);
}

#[test]
fn wrong_magic_means_plain() {
    let mut mem = space();
    let mut image = headered(0x00F0_4000, &[1, 2]);
    image[0] ^= 0xFF;
    let loaded = load_bytes(&mut mem, &image, LOAD).expect("load");
    assert_eq!(loaded.load_address, LOAD);
    assert_eq!(loaded.program_size, 14);
}

#[test]
fn rejects_bad_addresses() {
    let mut mem = space();
    assert!(matches!(
        load_bytes(&mut mem, &[1, 2], -2),
        Err(LoadError::BadAddress(-2))
    ));
    assert!(matches!(
        load_bytes(&mut mem, &[1, 2], LOAD + 1),
        Err(LoadError::BadAddress(_))
    ));
    assert!(matches!(
        load_bytes(&mut mem, &[1, 2], MEMORY_SIZE as i32),
        Err(LoadError::BadAddress(_))
    ));
    // Relocation addresses are validated the same way.
    assert!(matches!(
        load_bytes(&mut mem, &headered(-4, &[1, 2]), LOAD),
        Err(LoadError::BadAddress(-4))
    ));
}

#[test]
fn rejects_images_that_do_not_fit() {
    let mut mem = space();
    let near_end = (MEMORY_SIZE - 4) as i32;
    let err = load_bytes(&mut mem, &[0u8; 8], near_end).unwrap_err();
    assert!(matches!(err, LoadError::TooLarge { size: 8, .. }));
}

#[test]
fn rejects_empty_images() {
    let mut mem = space();
    assert!(matches!(
        load_bytes(&mut mem, &[], LOAD),
        Err(LoadError::TooLarge { size: 0, .. })
    ));
}

#[test]
fn failed_load_leaves_memory_untouched() {
    let mut mem = space();
    load_bytes(&mut mem, &[0x55; 4], LOAD).expect("load");
    let bad = headered(MEMORY_SIZE as i32 - 2, &[1, 2, 3, 4]);
    assert!(load_bytes(&mut mem, &bad, LOAD).is_err());
    assert_eq!(mem.peek_long(LOAD), Some(0x5555_5555));
}

#[test]
fn load_file_reads_from_disk() {
    let mut mem = space();
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(&headered(0x00F0_4000, &[9, 8, 7, 6]))
        .expect("write");

    let loaded = load_file(&mut mem, file.path(), LOAD).expect("load");
    assert_eq!(loaded.load_address, 0x00F0_4000);
    assert_eq!(loaded.program_size, 4);
    assert_eq!(mem.peek_long(0x00F0_4000), Some(0x0908_0706));
}

#[test]
fn missing_file_is_an_io_error() {
    let mut mem = space();
    let dir = tempfile::tempdir().expect("temp dir");
    let err = load_file(&mut mem, &dir.path().join("nope.bin"), LOAD).unwrap_err();
    assert!(matches!(err, LoadError::Io(_)));
}
