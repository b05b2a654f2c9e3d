use crate::sim::{Error, NullCallback, Simulator};
use crate::test::{assemble, run_program, serial};

#[test]
fn store_load_roundtrip() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r1", "0x100"],
            &["mov", "r0", "0xabcd"],
            &["st", "r0", "r1", "0"],
            &["ld", "r2", "r1", "0"],
        ],
        4,
    );

    assert_eq!(sim.greg(2), Some(0xabcd));
    // The medium holds the bytes swapped relative to the stored value.
    assert_eq!(sim.mem_raw(0x100), Some(0xcdab));
}

#[test]
fn plain_form_adds_offset_without_writeback() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r1", "0x100"],
            &["mov", "r0", "7"],
            &["st", "r0", "r1", "4"],
            &["ld", "r2", "r1", "4"],
        ],
        4,
    );

    assert_eq!(sim.greg(1), Some(0x100));
    assert_eq!(sim.greg(2), Some(7));
    assert_eq!(sim.mem_raw(0x104), Some(0x0700));
}

// Pre-increment updates the base first and accesses the new address.
#[test]
fn pre_increment_writeback() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r1", "0x100"],
            &["mov", "r0", "9"],
            &["!st", "r0", "r1", "2"],
        ],
        3,
    );

    assert_eq!(sim.greg(1), Some(0x102));
    assert_eq!(sim.mem_raw(0x102), Some(0x0900));
}

// Post-increment accesses the old address and then updates the base.
#[test]
fn post_increment_writeback() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r1", "0x100"],
            &["mov", "r0", "9"],
            &["st!", "r0", "r1", "2"],
            &["mov", "r2", "0x100"],
            &["ld!", "r3", "r2", "2"],
        ],
        5,
    );

    assert_eq!(sim.greg(1), Some(0x102));
    assert_eq!(sim.mem_raw(0x100), Some(0x0900));
    assert_eq!(sim.greg(3), Some(9));
    assert_eq!(sim.greg(2), Some(0x102));
}

// When a pre-writeback store names the base as its source, the stored
// value is the updated address.
#[test]
fn pre_increment_store_of_base() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[&["mov", "r1", "0x100"], &["!st", "r1", "r1", "3"]],
        2,
    );

    assert_eq!(sim.greg(1), Some(0x103));
    assert_eq!(sim.mem_raw(0x103), Some(0x0103u16.swap_bytes()));
}

#[test]
fn address_wraps() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r1", "0xffff"],
            &["mov", "r0", "1"],
            &["st", "r0", "r1", "2"],
        ],
        3,
    );

    assert_eq!(sim.mem_raw(1), Some(0x0100));
}

#[test]
fn uninitialised_load_fails() {
    let isa = serial();
    let mut sim = Simulator::new(&isa);
    sim.load(&assemble(
        &isa,
        &[&["mov", "r1", "0x4000"], &["ld", "r0", "r1", "0"]],
    ))
    .unwrap();

    let mut cb = NullCallback;
    sim.tick(&mut cb).unwrap();
    match sim.tick(&mut cb) {
        Err(Error::UninitializedMem(0x4000)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

// Fetching past the end of the loaded image is an uninitialised read,
// which is why binaries carry NOP padding.
#[test]
fn runaway_fetch_fails() {
    let isa = serial();
    let mut sim = Simulator::new(&isa);
    sim.load(&assemble(&isa, &[&["nop"]])).unwrap();

    let mut cb = NullCallback;
    sim.tick(&mut cb).unwrap();
    match sim.tick(&mut cb) {
        Err(Error::UninitializedMem(1)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}
