use crate::constants;
use crate::test::{classic, run_program, serial};

#[test]
fn push_decrements_and_stores_ascending() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "sp", "0x100"],
            &["mov", "r0", "1"],
            &["mov", "r1", "2"],
            &["mov", "r2", "3"],
            &["push", "r0", "..", "r2"],
        ],
        5,
    );

    assert_eq!(sim.greg(constants::SP), Some(0xfd));
    assert_eq!(sim.mem_raw(0xff), Some(0x0100));
    assert_eq!(sim.mem_raw(0xfe), Some(0x0200));
    assert_eq!(sim.mem_raw(0xfd), Some(0x0300));
}

// push then pop of the same mask restores the registers and SP.
#[test]
fn push_pop_identity() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "sp", "0x100"],
            &["mov", "r0", "1"],
            &["mov", "r1", "2"],
            &["mov", "r2", "3"],
            &["push", "r0", "..", "r2"],
            &["mov", "r0", "9"],
            &["mov", "r1", "9"],
            &["mov", "r2", "9"],
            &["pop", "r0", "..", "r2"],
        ],
        9,
    );

    assert_eq!(sim.greg(0), Some(1));
    assert_eq!(sim.greg(1), Some(2));
    assert_eq!(sim.greg(2), Some(3));
    assert_eq!(sim.greg(constants::SP), Some(0x100));
}

#[test]
fn sparse_mask() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "sp", "0x80"],
            &["mov", "r0", "10"],
            &["mov", "r4", "40"],
            &["push", "r0", "r4"],
            &["mov", "r0", "0"],
            &["mov", "r4", "0"],
            &["pop", "r0", "r4"],
        ],
        7,
    );

    assert_eq!(sim.greg(0), Some(10));
    assert_eq!(sim.greg(4), Some(40));
    assert_eq!(sim.greg(constants::SP), Some(0x80));
}

// The classic register-pair encoding behaves like the equivalent mask.
#[test]
fn classic_pair_form() {
    let isa = classic();
    let sim = run_program(
        &isa,
        &[
            &["mov", "sp", "0x100"],
            &["mov", "r1", "11"],
            &["mov", "r2", "22"],
            &["push", "r1", "..", "r2"],
            &["mov", "r1", "0"],
            &["mov", "r2", "0"],
            &["pop", "r1", "..", "r2"],
        ],
        7,
    );

    assert_eq!(sim.greg(1), Some(11));
    assert_eq!(sim.greg(2), Some(22));
    assert_eq!(sim.greg(constants::SP), Some(0x100));
}
