use crate::constants;
use crate::test::{run_program, serial};

#[test]
fn beqz_taken() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r0", "0"],
            &["beqz", "r0", "3"],
            &["mov", "r1", "1"],
            &["mov", "r2", "2"],
        ],
        3,
    );

    // The taken branch skips straight to the final mov.
    assert_eq!(sim.greg(1), None);
    assert_eq!(sim.greg(2), Some(2));
}

#[test]
fn beqz_not_taken() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r0", "5"],
            &["beqz", "r0", "3"],
            &["mov", "r1", "1"],
        ],
        3,
    );

    assert_eq!(sim.greg(1), Some(1));
}

#[test]
fn bltz_is_signed() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r0", "-1"],
            &["bltz", "r0", "3"],
            &["mov", "r1", "1"],
            &["mov", "r2", "2"],
        ],
        3,
    );

    assert_eq!(sim.greg(1), None);
    assert_eq!(sim.greg(2), Some(2));
}

#[test]
fn extended_zero_branches() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r0", "0"],
            &["blez", "r0", "3"],
            &["mov", "r1", "1"],
            &["mov", "r2", "2"],
        ],
        3,
    );

    assert_eq!(sim.greg(1), None);
    assert_eq!(sim.greg(2), Some(2));
}

// A predicated-false branch falls through and both movs execute.
#[test]
fn predicated_false_branch_falls_through() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r0", "0"],
            &["eq.pt", "p0", "r0", "r0"],
            &["bf.p0", "3"],
            &["mov", "r3", "1"],
            &["mov", "r4", "2"],
        ],
        5,
    );

    assert_eq!(sim.greg(3), Some(1));
    assert_eq!(sim.greg(4), Some(2));
}

#[test]
fn bt_taken_on_true() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["putpt", "p0"],
            &["bt.p0", "3"],
            &["mov", "r1", "1"],
            &["mov", "r2", "2"],
        ],
        3,
    );

    // The branch sits at 1; the target is 1 + 1 + 3 = 5.
    assert_eq!(sim.greg(1), None);
    assert_eq!(sim.greg(2), Some(2));
}

#[test]
fn jump_is_absolute() {
    let isa = serial();
    let mut sim = run_program(&isa, &[&["j", "7"]], 1);

    assert_eq!(sim.pc(), 7);
    // PC wraps modulo the address space.
    sim = run_program(&isa, &[&["mov", "r0", "-1"], &["j", "r0"]], 2);
    assert_eq!(sim.pc(), 0xffff);
}

#[test]
fn link_register_holds_return_address() {
    let isa = serial();
    let sim = run_program(&isa, &[&["jl", "7"]], 1);

    // The jump occupies words 0 and 1, so the return address is 2.
    assert_eq!(sim.greg(constants::LR), Some(2));
    assert_eq!(sim.pc(), 7);
}

#[test]
fn branch_and_link_is_relative() {
    let isa = serial();
    let sim = run_program(&isa, &[&["mov", "r0", "0"], &["bl", "4"]], 2);

    // The branch sits at 2: link is 4, target is 3 + 4.
    assert_eq!(sim.greg(constants::LR), Some(4));
    assert_eq!(sim.pc(), 7);
}

#[test]
fn ret_jumps_through_lr() {
    let isa = serial();
    let sim = run_program(&isa, &[&["mov", "lr", "4"], &["ret"]], 2);

    assert_eq!(sim.pc(), 4);
}
