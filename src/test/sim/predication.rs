use crate::sim::{Error, NullCallback, Simulator};
use crate::test::{assemble, run_program, serial};

// A skipped sequence leaves registers and memory untouched but the PC
// still advances past every immediate word.
#[test]
fn skipped_instructions_have_no_effect()  {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "sp", "0x100"],
            &["putpf", "p0"],
            &["mov.p0", "r3", "5"],
            &["st.p0", "r3", "sp", "0"],
            &["add.p0", "r3", "r3", "r3"],
        ],
        5,
    );

    assert_eq!(sim.greg(3), None);
    assert_eq!(sim.mem_raw(0x100), None);

    // mov sp (2) + putpf (1) + mov (2) + st (2) + add (1).
    assert_eq!(sim.pc(), 8);
}

// Skipped instructions do not even read their operands, so an
// uninitialised source register is fine under a false predicate.
#[test]
fn skipped_instructions_do_not_read() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[&["putpf", "p0"], &["add.p0", "r2", "r0", "r1"]],
        2,
    );

    assert_eq!(sim.greg(2), None);
}

#[test]
fn true_predicate_executes() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[&["putpt", "p1"], &["mov.p1", "r0", "9"]],
        2,
    );

    assert_eq!(sim.greg(0), Some(9));
}

#[test]
fn unwritten_predicate_rejected() {
    let isa = serial();
    let mut sim = Simulator::new(&isa);
    sim.load(&assemble(&isa, &[&["mov.p0", "r0", "1"]])).unwrap();

    let mut cb = NullCallback;
    match sim.tick(&mut cb) {
        Err(Error::UninitializedPreg(0)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}
