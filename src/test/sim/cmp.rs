use crate::test::{run_program, serial};

fn compare(op: &str, lhs: &str, rhs: &str) -> bool {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r0", lhs],
            &["mov", "r1", rhs],
            &[op, "p0", "r0", "r1"],
        ],
        3,
    );

    sim.preg(0).unwrap()
}

fn compare_zero(op: &str, value: &str) -> bool {
    let isa = serial();
    let sim = run_program(&isa, &[&["mov", "r0", value], &[op, "p0", "r0"]], 2);

    sim.preg(0).unwrap()
}

#[test]
fn eq_ne() {
    assert!(compare("eq", "5", "5"));
    assert!(!compare("eq", "5", "6"));
    assert!(compare("ne", "5", "6"));
}

// lt/ge interpret their operands as signed, ltu/geu as unsigned.
#[test]
fn signed_vs_unsigned() {
    assert!(compare("lt", "-1", "0"));
    assert!(!compare("ltu", "0xffff", "0"));
    assert!(compare("ltu", "0", "0xffff"));
    assert!(compare("ge", "0", "-1"));
    assert!(!compare("geu", "0", "0xffff"));
}

#[test]
fn zero_compares() {
    assert!(compare_zero("eqz", "0"));
    assert!(!compare_zero("nez", "0"));
    assert!(compare_zero("ltz", "-5"));
    assert!(!compare_zero("ltz", "5"));
    assert!(compare_zero("gez", "0"));
    assert!(compare_zero("lez", "0"));
    assert!(!compare_zero("lez", "1"));
    assert!(compare_zero("gtz", "1"));
    assert!(!compare_zero("gtz", "-1"));
}

// Writes to pt are dropped, so it still reads as true afterwards.
#[test]
fn pt_write_is_ignored() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[&["mov", "r0", "1"], &["eqz", "pt", "r0"]],
        2,
    );

    assert_eq!(sim.preg(3), Some(true));
}

#[test]
fn putp_extracts_bit() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[&["mov", "r0", "0b100"], &["putp", "p1", "r0", "2"], &["putp", "p2", "r0", "3"]],
        3,
    );

    assert_eq!(sim.preg(1), Some(true));
    assert_eq!(sim.preg(2), Some(false));
}

#[test]
fn putpt_putpf() {
    let isa = serial();
    let sim = run_program(&isa, &[&["putpt", "p0"], &["putpf", "p1"]], 2);

    assert_eq!(sim.preg(0), Some(true));
    assert_eq!(sim.preg(1), Some(false));
}

// getp reads a predicate into a zeroed register through inc.
#[test]
fn getp_after_movz() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["putpt", "p0"],
            &["mov", "r0", "0"],
            &["getp.p0", "r0"],
            &["putpf", "p1"],
            &["mov", "r1", "0"],
            &["getp.p1", "r1"],
        ],
        6,
    );

    assert_eq!(sim.greg(0), Some(1));
    assert_eq!(sim.greg(1), Some(0));
}
