use crate::test::{run_program, serial};

#[test]
fn extbl_sign_extends() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[&["mov", "r0", "0x1284"], &["extbl", "r1", "r0"]],
        2,
    );

    assert_eq!(sim.greg(1), Some(0xff84));
}

#[test]
fn extbh_sign_extends() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r0", "0x8412"],
            &["extbh", "r1", "r0"],
            &["mov", "r2", "0x7f00"],
            &["extbh", "r3", "r2"],
        ],
        4,
    );

    assert_eq!(sim.greg(1), Some(0xff84));
    assert_eq!(sim.greg(3), Some(0x007f));
}

#[test]
fn insbl_keeps_high_byte() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r0", "0x1234"],
            &["mov", "r1", "0xabcd"],
            &["insbl", "r0", "r1"],
        ],
        3,
    );

    assert_eq!(sim.greg(0), Some(0x12cd));
}

#[test]
fn insbh_keeps_low_byte() {
    let isa = serial();
    let sim = run_program(
        &isa,
        &[
            &["mov", "r0", "0x1234"],
            &["mov", "r1", "0xabcd"],
            &["insbh", "r0", "r1"],
        ],
        3,
    );

    assert_eq!(sim.greg(0), Some(0xcd34));
}
