use crate::sim::{Callback, CallbackResult, Simulator};
use crate::test::{assemble, serial};

struct TestUart {
    rx: Vec<u16>,
    tx: Vec<(u16, u32)>,
}

impl TestUart {
    fn new(rx: &[u16]) -> TestUart {
        TestUart {
            rx: rx.to_vec(),
            tx: Vec::new(),
        }
    }
}

impl Callback for TestUart {
    fn read_uart(&mut self, _width: u32) -> CallbackResult<u16> {
        Ok(self.rx.remove(0))
    }

    fn write_uart(&mut self, value: u16, width: u32) -> CallbackResult<()> {
        self.tx.push((value, width));
        Ok(())
    }
}

fn run(lines: &[&[&str]], rx: &[u16], ticks: usize) -> (Vec<(u16, u32)>, Vec<Option<u16>>) {
    let isa = serial();
    let mut sim = Simulator::new(&isa);
    sim.load(&assemble(&isa, lines)).unwrap();

    let mut uart = TestUart::new(rx);
    for _ in 0..ticks {
        sim.tick(&mut uart).unwrap();
    }

    let gregs = (0..8u8).map(|reg| sim.greg(reg)).collect();
    (uart.tx, gregs)
}

#[test]
fn urx_reads_full_word() {
    let (_, gregs) = run(&[&["urx", "r0"]], &[0x1234], 1);
    assert_eq!(gregs[0], Some(0x1234));
}

// Byte receives are zero extended; programs sign extend if they want to.
#[test]
fn urxb_masks_to_byte() {
    let (_, gregs) = run(&[&["urxb", "r0"]], &[0x1ff], 1);
    assert_eq!(gregs[0], Some(0xff));
}

#[test]
fn utx_sends_operand() {
    let (tx, _) = run(
        &[&["mov", "r0", "0xbeef"], &["utx", "r0"], &["utxb", "r0"]],
        &[],
        3,
    );

    assert_eq!(tx, vec![(0xbeef, 2), (0xef, 1)]);
}

#[test]
fn utx_immediate() {
    let (tx, _) = run(&[&["utxb", "'E'"]], &[], 1);
    assert_eq!(tx, vec![(0x45, 1)]);
}
