//! Second pass: assign addresses and rewrite label references into
//! concrete immediates.

use std::collections::HashMap;

use idli::instr::Imm;

use crate::error::{Error, LinkKind};
use crate::items::{Item, Loc};

type LabelMap = HashMap<String, Vec<u32>>;

/// Resolve every label reference in the stream. Absolute references take
/// the label's address; PC-relative references take the distance from the
/// word after the instruction, accounting for the pipeline having already
/// advanced when the hardware consumes the immediate.
pub fn resolve_labels(items: &mut [(Item, Loc)]) -> Result<(), Error> {
    let labels = find_labels(items)?;

    let mut pc = 0u32;
    for (item, loc) in items.iter_mut() {
        match item {
            Item::Label(_) => {}
            Item::Word(_) => pc += 1,
            Item::Instr(instr) => {
                // References always occupy an immediate word, so the size
                // is stable across resolution.
                let size = u32::from(instr.size());

                if let Some(Imm::Ref(reference)) = &instr.ops.imm {
                    let value = resolve_ref(&labels, reference, pc, loc)?;
                    instr.ops.imm = Some(Imm::Value(value));
                }

                pc += size;
            }
        }
    }

    Ok(())
}

// Find all the labels and their addresses. Local labels may repeat;
// global labels must be unique across the whole stream.
fn find_labels(items: &[(Item, Loc)]) -> Result<LabelMap, Error> {
    let mut labels = LabelMap::new();
    let mut pc = 0u32;

    for (item, loc) in items {
        let label = match item {
            Item::Label(label) => label,
            Item::Word(_) => {
                pc += 1;
                continue;
            }
            Item::Instr(instr) => {
                pc += u32::from(instr.size());
                continue;
            }
        };

        let addresses = labels.entry(label.name.clone()).or_insert_with(Vec::new);

        if !label.is_local && !addresses.is_empty() {
            return Err(Error::Link(
                loc.clone(),
                LinkKind::DuplicateLabel(label.name.clone()),
            ));
        }

        addresses.push(pc);
    }

    Ok(labels)
}

fn resolve_ref(labels: &LabelMap, reference: &str, pc: u32, loc: &Loc) -> Result<i16, Error> {
    let relative = reference.starts_with('@');
    let name = &reference[1..];

    // Local references are decimal digits followed by a direction: `f`
    // for the next matching label, `b` for the closest at or before the
    // reference.
    let local = name.len() > 1
        && name[..name.len() - 1].chars().all(|ch| ch.is_ascii_digit())
        && (name.ends_with('f') || name.ends_with('b'));

    let address = if local {
        let digits = &name[..name.len() - 1];
        let addresses = labels.get(digits).ok_or_else(|| {
            Error::Link(loc.clone(), LinkKind::UnknownLabel(reference.to_owned()))
        })?;

        if name.ends_with('f') {
            addresses.iter().copied().find(|&addr| addr > pc).ok_or_else(|| {
                Error::Link(loc.clone(), LinkKind::NoForwardMatch(reference.to_owned()))
            })?
        } else {
            addresses
                .iter()
                .rev()
                .copied()
                .find(|&addr| addr <= pc)
                .ok_or_else(|| {
                    Error::Link(loc.clone(), LinkKind::NoBackwardMatch(reference.to_owned()))
                })?
        }
    } else {
        // Non-local references must be unambiguous.
        let addresses = labels.get(name).ok_or_else(|| {
            Error::Link(loc.clone(), LinkKind::UnknownLabel(reference.to_owned()))
        })?;

        if addresses.len() != 1 {
            return Err(Error::Link(
                loc.clone(),
                LinkKind::AmbiguousLabel(reference.to_owned()),
            ));
        }

        addresses[0]
    };

    let value = if relative {
        i64::from(address) - (i64::from(pc) + 1)
    } else {
        i64::from(address)
    };

    // Addresses and displacements reduce modulo the 16-bit address space.
    Ok((value & 0xffff) as u16 as i16)
}
